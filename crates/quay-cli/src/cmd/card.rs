//! `quay card ...`: create, inspect and edit cards.

use super::{CardReport, Ctx};
use crate::author::require_author;
use crate::output::{
    CARD_HEADERS, CliError, card_line_pretty, card_row, pretty_kv, pretty_rule, pretty_section,
    render, render_mode,
};
use anyhow::{Result, anyhow, bail};
use chrono::{Local, NaiveDate};
use clap::{Args, Subcommand};
use quay_core::model::{Card, CardId, CardPatch, ColumnKey, NewCard, Urgency};
use quay_core::{BoardError, Command, Effect, Outcome};
use std::io::{IsTerminal, Write};

#[derive(Subcommand, Debug)]
pub enum CardCommand {
    /// Create a card. It lands in the first column unless --status is given.
    Create(CreateArgs),
    /// List cards, optionally filtered.
    List(ListArgs),
    /// Show every field, comment and attachment of one card.
    Show(IdArg),
    /// Change card fields.
    Edit(EditArgs),
    /// Delete a card (asks for confirmation on a terminal).
    Delete(DeleteArgs),
    /// Append a comment.
    Comment(CommentArgs),
    /// Record a reference to a document (path or URL).
    Attach(AttachArgs),
}

#[derive(Args, Debug)]
pub struct CreateArgs {
    #[arg(long)]
    pub client: String,
    #[arg(long)]
    pub service: String,
    #[arg(long, short = 'd')]
    pub description: Option<String>,
    /// low | normal | high | critical
    #[arg(long, short = 'u', default_value = "normal")]
    pub urgency: Urgency,
    /// Request date (YYYY-MM-DD). Defaults to today.
    #[arg(long)]
    pub requested: Option<NaiveDate>,
    /// Due date (YYYY-MM-DD).
    #[arg(long)]
    pub due: Option<NaiveDate>,
    /// Column key to place the card in.
    #[arg(long)]
    pub status: Option<ColumnKey>,
}

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Only cards in this column.
    #[arg(long)]
    pub status: Option<ColumnKey>,
    /// Only cards with this urgency.
    #[arg(long, short = 'u')]
    pub urgency: Option<Urgency>,
    /// Only cards whose status names no column.
    #[arg(long, conflicts_with = "status")]
    pub orphaned: bool,
}

#[derive(Args, Debug)]
pub struct IdArg {
    /// Card id (`12` or `#12`).
    pub id: CardId,
}

#[derive(Args, Debug)]
pub struct EditArgs {
    pub id: CardId,
    #[arg(long)]
    pub client: Option<String>,
    #[arg(long)]
    pub service: Option<String>,
    #[arg(long, short = 'd', conflicts_with = "clear_description")]
    pub description: Option<String>,
    #[arg(long)]
    pub clear_description: bool,
    #[arg(long, short = 'u')]
    pub urgency: Option<Urgency>,
    #[arg(long)]
    pub requested: Option<NaiveDate>,
    #[arg(long, conflicts_with = "clear_due")]
    pub due: Option<NaiveDate>,
    #[arg(long)]
    pub clear_due: bool,
    /// Move the card to this column as part of the edit.
    #[arg(long)]
    pub status: Option<ColumnKey>,
}

impl EditArgs {
    fn patch(&self) -> CardPatch {
        CardPatch {
            client: self.client.clone(),
            service: self.service.clone(),
            description: if self.clear_description {
                Some(None)
            } else {
                self.description.clone().map(Some)
            },
            urgency: self.urgency,
            requested_on: self.requested,
            due_on: if self.clear_due {
                Some(None)
            } else {
                self.due.map(Some)
            },
            status: self.status.clone(),
        }
    }
}

#[derive(Args, Debug)]
pub struct DeleteArgs {
    pub id: CardId,
    /// Skip the confirmation prompt.
    #[arg(long, short = 'y')]
    pub yes: bool,
}

#[derive(Args, Debug)]
pub struct CommentArgs {
    pub id: CardId,
    /// Comment text.
    pub body: String,
}

#[derive(Args, Debug)]
pub struct AttachArgs {
    pub id: CardId,
    /// Display name, e.g. "BL".
    pub name: String,
    /// Path or URL of the document.
    pub location: String,
}

pub fn run_card(command: &CardCommand, ctx: &Ctx) -> Result<()> {
    match command {
        CardCommand::Create(args) => run_create(args, ctx),
        CardCommand::List(args) => run_list(args, ctx),
        CardCommand::Show(args) => run_show(args.id, ctx),
        CardCommand::Edit(args) => {
            let patch = args.patch();
            if patch.is_empty() {
                bail!("nothing to change; pass at least one field flag");
            }
            mutate(ctx, args.id, Command::UpdateCard { id: args.id, patch })
        }
        CardCommand::Delete(args) => run_delete(args, ctx),
        CardCommand::Comment(args) => {
            let author = require_author(ctx.author.as_deref(), ctx.configured_author.as_deref())?;
            mutate(
                ctx,
                args.id,
                Command::AddComment {
                    id: args.id,
                    author,
                    body: args.body.clone(),
                },
            )
        }
        CardCommand::Attach(args) => mutate(
            ctx,
            args.id,
            Command::AddAttachment {
                id: args.id,
                name: args.name.clone(),
                location: args.location.clone(),
            },
        ),
    }
}

/// Apply one card command and report the card afterwards.
pub(super) fn mutate(ctx: &Ctx, id: CardId, command: Command) -> Result<()> {
    let report = ctx.store()?.transact(|controller| {
        let outcome = controller.dispatch(command)?;
        Ok(CardReport::capture(controller, outcome, id))
    })?;
    print_report(ctx, &report)
}

pub(super) fn print_report(ctx: &Ctx, report: &CardReport) -> Result<()> {
    if ctx.quiet && !ctx.output.is_json() {
        return Ok(());
    }
    render(ctx.output, report, |r, w| {
        let Some(card) = &r.card else {
            return writeln!(w, "No change");
        };
        match &r.effect {
            Some(Effect::CardMoved { from, to, .. }) => {
                writeln!(w, "✓ #{} {from} -> {to}", card.id)
            }
            Some(Effect::CommentAdded { .. }) => writeln!(w, "✓ Commented on #{}", card.id),
            Some(Effect::AttachmentAdded { .. }) => {
                writeln!(w, "✓ Attached to #{}", card.id)
            }
            Some(_) => writeln!(w, "✓ Updated #{} {}", card.id, card.headline()),
            None => writeln!(w, "No change to #{} ({})", card.id, card.status),
        }
    })
}

fn run_create(args: &CreateArgs, ctx: &Ctx) -> Result<()> {
    let new = NewCard {
        client: args.client.clone(),
        service: args.service.clone(),
        description: args.description.clone(),
        urgency: args.urgency,
        requested_on: args.requested,
        due_on: args.due,
        status: args.status.clone(),
    };
    let card = ctx
        .store()?
        .transact(|controller| {
            let created = match controller.dispatch(Command::CreateCard(new))? {
                Outcome::Changed(Effect::CardCreated { id }) => controller.board().card(id),
                _ => None,
            };
            Ok(created.cloned())
        })?
        .ok_or_else(|| anyhow!("card was not created"))?;

    if ctx.quiet && !ctx.output.is_json() {
        return Ok(());
    }
    render_mode(
        ctx.output,
        &card,
        |c, w| writeln!(w, "{}", c.id),
        |c, w| writeln!(w, "✓ Created #{} {} in {}", c.id, c.headline(), c.status),
    )
}

fn run_list(args: &ListArgs, ctx: &Ctx) -> Result<()> {
    let board = ctx.store()?.load()?;
    let cards: Vec<&Card> = if args.orphaned {
        board.orphaned_cards().collect()
    } else {
        board.cards().iter().collect()
    };
    let cards: Vec<&Card> = cards
        .into_iter()
        .filter(|c| args.status.as_ref().is_none_or(|s| &c.status == s))
        .filter(|c| args.urgency.is_none_or(|u| c.urgency == u))
        .collect();

    render_mode(
        ctx.output,
        &cards,
        |cards, w| {
            writeln!(w, "{}", CARD_HEADERS.join("\t"))?;
            for card in cards {
                card_row(w, card)?;
            }
            Ok(())
        },
        |cards, w| {
            if cards.is_empty() {
                return writeln!(w, "No cards.");
            }
            let today = Local::now().date_naive();
            for card in cards {
                card_line_pretty(w, card, today)?;
            }
            Ok(())
        },
    )
}

fn run_show(id: CardId, ctx: &Ctx) -> Result<()> {
    let store = ctx.store()?;
    let board = store.load()?;
    let card = board.card(id).ok_or(BoardError::CardNotFound { id })?;
    let column_title = board.column(&card.status).map(|c| c.title.as_str());

    render_mode(
        ctx.output,
        card,
        |c, w| {
            card_row(w, c)?;
            for comment in &c.comments {
                writeln!(w, "comment\t{}\t{}\t{}", comment.at.to_rfc3339(), comment.author, comment.body)?;
            }
            for attachment in &c.attachments {
                writeln!(w, "attachment\t{}\t{}", attachment.name, attachment.location)?;
            }
            Ok(())
        },
        |c, w| {
            pretty_section(w, &format!("#{} {}", c.id, c.headline()))?;
            let status = match column_title {
                Some(title) => format!("{title} ({})", c.status),
                None => format!("{} (no such column)", c.status),
            };
            pretty_kv(w, "status", status)?;
            pretty_kv(w, "urgency", c.urgency.to_string())?;
            pretty_kv(w, "requested", c.requested_on.to_string())?;
            if let Some(due) = c.due_on {
                pretty_kv(w, "due", due.to_string())?;
            }
            pretty_kv(
                w,
                "updated",
                c.updated_at.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string(),
            )?;
            if let Some(description) = &c.description {
                writeln!(w)?;
                writeln!(w, "{description}")?;
            }
            if !c.comments.is_empty() {
                writeln!(w)?;
                pretty_section(w, "Comments")?;
                for comment in &c.comments {
                    let at = comment.at.with_timezone(&Local).format("%Y-%m-%d %H:%M");
                    writeln!(w, "  {at} {}: {}", comment.author, comment.body)?;
                }
            }
            if !c.attachments.is_empty() {
                writeln!(w)?;
                pretty_section(w, "Attachments")?;
                for attachment in &c.attachments {
                    writeln!(w, "  {} <{}>", attachment.name, attachment.location)?;
                }
            }
            pretty_rule(w)
        },
    )
}

fn confirm_delete(card: &Card) -> Result<bool> {
    // Nobody to ask when piped; require --yes instead.
    if !std::io::stdin().is_terminal() || !std::io::stdout().is_terminal() {
        return Ok(false);
    }
    eprint!("Delete #{} '{}'? [y/N] ", card.id, card.headline());
    std::io::stderr().flush()?;

    let mut input = String::new();
    std::io::stdin().read_line(&mut input)?;
    let answer = input.trim().to_ascii_lowercase();
    Ok(matches!(answer.as_str(), "y" | "yes" | "s" | "sim"))
}

fn run_delete(args: &DeleteArgs, ctx: &Ctx) -> Result<()> {
    let store = ctx.store()?;
    if !args.yes {
        let board = store.load()?;
        let card = board
            .card(args.id)
            .ok_or(BoardError::CardNotFound { id: args.id })?;
        if !confirm_delete(card)? {
            return Err(CliError {
                message: format!("deletion of #{} not confirmed", args.id),
                suggestion: Some("Pass --yes to skip the prompt.".to_string()),
                error_code: None,
            }
            .into());
        }
    }
    let id = args.id;
    store.transact(|controller| controller.dispatch(Command::DeleteCard { id }))?;
    if ctx.quiet && !ctx.output.is_json() {
        return Ok(());
    }
    render(
        ctx.output,
        &serde_json::json!({ "deleted": id }),
        |_, w| writeln!(w, "✓ Deleted #{id}"),
    )
}
