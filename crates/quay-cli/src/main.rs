#![forbid(unsafe_code)]

mod author;
mod cmd;
mod output;
mod tui;

use clap::{CommandFactory, Parser, Subcommand};
use output::{CliError, OutputMode};
use quay_core::ErrorCode;
use quay_core::config::{UserConfig, load_user_config};
use std::env;
use std::process::ExitCode;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "quay: service-request kanban board",
    long_about = None
)]
struct Cli {
    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output format (defaults to pretty on a TTY, text when piped).
    #[arg(long, global = true, value_enum)]
    format: Option<OutputMode>,

    /// Shorthand for `--format json`.
    #[arg(long, global = true, hide = true)]
    json: bool,

    /// Name recorded on comments.
    #[arg(long, global = true)]
    author: Option<String>,

    /// Suppress non-essential output.
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    fn output_mode(&self, user: &UserConfig) -> OutputMode {
        output::resolve_output_mode(self.format, self.json, user.output.as_deref())
    }

    /// Mode used before the user config has been read.
    fn early_output_mode(&self) -> OutputMode {
        output::resolve_output_mode(self.format, self.json, None)
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        next_help_heading = "Setup",
        about = "Create a board in the current directory",
        after_help = "EXAMPLES:\n    # Start a board with the five default columns\n    quay init\n\n    # Reset the board and config\n    quay init --force"
    )]
    Init(cmd::init::InitArgs),

    #[command(
        next_help_heading = "Read",
        about = "Show every column and its cards",
        after_help = "EXAMPLES:\n    # Show the board\n    quay board\n\n    # Emit machine-readable output\n    quay board --format json"
    )]
    Board,

    #[command(
        next_help_heading = "Columns",
        about = "Add, rename, remove or list columns",
        after_help = "EXAMPLES:\n    # Add a column\n    quay column add \"Em Teste\"\n\n    # Rename a column (its key stays the same)\n    quay column rename em_teste \"QA\"\n\n    # Remove an empty column\n    quay column remove em_teste"
    )]
    Column {
        #[command(subcommand)]
        command: cmd::column::ColumnCommand,
    },

    #[command(
        next_help_heading = "Cards",
        about = "Create, inspect and edit cards",
        after_help = "EXAMPLES:\n    # Create a card\n    quay card create --client \"Hapag\" --service \"Inspeção\" -u high\n\n    # List cards in one column\n    quay card list --status aprovado\n\n    # Comment on a card\n    quay card comment 3 \"Cliente confirmou\""
    )]
    Card {
        #[command(subcommand)]
        command: cmd::card::CardCommand,
    },

    #[command(
        next_help_heading = "Workflow",
        about = "Move a card to a column",
        after_help = "EXAMPLES:\n    # Approve card 3\n    quay drop 3 aprovado"
    )]
    Drop(cmd::drop::DropArgs),

    #[command(
        next_help_heading = "Workflow",
        about = "Move a card to its next stage",
        after_help = "EXAMPLES:\n    # Advance card 3\n    quay advance 3\n\n    # Emit machine-readable output\n    quay advance 3 --format json"
    )]
    Advance(cmd::advance::AdvanceArgs),

    #[command(
        next_help_heading = "Workflow",
        about = "Open the interactive board",
        after_help = "EXAMPLES:\n    # Open the board\n    quay tui"
    )]
    Tui,

    #[command(
        next_help_heading = "Setup",
        about = "Generate shell completions",
        after_help = "EXAMPLES:\n    # Generate bash completions\n    quay completions bash\n\n    # Generate zsh completions\n    quay completions zsh"
    )]
    Completions(cmd::completions::CompletionsArgs),
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_env("QUAY_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if env::var("DEBUG").is_ok() {
            "quay=debug,warn"
        } else if verbose {
            "quay=info,warn"
        } else {
            "quay=warn"
        })
    });

    let format = env::var("QUAY_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    let registry = tracing_subscriber::registry().with(filter);

    match format.as_str() {
        "json" => {
            registry
                .with(fmt::layer().json().with_ansi(false).with_writer(std::io::stderr))
                .init();
        }
        _ => {
            registry
                .with(fmt::layer().compact().with_writer(std::io::stderr))
                .init();
        }
    }
}

fn run(cli: Cli, ctx: &cmd::Ctx) -> anyhow::Result<()> {
    match cli.command {
        Commands::Init(ref args) => cmd::init::run_init(args, ctx),
        Commands::Board => cmd::board::run_board(ctx),
        Commands::Column { ref command } => cmd::column::run_column(command, ctx),
        Commands::Card { ref command } => cmd::card::run_card(command, ctx),
        Commands::Drop(ref args) => cmd::drop::run_drop(args, ctx),
        Commands::Advance(ref args) => cmd::advance::run_advance(args, ctx),
        Commands::Tui => tui::run_board_tui(ctx),
        Commands::Completions(ref args) => {
            let mut command = Cli::command();
            cmd::completions::run_completions(args.shell, &mut command)
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let user = match load_user_config() {
        Ok(user) => user,
        Err(err) => {
            let _ = output::render_error(
                cli.early_output_mode(),
                &CliError::coded(format!("{err:#}"), ErrorCode::ConfigParseError),
            );
            return ExitCode::FAILURE;
        }
    };
    let output = cli.output_mode(&user);

    let root = match env::current_dir() {
        Ok(root) => root,
        Err(err) => {
            let _ = output::render_error(
                cli.early_output_mode(),
                &CliError::new(format!("cannot read current directory: {err}")),
            );
            return ExitCode::FAILURE;
        }
    };

    if cli.verbose {
        info!("verbose mode enabled");
    }

    let ctx = cmd::Ctx {
        root,
        output,
        author: cli.author.clone(),
        configured_author: user.author.clone(),
        quiet: cli.quiet,
    };

    match run(cli, &ctx) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let _ = output::render_error(output, &CliError::from_anyhow(&err));
            ExitCode::FAILURE
        }
    }
}
