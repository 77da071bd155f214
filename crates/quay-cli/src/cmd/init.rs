use super::Ctx;
use crate::output::{pretty_kv, render_mode};
use anyhow::Result;
use clap::Args;
use quay_core::BoardStore;
use quay_core::config::ProjectConfig;
use serde::Serialize;

#[derive(Args, Debug)]
pub struct InitArgs {
    /// Replace an existing board and config with fresh defaults.
    #[arg(long)]
    pub force: bool,
}

#[derive(Debug, Serialize)]
struct InitReport {
    root: String,
    columns: Vec<String>,
}

/// Execute `quay init`:
///
/// ```text
/// .quay/
///   board.json    empty board with the default columns
///   config.toml   default project config
/// ```
pub fn run_init(args: &InitArgs, ctx: &Ctx) -> Result<()> {
    let store = BoardStore::init(ctx.root(), &ProjectConfig::default(), args.force)?;
    let board = store.load()?;
    let report = InitReport {
        root: store.root().display().to_string(),
        columns: board.columns().iter().map(|c| c.key.to_string()).collect(),
    };
    if ctx.quiet && !ctx.output.is_json() {
        return Ok(());
    }
    render_mode(
        ctx.output,
        &report,
        |r, w| writeln!(w, "initialized\t{}", r.root),
        |r, w| {
            writeln!(w, "✓ Initialized board in {}/.quay", r.root)?;
            pretty_kv(w, "columns", r.columns.join(", "))
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct Wrapper {
        #[command(flatten)]
        args: InitArgs,
    }

    #[test]
    fn force_flag_parses() {
        assert!(Wrapper::parse_from(["quay", "--force"]).args.force);
        assert!(!Wrapper::parse_from(["quay"]).args.force);
    }
}
