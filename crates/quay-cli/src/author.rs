//! Who is writing a comment.
//!
//! Resolution: `--author` flag > `QUAY_AUTHOR` env > user config `author` >
//! `USER` env (interactive sessions only).

use std::env;
use std::io::IsTerminal;

trait EnvReader {
    fn get(&self, key: &str) -> Option<String>;
    fn is_tty(&self) -> bool;
}

struct RealEnv;

impl EnvReader for RealEnv {
    fn get(&self, key: &str) -> Option<String> {
        env::var(key).ok().filter(|v| !v.trim().is_empty())
    }

    fn is_tty(&self) -> bool {
        std::io::stdin().is_terminal()
    }
}

fn resolve_author_with(
    cli_flag: Option<&str>,
    configured: Option<&str>,
    env: &dyn EnvReader,
) -> Option<String> {
    let explicit = cli_flag
        .filter(|a| !a.trim().is_empty())
        .map(str::to_string)
        .or_else(|| env.get("QUAY_AUTHOR"))
        .or_else(|| {
            configured
                .filter(|a| !a.trim().is_empty())
                .map(str::to_string)
        });
    if explicit.is_some() {
        return explicit;
    }
    if env.is_tty() { env.get("USER") } else { None }
}

pub fn resolve_author(cli_flag: Option<&str>, configured: Option<&str>) -> Option<String> {
    resolve_author_with(cli_flag, configured, &RealEnv)
}

pub fn require_author(cli_flag: Option<&str>, configured: Option<&str>) -> anyhow::Result<String> {
    resolve_author(cli_flag, configured).ok_or_else(|| {
        anyhow::anyhow!(
            "no author for this comment; pass --author, set QUAY_AUTHOR, \
             or add `author` to the user config"
        )
    })
}
