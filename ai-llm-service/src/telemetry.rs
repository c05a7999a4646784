use std::io::{self, IsTerminal};
use std::str::FromStr;

use tracing::Level;
use tracing_subscriber::filter::Directive;
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::time::FormatTime;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::{EnvFilter, Layer, fmt};

/// Crate targets that make up the QA backend.
pub const WORKSPACE_TARGETS: &[&str] = &[
    "ai_llm_service",
    "forum_index",
    "answer_engine",
    "api",
    "forum_qa_backend",
];

/// RFC3339 UTC timer implemented via `chrono` (no extra features).
/// Example output: `2025-09-12T10:20:30Z`
#[derive(Clone, Debug, Default)]
struct ChronoRfc3339Utc;

impl FormatTime for ChronoRfc3339Utc {
    fn format_time(&self, w: &mut Writer<'_>) -> std::fmt::Result {
        let now = chrono::Utc::now();
        let s = now.to_rfc3339_opts(chrono::SecondsFormat::Secs, true);
        w.write_str(&s)
    }
}

/// Build the formatting layer used by the binary.
///
/// - RFC3339 UTC timestamps
/// - Compact single-line format
/// - `file:line` and target (module path)
/// - ANSI colors only when stdout is a terminal
pub fn layer<S>() -> impl Layer<S> + Send + Sync
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
{
    let use_ansi = io::stdout().is_terminal();

    fmt::layer()
        .with_timer(ChronoRfc3339Utc)
        .with_level(true)
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .with_ansi(use_ansi)
        .event_format(fmt::format().compact().with_source_location(true))
}

/// Level directives for every workspace crate, e.g. `forum_index=debug`.
pub fn level_directives(level: Level) -> Vec<Directive> {
    WORKSPACE_TARGETS
        .iter()
        .filter_map(|t| Directive::from_str(&format!("{t}={}", level.as_str().to_lowercase())).ok())
        .collect()
}

/// Create an EnvFilter from `RUST_LOG` or the fallback `default`.
///
/// When `workspace_level` is set, every workspace crate is raised to that level
/// while third-party crates stay at `default`.
pub fn env_filter(default: &str, workspace_level: Option<Level>) -> EnvFilter {
    let base = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    match workspace_level {
        Some(level) => level_directives(level)
            .into_iter()
            .fold(base, |f, d| f.add_directive(d)),
        None => base,
    }
}

/// Workspace log level from the environment variable `key` (e.g. `LOG_LEVEL`).
///
/// Unset, blank or unrecognised values yield `None`.
pub fn workspace_level_from_env(key: &str) -> Option<Level> {
    std::env::var(key).ok().as_deref().and_then(parse_level)
}

fn parse_level(raw: &str) -> Option<Level> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    Level::from_str(raw).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directives_cover_all_targets() {
        let ds = level_directives(Level::DEBUG);
        assert_eq!(ds.len(), WORKSPACE_TARGETS.len());
        assert!(ds.iter().any(|d| d.to_string() == "forum_index=debug"));
    }

    #[test]
    fn log_level_values_parse_case_insensitively() {
        assert_eq!(parse_level("debug"), Some(Level::DEBUG));
        assert_eq!(parse_level(" TRACE "), Some(Level::TRACE));
        assert_eq!(parse_level(""), None);
        assert_eq!(parse_level("chatty"), None);
    }

    #[test]
    fn workspace_level_raises_every_crate() {
        let filter = env_filter("info", Some(Level::DEBUG)).to_string();
        for target in WORKSPACE_TARGETS {
            assert!(filter.contains(&format!("{target}=debug")), "{filter}");
        }
    }

    #[test]
    fn unset_variable_means_no_workspace_level() {
        assert_eq!(workspace_level_from_env("FORUM_QA_UNSET_LEVEL_VAR"), None);
    }
}
