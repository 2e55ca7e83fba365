//! Logging setup
//!
//! `-v`/`-q` move the level one step at a time from `info`, clamped to
//! `trace..=error`. `LOGGING` (or `RUST_LOG`) replaces the computed filter
//! entirely, e.g. `LOGGING=debug` or `LOGGING=reltag=trace,hyper=info`.

use tracing::Level;

const LEVELS: [Level; 5] = [
    Level::TRACE,
    Level::DEBUG,
    Level::INFO,
    Level::WARN,
    Level::ERROR,
];

/// Index of `info` in [`LEVELS`]
const DEFAULT_LEVEL: i32 = 2;

/// HTTP client crates, quiet unless the run itself is at debug or lower
const HTTP_TARGETS: [&str; 3] = ["reqwest", "hyper", "hyper_util"];

/// Level selected by `verbose` and `quiet` flag counts
pub fn level_for(verbose: u8, quiet: u8) -> Level {
    let idx = (DEFAULT_LEVEL - i32::from(verbose) + i32::from(quiet)).clamp(0, LEVELS.len() as i32 - 1);
    LEVELS[idx as usize]
}

/// Filter directives for `level`
///
/// At debug the HTTP client crates log at debug along with everything else.
/// Above it they are held at warn; at trace they are capped at debug since
/// their trace output is per-frame.
pub fn filter_directives(level: Level) -> String {
    let name = level.as_str().to_lowercase();
    if level == Level::DEBUG {
        return name;
    }
    let http_level = if level == Level::TRACE { "debug" } else { "warn" };

    let mut directives = vec![name];
    directives.extend(HTTP_TARGETS.iter().map(|t| format!("{}={}", t, http_level)));
    directives.join(",")
}

/// Install the global subscriber
pub fn init(verbose: u8, quiet: u8) {
    let filter = std::env::var("LOGGING")
        .or_else(|_| std::env::var("RUST_LOG"))
        .unwrap_or_else(|_| filter_directives(level_for(verbose, quiet)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .with_ansi(false) // CI log viewers show raw escape codes
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_info() {
        assert_eq!(level_for(0, 0), Level::INFO);
    }

    #[test]
    fn test_each_flag_moves_one_step() {
        assert_eq!(level_for(1, 0), Level::DEBUG);
        assert_eq!(level_for(2, 0), Level::TRACE);
        assert_eq!(level_for(0, 1), Level::WARN);
        assert_eq!(level_for(0, 2), Level::ERROR);
        assert_eq!(level_for(2, 1), Level::DEBUG);
    }

    #[test]
    fn test_level_is_clamped() {
        assert_eq!(level_for(9, 0), Level::TRACE);
        assert_eq!(level_for(0, 9), Level::ERROR);
        assert_eq!(level_for(u8::MAX, 0), Level::TRACE);
    }

    #[test]
    fn test_http_crates_follow_debug() {
        assert_eq!(filter_directives(Level::DEBUG), "debug");
        assert_eq!(
            filter_directives(Level::INFO),
            "info,reqwest=warn,hyper=warn,hyper_util=warn"
        );
        assert_eq!(
            filter_directives(Level::TRACE),
            "trace,reqwest=debug,hyper=debug,hyper_util=debug"
        );
    }
}
