//! Logging utilities for CLI output

use tracing_subscriber::filter::LevelFilter;

/// Log level for CLI output
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Suppress all output
    Quiet,
    /// Normal output level
    Normal,
    /// Verbose output with additional details
    Verbose,
}

impl LogLevel {
    /// Level selected by the global `--quiet` / `--verbose` flags
    pub fn from_flags(quiet: bool, verbose: bool) -> Self {
        if quiet {
            LogLevel::Quiet
        } else if verbose {
            LogLevel::Verbose
        } else {
            LogLevel::Normal
        }
    }

    /// Most detailed library event shown at this level
    pub fn level_filter(self) -> LevelFilter {
        match self {
            LogLevel::Quiet => LevelFilter::ERROR,
            LogLevel::Normal => LevelFilter::INFO,
            LogLevel::Verbose => LevelFilter::DEBUG,
        }
    }
}

/// Log a message if the current level permits it
pub fn log(level: LogLevel, required: LogLevel, msg: &str) {
    if level != LogLevel::Quiet && (level == required || required == LogLevel::Normal) {
        println!("{msg}");
    }
}

/// Install the fmt subscriber for library events, writing to stderr
///
/// A second call keeps the first subscriber.
pub fn init_tracing(level: LogLevel) {
    let _ = tracing_subscriber::fmt()
        .with_max_level(level.level_filter())
        .with_target(false)
        .with_thread_ids(false)
        .with_writer(std::io::stderr)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_flags() {
        assert_eq!(LogLevel::from_flags(true, true), LogLevel::Quiet);
        assert_eq!(LogLevel::from_flags(false, true), LogLevel::Verbose);
        assert_eq!(LogLevel::from_flags(false, false), LogLevel::Normal);
    }

    #[test]
    fn test_level_filters() {
        assert_eq!(LogLevel::Quiet.level_filter(), LevelFilter::ERROR);
        assert_eq!(LogLevel::Normal.level_filter(), LevelFilter::INFO);
        assert_eq!(LogLevel::Verbose.level_filter(), LevelFilter::DEBUG);
    }
}
