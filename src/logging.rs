//! Terminal logger setup. Diagnostics go to stderr so they never mix with prompts on stdout.

use log::LevelFilter;
use simplelog::{ColorChoice, ConfigBuilder, TermLogger, TerminalMode};

/// Level for the given CLI flags: `--quiet` wins over `--verbose`.
pub fn level_for(quiet: bool, verbose: bool) -> LevelFilter {
    if quiet {
        LevelFilter::Error
    } else if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    }
}

/// Install the global logger. A second call is a no-op.
pub fn initialize(level: LevelFilter) {
    let config = ConfigBuilder::new()
        .set_time_format_rfc3339()
        .set_target_level(LevelFilter::Error)
        .add_filter_allow_str("trailscrape")
        .build();
    let _ = TermLogger::init(level, config, TerminalMode::Stderr, ColorChoice::Auto);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quiet_overrides_verbose() {
        assert_eq!(level_for(true, true), LevelFilter::Error);
        assert_eq!(level_for(false, true), LevelFilter::Debug);
        assert_eq!(level_for(false, false), LevelFilter::Warn);
    }

    #[test]
    fn initialize_twice_does_not_panic() {
        initialize(LevelFilter::Debug);
        initialize(LevelFilter::Debug);
    }
}
