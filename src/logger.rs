use env_logger::{Builder, Env};
use log::LevelFilter;

/// Maps repeated `-v` flags onto a level. Nothing below warnings is shown by default.
pub fn verbosity_to_level(verbosity: u8) -> LevelFilter {
    match verbosity {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

/// Installs the global logger. `RUST_LOG`, when set, takes precedence over `verbosity`.
pub fn init(verbosity: u8) {
    let mut builder = Builder::new();
    builder
        .filter_level(verbosity_to_level(verbosity))
        .format_timestamp(None)
        .format_target(false)
        .parse_env(Env::default());

    // A logger may already be installed by an embedding application or a test harness.
    let _ = builder.try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbosity_levels() {
        assert_eq!(verbosity_to_level(0), LevelFilter::Warn);
        assert_eq!(verbosity_to_level(1), LevelFilter::Info);
        assert_eq!(verbosity_to_level(2), LevelFilter::Debug);
        assert_eq!(verbosity_to_level(3), LevelFilter::Trace);
        assert_eq!(verbosity_to_level(200), LevelFilter::Trace);
    }

    #[test]
    fn init_twice_is_harmless() {
        init(1);
        init(2);
    }
}
