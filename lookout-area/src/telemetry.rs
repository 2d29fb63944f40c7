//! Tracing subscriber setup.
//!
//! `RUST_LOG` wins when set; otherwise the level comes from
//! `general.log_level` in the configuration.

use lookout_core::config::GeneralConfig;
use tracing_subscriber::EnvFilter;

/// Log line format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Pretty,
    /// One JSON object per line.
    Json,
}

/// The filter [`init`] would install.
#[must_use]
pub fn filter(general: &GeneralConfig) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directive(&general.log_level)))
}

/// Filter directive for a configured level. Our own crates log at that
/// level; everything else stays at `warn`.
#[must_use]
pub fn directive(level: &str) -> String {
    format!("warn,lookout_core={level},lookout_area={level}")
}

/// Install the global subscriber. Returns `false` if one was already set.
pub fn init(general: &GeneralConfig, format: LogFormat) -> bool {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter(general))
        .with_target(true)
        .with_writer(std::io::stderr);
    match format {
        LogFormat::Pretty => builder.try_init().is_ok(),
        LogFormat::Json => builder.json().try_init().is_ok(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directive_scopes_our_crates() {
        assert_eq!(directive("debug"), "warn,lookout_core=debug,lookout_area=debug");
    }

    #[test]
    fn second_init_is_refused() {
        let general = GeneralConfig::default();
        let _ = init(&general, LogFormat::Pretty);
        assert!(!init(&general, LogFormat::Json));
    }
}
