//! Driver configuration.

use std::time::Duration;

const DEFAULT_RECEIVE_TIMEOUT: Duration = Duration::from_millis(2000);
const DEFAULT_ENTER_COMMAND_MODE_GUARD: Duration = Duration::from_millis(1200);
const DEFAULT_ENTER_COMMAND_MODE_TIMEOUT: Duration = Duration::from_millis(1500);

/// The module's serial operating mode.
///
/// Only `Api` and `ApiEscape` are handled by this driver; a module left in
/// transparent AT mode or an unrecognized mode fails every command
/// operation with `InvalidOperatingMode` rather than attempting to parse
/// plain-text responses as frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperatingMode {
    /// API mode 1 (no byte-stuffing).
    Api,
    /// API mode 2 (escaped / byte-stuffed).
    ApiEscape,
}

impl OperatingMode {
    /// Whether frames written in this mode must be escaped.
    #[must_use]
    pub fn is_escaped(self) -> bool {
        matches!(self, Self::ApiEscape)
    }
}

/// Tunable driver parameters, injected rather than hard-coded so tests can
/// exercise alternate timings without waiting on real clocks.
#[derive(Debug, Clone)]
pub struct DriverConfig {
    /// How long a caller waits for a correlated response before timing out.
    pub receive_timeout: Duration,
    /// Guard time required before/after the `+++` command-mode escape
    /// sequence, for devices that start in transparent mode.
    pub enter_command_mode_guard: Duration,
    /// How long to wait for the `OK` reply after sending `+++`.
    pub enter_command_mode_timeout: Duration,
    /// The module's operating mode.
    pub operating_mode: OperatingMode,
    /// `tracing` span name used by the Reader and Correlator to correlate
    /// log lines for a given device instance.
    pub log_target: &'static str,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            receive_timeout: DEFAULT_RECEIVE_TIMEOUT,
            enter_command_mode_guard: DEFAULT_ENTER_COMMAND_MODE_GUARD,
            enter_command_mode_timeout: DEFAULT_ENTER_COMMAND_MODE_TIMEOUT,
            operating_mode: OperatingMode::ApiEscape,
            log_target: "xbee",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = DriverConfig::default();
        assert_eq!(config.receive_timeout, Duration::from_millis(2000));
        assert_eq!(config.enter_command_mode_guard, Duration::from_millis(1200));
        assert_eq!(config.enter_command_mode_timeout, Duration::from_millis(1500));
        assert_eq!(config.operating_mode, OperatingMode::ApiEscape);
    }

    #[test]
    fn api_escape_is_escaped_api_is_not() {
        assert!(OperatingMode::ApiEscape.is_escaped());
        assert!(!OperatingMode::Api.is_escaped());
    }
}
