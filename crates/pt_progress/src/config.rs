use std::time::Duration;

use serde::{Deserialize, Serialize};
use unicode_width::UnicodeWidthChar;

use crate::errors::{ProgressError, Result};

pub const DEFAULT_REFRESH_RATE_MS: u64 = 100;
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 250;
pub const DEFAULT_HEAD: char = '>';
pub const DEFAULT_BODY: char = '=';

/// How wide the fill segment of every bar is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BarWidth {
    /// A fixed number of columns, independent of the terminal
    Fixed(usize),
    /// Whatever is left of the terminal width once the label and percentage are drawn
    Terminal,
}

impl Default for BarWidth {
    fn default() -> Self {
        BarWidth::Terminal
    }
}

/// How the session learns that the terminal geometry changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResizeStrategy {
    /// Wait for SIGWINCH. Falls back to polling where the signal is unavailable.
    Signal,
    /// Re-query the terminal size periodically
    Poll {
        /// Milliseconds between two queries
        interval_ms: u64,
    },
    /// Only react to explicit `notify_resize` calls
    Disabled,
}

impl Default for ResizeStrategy {
    fn default() -> Self {
        ResizeStrategy::Signal
    }
}

/// Configuration of a monitoring session.
///
/// Deserializes with defaults for every missing field, so a host can keep a
/// partial JSON/TOML document around:
///
/// ```json
/// { "refresh_rate_ms": 1, "bar_width": { "fixed": 50 } }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Milliseconds between two render ticks
    pub refresh_rate_ms: u64,
    /// Width policy of the bars
    pub bar_width: BarWidth,
    /// Character drawn at the tip of the filled segment
    pub head: char,
    /// Character used for the filled segment
    pub body: char,
    /// Resize notification strategy
    pub resize: ResizeStrategy,
    /// Restore the cursor and exit when SIGINT/SIGTERM/SIGHUP arrives
    pub restore_on_signal: bool,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            refresh_rate_ms: DEFAULT_REFRESH_RATE_MS,
            bar_width: BarWidth::default(),
            head: DEFAULT_HEAD,
            body: DEFAULT_BODY,
            resize: ResizeStrategy::default(),
            restore_on_signal: true,
        }
    }
}

impl MonitorConfig {
    /// Starts a builder populated with the defaults.
    pub fn builder() -> MonitorConfigBuilder {
        MonitorConfigBuilder::default()
    }

    /// The refresh interval as a [`Duration`].
    pub fn refresh_rate(&self) -> Duration {
        Duration::from_millis(self.refresh_rate_ms)
    }

    /// Checks every field, returning the first configuration error found.
    pub fn validate(&self) -> Result<()> {
        if self.refresh_rate_ms == 0 {
            return Err(ProgressError::config("Refresh rate can't be 0"));
        }
        if self.bar_width == BarWidth::Fixed(0) {
            return Err(ProgressError::config("Bar length can't be 0"));
        }
        if let ResizeStrategy::Poll { interval_ms: 0 } = self.resize {
            return Err(ProgressError::config("Resize poll interval can't be 0"));
        }
        for (name, c) in [("head", self.head), ("body", self.body)] {
            if c.width() != Some(1) {
                return Err(ProgressError::config(format!(
                    "{} character {:?} must occupy exactly one terminal column",
                    name, c
                )));
            }
        }
        Ok(())
    }
}

/// Fluent builder for [`MonitorConfig`].
#[derive(Debug, Clone, Default)]
pub struct MonitorConfigBuilder {
    config: MonitorConfig,
}

impl MonitorConfigBuilder {
    pub fn refresh_rate(mut self, rate: Duration) -> Self {
        self.config.refresh_rate_ms = rate.as_millis().try_into().unwrap_or(u64::MAX);
        self
    }

    pub fn refresh_rate_ms(mut self, ms: u64) -> Self {
        self.config.refresh_rate_ms = ms;
        self
    }

    pub fn bar_width(mut self, width: BarWidth) -> Self {
        self.config.bar_width = width;
        self
    }

    /// Shorthand for `bar_width(BarWidth::Fixed(length))`.
    pub fn bar_length(self, length: usize) -> Self {
        self.bar_width(BarWidth::Fixed(length))
    }

    pub fn head(mut self, head: char) -> Self {
        self.config.head = head;
        self
    }

    pub fn body(mut self, body: char) -> Self {
        self.config.body = body;
        self
    }

    pub fn resize(mut self, strategy: ResizeStrategy) -> Self {
        self.config.resize = strategy;
        self
    }

    pub fn restore_on_signal(mut self, restore: bool) -> Self {
        self.config.restore_on_signal = restore;
        self
    }

    /// Validates and returns the configuration.
    pub fn build(self) -> Result<MonitorConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = MonitorConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.refresh_rate(), Duration::from_millis(100));
        assert_eq!(config.bar_width, BarWidth::Terminal);
    }

    #[test]
    fn test_zero_refresh_rate_rejected() {
        let err = MonitorConfig::builder().refresh_rate_ms(0).build().unwrap_err();
        assert_eq!(err.to_string(), "[config] Refresh rate can't be 0");
    }

    #[test]
    fn test_zero_bar_length_rejected() {
        let err = MonitorConfig::builder().bar_length(0).build().unwrap_err();
        assert_eq!(err.to_string(), "[config] Bar length can't be 0");
    }

    #[test]
    fn test_zero_poll_interval_rejected() {
        let result = MonitorConfig::builder()
            .resize(ResizeStrategy::Poll { interval_ms: 0 })
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn test_wide_characters_rejected() {
        assert!(MonitorConfig::builder().head('界').build().is_err());
        assert!(MonitorConfig::builder().body('\t').build().is_err());
        assert!(MonitorConfig::builder().body('█').build().is_ok());
    }

    #[test]
    fn test_builder_sets_every_field() {
        let config = MonitorConfig::builder()
            .refresh_rate(Duration::from_millis(1))
            .bar_length(50)
            .head('#')
            .body('-')
            .resize(ResizeStrategy::Disabled)
            .restore_on_signal(false)
            .build()
            .unwrap();
        assert_eq!(config.refresh_rate_ms, 1);
        assert_eq!(config.bar_width, BarWidth::Fixed(50));
        assert_eq!(config.head, '#');
        assert_eq!(config.body, '-');
        assert_eq!(config.resize, ResizeStrategy::Disabled);
        assert!(!config.restore_on_signal);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: MonitorConfig =
            serde_json::from_str(r#"{ "refresh_rate_ms": 1, "bar_width": { "fixed": 50 } }"#).unwrap();
        assert_eq!(config.refresh_rate_ms, 1);
        assert_eq!(config.bar_width, BarWidth::Fixed(50));
        assert_eq!(config.head, DEFAULT_HEAD);
        assert_eq!(config.resize, ResizeStrategy::Signal);

        let config: MonitorConfig =
            serde_json::from_str(r#"{ "resize": { "poll": { "interval_ms": 20 } } }"#).unwrap();
        assert_eq!(config.resize, ResizeStrategy::Poll { interval_ms: 20 });
        assert_eq!(config.bar_width, BarWidth::Terminal);
    }
}
