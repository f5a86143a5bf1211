//! Configuration models.
//!
//! Collection timings and bounds are empirical values that depend on how fast
//! the host re-renders, so every one of them is configurable. Markers describe
//! how the chat client tags its elements.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::selector::Selector;

/// Timing and bounds of the scroll collector.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectorConfig {
    /// Wait after each scroll-to-top, in milliseconds.
    #[serde(default = "default_top_settle_ms")]
    pub top_settle_ms: u64,

    /// Pause between the two sweeps, in milliseconds.
    #[serde(default = "default_bottom_pause_ms")]
    pub bottom_pause_ms: u64,

    /// Wait after each scroll-to-bottom, in milliseconds.
    #[serde(default = "default_bottom_settle_ms")]
    pub bottom_settle_ms: u64,

    /// Upper bound on scroll-to-top attempts.
    #[serde(default = "default_max_top_iterations")]
    pub max_top_iterations: usize,

    /// Upper bound on scroll-to-bottom attempts.
    #[serde(default = "default_max_bottom_iterations")]
    pub max_bottom_iterations: usize,

    /// Consecutive unchanged offsets that mean the top was reached.
    #[serde(default = "default_stable_top_checks")]
    pub stable_top_checks: usize,

    /// Distance from the end that counts as the bottom, in pixels.
    #[serde(default = "default_bottom_tolerance_px")]
    pub bottom_tolerance_px: f64,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            top_settle_ms: default_top_settle_ms(),
            bottom_pause_ms: default_bottom_pause_ms(),
            bottom_settle_ms: default_bottom_settle_ms(),
            max_top_iterations: default_max_top_iterations(),
            max_bottom_iterations: default_max_bottom_iterations(),
            stable_top_checks: default_stable_top_checks(),
            bottom_tolerance_px: default_bottom_tolerance_px(),
        }
    }
}

impl CollectorConfig {
    #[must_use]
    pub const fn top_settle(&self) -> Duration {
        Duration::from_millis(self.top_settle_ms)
    }

    #[must_use]
    pub const fn bottom_pause(&self) -> Duration {
        Duration::from_millis(self.bottom_pause_ms)
    }

    #[must_use]
    pub const fn bottom_settle(&self) -> Duration {
        Duration::from_millis(self.bottom_settle_ms)
    }
}

const fn default_top_settle_ms() -> u64 {
    350
}

const fn default_bottom_pause_ms() -> u64 {
    500
}

const fn default_bottom_settle_ms() -> u64 {
    300
}

const fn default_max_top_iterations() -> usize {
    300
}

const fn default_max_bottom_iterations() -> usize {
    50
}

const fn default_stable_top_checks() -> usize {
    3
}

const fn default_bottom_tolerance_px() -> f64 {
    10.0
}

/// Field resolution settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractorConfig {
    /// How many ancestor levels the resolver climbs.
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,

    /// Attribute of the time element holding the machine-readable instant.
    #[serde(default = "default_time_attribute")]
    pub time_attribute: String,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            max_depth: default_max_depth(),
            time_attribute: default_time_attribute(),
        }
    }
}

const fn default_max_depth() -> usize {
    10
}

fn default_time_attribute() -> String {
    "datetime".to_string()
}

/// Structural markers of the chat client's markup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarkerConfig {
    /// One node per message body.
    #[serde(default = "default_message")]
    pub message: Selector,

    /// Author display name.
    #[serde(default = "default_author")]
    pub author: Selector,

    /// Time element with a machine-readable instant.
    #[serde(default = "default_time")]
    pub time: Selector,

    /// Chat title element.
    #[serde(default = "default_title")]
    pub title: Selector,

    /// Page heading used when no title element exists.
    #[serde(default = "default_heading")]
    pub heading: Selector,

    /// Loose marker used when probing unknown containers.
    #[serde(default = "default_message_hint")]
    pub message_hint: Selector,

    /// Known scroll containers, tried in order.
    #[serde(default = "default_containers")]
    pub containers: Vec<Selector>,
}

impl Default for MarkerConfig {
    fn default() -> Self {
        Self {
            message: default_message(),
            author: default_author(),
            time: default_time(),
            title: default_title(),
            heading: default_heading(),
            message_hint: default_message_hint(),
            containers: default_containers(),
        }
    }
}

fn default_message() -> Selector {
    Selector::any().with_attr_eq("data-tid", "chat-pane-message")
}

fn default_author() -> Selector {
    Selector::any().with_attr_eq("data-tid", "message-author-name")
}

fn default_time() -> Selector {
    Selector::tag("time").with_attr("datetime")
}

fn default_title() -> Selector {
    Selector::any().with_attr_eq("data-tid", "chat-title")
}

fn default_heading() -> Selector {
    Selector::tag("h2")
}

fn default_message_hint() -> Selector {
    Selector::any().with_attr_contains("data-tid", "message")
}

fn default_containers() -> Vec<Selector> {
    vec![
        Selector::any().with_attr_eq("data-tid", "message-pane-list-container"),
        Selector::any().with_attr_eq("data-tid", "chat-pane-list"),
        Selector::tag("div").with_attr_contains("class", "fui-ChatMessageList"),
        Selector::tag("div").with_attr_contains("class", "message-list"),
    ]
}

/// Export delivery settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    /// Directory export files are written to.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
        }
    }
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("exports")
}

/// Complete application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub collector: CollectorConfig,

    #[serde(default)]
    pub extractor: ExtractorConfig,

    #[serde(default)]
    pub markers: MarkerConfig,

    #[serde(default)]
    pub export: ExportConfig,
}

impl AppConfig {
    /// Get the default data directory path.
    #[must_use]
    pub fn default_data_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".teams-chat-export")
    }

    /// Get the default config file path.
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        Self::default_data_dir().join("config.toml")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.collector.max_top_iterations, 300);
        assert_eq!(config.collector.max_bottom_iterations, 50);
        assert_eq!(config.collector.stable_top_checks, 3);
        assert_eq!(config.collector.top_settle(), Duration::from_millis(350));
        assert_eq!(config.extractor.max_depth, 10);
        assert_eq!(config.markers.containers.len(), 4);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: AppConfig = toml::from_str(
            r#"
            [collector]
            top_settle_ms = 50

            [markers]
            author = "span.author"
            "#,
        )
        .unwrap();

        assert_eq!(config.collector.top_settle_ms, 50);
        assert_eq!(config.collector.bottom_settle_ms, 300);
        assert_eq!(config.markers.author, Selector::parse("span.author").unwrap());
        assert_eq!(config.markers.time, Selector::parse("time[datetime]").unwrap());
    }

    #[test]
    fn test_bad_selector_is_rejected() {
        let parsed: Result<AppConfig, _> = toml::from_str("[markers]\nmessage = \"div[\"\n");
        assert!(parsed.is_err());
    }
}
