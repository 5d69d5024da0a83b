//! Configuration schema definitions.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub renderer: RendererConfig,

    #[serde(default)]
    pub extraction: ExtractionConfig,

    #[serde(default)]
    pub output: OutputConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Connection to the browser that renders the editor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RendererConfig {
    /// CDP HTTP endpoint of an already running browser.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Attach to the first tab whose URL contains this text; a new tab is
    /// opened when unset or when nothing matches.
    #[serde(default)]
    pub page_url_contains: Option<String>,

    #[serde(default = "default_call_timeout")]
    pub call_timeout_secs: u64,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            page_url_contains: None,
            call_timeout_secs: default_call_timeout(),
        }
    }
}

fn default_endpoint() -> String {
    "http://localhost:9222".to_string()
}

fn default_call_timeout() -> u64 {
    30
}

/// Extraction heuristics and pacing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtractionConfig {
    /// Editor page listing the workflows.
    #[serde(default)]
    pub editor_url: String,

    /// Stop after this many workflows.
    #[serde(default)]
    pub max_workflows: Option<usize>,

    /// Only extract workflows whose name contains this text.
    #[serde(default)]
    pub name_filter: Option<String>,

    /// Persist workflows with no visible steps instead of skipping them.
    #[serde(default)]
    pub save_empty_workflows: bool,

    /// Capture one screenshot per workflow next to its snapshot.
    #[serde(default)]
    pub screenshots: bool,

    #[serde(default)]
    pub canvas: CanvasConfig,

    #[serde(default)]
    pub selectors: SelectorConfig,

    #[serde(default)]
    pub timing: TimingConfig,

    #[serde(default)]
    pub neutral_point: PointConfig,
}

/// Horizontal band in which canvas content is rendered.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CanvasConfig {
    /// Inclusive left edge; anything left of it is navigation chrome.
    #[serde(default = "default_canvas_min_x")]
    pub min_x: f64,

    /// Exclusive right edge, unbounded when unset.
    #[serde(default)]
    pub max_x: Option<f64>,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            min_x: default_canvas_min_x(),
            max_x: None,
        }
    }
}

fn default_canvas_min_x() -> f64 {
    250.0
}

/// Selectors describing the editor's markup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectorConfig {
    /// Entries of the workflow navigation list.
    #[serde(default = "default_nav_item_selector")]
    pub nav_item: String,

    /// Elements that may carry a step label.
    #[serde(default = "default_step_selector")]
    pub step: String,

    /// Regular expression a step label starts with.
    #[serde(default = "default_step_pattern")]
    pub step_pattern: String,

    /// Properties panel candidates.
    #[serde(default = "default_panel_selector")]
    pub panel: String,

    /// Element whose text is scanned for workflow-level metadata.
    #[serde(default = "default_page_selector")]
    pub page: String,

    /// Attribute of a navigation entry holding the source identifier.
    #[serde(default = "default_wf_item_attribute")]
    pub wf_item_attribute: String,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            nav_item: default_nav_item_selector(),
            step: default_step_selector(),
            step_pattern: default_step_pattern(),
            panel: default_panel_selector(),
            page: default_page_selector(),
            wf_item_attribute: default_wf_item_attribute(),
        }
    }
}

fn default_nav_item_selector() -> String {
    "[data-wf-item]".to_string()
}

fn default_step_selector() -> String {
    "div".to_string()
}

fn default_step_pattern() -> String {
    r"^Step\s+\d+".to_string()
}

fn default_panel_selector() -> String {
    r#"[class*="property-editor"], [class*="inspector"], [class*="properties-panel"]"#.to_string()
}

fn default_page_selector() -> String {
    "body".to_string()
}

fn default_wf_item_attribute() -> String {
    "data-wf-item".to_string()
}

/// Fixed settling delays, in milliseconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimingConfig {
    #[serde(default = "default_navigation_settle")]
    pub navigation_settle_ms: u64,

    #[serde(default = "default_selection_settle")]
    pub selection_settle_ms: u64,

    #[serde(default = "default_click_settle")]
    pub click_settle_ms: u64,

    /// Used for the single retry after a transient UI failure.
    #[serde(default = "default_retry_settle")]
    pub retry_settle_ms: u64,
}

impl TimingConfig {
    pub fn navigation_settle(&self) -> Duration {
        Duration::from_millis(self.navigation_settle_ms)
    }

    pub fn selection_settle(&self) -> Duration {
        Duration::from_millis(self.selection_settle_ms)
    }

    pub fn click_settle(&self) -> Duration {
        Duration::from_millis(self.click_settle_ms)
    }

    pub fn retry_settle(&self) -> Duration {
        Duration::from_millis(self.retry_settle_ms)
    }

    /// All delays set to zero, for scripted renderers.
    pub fn immediate() -> Self {
        Self {
            navigation_settle_ms: 0,
            selection_settle_ms: 0,
            click_settle_ms: 0,
            retry_settle_ms: 0,
        }
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            navigation_settle_ms: default_navigation_settle(),
            selection_settle_ms: default_selection_settle(),
            click_settle_ms: default_click_settle(),
            retry_settle_ms: default_retry_settle(),
        }
    }
}

fn default_navigation_settle() -> u64 {
    3000
}

fn default_selection_settle() -> u64 {
    2000
}

fn default_click_settle() -> u64 {
    1000
}

fn default_retry_settle() -> u64 {
    2500
}

/// A point in page coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointConfig {
    pub x: f64,
    pub y: f64,
}

impl Default for PointConfig {
    fn default() -> Self {
        Self { x: 600.0, y: 40.0 }
    }
}

/// Where snapshots are written.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_root_dir")]
    pub root_dir: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            root_dir: default_root_dir(),
        }
    }
}

fn default_root_dir() -> PathBuf {
    dirs::home_dir()
        .map(|h| h.join(".flowscribe").join("snapshots"))
        .unwrap_or_else(|| PathBuf::from("/tmp/flowscribe/snapshots"))
}

/// Log output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Directory for daily-rotated log files; console only when unset.
    #[serde(default)]
    pub dir: Option<PathBuf>,

    #[serde(default = "default_ansi")]
    pub ansi: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            dir: None,
            ansi: default_ansi(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_ansi() -> bool {
    true
}

#[cfg(test)]
#[path = "schema_tests.rs"]
mod tests;
