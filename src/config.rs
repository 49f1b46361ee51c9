use crate::error::{ExportError, Result};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Top-level configuration for a dashboard export
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    /// Full URL of the dashboard page to capture
    #[serde(default)]
    pub dashboard_url: Option<String>,

    /// Organization base URL, combined with `project` and the snapshot id
    /// when `dashboard_url` is not set
    #[serde(default)]
    pub organization_url: Option<String>,

    /// Project name shown in document headers
    #[serde(default)]
    pub project: String,

    /// URL for the WebDriver instance
    #[serde(default = "default_webdriver_url")]
    pub webdriver_url: String,

    /// Directory the PDF is written to
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Emit the header block in metadata-only documents
    #[serde(default = "default_true")]
    pub include_header: bool,

    /// Emit the widget listing in metadata-only documents
    #[serde(default = "default_true")]
    pub include_widgets: bool,

    #[serde(default)]
    pub page_format: PageFormat,

    #[serde(default)]
    pub locator: LocatorConfig,

    #[serde(default)]
    pub readiness: ReadinessConfig,

    #[serde(default)]
    pub raster: RasterOptions,
}

/// Candidate selectors used to find the dashboard's visual root
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocatorConfig {
    /// Selectors tried in order, most specific first
    #[serde(default = "default_candidate_selectors")]
    pub selectors: Vec<String>,

    /// Selector for any widget element, used by the ancestor fallback
    #[serde(default = "default_widget_selector")]
    pub widget_selector: String,
}

/// Polling parameters for the loading-indicator wait
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadinessConfig {
    #[serde(default = "default_max_wait_ms")]
    pub max_wait_ms: u64,

    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Extra settle time once no indicator is left
    #[serde(default = "default_grace_period_ms")]
    pub grace_period_ms: u64,

    #[serde(default = "default_loading_selectors")]
    pub loading_selectors: Vec<String>,
}

/// Options passed to the rasterizer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RasterOptions {
    /// Output pixels per CSS pixel
    #[serde(default = "default_scale")]
    pub scale: f32,

    /// Fill colour behind transparent regions, as `#rrggbb`
    #[serde(default = "default_background_color")]
    pub background_color: String,

    /// Keep cross-origin content even if it taints the output
    #[serde(default = "default_true")]
    pub allow_taint: bool,

    /// Load cross-origin images with CORS
    #[serde(default = "default_true")]
    pub use_cors: bool,
}

/// Paper size of the generated document
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageFormat {
    /// 210 x 297 mm
    #[default]
    A4,
    /// 215.9 x 279.4 mm
    Letter,
}

impl PageFormat {
    /// Portrait dimensions in millimeters (width, height)
    pub fn dimensions_mm(&self) -> (f32, f32) {
        match self {
            PageFormat::A4 => (210.0, 297.0),
            PageFormat::Letter => (215.9, 279.4),
        }
    }
}

fn default_webdriver_url() -> String {
    "http://localhost:4444".to_string()
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_true() -> bool {
    true
}

fn default_candidate_selectors() -> Vec<String> {
    [
        ".dashboard-container",
        "[data-testid=\"dashboard-container\"]",
        ".dashboard-content",
        ".dashboard-canvas",
        ".dashboard-grid",
        ".grid-container",
        "[class*=\"dashboard\"]",
        "main[role=\"main\"]",
        "[data-vss-hub=\"dashboard\"]",
        ".hub-content",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_widget_selector() -> String {
    "[class*=\"widget\"]".to_string()
}

fn default_max_wait_ms() -> u64 {
    15_000
}

fn default_poll_interval_ms() -> u64 {
    500
}

fn default_grace_period_ms() -> u64 {
    2_000
}

fn default_loading_selectors() -> Vec<String> {
    [
        ".loading",
        "[class*=\"loading\"]",
        ".spinner",
        "[class*=\"spinner\"]",
        "[aria-busy=\"true\"]",
        ".ms-Spinner",
        ".bowtie-spinner",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_scale() -> f32 {
    2.0
}

fn default_background_color() -> String {
    "#ffffff".to_string()
}

impl Default for LocatorConfig {
    fn default() -> Self {
        Self {
            selectors: default_candidate_selectors(),
            widget_selector: default_widget_selector(),
        }
    }
}

impl Default for ReadinessConfig {
    fn default() -> Self {
        Self {
            max_wait_ms: default_max_wait_ms(),
            poll_interval_ms: default_poll_interval_ms(),
            grace_period_ms: default_grace_period_ms(),
            loading_selectors: default_loading_selectors(),
        }
    }
}

impl ReadinessConfig {
    pub fn max_wait(&self) -> Duration {
        Duration::from_millis(self.max_wait_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn grace_period(&self) -> Duration {
        Duration::from_millis(self.grace_period_ms)
    }

    /// All loading selectors as one selector group, `None` when there are none
    pub fn loading_selector_group(&self) -> Option<String> {
        let selectors: Vec<&str> = self
            .loading_selectors
            .iter()
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .collect();
        (!selectors.is_empty()).then(|| selectors.join(", "))
    }
}

impl Default for RasterOptions {
    fn default() -> Self {
        Self {
            scale: default_scale(),
            background_color: default_background_color(),
            allow_taint: true,
            use_cors: true,
        }
    }
}

impl RasterOptions {
    /// Parse `background_color` into RGB components
    pub fn background_rgb(&self) -> Result<[u8; 3]> {
        let hex = self.background_color.trim_start_matches('#');
        let invalid = || ExportError::Config(format!("bad colour {:?}", self.background_color));

        if !hex.is_ascii() {
            return Err(invalid());
        }
        let expanded = match hex.len() {
            3 => hex.chars().flat_map(|c| [c, c]).collect::<String>(),
            6 => hex.to_string(),
            _ => return Err(invalid()),
        };

        let mut rgb = [0u8; 3];
        for (i, channel) in rgb.iter_mut().enumerate() {
            *channel =
                u8::from_str_radix(&expanded[i * 2..i * 2 + 2], 16).map_err(|_| invalid())?;
        }
        Ok(rgb)
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            dashboard_url: None,
            organization_url: None,
            project: String::new(),
            webdriver_url: default_webdriver_url(),
            output_dir: default_output_dir(),
            include_header: true,
            include_widgets: true,
            page_format: PageFormat::default(),
            locator: LocatorConfig::default(),
            readiness: ReadinessConfig::default(),
            raster: RasterOptions::default(),
        }
    }
}

impl ExportConfig {
    /// Load configuration from a file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let mut file = File::open(path)
            .map_err(|e| ExportError::Config(format!("{}: {}", path.display(), e)))?;
        let mut contents = String::new();
        file.read_to_string(&mut contents)
            .map_err(|e| ExportError::Config(format!("{}: {}", path.display(), e)))?;

        Self::from_json(&contents)
    }

    /// Load configuration from a JSON string
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| ExportError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the pipeline cannot work with
    pub fn validate(&self) -> Result<()> {
        if !(self.raster.scale > 0.0) {
            return Err(ExportError::Config("raster scale must be positive".to_string()));
        }
        if self.readiness.poll_interval_ms == 0 {
            return Err(ExportError::Config(
                "poll interval must be at least 1ms".to_string(),
            ));
        }
        self.raster.background_rgb()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_json_uses_defaults() {
        let config = ExportConfig::from_json("{}").unwrap();
        assert_eq!(config.webdriver_url, "http://localhost:4444");
        assert_eq!(config.readiness.max_wait(), Duration::from_secs(15));
        assert_eq!(config.readiness.poll_interval(), Duration::from_millis(500));
        assert_eq!(config.readiness.grace_period(), Duration::from_secs(2));
        assert_eq!(config.locator.selectors[0], ".dashboard-container");
        assert_eq!(config.locator.selectors.len(), 10);
        assert!(config.include_header && config.include_widgets);
        assert_eq!(config.page_format, PageFormat::A4);
    }

    #[test]
    fn test_partial_override() {
        let json = r##"{
            "project": "Fabrikam",
            "page_format": "letter",
            "readiness": {"max_wait_ms": 3000},
            "raster": {"scale": 1.0, "background_color": "#000"}
        }"##;
        let config = ExportConfig::from_json(json).unwrap();
        assert_eq!(config.project, "Fabrikam");
        assert_eq!(config.page_format, PageFormat::Letter);
        assert_eq!(config.readiness.max_wait_ms, 3000);
        assert_eq!(config.readiness.poll_interval_ms, 500);
        assert_eq!(config.raster.background_rgb().unwrap(), [0, 0, 0]);
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(ExportConfig::from_json(r#"{"raster": {"scale": 0}}"#).is_err());
        assert!(ExportConfig::from_json(r#"{"raster": {"background_color": "white"}}"#).is_err());
        assert!(ExportConfig::from_json(r#"{"readiness": {"poll_interval_ms": 0}}"#).is_err());
    }

    #[test]
    fn test_background_rgb() {
        let options = RasterOptions::default();
        assert_eq!(options.background_rgb().unwrap(), [255, 255, 255]);
    }

    #[test]
    fn test_loading_selector_group() {
        let readiness = ReadinessConfig::default();
        let group = readiness.loading_selector_group().unwrap();
        assert!(group.starts_with(".loading, [class*=\"loading\"]"));
        assert!(group.ends_with(".bowtie-spinner"));
    }

    #[test]
    fn test_empty_loading_selectors_have_no_group() {
        let mut readiness = ReadinessConfig::default();
        readiness.loading_selectors = vec![" ".to_string()];
        assert_eq!(readiness.loading_selector_group(), None);

        readiness.loading_selectors.clear();
        assert_eq!(readiness.loading_selector_group(), None);
    }
}
