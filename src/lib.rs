pub mod capture;
pub mod compose;
pub mod config;
pub mod context;
pub mod error;
pub mod export;
pub mod raster;
pub mod snapshot;
pub mod utils;

// Re-export commonly used types for convenience
pub use config::ExportConfig;
pub use error::{ExportError, Result};
pub use export::{ExportMode, ExportReport, Exporter, FallbackReason};
pub use snapshot::{DashboardSnapshot, JsonSnapshotSource, SnapshotSource};

use capture::html::StaticPage;
use capture::locator::{Candidate, Locator};
use capture::readiness::{Readiness, wait_until_loaded};
use capture::webdriver::{self, ScreenshotRasterizer, WebDriverProbe};
use capture::{DocumentProbe, Rect};
use context::StaticContext;
use std::path::{Path, PathBuf};

/// Main builder for exporting one dashboard to PDF
pub struct Export<S> {
    source: S,
    config: ExportConfig,
    metadata_only: bool,
    require_visual: bool,
}

impl<S: SnapshotSource> Export<S> {
    /// Create a new Export builder reading the dashboard from `source`
    pub fn new(source: S) -> Self {
        Self {
            source,
            config: ExportConfig::default(),
            metadata_only: false,
            require_visual: false,
        }
    }

    /// Replace the whole configuration
    pub fn with_config(mut self, config: ExportConfig) -> Self {
        self.config = config;
        self
    }

    /// Load configuration from a file
    pub fn with_config_file(self, path: impl AsRef<Path>) -> Result<Self> {
        let config = ExportConfig::from_file(path)?;
        Ok(self.with_config(config))
    }

    /// Full URL of the dashboard page to capture
    pub fn with_dashboard_url(mut self, url: &str) -> Self {
        self.config.dashboard_url = Some(url.to_string());
        self
    }

    /// Organization URL used to build the dashboard page URL
    pub fn with_organization_url(mut self, url: &str) -> Self {
        self.config.organization_url = Some(url.to_string());
        self
    }

    /// Project name shown in headers
    pub fn with_project(mut self, project: &str) -> Self {
        self.config.project = project.to_string();
        self
    }

    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.output_dir = dir.into();
        self
    }

    /// Upper bound on waiting for loading indicators to clear
    pub fn with_max_wait(mut self, millis: u64) -> Self {
        self.config.readiness.max_wait_ms = millis;
        self
    }

    pub fn with_header(mut self, include: bool) -> Self {
        self.config.include_header = include;
        self
    }

    pub fn with_widgets(mut self, include: bool) -> Self {
        self.config.include_widgets = include;
        self
    }

    /// Skip the browser and write the text-only document straight away
    pub fn metadata_only(mut self, enabled: bool) -> Self {
        self.metadata_only = enabled;
        self
    }

    /// Fail instead of degrading when no live page can be opened
    pub fn require_visual(mut self, enabled: bool) -> Self {
        self.require_visual = enabled;
        self
    }

    /// Run the export and report what was written
    pub async fn generate(mut self) -> Result<ExportReport> {
        // Override the WebDriver URL with an environment variable if provided
        if let Ok(webdriver_url) = std::env::var("WEBDRIVER_URL") {
            if !webdriver_url.is_empty() {
                self.config.webdriver_url = webdriver_url;
            }
        }
        self.config.validate()?;

        let snapshot = self.source.fetch().await?;
        ::log::info!(
            "Exporting dashboard {} ({} widgets)",
            snapshot.name,
            snapshot.widgets.len()
        );

        let context = StaticContext::new(&self.config.project);
        let exporter = Exporter::new(&self.config, &context);

        if self.metadata_only {
            return exporter
                .metadata_only(&snapshot, FallbackReason::NoLivePage)
                .await;
        }

        match self.capture(&exporter, &snapshot).await {
            Err(ExportError::WebDriver(e)) if !self.require_visual => {
                ::log::warn!("No live dashboard page, exporting metadata only: {}", e);
                exporter
                    .metadata_only(&snapshot, FallbackReason::NoLivePage)
                    .await
            }
            result => result,
        }
    }

    fn dashboard_url(&self, snapshot: &DashboardSnapshot) -> Result<String> {
        if let Some(url) = &self.config.dashboard_url {
            return Ok(url.clone());
        }
        match &self.config.organization_url {
            Some(base) => {
                Ok(utils::build_dashboard_url(base, &self.config.project, &snapshot.id)?.to_string())
            }
            None => Err(ExportError::WebDriver(
                "no dashboard or organization URL configured".to_string(),
            )),
        }
    }

    async fn capture(
        &self,
        exporter: &Exporter<'_>,
        snapshot: &DashboardSnapshot,
    ) -> Result<ExportReport> {
        let url = self.dashboard_url(snapshot)?;
        let client = webdriver::connect(&self.config.webdriver_url).await?;

        let result = match webdriver::open_dashboard(&client, &url).await {
            Ok(()) => {
                let probe = WebDriverProbe::new(client.clone());
                let rasterizer = ScreenshotRasterizer::new(client.clone());
                exporter.run(&probe, &rasterizer, snapshot).await
            }
            Err(e) => Err(e),
        };

        // Close the WebDriver session on every path
        if let Err(e) = client.close().await {
            ::log::warn!("Failed to close WebDriver session: {}", e);
        }
        result
    }
}

/// What the locator and readiness check found in a saved page
#[derive(Debug, Clone)]
pub struct ProbeReport {
    pub candidate: Option<Candidate>,
    pub rect: Option<Rect>,
    pub readiness: Readiness,
}

/// Run element location and the loading check against a saved HTML page
pub async fn probe_html(path: impl AsRef<Path>, config: &ExportConfig) -> Result<ProbeReport> {
    let page = StaticPage::from_file(path)?;
    let probe = page.probe();

    let (candidate, rect) = match Locator::new(&config.locator).locate(&probe).await {
        Some(located) => {
            let rect = probe.rect(&located.node).await?;
            (Some(located.candidate), Some(rect))
        }
        None => (None, None),
    };
    let readiness = wait_until_loaded(&probe, &config.readiness).await;

    Ok(ProbeReport {
        candidate,
        rect,
        readiness,
    })
}
