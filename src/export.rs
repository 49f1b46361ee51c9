use crate::capture::DocumentProbe;
use crate::capture::locator::{Candidate, Locator};
use crate::capture::readiness::{Readiness, wait_until_loaded};
use crate::compose::ExportDocument;
use crate::compose::layout::Composer;
use crate::compose::pdf;
use crate::config::ExportConfig;
use crate::context::ContextProvider;
use crate::error::{ExportError, Result};
use crate::raster::Rasterizer;
use crate::snapshot::DashboardSnapshot;
use std::path::{Path, PathBuf};

/// Why a visual export degraded to a metadata-only document
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FallbackReason {
    /// No live page was available to capture
    NoLivePage,
    /// Nothing on the page looked like a dashboard
    LocatorMiss,
    /// The located element could not be rasterized
    RasterizationFailed(String),
}

/// What kind of document was written
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportMode {
    Visual {
        candidate: Candidate,
        readiness: Readiness,
    },
    MetadataOnly(FallbackReason),
}

/// Outcome of a successful export
#[derive(Debug, Clone)]
pub struct ExportReport {
    pub path: PathBuf,
    pub mode: ExportMode,
    pub pages: usize,
}

/// Runs the capture-and-export pipeline for one dashboard
pub struct Exporter<'a> {
    config: &'a ExportConfig,
    context: &'a dyn ContextProvider,
}

impl<'a> Exporter<'a> {
    pub fn new(config: &'a ExportConfig, context: &'a dyn ContextProvider) -> Self {
        Self { config, context }
    }

    /// Capture the dashboard from a live document and write the PDF.
    ///
    /// A missing element or a failed capture falls back to a metadata-only
    /// document; only persistence problems are returned as errors.
    pub async fn run<P, R>(
        &self,
        probe: &P,
        rasterizer: &R,
        snapshot: &DashboardSnapshot,
    ) -> Result<ExportReport>
    where
        P: DocumentProbe,
        R: Rasterizer<P::Node>,
    {
        let locator = Locator::new(&self.config.locator);
        let Some(located) = locator.locate(probe).await else {
            ::log::info!("Falling back to metadata-only export for {}", snapshot.name);
            return self
                .metadata_only(snapshot, FallbackReason::LocatorMiss)
                .await;
        };

        let readiness = wait_until_loaded(probe, &self.config.readiness).await;

        let image = match rasterizer.rasterize(&located.node, &self.config.raster).await {
            Ok(image) => image,
            Err(e) => {
                ::log::warn!("Capture of {} failed, exporting metadata only: {}", snapshot.name, e);
                return self
                    .metadata_only(snapshot, FallbackReason::RasterizationFailed(e.to_string()))
                    .await;
            }
        };
        ::log::info!("Captured {}x{} image of {}", image.width(), image.height(), snapshot.name);

        let doc = self.composer().with_image(image, snapshot);
        let path = self.save(&doc).await?;
        Ok(ExportReport {
            path,
            pages: doc.pages.len(),
            mode: ExportMode::Visual {
                candidate: located.candidate,
                readiness,
            },
        })
    }

    /// Write a text-only document describing the dashboard
    pub async fn metadata_only(
        &self,
        snapshot: &DashboardSnapshot,
        reason: FallbackReason,
    ) -> Result<ExportReport> {
        let doc = self.composer().metadata_only(
            snapshot,
            self.config.include_header,
            self.config.include_widgets,
        );
        let path = self.save(&doc).await?;
        Ok(ExportReport {
            path,
            pages: doc.pages.len(),
            mode: ExportMode::MetadataOnly(reason),
        })
    }

    fn composer(&self) -> Composer<'a> {
        Composer::new(self.config.page_format, self.context)
    }

    async fn save(&self, doc: &ExportDocument) -> Result<PathBuf> {
        let bytes = pdf::render(doc)?;
        let path = self.config.output_dir.join(&doc.file_name);
        persist(&path, &bytes).await?;
        ::log::info!("Saved {} ({} pages)", path.display(), doc.pages.len());
        Ok(path)
    }
}

async fn persist(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(dir)
            .await
            .map_err(|source| ExportError::Persistence {
                path: dir.to_path_buf(),
                source,
            })?;
    }
    tokio::fs::write(path, bytes)
        .await
        .map_err(|source| ExportError::Persistence {
            path: path.to_path_buf(),
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::html::StaticPage;
    use crate::context::StaticContext;
    use crate::raster::{RasterImage, RasterOptions};
    use crate::snapshot::WidgetSummary;

    /// Paints every element a flat grey, or fails on demand
    struct FakeRasterizer {
        fail: bool,
    }

    impl<N> Rasterizer<N> for FakeRasterizer {
        async fn rasterize(&self, _node: &N, options: &RasterOptions) -> Result<RasterImage> {
            if self.fail {
                return Err(ExportError::Rasterization("element removed mid-capture".to_string()));
            }
            let scale = options.scale as u32;
            RasterImage::from_rgb(300 * scale, 200 * scale, vec![128; (300 * 200 * 3 * scale * scale) as usize])
        }
    }

    const DASHBOARD_PAGE: &str = r#"<html><body>
        <div class="dashboard-grid" style="width: 1200px; height: 800px">
            <div class="widget" style="width: 300px; height: 200px"></div>
        </div>
    </body></html>"#;

    fn config(dir: &Path) -> ExportConfig {
        let mut config = ExportConfig::default();
        config.output_dir = dir.to_path_buf();
        config.readiness.max_wait_ms = 1_000;
        config
    }

    fn sprint_health() -> DashboardSnapshot {
        let mut snapshot = DashboardSnapshot::new(
            "d-1",
            "Sprint Health",
            vec![
                WidgetSummary::new("Burndown", 0, 0, 2, 2),
                WidgetSummary::new("Velocity", 2, 0, 2, 1),
                WidgetSummary::new("Bugs", 0, 2, 1, 1),
            ],
        );
        snapshot.description = Some(String::new());
        snapshot
    }

    #[tokio::test(start_paused = true)]
    async fn test_visual_export() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(dir.path());
        let context = StaticContext::new("Fabrikam");
        let page = StaticPage::parse(DASHBOARD_PAGE);

        let report = Exporter::new(&config, &context)
            .run(&page.probe(), &FakeRasterizer { fail: false }, &sprint_health())
            .await
            .unwrap();

        assert_eq!(report.pages, 2);
        assert!(matches!(
            report.mode,
            ExportMode::Visual { readiness: Readiness::Settled, .. }
        ));
        let name = report.path.file_name().unwrap().to_str().unwrap();
        assert!(name.starts_with("Sprint_Health_") && name.ends_with(".pdf"));
        assert!(!name.contains("metadata"));

        let parsed = lopdf::Document::load(&report.path).unwrap();
        assert_eq!(parsed.get_pages().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_locator_miss_falls_back_to_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(dir.path());
        let context = StaticContext::new("Fabrikam");
        let page = StaticPage::parse("<html><body><p>Loading failed</p></body></html>");

        let report = Exporter::new(&config, &context)
            .run(&page.probe(), &FakeRasterizer { fail: false }, &sprint_health())
            .await
            .unwrap();

        assert_eq!(report.mode, ExportMode::MetadataOnly(FallbackReason::LocatorMiss));
        assert_eq!(report.pages, 1);
        assert_eq!(report.path, dir.path().join("Sprint_Health_metadata.pdf"));
        assert!(report.path.exists());
    }

    #[tokio::test(start_paused = true)]
    async fn test_rasterization_failure_falls_back_to_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(dir.path());
        let context = StaticContext::new("Fabrikam");
        let page = StaticPage::parse(DASHBOARD_PAGE);

        let report = Exporter::new(&config, &context)
            .run(&page.probe(), &FakeRasterizer { fail: true }, &sprint_health())
            .await
            .unwrap();

        assert!(matches!(
            report.mode,
            ExportMode::MetadataOnly(FallbackReason::RasterizationFailed(_))
        ));
        assert!(report.path.ends_with("Sprint_Health_metadata.pdf"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_still_exports_visual() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(dir.path());
        let context = StaticContext::new("Fabrikam");
        let page = StaticPage::parse(
            r#"<html><body>
                <div class="dashboard-grid" style="width: 1200px; height: 800px">
                    <div class="spinner"></div>
                </div>
            </body></html>"#,
        );

        let report = Exporter::new(&config, &context)
            .run(&page.probe(), &FakeRasterizer { fail: false }, &sprint_health())
            .await
            .unwrap();

        assert!(matches!(
            report.mode,
            ExportMode::Visual { readiness: Readiness::TimedOut, .. }
        ));
    }

    #[tokio::test]
    async fn test_persistence_failure_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, b"file").unwrap();

        let config = config(&blocker);
        let context = StaticContext::new("Fabrikam");
        let result = Exporter::new(&config, &context)
            .metadata_only(&sprint_health(), FallbackReason::NoLivePage)
            .await;

        assert!(matches!(result, Err(ExportError::Persistence { .. })));
    }

    #[tokio::test]
    async fn test_metadata_only_end_to_end() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(dir.path());
        let context = StaticContext::new("Fabrikam");

        let report = Exporter::new(&config, &context)
            .metadata_only(&sprint_health(), FallbackReason::NoLivePage)
            .await
            .unwrap();

        let name = report.path.file_name().unwrap().to_str().unwrap();
        assert_eq!(name, "Sprint_Health_metadata.pdf");
        let parsed = lopdf::Document::load(&report.path).unwrap();
        assert_eq!(parsed.get_pages().len(), 1);
    }
}
