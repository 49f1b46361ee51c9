use crate::capture::{DocumentProbe, Rect};
use crate::error::{ExportError, Result};
use crate::raster::{RasterImage, RasterOptions, Rasterizer};
use fantoccini::elements::Element;
use fantoccini::{Client, ClientBuilder, Locator};
use serde_json::Value;

/// Expands the capture root and optionally blanks cross-origin media.
/// Returns nothing; the caller re-reads the element rectangle.
const PREPARE_SCRIPT: &str = r#"
const el = arguments[0];
el.style.overflow = 'visible';
el.style.height = 'auto';
if (arguments[1]) {
    const origin = window.location.origin;
    el.querySelectorAll('img, iframe').forEach((node) => {
        try {
            if (node.src && new URL(node.src, document.baseURI).origin !== origin) {
                node.style.visibility = 'hidden';
            }
        } catch (e) {}
    });
}
"#;

/// Connects to the WebDriver instance, trying common local ports if the
/// configured URL does not answer
pub async fn connect(webdriver_url: &str) -> Result<Client> {
    match ClientBuilder::native().connect(webdriver_url).await {
        Ok(client) => {
            ::log::debug!("Connected to WebDriver at {}", webdriver_url);
            return Ok(client);
        }
        Err(e) => {
            ::log::warn!("Failed to connect to WebDriver at {}: {}", webdriver_url, e);
        }
    }

    let fallback_urls = [
        "http://localhost:9515", // ChromeDriver default
        "http://localhost:4444", // Selenium / geckodriver default
        "http://127.0.0.1:4444",
    ];

    for url in fallback_urls.iter() {
        if *url == webdriver_url {
            continue;
        }

        ::log::info!("Trying fallback WebDriver URL: {}", url);
        if let Ok(client) = ClientBuilder::native().connect(url).await {
            ::log::debug!("Connected to fallback WebDriver at {}", url);
            return Ok(client);
        }
    }

    Err(ExportError::WebDriver(format!(
        "no WebDriver server reachable at {} or the usual local ports; \
         start one or set WEBDRIVER_URL",
        webdriver_url
    )))
}

/// Opens the dashboard page in the session
pub async fn open_dashboard(client: &Client, url: &str) -> Result<()> {
    ::log::info!("Opening dashboard page {}", url);
    client.goto(url).await.map_err(|e| {
        if e.to_string().contains("Unable to find session") {
            ::log::warn!("Lost WebDriver session while opening {}", url);
        }
        ExportError::WebDriver(format!("failed to open {}: {}", url, e))
    })
}

/// Document probe backed by a live WebDriver session
#[derive(Clone)]
pub struct WebDriverProbe {
    client: Client,
}

impl WebDriverProbe {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

impl DocumentProbe for WebDriverProbe {
    type Node = Element;

    async fn query_all(&self, selector: &str) -> Result<Vec<Element>> {
        Ok(self.client.find_all(Locator::Css(selector)).await?)
    }

    async fn rect(&self, node: &Element) -> Result<Rect> {
        let (x, y, width, height) = node.rectangle().await?;
        Ok(Rect::new(x, y, width, height))
    }

    async fn parent(&self, node: &Element) -> Result<Option<Element>> {
        let mut parents = node.find_all(Locator::XPath("parent::*")).await?;
        Ok(if parents.is_empty() {
            None
        } else {
            Some(parents.swap_remove(0))
        })
    }

    async fn child_count(&self, node: &Element) -> Result<usize> {
        Ok(node.find_all(Locator::XPath("./*")).await?.len())
    }

    async fn tag_name(&self, node: &Element) -> Result<String> {
        Ok(node.tag_name().await?.to_ascii_lowercase())
    }
}

/// Rasterizer built on WebDriver element screenshots
#[derive(Clone)]
pub struct ScreenshotRasterizer {
    client: Client,
}

impl ScreenshotRasterizer {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    async fn prepare(&self, node: &Element, options: &RasterOptions) -> Result<()> {
        let element = serde_json::to_value(node)
            .map_err(|e| ExportError::Rasterization(format!("cannot pass element to script: {}", e)))?;
        let block_cross_origin = !(options.allow_taint || options.use_cors);

        self.client
            .execute(PREPARE_SCRIPT, vec![element, Value::Bool(block_cross_origin)])
            .await
            .map_err(|e| ExportError::Rasterization(format!("prepare script failed: {}", e)))?;
        Ok(())
    }
}

impl Rasterizer<Element> for ScreenshotRasterizer {
    async fn rasterize(&self, node: &Element, options: &RasterOptions) -> Result<RasterImage> {
        let background = options.background_rgb()?;
        self.prepare(node, options).await?;

        let (_, _, width, height) = node
            .rectangle()
            .await
            .map_err(|e| ExportError::Rasterization(format!("element vanished: {}", e)))?;
        if !(width > 0.0 && height > 0.0) {
            return Err(ExportError::Rasterization(format!(
                "element has no area ({}x{})",
                width, height
            )));
        }

        let png = node
            .screenshot()
            .await
            .map_err(|e| ExportError::Rasterization(format!("screenshot failed: {}", e)))?;

        let target = (
            (width * options.scale as f64).ceil() as u32,
            (height * options.scale as f64).ceil() as u32,
        );
        ::log::debug!(
            "Captured {} bytes for a {}x{} element, target {}x{}",
            png.len(),
            width,
            height,
            target.0,
            target.1
        );

        RasterImage::from_encoded(&png, Some(target), background)
    }
}
