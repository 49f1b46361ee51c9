pub mod html;
pub mod locator;
pub mod readiness;
pub mod webdriver;

use crate::error::Result;

/// Rendered bounding box of an element, in CSS pixels
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Both dimensions are positive, i.e. the element is actually painted
    pub fn is_visible(&self) -> bool {
        self.width > 0.0 && self.height > 0.0
    }
}

/// Read-only view of a rendered document
///
/// Implemented over a live WebDriver session and over a saved page source.
#[allow(async_fn_in_trait)]
pub trait DocumentProbe {
    /// Handle to an element, valid for the duration of one export
    type Node: Clone;

    /// All elements matching a CSS selector, in document order
    async fn query_all(&self, selector: &str) -> Result<Vec<Self::Node>>;

    /// Number of elements matching a CSS selector
    async fn count(&self, selector: &str) -> Result<usize> {
        Ok(self.query_all(selector).await?.len())
    }

    async fn rect(&self, node: &Self::Node) -> Result<Rect>;

    /// Parent element, `None` at the document root
    async fn parent(&self, node: &Self::Node) -> Result<Option<Self::Node>>;

    /// Number of child elements (text nodes excluded)
    async fn child_count(&self, node: &Self::Node) -> Result<usize>;

    /// Lower-case tag name
    async fn tag_name(&self, node: &Self::Node) -> Result<String>;
}
