//! Document probe over a saved page source
//!
//! There is no layout engine here. Element sizes come from inline `width` and
//! `height` styles; elements without them are sized like a block container:
//! as wide as their widest child and as tall as their children stacked.
//! `hidden` and `display: none` collapse an element and its subtree.

use crate::capture::{DocumentProbe, Rect};
use crate::error::{ExportError, Result};
use scraper::{ElementRef, Html, Selector};
use std::path::Path;

/// A parsed page source
pub struct StaticPage {
    html: Html,
}

impl StaticPage {
    pub fn parse(source: &str) -> Self {
        Self {
            html: Html::parse_document(source),
        }
    }

    /// Read and parse a saved page source
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path)
            .map_err(|e| ExportError::Probe(format!("{}: {}", path.display(), e)))?;
        Ok(Self::parse(&source))
    }

    pub fn probe(&self) -> StaticProbe<'_> {
        StaticProbe { html: &self.html }
    }
}

/// Borrowing probe; nodes are scraper element references
#[derive(Clone, Copy)]
pub struct StaticProbe<'a> {
    html: &'a Html,
}

impl<'a> DocumentProbe for StaticProbe<'a> {
    type Node = ElementRef<'a>;

    async fn query_all(&self, selector: &str) -> Result<Vec<Self::Node>> {
        let parsed = Selector::parse(selector)
            .map_err(|e| ExportError::Probe(format!("invalid selector {:?}: {}", selector, e)))?;
        Ok(self.html.select(&parsed).collect())
    }

    async fn rect(&self, node: &Self::Node) -> Result<Rect> {
        if has_hidden_ancestor(node) {
            return Ok(Rect::default());
        }
        let (width, height) = estimated_size(node);
        Ok(Rect::new(0.0, 0.0, width, height))
    }

    async fn parent(&self, node: &Self::Node) -> Result<Option<Self::Node>> {
        Ok(node.parent().and_then(ElementRef::wrap))
    }

    async fn child_count(&self, node: &Self::Node) -> Result<usize> {
        Ok(node.children().filter(|c| c.value().is_element()).count())
    }

    async fn tag_name(&self, node: &Self::Node) -> Result<String> {
        Ok(node.value().name().to_ascii_lowercase())
    }
}

fn is_hidden(element: &ElementRef<'_>) -> bool {
    if element.value().attr("hidden").is_some() {
        return true;
    }
    style_property(element, "display").is_some_and(|v| v == "none")
}

fn has_hidden_ancestor(element: &ElementRef<'_>) -> bool {
    let mut current = Some(*element);
    while let Some(el) = current {
        if is_hidden(&el) {
            return true;
        }
        current = el.parent().and_then(ElementRef::wrap);
    }
    false
}

fn estimated_size(element: &ElementRef<'_>) -> (f64, f64) {
    if is_hidden(element) {
        return (0.0, 0.0);
    }

    let width = style_property(element, "width").and_then(|v| parse_length(&v));
    let height = style_property(element, "height").and_then(|v| parse_length(&v));
    if let (Some(w), Some(h)) = (width, height) {
        return (w, h);
    }

    let (mut flow_width, mut flow_height) = (0.0f64, 0.0f64);
    for child in element.children().filter_map(ElementRef::wrap) {
        let (w, h) = estimated_size(&child);
        flow_width = flow_width.max(w);
        flow_height += h;
    }
    (width.unwrap_or(flow_width), height.unwrap_or(flow_height))
}

/// Value of a declaration in the inline `style` attribute, lower-cased
fn style_property(element: &ElementRef<'_>, property: &str) -> Option<String> {
    let style = element.value().attr("style")?;
    style
        .split(';')
        .filter_map(|decl| decl.split_once(':'))
        .filter(|(name, _)| name.trim().eq_ignore_ascii_case(property))
        .map(|(_, value)| value.trim().to_ascii_lowercase())
        .last()
}

fn parse_length(value: &str) -> Option<f64> {
    value
        .strip_suffix("px")
        .unwrap_or(value)
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite() && *v >= 0.0)
}
