pub mod layout;
pub mod pdf;

#[cfg(test)]
mod tests;

use crate::config::PageFormat;
use crate::raster::RasterImage;

/// Page orientation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    Portrait,
    Landscape,
}

/// Font weight for a line of text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Weight {
    Normal,
    Bold,
}

/// A line of text with its baseline position, in millimetres from the top-left corner
#[derive(Debug, Clone, PartialEq)]
pub struct TextMark {
    pub x: f32,
    pub y: f32,
    pub size: f32,
    pub weight: Weight,
    pub text: String,
}

/// Where the captured image goes on the page, in millimetres
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImagePlacement {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Mark {
    Text(TextMark),
    Image(ImagePlacement),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageKind {
    /// Header text plus the scaled dashboard image
    Image,
    /// Heading and lines of text
    Text,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    pub kind: PageKind,
    pub marks: Vec<Mark>,
}

impl Page {
    pub fn new(kind: PageKind) -> Self {
        Self {
            kind,
            marks: Vec::new(),
        }
    }

    /// Text of every line on the page, in drawing order
    pub fn lines(&self) -> impl Iterator<Item = &TextMark> {
        self.marks.iter().filter_map(|m| match m {
            Mark::Text(t) => Some(t),
            Mark::Image(_) => None,
        })
    }

    pub fn image(&self) -> Option<&ImagePlacement> {
        self.marks.iter().find_map(|m| match m {
            Mark::Image(p) => Some(p),
            Mark::Text(_) => None,
        })
    }
}

/// A laid-out document, ready to be rendered once
#[derive(Debug, Clone)]
pub struct ExportDocument {
    pub format: PageFormat,
    pub orientation: Orientation,
    pub pages: Vec<Page>,
    /// Bitmap referenced by image marks
    pub image: Option<RasterImage>,
    /// File name the document is saved under
    pub file_name: String,
    pub title: String,
}

impl ExportDocument {
    /// Page size in millimetres for this format and orientation
    pub fn page_size(&self) -> (f32, f32) {
        page_size(self.format, self.orientation)
    }
}

pub(crate) fn page_size(format: PageFormat, orientation: Orientation) -> (f32, f32) {
    let (w, h) = format.dimensions_mm();
    match orientation {
        Orientation::Portrait => (w, h),
        Orientation::Landscape => (h, w),
    }
}
