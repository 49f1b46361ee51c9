//! Page layout for exported dashboards
//!
//! Coordinates are millimetres measured from the top-left corner of the page;
//! text positions are baselines.

use crate::compose::{
    ExportDocument, ImagePlacement, Mark, Orientation, Page, PageKind, TextMark, Weight, page_size,
};
use crate::config::PageFormat;
use crate::context::ContextProvider;
use crate::raster::RasterImage;
use crate::snapshot::DashboardSnapshot;
use crate::utils;
use chrono::{DateTime, Local, TimeZone, Utc};

/// Millimetres per CSS pixel at 96 dpi
const MM_PER_PX: f32 = 0.264583;

const MARGIN: f32 = 20.0;
/// Top of the image on the first page; everything above is header text
const HEADER_BAND: f32 = 45.0;

const INFO_HEADING_Y: f32 = 30.0;
const INFO_START_Y: f32 = 45.0;
const INFO_LINE_STEP: f32 = 10.0;

const TOP: f32 = 20.0;
/// Cursor position after the metadata-only header block
const HEADER_BLOCK_END: f32 = 70.0;
/// A widget block starting below this line goes on a new page
const PAGE_BREAK_Y: f32 = 250.0;
const WIDGET_BLOCK: f32 = 35.0;
const WIDGET_SUB_LINE: f32 = 8.0;
const WIDGET_INDENT: f32 = 25.0;

/// Lays out export documents for one project at one point in time
pub struct Composer<'a> {
    format: PageFormat,
    context: &'a dyn ContextProvider,
    now: DateTime<Local>,
}

impl<'a> Composer<'a> {
    pub fn new(format: PageFormat, context: &'a dyn ContextProvider) -> Self {
        Self {
            format,
            context,
            now: Local::now(),
        }
    }

    /// Pin the generation time
    pub fn at(mut self, now: DateTime<Local>) -> Self {
        self.now = now;
        self
    }

    /// Image page followed by a dashboard information page
    pub fn with_image(&self, image: RasterImage, snapshot: &DashboardSnapshot) -> ExportDocument {
        let orientation = if image.is_landscape() {
            Orientation::Landscape
        } else {
            Orientation::Portrait
        };
        let (page_width, page_height) = page_size(self.format, orientation);

        let mut first = Page::new(PageKind::Image);
        push_text(&mut first, MARGIN, 20.0, 16.0, Weight::Bold, &snapshot.name);
        push_text(
            &mut first,
            MARGIN,
            30.0,
            10.0,
            Weight::Normal,
            &format!("Generated on: {}", format_timestamp(&self.now)),
        );
        push_text(
            &mut first,
            MARGIN,
            35.0,
            10.0,
            Weight::Normal,
            &format!("Project: {}", self.context.project_name()),
        );

        let area = ImagePlacement {
            x: MARGIN,
            y: HEADER_BAND,
            width: page_width - 2.0 * MARGIN,
            height: page_height - HEADER_BAND - MARGIN,
        };
        first
            .marks
            .push(Mark::Image(fit_image(image.width(), image.height(), &area)));

        let mut info = Page::new(PageKind::Text);
        push_text(
            &mut info,
            MARGIN,
            INFO_HEADING_Y,
            14.0,
            Weight::Bold,
            "Dashboard Information",
        );

        let last_modified = snapshot
            .last_modified()
            .map(|t| format_timestamp(&t.with_timezone(&Local)))
            .unwrap_or_else(|| "Not available".to_string());
        let lines = [
            format!("Name: {}", snapshot.name),
            format!(
                "Description: {}",
                snapshot.description().unwrap_or("No description")
            ),
            format!("Last Modified: {}", last_modified),
            format!("Widgets: {}", snapshot.widgets.len()),
            format!("Dashboard ID: {}", snapshot.id),
        ];
        let mut y = INFO_START_Y;
        for line in &lines {
            push_text(&mut info, MARGIN, y, 12.0, Weight::Normal, line);
            y += INFO_LINE_STEP;
        }

        ExportDocument {
            format: self.format,
            orientation,
            pages: vec![first, info],
            image: Some(image),
            file_name: utils::export_filename(
                &snapshot.name,
                self.now.with_timezone(&Utc).date_naive(),
            ),
            title: snapshot.name.clone(),
        }
    }

    /// Text-only document: optional header block and widget listing
    pub fn metadata_only(
        &self,
        snapshot: &DashboardSnapshot,
        include_header: bool,
        include_widgets: bool,
    ) -> ExportDocument {
        let mut pages = vec![Page::new(PageKind::Text)];
        let mut cursor = TOP;

        if include_header {
            let page = &mut pages[0];
            push_text(page, MARGIN, 20.0, 18.0, Weight::Bold, &snapshot.name);
            push_text(
                page,
                MARGIN,
                30.0,
                11.0,
                Weight::Normal,
                &format!(
                    "Description: {}",
                    snapshot.description().unwrap_or("No description")
                ),
            );
            push_text(
                page,
                MARGIN,
                38.0,
                11.0,
                Weight::Normal,
                &format!("Project: {}", self.context.project_name()),
            );
            push_text(
                page,
                MARGIN,
                46.0,
                11.0,
                Weight::Normal,
                &format!("Generated on: {}", format_timestamp(&self.now)),
            );
            push_text(
                page,
                MARGIN,
                54.0,
                11.0,
                Weight::Normal,
                &format!("Widgets: {}", snapshot.widgets.len()),
            );
            cursor = HEADER_BLOCK_END;
        }

        if include_widgets {
            if let Some(page) = pages.last_mut() {
                push_text(page, MARGIN, cursor, 14.0, Weight::Bold, "Widgets:");
            }
            cursor += INFO_LINE_STEP;

            for (index, widget) in snapshot.widgets.iter().enumerate() {
                if cursor > PAGE_BREAK_Y {
                    pages.push(Page::new(PageKind::Text));
                    cursor = TOP;
                }
                let Some(page) = pages.last_mut() else {
                    break;
                };

                push_text(
                    page,
                    MARGIN,
                    cursor,
                    12.0,
                    Weight::Bold,
                    &format!("{}. {}", index + 1, widget.name),
                );
                push_text(
                    page,
                    WIDGET_INDENT,
                    cursor + WIDGET_SUB_LINE,
                    10.0,
                    Weight::Normal,
                    &format!("Size: {}x{}", widget.size.column_span, widget.size.row_span),
                );
                push_text(
                    page,
                    WIDGET_INDENT,
                    cursor + 2.0 * WIDGET_SUB_LINE,
                    10.0,
                    Weight::Normal,
                    &format!(
                        "Position: ({}, {})",
                        widget.position.column, widget.position.row
                    ),
                );
                cursor += WIDGET_BLOCK;
            }
        }

        ExportDocument {
            format: self.format,
            orientation: Orientation::Portrait,
            pages,
            image: None,
            file_name: utils::metadata_filename(&snapshot.name),
            title: snapshot.name.clone(),
        }
    }
}

/// Scale an image uniformly into `area`, anchored at its top-left corner
pub fn fit_image(width_px: u32, height_px: u32, area: &ImagePlacement) -> ImagePlacement {
    if width_px == 0 || height_px == 0 {
        return ImagePlacement {
            width: 0.0,
            height: 0.0,
            ..*area
        };
    }

    let natural_width = width_px as f32 * MM_PER_PX;
    let natural_height = height_px as f32 * MM_PER_PX;
    let scale = (area.width / natural_width).min(area.height / natural_height);

    ImagePlacement {
        x: area.x,
        y: area.y,
        width: (natural_width * scale).min(area.width),
        height: (natural_height * scale).min(area.height),
    }
}

/// Locale-style date and time, e.g. `3/14/2024, 9:05:00 AM`
pub fn format_timestamp<Tz: TimeZone>(time: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    time.format("%-m/%-d/%Y, %-I:%M:%S %p").to_string()
}

fn push_text(page: &mut Page, x: f32, y: f32, size: f32, weight: Weight, text: &str) {
    page.marks.push(Mark::Text(TextMark {
        x,
        y,
        size,
        weight,
        text: text.to_string(),
    }));
}
