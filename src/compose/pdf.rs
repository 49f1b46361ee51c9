use crate::compose::{ExportDocument, ImagePlacement, Mark, Page, TextMark, Weight};
use crate::error::{ExportError, Result};
use crate::raster::RasterImage;
use chrono::Utc;
use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, Stream, StringFormat, dictionary};

const PT_PER_MM: f32 = 72.0 / 25.4;

const REGULAR_FONT: &str = "F1";
const BOLD_FONT: &str = "F2";
const IMAGE_NAME: &str = "Im1";

/// Serialize a laid-out document to PDF bytes
pub fn render(doc: &ExportDocument) -> Result<Vec<u8>> {
    let (width_mm, height_mm) = doc.page_size();
    let width_pt = width_mm * PT_PER_MM;
    let height_pt = height_mm * PT_PER_MM;

    let mut pdf = Document::with_version("1.5");
    let pages_id = pdf.new_object_id();

    let regular_id = pdf.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    });
    let bold_id = pdf.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica-Bold",
        "Encoding" => "WinAnsiEncoding",
    });
    let image_id = doc.image.as_ref().map(|img| pdf.add_object(image_stream(img)));

    let mut kids: Vec<Object> = Vec::with_capacity(doc.pages.len());
    for page in &doc.pages {
        let content = page_content(page, height_pt);
        let content_id = pdf.add_object(Stream::new(Dictionary::new(), content.encode()?));

        let mut resources = dictionary! {
            "Font" => dictionary! {
                REGULAR_FONT => regular_id,
                BOLD_FONT => bold_id,
            },
        };
        if let (Some(id), Some(_)) = (image_id, page.image()) {
            resources.set("XObject", dictionary! { IMAGE_NAME => id });
        }

        let page_id = pdf.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => resources,
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    pdf.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
            "MediaBox" => vec![Object::Integer(0), Object::Integer(0), width_pt.into(), height_pt.into()],
        }),
    );

    let info_id = pdf.add_object(dictionary! {
        "Title" => Object::String(win_ansi(&doc.title), StringFormat::Literal),
        "Producer" => Object::string_literal("dashboard-pdf"),
        "CreationDate" => Object::string_literal(Utc::now().format("D:%Y%m%d%H%M%SZ").to_string()),
    });
    let catalog_id = pdf.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    pdf.trailer.set("Root", catalog_id);
    pdf.trailer.set("Info", info_id);
    pdf.compress();

    let mut bytes = Vec::new();
    pdf.save_to(&mut bytes)
        .map_err(|e| ExportError::Render(e.to_string()))?;
    ::log::debug!(
        "Rendered {} pages ({} bytes) for {}",
        doc.pages.len(),
        bytes.len(),
        doc.file_name
    );
    Ok(bytes)
}

fn image_stream(image: &RasterImage) -> Stream {
    Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => image.width() as i64,
            "Height" => image.height() as i64,
            "ColorSpace" => "DeviceRGB",
            "BitsPerComponent" => 8i64,
        },
        image.pixels().to_vec(),
    )
}

fn page_content(page: &Page, height_pt: f32) -> Content {
    let mut operations = Vec::new();
    for mark in &page.marks {
        match mark {
            Mark::Text(text) => text_operations(text, height_pt, &mut operations),
            Mark::Image(placement) => image_operations(placement, height_pt, &mut operations),
        }
    }
    Content { operations }
}

fn text_operations(text: &TextMark, height_pt: f32, ops: &mut Vec<Operation>) {
    let font = match text.weight {
        Weight::Normal => REGULAR_FONT,
        Weight::Bold => BOLD_FONT,
    };
    ops.push(Operation::new("BT", vec![]));
    ops.push(Operation::new("Tf", vec![font.into(), text.size.into()]));
    ops.push(Operation::new(
        "Td",
        vec![
            (text.x * PT_PER_MM).into(),
            (height_pt - text.y * PT_PER_MM).into(),
        ],
    ));
    ops.push(Operation::new(
        "Tj",
        vec![Object::String(win_ansi(&text.text), StringFormat::Literal)],
    ));
    ops.push(Operation::new("ET", vec![]));
}

fn image_operations(placement: &ImagePlacement, height_pt: f32, ops: &mut Vec<Operation>) {
    let width = placement.width * PT_PER_MM;
    let height = placement.height * PT_PER_MM;
    let left = placement.x * PT_PER_MM;
    let bottom = height_pt - (placement.y + placement.height) * PT_PER_MM;

    ops.push(Operation::new("q", vec![]));
    ops.push(Operation::new(
        "cm",
        vec![
            width.into(),
            Object::Integer(0),
            Object::Integer(0),
            height.into(),
            left.into(),
            bottom.into(),
        ],
    ));
    ops.push(Operation::new("Do", vec![IMAGE_NAME.into()]));
    ops.push(Operation::new("Q", vec![]));
}

/// Encode text for the standard fonts' WinAnsi encoding
fn win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| match c {
            ' '..='~' => c as u8,
            '\u{a0}'..='\u{ff}' => c as u32 as u8,
            '€' => 0x80,
            '‘' => 0x91,
            '’' => 0x92,
            '“' => 0x93,
            '”' => 0x94,
            '•' => 0x95,
            '–' => 0x96,
            '—' => 0x97,
            '™' => 0x99,
            c if c.is_control() => b' ',
            _ => b'?',
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_win_ansi() {
        assert_eq!(win_ansi("Sprint (1)"), b"Sprint (1)".to_vec());
        assert_eq!(win_ansi("Équipe"), vec![0xC9, b'q', b'u', b'i', b'p', b'e']);
        assert_eq!(win_ansi("a–b"), vec![b'a', 0x96, b'b']);
        assert_eq!(win_ansi("日本"), b"??".to_vec());
        assert_eq!(win_ansi("a\tb"), b"a b".to_vec());
    }
}
