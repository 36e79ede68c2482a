//! Storyboard Assembler — lays out one page per scene and writes the output PDF.
//!
//! # Coordinate system
//! Layout is expressed in top-left page coordinates (y grows downward), the
//! way a designer reads the page. PDF content streams use a bottom-left origin,
//! so every y is flipped on the way out:
//! ```text
//! pdf_y = page_height - top_y
//! ```
//!
//! # Page recipe
//! - image: decoded, re-encoded as JPEG (`DCTDecode`), scaled to fit the image
//!   rectangle with its aspect ratio kept, centered in the rectangle
//! - text: Helvetica at a fixed size from a fixed baseline; explicit newlines
//!   start a new line, nothing is wrapped or truncated

use std::io::Cursor;
use std::path::Path;

use bytes::Bytes;
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, Rgb, RgbImage};
use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream, StringFormat};
use tracing::debug;

use crate::errors::AppError;
use crate::storyboard::scenes::Scene;

const JPEG_QUALITY: u8 = 90;
const FONT_RESOURCE: &str = "F1";
const IMAGE_RESOURCE: &str = "Im1";

// ────────────────────────────────────────────────────────────────────────────
// Layout
// ────────────────────────────────────────────────────────────────────────────

/// Axis-aligned rectangle in top-left page coordinates (points).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
}

impl Rect {
    pub fn width(&self) -> f32 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> f32 {
        self.y1 - self.y0
    }
}

/// Fixed geometry shared by every storyboard page.
#[derive(Debug, Clone, PartialEq)]
pub struct PageLayout {
    pub page_width: f32,
    pub page_height: f32,
    pub image_rect: Rect,
    /// Baseline origin of the first text line.
    pub text_origin: (f32, f32),
    pub font_size: f32,
    pub line_height_factor: f32,
}

/// A4 portrait: a 495pt square image frame with the caption underneath.
pub fn default_page_layout() -> PageLayout {
    PageLayout {
        page_width: 595.0,
        page_height: 842.0,
        image_rect: Rect {
            x0: 50.0,
            y0: 50.0,
            x1: 545.0,
            y1: 545.0,
        },
        text_origin: (50.0, 600.0),
        font_size: 12.0,
        line_height_factor: 1.2,
    }
}

/// Where an image of `img_w`×`img_h` pixels lands inside `frame`.
/// Returns `(x, y, width, height)` in PDF (bottom-left) coordinates.
pub fn fit_image(frame: Rect, img_w: u32, img_h: u32, page_height: f32) -> (f32, f32, f32, f32) {
    let (fw, fh) = (f64::from(frame.width()), f64::from(frame.height()));
    let (iw, ih) = (f64::from(img_w.max(1)), f64::from(img_h.max(1)));
    let scale = (fw / iw).min(fh / ih);
    let (w, h) = (iw * scale, ih * scale);
    let x = f64::from(frame.x0) + (fw - w) / 2.0;
    let top = f64::from(frame.y0) + (fh - h) / 2.0;
    let y = f64::from(page_height) - top - h;
    (x as f32, y as f32, w as f32, h as f32)
}

// ────────────────────────────────────────────────────────────────────────────
// Assembly
// ────────────────────────────────────────────────────────────────────────────

/// One page's worth of input: a scene and the raw bytes of its image.
#[derive(Debug, Clone)]
pub struct StoryboardPage<'a> {
    pub scene: &'a Scene,
    pub image: &'a Bytes,
}

/// Pairs scenes with their images by position. Lengths must match.
pub fn pair_pages<'a>(
    scenes: &'a [Scene],
    images: &'a [Bytes],
) -> Result<Vec<StoryboardPage<'a>>, AppError> {
    if scenes.len() != images.len() {
        return Err(AppError::Assembly(format!(
            "{} scenes but {} images",
            scenes.len(),
            images.len()
        )));
    }
    Ok(scenes
        .iter()
        .zip(images)
        .map(|(scene, image)| StoryboardPage { scene, image })
        .collect())
}

/// Builds the storyboard document in memory, one page per entry of `pages`.
pub fn build_document(
    pages: &[StoryboardPage<'_>],
    layout: &PageLayout,
) -> Result<Document, AppError> {
    if pages.is_empty() {
        return Err(AppError::EmptyDocument);
    }

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let font_id = doc.add_object(Dictionary::from_iter([
        ("Type", Object::Name(b"Font".to_vec())),
        ("Subtype", Object::Name(b"Type1".to_vec())),
        ("BaseFont", Object::Name(b"Helvetica".to_vec())),
        ("Encoding", Object::Name(b"WinAnsiEncoding".to_vec())),
    ]));

    let mut kids = Vec::with_capacity(pages.len());
    for (index, page) in pages.iter().enumerate() {
        let page_id = add_page(&mut doc, pages_id, font_id, page, layout).map_err(|e| match e {
            AppError::Assembly(msg) => AppError::Assembly(format!("page {}: {msg}", index + 1)),
            other => other,
        })?;
        kids.push(Object::Reference(page_id));
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(Dictionary::from_iter([
            ("Type", Object::Name(b"Pages".to_vec())),
            ("Kids", Object::Array(kids)),
            ("Count", Object::Integer(count)),
        ])),
    );

    let catalog_id = doc.add_object(Dictionary::from_iter([
        ("Type", Object::Name(b"Catalog".to_vec())),
        ("Pages", Object::Reference(pages_id)),
    ]));
    doc.trailer.set("Root", Object::Reference(catalog_id));

    Ok(doc)
}

/// Writes `doc` to `output`, replacing whatever was there.
pub fn save_document(doc: &mut Document, output: &Path) -> Result<(), AppError> {
    doc.save(output)
        .map_err(|e| AppError::Assembly(format!("writing {}: {e}", output.display())))?;
    Ok(())
}

/// Builds and saves in one go. Returns the number of pages written.
/// Nothing touches `output` unless every page was laid out successfully.
pub fn assemble_storyboard(
    scenes: &[Scene],
    images: &[Bytes],
    layout: &PageLayout,
    output: &Path,
) -> Result<usize, AppError> {
    let pages = pair_pages(scenes, images)?;
    let mut doc = build_document(&pages, layout)?;
    save_document(&mut doc, output)?;
    debug!("Wrote {} page(s) to {}", pages.len(), output.display());
    Ok(pages.len())
}

fn add_page(
    doc: &mut Document,
    pages_id: ObjectId,
    font_id: ObjectId,
    page: &StoryboardPage<'_>,
    layout: &PageLayout,
) -> Result<ObjectId, AppError> {
    let (jpeg, img_w, img_h) = to_jpeg(page.image)?;

    let image_id = doc.add_object(
        Stream::new(
            Dictionary::from_iter([
                ("Type", Object::Name(b"XObject".to_vec())),
                ("Subtype", Object::Name(b"Image".to_vec())),
                ("Width", Object::Integer(i64::from(img_w))),
                ("Height", Object::Integer(i64::from(img_h))),
                ("ColorSpace", Object::Name(b"DeviceRGB".to_vec())),
                ("BitsPerComponent", Object::Integer(8)),
                ("Filter", Object::Name(b"DCTDecode".to_vec())),
            ]),
            jpeg,
        )
        .with_compression(false),
    );

    let (x, y, w, h) = fit_image(layout.image_rect, img_w, img_h, layout.page_height);
    let mut operations = vec![
        Operation::new("q", vec![]),
        Operation::new("cm", vec![w.into(), 0.into(), 0.into(), h.into(), x.into(), y.into()]),
        Operation::new("Do", vec![Object::Name(IMAGE_RESOURCE.as_bytes().to_vec())]),
        Operation::new("Q", vec![]),
    ];
    operations.extend(text_operations(page.scene.as_str(), layout));

    let content = Content { operations }
        .encode()
        .map_err(|e| AppError::Assembly(format!("encoding content stream: {e}")))?;
    let content_id = doc.add_object(Stream::new(Dictionary::new(), content));

    let resources = Dictionary::from_iter([
        (
            "Font",
            Object::Dictionary(Dictionary::from_iter([(
                FONT_RESOURCE,
                Object::Reference(font_id),
            )])),
        ),
        (
            "XObject",
            Object::Dictionary(Dictionary::from_iter([(
                IMAGE_RESOURCE,
                Object::Reference(image_id),
            )])),
        ),
    ]);

    Ok(doc.add_object(Dictionary::from_iter([
        ("Type", Object::Name(b"Page".to_vec())),
        ("Parent", Object::Reference(pages_id)),
        (
            "MediaBox",
            Object::Array(vec![
                0.into(),
                0.into(),
                layout.page_width.into(),
                layout.page_height.into(),
            ]),
        ),
        ("Contents", Object::Reference(content_id)),
        ("Resources", Object::Dictionary(resources)),
    ])))
}

/// Decodes any supported raster and re-encodes it as baseline RGB JPEG.
fn to_jpeg(raw: &[u8]) -> Result<(Vec<u8>, u32, u32), AppError> {
    let decoded = image::load_from_memory(raw)
        .map_err(|e| AppError::Assembly(format!("undecodable image: {e}")))?;
    let rgb = flatten_on_white(&decoded);
    let (w, h) = rgb.dimensions();

    let mut out = Cursor::new(Vec::new());
    JpegEncoder::new_with_quality(&mut out, JPEG_QUALITY)
        .encode_image(&rgb)
        .map_err(|e| AppError::Assembly(format!("jpeg encode failed: {e}")))?;

    Ok((out.into_inner(), w, h))
}

/// Drops alpha by compositing onto a white page, so transparent regions stay
/// blank instead of showing whatever color sits under them.
fn flatten_on_white(decoded: &DynamicImage) -> RgbImage {
    let rgba = decoded.to_rgba8();
    RgbImage::from_fn(rgba.width(), rgba.height(), |x, y| {
        let [r, g, b, a] = rgba.get_pixel(x, y).0;
        let alpha = u16::from(a);
        let blend = |c: u8| ((u16::from(c) * alpha + 255 * (255 - alpha) + 127) / 255) as u8;
        Rgb([blend(r), blend(g), blend(b)])
    })
}

fn text_operations(text: &str, layout: &PageLayout) -> Vec<Operation> {
    let (x, top_y) = layout.text_origin;
    let leading = layout.font_size * layout.line_height_factor;

    let mut ops = vec![
        Operation::new("BT", vec![]),
        Operation::new(
            "Tf",
            vec![Object::Name(FONT_RESOURCE.as_bytes().to_vec()), layout.font_size.into()],
        ),
        Operation::new("TL", vec![leading.into()]),
        Operation::new("Td", vec![x.into(), (layout.page_height - top_y).into()]),
    ];
    for (i, line) in text.lines().enumerate() {
        if i > 0 {
            ops.push(Operation::new("T*", vec![]));
        }
        ops.push(Operation::new(
            "Tj",
            vec![Object::String(encode_win_ansi(line), StringFormat::Literal)],
        ));
    }
    ops.push(Operation::new("ET", vec![]));
    ops
}

/// Maps text onto WinAnsiEncoding bytes for the standard Helvetica font.
/// Characters the encoding lacks become `?`.
pub fn encode_win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| match c {
            '\t' => b' ',
            ' '..='~' => c as u8,
            '\u{A0}'..='\u{FF}' => c as u32 as u8,
            // 0x80..=0x9F is where WinAnsi departs from Latin-1
            '€' => 0x80,
            '‚' => 0x82,
            'ƒ' => 0x83,
            '„' => 0x84,
            '…' => 0x85,
            '†' => 0x86,
            '‡' => 0x87,
            'ˆ' => 0x88,
            '‰' => 0x89,
            'Š' => 0x8A,
            '‹' => 0x8B,
            'Œ' => 0x8C,
            'Ž' => 0x8E,
            '‘' => 0x91,
            '’' => 0x92,
            '“' => 0x93,
            '”' => 0x94,
            '•' => 0x95,
            '–' => 0x96,
            '—' => 0x97,
            '˜' => 0x98,
            '™' => 0x99,
            'š' => 0x9A,
            '›' => 0x9B,
            'œ' => 0x9C,
            'ž' => 0x9E,
            'Ÿ' => 0x9F,
            _ => b'?',
        })
        .collect()
}
