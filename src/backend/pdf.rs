//! PDF page source backed by `pdf-extract`, `lopdf` and PDFium.
//!
//! `pdf-extract` provides the text layer page by page. `lopdf` gives access to
//! the page objects, used to tell whether a page embeds images. Page images for
//! OCR are rendered by PDFium when the library is available. Without it the
//! page is composed from its image XObjects (JPEG, or raw pixels behind
//! FlateDecode), each placed where the content stream draws it.

use std::collections::HashMap;
use std::io::Cursor;
use std::path::Path;

use image::imageops::{self, FilterType};
use image::{DynamicImage, ImageOutputFormat, Rgb, RgbImage};
use log::{debug, info, warn};
use lopdf::content::Content;
use lopdf::{Dictionary, Document, Object, ObjectId};

use super::render::PdfiumRenderer;
use super::tables::detect_tables;
use super::PageSource;
use crate::config::DEFAULT_DPI;
use crate::errors::{PipelineError, PipelineResult};
use crate::model::Table;

/// A PDF opened for page-wise extraction
pub struct PdfPageSource {
    bytes: Vec<u8>,
    document: Document,
    page_ids: Vec<ObjectId>,
    page_texts: Result<Vec<String>, String>,
    renderer: Option<PdfiumRenderer>,
    render_dpi: u32,
}

impl PdfPageSource {
    /// Open a PDF file, rendering pages with PDFium when it can be loaded
    ///
    /// # Errors
    ///
    /// [`PipelineError::MissingInputFile`] if `path` does not exist, a PDF
    /// error if the file cannot be parsed. A failing text layer is not an
    /// error here: it is reported per page by
    /// [`PageSource::extract_page_text`].
    pub fn open(path: &Path) -> PipelineResult<Self> {
        if !path.exists() {
            return Err(PipelineError::MissingInputFile(path.to_path_buf()));
        }
        let bytes = std::fs::read(path)?;
        let mut source = Self::from_bytes(path, bytes)?;

        match PdfiumRenderer::new() {
            Ok(renderer) => source.renderer = Some(renderer),
            Err(e) => info!("{}; page images are composed from embedded scans", e),
        }
        Ok(source)
    }

    /// Parse a PDF held in memory; pages are composed from embedded images
    pub fn from_bytes(path: &Path, bytes: Vec<u8>) -> PipelineResult<Self> {
        let document = Document::load_mem(&bytes)?;
        let page_ids: Vec<ObjectId> = document.get_pages().into_values().collect();

        let page_texts = pdf_extract::extract_text_from_mem_by_pages(&bytes).map_err(|e| {
            warn!("Text layer unavailable for {}: {}", path.display(), e);
            e.to_string()
        });

        info!(
            "Opened PDF {} with {} pages ({} KB)",
            path.display(),
            page_ids.len(),
            bytes.len() / 1024
        );

        Ok(Self {
            bytes,
            document,
            page_ids,
            page_texts,
            renderer: None,
            render_dpi: DEFAULT_DPI,
        })
    }

    /// Resolution used when PDFium renders a page
    pub fn with_render_dpi(mut self, dpi: u32) -> Self {
        self.render_dpi = dpi;
        self
    }

    fn page_id(&self, page: u32) -> PipelineResult<ObjectId> {
        page.checked_sub(1)
            .and_then(|index| self.page_ids.get(index as usize))
            .copied()
            .ok_or_else(|| {
                PipelineError::Pdf(format!(
                    "Page {} not found (PDF has {} pages)",
                    page,
                    self.page_ids.len()
                ))
            })
    }

    fn page_dict(&self, page: u32) -> PipelineResult<&Dictionary> {
        Ok(self.document.get_object(self.page_id(page)?)?.as_dict()?)
    }

    /// Image XObject streams of a page by resource name, inherited resources included
    fn page_images(&self, page: u32) -> PipelineResult<Vec<(&[u8], &lopdf::Stream)>> {
        let page_dict = self.page_dict(page)?;
        let Some(resources) = inherited_entry(&self.document, page_dict, b"Resources") else {
            return Ok(Vec::new());
        };
        let Some(xobjects) = resources
            .get(b"XObject")
            .ok()
            .and_then(|obj| resolve(&self.document, obj).as_dict().ok())
        else {
            return Ok(Vec::new());
        };

        Ok(xobjects
            .iter()
            .filter_map(|(name, obj)| match resolve(&self.document, obj) {
                Object::Stream(stream) if is_image_subtype(&stream.dict) => {
                    Some((name.as_slice(), stream))
                }
                _ => None,
            })
            .collect())
    }

    /// Where each XObject is drawn on the page, by resource name
    ///
    /// Follows `q`/`Q`/`cm` on the page content stream. An undecodable stream
    /// yields no placements.
    fn image_placements(&self, page: u32) -> HashMap<Vec<u8>, Vec<Rect>> {
        let mut placements: HashMap<Vec<u8>, Vec<Rect>> = HashMap::new();
        let content = self
            .page_id(page)
            .and_then(|id| self.document.get_page_content(id).map_err(PipelineError::from))
            .and_then(|data| Content::decode(&data).map_err(PipelineError::from));
        let content = match content {
            Ok(content) => content,
            Err(e) => {
                debug!("No drawing operations for page {}: {}", page, e);
                return placements;
            }
        };

        let mut ctm = IDENTITY;
        let mut saved = Vec::new();
        for op in &content.operations {
            match op.operator.as_str() {
                "q" => saved.push(ctm),
                "Q" => ctm = saved.pop().unwrap_or(IDENTITY),
                "cm" => {
                    if let Some(m) = matrix_operands(&op.operands) {
                        ctm = concat(&m, &ctm);
                    }
                }
                "Do" => {
                    if let Some(Object::Name(name)) = op.operands.first() {
                        placements
                            .entry(name.clone())
                            .or_default()
                            .push(Rect::unit_square(&ctm));
                    }
                }
                _ => {}
            }
        }
        placements
    }

    /// Compose the page from its images, drawn where the content stream places them
    fn compose_page_images(&self, page: u32) -> PipelineResult<Vec<u8>> {
        let placements = self.image_placements(page);
        let mut tiles = Vec::new();

        for (name, stream) in self.page_images(page)? {
            let img = match decode_image(&self.document, stream) {
                Ok(img) => img,
                Err(e) => {
                    debug!("Skipping undecodable image on page {}: {}", page, e);
                    continue;
                }
            };
            match placements.get(name) {
                Some(rects) => tiles.extend(rects.iter().map(|rect| Tile {
                    image: img.clone(),
                    rect: Some(*rect),
                })),
                None => tiles.push(Tile { image: img, rect: None }),
            }
        }

        if tiles.is_empty() {
            return Err(PipelineError::Render(format!(
                "No usable image found on page {page}"
            )));
        }
        let count = tiles.len();
        let canvas = compose(tiles);
        let (width, height) = canvas.dimensions();

        let mut png = Cursor::new(Vec::new());
        DynamicImage::ImageRgb8(canvas)
            .write_to(&mut png, ImageOutputFormat::Png)
            .map_err(|e| PipelineError::Render(format!("Failed to encode PNG: {e}")))?;

        debug!(
            "Composed page {} from {} images as {}x{} PNG ({} bytes)",
            page,
            count,
            width,
            height,
            png.get_ref().len()
        );
        Ok(png.into_inner())
    }
}

impl PageSource for PdfPageSource {
    fn page_count(&self) -> u32 {
        self.page_ids.len() as u32
    }

    fn extract_page_text(&self, page: u32) -> PipelineResult<String> {
        match &self.page_texts {
            Ok(texts) => Ok(page
                .checked_sub(1)
                .and_then(|index| texts.get(index as usize))
                .cloned()
                .unwrap_or_default()),
            Err(msg) => Err(PipelineError::Pdf(msg.clone())),
        }
    }

    fn extract_tables(&self, page: u32) -> PipelineResult<Vec<Table>> {
        let text = self.extract_page_text(page)?;
        Ok(detect_tables(&text))
    }

    fn has_images(&self, page: u32) -> bool {
        self.page_images(page)
            .map(|images| !images.is_empty())
            .unwrap_or(false)
    }

    fn page_image(&self, page: u32) -> PipelineResult<Vec<u8>> {
        if let Some(renderer) = &self.renderer {
            match renderer.render_page(&self.bytes, page, self.render_dpi) {
                Ok(png) => return Ok(png),
                Err(e) => warn!("{}; composing page {} from embedded images", e, page),
            }
        }
        self.compose_page_images(page)
    }
}

/// Affine matrix `[a b c d e f]` as used by the PDF `cm` operator
type Matrix = [f32; 6];

const IDENTITY: Matrix = [1.0, 0.0, 0.0, 1.0, 0.0, 0.0];

fn matrix_operands(operands: &[Object]) -> Option<Matrix> {
    if operands.len() != 6 {
        return None;
    }
    let mut m = IDENTITY;
    for (slot, obj) in m.iter_mut().zip(operands) {
        *slot = obj.as_float().ok()?;
    }
    Some(m)
}

/// `m` applied before `ctm`
fn concat(m: &Matrix, ctm: &Matrix) -> Matrix {
    [
        m[0] * ctm[0] + m[1] * ctm[2],
        m[0] * ctm[1] + m[1] * ctm[3],
        m[2] * ctm[0] + m[3] * ctm[2],
        m[2] * ctm[1] + m[3] * ctm[3],
        m[4] * ctm[0] + m[5] * ctm[2] + ctm[4],
        m[4] * ctm[1] + m[5] * ctm[3] + ctm[5],
    ]
}

/// Axis-aligned box in page space (y pointing up)
#[derive(Debug, Clone, Copy, PartialEq)]
struct Rect {
    x0: f32,
    y0: f32,
    x1: f32,
    y1: f32,
}

impl Rect {
    /// Bounds of the unit square an image is drawn into, mapped through `ctm`
    fn unit_square(ctm: &Matrix) -> Self {
        let corners = [(0.0, 0.0), (1.0, 0.0), (0.0, 1.0), (1.0, 1.0)].map(|(x, y)| {
            (
                ctm[0] * x + ctm[2] * y + ctm[4],
                ctm[1] * x + ctm[3] * y + ctm[5],
            )
        });
        corners.iter().fold(
            Rect {
                x0: f32::MAX,
                y0: f32::MAX,
                x1: f32::MIN,
                y1: f32::MIN,
            },
            |r, &(x, y)| Rect {
                x0: r.x0.min(x),
                y0: r.y0.min(y),
                x1: r.x1.max(x),
                y1: r.y1.max(y),
            },
        )
    }

    fn width(&self) -> f32 {
        self.x1 - self.x0
    }

    fn height(&self) -> f32 {
        self.y1 - self.y0
    }

    fn is_empty(&self) -> bool {
        self.width() <= f32::EPSILON || self.height() <= f32::EPSILON
    }
}

struct Tile {
    image: DynamicImage,
    rect: Option<Rect>,
}

/// Lay tiles out on a white canvas
///
/// Placed tiles keep their relative positions at the resolution of the
/// sharpest one. Tiles the content stream never draws are stacked below.
fn compose(tiles: Vec<Tile>) -> RgbImage {
    let (placed, loose): (Vec<Tile>, Vec<Tile>) = tiles
        .into_iter()
        .partition(|tile| tile.rect.is_some_and(|rect| !rect.is_empty()));

    let mut layout: Vec<(RgbImage, i64, i64)> = Vec::new();
    let mut placed_width = 0u32;
    let mut placed_height = 0u32;

    if !placed.is_empty() {
        let rects: Vec<Rect> = placed.iter().filter_map(|tile| tile.rect).collect();
        let scale = placed
            .iter()
            .zip(&rects)
            .map(|(tile, rect)| tile.image.width() as f32 / rect.width())
            .fold(f32::MIN, f32::max);
        let min_x = rects.iter().map(|r| r.x0).fold(f32::MAX, f32::min);
        let max_x = rects.iter().map(|r| r.x1).fold(f32::MIN, f32::max);
        let min_y = rects.iter().map(|r| r.y0).fold(f32::MAX, f32::min);
        let max_y = rects.iter().map(|r| r.y1).fold(f32::MIN, f32::max);
        placed_width = px((max_x - min_x) * scale);
        placed_height = px((max_y - min_y) * scale);

        for (tile, rect) in placed.into_iter().zip(rects) {
            let width = px(rect.width() * scale);
            let height = px(rect.height() * scale);
            let mut img = tile.image.to_rgb8();
            if img.dimensions() != (width, height) {
                img = imageops::resize(&img, width, height, FilterType::Triangle);
            }
            let x = ((rect.x0 - min_x) * scale).round() as i64;
            let y = ((max_y - rect.y1) * scale).round() as i64;
            layout.push((img, x, y));
        }
    }

    let mut width = placed_width;
    let mut height = placed_height;
    for tile in loose {
        let img = tile.image.to_rgb8();
        let (tile_width, tile_height) = img.dimensions();
        layout.push((img, 0, height as i64));
        width = width.max(tile_width);
        height += tile_height;
    }

    let mut canvas = RgbImage::from_pixel(width.max(1), height.max(1), Rgb([255, 255, 255]));
    for (img, x, y) in &layout {
        imageops::overlay(&mut canvas, img, *x, *y);
    }
    canvas
}

fn px(length: f32) -> u32 {
    (length.round() as u32).max(1)
}

/// Follow references until a direct object is reached
fn resolve<'a>(doc: &'a Document, obj: &'a Object) -> &'a Object {
    let mut current = obj;
    while let Object::Reference(id) = current {
        match doc.get_object(*id) {
            Ok(next) => current = next,
            Err(_) => break,
        }
    }
    current
}

/// Look up a dictionary entry on a page node, walking up `/Parent` links
fn inherited_entry<'a>(
    doc: &'a Document,
    dict: &'a Dictionary,
    key: &[u8],
) -> Option<&'a Dictionary> {
    let mut node = dict;
    loop {
        if let Ok(obj) = node.get(key) {
            return resolve(doc, obj).as_dict().ok();
        }
        let parent = node.get(b"Parent").ok()?;
        node = resolve(doc, parent).as_dict().ok()?;
    }
}

fn is_image_subtype(dict: &Dictionary) -> bool {
    dict.get(b"Subtype")
        .map(|obj| matches!(obj, Object::Name(ref n) if n == b"Image"))
        .unwrap_or(false)
}

fn has_filter(dict: &Dictionary, name: &[u8]) -> bool {
    match dict.get(b"Filter") {
        Ok(Object::Name(n)) => n == name,
        Ok(Object::Array(filters)) => filters
            .iter()
            .any(|f| matches!(f, Object::Name(ref n) if n == name)),
        _ => false,
    }
}

/// Decode an image XObject
fn decode_image(doc: &Document, stream: &lopdf::Stream) -> PipelineResult<DynamicImage> {
    let content = stream
        .decompressed_content()
        .unwrap_or_else(|_| stream.content.clone());

    // DCTDecode content is a complete JPEG file; some streams embed PNG/TIFF files
    if has_filter(&stream.dict, b"DCTDecode") || image::guess_format(&content).is_ok() {
        return image::load_from_memory(&content)
            .map_err(|e| PipelineError::Render(format!("Failed to decode page image: {e}")));
    }

    raw_pixels_to_image(doc, &stream.dict, content)
}

fn raw_pixels_to_image(doc: &Document, dict: &Dictionary, pixels: Vec<u8>) -> PipelineResult<DynamicImage> {
    let int = |key: &[u8]| -> Option<u32> {
        dict.get(key)
            .ok()
            .and_then(|obj| resolve(doc, obj).as_i64().ok())
            .map(|v| v as u32)
    };
    let width = int(b"Width").ok_or_else(|| PipelineError::Render("Image without /Width".into()))?;
    let height =
        int(b"Height").ok_or_else(|| PipelineError::Render("Image without /Height".into()))?;
    if int(b"BitsPerComponent").unwrap_or(8) != 8 {
        return Err(PipelineError::Render(
            "Only 8-bit raw images are supported".into(),
        ));
    }

    let gray = matches!(
        dict.get(b"ColorSpace").map(|cs| resolve(doc, cs)),
        Ok(Object::Name(ref n)) if n == b"DeviceGray"
    );

    if gray {
        image::GrayImage::from_raw(width, height, pixels).map(DynamicImage::ImageLuma8)
    } else {
        image::RgbImage::from_raw(width, height, pixels).map(DynamicImage::ImageRgb8)
    }
    .ok_or_else(|| PipelineError::Render("Raw pixel buffer too small".into()))
}
