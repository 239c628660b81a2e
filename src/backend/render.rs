//! Full-page rendering through PDFium.
//!
//! The PDFium library is bound at runtime, so the crate builds without it.
//! [`PdfiumRenderer::new`] fails when no library can be found and the PDF
//! source then composes the page from its embedded images instead.

use std::io::Cursor;

use image::{DynamicImage, GrayImage, ImageOutputFormat, RgbImage, RgbaImage};
use log::{debug, warn};
use pdfium_render::prelude::*;

use crate::errors::{PipelineError, PipelineResult};

/// Largest width or height of a rendered page in pixels
const MAX_DIMENSION_PX: u32 = 4096;

const POINTS_PER_INCH: f32 = 72.0;

/// Renders PDF pages to PNG with PDFium.
///
/// Stateless: `Pdfium` is `!Send`, so a handle is bound per call. The dynamic
/// loader caches the library after the first bind.
pub struct PdfiumRenderer;

impl PdfiumRenderer {
    /// Check that the PDFium library can be bound
    pub fn new() -> PipelineResult<Self> {
        load_pdfium()?;
        Ok(Self)
    }

    /// Render page `page` (1-based) of `pdf_bytes` at `dpi` as PNG
    pub fn render_page(&self, pdf_bytes: &[u8], page: u32, dpi: u32) -> PipelineResult<Vec<u8>> {
        let pdfium = load_pdfium()?;
        let document = pdfium
            .load_pdf_from_byte_slice(pdf_bytes, None)
            .map_err(|e| PipelineError::Render(format!("PDFium could not load the PDF: {e}")))?;
        let pages = document.pages();

        let index = page
            .checked_sub(1)
            .and_then(|index| u16::try_from(index).ok())
            .ok_or_else(|| PipelineError::Render(format!("Page {page} out of range")))?;
        let pdf_page = pages.get(index).map_err(|_| {
            PipelineError::Render(format!(
                "Page {page} out of range (document has {} pages)",
                pages.len()
            ))
        })?;

        let (width, height) = render_dimensions(pdf_page.width().value, pdf_page.height().value, dpi);
        let config = PdfRenderConfig::new()
            .set_target_width(width as i32)
            .set_maximum_height(height as i32);
        let bitmap = pdf_page
            .render_with_config(&config)
            .map_err(|e| PipelineError::Render(format!("PDFium failed on page {page}: {e}")))?;

        let img = bitmap_to_image(
            bitmap.width() as u32,
            bitmap.height() as u32,
            bitmap.as_raw_bytes().to_vec(),
        )?;
        let mut png = Cursor::new(Vec::new());
        img.write_to(&mut png, ImageOutputFormat::Png)
            .map_err(|e| PipelineError::Render(format!("Failed to encode PNG: {e}")))?;

        debug!(
            "Rendered page {} at {} dpi as {}x{} PNG ({} bytes)",
            page,
            dpi,
            img.width(),
            img.height(),
            png.get_ref().len()
        );
        Ok(png.into_inner())
    }
}

/// Bind PDFium from `PDFIUM_DYNAMIC_LIB_PATH`, the executable's directory or the system paths
fn load_pdfium() -> PipelineResult<Pdfium> {
    if let Ok(path) = std::env::var("PDFIUM_DYNAMIC_LIB_PATH") {
        let bindings = Pdfium::bind_to_library(&path).map_err(|e| {
            PipelineError::Render(format!("Failed to load PDFium from {path}: {e}"))
        })?;
        return Ok(Pdfium::new(bindings));
    }

    if let Some(exe_dir) = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.to_path_buf()))
    {
        let lib_path = Pdfium::pdfium_platform_library_name_at_path(exe_dir.to_string_lossy().as_ref());
        if let Ok(bindings) = Pdfium::bind_to_library(&lib_path) {
            debug!("Loaded PDFium from {}", exe_dir.display());
            return Ok(Pdfium::new(bindings));
        }
    }

    let bindings = Pdfium::bind_to_system_library().map_err(|e| {
        PipelineError::Render(format!(
            "PDFium library not found, set PDFIUM_DYNAMIC_LIB_PATH: {e}"
        ))
    })?;
    Ok(Pdfium::new(bindings))
}

/// Pixel size of a page at `dpi`, capped at [`MAX_DIMENSION_PX`] with the aspect ratio kept
fn render_dimensions(width_points: f32, height_points: f32, dpi: u32) -> (u32, u32) {
    let scale = dpi as f32 / POINTS_PER_INCH;
    let width = (width_points * scale).max(1.0);
    let height = (height_points * scale).max(1.0);

    let longest = width.max(height);
    if longest <= MAX_DIMENSION_PX as f32 {
        return (width as u32, height as u32);
    }

    let ratio = MAX_DIMENSION_PX as f32 / longest;
    warn!(
        "Page of {}x{} px at {} dpi capped to {} px",
        width as u32, height as u32, dpi, MAX_DIMENSION_PX
    );
    (
        ((width * ratio) as u32).clamp(1, MAX_DIMENSION_PX),
        ((height * ratio) as u32).clamp(1, MAX_DIMENSION_PX),
    )
}

/// Wrap a PDFium bitmap buffer (BGRA, BGR or gray) as an image
fn bitmap_to_image(width: u32, height: u32, mut bytes: Vec<u8>) -> PipelineResult<DynamicImage> {
    let pixels = (width as usize) * (height as usize);
    if pixels == 0 {
        return Err(PipelineError::Render("PDFium returned an empty bitmap".into()));
    }

    let img = match bytes.len() / pixels {
        4 => {
            bytes.truncate(pixels * 4);
            bytes.chunks_exact_mut(4).for_each(|px| px.swap(0, 2));
            RgbaImage::from_raw(width, height, bytes).map(DynamicImage::ImageRgba8)
        }
        3 => {
            bytes.truncate(pixels * 3);
            bytes.chunks_exact_mut(3).for_each(|px| px.swap(0, 2));
            RgbImage::from_raw(width, height, bytes).map(DynamicImage::ImageRgb8)
        }
        1 => {
            bytes.truncate(pixels);
            GrayImage::from_raw(width, height, bytes).map(DynamicImage::ImageLuma8)
        }
        _ => None,
    };
    img.ok_or_else(|| PipelineError::Render("Unsupported PDFium bitmap layout".into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_a4_at_300_dpi() {
        // 595x842 points
        assert_eq!(render_dimensions(595.0, 842.0, 300), (2479, 3508));
    }

    #[test]
    fn test_oversized_page_is_capped() {
        assert_eq!(render_dimensions(8192.0, 4096.0, 72), (MAX_DIMENSION_PX, 2048));
    }

    #[test]
    fn test_bgra_bitmap_becomes_rgba() {
        // one blue pixel, one red pixel
        let img = bitmap_to_image(2, 1, vec![255, 0, 0, 255, 0, 0, 255, 255]).unwrap();
        let rgba = img.to_rgba8();
        assert_eq!(rgba.get_pixel(0, 0).0, [0, 0, 255, 255]);
        assert_eq!(rgba.get_pixel(1, 0).0, [255, 0, 0, 255]);
    }

    #[test]
    fn test_bad_bitmap_is_render_error() {
        assert!(matches!(
            bitmap_to_image(0, 4, Vec::new()),
            Err(PipelineError::Render(_))
        ));
        assert!(matches!(
            bitmap_to_image(2, 2, vec![0; 8]),
            Err(PipelineError::Render(_))
        ));
    }
}
