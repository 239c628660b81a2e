//! # OCR Module
//!
//! Tesseract OCR through `leptess`, available with the `ocr` Cargo feature.
//! One Tesseract instance is created per engine and reused for every page;
//! initialisation is the slow part.

#[cfg(feature = "ocr")]
use std::sync::Mutex;

#[cfg(feature = "ocr")]
use leptess::LepTess;
#[cfg(feature = "ocr")]
use log::info;

#[cfg(feature = "ocr")]
use crate::config::OcrConfig;
#[cfg(feature = "ocr")]
use crate::errors::{PipelineError, PipelineResult};

/// Printed when OCR is required but unavailable
pub const INSTALL_HINT: &str = "install tesseract with Portuguese language data \
(macOS: brew install tesseract tesseract-lang; Debian/Ubuntu: apt install tesseract-ocr tesseract-ocr-por) \
and rebuild with `cargo build --features ocr`";

/// Tesseract-backed OCR engine
#[cfg(feature = "ocr")]
pub struct TesseractEngine {
    tess: Mutex<LepTess>,
    description: String,
    dpi: u32,
}

#[cfg(feature = "ocr")]
impl TesseractEngine {
    /// Initialise Tesseract for the configured language and segmentation mode
    pub fn new(config: &OcrConfig) -> PipelineResult<Self> {
        let data_path = config
            .tessdata_dir
            .as_ref()
            .map(|dir| dir.to_string_lossy().into_owned());

        info!("Creating new OCR instance for languages: {}", config.languages);
        let mut tess = LepTess::new(data_path.as_deref(), &config.languages).map_err(|e| {
            PipelineError::MissingDependency {
                name: "tesseract".to_string(),
                hint: format!("failed to initialize Tesseract OCR ({e}); {INSTALL_HINT}"),
            }
        })?;

        tess.set_variable(leptess::Variable::TesseditPagesegMode, &config.page_seg_mode)
            .map_err(|e| PipelineError::Ocr(format!("Failed to set page segmentation mode: {e:?}")))?;

        Ok(Self {
            tess: Mutex::new(tess),
            description: format!("OCR (Tesseract, {})", config.languages),
            dpi: config.dpi,
        })
    }
}

#[cfg(feature = "ocr")]
impl super::OcrEngine for TesseractEngine {
    fn name(&self) -> &str {
        &self.description
    }

    fn ocr_image(&self, image: &[u8]) -> PipelineResult<String> {
        let mut tess = self
            .tess
            .lock()
            .map_err(|_| PipelineError::Ocr("Tesseract instance lock poisoned".to_string()))?;

        tess.set_image_from_mem(image)
            .map_err(|e| PipelineError::Ocr(format!("Failed to load image for OCR: {e}")))?;
        tess.set_source_resolution(self.dpi as i32);

        let extracted_text = tess
            .get_utf8_text()
            .map_err(|e| PipelineError::Ocr(format!("Failed to extract text from image: {e}")))?;

        let cleaned_text = clean_ocr_text(&extracted_text);
        info!(
            "OCR extraction completed. Extracted {} characters of text",
            cleaned_text.len()
        );
        Ok(cleaned_text)
    }
}

/// Trim every line and drop blank ones
pub fn clean_ocr_text(text: &str) -> String {
    text.trim()
        .lines()
        .map(|line| line.trim())
        .filter(|line| !line.is_empty())
        .collect::<Vec<&str>>()
        .join("\n")
}
