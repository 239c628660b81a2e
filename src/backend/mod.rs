//! # Extraction Backends
//!
//! Capability interfaces over the third-party extraction libraries. Runs are
//! written against [`PageSource`] and [`OcrEngine`]; the concrete backends are
//! chosen once at startup, and an unavailable backend surfaces as
//! [`crate::errors::PipelineError::MissingDependency`] instead of a flag checked in every run.

pub mod docx;
pub mod ocr;
pub mod pdf;
pub mod render;
pub mod tables;

use crate::config::OcrConfig;
use crate::errors::PipelineResult;
use crate::model::Table;

pub use docx::read_docx_text;
pub use pdf::PdfPageSource;

/// Paginated document capable of yielding text, tables and page images.
///
/// Pages are numbered from 1.
pub trait PageSource {
    /// Number of pages in the document
    fn page_count(&self) -> u32;

    /// Text layer of a page, empty for scanned pages
    fn extract_page_text(&self, page: u32) -> PipelineResult<String>;

    /// Tables found on a page
    fn extract_tables(&self, page: u32) -> PipelineResult<Vec<Table>>;

    /// Whether the page embeds at least one image
    fn has_images(&self, page: u32) -> bool;

    /// Page image encoded as PNG, suitable for OCR
    fn page_image(&self, page: u32) -> PipelineResult<Vec<u8>>;
}

/// OCR engine abstraction (allows fakes in tests)
pub trait OcrEngine {
    /// Engine description for logs and metadata
    fn name(&self) -> &str;

    /// Recognise the text of an encoded image
    fn ocr_image(&self, image: &[u8]) -> PipelineResult<String>;
}

/// Select the OCR engine available in this build
///
/// # Errors
///
/// Returns [`crate::errors::PipelineError::MissingDependency`] with an install hint when the
/// crate was built without the `ocr` feature or Tesseract cannot be initialised.
pub fn detect_ocr_engine(config: &OcrConfig) -> PipelineResult<Box<dyn OcrEngine>> {
    #[cfg(feature = "ocr")]
    {
        let engine = ocr::TesseractEngine::new(config)?;
        Ok(Box::new(engine))
    }

    #[cfg(not(feature = "ocr"))]
    {
        log::warn!(
            "OCR requested for language '{}' but this build has no OCR backend",
            config.languages
        );
        Err(crate::errors::PipelineError::MissingDependency {
            name: "tesseract".to_string(),
            hint: ocr::INSTALL_HINT.to_string(),
        })
    }
}
