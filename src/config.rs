//! # Pipeline Configuration Module
//!
//! This module defines configuration structures for the extraction runs,
//! including file locations, OCR parameters, batch settings and the
//! thresholds used by the line classifier and item extractor.

use std::env;
use std::path::PathBuf;

use log::debug;

use crate::model::MealType;

// Constants for pipeline configuration
pub const DEFAULT_DATA_DIR: &str = "data";
pub const DEFAULT_PDF_NAME: &str = "cardapios-planeta-intestino.pdf";
pub const DEFAULT_LANGUAGES: &str = "por";
pub const DEFAULT_DPI: u32 = 300;
pub const DEFAULT_PAGE_SEG_MODE: &str = "6"; // single uniform block of text
pub const DEFAULT_BATCH_SIZE: u32 = 10;
pub const DEFAULT_FIRST_PAGE: u32 = 1;
pub const DEFAULT_LAST_PAGE: u32 = 191;
pub const MIN_PAGE_TEXT_CHARS: usize = 10;
pub const DEFAULT_CONDITION: &str = "geral";

/// OCR engine settings
#[derive(Debug, Clone)]
pub struct OcrConfig {
    /// Tesseract language code, a single locale (e.g. "por")
    pub languages: String,
    /// Resolution pages are rendered at for OCR, in dots per inch
    pub dpi: u32,
    /// Tesseract page segmentation mode
    pub page_seg_mode: String,
    /// Optional tessdata directory; Tesseract's own lookup is used when unset
    pub tessdata_dir: Option<PathBuf>,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            languages: DEFAULT_LANGUAGES.to_string(),
            dpi: DEFAULT_DPI,
            page_seg_mode: DEFAULT_PAGE_SEG_MODE.to_string(),
            tessdata_dir: None,
        }
    }
}

/// Batched OCR settings
#[derive(Debug, Clone)]
pub struct BatchConfig {
    /// Pages per batch; the checkpoint is rewritten after each batch
    pub batch_size: u32,
    /// First page when no range is given on the command line
    pub default_first_page: u32,
    /// Last page when no range is given on the command line
    pub default_last_page: u32,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            default_first_page: DEFAULT_FIRST_PAGE,
            default_last_page: DEFAULT_LAST_PAGE,
        }
    }
}

/// Thresholds for line classification and item extraction
#[derive(Debug, Clone)]
pub struct ExtractorConfig {
    /// A line containing a meal trigger is a header only below this many characters
    pub header_max_len: usize,
    /// Lines shorter than this (after trimming) are noise
    pub min_line_len: usize,
    /// Inclusive lower bound for a cleaned item name, in characters
    pub min_name_len: usize,
    /// Exclusive upper bound for a cleaned item name, in characters
    pub max_name_len: usize,
    /// Meal type assumed before the first header of a document
    pub default_meal: MealType,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            header_max_len: 80,
            min_line_len: 4,
            min_name_len: 3,
            max_name_len: 100,
            default_meal: MealType::Lunch,
        }
    }
}

/// Input and output locations, all derived from the data directory by default
#[derive(Debug, Clone)]
pub struct PathsConfig {
    pub data_dir: PathBuf,
    pub pdf_path: PathBuf,
    pub docx_dir: PathBuf,
}

impl PathsConfig {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        let data_dir = data_dir.into();
        let docx_dir = data_dir.join("pdfs");
        Self {
            pdf_path: docx_dir.join(DEFAULT_PDF_NAME),
            docx_dir,
            data_dir,
        }
    }

    /// Output of the direct text extraction run
    pub fn raw_extraction(&self) -> PathBuf {
        self.data_dir.join("extracao_bruta.json")
    }

    /// Output of the direct-with-OCR-fallback run, input of the structuring run
    pub fn full_extraction(&self) -> PathBuf {
        self.data_dir.join("extracao_completa.json")
    }

    /// Output of the full and batched OCR runs, input of the knowledge-base run
    pub fn ocr_extraction(&self) -> PathBuf {
        self.data_dir.join("extracao_ocr_completa.json")
    }

    pub fn checkpoint(&self) -> PathBuf {
        self.data_dir.join("extracao_progresso.json")
    }

    pub fn structured(&self) -> PathBuf {
        self.data_dir.join("dados_estruturados.json")
    }

    pub fn knowledge_base(&self) -> PathBuf {
        self.data_dir.join("base_conhecimento.json")
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self::new(DEFAULT_DATA_DIR)
    }
}

/// Configuration structure for every run of the toolkit
#[derive(Debug, Clone, Default)]
pub struct PipelineConfig {
    pub paths: PathsConfig,
    pub ocr: OcrConfig,
    pub batch: BatchConfig,
    pub extractor: ExtractorConfig,
}

impl PipelineConfig {
    /// Build the configuration from defaults, a `.env` file and environment overrides
    ///
    /// Recognised variables: `CARDAPIO_DATA_DIR`, `CARDAPIO_PDF_PATH`,
    /// `CARDAPIO_OCR_LANG` and `TESSDATA_PREFIX`.
    pub fn from_env() -> Self {
        dotenv::dotenv().ok();

        let mut config = match env::var("CARDAPIO_DATA_DIR") {
            Ok(dir) => Self {
                paths: PathsConfig::new(dir),
                ..Default::default()
            },
            Err(_) => Self::default(),
        };

        if let Ok(pdf) = env::var("CARDAPIO_PDF_PATH") {
            config.paths.pdf_path = PathBuf::from(pdf);
        }
        if let Ok(lang) = env::var("CARDAPIO_OCR_LANG") {
            config.ocr.languages = lang;
        }
        if let Ok(dir) = env::var("TESSDATA_PREFIX") {
            config.ocr.tessdata_dir = Some(PathBuf::from(dir));
        }

        debug!("Loaded pipeline configuration: {:?}", config);
        config
    }
}
