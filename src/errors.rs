//! # Pipeline Error Types Module
//!
//! This module defines the error types used throughout the extraction pipeline.
//! Fatal kinds stop a run with exit code 1; the per-file and per-page kinds are
//! caught by the runs themselves and turned into log lines or marker text.

use std::path::PathBuf;
use thiserror::Error;

/// Custom error types for extraction and classification runs
#[derive(Debug, Error)]
pub enum PipelineError {
    /// A required input file is absent
    #[error("Input file not found: {}", .0.display())]
    MissingInputFile(PathBuf),
    /// A required extraction backend is not available in this build or on this host
    #[error("Missing dependency {name}: {hint}")]
    MissingDependency { name: String, hint: String },
    /// PDF parsing errors
    #[error("PDF error: {0}")]
    Pdf(String),
    /// Word document parsing errors
    #[error("DOCX error: {0}")]
    Docx(String),
    /// Page image extraction errors
    #[error("Render error: {0}")]
    Render(String),
    /// OCR engine errors
    #[error("OCR error: {0}")]
    Ocr(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl PipelineError {
    /// Whether this error must abort the run (as opposed to being recorded and skipped)
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            PipelineError::MissingInputFile(_) | PipelineError::MissingDependency { .. }
        )
    }

    /// Install hint printed alongside a missing dependency
    pub fn hint(&self) -> Option<&str> {
        match self {
            PipelineError::MissingDependency { hint, .. } => Some(hint),
            _ => None,
        }
    }
}

pub type PipelineResult<T> = Result<T, PipelineError>;

impl From<lopdf::Error> for PipelineError {
    fn from(err: lopdf::Error) -> Self {
        PipelineError::Pdf(err.to_string())
    }
}

impl From<zip::result::ZipError> for PipelineError {
    fn from(err: zip::result::ZipError) -> Self {
        PipelineError::Docx(err.to_string())
    }
}

impl From<quick_xml::Error> for PipelineError {
    fn from(err: quick_xml::Error) -> Self {
        PipelineError::Docx(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fatal_kinds() {
        assert!(PipelineError::MissingInputFile(PathBuf::from("x.pdf")).is_fatal());
        assert!(PipelineError::MissingDependency {
            name: "tesseract".into(),
            hint: "install it".into(),
        }
        .is_fatal());
        assert!(!PipelineError::Ocr("boom".into()).is_fatal());
        assert!(!PipelineError::Docx("bad zip".into()).is_fatal());
    }

    #[test]
    fn test_display_includes_path_and_hint() {
        let err = PipelineError::MissingInputFile(PathBuf::from("data/menu.pdf"));
        assert_eq!(err.to_string(), "Input file not found: data/menu.pdf");

        let err = PipelineError::MissingDependency {
            name: "tesseract".into(),
            hint: "brew install tesseract".into(),
        };
        assert_eq!(err.hint(), Some("brew install tesseract"));
        assert!(err.to_string().contains("tesseract"));
    }
}
