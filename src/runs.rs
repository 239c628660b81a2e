//! # Extraction Runs
//!
//! The four ways of turning the menu PDF into an [`ExtractionDocument`]:
//!
//! - [`extract_direct`]: text layer and tables only
//! - [`extract_with_ocr_fallback`]: text layer, OCR for pages without one
//! - [`extract_full_ocr`]: OCR every page
//! - [`run_batches`]: OCR a page range in resumable batches
//!
//! Page-level failures never abort a run: the page text becomes a bracketed
//! marker and the error is recorded on the page. Only fatal errors (see
//! [`PipelineError::is_fatal`]) propagate.

use std::ops::RangeInclusive;

use log::{debug, error, info, warn};

use crate::backend::{OcrEngine, PageSource};
use crate::checkpoint::Checkpoint;
use crate::config::{OcrConfig, MIN_PAGE_TEXT_CHARS};
use crate::errors::{PipelineError, PipelineResult};
use crate::model::{ExtractionDocument, ExtractionMetadata, PageRecord};

/// Marker stored for a page with no text layer when no OCR engine is available
pub fn not_extracted_marker(page: u32) -> String {
    format!("[PÁGINA {page} - TEXTO NÃO EXTRAÍDO - INSTALE OCR]")
}

/// Marker stored for a page whose OCR failed
pub fn ocr_error_marker(err: &PipelineError) -> String {
    format!("[ERRO OCR: {err}]")
}

/// Marker stored by a full OCR run for a failed page
pub fn ocr_page_error_marker(page: u32, err: &PipelineError) -> String {
    format!("[ERRO OCR na página {page}: {err}]")
}

/// Whether a page text is one of the markers above rather than page content
pub fn is_marker_text(text: &str) -> bool {
    let text = text.trim_start();
    text.starts_with("[ERRO") || text.starts_with("[PÁGINA")
}

fn timestamp() -> String {
    chrono::Local::now().to_rfc3339()
}

fn trimmed_len(text: &str) -> usize {
    text.trim().chars().count()
}

/// Run OCR on one page image
fn ocr_page(source: &dyn PageSource, ocr: &dyn OcrEngine, page: u32) -> PipelineResult<String> {
    let image = source.page_image(page)?;
    ocr.ocr_image(&image)
}

/// Text layer of a page; a page that cannot be read counts as having none
fn page_text_or_empty(source: &dyn PageSource, page: u32) -> String {
    source.extract_page_text(page).unwrap_or_else(|e| {
        warn!("No text layer for page {}: {}", page, e);
        String::new()
    })
}

fn page_tables_or_empty(source: &dyn PageSource, page: u32) -> Vec<crate::model::Table> {
    source.extract_tables(page).unwrap_or_else(|e| {
        debug!("Table extraction failed on page {}: {}", page, e);
        Vec::new()
    })
}

fn finish(pages: Vec<PageRecord>, total_pages: u32, mut metadata: ExtractionMetadata) -> ExtractionDocument {
    metadata.total_chars = pages.iter().map(PageRecord::char_count).sum();
    metadata.extracted_at = Some(timestamp());
    ExtractionDocument {
        total_pages,
        pages,
        metadata,
    }
}

/// Extract the text layer and tables of every page
pub fn extract_direct(source: &dyn PageSource) -> ExtractionDocument {
    let total = source.page_count();
    info!("Extracting text layer of {} pages", total);

    let pages: Vec<PageRecord> = (1..=total)
        .map(|page| {
            if page % 10 == 0 {
                info!("Processing page {}/{}", page, total);
            }
            PageRecord {
                tables: page_tables_or_empty(source, page),
                has_image: source.has_images(page),
                ..PageRecord::new(page, page_text_or_empty(source, page))
            }
        })
        .collect();

    let metadata = ExtractionMetadata {
        method: Some("texto_direto".to_string()),
        ..Default::default()
    };
    finish(pages, total, metadata)
}

/// Extract the text layer, falling back to OCR for pages with fewer than ten characters
///
/// Without an engine such pages get [`not_extracted_marker`]; a failed OCR
/// gets [`ocr_error_marker`].
pub fn extract_with_ocr_fallback(
    source: &dyn PageSource,
    ocr: Option<&dyn OcrEngine>,
) -> PipelineResult<ExtractionDocument> {
    let total = source.page_count();
    info!(
        "Extracting {} pages, OCR fallback: {}",
        total,
        ocr.map_or("unavailable", |engine| engine.name())
    );

    let mut pages = Vec::with_capacity(total as usize);
    for page in 1..=total {
        if page % 10 == 0 {
            info!("Processing page {}/{}", page, total);
        }

        let mut record = PageRecord {
            tables: page_tables_or_empty(source, page),
            has_image: source.has_images(page),
            ..PageRecord::new(page, page_text_or_empty(source, page))
        };

        if trimmed_len(&record.text) < MIN_PAGE_TEXT_CHARS {
            record.ocr_needed = true;
            match ocr {
                Some(engine) => match ocr_page(source, engine, page) {
                    Ok(text) => {
                        record.text = text;
                        record.ocr_applied = true;
                    }
                    Err(e) if e.is_fatal() => return Err(e),
                    Err(e) => {
                        error!("OCR failed on page {}: {}", page, e);
                        record.text = ocr_error_marker(&e);
                        record.error = Some(e.to_string());
                    }
                },
                None => record.text = not_extracted_marker(page),
            }
        }
        pages.push(record);
    }

    let metadata = ExtractionMetadata {
        method: Some("texto_direto_com_ocr".to_string()),
        ocr_used: Some(ocr.is_some()),
        ..Default::default()
    };
    Ok(finish(pages, total, metadata))
}

/// OCR every page, or only the first `limit` pages
pub fn extract_full_ocr(
    source: &dyn PageSource,
    ocr: &dyn OcrEngine,
    config: &OcrConfig,
    limit: Option<u32>,
) -> PipelineResult<ExtractionDocument> {
    let total = source.page_count();
    let last = limit.map_or(total, |limit| limit.min(total));
    info!("Running {} on pages 1-{} of {}", ocr.name(), last, total);

    let mut pages = Vec::with_capacity(last as usize);
    for page in 1..=last {
        info!("OCR page {}/{}", page, last);
        let record = match ocr_page(source, ocr, page) {
            Ok(text) => PageRecord {
                ocr_applied: true,
                ..PageRecord::new(page, text)
            },
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => {
                error!("OCR failed on page {}: {}", page, e);
                PageRecord {
                    error: Some(e.to_string()),
                    ..PageRecord::new(page, ocr_page_error_marker(page, &e))
                }
            }
        };
        pages.push(record);
    }

    let pages_with_text = pages
        .iter()
        .filter(|p| !is_marker_text(&p.text) && p.has_text(MIN_PAGE_TEXT_CHARS))
        .count();
    let metadata = ExtractionMetadata {
        method: Some("ocr".to_string()),
        language: Some(config.languages.clone()),
        resolution: Some(config.dpi),
        pages_with_text: Some(pages_with_text),
        ..Default::default()
    };
    Ok(finish(pages, last, metadata))
}

/// Split `range` into consecutive batches of at most `batch_size` pages
pub fn batches(range: RangeInclusive<u32>, batch_size: u32) -> Vec<RangeInclusive<u32>> {
    let size = batch_size.max(1);
    let (start, end) = (*range.start(), *range.end());
    let mut out = Vec::new();
    let mut first = start;
    while first <= end {
        let last = first.saturating_add(size - 1).min(end);
        out.push(first..=last);
        if last == u32::MAX {
            break;
        }
        first = last + 1;
    }
    out
}

/// OCR `range` in batches, resuming from and updating `checkpoint`
///
/// Pages already in the checkpoint are kept as they are and never sent to
/// OCR. The checkpoint is written after every batch. Pages past the end of the
/// document are ignored.
pub fn run_batches(
    source: &dyn PageSource,
    ocr: &dyn OcrEngine,
    checkpoint: &mut Checkpoint,
    range: RangeInclusive<u32>,
    batch_size: u32,
    config: &OcrConfig,
) -> PipelineResult<ExtractionDocument> {
    let page_count = source.page_count();
    let start = (*range.start()).max(1);
    let end = (*range.end()).min(page_count);
    if end < *range.end() {
        warn!(
            "Requested pages up to {} but the document has {}; stopping at {}",
            range.end(),
            page_count,
            end
        );
    }

    let metadata = ExtractionMetadata {
        method: Some("ocr_lotes".to_string()),
        language: Some(config.languages.clone()),
        resolution: Some(config.dpi),
        ..Default::default()
    };

    for batch in batches(start..=end, batch_size) {
        info!("Batch: pages {}-{}", batch.start(), batch.end());

        for page in batch {
            if checkpoint.contains(page) {
                debug!("Page {} already processed, skipping", page);
                continue;
            }

            let record = match ocr_page(source, ocr, page) {
                Ok(text) => PageRecord {
                    ocr_applied: true,
                    ..PageRecord::new(page, text.trim())
                },
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => {
                    error!("OCR failed on page {}: {}", page, e);
                    PageRecord {
                        ocr_applied: true,
                        error: Some(e.to_string()),
                        ..PageRecord::new(page, ocr_error_marker(&e))
                    }
                }
            };
            checkpoint.insert(record);
        }

        let mut batch_metadata = metadata.clone();
        batch_metadata.extracted_at = Some(timestamp());
        checkpoint.save(batch_metadata)?;
        info!("Progress saved: {} pages processed", checkpoint.len());
    }

    let mut final_metadata = metadata;
    final_metadata.extracted_at = Some(timestamp());
    Ok(checkpoint.to_document(final_metadata))
}
