//! # Knowledge Base Builders
//!
//! Two ways of producing the food-item knowledge base:
//!
//! - [`build_from_pages`]: classify the pages of an OCR extraction, one
//!   caller-supplied digestive condition for the whole document
//! - [`build_from_docx`]: classify the fixed set of per-condition Word
//!   documents, the condition taken from each file name
//!
//! Both number items before deduplicating, so identifiers keep gaps where
//! duplicates were dropped.

use std::path::Path;

use log::{error, info, warn};

use crate::backend::read_docx_text;
use crate::config::{DEFAULT_CONDITION, MIN_PAGE_TEXT_CHARS};
use crate::dedup::deduplicate;
use crate::errors::PipelineResult;
use crate::extractor::ItemExtractor;
use crate::model::{ExtractionDocument, FoodItem, ItemSource, KnowledgeBase};
use crate::runs::is_marker_text;

/// Provenance recorded on a knowledge base built from the Word documents
pub const DOCX_ORIGIN: &str = "Arquivos .docx do Planeta Intestino (PDF excluído)";

/// The Word documents read by [`build_from_docx`] and the condition each one covers
pub const DOCX_SOURCES: &[(&str, &str)] = &[
    ("Azia e Refluxo.docx", "azia_refluxo"),
    ("Bloqueio Defecatório.docx", "intestino_preso"),
    ("Colite.docx", "colite"),
    ("Dieta Anti-inflamatória.docx", "anti_inflamatoria"),
    ("Disbiose.docx", "disbiose"),
    ("Diverticulite.docx", "diverticulite"),
    ("Divertículos_.docx", "diverticulos_intestinais"),
    ("Gases.docx", "gases_abdome_distendido"),
    ("INTESTINO PRESO.docx", "intestino_preso"),
    ("Intolerancia à Lactose.docx", "intolerancia_lactose"),
    ("Má Digestão.docx", "ma_digestao"),
    ("Prevenção a diarreia.docx", "diarreia"),
    ("sem gluten e lactose.docx", "sem_gluten_lactose"),
    ("Sem Gluten.docx", "sem_gluten"),
    ("SII.docx", "sindrome_intestino_irritavel"),
    ("zJantar casual_romantico.docx", "geral"),
];

/// Condition for a docx file name, `geral` for files outside the table
pub fn condition_for_file(file_name: &str) -> &'static str {
    DOCX_SOURCES
        .iter()
        .find(|(name, _)| *name == file_name)
        .map_or(DEFAULT_CONDITION, |(_, condition)| *condition)
}

/// Build a knowledge base from the pages of an extraction
///
/// Pages with fewer than ten characters of text, and pages holding an error
/// marker instead of content, are skipped. The meal cursor carries over from
/// one page to the next, since a meal section can span a page break. Items are
/// numbered `item_<page>_<n>` where `n` counts the items collected so far.
pub fn build_from_pages(
    doc: &ExtractionDocument,
    condition: &str,
    source_label: &str,
    extractor: &ItemExtractor,
) -> KnowledgeBase {
    if condition == DEFAULT_CONDITION {
        warn!(
            "No digestive condition given for {}; tagging every item as '{}'",
            source_label, DEFAULT_CONDITION
        );
    }

    let mut items: Vec<FoodItem> = Vec::new();
    let mut cursor = extractor.config().default_meal;
    let mut pages_processed = 0usize;

    for page in &doc.pages {
        if page.text.trim().chars().count() < MIN_PAGE_TEXT_CHARS {
            continue;
        }
        if is_marker_text(&page.text) {
            warn!("Skipping page {}: {}", page.number, page.text.trim());
            continue;
        }
        pages_processed += 1;

        let source = ItemSource::page(source_label, page.number);
        let (page_items, next) = extractor.extract_items(&page.text, cursor, condition, &source);
        cursor = next;

        if !page_items.is_empty() {
            info!("Page {}: {} items", page.number, page_items.len());
        }
        for mut item in page_items {
            item.id = format!("item_{}_{}", page.number, items.len());
            items.push(item);
        }
    }

    info!("Total items extracted: {}", items.len());
    let items = deduplicate(items);
    KnowledgeBase::new(items, vec![source_label.to_string()]).with_pages_processed(pages_processed)
}

/// Extract the items of one Word document
fn docx_items(path: &Path, file_name: &str, extractor: &ItemExtractor) -> PipelineResult<Vec<FoodItem>> {
    let text = read_docx_text(path)?;
    let condition = condition_for_file(file_name);
    Ok(extractor.extract_document(&text, condition, &ItemSource::file(file_name)))
}

/// Build a knowledge base from the Word documents listed in [`DOCX_SOURCES`]
///
/// Missing files are skipped with a warning; a file that cannot be read
/// contributes no items. Items are numbered `docx_NNNN` across all files in
/// extraction order.
pub fn build_from_docx(dir: &Path, extractor: &ItemExtractor) -> KnowledgeBase {
    build_from_docx_files(dir, DOCX_SOURCES.iter().map(|(name, _)| *name), extractor)
}

/// Same as [`build_from_docx`] over an explicit list of file names
pub fn build_from_docx_files<'a>(
    dir: &Path,
    files: impl IntoIterator<Item = &'a str>,
    extractor: &ItemExtractor,
) -> KnowledgeBase {
    let mut items: Vec<FoodItem> = Vec::new();
    let mut sources = Vec::new();

    for file_name in files {
        sources.push(file_name.to_string());
        let path = dir.join(file_name);
        if !path.exists() {
            warn!("Not found: {}", path.display());
            continue;
        }

        let file_items = docx_items(&path, file_name, extractor).unwrap_or_else(|e| {
            error!("Failed to process {}: {}", file_name, e);
            Vec::new()
        });
        info!("{}: {} items", file_name, file_items.len());

        for mut item in file_items {
            item.id = format!("docx_{:04}", items.len() + 1);
            items.push(item);
        }
    }

    let items = deduplicate(items);
    KnowledgeBase::new(items, sources).with_origin(DOCX_ORIGIN)
}
