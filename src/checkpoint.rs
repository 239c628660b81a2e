//! # Checkpoint Store
//!
//! Resumable state of a batched OCR run: page number → extracted page. The
//! file has the same shape as every other extraction output (an
//! [`ExtractionDocument`]), so an interrupted run leaves a usable partial
//! result and a finished run can be copied as-is to the final output.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use log::{info, warn};

use crate::errors::PipelineResult;
use crate::model::{ExtractionDocument, ExtractionMetadata, PageRecord};
use crate::output::{read_json, write_json_atomic};

/// Pages extracted so far, keyed and ordered by page number
#[derive(Debug, Clone)]
pub struct Checkpoint {
    path: PathBuf,
    pages: BTreeMap<u32, PageRecord>,
}

impl Checkpoint {
    /// Load the checkpoint at `path`, or start empty if there is none
    ///
    /// An unreadable checkpoint is an error rather than a silent restart, so
    /// hours of OCR are never thrown away by accident.
    pub fn load(path: &Path) -> PipelineResult<Self> {
        let pages = if path.exists() {
            let doc: ExtractionDocument = read_json(path)?;
            let pages: BTreeMap<u32, PageRecord> =
                doc.pages.into_iter().map(|p| (p.number, p)).collect();
            info!(
                "Resuming from checkpoint {} with {} pages",
                path.display(),
                pages.len()
            );
            pages
        } else {
            info!("No checkpoint at {}, starting fresh", path.display());
            BTreeMap::new()
        };

        Ok(Self {
            path: path.to_path_buf(),
            pages,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn contains(&self, page: u32) -> bool {
        self.pages.contains_key(&page)
    }

    pub fn get(&self, page: u32) -> Option<&PageRecord> {
        self.pages.get(&page)
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// Merge a page; a later record for the same page number replaces the earlier one
    pub fn insert(&mut self, page: PageRecord) {
        if self.pages.insert(page.number, page).is_some() {
            warn!("Replaced an existing checkpoint entry");
        }
    }

    /// Snapshot as an extraction document, pages in ascending order
    ///
    /// `total_paginas` is the highest page number present, not the page count
    /// of the source PDF.
    pub fn to_document(&self, mut metadata: ExtractionMetadata) -> ExtractionDocument {
        let pages: Vec<PageRecord> = self.pages.values().cloned().collect();
        metadata.total_chars = pages.iter().map(PageRecord::char_count).sum();
        metadata.pages_processed = Some(pages.len());

        ExtractionDocument {
            total_pages: self.pages.keys().next_back().copied().unwrap_or(0),
            pages,
            metadata,
        }
    }

    /// Persist the checkpoint atomically
    pub fn save(&self, metadata: ExtractionMetadata) -> PipelineResult<()> {
        write_json_atomic(&self.path, &self.to_document(metadata))?;
        info!(
            "Checkpoint saved: {} pages in {}",
            self.pages.len(),
            self.path.display()
        );
        Ok(())
    }
}
