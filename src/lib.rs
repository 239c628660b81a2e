//! # Cardapio KB
//!
//! Offline extraction of a food-item knowledge base from diet menus: a
//! scanned menu PDF (text layer, tables, OCR) and a set of per-condition Word
//! documents. Lines are classified into meal headers and item lines, items
//! are split into name and quantity, deduplicated, and written as JSON for
//! the diet-planning application.

pub mod backend;
pub mod checkpoint;
pub mod classifier;
pub mod config;
pub mod dedup;
pub mod errors;
pub mod extractor;
pub mod knowledge_base;
pub mod model;
pub mod output;
pub mod patterns;
pub mod runs;
pub mod structure;
