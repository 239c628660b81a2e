//! Per-page structural summary of an extraction: which meals, weekdays and
//! measures each page mentions, plus document-wide counts.

use log::info;
use serde::{Deserialize, Serialize};

use crate::classifier::{meals_in_text, measures_in_text, weekdays_in_text, Measure};
use crate::model::{ExtractionDocument, PageRecord};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructuredPage {
    #[serde(rename = "numero_pagina")]
    pub number: u32,
    #[serde(rename = "texto_bruto")]
    pub raw_text: String,
    #[serde(rename = "refeicoes_encontradas")]
    pub meals: Vec<String>,
    #[serde(rename = "dias_encontrados")]
    pub weekdays: Vec<String>,
    #[serde(rename = "medidas_encontradas")]
    pub measures: Vec<Measure>,
    #[serde(rename = "tem_tabelas")]
    pub has_tables: bool,
    #[serde(rename = "num_tabelas")]
    pub table_count: usize,
    #[serde(rename = "tem_imagem")]
    pub has_image: bool,
}

impl From<&PageRecord> for StructuredPage {
    fn from(page: &PageRecord) -> Self {
        Self {
            number: page.number,
            raw_text: page.text.clone(),
            meals: meals_in_text(&page.text),
            weekdays: weekdays_in_text(&page.text),
            measures: measures_in_text(&page.text),
            has_tables: !page.tables.is_empty(),
            table_count: page.tables.len(),
            has_image: page.has_image,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructuredMetadata {
    #[serde(rename = "total_paginas")]
    pub total_pages: u32,
    #[serde(rename = "total_caracteres")]
    pub total_chars: usize,
    #[serde(rename = "data_extracao")]
    pub extracted_at: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    #[serde(rename = "paginas_com_refeicoes")]
    pub pages_with_meals: usize,
    #[serde(rename = "paginas_com_dias")]
    pub pages_with_weekdays: usize,
    #[serde(rename = "paginas_com_tabelas")]
    pub pages_with_tables: usize,
    #[serde(rename = "total_medidas")]
    pub total_measures: usize,
}

/// Structured view of a whole extraction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructuredDocument {
    #[serde(rename = "metadados")]
    pub metadata: StructuredMetadata,
    #[serde(rename = "paginas")]
    pub pages: Vec<StructuredPage>,
    #[serde(rename = "resumo")]
    pub summary: Summary,
}

/// Summarise every page of an extraction
pub fn structure_document(doc: &ExtractionDocument) -> StructuredDocument {
    info!("Structuring {} pages", doc.pages.len());
    let pages: Vec<StructuredPage> = doc.pages.iter().map(StructuredPage::from).collect();

    let summary = Summary {
        pages_with_meals: pages.iter().filter(|p| !p.meals.is_empty()).count(),
        pages_with_weekdays: pages.iter().filter(|p| !p.weekdays.is_empty()).count(),
        pages_with_tables: pages.iter().filter(|p| p.has_tables).count(),
        total_measures: pages.iter().map(|p| p.measures.len()).sum(),
    };

    StructuredDocument {
        metadata: StructuredMetadata {
            total_pages: doc.total_pages,
            total_chars: doc.metadata.total_chars,
            extracted_at: doc.metadata.extracted_at.clone().unwrap_or_default(),
        },
        pages,
        summary,
    }
}
