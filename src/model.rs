//! # Data Model
//!
//! Records produced by the extraction runs and consumed by the downstream
//! diet-planning system. JSON field names are the ones that system reads, so
//! most fields carry a serde rename.
//!
//! - **PageRecord**: one page of a source PDF as extracted
//! - **ExtractionDocument**: every extraction output, and the checkpoint file
//! - **FoodItem**: a classified name + quantity pair
//! - **KnowledgeBase**: deduplicated food items plus provenance

use serde::{Deserialize, Serialize};
use std::fmt;

/// A table as a grid of cells, row-major
pub type Table = Vec<Vec<String>>;

/// Meal a food item belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MealType {
    #[serde(rename = "cafe_manha")]
    Breakfast,
    #[serde(rename = "lanche_manha")]
    MorningSnack,
    #[serde(rename = "almoco")]
    Lunch,
    #[serde(rename = "lanche_tarde")]
    AfternoonSnack,
    #[serde(rename = "jantar")]
    Dinner,
    #[serde(rename = "ceia")]
    Supper,
}

impl MealType {
    pub const ALL: [MealType; 6] = [
        MealType::Breakfast,
        MealType::MorningSnack,
        MealType::Lunch,
        MealType::AfternoonSnack,
        MealType::Dinner,
        MealType::Supper,
    ];

    /// Token used in JSON output
    pub fn as_token(&self) -> &'static str {
        match self {
            MealType::Breakfast => "cafe_manha",
            MealType::MorningSnack => "lanche_manha",
            MealType::Lunch => "almoco",
            MealType::AfternoonSnack => "lanche_tarde",
            MealType::Dinner => "jantar",
            MealType::Supper => "ceia",
        }
    }

    /// Human label as it appears in menus
    pub fn label(&self) -> &'static str {
        match self {
            MealType::Breakfast => "café da manhã",
            MealType::MorningSnack => "lanche da manhã",
            MealType::Lunch => "almoço",
            MealType::AfternoonSnack => "lanche da tarde",
            MealType::Dinner => "jantar",
            MealType::Supper => "ceia",
        }
    }
}

impl fmt::Display for MealType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_token())
    }
}

/// Where a food item was read from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemSource {
    /// Originating file name
    #[serde(rename = "fonte")]
    pub file: String,
    /// Page within the file, for paginated sources
    #[serde(rename = "pagina_origem", skip_serializing_if = "Option::is_none", default)]
    pub page: Option<u32>,
}

impl ItemSource {
    pub fn file(file: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            page: None,
        }
    }

    pub fn page(file: impl Into<String>, page: u32) -> Self {
        Self {
            file: file.into(),
            page: Some(page),
        }
    }
}

/// A food item recognised in menu text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoodItem {
    /// Sequence-assigned identifier; empty until the builder numbers the item
    #[serde(default)]
    pub id: String,
    #[serde(rename = "nome")]
    pub name: String,
    /// Raw matched quantity text, e.g. "150g" or "2 colheres"
    #[serde(rename = "quantidade")]
    pub quantity: String,
    #[serde(rename = "tipo")]
    pub meal_type: MealType,
    #[serde(rename = "condicao_digestiva")]
    pub condition: String,
    #[serde(flatten)]
    pub source: ItemSource,
}

impl fmt::Display for FoodItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} — {} ({}, {})",
            self.name, self.quantity, self.meal_type, self.condition
        )
    }
}

/// Deduplicated food items with the list of files they came from
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KnowledgeBase {
    #[serde(rename = "itens")]
    pub items: Vec<FoodItem>,
    #[serde(rename = "total_itens")]
    pub total_items: usize,
    #[serde(rename = "fontes", default)]
    pub sources: Vec<String>,
    #[serde(rename = "origem", skip_serializing_if = "Option::is_none", default)]
    pub origin: Option<String>,
    #[serde(
        rename = "total_paginas_processadas",
        skip_serializing_if = "Option::is_none",
        default
    )]
    pub pages_processed: Option<usize>,
}

impl KnowledgeBase {
    pub fn new(items: Vec<FoodItem>, sources: Vec<String>) -> Self {
        Self {
            total_items: items.len(),
            items,
            sources,
            origin: None,
            pages_processed: None,
        }
    }

    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = Some(origin.into());
        self
    }

    pub fn with_pages_processed(mut self, pages: usize) -> Self {
        self.pages_processed = Some(pages);
        self
    }
}

/// One page of a source PDF after extraction
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PageRecord {
    #[serde(rename = "numero")]
    pub number: u32,
    #[serde(rename = "texto_completo", default)]
    pub text: String,
    #[serde(rename = "tabelas", default, skip_serializing_if = "Vec::is_empty")]
    pub tables: Vec<Table>,
    #[serde(rename = "tem_imagem", default)]
    pub has_image: bool,
    #[serde(rename = "ocr_aplicado", default)]
    pub ocr_applied: bool,
    #[serde(rename = "ocr_necessario", default)]
    pub ocr_needed: bool,
    #[serde(rename = "erro", default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PageRecord {
    pub fn new(number: u32, text: impl Into<String>) -> Self {
        Self {
            number,
            text: text.into(),
            ..Default::default()
        }
    }

    /// Whether the page carries more than `min_chars` of non-blank text
    pub fn has_text(&self, min_chars: usize) -> bool {
        self.text.trim().chars().count() > min_chars
    }

    pub fn char_count(&self) -> usize {
        self.text.chars().count()
    }
}

/// Run-level metadata attached to an extraction output
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ExtractionMetadata {
    #[serde(rename = "metodo", default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    #[serde(rename = "idioma", default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(rename = "resolucao", default, skip_serializing_if = "Option::is_none")]
    pub resolution: Option<u32>,
    #[serde(rename = "ocr_utilizado", default, skip_serializing_if = "Option::is_none")]
    pub ocr_used: Option<bool>,
    #[serde(rename = "total_caracteres", default)]
    pub total_chars: usize,
    #[serde(rename = "paginas_com_texto", default, skip_serializing_if = "Option::is_none")]
    pub pages_with_text: Option<usize>,
    #[serde(
        rename = "paginas_processadas",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub pages_processed: Option<usize>,
    #[serde(rename = "data_extracao", default, skip_serializing_if = "Option::is_none")]
    pub extracted_at: Option<String>,
}

/// Pages extracted from one PDF
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ExtractionDocument {
    #[serde(rename = "total_paginas", default)]
    pub total_pages: u32,
    #[serde(rename = "paginas", default)]
    pub pages: Vec<PageRecord>,
    #[serde(rename = "metadados", default)]
    pub metadata: ExtractionMetadata,
}

impl ExtractionDocument {
    pub fn total_chars(&self) -> usize {
        self.pages.iter().map(PageRecord::char_count).sum()
    }

    pub fn total_tables(&self) -> usize {
        self.pages.iter().map(|p| p.tables.len()).sum()
    }

    pub fn pages_with_text(&self, min_chars: usize) -> usize {
        self.pages.iter().filter(|p| p.has_text(min_chars)).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_food_item_json_field_names() {
        let item = FoodItem {
            id: "docx_0001".into(),
            name: "Arroz".into(),
            quantity: "100g".into(),
            meal_type: MealType::Lunch,
            condition: "geral".into(),
            source: ItemSource::file("x.docx"),
        };

        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["id"], "docx_0001");
        assert_eq!(json["nome"], "Arroz");
        assert_eq!(json["quantidade"], "100g");
        assert_eq!(json["tipo"], "almoco");
        assert_eq!(json["condicao_digestiva"], "geral");
        assert_eq!(json["fonte"], "x.docx");
        assert!(json.get("pagina_origem").is_none());
    }

    #[test]
    fn test_page_record_reads_minimal_checkpoint_entry() {
        let json = r#"{"numero": 5, "texto_completo": "Almoço", "ocr_aplicado": true}"#;
        let page: PageRecord = serde_json::from_str(json).unwrap();

        assert_eq!(page.number, 5);
        assert_eq!(page.text, "Almoço");
        assert!(page.ocr_applied);
        assert!(page.tables.is_empty());
        assert!(page.error.is_none());
    }

    #[test]
    fn test_meal_tokens() {
        let tokens: Vec<&str> = MealType::ALL.iter().map(MealType::as_token).collect();
        assert_eq!(
            tokens,
            vec!["cafe_manha", "lanche_manha", "almoco", "lanche_tarde", "jantar", "ceia"]
        );
        assert_eq!(MealType::Supper.label(), "ceia");
    }

    #[test]
    fn test_page_has_text_threshold() {
        assert!(!PageRecord::new(1, "   short   ").has_text(10));
        assert!(PageRecord::new(1, "Arroz integral 100g").has_text(10));
    }
}
