//! # Item Extractor Module
//!
//! This module turns classified item lines into [`FoodItem`] records by
//! locating a quantity expression and treating the text before it as the
//! item name.
//!
//! ## Features
//!
//! - Ordered quantity patterns: inline "200g frango" first, then a trailing
//!   "Frango grelhado - 150g"
//! - Name cleanup: leading bullets, digits and punctuation stripped, trailing
//!   separators dropped, internal whitespace collapsed
//! - Length bounds on names to reject prose fragments
//! - Whole-text extraction threading the meal cursor across lines
//!
//! The extractor is a best-effort heuristic: it misses items written without a
//! unit and accepts prose that happens to contain a quantity.

use log::{debug, info, trace};

use crate::classifier::item_lines;
use crate::config::ExtractorConfig;
use crate::model::{FoodItem, ItemSource, MealType};
use crate::patterns::{INLINE_QUANTITY, NAME_PREFIX, NAME_SUFFIX, TRAILING_QUANTITY};

/// A quantity expression located in a line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuantityMatch<'a> {
    /// The matched quantity text (e.g. "150g", "300 ml")
    pub text: &'a str,
    /// Byte offset where the name part ends
    pub name_end: usize,
}

/// Food item extractor using the quantity pattern tables
#[derive(Debug, Clone, Default)]
pub struct ItemExtractor {
    config: ExtractorConfig,
}

impl ItemExtractor {
    /// Create an extractor with the default thresholds
    ///
    /// # Examples
    ///
    /// ```rust
    /// use cardapio_kb::extractor::ItemExtractor;
    /// use cardapio_kb::model::{ItemSource, MealType};
    ///
    /// let extractor = ItemExtractor::new();
    /// let item = extractor
    ///     .extract_item("Frango grelhado - 150g", MealType::Lunch, "geral", &ItemSource::file("x.docx"))
    ///     .unwrap();
    ///
    /// assert_eq!(item.name, "Frango grelhado");
    /// assert_eq!(item.quantity, "150g");
    /// ```
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: ExtractorConfig) -> Self {
        debug!(
            "Creating ItemExtractor: name length [{}, {}), header below {} chars",
            config.min_name_len, config.max_name_len, config.header_max_len
        );
        Self { config }
    }

    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    /// Locate the quantity in a line, inline pattern first, trailing pattern second
    pub fn find_quantity<'a>(&self, line: &'a str) -> Option<QuantityMatch<'a>> {
        if let Some(m) = INLINE_QUANTITY.find(line) {
            return Some(QuantityMatch {
                text: m.as_str().trim(),
                name_end: m.start(),
            });
        }

        TRAILING_QUANTITY.captures(line).and_then(|caps| {
            let whole = caps.get(0)?;
            let quantity = caps.get(1)?;
            Some(QuantityMatch {
                text: quantity.as_str().trim(),
                name_end: whole.start(),
            })
        })
    }

    /// Check if a line carries a quantity expression
    pub fn has_quantity(&self, line: &str) -> bool {
        self.find_quantity(line).is_some()
    }

    /// Clean the raw text found before a quantity into an item name
    ///
    /// Strips leading bullets, digits and punctuation, drops trailing
    /// separators such as " - " or "(", and collapses internal whitespace.
    pub fn clean_name(&self, raw: &str) -> String {
        let stripped = NAME_PREFIX.replace(raw, "");
        let stripped = NAME_SUFFIX.replace(&stripped, "");
        stripped.split_whitespace().collect::<Vec<&str>>().join(" ")
    }

    /// Extract a food item from one item line
    ///
    /// Returns `None` when no quantity pattern matches, when the quantity is
    /// empty, or when the cleaned name falls outside the configured length
    /// bounds.
    pub fn extract_item(
        &self,
        line: &str,
        meal: MealType,
        condition: &str,
        source: &ItemSource,
    ) -> Option<FoodItem> {
        let line = line.trim();
        let quantity = self.find_quantity(line)?;
        if quantity.text.is_empty() {
            return None;
        }

        let name = self.clean_name(&line[..quantity.name_end]);
        let name_len = name.chars().count();
        if name_len < self.config.min_name_len || name_len >= self.config.max_name_len {
            trace!("Rejected name '{}' ({} chars) in line '{}'", name, name_len, line);
            return None;
        }

        trace!("Extracted '{}' / '{}' as {} from '{}'", name, quantity.text, meal, line);

        Some(FoodItem {
            id: String::new(),
            name,
            quantity: quantity.text.to_string(),
            meal_type: meal,
            condition: condition.to_string(),
            source: source.clone(),
        })
    }

    /// Extract every food item in `text`, starting from the meal cursor `start`
    ///
    /// Returns the items in line order together with the cursor left by the
    /// last header, so callers can carry it into the next chunk of the same
    /// document.
    pub fn extract_items(
        &self,
        text: &str,
        start: MealType,
        condition: &str,
        source: &ItemSource,
    ) -> (Vec<FoodItem>, MealType) {
        let (lines, last) = item_lines(text, start, &self.config);

        let items: Vec<FoodItem> = lines
            .into_iter()
            .filter_map(|(line, meal)| self.extract_item(line, meal, condition, source))
            .collect();

        info!(
            "Extracted {} items from {} ({} lines)",
            items.len(),
            source.file,
            text.lines().count()
        );
        (items, last)
    }

    /// Extract every food item of a standalone document, cursor starting at the default meal
    pub fn extract_document(&self, text: &str, condition: &str, source: &ItemSource) -> Vec<FoodItem> {
        self.extract_items(text, self.config.default_meal, condition, source)
            .0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extractor() -> ItemExtractor {
        ItemExtractor::new()
    }

    fn source() -> ItemSource {
        ItemSource::file("x.docx")
    }

    #[test]
    fn test_trailing_dash_quantity() {
        let item = extractor()
            .extract_item("Frango grelhado - 150g", MealType::Dinner, "geral", &source())
            .unwrap();

        assert_eq!(item.name, "Frango grelhado");
        assert_eq!(item.quantity, "150g");
        assert_eq!(item.meal_type, MealType::Dinner);
        assert_eq!(item.condition, "geral");
        assert_eq!(item.source.file, "x.docx");
    }

    #[test]
    fn test_trailing_quantity_when_inline_pattern_misses() {
        // "gs" is not a unit on its own, only the trailing pattern's plural accepts it
        let line = "Queijo minas - 30 gs";
        assert!(INLINE_QUANTITY.find(line).is_none());

        let item = extractor()
            .extract_item(line, MealType::Breakfast, "geral", &source())
            .unwrap();
        assert_eq!(item.name, "Queijo minas");
        assert_eq!(item.quantity, "30 gs");
    }

    #[test]
    fn test_inline_quantity_with_space() {
        let item = extractor()
            .extract_item("Sopa de legumes 300 ml", MealType::Lunch, "geral", &source())
            .unwrap();

        assert_eq!(item.name, "Sopa de legumes");
        assert_eq!(item.quantity, "300 ml");
    }

    #[test]
    fn test_leading_bullets_and_digits_stripped() {
        let item = extractor()
            .extract_item("• 1. Arroz   integral 100g", MealType::Lunch, "geral", &source())
            .unwrap();
        assert_eq!(item.name, "Arroz integral");
        assert_eq!(item.quantity, "100g");

        let item = extractor()
            .extract_item("- Azeite 1 colher de sopa", MealType::Lunch, "geral", &source())
            .unwrap();
        assert_eq!(item.name, "Azeite");
        assert_eq!(item.quantity, "1 colher de sopa");
    }

    #[test]
    fn test_no_quantity_no_item() {
        assert!(extractor()
            .extract_item("Frango grelhado com ervas", MealType::Lunch, "geral", &source())
            .is_none());
        assert!(!extractor().has_quantity("Sal a gosto"));
    }

    #[test]
    fn test_name_length_bounds() {
        // name "Ov" is too short
        assert!(extractor()
            .extract_item("Ov 50g", MealType::Lunch, "geral", &source())
            .is_none());
        // quantity at the start leaves no name at all
        assert!(extractor()
            .extract_item("200g frango", MealType::Lunch, "geral", &source())
            .is_none());

        let long_name = "a".repeat(100);
        assert!(extractor()
            .extract_item(&format!("{long_name} 10g"), MealType::Lunch, "geral", &source())
            .is_none());
        let ok_name = "a".repeat(99);
        assert!(extractor()
            .extract_item(&format!("{ok_name} 10g"), MealType::Lunch, "geral", &source())
            .is_some());
    }

    #[test]
    fn test_decimal_quantities() {
        let item = extractor()
            .extract_item("Batata doce 1,5 kg", MealType::Lunch, "geral", &source())
            .unwrap();
        assert_eq!(item.quantity, "1,5 kg");

        let item = extractor()
            .extract_item("Leite 0.5 l", MealType::Lunch, "geral", &source())
            .unwrap();
        assert_eq!(item.name, "Leite");
        assert_eq!(item.quantity, "0.5 l");
    }

    #[test]
    fn test_extract_items_threads_meal_cursor() {
        let text = "Café da manhã\nPão integral 50g\n\nAlmoço\nArroz 100g\nFeijão 80g\nObservação: beber água";
        let (items, last) = extractor().extract_items(text, MealType::Lunch, "geral", &source());

        assert_eq!(items.len(), 3);
        assert_eq!(items[0].name, "Pão integral");
        assert_eq!(items[0].meal_type, MealType::Breakfast);
        assert_eq!(items[1].meal_type, MealType::Lunch);
        assert_eq!(items[2].name, "Feijão");
        assert_eq!(last, MealType::Lunch);
    }

    #[test]
    fn test_extract_document_defaults_to_lunch() {
        let items = extractor().extract_document("Salada verde 80g", "colite", &source());
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].meal_type, MealType::Lunch);
        assert_eq!(items[0].condition, "colite");
    }
}
