//! # Line Classifier
//!
//! Decides, line by line, whether menu text is a meal header, a candidate
//! item line, or noise. The current meal type is an explicit cursor: each call
//! takes the cursor and returns the cursor for the next line, so a document is
//! classified by folding [`classify_line`] over its lines.
//!
//! The page-level detectors at the bottom ([`meals_in_text`],
//! [`weekdays_in_text`], [`measures_in_text`]) summarise whole pages for the
//! structuring run.

use log::trace;
use serde::{Deserialize, Serialize};

use crate::config::ExtractorConfig;
use crate::model::MealType;
use crate::patterns::{meal_trigger, MEAL_TRIGGERS, MEASURE_PATTERNS, WEEKDAYS};

/// Classification of a single line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineClass<'a> {
    /// Section header switching the current meal
    Header(MealType),
    /// Candidate item line, trimmed
    Item(&'a str),
    /// Blank or too short to carry an item
    Noise,
}

/// Classify one line given the meal cursor; returns the class and the cursor
/// to use for the following line.
///
/// A line is a header when it contains a meal trigger and is shorter than
/// `config.header_max_len` characters, so a long item description that happens
/// to mention a meal word stays an item.
pub fn classify_line<'a>(
    line: &'a str,
    current: MealType,
    config: &ExtractorConfig,
) -> (LineClass<'a>, MealType) {
    let line = line.trim();
    let len = line.chars().count();

    if len < config.min_line_len {
        return (LineClass::Noise, current);
    }

    if len < config.header_max_len {
        if let Some(meal) = meal_trigger(line) {
            trace!("Header '{}' switches meal {} -> {}", line, current, meal);
            return (LineClass::Header(meal), meal);
        }
    }

    (LineClass::Item(line), current)
}

/// Classify every line of `text`, pairing each item line with the meal in effect
pub fn item_lines<'a>(
    text: &'a str,
    start: MealType,
    config: &ExtractorConfig,
) -> (Vec<(&'a str, MealType)>, MealType) {
    let mut current = start;
    let mut items = Vec::new();

    for line in text.lines() {
        let (class, next) = classify_line(line, current, config);
        if let LineClass::Item(item) = class {
            items.push((item, current));
        }
        current = next;
    }

    (items, current)
}

/// Meal labels whose trigger phrases occur anywhere in `text`, in meal order
pub fn meals_in_text(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    MealType::ALL
        .iter()
        .filter(|meal| {
            MEAL_TRIGGERS
                .iter()
                .any(|(trigger, m)| m == *meal && lowered.contains(trigger))
        })
        .map(|meal| meal.label().to_string())
        .collect()
}

/// Day-of-week names mentioned in `text`
pub fn weekdays_in_text(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    WEEKDAYS
        .iter()
        .filter(|day| lowered.contains(*day))
        .map(|day| day.to_string())
        .collect()
}

/// A quantity expression found in page text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Measure {
    /// Numeric literal as written
    #[serde(rename = "valor")]
    pub value: String,
    /// Unit label from the pattern table
    #[serde(rename = "tipo")]
    pub unit: String,
    /// Whole matched text
    #[serde(rename = "texto_completo")]
    pub text: String,
}

/// Every unit-labelled measure in `text`, grouped by pattern table order
pub fn measures_in_text(text: &str) -> Vec<Measure> {
    MEASURE_PATTERNS
        .iter()
        .flat_map(|(pattern, unit)| {
            pattern.captures_iter(text).map(move |caps| Measure {
                value: caps[1].to_string(),
                unit: unit.to_string(),
                text: caps[0].to_string(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> ExtractorConfig {
        ExtractorConfig::default()
    }

    #[test]
    fn test_header_switches_cursor() {
        let (class, next) = classify_line("Almoço", MealType::Breakfast, &config());
        assert_eq!(class, LineClass::Header(MealType::Lunch));
        assert_eq!(next, MealType::Lunch);
    }

    #[test]
    fn test_long_line_with_meal_word_is_item() {
        let line = "Omelete de claras com espinafre e tomate, ideal para servir no jantar de domingo - 150g";
        assert!(line.chars().count() >= 80);
        let (class, next) = classify_line(line, MealType::Lunch, &config());
        assert_eq!(class, LineClass::Item(line));
        assert_eq!(next, MealType::Lunch);
    }

    #[test]
    fn test_short_lines_are_noise() {
        assert_eq!(classify_line("  ", MealType::Lunch, &config()).0, LineClass::Noise);
        assert_eq!(classify_line("- a", MealType::Lunch, &config()).0, LineClass::Noise);
    }

    #[test]
    fn test_cursor_persists_until_next_header() {
        let text = "Café da manhã\nPão integral 50g\nMamão 100g\nJantar\nSopa de legumes 300 ml";
        let (items, last) = item_lines(text, MealType::Lunch, &config());

        assert_eq!(
            items,
            vec![
                ("Pão integral 50g", MealType::Breakfast),
                ("Mamão 100g", MealType::Breakfast),
                ("Sopa de legumes 300 ml", MealType::Dinner),
            ]
        );
        assert_eq!(last, MealType::Dinner);
    }

    #[test]
    fn test_page_detectors() {
        let text = "SEGUNDA-FEIRA\nCafé da manhã\nAlmoço\nLanche da tarde\nArroz 100g\nSuco 200 ml";

        assert_eq!(weekdays_in_text(text), vec!["segunda"]);
        assert_eq!(
            meals_in_text(text),
            vec!["café da manhã", "almoço", "lanche da tarde"]
        );

        let measures = measures_in_text(text);
        assert_eq!(measures.len(), 2);
        assert_eq!(measures[0].value, "100");
        assert_eq!(measures[0].unit, "gramas");
        assert_eq!(measures[1].text, "200 ml");
        assert_eq!(measures[1].unit, "mililitros");
    }
}
