//! # Pattern Tables Module
//!
//! This module contains the static tables and regex patterns used to classify
//! menu text: meal-type trigger phrases, day-of-week names, and quantity
//! expressions (a number followed by a unit token).

use lazy_static::lazy_static;
use regex::Regex;

use crate::model::MealType;

/// Meal trigger phrases, most specific first. Matching is done on lowercased
/// text and the first hit wins, so "lanche da manhã" is checked before
/// "café da manhã".
pub const MEAL_TRIGGERS: &[(&str, MealType)] = &[
    ("lanche da manhã", MealType::MorningSnack),
    ("lanche da manha", MealType::MorningSnack),
    ("colação", MealType::MorningSnack),
    ("café da manhã", MealType::Breakfast),
    ("cafe da manha", MealType::Breakfast),
    ("café da manhá", MealType::Breakfast),
    ("desjejum", MealType::Breakfast),
    ("almoço", MealType::Lunch),
    ("almoco", MealType::Lunch),
    ("lanche da tarde", MealType::AfternoonSnack),
    ("merenda", MealType::AfternoonSnack),
    ("jantar", MealType::Dinner),
    ("ceia", MealType::Supper),
];

/// Single-word triggers, only consulted for headers once no phrase matched
pub const LOOSE_MEAL_TRIGGERS: &[(&str, MealType)] = &[
    ("manhã", MealType::Breakfast),
    ("lanche", MealType::AfternoonSnack),
    ("tarde", MealType::AfternoonSnack),
];

/// Day-of-week names as they appear in menus
pub const WEEKDAYS: &[&str] = &[
    "segunda", "terça", "quarta", "quinta", "sexta", "sábado", "domingo",
];

/// Unit tokens accepted after a number, longest alternatives first so that
/// "colher de sopa" is not cut short at "colher"
const UNIT_ALTERNATION: &str = "colheres de sopa|colheres de chá|colher de sopa|colher de chá|\
colheres|colher|xícaras|xícara|fatias|fatia|unidades|unidade|pratos|prato|porções|porção|\
gramas|copos|copo|kg|ml|g|l";

// Numeric literal: integer or comma/dot decimal
const NUMBER: &str = r"\d+(?:[.,]\d+)?";

lazy_static! {
    /// Quantity-then-unit anywhere in a line, e.g. "200g frango" or "Sopa 300 ml"
    pub static ref INLINE_QUANTITY: Regex = Regex::new(&format!(
        r"(?i)({NUMBER})\s*({UNIT_ALTERNATION})\b"
    ))
    .expect("Inline quantity pattern should be valid");

    /// "Name - quantity" at the end of a line, e.g. "Frango grelhado – 150g"
    pub static ref TRAILING_QUANTITY: Regex = Regex::new(&format!(
        r"(?i)[-–—]\s*({NUMBER}\s*(?:{UNIT_ALTERNATION})s?)\s*$"
    ))
    .expect("Trailing quantity pattern should be valid");

    /// Unit-labelled measure patterns used when summarising a page
    pub static ref MEASURE_PATTERNS: Vec<(Regex, &'static str)> = vec![
        (measure(r"g\b"), "gramas"),
        (measure(r"ml\b"), "mililitros"),
        (measure(r"kg\b"), "quilogramas"),
        (measure(r"colher(?:es)?\s*(?:de\s*)?(?:sopa|chá)"), "colher"),
        (measure(r"xícara(?:s)?"), "xícara"),
        (measure(r"unidade(?:s)?"), "unidade"),
        (measure(r"porç(?:ão|ões)"), "porção"),
    ];

    /// Leading bullets, digits and punctuation before an item name
    pub static ref NAME_PREFIX: Regex =
        Regex::new(r"^[\s\-–—•*·.,;:)\]\d]+").expect("Name prefix pattern should be valid");

    /// Trailing separators left between an item name and its quantity
    pub static ref NAME_SUFFIX: Regex =
        Regex::new(r"[\s\-–—•*·,;:(\[]+$").expect("Name suffix pattern should be valid");
}

fn measure(unit: &str) -> Regex {
    Regex::new(&format!(r"(?i)({NUMBER})\s*{unit}")).expect("Measure pattern should be valid")
}

/// First meal type whose trigger occurs in `text` (case-insensitive)
pub fn meal_trigger(text: &str) -> Option<MealType> {
    let lowered = text.to_lowercase();
    MEAL_TRIGGERS
        .iter()
        .chain(LOOSE_MEAL_TRIGGERS)
        .find(|(trigger, _)| lowered.contains(trigger))
        .map(|(_, meal)| *meal)
}
