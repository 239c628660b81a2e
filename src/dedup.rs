//! Order-preserving deduplication of extracted food items.

use std::collections::HashSet;

use log::debug;

use crate::model::{FoodItem, MealType};

/// Identity of a food item: lowercased name, raw quantity, meal and condition
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ItemKey {
    pub name: String,
    pub quantity: String,
    pub meal_type: MealType,
    pub condition: String,
}

impl From<&FoodItem> for ItemKey {
    fn from(item: &FoodItem) -> Self {
        Self {
            name: item.name.to_lowercase(),
            quantity: item.quantity.clone(),
            meal_type: item.meal_type,
            condition: item.condition.clone(),
        }
    }
}

/// Keep the first item of every [`ItemKey`], preserving input order.
///
/// Only exact key equality counts: names differing in accents or spacing are
/// distinct items.
pub fn deduplicate(items: Vec<FoodItem>) -> Vec<FoodItem> {
    let before = items.len();
    let mut seen = HashSet::new();
    let unique: Vec<FoodItem> = items
        .into_iter()
        .filter(|item| seen.insert(ItemKey::from(item)))
        .collect();

    debug!("Deduplicated {} items down to {}", before, unique.len());
    unique
}
