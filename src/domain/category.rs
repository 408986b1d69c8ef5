//! Expense categories and their broader groups.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Expense category. Known categories are closed; anything else is kept
/// verbatim in [`Category::Other`] so adjustments against it still resolve.
///
/// Serialized as its display name so it can key JSON maps. `Other` can only
/// be built through [`Category::parse`], so it never carries a known name
/// and every category serializes to a distinct label.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum Category {
    Rent,
    Groceries,
    Restaurants,
    Tuition,
    Books,
    Utilities,
    MobileRecharge,
    Gas,
    Travel,
    CarInsurance,
    Shopping,
    Miscellaneous,
    Other(CustomCategory),
}

/// Label of a category outside the known set. Constructed only by
/// [`Category::parse`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CustomCategory(String);

impl CustomCategory {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CategoryGroup {
    Housing,
    Food,
    Education,
    Utilities,
    Transportation,
    Personal,
    Other,
}

impl Category {
    /// Parse a category label. Returns `None` for a blank label.
    pub fn parse(label: &str) -> Option<Category> {
        let trimmed = label.trim();
        if trimmed.is_empty() {
            return None;
        }

        let normalized: String = trimmed
            .chars()
            .filter(|c| !matches!(c, ' ' | '_' | '-'))
            .flat_map(|c| c.to_lowercase())
            .collect();

        let category = match normalized.as_str() {
            "rent" => Category::Rent,
            "groceries" | "grocery" => Category::Groceries,
            "restaurants" | "restaurant" | "dining" => Category::Restaurants,
            "tuition" | "tuitionfees" => Category::Tuition,
            "books" => Category::Books,
            "utilities" => Category::Utilities,
            "mobilerecharge" | "mobile" => Category::MobileRecharge,
            "gas" | "fuel" => Category::Gas,
            "travel" | "flight" => Category::Travel,
            "carinsurance" => Category::CarInsurance,
            "shopping" => Category::Shopping,
            "miscellaneous" | "misc" => Category::Miscellaneous,
            _ => Category::Other(CustomCategory(trimmed.to_string())),
        };
        Some(category)
    }

    pub fn name(&self) -> &str {
        match self {
            Category::Rent => "Rent",
            Category::Groceries => "Groceries",
            Category::Restaurants => "Restaurants",
            Category::Tuition => "Tuition",
            Category::Books => "Books",
            Category::Utilities => "Utilities",
            Category::MobileRecharge => "Mobile Recharge",
            Category::Gas => "Gas",
            Category::Travel => "Travel",
            Category::CarInsurance => "Car Insurance",
            Category::Shopping => "Shopping",
            Category::Miscellaneous => "Miscellaneous",
            Category::Other(custom) => custom.as_str(),
        }
    }

    pub fn group(&self) -> CategoryGroup {
        match self {
            Category::Rent => CategoryGroup::Housing,
            Category::Groceries | Category::Restaurants => CategoryGroup::Food,
            Category::Tuition | Category::Books => CategoryGroup::Education,
            Category::Utilities | Category::MobileRecharge => CategoryGroup::Utilities,
            Category::Gas | Category::Travel | Category::CarInsurance => {
                CategoryGroup::Transportation
            }
            Category::Shopping => CategoryGroup::Personal,
            Category::Miscellaneous | Category::Other(_) => CategoryGroup::Other,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, Category::Other(_))
    }
}

impl From<Category> for String {
    fn from(category: Category) -> String {
        category.name().to_string()
    }
}

impl TryFrom<String> for Category {
    type Error = String;

    fn try_from(label: String) -> Result<Self, Self::Error> {
        Category::parse(&label).ok_or_else(|| "empty category label".to_string())
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
