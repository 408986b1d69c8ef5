//! Financial profile model: expense records and the immutable profile built from them.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use super::category::Category;

/// A calendar month used for monthly bucketing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct YearMonth {
    pub year: i32,
    pub month: u32,
}

impl YearMonth {
    pub fn of(date: NaiveDate) -> Self {
        YearMonth {
            year: date.year(),
            month: date.month(),
        }
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpenseRecord {
    pub category: Category,
    pub amount: f64,
    pub date: NaiveDate,
    pub recurring: bool,
}

impl ExpenseRecord {
    pub fn new(category: Category, amount: f64, date: NaiveDate, recurring: bool) -> Self {
        ExpenseRecord {
            category,
            amount,
            date,
            recurring,
        }
    }

    pub fn month(&self) -> YearMonth {
        YearMonth::of(self.date)
    }
}

/// Baseline financial state. Never mutated: scenarios derive new profiles.
///
/// Invariants (enforced by [`crate::domain::ingest`]): income and every
/// expense amount are finite and non-negative, and all records share
/// `currency`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinancialProfile {
    pub monthly_income: f64,
    pub expenses: Vec<ExpenseRecord>,
    pub savings_balance: f64,
    pub currency: String,
}

impl FinancialProfile {
    pub fn has_category(&self, category: &Category) -> bool {
        self.expenses.iter().any(|e| &e.category == category)
    }

    /// Distinct months covered by the expense records.
    pub fn months(&self) -> BTreeSet<YearMonth> {
        self.expenses.iter().map(ExpenseRecord::month).collect()
    }

    pub fn total_expenses(&self) -> f64 {
        self.expenses.iter().map(|e| e.amount).sum()
    }

    /// Records grouped by category, each group in dataset order.
    pub fn by_category(&self) -> BTreeMap<&Category, Vec<(usize, &ExpenseRecord)>> {
        let mut groups: BTreeMap<&Category, Vec<(usize, &ExpenseRecord)>> = BTreeMap::new();
        for (index, record) in self.expenses.iter().enumerate() {
            groups.entry(&record.category).or_default().push((index, record));
        }
        groups
    }
}
