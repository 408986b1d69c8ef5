//! Per-month and per-category rollups of a profile.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::category::{Category, CategoryGroup};
use super::profile::{FinancialProfile, YearMonth};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthSummary {
    pub month: YearMonth,
    pub expenses: f64,
    pub income: f64,
    pub net: f64,
    pub cumulative_net: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryTotal {
    pub category: Category,
    pub group: CategoryGroup,
    pub total: f64,
    pub count: usize,
    /// Share of all expenses in percent; 0 for an empty profile.
    pub share_pct: f64,
}

/// One row per month the dataset spans, oldest first. Income is the
/// profile's monthly income credited to every month.
pub fn monthly_summary(profile: &FinancialProfile) -> Vec<MonthSummary> {
    let mut totals: BTreeMap<YearMonth, f64> = BTreeMap::new();
    for record in &profile.expenses {
        *totals.entry(record.month()).or_insert(0.0) += record.amount;
    }

    let mut running = 0.0;
    totals
        .into_iter()
        .map(|(month, expenses)| {
            let net = profile.monthly_income - expenses;
            running += net;
            MonthSummary {
                month,
                expenses,
                income: profile.monthly_income,
                net,
                cumulative_net: running,
            }
        })
        .collect()
}

/// Totals per category, largest first; equal totals order by name.
pub fn category_breakdown(profile: &FinancialProfile) -> Vec<CategoryTotal> {
    let grand_total = profile.total_expenses();
    let mut rows: Vec<CategoryTotal> = profile
        .by_category()
        .into_iter()
        .map(|(category, records)| {
            let total: f64 = records.iter().map(|(_, r)| r.amount).sum();
            CategoryTotal {
                category: category.clone(),
                group: category.group(),
                total,
                count: records.len(),
                share_pct: if grand_total > 0.0 {
                    total / grand_total * 100.0
                } else {
                    0.0
                },
            }
        })
        .collect();

    rows.sort_by(|a, b| {
        b.total
            .total_cmp(&a.total)
            .then_with(|| a.category.name().cmp(b.category.name()))
    });
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::profile::ExpenseRecord;
    use approx::assert_relative_eq;
    use chrono::NaiveDate;

    fn record(category: Category, amount: f64, month: u32, day: u32) -> ExpenseRecord {
        ExpenseRecord::new(
            category,
            amount,
            NaiveDate::from_ymd_opt(2024, month, day).unwrap(),
            true,
        )
    }

    fn sample() -> FinancialProfile {
        FinancialProfile {
            monthly_income: 2000.0,
            expenses: vec![
                record(Category::Rent, 1200.0, 2, 1),
                record(Category::Groceries, 150.0, 1, 3),
                record(Category::Rent, 1200.0, 1, 1),
                record(Category::Groceries, 250.0, 1, 20),
                record(Category::Books, 400.0, 2, 9),
            ],
            savings_balance: 0.0,
            currency: "USD".into(),
        }
    }

    #[test]
    fn months_are_chronological_with_running_net() {
        let rows = monthly_summary(&sample());
        assert_eq!(rows.len(), 2);

        assert_eq!(rows[0].month, YearMonth { year: 2024, month: 1 });
        assert_relative_eq!(rows[0].expenses, 1600.0);
        assert_relative_eq!(rows[0].net, 400.0);
        assert_relative_eq!(rows[0].cumulative_net, 400.0);

        assert_relative_eq!(rows[1].expenses, 1600.0);
        assert_relative_eq!(rows[1].cumulative_net, 800.0);
    }

    #[test]
    fn empty_profile_has_no_months() {
        let mut profile = sample();
        profile.expenses.clear();
        assert!(monthly_summary(&profile).is_empty());
        assert!(category_breakdown(&profile).is_empty());
    }

    #[test]
    fn breakdown_sorted_by_total_then_name() {
        let rows = category_breakdown(&sample());
        let names: Vec<&str> = rows.iter().map(|r| r.category.name()).collect();
        // Books and Groceries both total 400
        assert_eq!(names, vec!["Rent", "Books", "Groceries"]);
        assert_eq!(rows[0].count, 2);
        assert_eq!(rows[0].group, CategoryGroup::Housing);
        assert_relative_eq!(rows[0].share_pct, 2400.0 / 3200.0 * 100.0);
    }
}
