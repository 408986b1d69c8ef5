//! Derived financial metrics.
//!
//! All functions here are pure: identical inputs give bit-identical outputs,
//! which is what makes scenario results safe to memoize.

use super::profile::{FinancialProfile, YearMonth};
use std::collections::{BTreeMap, BTreeSet};

/// Sentinel for "never" (runway with a non-negative balance, break-even
/// with no positive balance).
pub const UNBOUNDED: f64 = f64::INFINITY;

pub type MetricMap = BTreeMap<String, f64>;

#[derive(Debug, Clone, PartialEq)]
pub struct Metrics {
    pub monthly_income: f64,
    pub monthly_expenses: f64,
    pub recurring_expenses: f64,
    pub one_time_costs: f64,
    pub net_monthly_balance: f64,
    pub savings_rate: f64,
    pub runway_months: f64,
    pub break_even_month: f64,
    pub horizon_months: u32,
    pub cumulative_net: f64,
    pub cumulative_cost: f64,
    pub projected_savings: f64,
}

impl Metrics {
    pub fn compute(profile: &FinancialProfile, horizon_months: u32) -> Self {
        let (recurring_expenses, one_time_costs, one_time_monthly) = monthly_burden(profile);
        let monthly_expenses = recurring_expenses + one_time_monthly;
        let monthly_income = profile.monthly_income;
        let net_monthly_balance = monthly_income - monthly_expenses;

        // Defined as 0 for zero income rather than dividing by zero.
        let savings_rate = if monthly_income > 0.0 {
            net_monthly_balance / monthly_income
        } else {
            0.0
        };

        let burn_rate = (-net_monthly_balance).max(0.0);
        let runway_months = if burn_rate > 0.0 {
            profile.savings_balance.max(0.0) / burn_rate
        } else {
            UNBOUNDED
        };

        let break_even_month = if one_time_costs <= 0.0 {
            0.0
        } else if net_monthly_balance > 0.0 {
            (one_time_costs / net_monthly_balance).ceil()
        } else {
            UNBOUNDED
        };

        let horizon = horizon_months as f64;
        let cumulative_net = net_monthly_balance * horizon;
        let cumulative_cost = monthly_expenses * horizon;

        Metrics {
            monthly_income,
            monthly_expenses,
            recurring_expenses,
            one_time_costs,
            net_monthly_balance,
            savings_rate,
            runway_months,
            break_even_month,
            horizon_months,
            cumulative_net,
            cumulative_cost,
            projected_savings: profile.savings_balance + cumulative_net,
        }
    }

    pub fn to_map(&self) -> MetricMap {
        [
            ("monthly_income", self.monthly_income),
            ("monthly_expenses", self.monthly_expenses),
            ("recurring_expenses", self.recurring_expenses),
            ("one_time_costs", self.one_time_costs),
            ("net_monthly_balance", self.net_monthly_balance),
            ("savings_rate", self.savings_rate),
            ("runway_months", self.runway_months),
            ("break_even_month", self.break_even_month),
            ("horizon_months", self.horizon_months as f64),
            ("cumulative_net", self.cumulative_net),
            ("cumulative_cost", self.cumulative_cost),
            ("projected_savings", self.projected_savings),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect()
    }
}

/// Scenario-versus-baseline deltas over a shared horizon.
#[derive(Debug, Clone, PartialEq)]
pub struct ScenarioComparison {
    pub roi: f64,
    pub net_balance_change: f64,
    pub expense_change_pct: f64,
    pub income_change_pct: f64,
    pub net_change_pct: f64,
}

impl ScenarioComparison {
    pub fn compute(baseline: &Metrics, scenario: &Metrics) -> Self {
        let roi = ratio(
            scenario.cumulative_net - baseline.cumulative_net,
            baseline.cumulative_cost,
        );

        ScenarioComparison {
            roi,
            net_balance_change: scenario.net_monthly_balance - baseline.net_monthly_balance,
            expense_change_pct: pct_change(baseline.monthly_expenses, scenario.monthly_expenses),
            income_change_pct: pct_change(baseline.monthly_income, scenario.monthly_income),
            net_change_pct: pct_change(baseline.net_monthly_balance, scenario.net_monthly_balance),
        }
    }

    pub fn extend_map(&self, map: &mut MetricMap) {
        map.insert("roi".into(), self.roi);
        map.insert("net_balance_change".into(), self.net_balance_change);
        map.insert("expense_change_pct".into(), self.expense_change_pct);
        map.insert("income_change_pct".into(), self.income_change_pct);
        map.insert("net_change_pct".into(), self.net_change_pct);
    }
}

/// Named metric mapping for a single profile.
pub fn compute_metrics(profile: &FinancialProfile, horizon_months: u32) -> MetricMap {
    Metrics::compute(profile, horizon_months).to_map()
}

/// (recurring monthly total, one-time total, one-time monthly share).
///
/// A recurring category contributes its average over the months in which it
/// recurs; one-time costs are spread over every month the dataset spans.
fn monthly_burden(profile: &FinancialProfile) -> (f64, f64, f64) {
    let mut recurring: BTreeMap<_, (f64, BTreeSet<YearMonth>)> = BTreeMap::new();
    let mut one_time = 0.0;

    for record in &profile.expenses {
        if record.recurring {
            let entry = recurring
                .entry(&record.category)
                .or_insert_with(|| (0.0, BTreeSet::new()));
            entry.0 += record.amount;
            entry.1.insert(record.month());
        } else {
            one_time += record.amount;
        }
    }

    let recurring_total: f64 = recurring
        .values()
        .map(|(total, months)| total / months.len().max(1) as f64)
        .sum();

    let span = profile.months().len().max(1) as f64;
    (recurring_total, one_time, one_time / span)
}

pub(crate) fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator != 0.0 {
        numerator / denominator
    } else {
        0.0
    }
}

fn pct_change(before: f64, after: f64) -> f64 {
    ratio(after - before, before.abs()) * 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::category::Category;
    use crate::domain::profile::ExpenseRecord;
    use approx::assert_relative_eq;
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn make_profile(income: f64, savings: f64, expenses: Vec<ExpenseRecord>) -> FinancialProfile {
        FinancialProfile {
            monthly_income: income,
            expenses,
            savings_balance: savings,
            currency: "USD".into(),
        }
    }

    fn student_profile() -> FinancialProfile {
        make_profile(
            3000.0,
            10_000.0,
            vec![
                ExpenseRecord::new(Category::Rent, 1200.0, date(2024, 1, 1), true),
                ExpenseRecord::new(Category::Groceries, 400.0, date(2024, 1, 4), true),
            ],
        )
    }

    #[test]
    fn net_balance_and_savings_rate() {
        let m = Metrics::compute(&student_profile(), 12);
        assert_relative_eq!(m.monthly_expenses, 1600.0);
        assert_relative_eq!(m.net_monthly_balance, 1400.0);
        assert_relative_eq!(m.savings_rate, 1400.0 / 3000.0);
        assert_relative_eq!(m.cumulative_net, 1400.0 * 12.0);
        assert_relative_eq!(m.cumulative_cost, 1600.0 * 12.0);
        assert_relative_eq!(m.projected_savings, 10_000.0 + 1400.0 * 12.0);
    }

    #[test]
    fn zero_income_savings_rate_is_zero() {
        let mut profile = student_profile();
        profile.monthly_income = 0.0;
        let m = Metrics::compute(&profile, 12);
        assert_eq!(m.savings_rate, 0.0);
        assert!(m.savings_rate.is_finite());
    }

    #[test]
    fn runway_is_unbounded_when_balance_non_negative() {
        let m = Metrics::compute(&student_profile(), 12);
        assert!(m.runway_months.is_infinite());
    }

    #[test]
    fn runway_when_burning_savings() {
        let mut profile = student_profile();
        profile.monthly_income = 1100.0;
        profile.savings_balance = 2500.0;
        let m = Metrics::compute(&profile, 12);
        // burn = 500/month
        assert_relative_eq!(m.runway_months, 5.0);
    }

    #[test]
    fn recurring_categories_average_over_their_months() {
        let profile = make_profile(
            2000.0,
            0.0,
            vec![
                ExpenseRecord::new(Category::Rent, 1000.0, date(2024, 1, 1), true),
                ExpenseRecord::new(Category::Rent, 1000.0, date(2024, 2, 1), true),
                ExpenseRecord::new(Category::Rent, 1300.0, date(2024, 3, 1), true),
            ],
        );
        let m = Metrics::compute(&profile, 1);
        assert_relative_eq!(m.recurring_expenses, 1100.0);
    }

    #[test]
    fn one_time_costs_spread_over_dataset_span() {
        let profile = make_profile(
            2000.0,
            0.0,
            vec![
                ExpenseRecord::new(Category::Rent, 1000.0, date(2024, 1, 1), true),
                ExpenseRecord::new(Category::Rent, 1000.0, date(2024, 2, 1), true),
                ExpenseRecord::new(Category::Travel, 600.0, date(2024, 2, 10), false),
            ],
        );
        let m = Metrics::compute(&profile, 1);
        assert_relative_eq!(m.one_time_costs, 600.0);
        assert_relative_eq!(m.monthly_expenses, 1300.0);
        // 600 of one-time costs recovered at 700/month
        assert_relative_eq!(m.break_even_month, 1.0);
    }

    #[test]
    fn break_even_without_one_time_costs_is_zero() {
        let m = Metrics::compute(&student_profile(), 12);
        assert_eq!(m.break_even_month, 0.0);
    }

    #[test]
    fn break_even_unbounded_without_surplus() {
        let profile = make_profile(
            100.0,
            0.0,
            vec![ExpenseRecord::new(Category::Tuition, 9000.0, date(2024, 8, 1), false)],
        );
        let m = Metrics::compute(&profile, 12);
        assert!(m.break_even_month.is_infinite());
    }

    #[test]
    fn empty_profile_has_zero_expenses() {
        let m = Metrics::compute(&make_profile(1000.0, 0.0, vec![]), 6);
        assert_eq!(m.monthly_expenses, 0.0);
        assert_relative_eq!(m.savings_rate, 1.0);
    }

    #[test]
    fn to_map_contains_named_metrics() {
        let map = compute_metrics(&student_profile(), 12);
        assert_relative_eq!(map["net_monthly_balance"], 1400.0);
        assert_relative_eq!(map["monthly_expenses"], 1600.0);
        assert!(map["runway_months"].is_infinite());
        assert_eq!(map.len(), 12);
    }

    #[test]
    fn comparison_roi_and_changes() {
        let baseline = Metrics::compute(&student_profile(), 12);
        let mut cheaper = student_profile();
        cheaper.expenses[0].amount = 960.0;
        let scenario = Metrics::compute(&cheaper, 12);

        let cmp = ScenarioComparison::compute(&baseline, &scenario);
        assert_relative_eq!(cmp.net_balance_change, 240.0);
        assert_relative_eq!(cmp.roi, (240.0 * 12.0) / (1600.0 * 12.0));
        assert_relative_eq!(cmp.expense_change_pct, -15.0);
        assert_eq!(cmp.income_change_pct, 0.0);
    }

    #[test]
    fn comparison_zero_cost_baseline_roi_is_zero() {
        let baseline = Metrics::compute(&make_profile(1000.0, 0.0, vec![]), 12);
        let scenario = Metrics::compute(&make_profile(1500.0, 0.0, vec![]), 12);
        let cmp = ScenarioComparison::compute(&baseline, &scenario);
        assert_eq!(cmp.roi, 0.0);
        assert_eq!(cmp.expense_change_pct, 0.0);
        assert_relative_eq!(cmp.income_change_pct, 50.0);
    }
}
