//! Scenario engine: applies named adjustments to a baseline profile and
//! measures the derived profile against it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;

use super::category::Category;
use super::error::ScenarioError;
use super::metrics::{MetricMap, Metrics, ScenarioComparison};
use super::profile::FinancialProfile;

/// A change applied to every record of a category (or to income).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Adjustment {
    /// Multiply the amount. `Scale(0.8)` is a 20% cut.
    Scale(f64),
    /// Add a constant (negative to subtract).
    Add(f64),
}

impl Adjustment {
    /// Percentage change, e.g. `percent(10.0)` is `Scale(1.10)`.
    pub fn percent(pct: f64) -> Self {
        Adjustment::Scale(1.0 + pct / 100.0)
    }

    pub fn apply(&self, amount: f64) -> f64 {
        match *self {
            Adjustment::Scale(factor) => amount * factor,
            Adjustment::Add(delta) => amount + delta,
        }
    }

    /// The adjustment that undoes this one. `None` for `Scale(0.0)`.
    pub fn inverse(&self) -> Option<Adjustment> {
        match *self {
            Adjustment::Scale(factor) if factor != 0.0 => Some(Adjustment::Scale(1.0 / factor)),
            Adjustment::Scale(_) => None,
            Adjustment::Add(delta) => Some(Adjustment::Add(-delta)),
        }
    }

    fn check(&self) -> Result<(), String> {
        match *self {
            Adjustment::Scale(factor) if !factor.is_finite() => {
                Err(format!("scale factor {factor} is not finite"))
            }
            Adjustment::Scale(factor) if factor < 0.0 => {
                Err(format!("scale factor {factor} is negative"))
            }
            Adjustment::Add(delta) if !delta.is_finite() => {
                Err(format!("delta {delta} is not finite"))
            }
            _ => Ok(()),
        }
    }
}

/// A named set of adjustments. Together with the baseline fingerprint it
/// identifies one scenario run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioParameters {
    pub name: String,
    pub adjustments: BTreeMap<Category, Adjustment>,
    pub income_adjustment: Option<Adjustment>,
    pub duration_months: i64,
}

impl ScenarioParameters {
    pub fn new(name: impl Into<String>, duration_months: i64) -> Self {
        ScenarioParameters {
            name: name.into(),
            adjustments: BTreeMap::new(),
            income_adjustment: None,
            duration_months,
        }
    }

    pub fn adjust(mut self, category: Category, adjustment: Adjustment) -> Self {
        self.adjustments.insert(category, adjustment);
        self
    }

    pub fn adjust_income(mut self, adjustment: Adjustment) -> Self {
        self.income_adjustment = Some(adjustment);
        self
    }

    /// Parameters that undo this scenario, when every adjustment is invertible.
    pub fn inverse(&self) -> Option<ScenarioParameters> {
        let adjustments = self
            .adjustments
            .iter()
            .map(|(c, a)| a.inverse().map(|inv| (c.clone(), inv)))
            .collect::<Option<BTreeMap<_, _>>>()?;
        let income_adjustment = match self.income_adjustment {
            Some(a) => Some(a.inverse()?),
            None => None,
        };
        Some(ScenarioParameters {
            name: format!("{} (inverse)", self.name),
            adjustments,
            income_adjustment,
            duration_months: self.duration_months,
        })
    }

    pub fn is_identity(&self) -> bool {
        self.adjustments.is_empty() && self.income_adjustment.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioResult {
    pub parameters: ScenarioParameters,
    pub resulting_profile: FinancialProfile,
    pub metrics: MetricMap,
    pub computed_at: DateTime<Utc>,
}

impl ScenarioResult {
    pub fn metric(&self, name: &str) -> Option<f64> {
        self.metrics.get(name).copied()
    }
}

/// Derive the adjusted profile. All adjustments are validated and applied
/// before anything is returned, so a partially adjusted profile is never
/// observable.
pub fn apply_scenario(
    baseline: &FinancialProfile,
    parameters: &ScenarioParameters,
) -> Result<FinancialProfile, ScenarioError> {
    let scenario = &parameters.name;

    if parameters.duration_months <= 0 {
        return Err(ScenarioError::NonPositiveDuration {
            scenario: scenario.clone(),
            months: parameters.duration_months,
        });
    }
    if parameters.is_identity() {
        return Ok(baseline.clone());
    }

    for (category, adjustment) in &parameters.adjustments {
        if !baseline.has_category(category) {
            return Err(ScenarioError::UnknownCategory {
                scenario: scenario.clone(),
                category: category.name().to_string(),
            });
        }
        adjustment
            .check()
            .map_err(|reason| ScenarioError::InvalidAdjustment {
                scenario: scenario.clone(),
                target: category.name().to_string(),
                reason,
            })?;
    }

    let mut expenses = Vec::with_capacity(baseline.expenses.len());
    for record in &baseline.expenses {
        let mut derived = record.clone();
        if let Some(adjustment) = parameters.adjustments.get(&record.category) {
            derived.amount = adjustment.apply(record.amount);
            if derived.amount < 0.0 {
                return Err(ScenarioError::NegativeResult {
                    scenario: scenario.clone(),
                    target: record.category.name().to_string(),
                    value: derived.amount,
                });
            }
        }
        expenses.push(derived);
    }

    let monthly_income = match parameters.income_adjustment {
        Some(adjustment) => {
            adjustment
                .check()
                .map_err(|reason| ScenarioError::InvalidAdjustment {
                    scenario: scenario.clone(),
                    target: "income".to_string(),
                    reason,
                })?;
            let income = adjustment.apply(baseline.monthly_income);
            if income < 0.0 {
                return Err(ScenarioError::NegativeResult {
                    scenario: scenario.clone(),
                    target: "income".to_string(),
                    value: income,
                });
            }
            income
        }
        None => baseline.monthly_income,
    };

    Ok(FinancialProfile {
        monthly_income,
        expenses,
        savings_balance: baseline.savings_balance,
        currency: baseline.currency.clone(),
    })
}

/// Apply, measure over `duration_months`, and compare against the baseline.
pub fn run_scenario(
    baseline: &FinancialProfile,
    parameters: &ScenarioParameters,
) -> Result<ScenarioResult, ScenarioError> {
    let resulting_profile = apply_scenario(baseline, parameters)?;
    let horizon = u32::try_from(parameters.duration_months).unwrap_or(u32::MAX);

    let baseline_metrics = Metrics::compute(baseline, horizon);
    let scenario_metrics = Metrics::compute(&resulting_profile, horizon);
    let mut metrics = scenario_metrics.to_map();
    ScenarioComparison::compute(&baseline_metrics, &scenario_metrics).extend_map(&mut metrics);

    tracing::debug!(
        scenario = %parameters.name,
        net = scenario_metrics.net_monthly_balance,
        "scenario evaluated"
    );

    Ok(ScenarioResult {
        parameters: parameters.clone(),
        resulting_profile,
        metrics,
        computed_at: Utc::now(),
    })
}

/// Evaluate independent scenarios. One failure never affects its siblings;
/// each slot carries the parameters it came from.
pub fn run_batch(
    baseline: &FinancialProfile,
    parameters: &[ScenarioParameters],
) -> Vec<(ScenarioParameters, Result<ScenarioResult, ScenarioError>)> {
    parameters
        .iter()
        .map(|p| (p.clone(), run_scenario(baseline, p)))
        .collect()
}

/// The stock what-if scenarios, limited to categories the baseline has.
pub fn preset_scenarios(baseline: &FinancialProfile, duration_months: i64) -> Vec<ScenarioParameters> {
    let has_rent = baseline.has_category(&Category::Rent);
    let has_groceries = baseline.has_category(&Category::Groceries);
    let mut presets = Vec::new();

    if has_rent {
        presets.push(
            ScenarioParameters::new("Rent Increase (10%)", duration_months)
                .adjust(Category::Rent, Adjustment::percent(10.0)),
        );
    }
    if has_groceries {
        presets.push(
            ScenarioParameters::new("Groceries Decrease (15%)", duration_months)
                .adjust(Category::Groceries, Adjustment::percent(-15.0)),
        );
    }
    presets.push(
        ScenarioParameters::new("Income Increase (20%)", duration_months)
            .adjust_income(Adjustment::percent(20.0)),
    );
    if has_rent && has_groceries {
        presets.push(
            ScenarioParameters::new(
                "Combined (Rent +10%, Groceries -15%, Income +20%)",
                duration_months,
            )
            .adjust(Category::Rent, Adjustment::percent(10.0))
            .adjust(Category::Groceries, Adjustment::percent(-15.0))
            .adjust_income(Adjustment::percent(20.0)),
        );
    }
    if baseline.has_category(&Category::Tuition) {
        presets.push(
            ScenarioParameters::new("Tuition Increase (15%)", duration_months)
                .adjust(Category::Tuition, Adjustment::percent(15.0)),
        );
    }
    if baseline.has_category(&Category::Gas) {
        presets.push(
            ScenarioParameters::new("Gas Price Increase (25%)", duration_months)
                .adjust(Category::Gas, Adjustment::percent(25.0)),
        );
    }

    presets
}

#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonRow {
    pub scenario: String,
    pub monthly_expenses: f64,
    pub monthly_income: f64,
    pub net_monthly_balance: f64,
    pub expense_change_pct: f64,
    pub income_change_pct: f64,
    pub net_change_pct: f64,
}

/// Side-by-side table, baseline first, then results in the order given.
pub fn compare(baseline: &Metrics, results: &[&ScenarioResult]) -> Vec<ComparisonRow> {
    let mut rows = Vec::with_capacity(results.len() + 1);
    rows.push(ComparisonRow {
        scenario: "Baseline".to_string(),
        monthly_expenses: baseline.monthly_expenses,
        monthly_income: baseline.monthly_income,
        net_monthly_balance: baseline.net_monthly_balance,
        expense_change_pct: 0.0,
        income_change_pct: 0.0,
        net_change_pct: 0.0,
    });

    for result in results {
        let m = |name: &str| result.metric(name).unwrap_or(0.0);
        rows.push(ComparisonRow {
            scenario: result.parameters.name.clone(),
            monthly_expenses: m("monthly_expenses"),
            monthly_income: m("monthly_income"),
            net_monthly_balance: m("net_monthly_balance"),
            expense_change_pct: m("expense_change_pct"),
            income_change_pct: m("income_change_pct"),
            net_change_pct: m("net_change_pct"),
        });
    }

    rows
}

/// Scenario with the highest net monthly balance.
pub fn best_scenario<'a>(results: &[&'a ScenarioResult]) -> Option<&'a ScenarioResult> {
    results.iter().copied().max_by(|a, b| by_net(a, b))
}

/// Scenario with the lowest net monthly balance.
pub fn worst_scenario<'a>(results: &[&'a ScenarioResult]) -> Option<&'a ScenarioResult> {
    results.iter().copied().min_by(|a, b| by_net(a, b))
}

fn by_net(a: &ScenarioResult, b: &ScenarioResult) -> Ordering {
    let net = |r: &ScenarioResult| r.metric("net_monthly_balance").unwrap_or(f64::NEG_INFINITY);
    net(a).total_cmp(&net(b))
}
