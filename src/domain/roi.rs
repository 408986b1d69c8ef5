//! Return on a degree: how long post-graduation savings take to recover
//! what the profile spent, under conservative, realistic and optimistic
//! salary assumptions.

use serde::{Deserialize, Serialize};

use super::error::ValidationError;
use super::ingest::{parse_amount, RawTable};
use super::metrics::{ratio, UNBOUNDED};
use super::profile::FinancialProfile;

/// Annual salaries used when no salary survey is available.
pub const FALLBACK_SALARIES: SalaryRange = SalaryRange {
    conservative: 60_000.0,
    realistic: 85_000.0,
    optimistic: 120_000.0,
};

/// Low, typical and high annual salary for the target job market.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SalaryRange {
    pub conservative: f64,
    pub realistic: f64,
    pub optimistic: f64,
}

impl Default for SalaryRange {
    fn default() -> Self {
        FALLBACK_SALARIES
    }
}

impl SalaryRange {
    /// Minimum, median and maximum of the surveyed salaries. Falls back to
    /// [`FALLBACK_SALARIES`] when there are none.
    pub fn from_salaries(salaries: &[f64]) -> Self {
        let mut sorted: Vec<f64> = salaries.iter().copied().filter(|s| s.is_finite()).collect();
        if sorted.is_empty() {
            return FALLBACK_SALARIES;
        }
        sorted.sort_by(f64::total_cmp);

        let mid = sorted.len() / 2;
        let median = if sorted.len() % 2 == 0 {
            (sorted[mid - 1] + sorted[mid]) / 2.0
        } else {
            sorted[mid]
        };
        SalaryRange {
            conservative: sorted[0],
            realistic: median,
            optimistic: sorted[sorted.len() - 1],
        }
    }

    /// Salary survey table with an `AverageSalary` column (header match is
    /// case-insensitive).
    pub fn from_table(table: &RawTable) -> Result<Self, ValidationError> {
        let col = table
            .column("averagesalary")
            .ok_or_else(|| ValidationError::MissingColumn {
                column: "AverageSalary".to_string(),
            })?;
        let salaries = table
            .rows
            .iter()
            .enumerate()
            .map(|(i, row)| parse_amount(row.get(col).map(|s| s.trim()).unwrap_or(""), i + 1))
            .collect::<Result<Vec<f64>, _>>()?;
        Ok(Self::from_salaries(&salaries))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoiAssumptions {
    pub name: String,
    pub annual_salary: f64,
    /// Months without income before the first paycheck.
    pub job_search_months: u32,
    /// Share of the monthly salary put towards the degree cost, 0..=1.
    pub savings_rate: f64,
}

impl RoiAssumptions {
    pub fn conservative(annual_salary: f64) -> Self {
        Self::named("conservative", annual_salary, 6, 0.15)
    }

    pub fn realistic(annual_salary: f64) -> Self {
        Self::named("realistic", annual_salary, 3, 0.25)
    }

    pub fn optimistic(annual_salary: f64) -> Self {
        Self::named("optimistic", annual_salary, 1, 0.35)
    }

    fn named(name: &str, annual_salary: f64, job_search_months: u32, savings_rate: f64) -> Self {
        RoiAssumptions {
            name: name.to_string(),
            annual_salary,
            job_search_months,
            savings_rate,
        }
    }

    /// The three standard assumption sets over a salary range.
    pub fn presets(salaries: &SalaryRange) -> Vec<RoiAssumptions> {
        vec![
            Self::conservative(salaries.conservative),
            Self::realistic(salaries.realistic),
            Self::optimistic(salaries.optimistic),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoiProjection {
    pub assumptions: RoiAssumptions,
    pub monthly_salary: f64,
    pub monthly_savings: f64,
    /// Months of saving needed to cover the cost; [`UNBOUNDED`] when nothing
    /// is saved.
    pub break_even_months: f64,
    /// Job search plus saving time, in years; [`UNBOUNDED`] when nothing is
    /// saved.
    pub break_even_years: f64,
    /// First-year salary return on the cost; 0 when nothing was spent.
    pub roi_pct: f64,
}

pub fn project(total_cost: f64, assumptions: &RoiAssumptions) -> RoiProjection {
    let monthly_salary = assumptions.annual_salary / 12.0;
    let monthly_savings = monthly_salary * assumptions.savings_rate;

    let (break_even_months, break_even_years) = if monthly_savings > 0.0 {
        let months = total_cost / monthly_savings;
        (months, (months + f64::from(assumptions.job_search_months)) / 12.0)
    } else {
        (UNBOUNDED, UNBOUNDED)
    };

    RoiProjection {
        assumptions: assumptions.clone(),
        monthly_salary,
        monthly_savings,
        break_even_months,
        break_even_years,
        roi_pct: ratio(assumptions.annual_salary - total_cost, total_cost) * 100.0,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoiAnalysis {
    /// Everything the profile spent.
    pub total_cost: f64,
    pub actual_monthly_salary: f64,
    pub actual_annual_salary: f64,
    pub salaries: SalaryRange,
    /// Conservative, realistic and optimistic, in that order.
    pub projections: Vec<RoiProjection>,
}

impl RoiAnalysis {
    pub fn projection(&self, name: &str) -> Option<&RoiProjection> {
        self.projections.iter().find(|p| p.assumptions.name == name)
    }
}

pub fn roi_analysis(profile: &FinancialProfile, salaries: &SalaryRange) -> RoiAnalysis {
    let total_cost = profile.total_expenses();
    let projections = RoiAssumptions::presets(salaries)
        .iter()
        .map(|assumptions| project(total_cost, assumptions))
        .collect();

    RoiAnalysis {
        total_cost,
        actual_monthly_salary: profile.monthly_income,
        actual_annual_salary: profile.monthly_income * 12.0,
        salaries: *salaries,
        projections,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::category::Category;
    use crate::domain::profile::ExpenseRecord;
    use approx::assert_relative_eq;
    use chrono::NaiveDate;

    fn profile(amounts: &[f64]) -> FinancialProfile {
        FinancialProfile {
            monthly_income: 2000.0,
            expenses: amounts
                .iter()
                .map(|&a| {
                    ExpenseRecord::new(
                        Category::Tuition,
                        a,
                        NaiveDate::from_ymd_opt(2024, 1, 10).unwrap(),
                        false,
                    )
                })
                .collect(),
            savings_balance: 0.0,
            currency: "USD".into(),
        }
    }

    #[test]
    fn realistic_degree_pays_back_in_two_years() {
        let projection = project(42_500.0, &RoiAssumptions::realistic(85_000.0));
        assert_relative_eq!(projection.monthly_salary, 85_000.0 / 12.0);
        assert_relative_eq!(projection.monthly_savings, 85_000.0 / 12.0 * 0.25);
        assert_relative_eq!(projection.break_even_months, 24.0, epsilon = 1e-9);
        assert_relative_eq!(projection.break_even_years, 27.0 / 12.0, epsilon = 1e-9);
        assert_relative_eq!(projection.roi_pct, 100.0, epsilon = 1e-9);
    }

    #[test]
    fn nothing_spent_means_zero_roi_and_only_job_search() {
        let projection = project(0.0, &RoiAssumptions::conservative(60_000.0));
        assert_eq!(projection.roi_pct, 0.0);
        assert_eq!(projection.break_even_months, 0.0);
        assert_relative_eq!(projection.break_even_years, 0.5);
    }

    #[test]
    fn no_savings_never_breaks_even() {
        let mut assumptions = RoiAssumptions::optimistic(120_000.0);
        assumptions.savings_rate = 0.0;
        let projection = project(30_000.0, &assumptions);
        assert_eq!(projection.monthly_savings, 0.0);
        assert_eq!(projection.break_even_months, UNBOUNDED);
        assert_eq!(projection.break_even_years, UNBOUNDED);
        assert_relative_eq!(projection.roi_pct, 300.0);

        let unpaid = project(30_000.0, &RoiAssumptions::realistic(0.0));
        assert_eq!(unpaid.break_even_years, UNBOUNDED);
    }

    #[test]
    fn salary_range_is_min_median_max() {
        let range = SalaryRange::from_salaries(&[130_000.0, 50_000.0, 90_000.0, 70_000.0]);
        assert_eq!(range.conservative, 50_000.0);
        assert_eq!(range.realistic, 80_000.0);
        assert_eq!(range.optimistic, 130_000.0);
        assert_eq!(SalaryRange::from_salaries(&[]), FALLBACK_SALARIES);
    }

    #[test]
    fn salary_range_from_survey_table() {
        let table = RawTable::new(["City", "Role", "AverageSalary"])
            .with_row(["Austin", "Analyst", "$70,000"])
            .with_row(["Boston", "Engineer", "95000"])
            .with_row(["Denver", "Analyst", "65000"]);
        let range = SalaryRange::from_table(&table).unwrap();
        assert_eq!(range.conservative, 65_000.0);
        assert_eq!(range.realistic, 70_000.0);
        assert_eq!(range.optimistic, 95_000.0);

        let missing = RawTable::new(["City", "Salary"]);
        assert!(matches!(
            SalaryRange::from_table(&missing),
            Err(ValidationError::MissingColumn { .. })
        ));
        let bad = RawTable::new(["AverageSalary"]).with_row(["lots"]);
        assert!(matches!(
            SalaryRange::from_table(&bad),
            Err(ValidationError::NonNumericAmount { row: 1, .. })
        ));
    }

    #[test]
    fn analysis_costs_the_whole_profile() {
        let analysis = roi_analysis(&profile(&[20_000.0, 22_500.0]), &SalaryRange::default());
        assert_relative_eq!(analysis.total_cost, 42_500.0);
        assert_relative_eq!(analysis.actual_annual_salary, 24_000.0);

        let names: Vec<&str> = analysis
            .projections
            .iter()
            .map(|p| p.assumptions.name.as_str())
            .collect();
        assert_eq!(names, ["conservative", "realistic", "optimistic"]);

        let conservative = analysis.projection("conservative").unwrap();
        let optimistic = analysis.projection("optimistic").unwrap();
        assert!(conservative.break_even_years > optimistic.break_even_years);
        assert_relative_eq!(
            analysis.projection("realistic").unwrap().roi_pct,
            100.0,
            epsilon = 1e-9
        );
    }
}
