//! Validation of an already-loaded tabular dataset into a [`FinancialProfile`].
//!
//! Required columns: `category`, `amount`, `date`. Optional: `recurring`,
//! `currency`. Header matching is case-insensitive.

use chrono::NaiveDate;
use std::collections::BTreeSet;

use super::category::Category;
use super::error::ValidationError;
use super::profile::{ExpenseRecord, FinancialProfile, YearMonth};

const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"];

/// Raw string cells as handed over by the dataset loader.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    pub fn new<H: Into<String>>(headers: impl IntoIterator<Item = H>) -> Self {
        RawTable {
            headers: headers.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    pub fn with_row<C: Into<String>>(mut self, cells: impl IntoIterator<Item = C>) -> Self {
        self.rows.push(cells.into_iter().map(Into::into).collect());
        self
    }

    pub fn column(&self, name: &str) -> Option<usize> {
        self.headers
            .iter()
            .position(|h| h.trim().eq_ignore_ascii_case(name))
    }

    fn require_column(&self, name: &str) -> Result<usize, ValidationError> {
        self.column(name).ok_or_else(|| ValidationError::MissingColumn {
            column: name.to_string(),
        })
    }
}

/// Profile fields that do not come from the expense table.
#[derive(Debug, Clone, PartialEq)]
pub struct IngestOptions {
    pub monthly_income: f64,
    pub savings_balance: f64,
    pub currency: String,
}

impl Default for IngestOptions {
    fn default() -> Self {
        IngestOptions {
            monthly_income: 0.0,
            savings_balance: 0.0,
            currency: "USD".to_string(),
        }
    }
}

pub fn ingest(table: &RawTable, options: &IngestOptions) -> Result<FinancialProfile, ValidationError> {
    if !options.monthly_income.is_finite() || options.monthly_income < 0.0 {
        return Err(ValidationError::InvalidIncome {
            reason: format!("must be a non-negative number, got {}", options.monthly_income),
        });
    }
    if !options.savings_balance.is_finite() {
        return Err(ValidationError::InvalidSavings {
            reason: format!("must be finite, got {}", options.savings_balance),
        });
    }

    let category_col = table.require_column("category")?;
    let amount_col = table.require_column("amount")?;
    let date_col = table.require_column("date")?;
    let recurring_col = table.column("recurring");
    let currency_col = table.column("currency");

    let mut expenses = Vec::with_capacity(table.rows.len());

    for (i, row) in table.rows.iter().enumerate() {
        let row_no = i + 1;
        let cell = |col: usize| row.get(col).map(|s| s.trim()).unwrap_or("");

        let category =
            Category::parse(cell(category_col)).ok_or(ValidationError::EmptyCategory { row: row_no })?;
        if !category.is_known() {
            tracing::debug!(row = row_no, label = %category, "keeping unrecognised category label");
        }
        let amount = parse_amount(cell(amount_col), row_no)?;
        let date = parse_date(cell(date_col), row_no)?;
        let recurring = match recurring_col {
            Some(col) => parse_recurring(cell(col), row_no)?,
            None => false,
        };

        if let Some(col) = currency_col {
            let found = cell(col);
            if !found.is_empty() && !found.eq_ignore_ascii_case(&options.currency) {
                return Err(ValidationError::CurrencyMismatch {
                    row: row_no,
                    expected: options.currency.clone(),
                    found: found.to_string(),
                });
            }
        }

        expenses.push(ExpenseRecord::new(category, amount, date, recurring));
    }

    Ok(FinancialProfile {
        monthly_income: options.monthly_income,
        expenses,
        savings_balance: options.savings_balance,
        currency: options.currency.clone(),
    })
}

/// Average monthly income from a salary table with `amount` and `date`
/// columns: total income over the number of distinct months. An empty table
/// yields 0.
pub fn monthly_income_from(table: &RawTable) -> Result<f64, ValidationError> {
    let amount_col = table.require_column("amount")?;
    let date_col = table.require_column("date")?;

    let mut total = 0.0;
    let mut months = BTreeSet::new();
    for (i, row) in table.rows.iter().enumerate() {
        let row_no = i + 1;
        let cell = |col: usize| row.get(col).map(|s| s.trim()).unwrap_or("");
        total += parse_amount(cell(amount_col), row_no)?;
        months.insert(YearMonth::of(parse_date(cell(date_col), row_no)?));
    }

    if months.is_empty() {
        return Ok(0.0);
    }
    Ok(total / months.len() as f64)
}

pub(crate) fn parse_amount(value: &str, row: usize) -> Result<f64, ValidationError> {
    let cleaned: String = value.chars().filter(|c| !matches!(c, ',' | '$')).collect();
    let amount: f64 = cleaned
        .parse()
        .ok()
        .filter(|a: &f64| a.is_finite())
        .ok_or_else(|| ValidationError::NonNumericAmount {
            row,
            value: value.to_string(),
        })?;
    if amount < 0.0 {
        return Err(ValidationError::NegativeAmount { row, amount });
    }
    Ok(amount)
}

fn parse_date(value: &str, row: usize) -> Result<NaiveDate, ValidationError> {
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(value, fmt).ok())
        .ok_or_else(|| ValidationError::UnparsableDate {
            row,
            value: value.to_string(),
        })
}

fn parse_recurring(value: &str, row: usize) -> Result<bool, ValidationError> {
    match value.to_lowercase().as_str() {
        "" | "false" | "no" | "0" | "n" => Ok(false),
        "true" | "yes" | "1" | "y" => Ok(true),
        _ => Err(ValidationError::InvalidRecurring {
            row,
            value: value.to_string(),
        }),
    }
}
