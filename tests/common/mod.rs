#![allow(dead_code)]

use chrono::NaiveDate;
use fincast::domain::category::Category;
use fincast::domain::error::FincastError;
use fincast::domain::ingest::RawTable;
pub use fincast::domain::profile::{ExpenseRecord, FinancialProfile};
use fincast::ports::data_port::DataPort;
use tracing_subscriber::EnvFilter;

pub struct MockDataPort {
    pub expenses: RawTable,
    pub income: Option<RawTable>,
    pub error: Option<String>,
}

impl MockDataPort {
    pub fn new(expenses: RawTable) -> Self {
        Self {
            expenses,
            income: None,
            error: None,
        }
    }

    pub fn with_income(mut self, income: RawTable) -> Self {
        self.income = Some(income);
        self
    }

    pub fn with_error(mut self, reason: &str) -> Self {
        self.error = Some(reason.to_string());
        self
    }
}

impl DataPort for MockDataPort {
    fn expense_table(&self) -> Result<RawTable, FincastError> {
        if let Some(reason) = &self.error {
            return Err(FincastError::DataSource {
                reason: reason.clone(),
            });
        }
        Ok(self.expenses.clone())
    }

    fn income_table(&self) -> Result<Option<RawTable>, FincastError> {
        Ok(self.income.clone())
    }
}

/// Route library logs to the test harness; `RUST_LOG=fincast=debug` shows
/// cache traffic.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn make_record(category: Category, amount: f64, d: NaiveDate, recurring: bool) -> ExpenseRecord {
    ExpenseRecord::new(category, amount, d, recurring)
}

/// Income 3000 with recurring rent 1200 and groceries 400 in a single month.
pub fn student_profile() -> FinancialProfile {
    FinancialProfile {
        monthly_income: 3000.0,
        expenses: vec![
            make_record(Category::Rent, 1200.0, date(2024, 1, 1), true),
            make_record(Category::Groceries, 400.0, date(2024, 1, 3), true),
        ],
        savings_balance: 5000.0,
        currency: "USD".to_string(),
    }
}

pub fn student_table() -> RawTable {
    RawTable::new(["Category", "Amount", "Date", "Recurring"])
        .with_row(["Rent", "1200", "2024-01-01", "true"])
        .with_row(["Groceries", "400", "2024-01-03", "true"])
}

/// Ten months of history: steady rent, groceries with one spike in October,
/// and a single tuition payment.
pub fn history_table() -> RawTable {
    let mut table = RawTable::new(["category", "amount", "date", "recurring"]);
    for month in 1..=10 {
        table = table.with_row(["Rent".to_string(), "1200".to_string(), format!("2024-{month:02}-01"), "yes".to_string()]);
        let groceries = if month == 10 { "1500" } else { "300" };
        table = table.with_row([
            "Groceries".to_string(),
            groceries.to_string(),
            format!("2024-{month:02}-12"),
            "yes".to_string(),
        ]);
    }
    table.with_row(["Tuition Fees", "9000", "2024-08-20", "no"])
}
