//! In-memory [`DataPort`] for callers that already hold their rows.

use crate::domain::error::FincastError;
use crate::domain::ingest::RawTable;
use crate::ports::data_port::DataPort;

#[derive(Debug, Clone, Default)]
pub struct MemoryDataPort {
    expenses: RawTable,
    income: Option<RawTable>,
}

impl MemoryDataPort {
    pub fn new(expenses: RawTable) -> Self {
        Self {
            expenses,
            income: None,
        }
    }

    pub fn with_income(mut self, income: RawTable) -> Self {
        self.income = Some(income);
        self
    }
}

impl DataPort for MemoryDataPort {
    fn expense_table(&self) -> Result<RawTable, FincastError> {
        if self.expenses.headers.is_empty() {
            return Err(FincastError::DataSource {
                reason: "expense table has no header row".to_string(),
            });
        }
        Ok(self.expenses.clone())
    }

    fn income_table(&self) -> Result<Option<RawTable>, FincastError> {
        Ok(self.income.clone())
    }
}
