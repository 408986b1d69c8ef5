//! Tabular dataset loader port.
//!
//! Loading (CSV, spreadsheets, databases) happens outside the crate; an
//! implementation only hands over string cells.

use crate::domain::error::FincastError;
use crate::domain::ingest::RawTable;

pub trait DataPort {
    /// Expense rows with at least `category`, `amount` and `date` columns.
    fn expense_table(&self) -> Result<RawTable, FincastError>;

    /// Optional salary rows (`amount`, `date`) used to derive monthly income.
    fn income_table(&self) -> Result<Option<RawTable>, FincastError>;
}
