//! Structural content digests used as cache keys.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

use super::error::FincastError;
use super::profile::FinancialProfile;
use super::scenario::ScenarioParameters;

/// SHA-256 over the canonical JSON encoding of a value. Two structurally
/// equal values always share a fingerprint, whatever their identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Fails when `value` has no JSON encoding (e.g. a map with non-string
    /// keys); such a value never gets a key.
    pub fn of<T: Serialize>(value: &T) -> Result<Self, FincastError> {
        let encoded = serde_json::to_vec(value).map_err(|err| FincastError::Fingerprint {
            reason: err.to_string(),
        })?;
        let mut hasher = Sha256::new();
        hasher.update(&encoded);
        Ok(Fingerprint(hex::encode(hasher.finalize())))
    }

    /// Cache key for a scenario run against a baseline.
    pub fn scenario(
        baseline: &FinancialProfile,
        parameters: &ScenarioParameters,
    ) -> Result<Self, FincastError> {
        Self::of(&(baseline, parameters))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn short(&self) -> &str {
        &self.0[..12.min(self.0.len())]
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::category::Category;
    use crate::domain::profile::ExpenseRecord;
    use crate::domain::scenario::Adjustment;
    use chrono::NaiveDate;
    use std::collections::BTreeMap;

    fn profile() -> FinancialProfile {
        FinancialProfile {
            monthly_income: 3000.0,
            expenses: vec![ExpenseRecord::new(
                Category::Rent,
                1200.0,
                NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                true,
            )],
            savings_balance: 0.0,
            currency: "USD".into(),
        }
    }

    #[test]
    fn structurally_equal_values_share_fingerprint() {
        let a = profile();
        let b = profile();
        assert_eq!(Fingerprint::of(&a).unwrap(), Fingerprint::of(&b).unwrap());
    }

    #[test]
    fn content_changes_change_fingerprint() {
        let a = profile();
        let mut b = profile();
        b.expenses[0].amount = 1201.0;
        assert_ne!(Fingerprint::of(&a).unwrap(), Fingerprint::of(&b).unwrap());
    }

    #[test]
    fn adjustment_insertion_order_is_irrelevant() {
        let first = ScenarioParameters::new("mix", 12)
            .adjust(Category::Rent, Adjustment::Scale(0.8))
            .adjust(Category::Gas, Adjustment::Add(10.0));
        let second = ScenarioParameters::new("mix", 12)
            .adjust(Category::Gas, Adjustment::Add(10.0))
            .adjust(Category::Rent, Adjustment::Scale(0.8));
        assert_eq!(
            Fingerprint::scenario(&profile(), &first).unwrap(),
            Fingerprint::scenario(&profile(), &second).unwrap()
        );
    }

    #[test]
    fn custom_label_spelled_like_known_category_is_not_that_category() {
        let a = profile();
        let mut b = profile();
        b.expenses[0].category = Category::parse("Rent Deposit").unwrap();
        assert_ne!(a, b);
        assert_ne!(Fingerprint::of(&a).unwrap(), Fingerprint::of(&b).unwrap());

        // a label that names a known category resolves to it
        let mut c = profile();
        c.expenses[0].category = Category::parse("rent").unwrap();
        assert_eq!(a, c);
        assert_eq!(Fingerprint::of(&a).unwrap(), Fingerprint::of(&c).unwrap());
    }

    #[test]
    fn unencodable_value_has_no_fingerprint() {
        let mut tuple_keys = BTreeMap::new();
        tuple_keys.insert((1u8, 2u8), 3u8);
        let err = Fingerprint::of(&tuple_keys).unwrap_err();
        assert!(matches!(err, FincastError::Fingerprint { .. }));

        let empty = Fingerprint(hex::encode(Sha256::digest(b"")));
        assert_ne!(Fingerprint::of(&()).unwrap(), empty);
    }

    #[test]
    fn hex_sha256_length() {
        let fp = Fingerprint::of(&"x").unwrap();
        assert_eq!(fp.as_str().len(), 64);
        assert_eq!(fp.short().len(), 12);
    }
}
