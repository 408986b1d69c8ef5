//! Statistical outlier scoring over monthly category totals.
//!
//! Each category's records are bucketed into monthly totals. Categories with
//! at least `min_samples` months get a mean and sample standard deviation;
//! every month is then scored by its z-score. Zero-variance categories never
//! flag.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;

use super::category::Category;
use super::error::InsufficientDataError;
use super::profile::{FinancialProfile, YearMonth};

pub const DEFAULT_THRESHOLD: f64 = 2.0;
pub const DEFAULT_MIN_SAMPLES: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnomalyConfig {
    /// Flag when |z| exceeds this many standard deviations.
    pub threshold: f64,
    /// Minimum monthly totals a category needs to be scored.
    pub min_samples: usize,
}

impl Default for AnomalyConfig {
    fn default() -> Self {
        AnomalyConfig {
            threshold: DEFAULT_THRESHOLD,
            min_samples: DEFAULT_MIN_SAMPLES,
        }
    }
}

/// Points at the monthly total that was scored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordRef {
    pub category: Category,
    pub month: YearMonth,
    /// Indices into `FinancialProfile::expenses` that make up the total.
    pub record_indices: Vec<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnomalyReport {
    pub record: RecordRef,
    pub amount: f64,
    pub mean: f64,
    pub std_dev: f64,
    pub z_score: f64,
    pub flagged: bool,
}

/// Outcome of one detection pass.
///
/// Reports are ordered most anomalous first (|z| descending, then category
/// name, then month). Iteration is lazy and can be restarted any number of
/// times.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnomalyScan {
    reports: Vec<AnomalyReport>,
    insufficient: Vec<InsufficientDataError>,
}

impl AnomalyScan {
    pub fn iter(&self) -> std::slice::Iter<'_, AnomalyReport> {
        self.reports.iter()
    }

    pub fn flagged(&self) -> impl Iterator<Item = &AnomalyReport> + '_ {
        self.reports.iter().filter(|r| r.flagged)
    }

    pub fn insufficient_data(&self) -> &[InsufficientDataError] {
        &self.insufficient
    }

    pub fn len(&self) -> usize {
        self.reports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reports.is_empty()
    }
}

impl<'a> IntoIterator for &'a AnomalyScan {
    type Item = &'a AnomalyReport;
    type IntoIter = std::slice::Iter<'a, AnomalyReport>;

    fn into_iter(self) -> Self::IntoIter {
        self.reports.iter()
    }
}

#[derive(Debug, Clone, Default)]
pub struct AnomalyDetector {
    config: AnomalyConfig,
}

impl AnomalyDetector {
    pub fn new(config: AnomalyConfig) -> Self {
        AnomalyDetector { config }
    }

    pub fn config(&self) -> &AnomalyConfig {
        &self.config
    }

    pub fn detect(&self, profile: &FinancialProfile) -> AnomalyScan {
        let mut reports = Vec::new();
        let mut insufficient = Vec::new();

        for (category, records) in profile.by_category() {
            let mut monthly: BTreeMap<YearMonth, (f64, Vec<usize>)> = BTreeMap::new();
            for (index, record) in records {
                let entry = monthly.entry(record.month()).or_default();
                entry.0 += record.amount;
                entry.1.push(index);
            }

            if monthly.len() < self.config.min_samples {
                tracing::debug!(
                    category = %category,
                    samples = monthly.len(),
                    minimum = self.config.min_samples,
                    "skipping category with insufficient history"
                );
                insufficient.push(InsufficientDataError {
                    category: category.name().to_string(),
                    samples: monthly.len(),
                    minimum: self.config.min_samples,
                });
                continue;
            }

            let totals: Vec<f64> = monthly.values().map(|(total, _)| *total).collect();
            let (mean, std_dev) = mean_and_sample_stddev(&totals);
            let zero_variance = totals.iter().all(|&t| t == totals[0]) || std_dev == 0.0;

            for (month, (amount, record_indices)) in monthly {
                let z_score = if zero_variance {
                    0.0
                } else {
                    (amount - mean) / std_dev
                };
                reports.push(AnomalyReport {
                    record: RecordRef {
                        category: category.clone(),
                        month,
                        record_indices,
                    },
                    amount,
                    mean,
                    std_dev: if zero_variance { 0.0 } else { std_dev },
                    z_score,
                    flagged: !zero_variance && z_score.abs() > self.config.threshold,
                });
            }
        }

        reports.sort_by(compare_reports);

        AnomalyScan {
            reports,
            insufficient,
        }
    }
}

/// Detect with the default minimum sample size and a caller-chosen threshold.
pub fn detect_anomalies(profile: &FinancialProfile, threshold: f64) -> AnomalyScan {
    AnomalyDetector::new(AnomalyConfig {
        threshold,
        ..AnomalyConfig::default()
    })
    .detect(profile)
}

fn compare_reports(a: &AnomalyReport, b: &AnomalyReport) -> Ordering {
    b.z_score
        .abs()
        .total_cmp(&a.z_score.abs())
        .then_with(|| a.record.category.name().cmp(b.record.category.name()))
        .then_with(|| a.record.month.cmp(&b.record.month))
}

fn mean_and_sample_stddev(values: &[f64]) -> (f64, f64) {
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    if values.len() < 2 {
        return (mean, 0.0);
    }
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
    (mean, variance.sqrt())
}
