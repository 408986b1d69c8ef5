//! In-process entry point tying ingestion, metrics, anomaly detection and
//! cached scenario evaluation together.

use std::future::Future;
use std::sync::Arc;

use tokio::task::JoinSet;
use tracing::{info, warn};

use crate::cache::{CacheOutcome, CacheStats, ResultCache};
use crate::domain::anomaly::{AnomalyDetector, AnomalyScan};
use crate::domain::config_validation::{build_analyzer_config, AnalyzerConfig};
use crate::domain::error::FincastError;
use crate::domain::ingest::{self, IngestOptions, RawTable};
use crate::domain::metrics::{Metrics, MetricMap};
use crate::domain::profile::FinancialProfile;
use crate::domain::roi::{self, RoiAnalysis, SalaryRange};
use crate::domain::scenario::{self, ScenarioParameters, ScenarioResult};
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;

/// One slot of a batch run, tagged with the parameters it was evaluated for.
#[derive(Debug, Clone)]
pub struct BatchResult {
    pub parameters: ScenarioParameters,
    pub outcome: CacheOutcome,
}

impl BatchResult {
    pub fn is_ok(&self) -> bool {
        self.outcome.is_ok()
    }
}

pub struct Analyzer {
    config: AnalyzerConfig,
    cache: Arc<ResultCache>,
    detector: AnomalyDetector,
}

impl Analyzer {
    pub fn new(config: AnalyzerConfig) -> Result<Self, FincastError> {
        let cache = Arc::new(ResultCache::new(config.cache)?);
        Ok(Self::with_cache(config, cache))
    }

    /// Build from `[cache]`, `[anomaly]` and `[metrics]` config sections.
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, FincastError> {
        Self::new(build_analyzer_config(config)?)
    }

    /// Share an existing cache between analyzers.
    pub fn with_cache(config: AnalyzerConfig, cache: Arc<ResultCache>) -> Self {
        let detector = AnomalyDetector::new(config.anomaly);
        Analyzer {
            config,
            cache,
            detector,
        }
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    pub fn ingest(
        &self,
        table: &RawTable,
        options: &IngestOptions,
    ) -> Result<FinancialProfile, FincastError> {
        Ok(ingest::ingest(table, options)?)
    }

    /// Load through a [`DataPort`]. When the port supplies an income table,
    /// the monthly income derived from it replaces `options.monthly_income`.
    pub fn ingest_from(
        &self,
        port: &dyn DataPort,
        options: &IngestOptions,
    ) -> Result<FinancialProfile, FincastError> {
        let expenses = port.expense_table()?;
        let mut options = options.clone();
        if let Some(income) = port.income_table()? {
            options.monthly_income = ingest::monthly_income_from(&income)?;
        }
        self.ingest(&expenses, &options)
    }

    /// Metrics over the configured horizon.
    pub fn compute_metrics(&self, profile: &FinancialProfile) -> MetricMap {
        Metrics::compute(profile, self.config.horizon_months).to_map()
    }

    pub fn detect_anomalies(&self, profile: &FinancialProfile) -> AnomalyScan {
        self.detector.detect(profile)
    }

    /// Degree payback under the three standard salary assumptions.
    pub fn roi_analysis(&self, profile: &FinancialProfile, salaries: &SalaryRange) -> RoiAnalysis {
        let analysis = roi::roi_analysis(profile, salaries);
        info!(
            total_cost = analysis.total_cost,
            realistic_salary = salaries.realistic,
            "degree roi projected"
        );
        analysis
    }

    /// Evaluate one scenario through the cache.
    pub async fn run_scenario(
        &self,
        profile: &FinancialProfile,
        parameters: &ScenarioParameters,
    ) -> Result<Arc<ScenarioResult>, FincastError> {
        evaluate(&self.cache, profile, parameters).await
    }

    /// Evaluate scenarios concurrently. Slots arrive in completion order and
    /// a failing scenario never affects its siblings. There is always one
    /// slot per entry of `parameters`.
    pub async fn run_batch(
        &self,
        profile: &FinancialProfile,
        parameters: &[ScenarioParameters],
    ) -> Vec<BatchResult> {
        self.run_tasks(profile, parameters, |cache, baseline, params| async move {
            evaluate(&cache, &baseline, &params).await
        })
        .await
    }

    /// Spawns `task` once per scenario. A task that dies without reporting
    /// (panicked or aborted) still yields a `ComputationCancelled` slot.
    async fn run_tasks<T, Fut>(
        &self,
        profile: &FinancialProfile,
        parameters: &[ScenarioParameters],
        task: T,
    ) -> Vec<BatchResult>
    where
        T: Fn(Arc<ResultCache>, Arc<FinancialProfile>, ScenarioParameters) -> Fut,
        Fut: Future<Output = CacheOutcome> + Send + 'static,
    {
        let baseline = Arc::new(profile.clone());
        let mut tasks = JoinSet::new();

        for (index, params) in parameters.iter().enumerate() {
            let pending = task(Arc::clone(&self.cache), Arc::clone(&baseline), params.clone());
            tasks.spawn(async move { (index, pending.await) });
        }

        let mut reported = vec![false; parameters.len()];
        let mut results = Vec::with_capacity(parameters.len());
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, outcome)) => {
                    reported[index] = true;
                    results.push(BatchResult {
                        parameters: parameters[index].clone(),
                        outcome,
                    });
                }
                Err(err) => warn!(error = %err, "batch task did not complete"),
            }
        }

        for (params, _) in parameters.iter().zip(&reported).filter(|(_, done)| !**done) {
            results.push(BatchResult {
                parameters: params.clone(),
                outcome: Err(FincastError::ComputationCancelled {
                    scenario: params.name.clone(),
                }),
            });
        }

        let failed = results.iter().filter(|r| !r.is_ok()).count();
        info!(
            scenarios = results.len(),
            failed,
            hit_rate = self.cache.stats().hit_rate(),
            "batch evaluation complete"
        );
        results
    }
}

async fn evaluate(
    cache: &ResultCache,
    baseline: &FinancialProfile,
    parameters: &ScenarioParameters,
) -> CacheOutcome {
    cache
        .get_or_compute(baseline, parameters, || {
            let baseline = baseline.clone();
            let parameters = parameters.clone();
            async move {
                let name = parameters.name.clone();
                match tokio::task::spawn_blocking(move || {
                    scenario::run_scenario(&baseline, &parameters)
                })
                .await
                {
                    Ok(result) => result.map_err(FincastError::from),
                    Err(err) => {
                        warn!(scenario = %name, error = %err, "scenario worker failed");
                        Err(FincastError::ComputationCancelled { scenario: name })
                    }
                }
            }
        })
        .await
}
