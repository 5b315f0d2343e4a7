//! Worker outcome metrics
//!
//! Prometheus counters for invocations, per-organization outcomes and
//! configuration refreshes, plus an in-memory aggregator for run summaries.

use std::collections::BTreeMap;

use metrics::{counter, histogram};

/// Record the terminal outcome of one organization
///
/// `outcome` is one of the dispatcher's outcome labels
/// (`handed_off`, `unresolved`, `business_fault`, `requeued`, `retry_exhausted`, ...).
pub fn record_organization_outcome(outcome: &str) {
    counter!(
        "reporting_worker_organizations_total",
        "outcome" => outcome.to_string()
    )
    .increment(1);
}

/// Record the end of one invocation (`completed`, `decode_failed`, `fatal`)
pub fn record_invocation(status: &str) {
    counter!(
        "reporting_worker_invocations_total",
        "status" => status.to_string()
    )
    .increment(1);
}

/// Record one configuration refresh (`published`, `unavailable`, `unreachable`)
pub fn record_config_refresh(result: &str) {
    counter!(
        "reporting_worker_config_refresh_total",
        "result" => result.to_string()
    )
    .increment(1);
}

/// Record the latency of one remote flow-list call
pub fn record_rpc_latency_ms(latency_ms: f64) {
    histogram!("reporting_worker_rpc_latency_ms").record(latency_ms);
}

/// In-memory outcome aggregator
///
/// Fed by the worker loop, printed at the end of a run.
#[derive(Debug, Clone, Default)]
pub struct OutcomeAggregator {
    /// Invocation status -> count
    pub invocations: BTreeMap<String, u64>,

    /// Organization outcome -> count
    pub outcomes: BTreeMap<String, u64>,

    /// Remote call latency (ms)
    pub rpc_latency: RunningStats,
}

impl OutcomeAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_invocation(&mut self, status: &str) {
        *self.invocations.entry(status.to_string()).or_insert(0) += 1;
    }

    pub fn record_outcome(&mut self, outcome: &str) {
        *self.outcomes.entry(outcome.to_string()).or_insert(0) += 1;
    }

    pub fn record_rpc_latency_ms(&mut self, latency_ms: f64) {
        self.rpc_latency.push(latency_ms);
    }

    pub fn summary(&self) -> OutcomeSummary {
        OutcomeSummary {
            total_invocations: self.invocations.values().sum(),
            total_organizations: self.outcomes.values().sum(),
            invocations: self.invocations.clone(),
            outcomes: self.outcomes.clone(),
            rpc_latency_ms: StatsSummary::from(&self.rpc_latency),
        }
    }
}

/// Run summary
#[derive(Debug, Clone, Default)]
pub struct OutcomeSummary {
    pub total_invocations: u64,
    pub total_organizations: u64,
    pub invocations: BTreeMap<String, u64>,
    pub outcomes: BTreeMap<String, u64>,
    pub rpc_latency_ms: StatsSummary,
}

impl OutcomeSummary {
    pub fn invocations_with(&self, status: &str) -> u64 {
        self.invocations.get(status).copied().unwrap_or(0)
    }

    pub fn organizations_with(&self, outcome: &str) -> u64 {
        self.outcomes.get(outcome).copied().unwrap_or(0)
    }
}

impl std::fmt::Display for OutcomeSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Worker Summary ===")?;
        writeln!(f, "Invocations: {}", self.total_invocations)?;
        for (status, count) in &self.invocations {
            writeln!(f, "  {}: {}", status, count)?;
        }
        writeln!(f, "Organizations: {}", self.total_organizations)?;
        for (outcome, count) in &self.outcomes {
            writeln!(f, "  {}: {}", outcome, count)?;
        }
        writeln!(f, "Remote call latency (ms): {}", self.rpc_latency_ms)
    }
}

/// Statistics summary
#[derive(Debug, Clone, Default)]
pub struct StatsSummary {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl From<&RunningStats> for StatsSummary {
    fn from(stats: &RunningStats) -> Self {
        Self {
            count: stats.count,
            min: stats.min,
            max: stats.max,
            mean: stats.mean(),
            std_dev: stats.std_dev(),
        }
    }
}

impl std::fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.count == 0 {
            write!(f, "N/A")
        } else {
            write!(
                f,
                "min={:.1}, max={:.1}, mean={:.1}, std={:.1} (n={})",
                self.min, self.max, self.mean, self.std_dev, self.count
            )
        }
    }
}

/// Online statistics (Welford's algorithm)
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    pub fn push(&mut self, value: f64) {
        self.count += 1;

        if self.count == 1 {
            self.min = value;
            self.max = value;
            self.mean = value;
            self.m2 = 0.0;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);

            let delta = value - self.mean;
            self.mean += delta / self.count as f64;
            let delta2 = value - self.mean;
            self.m2 += delta * delta2;
        }
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.mean
        }
    }

    /// Sample variance
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }
}
