//! Run statistics.

use std::time::Duration;

use dispatcher::{DispatchError, InvocationReport};
use observability::OutcomeAggregator;
use tracing::error;

/// Statistics from a `run` over a message stream
#[derive(Debug, Clone, Default)]
pub struct RunStats {
    /// Non-empty messages read
    pub messages: u64,

    /// Invocations that processed every organization
    pub completed: u64,

    /// Messages dropped because they could not be decoded
    pub decode_failed: u64,

    /// Invocations aborted by an unreachable configuration provider
    pub fatal: u64,

    pub duration: Duration,

    /// Outcome counts and remote call latency
    pub outcomes: OutcomeAggregator,
}

impl RunStats {
    /// Fold in the result of one invocation
    pub fn record(&mut self, result: &Result<InvocationReport, DispatchError>) {
        match result {
            Ok(report) => {
                self.completed += 1;
                self.outcomes.record_invocation("completed");
                for entry in &report.organizations {
                    self.outcomes.record_outcome(entry.outcome.label());
                    if let Some(latency) = entry.rpc_latency_ms {
                        self.outcomes.record_rpc_latency_ms(latency);
                    }
                }
            }
            Err(e) => {
                if e.is_fatal() {
                    self.fatal += 1;
                    error!(error = %e, "Invocation aborted");
                } else {
                    self.decode_failed += 1;
                }
                self.outcomes.record_invocation(e.status());
            }
        }
    }

    /// Messages per second
    pub fn throughput(&self) -> f64 {
        if self.duration.as_secs_f64() > 0.0 {
            self.messages as f64 / self.duration.as_secs_f64()
        } else {
            0.0
        }
    }

    pub fn print_summary(&self) {
        println!("\n=== Run Statistics ===");
        println!("Duration: {:.2}s", self.duration.as_secs_f64());
        println!("Messages: {}", self.messages);
        println!("  completed: {}", self.completed);
        println!("  decode failed: {}", self.decode_failed);
        println!("  aborted: {}", self.fatal);
        println!("Throughput: {:.2} msg/s", self.throughput());
        print!("{}", self.outcomes.summary());
    }
}
