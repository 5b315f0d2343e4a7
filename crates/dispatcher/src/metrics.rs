//! Dispatch counters

use std::sync::atomic::{AtomicU64, Ordering};

use crate::dispatcher::OrganizationOutcome;

/// Counters shared by every invocation of one dispatcher
#[derive(Debug, Default)]
pub struct DispatchMetrics {
    invocations: AtomicU64,
    decode_failures: AtomicU64,
    fatal_failures: AtomicU64,
    organizations: AtomicU64,
    handed_off: AtomicU64,
    unresolved: AtomicU64,
    business_faults: AtomicU64,
    requeued: AtomicU64,
    retry_exhausted: AtomicU64,
    handoff_failures: AtomicU64,
    requeue_failures: AtomicU64,
}

impl DispatchMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inc_invocations(&self) {
        self.invocations.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_decode_failures(&self) {
        self.decode_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_fatal_failures(&self) {
        self.fatal_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Count one organization's terminal outcome
    pub fn record(&self, outcome: &OrganizationOutcome) {
        self.organizations.fetch_add(1, Ordering::Relaxed);
        let counter = match outcome {
            OrganizationOutcome::HandedOff { .. } => &self.handed_off,
            OrganizationOutcome::Unresolved => &self.unresolved,
            OrganizationOutcome::BusinessFault { .. } => &self.business_faults,
            OrganizationOutcome::Requeued { .. } => &self.requeued,
            OrganizationOutcome::RetryExhausted { .. } => &self.retry_exhausted,
            OrganizationOutcome::HandoffFailed { .. } => &self.handoff_failures,
            OrganizationOutcome::RequeueFailed { .. } => &self.requeue_failures,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> DispatchSnapshot {
        DispatchSnapshot {
            invocations: self.invocations.load(Ordering::Relaxed),
            decode_failures: self.decode_failures.load(Ordering::Relaxed),
            fatal_failures: self.fatal_failures.load(Ordering::Relaxed),
            organizations: self.organizations.load(Ordering::Relaxed),
            handed_off: self.handed_off.load(Ordering::Relaxed),
            unresolved: self.unresolved.load(Ordering::Relaxed),
            business_faults: self.business_faults.load(Ordering::Relaxed),
            requeued: self.requeued.load(Ordering::Relaxed),
            retry_exhausted: self.retry_exhausted.load(Ordering::Relaxed),
            handoff_failures: self.handoff_failures.load(Ordering::Relaxed),
            requeue_failures: self.requeue_failures.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of `DispatchMetrics`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchSnapshot {
    pub invocations: u64,
    pub decode_failures: u64,
    pub fatal_failures: u64,
    pub organizations: u64,
    pub handed_off: u64,
    pub unresolved: u64,
    pub business_faults: u64,
    pub requeued: u64,
    pub retry_exhausted: u64,
    pub handoff_failures: u64,
    pub requeue_failures: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_routes_to_counters() {
        let metrics = DispatchMetrics::new();
        metrics.inc_invocations();
        metrics.record(&OrganizationOutcome::HandedOff { flow_count: 2 });
        metrics.record(&OrganizationOutcome::Requeued { retry: 1 });
        metrics.record(&OrganizationOutcome::Unresolved);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.invocations, 1);
        assert_eq!(snapshot.organizations, 3);
        assert_eq!(snapshot.handed_off, 1);
        assert_eq!(snapshot.requeued, 1);
        assert_eq!(snapshot.unresolved, 1);
        assert_eq!(snapshot.business_faults, 0);
    }
}
