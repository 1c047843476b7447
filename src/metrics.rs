use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe counters describing relay activity.
#[derive(Default)]
pub struct RelayMetrics {
    uploads_received: AtomicU64,
    bytes_received: AtomicU64,
    extractions_succeeded: AtomicU64,
    extractions_failed: AtomicU64,
}

impl RelayMetrics {
    /// Create an empty metrics accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an accepted upload of `bytes` bytes.
    pub fn record_upload(&self, bytes: u64) {
        self.uploads_received.fetch_add(1, Ordering::Relaxed);
        self.bytes_received.fetch_add(bytes, Ordering::Relaxed);
    }

    /// Record the outcome of one downstream extraction.
    pub fn record_extraction(&self, succeeded: bool) {
        let counter = if succeeded {
            &self.extractions_succeeded
        } else {
            &self.extractions_failed
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Return a snapshot of the current counters.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            uploads_received: self.uploads_received.load(Ordering::Relaxed),
            bytes_received: self.bytes_received.load(Ordering::Relaxed),
            extractions_succeeded: self.extractions_succeeded.load(Ordering::Relaxed),
            extractions_failed: self.extractions_failed.load(Ordering::Relaxed),
        }
    }
}

/// Immutable view of relay counters used for reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct MetricsSnapshot {
    /// Uploads accepted since startup.
    pub uploads_received: u64,
    /// Total bytes written to the scratch directory.
    pub bytes_received: u64,
    /// Extractions that returned a result.
    pub extractions_succeeded: u64,
    /// Extractions that failed downstream.
    pub extractions_failed: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_uploads_and_outcomes() {
        let metrics = RelayMetrics::new();
        metrics.record_upload(10);
        metrics.record_upload(5);
        metrics.record_extraction(true);
        metrics.record_extraction(false);
        metrics.record_extraction(true);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.uploads_received, 2);
        assert_eq!(snapshot.bytes_received, 15);
        assert_eq!(snapshot.extractions_succeeded, 2);
        assert_eq!(snapshot.extractions_failed, 1);
    }

    #[test]
    fn snapshot_starts_empty() {
        let snapshot = RelayMetrics::new().snapshot();
        assert_eq!(snapshot.uploads_received, 0);
        assert_eq!(snapshot.extractions_failed, 0);
    }
}
