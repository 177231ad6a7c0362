use std::sync::atomic::{AtomicU64, Ordering};

/// Process-wide counters, updated concurrently from session tasks.
///
/// Mirrors each Python honeypot's `get_metrics()` accessor (spec §6
/// "Persisted state: None ... available only via an in-process
/// `get_metrics()` accessor").
#[derive(Default)]
pub struct Metrics {
    pub total_connections: AtomicU64,
    pub active_connections: AtomicU64,
    pub failed_logins: AtomicU64,
    pub attacks_detected: AtomicU64,
    pub total_queries: AtomicU64,
    pub injections_detected: AtomicU64,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct MetricsSnapshot {
    pub total_connections: u64,
    pub active_connections: u64,
    pub failed_logins: u64,
    pub attacks_detected: u64,
    pub total_queries: u64,
    pub injections_detected: u64,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn connection_opened(&self) {
        self.total_connections.fetch_add(1, Ordering::Relaxed);
        self.active_connections.fetch_add(1, Ordering::Relaxed);
    }

    pub fn connection_closed(&self) {
        self.active_connections.fetch_sub(1, Ordering::Relaxed);
    }

    pub fn login_failed(&self) {
        self.failed_logins.fetch_add(1, Ordering::Relaxed);
    }

    pub fn attack_detected(&self) {
        self.attacks_detected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn query_seen(&self, is_injection: bool) {
        self.total_queries.fetch_add(1, Ordering::Relaxed);
        if is_injection {
            self.injections_detected.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            total_connections: self.total_connections.load(Ordering::Relaxed),
            active_connections: self.active_connections.load(Ordering::Relaxed),
            failed_logins: self.failed_logins.load(Ordering::Relaxed),
            attacks_detected: self.attacks_detected.load(Ordering::Relaxed),
            total_queries: self.total_queries.load(Ordering::Relaxed),
            injections_detected: self.injections_detected.load(Ordering::Relaxed),
        }
    }
}
