use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use tracing::info;

/// Vendor API usage metrics
#[derive(Debug, Default)]
pub struct VendorApiMetrics {
    pub total_requests: AtomicU64,
    pub errors: AtomicU64,
    pub token_refreshes: AtomicU64,
}

impl VendorApiMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_request(&self) {
        self.total_requests.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_error(&self) {
        self.errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_token_refresh(&self) {
        self.token_refreshes.fetch_add(1, Ordering::Relaxed);
    }

    pub fn get_stats(&self) -> VendorApiStats {
        VendorApiStats {
            total_requests: self.total_requests.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
            token_refreshes: self.token_refreshes.load(Ordering::Relaxed),
        }
    }

    pub fn log_stats(&self) {
        let stats = self.get_stats();
        info!(
            "Vendor API metrics: requests={}, errors={}, token_refreshes={}",
            stats.total_requests, stats.errors, stats.token_refreshes
        );
    }
}

#[derive(Debug, Clone)]
pub struct VendorApiStats {
    pub total_requests: u64,
    pub errors: u64,
    pub token_refreshes: u64,
}

/// Global metrics instance
static VENDOR_METRICS: std::sync::LazyLock<VendorApiMetrics> =
    std::sync::LazyLock::new(VendorApiMetrics::new);

pub fn vendor_metrics() -> &'static VendorApiMetrics {
    &VENDOR_METRICS
}

/// Time an operation and record metrics
pub struct OperationTimer {
    operation: String,
    start: Instant,
}

impl OperationTimer {
    pub fn new(operation: &str) -> Self {
        Self {
            operation: operation.to_string(),
            start: Instant::now(),
        }
    }

    pub fn finish(self) {
        let duration = self.start.elapsed();
        info!(
            operation = %self.operation,
            duration_ms = duration.as_millis(),
            "Operation completed"
        );
    }
}

#[macro_export]
macro_rules! time_operation {
    ($operation:expr) => {
        let _timer = $crate::observability::OperationTimer::new($operation);
    };
}
