//! Observability and Metrics
//!
//! Counters for status queries: how many ran, how they ended, and how much
//! traffic they generated.
//!
//! Uses atomic counters for thread-safe metrics collection.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use tracing::{debug, info};

use crate::error::ProtocolError;

/// Metrics collector for status queries
#[derive(Debug)]
pub struct Metrics {
    /// Total queries started
    pub queries_total: AtomicU64,
    /// Queries that returned status JSON
    pub queries_success: AtomicU64,
    /// Queries that failed for any reason
    pub queries_failed: AtomicU64,
    /// Queries stopped by their deadline
    pub timeouts: AtomicU64,
    /// Queries stopped by the caller
    pub cancellations: AtomicU64,
    /// Malformed or unexpected replies
    pub protocol_errors: AtomicU64,
    /// Transport failures
    pub connection_errors: AtomicU64,
    /// Connections opened
    pub connections_opened: AtomicU64,
    /// Connections closed
    pub connections_closed: AtomicU64,
    /// SRV lookups that produced a new target
    pub srv_redirects: AtomicU64,
    /// Total packets sent
    pub packets_sent: AtomicU64,
    /// Total packets received
    pub packets_received: AtomicU64,
    /// Total bytes sent
    pub bytes_sent: AtomicU64,
    /// Total bytes received
    pub bytes_received: AtomicU64,
    /// Start time for uptime calculation
    start_time: Instant,
}

impl Metrics {
    /// Create a new metrics collector
    pub fn new() -> Self {
        Self {
            queries_total: AtomicU64::new(0),
            queries_success: AtomicU64::new(0),
            queries_failed: AtomicU64::new(0),
            timeouts: AtomicU64::new(0),
            cancellations: AtomicU64::new(0),
            protocol_errors: AtomicU64::new(0),
            connection_errors: AtomicU64::new(0),
            connections_opened: AtomicU64::new(0),
            connections_closed: AtomicU64::new(0),
            srv_redirects: AtomicU64::new(0),
            packets_sent: AtomicU64::new(0),
            packets_received: AtomicU64::new(0),
            bytes_sent: AtomicU64::new(0),
            bytes_received: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    /// Record a query attempt
    pub fn query_started(&self) {
        self.queries_total.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a successful query
    pub fn query_succeeded(&self) {
        self.queries_success.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a failed query, bucketed by error family
    pub fn query_failed(&self, error: &ProtocolError) {
        self.queries_failed.fetch_add(1, Ordering::Relaxed);
        let bucket = match error {
            ProtocolError::Timeout => &self.timeouts,
            ProtocolError::Cancelled(_) => &self.cancellations,
            ProtocolError::Io(_) => &self.connection_errors,
            _ => &self.protocol_errors,
        };
        bucket.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a new connection
    pub fn connection_opened(&self) {
        self.connections_opened.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a connection closed
    pub fn connection_closed(&self) {
        self.connections_closed.fetch_add(1, Ordering::Relaxed);
    }

    /// Record an SRV record redirecting the target
    pub fn srv_redirect(&self) {
        self.srv_redirects.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a packet sent
    pub fn packet_sent(&self, byte_count: u64) {
        self.packets_sent.fetch_add(1, Ordering::Relaxed);
        self.bytes_sent.fetch_add(byte_count, Ordering::Relaxed);
    }

    /// Record a packet received
    pub fn packet_received(&self, byte_count: u64) {
        self.packets_received.fetch_add(1, Ordering::Relaxed);
        self.bytes_received.fetch_add(byte_count, Ordering::Relaxed);
    }

    /// Get current metrics snapshot
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            queries_total: self.queries_total.load(Ordering::Relaxed),
            queries_success: self.queries_success.load(Ordering::Relaxed),
            queries_failed: self.queries_failed.load(Ordering::Relaxed),
            timeouts: self.timeouts.load(Ordering::Relaxed),
            cancellations: self.cancellations.load(Ordering::Relaxed),
            protocol_errors: self.protocol_errors.load(Ordering::Relaxed),
            connection_errors: self.connection_errors.load(Ordering::Relaxed),
            connections_opened: self.connections_opened.load(Ordering::Relaxed),
            connections_closed: self.connections_closed.load(Ordering::Relaxed),
            srv_redirects: self.srv_redirects.load(Ordering::Relaxed),
            packets_sent: self.packets_sent.load(Ordering::Relaxed),
            packets_received: self.packets_received.load(Ordering::Relaxed),
            bytes_sent: self.bytes_sent.load(Ordering::Relaxed),
            bytes_received: self.bytes_received.load(Ordering::Relaxed),
            uptime_seconds: self.start_time.elapsed().as_secs(),
        }
    }

    /// Log current metrics
    pub fn log_metrics(&self) {
        let snapshot = self.snapshot();
        info!(
            queries_total = snapshot.queries_total,
            queries_success = snapshot.queries_success,
            queries_failed = snapshot.queries_failed,
            timeouts = snapshot.timeouts,
            cancellations = snapshot.cancellations,
            protocol_errors = snapshot.protocol_errors,
            connection_errors = snapshot.connection_errors,
            connections_opened = snapshot.connections_opened,
            connections_closed = snapshot.connections_closed,
            srv_redirects = snapshot.srv_redirects,
            packets_sent = snapshot.packets_sent,
            packets_received = snapshot.packets_received,
            bytes_sent = snapshot.bytes_sent,
            bytes_received = snapshot.bytes_received,
            uptime_seconds = snapshot.uptime_seconds,
            "Status query metrics snapshot"
        );
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of metrics at a point in time
#[derive(Debug, Clone)]
pub struct MetricsSnapshot {
    pub queries_total: u64,
    pub queries_success: u64,
    pub queries_failed: u64,
    pub timeouts: u64,
    pub cancellations: u64,
    pub protocol_errors: u64,
    pub connection_errors: u64,
    pub connections_opened: u64,
    pub connections_closed: u64,
    pub srv_redirects: u64,
    pub packets_sent: u64,
    pub packets_received: u64,
    pub bytes_sent: u64,
    pub bytes_received: u64,
    pub uptime_seconds: u64,
}

/// Global metrics instance (lazy static for simplicity)
static METRICS: once_cell::sync::Lazy<Metrics> = once_cell::sync::Lazy::new(Metrics::new);

/// Get the global metrics instance
pub fn global_metrics() -> &'static Metrics {
    &METRICS
}

/// Timer for measuring operation duration
pub struct Timer {
    start: Instant,
    operation: &'static str,
}

impl Timer {
    /// Start timing an operation
    pub fn start(operation: &'static str) -> Self {
        Self {
            start: Instant::now(),
            operation,
        }
    }
}

impl Drop for Timer {
    fn drop(&mut self) {
        let duration = self.start.elapsed();
        debug!(
            operation = self.operation,
            duration_ms = duration.as_millis(),
            "Operation completed"
        );
    }
}
