// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Metrics for observability.
//!
//! Emitted through the `metrics` facade; the binary (or embedding process)
//! decides whether an exporter is installed. Without one these calls are
//! no-ops.
//!
//! # Metric Naming Convention
//!
//! All metrics are prefixed with `bolt_monitor_`:
//! - Counters end in `_total`
//! - Gauges represent current state
//! - Histograms track durations and sizes
//!
//! # Usage
//!
//! ```rust,no_run
//! use bolt_monitor::metrics;
//! use std::time::Duration;
//!
//! metrics::record_reconcile_action("push_then_monitor");
//! metrics::record_upload(true, 4096, Duration::from_millis(12));
//! ```

use metrics::{counter, gauge, histogram};
use std::time::Duration;

/// Record the action chosen by a reconcile attempt.
pub fn record_reconcile_action(action: &str) {
    counter!("bolt_monitor_reconcile_actions_total", "action" => action.to_string()).increment(1);
}

/// Record a reconcile attempt that ended in an error.
pub fn record_reconcile_error(error_type: &str) {
    counter!("bolt_monitor_reconcile_errors_total", "error_type" => error_type.to_string())
        .increment(1);
}

/// Record one file probe in the wait branch.
pub fn record_wait_poll(file_found: bool) {
    let outcome = if file_found { "found" } else { "absent" };
    counter!("bolt_monitor_wait_polls_total", "outcome" => outcome).increment(1);
}

/// Record a pull (store → file).
pub fn record_pull(success: bool, bytes: usize) {
    let status = if success { "success" } else { "failure" };
    counter!("bolt_monitor_pulls_total", "status" => status).increment(1);
    if success {
        histogram!("bolt_monitor_pull_bytes").record(bytes as f64);
    }
}

/// Record an upload (file → store), from either reconcile or the sync loop.
pub fn record_upload(success: bool, bytes: usize, duration: Duration) {
    let status = if success { "success" } else { "failure" };
    counter!("bolt_monitor_uploads_total", "status" => status).increment(1);
    histogram!("bolt_monitor_upload_duration_seconds").record(duration.as_secs_f64());
    if success {
        histogram!("bolt_monitor_upload_bytes").record(bytes as f64);
    }
}

/// Record a change notification accepted from the watcher.
pub fn record_change_event() {
    counter!("bolt_monitor_change_events_total").increment(1);
}

/// Notifications waiting behind the current upload.
pub fn set_queue_depth(depth: usize) {
    gauge!("bolt_monitor_change_queue_depth").set(depth as f64);
}

/// Record a monitor session ending.
///
/// `reason` is `subscribe_failed` or `subscription_ended`.
pub fn record_monitor_exit(reason: &str) {
    counter!("bolt_monitor_monitor_exits_total", "reason" => reason.to_string()).increment(1);
}

/// Record an attempt to connect to the store.
pub fn record_store_connection(success: bool) {
    let status = if success { "success" } else { "failure" };
    counter!("bolt_monitor_store_connections_total", "status" => status).increment(1);
}

/// Gauge for agent state.
pub fn set_agent_state(state: &str) {
    let value = match state {
        "Init" => 0.0,
        "Reconcile" => 1.0,
        "Monitor" => 2.0,
        _ => -1.0,
    };
    gauge!("bolt_monitor_agent_state").set(value);
}
