// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Metrics instrumentation for filterql.
//!
//! Uses the `metrics` crate for backend-agnostic metrics collection.
//! The owning service is responsible for choosing the exporter
//! (Prometheus, OTEL, etc.)
//!
//! # Metric Naming Convention
//! - `filterql_` prefix for all metrics
//! - `_total` suffix for counters
//! - `_seconds` suffix for duration histograms
//!
//! # Labels
//! - `status`: ok, error
//! - `target`: search, sql

use metrics::{counter, histogram};
use std::time::Instant;

/// Record a compilation outcome.
pub fn record_compile(status: &str) {
    counter!(
        "filterql_compile_total",
        "status" => status.to_string()
    )
    .increment(1);
}

/// Record an emitter rendering pass.
pub fn record_emit(target: &'static str) {
    counter!(
        "filterql_emit_total",
        "target" => target
    )
    .increment(1);
}

/// RAII guard recording compilation latency on drop.
pub struct CompileTimer {
    start: Instant,
}

impl CompileTimer {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }
}

impl Default for CompileTimer {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for CompileTimer {
    fn drop(&mut self) {
        histogram!("filterql_compile_seconds").record(self.start.elapsed().as_secs_f64());
    }
}
