// src/metrics/mod.rs

//! Completion metrics.
//!
//! A successful run emits two points, `BackupDuration` (seconds) and
//! `BackupCount` (always 1), both dimensioned by host identity, and pushes
//! them to a [`MetricsSink`].

pub mod http;
pub mod log_sink;

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::config::MetricsSettings;
use crate::errors::MetricsError;
use crate::exec::RunContext;
use crate::types::BoxFuture;

pub use http::HttpMetricsSink;
pub use log_sink::LogMetricsSink;

pub const BACKUP_DURATION: &str = "BackupDuration";
pub const BACKUP_COUNT: &str = "BackupCount";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MetricUnit {
    Seconds,
    Count,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Dimension {
    pub name: String,
    pub value: String,
}

/// A single named value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricPoint {
    pub name: String,
    pub dimension: Dimension,
    pub timestamp: DateTime<Utc>,
    pub unit: MetricUnit,
    pub value: f64,
}

/// Push interface of the metrics backend.
pub trait MetricsSink: Send + Sync {
    fn push<'a>(
        &'a self,
        namespace: &'a str,
        points: &'a [MetricPoint],
    ) -> BoxFuture<'a, Result<(), MetricsError>>;
}

/// Pick the sink for the configured settings: HTTP when an endpoint is set,
/// log-only otherwise.
pub fn sink_from_settings(settings: &MetricsSettings) -> Result<Box<dyn MetricsSink>, MetricsError> {
    match &settings.endpoint {
        Some(endpoint) => Ok(Box::new(HttpMetricsSink::new(endpoint, settings.timeout)?)),
        None => Ok(Box::new(LogMetricsSink)),
    }
}

/// Builds the per-run points and hands them to a sink.
pub struct MetricsReporter<'a> {
    sink: &'a dyn MetricsSink,
    namespace: &'a str,
    dimension: &'a str,
    host: &'a str,
}

impl<'a> MetricsReporter<'a> {
    pub fn new(sink: &'a dyn MetricsSink, settings: &'a MetricsSettings, host: &'a str) -> Self {
        Self {
            sink,
            namespace: &settings.namespace,
            dimension: &settings.dimension,
            host,
        }
    }

    /// The two points describing a run that took `duration`.
    pub fn points(&self, duration: Duration, at: DateTime<Utc>) -> Vec<MetricPoint> {
        let dimension = Dimension {
            name: self.dimension.to_string(),
            value: self.host.to_string(),
        };
        vec![
            MetricPoint {
                name: BACKUP_DURATION.to_string(),
                dimension: dimension.clone(),
                timestamp: at,
                unit: MetricUnit::Seconds,
                value: duration.as_secs_f64(),
            },
            MetricPoint {
                name: BACKUP_COUNT.to_string(),
                dimension,
                timestamp: at,
                unit: MetricUnit::Count,
                value: 1.0,
            },
        ]
    }

    /// Push the points for `duration`, bounded by the run deadline.
    pub async fn report(&self, ctx: &RunContext, duration: Duration) -> Result<(), MetricsError> {
        let points = self.points(duration, Utc::now());
        tokio::time::timeout_at(ctx.deadline(), self.sink.push(self.namespace, &points))
            .await
            .map_err(|_| MetricsError::DeadlineExceeded)?
    }
}
