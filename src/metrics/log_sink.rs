// src/metrics/log_sink.rs

use tracing::info;

use crate::errors::MetricsError;
use crate::metrics::{MetricPoint, MetricsSink};
use crate::types::BoxFuture;

/// Sink used when no endpoint is configured: points go to the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogMetricsSink;

impl MetricsSink for LogMetricsSink {
    fn push<'a>(
        &'a self,
        namespace: &'a str,
        points: &'a [MetricPoint],
    ) -> BoxFuture<'a, Result<(), MetricsError>> {
        Box::pin(async move {
            for point in points {
                info!(
                    namespace,
                    metric = %point.name,
                    dimension = %point.dimension.name,
                    host = %point.dimension.value,
                    unit = ?point.unit,
                    value = point.value,
                    "metric"
                );
            }
            Ok(())
        })
    }
}
