// src/metrics/http.rs

//! HTTP push to a metrics collector.

use std::time::Duration;

use serde::Serialize;
use tracing::debug;

use crate::errors::MetricsError;
use crate::metrics::{MetricPoint, MetricsSink};
use crate::types::BoxFuture;

/// Body of a push request.
#[derive(Debug, Serialize)]
pub struct PushRequest<'a> {
    pub namespace: &'a str,
    pub metrics: &'a [MetricPoint],
}

/// Sink that `POST`s a JSON [`PushRequest`] to a fixed endpoint. Any
/// non-2xx response is an error.
#[derive(Debug, Clone)]
pub struct HttpMetricsSink {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpMetricsSink {
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self, MetricsError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: endpoint.to_string(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn send(&self, namespace: &str, points: &[MetricPoint]) -> Result<(), MetricsError> {
        let body = PushRequest {
            namespace,
            metrics: points,
        };
        let response = self.client.post(&self.endpoint).json(&body).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MetricsError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        debug!(endpoint = %self.endpoint, count = points.len(), "metrics pushed");
        Ok(())
    }
}

impl MetricsSink for HttpMetricsSink {
    fn push<'a>(
        &'a self,
        namespace: &'a str,
        points: &'a [MetricPoint],
    ) -> BoxFuture<'a, Result<(), MetricsError>> {
        Box::pin(self.send(namespace, points))
    }
}
