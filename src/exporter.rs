use chrono::{DateTime, Utc};
use tracing::debug;

use crate::cloudwatch::MetricsApi;
use crate::datum::make_data;
use crate::measure::MeasurementEvent;
use crate::sink::{ErrorSink, NoopSink};

/// Maximum number of data points CloudWatch accepts per `PutMetricData` call.
pub const BATCH_LIMIT: usize = 20;

/// Translates measurement events into data points and submits them in
/// batches under a single namespace.
///
/// Calls to [`Exporter::export`] are expected to be serialized by the caller.
pub struct Exporter<A, S = NoopSink> {
    api: A,
    namespace: String,
    sink: S,
}

impl<A: MetricsApi> Exporter<A> {
    pub fn new(api: A, namespace: impl Into<String>) -> Self {
        Self {
            api,
            namespace: namespace.into(),
            sink: NoopSink,
        }
    }
}

impl<A: MetricsApi, S: ErrorSink> Exporter<A, S> {
    pub fn with_sink<T: ErrorSink>(self, sink: T) -> Exporter<A, T> {
        Exporter {
            api: self.api,
            namespace: self.namespace,
            sink,
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    /// Submit every field of `events` as a data point stamped with `timestamp`.
    ///
    /// Batches go out in order, one at a time. A failed batch is reported to
    /// the sink and skipped; the remaining batches are still submitted.
    pub async fn export(&self, timestamp: DateTime<Utc>, events: &[MeasurementEvent]) {
        let data = make_data(timestamp, events);
        debug!(
            events = events.len(),
            data = data.len(),
            batches = data.len().div_ceil(BATCH_LIMIT),
            "exporting measurements"
        );

        for batch in data.chunks(BATCH_LIMIT) {
            if let Err(e) = self.api.put_metric_data(&self.namespace, batch).await {
                self.sink.report(&e.to_string());
            }
        }
    }
}
