//! Export in-process measurements to Amazon CloudWatch.
//!
//! Each [`MeasurementEvent`] field becomes one [`Datum`]; the data are
//! submitted through a [`MetricsApi`] in batches of at most
//! [`BATCH_LIMIT`]. Submission failures go to an [`ErrorSink`] instead of
//! the caller.

pub mod cloudwatch;
pub mod config;
pub mod datum;
pub mod exporter;
pub mod input;
pub mod measure;
pub mod relay;
pub mod sink;

#[cfg(test)]
mod testing;

pub use cloudwatch::{ApiError, CloudWatchClient, MetricsApi};
pub use datum::{Datum, Dimension, StandardUnit};
pub use exporter::{BATCH_LIMIT, Exporter};
pub use measure::{Field, FieldValue, MeasurementEvent, Tag};
pub use sink::{ErrorSink, NoopSink, TracingSink};
