/// Receives descriptions of batch submission failures.
///
/// Implementations must return promptly; the exporter calls `report`
/// inline before moving on to the next batch.
pub trait ErrorSink {
    fn report(&self, message: &str);
}

/// Discards every report.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSink;

impl ErrorSink for NoopSink {
    fn report(&self, _message: &str) {}
}

/// Forwards reports to the `tracing` subscriber at WARN.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl ErrorSink for TracingSink {
    fn report(&self, message: &str) {
        tracing::warn!(error = message, "failed to submit metric batch");
    }
}

impl<F> ErrorSink for F
where
    F: Fn(&str),
{
    fn report(&self, message: &str) {
        self(message)
    }
}
