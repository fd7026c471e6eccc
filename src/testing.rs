use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::cloudwatch::{ApiError, MetricsApi};
use crate::config::{Compression, Config};
use crate::datum::Datum;

/// Accepts every batch and keeps a copy of it.
#[derive(Default)]
pub struct RecordingApi {
    calls: Mutex<Vec<(String, Vec<Datum>)>>,
}

impl RecordingApi {
    pub fn calls(&self) -> Vec<(String, Vec<Datum>)> {
        self.calls.lock().unwrap().clone()
    }
}

impl MetricsApi for RecordingApi {
    async fn put_metric_data(&self, namespace: &str, batch: &[Datum]) -> Result<(), ApiError> {
        self.calls
            .lock()
            .unwrap()
            .push((namespace.to_owned(), batch.to_vec()));
        Ok(())
    }
}

/// Rejects the n-th call (1-based) with a 500 and accepts the rest.
pub struct FailingOnCallApi {
    fail_on: usize,
    attempts: AtomicUsize,
}

impl FailingOnCallApi {
    pub fn new(fail_on: usize) -> Self {
        Self {
            fail_on,
            attempts: AtomicUsize::new(0),
        }
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

impl MetricsApi for FailingOnCallApi {
    async fn put_metric_data(&self, _namespace: &str, _batch: &[Datum]) -> Result<(), ApiError> {
        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst) + 1;
        if attempt == self.fail_on {
            return Err(ApiError::Rejected {
                status: reqwest::StatusCode::INTERNAL_SERVER_ERROR,
                message: "internal failure".into(),
            });
        }
        Ok(())
    }
}

pub fn dummy_config(endpoint: &str, compression: Compression) -> Config {
    let _ = rustls::crypto::ring::default_provider().install_default();
    Config {
        namespace: "test".into(),
        region: "us-east-2".into(),
        endpoint: url::Url::parse(endpoint).unwrap(),
        credentials: aws_credential_types::Credentials::new(
            "AKIDEXAMPLE",
            "wJalrXUtnFEMI/K7MDENG+bPxRfiCYEXAMPLEKEY",
            None,
            None,
            "test",
        ),
        export_timeout: std::time::Duration::from_millis(2000),
        compression,
        flush_interval: std::time::Duration::from_millis(60_000),
    }
}
