#![allow(unused)]

use std::sync::Mutex;

use stats_cloudwatch::{ApiError, Datum, MetricsApi};

/// Records every submitted batch; rejects the calls listed in `fail_on` (1-based).
#[derive(Default)]
pub struct FakeApi {
    fail_on: Vec<usize>,
    calls: Mutex<Vec<(String, Vec<Datum>)>>,
}

impl FakeApi {
    pub fn failing_on(fail_on: &[usize]) -> Self {
        Self {
            fail_on: fail_on.to_vec(),
            calls: Mutex::default(),
        }
    }

    pub fn calls(&self) -> Vec<(String, Vec<Datum>)> {
        self.calls.lock().unwrap().clone()
    }
}

impl MetricsApi for FakeApi {
    async fn put_metric_data(&self, namespace: &str, batch: &[Datum]) -> Result<(), ApiError> {
        let attempt = {
            let mut calls = self.calls.lock().unwrap();
            calls.push((namespace.to_owned(), batch.to_vec()));
            calls.len()
        };
        if self.fail_on.contains(&attempt) {
            return Err(ApiError::Rejected {
                status: reqwest::StatusCode::SERVICE_UNAVAILABLE,
                message: format!("batch {attempt} unavailable"),
            });
        }
        Ok(())
    }
}
