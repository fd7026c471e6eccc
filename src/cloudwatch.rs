use std::future::Future;
use std::io::Write;
use std::time::SystemTime;

use aws_credential_types::Credentials;
use aws_sigv4::http_request::{SignableBody, SignableRequest, SigningSettings, sign};
use aws_sigv4::sign::v4;
use chrono::SecondsFormat;
use flate2::write::GzEncoder;
use reqwest::Client;
use thiserror::Error;
use url::Url;
use url::form_urlencoded;

use crate::config::{Compression, Config};
use crate::datum::Datum;

const SIGNING_NAME: &str = "monitoring";
const API_VERSION: &str = "2010-08-01";
const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded; charset=utf-8";

/// Batched ingestion into the metrics backend.
pub trait MetricsApi {
    fn put_metric_data(
        &self,
        namespace: &str,
        batch: &[Datum],
    ) -> impl Future<Output = Result<(), ApiError>> + Send;
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("CloudWatch rejected batch: HTTP {status}: {message}")]
    Rejected {
        status: reqwest::StatusCode,
        message: String,
    },

    #[error("request signing failed: {0}")]
    Signing(String),

    #[error("gzip compression failed: {0}")]
    Compression(#[from] std::io::Error),
}

pub struct CloudWatchClient {
    client: Client,
    endpoint: Url,
    region: String,
    credentials: Credentials,
    compression: Compression,
}

impl CloudWatchClient {
    pub fn new(config: &Config) -> Result<Self, ApiError> {
        let client = Client::builder().timeout(config.export_timeout).build()?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            region: config.region.clone(),
            credentials: config.credentials.clone(),
            compression: config.compression,
        })
    }

    /// Sign a POST of `body` and return the headers to attach, including the
    /// ones passed in.
    fn signed_headers(
        &self,
        headers: &[(&str, &str)],
        body: &[u8],
    ) -> Result<Vec<(String, String)>, ApiError> {
        let identity = self.credentials.clone().into();
        let params = v4::SigningParams::builder()
            .identity(&identity)
            .region(&self.region)
            .name(SIGNING_NAME)
            .time(SystemTime::now())
            .settings(SigningSettings::default())
            .build()
            .map_err(|e| ApiError::Signing(e.to_string()))?
            .into();

        let signable = SignableRequest::new(
            "POST",
            self.endpoint.as_str(),
            headers.iter().copied(),
            SignableBody::Bytes(body),
        )
        .map_err(|e| ApiError::Signing(e.to_string()))?;

        let (instructions, _signature) = sign(signable, &params)
            .map_err(|e| ApiError::Signing(e.to_string()))?
            .into_parts();

        let mut signed: Vec<(String, String)> = headers
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        signed.extend(
            instructions
                .headers()
                .map(|(k, v)| (k.to_owned(), v.to_owned())),
        );
        Ok(signed)
    }
}

impl MetricsApi for CloudWatchClient {
    async fn put_metric_data(&self, namespace: &str, batch: &[Datum]) -> Result<(), ApiError> {
        let form = encode_put_metric_data(namespace, batch);

        let (body, headers): (Vec<u8>, Vec<(&str, &str)>) = match self.compression {
            Compression::Gzip => (
                compress_gzip(form.as_bytes())?,
                vec![
                    ("content-type", FORM_CONTENT_TYPE),
                    ("content-encoding", "gzip"),
                ],
            ),
            Compression::None => (
                form.into_bytes(),
                vec![("content-type", FORM_CONTENT_TYPE)],
            ),
        };

        let mut req = self.client.post(self.endpoint.clone());
        for (k, v) in self.signed_headers(&headers, &body)? {
            req = req.header(k, v);
        }

        let resp = req.body(body).send().await?;
        let status = resp.status();
        if status.is_success() {
            tracing::debug!(namespace, count = batch.len(), "metric batch accepted");
            return Ok(());
        }

        let body = resp.text().await.unwrap_or_default();
        Err(ApiError::Rejected {
            status,
            message: error_message(&body),
        })
    }
}

/// Build the Query API form body for one `PutMetricData` call.
pub fn encode_put_metric_data(namespace: &str, batch: &[Datum]) -> String {
    let mut form = form_urlencoded::Serializer::new(String::new());
    form.append_pair("Action", "PutMetricData")
        .append_pair("Version", API_VERSION)
        .append_pair("Namespace", namespace);

    for (i, datum) in batch.iter().enumerate() {
        let member = format!("MetricData.member.{}", i + 1);
        form.append_pair(&format!("{member}.MetricName"), &datum.metric_name)
            .append_pair(&format!("{member}.Value"), &datum.value.to_string())
            .append_pair(
                &format!("{member}.Timestamp"),
                &datum.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true),
            );
        if let Some(unit) = datum.unit {
            form.append_pair(&format!("{member}.Unit"), unit.as_str());
        }
        for (j, dim) in datum.dimensions.iter().enumerate() {
            let dim_member = format!("{member}.Dimensions.member.{}", j + 1);
            form.append_pair(&format!("{dim_member}.Name"), &dim.name)
                .append_pair(&format!("{dim_member}.Value"), &dim.value);
        }
    }

    form.finish()
}

/// Pull `<Message>` out of an AWS error document, falling back to the raw body.
fn error_message(body: &str) -> String {
    body.split_once("<Message>")
        .and_then(|(_, rest)| rest.split_once("</Message>"))
        .map(|(msg, _)| msg.to_owned())
        .unwrap_or_else(|| body.trim().to_owned())
}

fn compress_gzip(data: &[u8]) -> Result<Vec<u8>, std::io::Error> {
    let mut encoder = GzEncoder::new(Vec::new(), flate2::Compression::fast());
    encoder.write_all(data)?;
    encoder.finish()
}
