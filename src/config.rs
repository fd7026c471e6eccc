use std::collections::HashMap;
use std::env;
use std::time::Duration;

use aws_credential_types::Credentials;
use thiserror::Error;
use url::Url;

const PREFIX: &str = "STATS_CLOUDWATCH_";

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Compression {
    Gzip,
    None,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("STATS_CLOUDWATCH_NAMESPACE is required but not set")]
    NamespaceMissing,

    #[error("no region set (STATS_CLOUDWATCH_REGION, AWS_REGION or AWS_DEFAULT_REGION)")]
    RegionMissing,

    #[error("{0} is required but not set")]
    CredentialsMissing(&'static str),

    #[error("STATS_CLOUDWATCH_ENDPOINT is not a valid URL: {0}")]
    EndpointInvalidUrl(String),

    #[error("{0} has invalid value: {1}")]
    InvalidNumeric(String, String),

    #[error("STATS_CLOUDWATCH_COMPRESSION has invalid value: {0} (expected \"gzip\" or \"none\")")]
    InvalidCompression(String),
}

#[derive(Debug)]
pub struct Config {
    pub namespace: String,
    pub region: String,
    pub endpoint: Url,
    pub credentials: Credentials,
    pub export_timeout: Duration,
    pub compression: Compression,
    pub flush_interval: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let vars: HashMap<String, String> = env::vars()
            .filter(|(k, _)| k.starts_with(PREFIX) || k.starts_with("AWS_"))
            .collect();
        Self::parse(&vars)
    }

    fn parse(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let namespace = non_empty(vars, "STATS_CLOUDWATCH_NAMESPACE")
            .ok_or(ConfigError::NamespaceMissing)?
            .to_owned();
        let region = parse_region(vars)?;
        let endpoint = parse_endpoint(vars, &region)?;
        let credentials = parse_credentials(vars)?;
        let export_timeout =
            parse_duration_ms(vars, "STATS_CLOUDWATCH_EXPORT_TIMEOUT_MS", 5000, false)?;
        let compression = parse_compression(vars)?;
        let flush_interval =
            parse_duration_ms(vars, "STATS_CLOUDWATCH_FLUSH_INTERVAL_MS", 60_000, true)?;

        Ok(Self {
            namespace,
            region,
            endpoint,
            credentials,
            export_timeout,
            compression,
            flush_interval,
        })
    }
}

fn non_empty<'a>(vars: &'a HashMap<String, String>, name: &str) -> Option<&'a str> {
    vars.get(name).map(|s| s.as_str()).filter(|s| !s.is_empty())
}

fn parse_region(vars: &HashMap<String, String>) -> Result<String, ConfigError> {
    ["STATS_CLOUDWATCH_REGION", "AWS_REGION", "AWS_DEFAULT_REGION"]
        .iter()
        .find_map(|name| non_empty(vars, name))
        .map(str::to_owned)
        .ok_or(ConfigError::RegionMissing)
}

fn parse_endpoint(vars: &HashMap<String, String>, region: &str) -> Result<Url, ConfigError> {
    match non_empty(vars, "STATS_CLOUDWATCH_ENDPOINT") {
        Some(raw) => Url::parse(raw).map_err(|_| ConfigError::EndpointInvalidUrl(raw.to_owned())),
        None => {
            let raw = format!("https://monitoring.{region}.amazonaws.com/");
            Url::parse(&raw).map_err(|_| ConfigError::EndpointInvalidUrl(raw))
        }
    }
}

fn parse_credentials(vars: &HashMap<String, String>) -> Result<Credentials, ConfigError> {
    let access_key = non_empty(vars, "AWS_ACCESS_KEY_ID")
        .ok_or(ConfigError::CredentialsMissing("AWS_ACCESS_KEY_ID"))?;
    let secret_key = non_empty(vars, "AWS_SECRET_ACCESS_KEY")
        .ok_or(ConfigError::CredentialsMissing("AWS_SECRET_ACCESS_KEY"))?;
    let session_token = non_empty(vars, "AWS_SESSION_TOKEN").map(str::to_owned);

    Ok(Credentials::new(
        access_key,
        secret_key,
        session_token,
        None,
        "environment",
    ))
}

fn parse_duration_ms(
    vars: &HashMap<String, String>,
    name: &str,
    default_ms: u64,
    require_positive: bool,
) -> Result<Duration, ConfigError> {
    match vars.get(name) {
        Some(val) => {
            let ms: u64 = val
                .parse()
                .map_err(|_| ConfigError::InvalidNumeric(name.to_owned(), val.clone()))?;
            if require_positive && ms == 0 {
                return Err(ConfigError::InvalidNumeric(name.to_owned(), val.clone()));
            }
            Ok(Duration::from_millis(ms))
        }
        None => Ok(Duration::from_millis(default_ms)),
    }
}

fn parse_compression(vars: &HashMap<String, String>) -> Result<Compression, ConfigError> {
    match vars
        .get("STATS_CLOUDWATCH_COMPRESSION")
        .map(|s| s.as_str())
    {
        Some("none") | None => Ok(Compression::None),
        Some("gzip") => Ok(Compression::Gzip),
        Some(other) => Err(ConfigError::InvalidCompression(other.to_owned())),
    }
}
