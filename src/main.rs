use stats_cloudwatch::config::Config;
use stats_cloudwatch::{CloudWatchClient, Exporter, TracingSink, relay};
use tokio::io::BufReader;
use tracing::{error, info};

/// Exceptional init failure: log and exit.
fn fatal(msg: &str, error: &dyn std::fmt::Display) -> ! {
    error!(%error, "{msg}");
    std::process::exit(1);
}

fn setup_logging() {
    use tracing_subscriber::filter::LevelFilter;
    use tracing_subscriber::prelude::*;

    let level = std::env::var("STATS_CLOUDWATCH_LOG_LEVEL")
        .ok()
        .and_then(|val| {
            val.parse::<LevelFilter>().ok().or_else(|| {
                eprintln!("invalid STATS_CLOUDWATCH_LOG_LEVEL: {val:?}, defaulting to WARN");
                None
            })
        })
        .unwrap_or(LevelFilter::WARN);

    tracing_subscriber::registry()
        .with(level)
        .with(tracing_microjson::JsonLayer::new(std::io::stderr).with_target(true))
        .init();
}

fn setup_rustls() {
    if rustls::crypto::ring::default_provider()
        .install_default()
        .is_err()
    {
        fatal("failed to install rustls ring provider", &"provider already set");
    }
}

#[tokio::main]
async fn main() {
    setup_logging();
    setup_rustls();

    let config = Config::from_env().unwrap_or_else(|e| fatal("config error", &e));
    let client =
        CloudWatchClient::new(&config).unwrap_or_else(|e| fatal("failed to build client", &e));
    let exporter = Exporter::new(client, config.namespace.as_str()).with_sink(TracingSink);

    info!(
        namespace = exporter.namespace(),
        endpoint = %config.endpoint,
        "relaying measurements from stdin"
    );

    if let Err(e) = relay::run(
        BufReader::new(tokio::io::stdin()),
        &exporter,
        config.flush_interval,
    )
    .await
    {
        fatal("failed to read measurements", &e);
    }
}
