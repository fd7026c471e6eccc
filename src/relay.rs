use std::io;
use std::time::Duration;

use chrono::Utc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, warn};

use crate::cloudwatch::MetricsApi;
use crate::exporter::Exporter;
use crate::input;
use crate::measure::MeasurementEvent;
use crate::sink::ErrorSink;

/// Read newline-delimited measurements from `reader` and export whatever has
/// accumulated every `flush_interval`. Pending events are exported once more
/// when the input ends.
pub async fn run<R, A, S>(
    mut reader: R,
    exporter: &Exporter<A, S>,
    flush_interval: Duration,
) -> io::Result<()>
where
    R: AsyncBufRead + Unpin,
    A: MetricsApi,
    S: ErrorSink,
{
    let mut buf = Vec::new();
    let mut pending: Vec<MeasurementEvent> = Vec::new();

    let mut ticker = time::interval(flush_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick completes immediately.
    ticker.tick().await;

    loop {
        tokio::select! {
            // `read_until` keeps partial data in `buf` when the tick wins.
            read = reader.read_until(b'\n', &mut buf) => match read {
                Ok(0) => {
                    accept(&buf, &mut pending);
                    break;
                }
                Ok(_) => {
                    accept(&buf, &mut pending);
                    buf.clear();
                }
                Err(e) => {
                    warn!(error = %e, "input read failed");
                    flush(exporter, &mut pending).await;
                    return Err(e);
                }
            },
            _ = ticker.tick() => flush(exporter, &mut pending).await,
        }
    }

    debug!("input closed, exporting remaining measurements");
    flush(exporter, &mut pending).await;
    Ok(())
}

fn accept(line: &[u8], pending: &mut Vec<MeasurementEvent>) {
    match input::parse_line(line) {
        Ok(Some(event)) => pending.push(event),
        Ok(None) => {}
        Err(e) => warn!(error = %e, "skipping measurement"),
    }
}

async fn flush<A, S>(exporter: &Exporter<A, S>, pending: &mut Vec<MeasurementEvent>)
where
    A: MetricsApi,
    S: ErrorSink,
{
    if pending.is_empty() {
        return;
    }
    exporter.export(Utc::now(), pending).await;
    pending.clear();
}
