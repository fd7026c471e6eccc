mod support;

use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{TimeZone, Utc};
use stats_cloudwatch::{BATCH_LIMIT, Exporter, FieldValue, MeasurementEvent, StandardUnit};

use support::FakeApi;

fn mixed_events() -> Vec<MeasurementEvent> {
    vec![
        MeasurementEvent::new("app.server.http")
            .with_tag("host", "a")
            .with_field("requests", 5i64)
            .with_field("latency", Duration::from_millis(120)),
        MeasurementEvent::new("func.calls")
            .with_field("count", 1u64)
            .with_field("time", Duration::from_millis(250)),
        MeasurementEvent::new("idle.tick"),
        MeasurementEvent::new("user")
            .with_tag("region", "us-east-2")
            .with_field("login", FieldValue::Null)
            .with_field("ok", true)
            .with_field("ratio", 0.75),
    ]
}

#[tokio::test]
async fn translates_mixed_events() {
    let ts = Utc.with_ymd_and_hms(2021, 1, 2, 3, 4, 5).unwrap();
    let exporter = Exporter::new(FakeApi::default(), "integration");

    exporter.export(ts, &mixed_events()).await;

    let calls = exporter.api().calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].0, "integration");

    let summary: Vec<(&str, f64, Option<StandardUnit>)> = calls[0]
        .1
        .iter()
        .map(|d| (d.metric_name.as_str(), d.value, d.unit))
        .collect();
    assert_eq!(
        summary,
        [
            ("http.requests", 5.0, None),
            ("http.latency", 120.0, Some(StandardUnit::Milliseconds)),
            ("calls.count", 1.0, None),
            ("calls.time", 250.0, Some(StandardUnit::Milliseconds)),
            ("user.login", 0.0, None),
            ("user.ok", 1.0, None),
            ("user.ratio", 0.75, None),
        ]
    );
    assert!(calls[0].1.iter().all(|d| d.timestamp == ts));
    assert_eq!(calls[0].1[4].dimensions[0].value, "us-east-2");
}

#[tokio::test]
async fn second_of_three_batches_fails() {
    let reports = Arc::new(Mutex::new(Vec::<String>::new()));
    let sink_reports = Arc::clone(&reports);
    let exporter = Exporter::new(FakeApi::failing_on(&[2]), "integration")
        .with_sink(move |msg: &str| sink_reports.lock().unwrap().push(msg.to_owned()));

    let events: Vec<MeasurementEvent> = (0..2 * BATCH_LIMIT + 1)
        .map(|i| MeasurementEvent::new("a.b.c").with_field(format!("f{i}"), i as i64))
        .collect();
    exporter.export(Utc::now(), &events).await;

    let calls = exporter.api().calls();
    let sizes: Vec<usize> = calls.iter().map(|(_, b)| b.len()).collect();
    assert_eq!(sizes, [BATCH_LIMIT, BATCH_LIMIT, 1], "all three batches attempted");

    let reports = reports.lock().unwrap();
    assert_eq!(reports.len(), 1, "exactly one failure reported");
    assert!(reports[0].contains("batch 2 unavailable"), "report: {}", reports[0]);
}
