//! Log Action Batch Tests
//!
//! Drives whole batches through [`LogActionExecutor`] against the in-memory
//! [`FakeLogsClient`], checking the query lifecycle and discovery actions the
//! way a polling caller sees them: JSON in, per-refId frames or errors out.

use logsdash::app::config::QueryConfig;
use logsdash::app::data_plane::cloudwatch_logs::{
    FakeLogsClient, FieldDescriptor, FieldValues, LogStoreError, QueryResultsPage,
    QueryStatistics, QueryStatus, RecordedCall, ResultField,
};
use logsdash::app::log_actions::{BatchResponse, LogActionBatch, LogActionExecutor};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::sync::Arc;

fn batch(value: serde_json::Value) -> LogActionBatch {
    serde_json::from_value(value).expect("batch JSON should deserialize")
}

async fn run(fake: &Arc<FakeLogsClient>, value: serde_json::Value) -> BatchResponse {
    LogActionExecutor::new(fake.clone())
        .execute_batch(batch(value))
        .await
}

fn string_values(values: &FieldValues) -> Vec<Option<String>> {
    match values {
        FieldValues::String(v) => v.clone(),
        other => panic!("expected string column, got {:?}", other),
    }
}

/// Start a query, then poll it with the returned id.
#[tokio::test]
async fn test_start_query_then_get_results_end_to_end() {
    let fake = Arc::new(FakeLogsClient::new());

    let started = run(
        &fake,
        json!({
            "range": { "from": 1_584_700_000_000_i64, "to": 1_584_703_600_000_i64 },
            "queries": [{
                "refId": "A",
                "subtype": "StartQuery",
                "logGroupNames": ["g"],
                "queryString": "fields @message"
            }]
        }),
    )
    .await;

    let frame = started.get("A").unwrap().frame().unwrap();
    assert_eq!(frame.field_names(), vec!["queryId"]);
    let query_id = string_values(&frame.field("queryId").unwrap().values)[0]
        .clone()
        .unwrap();
    assert!(!query_id.is_empty());

    let polled = run(
        &fake,
        json!({
            "queries": [{ "refId": "A", "subtype": "GetQueryResults", "queryId": query_id }]
        }),
    )
    .await;

    let result = polled.get("A").unwrap();
    assert_eq!(result.error, None);
    let frame = result.frame().unwrap();
    assert!(frame.field("@timestamp").is_some());
    assert!(frame.field("@ptr").is_some());
    assert_eq!(frame.meta.as_ref().unwrap().status, Some(QueryStatus::Complete));

    assert_eq!(
        fake.calls()[1],
        RecordedCall::GetQueryResults("abcd-efgh-ijkl-mnop".to_string())
    );
}

/// The submitted query always starts with the timestamp projection and the
/// window is sent in seconds.
#[tokio::test]
async fn test_start_query_sends_prefixed_query_in_seconds() {
    let fake = Arc::new(FakeLogsClient::new());

    for query in [json!("stats count(*) by bin(5m)"), json!(""), serde_json::Value::Null] {
        run(
            &fake,
            json!({
                "range": { "from": "1584700000000", "to": 1_584_700_060_000_i64 },
                "queries": [{
                    "refId": "A",
                    "subtype": "StartQuery",
                    "logGroupNames": ["g1", "g2"],
                    "queryString": query,
                    "limit": 25
                }]
            }),
        )
        .await;
    }

    let calls = fake.calls();
    assert_eq!(calls.len(), 3);
    for call in calls {
        match call {
            RecordedCall::StartQuery(input) => {
                assert!(input.query_string.starts_with("fields @timestamp |"));
                assert_eq!(input.log_group_names, vec!["g1", "g2"]);
                assert_eq!(input.start_time, 1_584_700_000);
                assert_eq!(input.end_time, 1_584_700_060);
                assert_eq!(input.limit, 25);
            }
            other => panic!("unexpected call {:?}", other),
        }
    }
}

#[tokio::test]
async fn test_start_query_invalid_range_makes_no_remote_call() {
    let fake = Arc::new(FakeLogsClient::new());

    for (from, to) in [("now", "now-1h"), ("now", "now")] {
        let response = run(
            &fake,
            json!({
                "range": { "from": from, "to": to },
                "queries": [{ "refId": "A", "subtype": "StartQuery", "logGroupNames": ["g"] }]
            }),
        )
        .await;

        assert_eq!(
            response.get("A").unwrap().error.as_deref(),
            Some("Invalid time range: Start time must be before end time")
        );
    }

    assert_eq!(fake.call_count(), 0);
}

#[tokio::test]
async fn test_stop_query_not_stoppable_returns_false() {
    let fake = Arc::new(FakeLogsClient::new().fail_stop_query(LogStoreError::new(
        "InvalidParameterException",
        "Query abcd-efgh-ijkl-mnop is not in a stoppable state",
    )));

    let response = run(
        &fake,
        json!({ "queries": [{ "refId": "B", "subtype": "StopQuery", "queryId": "abcd-efgh-ijkl-mnop" }] }),
    )
    .await;

    let result = response.get("B").unwrap();
    assert_eq!(result.error, None);
    let frame = result.frame().unwrap();
    assert_eq!(frame.name, "StopQueryResponse");
    assert_eq!(
        frame.field("success").unwrap().values,
        FieldValues::Boolean(vec![Some(false)])
    );
}

#[tokio::test]
async fn test_stop_query_other_error_propagates() {
    let fake = Arc::new(FakeLogsClient::new().fail_stop_query(LogStoreError::new(
        "AccessDeniedException",
        "User is not authorized to perform: logs:StopQuery",
    )));

    let response = run(
        &fake,
        json!({ "queries": [{ "refId": "B", "subtype": "StopQuery", "queryId": "q" }] }),
    )
    .await;

    let result = response.get("B").unwrap();
    assert!(result.frames.is_empty());
    assert_eq!(
        result.error.as_deref(),
        Some("User is not authorized to perform: logs:StopQuery")
    );
}

#[tokio::test]
async fn test_stop_query_success() {
    let fake = Arc::new(FakeLogsClient::new());

    let response = run(
        &fake,
        json!({ "queries": [{ "refId": "B", "subtype": "StopQuery", "queryId": "q" }] }),
    )
    .await;

    assert_eq!(
        response.get("B").unwrap().frame().unwrap().field("success").unwrap().values,
        FieldValues::Boolean(vec![Some(true)])
    );
    assert_eq!(fake.calls(), vec![RecordedCall::StopQuery("q".to_string())]);
}

/// The frame carries whatever id the store assigned, and a stop the store
/// declines comes back as `success = false`.
#[tokio::test]
async fn test_assigned_query_id_and_declined_stop() {
    let fake = Arc::new(
        FakeLogsClient::new()
            .with_query_id("12ab3456-12ab-123a-789e-1234567890ab")
            .with_stop_success(false),
    );

    let response = run(
        &fake,
        json!({
            "range": { "from": "now-1h", "to": "now" },
            "queries": [
                { "refId": "A", "subtype": "StartQuery", "logGroupNames": ["g"] },
                { "refId": "B", "subtype": "StopQuery", "queryId": "12ab3456-12ab-123a-789e-1234567890ab" }
            ]
        }),
    )
    .await;

    assert_eq!(
        string_values(&response.get("A").unwrap().frame().unwrap().field("queryId").unwrap().values),
        vec![Some("12ab3456-12ab-123a-789e-1234567890ab".to_string())]
    );
    let stop = response.get("B").unwrap();
    assert_eq!(stop.error, None);
    assert_eq!(
        stop.frame().unwrap().field("success").unwrap().values,
        FieldValues::Boolean(vec![Some(false)])
    );
}

#[tokio::test]
async fn test_describe_log_groups_order_and_limit() {
    let fake = Arc::new(FakeLogsClient::new().with_log_groups([
        "/aws/lambda/zeta",
        "/aws/lambda/alpha",
        "/ecs/api",
        "/aws/lambda/mid",
    ]));

    let response = run(
        &fake,
        json!({
            "queries": [
                { "refId": "all", "subtype": "DescribeLogGroups" },
                { "refId": "lambda", "subtype": "DescribeLogGroups", "logGroupNamePrefix": "/aws/lambda", "limit": 2 }
            ]
        }),
    )
    .await;

    let all = response.get("all").unwrap().frame().unwrap();
    assert_eq!(all.name, "logGroups");
    assert_eq!(
        string_values(&all.field("logGroupName").unwrap().values),
        vec![
            Some("/aws/lambda/zeta".to_string()),
            Some("/aws/lambda/alpha".to_string()),
            Some("/ecs/api".to_string()),
            Some("/aws/lambda/mid".to_string()),
        ]
    );

    let lambda = response.get("lambda").unwrap().frame().unwrap();
    assert_eq!(
        string_values(&lambda.field("logGroupName").unwrap().values),
        vec![
            Some("/aws/lambda/zeta".to_string()),
            Some("/aws/lambda/alpha".to_string()),
        ]
    );

    let mut calls = fake.calls();
    calls.sort_by_key(|c| format!("{:?}", c));
    assert_eq!(
        calls,
        vec![
            RecordedCall::DescribeLogGroups {
                name_prefix: None,
                limit: 50
            },
            RecordedCall::DescribeLogGroups {
                name_prefix: Some("/aws/lambda".to_string()),
                limit: 2
            },
        ]
    );
}

#[tokio::test]
async fn test_get_log_group_fields_percent_in_range() {
    let fake = Arc::new(FakeLogsClient::new().with_fields(vec![
        FieldDescriptor::new("@timestamp", 100),
        FieldDescriptor::new("@message", 100),
        FieldDescriptor::new("requestId", 37),
        FieldDescriptor::new("bogus_low", -5),
        FieldDescriptor::new("bogus_high", 250),
    ]));

    let response = run(
        &fake,
        json!({
            "queries": [{
                "refId": "C",
                "subtype": "GetLogGroupFields",
                "logGroupName": "/aws/lambda/api",
                "time": 1_584_700_000
            }]
        }),
    )
    .await;

    let frame = response.get("C").unwrap().frame().unwrap();
    assert_eq!(frame.row_count(), 5);

    match &frame.field("percent").unwrap().values {
        FieldValues::Int64(values) => {
            assert!(values.iter().all(|v| matches!(v, Some(p) if (0..=100).contains(p))));
            assert_eq!(values[2], Some(37));
        }
        other => panic!("expected int64 column, got {:?}", other),
    }

    assert_eq!(
        fake.calls(),
        vec![RecordedCall::GetLogGroupFields {
            log_group_name: "/aws/lambda/api".to_string(),
            time: Some(1_584_700_000),
        }]
    );
}

#[tokio::test]
async fn test_get_query_results_stable_at_terminal_status() {
    let fake = Arc::new(FakeLogsClient::new());
    let poll = json!({
        "queries": [{ "refId": "A", "subtype": "GetQueryResults", "queryId": "abcd-efgh-ijkl-mnop" }]
    });

    let first = run(&fake, poll.clone()).await;
    let second = run(&fake, poll).await;

    let first_meta = first.get("A").unwrap().frame().unwrap().meta.clone().unwrap();
    let second_meta = second.get("A").unwrap().frame().unwrap().meta.clone().unwrap();

    assert!(first_meta.status.unwrap().is_terminal());
    assert_eq!(first_meta.statistics, Some(QueryStatistics::new(512.0, 256.0, 1024.0)));
    assert_eq!(first_meta, second_meta);
    assert_eq!(fake.call_count(), 2);
}

/// Running jobs return partial snapshots; unknown statuses keep polling alive.
#[tokio::test]
async fn test_get_query_results_partial_and_unknown_status() {
    let fake = Arc::new(FakeLogsClient::new().with_results(QueryResultsPage {
        rows: vec![
            vec![
                ResultField::new("@timestamp", "2020-03-20 10:37:23.000"),
                ResultField::new("level", "ERROR"),
            ],
            vec![
                ResultField::new("@timestamp", "2020-03-20 10:37:24.000"),
                ResultField::new("latency", "87"),
            ],
        ],
        statistics: None,
        status: QueryStatus::Unknown,
    }));

    let response = run(
        &fake,
        json!({ "queries": [{ "refId": "A", "subtype": "GetQueryResults", "queryId": "q" }] }),
    )
    .await;

    let frame = response.get("A").unwrap().frame().unwrap();
    assert_eq!(frame.field_names(), vec!["@timestamp", "level", "latency"]);
    assert_eq!(
        string_values(&frame.field("latency").unwrap().values),
        vec![None, Some("87".to_string())]
    );
    let status = frame.meta.as_ref().unwrap().status.unwrap();
    assert_eq!(status, QueryStatus::Unknown);
    assert!(!status.is_terminal());
}

/// One failing refId leaves the others intact.
#[tokio::test]
async fn test_mixed_batch_isolates_failures() {
    let fake = Arc::new(FakeLogsClient::new().fail_describe_log_groups(LogStoreError::new(
        "ThrottlingException",
        "Rate exceeded",
    )));

    let response = run(
        &fake,
        json!({
            "range": { "from": "now-15m", "to": "now" },
            "queries": [
                { "refId": "A", "subtype": "StartQuery", "logGroupNames": ["g"], "queryString": "fields @message" },
                { "refId": "B", "subtype": "DescribeLogGroups" },
                { "refId": "C", "subtype": "GetQueryResults" },
                { "refId": "D", "subtype": "TailLogs" }
            ]
        }),
    )
    .await;

    assert_eq!(response.results.len(), 4);
    assert!(!response.get("A").unwrap().is_error());
    assert_eq!(response.get("B").unwrap().error.as_deref(), Some("Rate exceeded"));
    assert!(response
        .get("C")
        .unwrap()
        .error
        .as_deref()
        .unwrap()
        .starts_with("Invalid parameters for GetQueryResults:"));
    assert_eq!(
        response.get("D").unwrap().error.as_deref(),
        Some("Unrecognized action: 'TailLogs'")
    );
    assert_eq!(response.first_error(), Some(("B", "Rate exceeded")));
}

#[tokio::test]
async fn test_configured_limits_apply() {
    let fake = Arc::new(FakeLogsClient::new());
    let settings = QueryConfig {
        default_limit: 200,
        describe_limit: 1,
        max_concurrency: 1,
        ..QueryConfig::default()
    };
    let executor = LogActionExecutor::with_settings(fake.clone(), settings);

    let response = executor
        .execute_batch(batch(json!({
            "range": { "from": "now-1h", "to": "now" },
            "queries": [
                { "refId": "A", "subtype": "DescribeLogGroups" },
                { "refId": "B", "subtype": "StartQuery", "logGroupNames": ["g"] }
            ]
        })))
        .await;

    assert_eq!(response.get("A").unwrap().frame().unwrap().row_count(), 1);
    assert_eq!(
        fake.calls()[0],
        RecordedCall::DescribeLogGroups {
            name_prefix: None,
            limit: 1
        }
    );
    match &fake.calls()[1] {
        RecordedCall::StartQuery(input) => assert_eq!(input.limit, 200),
        other => panic!("unexpected call {:?}", other),
    }
}
