#![allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::panic,
    clippy::uninlined_format_args
)]

use super::ResultsDb;
use crate::error::ResultsError;
use crate::name::parse_name;
use crate::reconciler::ResultsClient;
use crate::types::{Execution, ListRecordsRequest, ObjectMeta, RunResult, TaskRun};
use serde_json::{json, Value};
use sqlx::postgres::PgPoolOptions;
use uuid::Uuid;

fn required_test_database_url() -> String {
    std::env::var("RESULTS_TEST_DATABASE_URL")
        .ok()
        .or_else(|| std::env::var("DATABASE_URL").ok())
        .unwrap_or_else(|| {
            unreachable!("Set RESULTS_TEST_DATABASE_URL or DATABASE_URL for DB integration tests")
        })
}

async fn test_db() -> ResultsDb {
    let url = required_test_database_url();
    let db = PgPoolOptions::new()
        .max_connections(4)
        .connect(&url)
        .await
        .map(ResultsDb::new_with_pool)
        .unwrap_or_else(|e| unreachable!("Failed to connect test database: {}", e));
    db.initialize_schema()
        .await
        .unwrap_or_else(|e| unreachable!("failed to initialize schema: {}", e));
    db
}

/// Every test writes under its own parent so runs never observe each other.
fn unique_parent() -> String {
    format!("test-{}", Uuid::new_v4().simple())
}

fn execution(name: &str) -> Execution {
    Execution::TaskRun(TaskRun {
        metadata: ObjectMeta {
            namespace: "default".to_string(),
            name: name.to_string(),
            ..ObjectMeta::default()
        },
        spec: json!({"taskRef": {"name": name}}),
        status: Value::Null,
    })
}

#[tokio::test]
#[ignore = "requires RESULTS_TEST_DATABASE_URL or DATABASE_URL"]
async fn created_result_reads_back_with_executions_in_order() {
    let db = test_db().await;
    let parent = unique_parent();

    let created = db
        .create_result(RunResult::new(parent.as_str(), vec![execution("a"), execution("b")]))
        .await
        .unwrap();
    assert!(Uuid::parse_str(&created.id).is_ok());
    assert_eq!(created.name(), format!("{}/results/{}", parent, created.id));
    assert_eq!(created.etag.len(), 64);

    let fetched = db.get_result(&created.name()).await.unwrap();
    assert_eq!(fetched.executions, vec![execution("a"), execution("b")]);
    assert_eq!(fetched.etag, created.etag);
}

#[tokio::test]
#[ignore = "requires RESULTS_TEST_DATABASE_URL or DATABASE_URL"]
async fn missing_result_is_not_found() {
    let db = test_db().await;
    let name = format!("{}/results/{}", unique_parent(), Uuid::new_v4());
    let err = db.get_result(&name).await.unwrap_err();
    assert!(err.is_not_found(), "unexpected error: {err:?}");
}

#[tokio::test]
#[ignore = "requires RESULTS_TEST_DATABASE_URL or DATABASE_URL"]
async fn update_with_current_etag_replaces_records() {
    let db = test_db().await;
    let created = db
        .create_result(RunResult::new(unique_parent(), vec![execution("a")]))
        .await
        .unwrap();

    let mut request = db.get_result(&created.name()).await.unwrap();
    request.executions.push(execution("b"));
    let updated = db
        .update_result(&created.name(), request)
        .await
        .unwrap();
    assert_ne!(updated.etag, created.etag);

    let fetched = db.get_result(&created.name()).await.unwrap();
    assert_eq!(fetched.executions, vec![execution("a"), execution("b")]);
    assert_eq!(fetched.etag, updated.etag);
}

#[tokio::test]
#[ignore = "requires RESULTS_TEST_DATABASE_URL or DATABASE_URL"]
async fn update_with_stale_etag_conflicts() {
    let db = test_db().await;
    let created = db
        .create_result(RunResult::new(unique_parent(), vec![execution("a")]))
        .await
        .unwrap();

    let first = db.get_result(&created.name()).await.unwrap();
    let second = first.clone();
    db.update_result(&created.name(), first).await.unwrap();

    let err = db.update_result(&created.name(), second).await.unwrap_err();
    assert!(matches!(err, ResultsError::Conflict(_)), "unexpected error: {err:?}");

    let fetched = db.get_result(&created.name()).await.unwrap();
    assert_eq!(fetched.executions, vec![execution("a")]);
}

#[tokio::test]
#[ignore = "requires RESULTS_TEST_DATABASE_URL or DATABASE_URL"]
async fn list_records_pages_across_results() {
    let db = test_db().await;
    let parent = unique_parent();
    for name in ["one", "two"] {
        db.create_result(RunResult::new(
            parent.as_str(),
            vec![execution(name), execution(name)],
        ))
        .await
        .unwrap();
    }

    let mut request = ListRecordsRequest {
        parent: format!("{parent}/results/-"),
        page_size: Some(3),
        ..ListRecordsRequest::default()
    };
    let first = db.list_records(&request).await.unwrap();
    assert_eq!(first.records.len(), 3);
    let token = first.next_page_token.clone().unwrap();
    assert_eq!(token, first.records[2].id);

    request.page_token = Some(token);
    let second = db.list_records(&request).await.unwrap();
    assert_eq!(second.records.len(), 1);
    assert!(second.next_page_token.is_none());

    let mut ids: Vec<String> = first
        .records
        .iter()
        .chain(&second.records)
        .map(|record| record.id.clone())
        .collect();
    let listed = ids.clone();
    ids.sort();
    assert_eq!(listed, ids);

    for record in first.records.iter().chain(&second.records) {
        let name = parse_name(&record.name).unwrap();
        assert_eq!(name.parent, parent);
        assert_eq!(name.record, record.id);
        assert_eq!(record.etag.len(), 64);
        assert!(record.data.is_some());
    }
}

#[tokio::test]
#[ignore = "requires RESULTS_TEST_DATABASE_URL or DATABASE_URL"]
async fn list_records_scopes_to_one_result_and_filters_by_name() {
    let db = test_db().await;
    let parent = unique_parent();
    let target = db
        .create_result(RunResult::new(parent.as_str(), vec![execution("a"), execution("b")]))
        .await
        .unwrap();
    db.create_result(RunResult::new(parent.as_str(), vec![execution("c")]))
        .await
        .unwrap();

    let scoped = db
        .list_records(&ListRecordsRequest {
            parent: target.name(),
            ..ListRecordsRequest::default()
        })
        .await
        .unwrap();
    assert_eq!(scoped.records.len(), 2);

    let wanted = scoped.records[0].id.clone();
    let filtered = db
        .list_records(&ListRecordsRequest {
            parent: target.name(),
            filter: Some(wanted[..8].to_string()),
            ..ListRecordsRequest::default()
        })
        .await
        .unwrap();
    assert_eq!(filtered.records.len(), 1);
    assert_eq!(filtered.records[0].id, wanted);
}

#[tokio::test]
async fn list_records_rejects_malformed_parent_before_querying() {
    let db = ResultsDb::connect_lazy("postgres://nobody@127.0.0.1:1/none").unwrap();
    let err = db
        .list_records(&ListRecordsRequest {
            parent: "default/records/x".to_string(),
            ..ListRecordsRequest::default()
        })
        .await
        .unwrap_err();
    assert!(matches!(err, ResultsError::NameParse(_)), "unexpected error: {err:?}");
}
