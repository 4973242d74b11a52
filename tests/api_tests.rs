//! HTTP API tests driven through the router without a socket.

use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use chrono::NaiveDate;
use keydate_sync::api::{API_PREFIX, ApiState, build_router};
use keydate_sync::db::Database;
use keydate_sync::source::{SourceBaseline, SourceProject, SourceReader, SourceTask};
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;
use uuid::Uuid;

fn sample_source() -> Vec<SourceProject> {
    let ts = |d: u32| {
        NaiveDate::from_ymd_opt(2024, 11, d)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap()
    };
    let task = SourceTask::new(Uuid::from_u128(100), "Acceptance", ts(4), ts(6)).with_key_date("SAT");
    vec![
        SourceProject::new(Uuid::from_u128(1), "Pumping station")
            .with_task(task.clone())
            .with_baseline(SourceBaseline::new(0, ts(1), task)),
    ]
}

fn setup(source: Vec<SourceProject>) -> (Database, axum::Router) {
    let db = Database::open_in_memory().expect("Failed to create in-memory database");
    let reader: Arc<dyn SourceReader> = Arc::new(source);
    let router = build_router(ApiState::new(reader, db.clone()));
    (db, router)
}

async fn get(router: &axum::Router, path: &str) -> (StatusCode, Value) {
    let response = router
        .clone()
        .oneshot(
            Request::builder()
                .uri(format!("{}{}", API_PREFIX, path))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

#[tokio::test]
async fn ping_reports_version() {
    let (_, router) = setup(vec![]);
    let (status, body) = get(&router, "/ping/").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn migrate_then_read_back() {
    let (db, router) = setup(sample_source());

    let (status, report) = get(&router, "/migrate/").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["created"], 1);
    assert_eq!(report["failed"].as_array().unwrap().len(), 0);
    assert_eq!(db.table_counts().unwrap().key_dates, 1);

    let (status, projects) = get(&router, "/project/").await;
    assert_eq!(status, StatusCode::OK);
    let projects = projects.as_array().unwrap();
    assert_eq!(projects.len(), 1);
    assert_eq!(projects[0]["name"], "Pumping station");
    assert_eq!(projects[0]["base_plans"][0]["versions"].as_array().unwrap().len(), 1);

    let id = projects[0]["id"].as_i64().unwrap();
    let (status, plans) = get(&router, &format!("/baselines/?project_id={}", id)).await;
    assert_eq!(status, StatusCode::OK);
    let plan = &plans[0];
    assert_eq!(plan["base_number"], 0);
    assert_eq!(plan["created_at"], "2024-11-01");
    assert_eq!(plan["tasks"][0]["name"], "SAT");
    assert_eq!(plan["versions"][0]["tasks"][0]["task_name"], "Acceptance");
}

#[tokio::test]
async fn migrate_failure_returns_500_with_report() {
    let mut source = sample_source();
    source[0].tasks[0].start_date = None;
    if let Some(task) = source[0].baselines[0].task.as_mut() {
        task.start_date = None;
    }
    let (_, router) = setup(source);

    let (status, report) = get(&router, "/migrate/").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(report["failed"][0]["uuid"], Uuid::from_u128(1).to_string());
}

#[tokio::test]
async fn unknown_project_is_404() {
    let (_, router) = setup(vec![]);
    let (status, body) = get(&router, "/baselines/?project_id=42").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "PROJECT_NOT_FOUND");
}

#[tokio::test]
async fn unknown_route_is_404_with_error_body() {
    let (_, router) = setup(vec![]);
    let (status, body) = get(&router, "/nope/").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NOT_FOUND_API");
}

#[tokio::test]
async fn cors_allows_local_frontend() {
    let (_, router) = setup(vec![]);
    let response = router
        .oneshot(
            Request::builder()
                .uri(format!("{}/ping/", API_PREFIX))
                .header(header::ORIGIN, "http://localhost:8080")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(
        response.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
        "http://localhost:8080"
    );
}
