//! End-to-end tests against a local mock of the admin backend.

mod common;

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Form, Path, Query};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;

use internadmin::api::{AdminApi, RetryFetcher, RetryPolicy};
use internadmin::models::{ApplicationStatus, FileSlot, InternshipKind};
use internadmin::viewer::PreviewContent;
use internadmin::workflow::{ActionOutcome, StatusController};

use common::{spawn, test_settings, ScriptedPrompt};

fn fast_policy(max_attempts: u32) -> RetryPolicy {
    RetryPolicy {
        max_attempts,
        base_delay: Duration::from_millis(5),
        max_delay: Duration::from_millis(20),
    }
}

#[tokio::test]
async fn retry_returns_payload_after_server_errors() {
    let hits = Arc::new(AtomicUsize::new(0));
    let counter = hits.clone();
    let app = Router::new().route(
        "/flaky",
        get(move || {
            let counter = counter.clone();
            async move {
                if counter.fetch_add(1, Ordering::SeqCst) < 2 {
                    (StatusCode::INTERNAL_SERVER_ERROR, "boom").into_response()
                } else {
                    Json(json!({"ok": true})).into_response()
                }
            }
        }),
    );
    let addr = spawn(app).await;

    let fetcher = RetryFetcher::new(fast_policy(4));
    let client = reqwest::Client::new();
    let url = format!("http://{addr}/flaky");

    let response = fetcher.execute(|| client.get(&url).send()).await.unwrap();
    assert_eq!(response.status().as_u16(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["ok"], json!(true));
    assert_eq!(hits.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn non_5xx_responses_are_not_retried() {
    let hits = Arc::new(AtomicUsize::new(0));
    let counter = hits.clone();
    let app = Router::new().route(
        "/missing",
        get(move || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                StatusCode::NOT_FOUND
            }
        }),
    );
    let addr = spawn(app).await;

    let fetcher = RetryFetcher::new(fast_policy(4));
    let client = reqwest::Client::new();
    let url = format!("http://{addr}/missing");

    let response = fetcher.execute(|| client.get(&url).send()).await.unwrap();
    assert_eq!(response.status().as_u16(), 404);
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn retry_exhaustion_reraises_the_last_error() {
    let hits = Arc::new(AtomicUsize::new(0));
    let counter = hits.clone();
    let app = Router::new().route(
        "/down",
        get(move || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                (StatusCode::SERVICE_UNAVAILABLE, "maintenance")
            }
        }),
    );
    let addr = spawn(app).await;

    let fetcher = RetryFetcher::new(fast_policy(2));
    let client = reqwest::Client::new();
    let url = format!("http://{addr}/down");

    let err = fetcher.execute(|| client.get(&url).send()).await.unwrap_err();
    match err {
        internadmin::AdminError::Server { status, message } => {
            assert_eq!(status, 503);
            assert_eq!(message, "maintenance");
        }
        other => panic!("expected server error, got {other:?}"),
    }
    assert_eq!(hits.load(Ordering::SeqCst), 2);
}

fn pending_listing(id: i64) -> serde_json::Value {
    json!({
        "success": true,
        "data": [{
            "id": id,
            "name": "Asha Rao",
            "usn": "4SW22CS001",
            "status": "PENDING",
            "resume": "asha_resume.pdf"
        }]
    })
}

#[tokio::test]
async fn accept_conflict_is_a_warning_and_record_stays_pending() {
    let listing_calls = Arc::new(AtomicUsize::new(0));
    let counter = listing_calls.clone();
    let app = Router::new()
        .route(
            "/api/get-internships",
            get(move |Query(params): Query<HashMap<String, String>>| {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    assert_eq!(params.get("type").map(String::as_str), Some("paid"));
                    Json(pending_listing(7))
                }
            }),
        )
        .route(
            "/accept/:id",
            post(|| async {
                (
                    StatusCode::CONFLICT,
                    Json(json!({"success": false, "error": "Duplicate USN"})),
                )
            }),
        );
    let addr = spawn(app).await;

    let api = AdminApi::new(&test_settings(addr)).unwrap();
    let prompt = Arc::new(ScriptedPrompt::default());
    let mut controller = StatusController::new(api, prompt.clone(), InternshipKind::Paid);
    controller.refresh().await.unwrap();

    let outcome = controller.accept(7).await.unwrap();
    assert_eq!(outcome, ActionOutcome::Warned("Duplicate USN".into()));
    assert_eq!(
        controller.record(7).unwrap().status,
        ApplicationStatus::Pending
    );
    // a warning is not a success: no listing refresh happened
    assert_eq!(listing_calls.load(Ordering::SeqCst), 1);
    assert_eq!(prompt.messages("warn"), vec!["Duplicate USN".to_string()]);
}

#[tokio::test]
async fn accept_success_transitions_and_refreshes_the_listing() {
    let listing_calls = Arc::new(AtomicUsize::new(0));
    let counter = listing_calls.clone();
    let app = Router::new()
        .route(
            "/api/get-internships",
            get(move || {
                let counter = counter.clone();
                async move {
                    let n = counter.fetch_add(1, Ordering::SeqCst);
                    if n == 0 {
                        Json(pending_listing(7))
                    } else {
                        Json(json!({
                            "success": true,
                            "data": [{"id": 7, "name": "Asha Rao", "usn": "4SW22CS001", "status": "ACCEPTED"}]
                        }))
                    }
                }
            }),
        )
        .route(
            "/accept/:id",
            post(|Path(id): Path<i64>| async move {
                assert_eq!(id, 7);
                Json(json!({"success": true, "message": "Application accepted!"}))
            }),
        );
    let addr = spawn(app).await;

    let api = AdminApi::new(&test_settings(addr)).unwrap();
    let prompt = Arc::new(ScriptedPrompt::default());
    let mut controller = StatusController::new(api, prompt.clone(), InternshipKind::Free);
    controller.refresh().await.unwrap();

    let outcome = controller.accept(7).await.unwrap();
    assert_eq!(outcome, ActionOutcome::Done("Application accepted!".into()));
    assert_eq!(
        controller.record(7).unwrap().status,
        ApplicationStatus::Accepted
    );
    assert_eq!(listing_calls.load(Ordering::SeqCst), 2);
    assert_eq!(
        prompt.messages("info"),
        vec!["Application accepted!".to_string()]
    );
}

#[tokio::test]
async fn declined_confirmation_sends_nothing() {
    let accept_calls = Arc::new(AtomicUsize::new(0));
    let counter = accept_calls.clone();
    let app = Router::new()
        .route("/api/get-internships", get(|| async { Json(pending_listing(7)) }))
        .route(
            "/accept/:id",
            post(move || {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Json(json!({"success": true, "message": "Application accepted!"}))
                }
            }),
        );
    let addr = spawn(app).await;

    let api = AdminApi::new(&test_settings(addr)).unwrap();
    let prompt = Arc::new(ScriptedPrompt::with_confirms(&[false]));
    let mut controller = StatusController::new(api, prompt, InternshipKind::Free);
    controller.refresh().await.unwrap();

    assert_eq!(controller.accept(7).await.unwrap(), ActionOutcome::Cancelled);
    assert_eq!(accept_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn reject_sends_the_reason_and_reloads_the_listing() {
    let listing_calls = Arc::new(AtomicUsize::new(0));
    let counter = listing_calls.clone();
    let app = Router::new()
        .route(
            "/api/get-internships",
            get(move || {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Json(pending_listing(42))
                }
            }),
        )
        .route(
            "/api/get-rejection-reasons",
            get(|| async {
                Json(json!({
                    "success": true,
                    "reasons": ["Incomplete documents", "Duplicate application"]
                }))
            }),
        )
        .route(
            "/reject/:id",
            post(
                |Path(id): Path<i64>,
                 Query(params): Query<HashMap<String, String>>,
                 Form(form): Form<HashMap<String, String>>| async move {
                    assert_eq!(id, 42);
                    assert_eq!(params.get("type").map(String::as_str), Some("free"));
                    assert_eq!(
                        form.get("reason").map(String::as_str),
                        Some("Incomplete documents")
                    );
                    Json(json!({"success": true, "message": "Application rejected!"}))
                },
            ),
        );
    let addr = spawn(app).await;

    let api = AdminApi::new(&test_settings(addr)).unwrap();
    let prompt = Arc::new(ScriptedPrompt::with_choice(Some(0)));
    let mut controller = StatusController::new(api, prompt.clone(), InternshipKind::Free);
    controller.refresh().await.unwrap();

    let outcome = controller.reject(42).await.unwrap();
    assert_eq!(outcome, ActionOutcome::Done("Application rejected!".into()));
    assert_eq!(
        prompt.messages("info"),
        vec!["Application rejected!".to_string()]
    );
    assert_eq!(listing_calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn url_descriptor_files_preview_through_the_office_viewer() {
    let app = Router::new()
        .route("/api/get-internships", get(|| async { Json(pending_listing(7)) }))
        .route(
            "/api/get-file/:id/:slot",
            get(|Path((id, slot)): Path<(i64, String)>| async move {
                assert_eq!(id, 7);
                assert_eq!(slot, "project");
                Json(json!({
                    "success": true,
                    "file_url": "https://uploads.example.com/projects/plan.docx",
                    "file_name": "plan.docx"
                }))
            }),
        );
    let addr = spawn(app).await;

    let api = AdminApi::new(&test_settings(addr)).unwrap();
    let mut controller =
        StatusController::new(api, Arc::new(ScriptedPrompt::default()), InternshipKind::Free);
    controller.refresh().await.unwrap();

    let mut session = controller.view(7, FileSlot::Project).await.unwrap();
    match session.content() {
        PreviewContent::OfficeFrame { viewer_url } => {
            assert!(viewer_url.starts_with("https://docs.google.com/gview?url="));
        }
        other => panic!("expected office frame, got {other:?}"),
    }
    assert_eq!(
        session.download_url(),
        "https://uploads.example.com/projects/plan.docx?download=1"
    );
    session.close().unwrap();
}

#[tokio::test]
async fn raw_byte_files_preview_from_a_synthesized_resource() {
    let app = Router::new()
        .route("/api/get-internships", get(|| async { Json(pending_listing(7)) }))
        .route(
            "/api/get-file/:id/:slot",
            get(|| async {
                (
                    [
                        (header::CONTENT_TYPE, "application/pdf"),
                        (
                            header::CONTENT_DISPOSITION,
                            r#"attachment; filename="asha_resume.pdf""#,
                        ),
                    ],
                    b"%PDF-1.4 resume body".to_vec(),
                )
            }),
        );
    let addr = spawn(app).await;

    let api = AdminApi::new(&test_settings(addr)).unwrap();
    let mut controller =
        StatusController::new(api, Arc::new(ScriptedPrompt::default()), InternshipKind::Free);
    controller.refresh().await.unwrap();

    let mut session = controller.view(7, FileSlot::Resume).await.unwrap();
    assert!(matches!(session.content(), PreviewContent::PdfEmbed { .. }));
    assert_eq!(session.file_name(), Some("asha_resume.pdf"));

    let path = session.display_path().expect("synthesized resource").to_path_buf();
    assert!(path.exists());
    session.close().unwrap();
    session.close().unwrap();
    assert!(!path.exists());
}
