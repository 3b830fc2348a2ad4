use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::post,
    Json, Router,
};
use exam_session::engine::modality::ModalityKind;
use exam_session::error::Error;
use exam_session::models::question_time::QuestionTimeRecord;
use exam_session::models::test_attempt::AttemptStatus;
use exam_session::services::attempt_service::{AttemptService, HttpAttemptService};
use serde_json::{json, Value as JsonValue};
use tokio::net::TcpListener;
use uuid::Uuid;

type Received = Arc<Mutex<Vec<(String, JsonValue)>>>;

async fn start_attempt(Path(test_id): Path<Uuid>) -> impl IntoResponse {
    Json(json!({
        "success": true,
        "data": {
            "attemptId": "6a1f8e8e-2f5b-4c59-9d0c-0d8a3f4e1b11",
            "studentId": "0c2e5b1a-7d3f-4f0e-8a55-3b9c1d2e4f60",
            "attemptNumber": 1,
            "startTime": "2026-03-02T09:00:00Z",
            "status": "in_progress",
            "totalTimeSpent": 90,
            "test": {
                "testId": test_id,
                "title": "Academic Reading 3",
                "modality": "reading",
                "durationMinutes": 60,
                "questions": [
                    { "questionId": 1, "questionNumber": 1, "answer": "TRUE" },
                    { "questionId": 2, "questionNumber": 2 }
                ]
            }
        }
    }))
}

async fn record(
    State(received): State<Received>,
    Path((id, action)): Path<(Uuid, String)>,
    body: Option<Json<JsonValue>>,
) -> impl IntoResponse {
    let body = body.map(|Json(v)| v).unwrap_or(JsonValue::Null);
    received
        .lock()
        .unwrap()
        .push((format!("{}/{}", id, action), body));

    match action.as_str() {
        "lost-focus" => (
            StatusCode::TOO_MANY_REQUESTS,
            Json(json!({
                "success": false,
                "error": { "code": "rate_limited", "message": "Too many reports" }
            })),
        )
            .into_response(),
        "submit" => (StatusCode::SERVICE_UNAVAILABLE, "maintenance window").into_response(),
        _ => Json(json!({ "success": true })).into_response(),
    }
}

async fn spawn_upstream() -> (HttpAttemptService, Received) {
    let received: Received = Arc::default();
    let app = Router::new()
        .route("/api/v1/tests/:test_id/attempts", post(start_attempt))
        .route("/api/v1/attempts/:id/:action", post(record))
        .with_state(received.clone());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let client =
        HttpAttemptService::new(&format!("http://{}/api/v1", addr), Duration::from_secs(5))
            .unwrap();
    (client, received)
}

#[tokio::test]
async fn start_attempt_reads_the_envelope() {
    let (client, _) = spawn_upstream().await;
    let test_id = Uuid::new_v4();

    let attempt = client.start_attempt(test_id).await.unwrap();

    assert_eq!(attempt.status, AttemptStatus::InProgress);
    assert_eq!(attempt.total_time_spent, 90);
    assert_eq!(attempt.test.test_id, test_id);
    assert_eq!(attempt.test.modality, ModalityKind::Reading);
    assert_eq!(attempt.test.duration_minutes, 60);
    assert_eq!(attempt.test.questions.len(), 2);
    assert!(!attempt.is_finalized());
}

#[tokio::test]
async fn progress_and_question_time_are_posted_in_camel_case() {
    let (client, received) = spawn_upstream().await;
    let attempt_id = Uuid::new_v4();

    client.save_progress(attempt_id, 30).await.unwrap();
    client
        .save_question_time(QuestionTimeRecord {
            attempt_id,
            question_id: 5,
            answer: "C".into(),
            time_spent_seconds: 3,
        })
        .await
        .unwrap();

    let received = received.lock().unwrap().clone();
    assert_eq!(received[0].0, format!("{}/progress", attempt_id));
    assert_eq!(received[0].1, json!({ "deltaSeconds": 30 }));
    assert_eq!(received[1].0, format!("{}/question-time", attempt_id));
    assert_eq!(
        received[1].1,
        json!({ "questionId": 5, "answer": "C", "timeSpentSeconds": 3 })
    );
}

#[tokio::test]
async fn failure_envelope_keeps_its_code() {
    let (client, _) = spawn_upstream().await;

    let err = client.report_lost_focus(Uuid::new_v4()).await.unwrap_err();

    match err {
        Error::Upstream { code, message } => {
            assert_eq!(code, "rate_limited");
            assert_eq!(message, "Too many reports");
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn plain_error_body_maps_to_http_status_code() {
    let (client, _) = spawn_upstream().await;

    let err = client.submit_attempt(Uuid::new_v4()).await.unwrap_err();

    assert!(matches!(err, Error::Upstream { ref code, .. } if code == "http_503"));
}

#[tokio::test]
async fn unreachable_service_is_a_transport_error() {
    let client = HttpAttemptService::new("http://127.0.0.1:1/api", Duration::from_secs(2)).unwrap();
    let err = client.save_progress(Uuid::new_v4(), 30).await.unwrap_err();
    assert!(matches!(err, Error::Reqwest(_)));
}
