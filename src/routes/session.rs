use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::session_dto::{
        AnswerChangeRequest, AnswerSavedResponse, FocusChangeRequest, FullscreenAckRequest,
        FullscreenChangeRequest, NoticesResponse, QuestionSummary, SessionStartedResponse,
        StartSessionRequest, SubmitResponse,
    },
    error::Result,
    AppState,
};

#[utoipa::path(
    post,
    path = "/api/sessions",
    request_body = StartSessionRequest,
    responses(
        (status = 201, description = "Attempt started or resumed", body = Json<SessionStartedResponse>),
        (status = 409, description = "Attempt already submitted or already live"),
        (status = 502, description = "Attempt service failure")
    )
)]
#[axum::debug_handler]
pub async fn start_session(
    State(state): State<AppState>,
    Json(payload): Json<StartSessionRequest>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let (handle, test) = state.sessions.start(payload.test_id).await?;
    let session = handle.snapshot().await?;
    let response = SessionStartedResponse {
        session,
        questions: test.questions.iter().map(QuestionSummary::from).collect(),
        structure: test.structure,
    };
    Ok((StatusCode::CREATED, Json(response)))
}

#[utoipa::path(
    get,
    path = "/api/sessions/{id}",
    params(
        ("id" = Uuid, Path, description = "Attempt ID")
    ),
    responses(
        (status = 200, description = "Current session state"),
        (status = 404, description = "Session not found"),
        (status = 410, description = "Session has ended")
    )
)]
#[axum::debug_handler]
pub async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let snapshot = state.sessions.get(id)?.snapshot().await?;
    Ok(Json(snapshot))
}

#[utoipa::path(
    get,
    path = "/api/sessions/{id}/notices",
    params(
        ("id" = Uuid, Path, description = "Attempt ID")
    ),
    responses(
        (status = 200, description = "Notices raised since the last poll", body = Json<NoticesResponse>)
    )
)]
#[axum::debug_handler]
pub async fn drain_notices(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let notices = state.sessions.get(id)?.drain_notices().await?;
    Ok(Json(NoticesResponse { notices }))
}

#[utoipa::path(
    post,
    path = "/api/sessions/{id}/fullscreen/acknowledge",
    params(
        ("id" = Uuid, Path, description = "Attempt ID")
    ),
    request_body = FullscreenAckRequest,
    responses(
        (status = 204, description = "Fullscreen prompt answered")
    )
)]
#[axum::debug_handler]
pub async fn acknowledge_fullscreen(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<FullscreenAckRequest>,
) -> Result<impl IntoResponse> {
    state
        .sessions
        .get(id)?
        .acknowledge_fullscreen(payload.entered)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/api/sessions/{id}/fullscreen",
    params(
        ("id" = Uuid, Path, description = "Attempt ID")
    ),
    request_body = FullscreenChangeRequest,
    responses(
        (status = 204, description = "Fullscreen change recorded")
    )
)]
#[axum::debug_handler]
pub async fn fullscreen_changed(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<FullscreenChangeRequest>,
) -> Result<impl IntoResponse> {
    state
        .sessions
        .get(id)?
        .fullscreen_changed(payload.in_fullscreen)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/api/sessions/{id}/focus",
    params(
        ("id" = Uuid, Path, description = "Attempt ID")
    ),
    request_body = FocusChangeRequest,
    responses(
        (status = 204, description = "Focus change recorded")
    )
)]
#[axum::debug_handler]
pub async fn focus_changed(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<FocusChangeRequest>,
) -> Result<impl IntoResponse> {
    let handle = state.sessions.get(id)?;
    if payload.focused {
        handle.window_focused().await?;
    } else {
        handle.window_blurred().await?;
    }
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    patch,
    path = "/api/sessions/{id}/answers",
    params(
        ("id" = Uuid, Path, description = "Attempt ID")
    ),
    request_body = AnswerChangeRequest,
    responses(
        (status = 200, description = "Answer stored", body = Json<AnswerSavedResponse>),
        (status = 400, description = "Unknown question or oversized value"),
        (status = 409, description = "Fullscreen prompt pending or submission in progress")
    )
)]
#[axum::debug_handler]
pub async fn change_answer(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<AnswerChangeRequest>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let question_id = payload.question_id;
    state
        .sessions
        .get(id)?
        .answer_changed(question_id, payload.value)
        .await?;
    Ok(Json(AnswerSavedResponse {
        saved: true,
        question_id,
    }))
}

#[utoipa::path(
    post,
    path = "/api/sessions/{id}/submit",
    params(
        ("id" = Uuid, Path, description = "Attempt ID")
    ),
    responses(
        (status = 200, description = "Attempt submitted", body = Json<SubmitResponse>),
        (status = 409, description = "A submission is already in flight"),
        (status = 502, description = "Attempt service rejected the submission")
    )
)]
#[axum::debug_handler]
pub async fn submit_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let outcome = state.sessions.get(id)?.submit().await?;
    Ok(Json(SubmitResponse::from(outcome)))
}

#[utoipa::path(
    delete,
    path = "/api/sessions/{id}",
    params(
        ("id" = Uuid, Path, description = "Attempt ID")
    ),
    responses(
        (status = 204, description = "Session closed without submitting"),
        (status = 404, description = "Session not found")
    )
)]
#[axum::debug_handler]
pub async fn dispose_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    state.sessions.dispose(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
