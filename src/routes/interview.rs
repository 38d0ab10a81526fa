use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    Extension,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::interview_dto::{
        EditInterviewPayload, FeedbackResponse, InterviewResponse, ScheduleInterviewPayload,
        SubmitFeedbackPayload,
    },
    dto::round_dto::VersionQuery,
    error::Result,
    middleware::auth::Claims,
    AppState,
};

#[utoipa::path(
    post,
    path = "/api/rounds/{id}/interviews",
    params(("id" = Uuid, Path, description = "Round ID")),
    request_body = ScheduleInterviewPayload,
    responses(
        (status = 201, description = "Interview scheduled", body = InterviewResponse),
        (status = 400, description = "Round type does not carry interviews"),
        (status = 403, description = "Gating rule failed")
    )
)]
#[axum::debug_handler]
pub async fn schedule_interview(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ScheduleInterviewPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let role = claims.role()?;
    let interview = state
        .interview_service
        .schedule_interview(id, role, payload)
        .await?;
    let now = state.clock_now();
    Ok((
        StatusCode::CREATED,
        Json(InterviewResponse::from_interview(interview, now)),
    ))
}

#[utoipa::path(
    patch,
    path = "/api/interviews/{id}",
    params(("id" = Uuid, Path, description = "Interview ID")),
    request_body = EditInterviewPayload,
    responses(
        (status = 200, description = "Interview updated", body = InterviewResponse),
        (status = 409, description = "Interview completed or stale version")
    )
)]
#[axum::debug_handler]
pub async fn edit_interview(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
    Json(payload): Json<EditInterviewPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let role = claims.role()?;
    let interview = state
        .interview_service
        .edit_interview(id, role, payload)
        .await?;
    let now = state.clock_now();
    Ok(Json(InterviewResponse::from_interview(interview, now)))
}

#[utoipa::path(
    delete,
    path = "/api/interviews/{id}",
    params(
        ("id" = Uuid, Path, description = "Interview ID"),
        ("version" = i64, Query, description = "Caller's last-seen application version")
    ),
    responses(
        (status = 204, description = "Interview deleted"),
        (status = 409, description = "Interview completed or stale version")
    )
)]
#[axum::debug_handler]
pub async fn delete_interview(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
    Query(query): Query<VersionQuery>,
) -> Result<impl IntoResponse> {
    let role = claims.role()?;
    state
        .interview_service
        .delete_interview(id, role, query.version)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/api/interviews/{id}/feedback",
    params(("id" = Uuid, Path, description = "Interview ID")),
    request_body = SubmitFeedbackPayload,
    responses(
        (status = 200, description = "Feedback recorded for the interviewer", body = FeedbackResponse),
        (status = 403, description = "Caller is not an assigned interviewer"),
        (status = 409, description = "Round result recorded; feedback closed")
    )
)]
#[axum::debug_handler]
pub async fn submit_feedback(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
    Json(payload): Json<SubmitFeedbackPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let role = claims.role()?;
    let record = state
        .interview_service
        .submit_feedback(id, role, payload)
        .await?;
    let response = FeedbackResponse::try_from(record).map_err(crate::error::Error::from)?;
    Ok(Json(response))
}

#[utoipa::path(
    post,
    path = "/api/interviews/{id}/finalize",
    params(("id" = Uuid, Path, description = "Interview ID")),
    responses(
        (status = 200, description = "Completion persisted (idempotent)", body = InterviewResponse),
        (status = 400, description = "Interview end time has not passed")
    )
)]
#[axum::debug_handler]
pub async fn finalize_completion(
    State(state): State<AppState>,
    Extension(_claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let interview = state.interview_service.finalize_completion(id).await?;
    let now = state.clock_now();
    Ok(Json(InterviewResponse::from_interview(interview, now)))
}
