use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    Extension,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::application_dto::{
        ApplicationDetailResponse, ApplicationListQuery, ApplicationListResponse,
        ApplicationResponse, DocumentVerificationPayload, HoldTogglePayload,
        MatchingScorePayload, MatchingTriggerPayload, SubmitApplicationPayload, TransitionPayload,
    },
    error::Result,
    middleware::auth::Claims,
    AppState,
};

#[utoipa::path(
    post,
    path = "/api/applications",
    request_body = SubmitApplicationPayload,
    responses(
        (status = 201, description = "Application submitted with status pending", body = ApplicationResponse),
        (status = 400, description = "Duplicate candidate/position pair")
    )
)]
#[axum::debug_handler]
pub async fn submit_application(
    State(state): State<AppState>,
    Extension(_claims): Extension<Claims>,
    Json(payload): Json<SubmitApplicationPayload>,
) -> Result<impl IntoResponse> {
    let application = state
        .application_service
        .submit(payload.candidate_id, payload.position_id)
        .await?;
    Ok((StatusCode::CREATED, Json(ApplicationResponse::from(application))))
}

#[utoipa::path(
    get,
    path = "/api/applications",
    params(
        ("candidate_id" = Option<Uuid>, Query, description = "Filter by candidate"),
        ("position_id" = Option<Uuid>, Query, description = "Filter by position"),
        ("status" = Option<String>, Query, description = "Filter by status"),
        ("page" = Option<i64>, Query, description = "Page number"),
        ("limit" = Option<i64>, Query, description = "Items per page")
    ),
    responses(
        (status = 200, description = "Paged list of applications", body = ApplicationListResponse)
    )
)]
#[axum::debug_handler]
pub async fn list_applications(
    State(state): State<AppState>,
    Extension(_claims): Extension<Claims>,
    Query(query): Query<ApplicationListQuery>,
) -> Result<impl IntoResponse> {
    let (page, limit, _) = crate::services::application_service::page_window(query.page, query.limit);
    let (items, total) = state.application_service.list(query).await?;
    Ok(Json(ApplicationListResponse {
        items: items.into_iter().map(ApplicationResponse::from).collect(),
        total,
        page,
        limit,
    }))
}

#[utoipa::path(
    get,
    path = "/api/applications/{id}",
    params(("id" = Uuid, Path, description = "Application ID")),
    responses(
        (status = 200, description = "Application with ordered rounds and nested interviews", body = ApplicationDetailResponse),
        (status = 404, description = "Application not found")
    )
)]
#[axum::debug_handler]
pub async fn get_application(
    State(state): State<AppState>,
    Extension(_claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let detail = state.application_service.get_detail(id).await?;
    Ok(Json(detail))
}

#[utoipa::path(
    post,
    path = "/api/applications/{id}/transition",
    params(("id" = Uuid, Path, description = "Application ID")),
    request_body = TransitionPayload,
    responses(
        (status = 200, description = "Status transition applied", body = ApplicationResponse),
        (status = 409, description = "Illegal edge, incomplete rounds or stale version")
    )
)]
#[axum::debug_handler]
pub async fn transition_application(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
    Json(payload): Json<TransitionPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let role = claims.role()?;
    let application = state.application_service.transition(id, role, payload).await?;
    Ok(Json(ApplicationResponse::from(application)))
}

#[utoipa::path(
    post,
    path = "/api/applications/{id}/hold",
    params(("id" = Uuid, Path, description = "Application ID")),
    request_body = HoldTogglePayload,
    responses(
        (status = 200, description = "Hold state flipped", body = ApplicationResponse),
        (status = 409, description = "Application is terminal or not in a holdable status")
    )
)]
#[axum::debug_handler]
pub async fn hold_toggle(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
    Json(payload): Json<HoldTogglePayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let role = claims.role()?;
    let application = state
        .application_service
        .hold_toggle(id, role, payload.reason, payload.version)
        .await?;
    Ok(Json(ApplicationResponse::from(application)))
}

#[utoipa::path(
    post,
    path = "/api/applications/{id}/document-verification",
    params(("id" = Uuid, Path, description = "Application ID")),
    request_body = DocumentVerificationPayload,
    responses(
        (status = 200, description = "Application moved to document verification", body = ApplicationResponse),
        (status = 409, description = "Not all rounds passed or stale version")
    )
)]
#[axum::debug_handler]
pub async fn move_to_document_verification(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
    Json(payload): Json<DocumentVerificationPayload>,
) -> Result<impl IntoResponse> {
    let role = claims.role()?;
    let application = state
        .application_service
        .move_to_document_verification(id, role, payload.version)
        .await?;
    Ok(Json(ApplicationResponse::from(application)))
}

#[utoipa::path(
    post,
    path = "/api/applications/{id}/matching",
    params(("id" = Uuid, Path, description = "Application ID")),
    request_body = MatchingTriggerPayload,
    responses(
        (status = 202, description = "Scoring run triggered on the external matching service"),
        (status = 404, description = "Application not found")
    )
)]
#[axum::debug_handler]
pub async fn trigger_matching(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
    Json(payload): Json<MatchingTriggerPayload>,
) -> Result<impl IntoResponse> {
    let role = claims.role()?;
    if !crate::policy::can_manage_status(role) {
        return Err(crate::error::Error::Forbidden(
            "matching triggers require admin or hr role".to_string(),
        ));
    }
    let application = state.application_service.get_by_id(id).await?;
    state
        .matching_service
        .trigger(application.position_id, payload.threshold_score)
        .await?;
    Ok(StatusCode::ACCEPTED)
}

#[utoipa::path(
    post,
    path = "/api/applications/{id}/matching-score",
    params(("id" = Uuid, Path, description = "Application ID")),
    request_body = MatchingScorePayload,
    responses(
        (status = 200, description = "Matching score recorded", body = ApplicationResponse),
        (status = 404, description = "Application not found")
    )
)]
#[axum::debug_handler]
pub async fn record_matching_score(
    State(state): State<AppState>,
    Extension(_claims): Extension<Claims>,
    Path(id): Path<Uuid>,
    Json(payload): Json<MatchingScorePayload>,
) -> Result<impl IntoResponse> {
    let application = state
        .application_service
        .record_matching_score(id, payload.score)
        .await?;
    Ok(Json(ApplicationResponse::from(application)))
}
