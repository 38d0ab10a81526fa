use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    Extension,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::round_dto::{
        AddRoundPayload, EditRoundPayload, RecordResultPayload, RoundResponse, VersionQuery,
    },
    error::Result,
    middleware::auth::Claims,
    AppState,
};

#[utoipa::path(
    post,
    path = "/api/applications/{id}/rounds",
    params(("id" = Uuid, Path, description = "Application ID")),
    request_body = AddRoundPayload,
    responses(
        (status = 201, description = "Round added at the next dense sequence", body = RoundResponse),
        (status = 403, description = "Gating rule failed"),
        (status = 409, description = "Sequence gap or stale version")
    )
)]
#[axum::debug_handler]
pub async fn add_round(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
    Json(payload): Json<AddRoundPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let role = claims.role()?;
    let round = state.round_service.add_round(id, role, payload).await?;
    let now = state.clock_now();
    Ok((
        StatusCode::CREATED,
        Json(RoundResponse::from_round(round, now)),
    ))
}

#[utoipa::path(
    patch,
    path = "/api/rounds/{id}",
    params(("id" = Uuid, Path, description = "Round ID")),
    request_body = EditRoundPayload,
    responses(
        (status = 200, description = "Round updated", body = RoundResponse),
        (status = 409, description = "Round completed or stale version")
    )
)]
#[axum::debug_handler]
pub async fn edit_round(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
    Json(payload): Json<EditRoundPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let role = claims.role()?;
    let round = state.round_service.edit_round(id, role, payload).await?;
    let now = state.clock_now();
    Ok(Json(RoundResponse::from_round(round, now)))
}

#[utoipa::path(
    delete,
    path = "/api/rounds/{id}",
    params(
        ("id" = Uuid, Path, description = "Round ID"),
        ("version" = i64, Query, description = "Caller's last-seen application version")
    ),
    responses(
        (status = 204, description = "Round deleted; later sequences shifted down"),
        (status = 409, description = "Round completed or stale version")
    )
)]
#[axum::debug_handler]
pub async fn delete_round(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
    Query(query): Query<VersionQuery>,
) -> Result<impl IntoResponse> {
    let role = claims.role()?;
    state
        .round_service
        .delete_round(id, role, query.version)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/api/rounds/{id}/result",
    params(("id" = Uuid, Path, description = "Round ID")),
    request_body = RecordResultPayload,
    responses(
        (status = 200, description = "Result recorded, write-once", body = RoundResponse),
        (status = 409, description = "Round not yet completed, already decided, or stale version")
    )
)]
#[axum::debug_handler]
pub async fn record_result(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
    Json(payload): Json<RecordResultPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let role = claims.role()?;
    let round = state.round_service.record_result(id, role, payload).await?;
    let now = state.clock_now();
    Ok(Json(RoundResponse::from_round(round, now)))
}
