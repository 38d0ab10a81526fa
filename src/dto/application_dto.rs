use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::models::application::{Application, ApplicationStatus};
use crate::dto::round_dto::RoundDetailResponse;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SubmitApplicationPayload {
    pub candidate_id: Uuid,
    pub position_id: Uuid,
}

/// Every mutation carries the caller's last-seen `version`; a stale value is
/// rejected with a version conflict and never merged.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct TransitionPayload {
    pub target_status: ApplicationStatus,
    #[validate(length(max = 4000))]
    pub feedback: Option<String>,
    pub version: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct HoldTogglePayload {
    #[validate(length(max = 4000))]
    pub reason: Option<String>,
    pub version: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DocumentVerificationPayload {
    pub version: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MatchingTriggerPayload {
    pub threshold_score: Decimal,
}

/// Callback body from the matching service once a scoring run finishes.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MatchingScorePayload {
    pub score: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApplicationResponse {
    pub id: Uuid,
    pub candidate_id: Uuid,
    pub position_id: Uuid,
    pub status: ApplicationStatus,
    pub status_feedback: Option<String>,
    pub hold_reason: Option<String>,
    pub matching_score: Option<Decimal>,
    pub is_shortlisted: bool,
    pub version: i64,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<Application> for ApplicationResponse {
    fn from(app: Application) -> Self {
        let is_shortlisted = app.is_shortlisted();
        Self {
            id: app.id,
            candidate_id: app.candidate_id,
            position_id: app.position_id,
            status: app.status,
            status_feedback: app.status_feedback,
            hold_reason: app.hold_reason,
            matching_score: app.matching_score,
            is_shortlisted,
            version: app.version,
            created_at: app.created_at,
            updated_at: app.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApplicationDetailResponse {
    #[serde(flatten)]
    pub application: ApplicationResponse,
    pub rounds: Vec<RoundDetailResponse>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApplicationListQuery {
    pub candidate_id: Option<Uuid>,
    pub position_id: Option<Uuid>,
    pub status: Option<ApplicationStatus>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ApplicationListResponse {
    pub items: Vec<ApplicationResponse>,
    pub total: i64,
    pub page: i64,
    pub limit: i64,
}
