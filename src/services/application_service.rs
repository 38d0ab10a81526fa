use std::sync::Arc;

use sqlx::PgPool;
use uuid::Uuid;

use crate::database::versioning::claim_application_version;
use crate::dto::application_dto::{
    ApplicationDetailResponse, ApplicationListQuery, ApplicationResponse, TransitionPayload,
};
use crate::dto::interview_dto::{FeedbackResponse, InterviewDetailResponse, InterviewResponse};
use crate::dto::round_dto::{RoundDetailResponse, RoundResponse};
use crate::error::{Error, Result};
use crate::models::application::{Application, ApplicationStatus};
use crate::models::interview::{Interview, InterviewFeedback};
use crate::models::round::Round;
use crate::policy::{self, Role};
use crate::utils::time::Clock;

/// Caps paging input so the offset multiplication stays well inside i64
/// even with hostile query parameters.
pub fn page_window(page: Option<i64>, limit: Option<i64>) -> (i64, i64, i64) {
    let page = page.unwrap_or(1).clamp(1, 1_000_000);
    let limit = limit.unwrap_or(20).clamp(1, 100);
    (page, limit, (page - 1) * limit)
}

/// Owns the application status lifecycle. Every status write validates the
/// transition table against a fresh snapshot and lands as one version-guarded
/// statement, so a rejected precondition never partially mutates anything.
#[derive(Clone)]
pub struct ApplicationService {
    pool: PgPool,
    clock: Arc<dyn Clock>,
}

impl ApplicationService {
    pub fn new(pool: PgPool, clock: Arc<dyn Clock>) -> Self {
        Self { pool, clock }
    }

    pub async fn submit(&self, candidate_id: Uuid, position_id: Uuid) -> Result<Application> {
        let inserted = sqlx::query_as::<_, Application>(
            r#"
            INSERT INTO applications (candidate_id, position_id, status)
            VALUES ($1, $2, 'pending')
            RETURNING *
            "#,
        )
        .bind(candidate_id)
        .bind(position_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|err| match &err {
            sqlx::Error::Database(db) if db.code().as_deref() == Some("23505") => {
                Error::Validation(format!(
                    "candidate {} already has an application for position {}",
                    candidate_id, position_id
                ))
            }
            _ => Error::from(err),
        })?;
        Ok(inserted)
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<Application> {
        sqlx::query_as::<_, Application>(r#"SELECT * FROM applications WHERE id = $1"#)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| Error::NotFound(format!("application {} not found", id)))
    }

    pub async fn rounds_for(&self, application_id: Uuid) -> Result<Vec<Round>> {
        let rounds = sqlx::query_as::<_, Round>(
            r#"SELECT * FROM rounds WHERE application_id = $1 ORDER BY round_sequence ASC"#,
        )
        .bind(application_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rounds)
    }

    /// Validates `targetStatus` against the edge table and applies it with a
    /// version-guarded single statement. Illegal edges write nothing.
    pub async fn transition(
        &self,
        id: Uuid,
        role: Role,
        payload: TransitionPayload,
    ) -> Result<Application> {
        if !policy::can_manage_status(role) {
            return Err(Error::Forbidden(
                "status transitions require admin or hr role".to_string(),
            ));
        }

        let app = self.get_by_id(id).await?;
        let target = payload.target_status;

        if !app.status.can_transition_to(target) {
            return Err(Error::Transition(format!(
                "{} -> {} is not an allowed edge",
                app.status, target
            )));
        }

        if target == ApplicationStatus::DocumentVerification {
            let rounds = self.rounds_for(id).await?;
            if !policy::can_move_to_document_verification(&rounds) {
                return Err(Error::IncompleteRounds(
                    "document verification requires every round to have result PASS".to_string(),
                ));
            }
        }

        // Leaving ONHOLD clears the hold reason; entering it goes through
        // hold_toggle which supplies one.
        let hold_reason = if app.status == ApplicationStatus::OnHold {
            None
        } else {
            app.hold_reason.clone()
        };

        self.apply_status(
            id,
            payload.version,
            app.status,
            target,
            payload.feedback,
            hold_reason,
        )
        .await
    }

    /// Flips ACCEPTED <-> ONHOLD. Terminal applications refuse the toggle.
    pub async fn hold_toggle(
        &self,
        id: Uuid,
        role: Role,
        reason: Option<String>,
        version: i64,
    ) -> Result<Application> {
        if !policy::can_manage_status(role) {
            return Err(Error::Forbidden(
                "hold toggle requires admin or hr role".to_string(),
            ));
        }

        let app = self.get_by_id(id).await?;
        let (target, hold_reason) = match app.status {
            ApplicationStatus::Accepted => (ApplicationStatus::OnHold, reason),
            ApplicationStatus::OnHold => (ApplicationStatus::Accepted, None),
            status if status.is_terminal() => {
                return Err(Error::Transition(format!(
                    "application is {} and can no longer be put on hold",
                    status
                )));
            }
            status => {
                return Err(Error::Transition(format!(
                    "hold toggle requires status accepted or on_hold, found {}",
                    status
                )));
            }
        };

        self.apply_status(
            id,
            version,
            app.status,
            target,
            app.status_feedback.clone(),
            hold_reason,
        )
        .await
    }

    /// ACCEPTED -> DOCUMENT_VERIFICATION, legal only once every owned round
    /// has result PASS.
    pub async fn move_to_document_verification(
        &self,
        id: Uuid,
        role: Role,
        version: i64,
    ) -> Result<Application> {
        if !policy::can_manage_status(role) {
            return Err(Error::Forbidden(
                "document verification requires admin or hr role".to_string(),
            ));
        }

        let app = self.get_by_id(id).await?;
        if !app
            .status
            .can_transition_to(ApplicationStatus::DocumentVerification)
        {
            return Err(Error::Transition(format!(
                "{} -> document_verification is not an allowed edge",
                app.status
            )));
        }

        let rounds = self.rounds_for(id).await?;
        if !policy::can_move_to_document_verification(&rounds) {
            return Err(Error::IncompleteRounds(
                "document verification requires every round to have result PASS".to_string(),
            ));
        }

        self.apply_status(
            id,
            version,
            app.status,
            ApplicationStatus::DocumentVerification,
            app.status_feedback.clone(),
            app.hold_reason.clone(),
        )
        .await
    }

    async fn apply_status(
        &self,
        id: Uuid,
        expected_version: i64,
        expected_status: ApplicationStatus,
        target: ApplicationStatus,
        feedback: Option<String>,
        hold_reason: Option<String>,
    ) -> Result<Application> {
        // The guard re-asserts the exact snapshot the edge was validated
        // against. A version that happens to match while the status moved
        // underneath (or the reverse) writes nothing.
        let updated = sqlx::query_as::<_, Application>(
            r#"
            UPDATE applications
            SET status = $4, status_feedback = $5, hold_reason = $6,
                version = version + 1, updated_at = NOW()
            WHERE id = $1 AND version = $2 AND status = $3
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(expected_version)
        .bind(expected_status)
        .bind(target)
        .bind(feedback)
        .bind(hold_reason)
        .fetch_optional(&self.pool)
        .await?;

        match updated {
            Some(app) => {
                tracing::info!(
                    application_id = %id,
                    status = %app.status,
                    version = app.version,
                    "application status transition applied"
                );
                Ok(app)
            }
            None => Err(self.write_miss(id, expected_version).await?),
        }
    }

    /// Distinguishes a missing row from a lost race after a guarded UPDATE
    /// matched nothing. A matching version with a diverged status still
    /// means the caller validated against stale state.
    async fn write_miss(&self, id: Uuid, expected_version: i64) -> Result<Error> {
        let current: Option<i64> =
            sqlx::query_scalar(r#"SELECT version FROM applications WHERE id = $1"#)
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(match current {
            Some(current) if current != expected_version => Error::VersionConflict(format!(
                "application {} is at version {}, caller supplied {}; re-read and retry",
                id, current, expected_version
            )),
            Some(_) => Error::VersionConflict(format!(
                "application {} changed while the request was validated; re-read and retry",
                id
            )),
            None => Error::NotFound(format!("application {} not found", id)),
        })
    }

    pub async fn list(&self, query: ApplicationListQuery) -> Result<(Vec<Application>, i64)> {
        let (_, limit, offset) = page_window(query.page, query.limit);

        let rows = sqlx::query_as::<_, Application>(
            r#"
            SELECT * FROM applications
            WHERE ($1::uuid IS NULL OR candidate_id = $1)
              AND ($2::uuid IS NULL OR position_id = $2)
              AND ($3::application_status IS NULL OR status = $3)
            ORDER BY created_at DESC
            LIMIT $4 OFFSET $5
            "#,
        )
        .bind(query.candidate_id)
        .bind(query.position_id)
        .bind(query.status)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM applications
            WHERE ($1::uuid IS NULL OR candidate_id = $1)
              AND ($2::uuid IS NULL OR position_id = $2)
              AND ($3::application_status IS NULL OR status = $3)
            "#,
        )
        .bind(query.candidate_id)
        .bind(query.position_id)
        .bind(query.status)
        .fetch_one(&self.pool)
        .await?;

        Ok((rows, total))
    }

    /// Full nested read: status, rounds ordered by sequence, interviews and
    /// their feedback. Completion flags are derived from the clock at read
    /// time; nothing is written here.
    pub async fn get_detail(&self, id: Uuid) -> Result<ApplicationDetailResponse> {
        let app = self.get_by_id(id).await?;
        let rounds = self.rounds_for(id).await?;
        let now = self.clock.now();

        let round_ids: Vec<Uuid> = rounds.iter().map(|r| r.id).collect();
        let interviews = sqlx::query_as::<_, Interview>(
            r#"
            SELECT * FROM interviews
            WHERE round_id = ANY($1)
            ORDER BY interview_date ASC, start_time ASC
            "#,
        )
        .bind(&round_ids)
        .fetch_all(&self.pool)
        .await?;

        let interview_ids: Vec<Uuid> = interviews.iter().map(|i| i.id).collect();
        let feedback_rows = sqlx::query_as::<_, InterviewFeedback>(
            r#"SELECT * FROM interview_feedback WHERE interview_id = ANY($1)"#,
        )
        .bind(&interview_ids)
        .fetch_all(&self.pool)
        .await?;

        let mut feedback_by_interview: std::collections::HashMap<Uuid, Vec<FeedbackResponse>> =
            std::collections::HashMap::new();
        for row in feedback_rows {
            let interview_id = row.interview_id;
            let entry = FeedbackResponse::try_from(row)?;
            feedback_by_interview
                .entry(interview_id)
                .or_default()
                .push(entry);
        }

        let mut interviews_by_round: std::collections::HashMap<Uuid, Vec<InterviewDetailResponse>> =
            std::collections::HashMap::new();
        for interview in interviews {
            let round_id = interview.round_id;
            let feedback = feedback_by_interview
                .remove(&interview.id)
                .unwrap_or_default();
            interviews_by_round
                .entry(round_id)
                .or_default()
                .push(InterviewDetailResponse {
                    interview: InterviewResponse::from_interview(interview, now),
                    feedback,
                });
        }

        let rounds = rounds
            .into_iter()
            .map(|round| {
                let interviews = interviews_by_round.remove(&round.id).unwrap_or_default();
                RoundDetailResponse {
                    round: RoundResponse::from_round(round, now),
                    interviews,
                }
            })
            .collect();

        Ok(ApplicationDetailResponse {
            application: ApplicationResponse::from(app),
            rounds,
        })
    }

    /// Writes the caller-supplied matching score slot after the external
    /// service reports back. Exposed for the integration callback path; the
    /// core itself never computes scores.
    pub async fn record_matching_score(
        &self,
        id: Uuid,
        score: rust_decimal::Decimal,
    ) -> Result<Application> {
        let mut tx = self.pool.begin().await?;
        let app = sqlx::query_as::<_, Application>(
            r#"SELECT * FROM applications WHERE id = $1 FOR UPDATE"#,
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| Error::NotFound(format!("application {} not found", id)))?;

        claim_application_version(&mut tx, id, app.version).await?;
        let updated = sqlx::query_as::<_, Application>(
            r#"UPDATE applications SET matching_score = $2 WHERE id = $1 RETURNING *"#,
        )
        .bind(id)
        .bind(score)
        .fetch_one(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::page_window;

    #[test]
    fn page_window_defaults() {
        assert_eq!(page_window(None, None), (1, 20, 0));
        assert_eq!(page_window(Some(3), Some(50)), (3, 50, 100));
    }

    #[test]
    fn page_window_survives_extreme_paging_input() {
        let (page, limit, offset) = page_window(Some(i64::MAX), Some(i64::MAX));
        assert_eq!((page, limit), (1_000_000, 100));
        assert_eq!(offset, 99_999_900);

        let (page, _, offset) = page_window(Some(i64::MIN), Some(0));
        assert_eq!(page, 1);
        assert_eq!(offset, 0);
    }
}
