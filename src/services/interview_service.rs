use std::sync::Arc;

use sqlx::PgPool;
use uuid::Uuid;

use crate::database::versioning::claim_application_version;
use crate::dto::interview_dto::{
    EditInterviewPayload, ScheduleInterviewPayload, SubmitFeedbackPayload,
};
use crate::error::{Error, Result};
use crate::models::application::Application;
use crate::models::interview::{Interview, InterviewFeedback, InterviewStatus, MAX_INTERVIEWERS};
use crate::models::round::{Round, RoundResult};
use crate::policy::{self, Role};
use crate::utils::time::Clock;

/// Owns interviews within technical and HR rounds. Completion is derived by
/// the pure predicate everywhere; the only persisted COMPLETED transition is
/// `finalize_completion`, which is idempotent and CAS-guarded so concurrent
/// sweep workers cannot double-apply it.
#[derive(Clone)]
pub struct InterviewService {
    pool: PgPool,
    clock: Arc<dyn Clock>,
}

impl InterviewService {
    pub fn new(pool: PgPool, clock: Arc<dyn Clock>) -> Self {
        Self { pool, clock }
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<Interview> {
        sqlx::query_as::<_, Interview>(r#"SELECT * FROM interviews WHERE id = $1"#)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| Error::NotFound(format!("interview {} not found", id)))
    }

    async fn owning_round(&self, round_id: Uuid) -> Result<(Round, Application)> {
        let round = sqlx::query_as::<_, Round>(r#"SELECT * FROM rounds WHERE id = $1"#)
            .bind(round_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| Error::NotFound(format!("round {} not found", round_id)))?;
        let app = sqlx::query_as::<_, Application>(r#"SELECT * FROM applications WHERE id = $1"#)
            .bind(round.application_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| {
                Error::Internal(format!(
                    "round {} references missing application {}",
                    round.id, round.application_id
                ))
            })?;
        Ok((round, app))
    }

    pub async fn schedule_interview(
        &self,
        round_id: Uuid,
        role: Role,
        payload: ScheduleInterviewPayload,
    ) -> Result<Interview> {
        let (round, app) = self.owning_round(round_id).await?;

        if !round.supports_interviews() {
            return Err(Error::Validation(format!(
                "interviews can only be scheduled for technical or hr rounds, round {} is {:?}",
                round_id, round.round_type
            )));
        }
        if !policy::can_schedule_interview(&app, &round, role) {
            return Err(Error::Forbidden(format!(
                "can_schedule_interview failed: requires admin or recruiter role, a pending round result and a non-terminal application (status {})",
                app.status
            )));
        }
        validate_window(payload.start_time, payload.end_time)?;
        validate_interviewers(&payload.interviewer_ids)?;

        if let Some(key) = &payload.idempotency_key {
            let existing = sqlx::query_as::<_, Interview>(
                r#"SELECT * FROM interviews WHERE round_id = $1 AND idempotency_key = $2"#,
            )
            .bind(round_id)
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;
            if let Some(interview) = existing {
                return Ok(interview);
            }
        }

        let mut tx = self.pool.begin().await?;
        claim_application_version(&mut tx, round.application_id, payload.version).await?;
        // Re-asserts the gating snapshot inside the transaction: the round
        // must still be undecided and the application non-terminal.
        let interview = sqlx::query_as::<_, Interview>(
            r#"
            INSERT INTO interviews (
                round_id, meeting_link, status, interview_date, start_time,
                end_time, interviewer_ids, idempotency_key
            )
            SELECT $1, $2, 'scheduled', $3, $4, $5, $6, $7
            WHERE EXISTS (
                SELECT 1 FROM rounds r
                JOIN applications a ON a.id = r.application_id
                WHERE r.id = $1
                  AND r.result = 'pending'
                  AND a.status NOT IN ('rejected', 'hired')
            )
            RETURNING *
            "#,
        )
        .bind(round_id)
        .bind(&payload.meeting_link)
        .bind(payload.interview_date)
        .bind(payload.start_time)
        .bind(payload.end_time)
        .bind(&payload.interviewer_ids)
        .bind(&payload.idempotency_key)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| {
            Error::Forbidden(format!(
                "round {} no longer accepts interview scheduling",
                round_id
            ))
        })?;
        tx.commit().await?;

        tracing::info!(
            round_id = %round_id,
            interview_id = %interview.id,
            interviewers = interview.interviewer_ids.len(),
            "interview scheduled"
        );
        Ok(interview)
    }

    pub async fn edit_interview(
        &self,
        interview_id: Uuid,
        role: Role,
        payload: EditInterviewPayload,
    ) -> Result<Interview> {
        let interview = self.get_by_id(interview_id).await?;
        let (round, app) = self.owning_round(interview.round_id).await?;

        if !matches!(role, Role::Admin | Role::Recruiter) {
            return Err(Error::Forbidden(
                "interview changes require admin or recruiter role".to_string(),
            ));
        }
        if app.status.is_terminal() {
            return Err(Error::Forbidden(format!(
                "application is {} and its interviews are frozen",
                app.status
            )));
        }
        if interview.is_completed(self.clock.now()) {
            return Err(Error::InterviewLocked(format!(
                "interview {} is completed and can no longer be edited",
                interview_id
            )));
        }
        if payload.status == Some(InterviewStatus::Completed) {
            return Err(Error::Validation(
                "completion is recorded through the finalize operation, not an edit".to_string(),
            ));
        }
        if let Some(ids) = &payload.interviewer_ids {
            validate_interviewers(ids)?;
        }

        let meeting_link = payload.meeting_link.unwrap_or(interview.meeting_link);
        let interview_date = payload.interview_date.unwrap_or(interview.interview_date);
        let start_time = payload.start_time.unwrap_or(interview.start_time);
        let end_time = payload.end_time.unwrap_or(interview.end_time);
        let interviewer_ids = payload.interviewer_ids.unwrap_or(interview.interviewer_ids);
        let status = payload.status.unwrap_or(interview.status);
        validate_window(start_time, end_time)?;

        let mut tx = self.pool.begin().await?;
        claim_application_version(&mut tx, round.application_id, payload.version).await?;
        // The guard pins the status the lock check was validated against,
        // so a finalize or cancel landing in between cannot be edited over.
        let updated = sqlx::query_as::<_, Interview>(
            r#"
            UPDATE interviews
            SET meeting_link = $2, interview_date = $3, start_time = $4,
                end_time = $5, interviewer_ids = $6, status = $7, updated_at = NOW()
            WHERE id = $1 AND status = $8
            RETURNING *
            "#,
        )
        .bind(interview_id)
        .bind(&meeting_link)
        .bind(interview_date)
        .bind(start_time)
        .bind(end_time)
        .bind(&interviewer_ids)
        .bind(status)
        .bind(interview.status)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| {
            Error::InterviewLocked(format!(
                "interview {} changed state and can no longer be edited",
                interview_id
            ))
        })?;
        tx.commit().await?;
        Ok(updated)
    }

    pub async fn delete_interview(
        &self,
        interview_id: Uuid,
        role: Role,
        version: i64,
    ) -> Result<()> {
        let interview = self.get_by_id(interview_id).await?;
        let (round, app) = self.owning_round(interview.round_id).await?;

        if !matches!(role, Role::Admin | Role::Recruiter) {
            return Err(Error::Forbidden(
                "interview changes require admin or recruiter role".to_string(),
            ));
        }
        if app.status.is_terminal() {
            return Err(Error::Forbidden(format!(
                "application is {} and its interviews are frozen",
                app.status
            )));
        }
        if interview.is_completed(self.clock.now()) {
            return Err(Error::InterviewLocked(format!(
                "interview {} is completed and can no longer be deleted",
                interview_id
            )));
        }

        let mut tx = self.pool.begin().await?;
        claim_application_version(&mut tx, round.application_id, version).await?;
        let deleted = sqlx::query(r#"DELETE FROM interviews WHERE id = $1 AND status = $2"#)
            .bind(interview_id)
            .bind(interview.status)
            .execute(&mut *tx)
            .await?;
        if deleted.rows_affected() == 0 {
            return Err(Error::InterviewLocked(format!(
                "interview {} changed state and can no longer be deleted",
                interview_id
            )));
        }
        tx.commit().await?;
        tracing::info!(interview_id = %interview_id, "interview deleted");
        Ok(())
    }

    /// One feedback record per interviewer, upserted. Feedback stays mutable
    /// until the owning round's result is recorded, at which point the whole
    /// round is settled.
    pub async fn submit_feedback(
        &self,
        interview_id: Uuid,
        role: Role,
        payload: SubmitFeedbackPayload,
    ) -> Result<InterviewFeedback> {
        let interview = self.get_by_id(interview_id).await?;
        let (round, _app) = self.owning_round(interview.round_id).await?;

        if !matches!(role, Role::Admin | Role::Interviewer) {
            return Err(Error::Forbidden(
                "feedback submission requires admin or interviewer role".to_string(),
            ));
        }
        if !interview.has_interviewer(payload.interviewer_id) {
            return Err(Error::Forbidden(format!(
                "interviewer {} is not assigned to interview {}",
                payload.interviewer_id, interview_id
            )));
        }
        if round.result != RoundResult::Pending {
            return Err(Error::InterviewLocked(format!(
                "feedback for interview {} is closed: the owning round's result has been recorded",
                interview_id
            )));
        }
        for rating in &payload.skill_ratings {
            if !(1..=5).contains(&rating.rating) {
                return Err(Error::Validation(format!(
                    "skill rating for {} must be between 1 and 5",
                    rating.skill_id
                )));
            }
        }

        let skill_ratings = serde_json::to_value(&payload.skill_ratings)?;
        let mut tx = self.pool.begin().await?;
        claim_application_version(&mut tx, round.application_id, payload.version).await?;
        // The upsert only lands while the owning round is still undecided;
        // a result recorded since the snapshot read closes feedback.
        let record = sqlx::query_as::<_, InterviewFeedback>(
            r#"
            INSERT INTO interview_feedback (interview_id, interviewer_id, feedback, skill_ratings)
            SELECT $1, $2, $3, $4
            WHERE EXISTS (
                SELECT 1 FROM interviews i
                JOIN rounds r ON r.id = i.round_id
                WHERE i.id = $1 AND r.result = 'pending'
            )
            ON CONFLICT (interview_id, interviewer_id)
            DO UPDATE SET feedback = EXCLUDED.feedback,
                          skill_ratings = EXCLUDED.skill_ratings,
                          updated_at = NOW()
            RETURNING *
            "#,
        )
        .bind(interview_id)
        .bind(payload.interviewer_id)
        .bind(&payload.feedback)
        .bind(skill_ratings)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| {
            Error::InterviewLocked(format!(
                "feedback for interview {} is closed: the owning round's result has been recorded",
                interview_id
            ))
        })?;
        tx.commit().await?;
        Ok(record)
    }

    /// Idempotent, CAS-guarded persistence of the completion the predicate
    /// already derives. Calling it twice, or from two sweep workers at once,
    /// transitions the row exactly once.
    pub async fn finalize_completion(&self, interview_id: Uuid) -> Result<Interview> {
        let interview = self.get_by_id(interview_id).await?;
        match interview.status {
            InterviewStatus::Completed => Ok(interview),
            InterviewStatus::Cancelled => Err(Error::InterviewLocked(format!(
                "interview {} is cancelled and cannot be finalized",
                interview_id
            ))),
            InterviewStatus::Scheduled => {
                if !interview.is_completed(self.clock.now()) {
                    return Err(Error::Validation(format!(
                        "interview {} has not reached its end time",
                        interview_id
                    )));
                }
                let updated = sqlx::query_as::<_, Interview>(
                    r#"
                    UPDATE interviews SET status = 'completed', updated_at = NOW()
                    WHERE id = $1 AND status = 'scheduled'
                    RETURNING *
                    "#,
                )
                .bind(interview_id)
                .fetch_optional(&self.pool)
                .await?;
                match updated {
                    Some(interview) => Ok(interview),
                    // Lost the race to another finalizer; re-read and report
                    // the settled state.
                    None => self.get_by_id(interview_id).await,
                }
            }
        }
    }
}

fn validate_window(start: chrono::NaiveTime, end: chrono::NaiveTime) -> Result<()> {
    if end <= start {
        return Err(Error::Validation(
            "interview end time must be after its start time".to_string(),
        ));
    }
    Ok(())
}

fn validate_interviewers(ids: &[Uuid]) -> Result<()> {
    if ids.is_empty() || ids.len() > MAX_INTERVIEWERS {
        return Err(Error::Validation(format!(
            "an interview carries between 1 and {} interviewers",
            MAX_INTERVIEWERS
        )));
    }
    let mut seen = std::collections::HashSet::new();
    for id in ids {
        if !seen.insert(id) {
            return Err(Error::Validation(format!(
                "interviewer {} listed more than once",
                id
            )));
        }
    }
    Ok(())
}
