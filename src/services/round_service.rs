use std::sync::Arc;

use sqlx::PgPool;
use uuid::Uuid;

use crate::database::versioning::claim_application_version;
use crate::dto::round_dto::{AddRoundPayload, EditRoundPayload, RecordResultPayload};
use crate::error::{Error, Result};
use crate::models::application::Application;
use crate::models::round::{Round, RoundResult};
use crate::policy::{self, Role};
use crate::utils::time::Clock;

/// Owns the ordered rounds of an application. Sequences stay dense 1..N:
/// inserts must target count+1 and deletes shift everything behind them down.
#[derive(Clone)]
pub struct RoundService {
    pool: PgPool,
    clock: Arc<dyn Clock>,
}

impl RoundService {
    pub fn new(pool: PgPool, clock: Arc<dyn Clock>) -> Self {
        Self { pool, clock }
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<Round> {
        sqlx::query_as::<_, Round>(r#"SELECT * FROM rounds WHERE id = $1"#)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| Error::NotFound(format!("round {} not found", id)))
    }

    async fn owning_application(&self, round: &Round) -> Result<Application> {
        sqlx::query_as::<_, Application>(r#"SELECT * FROM applications WHERE id = $1"#)
            .bind(round.application_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| {
                Error::Internal(format!(
                    "round {} references missing application {}",
                    round.id, round.application_id
                ))
            })
    }

    pub async fn add_round(
        &self,
        application_id: Uuid,
        role: Role,
        payload: AddRoundPayload,
    ) -> Result<Round> {
        let app = sqlx::query_as::<_, Application>(r#"SELECT * FROM applications WHERE id = $1"#)
            .bind(application_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| Error::NotFound(format!("application {} not found", application_id)))?;

        if !policy::can_modify_rounds(&app, role) {
            return Err(Error::Forbidden(format!(
                "can_modify_rounds failed: requires admin or hr role and a non-frozen application (status {})",
                app.status
            )));
        }

        // Transport retry with the same key returns the already-created row.
        if let Some(key) = &payload.idempotency_key {
            let existing = sqlx::query_as::<_, Round>(
                r#"SELECT * FROM rounds WHERE application_id = $1 AND idempotency_key = $2"#,
            )
            .bind(application_id)
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;
            if let Some(round) = existing {
                return Ok(round);
            }
        }

        let mut tx = self.pool.begin().await?;
        // Serializes concurrent adds on the application row before the count
        // is taken, so the density check cannot race.
        claim_application_version(&mut tx, application_id, payload.version).await?;

        let count: i64 = sqlx::query_scalar(
            r#"SELECT COUNT(*) FROM rounds WHERE application_id = $1"#,
        )
        .bind(application_id)
        .fetch_one(&mut *tx)
        .await?;

        let expected_sequence = i32::try_from(count)
            .map_err(|_| Error::Internal("round count overflow".to_string()))?
            + 1;
        if payload.round_sequence != expected_sequence {
            return Err(Error::SequenceConflict(format!(
                "next round sequence for application {} is {}, got {}",
                application_id, expected_sequence, payload.round_sequence
            )));
        }

        // Re-asserts the gating snapshot inside the transaction; a freeze
        // committed since the read makes this insert match nothing.
        let round = sqlx::query_as::<_, Round>(
            r#"
            INSERT INTO rounds (
                application_id, round_sequence, round_type, scheduled_date,
                expected_start_time, duration_minutes, result, idempotency_key
            )
            SELECT $1, $2, $3, $4, $5, $6, 'pending', $7
            WHERE EXISTS (
                SELECT 1 FROM applications
                WHERE id = $1
                  AND status NOT IN ('rejected', 'document_verification', 'hired')
            )
            RETURNING *
            "#,
        )
        .bind(application_id)
        .bind(payload.round_sequence)
        .bind(payload.round_type)
        .bind(payload.scheduled_date)
        .bind(payload.expected_start_time)
        .bind(payload.duration_minutes)
        .bind(payload.idempotency_key)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| {
            Error::Forbidden(format!(
                "application {} no longer accepts round changes",
                application_id
            ))
        })?;

        tx.commit().await?;
        tracing::info!(
            application_id = %application_id,
            round_id = %round.id,
            sequence = round.round_sequence,
            "round added"
        );
        Ok(round)
    }

    pub async fn edit_round(
        &self,
        round_id: Uuid,
        role: Role,
        payload: EditRoundPayload,
    ) -> Result<Round> {
        let round = self.get_by_id(round_id).await?;
        let app = self.owning_application(&round).await?;

        if !policy::can_modify_rounds(&app, role) {
            return Err(Error::Forbidden(format!(
                "can_modify_rounds failed: requires admin or hr role and a non-frozen application (status {})",
                app.status
            )));
        }
        if round.is_completed(self.clock.now()) {
            return Err(Error::RoundLocked(format!(
                "round {} is completed and can no longer be edited",
                round_id
            )));
        }

        let round_type = payload.round_type.unwrap_or(round.round_type);
        let scheduled_date = payload.scheduled_date.unwrap_or(round.scheduled_date);
        let expected_start_time = payload
            .expected_start_time
            .unwrap_or(round.expected_start_time);
        let duration_minutes = payload.duration_minutes.unwrap_or(round.duration_minutes);

        let mut tx = self.pool.begin().await?;
        claim_application_version(&mut tx, round.application_id, payload.version).await?;
        // Same row-level guard as record_result: a result recorded between
        // the snapshot read and this statement must not be edited over.
        let updated = sqlx::query_as::<_, Round>(
            r#"
            UPDATE rounds
            SET round_type = $2, scheduled_date = $3, expected_start_time = $4,
                duration_minutes = $5, updated_at = NOW()
            WHERE id = $1 AND result = 'pending'
            RETURNING *
            "#,
        )
        .bind(round_id)
        .bind(round_type)
        .bind(scheduled_date)
        .bind(expected_start_time)
        .bind(duration_minutes)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| {
            Error::RoundLocked(format!(
                "round {} is completed and can no longer be edited",
                round_id
            ))
        })?;
        tx.commit().await?;
        Ok(updated)
    }

    pub async fn delete_round(&self, round_id: Uuid, role: Role, version: i64) -> Result<()> {
        let round = self.get_by_id(round_id).await?;
        let app = self.owning_application(&round).await?;

        if !policy::can_modify_rounds(&app, role) {
            return Err(Error::Forbidden(format!(
                "can_modify_rounds failed: requires admin or hr role and a non-frozen application (status {})",
                app.status
            )));
        }
        if round.is_completed(self.clock.now()) {
            return Err(Error::RoundLocked(format!(
                "round {} is completed and can no longer be deleted",
                round_id
            )));
        }

        let mut tx = self.pool.begin().await?;
        claim_application_version(&mut tx, round.application_id, version).await?;
        let deleted = sqlx::query(r#"DELETE FROM rounds WHERE id = $1 AND result = 'pending'"#)
            .bind(round_id)
            .execute(&mut *tx)
            .await?;
        if deleted.rows_affected() == 0 {
            return Err(Error::RoundLocked(format!(
                "round {} is completed and can no longer be deleted",
                round_id
            )));
        }
        // Keep sequences dense after the removal.
        sqlx::query(
            r#"
            UPDATE rounds SET round_sequence = round_sequence - 1, updated_at = NOW()
            WHERE application_id = $1 AND round_sequence > $2
            "#,
        )
        .bind(round.application_id)
        .bind(round.round_sequence)
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;
        tracing::info!(round_id = %round_id, "round deleted");
        Ok(())
    }

    /// Write-once result entry. Legal only once the round's window has
    /// elapsed and while no result has been recorded yet; the row-level
    /// guard makes a lost race surface as `RoundLocked` rather than a
    /// silent overwrite.
    pub async fn record_result(
        &self,
        round_id: Uuid,
        role: Role,
        payload: RecordResultPayload,
    ) -> Result<Round> {
        if payload.result == RoundResult::Pending {
            return Err(Error::Validation(
                "result must be pass, fail or undervaluation".to_string(),
            ));
        }

        let round = self.get_by_id(round_id).await?;
        let app = self.owning_application(&round).await?;

        if !policy::can_modify_rounds(&app, role) {
            return Err(Error::Forbidden(format!(
                "can_modify_rounds failed: requires admin or hr role and a non-frozen application (status {})",
                app.status
            )));
        }
        if round.result != RoundResult::Pending {
            return Err(Error::RoundLocked(format!(
                "round {} already has a recorded result",
                round_id
            )));
        }
        if !round.is_completed(self.clock.now()) {
            return Err(Error::RoundLocked(format!(
                "round {} has not completed yet; results can be recorded only after the scheduled window",
                round_id
            )));
        }

        let mut tx = self.pool.begin().await?;
        claim_application_version(&mut tx, round.application_id, payload.version).await?;
        let updated = sqlx::query_as::<_, Round>(
            r#"
            UPDATE rounds
            SET result = $2, rating = $3, feedback = $4, updated_at = NOW()
            WHERE id = $1 AND result = 'pending'
            RETURNING *
            "#,
        )
        .bind(round_id)
        .bind(payload.result)
        .bind(payload.rating)
        .bind(payload.feedback)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| {
            Error::RoundLocked(format!("round {} already has a recorded result", round_id))
        })?;
        tx.commit().await?;

        tracing::info!(
            round_id = %round_id,
            result = ?updated.result,
            "round result recorded"
        );
        Ok(updated)
    }
}
