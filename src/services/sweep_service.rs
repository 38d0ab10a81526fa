use std::sync::Arc;

use sqlx::PgPool;

use crate::error::Result;
use crate::utils::time::Clock;

/// Periodic finalizer running outside the request path. Interviews whose end
/// time has passed get their COMPLETED status persisted here with a set-based
/// compare-and-swap on `status = 'scheduled'`, so any number of concurrent
/// sweep workers transition each row at most once. Round completion is purely
/// derived and needs no sweep.
#[derive(Clone)]
pub struct SweepService {
    pool: PgPool,
    clock: Arc<dyn Clock>,
}

impl SweepService {
    pub fn new(pool: PgPool, clock: Arc<dyn Clock>) -> Self {
        Self { pool, clock }
    }

    pub async fn run_once(&self) -> Result<u64> {
        let now = self.clock.now();
        let finalized = sqlx::query(
            r#"
            UPDATE interviews
            SET status = 'completed', updated_at = NOW()
            WHERE status = 'scheduled'
              AND (interview_date + end_time) AT TIME ZONE 'UTC' < $1
            "#,
        )
        .bind(now)
        .execute(&self.pool)
        .await?
        .rows_affected();

        if finalized > 0 {
            tracing::info!(finalized, "sweep finalized overdue interviews");
        }
        Ok(finalized)
    }
}
