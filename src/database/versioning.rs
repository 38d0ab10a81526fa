use sqlx::{Postgres, Transaction};
use uuid::Uuid;

use crate::error::{Error, Result};

/// Claims the optimistic write token for an application inside an open
/// transaction. The version the caller last read must still be current;
/// otherwise the whole transaction is rejected with `VersionConflict` and no
/// partial state can leak. Every mutation of an application or anything it
/// owns goes through this guard, so concurrent writers serialize on the
/// application row.
pub async fn claim_application_version(
    tx: &mut Transaction<'_, Postgres>,
    application_id: Uuid,
    expected_version: i64,
) -> Result<i64> {
    let updated: Option<i64> = sqlx::query_scalar(
        r#"
        UPDATE applications
        SET version = version + 1, updated_at = NOW()
        WHERE id = $1 AND version = $2
        RETURNING version
        "#,
    )
    .bind(application_id)
    .bind(expected_version)
    .fetch_optional(&mut **tx)
    .await?;

    match updated {
        Some(version) => Ok(version),
        None => {
            let current: Option<i64> =
                sqlx::query_scalar(r#"SELECT version FROM applications WHERE id = $1"#)
                    .bind(application_id)
                    .fetch_optional(&mut **tx)
                    .await?;
            match current {
                Some(current) => Err(Error::VersionConflict(format!(
                    "application {} is at version {}, caller supplied {}; re-read and retry",
                    application_id, current, expected_version
                ))),
                None => Err(Error::NotFound(format!(
                    "application {} not found",
                    application_id
                ))),
            }
        }
    }
}
