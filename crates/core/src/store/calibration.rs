use sqlx::SqlitePool;

use crate::error::AgentError;
use crate::types::{CalibrationEvent, decode_timestamp, encode_timestamp};

/// Record a confirmed calibration.
pub async fn insert(pool: &SqlitePool, event: &CalibrationEvent) -> Result<(), AgentError> {
    sqlx::query("INSERT INTO calibration (timestamp) VALUES (?1)")
        .bind(encode_timestamp(&event.timestamp))
        .execute(pool)
        .await?;
    Ok(())
}

/// Most recent calibration, if any.
pub async fn latest(pool: &SqlitePool) -> Result<Option<CalibrationEvent>, AgentError> {
    let row: Option<(String,)> =
        sqlx::query_as("SELECT timestamp FROM calibration ORDER BY timestamp DESC LIMIT 1")
            .fetch_optional(pool)
            .await?;
    row.map(|(ts,)| {
        decode_timestamp(&ts)
            .map(|timestamp| CalibrationEvent { timestamp })
            .map_err(|e| AgentError::CorruptRecord(format!("calibration timestamp {ts:?}: {e}")))
    })
    .transpose()
}

pub async fn count(pool: &SqlitePool) -> Result<i64, sqlx::Error> {
    let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM calibration")
        .fetch_one(pool)
        .await?;
    Ok(row.0)
}
