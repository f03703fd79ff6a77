use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use crate::error::AgentError;
use crate::types::{ChargeStatus, Sample, decode_timestamp, encode_timestamp};

const COLUMNS: &str = "timestamp, level, capacity, temp, status, health_estimated";

/// Row type for sqlx deserialization from the `stats` table.
#[derive(sqlx::FromRow)]
struct SampleRow {
    timestamp: String,
    level: i64,
    capacity: f64,
    temp: f64,
    status: String,
    health_estimated: bool,
}

impl TryFrom<SampleRow> for Sample {
    type Error = AgentError;

    fn try_from(row: SampleRow) -> Result<Self, Self::Error> {
        let timestamp = decode_timestamp(&row.timestamp)
            .map_err(|e| AgentError::CorruptRecord(format!("timestamp {:?}: {e}", row.timestamp)))?;
        let level = u8::try_from(row.level)
            .ok()
            .filter(|l| *l <= 100)
            .ok_or_else(|| AgentError::CorruptRecord(format!("level {} at {}", row.level, row.timestamp)))?;
        Ok(Self {
            timestamp,
            level,
            capacity_health: row.capacity,
            health_estimated: row.health_estimated,
            temperature: row.temp,
            status: ChargeStatus::from_db(&row.status).unwrap_or(ChargeStatus::Unknown),
        })
    }
}

fn into_samples(rows: Vec<SampleRow>) -> Result<Vec<Sample>, AgentError> {
    rows.into_iter().map(Sample::try_from).collect()
}

/// Append a sample. A second sample with the same timestamp is rejected by
/// the primary key and surfaces as a store error.
pub async fn insert(pool: &SqlitePool, sample: &Sample) -> Result<(), AgentError> {
    sqlx::query(
        "INSERT INTO stats (timestamp, level, capacity, temp, status, health_estimated)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
    )
    .bind(encode_timestamp(&sample.timestamp))
    .bind(i64::from(sample.level))
    .bind(sample.capacity_health)
    .bind(sample.temperature)
    .bind(sample.status.as_db_str())
    .bind(sample.health_estimated)
    .execute(pool)
    .await?;
    Ok(())
}

/// Samples with `from <= timestamp < to`, oldest first.
pub async fn fetch_range(
    pool: &SqlitePool,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
) -> Result<Vec<Sample>, AgentError> {
    let sql = format!(
        "SELECT {COLUMNS} FROM stats WHERE timestamp >= ?1 AND timestamp < ?2 ORDER BY timestamp ASC"
    );
    let rows: Vec<SampleRow> = sqlx::query_as(&sql)
        .bind(encode_timestamp(&from))
        .bind(encode_timestamp(&to))
        .fetch_all(pool)
        .await?;
    into_samples(rows)
}

/// Every sample, oldest first.
pub async fn fetch_all(pool: &SqlitePool) -> Result<Vec<Sample>, AgentError> {
    let sql = format!("SELECT {COLUMNS} FROM stats ORDER BY timestamp ASC");
    let rows: Vec<SampleRow> = sqlx::query_as(&sql).fetch_all(pool).await?;
    into_samples(rows)
}

/// The `limit` most recent samples, most recent first.
pub async fn fetch_recent(pool: &SqlitePool, limit: i64) -> Result<Vec<Sample>, AgentError> {
    let sql = format!("SELECT {COLUMNS} FROM stats ORDER BY timestamp DESC LIMIT ?1");
    let rows: Vec<SampleRow> = sqlx::query_as(&sql).bind(limit).fetch_all(pool).await?;
    into_samples(rows)
}

/// Health values of the `limit` most recent samples, most recent first.
pub async fn recent_health(pool: &SqlitePool, limit: i64) -> Result<Vec<f64>, sqlx::Error> {
    let rows: Vec<(f64,)> =
        sqlx::query_as("SELECT capacity FROM stats ORDER BY timestamp DESC LIMIT ?1")
            .bind(limit)
            .fetch_all(pool)
            .await?;
    Ok(rows.into_iter().map(|r| r.0).collect())
}

/// All charge levels, oldest first. Input for cycle estimation.
pub async fn fetch_levels(pool: &SqlitePool) -> Result<Vec<u8>, sqlx::Error> {
    let rows: Vec<(i64,)> = sqlx::query_as("SELECT level FROM stats ORDER BY timestamp ASC")
        .fetch_all(pool)
        .await?;
    // The CHECK constraint keeps levels in 0..=100.
    Ok(rows.into_iter().map(|r| r.0.clamp(0, 100) as u8).collect())
}

pub async fn earliest(pool: &SqlitePool) -> Result<Option<Sample>, AgentError> {
    let sql = format!("SELECT {COLUMNS} FROM stats ORDER BY timestamp ASC LIMIT 1");
    let row: Option<SampleRow> = sqlx::query_as(&sql).fetch_optional(pool).await?;
    row.map(Sample::try_from).transpose()
}

pub async fn latest(pool: &SqlitePool) -> Result<Option<Sample>, AgentError> {
    let sql = format!("SELECT {COLUMNS} FROM stats ORDER BY timestamp DESC LIMIT 1");
    let row: Option<SampleRow> = sqlx::query_as(&sql).fetch_optional(pool).await?;
    row.map(Sample::try_from).transpose()
}

pub async fn count(pool: &SqlitePool) -> Result<i64, sqlx::Error> {
    let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM stats")
        .fetch_one(pool)
        .await?;
    Ok(row.0)
}

/// Delete samples older than `cutoff`. Returns the number removed.
pub async fn prune_before(pool: &SqlitePool, cutoff: DateTime<Utc>) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM stats WHERE timestamp < ?1")
        .bind(encode_timestamp(&cutoff))
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}
