use quiz_core::model::{CategoryId, Player, PlayerId, QuizAttempt};
use sqlx::Row;

use crate::repository::{AttemptRow, StorageError};

pub(crate) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

pub(crate) fn u32_from_i64(field: &'static str, v: i64) -> Result<u32, StorageError> {
    u32::try_from(v).map_err(|_| StorageError::Serialization(format!("invalid {field}: {v}")))
}

pub(crate) fn map_attempt_row(row: &sqlx::sqlite::SqliteRow) -> Result<QuizAttempt, StorageError> {
    let player_id: String = row.try_get("player_id").map_err(ser)?;
    let player_name: String = row.try_get("player_name").map_err(ser)?;
    let category_id: String = row.try_get("category_id").map_err(ser)?;
    let score = u32_from_i64("score", row.try_get::<i64, _>("score").map_err(ser)?)?;
    let total = u32_from_i64("total", row.try_get::<i64, _>("total").map_err(ser)?)?;
    let completed_at = row.try_get("completed_at").map_err(ser)?;

    let player = Player::new(PlayerId::new(player_id), player_name).map_err(ser)?;
    QuizAttempt::from_persisted(
        player,
        CategoryId::new(category_id),
        score,
        total,
        completed_at,
    )
    .map_err(ser)
}

pub(crate) fn map_attempt_row_with_id(
    row: &sqlx::sqlite::SqliteRow,
) -> Result<AttemptRow, StorageError> {
    let id: i64 = row.try_get("id").map_err(ser)?;
    let attempt = map_attempt_row(row)?;
    Ok(AttemptRow::new(id, attempt))
}
