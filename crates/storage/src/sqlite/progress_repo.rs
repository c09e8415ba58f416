use yachay_core::model::{BookId, ReadingPosition, UserId};

use super::{SqliteStore, mapping::map_position_row, mapping::map_result_row};
use crate::repository::{ExerciseResult, ProgressRepository, StoreError};

#[async_trait::async_trait]
impl ProgressRepository for SqliteStore {
    async fn upsert_reading_position(
        &self,
        user: &UserId,
        book: &BookId,
        position: &ReadingPosition,
    ) -> Result<(), StoreError> {
        sqlx::query(
            r"
            INSERT INTO reading_positions (
                user_id, book_id, current_unit, total_units, last_accessed
            )
            VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT(user_id, book_id) DO UPDATE SET
                current_unit = excluded.current_unit,
                total_units = excluded.total_units,
                last_accessed = excluded.last_accessed
            ",
        )
        .bind(user.as_str())
        .bind(book.as_str())
        .bind(i64::from(position.current_unit))
        .bind(i64::from(position.total_units))
        .bind(position.last_accessed)
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Connection(e.to_string()))?;

        Ok(())
    }

    async fn get_reading_position(
        &self,
        user: &UserId,
        book: &BookId,
    ) -> Result<Option<ReadingPosition>, StoreError> {
        let row = sqlx::query(
            r"
            SELECT current_unit, total_units, last_accessed
            FROM reading_positions
            WHERE user_id = ?1 AND book_id = ?2
            ",
        )
        .bind(user.as_str())
        .bind(book.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StoreError::Connection(e.to_string()))?;

        row.map(|r| map_position_row(&r)).transpose()
    }

    async fn upsert_exercise_result(
        &self,
        user: &UserId,
        result: &ExerciseResult,
    ) -> Result<(), StoreError> {
        sqlx::query(
            r"
            INSERT INTO exercise_results (
                user_id, exercise_id, kind, score, completed_at
            )
            VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT(user_id, exercise_id) DO UPDATE SET
                kind = excluded.kind,
                score = excluded.score,
                completed_at = excluded.completed_at
            ",
        )
        .bind(user.as_str())
        .bind(result.exercise_id.as_str())
        .bind(result.kind.as_str())
        .bind(i64::from(result.score))
        .bind(result.completed_at)
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Connection(e.to_string()))?;

        Ok(())
    }

    async fn list_exercise_results(&self, user: &UserId) -> Result<Vec<ExerciseResult>, StoreError> {
        let rows = sqlx::query(
            r"
            SELECT exercise_id, kind, score, completed_at
            FROM exercise_results
            WHERE user_id = ?1
            ORDER BY completed_at ASC, exercise_id ASC
            ",
        )
        .bind(user.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StoreError::Connection(e.to_string()))?;

        let mut results = Vec::with_capacity(rows.len());
        for row in rows {
            results.push(map_result_row(&row)?);
        }
        Ok(results)
    }
}
