use yachay_core::model::UserId;

use super::{SqliteStore, mapping::map_medal_row, mapping::map_stats_row};
use crate::repository::{MedalRecord, MedalRepository, MedalStats, StoreError};

#[async_trait::async_trait]
impl MedalRepository for SqliteStore {
    async fn list_medals(&self, user: &UserId) -> Result<Vec<MedalRecord>, StoreError> {
        let rows = sqlx::query(
            r"
            SELECT medal_id, category, title, description, earned_at, synced_at
            FROM medals
            WHERE user_id = ?1
            ORDER BY earned_at ASC, medal_id ASC
            ",
        )
        .bind(user.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StoreError::Connection(e.to_string()))?;

        let mut records = Vec::with_capacity(rows.len());
        for row in rows {
            records.push(map_medal_row(&row)?);
        }
        Ok(records)
    }

    async fn merge_medal(&self, user: &UserId, record: &MedalRecord) -> Result<(), StoreError> {
        sqlx::query(
            r"
            INSERT INTO medals (
                user_id, medal_id, category, title, description, earned_at, synced_at
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            ON CONFLICT(user_id, medal_id) DO UPDATE SET
                category = excluded.category,
                title = excluded.title,
                description = excluded.description,
                earned_at = excluded.earned_at,
                synced_at = excluded.synced_at
            ",
        )
        .bind(user.as_str())
        .bind(record.id.as_str())
        .bind(record.category.as_str())
        .bind(record.title.as_str())
        .bind(record.description.as_str())
        .bind(record.earned_at)
        .bind(record.synced_at)
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Connection(e.to_string()))?;

        Ok(())
    }

    async fn get_stats(&self, user: &UserId) -> Result<Option<MedalStats>, StoreError> {
        let row = sqlx::query(
            r"
            SELECT count, updated_at
            FROM medal_stats
            WHERE user_id = ?1
            ",
        )
        .bind(user.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StoreError::Connection(e.to_string()))?;

        row.map(|r| map_stats_row(&r)).transpose()
    }

    async fn put_stats(&self, user: &UserId, stats: &MedalStats) -> Result<(), StoreError> {
        sqlx::query(
            r"
            INSERT INTO medal_stats (user_id, count, updated_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(user_id) DO UPDATE SET
                count = excluded.count,
                updated_at = excluded.updated_at
            ",
        )
        .bind(user.as_str())
        .bind(i64::from(stats.count))
        .bind(stats.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Connection(e.to_string()))?;

        Ok(())
    }
}
