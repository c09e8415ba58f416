use sqlx::Row;
use yachay_core::model::{ExerciseId, MedalCategory, MedalId, ReadingPosition};

use crate::repository::{
    ExerciseResult, MedalRecord, MedalStats, StoreError, parse_kind, score_from_i64,
};

fn ser<E: core::fmt::Display>(e: E) -> StoreError {
    StoreError::Serialization(e.to_string())
}

fn unit_from_i64(field: &'static str, v: i64) -> Result<u32, StoreError> {
    u32::try_from(v).map_err(|_| StoreError::Serialization(format!("invalid {field}: {v}")))
}

pub(crate) fn parse_category(s: &str) -> Result<MedalCategory, StoreError> {
    s.parse()
        .map_err(|_| StoreError::Serialization(format!("invalid category: {s}")))
}

pub(crate) fn map_medal_row(row: &sqlx::sqlite::SqliteRow) -> Result<MedalRecord, StoreError> {
    let category_str: String = row.try_get("category").map_err(ser)?;
    Ok(MedalRecord {
        id: MedalId::new(row.try_get::<String, _>("medal_id").map_err(ser)?),
        category: parse_category(&category_str)?,
        title: row.try_get("title").map_err(ser)?,
        description: row.try_get("description").map_err(ser)?,
        earned_at: row.try_get("earned_at").map_err(ser)?,
        synced_at: row.try_get("synced_at").map_err(ser)?,
    })
}

pub(crate) fn map_stats_row(row: &sqlx::sqlite::SqliteRow) -> Result<MedalStats, StoreError> {
    let count_i64: i64 = row.try_get("count").map_err(ser)?;
    Ok(MedalStats {
        count: u32::try_from(count_i64)
            .map_err(|_| StoreError::Serialization(format!("invalid count: {count_i64}")))?,
        updated_at: row.try_get("updated_at").map_err(ser)?,
    })
}

pub(crate) fn map_position_row(
    row: &sqlx::sqlite::SqliteRow,
) -> Result<ReadingPosition, StoreError> {
    Ok(ReadingPosition {
        current_unit: unit_from_i64("current_unit", row.try_get("current_unit").map_err(ser)?)?,
        total_units: unit_from_i64("total_units", row.try_get("total_units").map_err(ser)?)?,
        last_accessed: row.try_get("last_accessed").map_err(ser)?,
    })
}

pub(crate) fn map_result_row(row: &sqlx::sqlite::SqliteRow) -> Result<ExerciseResult, StoreError> {
    let kind_str: String = row.try_get("kind").map_err(ser)?;
    Ok(ExerciseResult {
        exercise_id: ExerciseId::new(row.try_get::<String, _>("exercise_id").map_err(ser)?),
        kind: parse_kind(&kind_str)?,
        score: score_from_i64(row.try_get("score").map_err(ser)?)?,
        completed_at: row.try_get("completed_at").map_err(ser)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_category_is_a_serialization_error() {
        assert!(matches!(
            parse_category("trophy"),
            Err(StoreError::Serialization(_))
        ));
        assert!(parse_category("quiz").is_ok());
    }
}
