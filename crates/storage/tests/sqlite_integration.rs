use chrono::Duration;
use yachay_core::model::{BookId, Medal, MedalCategory, MedalId, ReadingPosition, UserId};
use yachay_core::time::fixed_now;
use storage::repository::{
    ExerciseKind, ExerciseResult, MedalRecord, MedalRepository, MedalStats, ProgressRepository,
};
use storage::sqlite::SqliteStore;

fn record(id: &str, offset_minutes: i64) -> MedalRecord {
    let earned_at = fixed_now() + Duration::minutes(offset_minutes);
    MedalRecord::from_medal(
        &Medal::new(
            MedalId::new(id),
            MedalCategory::Quiz,
            "Reading expert",
            "Completed the reading and quiz",
            earned_at,
        ),
        None,
    )
}

#[tokio::test]
async fn sqlite_roundtrip_persists_medals_in_earned_order() {
    let store = SqliteStore::connect("sqlite:file:memdb_medals?mode=memory&cache=shared")
        .await
        .expect("connect");
    store.migrate().await.expect("migrate");

    let user = UserId::new("u1");
    store.merge_medal(&user, &record("quiz_b", 10)).await.unwrap();
    store.merge_medal(&user, &record("quiz_a", 0)).await.unwrap();

    let fetched = store.list_medals(&user).await.expect("list");
    assert_eq!(fetched.len(), 2);
    assert_eq!(fetched[0].id, MedalId::new("quiz_a"));
    assert_eq!(fetched[1].id, MedalId::new("quiz_b"));
    assert_eq!(fetched[0].category, MedalCategory::Quiz);
    assert_eq!(fetched[0].synced_at, None);
}

#[tokio::test]
async fn sqlite_merge_updates_in_place() {
    let store = SqliteStore::connect("sqlite:file:memdb_merge?mode=memory&cache=shared")
        .await
        .expect("connect");
    store.migrate().await.expect("migrate");

    let user = UserId::new("u1");
    store.merge_medal(&user, &record("quiz_a", 0)).await.unwrap();

    let mut updated = record("quiz_a", 30);
    updated.synced_at = Some(fixed_now() + Duration::hours(1));
    store.merge_medal(&user, &updated).await.unwrap();

    // Last write wins for every field, matching the hosted adapter's
    // set-with-merge semantics.
    let fetched = store.list_medals(&user).await.unwrap();
    assert_eq!(fetched, vec![updated]);
}

#[tokio::test]
async fn sqlite_stats_upsert_overwrites() {
    let store = SqliteStore::connect("sqlite:file:memdb_stats?mode=memory&cache=shared")
        .await
        .expect("connect");
    store.migrate().await.expect("migrate");

    let user = UserId::new("u1");
    assert_eq!(store.get_stats(&user).await.unwrap(), None);

    store
        .put_stats(
            &user,
            &MedalStats {
                count: 1,
                updated_at: fixed_now(),
            },
        )
        .await
        .unwrap();
    store
        .put_stats(
            &user,
            &MedalStats {
                count: 5,
                updated_at: fixed_now() + Duration::hours(1),
            },
        )
        .await
        .unwrap();

    let stats = store.get_stats(&user).await.unwrap().expect("stats");
    assert_eq!(stats.count, 5);
}

#[tokio::test]
async fn sqlite_progress_round_trips() {
    let store = SqliteStore::connect("sqlite:file:memdb_progress?mode=memory&cache=shared")
        .await
        .expect("connect");
    store.migrate().await.expect("migrate");

    let user = UserId::new("u1");
    let book = BookId::new("kuntur");
    let position = ReadingPosition::new(4, 12, fixed_now());
    store
        .upsert_reading_position(&user, &book, &position)
        .await
        .unwrap();
    assert_eq!(
        store.get_reading_position(&user, &book).await.unwrap(),
        Some(position)
    );

    let result = ExerciseResult {
        exercise_id: yachay_core::model::ExerciseId::new("quiz-1"),
        kind: ExerciseKind::Quiz,
        score: 80,
        completed_at: fixed_now(),
    };
    store.upsert_exercise_result(&user, &result).await.unwrap();
    let results = store.list_exercise_results(&user).await.unwrap();
    assert_eq!(results, vec![result]);
}
