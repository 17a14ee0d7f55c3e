use chrono::Duration;
use quiz_core::model::{CategoryId, Player, PlayerId, QuizAttempt};
use quiz_core::time::fixed_now;
use storage::repository::{AttemptRepository, Storage, StorageError};
use storage::sqlite::SqliteRepository;

fn attempt(user: &str, category: &str, score: u32, minutes: i64) -> QuizAttempt {
    QuizAttempt::from_persisted(
        Player::new(PlayerId::new(user), format!("Player {user}")).unwrap(),
        CategoryId::new(category),
        score,
        5,
        fixed_now() + Duration::minutes(minutes),
    )
    .unwrap()
}

#[tokio::test]
async fn sqlite_roundtrip_persists_attempts() {
    let repo = SqliteRepository::connect("sqlite:file:memdb_attempts?mode=memory&cache=shared")
        .await
        .expect("connect");
    repo.migrate().await.expect("migrate");

    let original = attempt("user1", "math", 4, 0);
    let id = repo.append_attempt(&original).await.unwrap();

    let fetched = repo.get_attempt(id).await.unwrap();
    assert_eq!(fetched, original);
    assert_eq!(fetched.player().display_name(), "Player user1");
    assert_eq!(fetched.percentage(), 80);

    let missing = repo.get_attempt(id + 100).await;
    assert!(matches!(missing, Err(StorageError::NotFound)));
}

#[tokio::test]
async fn sqlite_lists_newest_first_and_filters_by_category() {
    let repo = SqliteRepository::connect("sqlite:file:memdb_listing?mode=memory&cache=shared")
        .await
        .expect("connect");
    repo.migrate().await.expect("migrate");

    let a = repo.append_attempt(&attempt("u1", "math", 1, 0)).await.unwrap();
    let b = repo.append_attempt(&attempt("u2", "bio", 2, 5)).await.unwrap();
    let c = repo.append_attempt(&attempt("u3", "math", 3, 10)).await.unwrap();

    let all = repo.list_attempts(None, 10).await.unwrap();
    assert_eq!(all.iter().map(|r| r.id).collect::<Vec<_>>(), vec![c, b, a]);

    let math = repo
        .list_attempts(Some(&CategoryId::new("math")), 10)
        .await
        .unwrap();
    assert_eq!(math.iter().map(|r| r.id).collect::<Vec<_>>(), vec![c, a]);

    let limited = repo.list_attempts(None, 1).await.unwrap();
    assert_eq!(limited.len(), 1);
}

#[tokio::test]
async fn migrations_are_idempotent() {
    let repo = SqliteRepository::connect("sqlite:file:memdb_migrate?mode=memory&cache=shared")
        .await
        .expect("connect");
    repo.migrate().await.expect("first migrate");
    repo.migrate().await.expect("second migrate");

    let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM schema_migrations")
        .fetch_one(repo.pool())
        .await
        .unwrap();
    assert_eq!(count.0, 2);
}

#[tokio::test]
async fn sqlite_storage_serves_portal_bank() {
    let storage = Storage::sqlite("sqlite:file:memdb_storage?mode=memory&cache=shared")
        .await
        .expect("storage");
    let categories = storage.questions.list_categories();
    assert_eq!(categories.len(), 3);
    assert!(storage.attempts.list_attempts(None, 10).await.unwrap().is_empty());
}
