//! PostgreSQL repository tests. Run with `DATABASE_URL` set and `--ignored`.

use chrono::{Duration, Utc};
use sqlx::PgPool;
use std::sync::Arc;

use seq_shortener::domain::entities::{NewUrlMapping, UrlMappingPatch};
use seq_shortener::domain::repositories::{CounterRepository, UrlRepository};
use seq_shortener::error::AppError;
use seq_shortener::infrastructure::persistence::{PgCounterRepository, PgUrlRepository};

fn new_mapping(short_code: &str, alias: Option<&str>) -> NewUrlMapping {
    NewUrlMapping {
        short_code: short_code.to_string(),
        original_url: "https://example.com/".to_string(),
        alias: alias.map(str::to_string),
        expires_at: None,
        user_id: "alice".to_string(),
    }
}

#[sqlx::test]
#[ignore = "requires DATABASE_URL"]
async fn test_create_and_find(pool: PgPool) {
    let repo = PgUrlRepository::new(Arc::new(pool));

    let created = repo.create(new_mapping("abc", None)).await.unwrap();
    assert_eq!(created.short_code, "abc");
    assert_eq!(created.user_id, "alice");

    let found = repo.find_by_code("abc").await.unwrap().unwrap();
    assert_eq!(found.id, created.id);
    assert!(repo.exists("abc").await.unwrap());
    assert!(!repo.exists("zzz").await.unwrap());
}

#[sqlx::test]
#[ignore = "requires DATABASE_URL"]
async fn test_duplicate_code_conflicts(pool: PgPool) {
    let repo = PgUrlRepository::new(Arc::new(pool));

    repo.create(new_mapping("dup", None)).await.unwrap();
    let result = repo.create(new_mapping("dup", None)).await;

    assert!(matches!(result, Err(AppError::Conflict { .. })));
}

#[sqlx::test]
#[ignore = "requires DATABASE_URL"]
async fn test_find_by_alias(pool: PgPool) {
    let repo = PgUrlRepository::new(Arc::new(pool));

    repo.create(new_mapping("github", Some("github")))
        .await
        .unwrap();

    let found = repo.find_by_alias("github").await.unwrap().unwrap();
    assert_eq!(found.short_code, "github");
    assert!(repo.find_by_alias("gitlab").await.unwrap().is_none());
}

#[sqlx::test]
#[ignore = "requires DATABASE_URL"]
async fn test_update_and_clear_expiry(pool: PgPool) {
    let repo = PgUrlRepository::new(Arc::new(pool));
    let mut mapping = new_mapping("upd", None);
    mapping.expires_at = Some(Utc::now() + Duration::hours(1));
    repo.create(mapping).await.unwrap();

    let updated = repo
        .update(
            "upd",
            UrlMappingPatch {
                original_url: Some("https://example.org/".to_string()),
                expires_at: Some(None),
            },
        )
        .await
        .unwrap()
        .unwrap();

    assert_eq!(updated.original_url, "https://example.org/");
    assert!(updated.expires_at.is_none());
    assert!(updated.updated_at >= updated.created_at);

    let missing = repo
        .update("nope", UrlMappingPatch::default())
        .await
        .unwrap();
    assert!(missing.is_none());
}

#[sqlx::test]
#[ignore = "requires DATABASE_URL"]
async fn test_list_by_user_newest_first(pool: PgPool) {
    let repo = PgUrlRepository::new(Arc::new(pool));

    repo.create(new_mapping("one", None)).await.unwrap();
    repo.create(new_mapping("two", None)).await.unwrap();

    let urls = repo.list_by_user("alice").await.unwrap();
    let codes: Vec<&str> = urls.iter().map(|m| m.short_code.as_str()).collect();
    assert_eq!(codes, vec!["two", "one"]);

    assert!(repo.list_by_user("bob").await.unwrap().is_empty());
}

#[sqlx::test]
#[ignore = "requires DATABASE_URL"]
async fn test_delete_expired(pool: PgPool) {
    let repo = PgUrlRepository::new(Arc::new(pool));

    let mut expired = new_mapping("old", None);
    expired.expires_at = Some(Utc::now() - Duration::minutes(1));
    repo.create(expired).await.unwrap();
    repo.create(new_mapping("new", None)).await.unwrap();

    assert_eq!(repo.delete_expired().await.unwrap(), 1);
    assert!(repo.find_by_code("old").await.unwrap().is_none());
    assert!(repo.find_by_code("new").await.unwrap().is_some());

    assert!(repo.delete("new").await.unwrap());
    assert!(!repo.delete("new").await.unwrap());
}

#[sqlx::test]
#[ignore = "requires DATABASE_URL"]
async fn test_counter_snapshot_lifecycle(pool: PgPool) {
    let repo = PgCounterRepository::new(Arc::new(pool));

    assert!(repo.find().await.unwrap().is_none());

    let created = repo.create_if_absent(0).await.unwrap();
    assert_eq!(created.counter, 0);

    repo.upsert(42).await.unwrap();
    assert_eq!(repo.create_if_absent(0).await.unwrap().counter, 42);
    assert_eq!(repo.find().await.unwrap().unwrap().counter, 42);
}
