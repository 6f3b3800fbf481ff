//! PostgreSQL repository tests.
//!
//! Run with a database: `DATABASE_URL=postgres://... cargo test -- --ignored`

use sqlx::PgPool;
use std::sync::Arc;

use profile_links::domain::entities::Platform;
use profile_links::domain::reconcile::{LinkChangeSet, LinkUpsert};
use profile_links::domain::repositories::LinkRepository;
use profile_links::infrastructure::persistence::PgLinkRepository;

fn upsert(id: Option<&str>, platform: Platform, url: &str) -> LinkUpsert {
    LinkUpsert {
        id: id.map(str::to_string),
        platform,
        url: url.to_string(),
    }
}

#[sqlx::test]
#[ignore = "requires a PostgreSQL DATABASE_URL"]
async fn test_upsert_by_owner_platform_updates_in_place(pool: PgPool) {
    let repo = PgLinkRepository::new(Arc::new(pool));

    let first = repo
        .upsert_by_owner_platform("u1", Platform::Github, "https://a")
        .await
        .unwrap();
    let second = repo
        .upsert_by_owner_platform("u1", Platform::Github, "https://b")
        .await
        .unwrap();

    assert_eq!(first.id, second.id);
    assert_eq!(second.url, "https://b");
    assert_eq!(repo.list_by_owner("u1").await.unwrap().len(), 1);
}

#[sqlx::test]
#[ignore = "requires a PostgreSQL DATABASE_URL"]
async fn test_delete_where_checks_ownership(pool: PgPool) {
    let repo = PgLinkRepository::new(Arc::new(pool));

    let mine = repo
        .upsert_by_owner_platform("u1", Platform::Github, "https://a")
        .await
        .unwrap();
    let theirs = repo
        .upsert_by_owner_platform("u2", Platform::Github, "https://b")
        .await
        .unwrap();

    let deleted = repo
        .delete_where(&[mine.id.clone(), theirs.id.clone()], "u1")
        .await
        .unwrap();

    assert_eq!(deleted, 1);
    assert!(repo.list_by_owner("u1").await.unwrap().is_empty());
    assert_eq!(repo.list_by_owner("u2").await.unwrap().len(), 1);
}

#[sqlx::test]
#[ignore = "requires a PostgreSQL DATABASE_URL"]
async fn test_reconcile_skips_foreign_removal(pool: PgPool) {
    let repo = PgLinkRepository::new(Arc::new(pool));

    let foreign = repo
        .upsert_by_owner_platform("someone-else", Platform::Github, "https://x")
        .await
        .unwrap();

    let changes = LinkChangeSet::new(
        vec![foreign.id.clone()],
        vec![
            upsert(None, Platform::Github, "https://a"),
            upsert(None, Platform::Youtube, "https://b"),
        ],
    );

    let outcome = repo.reconcile("u1", &changes).await.unwrap();

    assert_eq!(outcome.removed, 0);
    assert_eq!(outcome.links.len(), 2);
    assert!(outcome.links.iter().all(|l| l.id != foreign.id));
    assert_eq!(repo.list_by_owner("someone-else").await.unwrap().len(), 1);
}

#[sqlx::test]
#[ignore = "requires a PostgreSQL DATABASE_URL"]
async fn test_reconcile_duplicate_platform_last_wins(pool: PgPool) {
    let repo = PgLinkRepository::new(Arc::new(pool));

    let changes = LinkChangeSet::new(
        vec![],
        vec![
            upsert(None, Platform::Gitlab, "https://first"),
            upsert(None, Platform::Gitlab, "https://last"),
        ],
    );

    let outcome = repo.reconcile("u1", &changes).await.unwrap();

    assert_eq!(outcome.links.len(), 1);
    assert_eq!(outcome.links[0].url, "https://last");

    let stored = repo.list_by_owner("u1").await.unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].url, "https://last");
}

#[sqlx::test]
#[ignore = "requires a PostgreSQL DATABASE_URL"]
async fn test_reconcile_is_idempotent(pool: PgPool) {
    let repo = PgLinkRepository::new(Arc::new(pool));

    let changes = LinkChangeSet::new(
        vec!["missing".to_string()],
        vec![
            upsert(None, Platform::Github, "https://a"),
            upsert(None, Platform::Twitch, "https://t"),
        ],
    );

    repo.reconcile("u1", &changes).await.unwrap();
    let once = repo.list_by_owner("u1").await.unwrap();

    repo.reconcile("u1", &changes).await.unwrap();
    let twice = repo.list_by_owner("u1").await.unwrap();

    assert_eq!(once, twice);
}

#[sqlx::test]
#[ignore = "requires a PostgreSQL DATABASE_URL"]
async fn test_reconcile_moves_record_to_new_platform(pool: PgPool) {
    let repo = PgLinkRepository::new(Arc::new(pool));

    let original = repo
        .upsert_by_owner_platform("u1", Platform::Twitter, "https://twitter.com/u1")
        .await
        .unwrap();

    let changes = LinkChangeSet::new(
        vec![],
        vec![upsert(
            Some(&original.id),
            Platform::Facebook,
            "https://facebook.com/u1",
        )],
    );

    let outcome = repo.reconcile("u1", &changes).await.unwrap();

    assert_eq!(outcome.links.len(), 1);
    assert_eq!(outcome.links[0].id, original.id);
    assert_eq!(outcome.links[0].platform, Platform::Facebook);

    let stored = repo.list_by_owner("u1").await.unwrap();
    assert_eq!(stored.len(), 1);
}

#[sqlx::test]
#[ignore = "requires a PostgreSQL DATABASE_URL"]
async fn test_reconcile_merges_into_occupied_platform(pool: PgPool) {
    let repo = PgLinkRepository::new(Arc::new(pool));

    let moving = repo
        .upsert_by_owner_platform("u1", Platform::Twitter, "https://twitter.com/u1")
        .await
        .unwrap();
    let occupant = repo
        .upsert_by_owner_platform("u1", Platform::Facebook, "https://facebook.com/old")
        .await
        .unwrap();

    let changes = LinkChangeSet::new(
        vec![],
        vec![upsert(
            Some(&moving.id),
            Platform::Facebook,
            "https://facebook.com/new",
        )],
    );

    let outcome = repo.reconcile("u1", &changes).await.unwrap();

    assert_eq!(outcome.links.len(), 1);
    assert_eq!(outcome.links[0].id, occupant.id);
    assert_eq!(outcome.links[0].url, "https://facebook.com/new");

    let stored = repo.list_by_owner("u1").await.unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].id, occupant.id);
}

#[sqlx::test]
#[ignore = "requires a PostgreSQL DATABASE_URL"]
async fn test_owner_index_tracks_links(pool: PgPool) {
    let repo = PgLinkRepository::new(Arc::new(pool));

    let changes = LinkChangeSet::new(
        vec![],
        vec![upsert(None, Platform::Codewars, "https://codewars.com/u1")],
    );

    let outcome = repo.reconcile("u1", &changes).await.unwrap();
    repo.reconcile("u1", &changes).await.unwrap();

    let index = repo.owner_index("u1").await.unwrap();
    assert_eq!(index, vec![outcome.links[0].id.clone()]);

    repo.delete_where(&index, "u1").await.unwrap();
    assert!(repo.owner_index("u1").await.unwrap().is_empty());
}

#[sqlx::test]
#[ignore = "requires a PostgreSQL DATABASE_URL"]
async fn test_health_check(pool: PgPool) {
    let repo = PgLinkRepository::new(Arc::new(pool));

    assert!(repo.health_check().await);
}

#[sqlx::test]
#[ignore = "requires a PostgreSQL DATABASE_URL"]
async fn test_reconcile_swaps_platforms(pool: PgPool) {
    let repo = PgLinkRepository::new(Arc::new(pool));

    let a = repo
        .upsert_by_owner_platform("u1", Platform::Github, "https://github.com/old")
        .await
        .unwrap();
    let b = repo
        .upsert_by_owner_platform("u1", Platform::Youtube, "https://youtube.com/old")
        .await
        .unwrap();

    let changes = LinkChangeSet::new(
        vec![],
        vec![
            upsert(Some(&a.id), Platform::Youtube, "https://youtube.com/new"),
            upsert(Some(&b.id), Platform::Github, "https://github.com/new"),
        ],
    );

    let outcome = repo.reconcile("u1", &changes).await.unwrap();
    assert_eq!(outcome.removed, 0);

    let stored = repo.list_by_owner("u1").await.unwrap();
    assert_eq!(stored.len(), 2);
    assert_eq!(stored[0].id, a.id);
    assert_eq!(stored[0].platform, Platform::Youtube);
    assert_eq!(stored[0].created_at, a.created_at);
    assert_eq!(stored[1].id, b.id);
    assert_eq!(stored[1].platform, Platform::Github);
    assert_eq!(stored[1].url, "https://github.com/new");

    let index = repo.owner_index("u1").await.unwrap();
    assert_eq!(index.len(), 2);
    assert!(index.contains(&a.id) && index.contains(&b.id));
}

#[sqlx::test]
#[ignore = "requires a PostgreSQL DATABASE_URL"]
async fn test_reconcile_rolls_back_failed_batch(pool: PgPool) {
    sqlx::query(
        r#"
        CREATE FUNCTION reject_marked_url() RETURNS trigger AS $$
        BEGIN
            IF NEW.url = 'https://reject.example' THEN
                RAISE EXCEPTION 'rejected url';
            END IF;
            RETURN NEW;
        END;
        $$ LANGUAGE plpgsql
        "#,
    )
    .execute(&pool)
    .await
    .unwrap();
    sqlx::query(
        r#"
        CREATE TRIGGER reject_marked_url
        BEFORE INSERT OR UPDATE ON profile_links
        FOR EACH ROW EXECUTE FUNCTION reject_marked_url()
        "#,
    )
    .execute(&pool)
    .await
    .unwrap();

    let repo = PgLinkRepository::new(Arc::new(pool));
    let kept = repo
        .upsert_by_owner_platform("u1", Platform::Twitch, "https://twitch.tv/u1")
        .await
        .unwrap();

    let changes = LinkChangeSet::new(
        vec![kept.id.clone()],
        vec![
            upsert(None, Platform::Github, "https://github.com/u1"),
            upsert(None, Platform::Youtube, "https://reject.example"),
        ],
    );

    assert!(repo.reconcile("u1", &changes).await.is_err());

    assert_eq!(repo.list_by_owner("u1").await.unwrap(), vec![kept.clone()]);
    assert_eq!(repo.owner_index("u1").await.unwrap(), vec![kept.id]);
}
