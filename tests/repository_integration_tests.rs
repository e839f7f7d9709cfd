use chrono::{Duration, Utc};
use sqlx::SqlitePool;
use tokio::test;
use users_service::{
    date::SimpleDate,
    db,
    models::{AgeStats, NewUser, User},
    repository::{RepositoryError, SqliteRepository, UserRepository},
};

// --- Test Context and Setup ---

/// A fresh, migrated in-memory store per test.
struct DbTestContext {
    pool: SqlitePool,
}

impl DbTestContext {
    async fn setup() -> Self {
        let pool = db::connect_in_memory()
            .await
            .expect("Failed to open in-memory SQLite");

        db::MIGRATOR
            .run(&pool)
            .await
            .expect("Failed to run database migrations.");

        DbTestContext { pool }
    }

    async fn repository(&self) -> SqliteRepository {
        SqliteRepository::new(self.pool.clone())
            .await
            .expect("Failed to prepare repository statements")
    }
}

// --- Test Data Helpers ---

fn new_user(first_name: &str, email: &str, birthday: &str) -> NewUser {
    NewUser {
        first_name: first_name.to_string(),
        last_name: "McTesterson".to_string(),
        email: email.to_string(),
        birthday: birthday.parse().expect("valid test date"),
    }
}

/// A birthday that puts the user safely inside `years` of age: 100 days past the
/// anniversary, so neither leap days nor the time of day can move the bucket.
fn birthday_for_age(years: i64) -> SimpleDate {
    let days = (years as f64 * 365.25).round() as i64 + 100;
    SimpleDate::from(Utc::now() - Duration::days(days))
}

fn new_user_aged(first_name: &str, email: &str, years: i64) -> NewUser {
    NewUser {
        first_name: first_name.to_string(),
        last_name: "McTesterson".to_string(),
        email: email.to_string(),
        birthday: birthday_for_age(years),
    }
}

// --- Tests ---

#[test]
async fn test_create_and_get_user() {
    let ctx = DbTestContext::setup().await;
    let repo = ctx.repository().await;
    let input = new_user("Testy", "t@x.com", "1996-06-06");

    let id = repo.create_user(&input).await.expect("insert failed");
    assert_eq!(id, 1, "first insert into an empty table gets id 1");

    let fetched = repo.get_user(id).await.expect("read back failed");
    assert_eq!(fetched, User::from_new(id, input));
    assert_eq!(fetched.birthday.to_string(), "1996-06-06");
}

#[test]
async fn test_get_unknown_user_is_not_found() {
    let ctx = DbTestContext::setup().await;
    let repo = ctx.repository().await;

    let err = repo.get_user(42).await.unwrap_err();
    assert!(matches!(err, RepositoryError::NotFound), "got {err:?}");

    let err = repo.get_first_user().await.unwrap_err();
    assert!(matches!(err, RepositoryError::NotFound), "got {err:?}");
}

#[test]
async fn test_get_first_user_returns_an_existing_row() {
    let ctx = DbTestContext::setup().await;
    let repo = ctx.repository().await;
    let a = repo
        .create_user(&new_user("Ada", "ada@x.com", "1990-01-01"))
        .await
        .unwrap();
    let b = repo
        .create_user(&new_user("Bob", "bob@x.com", "1991-02-02"))
        .await
        .unwrap();

    let first = repo.get_first_user().await.expect("table is not empty");
    assert!(first.id == a || first.id == b);
}

#[test]
async fn test_duplicate_email_is_a_store_error() {
    let ctx = DbTestContext::setup().await;
    let repo = ctx.repository().await;
    let input = new_user("Testy", "t@x.com", "1996-06-06");

    repo.create_user(&input).await.expect("first insert");
    let err = repo.create_user(&input).await.unwrap_err();
    assert!(matches!(err, RepositoryError::Store(_)), "got {err:?}");
}

#[test]
async fn test_list_users_and_age_stats_agree() {
    let ctx = DbTestContext::setup().await;
    let repo = ctx.repository().await;

    for (name, email, birthday) in [
        ("Ada", "ada@x.com", "1990-01-01"),
        ("Bob", "bob@x.com", "1985-05-05"),
        ("Cy", "cy@x.com", "2001-12-31"),
    ] {
        repo.create_user(&new_user(name, email, birthday))
            .await
            .unwrap();
    }

    let users = repo.list_users().await.unwrap();
    assert_eq!(users.len(), 3);

    let stats = repo.age_stats().await.unwrap();
    assert_eq!(stats.total(), 3);
}

#[test]
async fn test_age_is_whole_years_and_bucketed() {
    let ctx = DbTestContext::setup().await;
    let repo = ctx.repository().await;

    let ages = [8, 12, 13, 19, 20, 29, 35, 45, 55, 65, 75, 85, 99, 100, 101];
    for years in ages {
        let email = format!("age{years}@x.com");
        repo.create_user(&new_user_aged(&format!("Age{years}"), &email, years))
            .await
            .unwrap();
    }

    let mut listed: Vec<i64> = repo
        .list_users_with_age()
        .await
        .unwrap()
        .into_iter()
        .map(|u| u.age_in_years)
        .collect();
    listed.sort();
    assert_eq!(listed, ages.to_vec());

    let stats = repo.age_stats().await.unwrap();
    assert_eq!(
        stats,
        AgeStats {
            preteen: 2,   // 8, 12
            teens: 2,     // 13, 19
            twenties: 2,  // 20, 29
            thirties: 1,
            forties: 1,
            fifties: 1,
            sixties: 1,
            seventies: 1,
            eighties: 1,
            nineties: 1,  // 99
            centurion: 2, // 100, 101
        }
    );
    assert_eq!(stats.total(), ages.len() as i64);
}

#[test]
async fn test_future_birthday_floors_to_negative_age() {
    let ctx = DbTestContext::setup().await;
    let repo = ctx.repository().await;
    let unborn = NewUser {
        birthday: SimpleDate::from(Utc::now() + Duration::days(100)),
        ..new_user("Unborn", "unborn@x.com", "2000-01-01")
    };
    repo.create_user(&unborn).await.unwrap();

    let listed = repo.list_users_with_age().await.unwrap();
    assert_eq!(listed[0].age_in_years, -1);

    let stats = repo.age_stats().await.unwrap();
    assert_eq!(stats.preteen, 1);
}

#[test]
async fn test_age_stats_on_empty_table_is_all_zero() {
    let ctx = DbTestContext::setup().await;
    let repo = ctx.repository().await;

    let stats = repo.age_stats().await.unwrap();
    assert_eq!(stats, Default::default());
}

#[test]
async fn test_update_user_changes_only_given_fields() {
    let ctx = DbTestContext::setup().await;
    let repo = ctx.repository().await;
    let id = repo
        .create_user(&new_user("Testy", "t@x.com", "1996-06-06"))
        .await
        .unwrap();

    let mut user = repo.get_user(id).await.unwrap();
    user.first_name = "Renamed".to_string();

    let affected = repo.update_user(&user).await.unwrap();
    assert_eq!(affected, 1);

    let reread = repo.get_user(id).await.unwrap();
    assert_eq!(reread.first_name, "Renamed");
    assert_eq!(reread.last_name, "McTesterson");
    assert_eq!(reread.email, "t@x.com");
    assert_eq!(reread.birthday.to_string(), "1996-06-06");
}

#[test]
async fn test_update_unknown_user_affects_nothing() {
    let ctx = DbTestContext::setup().await;
    let repo = ctx.repository().await;

    let ghost = User::from_new(99, new_user("Ghost", "g@x.com", "1970-01-01"));
    assert_eq!(repo.update_user(&ghost).await.unwrap(), 0);
}

#[test]
async fn test_delete_user_then_get_is_not_found() {
    let ctx = DbTestContext::setup().await;
    let repo = ctx.repository().await;
    let id = repo
        .create_user(&new_user("Testy", "t@x.com", "1996-06-06"))
        .await
        .unwrap();

    assert_eq!(repo.delete_user(id).await.unwrap(), 1);
    assert!(matches!(
        repo.get_user(id).await,
        Err(RepositoryError::NotFound)
    ));

    // Deleting again is not an error, just a no-op.
    assert_eq!(repo.delete_user(id).await.unwrap(), 0);
}

#[test]
async fn test_delete_all_users_empties_the_table() {
    let ctx = DbTestContext::setup().await;
    let repo = ctx.repository().await;
    repo.create_user(&new_user("Ada", "ada@x.com", "1990-01-01"))
        .await
        .unwrap();
    repo.create_user(&new_user("Bob", "bob@x.com", "1991-02-02"))
        .await
        .unwrap();

    assert_eq!(repo.delete_all_users().await.unwrap(), 2);
    assert!(repo.list_users().await.unwrap().is_empty());
}

#[test]
async fn test_construction_without_schema_fails_and_closes_pool() {
    let pool = db::connect_in_memory().await.unwrap();

    let err = match SqliteRepository::new(pool.clone()).await {
        Ok(_) => panic!("statements must not prepare without the users table"),
        Err(err) => err,
    };
    assert!(
        matches!(err, RepositoryError::Prepare { name: "create_user", .. }),
        "got {err:?}"
    );
    assert!(pool.is_closed(), "a failed construction must close the pool");
}

#[test]
async fn test_close_releases_the_pool() {
    let ctx = DbTestContext::setup().await;
    let repo = ctx.repository().await;

    repo.close().await;
    assert!(ctx.pool.is_closed());
}
