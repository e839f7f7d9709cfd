use crate::models::{AgeStats, NewUser, User, UserWithAge};
use async_trait::async_trait;
use sqlx::{
    Executor, Statement,
    sqlite::{SqlitePool, SqliteStatement},
};
use std::sync::Arc;
use thiserror::Error;

/// RepositoryError
///
/// `NotFound` is kept apart from other store failures so callers can tell
/// "no such user" from "the store is broken".
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("no user matched the query")]
    NotFound,

    #[error("store error: {0}")]
    Store(#[source] sqlx::Error),

    #[error("failed to prepare statement `{name}`: {source}")]
    Prepare {
        name: &'static str,
        #[source]
        source: sqlx::Error,
    },
}

impl From<sqlx::Error> for RepositoryError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::RowNotFound => Self::NotFound,
            other => Self::Store(other),
        }
    }
}

/// UserRepository Trait
///
/// The contract handlers use for every read and write of the `users` table.
///
/// Update and delete report the number of affected rows. Zero is not an error here;
/// the caller decides what "nothing matched" means.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Inserts a user and returns the store-assigned id.
    async fn create_user(&self, user: &NewUser) -> Result<i64, RepositoryError>;
    async fn get_user(&self, id: i64) -> Result<User, RepositoryError>;
    /// Any one user. No ordering is applied, so which one is unspecified.
    async fn get_first_user(&self) -> Result<User, RepositoryError>;
    async fn list_users(&self) -> Result<Vec<User>, RepositoryError>;
    async fn list_users_with_age(&self) -> Result<Vec<UserWithAge>, RepositoryError>;
    /// Zero-filled on an empty table.
    async fn age_stats(&self) -> Result<AgeStats, RepositoryError>;
    async fn update_user(&self, user: &User) -> Result<u64, RepositoryError>;
    async fn delete_user(&self, id: i64) -> Result<u64, RepositoryError>;
    /// Test fixture reset.
    async fn delete_all_users(&self) -> Result<u64, RepositoryError>;
    /// Releases the store. Called once, after the server has drained.
    async fn close(&self);
}

/// RepositoryState
///
/// The concrete type used to share the persistence layer across the application state.
pub type RepositoryState = Arc<dyn UserRepository>;

// --- SQL ---

const CREATE_USER_SQL: &str =
    "INSERT INTO users (first_name, last_name, email, birthday) VALUES (?, ?, ?, ?)";

const GET_USER_SQL: &str =
    "SELECT id, first_name, last_name, email, birthday FROM users WHERE id = ?";

const GET_FIRST_USER_SQL: &str =
    "SELECT id, first_name, last_name, email, birthday FROM users LIMIT 1";

const LIST_USERS_SQL: &str = "SELECT id, first_name, last_name, email, birthday FROM users";

const UPDATE_USER_SQL: &str =
    "UPDATE users SET first_name = ?, last_name = ?, email = ?, birthday = ? WHERE id = ?";

const DELETE_USER_SQL: &str = "DELETE FROM users WHERE id = ?";

const DELETE_ALL_USERS_SQL: &str = "DELETE FROM users";

// Whole years since the birthday: floor((now - birthday) / 365.25 days). CAST truncates
// toward zero, so a fractional negative quotient (birthday in the future) is lowered by one.
const LIST_USERS_WITH_AGE_SQL: &str = r#"
    SELECT id, first_name, last_name, email, birthday,
           CAST(years AS INTEGER) - (years < CAST(years AS INTEGER)) AS age_in_years
    FROM (
        SELECT id, first_name, last_name, email, birthday,
               (JULIANDAY('now') - JULIANDAY(birthday)) / 365.25 AS years
        FROM users
    )
"#;

const AGE_STATS_SQL: &str = r#"
    WITH spans AS (
        SELECT (JULIANDAY('now') - JULIANDAY(birthday)) / 365.25 AS years
        FROM users
    ),
    ages AS (
        SELECT CAST(years AS INTEGER) - (years < CAST(years AS INTEGER)) AS age
        FROM spans
    )
    SELECT
        COUNT(CASE WHEN age < 13 THEN 1 END) AS preteen,
        COUNT(CASE WHEN age BETWEEN 13 AND 19 THEN 1 END) AS teens,
        COUNT(CASE WHEN age BETWEEN 20 AND 29 THEN 1 END) AS twenties,
        COUNT(CASE WHEN age BETWEEN 30 AND 39 THEN 1 END) AS thirties,
        COUNT(CASE WHEN age BETWEEN 40 AND 49 THEN 1 END) AS forties,
        COUNT(CASE WHEN age BETWEEN 50 AND 59 THEN 1 END) AS fifties,
        COUNT(CASE WHEN age BETWEEN 60 AND 69 THEN 1 END) AS sixties,
        COUNT(CASE WHEN age BETWEEN 70 AND 79 THEN 1 END) AS seventies,
        COUNT(CASE WHEN age BETWEEN 80 AND 89 THEN 1 END) AS eighties,
        COUNT(CASE WHEN age BETWEEN 90 AND 99 THEN 1 END) AS nineties,
        COUNT(CASE WHEN age >= 100 THEN 1 END) AS centurion
    FROM ages
"#;

/// Statements
///
/// Every statement the repository runs, prepared once against the pool.
struct Statements {
    create_user: SqliteStatement<'static>,
    get_user: SqliteStatement<'static>,
    get_first_user: SqliteStatement<'static>,
    list_users: SqliteStatement<'static>,
    list_users_with_age: SqliteStatement<'static>,
    age_stats: SqliteStatement<'static>,
    update_user: SqliteStatement<'static>,
    delete_user: SqliteStatement<'static>,
    delete_all_users: SqliteStatement<'static>,
}

impl Statements {
    // An early `?` drops whatever was already prepared.
    async fn prepare(pool: &SqlitePool) -> Result<Self, RepositoryError> {
        Ok(Self {
            create_user: prepare(pool, "create_user", CREATE_USER_SQL).await?,
            get_user: prepare(pool, "get_user", GET_USER_SQL).await?,
            get_first_user: prepare(pool, "get_first_user", GET_FIRST_USER_SQL).await?,
            list_users: prepare(pool, "list_users", LIST_USERS_SQL).await?,
            list_users_with_age: prepare(pool, "list_users_with_age", LIST_USERS_WITH_AGE_SQL)
                .await?,
            age_stats: prepare(pool, "age_stats", AGE_STATS_SQL).await?,
            update_user: prepare(pool, "update_user", UPDATE_USER_SQL).await?,
            delete_user: prepare(pool, "delete_user", DELETE_USER_SQL).await?,
            delete_all_users: prepare(pool, "delete_all_users", DELETE_ALL_USERS_SQL).await?,
        })
    }
}

async fn prepare(
    pool: &SqlitePool,
    name: &'static str,
    sql: &'static str,
) -> Result<SqliteStatement<'static>, RepositoryError> {
    pool.prepare(sql)
        .await
        .map_err(|source| RepositoryError::Prepare { name, source })
}

/// SqliteRepository
///
/// The concrete `UserRepository`, backed by SQLite. It is the sole owner of the pool.
pub struct SqliteRepository {
    pool: SqlitePool,
    statements: Statements,
}

impl SqliteRepository {
    /// Prepares every statement against `pool`.
    ///
    /// If any statement fails (for instance the `users` table is missing) the pool is closed
    /// before the error is returned, so a failed construction leaves nothing open.
    pub async fn new(pool: SqlitePool) -> Result<Self, RepositoryError> {
        match Statements::prepare(&pool).await {
            Ok(statements) => Ok(Self { pool, statements }),
            Err(e) => {
                tracing::error!(error = %e, "Could not prepare user statements, closing the store");
                pool.close().await;
                Err(e)
            }
        }
    }
}

#[async_trait]
impl UserRepository for SqliteRepository {
    async fn create_user(&self, user: &NewUser) -> Result<i64, RepositoryError> {
        let result = self
            .statements
            .create_user
            .query()
            .bind(user.first_name.as_str())
            .bind(user.last_name.as_str())
            .bind(user.email.as_str())
            .bind(user.birthday.to_date_time())
            .execute(&self.pool)
            .await?;
        Ok(result.last_insert_rowid())
    }

    async fn get_user(&self, id: i64) -> Result<User, RepositoryError> {
        let user = self
            .statements
            .get_user
            .query_as::<User>()
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        Ok(user)
    }

    async fn get_first_user(&self) -> Result<User, RepositoryError> {
        let user = self
            .statements
            .get_first_user
            .query_as::<User>()
            .fetch_one(&self.pool)
            .await?;
        Ok(user)
    }

    async fn list_users(&self) -> Result<Vec<User>, RepositoryError> {
        let users = self
            .statements
            .list_users
            .query_as::<User>()
            .fetch_all(&self.pool)
            .await?;
        Ok(users)
    }

    async fn list_users_with_age(&self) -> Result<Vec<UserWithAge>, RepositoryError> {
        let users = self
            .statements
            .list_users_with_age
            .query_as::<UserWithAge>()
            .fetch_all(&self.pool)
            .await?;
        Ok(users)
    }

    /// COUNT over an empty table still yields one row of zeros; a missing row is
    /// treated the same way rather than as NotFound.
    async fn age_stats(&self) -> Result<AgeStats, RepositoryError> {
        let stats = self
            .statements
            .age_stats
            .query_as::<AgeStats>()
            .fetch_optional(&self.pool)
            .await?;
        Ok(stats.unwrap_or_default())
    }

    async fn update_user(&self, user: &User) -> Result<u64, RepositoryError> {
        let result = self
            .statements
            .update_user
            .query()
            .bind(user.first_name.as_str())
            .bind(user.last_name.as_str())
            .bind(user.email.as_str())
            .bind(user.birthday.to_date_time())
            .bind(user.id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn delete_user(&self, id: i64) -> Result<u64, RepositoryError> {
        let result = self
            .statements
            .delete_user
            .query()
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn delete_all_users(&self) -> Result<u64, RepositoryError> {
        let result = self
            .statements
            .delete_all_users
            .query()
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}
