use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use ts_rs::TS;
use utoipa::ToSchema;

use crate::{
    bind::{Validate, require_id, require_text},
    date::SimpleDate,
    error::BindError,
};

// --- Core Application Schemas (Mapped to Database) ---

/// User
///
/// A row of the `users` table. The `id` is assigned by the store on insert and never changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct User {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[ts(type = "string")]
    #[schema(value_type = String, format = Date, example = "1996-06-06")]
    pub birthday: SimpleDate,
}

impl User {
    /// Attaches a store-assigned id to a create payload.
    pub fn from_new(id: i64, new_user: NewUser) -> Self {
        Self {
            id,
            first_name: new_user.first_name,
            last_name: new_user.last_name,
            email: new_user.email,
            birthday: new_user.birthday,
        }
    }
}

/// UserWithAge
///
/// A `User` with `age_in_years` derived at query time. Never persisted.
/// Serialized flat, so the user fields and the age share one JSON object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema, FromRow)]
#[ts(export)]
pub struct UserWithAge {
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub user: User,
    pub age_in_years: i64,
}

/// AgeStats
///
/// Number of users per age bucket. Buckets cover every age, so on a table without
/// null birthdays the counters add up to the user count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct AgeStats {
    /// Younger than 13.
    pub preteen: i64,
    /// 13 to 19.
    pub teens: i64,
    pub twenties: i64,
    pub thirties: i64,
    pub forties: i64,
    pub fifties: i64,
    pub sixties: i64,
    pub seventies: i64,
    pub eighties: i64,
    pub nineties: i64,
    /// 100 and over.
    pub centurion: i64,
}

impl AgeStats {
    pub fn total(&self) -> i64 {
        self.preteen
            + self.teens
            + self.twenties
            + self.thirties
            + self.forties
            + self.fifties
            + self.sixties
            + self.seventies
            + self.eighties
            + self.nineties
            + self.centurion
    }
}

// --- Request Payloads (Input Schemas) ---

/// UserId
///
/// Input payload for reading and deleting a user, and the body of the create response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UserId {
    pub id: i64,
}

/// NewUser
///
/// Input payload for POST /user. Every field is required.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct NewUser {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[ts(type = "string")]
    #[schema(value_type = String, format = Date, example = "1996-06-06")]
    pub birthday: SimpleDate,
}

impl Validate for UserId {
    fn validate(&self) -> Result<(), BindError> {
        require_id(self.id)
    }
}

fn require_details(
    first_name: &str,
    last_name: &str,
    email: &str,
    birthday: SimpleDate,
) -> Result<(), BindError> {
    require_text("first_name", first_name)?;
    require_text("last_name", last_name)?;
    require_text("email", email)?;
    if birthday.is_zero() {
        return Err(BindError::Missing("birthday"));
    }
    Ok(())
}

impl Validate for NewUser {
    fn validate(&self) -> Result<(), BindError> {
        require_details(&self.first_name, &self.last_name, &self.email, self.birthday)
    }
}

impl Validate for User {
    fn validate(&self) -> Result<(), BindError> {
        require_id(self.id)?;
        require_details(&self.first_name, &self.last_name, &self.email, self.birthday)
    }
}

// --- Response Envelopes (Output Schemas) ---

/// StatusEnvelope
///
/// Body of GET /ping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct StatusEnvelope {
    pub status: String,
}

impl StatusEnvelope {
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
        }
    }
}

/// IdUserEnvelope
///
/// Body of a successful POST /user: `{"user": {"id": 1}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct IdUserEnvelope {
    pub user: UserId,
}

/// UserEnvelope
///
/// Body of GET /user and PUT /user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct UserEnvelope {
    pub user: User,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct UsersEnvelope {
    pub users: Vec<User>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct UsersWithAgeEnvelope {
    pub users: Vec<UserWithAge>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct AgeStatsEnvelope {
    pub age_stats: AgeStats,
}

/// MessageEnvelope
///
/// Plain confirmation body, e.g. `{"message": "User deleted successfully."}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct MessageEnvelope {
    pub message: String,
}

/// ErrorEnvelope
///
/// Body of every 400 and 500 response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct ErrorEnvelope {
    pub error: String,
}
