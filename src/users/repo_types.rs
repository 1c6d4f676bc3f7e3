use serde::Serialize;
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// User record in the database.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String, // Argon2 hash, not exposed in JSON
    pub image: Option<String>,
    pub bio: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// Public author fields attached to posts and comments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Author {
    pub id: Uuid,
    pub name: String,
    pub image: Option<String>,
}

impl From<&User> for Author {
    fn from(u: &User) -> Self {
        Self {
            id: u.id,
            name: u.name.clone(),
            image: u.image.clone(),
        }
    }
}

/// Insert lost to the unique index on `users.email`.
#[derive(Debug, thiserror::Error)]
#[error("email {0} is already registered")]
pub struct EmailTaken(pub String);

pub struct NewUser<'a> {
    pub name: &'a str,
    pub email: &'a str,
    pub password_hash: &'a str,
}

/// Everything a user has authored, drafts included.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, FromRow)]
pub struct ActivityCounts {
    pub posts: i64,
    pub comments: i64,
}
