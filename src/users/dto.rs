use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use super::repo_types::User;

/// What anyone can see about a user.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    pub id: i64,
    pub username: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// The authenticated user's own profile; adds the email.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SelfUser {
    #[serde(flatten)]
    pub user: PublicUser,
    pub email: String,
}

/// PATCH /users/me body. Absent fields are left untouched.
#[derive(Debug, Default, Deserialize)]
pub struct UserUpdate {
    pub username: Option<String>,
    pub email: Option<String>,
}

impl From<User> for PublicUser {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            username: u.username,
            created_at: u.created_at,
            updated_at: u.updated_at,
        }
    }
}

impl From<User> for SelfUser {
    fn from(u: User) -> Self {
        let email = u.email.clone();
        Self {
            user: u.into(),
            email,
        }
    }
}
