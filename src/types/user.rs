use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// (remote id, URL) pair for a file held by the remote object host.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct AssetReference {
    pub(crate) public_id: String,
    pub(crate) url: String,
}

/// Full credential record. Stays inside the trust boundary; never serialized.
#[derive(Clone)]
pub(crate) struct AuthorizedUser {
    pub(crate) id: i32,
    pub(crate) username: String,
    pub(crate) email: String,
    pub(crate) full_name: String,
    pub(crate) password_hash: String,
    pub(crate) refresh_token: Option<String>,
    pub(crate) avatar: AssetReference,
    pub(crate) cover_image: Option<AssetReference>,
    pub(crate) created_at: DateTime<Utc>,
    pub(crate) updated_at: DateTime<Utc>,
}

impl std::fmt::Debug for AuthorizedUser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthorizedUser")
            .field("id", &self.id)
            .field("username", &self.username)
            .field("email", &self.email)
            .finish()
    }
}

/// Projection handed to callers outside the trust boundary: no password hash,
/// no refresh token.
#[derive(Clone, Debug, Serialize)]
pub(crate) struct User {
    pub(crate) id: i32,
    pub(crate) username: String,
    pub(crate) email: String,
    pub(crate) full_name: String,
    pub(crate) avatar: AssetReference,
    pub(crate) cover_image: Option<AssetReference>,
    pub(crate) created_at: DateTime<Utc>,
    pub(crate) updated_at: DateTime<Utc>,
}

impl From<AuthorizedUser> for User {
    fn from(user: AuthorizedUser) -> Self {
        User {
            id: user.id,
            username: user.username,
            email: user.email,
            full_name: user.full_name,
            avatar: user.avatar,
            cover_image: user.cover_image,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}
