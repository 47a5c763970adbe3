use serde::Serialize;

use crate::types::User;

#[derive(Serialize)]
pub(crate) struct Login {
    pub(crate) user: User,
    pub(crate) access_token: String,
    pub(crate) refresh_token: String,
}

#[derive(Serialize)]
pub(crate) struct TokenPair {
    pub(crate) access_token: String,
    pub(crate) refresh_token: String,
}
