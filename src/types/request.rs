use serde::Deserialize;

#[derive(Deserialize)]
pub(crate) struct RegisterData {
    pub(crate) username: String,
    pub(crate) email: String,
    pub(crate) full_name: String,
    pub(crate) password: String,
    pub(crate) avatar_path: String,
    pub(crate) cover_path: Option<String>,
}

#[derive(Deserialize)]
pub(crate) struct LoginData {
    pub(crate) identity: String,
    pub(crate) password: String,
}

#[derive(Deserialize)]
pub(crate) struct RefreshData {
    pub(crate) refresh_token: String,
}

#[derive(Deserialize)]
pub(crate) struct UpdatePasswordData {
    pub(crate) old_password: String,
    pub(crate) new_password: String,
}

#[derive(Deserialize)]
pub(crate) struct UpdateProfileData {
    pub(crate) full_name: String,
    pub(crate) email: String,
}

#[derive(Deserialize)]
pub(crate) struct UpdateAvatarData {
    pub(crate) avatar_path: String,
}

#[derive(Deserialize)]
pub(crate) struct UpdateCoverData {
    pub(crate) cover_path: Option<String>,
}
