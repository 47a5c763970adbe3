use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub(crate) struct Args {
    pub(crate) database_host: String,
    pub(crate) database_port: u16,
    pub(crate) database_name: String,
    pub(crate) database_user: String,
    pub(crate) database_password: String,
    pub(crate) log_level: String,
    pub(crate) port: u16,
    pub(crate) user_agent: String,
    pub(crate) access_token_secret: String,
    pub(crate) refresh_token_secret: String,
    pub(crate) access_token_expiry_minutes: i64,
    pub(crate) refresh_token_expiry_days: i64,
    pub(crate) min_password_length: usize,
    pub(crate) asset_host_url: String,
    pub(crate) asset_host_api_key: String,
}
