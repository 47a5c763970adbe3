use chrono::Duration;
use sqlx::postgres::{PgPool, PgPoolOptions};

use crate::controllers::asset::{AssetCoordinator, HttpAssetHost};
use crate::controllers::token::TokenController;
use crate::controllers::user::UserController;
use crate::core::config::Args;
use crate::core::error::ConfigError;

#[derive(Clone, Debug)]
pub(crate) struct AppState {
    pub(crate) pool: PgPool,
    pub(crate) user_controller: UserController,
    pub(crate) token_controller: TokenController,
    pub(crate) asset_coordinator: AssetCoordinator<HttpAssetHost>,
}

impl AppState {
    pub(crate) async fn new(database_url: &str, config: &Args) -> Result<Self, ConfigError> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await?;

        let host = HttpAssetHost::new(
            &config.user_agent,
            config.asset_host_url.clone(),
            config.asset_host_api_key.clone(),
        )?;

        Ok(AppState {
            pool: pool.clone(),
            user_controller: UserController::new(pool, config.min_password_length)?,
            token_controller: TokenController::new(
                &config.access_token_secret,
                &config.refresh_token_secret,
                Duration::minutes(config.access_token_expiry_minutes),
                Duration::days(config.refresh_token_expiry_days),
            ),
            asset_coordinator: AssetCoordinator::new(host),
        })
    }
}
