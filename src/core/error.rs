use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{BoxError, Json};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Config error: {0}")]
    Config(#[from] config::ConfigError),
    #[error("Database migration error: {0}")]
    DatabaseMigration(#[from] sqlx::migrate::MigrateError),
    #[error("IO error: {0}")]
    IO(#[from] std::io::Error),
    #[error("SQL error: {0}")]
    Sql(#[from] sqlx::Error),
    #[error("Reqwest error: {0}")]
    HTTPClient(#[from] reqwest::Error),
    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),
}

#[derive(Debug, thiserror::Error)]
pub(crate) enum Error {
    #[error("SQL error: {0}")]
    Sql(#[from] sqlx::Error),
    #[error("Bcrypt error: {0}")]
    Bcrypt(#[from] bcrypt::BcryptError),
    #[error("JWT error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),
    #[error("Expired token")]
    ExpiredToken,
    #[error("No credentials provided")]
    NoCredentials,
    #[error("Invalid credentials")]
    Unauthorized,
    #[error("User already exists")]
    UserAlreadyExists,
    #[error("User not found")]
    UserNotFound,
    #[error("{0} is required")]
    MissingField(&'static str),
    #[error("{0} file is required")]
    MissingFile(&'static str),
    #[error("Invalid username")]
    InvalidUsername,
    #[error("Invalid email")]
    InvalidEmail,
    #[error("{0}")]
    InvalidPassword(String),
    #[error("Unreadable local file: {0}")]
    LocalFile(#[from] std::io::Error),
    #[error("Reqwest error: {0}")]
    HTTPClient(#[from] reqwest::Error),
    #[error("Asset host error: {0}")]
    AssetHost(String),
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        tracing::error!("{:?}", self);

        let (status, message) = match &self {
            Error::Sql(_) | Error::Bcrypt(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
            }
            Error::HTTPClient(_) | Error::AssetHost(_) => {
                (StatusCode::BAD_GATEWAY, "Asset host error".to_string())
            }
            // expired vs malformed stays in the log line above; callers see one kind
            Error::Jwt(_) | Error::ExpiredToken | Error::Unauthorized => {
                (StatusCode::UNAUTHORIZED, "Invalid credentials".to_string())
            }
            Error::NoCredentials => (StatusCode::UNAUTHORIZED, self.to_string()),
            Error::UserAlreadyExists => (StatusCode::CONFLICT, self.to_string()),
            Error::UserNotFound => (StatusCode::NOT_FOUND, self.to_string()),
            Error::MissingField(_)
            | Error::MissingFile(_)
            | Error::InvalidUsername
            | Error::InvalidEmail
            | Error::InvalidPassword(_)
            | Error::LocalFile(_) => (StatusCode::BAD_REQUEST, self.to_string()),
        };

        (status, Json(serde_json::json!({ "message": message }))).into_response()
    }
}

pub(crate) async fn handle_middleware_errors(err: BoxError) -> (StatusCode, &'static str) {
    tracing::error!("Unhandled error: {:?}", err);
    (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error")
}
