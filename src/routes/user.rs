use axum::Json;
use axum::extract::{Extension, State};
use tracing::instrument;

use crate::controllers::asset::AssetSlot;
use crate::core::error::Error;
use crate::core::state::AppState;
use crate::types::{User, request};

#[instrument(skip_all)]
pub(crate) async fn me(Extension(user): Extension<User>) -> Json<User> {
    Json(user)
}

#[instrument(skip_all)]
pub(crate) async fn update_password(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Json(data): Json<request::UpdatePasswordData>,
) -> Result<Json<&'static str>, Error> {
    state
        .user_controller
        .update_password(user.id, &data.old_password, &data.new_password)
        .await?;

    Ok(Json("Password updated successfully"))
}

#[instrument(skip_all)]
pub(crate) async fn update_profile(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Json(data): Json<request::UpdateProfileData>,
) -> Result<Json<User>, Error> {
    let user = state
        .user_controller
        .update_profile(user.id, &data.full_name, &data.email)
        .await?;

    Ok(Json(user))
}

#[instrument(skip_all)]
pub(crate) async fn update_avatar(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Json(data): Json<request::UpdateAvatarData>,
) -> Result<Json<User>, Error> {
    // the avatar slot is mandatory; reject before anything is uploaded
    if data.avatar_path.trim().is_empty() {
        return Err(Error::MissingFile("avatar"));
    }

    state
        .asset_coordinator
        .replace(
            &state.user_controller,
            user.id,
            AssetSlot::Avatar,
            &data.avatar_path,
        )
        .await?;

    let user = state
        .user_controller
        .get_sanitized_by_id(user.id)
        .await?
        .ok_or(Error::UserNotFound)?;

    Ok(Json(user))
}

#[instrument(skip_all)]
pub(crate) async fn update_cover(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Json(data): Json<request::UpdateCoverData>,
) -> Result<Json<User>, Error> {
    // the cover slot is optional; an absent path is a no-op success
    let path = match data.cover_path.as_deref() {
        Some(path) if !path.trim().is_empty() => path.to_string(),
        _ => {
            let user = state
                .user_controller
                .get_sanitized_by_id(user.id)
                .await?
                .ok_or(Error::UserNotFound)?;

            return Ok(Json(user));
        }
    };

    state
        .asset_coordinator
        .replace(&state.user_controller, user.id, AssetSlot::Cover, &path)
        .await?;

    let user = state
        .user_controller
        .get_sanitized_by_id(user.id)
        .await?
        .ok_or(Error::UserNotFound)?;

    Ok(Json(user))
}
