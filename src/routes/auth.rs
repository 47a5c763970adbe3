use axum::extract::{Extension, Json, State};
use axum::http::StatusCode;
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use tracing::instrument;

use crate::core::error::Error;
use crate::core::state::AppState;
use crate::types::{User, request, response};
use crate::utils::auth::{ACCESS_TOKEN_COOKIE, REFRESH_TOKEN_COOKIE};

/// HttpOnly + Secure + SameSite=None, matching the cross-site browser client.
fn token_cookie(name: &'static str, value: String) -> Cookie<'static> {
    Cookie::build((name, value))
        .http_only(true)
        .secure(true)
        .same_site(SameSite::None)
        .path("/")
        .build()
}

fn removal_cookie(name: &'static str) -> Cookie<'static> {
    Cookie::build(name).path("/").build()
}

#[instrument(skip(state, data))]
pub(crate) async fn register(
    State(state): State<AppState>,
    Json(data): Json<request::RegisterData>,
) -> Result<(StatusCode, Json<User>), Error> {
    let registration = state.user_controller.validate_registration(
        &data.username,
        &data.email,
        &data.full_name,
        &data.password,
    )?;

    // the avatar slot may never be left empty, and conflicts are cheaper to
    // detect before anything is uploaded
    if data.avatar_path.trim().is_empty() {
        return Err(Error::MissingFile("avatar"));
    }

    if state
        .user_controller
        .exists(&registration.username, &registration.email)
        .await?
    {
        return Err(Error::UserAlreadyExists);
    }

    let avatar = state.asset_coordinator.upload(&data.avatar_path).await?;

    let cover_image = match data.cover_path.as_deref() {
        Some(path) if !path.trim().is_empty() => {
            match state.asset_coordinator.upload(path).await {
                Ok(cover) => Some(cover),
                Err(e) => {
                    state.asset_coordinator.discard(&avatar).await;
                    return Err(e);
                }
            }
        }
        _ => None,
    };

    match state
        .user_controller
        .create(registration, avatar.clone(), cover_image.clone())
        .await
    {
        Ok(user) => Ok((StatusCode::CREATED, Json(user))),
        Err(e) => {
            state.asset_coordinator.discard(&avatar).await;
            if let Some(cover) = &cover_image {
                state.asset_coordinator.discard(cover).await;
            }
            Err(e)
        }
    }
}

#[instrument(skip(state, data))]
pub(crate) async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(data): Json<request::LoginData>,
) -> Result<(CookieJar, Json<response::Login>), Error> {
    let user = state
        .user_controller
        .authenticate(&data.identity, &data.password)
        .await?;

    let access_token = state.token_controller.issue_access_token(&user)?;
    let refresh_token = state.token_controller.issue_refresh_token(&user)?;

    state
        .user_controller
        .set_refresh_token(user.id, Some(&refresh_token))
        .await?;

    let jar = jar
        .add(token_cookie(ACCESS_TOKEN_COOKIE, access_token.clone()))
        .add(token_cookie(REFRESH_TOKEN_COOKIE, refresh_token.clone()));

    Ok((
        jar,
        Json(response::Login {
            user: user.into(),
            access_token,
            refresh_token,
        }),
    ))
}

#[instrument(skip(state, jar, body))]
pub(crate) async fn refresh(
    State(state): State<AppState>,
    jar: CookieJar,
    body: Option<Json<request::RefreshData>>,
) -> Result<(CookieJar, Json<response::TokenPair>), Error> {
    let incoming = jar
        .get(REFRESH_TOKEN_COOKIE)
        .map(|cookie| cookie.value().to_string())
        .or_else(|| body.map(|Json(data)| data.refresh_token))
        .ok_or(Error::NoCredentials)?;

    let claims = state.token_controller.verify_refresh_token(&incoming)?;

    let id: i32 = claims.sub.parse().map_err(|_| Error::Unauthorized)?;

    let user = state
        .user_controller
        .get_by_id(id)
        .await?
        .ok_or(Error::Unauthorized)?;

    match user.refresh_token.as_deref() {
        Some(stored) if stored == incoming => (),
        _ => return Err(Error::Unauthorized),
    }

    let access_token = state.token_controller.issue_access_token(&user)?;
    let refresh_token = state.token_controller.issue_refresh_token(&user)?;

    // compare-and-swap: a concurrent refresh that rotated the slot first
    // wins, and this request fails instead of minting a second valid pair
    state
        .user_controller
        .rotate_refresh_token(id, &incoming, &refresh_token)
        .await?;

    let jar = jar
        .add(token_cookie(ACCESS_TOKEN_COOKIE, access_token.clone()))
        .add(token_cookie(REFRESH_TOKEN_COOKIE, refresh_token.clone()));

    Ok((
        jar,
        Json(response::TokenPair {
            access_token,
            refresh_token,
        }),
    ))
}

#[instrument(skip(state, jar))]
pub(crate) async fn logout(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    jar: CookieJar,
) -> Result<(CookieJar, Json<&'static str>), Error> {
    state.user_controller.set_refresh_token(user.id, None).await?;

    let jar = jar
        .remove(removal_cookie(ACCESS_TOKEN_COOKIE))
        .remove(removal_cookie(REFRESH_TOKEN_COOKIE));

    Ok((jar, Json("Logged out")))
}
