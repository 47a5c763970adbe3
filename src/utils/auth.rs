use axum::extract::State;
use axum::{body::Body, extract::Request, http, http::HeaderMap, http::Response, middleware::Next};
use axum_extra::extract::cookie::CookieJar;

use crate::core::error::Error;
use crate::core::state::AppState;

pub(crate) const ACCESS_TOKEN_COOKIE: &str = "access_token";
pub(crate) const REFRESH_TOKEN_COOKIE: &str = "refresh_token";

/// Candidate access token from the cookie, else the bearer header. The cookie
/// wins when both are present.
pub(crate) fn extract_access_token(jar: &CookieJar, headers: &HeaderMap) -> Option<String> {
    if let Some(cookie) = jar.get(ACCESS_TOKEN_COOKIE) {
        return Some(cookie.value().to_string());
    }

    let header = headers.get(http::header::AUTHORIZATION)?.to_str().ok()?;

    header
        .strip_prefix("Bearer ")
        .map(|token| token.trim().to_string())
}

/// Pure gate in front of every protected route: verifies the access token,
/// resolves it to a live user and stashes the sanitized record on the request.
/// Never mutates state and never issues tokens.
pub(crate) async fn authenticate(
    State(state): State<AppState>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Result<Response<Body>, Error> {
    let token = extract_access_token(&jar, request.headers()).ok_or(Error::NoCredentials)?;

    let claims = state.token_controller.verify_access_token(&token)?;

    let id: i32 = claims.sub.parse().map_err(|_| Error::Unauthorized)?;

    let user = state
        .user_controller
        .get_sanitized_by_id(id)
        .await?
        .ok_or(Error::Unauthorized)?;

    request.extensions_mut().insert(user);

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum_extra::extract::cookie::Cookie;

    fn bearer(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(http::header::AUTHORIZATION, value.parse().unwrap());
        headers
    }

    #[test]
    fn cookie_takes_precedence_over_header() {
        let jar = CookieJar::new().add(Cookie::new(ACCESS_TOKEN_COOKIE, "from-cookie"));
        let headers = bearer("Bearer from-header");

        assert_eq!(
            extract_access_token(&jar, &headers),
            Some("from-cookie".to_string())
        );
    }

    #[test]
    fn bearer_header_used_when_cookie_absent() {
        let jar = CookieJar::new();
        let headers = bearer("Bearer from-header");

        assert_eq!(
            extract_access_token(&jar, &headers),
            Some("from-header".to_string())
        );
    }

    #[test]
    fn missing_credentials_yield_none() {
        assert_eq!(extract_access_token(&CookieJar::new(), &HeaderMap::new()), None);
    }

    #[test]
    fn non_bearer_authorization_is_ignored() {
        let jar = CookieJar::new();
        let headers = bearer("Basic dXNlcjpwdw==");

        assert_eq!(extract_access_token(&jar, &headers), None);
    }
}
