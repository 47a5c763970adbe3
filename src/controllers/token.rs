use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::core::error::Error;
use crate::types::AuthorizedUser;

const ISSUER: &str = "https://api.mediacore.dev";

/// Identity facts frozen into an access token at issuance. Renaming a user
/// does not update tokens already in the wild; callers refresh to catch up.
#[derive(Debug, Deserialize, Serialize)]
pub(crate) struct AccessClaims {
    pub(crate) exp: usize,
    pub(crate) iat: usize,
    pub(crate) sub: String,
    pub(crate) iss: String,
    pub(crate) email: String,
    pub(crate) username: String,
    pub(crate) full_name: String,
}

#[derive(Debug, Deserialize, Serialize)]
pub(crate) struct RefreshClaims {
    pub(crate) exp: usize,
    pub(crate) iat: usize,
    pub(crate) sub: String,
    pub(crate) iss: String,
}

/// Mints and verifies the two token kinds. Access and refresh tokens are
/// signed with distinct secrets so compromise of one does not forge the other.
#[derive(Clone)]
pub(crate) struct TokenController {
    access_encoding_key: EncodingKey,
    access_decoding_key: DecodingKey,
    refresh_encoding_key: EncodingKey,
    refresh_decoding_key: DecodingKey,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl std::fmt::Debug for TokenController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenController")
            .field("access_ttl", &self.access_ttl)
            .field("refresh_ttl", &self.refresh_ttl)
            .finish()
    }
}

impl TokenController {
    pub(crate) fn new(
        access_secret: &str,
        refresh_secret: &str,
        access_ttl: Duration,
        refresh_ttl: Duration,
    ) -> Self {
        Self {
            access_encoding_key: EncodingKey::from_secret(access_secret.as_bytes()),
            access_decoding_key: DecodingKey::from_secret(access_secret.as_bytes()),
            refresh_encoding_key: EncodingKey::from_secret(refresh_secret.as_bytes()),
            refresh_decoding_key: DecodingKey::from_secret(refresh_secret.as_bytes()),
            access_ttl,
            refresh_ttl,
        }
    }

    pub(crate) fn issue_access_token(&self, user: &AuthorizedUser) -> Result<String, Error> {
        let current_time = Utc::now();
        let expiration_time = current_time + self.access_ttl;

        let claims = AccessClaims {
            exp: expiration_time.timestamp() as usize,
            iat: current_time.timestamp() as usize,
            sub: user.id.to_string(),
            iss: ISSUER.into(),
            email: user.email.clone(),
            username: user.username.clone(),
            full_name: user.full_name.clone(),
        };

        Ok(jsonwebtoken::encode(
            &Header::default(),
            &claims,
            &self.access_encoding_key,
        )?)
    }

    pub(crate) fn issue_refresh_token(&self, user: &AuthorizedUser) -> Result<String, Error> {
        let current_time = Utc::now();
        let expiration_time = current_time + self.refresh_ttl;

        let claims = RefreshClaims {
            exp: expiration_time.timestamp() as usize,
            iat: current_time.timestamp() as usize,
            sub: user.id.to_string(),
            iss: ISSUER.into(),
        };

        Ok(jsonwebtoken::encode(
            &Header::default(),
            &claims,
            &self.refresh_encoding_key,
        )?)
    }

    pub(crate) fn verify_access_token(&self, token: &str) -> Result<AccessClaims, Error> {
        match jsonwebtoken::decode::<AccessClaims>(
            token,
            &self.access_decoding_key,
            &Validation::default(),
        ) {
            Ok(token_data) => Ok(token_data.claims),
            Err(e) => match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => Err(Error::ExpiredToken),
                _ => Err(Error::Jwt(e)),
            },
        }
    }

    pub(crate) fn verify_refresh_token(&self, token: &str) -> Result<RefreshClaims, Error> {
        match jsonwebtoken::decode::<RefreshClaims>(
            token,
            &self.refresh_decoding_key,
            &Validation::default(),
        ) {
            Ok(token_data) => Ok(token_data.claims),
            Err(e) => match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => Err(Error::ExpiredToken),
                _ => Err(Error::Jwt(e)),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::AssetReference;

    fn controller() -> TokenController {
        TokenController::new(
            "access-secret",
            "refresh-secret",
            Duration::minutes(15),
            Duration::days(10),
        )
    }

    fn user() -> AuthorizedUser {
        AuthorizedUser {
            id: 7,
            username: "alice".into(),
            email: "a@x.com".into(),
            full_name: "Alice A".into(),
            password_hash: "$2b$12$abcdefghijklmnopqrstuv".into(),
            refresh_token: None,
            avatar: AssetReference {
                public_id: "avatar-7".into(),
                url: "https://assets.test/avatar-7".into(),
            },
            cover_image: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn tamper(token: &str) -> String {
        let mut chars: Vec<char> = token.chars().collect();
        let mut target = chars.len() / 2;
        if chars[target] == '.' {
            target += 1;
        }
        chars[target] = if chars[target] == 'A' { 'B' } else { 'A' };
        chars.into_iter().collect()
    }

    #[test]
    fn access_token_round_trip() {
        let controller = controller();
        let token = controller.issue_access_token(&user()).unwrap();

        let claims = controller.verify_access_token(&token).unwrap();
        assert_eq!(claims.sub, "7");
        assert_eq!(claims.email, "a@x.com");
        assert_eq!(claims.username, "alice");
        assert_eq!(claims.full_name, "Alice A");
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn refresh_token_round_trip() {
        let controller = controller();
        let token = controller.issue_refresh_token(&user()).unwrap();

        let claims = controller.verify_refresh_token(&token).unwrap();
        assert_eq!(claims.sub, "7");
    }

    #[test]
    fn tampered_token_is_rejected() {
        let controller = controller();
        let token = controller.issue_access_token(&user()).unwrap();

        assert!(controller.verify_access_token(&tamper(&token)).is_err());
    }

    #[test]
    fn token_kinds_do_not_cross_verify() {
        let controller = controller();
        let access = controller.issue_access_token(&user()).unwrap();
        let refresh = controller.issue_refresh_token(&user()).unwrap();

        assert!(controller.verify_refresh_token(&access).is_err());
        assert!(controller.verify_access_token(&refresh).is_err());
    }

    #[test]
    fn expired_token_is_rejected() {
        // past the default 60s validation leeway
        let controller = TokenController::new(
            "access-secret",
            "refresh-secret",
            Duration::minutes(-5),
            Duration::minutes(-5),
        );

        let token = controller.issue_access_token(&user()).unwrap();
        assert!(matches!(
            controller.verify_access_token(&token),
            Err(Error::ExpiredToken)
        ));

        let token = controller.issue_refresh_token(&user()).unwrap();
        assert!(matches!(
            controller.verify_refresh_token(&token),
            Err(Error::ExpiredToken)
        ));
    }
}
