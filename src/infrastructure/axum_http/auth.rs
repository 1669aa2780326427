use std::sync::Arc;

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use axum_extra::extract::CookieJar;
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::infrastructure::axum_http::error_responses::AppError;

pub const ACCESS_TOKEN_COOKIE: &str = "access_token";

/// HMAC key shared with the identity service, installed as a request
/// extension by the server.
#[derive(Clone)]
pub struct JwtSecret(pub Arc<str>);

#[derive(Debug, Serialize, Deserialize)]
pub struct AccessClaims {
    pub sub: String,
    pub exp: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthUser {
    pub user_id: Uuid,
}

pub fn validate_access_token(token: &str, secret: &str) -> Result<AccessClaims, AppError> {
    let decoding_key = DecodingKey::from_secret(secret.as_bytes());
    let validation = Validation::new(Algorithm::HS256);

    let token_data = decode::<AccessClaims>(token, &decoding_key, &validation)
        .map_err(|err| AppError::Unauthorized(format!("JWT validation failed: {err}")))?;

    Ok(token_data.claims)
}

fn bearer_token(parts: &Parts) -> Result<Option<String>, AppError> {
    let Some(header) = parts.headers.get(AUTHORIZATION) else {
        return Ok(None);
    };

    let value = header
        .to_str()
        .map_err(|_| AppError::Unauthorized("invalid Authorization header".to_string()))?;

    value
        .strip_prefix("Bearer ")
        .map(|token| Some(token.trim().to_string()))
        .ok_or_else(|| AppError::Unauthorized("invalid Authorization header format".to_string()))
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let secret = parts
            .extensions
            .get::<JwtSecret>()
            .cloned()
            .ok_or_else(|| AppError::Unauthorized("authentication is not configured".to_string()))?;

        let token = match bearer_token(parts)? {
            Some(token) => token,
            None => CookieJar::from_headers(&parts.headers)
                .get(ACCESS_TOKEN_COOKIE)
                .map(|cookie| cookie.value().to_string())
                .ok_or_else(|| AppError::Unauthorized("missing access token".to_string()))?,
        };

        let claims = validate_access_token(&token, &secret.0)?;
        let user_id = Uuid::parse_str(&claims.sub)
            .map_err(|_| AppError::Unauthorized("invalid user id in token".to_string()))?;

        Ok(AuthUser { user_id })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use axum::http::Request;
    use jsonwebtoken::{EncodingKey, Header, encode};

    pub(crate) const TEST_SECRET: &str = "supersecretjwtsecretforunittesting123";

    pub(crate) fn token_for(user_id: Uuid, secret: &str, exp: usize) -> String {
        encode(
            &Header::default(),
            &AccessClaims {
                sub: user_id.to_string(),
                exp,
            },
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    async fn extract(request: Request<()>) -> Result<AuthUser, AppError> {
        let (mut parts, _) = request.into_parts();
        parts.extensions.insert(JwtSecret(Arc::from(TEST_SECRET)));
        AuthUser::from_request_parts(&mut parts, &()).await
    }

    #[tokio::test]
    async fn bearer_token_is_accepted() {
        let user_id = Uuid::new_v4();
        let token = token_for(user_id, TEST_SECRET, 9_999_999_999);
        let request = Request::builder()
            .header(AUTHORIZATION, format!("Bearer {token}"))
            .body(())
            .unwrap();

        assert_eq!(extract(request).await.unwrap().user_id, user_id);
    }

    #[tokio::test]
    async fn cookie_token_is_accepted() {
        let user_id = Uuid::new_v4();
        let token = token_for(user_id, TEST_SECRET, 9_999_999_999);
        let request = Request::builder()
            .header("cookie", format!("{ACCESS_TOKEN_COOKIE}={token}"))
            .body(())
            .unwrap();

        assert_eq!(extract(request).await.unwrap().user_id, user_id);
    }

    #[tokio::test]
    async fn expired_token_is_rejected() {
        let token = token_for(Uuid::new_v4(), TEST_SECRET, 1);
        let request = Request::builder()
            .header(AUTHORIZATION, format!("Bearer {token}"))
            .body(())
            .unwrap();

        assert!(matches!(
            extract(request).await,
            Err(AppError::Unauthorized(_))
        ));
    }

    #[tokio::test]
    async fn wrong_signature_is_rejected() {
        let token = token_for(Uuid::new_v4(), "wrongsecret", 9_999_999_999);
        let request = Request::builder()
            .header(AUTHORIZATION, format!("Bearer {token}"))
            .body(())
            .unwrap();

        assert!(extract(request).await.is_err());
    }

    #[tokio::test]
    async fn missing_token_is_rejected() {
        let request = Request::builder().body(()).unwrap();
        assert!(matches!(
            extract(request).await,
            Err(AppError::Unauthorized(message)) if message == "missing access token"
        ));
    }
}
