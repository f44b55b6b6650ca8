use axum::async_trait;
use axum::extract::FromRef;
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use clap::ValueEnum;
use jsonwebtoken::{decode, encode, get_current_timestamp, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use mm_common::model::User;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

pub const DEFAULT_TOKEN_TTL_SECS: u64 = 3600;
const API_KEY_HEADER: &str = "x-api-key";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
#[value(rename_all = "snake_case")]
pub enum AuthMode {
    ApiKey,
    Jwt,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
#[value(rename_all = "lowercase")]
pub enum JwtAlgorithm {
    Hs256,
    Hs384,
    Hs512,
}

impl JwtAlgorithm {
    fn algorithm(self) -> Algorithm {
        match self {
            JwtAlgorithm::Hs256 => Algorithm::HS256,
            JwtAlgorithm::Hs384 => Algorithm::HS384,
            JwtAlgorithm::Hs512 => Algorithm::HS512,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub mode: AuthMode,
    pub api_key: Option<String>,
    pub jwt_secret: Option<String>,
    pub jwt_algorithm: JwtAlgorithm,
    /// Lifetime of tokens issued at login and registration.
    pub token_ttl_secs: u64,
}

impl AuthConfig {
    pub fn api_key(key: &str) -> Self {
        Self {
            mode: AuthMode::ApiKey,
            api_key: Some(key.to_string()),
            jwt_secret: None,
            jwt_algorithm: JwtAlgorithm::Hs256,
            token_ttl_secs: DEFAULT_TOKEN_TTL_SECS,
        }
    }
}

/// Authenticated caller. `subject` is the JWT `sub` claim, or `api_key`.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub subject: String,
}

/// Signed-in account resolved from a Bearer token. Unlike [`AuthUser`], an API key never satisfies it.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub user_id: String,
}

#[derive(Debug, Deserialize)]
struct Claims {
    sub: String,
}

#[derive(Debug, Serialize)]
struct SessionClaims<'a> {
    sub: &'a str,
    role: &'a str,
    iat: u64,
    exp: u64,
}

/// Bearer token returned by login and registration.
#[derive(Debug, Clone, Serialize)]
pub struct IssuedToken {
    pub access_token: String,
    pub token_type: &'static str,
    pub expires_in: u64,
}

/// Signs a session token for `user` with the configured secret and algorithm.
pub fn issue_token(config: &AuthConfig, user: &User) -> Result<IssuedToken, ApiError> {
    let secret = config
        .jwt_secret
        .as_deref()
        .ok_or_else(|| ApiError::ServiceUnavailable("JWT_SECRET is not set; sign-in is disabled".into()))?;

    let iat = get_current_timestamp();
    let claims = SessionClaims {
        sub: &user.id,
        role: user.role.as_ref(),
        iat,
        exp: iat + config.token_ttl_secs,
    };
    let access_token = encode(
        &Header::new(config.jwt_algorithm.algorithm()),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|err| ApiError::Internal(format!("failed to sign token: {err}")))?;

    Ok(IssuedToken {
        access_token,
        token_type: "Bearer",
        expires_in: config.token_ttl_secs,
    })
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    AuthConfig: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let config = AuthConfig::from_ref(state);

        match config.mode {
            AuthMode::ApiKey if presents_session_token(parts, &config) => authorize_jwt(parts, &config),
            AuthMode::ApiKey => authorize_api_key(parts, &config),
            AuthMode::Jwt => authorize_jwt(parts, &config),
        }
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    AuthConfig: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let config = AuthConfig::from_ref(state);
        let user = authorize_jwt(parts, &config)?;
        Ok(CurrentUser { user_id: user.subject })
    }
}

// In api_key mode a signed-in user may send its session token instead of the key.
fn presents_session_token(parts: &Parts, config: &AuthConfig) -> bool {
    config.jwt_secret.is_some()
        && !parts.headers.contains_key(API_KEY_HEADER)
        && parts.headers.contains_key(AUTHORIZATION)
}

fn authorize_api_key(parts: &Parts, config: &AuthConfig) -> Result<AuthUser, ApiError> {
    let expected = config
        .api_key
        .as_deref()
        .ok_or_else(|| ApiError::Unauthorized("missing MM_API_KEY".into()))?;

    let provided = parts
        .headers
        .get(API_KEY_HEADER)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| ApiError::Unauthorized("missing X-API-Key header".into()))?;

    if provided != expected {
        return Err(ApiError::Unauthorized("invalid API key".into()));
    }

    Ok(AuthUser {
        subject: "api_key".to_string(),
    })
}

fn authorize_jwt(parts: &Parts, config: &AuthConfig) -> Result<AuthUser, ApiError> {
    let secret = config
        .jwt_secret
        .as_deref()
        .ok_or_else(|| ApiError::Unauthorized("missing JWT_SECRET".into()))?;

    let header = parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| ApiError::Unauthorized("missing Authorization header".into()))?;

    let token = header
        .strip_prefix("Bearer ")
        .ok_or_else(|| ApiError::Unauthorized("expected Bearer token".into()))?;

    let validation = Validation::new(config.jwt_algorithm.algorithm());

    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map_err(|err| ApiError::Unauthorized(format!("invalid token: {err}")))?;

    Ok(AuthUser {
        subject: data.claims.sub,
    })
}

#[cfg(test)]
mod tests {
    use axum::http::Request;
    use mm_common::model::UserRole;

    use super::*;

    #[derive(Serialize)]
    struct TestClaims<'a> {
        sub: &'a str,
        exp: usize,
    }

    fn parts_with(name: &str, value: &str) -> Parts {
        let (parts, _) = Request::builder()
            .header(name, value)
            .body(())
            .unwrap()
            .into_parts();
        parts
    }

    fn jwt_config(algorithm: JwtAlgorithm) -> AuthConfig {
        AuthConfig {
            mode: AuthMode::Jwt,
            api_key: None,
            jwt_secret: Some("s3cret".into()),
            jwt_algorithm: algorithm,
            token_ttl_secs: DEFAULT_TOKEN_TTL_SECS,
        }
    }

    fn user(id: &str) -> User {
        let now = "2024-01-01T00:00:00Z".parse().unwrap();
        User {
            id: id.into(),
            role: UserRole::Mentor,
            name: "Ana".into(),
            email: "ana@example.com".into(),
            phone: None,
            verified_email: false,
            verified_phone: false,
            locale: "pt-BR".into(),
            timezone: "America/Sao_Paulo".into(),
            avatar_url: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn api_key_must_match() {
        let config = AuthConfig::api_key("test-key");
        assert!(authorize_api_key(&parts_with("x-api-key", "test-key"), &config).is_ok());
        assert!(matches!(
            authorize_api_key(&parts_with("x-api-key", "wrong"), &config),
            Err(ApiError::Unauthorized(_))
        ));
    }

    #[test]
    fn accepts_token_signed_with_configured_algorithm() {
        let claims = TestClaims {
            sub: "user-42",
            exp: 4_102_444_800,
        };
        let token = encode(
            &Header::new(Algorithm::HS512),
            &claims,
            &EncodingKey::from_secret(b"s3cret"),
        )
        .unwrap();
        let parts = parts_with("authorization", &format!("Bearer {token}"));

        let user = authorize_jwt(&parts, &jwt_config(JwtAlgorithm::Hs512)).unwrap();
        assert_eq!(user.subject, "user-42");

        assert!(authorize_jwt(&parts, &jwt_config(JwtAlgorithm::Hs256)).is_err());
    }

    #[test]
    fn rejects_missing_bearer_prefix() {
        let parts = parts_with("authorization", "Token abc");
        assert!(matches!(
            authorize_jwt(&parts, &jwt_config(JwtAlgorithm::Hs256)),
            Err(ApiError::Unauthorized(_))
        ));
    }

    #[test]
    fn issued_token_authorizes_its_user() {
        let config = jwt_config(JwtAlgorithm::Hs384);
        let issued = issue_token(&config, &user("user-7")).unwrap();
        assert_eq!(issued.token_type, "Bearer");
        assert_eq!(issued.expires_in, DEFAULT_TOKEN_TTL_SECS);

        let parts = parts_with("authorization", &format!("Bearer {}", issued.access_token));
        assert_eq!(authorize_jwt(&parts, &config).unwrap().subject, "user-7");
    }

    #[test]
    fn issuing_without_secret_is_unavailable() {
        let config = AuthConfig::api_key("test-key");
        assert!(matches!(
            issue_token(&config, &user("user-7")),
            Err(ApiError::ServiceUnavailable(_))
        ));
    }

    #[test]
    fn api_key_mode_accepts_session_tokens_only_with_a_secret() {
        let mut config = AuthConfig::api_key("test-key");
        let bearer = parts_with("authorization", "Bearer abc");
        assert!(!presents_session_token(&bearer, &config));

        config.jwt_secret = Some("s3cret".into());
        assert!(presents_session_token(&bearer, &config));
        assert!(!presents_session_token(&parts_with("x-api-key", "test-key"), &config));
    }
}
