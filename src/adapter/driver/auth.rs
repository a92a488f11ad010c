use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{header, request::Parts, StatusCode},
    response::Json,
};
use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

use crate::adapter::driver::rest_api::ApiError;
use crate::domain::model::{Role, UserId, VerifiedIdentity};

/// トークンを格納するクッキー名
const TOKEN_COOKIE: &str = "jwt";

/// トークン検証のエラー
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum AuthError {
    #[error("Not authorized, no token")]
    MissingToken,
    #[error("Not authorized, token failed: {0}")]
    InvalidToken(String),
    #[error("Not authorized, invalid claims: {0}")]
    InvalidClaims(String),
}

/// トークンのクレーム
/// 発行は外部の認証サービスが行う
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    #[serde(alias = "sub")]
    pub id: String,
    pub role: String,
    pub exp: usize,
}

/// HS256トークンの検証器
pub struct JwtVerifier {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl JwtVerifier {
    /// 共有シークレットから検証器を作成
    pub fn new(secret: &str) -> Self {
        Self {
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation: Validation::default(),
        }
    }

    /// トークンを検証し、呼び出し元の身元を返す
    pub fn verify(&self, token: &str) -> Result<VerifiedIdentity, AuthError> {
        let data = decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| AuthError::InvalidToken(e.to_string()))?;

        let user_id = UserId::from_string(&data.claims.id)
            .map_err(|e| AuthError::InvalidClaims(e.to_string()))?;
        let role = Role::from_string(&data.claims.role)
            .map_err(|e| AuthError::InvalidClaims(e.to_string()))?;

        Ok(VerifiedIdentity::new(user_id, role))
    }
}

/// AuthorizationヘッダーまたはjwtクッキーからBearerトークンを取り出す
fn extract_token(parts: &Parts) -> Option<&str> {
    let bearer = parts
        .headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty());
    if bearer.is_some() {
        return bearer;
    }

    parts
        .headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|cookies| cookies.split(';'))
        .filter_map(|cookie| cookie.trim().strip_prefix(TOKEN_COOKIE)?.strip_prefix('='))
        .find(|token| !token.is_empty())
}

/// 検証済みの呼び出し元
/// ハンドラーの引数に指定すると認証が必須になる
#[derive(Debug, Clone, Copy)]
pub struct AuthenticatedUser(pub VerifiedIdentity);

impl AuthenticatedUser {
    /// 呼び出し元のロールが許可されていることを確認
    pub fn require_role(&self, allowed: &[Role]) -> Result<(), (StatusCode, Json<ApiError>)> {
        if self.0.has_any_role(allowed) {
            return Ok(());
        }
        Err((
            StatusCode::FORBIDDEN,
            Json(ApiError {
                error: format!(
                    "User role {} is not authorized to access this route",
                    self.0.role()
                ),
                code: "FORBIDDEN".to_string(),
            }),
        ))
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthenticatedUser
where
    Arc<JwtVerifier>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = (StatusCode, Json<ApiError>);

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let verifier = Arc::<JwtVerifier>::from_ref(state);

        let result = extract_token(parts)
            .ok_or(AuthError::MissingToken)
            .and_then(|token| verifier.verify(token));

        match result {
            Ok(identity) => Ok(Self(identity)),
            Err(err) => {
                debug!(error = %err, "request rejected by token verification");
                Err((
                    StatusCode::UNAUTHORIZED,
                    Json(ApiError {
                        error: err.to_string(),
                        code: "UNAUTHORIZED".to_string(),
                    }),
                ))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;
    use jsonwebtoken::{encode, EncodingKey, Header};

    const SECRET: &str = "test-secret";

    fn token_for(id: &str, role: &str, exp: usize) -> String {
        let claims = Claims {
            id: id.to_string(),
            role: role.to_string(),
            exp,
        };
        encode(&Header::default(), &claims, &EncodingKey::from_secret(SECRET.as_bytes())).unwrap()
    }

    fn future_exp() -> usize {
        (chrono::Utc::now().timestamp() + 3600) as usize
    }

    #[test]
    fn test_verify_valid_token() {
        let user_id = UserId::new();
        let token = token_for(&user_id.to_string(), "organizer", future_exp());

        let identity = JwtVerifier::new(SECRET).verify(&token).unwrap();

        assert_eq!(identity.user_id(), user_id);
        assert_eq!(identity.role(), Role::Organizer);
    }

    #[test]
    fn test_verify_accepts_legacy_role_label() {
        let token = token_for(&UserId::new().to_string(), "Standard User", future_exp());

        let identity = JwtVerifier::new(SECRET).verify(&token).unwrap();
        assert_eq!(identity.role(), Role::User);
    }

    #[test]
    fn test_verify_rejects_wrong_secret() {
        let token = token_for(&UserId::new().to_string(), "user", future_exp());

        let result = JwtVerifier::new("another-secret").verify(&token);
        assert!(matches!(result, Err(AuthError::InvalidToken(_))));
    }

    #[test]
    fn test_verify_rejects_expired_token() {
        let token = token_for(&UserId::new().to_string(), "user", 1);

        let result = JwtVerifier::new(SECRET).verify(&token);
        assert!(matches!(result, Err(AuthError::InvalidToken(_))));
    }

    #[test]
    fn test_verify_rejects_unknown_role() {
        let token = token_for(&UserId::new().to_string(), "superuser", future_exp());

        let result = JwtVerifier::new(SECRET).verify(&token);
        assert!(matches!(result, Err(AuthError::InvalidClaims(_))));
    }

    #[test]
    fn test_extract_token_prefers_authorization_header() {
        let (parts, _) = Request::builder()
            .header(header::AUTHORIZATION, "Bearer from-header")
            .header(header::COOKIE, "jwt=from-cookie")
            .body(())
            .unwrap()
            .into_parts();

        assert_eq!(extract_token(&parts), Some("from-header"));
    }

    #[test]
    fn test_extract_token_from_cookie() {
        let (parts, _) = Request::builder()
            .header(header::COOKIE, "theme=dark; jwt=from-cookie")
            .body(())
            .unwrap()
            .into_parts();

        assert_eq!(extract_token(&parts), Some("from-cookie"));
    }

    #[test]
    fn test_extract_token_missing() {
        let (parts, _) = Request::builder()
            .header(header::COOKIE, "jwtx=nope")
            .body(())
            .unwrap()
            .into_parts();

        assert_eq!(extract_token(&parts), None);
    }
}
