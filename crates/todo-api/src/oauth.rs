//! OAuth 認可コードフロー
//!
//! サインイン開始、コールバックでのコード交換、サインアウトを扱う。
//! 失敗時は固定のエラールートへリダイレクトする。

use crate::models::ApiGatewayProxyResponse;
use crate::responses::redirect_response;
use async_trait::async_trait;
use domain::UserId;
use jsonwebtoken::{DecodingKey, Validation};
use serde::Deserialize;
use shared::{
    AppError, Claims, Config, OAuthConfig, Session, ACCESS_TOKEN_COOKIE, REFRESH_TOKEN_COOKIE,
};
use std::time::Duration;
use thiserror::Error;
use tracing::{error, info, warn};

/// コード交換失敗時のリダイレクト先
pub const AUTH_ERROR_PATH: &str = "/auth/auth-code-error";
/// サインアウト後のリダイレクト先
pub const SIGN_IN_PAGE_PATH: &str = "/auth";
pub const CALLBACK_PATH: &str = "/auth/callback";

const REFRESH_TOKEN_MAX_AGE_SECS: u64 = 60 * 60 * 24 * 30;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Token exchange failed: {0}")]
    Exchange(String),

    #[error("Invalid ID token: {0}")]
    InvalidIdToken(String),
}

/// 認可コードをセッションに交換するIDプロバイダーのポート
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn exchange_code(&self, code: &str, redirect_uri: &str) -> Result<Session, AuthError>;
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    id_token: Option<String>,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    expires_in: Option<u64>,
}

/// トークンエンドポイントへの form POST でコードを交換する実装
pub struct OAuthCodeExchanger {
    http: reqwest::Client,
    config: OAuthConfig,
}

impl OAuthCodeExchanger {
    pub fn new(config: OAuthConfig) -> Result<Self, AppError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| AppError::Configuration(format!("HTTP client: {e}")))?;

        Ok(Self { http, config })
    }
}

#[async_trait]
impl IdentityProvider for OAuthCodeExchanger {
    async fn exchange_code(&self, code: &str, redirect_uri: &str) -> Result<Session, AuthError> {
        let params = [
            ("grant_type", "authorization_code"),
            ("client_id", self.config.client_id.as_str()),
            ("code", code),
            ("redirect_uri", redirect_uri),
        ];

        let mut request = self.http.post(&self.config.token_endpoint).form(&params);
        if let Some(secret) = &self.config.client_secret {
            request = request.basic_auth(&self.config.client_id, Some(secret));
        }

        let response = request
            .send()
            .await
            .map_err(|e| AuthError::Exchange(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AuthError::Exchange(format!("{status}: {body}")));
        }

        let tokens: TokenResponse = response
            .json()
            .await
            .map_err(|e| AuthError::Exchange(e.to_string()))?;

        let id_token = tokens
            .id_token
            .as_deref()
            .ok_or_else(|| AuthError::InvalidIdToken("id_token missing".to_string()))?;

        Ok(Session {
            user_id: user_from_id_token(id_token)?,
            access_token: tokens.access_token,
            refresh_token: tokens.refresh_token,
            expires_in: tokens.expires_in.unwrap_or(3600),
        })
    }
}

/// IDトークンから利用者を取り出す
///
/// トークンはトークンエンドポイントから TLS で直接受け取ったものなので、
/// ここでは署名を検証せず有効期限のみ確認する。
pub fn user_from_id_token(id_token: &str) -> Result<UserId, AuthError> {
    let mut validation = Validation::default();
    validation.insecure_disable_signature_validation();
    validation.validate_aud = false;

    let data = jsonwebtoken::decode::<Claims>(id_token, &DecodingKey::from_secret(&[]), &validation)
        .map_err(|e| AuthError::InvalidIdToken(e.to_string()))?;

    UserId::from_string(data.claims.sub).map_err(|e| AuthError::InvalidIdToken(e.to_string()))
}

/// ログイン後の遷移先を検証（同一オリジンの相対パスのみ許可）
pub fn sanitize_next(next: Option<&str>) -> &str {
    match next {
        Some(path) if path.starts_with('/') && !path.starts_with("//") => path,
        _ => "/",
    }
}

fn session_cookies(session: &Session) -> Vec<String> {
    let mut cookies = vec![format!(
        "{ACCESS_TOKEN_COOKIE}={}; Path=/; HttpOnly; Secure; SameSite=Lax; Max-Age={}",
        session.access_token, session.expires_in
    )];

    if let Some(refresh_token) = &session.refresh_token {
        cookies.push(format!(
            "{REFRESH_TOKEN_COOKIE}={refresh_token}; Path=/; HttpOnly; Secure; SameSite=Lax; Max-Age={REFRESH_TOKEN_MAX_AGE_SECS}"
        ));
    }
    cookies
}

fn expired_cookies() -> Vec<String> {
    [ACCESS_TOKEN_COOKIE, REFRESH_TOKEN_COOKIE]
        .iter()
        .map(|name| format!("{name}=; Path=/; HttpOnly; Secure; SameSite=Lax; Max-Age=0"))
        .collect()
}

/// GET /auth/signin: IDプロバイダーの認可画面へリダイレクト
pub fn sign_in(config: &Config) -> Result<ApiGatewayProxyResponse, AppError> {
    let redirect_uri = format!("{}{CALLBACK_PATH}", config.app_origin);

    let url = reqwest::Url::parse_with_params(
        &config.oauth.authorize_endpoint,
        &[
            ("response_type", "code"),
            ("client_id", config.oauth.client_id.as_str()),
            ("redirect_uri", redirect_uri.as_str()),
            ("identity_provider", config.oauth.identity_provider.as_str()),
            ("scope", "openid email profile"),
        ],
    )
    .map_err(|e| AppError::Configuration(format!("OAUTH_AUTHORIZE_ENDPOINT: {e}")))?;

    Ok(redirect_response(url.as_str(), Vec::new()))
}

/// GET /auth/callback: 認可コードをセッションに交換
pub async fn callback(
    identity: &dyn IdentityProvider,
    config: &Config,
    code: Option<&str>,
    next: Option<&str>,
) -> ApiGatewayProxyResponse {
    let origin = &config.app_origin;
    let error_location = format!("{origin}{AUTH_ERROR_PATH}");

    let Some(code) = code.filter(|c| !c.is_empty()) else {
        warn!("認可コードがありません");
        return redirect_response(&error_location, Vec::new());
    };

    let redirect_uri = format!("{origin}{CALLBACK_PATH}");
    match identity.exchange_code(code, &redirect_uri).await {
        Ok(session) => {
            info!("サインイン成功: user_id={}", session.user_id);
            let location = format!("{origin}{}", sanitize_next(next));
            redirect_response(&location, session_cookies(&session))
        }
        Err(e) => {
            error!("Error exchanging code: {}", e);
            redirect_response(&error_location, Vec::new())
        }
    }
}

/// POST /auth/signout: セッションCookieを破棄
pub fn sign_out(config: &Config) -> ApiGatewayProxyResponse {
    redirect_response(
        &format!("{}{SIGN_IN_PAGE_PATH}", config.app_origin),
        expired_cookies(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{EncodingKey, Header};
    use serde_json::json;

    fn id_token(sub: &str, exp: i64) -> String {
        jsonwebtoken::encode(
            &Header::default(),
            &json!({"sub": sub, "email": "test@example.com", "exp": exp, "aud": "client"}),
            &EncodingKey::from_secret(b"test-secret"),
        )
        .unwrap()
    }

    #[test]
    fn test_user_from_id_token() {
        let exp = chrono::Utc::now().timestamp() + 600;

        let user = user_from_id_token(&id_token("user123", exp)).unwrap();

        assert_eq!(user.as_str(), "user123");
    }

    #[test]
    fn test_expired_id_token_is_rejected() {
        let exp = chrono::Utc::now().timestamp() - 3600;

        assert!(user_from_id_token(&id_token("user123", exp)).is_err());
    }

    #[test]
    fn test_sanitize_next() {
        assert_eq!(sanitize_next(None), "/");
        assert_eq!(sanitize_next(Some("/todos")), "/todos");
        assert_eq!(sanitize_next(Some("//evil.example")), "/");
        assert_eq!(sanitize_next(Some("https://evil.example")), "/");
    }

    #[test]
    fn test_sign_in_redirects_to_authorize_endpoint() {
        let config = Config::from_lookup(|_| None).unwrap();

        let response = sign_in(&config).unwrap();

        let location = response.header("Location").unwrap();
        assert!(location.starts_with("http://localhost:9000/oauth2/authorize?"));
        assert!(location.contains("response_type=code"));
        assert!(location.contains("identity_provider=Google"));
        assert!(location.contains("redirect_uri=http%3A%2F%2Flocalhost%3A3000%2Fauth%2Fcallback"));
    }

    #[test]
    fn test_sign_out_expires_cookies() {
        let config = Config::from_lookup(|_| None).unwrap();

        let response = sign_out(&config);

        assert_eq!(response.header("Location"), Some("http://localhost:3000/auth"));
        let cookies = &response.multi_value_headers["Set-Cookie"];
        assert!(cookies.iter().all(|c| c.contains("Max-Age=0")));
    }
}
