use domain::UserId;
use serde::{Deserialize, Serialize};

/// アクセストークンを保持するCookie名
pub const ACCESS_TOKEN_COOKIE: &str = "todo-access-token";
/// リフレッシュトークンを保持するCookie名
pub const REFRESH_TOKEN_COOKIE: &str = "todo-refresh-token";

/// IDトークンのクレーム（利用するものだけ）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    #[serde(default)]
    pub email: Option<String>,
    pub exp: i64,
    #[serde(default)]
    pub iat: Option<i64>,
}

/// 認可コード交換で得られるログインセッション
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub user_id: UserId,
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_in: u64,
}

impl Session {
    pub fn new(user_id: UserId, access_token: impl Into<String>) -> Self {
        Self {
            user_id,
            access_token: access_token.into(),
            refresh_token: None,
            expires_in: 3600,
        }
    }

    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.access_token)
    }
}
