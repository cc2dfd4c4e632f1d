use crate::models::ApiGatewayProxyResponse;
use serde::Serialize;
use shared::{AppError, ErrorResponse};
use std::collections::HashMap;

fn json_headers() -> HashMap<String, String> {
    let mut headers = HashMap::new();
    headers.insert("Content-Type".to_string(), "application/json".to_string());
    headers
}

/// 成功レスポンスを作成
pub fn create_success_response(
    status_code: u16,
    body: &impl Serialize,
) -> Result<ApiGatewayProxyResponse, AppError> {
    let body = serde_json::to_string(body).map_err(|e| AppError::Serialization(e.to_string()))?;

    Ok(ApiGatewayProxyResponse {
        status_code,
        headers: json_headers(),
        multi_value_headers: HashMap::new(),
        body,
        is_base64_encoded: false,
    })
}

/// エラーレスポンスを作成
pub fn create_error_response(status_code: u16, message: &str) -> ApiGatewayProxyResponse {
    let body = serde_json::to_string(&ErrorResponse::new(message))
        .unwrap_or_else(|_| r#"{"error":"Internal server error"}"#.to_string());

    ApiGatewayProxyResponse {
        status_code,
        headers: json_headers(),
        multi_value_headers: HashMap::new(),
        body,
        is_base64_encoded: false,
    }
}

/// AppError からエラーレスポンスを作成
pub fn error_response(error: &AppError, fallback: &str) -> ApiGatewayProxyResponse {
    create_error_response(error.http_status_code(), &error.user_message(fallback))
}

/// 302 リダイレクトを作成
pub fn redirect_response(location: &str, cookies: Vec<String>) -> ApiGatewayProxyResponse {
    let mut headers = HashMap::new();
    headers.insert("Location".to_string(), location.to_string());

    let mut multi_value_headers = HashMap::new();
    if !cookies.is_empty() {
        multi_value_headers.insert("Set-Cookie".to_string(), cookies);
    }

    ApiGatewayProxyResponse {
        status_code: 302,
        headers,
        multi_value_headers,
        body: String::new(),
        is_base64_encoded: false,
    }
}

/// プリフライト用の空レスポンス
pub fn no_content_response() -> ApiGatewayProxyResponse {
    ApiGatewayProxyResponse {
        status_code: 204,
        headers: HashMap::new(),
        multi_value_headers: HashMap::new(),
        body: String::new(),
        is_base64_encoded: false,
    }
}

pub fn add_cors_headers(response: &mut ApiGatewayProxyResponse) {
    response
        .headers
        .insert("Access-Control-Allow-Origin".to_string(), "*".to_string());
    response.headers.insert(
        "Access-Control-Allow-Methods".to_string(),
        "GET,POST,PUT,PATCH,DELETE,OPTIONS".to_string(),
    );
    response.headers.insert(
        "Access-Control-Allow-Headers".to_string(),
        "Content-Type,Authorization".to_string(),
    );
}
