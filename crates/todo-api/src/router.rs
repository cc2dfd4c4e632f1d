use crate::handlers;
use crate::models::{ApiGatewayProxyRequest, ApiGatewayProxyResponse};
use crate::oauth;
use crate::responses::{add_cors_headers, error_response, no_content_response};
use crate::state::AppState;
use domain::{TodoId, UserId};
use infrastructure::SortOrder;
use shared::{log_error, trace_http_request, AppError};
use tracing::info;

/// リクエストが指すルート
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Preflight,
    ListTodos { order: SortOrder },
    CreateTodo,
    UpdateTodo { todo_id: TodoId },
    DeleteTodo { todo_id: TodoId },
    SignIn,
    AuthCallback,
    SignOut,
}

impl Route {
    /// 想定外の失敗時に返す固定メッセージ
    pub fn failure_message(&self) -> &'static str {
        match self {
            Route::ListTodos { .. } => "Error fetching todos",
            Route::CreateTodo => "Error creating todo",
            Route::UpdateTodo { .. } => "Error updating todo",
            Route::DeleteTodo { .. } => "Error deleting todo",
            _ => "Internal server error",
        }
    }

    fn requires_user(&self) -> bool {
        matches!(
            self,
            Route::ListTodos { .. }
                | Route::CreateTodo
                | Route::UpdateTodo { .. }
                | Route::DeleteTodo { .. }
        )
    }
}

/// `/api` 接頭辞と末尾スラッシュを取り除く
fn normalize_path(path: &str) -> &str {
    let path = match path.strip_prefix("/api") {
        Some(rest) if rest.starts_with('/') => rest,
        _ => path,
    };
    match path.trim_end_matches('/') {
        "" => "/",
        trimmed => trimmed,
    }
}

/// メソッドとパスからルートを決定
pub fn parse_route(request: &ApiGatewayProxyRequest) -> Result<Route, AppError> {
    let method = request.http_method.to_ascii_uppercase();
    let path = normalize_path(&request.path);

    if method == "OPTIONS" {
        return Ok(Route::Preflight);
    }

    match (method.as_str(), path) {
        ("GET", "/todos") => {
            let order = match request.query("order") {
                None => SortOrder::default(),
                Some(value) => SortOrder::parse(value).ok_or_else(|| {
                    AppError::Validation(format!("Invalid order parameter: {value}"))
                })?,
            };
            Ok(Route::ListTodos { order })
        }
        ("POST", "/todos") => Ok(Route::CreateTodo),
        ("GET", "/auth/signin") => Ok(Route::SignIn),
        ("GET", "/auth/callback") => Ok(Route::AuthCallback),
        ("POST", "/auth/signout") => Ok(Route::SignOut),
        (_, p) if p.starts_with("/todos/") => {
            let todo_id = TodoId::from_string(p["/todos/".len()..].to_string())
                .map_err(|_| AppError::NotFound("Not found".to_string()))?;
            match method.as_str() {
                "PUT" | "PATCH" => Ok(Route::UpdateTodo { todo_id }),
                "DELETE" => Ok(Route::DeleteTodo { todo_id }),
                _ => Err(AppError::NotFound("Not found".to_string())),
            }
        }
        _ => Err(AppError::NotFound("Not found".to_string())),
    }
}

/// オーソライザーのクレームから所有者を取り出す
pub fn extract_user(request: &ApiGatewayProxyRequest) -> Result<UserId, AppError> {
    let sub = request
        .request_context
        .authorizer
        .as_ref()
        .and_then(|authorizer| authorizer.claims.as_ref())
        .and_then(|claims| claims.get("sub"))
        .and_then(|value| value.as_str())
        .ok_or_else(|| AppError::Authentication("Missing sub claim".to_string()))?;

    UserId::from_string(sub.to_string()).map_err(|e| AppError::Authentication(e.to_string()))
}

/// 1 リクエストを処理する。失敗はすべてレスポンスに変換される。
pub async fn route(request: ApiGatewayProxyRequest, state: &AppState) -> ApiGatewayProxyResponse {
    let method = request.http_method.to_ascii_uppercase();
    let path = request.path.clone();

    info!(path = %path, method = %method, "Incoming request");

    let (mut response, user_id) = match parse_route(&request) {
        Ok(route) => dispatch(route, &request, state).await,
        Err(e) => {
            log_error(&e, "route");
            (error_response(&e, "Not found"), None)
        }
    };

    add_cors_headers(&mut response);
    trace_http_request(
        &method,
        &path,
        response.status_code,
        user_id.as_ref().map(UserId::as_str),
    );
    response
}

async fn dispatch(
    route: Route,
    request: &ApiGatewayProxyRequest,
    state: &AppState,
) -> (ApiGatewayProxyResponse, Option<UserId>) {
    let fallback = route.failure_message();

    let user = if route.requires_user() {
        match extract_user(request) {
            Ok(user) => Some(user),
            Err(e) => {
                log_error(&e, fallback);
                return (error_response(&e, fallback), None);
            }
        }
    } else {
        None
    };

    let result = execute(route, request, state, user.as_ref()).await;

    match result {
        Ok(response) => (response, user),
        Err(e) => {
            log_error(&e, fallback);
            (error_response(&e, fallback), user)
        }
    }
}

async fn execute(
    route: Route,
    request: &ApiGatewayProxyRequest,
    state: &AppState,
    user: Option<&UserId>,
) -> Result<ApiGatewayProxyResponse, AppError> {
    let store = state.store.as_ref();
    let body = request.body.as_deref();
    let owner = || user.ok_or_else(|| AppError::Authentication("Missing user".to_string()));

    match route {
        Route::Preflight => Ok(no_content_response()),
        Route::ListTodos { order } => handlers::list_todos(store, owner()?, order).await,
        Route::CreateTodo => handlers::create_todo(store, owner()?, body).await,
        Route::UpdateTodo { todo_id } => {
            handlers::update_todo(store, owner()?, &todo_id, body).await
        }
        Route::DeleteTodo { todo_id } => handlers::delete_todo(store, owner()?, &todo_id).await,
        Route::SignIn => oauth::sign_in(&state.config),
        Route::AuthCallback => Ok(oauth::callback(
            state.identity.as_ref(),
            &state.config,
            request.query("code"),
            request.query("next"),
        )
        .await),
        Route::SignOut => Ok(oauth::sign_out(&state.config)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_normalize_path() {
        assert_eq!(normalize_path("/api/todos"), "/todos");
        assert_eq!(normalize_path("/todos/"), "/todos");
        assert_eq!(normalize_path("/apiary"), "/apiary");
        assert_eq!(normalize_path("/"), "/");
    }

    #[test]
    fn test_parse_route_crud() {
        let list = ApiGatewayProxyRequest::new("GET", "/todos").with_query("order", "asc");
        assert_eq!(
            parse_route(&list).unwrap(),
            Route::ListTodos {
                order: SortOrder::Ascending
            }
        );

        let update = ApiGatewayProxyRequest::new("PUT", "/api/todos/42");
        assert!(matches!(
            parse_route(&update).unwrap(),
            Route::UpdateTodo { todo_id } if todo_id.as_str() == "42"
        ));

        let delete = ApiGatewayProxyRequest::new("delete", "/todos/42");
        assert!(matches!(
            parse_route(&delete).unwrap(),
            Route::DeleteTodo { .. }
        ));
    }

    #[test]
    fn test_parse_route_rejects_unknown() {
        let unknown = ApiGatewayProxyRequest::new("GET", "/users");
        assert_eq!(parse_route(&unknown).unwrap_err().http_status_code(), 404);

        let nested = ApiGatewayProxyRequest::new("PUT", "/todos/42/extra");
        assert_eq!(parse_route(&nested).unwrap_err().http_status_code(), 404);

        let bad_order = ApiGatewayProxyRequest::new("GET", "/todos").with_query("order", "up");
        assert_eq!(parse_route(&bad_order).unwrap_err().http_status_code(), 400);
    }

    #[test]
    fn test_extract_user() {
        let request = ApiGatewayProxyRequest::new("GET", "/todos").with_claim("sub", json!("user123"));
        assert_eq!(extract_user(&request).unwrap().as_str(), "user123");

        let anonymous = ApiGatewayProxyRequest::new("GET", "/todos");
        assert_eq!(extract_user(&anonymous).unwrap_err().http_status_code(), 401);
    }
}
