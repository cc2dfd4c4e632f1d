use crate::config::ClientConfig;
use crate::remote::{RemoteError, TodoRemote};
use async_trait::async_trait;
use domain::{NewTodo, Todo, TodoId, TodoPatch};
use reqwest::header::AUTHORIZATION;
use reqwest::{RequestBuilder, Response};
use serde::de::DeserializeOwned;
use shared::{ErrorResponse, Session};
use tracing::{debug, warn};

/// ToDo API の HTTP 実装
pub struct HttpTodoRemote {
    http: reqwest::Client,
    base_url: String,
}

impl HttpTodoRemote {
    pub fn new(config: &ClientConfig) -> Result<Self, RemoteError> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| RemoteError::Network(e.to_string()))?;

        Ok(Self {
            http,
            base_url: config.api_base_url.clone(),
        })
    }

    fn todos_url(&self) -> String {
        format!("{}/todos", self.base_url)
    }

    fn todo_url(&self, id: &TodoId) -> String {
        format!("{}/todos/{}", self.base_url, id)
    }

    async fn execute(&self, session: &Session, request: RequestBuilder) -> Result<Response, RemoteError> {
        let response = request
            .header(AUTHORIZATION, session.bearer())
            .send()
            .await
            .map_err(|e| RemoteError::Network(e.to_string()))?;

        let status = response.status();
        debug!(status = status.as_u16(), url = %response.url(), "APIレスポンス受信");

        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let error = error_for_status(status.as_u16(), &body);
        warn!("API呼び出し失敗: {}", error);
        Err(error)
    }

    async fn json<T: DeserializeOwned>(response: Response) -> Result<T, RemoteError> {
        response
            .json()
            .await
            .map_err(|e| RemoteError::Network(format!("invalid response body: {e}")))
    }
}

/// 失敗ステータスとボディ `{"error": ...}` をエラーに変換
fn error_for_status(status: u16, body: &str) -> RemoteError {
    match status {
        401 | 403 => RemoteError::Unauthorized,
        404 => RemoteError::NotFound,
        _ => {
            let message = serde_json::from_str::<ErrorResponse>(body)
                .map(|response| response.error)
                .unwrap_or_else(|_| body.to_string());
            RemoteError::Service { status, message }
        }
    }
}

#[async_trait]
impl TodoRemote for HttpTodoRemote {
    async fn fetch_todos(&self, session: &Session) -> Result<Vec<Todo>, RemoteError> {
        let request = self.http.get(self.todos_url()).query(&[("order", "asc")]);
        Self::json(self.execute(session, request).await?).await
    }

    async fn create_todo(&self, session: &Session, input: &NewTodo) -> Result<Todo, RemoteError> {
        let request = self.http.post(self.todos_url()).json(input);
        Self::json(self.execute(session, request).await?).await
    }

    async fn update_todo(
        &self,
        session: &Session,
        id: &TodoId,
        patch: &TodoPatch,
    ) -> Result<Todo, RemoteError> {
        let request = self.http.put(self.todo_url(id)).json(patch);
        Self::json(self.execute(session, request).await?).await
    }

    async fn delete_todo(&self, session: &Session, id: &TodoId) -> Result<(), RemoteError> {
        let request = self.http.delete(self.todo_url(id));
        self.execute(session, request).await?;
        Ok(())
    }
}
