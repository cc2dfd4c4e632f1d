//! ToDo の取得と楽観的更新
//!
//! 更新系の操作はすべて同じ手順をとる。
//!
//! 1. 取得中の結果をキャンセルし、現在のキャッシュをスナップショット
//! 2. キャッシュにデータがあれば変更を先行適用
//! 3. リモート呼び出し
//! 4. 失敗時はスナップショットへロールバックしてエラー通知
//! 5. 成否にかかわらずキャッシュを無効化して再取得
//!
//! リトライはしない。重なった操作は最後に確定したものが勝つ。

use crate::cache::{QueryCache, TODOS_KEY};
use crate::config::ClientConfig;
use crate::errors::MutationError;
use crate::notify::{Notification, Notifier};
use crate::remote::{RemoteError, TodoRemote};
use chrono::Utc;
use domain::{NewTodo, Todo, TodoId, TodoPatch};
use shared::Session;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Operation {
    Create,
    Edit,
    Toggle,
    Delete,
}

impl Operation {
    fn as_str(self) -> &'static str {
        match self {
            Operation::Create => "create",
            Operation::Edit => "edit",
            Operation::Toggle => "toggle",
            Operation::Delete => "delete",
        }
    }

    fn failure_message(self, error: &RemoteError) -> &'static str {
        if *error == RemoteError::Unauthorized {
            return "Unauthorized";
        }
        match self {
            Operation::Create => "Error creating todo",
            Operation::Edit => "Error updating todo",
            Operation::Toggle => "Error updating todo checkbox",
            Operation::Delete => "Error deleting todo",
        }
    }
}

pub struct TodoMutations {
    cache: Arc<QueryCache<Vec<Todo>>>,
    remote: Arc<dyn TodoRemote>,
    notifier: Arc<dyn Notifier>,
    config: ClientConfig,
}

impl TodoMutations {
    pub fn new(
        cache: Arc<QueryCache<Vec<Todo>>>,
        remote: Arc<dyn TodoRemote>,
        notifier: Arc<dyn Notifier>,
        config: ClientConfig,
    ) -> Self {
        Self {
            cache,
            remote,
            notifier,
            config,
        }
    }

    pub fn cache(&self) -> &Arc<QueryCache<Vec<Todo>>> {
        &self.cache
    }

    /// 利用者のToDoを作成日時の昇順で取得しキャッシュへ書き込む
    ///
    /// 取得中に `cancel_pending` された場合、結果は返すがキャッシュには書かない。
    pub async fn fetch(&self, session: &Session) -> Result<Vec<Todo>, MutationError> {
        let ticket = self.cache.begin_fetch(&TODOS_KEY).await;

        let todos = self.remote.fetch_todos(session).await.map_err(|e| {
            warn!(user_id = %session.user_id, "ToDo取得失敗: {}", e);
            e
        })?;

        if self.cache.complete_fetch(ticket, todos.clone()).await {
            info!(user_id = %session.user_id, "ToDo取得完了: {} 件", todos.len());
        }
        Ok(todos)
    }

    /// 仮IDのToDoを末尾に追加し、作成成功時にサーバーのレコードへ置き換える
    pub async fn create(&self, session: &Session, input: NewTodo) -> Result<Todo, MutationError> {
        input.validate()?;

        let placeholder = Todo::placeholder(session.user_id.clone(), input.clone(), Utc::now());
        let placeholder_id = placeholder.id.clone();
        let snapshot = self
            .begin(|todos| todos.push(placeholder))
            .await;

        let result = self.remote.create_todo(session, &input).await;

        match &result {
            Ok(created) => {
                self.cache
                    .update(&TODOS_KEY, |todos| {
                        if let Some(slot) = todos.iter_mut().find(|t| t.id == placeholder_id) {
                            *slot = created.clone();
                        }
                    })
                    .await;
                info!("ToDo作成完了: todo_id={}", created.id);
            }
            Err(e) => self.fail(Operation::Create, snapshot, e).await,
        }

        self.settle(session).await;
        result.map_err(MutationError::from)
    }

    /// 指定されたフィールドを置き換える
    pub async fn edit(
        &self,
        session: &Session,
        id: &TodoId,
        patch: TodoPatch,
    ) -> Result<Todo, MutationError> {
        patch.validate()?;

        let snapshot = self
            .begin(|todos| {
                if let Some(todo) = todos.iter_mut().find(|t| &t.id == id) {
                    todo.apply(&patch);
                }
            })
            .await;

        self.update(session, Operation::Edit, id, &patch, snapshot).await
    }

    /// 完了状態を `completed` に設定する
    pub async fn toggle(
        &self,
        session: &Session,
        id: &TodoId,
        completed: bool,
    ) -> Result<Todo, MutationError> {
        let patch = TodoPatch::new().with_completed(completed);

        let snapshot = self
            .begin(|todos| {
                if let Some(todo) = todos.iter_mut().find(|t| &t.id == id) {
                    todo.completed = completed;
                }
            })
            .await;

        self.update(session, Operation::Toggle, id, &patch, snapshot).await
    }

    pub async fn delete(&self, session: &Session, id: &TodoId) -> Result<(), MutationError> {
        let snapshot = self.begin(|todos| todos.retain(|t| &t.id != id)).await;

        let result = self.remote.delete_todo(session, id).await;

        match &result {
            Ok(()) => info!("ToDo削除完了: todo_id={}", id),
            Err(e) => self.fail(Operation::Delete, snapshot, e).await,
        }

        self.settle(session).await;
        result.map_err(MutationError::from)
    }

    async fn update(
        &self,
        session: &Session,
        operation: Operation,
        id: &TodoId,
        patch: &TodoPatch,
        snapshot: Option<Vec<Todo>>,
    ) -> Result<Todo, MutationError> {
        let result = self.remote.update_todo(session, id, patch).await;

        match &result {
            Ok(updated) => info!(operation = operation.as_str(), "ToDo更新完了: todo_id={}", updated.id),
            Err(e) => self.fail(operation, snapshot, e).await,
        }

        self.settle(session).await;
        result.map_err(MutationError::from)
    }

    /// 取得中の結果を止め、スナップショットを取ってから先行適用する
    ///
    /// 先行適用した場合のみ適用前のスナップショットを返す。
    async fn begin<F>(&self, apply: F) -> Option<Vec<Todo>>
    where
        F: FnOnce(&mut Vec<Todo>),
    {
        self.cache.cancel_pending(&TODOS_KEY).await;
        let snapshot = self.cache.snapshot(&TODOS_KEY).await;

        if let Some(todos) = &snapshot {
            let mut next = todos.clone();
            apply(&mut next);
            self.cache.set(&TODOS_KEY, next).await;
        }
        snapshot
    }

    async fn fail(&self, operation: Operation, snapshot: Option<Vec<Todo>>, error: &RemoteError) {
        warn!(operation = operation.as_str(), "楽観的更新を取り消し: {}", error);

        // 先行適用していなければ戻すものはない
        if let Some(snapshot) = snapshot {
            self.cache.rollback(&TODOS_KEY, Some(snapshot)).await;
        }
        self.notifier.notify(Notification::error(
            operation.failure_message(error),
            self.config.notification_duration,
        ));
    }

    async fn settle(&self, session: &Session) {
        self.cache.invalidate(&TODOS_KEY).await;

        // 再取得の失敗は操作結果に影響させない
        if let Err(e) = self.fetch(session).await {
            warn!("再取得失敗: {}", e);
        }
    }
}
