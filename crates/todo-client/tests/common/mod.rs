#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{Duration, Utc};
use domain::{NewTodo, Todo, TodoId, TodoPatch, UserId};
use shared::Session;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use todo_client::{
    ClientConfig, QueryCache, RecordingNotifier, RemoteError, TodoMutations, TodoRemote,
};
use tokio::sync::Notify;

/// サーバーを模したリモート。失敗と応答待ちを差し込める。
#[derive(Default)]
pub struct ScriptedRemote {
    server: Mutex<Vec<Todo>>,
    write_failure: Mutex<Option<RemoteError>>,
    fetch_failure: Mutex<Option<RemoteError>>,
    gate: Mutex<Option<Arc<Notify>>>,
    fetch_gate: Mutex<Option<Arc<Notify>>>,
    write_calls: AtomicUsize,
    fetch_calls: AtomicUsize,
}

impl ScriptedRemote {
    pub fn with_todos(todos: Vec<Todo>) -> Self {
        Self {
            server: Mutex::new(todos),
            ..Self::default()
        }
    }

    pub fn fail_writes(&self, error: RemoteError) {
        *self.write_failure.lock().unwrap() = Some(error);
    }

    pub fn fail_fetches(&self, error: RemoteError) {
        *self.fetch_failure.lock().unwrap() = Some(error);
    }

    /// 書き込みを `notify_one` されるまで保留する
    pub fn hold_writes(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.gate.lock().unwrap() = Some(gate.clone());
        gate
    }

    /// 次の一覧取得だけを、その時点のサーバー状態を読んだ後で保留する
    pub fn hold_next_fetch(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.fetch_gate.lock().unwrap() = Some(gate.clone());
        gate
    }

    pub fn write_calls(&self) -> usize {
        self.write_calls.load(Ordering::SeqCst)
    }

    pub fn fetch_calls(&self) -> usize {
        self.fetch_calls.load(Ordering::SeqCst)
    }

    pub fn server_todos(&self) -> Vec<Todo> {
        self.server.lock().unwrap().clone()
    }

    async fn before_write(&self) -> Result<(), RemoteError> {
        self.write_calls.fetch_add(1, Ordering::SeqCst);

        let gate = self.gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }

        match self.write_failure.lock().unwrap().clone() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl TodoRemote for ScriptedRemote {
    async fn fetch_todos(&self, session: &Session) -> Result<Vec<Todo>, RemoteError> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(error) = self.fetch_failure.lock().unwrap().clone() {
            return Err(error);
        }

        let mut todos: Vec<Todo> = self
            .server
            .lock()
            .unwrap()
            .iter()
            .filter(|t| t.user_id == session.user_id)
            .cloned()
            .collect();
        todos.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));

        let gate = self.fetch_gate.lock().unwrap().take();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        Ok(todos)
    }

    async fn create_todo(&self, session: &Session, input: &NewTodo) -> Result<Todo, RemoteError> {
        self.before_write().await?;

        // POST /todos と同じ検証
        input.validate().map_err(|e| RemoteError::Service {
            status: 400,
            message: e.message().to_string(),
        })?;

        let todo = Todo::create(session.user_id.clone(), input.clone(), Utc::now());
        self.server.lock().unwrap().push(todo.clone());
        Ok(todo)
    }

    async fn update_todo(
        &self,
        session: &Session,
        id: &TodoId,
        patch: &TodoPatch,
    ) -> Result<Todo, RemoteError> {
        self.before_write().await?;

        let mut server = self.server.lock().unwrap();
        let todo = server
            .iter_mut()
            .find(|t| &t.id == id && t.user_id == session.user_id)
            .ok_or(RemoteError::NotFound)?;
        todo.apply(patch);
        todo.updated_at = Utc::now();
        Ok(todo.clone())
    }

    async fn delete_todo(&self, session: &Session, id: &TodoId) -> Result<(), RemoteError> {
        self.before_write().await?;

        self.server
            .lock()
            .unwrap()
            .retain(|t| !(&t.id == id && t.user_id == session.user_id));
        Ok(())
    }
}

pub fn user() -> UserId {
    UserId::from_string("user123".to_string()).unwrap()
}

pub fn session() -> Session {
    Session::new(user(), "access-token")
}

/// 作成日時をずらしたToDoを作る
pub fn seed(titles: &[(&str, bool)]) -> Vec<Todo> {
    let base = Utc::now() - Duration::hours(1);
    titles
        .iter()
        .enumerate()
        .map(|(i, (title, completed))| {
            let mut todo = Todo::create(
                user(),
                NewTodo::new(*title).with_description(format!("{title} details")),
                base + Duration::seconds(i as i64),
            );
            todo.completed = *completed;
            todo
        })
        .collect()
}

pub struct Harness {
    pub remote: Arc<ScriptedRemote>,
    pub notifier: Arc<RecordingNotifier>,
    pub mutations: Arc<TodoMutations>,
}

impl Harness {
    /// 初回取得前の状態
    pub fn new(todos: Vec<Todo>) -> Self {
        let remote = Arc::new(ScriptedRemote::with_todos(todos));
        let notifier = Arc::new(RecordingNotifier::new());
        let mutations = Arc::new(TodoMutations::new(
            Arc::new(QueryCache::new()),
            remote.clone(),
            notifier.clone(),
            ClientConfig::default(),
        ));

        Self {
            remote,
            notifier,
            mutations,
        }
    }

    /// 初回取得済みの状態
    pub async fn loaded(todos: Vec<Todo>) -> Self {
        let harness = Self::new(todos);
        harness.mutations.fetch(&session()).await.unwrap();
        harness
    }

    pub async fn cached(&self) -> Option<Vec<Todo>> {
        self.mutations.cache().get(&todo_client::TODOS_KEY).await
    }

    pub fn messages(&self) -> Vec<String> {
        self.notifier
            .notifications()
            .into_iter()
            .map(|n| n.message)
            .collect()
    }
}
