//! ToDo テーブルの表示モデル
//!
//! UI ツールキットに依存せず、表示状態とダイアログ操作を持つ。

use crate::cache::TODOS_KEY;
use crate::errors::MutationError;
use crate::mutations::TodoMutations;
use domain::{DomainError, NewTodo, Todo, TodoId, TodoPatch};
use shared::Session;
use std::sync::Arc;

pub const EMPTY_MESSAGE: &str = "No todos yet. Add one to get started!";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TodoRow {
    pub id: TodoId,
    pub title: String,
    /// 完了行は取り消し線で表示
    pub completed: bool,
}

impl From<&Todo> for TodoRow {
    fn from(todo: &Todo) -> Self {
        Self {
            id: todo.id.clone(),
            title: todo.title.clone(),
            completed: todo.completed,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableView {
    /// 初回取得前
    Loading,
    Empty(&'static str),
    Rows(Vec<TodoRow>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DialogMode {
    Add,
    Edit(TodoId),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dialog {
    pub mode: DialogMode,
    pub title: String,
    pub description: String,
    pub error: Option<String>,
}

impl Dialog {
    fn new(mode: DialogMode, title: String, description: String) -> Self {
        Self {
            mode,
            title,
            description,
            error: None,
        }
    }

    /// フォーム入力の検証
    fn validate(&self) -> Result<(), DomainError> {
        if self.title.trim().is_empty() {
            return Err(DomainError::Validation("Title is required".to_string()));
        }
        if self.mode == DialogMode::Add && self.description.trim().is_empty() {
            return Err(DomainError::Validation(
                "Description is required".to_string(),
            ));
        }
        Ok(())
    }

    pub fn heading(&self) -> &'static str {
        match self.mode {
            DialogMode::Add => "Add Todo",
            DialogMode::Edit(_) => "Edit Todo",
        }
    }
}

pub struct TodoTable {
    mutations: Arc<TodoMutations>,
    session: Session,
    dialog: Option<Dialog>,
}

impl TodoTable {
    pub fn new(mutations: Arc<TodoMutations>, session: Session) -> Self {
        Self {
            mutations,
            session,
            dialog: None,
        }
    }

    /// キャッシュが古い場合のみ一覧を取得する
    pub async fn load(&self) -> Result<(), MutationError> {
        if !self.mutations.cache().is_stale(&TODOS_KEY).await {
            return Ok(());
        }
        self.mutations.fetch(&self.session).await.map(|_| ())
    }

    pub async fn view(&self) -> TableView {
        match self.mutations.cache().get(&TODOS_KEY).await {
            None => TableView::Loading,
            Some(todos) if todos.is_empty() => TableView::Empty(EMPTY_MESSAGE),
            Some(todos) => TableView::Rows(todos.iter().map(TodoRow::from).collect()),
        }
    }

    pub fn dialog(&self) -> Option<&Dialog> {
        self.dialog.as_ref()
    }

    pub fn dialog_title(&self) -> Option<&'static str> {
        self.dialog.as_ref().map(Dialog::heading)
    }

    pub fn open_add(&mut self) {
        self.dialog = Some(Dialog::new(DialogMode::Add, String::new(), String::new()));
    }

    /// 既存の行を編集用に開く
    pub async fn open_edit(&mut self, id: &TodoId) -> Result<(), MutationError> {
        let todo = self.find(id).await?;
        self.dialog = Some(Dialog::new(
            DialogMode::Edit(todo.id),
            todo.title,
            todo.description.unwrap_or_default(),
        ));
        Ok(())
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        if let Some(dialog) = &mut self.dialog {
            dialog.title = title.into();
        }
    }

    pub fn set_description(&mut self, description: impl Into<String>) {
        if let Some(dialog) = &mut self.dialog {
            dialog.description = description.into();
        }
    }

    /// 入力とエラーを破棄して閉じる
    pub fn close(&mut self) {
        self.dialog = None;
    }

    /// 入力を検証して作成または編集を実行する
    ///
    /// 検証に失敗した場合はダイアログを開いたままエラーを表示する。
    /// 検証を通ればリモート呼び出しの前にダイアログを閉じる。
    pub async fn submit(&mut self) -> Result<(), MutationError> {
        let Some(dialog) = self.dialog.as_mut() else {
            return Ok(());
        };

        if let Err(e) = dialog.validate() {
            dialog.error = Some(e.message().to_string());
            return Err(e.into());
        }

        let Some(dialog) = self.dialog.take() else {
            return Ok(());
        };

        match dialog.mode {
            DialogMode::Add => {
                self.mutations
                    .create(
                        &self.session,
                        NewTodo::new(dialog.title).with_description(dialog.description),
                    )
                    .await?;
            }
            DialogMode::Edit(id) => {
                // 空の説明は既存の説明を残す
                let mut patch = TodoPatch::new().with_title(dialog.title);
                if !dialog.description.trim().is_empty() {
                    patch = patch.with_description(dialog.description);
                }
                self.mutations.edit(&self.session, &id, patch).await?;
            }
        }
        Ok(())
    }

    /// 完了状態を反転する
    pub async fn toggle(&self, id: &TodoId) -> Result<(), MutationError> {
        let todo = self.find(id).await?;
        self.mutations
            .toggle(&self.session, id, !todo.completed)
            .await
            .map(|_| ())
    }

    pub async fn delete(&self, id: &TodoId) -> Result<(), MutationError> {
        self.mutations.delete(&self.session, id).await
    }

    async fn find(&self, id: &TodoId) -> Result<Todo, MutationError> {
        self.mutations
            .cache()
            .get(&TODOS_KEY)
            .await
            .and_then(|todos| todos.into_iter().find(|t| &t.id == id))
            .ok_or_else(|| DomainError::InvalidTodoId(id.to_string()).into())
    }
}
