use crate::errors::DomainError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// クライアント側で仮採番したIDの接頭辞
pub const PLACEHOLDER_PREFIX: &str = "temp_";

/// ToDoの識別子
///
/// サービス側で採番される ULID 文字列か、作成確定前のクライアント仮ID
/// (`temp_<uuid>`) のどちらか。ULID は辞書順が作成順と一致する。
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TodoId(String);

impl TodoId {
    pub fn new() -> Self {
        Self(ulid::Ulid::new().to_string())
    }

    /// 作成確定前のクライアント仮IDを生成
    pub fn placeholder() -> Self {
        Self(format!("{PLACEHOLDER_PREFIX}{}", uuid::Uuid::new_v4()))
    }

    pub fn from_string(id: String) -> Result<Self, DomainError> {
        if id.trim().is_empty() {
            return Err(DomainError::InvalidTodoId("empty id".to_string()));
        }
        if id.contains('/') {
            return Err(DomainError::InvalidTodoId(id));
        }
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_placeholder(&self) -> bool {
        self.0.starts_with(PLACEHOLDER_PREFIX)
    }
}

impl Default for TodoId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TodoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// 所有者ユーザーの識別子（IDプロバイダーの `sub`）
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    pub fn from_string(id: String) -> Result<Self, DomainError> {
        if id.trim().is_empty() {
            return Err(DomainError::InvalidUserId("empty user id".to_string()));
        }
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Todo {
    pub id: TodoId,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub completed: bool,
    pub user_id: UserId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Todo {
    /// 検証済みの入力からサービス採番のToDoを生成
    pub fn create(user_id: UserId, input: NewTodo, now: DateTime<Utc>) -> Self {
        Self::with_id(TodoId::new(), user_id, input, now)
    }

    /// 楽観的更新用の仮ToDoを生成
    pub fn placeholder(user_id: UserId, input: NewTodo, now: DateTime<Utc>) -> Self {
        Self::with_id(TodoId::placeholder(), user_id, input, now)
    }

    fn with_id(id: TodoId, user_id: UserId, input: NewTodo, now: DateTime<Utc>) -> Self {
        Self {
            id,
            title: input.title,
            description: input.description,
            completed: false,
            user_id,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn apply(&mut self, patch: &TodoPatch) {
        if let Some(title) = &patch.title {
            self.title = title.clone();
        }
        if let Some(description) = &patch.description {
            self.description = Some(description.clone());
        }
        if let Some(completed) = patch.completed {
            self.completed = completed;
        }
    }
}

/// ToDo作成入力
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NewTodo {
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl NewTodo {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// タイトルと説明文はどちらも空白以外の文字が必要
    pub fn validate(&self) -> Result<(), DomainError> {
        let description_missing = self.description.as_deref().map_or(true, is_blank);

        if is_blank(&self.title) || description_missing {
            return Err(DomainError::Validation(
                "Title and description are required".to_string(),
            ));
        }
        Ok(())
    }
}

/// ToDo部分更新入力（指定されたフィールドのみ更新）
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TodoPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
}

impl TodoPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_completed(mut self, completed: bool) -> Self {
        self.completed = Some(completed);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.description.is_none() && self.completed.is_none()
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        match &self.title {
            Some(title) if is_blank(title) => {
                Err(DomainError::Validation("Title is required".to_string()))
            }
            _ => Ok(()),
        }
    }
}

fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> UserId {
        UserId::from_string("user123".to_string()).unwrap()
    }

    #[test]
    fn test_todo_id_new_generates_ulid() {
        // Act: 新しいTodoIdを生成
        let todo_id = TodoId::new();

        // Assert: 26文字のULIDで、仮IDではない
        assert_eq!(todo_id.as_str().len(), 26);
        assert!(ulid::Ulid::from_string(todo_id.as_str()).is_ok());
        assert!(!todo_id.is_placeholder());
    }

    #[test]
    fn test_placeholder_id() {
        let todo_id = TodoId::placeholder();

        assert!(todo_id.is_placeholder());
        assert!(todo_id.as_str().starts_with("temp_"));
        assert_ne!(todo_id, TodoId::placeholder());
    }

    #[test]
    fn test_todo_id_rejects_empty_and_slash() {
        assert!(TodoId::from_string("  ".to_string()).is_err());
        assert!(TodoId::from_string("a/b".to_string()).is_err());
        assert!(TodoId::from_string("42".to_string()).is_ok());
    }

    #[test]
    fn test_create_defaults_to_not_completed() {
        let now = Utc::now();
        let todo = Todo::create(user(), NewTodo::new("Buy milk").with_description("2%"), now);

        assert!(!todo.completed);
        assert_eq!(todo.title, "Buy milk");
        assert_eq!(todo.description.as_deref(), Some("2%"));
        assert_eq!(todo.created_at, now);
        assert!(!todo.id.is_placeholder());
    }

    #[test]
    fn test_new_todo_requires_title_and_description() {
        let err = NewTodo::new("Buy milk").validate().unwrap_err();
        assert_eq!(
            err.to_string(),
            "Validation error: Title and description are required"
        );

        assert!(NewTodo::new("   ").with_description("2%").validate().is_err());
        assert!(NewTodo::new("Buy milk")
            .with_description(" ")
            .validate()
            .is_err());
        assert!(NewTodo::new("Buy milk")
            .with_description("2%")
            .validate()
            .is_ok());
    }

    #[test]
    fn test_patch_apply_only_given_fields() {
        let mut todo = Todo::create(user(), NewTodo::new("元のタイトル"), Utc::now());

        todo.apply(&TodoPatch::new().with_completed(true));

        assert_eq!(todo.title, "元のタイトル");
        assert!(todo.completed);
        assert_eq!(todo.description, None);
    }

    #[test]
    fn test_patch_validation() {
        assert!(TodoPatch::new().with_title(" ").validate().is_err());
        assert!(TodoPatch::new().with_completed(false).validate().is_ok());
        assert!(TodoPatch::new().is_empty());
    }

    #[test]
    fn test_todo_json_shape() {
        let todo = Todo::create(user(), NewTodo::new("Buy milk"), Utc::now());

        let value = serde_json::to_value(&todo).unwrap();

        assert_eq!(value["completed"], false);
        assert_eq!(value["user_id"], "user123");
        assert_eq!(value["id"], todo.id.as_str());
    }
}
