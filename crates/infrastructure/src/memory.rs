use crate::repositories::{SortOrder, StoreError, TodoStore};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domain::{Todo, TodoId, TodoPatch, UserId};
use tokio::sync::RwLock;

/// プロセス内ストア（ローカル開発とテスト用）
#[derive(Debug, Default)]
pub struct InMemoryTodoStore {
    todos: RwLock<Vec<Todo>>,
}

impl InMemoryTodoStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_todos(todos: Vec<Todo>) -> Self {
        Self {
            todos: RwLock::new(todos),
        }
    }

    pub async fn len(&self) -> usize {
        self.todos.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.todos.read().await.is_empty()
    }
}

#[async_trait]
impl TodoStore for InMemoryTodoStore {
    async fn list(&self, owner: &UserId, order: SortOrder) -> Result<Vec<Todo>, StoreError> {
        let mut todos: Vec<Todo> = self
            .todos
            .read()
            .await
            .iter()
            .filter(|todo| &todo.user_id == owner)
            .cloned()
            .collect();

        todos.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        if order == SortOrder::Descending {
            todos.reverse();
        }
        Ok(todos)
    }

    async fn insert(&self, todo: &Todo) -> Result<(), StoreError> {
        let mut todos = self.todos.write().await;
        match todos.iter_mut().find(|t| t.id == todo.id) {
            Some(existing) => *existing = todo.clone(),
            None => todos.push(todo.clone()),
        }
        Ok(())
    }

    async fn update(
        &self,
        owner: &UserId,
        id: &TodoId,
        patch: &TodoPatch,
        now: DateTime<Utc>,
    ) -> Result<Todo, StoreError> {
        let mut todos = self.todos.write().await;
        let todo = todos
            .iter_mut()
            .find(|t| &t.id == id && &t.user_id == owner)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;

        todo.apply(patch);
        todo.updated_at = now;
        Ok(todo.clone())
    }

    async fn delete(&self, owner: &UserId, id: &TodoId) -> Result<(), StoreError> {
        self.todos
            .write()
            .await
            .retain(|t| !(&t.id == id && &t.user_id == owner));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use domain::NewTodo;

    fn user(id: &str) -> UserId {
        UserId::from_string(id.to_string()).unwrap()
    }

    #[tokio::test]
    async fn test_list_orders_by_created_at() {
        let now = Utc::now();
        let first = Todo::create(user("alice"), NewTodo::new("first"), now);
        let second = Todo::create(user("alice"), NewTodo::new("second"), now + Duration::seconds(1));
        let store = InMemoryTodoStore::with_todos(vec![second.clone(), first.clone()]);

        let asc = store.list(&user("alice"), SortOrder::Ascending).await.unwrap();
        let desc = store.list(&user("alice"), SortOrder::Descending).await.unwrap();

        assert_eq!(asc, vec![first.clone(), second.clone()]);
        assert_eq!(desc, vec![second, first]);
    }

    #[tokio::test]
    async fn test_update_other_users_todo_is_not_found() {
        let todo = Todo::create(user("alice"), NewTodo::new("秘密"), Utc::now());
        let store = InMemoryTodoStore::with_todos(vec![todo.clone()]);

        let result = store
            .update(
                &user("mallory"),
                &todo.id,
                &TodoPatch::new().with_completed(true),
                Utc::now(),
            )
            .await;

        assert!(matches!(result, Err(StoreError::NotFound(_))));
    }
}
