use aws_sdk_dynamodb::types::AttributeValue;
use chrono::{DateTime, Utc};
use domain::{Todo, TodoId, UserId};
use std::collections::HashMap;

pub type Item = HashMap<String, AttributeValue>;

/// DynamoDB のキー構造
///
/// PK はユーザー単位、SK は ULID を含むので SK 順が作成順になる。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DynamoDbKeys {
    pub pk: String,
    pub sk: String,
}

impl DynamoDbKeys {
    pub fn for_todo(user_id: &UserId, todo_id: &TodoId) -> Self {
        Self {
            pk: Self::user_partition(user_id),
            sk: format!("{}{}", Self::TODO_PREFIX, todo_id.as_str()),
        }
    }

    pub const TODO_PREFIX: &'static str = "TODO#";

    pub fn user_partition(user_id: &UserId) -> String {
        format!("USER#{}", user_id.as_str())
    }
}

/// ToDo を DynamoDB アイテムに変換
pub fn todo_to_item(todo: &Todo) -> Item {
    let keys = DynamoDbKeys::for_todo(&todo.user_id, &todo.id);

    let mut item = HashMap::new();
    item.insert("PK".to_string(), AttributeValue::S(keys.pk));
    item.insert("SK".to_string(), AttributeValue::S(keys.sk));
    item.insert("id".to_string(), AttributeValue::S(todo.id.to_string()));
    item.insert("title".to_string(), AttributeValue::S(todo.title.clone()));
    if let Some(description) = &todo.description {
        item.insert(
            "description".to_string(),
            AttributeValue::S(description.clone()),
        );
    }
    item.insert("completed".to_string(), AttributeValue::Bool(todo.completed));
    item.insert(
        "user_id".to_string(),
        AttributeValue::S(todo.user_id.to_string()),
    );
    item.insert(
        "created_at".to_string(),
        AttributeValue::S(todo.created_at.to_rfc3339()),
    );
    item.insert(
        "updated_at".to_string(),
        AttributeValue::S(todo.updated_at.to_rfc3339()),
    );
    item
}

/// DynamoDB アイテムを ToDo に変換（必須属性が欠けていれば None）
pub fn item_to_todo(item: &Item) -> Option<Todo> {
    let string = |key: &str| item.get(key)?.as_s().ok().cloned();
    let timestamp = |key: &str| {
        DateTime::parse_from_rfc3339(item.get(key)?.as_s().ok()?)
            .ok()
            .map(|dt| dt.with_timezone(&Utc))
    };

    Some(Todo {
        id: TodoId::from_string(string("id")?).ok()?,
        title: string("title")?,
        description: string("description"),
        completed: item
            .get("completed")
            .and_then(|v| v.as_bool().ok())
            .copied()
            .unwrap_or(false),
        user_id: UserId::from_string(string("user_id")?).ok()?,
        created_at: timestamp("created_at")?,
        updated_at: timestamp("updated_at")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::NewTodo;

    fn sample_todo() -> Todo {
        Todo::create(
            UserId::from_string("user123".to_string()).unwrap(),
            NewTodo::new("牛乳を買う").with_description("2%"),
            Utc::now(),
        )
    }

    #[test]
    fn test_keys_for_todo() {
        let todo = sample_todo();
        let keys = DynamoDbKeys::for_todo(&todo.user_id, &todo.id);

        assert_eq!(keys.pk, "USER#user123");
        assert_eq!(keys.sk, format!("TODO#{}", todo.id));
    }

    #[test]
    fn test_item_conversion_keeps_fields() {
        let todo = sample_todo();

        let item = todo_to_item(&todo);
        let restored = item_to_todo(&item).unwrap();

        assert_eq!(restored.id, todo.id);
        assert_eq!(restored.description, todo.description);
        assert_eq!(restored.created_at.timestamp_millis(), todo.created_at.timestamp_millis());
    }

    #[test]
    fn test_item_without_title_is_rejected() {
        let mut item = todo_to_item(&sample_todo());
        item.remove("title");

        assert!(item_to_todo(&item).is_none());
    }

    #[test]
    fn test_item_without_completed_defaults_to_false() {
        let mut item = todo_to_item(&sample_todo());
        item.remove("completed");

        assert!(!item_to_todo(&item).unwrap().completed);
    }
}
