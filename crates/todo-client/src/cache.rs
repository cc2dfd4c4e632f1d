//! クエリキャッシュ
//!
//! キーごとに最後に取得したデータと取得世代を持つ。`cancel_pending` で世代を
//! 進めると、それ以前に開始した取得結果は `complete_fetch` で破棄される。
//! これにより、取得中の古いデータが楽観的更新を上書きすることはない。

use std::collections::HashMap;
use tokio::sync::Mutex;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct QueryKey(&'static str);

impl QueryKey {
    pub const fn new(name: &'static str) -> Self {
        Self(name)
    }

    pub fn as_str(&self) -> &'static str {
        self.0
    }
}

/// ToDo 一覧のキー
pub const TODOS_KEY: QueryKey = QueryKey::new("todos");

/// 取得開始時の世代。完了時に照合する。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchTicket {
    key: QueryKey,
    generation: u64,
}

#[derive(Debug)]
struct Entry<V> {
    data: Option<V>,
    generation: u64,
    stale: bool,
}

impl<V> Default for Entry<V> {
    fn default() -> Self {
        Self {
            data: None,
            generation: 0,
            stale: false,
        }
    }
}

/// `Arc` で共有するキー付きキャッシュ
#[derive(Debug)]
pub struct QueryCache<V> {
    entries: Mutex<HashMap<QueryKey, Entry<V>>>,
}

impl<V: Clone + Send> QueryCache<V> {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// 取得中の結果を無効化する
    pub async fn cancel_pending(&self, key: &QueryKey) {
        let mut entries = self.entries.lock().await;
        let entry = entries.entry(*key).or_default();
        entry.generation += 1;
        debug!(key = key.as_str(), generation = entry.generation, "取得をキャンセル");
    }

    /// 現在値の複製
    pub async fn snapshot(&self, key: &QueryKey) -> Option<V> {
        self.get(key).await
    }

    pub async fn get(&self, key: &QueryKey) -> Option<V> {
        let entries = self.entries.lock().await;
        entries.get(key).and_then(|entry| entry.data.clone())
    }

    pub async fn set(&self, key: &QueryKey, value: V) {
        let mut entries = self.entries.lock().await;
        entries.entry(*key).or_default().data = Some(value);
    }

    /// 値が存在する場合のみ変更を適用する
    pub async fn update<F>(&self, key: &QueryKey, apply: F) -> bool
    where
        F: FnOnce(&mut V),
    {
        let mut entries = self.entries.lock().await;
        match entries.get_mut(key).and_then(|entry| entry.data.as_mut()) {
            Some(data) => {
                apply(data);
                true
            }
            None => false,
        }
    }

    /// スナップショットの状態へ丸ごと戻す（`None` なら値なしへ戻す）
    pub async fn rollback(&self, key: &QueryKey, snapshot: Option<V>) {
        let mut entries = self.entries.lock().await;
        entries.entry(*key).or_default().data = snapshot;
        debug!(key = key.as_str(), "キャッシュをロールバック");
    }

    /// 再取得が必要な状態にする
    pub async fn invalidate(&self, key: &QueryKey) {
        let mut entries = self.entries.lock().await;
        entries.entry(*key).or_default().stale = true;
    }

    pub async fn is_stale(&self, key: &QueryKey) -> bool {
        let entries = self.entries.lock().await;
        entries.get(key).map_or(true, |entry| entry.stale || entry.data.is_none())
    }

    pub async fn begin_fetch(&self, key: &QueryKey) -> FetchTicket {
        let mut entries = self.entries.lock().await;
        let entry = entries.entry(*key).or_default();
        FetchTicket {
            key: *key,
            generation: entry.generation,
        }
    }

    /// 取得結果を書き込む。開始後にキャンセルされていれば破棄して `false`。
    pub async fn complete_fetch(&self, ticket: FetchTicket, value: V) -> bool {
        let mut entries = self.entries.lock().await;
        let entry = entries.entry(ticket.key).or_default();

        if entry.generation != ticket.generation {
            debug!(
                key = ticket.key.as_str(),
                started = ticket.generation,
                current = entry.generation,
                "古い取得結果を破棄"
            );
            return false;
        }

        entry.data = Some(value);
        entry.stale = false;
        true
    }
}

impl<V: Clone + Send> Default for QueryCache<V> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fetch_writes_when_not_cancelled() {
        let cache = QueryCache::new();

        let ticket = cache.begin_fetch(&TODOS_KEY).await;
        let written = cache.complete_fetch(ticket, vec![1, 2]).await;

        assert!(written);
        assert_eq!(cache.get(&TODOS_KEY).await, Some(vec![1, 2]));
        assert!(!cache.is_stale(&TODOS_KEY).await);
    }

    #[tokio::test]
    async fn test_cancelled_fetch_is_discarded() {
        // Arrange: 取得開始後に楽観的更新が入る
        let cache = QueryCache::new();
        cache.set(&TODOS_KEY, vec![1]).await;
        let ticket = cache.begin_fetch(&TODOS_KEY).await;
        cache.cancel_pending(&TODOS_KEY).await;
        cache.set(&TODOS_KEY, vec![1, 2]).await;

        // Act
        let written = cache.complete_fetch(ticket, vec![1]).await;

        // Assert: 楽観的な値が残る
        assert!(!written);
        assert_eq!(cache.get(&TODOS_KEY).await, Some(vec![1, 2]));
    }

    #[tokio::test]
    async fn test_update_requires_existing_value() {
        let cache: QueryCache<Vec<i32>> = QueryCache::new();

        assert!(!cache.update(&TODOS_KEY, |v| v.push(1)).await);
        assert_eq!(cache.get(&TODOS_KEY).await, None);

        cache.set(&TODOS_KEY, Vec::new()).await;
        assert!(cache.update(&TODOS_KEY, |v| v.push(1)).await);
        assert_eq!(cache.get(&TODOS_KEY).await, Some(vec![1]));
    }

    #[tokio::test]
    async fn test_rollback_restores_snapshot() {
        let cache = QueryCache::new();
        cache.set(&TODOS_KEY, vec![1, 2, 3]).await;
        let snapshot = cache.snapshot(&TODOS_KEY).await;

        cache.update(&TODOS_KEY, |v| v.retain(|n| *n != 2)).await;
        cache.rollback(&TODOS_KEY, snapshot).await;

        assert_eq!(cache.get(&TODOS_KEY).await, Some(vec![1, 2, 3]));
    }

    #[tokio::test]
    async fn test_invalidate_marks_stale() {
        let cache = QueryCache::new();
        assert!(cache.is_stale(&TODOS_KEY).await);

        let ticket = cache.begin_fetch(&TODOS_KEY).await;
        cache.complete_fetch(ticket, vec![0]).await;
        cache.invalidate(&TODOS_KEY).await;

        assert!(cache.is_stale(&TODOS_KEY).await);
        assert_eq!(cache.get(&TODOS_KEY).await, Some(vec![0]));
    }
}
