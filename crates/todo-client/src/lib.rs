//! ToDo クライアントライブラリ
//!
//! 共有クエリキャッシュに対する楽観的更新と、ToDo テーブルの表示モデルを提供する。

pub mod cache;
pub mod config;
pub mod errors;
pub mod http_remote;
pub mod mutations;
pub mod notify;
pub mod remote;
pub mod table;

pub use cache::{FetchTicket, QueryCache, QueryKey, TODOS_KEY};
pub use config::ClientConfig;
pub use errors::MutationError;
pub use http_remote::HttpTodoRemote;
pub use mutations::TodoMutations;
pub use notify::{Notification, NotificationLevel, Notifier, RecordingNotifier, TracingNotifier};
pub use remote::{RemoteError, TodoRemote};
pub use table::{Dialog, DialogMode, TableView, TodoRow, TodoTable};
