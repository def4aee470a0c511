//! Persistent settings for novelmerge: the opened-file history and user preferences.
//! 小說整合工具的持久化設定：開啟紀錄與偏好設定。

pub mod history;
pub mod preferences;
pub mod storage;

pub use history::{History, HistoryEntry, DEFAULT_HISTORY_CAPACITY};
pub use preferences::{Preferences, PreferencesError, PreferencesStore};
pub use storage::{HistoryError, HistoryStore, TIMESTAMP_FORMAT};
