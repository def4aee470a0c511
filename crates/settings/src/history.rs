use std::collections::VecDeque;
use std::path::{Path, PathBuf};

use novelmerge_core::ProjectCode;

/// 歷史紀錄預設保留的筆數。 / Default number of retained history entries.
pub const DEFAULT_HISTORY_CAPACITY: usize = 10;

/// 單一開啟紀錄。 / One remembered novel file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    /// 檔案名稱，作為區段鍵。 / File name, used as the section key.
    pub key: String,
    pub path: PathBuf,
    pub code: ProjectCode,
    pub last_modified: String,
}

impl HistoryEntry {
    /// 以路徑的檔名作為鍵建立紀錄。 / Builds an entry keyed by the path's file name.
    pub fn new(
        path: impl Into<PathBuf>,
        code: ProjectCode,
        last_modified: impl Into<String>,
    ) -> Self {
        let path = path.into();
        let key = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.to_string_lossy().into_owned());
        Self {
            key,
            path,
            code,
            last_modified: last_modified.into(),
        }
    }
}

/// 依插入順序保存、有容量上限的開啟紀錄（最舊在前）。 / Bounded history kept in insertion order, oldest first.
#[derive(Debug, Clone)]
pub struct History {
    capacity: usize,
    entries: VecDeque<HistoryEntry>,
}

impl History {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            entries: VecDeque::with_capacity(capacity),
        }
    }

    /// 由持久化資料還原；超出容量時捨棄最舊的紀錄。 / Restores persisted entries, dropping the oldest beyond capacity.
    pub fn with_entries(capacity: usize, entries: Vec<HistoryEntry>) -> Self {
        let mut history = Self::new(capacity);
        history.entries = entries.into_iter().collect();
        history.evict_overflow();
        history
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn set_capacity(&mut self, capacity: usize) {
        self.capacity = capacity.max(1);
        self.evict_overflow();
    }

    /// 加入紀錄：先移除相同路徑或相同鍵的舊紀錄，再附加於尾端並依容量淘汰。 /
    /// Records an entry: removes any entry with the same path or key, appends the new one, then evicts the oldest over capacity.
    pub fn record(&mut self, entry: HistoryEntry) {
        self.entries
            .retain(|existing| existing.path != entry.path && existing.key != entry.key);
        self.entries.push_back(entry);
        self.evict_overflow();
    }

    /// 以代碼查詢紀錄。 / Finds the entry registered under `code`.
    pub fn lookup(&self, code: &ProjectCode) -> Option<&HistoryEntry> {
        self.entries.iter().find(|entry| &entry.code == code)
    }

    pub fn find_path(&self, path: &Path) -> Option<&HistoryEntry> {
        self.entries.iter().find(|entry| entry.path == path)
    }

    pub fn iter(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.entries.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    fn evict_overflow(&mut self) {
        while self.entries.len() > self.capacity {
            if let Some(evicted) = self.entries.pop_front() {
                log::debug!("history evicted {}", evicted.path.display());
            }
        }
    }
}
