use std::fs;
use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};

use chrono::Local;
use novelmerge_core::{write_atomic, IniDocument, IniError, IniSection, ProjectCode};
use thiserror::Error;

use crate::history::{History, HistoryEntry};

/// `last_modified` 欄位使用的時間格式。 / Timestamp format of the `last_modified` field.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const KEY_PATH: &str = "path";
const KEY_CODE: &str = "code";
const KEY_LAST_MODIFIED: &str = "last_modified";

#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("failed to read history {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse history {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: IniError,
    },
    #[error("failed to write history {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// 管理開啟紀錄檔的持久化儲存。 / Persists the opened-file history to a section-keyed text file.
///
/// ```text
/// [novel.txt]
/// path = /home/reader/novel.txt
/// code = 3f2a...
/// last_modified = 2026-10-16 09:30:00
/// ```
#[derive(Debug)]
pub struct HistoryStore {
    path: PathBuf,
    history: History,
}

impl HistoryStore {
    /// 從指定路徑載入紀錄；檔案不存在時回傳空紀錄。 / Loads history from disk, returning an empty history when the file is missing.
    pub fn load(path: impl AsRef<Path>, capacity: usize) -> Result<Self, HistoryError> {
        let path = path.as_ref().to_path_buf();
        let contents = match fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                return Ok(Self {
                    path,
                    history: History::new(capacity),
                });
            }
            Err(source) => return Err(HistoryError::Read { path, source }),
        };

        let doc = IniDocument::parse(&contents).map_err(|source| HistoryError::Parse {
            path: path.clone(),
            source,
        })?;
        let entries = doc.sections().filter_map(entry_from_section).collect();

        Ok(Self {
            path,
            history: History::with_entries(capacity, entries),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    /// 依插入順序列出紀錄。 / Entries in insertion order, oldest first.
    pub fn list(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.history.iter()
    }

    /// 記錄路徑與代碼並立即寫回檔案。 / Records `path` under `code` and persists immediately.
    ///
    /// The in-memory history only changes once the file has been written.
    pub fn record(&mut self, path: &Path, code: &ProjectCode) -> Result<(), HistoryError> {
        let timestamp = Local::now().format(TIMESTAMP_FORMAT).to_string();
        let mut updated = self.history.clone();
        updated.record(HistoryEntry::new(path, code.clone(), timestamp));
        self.commit(updated)?;
        log::debug!("history recorded {} as {code}", path.display());
        Ok(())
    }

    /// 以代碼查詢原始檔案路徑。 / Returns the file path registered under `code`.
    pub fn lookup(&self, code: &ProjectCode) -> Option<&Path> {
        self.history.lookup(code).map(|entry| entry.path.as_path())
    }

    pub fn set_capacity(&mut self, capacity: usize) -> Result<(), HistoryError> {
        let mut updated = self.history.clone();
        updated.set_capacity(capacity);
        self.commit(updated)
    }

    fn commit(&mut self, updated: History) -> Result<(), HistoryError> {
        persist(&self.path, &updated)?;
        self.history = updated;
        Ok(())
    }
}

fn persist(path: &Path, history: &History) -> Result<(), HistoryError> {
    let doc: IniDocument = history
        .iter()
        .map(|entry| {
            IniSection::new(entry.key.clone())
                .with(KEY_PATH, entry.path.to_string_lossy())
                .with(KEY_CODE, entry.code.as_str())
                .with(KEY_LAST_MODIFIED, entry.last_modified.clone())
        })
        .collect();
    write_atomic(path, doc.to_string().as_bytes()).map_err(|source| HistoryError::Write {
        path: path.to_path_buf(),
        source,
    })
}

fn entry_from_section(section: &IniSection) -> Option<HistoryEntry> {
    let path = section.get(KEY_PATH).filter(|p| !p.is_empty());
    let code = section.get(KEY_CODE).and_then(ProjectCode::parse);
    match (path, code) {
        (Some(path), Some(code)) => {
            let mut entry = HistoryEntry::new(
                path,
                code,
                section.get(KEY_LAST_MODIFIED).unwrap_or_default(),
            );
            entry.key = section.name().to_string();
            Some(entry)
        }
        _ => {
            log::warn!(
                "skipping history section [{}]: missing path or valid code",
                section.name()
            );
            None
        }
    }
}
