use std::path::{Path, PathBuf};

use novelmerge_settings::{HistoryStore, Preferences, DEFAULT_HISTORY_CAPACITY};

use crate::error::ProjectError;

/// 開啟紀錄檔名。 / File name of the history store inside the data directory.
pub const HISTORY_FILE: &str = "history.ini";
/// 偏好設定檔名。 / File name of the preferences store inside the data directory.
pub const PREFERENCES_FILE: &str = "preferences.json";
/// 預設專案根目錄名稱。 / Default projects root, relative to the data directory.
pub const PROJECTS_DIR: &str = "projects";

/// 資料目錄的配置：專案根目錄與開啟紀錄。 /
/// Layout of the data directory: where projects live and where history is kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Workspace {
    projects_root: PathBuf,
    history_path: PathBuf,
    history_capacity: usize,
}

impl Workspace {
    pub fn new(projects_root: impl Into<PathBuf>, history_path: impl Into<PathBuf>) -> Self {
        Self {
            projects_root: projects_root.into(),
            history_path: history_path.into(),
            history_capacity: DEFAULT_HISTORY_CAPACITY,
        }
    }

    /// 依偏好設定推導資料目錄內的各路徑。 / Resolves paths under `data_dir`, honouring preference overrides.
    pub fn from_data_dir(data_dir: &Path, preferences: &Preferences) -> Self {
        let projects_root = preferences
            .projects_dir
            .clone()
            .unwrap_or_else(|| data_dir.join(PROJECTS_DIR));
        Self::new(projects_root, data_dir.join(HISTORY_FILE))
            .with_history_capacity(preferences.history_capacity)
    }

    pub fn preferences_path(data_dir: &Path) -> PathBuf {
        data_dir.join(PREFERENCES_FILE)
    }

    pub fn with_history_capacity(mut self, capacity: usize) -> Self {
        self.history_capacity = capacity.max(1);
        self
    }

    pub fn projects_root(&self) -> &Path {
        &self.projects_root
    }

    pub fn history_path(&self) -> &Path {
        &self.history_path
    }

    pub fn history_capacity(&self) -> usize {
        self.history_capacity
    }

    /// 讀取開啟紀錄（每次操作重新載入）。 / Loads the history store; callers reload it per operation.
    pub fn load_history(&self) -> Result<HistoryStore, ProjectError> {
        Ok(HistoryStore::load(&self.history_path, self.history_capacity)?)
    }
}
