use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

use novelmerge_core::write_atomic;

use crate::history::DEFAULT_HISTORY_CAPACITY;

const PREFERENCES_VERSION: u32 = 1;
const MAX_HISTORY_CAPACITY: usize = 100;

#[derive(Debug, Error)]
pub enum PreferencesError {
    #[error("failed to read preferences {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse preferences {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to serialize preferences {path}: {source}")]
    Serialize {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to write preferences {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preferences {
    #[serde(default = "default_version")]
    pub version: u32,
    /// 開啟紀錄保留筆數。 / Number of history entries kept.
    #[serde(default = "default_history_capacity")]
    pub history_capacity: usize,
    /// 專案資料夾根目錄；未設定時使用資料目錄下的 `projects/`。 / Projects root; defaults to `projects/` under the data directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub projects_dir: Option<PathBuf>,
    /// 新增章節時是否以來源檔名作為前綴。 / Whether added chapters are prefixed with their source file name.
    #[serde(default)]
    pub prefix_added_chapters: bool,
    /// 新增章節時略過與既有章節內容相同者。 / Skip added chapters whose body matches an existing chapter.
    #[serde(default)]
    pub skip_identical_chapters: bool,
}

fn default_version() -> u32 {
    PREFERENCES_VERSION
}

fn default_history_capacity() -> usize {
    DEFAULT_HISTORY_CAPACITY
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            version: PREFERENCES_VERSION,
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            projects_dir: None,
            prefix_added_chapters: false,
            skip_identical_chapters: false,
        }
    }
}

impl Preferences {
    pub fn sanitize(&mut self) {
        if self.version == 0 {
            self.version = PREFERENCES_VERSION;
        }
        if self.history_capacity == 0 {
            self.history_capacity = DEFAULT_HISTORY_CAPACITY;
        }
        self.history_capacity = self.history_capacity.min(MAX_HISTORY_CAPACITY);
        if self
            .projects_dir
            .as_ref()
            .is_some_and(|dir| dir.as_os_str().is_empty())
        {
            self.projects_dir = None;
        }
    }
}

#[derive(Debug)]
pub struct PreferencesStore {
    path: PathBuf,
    data: Preferences,
}

impl PreferencesStore {
    pub fn new(path: impl Into<PathBuf>, preferences: Preferences) -> Self {
        Self {
            path: path.into(),
            data: preferences,
        }
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, PreferencesError> {
        let path = path.as_ref().to_path_buf();
        if !path.exists() {
            let mut data = Preferences::default();
            data.sanitize();
            return Ok(Self { path, data });
        }

        let contents = fs::read_to_string(&path).map_err(|source| PreferencesError::Read {
            path: path.clone(),
            source,
        })?;
        let mut data: Preferences =
            serde_json::from_str(&contents).map_err(|source| PreferencesError::Parse {
                path: path.clone(),
                source,
            })?;
        data.sanitize();
        Ok(Self { path, data })
    }

    pub fn preferences(&self) -> &Preferences {
        &self.data
    }

    pub fn update<F>(&mut self, mut op: F) -> Result<(), PreferencesError>
    where
        F: FnMut(&mut Preferences),
    {
        op(&mut self.data);
        self.data.sanitize();
        self.save()
    }

    pub fn save(&self) -> Result<(), PreferencesError> {
        let payload = serde_json::to_string_pretty(&self.data).map_err(|source| {
            PreferencesError::Serialize {
                path: self.path.clone(),
                source,
            }
        })?;
        write_atomic(&self.path, payload.as_bytes()).map_err(|source| PreferencesError::Write {
            path: self.path.clone(),
            source,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
