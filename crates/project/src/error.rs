use std::io;
use std::path::PathBuf;

use novelmerge_core::{EncodingError, IniError};
use novelmerge_settings::HistoryError;
use thiserror::Error;

/// 專案操作可能發生的錯誤。 / Errors raised by project operations.
#[derive(Debug, Error)]
pub enum ProjectError {
    #[error(transparent)]
    Encoding(#[from] EncodingError),
    #[error("no chapters detected in {path}")]
    NoChaptersDetected { path: PathBuf },
    #[error("project IO error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid manifest {path}: {source}")]
    InvalidManifest {
        path: PathBuf,
        #[source]
        source: IniError,
    },
    #[error("unknown chapter {0:?}")]
    UnknownChapter(String),
    #[error("position {index} is out of range for {len} chapters")]
    IndexOutOfRange { index: usize, len: usize },
    #[error("{0} does not name a file")]
    InvalidSourcePath(PathBuf),
    #[error(transparent)]
    History(#[from] HistoryError),
}

impl ProjectError {
    pub(crate) fn io(path: impl Into<PathBuf>) -> impl FnOnce(io::Error) -> Self {
        let path = path.into();
        move |source| ProjectError::Io { path, source }
    }
}
