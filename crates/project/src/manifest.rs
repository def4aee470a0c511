use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use novelmerge_core::{write_atomic, IniDocument, IniSection};

use crate::error::ProjectError;

/// 章節順序檔名。 / File name of the chapter order manifest.
pub const MANIFEST_FILE: &str = "manifest.ini";
/// 章節順序所在的區段。 / Section holding the chapter order.
pub const ORDER_SECTION: &str = "ChapterOrder";

/// 以 `[ChapterOrder]` 區段保存章節順序（鍵為 1..N）。 /
/// Persists the chapter order as a `[ChapterOrder]` section keyed `1..N`.
#[derive(Debug, Clone)]
pub struct Manifest {
    path: PathBuf,
}

impl Manifest {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// 指向專案資料夾內的章節順序檔。 / Manifest inside a project directory.
    pub fn in_dir(dir: &Path) -> Self {
        Self::new(dir.join(MANIFEST_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 讀取章節順序；檔案不存在時回傳 `Ok(None)`。 / Loads the order, returning `Ok(None)` when the file is absent.
    ///
    /// Entries are ordered by their numeric key. Non-numeric keys and repeated names are
    /// skipped with a warning.
    pub fn load(&self) -> Result<Option<Vec<String>>, ProjectError> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(ProjectError::io(&self.path)(err)),
        };
        let doc = IniDocument::parse(&contents).map_err(|source| ProjectError::InvalidManifest {
            path: self.path.clone(),
            source,
        })?;

        let Some(section) = doc.section(ORDER_SECTION) else {
            log::warn!("{} has no [{ORDER_SECTION}] section", self.path.display());
            return Ok(Some(Vec::new()));
        };

        let mut numbered: Vec<(usize, &str)> = Vec::new();
        for (key, name) in section.entries() {
            match key.parse::<usize>() {
                Ok(position) if !name.is_empty() => numbered.push((position, name)),
                _ => log::warn!(
                    "ignoring manifest entry {key} = {name:?} in {}",
                    self.path.display()
                ),
            }
        }
        numbered.sort_by_key(|(position, _)| *position);

        let mut order: Vec<String> = Vec::with_capacity(numbered.len());
        for (_, name) in numbered {
            if order.iter().any(|existing| existing == name) {
                log::warn!("duplicate chapter {name:?} in {}", self.path.display());
                continue;
            }
            order.push(name.to_string());
        }
        Ok(Some(order))
    }

    /// 以原子寫入覆寫整份章節順序。 / Rewrites the whole order atomically.
    pub fn save<S: AsRef<str>>(&self, order: &[S]) -> Result<(), ProjectError> {
        let mut section = IniSection::new(ORDER_SECTION);
        for (index, name) in order.iter().enumerate() {
            section.set((index + 1).to_string(), name.as_ref());
        }
        let doc: IniDocument = std::iter::once(section).collect();
        write_atomic(&self.path, doc.to_string().as_bytes()).map_err(ProjectError::io(&self.path))
    }
}
