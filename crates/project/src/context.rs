//! 小說專案的工作階段：開啟、編輯、合併存檔。 /
//! An open novel project: open, edit, and save back to the source file.
//!
//! A [`ProjectContext`] owns everything a front end needs between calls: the source
//! path, the project code, the chapter store and the data-directory layout. History
//! is loaded from disk whenever an operation has to record into it.

use std::fs;
use std::path::{Path, PathBuf};

use novelmerge_core::{disassemble, read_text, ProjectCode, SplitChapter};
use walkdir::WalkDir;

use crate::error::ProjectError;
use crate::store::{AppendOptions, AppendOutcome, Chapter, NameConflictPolicy, ProjectStore};
use crate::workspace::Workspace;

const TEXT_EXTENSION: &str = "txt";

/// 新增章節檔案時的選項。 / Options for adding chapter files to a project.
#[derive(Debug, Clone, Default)]
pub struct AddOptions {
    /// 以來源檔名作為章節名前綴。 / Prefix each chapter name with its file stem.
    pub include_filename_prefix: bool,
    pub skip_identical: bool,
    pub on_conflict: NameConflictPolicy,
    /// 沒有章節標題的檔案視為單一章節。 / Treat a file without headings as one chapter named after its stem.
    pub whole_file_fallback: bool,
}

/// 單一新增檔案的處理結果。 / What happened to one added file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddedFile {
    pub path: PathBuf,
    pub outcomes: Vec<AppendOutcome>,
}

#[derive(Debug)]
pub struct ProjectContext {
    source_path: PathBuf,
    code: ProjectCode,
    store: ProjectStore,
    workspace: Workspace,
}

impl ProjectContext {
    /// 開啟小說：已知代碼載入既有專案，否則切分建立新專案。 /
    /// Opens a novel, loading the project of a recognised code or creating one from a split.
    ///
    /// The open is recorded in history under the recognised code, or under a fresh code
    /// when the file carries none. The source file itself is not modified.
    pub fn open(workspace: Workspace, path: impl AsRef<Path>) -> Result<Self, ProjectError> {
        let source_path = absolute(path.as_ref())?;
        let decoded = read_text(&source_path)?;
        log::info!(
            "opened {} as {}{}",
            source_path.display(),
            decoded.encoding_name(),
            if decoded.lossy { " (lossy)" } else { "" }
        );

        let mut history = workspace.load_history()?;
        let (_, trailing) = ProjectCode::split_trailing(&decoded.text);
        let recognised = trailing.and_then(|code| {
            history
                .lookup(&code)
                .map(|recorded| (code, recorded.to_path_buf()))
        });

        let (code, project_dir) = match recognised {
            Some((code, recorded)) => {
                log::info!("recognised project code {code} from {}", recorded.display());
                let dir = ProjectStore::project_dir(workspace.projects_root(), &recorded)?;
                (code, dir)
            }
            None => {
                let dir = ProjectStore::project_dir(workspace.projects_root(), &source_path)?;
                (ProjectCode::generate(), dir)
            }
        };

        let store = ProjectStore::create_or_load(project_dir, &source_path, &decoded.text)?;
        history.record(&source_path, &code)?;

        Ok(Self {
            source_path,
            code,
            store,
            workspace,
        })
    }

    pub fn source_path(&self) -> &Path {
        &self.source_path
    }

    pub fn code(&self) -> &ProjectCode {
        &self.code
    }

    pub fn store(&self) -> &ProjectStore {
        &self.store
    }

    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    pub fn chapter_order(&self) -> Vec<&str> {
        self.store.chapter_order()
    }

    pub fn chapters(&self) -> &[Chapter] {
        self.store.chapters()
    }

    pub fn content(&self, name: &str) -> Option<&str> {
        self.store.content(name)
    }

    pub fn missing_chapters(&self) -> &[String] {
        self.store.missing_chapters()
    }

    /// 依序加入檔案（資料夾展開為其中的 `.txt`）。 /
    /// Adds files in order; directories expand to the `.txt` files they contain.
    ///
    /// Each file is decoded and split on its own. A failing file aborts the batch and
    /// leaves chapters from earlier files in place.
    pub fn add_chapters<P: AsRef<Path>>(
        &mut self,
        paths: &[P],
        options: &AddOptions,
    ) -> Result<Vec<AddedFile>, ProjectError> {
        let files = expand_inputs(paths)?;
        let mut added = Vec::with_capacity(files.len());
        for path in files {
            let split = self.split_input(&path, options.whole_file_fallback)?;
            let append = AppendOptions {
                prefix: options
                    .include_filename_prefix
                    .then(|| file_stem(&path))
                    .flatten(),
                skip_identical: options.skip_identical,
                on_conflict: options.on_conflict,
            };
            let outcomes = self.store.append_chapters(split, &append)?;
            added.push(AddedFile { path, outcomes });
        }
        Ok(added)
    }

    /// 刪除所選章節。 / Deletes the selected chapter; `false` when no chapter has that name.
    pub fn delete_selected(&mut self, name: &str) -> Result<bool, ProjectError> {
        self.store.delete_chapter(name)
    }

    /// 將章節移到新位置。 / Moves the named chapter to `new_index`.
    pub fn reorder(&mut self, name: &str, new_index: usize) -> Result<(), ProjectError> {
        let from = self
            .store
            .position(name)
            .ok_or_else(|| ProjectError::UnknownChapter(name.to_string()))?;
        self.store.move_chapter(from, new_index)
    }

    pub fn update_content(&mut self, name: &str, content: &str) -> Result<(), ProjectError> {
        self.store.update_chapter(name, content)
    }

    /// 合併所有章節覆寫來源檔，附上新代碼並記錄。 /
    /// Writes all chapters back over the source file with a fresh code, then records it.
    pub fn save_all(&mut self) -> Result<&ProjectCode, ProjectError> {
        let code = ProjectCode::generate();
        self.store.write_assembled(&self.source_path, &code)?;
        self.workspace
            .load_history()?
            .record(&self.source_path, &code)?;
        self.code = code;
        Ok(&self.code)
    }

    fn split_input(
        &self,
        path: &Path,
        whole_file_fallback: bool,
    ) -> Result<Vec<SplitChapter>, ProjectError> {
        let decoded = read_text(path)?;
        log::debug!("{} decoded as {}", path.display(), decoded.encoding_name());
        let chapters = disassemble(&decoded.text).chapters;
        if !chapters.is_empty() {
            return Ok(chapters);
        }

        match file_stem(path) {
            Some(stem) if whole_file_fallback => {
                log::info!("{} has no headings, adding it whole", path.display());
                Ok(vec![SplitChapter::new(stem, decoded.text)])
            }
            _ => Err(ProjectError::NoChaptersDetected {
                path: path.to_path_buf(),
            }),
        }
    }
}

/// 展開輸入路徑：檔案原樣保留，資料夾依路徑排序列出 `.txt`。 /
/// Expands inputs: files are kept as given, directories yield their `.txt` files sorted by path.
pub fn expand_inputs<P: AsRef<Path>>(paths: &[P]) -> Result<Vec<PathBuf>, ProjectError> {
    let mut files = Vec::new();
    for path in paths {
        let path = path.as_ref();
        let metadata = fs::metadata(path).map_err(ProjectError::io(path))?;
        if !metadata.is_dir() {
            files.push(path.to_path_buf());
            continue;
        }

        let mut found = Vec::new();
        for entry in WalkDir::new(path) {
            match entry {
                Ok(entry) => {
                    let is_text = entry
                        .path()
                        .extension()
                        .is_some_and(|ext| ext.eq_ignore_ascii_case(TEXT_EXTENSION));
                    if entry.file_type().is_file() && is_text {
                        found.push(entry.into_path());
                    }
                }
                Err(err) => log::warn!("skipping entry under {}: {err}", path.display()),
            }
        }
        found.sort();
        files.extend(found);
    }
    Ok(files)
}

fn file_stem(path: &Path) -> Option<String> {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .filter(|stem| !stem.trim().is_empty())
}

fn absolute(path: &Path) -> Result<PathBuf, ProjectError> {
    fs::canonicalize(path).map_err(ProjectError::io(path))
}
