use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use novelmerge_core::{
    assemble, clean_name, dedupe_name, disassemble, normalize_newlines, read_text,
    sanitize_file_name, write_atomic, EncodingError, ProjectCode, SplitChapter,
};

use crate::error::ProjectError;
use crate::manifest::Manifest;

const CHAPTER_EXTENSION: &str = "txt";

/// 專案內的單一章節。 / One chapter of a project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chapter {
    pub name: String,
    pub content: String,
}

/// 新增章節時名稱已存在的處理方式。 / What to do when an added chapter's name is already taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NameConflictPolicy {
    /// 加上 `-N` 後綴另存新章。 / Add as a new chapter with a `-N` suffix.
    #[default]
    Deduplicate,
    /// 覆寫同名章節的內容。 / Replace the body of the existing chapter.
    Overwrite,
}

#[derive(Debug, Clone, Default)]
pub struct AppendOptions {
    /// 名稱前綴（通常是來源檔名）。 / Name prefix, usually the source file stem.
    pub prefix: Option<String>,
    pub skip_identical: bool,
    pub on_conflict: NameConflictPolicy,
}

/// 每個被新增的章節的處理結果。 / Outcome for each appended chapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppendOutcome {
    Added(String),
    Overwritten(String),
    SkippedIdentical { heading: String, matches: String },
}

/// 專案資料夾：每章一個文字檔，加上一份章節順序檔。 /
/// A project directory: one text file per chapter plus an order manifest.
///
/// Every mutation writes the affected chapter file and rewrites the full manifest, so
/// the order list and the chapter files stay in sync.
#[derive(Debug)]
pub struct ProjectStore {
    dir: PathBuf,
    manifest: Manifest,
    chapters: Vec<Chapter>,
    missing: Vec<String>,
}

impl ProjectStore {
    /// 由來源檔名推導專案資料夾。 / Derives the project directory from the source file stem.
    pub fn project_dir(projects_root: &Path, source_path: &Path) -> Result<PathBuf, ProjectError> {
        let stem = source_path
            .file_stem()
            .map(|stem| sanitize_file_name(&stem.to_string_lossy()))
            .filter(|stem| !stem.trim().is_empty())
            .ok_or_else(|| ProjectError::InvalidSourcePath(source_path.to_path_buf()))?;
        Ok(projects_root.join(stem))
    }

    /// 若已有章節順序檔則載入，否則切分來源文字建立新專案。 /
    /// Loads the project when a manifest exists, otherwise splits `text` into a new one.
    pub fn create_or_load(
        dir: impl Into<PathBuf>,
        source_path: &Path,
        text: &str,
    ) -> Result<Self, ProjectError> {
        let dir = dir.into();
        if let Some(store) = Self::load(&dir)? {
            return Ok(store);
        }

        let chapters = disassemble(text).chapters;
        if chapters.is_empty() {
            return Err(ProjectError::NoChaptersDetected {
                path: source_path.to_path_buf(),
            });
        }
        Self::create(dir, chapters)
    }

    /// 載入既有專案；章節檔遺失的項目會被略過並記錄。 /
    /// Loads an existing project. Entries whose chapter file is missing are skipped and logged.
    pub fn load(dir: &Path) -> Result<Option<Self>, ProjectError> {
        let manifest = Manifest::in_dir(dir);
        let Some(order) = manifest.load()? else {
            return Ok(None);
        };

        let mut store = Self {
            dir: dir.to_path_buf(),
            manifest,
            chapters: Vec::with_capacity(order.len()),
            missing: Vec::new(),
        };
        for name in order {
            let path = store.chapter_path(&name);
            match read_text(&path) {
                Ok(decoded) => store.chapters.push(Chapter {
                    name,
                    content: decoded.text,
                }),
                Err(EncodingError::Io { source, .. }) if source.kind() == ErrorKind::NotFound => {
                    log::warn!("missing chapter file {}, skipping", path.display());
                    store.missing.push(name);
                }
                Err(err) => return Err(err.into()),
            }
        }

        if !store.missing.is_empty() {
            store.save_manifest()?;
        }
        log::info!(
            "loaded {} chapters from {}",
            store.chapters.len(),
            store.dir.display()
        );
        Ok(Some(store))
    }

    /// 以切分結果建立新專案並寫入所有章節檔。 / Creates a project from split chapters, writing every chapter file.
    pub fn create(dir: impl Into<PathBuf>, split: Vec<SplitChapter>) -> Result<Self, ProjectError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(ProjectError::io(&dir))?;

        let mut store = Self {
            manifest: Manifest::in_dir(&dir),
            dir,
            chapters: Vec::with_capacity(split.len()),
            missing: Vec::new(),
        };
        for chapter in split {
            let base = clean_name(&chapter.heading);
            let name = dedupe_name(&base, store.chapters.iter().map(|c| c.name.as_str()));
            store.write_chapter_file(&name, &chapter.body)?;
            store.chapters.push(Chapter {
                name,
                content: chapter.body,
            });
        }
        store.save_manifest()?;
        log::info!(
            "created project {} with {} chapters",
            store.dir.display(),
            store.chapters.len()
        );
        Ok(store)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn manifest_path(&self) -> &Path {
        self.manifest.path()
    }

    pub fn chapters(&self) -> &[Chapter] {
        &self.chapters
    }

    pub fn chapter_order(&self) -> Vec<&str> {
        self.chapters.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn content(&self, name: &str) -> Option<&str> {
        self.position(name).map(|index| self.chapters[index].content.as_str())
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.chapters.iter().position(|c| c.name == name)
    }

    pub fn len(&self) -> usize {
        self.chapters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chapters.is_empty()
    }

    /// 載入時因檔案遺失而略過的章節。 / Chapters dropped on load because their file was missing.
    pub fn missing_chapters(&self) -> &[String] {
        &self.missing
    }

    pub fn chapter_path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{name}.{CHAPTER_EXTENSION}"))
    }

    /// 依序新增章節，每章寫檔後立即覆寫章節順序檔。 /
    /// Appends chapters in order, rewriting the manifest after each one.
    ///
    /// There is no rollback: when a write fails, chapters added before it stay.
    pub fn append_chapters(
        &mut self,
        split: Vec<SplitChapter>,
        options: &AppendOptions,
    ) -> Result<Vec<AppendOutcome>, ProjectError> {
        let mut outcomes = Vec::with_capacity(split.len());
        for chapter in split {
            let cleaned = clean_name(&chapter.heading);
            let base = match options.prefix.as_deref() {
                Some(prefix) => format!("{} - {cleaned}", sanitize_file_name(prefix)),
                None => cleaned,
            };

            if options.skip_identical {
                if let Some(existing) = self.chapters.iter().find(|c| c.content == chapter.body) {
                    log::info!(
                        "chapter {base:?} matches existing {:?}, skipped",
                        existing.name
                    );
                    outcomes.push(AppendOutcome::SkippedIdentical {
                        heading: chapter.heading,
                        matches: existing.name.clone(),
                    });
                    continue;
                }
            }

            if options.on_conflict == NameConflictPolicy::Overwrite {
                if let Some(index) = self.position(&base) {
                    self.write_chapter_file(&base, &chapter.body)?;
                    self.chapters[index].content = chapter.body;
                    log::info!("chapter {base:?} overwritten");
                    outcomes.push(AppendOutcome::Overwritten(base));
                    continue;
                }
            }

            let name = dedupe_name(&base, self.chapters.iter().map(|c| c.name.as_str()));
            self.write_chapter_file(&name, &chapter.body)?;
            self.chapters.push(Chapter {
                name: name.clone(),
                content: chapter.body,
            });
            self.save_manifest()?;
            log::info!("chapter {name:?} added");
            outcomes.push(AppendOutcome::Added(name));
        }
        Ok(outcomes)
    }

    /// 替換章節內文（行尾統一為 `\n`）。 / Replaces a chapter's body, with line endings normalised to `\n`.
    pub fn update_chapter(&mut self, name: &str, content: &str) -> Result<(), ProjectError> {
        let index = self
            .position(name)
            .ok_or_else(|| ProjectError::UnknownChapter(name.to_string()))?;
        let content = normalize_newlines(content);
        self.write_chapter_file(name, &content)?;
        self.chapters[index].content = content;
        Ok(())
    }

    /// 刪除章節；回傳 `false` 表示名稱不存在。 / Deletes a chapter, returning `false` when the name is unknown.
    pub fn delete_chapter(&mut self, name: &str) -> Result<bool, ProjectError> {
        let Some(index) = self.position(name) else {
            return Ok(false);
        };
        let path = self.chapter_path(name);
        match fs::remove_file(&path) {
            Ok(()) => {}
            Err(err) if err.kind() == ErrorKind::NotFound => {}
            Err(err) => return Err(ProjectError::io(path)(err)),
        }
        self.chapters.remove(index);
        self.save_manifest()?;
        log::info!("chapter {name:?} deleted");
        Ok(true)
    }

    /// 將位於 `from` 的章節移到 `to`。 / Moves the chapter at `from` to position `to`.
    pub fn move_chapter(&mut self, from: usize, to: usize) -> Result<(), ProjectError> {
        let len = self.chapters.len();
        for index in [from, to] {
            if index >= len {
                return Err(ProjectError::IndexOutOfRange { index, len });
            }
        }
        if from != to {
            let chapter = self.chapters.remove(from);
            self.chapters.insert(to, chapter);
            self.save_manifest()?;
        }
        Ok(())
    }

    /// 合併全部章節寫入 `target`，尾端附上 `code`。 / Writes all chapters, in order, to `target` followed by `code`.
    pub fn write_assembled(&self, target: &Path, code: &ProjectCode) -> Result<(), ProjectError> {
        let text = assemble(
            self.chapters
                .iter()
                .map(|c| (c.name.as_str(), c.content.as_str())),
            code,
        );
        write_atomic(target, text.as_bytes()).map_err(ProjectError::io(target))?;
        log::info!(
            "saved {} chapters to {}",
            self.chapters.len(),
            target.display()
        );
        Ok(())
    }

    fn write_chapter_file(&self, name: &str, content: &str) -> Result<(), ProjectError> {
        let path = self.chapter_path(name);
        write_atomic(&path, content.as_bytes()).map_err(ProjectError::io(&path))
    }

    fn save_manifest(&self) -> Result<(), ProjectError> {
        self.manifest.save(&self.chapter_order())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const SOURCE: &str = "前言\n第1章 开始\n内容A\n第2章 继续\n内容B";

    fn fresh(dir: &Path) -> ProjectStore {
        ProjectStore::create_or_load(dir.join("novel"), Path::new("novel.txt"), SOURCE).unwrap()
    }

    #[test]
    fn create_writes_chapters_and_manifest() {
        let dir = tempdir().unwrap();
        let store = fresh(dir.path());

        assert_eq!(store.chapter_order(), vec!["开始", "继续"]);
        assert_eq!(
            fs::read_to_string(store.manifest_path()).unwrap(),
            "[ChapterOrder]\n1 = 开始\n2 = 继续\n"
        );
        assert_eq!(
            fs::read_to_string(store.chapter_path("开始")).unwrap(),
            "内容A"
        );
    }

    #[test]
    fn create_or_load_prefers_existing_manifest() {
        let dir = tempdir().unwrap();
        {
            let mut store = fresh(dir.path());
            store.update_chapter("继续", "改过的内容").unwrap();
        }
        let reloaded =
            ProjectStore::create_or_load(dir.path().join("novel"), Path::new("novel.txt"), "")
                .unwrap();
        assert_eq!(reloaded.content("继续"), Some("改过的内容"));
    }

    #[test]
    fn create_without_headings_fails_and_writes_nothing() {
        let dir = tempdir().unwrap();
        let err = ProjectStore::create_or_load(
            dir.path().join("plain"),
            Path::new("plain.txt"),
            "没有任何章节标题",
        )
        .unwrap_err();
        assert!(matches!(err, ProjectError::NoChaptersDetected { .. }));
        assert!(!dir.path().join("plain").exists());
    }

    #[test]
    fn duplicate_headings_are_deduplicated_on_split() {
        let dir = tempdir().unwrap();
        let store = ProjectStore::create_or_load(
            dir.path().join("dup"),
            Path::new("dup.txt"),
            "第1章 重复\n甲\n第2章 重复\n乙\n第3章\n丙\n第4章\n丁",
        )
        .unwrap();
        assert_eq!(
            store.chapter_order(),
            vec!["重复", "重复-1", "未知章节", "未知章节-1"]
        );
    }

    #[test]
    fn missing_chapter_file_is_skipped_and_manifest_pruned() {
        let dir = tempdir().unwrap();
        let project_dir = {
            let store = fresh(dir.path());
            fs::remove_file(store.chapter_path("开始")).unwrap();
            store.dir().to_path_buf()
        };

        let store = ProjectStore::load(&project_dir).unwrap().unwrap();
        assert_eq!(store.chapter_order(), vec!["继续"]);
        assert_eq!(store.missing_chapters(), ["开始".to_string()]);
        assert_eq!(
            Manifest::in_dir(&project_dir).load().unwrap(),
            Some(vec!["继续".to_string()])
        );
    }

    #[test]
    fn append_dedupes_and_prefixes() {
        let dir = tempdir().unwrap();
        let mut store = fresh(dir.path());

        let outcomes = store
            .append_chapters(
                vec![SplitChapter::new("第9章 开始", "新的开始")],
                &AppendOptions::default(),
            )
            .unwrap();
        assert_eq!(outcomes, vec![AppendOutcome::Added("开始-1".to_string())]);

        let options = AppendOptions {
            prefix: Some("番外".to_string()),
            ..AppendOptions::default()
        };
        store
            .append_chapters(
                vec![
                    SplitChapter::new("第1章 雪夜", "一"),
                    SplitChapter::new("第2章 雪夜", "二"),
                ],
                &options,
            )
            .unwrap();

        assert_eq!(
            store.chapter_order(),
            vec!["开始", "继续", "开始-1", "番外 - 雪夜", "番外 - 雪夜-1"]
        );
        let manifest = Manifest::in_dir(store.dir()).load().unwrap().unwrap();
        assert_eq!(manifest, store.chapter_order());
        assert!(store.chapter_path("番外 - 雪夜-1").is_file());
    }

    #[test]
    fn append_can_skip_identical_or_overwrite() {
        let dir = tempdir().unwrap();
        let mut store = fresh(dir.path());

        let skip = AppendOptions {
            skip_identical: true,
            ..AppendOptions::default()
        };
        let outcomes = store
            .append_chapters(vec![SplitChapter::new("第5章 别名", "内容A")], &skip)
            .unwrap();
        assert_eq!(
            outcomes,
            vec![AppendOutcome::SkippedIdentical {
                heading: "第5章 别名".to_string(),
                matches: "开始".to_string(),
            }]
        );

        let overwrite = AppendOptions {
            on_conflict: NameConflictPolicy::Overwrite,
            ..AppendOptions::default()
        };
        let outcomes = store
            .append_chapters(vec![SplitChapter::new("第5章 开始", "更短")], &overwrite)
            .unwrap();
        assert_eq!(outcomes, vec![AppendOutcome::Overwritten("开始".to_string())]);
        assert_eq!(store.len(), 2);
        assert_eq!(store.content("开始"), Some("更短"));
        assert_eq!(fs::read_to_string(store.chapter_path("开始")).unwrap(), "更短");
    }

    #[test]
    fn update_normalises_line_endings_across_reload() {
        let dir = tempdir().unwrap();
        let mut store = fresh(dir.path());
        store.update_chapter("开始", "第一行\r\n第二行\r第三行").unwrap();
        assert_eq!(store.content("开始"), Some("第一行\n第二行\n第三行"));

        let reloaded = ProjectStore::load(store.dir()).unwrap().unwrap();
        assert_eq!(reloaded.content("开始"), store.content("开始"));
    }

    #[test]
    fn delete_is_idempotent_on_disk() {
        let dir = tempdir().unwrap();
        let mut store = fresh(dir.path());
        fs::remove_file(store.chapter_path("开始")).unwrap();

        assert!(store.delete_chapter("开始").unwrap());
        assert!(!store.delete_chapter("开始").unwrap());
        assert_eq!(store.chapter_order(), vec!["继续"]);
        assert_eq!(
            fs::read_to_string(store.manifest_path()).unwrap(),
            "[ChapterOrder]\n1 = 继续\n"
        );
    }

    #[test]
    fn move_relocates_single_entry() {
        let dir = tempdir().unwrap();
        let mut store = fresh(dir.path());
        store
            .append_chapters(
                vec![SplitChapter::new("第3章 收尾", "内容C")],
                &AppendOptions::default(),
            )
            .unwrap();

        store.move_chapter(2, 0).unwrap();
        assert_eq!(store.chapter_order(), vec!["收尾", "开始", "继续"]);
        assert!(matches!(
            store.move_chapter(0, 3),
            Err(ProjectError::IndexOutOfRange { index: 3, len: 3 })
        ));

        let reloaded = ProjectStore::load(store.dir()).unwrap().unwrap();
        assert_eq!(reloaded.chapter_order(), vec!["收尾", "开始", "继续"]);
    }

    #[test]
    fn write_assembled_round_trips_through_split() {
        let dir = tempdir().unwrap();
        let mut store = fresh(dir.path());
        store.update_chapter("开始", "第一段\n\n第二段\n").unwrap();
        let target = dir.path().join("out.txt");
        let code = ProjectCode::generate();

        store.write_assembled(&target, &code).unwrap();
        let text = fs::read_to_string(&target).unwrap();
        assert!(text.starts_with("Chapter 1: 开始\n第一段"));
        assert!(text.ends_with(code.as_str()));

        let parsed = disassemble(&text);
        assert_eq!(parsed.code.as_ref(), Some(&code));
        let round_trip: Vec<Chapter> = parsed
            .chapters
            .into_iter()
            .map(|c| Chapter {
                name: clean_name(&c.heading),
                content: c.body,
            })
            .collect();
        assert_eq!(round_trip, store.chapters());
    }

    #[test]
    fn project_dir_uses_file_stem() {
        let root = Path::new("/data/projects");
        assert_eq!(
            ProjectStore::project_dir(root, Path::new("/books/长夜.txt")).unwrap(),
            root.join("长夜")
        );
        assert!(matches!(
            ProjectStore::project_dir(root, Path::new("/")),
            Err(ProjectError::InvalidSourcePath(_))
        ));
    }
}
