//! 以區段分組的 key = value 文字格式，用於章節清單與歷史紀錄。 /
//! Section-keyed `key = value` text format used by the chapter manifest and the history file.
//!
//! Section and key order is preserved. Blank lines and lines starting with `#` or `;`
//! are ignored. Values are trimmed and may contain `=`.

use std::fmt;

use thiserror::Error;

/// 解析失敗時回報行號。 / Parse errors carry the 1-based line number.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum IniError {
    #[error("line {line}: entry appears before any [section]")]
    EntryOutsideSection { line: usize },
    #[error("line {line}: expected `key = value` or `[section]`, found {content:?}")]
    Malformed { line: usize, content: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IniSection {
    name: String,
    entries: Vec<(String, String)>,
}

impl IniSection {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entries: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// 設定鍵值；若鍵已存在則原地取代。 / Sets a value, replacing an existing key in place.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(key, value);
        self
    }

    pub fn entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IniDocument {
    sections: Vec<IniSection>,
}

impl IniDocument {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn parse(input: &str) -> Result<Self, IniError> {
        let mut doc = IniDocument::new();
        let mut current: Option<usize> = None;

        for (index, raw) in input.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
                continue;
            }
            if let Some(name) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
                let name = name.trim();
                let position = match doc.sections.iter().position(|s| s.name == name) {
                    Some(existing) => existing,
                    None => {
                        doc.sections.push(IniSection::new(name));
                        doc.sections.len() - 1
                    }
                };
                current = Some(position);
                continue;
            }

            let Some((key, value)) = line.split_once('=') else {
                return Err(IniError::Malformed {
                    line: index + 1,
                    content: line.to_string(),
                });
            };
            let Some(position) = current else {
                return Err(IniError::EntryOutsideSection { line: index + 1 });
            };
            doc.sections[position].set(key.trim(), value.trim());
        }

        Ok(doc)
    }

    pub fn section(&self, name: &str) -> Option<&IniSection> {
        self.sections.iter().find(|s| s.name == name)
    }

    pub fn sections(&self) -> impl Iterator<Item = &IniSection> {
        self.sections.iter()
    }

    /// 加入區段；同名區段會先被移除，新區段放在最後。 / Appends a section, dropping any existing section with the same name first.
    pub fn push_section(&mut self, section: IniSection) {
        self.sections.retain(|s| s.name != section.name);
        self.sections.push(section);
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }
}

impl fmt::Display for IniDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, section) in self.sections.iter().enumerate() {
            if index > 0 {
                writeln!(f)?;
            }
            writeln!(f, "[{}]", section.name)?;
            for (key, value) in section.entries() {
                writeln!(f, "{key} = {value}")?;
            }
        }
        Ok(())
    }
}

impl FromIterator<IniSection> for IniDocument {
    fn from_iter<T: IntoIterator<Item = IniSection>>(iter: T) -> Self {
        let mut doc = IniDocument::new();
        for section in iter {
            doc.push_section(section);
        }
        doc
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_preserves_order_and_values() {
        let doc = IniDocument::parse(
            "; comment\n[ChapterOrder]\n1 = 开始\n2 = a = b\n\n[novel.txt]\npath=/tmp/novel.txt\n",
        )
        .unwrap();
        let names: Vec<_> = doc.sections().map(|s| s.name()).collect();
        assert_eq!(names, vec!["ChapterOrder", "novel.txt"]);

        let order = doc.section("ChapterOrder").unwrap();
        assert_eq!(order.get("1"), Some("开始"));
        assert_eq!(order.get("2"), Some("a = b"));
        assert_eq!(doc.section("novel.txt").unwrap().get("path"), Some("/tmp/novel.txt"));
    }

    #[test]
    fn display_round_trips() {
        let doc: IniDocument = [
            IniSection::new("ChapterOrder").with("1", "开始").with("2", "继续"),
            IniSection::new("meta").with("k", "v"),
        ]
        .into_iter()
        .collect();
        let rendered = doc.to_string();
        assert_eq!(
            rendered,
            "[ChapterOrder]\n1 = 开始\n2 = 继续\n\n[meta]\nk = v\n"
        );
        assert_eq!(IniDocument::parse(&rendered).unwrap(), doc);
    }

    #[test]
    fn push_section_moves_replaced_section_to_end() {
        let mut doc: IniDocument = [IniSection::new("a"), IniSection::new("b")]
            .into_iter()
            .collect();
        doc.push_section(IniSection::new("a").with("x", "1"));
        let names: Vec<_> = doc.sections().map(|s| s.name()).collect();
        assert_eq!(names, vec!["b", "a"]);
    }

    #[test]
    fn parse_reports_bad_lines() {
        assert_eq!(
            IniDocument::parse("k = v"),
            Err(IniError::EntryOutsideSection { line: 1 })
        );
        assert_eq!(
            IniDocument::parse("[s]\nnot an entry"),
            Err(IniError::Malformed {
                line: 2,
                content: "not an entry".to_string()
            })
        );
    }
}
