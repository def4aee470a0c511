//! 合併輸出的檔案格式。 / Format of the reassembled novel file.
//!
//! ```text
//! Chapter 1: {name}\n{body}\n\n
//! Chapter 2: {name}\n{body}\n\n
//! {24-hex project code}
//! ```

use crate::code::ProjectCode;
use crate::splitter::{split_chapters, SplitChapter};

/// 合併輸出時每章使用的標題。 / Heading written before each chapter on reassembly.
pub fn display_heading(ordinal: usize, name: &str) -> String {
    format!("Chapter {ordinal}: {name}")
}

/// 依序將章節合併為單一文字，尾端附上專案代碼。 / Concatenates chapters in order and appends the project code.
pub fn assemble<'a, I>(chapters: I, code: &ProjectCode) -> String
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let mut output = String::new();
    for (index, (name, body)) in chapters.into_iter().enumerate() {
        output.push_str(&display_heading(index + 1, name));
        output.push('\n');
        output.push_str(body);
        output.push_str("\n\n");
    }
    output.push_str(code.as_str());
    output
}

/// 拆出尾端代碼後切分的結果。 / Result of splitting text after removing any trailing code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Disassembled {
    pub code: Option<ProjectCode>,
    pub chapters: Vec<SplitChapter>,
}

/// 移除尾端代碼後切分章節；帶代碼的文字視為 [`assemble`] 的輸出。 / Strips a trailing code, then splits.
///
/// Text that carried a code is treated as output of [`assemble`], so the blank-line
/// separators it added are removed again.
pub fn disassemble(text: &str) -> Disassembled {
    let (head, code) = ProjectCode::split_trailing(text);
    let chapters = match code {
        Some(_) => split_assembled(head),
        None => split_chapters(head),
    };
    Disassembled { code, chapters }
}

/// 切分 [`assemble`] 產生、且已移除代碼的文字。 / Splits text produced by [`assemble`] with its code already removed.
pub fn split_assembled(text: &str) -> Vec<SplitChapter> {
    let text = text.strip_suffix('\n').unwrap_or(text);
    let mut chapters = split_chapters(text);
    for chapter in &mut chapters {
        if chapter.body.ends_with('\n') {
            chapter.body.pop();
        }
    }
    chapters
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assemble_writes_headings_separators_and_code() {
        let code = ProjectCode::parse("aaaaaaaaaaaaaaaaaaaaaaaa").unwrap();
        let text = assemble([("开始", "内容A"), ("继续", "内容B")], &code);
        assert_eq!(
            text,
            "Chapter 1: 开始\n内容A\n\nChapter 2: 继续\n内容B\n\naaaaaaaaaaaaaaaaaaaaaaaa"
        );
    }

    #[test]
    fn disassemble_reverses_assemble() {
        let code = ProjectCode::generate();
        let chapters = [
            ("开始", "第一行\n\n第三行"),
            ("空章", ""),
            ("尾随换行", "结尾\n"),
        ];
        let text = assemble(chapters, &code);

        let parsed = disassemble(&text);
        assert_eq!(parsed.code, Some(code));
        let got: Vec<(String, String)> = parsed
            .chapters
            .into_iter()
            .map(|c| (crate::clean_name(&c.heading), c.body))
            .collect();
        let expected: Vec<(String, String)> = chapters
            .iter()
            .map(|(n, b)| (n.to_string(), b.to_string()))
            .collect();
        assert_eq!(got, expected);
    }

    #[test]
    fn disassemble_without_code_splits_plainly() {
        let parsed = disassemble("前言\n第1章 开始\n内容A\n");
        assert!(parsed.code.is_none());
        assert_eq!(parsed.chapters, vec![SplitChapter::new("第1章 开始", "内容A\n")]);
    }
}
