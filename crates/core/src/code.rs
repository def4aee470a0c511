use std::fmt;

use uuid::Uuid;

/// 專案代碼的字元數。 / Number of hex characters in a project code.
pub const PROJECT_CODE_LEN: usize = 24;

/// 附加在已儲存小說檔尾端、用以辨識專案的代碼。 / Identifier appended to a saved novel so the project can be recognised on reopen.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProjectCode(String);

impl ProjectCode {
    /// 產生新的隨機代碼。 / Generates a fresh random code.
    pub fn generate() -> Self {
        let hex = Uuid::new_v4().simple().to_string();
        Self(hex[..PROJECT_CODE_LEN].to_string())
    }

    /// 解析剛好 24 個十六進位字元的字串（不分大小寫）。 / Parses exactly 24 hex characters, case-insensitively.
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        if value.len() == PROJECT_CODE_LEN && value.bytes().all(|b| b.is_ascii_hexdigit()) {
            Some(Self(value.to_ascii_lowercase()))
        } else {
            None
        }
    }

    /// 若文字以專案代碼結尾，拆出代碼與其前方的內容。 / Splits a trailing project code off `text`, if present.
    ///
    /// The code must be exactly 24 hex characters: a longer hex run is not a code.
    /// Trailing whitespace after the code is tolerated.
    pub fn split_trailing(text: &str) -> (&str, Option<Self>) {
        let trimmed = text.trim_end();
        if trimmed.len() < PROJECT_CODE_LEN {
            return (text, None);
        }
        let start = trimmed.len() - PROJECT_CODE_LEN;
        if !trimmed.is_char_boundary(start) {
            return (text, None);
        }
        let (head, candidate) = trimmed.split_at(start);
        if head.ends_with(|ch: char| ch.is_ascii_hexdigit()) {
            return (text, None);
        }
        match Self::parse(candidate) {
            Some(code) => (head, Some(code)),
            None => (text, None),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProjectCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_codes_are_parseable_and_distinct() {
        let first = ProjectCode::generate();
        let second = ProjectCode::generate();
        assert_eq!(first.as_str().len(), PROJECT_CODE_LEN);
        assert_eq!(ProjectCode::parse(first.as_str()), Some(first.clone()));
        assert_ne!(first, second);
    }

    #[test]
    fn parse_rejects_wrong_length_or_alphabet() {
        assert!(ProjectCode::parse("abc").is_none());
        assert!(ProjectCode::parse("zzzzzzzzzzzzzzzzzzzzzzzz").is_none());
        assert_eq!(
            ProjectCode::parse("ABCDEF0123456789ABCDEF01").map(|c| c.to_string()),
            Some("abcdef0123456789abcdef01".to_string())
        );
    }

    #[test]
    fn split_trailing_detects_code_after_separator() {
        let text = "Chapter 1: 甲\n内容\n\n0123456789abcdef01234567";
        let (head, code) = ProjectCode::split_trailing(text);
        assert_eq!(head, "Chapter 1: 甲\n内容\n\n");
        assert_eq!(code.unwrap().as_str(), "0123456789abcdef01234567");
    }

    #[test]
    fn split_trailing_ignores_longer_hex_runs_and_plain_text() {
        let longer = "内容\n00123456789abcdef01234567";
        assert_eq!(ProjectCode::split_trailing(longer), (longer, None));
        assert_eq!(ProjectCode::split_trailing("短"), ("短", None));
        assert_eq!(ProjectCode::split_trailing("第1章\n内容"), ("第1章\n内容", None));
    }
}
