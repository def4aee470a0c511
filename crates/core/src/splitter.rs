use crate::heading;

/// 切分後的單一章節（原始標題與內文）。 / One split chapter: the raw heading line and its body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitChapter {
    pub heading: String,
    pub body: String,
}

impl SplitChapter {
    pub fn new(heading: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            heading: heading.into(),
            body: body.into(),
        }
    }
}

/// 依標題行將文字切分為章節。 / Partitions `text` into chapters at heading lines.
///
/// Lines before the first heading are front matter and are dropped. Bodies are the
/// lines between two headings joined with `\n`, so rejoining every body reproduces
/// the input without front matter and heading lines. Returns an empty vector when no
/// heading is found.
pub fn split_chapters(text: &str) -> Vec<SplitChapter> {
    let mut chapters = Vec::new();
    let mut current: Option<(String, Vec<&str>)> = None;

    for line in text.split('\n') {
        if heading::is_heading(line) {
            if let Some((heading, lines)) = current.take() {
                chapters.push(SplitChapter::new(heading, lines.join("\n")));
            }
            current = Some((line.trim().to_string(), Vec::new()));
        } else if let Some((_, lines)) = current.as_mut() {
            lines.push(line);
        }
    }

    if let Some((heading, lines)) = current {
        chapters.push(SplitChapter::new(heading, lines.join("\n")));
    }
    chapters
}
