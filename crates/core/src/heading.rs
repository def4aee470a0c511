//! 章節標題辨識規則。 / Chapter heading recognition rules.
//!
//! A heading boundary is one of:
//! - `第` + number + `章`, where the number is ASCII or full-width digits or traditional numerals
//! - a `正文` ("main text") marker line
//! - the generated `Chapter {n}:` heading written on reassembly

use once_cell::sync::Lazy;
use regex::Regex;

static CHAPTER_HEADING: Lazy<Regex> =
    Lazy::new(|| compile(r"^第[0-9０-９零〇一二两三四五六七八九十百千万]+章"));

static MAIN_TEXT_HEADING: Lazy<Regex> =
    Lazy::new(|| compile(r"^正文(?:[\s:：、,，.．·\-—_]|$)"));

static GENERATED_HEADING: Lazy<Regex> =
    Lazy::new(|| compile(r"(?i)^chapter\s*[0-9]+(?:[\s:：.．\-—_]|$)"));

static MARKER_PREFIX: Lazy<Regex> = Lazy::new(|| {
    compile(concat!(
        r"^(?:",
        r"第[0-9０-９零〇一二两三四五六七八九十百千万]+章",
        r"|正文",
        r"|(?i:chapter)\s*[0-9]+",
        r")[\s:：、,，.．·\-—_]*",
    ))
});

fn compile(pattern: &str) -> Regex {
    // Patterns are literals in this module; a failure here is a programming error.
    Regex::new(pattern).unwrap_or_else(|err| panic!("invalid heading pattern {pattern}: {err}"))
}

/// 判斷一行是否為章節分界。 / Returns whether `line` starts a new chapter.
pub fn is_heading(line: &str) -> bool {
    let trimmed = line.trim();
    CHAPTER_HEADING.is_match(trimmed)
        || MAIN_TEXT_HEADING.is_match(trimmed)
        || GENERATED_HEADING.is_match(trimmed)
}

/// 去除標題開頭的章節標記（含編號與標點）。 / Strips one leading heading marker, including its number and punctuation.
pub fn strip_marker(heading: &str) -> &str {
    let trimmed = heading.trim();
    match MARKER_PREFIX.find(trimmed) {
        Some(found) => &trimmed[found.end()..],
        None => trimmed,
    }
}
