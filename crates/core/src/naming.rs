use crate::heading;

/// 清理後名稱為空時使用的預設章節名。 / Placeholder used when a cleaned heading is empty.
pub const UNKNOWN_CHAPTER: &str = "未知章节";

const ILLEGAL_FILE_CHARS: &[char] = &['/', '\\', ':', '*', '?', '"', '<', '>', '|'];

/// 由原始標題產生顯示名稱。 / Produces a display name from a raw heading.
///
/// Strips one leading heading marker, trims, and replaces characters that cannot
/// appear in a file name. An empty result becomes [`UNKNOWN_CHAPTER`].
pub fn clean_name(raw_heading: &str) -> String {
    let sanitized = sanitize_file_name(heading::strip_marker(raw_heading));
    let trimmed = sanitized.trim();
    if trimmed.is_empty() {
        UNKNOWN_CHAPTER.to_string()
    } else {
        trimmed.to_string()
    }
}

/// 將無法出現在檔名中的字元換成 `_`。 / Replaces characters that cannot appear in a file name with `_`.
pub fn sanitize_file_name(name: &str) -> String {
    name.chars()
        .map(|ch| {
            if ILLEGAL_FILE_CHARS.contains(&ch) || ch.is_control() {
                '_'
            } else {
                ch
            }
        })
        .collect()
}

/// 若名稱已被使用，加上 `-N` 後綴（N 為現有最大值加一）。 / Appends `-N` when `base` is taken, with N one past the largest existing suffix.
///
/// ```
/// use novelmerge_core::dedupe_name;
/// assert_eq!(dedupe_name("base", ["base", "base-1", "base-3"]), "base-4");
/// assert_eq!(dedupe_name("base", ["other"]), "base");
/// ```
pub fn dedupe_name<I, S>(base: &str, existing: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut taken = false;
    let mut max_suffix: u64 = 0;
    for name in existing {
        let name = name.as_ref();
        if name == base {
            taken = true;
            continue;
        }
        let suffix = name
            .strip_prefix(base)
            .and_then(|rest| rest.strip_prefix('-'))
            .filter(|digits| !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()))
            .and_then(|digits| digits.parse::<u64>().ok());
        if let Some(value) = suffix {
            max_suffix = max_suffix.max(value);
        }
    }

    if taken {
        format!("{base}-{}", max_suffix.saturating_add(1))
    } else {
        base.to_string()
    }
}
