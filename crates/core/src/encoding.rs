use std::borrow::Cow;
use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use chardetng::EncodingDetector;
use encoding_rs::{Encoding as RsEncoding, UTF_16BE, UTF_16LE, UTF_8};
use thiserror::Error;

/// 嚴格解碼失敗後依序嘗試的編碼標籤。 / Encoding labels tried, in order, once strict decoding fails.
pub const FALLBACK_LABELS: [&str; 4] = ["utf-8", "gbk", "gb2312", "big5"];

/// 容錯解碼每容許一個錯誤所需的非 ASCII 位元組數。 / Non-ASCII bytes per tolerated error in tolerant decoding.
const TOLERATED_HIGH_BYTES_PER_ERROR: usize = 64;

/// 解碼文字時可能發生的錯誤。 / Errors raised while turning raw bytes into text.
#[derive(Error, Debug)]
pub enum EncodingError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("no encoding in the fallback chain could decode the data")]
    DecodeFailure,
}

/// 解碼結果與實際使用的編碼。 / Decoded text together with the encoding that produced it.
#[derive(Debug, Clone)]
pub struct DecodedText {
    pub text: String,
    pub encoding: &'static RsEncoding,
    pub had_bom: bool,
    /// 為 `true` 時表示有無法解碼的位元組被捨棄。 / `true` when undecodable bytes were dropped.
    pub lossy: bool,
}

impl DecodedText {
    fn new(text: &str, encoding: &'static RsEncoding, had_bom: bool, lossy: bool) -> Self {
        Self {
            text: normalize_newlines(text),
            encoding,
            had_bom,
            lossy,
        }
    }

    pub fn encoding_name(&self) -> &'static str {
        self.encoding.name()
    }
}

/// 讀取檔案並解碼為正規化文字。 / Reads a file and decodes it to normalised text.
pub fn read_text(path: impl AsRef<Path>) -> Result<DecodedText, EncodingError> {
    let path = path.as_ref();
    let io_err = |source| EncodingError::Io {
        path: path.to_path_buf(),
        source,
    };
    let mut file = File::open(path).map_err(io_err)?;
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes).map_err(io_err)?;

    let decoded = decode_text(&bytes)?;
    log::debug!(
        "decoded {} as {}{}",
        path.display(),
        decoded.encoding_name(),
        if decoded.lossy { " (lossy)" } else { "" }
    );
    Ok(decoded)
}

/// 偵測位元組的編碼並解碼，行尾統一轉為 `\n`。 / Detects the encoding of `bytes` and decodes them, converting line endings to `\n`.
///
/// 順序：BOM、UTF-16 啟發式、UTF-8、chardetng 猜測，最後是 [`FALLBACK_LABELS`] 的寬鬆解碼。 /
/// Order: BOM, UTF-16 heuristic, UTF-8, the chardetng guess, then lossy decoding through
/// [`FALLBACK_LABELS`]. A single-byte guess for non-ASCII input, or a guess that fails to
/// decode strictly, first gives way to a tolerant multi-byte decode.
pub fn decode_text(bytes: &[u8]) -> Result<DecodedText, EncodingError> {
    if bytes.is_empty() {
        return Ok(DecodedText::new("", UTF_8, false, false));
    }

    let (payload, bom_encoding) = match RsEncoding::for_bom(bytes) {
        Some((encoding, bom_len)) => (&bytes[bom_len..], Some(encoding)),
        None => (bytes, None),
    };

    if let Some(encoding) = bom_encoding {
        if let Some(text) = decode_strict(payload, encoding) {
            return Ok(DecodedText::new(&text, encoding, true, false));
        }
    }

    if bom_encoding.is_none() {
        if looks_like_utf16(payload, false) {
            if let Some(text) = decode_strict(payload, UTF_16LE) {
                return Ok(DecodedText::new(&text, UTF_16LE, false, false));
            }
        }
        if looks_like_utf16(payload, true) {
            if let Some(text) = decode_strict(payload, UTF_16BE) {
                return Ok(DecodedText::new(&text, UTF_16BE, false, false));
            }
        }
    }

    if let Ok(text) = std::str::from_utf8(payload) {
        return Ok(DecodedText::new(text, UTF_8, bom_encoding.is_some(), false));
    }

    let guess = detect_encoding(payload);
    if guess.is_single_byte() && !payload.is_ascii() {
        // A single corrupt byte makes the detector abandon multi-byte encodings.
        if let Some(decoded) = decode_tolerant(payload, &FALLBACK_LABELS) {
            log::debug!(
                "{} guess overridden by tolerant {} decode",
                guess.name(),
                decoded.encoding_name()
            );
            return Ok(decoded);
        }
    }
    if let Some(text) = decode_strict(payload, guess) {
        return Ok(DecodedText::new(&text, guess, false, false));
    }
    log::debug!("strict {} decode failed, trying fallbacks", guess.name());

    if !guess.is_single_byte() {
        if let Some(decoded) = decode_tolerant(payload, &FALLBACK_LABELS) {
            return Ok(decoded);
        }
    }
    decode_lossy_chain(payload, &FALLBACK_LABELS).ok_or(EncodingError::DecodeFailure)
}

fn detect_encoding(bytes: &[u8]) -> &'static RsEncoding {
    let mut detector = EncodingDetector::new();
    detector.feed(bytes, true);
    detector.guess(None, true)
}

fn decode_strict(bytes: &[u8], encoding: &'static RsEncoding) -> Option<String> {
    encoding
        .decode_without_bom_handling_and_without_replacement(bytes)
        .map(Cow::into_owned)
}

/// 容錯解碼：接受只有少數錯誤、且非 ASCII 字元幾乎都是 CJK 的結果。 /
/// Tolerant decoding for mostly-valid multi-byte text.
///
/// An attempt is accepted when it reports at most one error per
/// [`TOLERATED_HIGH_BYTES_PER_ERROR`] non-ASCII bytes (at least one) and nine in ten of
/// its non-ASCII characters are CJK. Undecodable sequences are dropped.
fn decode_tolerant(bytes: &[u8], labels: &[&str]) -> Option<DecodedText> {
    let high_bytes = bytes.iter().filter(|b| !b.is_ascii()).count();
    let allowed_errors = (high_bytes / TOLERATED_HIGH_BYTES_PER_ERROR).max(1);

    for label in labels {
        let Some(encoding) = RsEncoding::for_label(label.as_bytes()) else {
            continue;
        };
        if encoding.is_single_byte() {
            continue;
        }
        let (cow, _) = encoding.decode_without_bom_handling(bytes);
        let errors = cow.chars().filter(|ch| *ch == '\u{FFFD}').count();
        if errors > allowed_errors {
            continue;
        }

        let text: String = cow.chars().filter(|ch| *ch != '\u{FFFD}').collect();
        let non_ascii = text.chars().filter(|ch| !ch.is_ascii()).count();
        let cjk = text.chars().filter(|ch| is_cjk(*ch)).count();
        if non_ascii > 0 && cjk * 10 >= non_ascii * 9 {
            return Some(DecodedText::new(&text, encoding, false, errors > 0));
        }
    }
    None
}

fn is_cjk(ch: char) -> bool {
    matches!(
        ch,
        '\u{3000}'..='\u{303F}'
            | '\u{3400}'..='\u{4DBF}'
            | '\u{4E00}'..='\u{9FFF}'
            | '\u{F900}'..='\u{FAFF}'
            | '\u{FF00}'..='\u{FFEF}'
            | '\u{2000}'..='\u{206F}'
    )
}

/// 依序寬鬆解碼；若某次嘗試捨棄了全部位元組則視為失敗。 / Lossy decoding in order; an attempt that drops every byte counts as a failure.
fn decode_lossy_chain(bytes: &[u8], labels: &[&str]) -> Option<DecodedText> {
    for label in labels {
        let Some(encoding) = RsEncoding::for_label(label.as_bytes()) else {
            continue;
        };
        let (cow, had_errors) = encoding.decode_without_bom_handling(bytes);
        let text: Cow<'_, str> = if had_errors {
            Cow::Owned(cow.chars().filter(|ch| *ch != '\u{FFFD}').collect())
        } else {
            cow
        };
        if !text.is_empty() {
            return Some(DecodedText::new(&text, encoding, false, had_errors));
        }
        log::debug!("fallback {label} produced no text");
    }
    None
}

fn looks_like_utf16(bytes: &[u8], big_endian: bool) -> bool {
    if bytes.len() < 2 || bytes.len() % 2 != 0 {
        return false;
    }

    let sample_len = bytes.len().min(64);
    let mut zero_count = 0;
    let mut total = 0;

    for chunk in bytes[..sample_len].chunks_exact(2) {
        let zero_byte = if big_endian { chunk[0] } else { chunk[1] };
        if zero_byte == 0 {
            zero_count += 1;
        }
        total += 1;
    }

    total > 0 && zero_count * 2 >= total
}

/// 將 CRLF 與單獨的 CR 轉為 LF。 / Converts CRLF and lone CR to LF.
pub fn normalize_newlines(input: &str) -> String {
    let mut result = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();
    while let Some(ch) = chars.next() {
        match ch {
            '\r' => {
                if matches!(chars.peek(), Some('\n')) {
                    chars.next();
                }
                result.push('\n');
            }
            _ => result.push(ch),
        }
    }
    result
}
