//! Text-processing core for novelmerge: decoding, chapter splitting, naming and the
//! on-disk formats shared by the project and history stores.
//! 小說整合工具的文字處理核心：解碼、章節切分、命名與共用的檔案格式。

pub mod assembly;
pub mod atomic;
pub mod code;
pub mod encoding;
pub mod heading;
pub mod ini;
pub mod naming;
pub mod splitter;

pub use assembly::{assemble, disassemble, display_heading, split_assembled, Disassembled};
pub use atomic::write_atomic;
pub use code::{ProjectCode, PROJECT_CODE_LEN};
pub use encoding::{
    decode_text, normalize_newlines, read_text, DecodedText, EncodingError, FALLBACK_LABELS,
};
pub use ini::{IniDocument, IniError, IniSection};
pub use naming::{clean_name, dedupe_name, sanitize_file_name, UNKNOWN_CHAPTER};
pub use splitter::{split_chapters, SplitChapter};
