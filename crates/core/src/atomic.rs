use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// 先寫入同目錄的暫存檔再重新命名，避免留下寫到一半的檔案。 /
/// Writes through a sibling temporary file and a rename so readers never see a partial file.
pub fn write_atomic(path: &Path, data: &[u8]) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let tmp_path = temp_sibling(path);
    {
        let mut tmp_file = File::create(&tmp_path)?;
        tmp_file.write_all(data)?;
        tmp_file.sync_all()?;
    }
    fs::rename(&tmp_path, path)
}

fn temp_sibling(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}
