//! Output file helpers.

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

/// Write `bytes` to `path` in one step.
///
/// The data goes to a sibling temp file first and is renamed over the
/// target, so readers never observe a half-written report or mapping file.
/// Missing parent directories are created.
pub fn write_atomically(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }

    let mut tmp_name = path.file_name().unwrap_or_default().to_os_string();
    tmp_name.push(".tmp");
    let tmp = path.with_file_name(tmp_name);

    fs::write(&tmp, bytes).with_context(|| format!("Failed to write {}", tmp.display()))?;
    if let Err(err) = fs::rename(&tmp, path) {
        let _ = fs::remove_file(&tmp);
        return Err(err).with_context(|| format!("Failed to move {} into place", path.display()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_creates_parents_and_replaces() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("output").join("report.bin");

        write_atomically(&target, b"first").unwrap();
        write_atomically(&target, b"second").unwrap();

        assert_eq!(fs::read(&target).unwrap(), b"second");
        assert!(!dir.path().join("output").join("report.bin.tmp").exists());
    }
}
