//! Atomic file replacement: write to a sibling temp file, then rename.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::Result;

/// `<file name>.tmp` next to `path`.
pub fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Writes `bytes` so a concurrent reader sees either the old file or the
/// complete new one. Missing parent directories are created.
pub fn atomic_write(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let tmp = temp_path(path);
    {
        let mut file = fs::File::create(&tmp)?;
        file.write_all(bytes)?;
        file.sync_all()?;
    }
    replace(&tmp, path)
}

/// Renames `tmp` over `target`. If the filesystem refuses to overwrite,
/// the old target is removed and the rename retried.
pub fn replace(tmp: &Path, target: &Path) -> Result<()> {
    if fs::rename(tmp, target).is_ok() {
        return Ok(());
    }
    if target.exists() {
        fs::remove_file(target)?;
    }
    match fs::rename(tmp, target) {
        Ok(()) => Ok(()),
        Err(e) => {
            let _ = fs::remove_file(tmp);
            Err(e.into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overwrites_and_leaves_no_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("nested").join("report.txt");
        atomic_write(&target, b"first").unwrap();
        atomic_write(&target, b"second").unwrap();
        assert_eq!(fs::read_to_string(&target).unwrap(), "second");
        assert!(!temp_path(&target).exists());
    }

    #[test]
    fn temp_name_appends_suffix() {
        assert_eq!(temp_path(Path::new("out/plot.png")), PathBuf::from("out/plot.png.tmp"));
    }
}
