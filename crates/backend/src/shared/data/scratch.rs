use std::path::{Path, PathBuf};

use anyhow::Result;
use uuid::Uuid;

/// Uploaded file written to the scratch directory for the duration of one
/// request. Removed on drop, so the on-disk artifact never outlives the
/// request, whether the import succeeded, failed or the connection aborted.
pub struct ScratchFile {
    path: PathBuf,
}

impl ScratchFile {
    pub fn create(dir: &str, original_name: &str, bytes: &[u8]) -> Result<ScratchFile> {
        std::fs::create_dir_all(dir)?;
        let safe_name: String = original_name
            .chars()
            .map(|c| if c.is_alphanumeric() || c == '.' || c == '-' || c == '_' {
                c
            } else {
                '_'
            })
            .collect();
        let path = Path::new(dir).join(format!("{}_{}", Uuid::new_v4(), safe_name));
        std::fs::write(&path, bytes)?;
        Ok(ScratchFile { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Contents of the staged file; the import pipeline reads from here,
    /// not from the transient upload buffer.
    pub fn read(&self) -> Result<Vec<u8>> {
        Ok(std::fs::read(&self.path)?)
    }
}

impl Drop for ScratchFile {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!("Failed to remove scratch file {:?}: {}", self.path, e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scratch_file_is_removed_on_drop() {
        let dir = tempfile::tempdir().unwrap();
        let dir_str = dir.path().to_str().unwrap().to_string();
        let path = {
            let scratch = ScratchFile::create(&dir_str, "report.xlsx", b"abc").unwrap();
            assert!(scratch.path().exists());
            scratch.path().to_path_buf()
        };
        assert!(!path.exists());
    }

    #[test]
    fn scratch_file_reads_back_staged_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let dir_str = dir.path().to_str().unwrap().to_string();
        let scratch = ScratchFile::create(&dir_str, "sales.csv", b"Order ID\nA-1\n").unwrap();
        assert_eq!(scratch.read().unwrap(), b"Order ID\nA-1\n");
    }

    #[test]
    fn scratch_file_sanitizes_name() {
        let dir = tempfile::tempdir().unwrap();
        let dir_str = dir.path().to_str().unwrap().to_string();
        let scratch = ScratchFile::create(&dir_str, "../..//etc passwd.csv", b"x").unwrap();
        let name = scratch.path().file_name().unwrap().to_string_lossy().to_string();
        assert!(!name.contains('/'));
        assert!(!name.contains(' '));
    }
}
