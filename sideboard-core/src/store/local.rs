/// Local filesystem implementation of `FileAccess`.
///
/// Writes go to a temp file in the same directory, then rename, so a
/// crashed write never leaves a half-written document behind.
use std::fs;
use std::io::Write;
use std::path::Path;
use std::time::SystemTime;

use super::{FileAccess, FileStat, StoreError};

#[derive(Debug, Default, Clone, Copy)]
pub struct LocalFiles;

impl LocalFiles {
    pub fn new() -> Self {
        Self
    }

    fn map_io(path: &Path, error: std::io::Error) -> StoreError {
        if error.kind() == std::io::ErrorKind::NotFound {
            StoreError::FileNotFound(path.to_path_buf())
        } else {
            StoreError::Io(error)
        }
    }
}

impl FileAccess for LocalFiles {
    fn read_text(&self, path: &Path) -> Result<String, StoreError> {
        fs::read_to_string(path).map_err(|e| Self::map_io(path, e))
    }

    fn write_text(&self, path: &Path, content: &str) -> Result<(), StoreError> {
        let tmp_path = path.with_extension("sideboard.tmp");
        let mut file = fs::File::create(&tmp_path)?;
        file.write_all(content.as_bytes())?;
        file.sync_all()?;
        fs::rename(&tmp_path, path)?;
        Ok(())
    }

    fn stat_meta(&self, path: &Path) -> Result<FileStat, StoreError> {
        let metadata = fs::metadata(path).map_err(|e| Self::map_io(path, e))?;
        let mtime_ms = metadata
            .modified()
            .ok()
            .and_then(|m| m.duration_since(SystemTime::UNIX_EPOCH).ok())
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);
        Ok(FileStat {
            size: metadata.len(),
            mtime_ms,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_write_then_read_roundtrip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("TODO.md");
        let files = LocalFiles::new();

        files.write_text(&path, "hello\n").unwrap();
        assert_eq!(files.read_text(&path).unwrap(), "hello\n");

        // Overwrite replaces the whole file.
        files.write_text(&path, "replaced").unwrap();
        assert_eq!(files.read_text(&path).unwrap(), "replaced");
    }

    #[test]
    fn test_missing_file_is_distinct_not_found() {
        let dir = TempDir::new().unwrap();
        let files = LocalFiles::new();
        let err = files.read_text(&dir.path().join("missing.md")).unwrap_err();
        assert!(err.is_not_found());
        let err = files.stat_meta(&dir.path().join("missing.md")).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_stat_meta_reports_size() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("f.md");
        let files = LocalFiles::new();
        files.write_text(&path, "12345").unwrap();
        let stat = files.stat_meta(&path).unwrap();
        assert_eq!(stat.size, 5);
        assert!(stat.mtime_ms > 0);
    }
}
