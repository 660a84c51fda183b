/// File access boundary for the task store.
///
/// The store never touches the filesystem directly; it goes through the
/// `FileAccess` capability so outer layers can substitute their own backend
/// (and tests can run against a temp directory via `LocalFiles`).
pub mod local;

use std::path::{Path, PathBuf};

pub use local::LocalFiles;

/// Coarse file metadata, used to build the polling revision token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileStat {
    pub size: u64,
    pub mtime_ms: u64,
}

pub trait FileAccess: Send + Sync {
    /// Read a whole file as UTF-8 text. Missing files are reported as
    /// `StoreError::FileNotFound`, which most read paths recover as an
    /// empty document.
    fn read_text(&self, path: &Path) -> Result<String, StoreError>;

    /// Whole-file overwrite. No partial-write semantics are exposed.
    fn write_text(&self, path: &Path, content: &str) -> Result<(), StoreError>;

    fn stat_meta(&self, path: &Path) -> Result<FileStat, StoreError>;
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("Task not found: {0}")]
    TaskNotFound(String),

    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::FileNotFound(_))
    }
}

/// Boilerplate written to TODO.md when the file is absent or blank.
/// The three priority sections are part of the on-disk contract.
pub fn todo_template(date_token: &str) -> String {
    format!(
        "# Master TODO List\n\n*Last updated: {}*\n\n---\n\n## 🔴 High Priority\n\n\n## 🟡 Medium Priority\n\n\n## 🟢 Low Priority / Maintenance\n",
        date_token
    )
}

/// Boilerplate written to COMMITMENTS.md when the file is absent or blank.
pub const COMMITMENTS_TEMPLATE: &str = "# COMMITMENTS.md - Open Tasks & Pending Follow-ups\n\n> This file tracks tasks the assistant has committed to but not yet completed.\n> Status is checked and reported on every heartbeat.\n\n## Active Commitments\n\n<!-- Add new commitments below this line -->\n\n\n## Recently Completed (last 7 days)\n\n<!-- Move completed items here, delete after 7 days -->\n";
