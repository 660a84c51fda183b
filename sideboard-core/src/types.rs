use serde::{Deserialize, Serialize};

/// Document file names inside the workspace directory.
pub const TODO_FILE: &str = "TODO.md";
pub const COMMITMENTS_FILE: &str = "COMMITMENTS.md";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TaskStatus {
    Todo,
    InProgress,
    Done,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
}

/// Who a task is assigned to. Determines which document it is persisted into:
/// `Ai` tasks live in COMMITMENTS.md, everything else in TODO.md.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Assignee {
    User,
    Ai,
    Unassigned,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TaskSource {
    Manual,
    AiGenerated,
}

/// The common task entity shared by both documents.
///
/// Timestamps are kept as ISO-8601 strings because that is both the wire
/// shape and the on-disk metadata shape; `dates::normalize_date` is the only
/// place they are interpreted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub status: TaskStatus,
    pub priority: Priority,
    pub assignee: Assignee,
    pub source: TaskSource,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub created_at: String,
}

/// The three fixed priority section markers in TODO.md.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SectionMarker {
    #[serde(rename = "🔴")]
    High,
    #[serde(rename = "🟡")]
    Medium,
    #[serde(rename = "🟢")]
    Low,
}

impl SectionMarker {
    pub const fn glyph(self) -> &'static str {
        match self {
            SectionMarker::High => "🔴",
            SectionMarker::Medium => "🟡",
            SectionMarker::Low => "🟢",
        }
    }

    pub fn from_glyph(glyph: &str) -> Option<Self> {
        match glyph {
            "🔴" => Some(SectionMarker::High),
            "🟡" => Some(SectionMarker::Medium),
            "🟢" => Some(SectionMarker::Low),
            _ => None,
        }
    }

    pub const fn priority(self) -> Priority {
        match self {
            SectionMarker::High => Priority::High,
            SectionMarker::Medium => Priority::Medium,
            SectionMarker::Low => Priority::Low,
        }
    }

    pub const fn from_priority(priority: Priority) -> Self {
        match priority {
            Priority::High => SectionMarker::High,
            Priority::Medium => SectionMarker::Medium,
            Priority::Low => SectionMarker::Low,
        }
    }
}

/// A contiguous `[start_index, end_index)` line range in TODO.md tagged with
/// a priority marker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TodoSection {
    pub marker: SectionMarker,
    pub title: String,
    pub start_index: usize,
    pub end_index: usize,
}

/// A checklist task with the positional metadata needed to splice an edit
/// back into the line array it was parsed from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedTodoTask {
    pub task: Task,
    pub line_index: usize,
    pub indent: String,
    pub marker: SectionMarker,
}

/// A heading-delimited commitment block, `[block_start, block_end)`.
///
/// The field values are kept verbatim alongside the mapped `Task` so an
/// update can re-render the block without losing text the common model does
/// not carry (raw status word, Sub-agent, free-text ETA).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedCommitmentTask {
    pub task: Task,
    pub block_start: usize,
    pub block_end: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub header_timestamp: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub_agent: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eta: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_update: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Parse result for TODO.md. `lines` is the original text split on `\n`,
/// returned verbatim for later splicing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TodoDocument {
    pub lines: Vec<String>,
    pub sections: Vec<TodoSection>,
    pub tasks: Vec<ParsedTodoTask>,
}

/// Parse result for COMMITMENTS.md. `active_insert_index` is where a new
/// block should be spliced in.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitmentsDocument {
    pub lines: Vec<String>,
    pub tasks: Vec<ParsedCommitmentTask>,
    pub active_insert_index: usize,
}

/// Partial task input for create/update/replace operations. Absent fields
/// keep their existing (or default) values.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<TaskStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignee: Option<Assignee>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<TaskSource>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

/// List response: all tasks from both documents plus an opaque revision
/// token derived from the files' modification times.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskList {
    pub tasks: Vec<Task>,
    pub revision: String,
}

/// Display view of one TODO priority section with metadata stripped.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TodoSectionView {
    pub emoji: SectionMarker,
    pub title: String,
    pub items: Vec<TodoItemView>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TodoItemView {
    pub text: String,
    pub completed: bool,
}

/// Display view of one commitment block. `status` keeps the four-word
/// commitment vocabulary (pending/in-progress/blocked/done), not the
/// collapsed common status.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitmentView {
    pub title: String,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eta: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_update: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitmentsOverview {
    pub active: Vec<CommitmentView>,
    pub recently_completed: Vec<CommitmentView>,
}
