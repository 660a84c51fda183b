/// The task store: one common task entity, two physical serializations.
///
/// Tasks assigned to the AI live as heading+field blocks in COMMITMENTS.md;
/// everything else lives as checklist lines in TODO.md. Every operation
/// re-reads and re-parses the current file text, splices the edit into the
/// original line array, and writes the whole file back. There is no shared
/// in-memory index and no cross-file transaction: two racing writers are
/// resolved last-write-wins at whole-file granularity.
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::commitments::{commitments_overview, parse_commitments_markdown, render_commitment_block};
use crate::dates::{date_token_now, iso_now, normalize_date};
use crate::meta::{IdGen, SystemIdGen};
use crate::store::{todo_template, FileAccess, LocalFiles, StoreError, COMMITMENTS_TEMPLATE};
use crate::todo::{parse_todo_markdown, render_todo_line, todo_overview};
use crate::types::{
    Assignee, CommitmentsOverview, Priority, SectionMarker, Task, TaskList, TaskPayload,
    TaskSource, TaskStatus, TodoSectionView, COMMITMENTS_FILE, TODO_FILE,
};

/// Which physical document a task is persisted into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskDocument {
    Todo,
    Commitments,
}

impl TaskDocument {
    pub fn for_assignee(assignee: Assignee) -> Self {
        if assignee == Assignee::Ai {
            TaskDocument::Commitments
        } else {
            TaskDocument::Todo
        }
    }

    pub const fn file_name(self) -> &'static str {
        match self {
            TaskDocument::Todo => TODO_FILE,
            TaskDocument::Commitments => COMMITMENTS_FILE,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WriteMode {
    Add,
    Update,
    Delete,
}

/// Join spliced lines back into file text, reapplying the trailing-newline
/// convention recorded from the original content.
pub fn ensure_trailing_newline(lines: &[String], had_trailing_newline: bool) -> String {
    let content = lines.join("\n");
    if had_trailing_newline && !content.ends_with('\n') {
        return format!("{}\n", content);
    }
    content
}

pub struct TaskStore<F: FileAccess = LocalFiles> {
    files: F,
    todo_path: PathBuf,
    commitments_path: PathBuf,
    id_gen: Box<dyn IdGen>,
}

impl TaskStore<LocalFiles> {
    /// Open a store over a workspace directory on the local filesystem.
    pub fn open(workspace: &Path) -> Self {
        Self::new(LocalFiles::new(), workspace)
    }
}

impl<F: FileAccess> TaskStore<F> {
    pub fn new(files: F, workspace: &Path) -> Self {
        Self {
            files,
            todo_path: workspace.join(TODO_FILE),
            commitments_path: workspace.join(COMMITMENTS_FILE),
            id_gen: Box::new(SystemIdGen::new()),
        }
    }

    /// Replace the identifier source for new tasks (tests pin ids this way).
    pub fn with_id_gen(mut self, id_gen: Box<dyn IdGen>) -> Self {
        self.id_gen = id_gen;
        self
    }

    fn path_for(&self, document: TaskDocument) -> &Path {
        match document {
            TaskDocument::Todo => &self.todo_path,
            TaskDocument::Commitments => &self.commitments_path,
        }
    }

    /// Read a file, recovering a missing one as an empty document.
    fn read_file_safe(&self, path: &Path) -> Result<(String, u64), StoreError> {
        match self.files.read_text(path) {
            Ok(content) => {
                let mtime_ms = self
                    .files
                    .stat_meta(path)
                    .map(|stat| stat.mtime_ms)
                    .unwrap_or(0);
                Ok((content, mtime_ms))
            }
            Err(error) if error.is_not_found() => Ok((String::new(), 0)),
            Err(error) => Err(error),
        }
    }

    /// Seed a document from its template when absent or blank.
    fn ensure_file(&self, path: &Path, template: &str) -> Result<(), StoreError> {
        let (content, _) = self.read_file_safe(path)?;
        if !content.trim().is_empty() {
            return Ok(());
        }
        log::info!("[sideboard.store] seeding {} from template", path.display());
        self.files.write_text(path, template)
    }

    /// All tasks from both documents plus the polling revision token.
    pub fn list_tasks(&self) -> Result<TaskList, StoreError> {
        self.ensure_file(&self.todo_path, &todo_template(&date_token_now()))?;
        self.ensure_file(&self.commitments_path, COMMITMENTS_TEMPLATE)?;

        let (todo_content, todo_mtime) = self.read_file_safe(&self.todo_path)?;
        let (commitments_content, commitments_mtime) =
            self.read_file_safe(&self.commitments_path)?;

        let now = iso_now();
        let todo_parsed = parse_todo_markdown(&todo_content, &now);
        let commitments_parsed = parse_commitments_markdown(&commitments_content, &now);

        let tasks = todo_parsed
            .tasks
            .into_iter()
            .map(|entry| entry.task)
            .chain(commitments_parsed.tasks.into_iter().map(|entry| entry.task))
            .collect();

        Ok(TaskList {
            tasks,
            revision: format!("{}-{}", todo_mtime, commitments_mtime),
        })
    }

    /// Opaque change token from both files' modification times. Lets a
    /// polling consumer detect change without deep comparison.
    pub fn revision(&self) -> Result<String, StoreError> {
        let mtime = |path: &Path| match self.files.stat_meta(path) {
            Ok(stat) => Ok(stat.mtime_ms),
            Err(error) if error.is_not_found() => Ok(0),
            Err(error) => Err(error),
        };
        Ok(format!(
            "{}-{}",
            mtime(&self.todo_path)?,
            mtime(&self.commitments_path)?
        ))
    }

    /// Raw content of one managed document. Missing files surface as a
    /// distinct not-found error here, unlike the parser-feeding read paths.
    pub fn document_content(&self, document: TaskDocument) -> Result<String, StoreError> {
        self.files.read_text(self.path_for(document))
    }

    /// Metadata-stripped display view of TODO.md.
    pub fn todo_overview(&self) -> Result<Vec<TodoSectionView>, StoreError> {
        let (content, _) = self.read_file_safe(&self.todo_path)?;
        Ok(todo_overview(&content))
    }

    /// Active / recently-completed display view of COMMITMENTS.md.
    pub fn commitments_overview(&self) -> Result<CommitmentsOverview, StoreError> {
        let (content, _) = self.read_file_safe(&self.commitments_path)?;
        Ok(commitments_overview(&content, &iso_now()))
    }

    /// Create a task in the document selected by its assignee.
    pub fn create_task(&self, payload: TaskPayload) -> Result<Task, StoreError> {
        if payload.title.as_deref().map(str::trim).unwrap_or("").is_empty() {
            return Err(StoreError::MissingField("title"));
        }

        let task = self.build_task_from_payload(payload, Assignee::User, &iso_now());
        match TaskDocument::for_assignee(task.assignee) {
            TaskDocument::Commitments => {
                self.write_commitment_task(&task, WriteMode::Add, false)?
            }
            TaskDocument::Todo => self.write_todo_task(&task, WriteMode::Add)?,
        }
        Ok(task)
    }

    /// Merge a partial update onto an existing task and persist it.
    ///
    /// An assignee change between the two documents deletes from the old
    /// one and inserts fresh into the new one; the two serializations are
    /// structurally different, so there is no in-place move.
    pub fn update_task(&self, payload: TaskPayload) -> Result<Task, StoreError> {
        let Some(id) = payload.id.clone() else {
            return Err(StoreError::MissingField("id"));
        };

        let (todo_content, _) = self.read_file_safe(&self.todo_path)?;
        let (commitments_content, _) = self.read_file_safe(&self.commitments_path)?;
        let now = iso_now();
        let todo_parsed = parse_todo_markdown(&todo_content, &now);
        let commitments_parsed = parse_commitments_markdown(&commitments_content, &now);

        let existing = todo_parsed
            .tasks
            .iter()
            .map(|entry| &entry.task)
            .chain(commitments_parsed.tasks.iter().map(|entry| &entry.task))
            .find(|task| task.id == id)
            .cloned();
        let Some(existing) = existing else {
            return Err(StoreError::TaskNotFound(id));
        };

        let status_touched = payload.status.is_some();
        let updated = apply_update(&existing, &payload);

        if existing.assignee != updated.assignee
            && TaskDocument::for_assignee(existing.assignee)
                != TaskDocument::for_assignee(updated.assignee)
        {
            if TaskDocument::for_assignee(existing.assignee) == TaskDocument::Commitments {
                self.write_commitment_task(&existing, WriteMode::Delete, false)?;
                self.write_todo_task(&updated, WriteMode::Add)?;
            } else {
                self.write_todo_task(&existing, WriteMode::Delete)?;
                self.write_commitment_task(&updated, WriteMode::Add, false)?;
            }
            return Ok(updated);
        }

        match TaskDocument::for_assignee(updated.assignee) {
            TaskDocument::Commitments => {
                self.write_commitment_task(&updated, WriteMode::Update, !status_touched)?
            }
            TaskDocument::Todo => self.write_todo_task(&updated, WriteMode::Update)?,
        }
        Ok(updated)
    }

    /// Delete a task by identifier. Unknown identifiers are a distinct
    /// not-found outcome, never a silent success.
    pub fn delete_task(&self, id: &str) -> Result<(), StoreError> {
        let (todo_content, _) = self.read_file_safe(&self.todo_path)?;
        let (commitments_content, _) = self.read_file_safe(&self.commitments_path)?;
        let now = iso_now();
        let todo_parsed = parse_todo_markdown(&todo_content, &now);
        let commitments_parsed = parse_commitments_markdown(&commitments_content, &now);

        if let Some(entry) = todo_parsed.tasks.iter().find(|entry| entry.task.id == id) {
            return self.write_todo_task(&entry.task, WriteMode::Delete);
        }
        if let Some(entry) = commitments_parsed
            .tasks
            .iter()
            .find(|entry| entry.task.id == id)
        {
            return self.write_commitment_task(&entry.task, WriteMode::Delete, false);
        }
        Err(StoreError::TaskNotFound(id.to_string()))
    }

    /// Replace every managed task in both documents with the given set,
    /// leaving unmanaged lines untouched.
    ///
    /// The two files are written independently; a crash between the writes
    /// can leave them mutually inconsistent (accepted failure model).
    pub fn replace_all(&self, payloads: Vec<TaskPayload>) -> Result<(), StoreError> {
        let (todo_content, _) = self.read_file_safe(&self.todo_path)?;
        let (commitments_content, _) = self.read_file_safe(&self.commitments_path)?;
        let now = iso_now();
        let todo_parsed = parse_todo_markdown(&todo_content, &now);
        let commitments_parsed = parse_commitments_markdown(&commitments_content, &now);

        // Strip managed task lines/blocks, keeping everything else.
        let managed_lines: std::collections::HashSet<usize> = todo_parsed
            .tasks
            .iter()
            .map(|entry| entry.line_index)
            .collect();
        let todo_lines: Vec<String> = todo_parsed
            .lines
            .iter()
            .enumerate()
            .filter(|(index, _)| !managed_lines.contains(index))
            .map(|(_, line)| line.clone())
            .collect();

        let mut commitment_lines = commitments_parsed.lines.clone();
        let mut blocks: Vec<(usize, usize)> = commitments_parsed
            .tasks
            .iter()
            .map(|entry| (entry.block_start, entry.block_end))
            .collect();
        blocks.sort_by(|a, b| b.0.cmp(&a.0));
        for (start, end) in blocks {
            commitment_lines.drain(start..end);
        }

        let (commitment_payloads, todo_payloads): (Vec<TaskPayload>, Vec<TaskPayload>) = payloads
            .into_iter()
            .partition(|payload| payload.assignee == Some(Assignee::Ai));
        let todo_tasks: Vec<Task> = todo_payloads
            .into_iter()
            .map(|payload| self.build_task_from_payload(payload, Assignee::User, &now))
            .collect();
        let commitment_tasks: Vec<Task> = commitment_payloads
            .into_iter()
            .map(|payload| self.build_task_from_payload(payload, Assignee::Ai, &now))
            .collect();

        // Re-parse the stripped text so section boundaries and the insert
        // index refer to the line array actually being spliced.
        let todo_after = parse_todo_markdown(&todo_lines.join("\n"), &now);
        let mut todo_lines = todo_after.lines.clone();

        let mut grouped: HashMap<SectionMarker, Vec<Task>> = HashMap::new();
        for task in todo_tasks {
            grouped
                .entry(SectionMarker::from_priority(task.priority))
                .or_default()
                .push(task);
        }

        let mut sections = todo_after.sections.clone();
        sections.sort_by(|a, b| b.start_index.cmp(&a.start_index));
        for section in sections {
            let Some(items) = grouped.get(&section.marker) else {
                continue;
            };
            if items.is_empty() {
                continue;
            }
            let mut insert: Vec<String> = items
                .iter()
                .map(|task| render_todo_line(task, ""))
                .collect();
            insert.push(String::new());
            let at = section.end_index.min(todo_lines.len());
            todo_lines.splice(at..at, insert);
        }

        let commitments_after = parse_commitments_markdown(&commitment_lines.join("\n"), &now);
        let mut commitment_lines = commitments_after.lines.clone();
        let mut insert_index = commitments_after.active_insert_index;
        for task in &commitment_tasks {
            let mut block = render_commitment_block(task, None, false);
            block.push(String::new());
            let at = insert_index.min(commitment_lines.len());
            let inserted = block.len();
            commitment_lines.splice(at..at, block);
            insert_index = at + inserted;
        }

        self.files.write_text(
            &self.todo_path,
            &ensure_trailing_newline(&todo_lines, todo_content.ends_with('\n')),
        )?;
        self.files.write_text(
            &self.commitments_path,
            &ensure_trailing_newline(&commitment_lines, commitments_content.ends_with('\n')),
        )
    }

    fn build_task_from_payload(
        &self,
        payload: TaskPayload,
        default_assignee: Assignee,
        default_created_at: &str,
    ) -> Task {
        Task {
            id: payload.id.unwrap_or_else(|| self.id_gen.next_id()),
            title: payload
                .title
                .map(|title| title.trim().to_string())
                .filter(|title| !title.is_empty())
                .unwrap_or_else(|| crate::todo::UNTITLED.to_string()),
            description: payload.description.unwrap_or_default(),
            status: payload.status.unwrap_or(TaskStatus::Todo),
            priority: payload.priority.unwrap_or(Priority::Medium),
            assignee: payload.assignee.unwrap_or(default_assignee),
            source: payload.source.unwrap_or(TaskSource::Manual),
            due_date: normalize_date(payload.due_date.as_deref(), None),
            tags: payload.tags.unwrap_or_default(),
            created_at: normalize_date(payload.created_at.as_deref(), Some(default_created_at))
                .unwrap_or_else(|| default_created_at.to_string()),
        }
    }

    fn write_todo_task(&self, task: &Task, mode: WriteMode) -> Result<(), StoreError> {
        self.ensure_file(&self.todo_path, &todo_template(&date_token_now()))?;

        let (content, _) = self.read_file_safe(&self.todo_path)?;
        let had_trailing_newline = content.ends_with('\n');
        let parsed = parse_todo_markdown(&content, &iso_now());
        let mut lines = parsed.lines.clone();

        let existing = parsed
            .tasks
            .iter()
            .find(|entry| entry.task.id == task.id);

        if mode == WriteMode::Delete {
            let Some(entry) = existing else {
                return Ok(());
            };
            lines.remove(entry.line_index);
            return self.files.write_text(
                &self.todo_path,
                &ensure_trailing_newline(&lines, had_trailing_newline),
            );
        }

        let target = SectionMarker::from_priority(task.priority);
        let insert_index = parsed
            .sections
            .iter()
            .find(|section| section.marker == target)
            .map(|section| section.end_index)
            .unwrap_or(lines.len());
        let indent = existing.map(|entry| entry.indent.as_str()).unwrap_or("");
        let new_line = render_todo_line(task, indent);

        match existing {
            Some(entry) if mode == WriteMode::Update => {
                if entry.marker != target {
                    // Section change: remove, then reinsert at the target
                    // section's end, adjusted for the removal shift.
                    let removed_index = entry.line_index;
                    lines.remove(removed_index);
                    let adjusted = if removed_index < insert_index {
                        insert_index - 1
                    } else {
                        insert_index
                    };
                    lines.insert(adjusted.min(lines.len()), new_line);
                } else {
                    lines[entry.line_index] = new_line;
                }
            }
            _ => {
                lines.insert(insert_index.min(lines.len()), new_line);
            }
        }

        self.files.write_text(
            &self.todo_path,
            &ensure_trailing_newline(&lines, had_trailing_newline),
        )
    }

    fn write_commitment_task(
        &self,
        task: &Task,
        mode: WriteMode,
        preserve_status: bool,
    ) -> Result<(), StoreError> {
        self.ensure_file(&self.commitments_path, COMMITMENTS_TEMPLATE)?;

        let (content, _) = self.read_file_safe(&self.commitments_path)?;
        let had_trailing_newline = content.ends_with('\n');
        let parsed = parse_commitments_markdown(&content, &iso_now());
        let mut lines = parsed.lines.clone();

        let existing = parsed
            .tasks
            .iter()
            .find(|entry| entry.task.id == task.id);

        if mode == WriteMode::Delete {
            let Some(entry) = existing else {
                return Ok(());
            };
            lines.drain(entry.block_start..entry.block_end);
            return self.files.write_text(
                &self.commitments_path,
                &ensure_trailing_newline(&lines, had_trailing_newline),
            );
        }

        let block = render_commitment_block(task, existing, preserve_status);

        match existing {
            Some(entry) if mode == WriteMode::Update => {
                lines.splice(entry.block_start..entry.block_end, block);
            }
            _ => {
                let mut insert = block;
                insert.push(String::new());
                let at = parsed.active_insert_index.min(lines.len());
                lines.splice(at..at, insert);
            }
        }

        self.files.write_text(
            &self.commitments_path,
            &ensure_trailing_newline(&lines, had_trailing_newline),
        )
    }
}

/// Merge a partial update onto a base task.
///
/// Absence preserves: a missing due date keeps the existing one (an
/// unparseable one falls back to it too), and missing tags keep the
/// existing list. Neither field has an explicit-clear path; that asymmetry
/// with ordinary fields is part of the document contract.
pub fn apply_update(base: &Task, payload: &TaskPayload) -> Task {
    Task {
        id: base.id.clone(),
        title: payload.title.clone().unwrap_or_else(|| base.title.clone()),
        description: payload
            .description
            .clone()
            .unwrap_or_else(|| base.description.clone()),
        status: payload.status.unwrap_or(base.status),
        priority: payload.priority.unwrap_or(base.priority),
        assignee: payload.assignee.unwrap_or(base.assignee),
        source: payload.source.unwrap_or(base.source),
        due_date: normalize_date(
            payload
                .due_date
                .as_deref()
                .or(base.due_date.as_deref()),
            None,
        ),
        tags: payload.tags.clone().unwrap_or_else(|| base.tags.clone()),
        created_at: base.created_at.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::meta::IdGen;
    use std::sync::atomic::{AtomicU64, Ordering};
    use tempfile::TempDir;

    struct SeqIdGen {
        counter: AtomicU64,
    }

    impl SeqIdGen {
        fn new() -> Self {
            Self {
                counter: AtomicU64::new(1),
            }
        }
    }

    impl IdGen for SeqIdGen {
        fn next_id(&self) -> String {
            format!("fixed-{}", self.counter.fetch_add(1, Ordering::Relaxed))
        }
    }

    fn store(dir: &TempDir) -> TaskStore {
        TaskStore::open(dir.path()).with_id_gen(Box::new(SeqIdGen::new()))
    }

    fn payload(title: &str) -> TaskPayload {
        TaskPayload {
            title: Some(title.to_string()),
            ..TaskPayload::default()
        }
    }

    fn read(dir: &TempDir, name: &str) -> String {
        std::fs::read_to_string(dir.path().join(name)).unwrap()
    }

    #[test]
    fn test_create_seeds_template_and_inserts_into_section() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);

        let mut input = payload("Fix login bug");
        input.priority = Some(Priority::High);
        let task = store.create_task(input).unwrap();
        assert_eq!(task.id, "fixed-1");

        let content = read(&dir, TODO_FILE);
        assert!(content.contains("## 🔴 High Priority"));
        assert!(content.contains("- [ ] Fix login bug <!-- sb:task"));

        // The new line landed inside the high section, before the medium one.
        let line_pos = content.find("Fix login bug").unwrap();
        let medium_pos = content.find("## 🟡").unwrap();
        assert!(line_pos < medium_pos);
    }

    #[test]
    fn test_create_requires_title() {
        let dir = TempDir::new().unwrap();
        let err = store(&dir).create_task(TaskPayload::default()).unwrap_err();
        assert!(matches!(err, StoreError::MissingField("title")));
    }

    #[test]
    fn test_create_ai_task_goes_to_commitments() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);

        let mut input = payload("Deploy backend");
        input.assignee = Some(Assignee::Ai);
        store.create_task(input).unwrap();

        let content = read(&dir, COMMITMENTS_FILE);
        assert!(content.contains("### "));
        assert!(content.contains("Deploy backend <!-- sb:task"));
        assert!(content.contains("- **Status:** pending"));

        // Block sits inside Active Commitments, above Recently Completed.
        let block_pos = content.find("Deploy backend").unwrap();
        let completed_pos = content.find("## Recently Completed").unwrap();
        assert!(block_pos < completed_pos);

        // TODO.md was never touched.
        assert!(!dir.path().join(TODO_FILE).exists());
    }

    #[test]
    fn test_list_tasks_merges_both_documents() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);

        store.create_task(payload("User task")).unwrap();
        let mut ai = payload("Ai task");
        ai.assignee = Some(Assignee::Ai);
        store.create_task(ai).unwrap();

        let list = store.list_tasks().unwrap();
        assert_eq!(list.tasks.len(), 2);
        let titles: Vec<&str> = list.tasks.iter().map(|t| t.title.as_str()).collect();
        assert!(titles.contains(&"User task"));
        assert!(titles.contains(&"Ai task"));
        assert!(list.revision.contains('-'));
    }

    #[test]
    fn test_list_round_trips_created_task() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);

        let mut input = payload("Tagged task");
        input.priority = Some(Priority::Low);
        input.due_date = Some("2026-03-15".to_string());
        input.tags = Some(vec!["dev".to_string(), "infra".to_string()]);
        let created = store.create_task(input).unwrap();

        let list = store.list_tasks().unwrap();
        let found = list.tasks.iter().find(|t| t.id == created.id).unwrap();
        assert_eq!(found.title, created.title);
        assert_eq!(found.priority, Priority::Low);
        assert_eq!(found.due_date.as_deref(), Some("2026-03-15T00:00:00.000Z"));
        assert_eq!(found.tags, created.tags);
        assert_eq!(found.created_at, created.created_at);
    }

    #[test]
    fn test_identifier_stable_across_reparses() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        // A hand-written line without metadata gets a derived id that must
        // not change between parses of the unchanged file.
        std::fs::write(
            dir.path().join(TODO_FILE),
            "## 🔴 High Priority\n- [ ] Handwritten task\n",
        )
        .unwrap();

        let first = store.list_tasks().unwrap();
        let second = store.list_tasks().unwrap();
        assert!(first.tasks[0].id.starts_with("sb-"));
        assert_eq!(first.tasks[0].id, second.tasks[0].id);
    }

    #[test]
    fn test_update_in_place_preserves_other_lines() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        store.create_task(payload("Task one")).unwrap();
        store.create_task(payload("Task two")).unwrap();

        let before = read(&dir, TODO_FILE);
        let id = store.list_tasks().unwrap().tasks[0].id.clone();

        let mut update = TaskPayload::default();
        update.id = Some(id);
        update.status = Some(TaskStatus::Done);
        store.update_task(update).unwrap();

        let after = read(&dir, TODO_FILE);
        assert!(after.contains("- [x] Task one"));
        assert!(after.contains("- [ ] Task two"));
        // Only the edited line differs.
        let changed: Vec<(&str, &str)> = before
            .lines()
            .zip(after.lines())
            .filter(|(a, b)| a != b)
            .collect();
        assert_eq!(changed.len(), 1);
        assert_eq!(before.lines().count(), after.lines().count());
    }

    #[test]
    fn test_update_priority_moves_between_sections() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);

        let mut input = payload("Escalate me");
        input.priority = Some(Priority::Low);
        let task = store.create_task(input).unwrap();

        let mut update = TaskPayload::default();
        update.id = Some(task.id);
        update.priority = Some(Priority::High);
        store.update_task(update).unwrap();

        let content = read(&dir, TODO_FILE);
        let line_pos = content.find("Escalate me").unwrap();
        let medium_pos = content.find("## 🟡").unwrap();
        assert!(line_pos < medium_pos, "line should now sit in the high section");
        assert_eq!(content.matches("Escalate me").count(), 1);
    }

    #[test]
    fn test_update_assignee_change_switches_documents() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);

        let task = store.create_task(payload("Hand off to ai")).unwrap();
        assert!(read(&dir, TODO_FILE).contains("Hand off to ai"));

        let mut update = TaskPayload::default();
        update.id = Some(task.id.clone());
        update.assignee = Some(Assignee::Ai);
        store.update_task(update).unwrap();

        assert!(!read(&dir, TODO_FILE).contains("Hand off to ai"));
        let commitments = read(&dir, COMMITMENTS_FILE);
        assert!(commitments.contains("Hand off to ai"));
        assert!(commitments.contains(&format!("\"id\":\"{}\"", task.id)));
    }

    #[test]
    fn test_update_unknown_id_is_not_found() {
        let dir = TempDir::new().unwrap();
        let mut update = TaskPayload::default();
        update.id = Some("nope".to_string());
        update.title = Some("x".to_string());
        let err = store(&dir).update_task(update).unwrap_err();
        assert!(matches!(err, StoreError::TaskNotFound(_)));
    }

    #[test]
    fn test_update_without_status_keeps_blocked_label() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        std::fs::write(
            dir.path().join(COMMITMENTS_FILE),
            "## Active Commitments\n\n<!-- Add new commitments below this line -->\n\n\
             ### 2026-02-18 10:30 Stuck task <!-- sb:task {\"id\":\"c-9\",\"createdAt\":\"2026-02-18T00:00:00.000Z\"} -->\n\
             - **Status:** blocked\n",
        )
        .unwrap();

        let mut update = TaskPayload::default();
        update.id = Some("c-9".to_string());
        update.description = Some("new notes".to_string());
        store.update_task(update).unwrap();

        let content = read(&dir, COMMITMENTS_FILE);
        assert!(content.contains("- **Status:** blocked"));
        assert!(content.contains("- **Notes:** new notes"));

        // An explicit status update back to todo renders pending instead.
        let mut update = TaskPayload::default();
        update.id = Some("c-9".to_string());
        update.status = Some(TaskStatus::Todo);
        store.update_task(update).unwrap();
        let content = read(&dir, COMMITMENTS_FILE);
        assert!(content.contains("- **Status:** pending"));
        assert!(!content.contains("blocked"));
    }

    #[test]
    fn test_delete_task_removes_only_its_lines() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        let keep = store.create_task(payload("Keep me")).unwrap();
        let drop = store.create_task(payload("Drop me")).unwrap();

        store.delete_task(&drop.id).unwrap();
        let content = read(&dir, TODO_FILE);
        assert!(content.contains("Keep me"));
        assert!(!content.contains("Drop me"));

        let list = store.list_tasks().unwrap();
        assert_eq!(list.tasks.len(), 1);
        assert_eq!(list.tasks[0].id, keep.id);
    }

    #[test]
    fn test_delete_unknown_id_is_not_found() {
        let dir = TempDir::new().unwrap();
        let err = store(&dir).delete_task("missing-id").unwrap_err();
        assert!(matches!(err, StoreError::TaskNotFound(_)));
    }

    #[test]
    fn test_delete_commitment_removes_whole_block() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        let mut input = payload("Block to remove");
        input.assignee = Some(Assignee::Ai);
        input.description = Some("with notes".to_string());
        let task = store.create_task(input).unwrap();

        store.delete_task(&task.id).unwrap();
        let content = read(&dir, COMMITMENTS_FILE);
        assert!(!content.contains("Block to remove"));
        assert!(!content.contains("with notes"));
        assert!(content.contains("## Active Commitments"));
    }

    #[test]
    fn test_trailing_newline_convention_preserved() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        // File without a trailing newline keeps that property across edits.
        std::fs::write(
            dir.path().join(TODO_FILE),
            "## 🔴 High Priority\n- [ ] Existing <!-- sb:task {\"id\":\"t-1\",\"createdAt\":\"2026-02-18T00:00:00.000Z\"} -->",
        )
        .unwrap();

        let mut update = TaskPayload::default();
        update.id = Some("t-1".to_string());
        update.status = Some(TaskStatus::Done);
        store.update_task(update).unwrap();
        assert!(!read(&dir, TODO_FILE).ends_with('\n'));

        // And a file with one keeps it too.
        let mut input = payload("Fresh");
        store.create_task(input.clone()).unwrap();
        let seeded = read(&dir, TODO_FILE);
        std::fs::write(dir.path().join(TODO_FILE), format!("{}\n", seeded.trim_end())).unwrap();
        input.title = Some("Another".to_string());
        store.create_task(input).unwrap();
        assert!(read(&dir, TODO_FILE).ends_with('\n'));
    }

    #[test]
    fn test_replace_all_keeps_unmanaged_content() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        store.create_task(payload("Old task")).unwrap();

        // Hand-written note outside any checklist survives replacement.
        let content = read(&dir, TODO_FILE);
        std::fs::write(
            dir.path().join(TODO_FILE),
            content.replace("---", "---\n\nSome freeform note"),
        )
        .unwrap();

        let mut fresh = payload("New task");
        fresh.priority = Some(Priority::Medium);
        let mut ai = payload("New commitment");
        ai.assignee = Some(Assignee::Ai);
        store.replace_all(vec![fresh, ai]).unwrap();

        let todo = read(&dir, TODO_FILE);
        assert!(!todo.contains("Old task"));
        assert!(todo.contains("New task"));
        assert!(todo.contains("Some freeform note"));

        let commitments = read(&dir, COMMITMENTS_FILE);
        assert!(commitments.contains("New commitment"));
    }

    #[test]
    fn test_replace_all_orders_multiple_commitments() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        // Seed commitments so the insert marker exists.
        store.list_tasks().unwrap();

        let mut first = payload("First commitment");
        first.assignee = Some(Assignee::Ai);
        let mut second = payload("Second commitment");
        second.assignee = Some(Assignee::Ai);
        store.replace_all(vec![first, second]).unwrap();

        let content = read(&dir, COMMITMENTS_FILE);
        let first_pos = content.find("First commitment").unwrap();
        let second_pos = content.find("Second commitment").unwrap();
        assert!(first_pos < second_pos);
    }

    #[test]
    fn test_document_content_surfaces_not_found() {
        let dir = TempDir::new().unwrap();
        let err = store(&dir)
            .document_content(TaskDocument::Todo)
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_overviews_recover_missing_files_as_empty() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        assert!(store.todo_overview().unwrap().is_empty());
        let overview = store.commitments_overview().unwrap();
        assert!(overview.active.is_empty());
        assert!(overview.recently_completed.is_empty());
    }

    #[test]
    fn test_apply_update_absence_preserves() {
        let base = Task {
            id: "b-1".into(),
            title: "Base".into(),
            description: "desc".into(),
            status: TaskStatus::Todo,
            priority: Priority::Medium,
            assignee: Assignee::User,
            source: TaskSource::Manual,
            due_date: Some("2026-01-01T00:00:00.000Z".into()),
            tags: vec!["keep".into()],
            created_at: "2026-01-01T00:00:00.000Z".into(),
        };

        // Absent due date and tags keep the existing values.
        let updated = apply_update(&base, &TaskPayload::default());
        assert_eq!(updated.due_date, base.due_date);
        assert_eq!(updated.tags, base.tags);

        // A provided tags array replaces, and a provided date renormalizes.
        let mut payload = TaskPayload::default();
        payload.tags = Some(vec!["new".into()]);
        payload.due_date = Some("2026-03-15".into());
        let updated = apply_update(&base, &payload);
        assert_eq!(updated.tags, vec!["new".to_string()]);
        assert_eq!(updated.due_date.as_deref(), Some("2026-03-15T00:00:00.000Z"));
        assert_eq!(updated.created_at, base.created_at);
    }
}
