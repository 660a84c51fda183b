/// TODO.md parser and serializer.
///
/// The document is a constrained authoring convention, not general
/// markdown: three priority sections keyed by fixed marker glyphs, each
/// holding checklist lines. Parsing is deliberately line-oriented pattern
/// matching so that untouched lines round-trip byte for byte.
///
///   ## 🔴 High Priority
///   - [ ] Fix login bug <!-- sb:task {...} -->
///   - [x] Deploy to prod
use std::sync::LazyLock;

use regex::Regex;

use crate::dates::normalize_date;
use crate::meta::{build_task_meta, extract_task_meta, stable_task_id, strip_task_meta};
use crate::types::{
    Assignee, ParsedTodoTask, SectionMarker, Task, TaskSource, TaskStatus, TodoDocument,
    TodoItemView, TodoSection, TodoSectionView,
};

static SECTION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^##\s*(🔴|🟡|🟢)\s*(.+)").unwrap());

static ITEM_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\s*)-\s*\[([ xX])\]\s*(.+)$").unwrap());

pub(crate) const UNTITLED: &str = "Untitled Task";

/// Parse TODO.md content into sections and positioned task entries.
///
/// Lines matching neither the section nor the checklist pattern are ignored
/// (kept in `lines`, never an error). Checklist lines outside any section
/// are ignored too. Section and task order matches file order.
pub fn parse_todo_markdown(content: &str, fallback_created_at: &str) -> TodoDocument {
    let lines: Vec<String> = content.split('\n').map(str::to_string).collect();
    let mut sections: Vec<TodoSection> = Vec::new();
    let mut tasks: Vec<ParsedTodoTask> = Vec::new();
    let mut current: Option<TodoSection> = None;

    for (index, line) in lines.iter().enumerate() {
        if let Some(captures) = SECTION_RE.captures(line) {
            if let Some(mut section) = current.take() {
                section.end_index = index;
                sections.push(section);
            }
            let marker = SectionMarker::from_glyph(&captures[1]);
            // The regex alternation guarantees a known glyph.
            let Some(marker) = marker else { continue };
            current = Some(TodoSection {
                marker,
                title: captures[2].trim().to_string(),
                start_index: index,
                end_index: lines.len(),
            });
            continue;
        }

        let (Some(captures), Some(section)) = (ITEM_RE.captures(line), current.as_ref()) else {
            continue;
        };

        let (text, meta) = extract_task_meta(&captures[3]);
        let meta = meta.unwrap_or_default();
        let title = if text.is_empty() { UNTITLED.to_string() } else { text };
        let id = meta
            .id
            .unwrap_or_else(|| stable_task_id("todo", section.marker.glyph(), &title, index));
        let status = if captures[2].eq_ignore_ascii_case("x") {
            TaskStatus::Done
        } else {
            TaskStatus::Todo
        };

        tasks.push(ParsedTodoTask {
            task: Task {
                id,
                title,
                description: String::new(),
                status,
                priority: meta.priority.unwrap_or(section.marker.priority()),
                assignee: Assignee::User,
                source: TaskSource::Manual,
                due_date: normalize_date(meta.due_date.as_deref(), None),
                tags: meta.tags.unwrap_or_default(),
                created_at: normalize_date(meta.created_at.as_deref(), Some(fallback_created_at))
                    .unwrap_or_else(|| fallback_created_at.to_string()),
            },
            line_index: index,
            indent: captures[1].to_string(),
            marker: section.marker,
        });
    }

    if let Some(mut section) = current.take() {
        section.end_index = lines.len();
        sections.push(section);
    }

    TodoDocument {
        lines,
        sections,
        tasks,
    }
}

/// Render a task as a single checklist line, metadata marker included.
pub fn render_todo_line(task: &Task, indent: &str) -> String {
    let checkbox = if task.status == TaskStatus::Done {
        "[x]"
    } else {
        "[ ]"
    };
    let title = task.title.trim();
    let title = if title.is_empty() { UNTITLED } else { title };
    format!("{}- {} {} {}", indent, checkbox, title, build_task_meta(task))
        .trim_end()
        .to_string()
}

/// Display view of the document: sections with metadata-stripped item text.
pub fn todo_overview(content: &str) -> Vec<TodoSectionView> {
    let mut sections: Vec<TodoSectionView> = Vec::new();
    let mut current: Option<TodoSectionView> = None;

    for line in content.split('\n') {
        if let Some(captures) = SECTION_RE.captures(line) {
            if let Some(section) = current.take() {
                sections.push(section);
            }
            let Some(emoji) = SectionMarker::from_glyph(&captures[1]) else {
                continue;
            };
            current = Some(TodoSectionView {
                emoji,
                title: captures[2].trim().to_string(),
                items: Vec::new(),
            });
            continue;
        }

        if let (Some(captures), Some(section)) = (ITEM_RE.captures(line), current.as_mut()) {
            section.items.push(TodoItemView {
                text: strip_task_meta(&captures[3]),
                completed: captures[2].eq_ignore_ascii_case("x"),
            });
        }
    }

    if let Some(section) = current.take() {
        sections.push(section);
    }

    sections
}
