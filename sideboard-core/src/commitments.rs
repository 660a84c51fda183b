/// COMMITMENTS.md parser and serializer.
///
/// The document is a sequence of heading-delimited blocks, one per task:
///
///   ### 2026-02-18 10:30 Deploy backend <!-- sb:task {...} -->
///   - **Status:** in-progress
///   - **ETA:** 2026-02-20
///   - **Last update:** 2026-02-18 09:00
///   - **Notes:** Running migration first
///
/// Reserved section headings ("Active Commitments", "Recently Completed",
/// "Shipped Features Archive", "Format") delimit blocks but never become
/// tasks themselves. Content inside fenced code blocks is never interpreted
/// as structure.
use std::sync::LazyLock;

use chrono::{Duration, Utc};
use regex::Regex;

use crate::dates::{
    format_header_timestamp, header_timestamp_to_iso, minute_stamp_now, normalize_date,
    parse_datetime,
};
use crate::meta::{build_task_meta, extract_task_meta, stable_task_id};
use crate::types::{
    Assignee, CommitmentView, CommitmentsDocument, CommitmentsOverview, ParsedCommitmentTask,
    Priority, Task, TaskSource, TaskStatus,
};

/// Headings that structure the document rather than describing a task.
/// Matched as case-sensitive substrings of the heading text.
const RESERVED_SECTION_TITLES: &[&str] = &[
    "Active Commitments",
    "Recently Completed",
    "Shipped Features Archive",
    "Format",
];

/// Marker comment after which new blocks are inserted.
const INSERT_MARKER: &str = "Add new commitments";

static HEADING_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^#{2,3}\s+(.+)").unwrap());

static ACTIVE_HEADER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^##\s+Active Commitments").unwrap());

static HEADER_TIMESTAMP_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{4}-\d{2}-\d{2})(?:\s+(\d{2}:\d{2}))?\s+(.+)$").unwrap()
});

// Field labels accept optional bold markers, with the colon either before
// the closing ** ("**Status:** x") or after it ("**Status**: x").
static STATUS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\*{0,2}Status(?::\*{0,2}|\*{0,2}:)\s*(pending|in-progress|blocked|done)")
        .unwrap()
});

static ETA_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\*{0,2}ETA(?::\*{0,2}|\*{0,2}:)\s*(.+)").unwrap());

static LAST_UPDATE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\*{0,2}Last Update(?::\*{0,2}|\*{0,2}:)\s*(.+)").unwrap());

static SUB_AGENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\*{0,2}Sub-agent(?::\*{0,2}|\*{0,2}:)\s*(.+)").unwrap());

static NOTES_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\*{0,2}Notes(?::\*{0,2}|\*{0,2}:)\s*(.+)").unwrap());

static ANY_FIELD_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\*{0,2}(?:Status|ETA|Last Update|Sub-agent|Notes)(?::\*{0,2}|\*{0,2}:)")
        .unwrap()
});

/// Map a commitment status word onto the three-state common status.
/// `pending` and `blocked` both collapse to todo.
pub fn map_commitment_status(raw: &str) -> TaskStatus {
    match raw.to_lowercase().as_str() {
        "in-progress" => TaskStatus::InProgress,
        "done" => TaskStatus::Done,
        _ => TaskStatus::Todo,
    }
}

/// Canonical commitment status word for a common status. Todo always
/// renders as `pending`; a prior `blocked` label is only kept through the
/// existing-block context, never resurrected here.
pub fn commitment_status_label(status: TaskStatus) -> &'static str {
    match status {
        TaskStatus::Todo => "pending",
        TaskStatus::InProgress => "in-progress",
        TaskStatus::Done => "done",
    }
}

fn split_header_timestamp(text: &str) -> (Option<String>, String) {
    match HEADER_TIMESTAMP_RE.captures(text) {
        Some(captures) => {
            let date = &captures[1];
            let time = captures.get(2).map_or("00:00", |m| m.as_str());
            (
                Some(format!("{} {}", date, time)),
                captures[3].trim().to_string(),
            )
        }
        None => (None, text.trim().to_string()),
    }
}

/// Parse COMMITMENTS.md content into positioned commitment blocks.
pub fn parse_commitments_markdown(content: &str, fallback_created_at: &str) -> CommitmentsDocument {
    let lines: Vec<String> = content.split('\n').map(str::to_string).collect();
    let mut tasks: Vec<ParsedCommitmentTask> = Vec::new();

    let active_header_index = lines
        .iter()
        .position(|line| ACTIVE_HEADER_RE.is_match(line))
        .unwrap_or(lines.len());
    let mut active_insert_index = active_header_index + 1;
    if let Some(marker_index) = lines
        .iter()
        .enumerate()
        .position(|(index, line)| index > active_header_index && line.contains(INSERT_MARKER))
    {
        active_insert_index = marker_index + 1;
    }
    let active_insert_index = active_insert_index.min(lines.len());

    let mut in_code_block = false;
    let mut current: Option<ParsedCommitmentTask> = None;

    for (index, line) in lines.iter().enumerate() {
        if line.trim_start().starts_with("```") {
            in_code_block = !in_code_block;
            continue;
        }
        if in_code_block {
            continue;
        }

        if let Some(captures) = HEADING_RE.captures(line) {
            if let Some(mut entry) = current.take() {
                entry.block_end = index;
                tasks.push(entry);
            }

            let heading_text = &captures[1];
            if RESERVED_SECTION_TITLES
                .iter()
                .any(|title| heading_text.contains(title))
            {
                continue;
            }

            let (text, meta) = extract_task_meta(heading_text);
            let meta = meta.unwrap_or_default();
            let (timestamp, title) = split_header_timestamp(&text);
            let title = if title.is_empty() {
                crate::todo::UNTITLED.to_string()
            } else {
                title
            };

            let id = meta
                .id
                .unwrap_or_else(|| stable_task_id("commitments", "header", &title, index));
            let created_default =
                header_timestamp_to_iso(timestamp.as_deref(), fallback_created_at);
            let created_at = normalize_date(meta.created_at.as_deref(), Some(&created_default))
                .unwrap_or_else(|| fallback_created_at.to_string());

            current = Some(ParsedCommitmentTask {
                task: Task {
                    id,
                    title,
                    description: String::new(),
                    status: TaskStatus::Todo,
                    priority: meta.priority.unwrap_or(Priority::Medium),
                    assignee: Assignee::Ai,
                    source: TaskSource::Manual,
                    due_date: normalize_date(meta.due_date.as_deref(), None),
                    tags: meta.tags.unwrap_or_default(),
                    created_at,
                },
                block_start: index,
                block_end: lines.len(),
                header_timestamp: timestamp,
                raw_status: None,
                sub_agent: None,
                eta: None,
                last_update: None,
                notes: None,
            });
            continue;
        }

        let Some(entry) = current.as_mut() else {
            continue;
        };

        if let Some(captures) = STATUS_RE.captures(line) {
            let raw = captures[1].to_lowercase();
            entry.task.status = map_commitment_status(&raw);
            entry.raw_status = Some(raw);
            continue;
        }
        if let Some(captures) = ETA_RE.captures(line) {
            let eta = captures[1].trim().to_string();
            if let Some(due) = normalize_date(Some(&eta), None) {
                entry.task.due_date = Some(due);
            }
            entry.eta = Some(eta);
            continue;
        }
        if let Some(captures) = LAST_UPDATE_RE.captures(line) {
            entry.last_update = Some(captures[1].trim().to_string());
            continue;
        }
        if let Some(captures) = SUB_AGENT_RE.captures(line) {
            entry.sub_agent = Some(captures[1].trim().to_string());
            continue;
        }
        if let Some(captures) = NOTES_RE.captures(line) {
            let notes = captures[1].trim().to_string();
            entry.task.description = notes.clone();
            entry.notes = Some(notes);
            continue;
        }

        // First free-text line becomes the description when Notes is absent.
        if !line.trim().is_empty()
            && !line.starts_with('#')
            && !ANY_FIELD_RE.is_match(line)
            && entry.task.description.is_empty()
        {
            entry.task.description = line.trim().to_string();
        }
    }

    if let Some(mut entry) = current.take() {
        entry.block_end = lines.len();
        tasks.push(entry);
    }

    CommitmentsDocument {
        lines,
        tasks,
        active_insert_index,
    }
}

/// Render a task as a commitment block.
///
/// `existing` carries block-level context being preserved across an update
/// (header timestamp, Sub-agent, free-text ETA, Notes). When
/// `preserve_status` is set and the existing block has a raw status word,
/// that word is re-rendered verbatim; callers set it for writes whose
/// update did not explicitly touch `status`. The Last-update line is always
/// refreshed to the current time.
pub fn render_commitment_block(
    task: &Task,
    existing: Option<&ParsedCommitmentTask>,
    preserve_status: bool,
) -> Vec<String> {
    let timestamp = existing
        .and_then(|entry| entry.header_timestamp.clone())
        .unwrap_or_else(|| format_header_timestamp(&task.created_at));
    let title = task.title.trim();
    let title = if title.is_empty() {
        crate::todo::UNTITLED
    } else {
        title
    };

    let status_label = existing
        .filter(|_| preserve_status)
        .and_then(|entry| entry.raw_status.as_deref())
        .unwrap_or_else(|| commitment_status_label(task.status));
    let eta = task
        .due_date
        .clone()
        .or_else(|| existing.and_then(|entry| entry.eta.clone()));
    let sub_agent = existing.and_then(|entry| entry.sub_agent.clone());
    let notes = if task.description.is_empty() {
        existing.and_then(|entry| entry.notes.clone())
    } else {
        Some(task.description.clone())
    };

    let mut lines = vec![format!(
        "### {} {} {}",
        timestamp,
        title,
        build_task_meta(task)
    )
    .trim_end()
    .to_string()];
    lines.push(format!("- **Status:** {}", status_label));
    if let Some(sub_agent) = sub_agent {
        lines.push(format!("- **Sub-agent:** {}", sub_agent));
    }
    if let Some(eta) = eta {
        lines.push(format!("- **ETA:** {}", eta));
    }
    lines.push(format!("- **Last update:** {}", minute_stamp_now()));
    if let Some(notes) = notes {
        lines.push(format!("- **Notes:** {}", notes));
    }

    lines
}

/// Display view: active blocks and those completed within the last 7 days
/// (by their Last-update stamp), keeping the raw status vocabulary.
pub fn commitments_overview(content: &str, fallback_created_at: &str) -> CommitmentsOverview {
    let parsed = parse_commitments_markdown(content, fallback_created_at);
    let seven_days_ago = Utc::now() - Duration::days(7);

    let views: Vec<CommitmentView> = parsed
        .tasks
        .iter()
        .map(|entry| CommitmentView {
            title: entry.task.title.clone(),
            status: entry
                .raw_status
                .clone()
                .unwrap_or_else(|| "pending".to_string()),
            eta: entry.eta.clone(),
            last_update: entry.last_update.clone(),
            description: (!entry.task.description.is_empty())
                .then(|| entry.task.description.clone()),
        })
        .collect();

    let (done, active): (Vec<CommitmentView>, Vec<CommitmentView>) =
        views.into_iter().partition(|view| view.status == "done");

    let recently_completed = done
        .into_iter()
        .filter(|view| {
            view.last_update
                .as_deref()
                .and_then(parse_datetime)
                .is_some_and(|updated| updated >= seven_days_ago)
        })
        .collect();

    CommitmentsOverview {
        active,
        recently_completed,
    }
}
