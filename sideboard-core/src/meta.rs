/// Embedded task metadata and identifier derivation.
///
/// Both documents carry a per-task JSON payload inside an HTML-comment
/// marker appended to one line of text:
///
///   - [ ] Fix login bug <!-- sb:task {"id":"...","createdAt":"..."} -->
///
/// The marker is a de-facto on-disk micro-format: external tools may strip
/// it freely, in which case the task simply gets a freshly derived
/// identifier on the next parse.
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::types::{Priority, Task};

static META_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<!--\s*sb:task\s*(\{.*?\})\s*-->").unwrap());

/// Metadata fields recovered from a marker. Every field is optional because
/// decoding is tolerant: a field with the wrong JSON type is dropped alone
/// instead of discarding the whole payload.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedMeta {
    pub id: Option<String>,
    pub created_at: Option<String>,
    pub due_date: Option<String>,
    pub tags: Option<Vec<String>>,
    pub priority: Option<Priority>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct MetaPayload<'a> {
    id: &'a str,
    created_at: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    due_date: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tags: Option<&'a [String]>,
    priority: Priority,
}

/// Render the metadata marker for a task. `dueDate` and `tags` are omitted
/// (not null) when absent or empty.
pub fn build_task_meta(task: &Task) -> String {
    let payload = MetaPayload {
        id: &task.id,
        created_at: &task.created_at,
        due_date: task.due_date.as_deref(),
        tags: (!task.tags.is_empty()).then_some(task.tags.as_slice()),
        priority: task.priority,
    };
    let json = serde_json::to_string(&payload).unwrap_or_else(|_| String::from("{}"));
    format!("<!-- sb:task {} -->", json)
}

/// Locate and parse the metadata marker in a line of text.
/// Returns the text with the marker removed (trimmed) and the parsed
/// metadata; malformed JSON yields `None` metadata without erroring.
pub fn extract_task_meta(text: &str) -> (String, Option<ParsedMeta>) {
    let Some(captures) = META_RE.captures(text) else {
        return (text.trim().to_string(), None);
    };

    let full = captures.get(0).map(|m| m.as_str()).unwrap_or_default();
    let raw = captures.get(1).map(|m| m.as_str()).unwrap_or_default();
    let cleaned = text.replacen(full, "", 1).trim().to_string();

    (cleaned, parse_meta_json(raw))
}

/// Remove the metadata marker from a line, returning the trimmed remainder.
pub fn strip_task_meta(text: &str) -> String {
    META_RE.replace(text, "").trim().to_string()
}

fn parse_meta_json(raw: &str) -> Option<ParsedMeta> {
    let value: Value = serde_json::from_str(raw).ok()?;
    let object = value.as_object()?;

    let string_field = |key: &str| {
        object
            .get(key)
            .and_then(Value::as_str)
            .map(str::to_string)
    };

    Some(ParsedMeta {
        id: string_field("id"),
        created_at: string_field("createdAt"),
        due_date: string_field("dueDate"),
        tags: object.get("tags").and_then(Value::as_array).map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        }),
        priority: object
            .get("priority")
            .and_then(|v| serde_json::from_value(v.clone()).ok()),
    })
}

/// Derive a stable identifier for a task that carries no embedded metadata.
/// Pure function of its inputs, so repeated parses of unchanged text yield
/// the same identifier. The `sb-` prefix marks derived identifiers.
pub fn stable_task_id(namespace: &str, section: &str, title: &str, line_index: usize) -> String {
    let mut hasher = Sha256::new();
    hasher.update(format!("{}|{}|{}|{}", namespace, section, title, line_index).as_bytes());
    let digest = hasher.finalize();
    format!("sb-{}", &hex::encode(digest)[..12])
}

/// Identifier source for brand-new tasks, injected into the store so tests
/// can pin ids.
pub trait IdGen: Send + Sync {
    fn next_id(&self) -> String;
}

/// Default id source: process counter plus a nanosecond timestamp, hashed
/// for uniform distribution.
pub struct SystemIdGen {
    counter: AtomicU64,
}

impl SystemIdGen {
    pub fn new() -> Self {
        Self {
            counter: AtomicU64::new(0),
        }
    }
}

impl Default for SystemIdGen {
    fn default() -> Self {
        Self::new()
    }
}

impl IdGen for SystemIdGen {
    fn next_id(&self) -> String {
        let seq = self.counter.fetch_add(1, Ordering::Relaxed);
        let now = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default();

        let mut hasher = Sha256::new();
        hasher.update(seq.to_le_bytes());
        hasher.update(now.as_nanos().to_le_bytes());
        let digest = hasher.finalize();
        let suffix =
            u32::from(digest[0]) << 16 | u32::from(digest[1]) << 8 | u32::from(digest[2]);

        format!("task-{:x}-{:06x}", now.as_millis(), suffix)
    }
}
