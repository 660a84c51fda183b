//! Core task model for a markdown-backed personal task board.
//!
//! Two human-editable documents are the source of truth: TODO.md holds
//! checklist lines under three priority sections, COMMITMENTS.md holds
//! heading-delimited blocks for tasks the assistant owns. This crate maps
//! both onto one common `Task` entity and back, preserving hand-written
//! content outside the managed lines.

pub mod commitments;
pub mod dates;
pub mod meta;
pub mod store;
pub mod tasks;
pub mod todo;
pub mod types;

pub use store::{FileAccess, FileStat, LocalFiles, StoreError};
pub use tasks::{TaskDocument, TaskStore};
pub use types::{
    Assignee, CommitmentView, CommitmentsOverview, Priority, Task, TaskList, TaskPayload,
    TaskSource, TaskStatus, TodoItemView, TodoSectionView,
};
