//! Diff engine for docvc.
//!
//! Computes structured change sets between two document values, replays
//! them, and detects conflicting edits between two descendants of a common
//! ancestor.
//!
//! # Key Types
//!
//! - [`diff`] / [`apply_changes`] -- Structural change sets and their replay
//! - [`ChangeStats`] -- Per-kind counts over a change set
//! - [`conflicting_paths`] / [`three_way_merge`] -- Leaf-level conflict detection and overlay
//! - [`TextDiff`] / [`DiffHunk`] / [`DiffLine`] -- Line-level diff of string values

pub mod apply;
pub mod conflict;
pub mod differ;
pub mod error;
pub mod leaves;
pub mod text_diff;

pub use apply::apply_changes;
pub use conflict::{conflicting_paths, three_way_merge};
pub use differ::{diff, initial_changes, ChangeStats};
pub use error::{DiffError, DiffResult};
pub use leaves::{changed_leaves, flatten, unflatten};
pub use text_diff::{diff_text, DiffHunk, DiffLine, TextDiff};
