//! Merge engine for docvc.
//!
//! Merges the head of one branch into another. Conflicts are detected
//! leaf by leaf relative to the lowest common ancestor of the two heads.
//! A conflicting merge is a normal outcome, not an error: nothing is
//! written, and the caller resubmits with the `manual` strategy and a
//! decision for each conflicting path.

pub mod engine;
pub mod resolve;

pub use engine::{MergeEngine, MergeOutcome, MergeRequest};
pub use resolve::combine_both;
