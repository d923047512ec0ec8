//! Restore points and rollback for docvc.
//!
//! A restore point is a named bookmark to a version, independent of the
//! branch graph. Rollback never rewrites history: it writes a new version
//! whose content is the target's, on the target's branch.

pub mod manager;

pub use manager::{NewRestorePoint, RestorePointManager, ROLLBACK_TAG};
