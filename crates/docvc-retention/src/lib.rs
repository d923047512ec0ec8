//! Retention cleanup for docvc.
//!
//! Deletes versions older than a keep window while preserving the most
//! recent of them, versions carrying a protected tag, and versions still
//! referenced by a branch or a restore point.

pub mod cleaner;
pub mod policy;

pub use cleaner::{RetentionCleaner, RetentionReport};
pub use policy::RetentionPolicy;
