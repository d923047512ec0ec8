//! Version storage for docvc.
//!
//! The engine never talks to a database directly. Everything it persists
//! goes through the [`VersionStore`] trait: versions (append-only),
//! branches (mutable head pointer, status, protection, merge log), and
//! restore points (append-only).
//!
//! # Backends
//!
//! - [`InMemoryVersionStore`] -- `RwLock`-guarded maps for tests, embedding,
//!   and the CLI (which persists it as a JSON [`StoreSnapshot`])
//!
//! # Design Rules
//!
//! 1. Versions and restore points are immutable once inserted.
//! 2. A branch head only moves through [`VersionStore::compare_and_swap_head`].
//! 3. Every write is announced to subscribers of the affected document.
//! 4. Backend failures are propagated, never silently ignored.

pub mod error;
pub mod event;
pub mod memory;
pub mod query;
pub mod snapshot;
pub mod traits;

pub use error::{StoreError, StoreResult};
pub use event::{StoreEvent, StoreEventStream};
pub use memory::InMemoryVersionStore;
pub use query::{QueryOrder, VersionQuery};
pub use snapshot::StoreSnapshot;
pub use traits::{BranchUpdate, VersionStore};
