//! Content hashing for docvc.
//!
//! Provides a canonical, key-order-independent byte encoding of document
//! values and domain-separated BLAKE3 hashing over it.
//!
//! All crypto operations wrap established libraries; there is no custom cryptography.

pub mod canonical;
pub mod hasher;

pub use canonical::canonical_bytes;
pub use hasher::ContentHasher;
