//! # Formats Module
//!
//! On-disk format of the `file` backend.
//!
//! This module contains:
//! - Binary snapshot format (postcard + header)
//!
//! Note: file I/O lives in `storage::FileStore`.
//! This module only handles format conversion (pure transformations).

mod snapshot;

pub use snapshot::*;
