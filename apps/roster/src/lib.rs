//! # Roster Library
//!
//! This library exposes the Roster modules for testing and integration.
//!
//! The main binary uses these modules through the `main.rs` entry point.

pub mod api;
pub mod cli;

// Re-export roster_core for convenience
pub use roster_core;
