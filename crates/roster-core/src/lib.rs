//! # Roster Core
//!
//! The record engine behind Roster: one entity (a registered person), the
//! rules that turn raw input into that entity, and the read-only views built
//! on top of the stored set.
//!
//! ## Layout
//!
//! - [`person`]: the `Person` record, `Sex` and `NationalId`
//! - [`validate`]: input normalization (`PersonForm` → `NewPerson`)
//! - [`derive`]: pure derivation rules (age, brackets, cutoff dates)
//! - [`query`]: filters over a record set
//! - [`stats`]: counts and histograms
//! - [`export`]: CSV / JSON / XLSX download encodings
//! - [`storage`]: `PersonStore` backends (memory, snapshot file, redb)
//! - [`registry`]: the service facade used by the app layer
//!
//! Nothing in this crate reads the wall clock. Every operation that depends on
//! "today" or "now" takes it as an argument.

pub mod derive;
pub mod error;
pub mod export;
pub mod formats;
pub mod person;
pub mod query;
pub mod registry;
pub mod seed;
pub mod stats;
pub mod storage;
pub mod validate;

pub use derive::{ADULT_AGE, AgeBracket, MeanAge};
pub use error::{FieldErrors, RegistryError, ValidationError};
pub use export::{ExportFile, ExportFormat, ExportRow};
pub use person::{NationalId, NewPerson, Person, PersonId, Sex};
pub use registry::{PersonField, Registry};
pub use stats::Statistics;
pub use storage::{Backend, FileStore, MemoryStore, PersonStore, RedbStore};
pub use validate::PersonForm;
