//! Local record store: connection records and offline prompt drafts.
//!
//! Layout:
//! - `models.rs`: Rust structs mirroring rows
//! - `schema.rs`: ordered, additive-only migrations keyed by `PRAGMA user_version`
//! - `actor.rs`: the ractor actor owning the SQLite pool (all writes serialize here)
//! - `lazy.rs`: open-once handle shared across the process

pub mod actor;
pub mod lazy;
pub mod models;
pub mod schema;

pub use actor::{StoreHandle, StoreOptions, open};
pub use lazy::LazyStore;
pub use models::{ConnectionRecord, LocalDraftRecord, NewDraft};
pub use schema::{MIGRATIONS, Migration, SCHEMA_VERSION};
