//! `gallformers-recon` — reconciliation of the Airtable exports into the
//! gallformers schema.
//!
//! Pure engine crate: receives pre-loaded tables and a [`Destination`],
//! resolves names to surrogate ids, and reports what was loaded.
//! No CLI or IO dependencies.

pub mod config;
pub mod destination;
pub mod engine;
pub mod error;
pub mod family;
pub mod model;
pub mod source;
pub mod split;

pub use config::MigrateConfig;
pub use destination::Destination;
pub use engine::run;
pub use error::MigrateError;
pub use model::{LookupTable, MigrationCounts, MigrationReport, UnresolvedCounts};
pub use source::{load_table, RecordTable, SourceTables, TableKind};
