// File I/O and the SQLite destination

pub mod csv;
pub mod session;
pub mod sqlite;

pub use csv::{load_file, load_tables, read_file_as_utf8};
pub use session::Session;
pub use sqlite::SqliteDestination;

/// Destination schema, applied with `--init-schema`.
/// Every statement is `IF NOT EXISTS` so it is safe on an existing database.
pub const SCHEMA: &str = include_str!("schema.sql");

/// Fixed lookup vocabularies (location, alignment, walls, ...).
pub const SEED: &str = include_str!("seed.sql");
