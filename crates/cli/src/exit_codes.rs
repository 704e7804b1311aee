//! CLI Exit Code Registry
//!
//! Single source of truth for `gf-migrate` exit codes. Scripts that drive
//! the migration rely on them.
//!
//! | Code | Meaning                                              |
//! |------|------------------------------------------------------|
//! | 0    | Success (including a dry run)                        |
//! | 1    | General error (unspecified)                          |
//! | 2    | CLI usage error (bad arguments)                      |
//! | 3    | Invalid config file                                  |
//! | 4    | Input error (unreadable export, missing id column)   |
//! | 5    | Destination schema mismatch                          |
//! | 6    | Database error (open, statement, commit)             |
//!
//! Unresolved references are not errors; they are reported and the run
//! still exits 0.

use gallformers_recon::MigrateError;

/// Success - migration committed, or dry run completed.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments. clap exits with this code itself.
#[allow(dead_code)]
pub const EXIT_USAGE: u8 = 2;

/// Config file unreadable, malformed, or failing validation.
pub const EXIT_INVALID_CONFIG: u8 = 3;

/// An export could not be read or lacks its id column.
pub const EXIT_INPUT: u8 = 4;

/// Destination is missing a table or column the migration writes.
pub const EXIT_SCHEMA_MISMATCH: u8 = 5;

/// SQLite reported an error.
pub const EXIT_DATABASE: u8 = 6;

/// Map a MigrateError to its exit code.
pub fn migrate_exit_code(err: &MigrateError) -> u8 {
    match err {
        MigrateError::ConfigParse(_) | MigrateError::ConfigValidation(_) => EXIT_INVALID_CONFIG,
        MigrateError::Io(_) | MigrateError::MissingIdColumn { .. } | MigrateError::Csv { .. } => {
            EXIT_INPUT
        }
        MigrateError::SchemaMismatch { .. } => EXIT_SCHEMA_MISMATCH,
        MigrateError::Database(_) => EXIT_DATABASE,
    }
}
