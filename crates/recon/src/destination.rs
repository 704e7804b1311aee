use crate::error::MigrateError;
use crate::model::{FamilyRow, GallRow, Inserted, LookupTable, SourceRow, SpeciesRow};

/// Where reconciled rows go. The engine only talks to the database through this.
///
/// Lookups return `Ok(None)` on a miss; `Err` is reserved for failures that
/// must end the run.
pub trait Destination {
    /// Fail with [`MigrateError::SchemaMismatch`] if a table or column is missing.
    fn verify_schema(&mut self) -> Result<(), MigrateError>;

    /// Empty every table the migration writes.
    fn clear(&mut self) -> Result<(), MigrateError>;

    fn insert_family(&mut self, row: &FamilyRow) -> Result<Inserted, MigrateError>;
    fn insert_source(&mut self, row: &SourceRow) -> Result<Inserted, MigrateError>;
    fn insert_species(&mut self, row: &SpeciesRow) -> Result<Inserted, MigrateError>;
    fn insert_gall(&mut self, row: &GallRow) -> Result<(), MigrateError>;
    fn insert_host_edge(&mut self, host_id: i64, gall_id: i64) -> Result<(), MigrateError>;
    fn insert_species_source(&mut self, species_id: i64, source_id: i64) -> Result<(), MigrateError>;

    fn family_id(&mut self, name: &str) -> Result<Option<i64>, MigrateError>;
    fn species_id(&mut self, name: &str) -> Result<Option<i64>, MigrateError>;
    fn source_id(&mut self, title: &str) -> Result<Option<i64>, MigrateError>;
    fn lookup_id(&mut self, table: LookupTable, value: &str) -> Result<Option<i64>, MigrateError>;
}
