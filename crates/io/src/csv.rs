// CSV export loading

use std::path::Path;

use gallformers_recon::{load_table, MigrateConfig, MigrateError, RecordTable, SourceTables, TableKind};

/// Load every export named by `config`. Any unreadable file or missing id
/// column fails the whole load before anything is written.
pub fn load_tables(config: &MigrateConfig) -> Result<SourceTables, MigrateError> {
    let mut tables = SourceTables::default();
    for kind in TableKind::ALL {
        let path = config.table_path(kind);
        let table = load_file(&kind.to_string(), &path, &config.id_column)?;
        log::info!("read {} {kind} records from {}", table.len(), path.display());
        tables.set(kind, table);
    }
    tables.check_columns();
    Ok(tables)
}

/// Load one export file into a [`RecordTable`].
pub fn load_file(table: &str, path: &Path, id_column: &str) -> Result<RecordTable, MigrateError> {
    let content = read_file_as_utf8(path)?;
    load_table(table, &content, id_column)
}

/// Read an export as text. Anything that is not UTF-8 is taken to be a
/// Windows-1252 re-save and decoded as such, with a warning.
pub fn read_file_as_utf8(path: &Path) -> Result<String, MigrateError> {
    let bytes = std::fs::read(path)
        .map_err(|e| MigrateError::Io(format!("cannot read {}: {e}", path.display())))?;

    String::from_utf8(bytes).or_else(|e| {
        let (text, _, replaced) = encoding_rs::WINDOWS_1252.decode(e.as_bytes());
        log::warn!(
            "{}: invalid UTF-8 after byte {}, decoding as Windows-1252{}",
            path.display(),
            e.utf8_error().valid_up_to(),
            if replaced { " (some characters replaced)" } else { "" }
        );
        Ok::<_, MigrateError>(text.into_owned())
    })
}
