// SQLite destination for the reconciled rows

use rusqlite::{params, Connection, OptionalExtension};

use gallformers_recon::model::{FamilyRow, GallRow, Inserted, SourceRow, SpeciesRow};
use gallformers_recon::{Destination, LookupTable, MigrateError};

/// Tables the migration empties, children first.
const CLEARED_TABLES: &[&str] = &["speciessource", "host", "gall", "species", "source", "family"];

/// Tables and the columns the migration writes or reads.
const REQUIRED_COLUMNS: &[(&str, &[&str])] = &[
    ("family", &["family_id", "name", "description"]),
    ("source", &["source_id", "title", "author", "pubyear", "link", "citation"]),
    (
        "species",
        &["species_id", "taxoncode", "name", "synonyms", "genus", "family_id", "description"],
    ),
    (
        "gall",
        &[
            "species_id",
            "taxoncode",
            "detachable",
            "alignment_id",
            "walls_id",
            "cells_id",
            "color_id",
            "shape_id",
            "texture_id",
            "loc_id",
        ],
    ),
    ("host", &["host_species_id", "gall_species_id"]),
    ("speciessource", &["species_id", "source_id"]),
];

pub(crate) fn db_err(e: rusqlite::Error) -> MigrateError {
    MigrateError::Database(e.to_string())
}

/// Escape `%`, `_` and `\` so `value` matches itself under `LIKE ... ESCAPE '\'`.
fn like_pattern(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// [`Destination`] over one open connection (usually a transaction).
pub struct SqliteDestination<'c> {
    conn: &'c Connection,
}

impl<'c> SqliteDestination<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        Self { conn }
    }

    fn table_columns(&self, table: &str) -> Result<Vec<String>, MigrateError> {
        let mut stmt = self
            .conn
            .prepare(&format!("PRAGMA table_info({table})"))
            .map_err(db_err)?;
        let names = stmt
            .query_map([], |row| row.get::<_, String>(1))
            .map_err(db_err)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(db_err)?;
        Ok(names)
    }

    fn check_table(&self, table: &str, columns: &[&str]) -> Result<(), MigrateError> {
        let present = self.table_columns(table)?;
        if present.is_empty() {
            return Err(MigrateError::SchemaMismatch {
                table: table.into(),
                detail: "table does not exist".into(),
            });
        }
        if let Some(missing) = columns.iter().find(|c| !present.iter().any(|p| p == *c)) {
            return Err(MigrateError::SchemaMismatch {
                table: table.into(),
                detail: format!("missing column '{missing}'"),
            });
        }
        Ok(())
    }

    fn query_id(&self, sql: &str, key: &str) -> Result<Option<i64>, MigrateError> {
        self.conn
            .prepare_cached(sql)
            .map_err(db_err)?
            .query_row([key], |row| row.get(0))
            .optional()
            .map_err(db_err)
    }

    /// Insert unless `existing_sql` already finds the key.
    fn insert_unique(
        &self,
        existing_sql: &str,
        key: &str,
        insert: impl FnOnce(&Connection) -> rusqlite::Result<usize>,
    ) -> Result<Inserted, MigrateError> {
        if let Some(id) = self.query_id(existing_sql, key)? {
            return Ok(Inserted::Existing(id));
        }
        insert(self.conn).map_err(db_err)?;
        Ok(Inserted::Created(self.conn.last_insert_rowid()))
    }
}

impl Destination for SqliteDestination<'_> {
    fn verify_schema(&mut self) -> Result<(), MigrateError> {
        for (table, columns) in REQUIRED_COLUMNS {
            self.check_table(table, columns)?;
        }
        for lookup in LookupTable::ALL {
            self.check_table(lookup.table(), &[lookup.id_column(), lookup.value_column()])?;
        }
        Ok(())
    }

    fn clear(&mut self) -> Result<(), MigrateError> {
        for table in CLEARED_TABLES {
            let n = self
                .conn
                .execute(&format!("DELETE FROM {table}"), [])
                .map_err(db_err)?;
            log::debug!("cleared {n} rows from {table}");
        }

        // AUTOINCREMENT tables keep counting after a DELETE unless reset
        let has_sequence: bool = self
            .conn
            .query_row(
                "SELECT EXISTS (SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = 'sqlite_sequence')",
                [],
                |row| row.get(0),
            )
            .map_err(db_err)?;
        if has_sequence {
            let names = CLEARED_TABLES
                .iter()
                .map(|t| format!("'{t}'"))
                .collect::<Vec<_>>()
                .join(", ");
            self.conn
                .execute(&format!("DELETE FROM sqlite_sequence WHERE name IN ({names})"), [])
                .map_err(db_err)?;
        }
        Ok(())
    }

    fn insert_family(&mut self, row: &FamilyRow) -> Result<Inserted, MigrateError> {
        self.insert_unique("SELECT family_id FROM family WHERE name = ?1", &row.name, |conn| {
            conn.prepare_cached("INSERT INTO family (name, description) VALUES (?1, ?2)")?
                .execute(params![row.name, row.kind])
        })
    }

    fn insert_source(&mut self, row: &SourceRow) -> Result<Inserted, MigrateError> {
        self.insert_unique("SELECT source_id FROM source WHERE title = ?1", &row.title, |conn| {
            conn.prepare_cached(
                "INSERT INTO source (title, author, pubyear, link, citation) VALUES (?1, ?2, ?3, ?4, ?5)",
            )?
            .execute(params![row.title, row.author, row.pubyear, row.link, row.citation])
        })
    }

    fn insert_species(&mut self, row: &SpeciesRow) -> Result<Inserted, MigrateError> {
        self.insert_unique("SELECT species_id FROM species WHERE name = ?1", &row.name, |conn| {
            conn.prepare_cached(
                "INSERT INTO species (taxoncode, name, synonyms, genus, family_id, description) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            )?
            .execute(params![
                row.kind.code(),
                row.name,
                row.synonyms,
                row.genus,
                row.family_id,
                row.description
            ])
        })
    }

    fn insert_gall(&mut self, row: &GallRow) -> Result<(), MigrateError> {
        self.conn
            .prepare_cached(
                "INSERT INTO gall (species_id, taxoncode, detachable, alignment_id, walls_id, cells_id, \
                 color_id, shape_id, texture_id, loc_id) \
                 VALUES (?1, 'gall', ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            )
            .map_err(db_err)?
            .execute(params![
                row.species_id,
                row.detachable,
                row.alignment_id,
                row.walls_id,
                row.cells_id,
                row.color_id,
                row.shape_id,
                row.texture_id,
                row.loc_id
            ])
            .map_err(db_err)?;
        Ok(())
    }

    fn insert_host_edge(&mut self, host_id: i64, gall_id: i64) -> Result<(), MigrateError> {
        self.conn
            .prepare_cached("INSERT INTO host (host_species_id, gall_species_id) VALUES (?1, ?2)")
            .map_err(db_err)?
            .execute(params![host_id, gall_id])
            .map_err(db_err)?;
        Ok(())
    }

    fn insert_species_source(&mut self, species_id: i64, source_id: i64) -> Result<(), MigrateError> {
        self.conn
            .prepare_cached("INSERT INTO speciessource (species_id, source_id) VALUES (?1, ?2)")
            .map_err(db_err)?
            .execute(params![species_id, source_id])
            .map_err(db_err)?;
        Ok(())
    }

    fn family_id(&mut self, name: &str) -> Result<Option<i64>, MigrateError> {
        match self.query_id("SELECT family_id FROM family WHERE name = ?1", name)? {
            Some(id) => Ok(Some(id)),
            None => self.query_id(
                "SELECT family_id FROM family WHERE name = ?1 COLLATE NOCASE ORDER BY family_id",
                name,
            ),
        }
    }

    fn species_id(&mut self, name: &str) -> Result<Option<i64>, MigrateError> {
        self.query_id("SELECT species_id FROM species WHERE name = ?1", name)
    }

    fn source_id(&mut self, title: &str) -> Result<Option<i64>, MigrateError> {
        match self.query_id("SELECT source_id FROM source WHERE title = ?1", title)? {
            Some(id) => Ok(Some(id)),
            None => self.query_id(
                "SELECT source_id FROM source WHERE title LIKE ?1 ESCAPE '\\' ORDER BY source_id",
                &like_pattern(title),
            ),
        }
    }

    fn lookup_id(&mut self, table: LookupTable, value: &str) -> Result<Option<i64>, MigrateError> {
        let sql = format!(
            "SELECT {id} FROM {table} WHERE {col} = ?1 COLLATE NOCASE ORDER BY {id}",
            id = table.id_column(),
            table = table.table(),
            col = table.value_column(),
        );
        self.query_id(&sql, value)
    }
}
