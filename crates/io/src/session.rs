// Database session: one connection, one transaction per migration run

use std::path::Path;

use rusqlite::{Connection, OpenFlags};

use gallformers_recon::{MigrateError, MigrationReport, SourceTables};

use crate::sqlite::{db_err, SqliteDestination};

/// Owns the destination connection for the duration of a run.
/// Dropping the session closes the connection.
pub struct Session {
    conn: Connection,
}

impl Session {
    /// Open an existing database. With `create`, a missing file is created
    /// (it then needs [`Session::init_schema`] before a run can pass the
    /// schema check).
    pub fn open(path: &Path, create: bool) -> Result<Self, MigrateError> {
        let mut flags = OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_NO_MUTEX;
        if create {
            flags |= OpenFlags::SQLITE_OPEN_CREATE;
        }
        let conn = Connection::open_with_flags(path, flags)
            .map_err(|e| MigrateError::Database(format!("cannot open {}: {e}", path.display())))?;
        Self::from_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self, MigrateError> {
        Self::from_connection(Connection::open_in_memory().map_err(db_err)?)
    }

    fn from_connection(conn: Connection) -> Result<Self, MigrateError> {
        conn.execute_batch("PRAGMA foreign_keys = ON;").map_err(db_err)?;
        Ok(Self { conn })
    }

    /// Create any missing tables and seed the lookup tables.
    pub fn init_schema(&self) -> Result<(), MigrateError> {
        self.conn.execute_batch(crate::SCHEMA).map_err(db_err)?;
        self.conn.execute_batch(crate::SEED).map_err(db_err)?;
        Ok(())
    }

    /// Run the migration inside a single transaction.
    ///
    /// The transaction commits only when every step succeeds; with `dry_run`
    /// it is rolled back after the report is built.
    pub fn migrate(&mut self, tables: &SourceTables, dry_run: bool) -> Result<MigrationReport, MigrateError> {
        let tx = self.conn.transaction().map_err(db_err)?;

        let mut report = {
            let mut dest = SqliteDestination::new(&tx);
            gallformers_recon::run(tables, &mut dest)?
        };

        if dry_run {
            tx.rollback().map_err(db_err)?;
            report.meta.dry_run = true;
        } else {
            tx.commit().map_err(db_err)?;
        }
        Ok(report)
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Close the connection, surfacing any error SQLite reports on close.
    pub fn close(self) -> Result<(), MigrateError> {
        self.conn.close().map_err(|(_, e)| db_err(e))
    }
}
