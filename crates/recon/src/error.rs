use std::fmt;

#[derive(Debug)]
pub enum MigrateError {
    /// TOML parse / deserialization error.
    ConfigParse(String),
    /// Config validation error (empty file name, empty id column, etc.).
    ConfigValidation(String),
    /// IO error (file read, etc.).
    Io(String),
    /// A source table has no identifier column.
    MissingIdColumn { table: String, column: String },
    /// Malformed CSV in a source table.
    Csv { table: String, message: String },
    /// Destination database lacks an expected table or column.
    SchemaMismatch { table: String, detail: String },
    /// Any other database failure.
    Database(String),
}

impl fmt::Display for MigrateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConfigParse(msg) => write!(f, "config parse error: {msg}"),
            Self::ConfigValidation(msg) => write!(f, "config validation error: {msg}"),
            Self::Io(msg) => write!(f, "IO error: {msg}"),
            Self::MissingIdColumn { table, column } => {
                write!(f, "table '{table}': missing id column '{column}'")
            }
            Self::Csv { table, message } => write!(f, "table '{table}': {message}"),
            Self::SchemaMismatch { table, detail } => {
                write!(f, "destination schema mismatch in '{table}': {detail}")
            }
            Self::Database(msg) => write!(f, "database error: {msg}"),
        }
    }
}

impl std::error::Error for MigrateError {}

impl MigrateError {
    /// True for failures caused by the input files rather than the destination.
    pub fn is_input(&self) -> bool {
        matches!(self, Self::Io(_) | Self::MissingIdColumn { .. } | Self::Csv { .. })
    }
}
