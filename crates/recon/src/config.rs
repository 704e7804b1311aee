use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::MigrateError;
use crate::source::TableKind;

/// Config file picked up from the working directory when none is given.
pub const DEFAULT_CONFIG_FILE: &str = "gf-migrate.toml";

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MigrateConfig {
    #[serde(default = "default_database")]
    pub database: PathBuf,
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    #[serde(default = "default_id_column")]
    pub id_column: String,
    #[serde(default)]
    pub files: TableFiles,
}

fn default_database() -> PathBuf {
    PathBuf::from("gallformers.sqlite")
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data_from_airtable")
}

fn default_id_column() -> String {
    "Record".into()
}

impl Default for MigrateConfig {
    fn default() -> Self {
        Self {
            database: default_database(),
            data_dir: default_data_dir(),
            id_column: default_id_column(),
            files: TableFiles::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// Export file names
// ---------------------------------------------------------------------------

/// File name per export, relative to `data_dir`. Unset entries use
/// [`TableKind::default_file`].
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TableFiles {
    pub galls: Option<String>,
    pub hosts: Option<String>,
    pub descriptions: Option<String>,
    pub families: Option<String>,
    pub genus_family: Option<String>,
    pub sources: Option<String>,
    pub taxonomic_names: Option<String>,
    pub valid_names: Option<String>,
}

impl TableFiles {
    fn get(&self, kind: TableKind) -> Option<&str> {
        let slot = match kind {
            TableKind::Galls => &self.galls,
            TableKind::Hosts => &self.hosts,
            TableKind::Descriptions => &self.descriptions,
            TableKind::Families => &self.families,
            TableKind::GenusFamily => &self.genus_family,
            TableKind::Sources => &self.sources,
            TableKind::TaxonomicNames => &self.taxonomic_names,
            TableKind::ValidNames => &self.valid_names,
        };
        slot.as_deref()
    }
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl MigrateConfig {
    pub fn from_toml(input: &str) -> Result<Self, MigrateError> {
        let config: MigrateConfig =
            toml::from_str(input).map_err(|e| MigrateError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Read a config file. Relative paths inside it resolve against the
    /// file's own directory.
    pub fn from_file(path: &Path) -> Result<Self, MigrateError> {
        let input = std::fs::read_to_string(path)
            .map_err(|e| MigrateError::Io(format!("cannot read {}: {e}", path.display())))?;
        let mut config = Self::from_toml(&input)?;

        let base = path.parent().unwrap_or_else(|| Path::new("."));
        if config.database.is_relative() {
            config.database = base.join(&config.database);
        }
        if config.data_dir.is_relative() {
            config.data_dir = base.join(&config.data_dir);
        }
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), MigrateError> {
        if self.id_column.trim().is_empty() {
            return Err(MigrateError::ConfigValidation("id_column must not be empty".into()));
        }

        if self.database.as_os_str().is_empty() {
            return Err(MigrateError::ConfigValidation("database must not be empty".into()));
        }

        for kind in TableKind::ALL {
            if let Some(file) = self.files.get(kind) {
                if file.trim().is_empty() {
                    return Err(MigrateError::ConfigValidation(format!(
                        "files.{kind} must not be empty"
                    )));
                }
            }
        }

        Ok(())
    }

    pub fn file_name(&self, kind: TableKind) -> &str {
        self.files.get(kind).unwrap_or_else(|| kind.default_file())
    }

    /// Full path of an export.
    pub fn table_path(&self, kind: TableKind) -> PathBuf {
        self.data_dir.join(self.file_name(kind))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
