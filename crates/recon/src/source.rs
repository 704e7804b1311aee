use std::collections::HashMap;

use crate::error::MigrateError;

// ---------------------------------------------------------------------------
// Column names used by the Airtable exports
// ---------------------------------------------------------------------------

pub mod columns {
    pub const GALL: &str = "Gall";
    pub const GALL_DESCRIPTION: &str = "Description (from Source Contents)";
    pub const GALL_SOURCES: &str = "Source (from Source Contents)";
    pub const HOST_PLANT: &str = "Host Plant";
    pub const HOST_ASSOCIATIONS: &str = "Host associations mentioned (from Descriptions)";
    pub const DETACHABLE: &str = "Detachable";
    pub const ALIGNMENT: &str = "Alignment";
    pub const WALLS: &str = "Walls";
    pub const LOCATION: &str = "Location";
    pub const COLOR: &str = "Color";
    pub const SHAPE: &str = "Shape";
    pub const CELLS: &str = "Cells";
    pub const TEXTURE: &str = "Texture";

    pub const HOST_NAME: &str = "Specific Name";
    pub const HOST_GENUS: &str = "Genus";
    pub const HOST_FAMILY: &str = "Family (from Taxonomy)";

    pub const FAMILY: &str = "Family";
    pub const FAMILY_TYPE: &str = "Type";
    pub const FAMILY_GENERA: &str = "Genus-Family";

    pub const GENUS_NAME: &str = "Genus Name";

    pub const SOURCE_TITLE: &str = "Title";
    pub const SOURCE_AUTHOR: &str = "Author";
    pub const SOURCE_YEAR: &str = "Year of publication";
    pub const SOURCE_LINK: &str = "Hyperlink";
    pub const SOURCE_CITATION: &str = "Citation (MLA)";

    pub const CURRENT_NAME: &str = "Current Name";
    pub const SYNONYMS: &str = "Synonyms (including current name)";
}

// ---------------------------------------------------------------------------
// Table kinds
// ---------------------------------------------------------------------------

/// The fixed set of exports a migration reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TableKind {
    Galls,
    Hosts,
    Descriptions,
    Families,
    GenusFamily,
    Sources,
    TaxonomicNames,
    ValidNames,
}

impl TableKind {
    pub const ALL: [TableKind; 8] = [
        Self::Galls,
        Self::Hosts,
        Self::Descriptions,
        Self::Families,
        Self::GenusFamily,
        Self::Sources,
        Self::TaxonomicNames,
        Self::ValidNames,
    ];

    pub fn default_file(&self) -> &'static str {
        match self {
            Self::Galls => "galls.csv",
            Self::Hosts => "host-species.csv",
            Self::Descriptions => "descriptions.csv",
            Self::Families => "family-upper-level.csv",
            Self::GenusFamily => "genus-family.csv",
            Self::Sources => "sources.csv",
            Self::TaxonomicNames => "taxonomic-names.csv",
            Self::ValidNames => "valid-names.csv",
        }
    }

    /// Columns the reconciler reads from this table. Absent ones read as empty.
    pub fn expected_columns(&self) -> &'static [&'static str] {
        use columns::*;
        match self {
            Self::Galls => &[
                GALL,
                GALL_DESCRIPTION,
                GALL_SOURCES,
                HOST_PLANT,
                HOST_ASSOCIATIONS,
                DETACHABLE,
                ALIGNMENT,
                WALLS,
                LOCATION,
            ],
            Self::Hosts => &[HOST_NAME, HOST_GENUS, HOST_FAMILY],
            Self::Families => &[FAMILY, FAMILY_TYPE, FAMILY_GENERA],
            Self::GenusFamily => &[GENUS_NAME, FAMILY],
            Self::Sources => &[
                SOURCE_TITLE,
                SOURCE_AUTHOR,
                SOURCE_YEAR,
                SOURCE_LINK,
                SOURCE_CITATION,
            ],
            Self::ValidNames => &[CURRENT_NAME, SYNONYMS],
            Self::Descriptions | Self::TaxonomicNames => &[],
        }
    }
}

impl std::fmt::Display for TableKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Galls => write!(f, "galls"),
            Self::Hosts => write!(f, "hosts"),
            Self::Descriptions => write!(f, "descriptions"),
            Self::Families => write!(f, "families"),
            Self::GenusFamily => write!(f, "genus_family"),
            Self::Sources => write!(f, "sources"),
            Self::TaxonomicNames => write!(f, "taxonomic_names"),
            Self::ValidNames => write!(f, "valid_names"),
        }
    }
}

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// One raw row of an export, keyed by its original record id.
#[derive(Debug, Clone)]
pub struct SourceRecord {
    pub record_id: String,
    pub fields: HashMap<String, String>,
}

impl SourceRecord {
    /// Raw field value. Missing columns read as "".
    pub fn field(&self, column: &str) -> &str {
        self.fields.get(column).map(String::as_str).unwrap_or("")
    }
}

/// Records of one export in file order, addressable by record id.
#[derive(Debug, Clone, Default)]
pub struct RecordTable {
    pub name: String,
    headers: Vec<String>,
    records: Vec<SourceRecord>,
    index: HashMap<String, usize>,
}

impl RecordTable {
    pub fn new(name: impl Into<String>, headers: Vec<String>) -> Self {
        Self {
            name: name.into(),
            headers,
            records: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Insert a record. A repeated id replaces the earlier record in place.
    pub fn insert(&mut self, record: SourceRecord) {
        if let Some(&pos) = self.index.get(&record.record_id) {
            log::warn!(
                "{}: duplicate record id '{}', keeping the later row",
                self.name,
                record.record_id
            );
            self.records[pos] = record;
        } else {
            self.index.insert(record.record_id.clone(), self.records.len());
            self.records.push(record);
        }
    }

    pub fn get(&self, record_id: &str) -> Option<&SourceRecord> {
        self.index.get(record_id).map(|&i| &self.records[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = &SourceRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.headers.iter().any(|h| h == column)
    }
}

/// Parse one CSV export into a [`RecordTable`] keyed by `id_column`.
///
/// A leading byte-order marker is dropped. Values are kept as raw text.
pub fn load_table(table: &str, csv_data: &str, id_column: &str) -> Result<RecordTable, MigrateError> {
    let data = csv_data.strip_prefix('\u{feff}').unwrap_or(csv_data);

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(data.as_bytes());

    let csv_err = |e: csv::Error| MigrateError::Csv {
        table: table.into(),
        message: e.to_string(),
    };

    let headers: Vec<String> = reader
        .headers()
        .map_err(csv_err)?
        .iter()
        .map(|h| h.to_string())
        .collect();

    let id_idx = headers
        .iter()
        .position(|h| h == id_column)
        .ok_or_else(|| MigrateError::MissingIdColumn {
            table: table.into(),
            column: id_column.into(),
        })?;

    let mut out = RecordTable::new(table, headers.clone());

    for record in reader.records() {
        let record = record.map_err(csv_err)?;

        let record_id = record.get(id_idx).unwrap_or("").to_string();
        let mut fields = HashMap::with_capacity(headers.len());
        for (i, h) in headers.iter().enumerate() {
            fields.insert(h.clone(), record.get(i).unwrap_or("").to_string());
        }

        out.insert(SourceRecord { record_id, fields });
    }

    Ok(out)
}

// ---------------------------------------------------------------------------
// All exports
// ---------------------------------------------------------------------------

/// Every export one migration run consumes.
#[derive(Debug, Clone, Default)]
pub struct SourceTables {
    pub galls: RecordTable,
    pub hosts: RecordTable,
    pub descriptions: RecordTable,
    pub families: RecordTable,
    pub genus_family: RecordTable,
    pub sources: RecordTable,
    pub taxonomic_names: RecordTable,
    pub valid_names: RecordTable,
}

impl SourceTables {
    pub fn get(&self, kind: TableKind) -> &RecordTable {
        match kind {
            TableKind::Galls => &self.galls,
            TableKind::Hosts => &self.hosts,
            TableKind::Descriptions => &self.descriptions,
            TableKind::Families => &self.families,
            TableKind::GenusFamily => &self.genus_family,
            TableKind::Sources => &self.sources,
            TableKind::TaxonomicNames => &self.taxonomic_names,
            TableKind::ValidNames => &self.valid_names,
        }
    }

    pub fn set(&mut self, kind: TableKind, table: RecordTable) {
        let slot = match kind {
            TableKind::Galls => &mut self.galls,
            TableKind::Hosts => &mut self.hosts,
            TableKind::Descriptions => &mut self.descriptions,
            TableKind::Families => &mut self.families,
            TableKind::GenusFamily => &mut self.genus_family,
            TableKind::Sources => &mut self.sources,
            TableKind::TaxonomicNames => &mut self.taxonomic_names,
            TableKind::ValidNames => &mut self.valid_names,
        };
        *slot = table;
    }

    /// Warn once per expected column a table does not carry.
    /// Returns the number of missing columns.
    pub fn check_columns(&self) -> usize {
        let mut missing = 0;
        for kind in TableKind::ALL {
            let table = self.get(kind);
            for column in kind.expected_columns() {
                if !table.has_column(column) {
                    log::warn!("{kind}: no '{column}' column, treating it as empty");
                    missing += 1;
                }
            }
        }
        missing
    }
}
