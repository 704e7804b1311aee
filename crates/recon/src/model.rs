use serde::Serialize;

// ---------------------------------------------------------------------------
// Destination rows
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FamilyRow {
    pub name: String,
    pub kind: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceRow {
    pub title: String,
    pub author: String,
    pub pubyear: String,
    pub link: String,
    pub citation: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaxonKind {
    Host,
    Gall,
}

impl TaxonKind {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Host => "host",
            Self::Gall => "gall",
        }
    }
}

impl std::fmt::Display for TaxonKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpeciesRow {
    pub kind: TaxonKind,
    pub name: String,
    pub genus: String,
    pub family_id: Option<i64>,
    pub description: Option<String>,
    pub synonyms: Option<String>,
}

/// Gall attributes. Every id points into a lookup table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GallRow {
    pub species_id: i64,
    pub detachable: Option<bool>,
    pub alignment_id: Option<i64>,
    pub walls_id: Option<i64>,
    pub cells_id: Option<i64>,
    pub color_id: Option<i64>,
    pub shape_id: Option<i64>,
    pub texture_id: Option<i64>,
    pub loc_id: Option<i64>,
}

/// Outcome of inserting a row whose natural key must be unique.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Inserted {
    Created(i64),
    /// The key was already taken; carries the id of the row holding it.
    Existing(i64),
}

impl Inserted {
    pub fn id(&self) -> i64 {
        match self {
            Self::Created(id) | Self::Existing(id) => *id,
        }
    }
}

// ---------------------------------------------------------------------------
// Lookup tables
// ---------------------------------------------------------------------------

/// Small enumeration tables seeded outside the migration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LookupTable {
    Location,
    Alignment,
    Walls,
    Cells,
    Color,
    Shape,
    Texture,
}

impl LookupTable {
    pub const ALL: [LookupTable; 7] = [
        Self::Location,
        Self::Alignment,
        Self::Walls,
        Self::Cells,
        Self::Color,
        Self::Shape,
        Self::Texture,
    ];

    pub fn table(&self) -> &'static str {
        match self {
            Self::Location => "location",
            Self::Alignment => "alignment",
            Self::Walls => "walls",
            Self::Cells => "cells",
            Self::Color => "color",
            Self::Shape => "shape",
            Self::Texture => "texture",
        }
    }

    pub fn id_column(&self) -> &'static str {
        match self {
            Self::Location => "loc_id",
            Self::Alignment => "alignment_id",
            Self::Walls => "walls_id",
            Self::Cells => "cells_id",
            Self::Color => "color_id",
            Self::Shape => "shape_id",
            Self::Texture => "texture_id",
        }
    }

    pub fn value_column(&self) -> &'static str {
        match self {
            Self::Location => "loc",
            Self::Alignment => "alignment",
            Self::Walls => "walls",
            Self::Cells => "cells",
            Self::Color => "color",
            Self::Shape => "shape",
            Self::Texture => "texture",
        }
    }
}

impl std::fmt::Display for LookupTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.table())
    }
}

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MigrationCounts {
    pub families: usize,
    pub sources: usize,
    pub species: usize,
    pub galls: usize,
    pub host_edges: usize,
    pub source_edges: usize,
}

/// Reference that could not be reconciled. Logged, never fatal.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UnresolvedCounts {
    pub families: usize,
    pub hosts: usize,
    pub sources: usize,
    pub lookups: usize,
    /// Rows skipped because their natural key was already taken.
    pub conflicts: usize,
}

impl UnresolvedCounts {
    pub fn total(&self) -> usize {
        self.families + self.hosts + self.sources + self.lookups + self.conflicts
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ReportMeta {
    pub engine_version: String,
    pub run_at: String,
    pub dry_run: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct MigrationReport {
    pub meta: ReportMeta,
    pub inserted: MigrationCounts,
    pub unresolved: UnresolvedCounts,
}
