use std::collections::{HashMap, HashSet};

use crate::destination::Destination;
use crate::error::MigrateError;
use crate::family::{genus_of, FamilyIndex};
use crate::model::{
    FamilyRow, GallRow, Inserted, LookupTable, MigrationCounts, MigrationReport, ReportMeta,
    SourceRow, SpeciesRow, TaxonKind, UnresolvedCounts,
};
use crate::source::{columns, RecordTable, SourceRecord, SourceTables};
use crate::split::{split_citations, split_list};

/// Family type given to families implied by host records.
pub const PLANT_FAMILY: &str = "Plant";

/// Run the whole migration against `dest`: verify, clear, then load every
/// table in dependency order.
///
/// Unresolved references are logged and counted in the report; only
/// destination failures end the run early.
pub fn run<D: Destination + ?Sized>(
    tables: &SourceTables,
    dest: &mut D,
) -> Result<MigrationReport, MigrateError> {
    dest.verify_schema()?;
    dest.clear()?;

    let mut recon = Reconciler::new(dest);

    recon.insert_families(&tables.families, &tables.hosts)?;
    log::info!("added {} families", recon.counts.families);

    recon.insert_sources(&tables.sources)?;
    log::info!("added {} sources", recon.counts.sources);

    recon.insert_hosts(&tables.hosts)?;
    log::info!("added {} host species", recon.counts.species);

    let index = FamilyIndex::build(&tables.families, &tables.genus_family);
    log::debug!("family index covers {} genera", index.len());
    let synonyms = synonym_map(&tables.valid_names);

    let galls = recon.insert_gall_species(&tables.galls, &index, &synonyms)?;
    log::info!("added {} galls as species", galls.len());

    let galls = recon.insert_gall_attributes(&galls)?;
    log::info!("added {} galls as galls", recon.counts.galls);

    recon.insert_host_edges(&galls)?;
    log::info!("added {} host-gall relationships", recon.counts.host_edges);

    recon.insert_source_edges(&galls)?;
    log::info!("added {} source-gall relationships", recon.counts.source_edges);

    Ok(MigrationReport {
        meta: ReportMeta {
            engine_version: env!("CARGO_PKG_VERSION").to_string(),
            run_at: chrono::Utc::now().to_rfc3339(),
            dry_run: false,
        },
        inserted: recon.counts,
        unresolved: recon.unresolved,
    })
}

/// Parse the Airtable `Detachable` cell.
///
/// Returns `Ok(None)` for an empty cell and the offending text for anything
/// that is neither detachable nor integral.
pub fn parse_detachable(raw: &str) -> Result<Option<bool>, String> {
    let value = raw.trim();
    match value.to_ascii_lowercase().as_str() {
        "" => Ok(None),
        "detachable" | "yes" | "true" | "checked" | "1" => Ok(Some(true)),
        "integral" | "no" | "false" | "0" => Ok(Some(false)),
        _ => Err(value.to_string()),
    }
}

/// Current name → synonyms (the current name itself removed), comma-joined.
fn synonym_map(valid_names: &RecordTable) -> HashMap<String, String> {
    let mut out = HashMap::new();
    for rec in valid_names.iter() {
        let current = rec.field(columns::CURRENT_NAME).trim();
        if current.is_empty() {
            continue;
        }
        let others: Vec<String> = split_list(rec.field(columns::SYNONYMS))
            .into_iter()
            .filter(|s| s != current)
            .collect();
        if !others.is_empty() {
            out.entry(current.to_string()).or_insert_with(|| others.join(", "));
        }
    }
    out
}

fn non_empty(raw: &str) -> Option<String> {
    let t = raw.trim();
    (!t.is_empty()).then(|| t.to_string())
}

// ---------------------------------------------------------------------------
// Reconciler
// ---------------------------------------------------------------------------

struct Reconciler<'d, D: Destination + ?Sized> {
    dest: &'d mut D,
    counts: MigrationCounts,
    unresolved: UnresolvedCounts,
    host_edges: HashSet<(i64, i64)>,
    source_edges: HashSet<(i64, i64)>,
}

/// A gall that made it into `species`, with its id once resolved.
struct GallEntry<'a> {
    record: &'a SourceRecord,
    name: String,
    species_id: i64,
}

impl<'d, D: Destination + ?Sized> Reconciler<'d, D> {
    fn new(dest: &'d mut D) -> Self {
        Self {
            dest,
            counts: MigrationCounts::default(),
            unresolved: UnresolvedCounts::default(),
            host_edges: HashSet::new(),
            source_edges: HashSet::new(),
        }
    }

    fn insert_families(&mut self, families: &RecordTable, hosts: &RecordTable) -> Result<(), MigrateError> {
        let explicit = families.iter().map(|r| {
            (r.field(columns::FAMILY).trim(), r.field(columns::FAMILY_TYPE).trim())
        });
        let implied = hosts
            .iter()
            .map(|r| (r.field(columns::HOST_FAMILY).trim(), PLANT_FAMILY));

        let mut seen: HashSet<FamilyRow> = HashSet::new();
        let mut kinds: HashMap<String, String> = HashMap::new();

        for (name, kind) in explicit.chain(implied) {
            if name.is_empty() {
                continue;
            }
            let row = FamilyRow {
                name: name.to_string(),
                kind: kind.to_string(),
            };
            if seen.contains(&row) {
                continue;
            }
            if let Some(existing) = kinds.get(name) {
                log::info!("family '{name}' already added as '{existing}', not adding it as '{kind}'");
                seen.insert(row);
                continue;
            }

            match self.dest.insert_family(&row)? {
                Inserted::Created(_) => self.counts.families += 1,
                Inserted::Existing(id) => {
                    log::warn!("family '{name}' already present as family_id {id}");
                    self.unresolved.conflicts += 1;
                }
            }
            kinds.insert(row.name.clone(), row.kind.clone());
            seen.insert(row);
        }
        Ok(())
    }

    fn insert_sources(&mut self, sources: &RecordTable) -> Result<(), MigrateError> {
        for rec in sources.iter() {
            let row = SourceRow {
                title: rec.field(columns::SOURCE_TITLE).trim().to_string(),
                author: rec.field(columns::SOURCE_AUTHOR).to_string(),
                pubyear: rec.field(columns::SOURCE_YEAR).to_string(),
                link: rec.field(columns::SOURCE_LINK).to_string(),
                citation: rec.field(columns::SOURCE_CITATION).to_string(),
            };
            if row.title.is_empty() {
                log::warn!("source record '{}' has no title", rec.record_id);
            }
            match self.dest.insert_source(&row)? {
                Inserted::Created(_) => self.counts.sources += 1,
                Inserted::Existing(id) => {
                    log::warn!("source title '{}' already used by source_id {id}, skipping", row.title);
                    self.unresolved.conflicts += 1;
                }
            }
        }
        Ok(())
    }

    fn insert_hosts(&mut self, hosts: &RecordTable) -> Result<(), MigrateError> {
        for rec in hosts.iter() {
            let name = rec.field(columns::HOST_NAME).trim();
            if name.is_empty() {
                log::warn!("host record '{}' has no name", rec.record_id);
            }

            let family_name = rec.field(columns::HOST_FAMILY).trim();
            let family_id = if family_name.is_empty() {
                None
            } else {
                let id = self.dest.family_id(family_name)?;
                if id.is_none() {
                    log::warn!("failed to look up family_id for '{family_name}' (host '{name}')");
                    self.unresolved.families += 1;
                }
                id
            };

            let genus = match rec.field(columns::HOST_GENUS).trim() {
                "" => genus_of(name),
                g => g,
            };

            let row = SpeciesRow {
                kind: TaxonKind::Host,
                name: name.to_string(),
                genus: genus.to_string(),
                family_id,
                description: None,
                synonyms: None,
            };
            self.insert_species(&row)?;
        }
        Ok(())
    }

    fn insert_species(&mut self, row: &SpeciesRow) -> Result<Option<i64>, MigrateError> {
        match self.dest.insert_species(row)? {
            Inserted::Created(id) => {
                self.counts.species += 1;
                Ok(Some(id))
            }
            Inserted::Existing(id) => {
                log::warn!(
                    "species name '{}' already used by species_id {id}, skipping {}",
                    row.name,
                    row.kind
                );
                self.unresolved.conflicts += 1;
                Ok(None)
            }
        }
    }

    fn insert_gall_species<'a>(
        &mut self,
        galls: &'a RecordTable,
        index: &FamilyIndex,
        synonyms: &HashMap<String, String>,
    ) -> Result<Vec<GallEntry<'a>>, MigrateError> {
        let mut inserted = Vec::new();

        for rec in galls.iter() {
            let name = rec.field(columns::GALL).trim();
            if name.is_empty() {
                log::warn!("gall record '{}' has no name, skipping", rec.record_id);
                continue;
            }

            let genus = genus_of(name);
            let family_id = match index.family_of(genus) {
                Some(family) => {
                    let id = self.dest.family_id(family)?;
                    if id.is_none() {
                        log::warn!("failed to look up family_id for '{family}' (genus '{genus}')");
                        self.unresolved.families += 1;
                    }
                    id
                }
                None => {
                    log::warn!("failed to look up family for genus '{genus}' (gall '{name}')");
                    self.unresolved.families += 1;
                    None
                }
            };

            let row = SpeciesRow {
                kind: TaxonKind::Gall,
                name: name.to_string(),
                genus: genus.to_string(),
                family_id,
                description: non_empty(rec.field(columns::GALL_DESCRIPTION)),
                synonyms: synonyms.get(name).cloned(),
            };

            if let Some(species_id) = self.insert_species(&row)? {
                inserted.push(GallEntry {
                    record: rec,
                    name: row.name,
                    species_id,
                });
            }
        }
        Ok(inserted)
    }

    fn insert_gall_attributes<'a>(
        &mut self,
        galls: &[GallEntry<'a>],
    ) -> Result<Vec<GallEntry<'a>>, MigrateError> {
        let mut resolved = Vec::with_capacity(galls.len());

        for gall in galls {
            let Some(species_id) = self.dest.species_id(&gall.name)? else {
                log::warn!("failed to look up species_id for '{}'", gall.name);
                self.unresolved.lookups += 1;
                continue;
            };
            if species_id != gall.species_id {
                log::warn!(
                    "species '{}' resolved to species_id {species_id}, inserted as {}",
                    gall.name,
                    gall.species_id
                );
            }

            let rec = gall.record;
            let detachable = match parse_detachable(rec.field(columns::DETACHABLE)) {
                Ok(d) => d,
                Err(value) => {
                    log::warn!("gall '{}': unrecognised detachable value '{value}'", gall.name);
                    self.unresolved.lookups += 1;
                    None
                }
            };

            let row = GallRow {
                species_id,
                detachable,
                alignment_id: self.resolve_lookup(&gall.name, rec, LookupTable::Alignment, columns::ALIGNMENT)?,
                walls_id: self.resolve_lookup(&gall.name, rec, LookupTable::Walls, columns::WALLS)?,
                cells_id: self.resolve_lookup(&gall.name, rec, LookupTable::Cells, columns::CELLS)?,
                color_id: self.resolve_lookup(&gall.name, rec, LookupTable::Color, columns::COLOR)?,
                shape_id: self.resolve_lookup(&gall.name, rec, LookupTable::Shape, columns::SHAPE)?,
                texture_id: self.resolve_lookup(&gall.name, rec, LookupTable::Texture, columns::TEXTURE)?,
                loc_id: self.resolve_lookup(&gall.name, rec, LookupTable::Location, columns::LOCATION)?,
            };
            self.dest.insert_gall(&row)?;
            self.counts.galls += 1;

            resolved.push(GallEntry {
                record: rec,
                name: gall.name.clone(),
                species_id,
            });
        }
        Ok(resolved)
    }

    /// Resolve a lookup-table cell. The schema holds one value per gall, so
    /// only the first listed value is used.
    fn resolve_lookup(
        &mut self,
        gall: &str,
        rec: &SourceRecord,
        table: LookupTable,
        column: &str,
    ) -> Result<Option<i64>, MigrateError> {
        let values = split_list(rec.field(column));
        let Some(value) = values.first() else {
            return Ok(None);
        };
        if values.len() > 1 {
            log::info!("gall '{gall}': {table} lists {} values, keeping '{value}'", values.len());
        }

        let id = self.dest.lookup_id(table, value)?;
        if id.is_none() {
            log::warn!("failed to look up {} for '{value}' (gall '{gall}')", table.id_column());
            self.unresolved.lookups += 1;
        }
        Ok(id)
    }

    fn insert_host_edges(&mut self, galls: &[GallEntry<'_>]) -> Result<(), MigrateError> {
        for gall in galls {
            let mut hosts = split_list(gall.record.field(columns::HOST_PLANT));
            for h in split_list(gall.record.field(columns::HOST_ASSOCIATIONS)) {
                if !hosts.contains(&h) {
                    hosts.push(h);
                }
            }

            for host in &hosts {
                let Some(host_id) = self.dest.species_id(host)? else {
                    log::warn!("failed to look up species_id for host '{host}' (gall '{}')", gall.name);
                    self.unresolved.hosts += 1;
                    continue;
                };
                if self.host_edges.insert((host_id, gall.species_id)) {
                    self.dest.insert_host_edge(host_id, gall.species_id)?;
                    self.counts.host_edges += 1;
                }
            }
        }
        Ok(())
    }

    fn insert_source_edges(&mut self, galls: &[GallEntry<'_>]) -> Result<(), MigrateError> {
        for gall in galls {
            for citation in split_citations(gall.record.field(columns::GALL_SOURCES)) {
                let Some(source_id) = self.dest.source_id(&citation)? else {
                    log::warn!("failed to look up source_id for '{citation}' (gall '{}')", gall.name);
                    self.unresolved.sources += 1;
                    continue;
                };
                if self.source_edges.insert((gall.species_id, source_id)) {
                    self.dest.insert_species_source(gall.species_id, source_id)?;
                    self.counts.source_edges += 1;
                }
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
