use std::path::PathBuf;

use gallformers_recon::model::{FamilyRow, GallRow, Inserted, SourceRow, SpeciesRow, TaxonKind};
use gallformers_recon::{
    load_table, run, Destination, LookupTable, MigrateConfig, MigrateError, SourceTables, TableKind,
};

fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn load_fixture_tables() -> SourceTables {
    let config = MigrateConfig::from_file(&fixtures_dir().join("gf-migrate.toml")).unwrap();

    let mut tables = SourceTables::default();
    for kind in [TableKind::Families, TableKind::Hosts, TableKind::Galls, TableKind::Sources] {
        let path = config.table_path(kind);
        let csv_data = std::fs::read_to_string(&path)
            .unwrap_or_else(|e| panic!("cannot read {}: {e}", path.display()));
        let table = load_table(&kind.to_string(), &csv_data, &config.id_column).unwrap();
        tables.set(kind, table);
    }
    tables
}

/// Records every call so ordering can be checked, and hands out ids like
/// an empty database would.
#[derive(Default)]
struct RecordingDestination {
    calls: Vec<&'static str>,
    families: Vec<String>,
    sources: Vec<String>,
    species: Vec<SpeciesRow>,
    galls: Vec<GallRow>,
    host_edges: Vec<(i64, i64)>,
    source_edges: Vec<(i64, i64)>,
}

fn id_of<T>(rows: &[T], pred: impl Fn(&T) -> bool) -> Option<i64> {
    rows.iter().position(pred).map(|i| i as i64 + 1)
}

impl RecordingDestination {
    fn species_id_of(&self, name: &str, kind: TaxonKind) -> i64 {
        id_of(&self.species, |s| s.name == name && s.kind == kind).unwrap()
    }

    fn first_call(&self, name: &str) -> usize {
        self.calls.iter().position(|c| *c == name).unwrap()
    }
}

impl Destination for RecordingDestination {
    fn verify_schema(&mut self) -> Result<(), MigrateError> {
        self.calls.push("verify_schema");
        Ok(())
    }

    fn clear(&mut self) -> Result<(), MigrateError> {
        self.calls.push("clear");
        Ok(())
    }

    fn insert_family(&mut self, row: &FamilyRow) -> Result<Inserted, MigrateError> {
        self.calls.push("insert_family");
        if let Some(id) = id_of(&self.families, |f| *f == row.name) {
            return Ok(Inserted::Existing(id));
        }
        self.families.push(row.name.clone());
        Ok(Inserted::Created(self.families.len() as i64))
    }

    fn insert_source(&mut self, row: &SourceRow) -> Result<Inserted, MigrateError> {
        self.calls.push("insert_source");
        if let Some(id) = id_of(&self.sources, |s| *s == row.title) {
            return Ok(Inserted::Existing(id));
        }
        self.sources.push(row.title.clone());
        Ok(Inserted::Created(self.sources.len() as i64))
    }

    fn insert_species(&mut self, row: &SpeciesRow) -> Result<Inserted, MigrateError> {
        self.calls.push("insert_species");
        if let Some(id) = id_of(&self.species, |s| s.name == row.name) {
            return Ok(Inserted::Existing(id));
        }
        self.species.push(row.clone());
        Ok(Inserted::Created(self.species.len() as i64))
    }

    fn insert_gall(&mut self, row: &GallRow) -> Result<(), MigrateError> {
        self.calls.push("insert_gall");
        self.galls.push(row.clone());
        Ok(())
    }

    fn insert_host_edge(&mut self, host_id: i64, gall_id: i64) -> Result<(), MigrateError> {
        self.calls.push("insert_host_edge");
        self.host_edges.push((host_id, gall_id));
        Ok(())
    }

    fn insert_species_source(&mut self, species_id: i64, source_id: i64) -> Result<(), MigrateError> {
        self.calls.push("insert_species_source");
        self.source_edges.push((species_id, source_id));
        Ok(())
    }

    fn family_id(&mut self, name: &str) -> Result<Option<i64>, MigrateError> {
        Ok(id_of(&self.families, |f| f == name))
    }

    fn species_id(&mut self, name: &str) -> Result<Option<i64>, MigrateError> {
        Ok(id_of(&self.species, |s| s.name == name))
    }

    fn source_id(&mut self, title: &str) -> Result<Option<i64>, MigrateError> {
        Ok(id_of(&self.sources, |s| s.eq_ignore_ascii_case(title)))
    }

    fn lookup_id(&mut self, _table: LookupTable, _value: &str) -> Result<Option<i64>, MigrateError> {
        Ok(None)
    }
}

#[test]
fn config_file_names_the_exports() {
    let config = MigrateConfig::from_file(&fixtures_dir().join("gf-migrate.toml")).unwrap();
    assert_eq!(
        config.table_path(TableKind::Galls),
        fixtures_dir().join("exports/gall-records.csv")
    );
    assert_eq!(
        config.table_path(TableKind::Hosts),
        fixtures_dir().join("exports/host-species.csv")
    );
}

#[test]
fn steps_run_in_dependency_order() {
    let tables = load_fixture_tables();
    let mut dest = RecordingDestination::default();
    run(&tables, &mut dest).unwrap();

    assert_eq!(dest.calls[0], "verify_schema");
    assert_eq!(dest.calls[1], "clear");

    let order = [
        "insert_family",
        "insert_source",
        "insert_species",
        "insert_gall",
        "insert_host_edge",
        "insert_species_source",
    ];
    for pair in order.windows(2) {
        assert!(
            dest.first_call(pair[0]) < dest.first_call(pair[1]),
            "{} should come before {}",
            pair[0],
            pair[1]
        );
    }
}

#[test]
fn gall_named_like_a_host_is_skipped() {
    let tables = load_fixture_tables();
    let mut dest = RecordingDestination::default();
    let report = run(&tables, &mut dest).unwrap();

    assert_eq!(report.inserted.species, 4);
    assert_eq!(report.inserted.galls, 2);
    assert_eq!(report.unresolved.conflicts, 1);

    // the host keeps its id and still receives its edge
    let alba = dest.species_id_of("Quercus alba", TaxonKind::Host);
    let kingi = dest.species_id_of("Andricus kingi", TaxonKind::Gall);
    assert!(dest.host_edges.contains(&(alba, kingi)));
    assert!(dest.galls.iter().all(|g| g.species_id != alba));
}

#[test]
fn repeated_hosts_give_one_edge() {
    let tables = load_fixture_tables();
    let mut dest = RecordingDestination::default();
    let report = run(&tables, &mut dest).unwrap();

    let lobata = dest.species_id_of("Quercus lobata", TaxonKind::Host);
    let gall = dest.species_id_of("Andricus quercuscalifornicus", TaxonKind::Gall);
    let edges = dest.host_edges.iter().filter(|e| **e == (lobata, gall)).count();
    assert_eq!(edges, 1);
    assert_eq!(report.inserted.host_edges, 2);
}

#[test]
fn quoted_citation_keeps_its_comma() {
    let tables = load_fixture_tables();
    let mut dest = RecordingDestination::default();
    let report = run(&tables, &mut dest).unwrap();

    assert_eq!(report.inserted.source_edges, 2);
    assert_eq!(report.unresolved.sources, 0);
    let gall = dest.species_id_of("Andricus quercuscalifornicus", TaxonKind::Gall);
    assert_eq!(dest.source_edges, vec![(gall, 1), (gall, 2)]);
}

#[test]
fn gall_family_comes_from_genus() {
    let tables = load_fixture_tables();
    let mut dest = RecordingDestination::default();
    run(&tables, &mut dest).unwrap();

    let cynipidae = id_of(&dest.families, |f| f == "Cynipidae");
    let kingi = dest.species.iter().find(|s| s.name == "Andricus kingi").unwrap();
    assert_eq!(kingi.family_id, cynipidae);
    assert_eq!(kingi.genus, "Andricus");
}
