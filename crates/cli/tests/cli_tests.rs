// Binary tests for gf-migrate: exit codes, stdout contract, config discovery.
//
// Run with: cargo test -p gallformers-migrate --test cli_tests

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use rusqlite::Connection;
use tempfile::tempdir;

fn fixture_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../io/tests/fixtures/airtable")
}

fn gf_migrate(cwd: &Path) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_gf-migrate"));
    cmd.current_dir(cwd)
        .env_remove("GF_MIGRATE_CONFIG")
        .env_remove("RUST_LOG");
    cmd
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

fn count(db: &Path, table: &str) -> i64 {
    let conn = Connection::open(db).unwrap();
    conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |r| r.get(0))
        .unwrap()
}

#[test]
fn init_schema_and_load() {
    let dir = tempdir().unwrap();
    let db = dir.path().join("gallformers.sqlite");

    let output = gf_migrate(dir.path())
        .arg("--database")
        .arg(&db)
        .arg("--data-dir")
        .arg(fixture_dir())
        .arg("--init-schema")
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(0), "stderr: {}", stderr(&output));
    let out = stdout(&output);
    assert!(out.contains("Added 4 families"), "{out}");
    assert!(out.contains("Added 6 species"), "{out}");
    assert!(out.contains("Added 3 host-gall relationships"), "{out}");
    assert!(out.contains("Unresolved: 1 families, 1 hosts, 1 sources, 2 lookups, 0 name conflicts"));

    assert_eq!(count(&db, "species"), 6);
    assert_eq!(count(&db, "gall"), 3);
}

#[test]
fn unresolved_names_are_warned_on_stderr() {
    let dir = tempdir().unwrap();
    let db = dir.path().join("gallformers.sqlite");

    let output = gf_migrate(dir.path())
        .arg("--database")
        .arg(&db)
        .arg("--data-dir")
        .arg(fixture_dir())
        .arg("--init-schema")
        .output()
        .unwrap();

    assert!(output.status.success());
    let err = stderr(&output);
    assert!(err.contains("Quercus coccinea"), "{err}");
    assert!(err.contains("Missing Source"), "{err}");
    assert!(!stdout(&output).contains("WARN"));
}

#[test]
fn json_report_is_a_single_value() {
    let dir = tempdir().unwrap();
    let db = dir.path().join("gallformers.sqlite");

    let output = gf_migrate(dir.path())
        .arg("--database")
        .arg(&db)
        .arg("--data-dir")
        .arg(fixture_dir())
        .args(["--init-schema", "--json"])
        .output()
        .unwrap();

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let report: serde_json::Value = serde_json::from_str(stdout(&output).trim()).unwrap();
    assert_eq!(report["inserted"]["families"], 4);
    assert_eq!(report["inserted"]["galls"], 3);
    assert_eq!(report["unresolved"]["lookups"], 2);
    assert_eq!(report["meta"]["dry_run"], false);
}

#[test]
fn dry_run_writes_nothing() {
    let dir = tempdir().unwrap();
    let db = dir.path().join("gallformers.sqlite");

    let output = gf_migrate(dir.path())
        .arg("--database")
        .arg(&db)
        .arg("--data-dir")
        .arg(fixture_dir())
        .args(["--init-schema", "--dry-run"])
        .output()
        .unwrap();

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let out = stdout(&output);
    assert!(out.contains("Added 6 species"));
    assert!(out.contains("Dry run"));
    assert_eq!(count(&db, "species"), 0);
    // schema creation is outside the migration transaction
    assert_eq!(count(&db, "alignment"), 4);
}

#[test]
fn quiet_prints_nothing_on_success() {
    let dir = tempdir().unwrap();
    let db = dir.path().join("gallformers.sqlite");

    let output = gf_migrate(dir.path())
        .arg("--database")
        .arg(&db)
        .arg("--data-dir")
        .arg(fixture_dir())
        .args(["--init-schema", "-q"])
        .output()
        .unwrap();

    assert!(output.status.success());
    assert!(stdout(&output).is_empty());
    assert!(stderr(&output).is_empty());
}

#[test]
fn missing_database_exits_6_with_hint() {
    let dir = tempdir().unwrap();
    let db = dir.path().join("absent.sqlite");

    let output = gf_migrate(dir.path())
        .arg("--database")
        .arg(&db)
        .arg("--data-dir")
        .arg(fixture_dir())
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(6));
    assert!(stderr(&output).contains("--init-schema"));
    assert!(!db.exists());
}

#[test]
fn empty_database_is_schema_mismatch() {
    let dir = tempdir().unwrap();
    let db = dir.path().join("empty.sqlite");
    Connection::open(&db)
        .unwrap()
        .execute_batch("CREATE TABLE unrelated (x INTEGER);")
        .unwrap();

    let output = gf_migrate(dir.path())
        .arg("--database")
        .arg(&db)
        .arg("--data-dir")
        .arg(fixture_dir())
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(5), "stderr: {}", stderr(&output));
    assert!(stderr(&output).contains("family"));
}

#[test]
fn missing_exports_exit_4() {
    let dir = tempdir().unwrap();

    let output = gf_migrate(dir.path())
        .arg("--database")
        .arg(dir.path().join("gallformers.sqlite"))
        .arg("--data-dir")
        .arg(dir.path().join("nowhere"))
        .arg("--init-schema")
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(4));
    // inputs are read before the database is touched
    assert!(!dir.path().join("gallformers.sqlite").exists());
}

#[test]
fn invalid_config_exits_3() {
    let dir = tempdir().unwrap();
    let config = dir.path().join("bad.toml");
    std::fs::write(&config, "databse = \"typo.sqlite\"\n").unwrap();

    let output = gf_migrate(dir.path()).arg("--config").arg(&config).output().unwrap();

    assert_eq!(output.status.code(), Some(3));
}

#[test]
fn unreadable_config_exits_3() {
    let dir = tempdir().unwrap();

    let output = gf_migrate(dir.path())
        .arg("--config")
        .arg(dir.path().join("missing.toml"))
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(3));
}

#[test]
fn discovers_config_in_working_directory() {
    let dir = tempdir().unwrap();
    let config = format!(
        "database = \"from-config.sqlite\"\ndata_dir = {:?}\n",
        fixture_dir().to_string_lossy()
    );
    std::fs::write(dir.path().join("gf-migrate.toml"), config).unwrap();

    let output = gf_migrate(dir.path()).arg("--init-schema").output().unwrap();

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert_eq!(count(&dir.path().join("from-config.sqlite"), "family"), 4);
}

#[test]
fn flags_override_config() {
    let dir = tempdir().unwrap();
    let config = format!(
        "database = \"from-config.sqlite\"\ndata_dir = {:?}\n",
        fixture_dir().to_string_lossy()
    );
    std::fs::write(dir.path().join("gf-migrate.toml"), config).unwrap();
    let db = dir.path().join("from-flag.sqlite");

    let output = gf_migrate(dir.path())
        .arg("--database")
        .arg(&db)
        .arg("--init-schema")
        .output()
        .unwrap();

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(db.exists());
    assert!(!dir.path().join("from-config.sqlite").exists());
}

#[test]
fn quiet_conflicts_with_verbose() {
    let dir = tempdir().unwrap();
    let output = gf_migrate(dir.path()).args(["-q", "-v"]).output().unwrap();
    assert_eq!(output.status.code(), Some(2));
}
