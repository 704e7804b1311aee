// gf-migrate - load the gallformers Airtable exports into SQLite

mod exit_codes;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{ArgAction, Parser};
use log::LevelFilter;

use gallformers_io::{load_tables, Session};
use gallformers_recon::config::DEFAULT_CONFIG_FILE;
use gallformers_recon::{MigrateConfig, MigrateError, MigrationReport};

use exit_codes::{migrate_exit_code, EXIT_ERROR, EXIT_INVALID_CONFIG, EXIT_SUCCESS};

#[derive(Parser)]
#[command(name = "gf-migrate")]
#[command(about = "Load the gallformers Airtable CSV exports into the SQLite database")]
#[command(long_version = long_version())]
#[command(version)]
#[command(after_help = "\
Examples:
  gf-migrate
  gf-migrate --database gallformers.sqlite --data-dir data_from_airtable
  gf-migrate --database new.sqlite --init-schema
  gf-migrate --dry-run --json
  gf-migrate --config staging.toml -v")]
struct Cli {
    /// Config file (default: ./gf-migrate.toml when present)
    #[arg(long, short = 'c', env = "GF_MIGRATE_CONFIG", value_name = "TOML")]
    config: Option<PathBuf>,

    /// Destination SQLite database (overrides the config)
    #[arg(long, short = 'd', value_name = "PATH")]
    database: Option<PathBuf>,

    /// Directory holding the CSV exports (overrides the config)
    #[arg(long, value_name = "DIR")]
    data_dir: Option<PathBuf>,

    /// Create missing tables and seed the lookup tables before loading
    #[arg(long)]
    init_schema: bool,

    /// Run the whole migration, then roll it back
    #[arg(long)]
    dry_run: bool,

    /// Print the report as JSON instead of the progress summary
    #[arg(long)]
    json: bool,

    /// More log output (-v info, -vv debug)
    #[arg(long, short = 'v', action = ArgAction::Count)]
    verbose: u8,

    /// Errors only; no progress summary
    #[arg(long, short = 'q', conflicts_with = "verbose")]
    quiet: bool,
}

fn long_version() -> &'static str {
    concat!(
        env!("CARGO_PKG_VERSION"),
        " (", env!("GF_MIGRATE_COMMIT"), ")",
        "\ntarget:  ", env!("GF_MIGRATE_TARGET"),
    )
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    match cmd_migrate(&cli) {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

/// `RUST_LOG` takes precedence over the verbosity flags.
fn init_logging(verbose: u8, quiet: bool) {
    let level = match (quiet, verbose) {
        (true, _) => LevelFilter::Error,
        (false, 0) => LevelFilter::Warn,
        (false, 1) => LevelFilter::Info,
        (false, _) => LevelFilter::Debug,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .format_timestamp(None)
        .parse_default_env()
        .init();
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

impl From<MigrateError> for CliError {
    fn from(err: MigrateError) -> Self {
        let hint = match &err {
            MigrateError::SchemaMismatch { .. } => {
                Some("run with --init-schema to create the missing tables".to_string())
            }
            MigrateError::MissingIdColumn { .. } => {
                Some("set id_column in gf-migrate.toml to the export's record id column".to_string())
            }
            MigrateError::Io(_) => Some("check --data-dir and the [files] table of the config".to_string()),
            _ => None,
        };
        Self { code: migrate_exit_code(&err), message: err.to_string(), hint }
    }
}

/// Explicit `--config` first, then `./gf-migrate.toml`, then built-in defaults.
/// Flags override whatever the file says.
fn resolve_config(cli: &Cli) -> Result<MigrateConfig, CliError> {
    let discovered = Path::new(DEFAULT_CONFIG_FILE);
    let path = match &cli.config {
        Some(path) => Some(path.as_path()),
        None if discovered.is_file() => Some(discovered),
        None => None,
    };

    let mut config = match path {
        Some(path) => {
            log::info!("using config {}", path.display());
            MigrateConfig::from_file(path).map_err(|e| match e {
                // an unreadable config is a config problem, not an input one
                MigrateError::Io(msg) => CliError { code: EXIT_INVALID_CONFIG, message: msg, hint: None },
                other => CliError::from(other),
            })?
        }
        None => MigrateConfig::default(),
    };

    if let Some(database) = &cli.database {
        config.database = database.clone();
    }
    if let Some(data_dir) = &cli.data_dir {
        config.data_dir = data_dir.clone();
    }
    config.validate()?;
    Ok(config)
}

fn cmd_migrate(cli: &Cli) -> Result<(), CliError> {
    let config = resolve_config(cli)?;

    // Every export is read before the database is opened
    let tables = load_tables(&config)?;

    let create = cli.init_schema;
    let mut session = Session::open(&config.database, create).map_err(|e| {
        let err = CliError::from(e);
        if create || config.database.exists() {
            err
        } else {
            err.with_hint("the database does not exist; pass --init-schema to create it")
        }
    })?;
    if create {
        session.init_schema()?;
        log::info!("schema ready in {}", config.database.display());
    }

    let report = session.migrate(&tables, cli.dry_run)?;
    session.close()?;

    if cli.json {
        let json = serde_json::to_string_pretty(&report).map_err(|e| CliError {
            code: EXIT_ERROR,
            message: format!("JSON serialization error: {e}"),
            hint: None,
        })?;
        println!("{json}");
    } else if !cli.quiet {
        print_summary(&report);
    }
    Ok(())
}

fn print_summary(report: &MigrationReport) {
    let n = &report.inserted;
    println!("Added {} families", n.families);
    println!("Added {} sources", n.sources);
    println!("Added {} species", n.species);
    println!("Added {} galls", n.galls);
    println!("Added {} host-gall relationships", n.host_edges);
    println!("Added {} source-gall relationships", n.source_edges);

    let u = &report.unresolved;
    if u.total() > 0 {
        println!(
            "Unresolved: {} families, {} hosts, {} sources, {} lookups, {} name conflicts",
            u.families, u.hosts, u.sources, u.lookups, u.conflicts,
        );
    }
    if report.meta.dry_run {
        println!("Dry run: changes rolled back");
    }
}
