//! cli subcommands for bedcheck.
//!
//! - `bedcheck serve` - run the check-in server
//! - `bedcheck roster sync` - upsert the roster and issue device bindings
//! - `bedcheck roster links` - export personal check-in links
//! - `bedcheck roster profiles` - write ios/android install profiles
//! - `bedcheck report` - print the daily attendance report
//! - `bedcheck residents list` - list the roster
//! - `bedcheck override` - record a check-in by hand

mod report;
mod residents;
mod roster;
mod serve;

pub use report::ReportCommand;
pub use residents::ResidentsCommand;
pub use roster::RosterCommand;
pub use serve::ServeCommand;

use std::path::{Path, PathBuf};

use chrono::Utc;
use clap::{Args, Parser, Subcommand};
use color_eyre::eyre::{Context, Result, bail};
use tracing::debug;

use crate::checkin::{CheckinEngine, OverrideOutcome};
use bedcheck_db::BedcheckDb;
use bedcheck_types::{Config, DatabaseConfig};

/// default config file search paths (in order of priority).
const CONFIG_SEARCH_PATHS: &[&str] = &[
    "/etc/bedcheck/config.toml",
    "~/.config/bedcheck/config.toml",
    "./config.toml",
];

/// bedcheck - geofenced dormitory check-in server
#[derive(Parser, Debug)]
#[command(name = "bedcheck")]
#[command(about = "Geofenced dormitory check-in server", long_about = None)]
#[command(version)]
pub struct Cli {
    /// the subcommand to run.
    #[command(subcommand)]
    pub command: Command,
}

/// top-level commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// run the check-in server
    Serve(ServeCommand),

    /// manage the roster and device bindings
    #[command(subcommand)]
    Roster(RosterCommand),

    /// print the daily attendance report
    Report(ReportCommand),

    /// manage residents
    #[command(subcommand)]
    Residents(ResidentsCommand),

    /// record a check-in by hand for one resident
    Override(OverrideCommand),
}

/// shared config/database arguments for the offline subcommands.
#[derive(Args, Debug)]
pub struct DbArgs {
    /// path to config file (toml format)
    #[arg(short, long, env = "BEDCHECK_CONFIG")]
    pub config: Option<PathBuf>,

    /// database url (sqlite: or postgres://)
    #[arg(long, env = "BEDCHECK_DATABASE_URL")]
    pub database_url: Option<String>,
}

impl DbArgs {
    /// load configuration: defaults, then config file, then cli overrides.
    pub fn load_config(&self) -> Result<Config> {
        let mut config = load_config_file(self.config.as_ref())?.unwrap_or_default();
        if let Some(url) = &self.database_url {
            config.database = parse_database_url(url)?;
        }
        Ok(config)
    }

    /// connect to the configured database.
    pub async fn connect(&self) -> Result<BedcheckDb> {
        let config = self.load_config()?;
        BedcheckDb::new(&config)
            .await
            .context("failed to open database")
    }
}

/// find and load a config file, returning none if no config file is found.
///
/// an explicitly given path must exist; the search paths are optional.
pub(crate) fn load_config_file(config_path: Option<&PathBuf>) -> Result<Option<Config>> {
    if let Some(path) = config_path {
        return Ok(Some(read_config(path)?));
    }

    for path_str in CONFIG_SEARCH_PATHS {
        let path = expand_tilde(path_str);
        if path.exists() {
            debug!("found config file at {:?}", path);
            return Ok(Some(read_config(&path)?));
        }
    }

    Ok(None)
}

fn read_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config file: {:?}", path))?;
    toml::from_str(&content).with_context(|| format!("failed to parse config file: {:?}", path))
}

fn expand_tilde(path_str: &str) -> PathBuf {
    match path_str.strip_prefix("~/") {
        Some(rest) => dirs::home_dir()
            .map(|home| home.join(rest))
            .unwrap_or_else(|| PathBuf::from(path_str)),
        None => PathBuf::from(path_str),
    }
}

/// turn a database url into a database config section.
pub(crate) fn parse_database_url(url: &str) -> Result<DatabaseConfig> {
    let mut config = DatabaseConfig::default();
    if let Some(path) = url.strip_prefix("sqlite://").or_else(|| url.strip_prefix("sqlite:")) {
        config.db_type = "sqlite".to_string();
        config.connection_string = path.to_string();
    } else if url.starts_with("postgres://") || url.starts_with("postgresql://") {
        config.db_type = "postgres".to_string();
        config.connection_string = url.to_string();
    } else if url.contains("://") {
        bail!("unsupported database url: {url}");
    } else {
        // a bare path means a sqlite file
        config.db_type = "sqlite".to_string();
        config.connection_string = url.to_string();
    }
    Ok(config)
}

/// record a check-in by hand for one resident
#[derive(Args, Debug)]
pub struct OverrideCommand {
    #[command(flatten)]
    db: DbArgs,

    /// student number of the resident to mark present
    external_id: String,
}

impl OverrideCommand {
    /// run the override command
    pub async fn run(self) -> Result<()> {
        let config = self.db.load_config()?;
        let db = self.db.connect().await?;
        let engine = CheckinEngine::new(&config)?;

        let outcome = engine
            .manual_override(&db, Utc::now(), &self.external_id)
            .await
            .context("failed to record manual override")?;

        match outcome {
            OverrideOutcome::Recorded { resident, record } => {
                println!(
                    "Recorded manual check-in for {} ({}) at {}",
                    resident.name, resident.external_id, record.recorded_at
                );
                Ok(())
            }
            OverrideOutcome::ResidentNotFound { external_id } => {
                bail!("no resident with external id '{}'", external_id)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_sqlite_urls() {
        let config = parse_database_url("sqlite:///var/lib/bedcheck/db.sqlite").unwrap();
        assert_eq!(config.db_type, "sqlite");
        assert_eq!(config.connection_string, "/var/lib/bedcheck/db.sqlite");

        let config = parse_database_url("sqlite:dorm.db").unwrap();
        assert_eq!(config.connection_string, "dorm.db");

        let config = parse_database_url("./dorm.db").unwrap();
        assert_eq!(config.db_type, "sqlite");
        assert_eq!(config.connection_string, "./dorm.db");
    }

    #[test]
    fn test_parse_postgres_url() {
        let config = parse_database_url("postgres://user:pw@localhost/bedcheck").unwrap();
        assert_eq!(config.db_type, "postgres");
        assert_eq!(
            config.connection_string,
            "postgres://user:pw@localhost/bedcheck"
        );
    }

    #[test]
    fn test_unknown_scheme_rejected() {
        assert!(parse_database_url("mysql://localhost/db").is_err());
    }
}
