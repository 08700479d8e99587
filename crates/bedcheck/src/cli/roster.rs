//! the `roster` subcommand - roster sync, links, and install profiles.

use std::path::PathBuf;

use clap::{Args, Subcommand};
use color_eyre::eyre::{Context, Result};

use super::DbArgs;
use crate::profiles;
use crate::roster::{self, RosterEntry};

/// manage the roster and device bindings
#[derive(Subcommand, Debug)]
pub enum RosterCommand {
    /// upsert roster entries from a json file and issue missing bindings
    Sync(SyncArgs),

    /// export each bound resident's personal check-in link as csv
    Links(LinksArgs),

    /// write ios/android install profiles for bound residents
    Profiles(ProfilesArgs),
}

/// sync the roster from a json file
#[derive(Args, Debug)]
pub struct SyncArgs {
    #[command(flatten)]
    db: DbArgs,

    /// roster file: a json array of roster entries
    #[arg(short, long)]
    file: PathBuf,
}

/// export personal links
#[derive(Args, Debug)]
pub struct LinksArgs {
    #[command(flatten)]
    db: DbArgs,

    /// override the configured server url
    #[arg(long)]
    server_url: Option<String>,
}

/// write install profiles
#[derive(Args, Debug)]
pub struct ProfilesArgs {
    #[command(flatten)]
    db: DbArgs,

    /// directory to write the profile files into
    #[arg(long, default_value = "student_profiles")]
    out_dir: PathBuf,

    /// override the configured server url
    #[arg(long)]
    server_url: Option<String>,
}

impl RosterCommand {
    /// run the roster command
    pub async fn run(self) -> Result<()> {
        match self {
            RosterCommand::Sync(args) => sync(args).await,
            RosterCommand::Links(args) => links(args).await,
            RosterCommand::Profiles(args) => write_profiles(args).await,
        }
    }
}

async fn sync(args: SyncArgs) -> Result<()> {
    let content = std::fs::read_to_string(&args.file)
        .with_context(|| format!("failed to read roster file: {:?}", args.file))?;
    let entries: Vec<RosterEntry> =
        serde_json::from_str(&content).context("failed to parse roster file")?;

    let db = args.db.connect().await?;
    let report = roster::sync_roster(&db, &entries)
        .await
        .context("roster sync failed")?;

    println!(
        "Roster synced: {} created, {} updated, {} bindings issued.",
        report.created, report.updated, report.bindings_issued
    );
    Ok(())
}

async fn links(args: LinksArgs) -> Result<()> {
    let config = args.db.load_config()?;
    let server_url = args.server_url.unwrap_or(config.server_url.clone());

    let db = args.db.connect().await?;
    let csv = roster::export_links(&db, &server_url)
        .await
        .context("failed to export links")?;

    print!("{csv}");
    Ok(())
}

async fn write_profiles(args: ProfilesArgs) -> Result<()> {
    let config = args.db.load_config()?;
    let server_url = args.server_url.unwrap_or(config.server_url.clone());

    let db = args.db.connect().await?;
    let report = profiles::write_profiles(&db, &server_url, &args.out_dir)
        .await
        .context("failed to write profiles")?;

    println!(
        "Wrote {} files for {} residents to {:?}.",
        report.files, report.residents, args.out_dir
    );
    Ok(())
}
