//! the `residents` subcommand - inspect the roster.

use clap::{Args, Subcommand};
use color_eyre::eyre::{Context, Result, bail};

use super::DbArgs;
use bedcheck_db::Database;

/// manage residents
#[derive(Subcommand, Debug)]
pub enum ResidentsCommand {
    /// list all residents
    List(ListResidentsArgs),
}

/// list residents
#[derive(Args, Debug)]
pub struct ListResidentsArgs {
    #[command(flatten)]
    db: DbArgs,

    /// output format (table, json)
    #[arg(short, long, default_value = "table")]
    output: String,
}

impl ResidentsCommand {
    /// run the residents command
    pub async fn run(self) -> Result<()> {
        match self {
            ResidentsCommand::List(args) => list_residents(args).await,
        }
    }
}

async fn list_residents(args: ListResidentsArgs) -> Result<()> {
    let db = args.db.connect().await?;
    let residents = db
        .list_residents()
        .await
        .context("failed to list residents")?;

    match args.output.as_str() {
        "json" => println!("{}", serde_json::to_string_pretty(&residents)?),
        "table" => {
            if residents.is_empty() {
                println!("No residents found.");
                return Ok(());
            }
            println!(
                "{:<12} {:<20} {:<10} {:<12} {:<8}",
                "ID", "NAME", "ROOM", "CLASS", "TRACKED"
            );
            for r in &residents {
                println!(
                    "{:<12} {:<20} {:<10} {:<12} {:<8}",
                    r.external_id,
                    r.name,
                    r.bunk(),
                    r.class_name.as_deref().unwrap_or("-"),
                    if r.tracked { "yes" } else { "no" },
                );
            }
        }
        other => bail!("unknown output format: {other}"),
    }

    Ok(())
}
