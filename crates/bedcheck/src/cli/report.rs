//! the `report` subcommand - print the daily attendance report.

use chrono::{NaiveDate, Utc};
use clap::Args;
use color_eyre::eyre::{Context, Result, bail};

use super::DbArgs;
use crate::day;
use crate::report::attendance_report;

/// print the daily attendance report
#[derive(Args, Debug)]
pub struct ReportCommand {
    #[command(flatten)]
    db: DbArgs,

    /// day to report on (YYYY-MM-DD); today when omitted
    #[arg(long)]
    day: Option<String>,

    /// output format (table, json, csv)
    #[arg(short, long, default_value = "table")]
    output: String,
}

impl ReportCommand {
    /// run the report command
    pub async fn run(self) -> Result<()> {
        let config = self.db.load_config()?;
        let offset = config.display.offset()?;

        let day = match &self.day {
            Some(raw) => NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .with_context(|| format!("invalid day: {raw}"))?,
            None => day::local_date(Utc::now(), offset),
        };

        let db = self.db.connect().await?;
        let report = attendance_report(&db, day, offset)
            .await
            .context("failed to build report")?;

        match self.output.as_str() {
            "json" => println!("{}", serde_json::to_string_pretty(&report)?),
            "csv" => print!("{}", crate::report::to_csv(&report)),
            "table" => {
                println!("Attendance for {}", report.day);
                println!(
                    "{:<12} {:<20} {:<8} {:<12} {:<10} {:<10}",
                    "ID", "NAME", "ROOM", "CLASS", "TIME", "STATUS"
                );
                for row in &report.rows {
                    let time = row
                        .checkin
                        .as_ref()
                        .map(|c| c.recorded_at.format("%H:%M:%S").to_string())
                        .unwrap_or_default();
                    println!(
                        "{:<12} {:<20} {:<8} {:<12} {:<10} {:<10}",
                        row.external_id,
                        row.name,
                        row.room,
                        row.class_name.as_deref().unwrap_or("-"),
                        time,
                        row.status_label(),
                    );
                }
                println!(
                    "\n{} tracked, {} checked in, {} missing ({}%).",
                    report.summary.total,
                    report.summary.checked_in,
                    report.summary.missing,
                    report.summary.rate,
                );
            }
            other => bail!("unknown output format: {other}"),
        }

        Ok(())
    }
}
