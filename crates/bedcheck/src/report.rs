//! the daily attendance report.
//!
//! a left join from the tracked roster onto the day's ledger window:
//! every tracked resident appears exactly once, bound or not, checked
//! in or not. this is the single source for the admin view, the csv
//! export, and the cli table.

use std::collections::HashMap;

use chrono::{FixedOffset, NaiveDate};
use serde::Serialize;

use crate::day;
use bedcheck_db::Database;
use bedcheck_types::{CheckinRecord, CheckinStatus};

/// one resident's row in the daily report.
#[derive(Debug, Clone, Serialize)]
pub struct AttendanceRow {
    /// school-issued student number.
    pub external_id: String,

    /// full name.
    pub name: String,

    /// room number.
    pub room: String,

    /// class or homeroom name.
    pub class_name: Option<String>,

    /// the authoritative record for the day, if any.
    ///
    /// `None` means absent; the newest record in the window wins when
    /// the resident checked in more than once.
    pub checkin: Option<RowCheckin>,
}

/// the slice of a check-in record the report carries.
#[derive(Debug, Clone, Serialize)]
pub struct RowCheckin {
    /// when the check-in was accepted, in the report's local offset.
    pub recorded_at: chrono::DateTime<FixedOffset>,

    /// how the record came to exist.
    pub status: CheckinStatus,
}

impl AttendanceRow {
    /// the status label staff see: "manual", "present", or "absent".
    pub fn status_label(&self) -> &'static str {
        match &self.checkin {
            Some(c) if c.status == CheckinStatus::Manual => "manual",
            Some(_) => "present",
            None => "absent",
        }
    }
}

/// headline counts for the day.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AttendanceSummary {
    /// tracked residents on the roster.
    pub total: u64,

    /// rows carrying a record.
    pub checked_in: u64,

    /// `total - checked_in`.
    pub missing: u64,

    /// check-in percentage, rounded to one decimal. zero for an empty roster.
    pub rate: f64,
}

impl AttendanceSummary {
    fn compute(total: u64, checked_in: u64) -> Self {
        let rate = if total > 0 {
            (checked_in as f64 / total as f64 * 1000.0).round() / 10.0
        } else {
            0.0
        };
        Self {
            total,
            checked_in,
            missing: total - checked_in,
            rate,
        }
    }
}

/// the full report for one local calendar day.
#[derive(Debug, Clone, Serialize)]
pub struct AttendanceReport {
    /// the day the report covers.
    pub day: NaiveDate,

    /// one row per tracked resident, ordered by room then external id.
    pub rows: Vec<AttendanceRow>,

    /// headline counts.
    pub summary: AttendanceSummary,
}

/// build the attendance report for one local day.
///
/// residents with no binding and residents whose device never checked
/// in both land in the report as absent rows; nothing tracked is ever
/// dropped.
pub async fn attendance_report<D: Database>(
    db: &D,
    day: NaiveDate,
    offset: FixedOffset,
) -> Result<AttendanceReport, bedcheck_db::Error> {
    let (start, end) = day::day_window(day, offset);

    let residents = db.list_residents().await?;
    let bindings = db.list_bindings().await?;
    let records = db.list_checkins_between(start, end).await?;

    let token_by_resident: HashMap<_, _> = bindings
        .into_iter()
        .map(|b| (b.resident_id, b.token))
        .collect();

    // records arrive in ascending id order, so the last write per token
    // is the highest-id one - exactly the "latest wins" rule
    let mut latest_by_token: HashMap<String, CheckinRecord> = HashMap::new();
    for record in records {
        latest_by_token.insert(record.token.as_str().to_string(), record);
    }

    let rows: Vec<AttendanceRow> = residents
        .into_iter()
        .filter(|r| r.tracked)
        .map(|resident| {
            let checkin = token_by_resident
                .get(&resident.id)
                .and_then(|token| latest_by_token.get(token.as_str()))
                .map(|record| RowCheckin {
                    recorded_at: record.recorded_at.with_timezone(&offset),
                    status: record.status,
                });
            AttendanceRow {
                external_id: resident.external_id,
                name: resident.name,
                room: resident.room,
                class_name: resident.class_name,
                checkin,
            }
        })
        .collect();

    let total = rows.len() as u64;
    let checked_in = rows.iter().filter(|r| r.checkin.is_some()).count() as u64;

    Ok(AttendanceReport {
        day,
        rows,
        summary: AttendanceSummary::compute(total, checked_in),
    })
}

/// serialize a report to csv for spreadsheet import.
///
/// fields: external id, name, room, class, day, check-in time (empty
/// when absent), status label.
pub fn to_csv(report: &AttendanceReport) -> String {
    let mut out = String::from("external_id,name,room,class,day,checkin_time,status\n");
    for row in &report.rows {
        let time = row
            .checkin
            .as_ref()
            .map(|c| c.recorded_at.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_default();
        let fields = [
            row.external_id.as_str(),
            row.name.as_str(),
            row.room.as_str(),
            row.class_name.as_deref().unwrap_or(""),
            &report.day.to_string(),
            &time,
            row.status_label(),
        ];
        let line: Vec<String> = fields.iter().map(|f| csv_escape(f)).collect();
        out.push_str(&line.join(","));
        out.push('\n');
    }
    out
}

/// quote a csv field when it contains a delimiter, quote, or newline.
fn csv_escape(field: &str) -> String {
    if field.contains(',') || field.contains('"') || field.contains('\n') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bedcheck_db::BedcheckDb;
    use bedcheck_types::{DeviceBinding, DeviceToken, Resident, ResidentId};
    use chrono::{TimeZone, Utc};

    fn taipei() -> FixedOffset {
        FixedOffset::east_opt(8 * 3600).unwrap()
    }

    fn report_day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 1).unwrap()
    }

    async fn tracked_resident(db: &BedcheckDb, external_id: &str, room: &str) -> Resident {
        let mut r = Resident::new(ResidentId(0), external_id, format!("name-{external_id}"), room);
        r.tracked = true;
        db.create_resident(&r).await.unwrap()
    }

    async fn bind(db: &BedcheckDb, resident: &Resident) -> DeviceToken {
        let token = DeviceToken::generate();
        db.bind_device(&DeviceBinding::new(resident.id, token.clone()))
            .await
            .unwrap();
        token
    }

    async fn checkin_at(db: &BedcheckDb, token: &DeviceToken, hour: u32, status: CheckinStatus) {
        // hour is local taipei time on the report day
        let local = report_day().and_hms_opt(hour, 0, 0).unwrap();
        let at = taipei()
            .from_local_datetime(&local)
            .unwrap()
            .with_timezone(&Utc);
        db.record_checkin(&bedcheck_types::CheckinRecord::new(
            token.clone(),
            status,
            at,
        ))
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn test_unbound_resident_listed_as_absent() {
        let db = BedcheckDb::new_in_memory().await.unwrap();
        tracked_resident(&db, "S001", "301").await;

        let report = attendance_report(&db, report_day(), taipei()).await.unwrap();
        assert_eq!(report.rows.len(), 1);
        assert_eq!(report.rows[0].status_label(), "absent");
        assert_eq!(report.summary.total, 1);
        assert_eq!(report.summary.checked_in, 0);
        assert_eq!(report.summary.missing, 1);
        assert_eq!(report.summary.rate, 0.0);
    }

    #[tokio::test]
    async fn test_untracked_resident_not_listed() {
        let db = BedcheckDb::new_in_memory().await.unwrap();
        let r = Resident::new(ResidentId(0), "S099", "day student", "000");
        db.create_resident(&r).await.unwrap();
        tracked_resident(&db, "S001", "301").await;

        let report = attendance_report(&db, report_day(), taipei()).await.unwrap();
        assert_eq!(report.rows.len(), 1);
        assert_eq!(report.rows[0].external_id, "S001");
    }

    #[tokio::test]
    async fn test_present_manual_and_absent_labels() {
        let db = BedcheckDb::new_in_memory().await.unwrap();

        let present = tracked_resident(&db, "S001", "301").await;
        let manual = tracked_resident(&db, "S002", "302").await;
        tracked_resident(&db, "S003", "303").await;

        let present_token = bind(&db, &present).await;
        let manual_token = bind(&db, &manual).await;
        checkin_at(&db, &present_token, 22, CheckinStatus::Success).await;
        checkin_at(&db, &manual_token, 22, CheckinStatus::Manual).await;

        let report = attendance_report(&db, report_day(), taipei()).await.unwrap();
        let labels: Vec<_> = report.rows.iter().map(|r| r.status_label()).collect();
        assert_eq!(labels, vec!["present", "manual", "absent"]);

        assert_eq!(report.summary.total, 3);
        assert_eq!(report.summary.checked_in, 2);
        assert_eq!(report.summary.missing, 1);
        assert_eq!(report.summary.rate, 66.7);
    }

    #[tokio::test]
    async fn test_latest_record_wins_within_day() {
        let db = BedcheckDb::new_in_memory().await.unwrap();
        let resident = tracked_resident(&db, "S001", "301").await;
        let token = bind(&db, &resident).await;

        checkin_at(&db, &token, 21, CheckinStatus::Success).await;
        checkin_at(&db, &token, 23, CheckinStatus::Manual).await;

        let report = attendance_report(&db, report_day(), taipei()).await.unwrap();
        assert_eq!(report.rows[0].status_label(), "manual");
        assert_eq!(report.summary.checked_in, 1);
    }

    #[tokio::test]
    async fn test_record_outside_day_window_ignored() {
        let db = BedcheckDb::new_in_memory().await.unwrap();
        let resident = tracked_resident(&db, "S001", "301").await;
        let token = bind(&db, &resident).await;

        // 23:00 the previous local day
        let local = report_day().pred_opt().unwrap().and_hms_opt(23, 0, 0).unwrap();
        let at = taipei()
            .from_local_datetime(&local)
            .unwrap()
            .with_timezone(&Utc);
        db.record_checkin(&bedcheck_types::CheckinRecord::new(
            token,
            CheckinStatus::Success,
            at,
        ))
        .await
        .unwrap();

        let report = attendance_report(&db, report_day(), taipei()).await.unwrap();
        assert_eq!(report.rows[0].status_label(), "absent");
    }

    #[tokio::test]
    async fn test_rows_ordered_by_room_then_external_id() {
        let db = BedcheckDb::new_in_memory().await.unwrap();
        tracked_resident(&db, "S003", "305").await;
        tracked_resident(&db, "S002", "301").await;
        tracked_resident(&db, "S001", "301").await;

        let report = attendance_report(&db, report_day(), taipei()).await.unwrap();
        let ids: Vec<_> = report.rows.iter().map(|r| r.external_id.as_str()).collect();
        assert_eq!(ids, vec!["S001", "S002", "S003"]);
    }

    #[tokio::test]
    async fn test_empty_roster_rate_is_zero() {
        let db = BedcheckDb::new_in_memory().await.unwrap();
        let report = attendance_report(&db, report_day(), taipei()).await.unwrap();
        assert_eq!(report.summary.total, 0);
        assert_eq!(report.summary.rate, 0.0);
    }

    #[tokio::test]
    async fn test_csv_output() {
        let db = BedcheckDb::new_in_memory().await.unwrap();
        let mut r = Resident::new(ResidentId(0), "S001", "Chen, Wei", "301");
        r.tracked = true;
        r.class_name = Some("IC-1A".to_string());
        let resident = db.create_resident(&r).await.unwrap();
        let token = bind(&db, &resident).await;
        checkin_at(&db, &token, 22, CheckinStatus::Success).await;
        tracked_resident(&db, "S002", "302").await;

        let report = attendance_report(&db, report_day(), taipei()).await.unwrap();
        let csv = to_csv(&report);
        let lines: Vec<_> = csv.lines().collect();

        assert_eq!(lines[0], "external_id,name,room,class,day,checkin_time,status");
        // the comma in the name forces quoting
        assert_eq!(
            lines[1],
            "S001,\"Chen, Wei\",301,IC-1A,2026-03-01,2026-03-01 22:00:00,present"
        );
        assert_eq!(lines[2], "S002,name-S002,302,,2026-03-01,,absent");
    }

    #[test]
    fn test_summary_invariants() {
        for (total, checked_in, rate) in [(3, 1, 33.3), (3, 2, 66.7), (8, 8, 100.0), (1, 0, 0.0)] {
            let s = AttendanceSummary::compute(total, checked_in);
            assert_eq!(s.missing, total - checked_in);
            assert_eq!(s.rate, rate);
        }
    }
}
