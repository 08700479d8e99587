//! roster synchronization and personal-link export.
//!
//! the school's roster is the source of truth for who boards. sync is
//! an idempotent upsert keyed on the external id; residents are never
//! deleted, only updated. after an upsert every tracked resident who
//! lacks a device binding gets exactly one issued.

use serde::Deserialize;
use tracing::info;

use bedcheck_db::Database;
use bedcheck_types::{DeviceBinding, DeviceToken, Resident, ResidentId};

/// one roster row as handed over by the importer.
#[derive(Debug, Clone, Deserialize)]
pub struct RosterEntry {
    /// school-issued student number, the upsert key.
    pub external_id: String,

    /// full name.
    pub name: String,

    /// room number.
    pub room: String,

    /// bed number within the room.
    #[serde(default)]
    pub bed: Option<String>,

    /// class or homeroom name.
    #[serde(default)]
    pub class_name: Option<String>,

    /// nationality.
    #[serde(default)]
    pub nationality: Option<String>,

    /// gender as recorded on the roster.
    #[serde(default)]
    pub gender: Option<String>,

    /// whether this resident takes part in nightly check-in.
    #[serde(default = "default_tracked")]
    pub tracked: bool,
}

fn default_tracked() -> bool {
    true
}

/// what a sync run did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RosterSyncReport {
    /// residents newly created.
    pub created: u64,

    /// residents whose roster fields were refreshed.
    pub updated: u64,

    /// device bindings issued to tracked residents that had none.
    pub bindings_issued: u64,
}

/// upsert roster entries and issue missing device bindings.
///
/// safe to re-run: a second pass with the same entries updates rows in
/// place and issues nothing new. existing bindings are never touched,
/// so re-syncing can't log anyone out of their phone.
pub async fn sync_roster<D: Database>(
    db: &D,
    entries: &[RosterEntry],
) -> Result<RosterSyncReport, bedcheck_db::Error> {
    let mut report = RosterSyncReport::default();

    for entry in entries {
        match db.get_resident_by_external_id(&entry.external_id).await? {
            Some(mut existing) => {
                existing.name = entry.name.clone();
                existing.room = entry.room.clone();
                existing.bed = entry.bed.clone();
                existing.class_name = entry.class_name.clone();
                existing.nationality = entry.nationality.clone();
                existing.gender = entry.gender.clone();
                existing.tracked = entry.tracked;
                db.update_resident(&existing).await?;
                report.updated += 1;
            }
            None => {
                let mut resident =
                    Resident::new(ResidentId(0), &entry.external_id, &entry.name, &entry.room);
                resident.bed = entry.bed.clone();
                resident.class_name = entry.class_name.clone();
                resident.nationality = entry.nationality.clone();
                resident.gender = entry.gender.clone();
                resident.tracked = entry.tracked;
                db.create_resident(&resident).await?;
                report.created += 1;
            }
        }
    }

    // binding issuance runs over the whole roster, not just this batch,
    // so a resident tracked by an earlier sync still gets a key
    for resident in db.list_residents().await? {
        if !resident.tracked {
            continue;
        }
        if db.get_binding_for_resident(resident.id).await?.is_none() {
            db.bind_device(&DeviceBinding::new(resident.id, DeviceToken::generate()))
                .await?;
            info!(resident = %resident.external_id, "issued device binding");
            report.bindings_issued += 1;
        }
    }

    info!(
        created = report.created,
        updated = report.updated,
        bindings_issued = report.bindings_issued,
        "roster sync complete"
    );

    Ok(report)
}

/// a resident's personal check-in link.
pub fn personal_link(server_url: &str, token: &DeviceToken) -> String {
    format!("{}/?token={}", server_url.trim_end_matches('/'), token)
}

/// export the personal-link list for every bound tracked resident.
///
/// csv with the header the dorm office's spreadsheet expects; one row
/// per resident, ordered like the report (room, then external id).
pub async fn export_links<D: Database>(
    db: &D,
    server_url: &str,
) -> Result<String, bedcheck_db::Error> {
    let mut out = String::from("學號,姓名,專屬連結\n");

    for resident in db.list_residents().await? {
        if !resident.tracked {
            continue;
        }
        if let Some(binding) = db.get_binding_for_resident(resident.id).await? {
            out.push_str(&format!(
                "{},{},{}\n",
                resident.external_id,
                resident.name,
                personal_link(server_url, &binding.token)
            ));
        }
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bedcheck_db::BedcheckDb;

    fn entry(external_id: &str, room: &str) -> RosterEntry {
        RosterEntry {
            external_id: external_id.to_string(),
            name: format!("name-{external_id}"),
            room: room.to_string(),
            bed: Some("1".to_string()),
            class_name: Some("IC-1A".to_string()),
            nationality: Some("VN".to_string()),
            gender: Some("男".to_string()),
            tracked: true,
        }
    }

    #[tokio::test]
    async fn test_sync_creates_then_updates() {
        let db = BedcheckDb::new_in_memory().await.unwrap();

        let first = sync_roster(&db, &[entry("S001", "301"), entry("S002", "302")])
            .await
            .unwrap();
        assert_eq!(first.created, 2);
        assert_eq!(first.updated, 0);
        assert_eq!(first.bindings_issued, 2);

        // resident moved rooms; rerun updates in place
        let mut moved = entry("S001", "305");
        moved.name = "renamed".to_string();
        let second = sync_roster(&db, &[moved]).await.unwrap();
        assert_eq!(second.created, 0);
        assert_eq!(second.updated, 1);
        assert_eq!(second.bindings_issued, 0);

        let resident = db
            .get_resident_by_external_id("S001")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(resident.room, "305");
        assert_eq!(resident.name, "renamed");
    }

    #[tokio::test]
    async fn test_resync_preserves_bindings() {
        let db = BedcheckDb::new_in_memory().await.unwrap();

        sync_roster(&db, &[entry("S001", "301")]).await.unwrap();
        let resident = db
            .get_resident_by_external_id("S001")
            .await
            .unwrap()
            .unwrap();
        let before = db
            .get_binding_for_resident(resident.id)
            .await
            .unwrap()
            .unwrap();

        sync_roster(&db, &[entry("S001", "301")]).await.unwrap();
        let after = db
            .get_binding_for_resident(resident.id)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(before.token, after.token);
    }

    #[tokio::test]
    async fn test_untracked_residents_get_no_binding() {
        let db = BedcheckDb::new_in_memory().await.unwrap();

        let mut day_student = entry("S009", "000");
        day_student.tracked = false;
        let report = sync_roster(&db, &[day_student]).await.unwrap();
        assert_eq!(report.bindings_issued, 0);

        let resident = db
            .get_resident_by_external_id("S009")
            .await
            .unwrap()
            .unwrap();
        assert!(
            db.get_binding_for_resident(resident.id)
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_link_export() {
        let db = BedcheckDb::new_in_memory().await.unwrap();
        sync_roster(&db, &[entry("S001", "301")]).await.unwrap();

        let csv = export_links(&db, "https://dorm.example.com/").await.unwrap();
        let lines: Vec<_> = csv.lines().collect();
        assert_eq!(lines[0], "學號,姓名,專屬連結");
        assert!(lines[1].starts_with("S001,name-S001,https://dorm.example.com/?token="));
    }

    #[test]
    fn test_roster_entry_from_json() {
        // a minimal row defaults to tracked with the optionals empty
        let entry: RosterEntry = serde_json::from_str(
            r#"{"external_id": "S001", "name": "Chen Wei", "room": "301"}"#,
        )
        .unwrap();
        assert!(entry.tracked);
        assert!(entry.bed.is_none());
    }
}
