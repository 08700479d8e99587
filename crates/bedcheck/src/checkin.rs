//! the check-in workflow: identity, geofence, evidence, ledger append.
//!
//! business rejections (wrong place, no gps fix, unknown device) are
//! ordinary values here, not errors. only storage faults come back as
//! `Err`, and a rejected attempt never writes a ledger row.

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use bedcheck_db::Database;
use bedcheck_types::{
    CheckinRecord, CheckinStatus, Config, Coordinates, DeviceBinding, DeviceToken, Geofence,
    Resident,
};

/// one inbound check-in attempt, as parsed by the http layer.
#[derive(Debug, Clone)]
pub struct CheckinRequest {
    /// the device token presented with the request.
    pub token: DeviceToken,

    /// submitted latitude, if the form carried a parseable number.
    pub latitude: Option<f64>,

    /// submitted longitude, if the form carried a parseable number.
    pub longitude: Option<f64>,

    /// opaque reference to an uploaded evidence file, if any.
    pub evidence_ref: Option<String>,

    /// remote address the request arrived from.
    pub remote_addr: Option<String>,
}

/// why a check-in attempt was turned away.
///
/// every variant is recoverable from the resident's side; none of them
/// leaves a trace in the ledger.
#[derive(Debug, Clone, PartialEq)]
pub enum Rejection {
    /// the token resolves to nobody. the resident needs their personal link.
    Unauthenticated,

    /// coordinates were missing, unparseable, or out of range.
    InvalidLocation,

    /// valid coordinates, but outside the fence.
    OutOfRange {
        /// computed distance to the fence center, truncated to whole meters.
        distance_meters: i64,
    },

    /// configuration demands evidence and none was attached.
    EvidenceRequired,

    /// an evidence reference was attached but is not a usable identifier.
    EvidenceInvalid,
}

impl Rejection {
    /// stable machine-readable code for api responses.
    pub fn code(&self) -> &'static str {
        match self {
            Rejection::Unauthenticated => "UNAUTHENTICATED",
            Rejection::InvalidLocation => "INVALID_LOCATION",
            Rejection::OutOfRange { .. } => "OUT_OF_RANGE",
            Rejection::EvidenceRequired => "EVIDENCE_REQUIRED",
            Rejection::EvidenceInvalid => "EVIDENCE_INVALID",
        }
    }

    /// the message shown to the resident, in the dormitory's language.
    pub fn message(&self) -> String {
        match self {
            Rejection::Unauthenticated => {
                "無法辨識您的身分，請使用您的專屬連結開啟點名頁面。".to_string()
            }
            Rejection::InvalidLocation => {
                "無法抓取位置資訊，請確認手機 GPS 已開啟並允許瀏覽器讀取位置。".to_string()
            }
            Rejection::OutOfRange { distance_meters } => {
                format!(
                    "點名失敗！偵測到距離宿舍 {} 公尺，請回到宿舍範圍內。",
                    distance_meters
                )
            }
            Rejection::EvidenceRequired => {
                "此次點名需要拍照佐證，請先上傳照片再送出。".to_string()
            }
            Rejection::EvidenceInvalid => "照片資料無效，請重新上傳一次。".to_string(),
        }
    }
}

/// result of processing one check-in attempt.
#[derive(Debug, Clone)]
pub enum CheckinOutcome {
    /// the attempt passed every gate and a record was written.
    Accepted {
        /// the resident the device resolved to.
        resident: Resident,
        /// the stored ledger row, with its assigned id.
        record: CheckinRecord,
        /// distance to the fence center, truncated to whole meters.
        distance_meters: i64,
    },

    /// the attempt was turned away; nothing was written.
    Rejected(Rejection),
}

/// result of a staff manual override.
#[derive(Debug, Clone)]
pub enum OverrideOutcome {
    /// a `MANUAL` record was appended for the resident.
    Recorded {
        /// the resident the override applies to.
        resident: Resident,
        /// the stored ledger row.
        record: CheckinRecord,
    },

    /// no resident carries that external id.
    ResidentNotFound {
        /// the id that failed to match.
        external_id: String,
    },
}

/// the check-in engine: geofence plus evidence policy.
///
/// holds no database handle and no clock; both are passed into each
/// call so tests can run against any store at any simulated instant.
#[derive(Debug, Clone)]
pub struct CheckinEngine {
    fence: Geofence,
    evidence_required: bool,
}

impl CheckinEngine {
    /// build an engine from validated configuration.
    pub fn new(config: &Config) -> Result<Self, bedcheck_types::Error> {
        Ok(Self {
            fence: config.geofence.fence()?,
            evidence_required: config.evidence.required,
        })
    }

    /// build an engine directly from a fence, for tests and embedding.
    pub fn with_fence(fence: Geofence, evidence_required: bool) -> Self {
        Self {
            fence,
            evidence_required,
        }
    }

    /// the fence this engine checks against.
    pub fn fence(&self) -> &Geofence {
        &self.fence
    }

    /// process one check-in attempt.
    ///
    /// gates run in a fixed order: identity, location, fence, evidence.
    /// the first failing gate decides the rejection, and only a fully
    /// accepted attempt touches the ledger.
    pub async fn process<D: Database>(
        &self,
        db: &D,
        now: DateTime<Utc>,
        request: CheckinRequest,
    ) -> Result<CheckinOutcome, bedcheck_db::Error> {
        // identity: the empty token is anonymous without a lookup
        let resident = if request.token.is_empty() {
            None
        } else {
            db.resolve_token(&request.token).await?
        };
        let Some(resident) = resident else {
            return Ok(CheckinOutcome::Rejected(Rejection::Unauthenticated));
        };

        // location: both components present, finite, in wgs84 bounds
        let point = match (request.latitude, request.longitude) {
            (Some(lat), Some(lng)) => Coordinates::new(lat, lng),
            _ => {
                return Ok(CheckinOutcome::Rejected(Rejection::InvalidLocation));
            }
        };
        if !point.is_valid() {
            return Ok(CheckinOutcome::Rejected(Rejection::InvalidLocation));
        }

        // fence, boundary inclusive
        let distance = self.fence.distance_to(point);
        let distance_meters = distance as i64;
        if distance > self.fence.radius_meters {
            info!(
                resident = %resident.external_id,
                distance_meters,
                "check-in outside fence"
            );
            return Ok(CheckinOutcome::Rejected(Rejection::OutOfRange {
                distance_meters,
            }));
        }

        // evidence policy
        if let Some(evidence) = &request.evidence_ref {
            if !is_valid_evidence_ref(evidence) {
                return Ok(CheckinOutcome::Rejected(Rejection::EvidenceInvalid));
            }
        } else if self.evidence_required {
            return Ok(CheckinOutcome::Rejected(Rejection::EvidenceRequired));
        }

        // all gates passed: append the one authoritative row
        let mut record = CheckinRecord::new(request.token, CheckinStatus::Success, now);
        record.location = Some(point);
        record.evidence_ref = request.evidence_ref;
        record.remote_addr = request.remote_addr;
        let record = db.record_checkin(&record).await?;

        info!(
            resident = %resident.external_id,
            record_id = %record.id,
            distance_meters,
            "check-in accepted"
        );

        Ok(CheckinOutcome::Accepted {
            resident,
            record,
            distance_meters,
        })
    }

    /// staff path: record a check-in by hand, skipping every gate.
    ///
    /// a resident with no device binding gets one issued on the spot, so
    /// the `MANUAL` row has a token to hang off and a later link export
    /// hands out the same token.
    pub async fn manual_override<D: Database>(
        &self,
        db: &D,
        now: DateTime<Utc>,
        external_id: &str,
    ) -> Result<OverrideOutcome, bedcheck_db::Error> {
        let Some(resident) = db.get_resident_by_external_id(external_id).await? else {
            warn!(external_id, "manual override for unknown resident");
            return Ok(OverrideOutcome::ResidentNotFound {
                external_id: external_id.to_string(),
            });
        };

        let token = match db.get_binding_for_resident(resident.id).await? {
            Some(binding) => binding.token,
            None => {
                let binding = db
                    .bind_device(&DeviceBinding::new(resident.id, DeviceToken::generate()))
                    .await?;
                info!(
                    resident = %resident.external_id,
                    "issued device binding during manual override"
                );
                binding.token
            }
        };

        let record = db
            .record_checkin(&CheckinRecord::new(token, CheckinStatus::Manual, now))
            .await?;

        info!(
            resident = %resident.external_id,
            record_id = %record.id,
            "manual override recorded"
        );

        Ok(OverrideOutcome::Recorded { resident, record })
    }
}

/// whether an evidence reference is a plain opaque identifier.
///
/// the engine never opens the file; it only refuses references that
/// could traverse out of the storage area.
fn is_valid_evidence_ref(evidence: &str) -> bool {
    !evidence.is_empty()
        && !evidence.contains('/')
        && !evidence.contains('\\')
        && !evidence.contains("..")
}

#[cfg(test)]
mod tests {
    use super::*;
    use bedcheck_db::BedcheckDb;
    use bedcheck_types::{Resident, ResidentId};
    use chrono::TimeZone;

    fn dorm_fence() -> Geofence {
        Geofence::new(
            Coordinates::new(24.998040186562055, 121.34191342114971),
            1000.0,
        )
    }

    fn engine() -> CheckinEngine {
        CheckinEngine::with_fence(dorm_fence(), false)
    }

    fn curfew() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 14, 0, 0).unwrap()
    }

    fn request(token: &DeviceToken, lat: f64, lng: f64) -> CheckinRequest {
        CheckinRequest {
            token: token.clone(),
            latitude: Some(lat),
            longitude: Some(lng),
            evidence_ref: None,
            remote_addr: Some("10.0.0.1".to_string()),
        }
    }

    async fn bound_resident(db: &BedcheckDb, external_id: &str) -> (Resident, DeviceToken) {
        let mut resident = Resident::new(ResidentId(0), external_id, "test resident", "301");
        resident.tracked = true;
        let resident = db.create_resident(&resident).await.unwrap();
        let token = DeviceToken::generate();
        db.bind_device(&DeviceBinding::new(resident.id, token.clone()))
            .await
            .unwrap();
        (resident, token)
    }

    #[tokio::test]
    async fn test_accepted_inside_fence() {
        let db = BedcheckDb::new_in_memory().await.unwrap();
        let (resident, token) = bound_resident(&db, "S001").await;

        // about 500.5m north of center
        let outcome = engine()
            .process(&db, curfew(), request(&token, 25.00254129, 121.34191342114971))
            .await
            .unwrap();

        match outcome {
            CheckinOutcome::Accepted {
                resident: r,
                record,
                distance_meters,
            } => {
                assert_eq!(r.id, resident.id);
                assert_eq!(record.status, CheckinStatus::Success);
                assert_eq!(record.recorded_at, curfew());
                assert_eq!(distance_meters, 500);
                assert_eq!(record.remote_addr.as_deref(), Some("10.0.0.1"));
            }
            other => panic!("expected acceptance, got {:?}", other),
        }
        assert_eq!(db.count_checkins().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_out_of_range_writes_nothing() {
        let db = BedcheckDb::new_in_memory().await.unwrap();
        let (_, token) = bound_resident(&db, "S001").await;

        // about 1801m north of center
        let outcome = engine()
            .process(&db, curfew(), request(&token, 25.014243457, 121.34191342114971))
            .await
            .unwrap();

        match outcome {
            CheckinOutcome::Rejected(Rejection::OutOfRange { distance_meters }) => {
                assert_eq!(distance_meters, 1801);
            }
            other => panic!("expected out-of-range, got {:?}", other),
        }
        assert_eq!(db.count_checkins().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_boundary_is_inclusive() {
        let db = BedcheckDb::new_in_memory().await.unwrap();
        let (_, token) = bound_resident(&db, "S001").await;

        // a point exactly at the center is inside any non-negative radius
        let center = dorm_fence().center;
        let zero_fence = CheckinEngine::with_fence(Geofence::new(center, 0.0), false);
        let outcome = zero_fence
            .process(&db, curfew(), request(&token, center.latitude, center.longitude))
            .await
            .unwrap();
        assert!(matches!(outcome, CheckinOutcome::Accepted { .. }));
    }

    #[tokio::test]
    async fn test_unknown_token_is_unauthenticated() {
        let db = BedcheckDb::new_in_memory().await.unwrap();

        let token = DeviceToken::generate();
        let outcome = engine()
            .process(&db, curfew(), request(&token, 24.998, 121.341))
            .await
            .unwrap();
        assert!(matches!(
            outcome,
            CheckinOutcome::Rejected(Rejection::Unauthenticated)
        ));
        assert_eq!(db.count_checkins().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_empty_token_is_unauthenticated() {
        let db = BedcheckDb::new_in_memory().await.unwrap();

        let token = DeviceToken::new("");
        let outcome = engine()
            .process(&db, curfew(), request(&token, 24.998, 121.341))
            .await
            .unwrap();
        assert!(matches!(
            outcome,
            CheckinOutcome::Rejected(Rejection::Unauthenticated)
        ));
    }

    #[tokio::test]
    async fn test_missing_coordinates_rejected_before_fence() {
        let db = BedcheckDb::new_in_memory().await.unwrap();
        let (_, token) = bound_resident(&db, "S001").await;

        let mut req = request(&token, 0.0, 0.0);
        req.latitude = None;
        let outcome = engine().process(&db, curfew(), req).await.unwrap();
        assert!(matches!(
            outcome,
            CheckinOutcome::Rejected(Rejection::InvalidLocation)
        ));
    }

    #[tokio::test]
    async fn test_out_of_bounds_coordinates_rejected() {
        let db = BedcheckDb::new_in_memory().await.unwrap();
        let (_, token) = bound_resident(&db, "S001").await;

        for (lat, lng) in [(91.0, 0.0), (0.0, 181.0), (f64::NAN, 121.0)] {
            let outcome = engine()
                .process(&db, curfew(), request(&token, lat, lng))
                .await
                .unwrap();
            assert!(
                matches!(outcome, CheckinOutcome::Rejected(Rejection::InvalidLocation)),
                "({lat}, {lng}) should be an invalid location"
            );
        }
        assert_eq!(db.count_checkins().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_evidence_required_when_configured() {
        let db = BedcheckDb::new_in_memory().await.unwrap();
        let (_, token) = bound_resident(&db, "S001").await;
        let engine = CheckinEngine::with_fence(dorm_fence(), true);

        let outcome = engine
            .process(&db, curfew(), request(&token, 24.998040186562055, 121.34191342114971))
            .await
            .unwrap();
        assert!(matches!(
            outcome,
            CheckinOutcome::Rejected(Rejection::EvidenceRequired)
        ));

        let mut with_photo = request(&token, 24.998040186562055, 121.34191342114971);
        with_photo.evidence_ref = Some("photo-42.jpg".to_string());
        let outcome = engine.process(&db, curfew(), with_photo).await.unwrap();
        match outcome {
            CheckinOutcome::Accepted { record, .. } => {
                assert_eq!(record.evidence_ref.as_deref(), Some("photo-42.jpg"));
            }
            other => panic!("expected acceptance, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_traversal_shaped_evidence_rejected() {
        let db = BedcheckDb::new_in_memory().await.unwrap();
        let (_, token) = bound_resident(&db, "S001").await;

        for bad in ["", "../etc/passwd", "a/b.jpg", "a\\b.jpg"] {
            let mut req = request(&token, 24.998040186562055, 121.34191342114971);
            req.evidence_ref = Some(bad.to_string());
            let outcome = engine().process(&db, curfew(), req).await.unwrap();
            assert!(
                matches!(outcome, CheckinOutcome::Rejected(Rejection::EvidenceInvalid)),
                "{bad:?} should be rejected"
            );
        }
        assert_eq!(db.count_checkins().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_resubmission_appends_second_record() {
        let db = BedcheckDb::new_in_memory().await.unwrap();
        let (_, token) = bound_resident(&db, "S001").await;
        let req = request(&token, 24.998040186562055, 121.34191342114971);

        let first = engine().process(&db, curfew(), req.clone()).await.unwrap();
        let second = engine().process(&db, curfew(), req).await.unwrap();

        let (CheckinOutcome::Accepted { record: a, .. }, CheckinOutcome::Accepted { record: b, .. }) =
            (first, second)
        else {
            panic!("both submissions should be accepted");
        };
        assert!(b.id > a.id);
        assert_eq!(db.count_checkins().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_manual_override_for_bound_resident() {
        let db = BedcheckDb::new_in_memory().await.unwrap();
        let (resident, token) = bound_resident(&db, "S001").await;

        let outcome = engine()
            .manual_override(&db, curfew(), "S001")
            .await
            .unwrap();
        match outcome {
            OverrideOutcome::Recorded { resident: r, record } => {
                assert_eq!(r.id, resident.id);
                assert_eq!(record.status, CheckinStatus::Manual);
                assert_eq!(record.token, token);
                assert!(record.location.is_none());
            }
            other => panic!("expected recorded override, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_manual_override_issues_binding_when_missing() {
        let db = BedcheckDb::new_in_memory().await.unwrap();
        let mut resident = Resident::new(ResidentId(0), "S002", "unbound resident", "302");
        resident.tracked = true;
        let resident = db.create_resident(&resident).await.unwrap();

        let outcome = engine()
            .manual_override(&db, curfew(), "S002")
            .await
            .unwrap();
        let OverrideOutcome::Recorded { record, .. } = outcome else {
            panic!("expected recorded override");
        };

        // the issued binding is the one the record hangs off
        let binding = db
            .get_binding_for_resident(resident.id)
            .await
            .unwrap()
            .expect("binding should have been issued");
        assert_eq!(binding.token, record.token);
    }

    #[tokio::test]
    async fn test_manual_override_unknown_resident() {
        let db = BedcheckDb::new_in_memory().await.unwrap();

        let outcome = engine()
            .manual_override(&db, curfew(), "NOBODY")
            .await
            .unwrap();
        assert!(matches!(
            outcome,
            OverrideOutcome::ResidentNotFound { external_id } if external_id == "NOBODY"
        ));
        assert_eq!(db.count_checkins().await.unwrap(), 0);
    }

    #[test]
    fn test_rejection_codes_and_messages() {
        let rej = Rejection::OutOfRange {
            distance_meters: 1001,
        };
        assert_eq!(rej.code(), "OUT_OF_RANGE");
        assert!(rej.message().contains("1001"));
        assert_eq!(Rejection::Unauthenticated.code(), "UNAUTHENTICATED");
        assert_eq!(Rejection::InvalidLocation.code(), "INVALID_LOCATION");
        assert_eq!(Rejection::EvidenceRequired.code(), "EVIDENCE_REQUIRED");
        assert_eq!(Rejection::EvidenceInvalid.code(), "EVIDENCE_INVALID");
    }
}
