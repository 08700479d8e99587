//! shared test utilities for the http surface tests

#![allow(dead_code)] // Test utilities may not all be used in every test file

use axum::{
    Router,
    body::Body,
    http::{Request, Response, header},
};
use tower::ServiceExt;

use bedcheck::create_app;
use bedcheck_db::{BedcheckDb, Database};
use bedcheck_types::{Config, DeviceBinding, DeviceToken, Resident, ResidentId};

/// the staff key every fixture is configured with.
pub const STAFF_KEY: &str = "test-staff-key";

/// test fixture: in-memory database plus the wired router.
pub struct TestApp {
    pub db: BedcheckDb,
    pub app: Router,
}

impl TestApp {
    /// fixture with the default dormitory fence (1000m) and a staff key.
    pub async fn new() -> Self {
        let mut config = Config::default();
        config.staff_key = Some(STAFF_KEY.to_string());
        Self::with_config(config).await
    }

    /// fixture with custom configuration.
    pub async fn with_config(config: Config) -> Self {
        let db = BedcheckDb::new_in_memory()
            .await
            .expect("failed to create in-memory database");
        let app = create_app(db.clone(), config).expect("failed to build app");
        Self { db, app }
    }

    /// create a tracked resident bound to the given token.
    pub async fn bound_resident(
        &self,
        external_id: &str,
        name: &str,
        room: &str,
        token: &str,
    ) -> Resident {
        let mut resident = Resident::new(ResidentId(0), external_id, name, room);
        resident.tracked = true;
        let resident = self.db.create_resident(&resident).await.unwrap();
        self.db
            .bind_device(&DeviceBinding::new(resident.id, DeviceToken::new(token)))
            .await
            .unwrap();
        resident
    }

    /// create a tracked resident with no device binding.
    pub async fn unbound_resident(&self, external_id: &str, name: &str, room: &str) -> Resident {
        let mut resident = Resident::new(ResidentId(0), external_id, name, room);
        resident.tracked = true;
        self.db.create_resident(&resident).await.unwrap()
    }

    /// GET a path.
    pub async fn get(&self, uri: &str) -> Response<Body> {
        let request = Request::builder()
            .method("GET")
            .uri(uri)
            .body(Body::empty())
            .unwrap();
        self.app.clone().oneshot(request).await.unwrap()
    }

    /// GET a path with a staff bearer token.
    pub async fn get_as_staff(&self, uri: &str, key: &str) -> Response<Body> {
        let request = Request::builder()
            .method("GET")
            .uri(uri)
            .header(header::AUTHORIZATION, format!("Bearer {key}"))
            .body(Body::empty())
            .unwrap();
        self.app.clone().oneshot(request).await.unwrap()
    }

    /// POST an urlencoded check-in form.
    pub async fn post_checkin(&self, uri: &str, form: &str) -> Response<Body> {
        let request = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(form.to_string()))
            .unwrap();
        self.app.clone().oneshot(request).await.unwrap()
    }

    /// POST a json body with a staff bearer token.
    pub async fn post_json_as_staff(&self, uri: &str, key: &str, body: &str) -> Response<Body> {
        let request = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::AUTHORIZATION, format!("Bearer {key}"))
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        self.app.clone().oneshot(request).await.unwrap()
    }
}

/// read a response body as json.
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("failed to read body");
    serde_json::from_slice(&bytes).expect("body should be json")
}

/// read a response body as a string.
pub async fn body_string(response: Response<Body>) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("failed to read body");
    String::from_utf8(bytes.to_vec()).expect("body should be utf-8")
}
