//! Shared fixtures for async tests: an `AppState` over a fresh database and a
//! few seed helpers.

use std::sync::Arc;

use crate::catalog::EventCatalog;
use crate::config::Config;
use crate::db::models::{Event, UpsertEvent};
use crate::db::{testing, EventRepository};
use crate::services::session::{SessionRole, SessionService};
use crate::AppState;

pub const ADMIN_QR_SECRET: &str = "qr-secret";

pub fn config() -> Config {
    let mut config = Config::default();
    config.session.secret = "test-session-secret".to_string();
    config.admin.qr_secret = Some(ADMIN_QR_SECRET.to_string());
    config
}

pub async fn state() -> Arc<AppState> {
    Arc::new(AppState {
        db: testing::pool().await,
        config: config(),
        catalog: EventCatalog::builtin(),
    })
}

/// State over a WAL database file with `connections` pooled connections, for
/// tests that race writers against each other. Keep the `FileDb` alive for
/// the duration of the test.
pub async fn file_state(connections: u32) -> (Arc<AppState>, testing::FileDb) {
    let db = testing::file_pool(connections).await;
    let state = Arc::new(AppState {
        db: db.pool.clone(),
        config: config(),
        catalog: EventCatalog::builtin(),
    });
    (state, db)
}

/// Event running 2025-06-08 to 2025-06-10.
pub async fn seed_event(state: &Arc<AppState>, name: &str, manual_scheduling: bool) -> Event {
    seed_event_between(state, name, "2025-06-08", "2025-06-10", manual_scheduling).await
}

pub async fn seed_event_between(
    state: &Arc<AppState>,
    name: &str,
    start_date: &str,
    end_date: &str,
    manual_scheduling: bool,
) -> Event {
    EventRepository::upsert(
        &state.db,
        UpsertEvent {
            name: name.to_string(),
            start_date: start_date.to_string(),
            end_date: end_date.to_string(),
            manual_scheduling: Some(manual_scheduling),
        },
    )
    .await
    .expect("seed event")
}

pub fn token(state: &Arc<AppState>, uid: &str, event: &str, role: SessionRole) -> String {
    SessionService::issue(&state.config.session, uid, event, "Ada", "Lovelace", role)
        .expect("issue token")
}

/// Send one request through a router and decode the JSON body (`Null` when empty).
pub async fn call(
    app: axum::Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<serde_json::Value>,
) -> (http::StatusCode, serde_json::Value) {
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    let mut builder = http::Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(http::header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let request = match body {
        Some(json) => builder
            .header(http::header::CONTENT_TYPE, "application/json")
            .body(axum::body::Body::from(json.to_string()))
            .expect("request"),
        None => builder.body(axum::body::Body::empty()).expect("request"),
    };

    let response = app.oneshot(request).await.expect("response");
    let status = response.status();
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body")
        .to_bytes();
    let json = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("json body")
    };
    (status, json)
}
