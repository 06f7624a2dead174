use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::{net::TcpListener, sync::RwLock};
use tracing::info;
use uuid::Uuid;

/// Key accepted by `app()`.
pub const API_KEY: &str = "test-api-key";

const PUBLIC_API: &str = "https://healthchecks.io/api/v1";
const PING_ENDPOINT: &str = "https://hc-ping.com";
const UNIQUE_KEYS: [&str; 4] = ["name", "tags", "timeout", "grace"];

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Channel {
    pub id: String,
    pub name: String,
    pub kind: String,
}

/// Check as rendered on the wire.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct CheckView {
    pub name: String,
    pub tags: String,
    pub desc: String,
    pub grace: u64,
    pub n_pings: u64,
    pub status: String,
    pub last_ping: Option<String>,
    pub next_ping: Option<String>,
    pub channels: String,
    pub methods: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schedule: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tz: Option<String>,
    pub ping_url: String,
    pub pause_url: String,
    pub update_url: String,
}

#[derive(Deserialize, Default)]
pub struct CheckInput {
    pub name: Option<String>,
    pub tags: Option<String>,
    pub desc: Option<String>,
    pub timeout: Option<u64>,
    pub grace: Option<u64>,
    pub schedule: Option<String>,
    pub tz: Option<String>,
    pub channels: Option<String>,
    pub methods: Option<String>,
    pub unique: Option<Vec<String>>,
}

#[derive(Clone, Debug)]
struct StoredCheck {
    id: Uuid,
    name: String,
    tags: String,
    desc: String,
    timeout: u64,
    grace: u64,
    schedule: String,
    tz: String,
    channels: Vec<String>,
    methods: String,
    status: String,
}

impl StoredCheck {
    fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            name: String::new(),
            tags: String::new(),
            desc: String::new(),
            timeout: 86400,
            grace: 3600,
            schedule: String::new(),
            tz: "UTC".to_string(),
            channels: Vec::new(),
            methods: String::new(),
            status: "new".to_string(),
        }
    }

    fn view(&self) -> CheckView {
        let cron = !self.schedule.is_empty();
        CheckView {
            name: self.name.clone(),
            tags: self.tags.clone(),
            desc: self.desc.clone(),
            grace: self.grace,
            n_pings: 0,
            status: self.status.clone(),
            last_ping: None,
            next_ping: None,
            channels: self.channels.join(","),
            methods: self.methods.clone(),
            timeout: (!cron).then_some(self.timeout),
            schedule: cron.then(|| self.schedule.clone()),
            tz: cron.then(|| self.tz.clone()),
            ping_url: format!("{PING_ENDPOINT}/{}", self.id),
            pause_url: format!("{PUBLIC_API}/checks/{}/pause", self.id),
            update_url: format!("{PUBLIC_API}/checks/{}", self.id),
        }
    }

    fn matches(&self, input: &CheckInput, keys: &[String]) -> bool {
        keys.iter().all(|key| match key.as_str() {
            "name" => input.name.as_deref().unwrap_or_default() == self.name,
            "tags" => input.tags.as_deref().unwrap_or_default() == self.tags,
            "timeout" => input.timeout.unwrap_or(86400) == self.timeout,
            "grace" => input.grace.unwrap_or(3600) == self.grace,
            _ => false,
        })
    }
}

struct Store {
    checks: Vec<StoredCheck>,
    channels: Vec<Channel>,
}

#[derive(Clone)]
struct AppState {
    db: Arc<RwLock<Store>>,
    api_key: Arc<str>,
}

/// Error rendered as `{"error": "..."}`.
#[derive(Debug)]
struct ApiFailure(StatusCode, String);

impl ApiFailure {
    fn not_found() -> Self {
        Self(StatusCode::NOT_FOUND, "not found".to_string())
    }

    fn bad_request(message: impl Into<String>) -> Self {
        Self(StatusCode::BAD_REQUEST, message.into())
    }
}

impl IntoResponse for ApiFailure {
    fn into_response(self) -> Response {
        (self.0, Json(json!({ "error": self.1 }))).into_response()
    }
}

/// Router accepting `API_KEY` with a single email channel named `default`.
pub fn app() -> Router {
    app_with(
        API_KEY,
        vec![Channel {
            id: Uuid::new_v4().to_string(),
            name: "default".to_string(),
            kind: "email".to_string(),
        }],
    )
}

pub fn app_with(api_key: &str, channels: Vec<Channel>) -> Router {
    let state = AppState {
        db: Arc::new(RwLock::new(Store {
            checks: Vec::new(),
            channels,
        })),
        api_key: Arc::from(api_key),
    };
    Router::new()
        .route("/api/v1/checks/", get(list_checks).post(create_check))
        .route("/api/v1/checks/{id}", post(update_check).delete(delete_check))
        .route("/api/v1/checks/{id}/pause", post(pause_check))
        .route("/api/v1/channels/", get(list_channels))
        .with_state(state)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

fn authorize(state: &AppState, headers: &HeaderMap) -> Result<(), ApiFailure> {
    let key = headers.get("x-api-key").and_then(|v| v.to_str().ok());
    match key {
        Some(key) if key == &*state.api_key => Ok(()),
        Some(_) => Err(ApiFailure(StatusCode::UNAUTHORIZED, "wrong api key".to_string())),
        None => Err(ApiFailure(StatusCode::UNAUTHORIZED, "missing api key".to_string())),
    }
}

/// Map `"*"`, `""` or a comma-separated list of names/ids to channel ids.
fn resolve_channels(store: &Store, wanted_list: &str) -> Result<Vec<String>, ApiFailure> {
    if wanted_list.trim() == "*" {
        return Ok(store.channels.iter().map(|c| c.id.clone()).collect());
    }
    wanted_list
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|wanted| {
            store
                .channels
                .iter()
                .find(|c| c.id == wanted || c.name == wanted)
                .map(|c| c.id.clone())
                .ok_or_else(|| {
                    ApiFailure::bad_request(format!("invalid channel identifier: {wanted}"))
                })
        })
        .collect()
}

fn apply(store: &Store, check: &mut StoredCheck, input: CheckInput) -> Result<(), ApiFailure> {
    if let Some(channels) = &input.channels {
        check.channels = resolve_channels(store, channels)?;
    }
    if let Some(name) = input.name {
        check.name = name;
    }
    if let Some(tags) = input.tags {
        check.tags = tags;
    }
    if let Some(desc) = input.desc {
        check.desc = desc;
    }
    if let Some(timeout) = input.timeout {
        check.timeout = timeout;
        check.schedule.clear();
    }
    if let Some(grace) = input.grace {
        check.grace = grace;
    }
    if let Some(schedule) = input.schedule {
        check.schedule = schedule;
    }
    if let Some(tz) = input.tz {
        check.tz = tz;
    }
    if let Some(methods) = input.methods {
        if !methods.is_empty() && methods != "POST" {
            return Err(ApiFailure::bad_request("methods must be \"\" or \"POST\""));
        }
        check.methods = methods;
    }
    Ok(())
}

fn position(store: &Store, id: &str) -> Result<usize, ApiFailure> {
    let id: Uuid = id.parse().map_err(|_| ApiFailure::not_found())?;
    store
        .checks
        .iter()
        .position(|c| c.id == id)
        .ok_or_else(ApiFailure::not_found)
}

async fn list_checks(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>, ApiFailure> {
    authorize(&state, &headers)?;
    let store = state.db.read().await;
    let checks: Vec<CheckView> = store.checks.iter().map(StoredCheck::view).collect();
    Ok(Json(json!({ "checks": checks })))
}

async fn create_check(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(input): Json<CheckInput>,
) -> Result<(StatusCode, Json<CheckView>), ApiFailure> {
    authorize(&state, &headers)?;
    let mut store = state.db.write().await;

    if let Some(keys) = input.unique.as_deref() {
        if let Some(bad) = keys.iter().find(|k| !UNIQUE_KEYS.contains(&k.as_str())) {
            return Err(ApiFailure::bad_request(format!(
                "unique accepts only name, tags, timeout and grace keys, got {bad}"
            )));
        }
        if let Some(existing) = store.checks.iter().find(|c| c.matches(&input, keys)) {
            return Ok((StatusCode::OK, Json(existing.view())));
        }
    }

    let mut check = StoredCheck::new();
    apply(&store, &mut check, input)?;
    let view = check.view();
    info!(id = %check.id, name = %check.name, "check created");
    store.checks.push(check);
    Ok((StatusCode::CREATED, Json(view)))
}

async fn update_check(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(input): Json<CheckInput>,
) -> Result<Json<CheckView>, ApiFailure> {
    authorize(&state, &headers)?;
    let mut guard = state.db.write().await;
    let store = &mut *guard;
    let idx = position(store, &id)?;

    let mut check = store.checks[idx].clone();
    apply(store, &mut check, input)?;
    let view = check.view();
    store.checks[idx] = check;
    Ok(Json(view))
}

async fn pause_check(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<CheckView>, ApiFailure> {
    authorize(&state, &headers)?;
    let mut store = state.db.write().await;
    let idx = position(&store, &id)?;
    let check = &mut store.checks[idx];
    check.status = "paused".to_string();
    Ok(Json(check.view()))
}

async fn delete_check(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<CheckView>, ApiFailure> {
    authorize(&state, &headers)?;
    let mut store = state.db.write().await;
    let idx = position(&store, &id)?;
    let check = store.checks.remove(idx);
    info!(id = %check.id, "check deleted");
    Ok(Json(check.view()))
}

async fn list_channels(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>, ApiFailure> {
    authorize(&state, &headers)?;
    let store = state.db.read().await;
    Ok(Json(json!({ "channels": store.channels })))
}
