//! HTTP JSON API for FAQ widgets.
//!
//! Every query rebuilds the knowledge base from the configured sources
//! (remote bodies are served from the shared TTL cache), so admin edits are
//! visible on the very next request.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`  | `/health` | Health check (returns version) |
//! | `GET`  | `/rebuild` | Rebuild and return the report |
//! | `GET`  | `/topics` | Topics in first-appearance order |
//! | `GET`  | `/topics/{topic}/keywords` | Keywords of one topic |
//! | `GET`  | `/lookup?key=` | Exact lookup (sentinel when missing) |
//! | `GET`  | `/search?q=&topics=` | Case-insensitive substring search |
//! | `GET`  | `/suggest?q=` | Closest keywords by edit distance |
//! | `POST` | `/answer` | Entries to show for a session selection |
//! | `GET`  | `/users/{user}/pins` | Pins grouped by topic |
//! | `PUT`/`DELETE` | `/users/{user}/pins/{key}` | Pin or unpin |
//! | `GET`  | `/users/{user}/theme` | Theme preference |
//! | `POST` | `/users/{user}/theme/toggle` | Flip dark mode |
//! | `GET`/`POST` | `/admin/edits` | List or add admin edits |
//! | `PUT`/`DELETE` | `/admin/edits/{key}` | Update, or delete by key or topic |
//! | `POST` | `/admin/topics/{topic}/rename` | Move edits to another topic |
//!
//! Admin routes require the `x-admin-token` header to match the value of
//! the environment variable named by `[admin].token_env`.
//!
//! Pin, theme, and admin stores are plain files; their reads and writes run
//! on the blocking thread pool.
//!
//! # Error Contract
//!
//! ```json
//! { "error": { "code": "bad_request", "message": "invalid entry: missing topic" } }
//! ```
//!
//! Error codes: `bad_request` (400), `unauthorized` (403), `not_found` (404),
//! `internal` (500).

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};

use crate::admin::{AdminEditStore, AdminEditor, CsvAdminEditStore};
use crate::cache::TtlCache;
use crate::config::Config;
use crate::error::KbError;
use crate::ingest::{rebuild_from_config, Rebuild};
use crate::lookup::Suggestion;
use crate::models::{KeywordEntry, RebuildReport};
use crate::pins::{JsonPinStore, PinStore};
use crate::prefs::{PreferenceStore, Preferences};
use crate::state::{answer, SessionState};

const ADMIN_HEADER: &str = "x-admin-token";

/// Shared application state passed to all route handlers.
#[derive(Clone)]
pub struct AppState {
    config: Arc<Config>,
    cache: Arc<TtlCache>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let cache = Arc::new(TtlCache::with_capacity(
            Duration::from_secs(config.fetch.cache_ttl_secs),
            config.fetch.cache_capacity,
        ));
        Self {
            config: Arc::new(config),
            cache,
        }
    }

    async fn rebuild(&self) -> Result<Rebuild, AppError> {
        rebuild_from_config(&self.config, self.cache.clone())
            .await
            .map_err(|e| internal(e.to_string()))
    }

    fn admin_store(&self) -> CsvAdminEditStore {
        CsvAdminEditStore::new(&self.config.store.admin_edits)
    }

    fn is_admin(&self, headers: &HeaderMap) -> bool {
        let presented = headers.get(ADMIN_HEADER).and_then(|v| v.to_str().ok());
        self.config.admin.is_admin(presented)
    }
}

/// Build the application router. Exposed for embedding and tests.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handle_health))
        .route("/rebuild", get(handle_rebuild))
        .route("/topics", get(handle_topics))
        .route("/topics/{topic}/keywords", get(handle_topic_keywords))
        .route("/lookup", get(handle_lookup))
        .route("/search", get(handle_search))
        .route("/suggest", get(handle_suggest))
        .route("/answer", post(handle_answer))
        .route("/users/{user}/pins", get(handle_pins))
        .route(
            "/users/{user}/pins/{key}",
            put(handle_pin).delete(handle_unpin),
        )
        .route("/users/{user}/theme", get(handle_theme))
        .route("/users/{user}/theme/toggle", post(handle_toggle_theme))
        .route("/admin/edits", get(handle_admin_list).post(handle_admin_add))
        .route(
            "/admin/edits/{key}",
            put(handle_admin_update).delete(handle_admin_delete),
        )
        .route("/admin/topics/{topic}/rename", post(handle_admin_rename))
        .layer(cors)
        .with_state(state)
}

/// Starts the HTTP server on `[server].bind` and runs until terminated.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let bind_addr = config.server.bind.clone();
    let app = router(AppState::new(config.clone()));

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!(addr = %bind_addr, "server listening");
    println!("FAQ server listening on http://{}", bind_addr);
    axum::serve(listener, app).await?;

    Ok(())
}

// ============ Error response ============

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

/// Internal error type that converts into an Axum HTTP response.
#[derive(Debug)]
struct AppError {
    status: StatusCode,
    code: &'static str,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code.to_string(),
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

fn bad_request(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::BAD_REQUEST,
        code: "bad_request",
        message: message.into(),
    }
}

fn internal(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        code: "internal",
        message: message.into(),
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        bad_request(rejection.body_text())
    }
}

impl From<KbError> for AppError {
    fn from(err: KbError) -> Self {
        let message = err.to_string();
        match err {
            KbError::Validation { .. } => bad_request(message),
            KbError::Unauthorized => AppError {
                status: StatusCode::FORBIDDEN,
                code: "unauthorized",
                message,
            },
            KbError::NotFound(_) => AppError {
                status: StatusCode::NOT_FOUND,
                code: "not_found",
                message,
            },
            _ => internal(message),
        }
    }
}

/// Run a file-backed store operation off the async workers.
async fn blocking<T, F>(op: F) -> Result<T, AppError>
where
    F: FnOnce() -> crate::error::Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(op)
        .await
        .map_err(|e| internal(format!("store task failed: {}", e)))?
        .map_err(AppError::from)
}

// ============ Queries ============

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

async fn handle_rebuild(State(state): State<AppState>) -> Result<Json<RebuildReport>, AppError> {
    let Rebuild { report, .. } = state.rebuild().await?;
    Ok(Json(report))
}

#[derive(Serialize)]
struct TopicsResponse {
    topics: Vec<String>,
    /// Set when the rebuild produced no entries.
    empty: bool,
    warnings: Vec<String>,
}

async fn handle_topics(State(state): State<AppState>) -> Result<Json<TopicsResponse>, AppError> {
    let rebuild = state.rebuild().await?;
    Ok(Json(TopicsResponse {
        topics: rebuild.kb.list_topics().into_iter().map(String::from).collect(),
        empty: rebuild.report.is_empty(),
        warnings: rebuild.report.warnings(),
    }))
}

#[derive(Serialize)]
struct KeywordsResponse {
    topic: String,
    keywords: Vec<String>,
}

async fn handle_topic_keywords(
    State(state): State<AppState>,
    Path(topic): Path<String>,
) -> Result<Json<KeywordsResponse>, AppError> {
    let rebuild = state.rebuild().await?;
    let keywords = rebuild
        .kb
        .list_keywords_for_topic(&topic)
        .into_iter()
        .map(String::from)
        .collect();
    Ok(Json(KeywordsResponse { topic, keywords }))
}

#[derive(Deserialize)]
struct LookupParams {
    key: String,
}

#[derive(Serialize)]
struct LookupResponse {
    key: String,
    found: bool,
    description: String,
    entry: Option<KeywordEntry>,
}

async fn handle_lookup(
    State(state): State<AppState>,
    Query(params): Query<LookupParams>,
) -> Result<Json<LookupResponse>, AppError> {
    let rebuild = state.rebuild().await?;
    let entry = rebuild.kb.lookup_exact(&params.key).cloned();
    let description = match &entry {
        Some(e) => e.description.clone(),
        None => state.config.lookup.not_found_message.clone(),
    };
    Ok(Json(LookupResponse {
        key: params.key,
        found: entry.is_some(),
        description,
        entry,
    }))
}

#[derive(Deserialize)]
struct SearchParams {
    #[serde(default)]
    q: String,
    /// Comma-separated topic filter.
    #[serde(default)]
    topics: Option<String>,
}

#[derive(Serialize)]
struct SearchResponse {
    results: Vec<KeywordEntry>,
}

fn split_list(raw: Option<&str>) -> Vec<String> {
    raw.map(|s| {
        s.split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(String::from)
            .collect()
    })
    .unwrap_or_default()
}

async fn handle_search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchResponse>, AppError> {
    let topics = split_list(params.topics.as_deref());
    let rebuild = state.rebuild().await?;
    let results = rebuild
        .kb
        .lookup_contains(&params.q)
        .into_iter()
        .filter(|e| topics.is_empty() || topics.contains(&e.topic))
        .cloned()
        .collect();
    Ok(Json(SearchResponse { results }))
}

#[derive(Deserialize)]
struct SuggestParams {
    q: String,
    #[serde(default)]
    limit: Option<usize>,
}

#[derive(Serialize)]
struct SuggestResponse {
    suggestions: Vec<Suggestion>,
}

async fn handle_suggest(
    State(state): State<AppState>,
    Query(params): Query<SuggestParams>,
) -> Result<Json<SuggestResponse>, AppError> {
    let limit = params.limit.unwrap_or(state.config.lookup.suggest_limit);
    if limit == 0 {
        return Err(bad_request("limit must be at least 1"));
    }
    let rebuild = state.rebuild().await?;
    Ok(Json(SuggestResponse {
        suggestions: rebuild.kb.suggest(&params.q, limit),
    }))
}

#[derive(Serialize)]
struct AnswerResponse {
    state: SessionState,
    entries: Vec<KeywordEntry>,
}

/// The caller's admin flag is recomputed from the header, never trusted
/// from the body.
async fn handle_answer(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<SessionState>, JsonRejection>,
) -> Result<Json<AnswerResponse>, AppError> {
    let Json(session) = body?;
    let session = session.with_admin(state.is_admin(&headers));
    let rebuild = state.rebuild().await?;
    let entries = answer(&rebuild.kb, &session).into_iter().cloned().collect();
    Ok(Json(AnswerResponse {
        state: session,
        entries,
    }))
}

// ============ Pins and preferences ============

#[derive(Serialize)]
struct PinsResponse {
    user: String,
    pins: Vec<String>,
    by_topic: BTreeMap<String, Vec<String>>,
}

async fn pins_response(state: &AppState, user: String, pins: Vec<String>) -> Result<PinsResponse, AppError> {
    let rebuild = state.rebuild().await?;
    let by_topic = rebuild.kb.pinned_by_topic(&pins);
    Ok(PinsResponse {
        user,
        pins,
        by_topic,
    })
}

async fn handle_pins(
    State(state): State<AppState>,
    Path(user): Path<String>,
) -> Result<Json<PinsResponse>, AppError> {
    let store = JsonPinStore::new(&state.config.store.pins);
    let pins = {
        let user = user.clone();
        blocking(move || store.pins(&user)).await?
    };
    Ok(Json(pins_response(&state, user, pins).await?))
}

async fn handle_pin(
    State(state): State<AppState>,
    Path((user, key)): Path<(String, String)>,
) -> Result<Json<PinsResponse>, AppError> {
    if key.trim().is_empty() {
        return Err(bad_request("key must not be empty"));
    }
    let store = JsonPinStore::new(&state.config.store.pins);
    let pins = {
        let user = user.clone();
        blocking(move || store.pin(&user, &key)).await?
    };
    Ok(Json(pins_response(&state, user, pins).await?))
}

async fn handle_unpin(
    State(state): State<AppState>,
    Path((user, key)): Path<(String, String)>,
) -> Result<Json<PinsResponse>, AppError> {
    let store = JsonPinStore::new(&state.config.store.pins);
    let pins = {
        let user = user.clone();
        blocking(move || store.unpin(&user, &key)).await?
    };
    Ok(Json(pins_response(&state, user, pins).await?))
}

async fn handle_theme(
    State(state): State<AppState>,
    Path(user): Path<String>,
) -> Result<Json<Preferences>, AppError> {
    let store = PreferenceStore::new(&state.config.store.preferences);
    Ok(Json(blocking(move || store.get(&user)).await?))
}

async fn handle_toggle_theme(
    State(state): State<AppState>,
    Path(user): Path<String>,
) -> Result<Json<Preferences>, AppError> {
    let store = PreferenceStore::new(&state.config.store.preferences);
    Ok(Json(blocking(move || store.toggle_theme(&user)).await?))
}

// ============ Admin ============

#[derive(Serialize)]
struct EditsResponse {
    edits: Vec<KeywordEntry>,
}

#[derive(Serialize)]
struct ChangedResponse {
    changed: usize,
}

#[derive(Deserialize)]
struct RenameBody {
    new: String,
}

/// Admin entry as sent by clients. Missing fields deserialize as empty so
/// that they are reported by entry validation, not by the JSON extractor.
#[derive(Deserialize, Default)]
#[serde(default)]
struct EntryBody {
    key: String,
    description: String,
    topic: String,
}

impl From<EntryBody> for KeywordEntry {
    fn from(body: EntryBody) -> Self {
        KeywordEntry::new(body.key, body.description, body.topic)
    }
}

async fn handle_admin_list(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<EditsResponse>, AppError> {
    if !state.is_admin(&headers) {
        return Err(KbError::Unauthorized.into());
    }
    let store = state.admin_store();
    let edits = blocking(move || store.load()).await?;
    Ok(Json(EditsResponse { edits }))
}

async fn handle_admin_add(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<EntryBody>, JsonRejection>,
) -> Result<Json<EditsResponse>, AppError> {
    let Json(body) = body?;
    let store = state.admin_store();
    let is_admin = state.is_admin(&headers);
    let edits = blocking(move || {
        let editor = AdminEditor::new(&store, is_admin);
        editor.add(body.into())?;
        editor.list()
    })
    .await?;
    Ok(Json(EditsResponse { edits }))
}

async fn handle_admin_update(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(key): Path<String>,
    body: Result<Json<EntryBody>, JsonRejection>,
) -> Result<Json<EditsResponse>, AppError> {
    let Json(body) = body?;
    let store = state.admin_store();
    let is_admin = state.is_admin(&headers);
    let edits = blocking(move || {
        let editor = AdminEditor::new(&store, is_admin);
        editor.update(&key, body.into())?;
        editor.list()
    })
    .await?;
    Ok(Json(EditsResponse { edits }))
}

async fn handle_admin_delete(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(target): Path<String>,
) -> Result<Json<ChangedResponse>, AppError> {
    let store = state.admin_store();
    let is_admin = state.is_admin(&headers);
    let changed = blocking(move || AdminEditor::new(&store, is_admin).delete(&target)).await?;
    Ok(Json(ChangedResponse { changed }))
}

async fn handle_admin_rename(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(topic): Path<String>,
    body: Result<Json<RenameBody>, JsonRejection>,
) -> Result<Json<ChangedResponse>, AppError> {
    let Json(body) = body?;
    let store = state.admin_store();
    let is_admin = state.is_admin(&headers);
    let changed =
        blocking(move || AdminEditor::new(&store, is_admin).rename_topic(&topic, &body.new))
            .await?;
    Ok(Json(ChangedResponse { changed }))
}
