//! Development NoteHub Server
//!
//! In-memory stand-in for the remote NoteHub REST service, so the core and
//! `notes-browse` can be exercised without network access or a real
//! account. It speaks the same wire format as the public service:
//!
//! - `GET    /api/notes?page=&perPage=&search=&tag=` → `{ notes, totalPages }`
//! - `POST   /api/notes` → created note
//! - `GET    /api/notes/:id` → note or 404
//! - `DELETE /api/notes/:id` → removed note or 404
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin dev-server
//!
//! # Require a bearer token (requests without it get 401)
//! NOTEHUB_TOKEN=dev-token DEV_SERVER_PORT=4000 cargo run --bin dev-server
//! ```
//!
//! # Environment Variables
//!
//! - `DEV_SERVER_PORT`: Server port (default: 4000)
//! - `NOTEHUB_TOKEN`: Expected bearer token; unset disables the check
//! - `RUST_LOG`: Logging level (e.g., "info", "debug")
//!
//! **DEVELOPMENT ONLY** - data lives in memory and is lost on exit.

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::Json,
    routing::get,
    Router,
};
use chrono::{Duration, Utc};
use notehub_core::{ListResult, NewNote, Note, NoteTag};
use serde::{Deserialize, Serialize};
use std::env;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::cors::CorsLayer;

const DEFAULT_PORT: u16 = 4000;
const DEFAULT_PER_PAGE: u32 = 12;
const MAX_PER_PAGE: u32 = 50;

/// Application state shared across handlers
#[derive(Clone)]
struct AppState {
    notes: Arc<RwLock<Vec<Note>>>,
    next_id: Arc<AtomicU64>,
    /// Expected bearer token; `None` accepts every request
    token: Option<String>,
}

impl AppState {
    fn allocate_id(&self) -> String {
        format!("dev-{}", self.next_id.fetch_add(1, Ordering::Relaxed))
    }
}

/// Error body in the shape the public service returns
#[derive(Debug, Serialize)]
struct ErrorBody {
    message: String,
}

type ApiResult<T> = Result<Json<T>, (StatusCode, Json<ErrorBody>)>;

fn error(status: StatusCode, message: impl Into<String>) -> (StatusCode, Json<ErrorBody>) {
    (
        status,
        Json(ErrorBody {
            message: message.into(),
        }),
    )
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListQuery {
    page: Option<u32>,
    per_page: Option<u32>,
    search: Option<String>,
    tag: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("dev_server=debug,info")),
        )
        .init();

    let port = env::var("DEV_SERVER_PORT")
        .ok()
        .and_then(|p| p.parse::<u16>().ok())
        .unwrap_or(DEFAULT_PORT);

    let token = env::var("NOTEHUB_TOKEN")
        .ok()
        .filter(|t| !t.trim().is_empty());
    match &token {
        Some(_) => tracing::info!("Bearer token required for all requests"),
        None => tracing::warn!("NOTEHUB_TOKEN not set; accepting unauthenticated requests"),
    }

    let notes = sample_notes();
    tracing::info!("Seeded {} sample notes", notes.len());

    let state = AppState {
        next_id: Arc::new(AtomicU64::new(notes.len() as u64 + 1)),
        notes: Arc::new(RwLock::new(notes)),
        token,
    };

    let app = Router::new()
        .route("/health", get(health_check))
        .route("/api/notes", get(list_notes).post(create_note))
        .route("/api/notes/:id", get(get_note).delete(delete_note))
        .with_state(state)
        .layer(CorsLayer::permissive());

    let addr = format!("127.0.0.1:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr).await.map_err(|e| {
        tracing::error!("Failed to bind to {}: {}", addr, e);
        e
    })?;

    tracing::info!("Dev NoteHub server listening on http://{}/api/", addr);
    axum::serve(listener, app).await?;

    Ok(())
}

/// Reject the request with 401 unless it carries the expected bearer token
fn authorize(state: &AppState, headers: &HeaderMap) -> Result<(), (StatusCode, Json<ErrorBody>)> {
    let Some(expected) = &state.token else {
        return Ok(());
    };
    let presented = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));

    if presented == Some(expected.as_str()) {
        Ok(())
    } else {
        tracing::debug!("Rejecting request with missing or wrong token");
        Err(error(StatusCode::UNAUTHORIZED, "Invalid or missing token"))
    }
}

// === Handler Functions ===

async fn health_check() -> &'static str {
    "OK"
}

async fn list_notes(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<ListQuery>,
) -> ApiResult<ListResult> {
    authorize(&state, &headers)?;

    let tag = match query.tag.as_deref() {
        Some(raw) => NoteTag::parse_filter(raw)
            .map_err(|e| error(StatusCode::BAD_REQUEST, e.to_string()))?,
        None => None,
    };
    let search = query
        .search
        .as_deref()
        .map(|s| s.trim().to_lowercase())
        .unwrap_or_default();
    let page = query.page.unwrap_or(1).max(1);
    let per_page = query
        .per_page
        .unwrap_or(DEFAULT_PER_PAGE)
        .clamp(1, MAX_PER_PAGE);

    let notes = state.notes.read().await;
    let mut matching: Vec<&Note> = notes
        .iter()
        .filter(|note| tag.map_or(true, |tag| note.tag == tag))
        .filter(|note| {
            search.is_empty()
                || note.title.to_lowercase().contains(&search)
                || note.content.to_lowercase().contains(&search)
        })
        .collect();
    matching.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));

    let total_pages = (matching.len() as u32).div_ceil(per_page);
    let items: Vec<Note> = matching
        .into_iter()
        .skip(page_offset(page, per_page))
        .take(per_page as usize)
        .cloned()
        .collect();

    tracing::debug!(
        "list page={} perPage={} search={:?} tag={:?} -> {} notes of {} pages",
        page,
        per_page,
        search,
        tag,
        items.len(),
        total_pages
    );
    Ok(Json(ListResult::new(items, total_pages)))
}

async fn create_note(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<NewNote>,
) -> Result<(StatusCode, Json<Note>), (StatusCode, Json<ErrorBody>)> {
    authorize(&state, &headers)?;
    request
        .validate()
        .map_err(|e| error(StatusCode::BAD_REQUEST, e.to_string()))?;

    let now = Utc::now();
    let note = Note {
        id: state.allocate_id(),
        title: request.title.trim().to_string(),
        content: request.content,
        tag: request.tag,
        created_at: now,
        updated_at: now,
    };

    state.notes.write().await.push(note.clone());
    tracing::info!("Created note {} ({})", note.id, note.tag);
    Ok((StatusCode::CREATED, Json(note)))
}

async fn get_note(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> ApiResult<Note> {
    authorize(&state, &headers)?;
    state
        .notes
        .read()
        .await
        .iter()
        .find(|note| note.id == id)
        .cloned()
        .map(Json)
        .ok_or_else(|| error(StatusCode::NOT_FOUND, format!("Note {} not found", id)))
}

async fn delete_note(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> ApiResult<Note> {
    authorize(&state, &headers)?;
    let mut notes = state.notes.write().await;
    let index = notes
        .iter()
        .position(|note| note.id == id)
        .ok_or_else(|| error(StatusCode::NOT_FOUND, format!("Note {} not found", id)))?;

    let removed = notes.remove(index);
    tracing::info!("Deleted note {}", removed.id);
    Ok(Json(removed))
}

/// Index of the first note on `page` (1-based), saturating for huge pages
fn page_offset(page: u32, per_page: u32) -> usize {
    (page.max(1) as usize - 1).saturating_mul(per_page as usize)
}

/// Enough notes across every tag to make pagination and filtering visible
fn sample_notes() -> Vec<Note> {
    let subjects = [
        "Quarterly planning",
        "Grocery run",
        "Dentist appointment",
        "Team retrospective",
        "Book club",
        "Release checklist",
        "Weekend hike",
        "Budget review",
    ];
    let now = Utc::now();

    (0..40u32)
        .map(|i| {
            let tag = NoteTag::ALL[i as usize % NoteTag::ALL.len()];
            let subject = subjects[i as usize % subjects.len()];
            let at = now - Duration::hours(i64::from(i) * 5);
            Note {
                id: format!("dev-{}", i + 1),
                title: format!("{} #{}", subject, i + 1),
                content: format!("{} notes for {}", tag, subject.to_lowercase()),
                tag,
                created_at: at,
                updated_at: at,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_offset() {
        assert_eq!(page_offset(1, 12), 0);
        assert_eq!(page_offset(3, 12), 24);
        assert_eq!(page_offset(0, 12), 0);
    }

    #[test]
    fn test_page_offset_does_not_overflow_for_huge_pages() {
        let offset = page_offset(4_000_000_000, MAX_PER_PAGE);
        assert!(offset >= 4_000_000_000);
        assert!(sample_notes().get(offset).is_none());
    }
}
