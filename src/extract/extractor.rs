// src/extract/extractor.rs
//! Content extraction: turns server-rendered pages into typed entities.
//!
//! Error policy for every operation here: any transport error, bad
//! status, or shape mismatch is logged with operation and identifier and
//! converted into "no result". A single failing item never halts a batch
//! operation.

use super::client::{PageFetcher, SourceHttpClient};
use super::ids::{resolve_note_id, resolve_user_id};
use super::pace;
use super::state_blob::{parse_state, section, StateBlobError};
use crate::constants::{IMAGE_PACING_SECS, NOTE_PACING_SECS, XHS_BASE_URL};
use crate::error::AppError;
use crate::job::JobContext;
use crate::model::{Note, PublishTime, User};
use crate::types::{NoteId, SessionCookie, SortMode, UserId};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use url::Url;

/// Extracts notes and authors from the source platform.
pub struct ContentExtractor {
    fetcher: Arc<dyn PageFetcher>,
    output_root: PathBuf,
}

impl ContentExtractor {
    /// Creates an extractor with a live HTTP client.
    ///
    /// Fails only on a missing/invalid session cookie, the one
    /// job-fatal configuration error.
    pub fn new(cookie: &SessionCookie, output_root: impl Into<PathBuf>) -> Result<Self, AppError> {
        if cookie.is_empty() {
            return Err(AppError::MissingConfiguration(
                "A source-platform session cookie is required".to_string(),
            ));
        }
        let client = SourceHttpClient::new(cookie)?;
        Ok(Self::with_fetcher(Arc::new(client), output_root))
    }

    /// Creates an extractor over any page source. Tests inject canned
    /// pages here.
    pub fn with_fetcher(fetcher: Arc<dyn PageFetcher>, output_root: impl Into<PathBuf>) -> Self {
        Self {
            fetcher,
            output_root: output_root.into(),
        }
    }

    /// Fetches and parses a single note, from a URL or bare ID.
    ///
    /// Returns `None` on any failure; callers treat that as "skip and
    /// continue", never as fatal.
    pub async fn fetch_note(&self, input: &str) -> Option<Note> {
        let Some(note_id) = resolve_note_id(input) else {
            log::error!("Invalid note URL or ID: {}", input);
            return None;
        };

        log::info!("Fetching note {}", note_id);
        let url = format!("{}/explore/{}", XHS_BASE_URL, note_id);
        let html = match self.fetcher.fetch_page(&url).await {
            Ok(html) => html,
            Err(e) => {
                log::error!("Note fetch failed for {}: {}", note_id, e);
                return None;
            }
        };

        match parse_note_page(&html, &note_id) {
            Ok(note) => {
                log::info!("Extracted note '{}'", note.title);
                Some(note)
            }
            Err(e) => {
                log::error!("Note {} not readable: {}", note_id, e);
                None
            }
        }
    }

    /// Fetches and parses an author profile, from a URL or bare ID.
    pub async fn fetch_user(&self, input: &str) -> Option<User> {
        let Some(user_id) = resolve_user_id(input) else {
            log::error!("Invalid user URL or ID: {}", input);
            return None;
        };

        log::info!("Fetching user {}", user_id);
        let url = format!("{}/user/profile/{}", XHS_BASE_URL, user_id);
        let html = match self.fetcher.fetch_page(&url).await {
            Ok(html) => html,
            Err(e) => {
                log::error!("User fetch failed for {}: {}", user_id, e);
                return None;
            }
        };

        match parse_user_page(&html, &user_id) {
            Ok(user) => {
                log::info!("Extracted user '{}'", user.nickname);
                Some(user)
            }
            Err(e) => {
                log::error!("User {} not readable: {}", user_id, e);
                None
            }
        }
    }

    /// Searches notes by keyword and returns at most `limit` note IDs.
    ///
    /// An absent result list is an empty result, not an error.
    pub async fn search(&self, keyword: &str, sort: SortMode, limit: usize) -> Vec<NoteId> {
        log::info!("Searching notes for '{}'", keyword);

        let url = match Url::parse_with_params(
            &format!("{}/search_result", XHS_BASE_URL),
            &[
                ("keyword", keyword),
                ("sort", &sort.as_query_value().to_string()),
                ("page", "1"),
            ],
        ) {
            Ok(url) => url,
            Err(e) => {
                log::error!("Could not build search URL for '{}': {}", keyword, e);
                return Vec::new();
            }
        };

        let html = match self.fetcher.fetch_page(url.as_str()).await {
            Ok(html) => html,
            Err(e) => {
                log::error!("Search failed for '{}': {}", keyword, e);
                return Vec::new();
            }
        };

        let ids = match parse_search_page(&html, limit) {
            Ok(ids) => ids,
            Err(e) => {
                log::error!("No search results for '{}': {}", keyword, e);
                return Vec::new();
            }
        };

        log::info!("Search '{}' matched {} notes", keyword, ids.len());
        ids
    }

    /// Lists at most `limit` note IDs from a user's profile page.
    pub async fn list_user_note_ids(&self, input: &str, limit: usize) -> Vec<NoteId> {
        let Some(user_id) = resolve_user_id(input) else {
            log::error!("Invalid user URL or ID: {}", input);
            return Vec::new();
        };

        let url = format!("{}/user/profile/{}", XHS_BASE_URL, user_id);
        let html = match self.fetcher.fetch_page(&url).await {
            Ok(html) => html,
            Err(e) => {
                log::error!("Timeline listing failed for {}: {}", user_id, e);
                return Vec::new();
            }
        };

        match parse_timeline_page(&html, limit) {
            Ok(ids) => ids,
            Err(e) => {
                log::error!("No timeline for {}: {}", user_id, e);
                Vec::new()
            }
        }
    }

    /// Fetches a user's recent notes, pacing between fetches.
    ///
    /// Notes that fail to fetch are skipped, not retried. Cancellation is
    /// polled at each item boundary; the in-flight fetch always finishes.
    pub async fn fetch_user_timeline(
        &self,
        input: &str,
        limit: usize,
        ctx: &JobContext,
    ) -> Vec<Note> {
        let ids = self.list_user_note_ids(input, limit).await;
        let total = ids.len();
        let mut notes = Vec::new();

        for (i, id) in ids.iter().enumerate() {
            if ctx.cancel.is_cancelled() {
                log::info!("Timeline fetch cancelled after {} notes", notes.len());
                break;
            }
            if i > 0 {
                pace(NOTE_PACING_SECS).await;
            }
            if let Some(note) = self.fetch_note(id.as_str()).await {
                notes.push(note);
            }
            ctx.report_progress(i + 1, total);
        }

        log::info!("Fetched {} of {} timeline notes", notes.len(), total);
        notes
    }

    /// Downloads a note's images under a deterministic directory layout,
    /// returning the paths actually written.
    ///
    /// Layout: `{output_root}/{author}_{user_id}/{title}_{note_id}/image_{i}.jpg`.
    /// A failing image is logged and skipped; the rest still download.
    pub async fn download_attachments(&self, note: &Note) -> Vec<PathBuf> {
        if note.image_list.is_empty() {
            return Vec::new();
        }

        let note_dir = self
            .output_root
            .join(format!(
                "{}_{}",
                sanitize_component(&note.nickname),
                note.user_id
            ))
            .join(format!("{}_{}", sanitize_component(&note.title), note.note_id));

        if let Err(e) = fs::create_dir_all(&note_dir) {
            log::error!("Could not create {}: {}", note_dir.display(), e);
            return Vec::new();
        }

        let mut saved = Vec::new();
        for (i, image_url) in note.image_list.iter().enumerate() {
            if i > 0 {
                pace(IMAGE_PACING_SECS).await;
            }

            log::info!("Downloading image {}", image_url);
            let bytes = match self.fetcher.fetch_bytes(image_url).await {
                Ok(bytes) => bytes,
                Err(e) => {
                    log::error!("Image download failed for {}: {}", image_url, e);
                    continue;
                }
            };

            let path = note_dir.join(format!("image_{}.jpg", i));
            match fs::write(&path, &bytes) {
                Ok(()) => {
                    log::info!("Saved image to {}", path.display());
                    saved.push(path);
                }
                Err(e) => {
                    log::error!("Could not write {}: {}", path.display(), e);
                }
            }
        }

        saved
    }
}

/// Sanitizes a string for use as a path component.
fn sanitize_component(name: &str) -> String {
    let mut safe = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect::<String>()
        .trim()
        .trim_matches('.')
        .to_string();

    // Truncate by characters, not bytes; titles are mostly multi-byte.
    if safe.chars().count() > 80 {
        safe = safe.chars().take(80).collect();
    }
    if safe.is_empty() {
        safe = "unnamed".to_string();
    }
    safe
}

// ---------------------------------------------------------------------------
// Pure page parsers
// ---------------------------------------------------------------------------

fn parse_note_page(html: &str, note_id: &NoteId) -> Result<Note, StateBlobError> {
    let state = parse_state(html)?;
    let data = section(&state, "note", "noteData", "note.noteData")?;

    let mut note = Note {
        note_id: note_id.as_str().to_string(),
        title: text(data, "title"),
        desc: text(data, "desc"),
        user_id: text(data, "userId"),
        nickname: text(data, "nickname"),
        avatar: text(data, "avatar"),
        ip_location: text(data, "ipLocation"),
        liked_count: count(data, "likedCount"),
        collected_count: count(data, "collectedCount"),
        comment_count: count(data, "commentCount"),
        share_count: count(data, "shareCount"),
        ..Note::default()
    };

    if let Some(kind) = data.get("type").and_then(Value::as_str) {
        note.note_type = kind.to_string();
    }

    if let Some(images) = data.get("imageList").and_then(Value::as_array) {
        for image in images {
            if let Some(url) = image.get("url").and_then(Value::as_str) {
                note.image_list.push(url.to_string());
            }
        }
    }

    if let Some(tags) = data.get("tagList").and_then(Value::as_array) {
        for tag in tags {
            if let Some(name) = tag.get("name").and_then(Value::as_str) {
                note.tag_list.push(name.to_string());
            }
        }
    }

    note.upload_time = match data.get("time") {
        Some(Value::Number(n)) => n
            .as_i64()
            .map(PublishTime::Millis)
            .unwrap_or_default(),
        Some(Value::String(s)) => PublishTime::Raw(s.clone()),
        _ => PublishTime::default(),
    };

    Ok(note)
}

fn parse_user_page(html: &str, user_id: &UserId) -> Result<User, StateBlobError> {
    let state = parse_state(html)?;
    let data = section(&state, "user", "userPageData", "user.userPageData")?;

    Ok(User {
        user_id: user_id.as_str().to_string(),
        nickname: text(data, "nickname"),
        avatar: text(data, "images"),
        desc: text(data, "desc"),
        gender: u8::try_from(count(data, "gender")).unwrap_or(0),
        follows: count(data, "follows"),
        fans: count(data, "fans"),
        notes_count: count(data, "notes"),
        location: text(data, "location"),
    })
}

fn parse_search_page(html: &str, limit: usize) -> Result<Vec<NoteId>, StateBlobError> {
    let state = parse_state(html)?;
    let items = section(&state, "search", "items", "search.items")?;
    Ok(collect_ids(items, limit))
}

fn parse_timeline_page(html: &str, limit: usize) -> Result<Vec<NoteId>, StateBlobError> {
    let state = parse_state(html)?;
    let items = section(&state, "user", "notes", "user.notes")?;
    Ok(collect_ids(items, limit))
}

/// Collects `id` fields from a result list, truncated to `limit`.
fn collect_ids(items: &Value, limit: usize) -> Vec<NoteId> {
    let Some(items) = items.as_array() else {
        return Vec::new();
    };
    items
        .iter()
        .filter_map(|item| item.get("id").and_then(Value::as_str))
        .take(limit)
        .map(|id| NoteId::from_validated(id.to_string()))
        .collect()
}

fn text(value: &Value, key: &str) -> String {
    value
        .get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

/// Reads a non-negative counter, tolerating both numeric and string forms.
fn count(value: &Value, key: &str) -> u64 {
    match value.get(key) {
        Some(Value::Number(n)) => n.as_u64().unwrap_or(0),
        Some(Value::String(s)) => s.parse().unwrap_or(0),
        _ => 0,
    }
}
