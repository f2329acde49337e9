//! Shared fixtures: canned source pages and fake seams for the
//! extraction and destination boundaries.

#![allow(dead_code)]

use async_trait::async_trait;
use serde_json::json;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use xhs2bitable::{
    AppError, BitableGateway, FeishuErrorCode, FieldInfo, FieldKind, IssuedToken, PageFetcher,
    RecordFields, TokenSource,
};

// ---------------------------------------------------------------------------
// Page fixtures
// ---------------------------------------------------------------------------

/// Wraps a state JSON into the server-rendered page shape.
pub fn state_page(state_json: &serde_json::Value) -> String {
    format!(
        "<html><body><script>window.__INITIAL_STATE__={};</script></body></html>",
        state_json
    )
}

/// A note page whose note carries the given id, title and author.
pub fn note_page(note_id: &str, title: &str, user_id: &str) -> String {
    state_page(&json!({
        "note": {
            "noteData": {
                "title": title,
                "desc": format!("description of {}", title),
                "userId": user_id,
                "nickname": "amy",
                "likedCount": 7,
                "tagList": [{"name": "travel"}],
                "time": 1700000000000i64,
            }
        }
    }))
}

pub fn user_page(nickname: &str, fans: u64) -> String {
    state_page(&json!({
        "user": {
            "userPageData": {
                "nickname": nickname,
                "desc": "profile",
                "gender": 1,
                "follows": 10,
                "fans": fans,
                "notes": 3,
                "location": "Shanghai",
            }
        }
    }))
}

pub fn search_page(ids: &[&str]) -> String {
    let items: Vec<_> = ids.iter().map(|id| json!({ "id": id })).collect();
    state_page(&json!({ "search": { "items": items } }))
}

pub fn timeline_page(ids: &[&str]) -> String {
    let items: Vec<_> = ids.iter().map(|id| json!({ "id": id })).collect();
    state_page(&json!({ "user": { "notes": items } }))
}

// ---------------------------------------------------------------------------
// Fake source platform
// ---------------------------------------------------------------------------

/// Serves canned pages keyed by URL substring; anything unknown gets a 404.
#[derive(Default)]
pub struct FakePageFetcher {
    pages: HashMap<String, String>,
    pub fetched: Mutex<Vec<String>>,
}

impl FakePageFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(mut self, url_part: &str, html: String) -> Self {
        self.pages.insert(url_part.to_string(), html);
        self
    }

    pub fn fetch_count_containing(&self, url_part: &str) -> usize {
        self.fetched
            .lock()
            .unwrap()
            .iter()
            .filter(|url| url.contains(url_part))
            .count()
    }
}

#[async_trait]
impl PageFetcher for FakePageFetcher {
    async fn fetch_page(&self, url: &str) -> Result<String, AppError> {
        self.fetched.lock().unwrap().push(url.to_string());
        self.pages
            .iter()
            .find(|(part, _)| url.contains(part.as_str()))
            .map(|(_, html)| html.clone())
            .ok_or_else(|| AppError::UpstreamStatus {
                status: reqwest::StatusCode::NOT_FOUND,
                url: url.to_string(),
            })
    }

    async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>, AppError> {
        Err(AppError::UpstreamStatus {
            status: reqwest::StatusCode::NOT_FOUND,
            url: url.to_string(),
        })
    }
}

// ---------------------------------------------------------------------------
// Fake destination
// ---------------------------------------------------------------------------

/// An in-memory destination with scriptable failures.
#[derive(Default)]
pub struct FakeGateway {
    /// When set, `create_app` fails with an invalid-token error.
    pub rejecting_credentials: bool,
    /// Chunk indices (0-based) whose `create_records` call fails.
    pub failing_chunks: HashSet<usize>,
    /// Field display names whose creation fails.
    pub failing_fields: HashSet<String>,
    /// Fields reported by `list_fields`.
    pub existing_fields: Vec<FieldInfo>,
    pub chunks_seen: Mutex<Vec<usize>>,
    pub uploads_seen: Mutex<Vec<PathBuf>>,
    records_submitted: AtomicUsize,
}

impl FakeGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rejecting_credentials(mut self) -> Self {
        self.rejecting_credentials = true;
        self
    }

    pub fn failing_chunks(mut self, chunks: &[usize]) -> Self {
        self.failing_chunks = chunks.iter().copied().collect();
        self
    }

    pub fn failing_field(mut self, display_name: &str) -> Self {
        self.failing_fields.insert(display_name.to_string());
        self
    }

    fn service_error(&self, message: &str) -> AppError {
        AppError::FeishuService {
            code: FeishuErrorCode::RateLimited,
            message: message.to_string(),
            status: reqwest::StatusCode::OK,
        }
    }
}

#[async_trait]
impl BitableGateway for FakeGateway {
    async fn create_app(&self, _name: &str) -> Result<String, AppError> {
        if self.rejecting_credentials {
            return Err(AppError::FeishuService {
                code: FeishuErrorCode::AccessTokenInvalid,
                message: "tenant access token expired".to_string(),
                status: reqwest::StatusCode::OK,
            });
        }
        Ok("app1".to_string())
    }

    async fn create_table(&self, _app_token: &str, _name: &str) -> Result<String, AppError> {
        Ok("tbl1".to_string())
    }

    async fn create_field(
        &self,
        _app_token: &str,
        _table_id: &str,
        name: &str,
        _kind: FieldKind,
    ) -> Result<String, AppError> {
        if self.failing_fields.contains(name) {
            return Err(self.service_error("field rejected"));
        }
        Ok(format!("fld_{}", name.to_lowercase().replace(' ', "_")))
    }

    async fn list_fields(
        &self,
        _app_token: &str,
        _table_id: &str,
    ) -> Result<Vec<FieldInfo>, AppError> {
        Ok(self.existing_fields.clone())
    }

    async fn upload_attachment(
        &self,
        _app_token: &str,
        _table_id: &str,
        _field_id: &str,
        path: &Path,
    ) -> Result<String, AppError> {
        self.uploads_seen.lock().unwrap().push(path.to_path_buf());
        Ok(format!("tok_{}", path.file_name().unwrap().to_string_lossy()))
    }

    async fn create_records(
        &self,
        _app_token: &str,
        _table_id: &str,
        chunk: &[RecordFields],
    ) -> Result<Vec<String>, AppError> {
        let index = {
            let mut seen = self.chunks_seen.lock().unwrap();
            seen.push(chunk.len());
            seen.len() - 1
        };

        // Ids encode submission position so tests can verify ordering.
        let start = self.records_submitted.fetch_add(chunk.len(), Ordering::SeqCst);
        if self.failing_chunks.contains(&index) {
            return Err(self.service_error("chunk rejected"));
        }
        Ok((start..start + chunk.len())
            .map(|i| format!("rec{}", i))
            .collect())
    }
}

// ---------------------------------------------------------------------------
// Fake credential source
// ---------------------------------------------------------------------------

/// Issues tokens with a fixed lifetime and counts acquisitions.
pub struct CountingTokenSource {
    pub expires_in: Duration,
    pub acquisitions: AtomicUsize,
}

impl CountingTokenSource {
    pub fn with_lifetime(expires_in: Duration) -> Self {
        Self {
            expires_in,
            acquisitions: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl TokenSource for CountingTokenSource {
    async fn acquire(&self) -> Result<IssuedToken, AppError> {
        let n = self.acquisitions.fetch_add(1, Ordering::SeqCst);
        Ok(IssuedToken {
            secret: format!("token-{}", n),
            expires_in: self.expires_in,
        })
    }
}
