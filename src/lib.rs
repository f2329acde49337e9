// src/lib.rs
//! xhs2bitable library: extracts Xiaohongshu notes and authors and
//! synchronizes them into a Feishu Bitable.
//!
//! # Public API
//!
//! The library exposes types organized by concern:
//! - **Error handling**: `AppError`, `FeishuErrorCode`, `StateBlobError`
//! - **Configuration**: `CommandLineInput`, `JobConfig`
//! - **Domain model**: `Note`, `User`, `PublishTime`
//! - **Domain types**: `NoteId`, `UserId`, `SessionCookie`, `SortMode`
//! - **Extraction**: `ContentExtractor`, `PageFetcher`, id resolution
//! - **Destination**: `BitableGateway`, `SchemaSynchronizer`,
//!   `BatchUploader`, `TokenCache`
//! - **Jobs**: `Orchestrator`, `JobParams`, `JobContext`, `CancelToken`

// Internal modules, shared with main.rs
mod bitable;
mod config;
mod constants;
mod error;
mod extract;
mod job;
mod model;
mod types;

// --- Error Handling ---
pub use crate::error::{AppError, FeishuErrorCode};
pub use crate::extract::StateBlobError;

// --- Configuration ---
pub use crate::config::{CommandLineInput, JobConfig};

// --- Domain Model ---
pub use crate::model::{Note, PublishTime, User};

// --- Domain Types ---
pub use crate::types::{AppCredentials, NoteId, SessionCookie, SortMode, UserId};

// --- Extraction ---
pub use crate::extract::{
    resolve_note_id, resolve_user_id, ContentExtractor, PageFetcher, SourceHttpClient,
};

// --- Destination ---
pub use crate::bitable::{
    to_record, BatchUploader, BitableGateway, BitableHttpClient, FieldInfo, FieldKind, FieldMap,
    IssuedToken, NoteField, NoteRecord, RecordFields, SchemaSynchronizer, TokenCache, TokenSource,
};

// --- Jobs ---
pub use crate::job::{
    load_snapshot, save_snapshot, CancelToken, JobContext, JobEvents, JobMode, JobOutcome,
    JobParams, JobSnapshot, JobStatus, JobSummary, NullEvents, Orchestrator, SyncOptions,
    SyncTarget,
};
