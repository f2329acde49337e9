// src/bitable/mod.rs
//! Feishu Bitable interaction: the ability to provision tables and
//! write records into the destination store.
//!
//! Business logic (schema synchronization, record mapping, batched
//! uploads) depends on the `BitableGateway` trait, never on HTTP
//! details, so partial-failure behavior is testable without a network.

pub mod client;
pub mod record;
pub mod schema;
pub mod token;

mod uploader;

pub use client::BitableHttpClient;
pub use record::{to_record, NoteRecord, RecordFields};
pub use schema::{FieldKind, FieldMap, NoteField, SchemaSynchronizer};
pub use token::{IssuedToken, TokenCache, TokenSource};
pub use uploader::BatchUploader;

use crate::error::AppError;
use schema::FieldKind as Kind;
use std::path::Path;

/// A field as the destination reports it.
#[derive(Debug, Clone)]
pub struct FieldInfo {
    pub field_id: String,
    pub field_name: String,
}

/// The destination REST surface, one method per endpoint.
///
/// Every operation is successful only when both the HTTP status and the
/// application-level code in the body report success; either failing
/// surfaces as an `AppError`.
#[async_trait::async_trait]
pub trait BitableGateway: Send + Sync {
    /// Creates a Bitable app (container) and returns its token.
    async fn create_app(&self, name: &str) -> Result<String, AppError>;

    /// Creates a table inside an app and returns its id.
    async fn create_table(&self, app_token: &str, name: &str) -> Result<String, AppError>;

    /// Creates a field and returns its destination-assigned id.
    async fn create_field(
        &self,
        app_token: &str,
        table_id: &str,
        name: &str,
        kind: Kind,
    ) -> Result<String, AppError>;

    /// Lists the fields of an existing table.
    async fn list_fields(&self, app_token: &str, table_id: &str)
        -> Result<Vec<FieldInfo>, AppError>;

    /// Uploads one file into an attachment field, returning its token.
    async fn upload_attachment(
        &self,
        app_token: &str,
        table_id: &str,
        field_id: &str,
        path: &Path,
    ) -> Result<String, AppError>;

    /// Creates one chunk of records (at most `RECORD_CHUNK_SIZE`) in a
    /// single batched call, returning the new record ids in order.
    async fn create_records(
        &self,
        app_token: &str,
        table_id: &str,
        chunk: &[record::RecordFields],
    ) -> Result<Vec<String>, AppError>;
}
