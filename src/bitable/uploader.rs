// src/bitable/uploader.rs
//! Batched record upload with partial-failure tolerance.
//!
//! Attachment resolution runs first, then records go to the destination
//! in chunks. A failed chunk is logged and skipped; ids already
//! collected are retained. The returned id count, not the input count,
//! is the ground truth of what actually landed.

use super::record::NoteRecord;
use super::BitableGateway;
use crate::constants::{CHUNK_PACING_SECS, RECORD_CHUNK_SIZE};
use serde_json::json;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

pub struct BatchUploader {
    gateway: Arc<dyn BitableGateway>,
}

impl BatchUploader {
    pub fn new(gateway: Arc<dyn BitableGateway>) -> Self {
        Self { gateway }
    }

    /// Uploads one local file into an attachment field.
    ///
    /// A missing local file is an immediate logged no-op, never a
    /// propagated error.
    pub async fn upload_attachment(
        &self,
        app_token: &str,
        table_id: &str,
        field_id: &str,
        path: &Path,
    ) -> Option<String> {
        if !path.exists() {
            log::error!("Attachment file does not exist: {}", path.display());
            return None;
        }

        log::info!("Uploading attachment {}", path.display());
        match self
            .gateway
            .upload_attachment(app_token, table_id, field_id, path)
            .await
        {
            Ok(token) => Some(token),
            Err(e) => {
                log::error!("Attachment upload failed for {}: {}", path.display(), e);
                None
            }
        }
    }

    /// Resolves every record's pending attachment paths into file tokens.
    ///
    /// Only tokens that uploaded successfully land in the attachment
    /// field; the side-channel is discarded regardless of how many did.
    pub async fn resolve_attachments(
        &self,
        app_token: &str,
        table_id: &str,
        attachment_field_id: &str,
        records: &mut [NoteRecord],
    ) {
        for record in records.iter_mut() {
            if record.pending_attachments.is_empty() {
                continue;
            }

            let paths = std::mem::take(&mut record.pending_attachments);
            let mut tokens = Vec::new();
            for path in &paths {
                if let Some(token) = self
                    .upload_attachment(app_token, table_id, attachment_field_id, path)
                    .await
                {
                    tokens.push(json!({ "file_token": token }));
                }
            }

            if !tokens.is_empty() {
                record
                    .fields
                    .insert(attachment_field_id.to_string(), json!(tokens));
            }
        }
    }

    /// Writes records in chunks of at most `RECORD_CHUNK_SIZE`, returning
    /// the ids of every record that actually landed, in submission order.
    ///
    /// A chunk that fails is logged and skipped; remaining chunks are
    /// still attempted. A fixed pacing delay separates chunks.
    pub async fn write_records(
        &self,
        app_token: &str,
        table_id: &str,
        records: Vec<NoteRecord>,
    ) -> Vec<String> {
        let total = records.len();
        log::info!("Writing {} records in chunks of {}", total, RECORD_CHUNK_SIZE);

        let fields: Vec<_> = records.into_iter().map(|r| r.fields).collect();
        let mut record_ids = Vec::new();

        let chunk_count = fields.chunks(RECORD_CHUNK_SIZE).count();
        for (i, chunk) in fields.chunks(RECORD_CHUNK_SIZE).enumerate() {
            if i > 0 {
                tokio::time::sleep(Duration::from_secs(CHUNK_PACING_SECS)).await;
            }

            match self.gateway.create_records(app_token, table_id, chunk).await {
                Ok(ids) => {
                    log::info!(
                        "Chunk {}/{} created {} records",
                        i + 1,
                        chunk_count,
                        ids.len()
                    );
                    record_ids.extend(ids);
                }
                Err(e) => {
                    log::error!(
                        "Chunk {}/{} failed, skipping its {} records: {}",
                        i + 1,
                        chunk_count,
                        chunk.len(),
                        e
                    );
                }
            }
        }

        log::info!("Wrote {} of {} records", record_ids.len(), total);
        record_ids
    }
}
