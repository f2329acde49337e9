// src/bitable/record.rs
//! Record mapping: pure conversion from extracted entities to
//! destination records.
//!
//! No I/O happens here. For every semantic field present in the map the
//! matching attribute is copied; fields absent from the map are silently
//! skipped. Attachment paths ride in a side-channel that the uploader
//! resolves into file tokens before the batch write.

use super::schema::{FieldMap, NoteField};
use crate::constants::XHS_BASE_URL;
use crate::model::{Note, PublishTime, User};
use chrono::Local;
use serde_json::{json, Value};
use std::path::PathBuf;

/// The field-id → value mapping one batched-create call carries per record.
pub type RecordFields = serde_json::Map<String, Value>;

/// One destination record plus its not-yet-uploaded attachments.
#[derive(Debug, Clone, Default)]
pub struct NoteRecord {
    pub fields: RecordFields,
    /// Local attachment paths awaiting upload. Consumed by the uploader;
    /// the attachment field itself is populated only after successful
    /// per-image upload.
    pub pending_attachments: Vec<PathBuf>,
}

/// Converts one note (and, when fetched, its author) into a destination
/// record keyed by field id.
pub fn to_record(
    note: &Note,
    user: Option<&User>,
    field_map: &FieldMap,
    attachment_paths: &[PathBuf],
) -> NoteRecord {
    let mut record = NoteRecord::default();

    let mut put = |field: NoteField, value: Value| {
        if let Some(field_id) = field_map.get(&field) {
            record.fields.insert(field_id.clone(), value);
        }
    };

    put(NoteField::NoteId, json!(note.note_id));
    put(NoteField::Title, json!(note.title));
    put(NoteField::Content, json!(note.desc));
    put(NoteField::AuthorId, json!(note.user_id));
    put(NoteField::AuthorName, json!(note.nickname));
    put(NoteField::IpLocation, json!(note.ip_location));
    put(NoteField::NoteType, json!(note.note_type));
    put(
        NoteField::NoteUrl,
        json!(format!("{}/explore/{}", XHS_BASE_URL, note.note_id)),
    );
    put(NoteField::Likes, json!(note.liked_count));
    put(NoteField::Collects, json!(note.collected_count));
    put(NoteField::Comments, json!(note.comment_count));
    put(NoteField::Shares, json!(note.share_count));

    if let Some(user) = user {
        put(NoteField::FollowerCount, json!(user.fans));
    }

    if let Some(published) = format_publish_time(&note.upload_time) {
        put(NoteField::PublishedAt, json!(published));
    }

    // An empty tag list produces no entry at all, not an empty string.
    if !note.tag_list.is_empty() {
        put(NoteField::Tags, json!(note.tag_list.join(", ")));
    }

    if field_map.contains_key(&NoteField::Attachments) && !attachment_paths.is_empty() {
        record.pending_attachments = attachment_paths.to_vec();
    }

    record
}

/// Renders a publish timestamp for the destination.
///
/// Epoch milliseconds become an ISO-8601 local-time string; a raw string
/// passes through unchanged; an absent timestamp maps to nothing.
fn format_publish_time(time: &PublishTime) -> Option<String> {
    match time {
        PublishTime::Millis(ms) => chrono::DateTime::from_timestamp_millis(*ms)
            .map(|utc| utc.with_timezone(&Local).to_rfc3339()),
        PublishTime::Raw(s) if !s.is_empty() => Some(s.clone()),
        PublishTime::Raw(_) => None,
    }
}
