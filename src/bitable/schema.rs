// src/bitable/schema.rs
//! Schema synchronization: provisioning the destination table shape and
//! mapping semantic field names to opaque destination field ids.
//!
//! Provisioning is idempotent-enough rather than transactional: a field
//! that fails to create is omitted from the map and downstream mapping
//! degrades gracefully instead of aborting.

use super::{BitableGateway, FieldInfo};
use crate::error::AppError;
use indexmap::IndexMap;
use serde_json::{json, Value};
use std::sync::Arc;

/// Destination field kinds this system provisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FieldKind {
    /// Single-line text. Also the fallback for anything unrecognized.
    #[default]
    ShortText,
    /// Multi-line text.
    LongText,
    Number,
    DateTime,
    Attachment,
}

impl FieldKind {
    /// The `type` value the field-creation endpoint expects.
    pub fn api_type(self) -> &'static str {
        match self {
            Self::ShortText | Self::LongText => "text",
            Self::Number => "number",
            Self::DateTime => "datetime",
            Self::Attachment => "attachment",
        }
    }

    /// Extra field properties, where the kind needs them.
    pub fn api_property(self) -> Option<Value> {
        match self {
            Self::LongText => Some(json!({ "multiple": true })),
            _ => None,
        }
    }
}

/// The fixed semantic fields of the standard note table, in their
/// declared (and provisioned) order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NoteField {
    NoteId,
    Title,
    Content,
    AuthorId,
    AuthorName,
    IpLocation,
    NoteType,
    NoteUrl,
    Likes,
    Collects,
    Comments,
    Shares,
    FollowerCount,
    PublishedAt,
    Tags,
    Attachments,
}

impl NoteField {
    /// Declared order; provisioning creates fields in exactly this order.
    pub const ALL: [NoteField; 16] = [
        Self::NoteId,
        Self::Title,
        Self::Content,
        Self::AuthorId,
        Self::AuthorName,
        Self::IpLocation,
        Self::NoteType,
        Self::NoteUrl,
        Self::Likes,
        Self::Collects,
        Self::Comments,
        Self::Shares,
        Self::FollowerCount,
        Self::PublishedAt,
        Self::Tags,
        Self::Attachments,
    ];

    /// The display name used both when creating the field and when
    /// discovering it in an existing table.
    pub fn display_name(self) -> &'static str {
        match self {
            Self::NoteId => "Note ID",
            Self::Title => "Title",
            Self::Content => "Content",
            Self::AuthorId => "Author ID",
            Self::AuthorName => "Author Name",
            Self::IpLocation => "IP Location",
            Self::NoteType => "Note Type",
            Self::NoteUrl => "Note URL",
            Self::Likes => "Likes",
            Self::Collects => "Collects",
            Self::Comments => "Comments",
            Self::Shares => "Shares",
            Self::FollowerCount => "Follower Count",
            Self::PublishedAt => "Published At",
            Self::Tags => "Tags",
            Self::Attachments => "Attachments",
        }
    }

    pub fn kind(self) -> FieldKind {
        match self {
            Self::Content | Self::Tags => FieldKind::LongText,
            Self::Likes
            | Self::Collects
            | Self::Comments
            | Self::Shares
            | Self::FollowerCount => FieldKind::Number,
            Self::PublishedAt => FieldKind::DateTime,
            Self::Attachments => FieldKind::Attachment,
            _ => FieldKind::ShortText,
        }
    }

    /// Looks a semantic field up by display name (used for discovery).
    fn from_display_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.display_name() == name)
    }
}

/// Translation table from semantic field to destination field id.
///
/// Insertion order follows the declared order; semantic fields the
/// destination doesn't have are simply absent, and values intended for
/// them are dropped at mapping time, not errored.
pub type FieldMap = IndexMap<NoteField, String>;

/// Provisions the destination shape, or reconciles with an existing one.
pub struct SchemaSynchronizer {
    gateway: Arc<dyn BitableGateway>,
}

impl SchemaSynchronizer {
    pub fn new(gateway: Arc<dyn BitableGateway>) -> Self {
        Self { gateway }
    }

    /// Creates a new destination app (container).
    pub async fn ensure_app(&self, name: &str) -> Result<String, AppError> {
        log::info!("Creating Bitable app '{}'", name);
        let app_token = self.gateway.create_app(name).await?;
        log::info!("Created app {}", app_token);
        Ok(app_token)
    }

    /// Creates a table inside an app.
    pub async fn ensure_table(&self, app_token: &str, name: &str) -> Result<String, AppError> {
        log::info!("Creating table '{}'", name);
        let table_id = self.gateway.create_table(app_token, name).await?;
        log::info!("Created table {}", table_id);
        Ok(table_id)
    }

    /// Creates one semantic field and returns its destination id.
    pub async fn ensure_field(
        &self,
        app_token: &str,
        table_id: &str,
        field: NoteField,
    ) -> Result<String, AppError> {
        self.gateway
            .create_field(app_token, table_id, field.display_name(), field.kind())
            .await
    }

    /// Creates the standard note table and its full field set.
    ///
    /// Fields are created in declared order; one that fails to create is
    /// logged and omitted from the map. Partial provisioning is
    /// acceptable; record mapping degrades instead of aborting.
    pub async fn provision_note_table(
        &self,
        app_token: &str,
        table_name: &str,
    ) -> Result<(String, FieldMap), AppError> {
        let table_id = self.ensure_table(app_token, table_name).await?;

        let mut field_map = FieldMap::new();
        for field in NoteField::ALL {
            match self.ensure_field(app_token, &table_id, field).await {
                Ok(field_id) => {
                    field_map.insert(field, field_id);
                }
                Err(e) => {
                    log::warn!(
                        "Field '{}' could not be created, records will omit it: {}",
                        field.display_name(),
                        e
                    );
                }
            }
        }

        log::info!(
            "Provisioned table {} with {} of {} fields",
            table_id,
            field_map.len(),
            NoteField::ALL.len()
        );
        Ok((table_id, field_map))
    }

    /// Builds the field map for an existing table by display name.
    ///
    /// Display names the standard set doesn't know are ignored; standard
    /// fields the table doesn't have are absent from the map.
    pub async fn list_fields(
        &self,
        app_token: &str,
        table_id: &str,
    ) -> Result<FieldMap, AppError> {
        let fields = self.gateway.list_fields(app_token, table_id).await?;
        Ok(field_map_from(&fields))
    }
}

/// Matches reported fields against the standard set, preserving the
/// declared order in the resulting map.
fn field_map_from(fields: &[FieldInfo]) -> FieldMap {
    let mut map = FieldMap::new();
    for field in NoteField::ALL {
        if let Some(info) = fields
            .iter()
            .find(|f| NoteField::from_display_name(&f.field_name) == Some(field))
        {
            map.insert(field, info.field_id.clone());
        }
    }
    map
}
