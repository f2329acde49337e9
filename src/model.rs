// src/model.rs
//! Domain model: the entities extracted from the source platform.
//!
//! `Note` and `User` are flat record shapes with explicit defaults.
//! They are populated field-by-field from the parsed state blob and never
//! mutated afterwards; "field present" means "value differs from the
//! defined-absent default", checked once at the record-mapping boundary.

use serde::{Deserialize, Serialize};

/// A publish timestamp as the platform reports it.
///
/// The upstream payload carries either an epoch-millisecond integer or an
/// opaque preformatted string, with no way to tell in advance. Both forms
/// must round-trip through the snapshot format unchanged, so the raw shape
/// is preserved here; conversion to ISO-8601 happens only at the
/// record-mapping boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PublishTime {
    /// Epoch milliseconds.
    Millis(i64),
    /// An opaque string as delivered by the platform. Empty means absent.
    Raw(String),
}

impl Default for PublishTime {
    fn default() -> Self {
        Self::Raw(String::new())
    }
}

impl PublishTime {
    /// Whether the platform provided no timestamp at all.
    pub fn is_absent(&self) -> bool {
        matches!(self, Self::Raw(s) if s.is_empty())
    }
}

/// One content item extracted from the source platform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    pub note_id: String,
    pub title: String,
    pub desc: String,
    pub user_id: String,
    pub nickname: String,
    pub avatar: String,
    pub ip_location: String,
    pub liked_count: u64,
    pub collected_count: u64,
    pub comment_count: u64,
    pub share_count: u64,
    pub note_type: String,
    /// Image URLs in display order.
    pub image_list: Vec<String>,
    /// Tag names in upstream order; duplicates are preserved.
    pub tag_list: Vec<String>,
    pub upload_time: PublishTime,
}

impl Default for Note {
    fn default() -> Self {
        Self {
            note_id: String::new(),
            title: String::new(),
            desc: String::new(),
            user_id: String::new(),
            nickname: String::new(),
            avatar: String::new(),
            ip_location: String::new(),
            liked_count: 0,
            collected_count: 0,
            comment_count: 0,
            share_count: 0,
            note_type: "normal".to_string(),
            image_list: Vec::new(),
            tag_list: Vec::new(),
            upload_time: PublishTime::default(),
        }
    }
}

/// An author profile extracted from the source platform.
///
/// Users are deduplicated by `user_id` within a job: at most one profile
/// fetch per author, even when many notes reference them.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct User {
    pub user_id: String,
    pub nickname: String,
    pub avatar: String,
    pub desc: String,
    /// Platform-defined gender code.
    pub gender: u8,
    pub follows: u64,
    pub fans: u64,
    pub notes_count: u64,
    pub location: String,
}
