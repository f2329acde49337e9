// src/types.rs
//! Domain types: strong typing for identifiers and credentials.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::marker::PhantomData;

/// Strong typing for source-platform IDs with phantom types.
///
/// IDs are opaque alphanumeric tokens extracted from URLs or accepted
/// verbatim; the phantom marker keeps note and user IDs from crossing.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Id<T> {
    value: String,
    _phantom: PhantomData<T>,
}

/// Marker types for different ID kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NoteMarker;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UserMarker;

/// Type aliases for specific ID types
pub type NoteId = Id<NoteMarker>;
pub type UserId = Id<UserMarker>;

impl<T> Id<T> {
    /// Wraps an already validated token (internal use; validation lives
    /// in `extract::ids`).
    pub(crate) fn from_validated(value: String) -> Self {
        Self {
            value,
            _phantom: PhantomData,
        }
    }

    /// Get the ID as a string reference
    pub fn as_str(&self) -> &str {
        &self.value
    }
}

impl<T> fmt::Display for Id<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value)
    }
}

impl<T> Serialize for Id<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.value.serialize(serializer)
    }
}

impl<'de, T> Deserialize<'de> for Id<T> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        Ok(Self::from_validated(value))
    }
}

/// A caller-supplied source-platform session cookie.
///
/// Required for every page fetch; without it the platform serves a login
/// wall instead of the state blob. Debug output is redacted so the
/// credential never lands in logs.
#[derive(Clone)]
pub struct SessionCookie(String);

impl SessionCookie {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Debug for SessionCookie {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SessionCookie(***)")
    }
}

/// Feishu app credentials used to acquire tenant access tokens.
#[derive(Clone)]
pub struct AppCredentials {
    pub app_id: String,
    pub app_secret: String,
}

impl fmt::Debug for AppCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AppCredentials({}, ***)", self.app_id)
    }
}

/// Search result ordering offered by the source platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortMode {
    /// Platform-default relevance ordering.
    #[default]
    General,
    /// Most-liked first.
    MostLiked,
    /// Newest first.
    Newest,
}

impl SortMode {
    /// The numeric value the search endpoint expects.
    pub fn as_query_value(self) -> u8 {
        match self {
            Self::General => 0,
            Self::MostLiked => 1,
            Self::Newest => 2,
        }
    }
}
