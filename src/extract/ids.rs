// src/extract/ids.rs
//! Identifier resolution: from raw URLs or bare tokens to typed IDs.
//!
//! Accepts either a full platform URL (the ID is the path segment after a
//! fixed prefix) or a bare alphanumeric token, and rejects everything
//! else. Rejection surfaces as `None` and aborts only the single item
//! that carried the bad reference.

use crate::types::{NoteId, UserId};
use once_cell::sync::Lazy;
use regex::Regex;

static NOTE_PATH: Lazy<Regex> = Lazy::new(|| Regex::new(r"/explore/(\w+)").unwrap());
static USER_PATH: Lazy<Regex> = Lazy::new(|| Regex::new(r"/user/profile/(\w+)").unwrap());
static BARE_TOKEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\w+$").unwrap());

/// Resolves a note reference to its ID, or `None` if unparseable.
pub fn resolve_note_id(input: &str) -> Option<NoteId> {
    resolve(input, &NOTE_PATH).map(NoteId::from_validated)
}

/// Resolves a user reference to its ID, or `None` if unparseable.
pub fn resolve_user_id(input: &str) -> Option<UserId> {
    resolve(input, &USER_PATH).map(UserId::from_validated)
}

fn resolve(input: &str, path_pattern: &Regex) -> Option<String> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }

    // Full URL: the ID is the captured path segment.
    if input.starts_with("http://") || input.starts_with("https://") {
        return path_pattern
            .captures(input)
            .map(|caps| caps[1].to_string());
    }

    // Bare token: accepted verbatim.
    if BARE_TOKEN.is_match(input) {
        return Some(input.to_string());
    }

    None
}
