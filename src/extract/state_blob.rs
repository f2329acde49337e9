// src/extract/state_blob.rs
//! Embedded-state parsing: the only machine-readable contract the
//! source platform offers.
//!
//! Every server-rendered page carries exactly one script assignment of
//! the form `window.__INITIAL_STATE__=<JSON>;`. The payload is
//! unversioned and loosely structured, so parsing is staged: marker
//! found, JSON parsed, sub-object present. Each stage fails
//! independently and each failure is diagnosable on its own, which is
//! what keeps "the platform shifted its markup" a per-item skip instead
//! of a crash.

use crate::constants::STATE_MARKER;
use serde_json::Value;
use thiserror::Error;

/// Why a page's embedded state could not be read.
#[derive(Error, Debug)]
pub enum StateBlobError {
    #[error("state marker `{}` not found in page", STATE_MARKER)]
    MarkerAbsent,

    #[error("state blob is not valid JSON: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("state blob has no `{path}` section")]
    SectionMissing { path: &'static str },
}

/// Locates and parses the embedded state blob in a page.
///
/// The blob is cut at the first `;` after the marker, matching the
/// upstream script shape byte-for-byte.
pub fn parse_state(html: &str) -> Result<Value, StateBlobError> {
    let start = html.find(STATE_MARKER).ok_or(StateBlobError::MarkerAbsent)?;
    let rest = &html[start + STATE_MARKER.len()..];
    let json = rest.split(';').next().unwrap_or(rest);
    Ok(serde_json::from_str(json)?)
}

/// Reads a two-level sub-object out of the parsed state.
///
/// `path` is the dotted location used in error messages; the section is
/// missing when either level is absent or null.
pub fn section<'a>(
    state: &'a Value,
    outer: &str,
    inner: &str,
    path: &'static str,
) -> Result<&'a Value, StateBlobError> {
    state
        .get(outer)
        .and_then(|v| v.get(inner))
        .filter(|v| !v.is_null())
        .ok_or(StateBlobError::SectionMissing { path })
}
