// src/constants.rs
//! Domain constants that define the operational boundaries of the system.
//!
//! Each constant is named for the domain concept it constrains, not its
//! technical role. Reading these constants should tell you the story of
//! how the system paces itself against two rate-limited services.

// ---------------------------------------------------------------------------
// Source platform (Xiaohongshu)
// ---------------------------------------------------------------------------

/// Base URL for all source-platform page fetches.
pub const XHS_BASE_URL: &str = "https://www.xiaohongshu.com";

/// The script assignment that carries the server-rendered state blob.
///
/// Every note, profile and search page embeds exactly one assignment of
/// this form; the JSON that follows it (up to the terminating `;`) is the
/// only machine-readable contract the platform offers.
pub const STATE_MARKER: &str = "window.__INITIAL_STATE__=";

/// Browser identity presented on every source-platform request.
///
/// The platform serves the embedded state blob only to requests that look
/// like a real browser session.
pub const SOURCE_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
    AppleWebKit/537.36 (KHTML, like Gecko) Chrome/117.0.0.0 Safari/537.36";

/// Pacing window between consecutive note fetches, in seconds.
///
/// A uniform random delay in this range separates note fetches in search,
/// timeline and batch loops. This is a correctness requirement, not an
/// optimization: fetching faster gets the session cookie banned.
pub const NOTE_PACING_SECS: (f64, f64) = (1.0, 2.0);

/// Pacing window between consecutive image downloads, in seconds.
pub const IMAGE_PACING_SECS: (f64, f64) = (0.5, 1.5);

// ---------------------------------------------------------------------------
// Destination API (Feishu open-apis)
// ---------------------------------------------------------------------------

/// Base URL for all destination REST calls.
pub const FEISHU_BASE_URL: &str = "https://open.feishu.cn/open-apis";

/// Maximum records per `batch_create` call, imposed by the destination.
pub const RECORD_CHUNK_SIZE: usize = 10;

/// Fixed pause between record chunks, in seconds.
pub const CHUNK_PACING_SECS: u64 = 1;

/// How long before its reported expiry a cached tenant token is treated
/// as stale. A token is never used inside this margin; it is replaced
/// before the call that would have needed it.
pub const TOKEN_SAFETY_MARGIN_SECS: u64 = 300;

// ---------------------------------------------------------------------------
// Network boundaries
// ---------------------------------------------------------------------------

/// Bounded wait for metadata calls (pages, schema, records), in seconds.
pub const METADATA_TIMEOUT_SECS: u64 = 30;

/// Bounded wait for attachment transfers (downloads and uploads), in
/// seconds. Larger than the metadata timeout because image payloads are.
pub const TRANSFER_TIMEOUT_SECS: u64 = 60;

// ---------------------------------------------------------------------------
// Error display
// ---------------------------------------------------------------------------

/// Maximum characters shown when previewing response bodies in errors.
pub const ERROR_BODY_PREVIEW_LENGTH: usize = 200;
