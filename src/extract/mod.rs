// src/extract/mod.rs
//! Source-platform extraction: the ability to turn server-rendered
//! pages into typed entities.
//!
//! This module keeps a clear separation between I/O (`client`), the
//! staged state-blob parse (`state_blob`), identifier resolution (`ids`)
//! and the extraction logic itself (`extractor`).

pub mod client;
pub mod ids;
pub mod state_blob;

mod extractor;

pub use client::{PageFetcher, SourceHttpClient};
pub use extractor::ContentExtractor;
pub use ids::{resolve_note_id, resolve_user_id};
pub use state_blob::StateBlobError;

use std::time::Duration;

/// Sleeps a uniform random duration inside the given pacing window.
///
/// Pacing between outbound requests is a correctness requirement here,
/// not an optimization; callers insert it between items, never inside
/// them.
pub(crate) async fn pace(window: (f64, f64)) {
    let secs = {
        let mut rng = rand::rng();
        rand::Rng::random_range(&mut rng, window.0..=window.1)
    };
    tokio::time::sleep(Duration::from_secs_f64(secs)).await;
}
