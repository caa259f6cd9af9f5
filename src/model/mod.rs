//! Normalized response models shared by every provider adapter.
//!
//! Providers return wildly different shapes; everything the HTTP surface
//! serves is one of the types below. Instances are built fresh on each
//! cache miss and never mutated afterwards.

pub mod id;

pub use id::Source;

use serde::{Deserialize, Serialize};

/// A normalized song reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Track {
    /// Client-facing id, `{source}_{native_id}`. Built by [`Source::encode`].
    pub id: String,
    pub title: String,
    pub artist: String,
    pub album: Option<String>,
    pub cover_art: Option<String>,
    /// Seconds; 0 when the provider did not supply one at search time.
    pub duration: f64,
    pub source: Source,
}

/// One timed or untimed lyric entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LyricLine {
    /// Seconds from track start, rounded to 2 decimals. `-1` when the
    /// lyrics carry no timing (plain mode).
    pub time: f64,
    pub text: String,
    pub is_instrumental: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LyricsKind {
    Synced,
    Static,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LyricsMeta {
    pub provider: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub copyright: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LyricsResponse {
    pub track_id: String,
    #[serde(rename = "type")]
    pub kind: LyricsKind,
    /// Chronological for synced lyrics, document order for static.
    pub lyrics: Vec<LyricLine>,
    pub meta: LyricsMeta,
}

/// A resolved, playable audio location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamInfo {
    pub url: String,
    pub duration: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResponse {
    pub results: Vec<Track>,
}
