//! Lyrics adapter: LRCLIB lookups normalized to [`LyricsResponse`].
//!
//! Every public lookup returns `None` on both "no match" and provider
//! failure; failures are logged and never propagate. That is the
//! adapter's contract, not an accident of error handling.

pub mod lrclib;
pub mod parser;

pub use lrclib::LrclibClient;

use crate::model::{LyricsKind, LyricsMeta, LyricsResponse, Source};
use lrclib::LrclibRecord;
use tracing::warn;

/// Exact-match lookup by artist and title.
pub async fn by_artist_title(
    client: &LrclibClient,
    artist: &str,
    title: &str,
) -> Option<LyricsResponse> {
    match client.get_exact(title, artist).await {
        Ok(Some(record)) => build_response(record),
        Ok(None) => None,
        Err(err) => {
            warn!("lrclib exact lookup failed: {err:#}");
            None
        }
    }
}

/// Lookup by LRCLIB-native record id (the id part of an `lrclib_…`
/// track id).
pub async fn by_track_id(client: &LrclibClient, native_id: &str) -> Option<LyricsResponse> {
    match client.get_by_id(native_id).await {
        Ok(Some(record)) => build_response(record),
        Ok(None) => None,
        Err(err) => {
            warn!("lrclib id lookup failed: {err:#}");
            None
        }
    }
}

/// Free-text search; prefers a result with synced lyrics.
pub async fn by_query(client: &LrclibClient, query: &str) -> Option<LyricsResponse> {
    let results = match client.search(query).await {
        Ok(results) => results,
        Err(err) => {
            warn!("lrclib search failed: {err:#}");
            return None;
        }
    };

    let best = results
        .iter()
        .position(|r| r.synced_lyrics.as_deref().is_some_and(|s| !s.is_empty()))
        .unwrap_or(0);
    results.into_iter().nth(best).and_then(build_response)
}

/// Synced lyrics win over plain; a record with neither is no match.
fn build_response(record: LrclibRecord) -> Option<LyricsResponse> {
    let track_id = Source::Lrclib.encode(&record.id.to_string());
    let meta = LyricsMeta {
        provider: "lrclib".to_string(),
        copyright: None,
    };

    if let Some(synced) = record.synced_lyrics.as_deref()
        && !synced.is_empty()
    {
        return Some(LyricsResponse {
            track_id,
            kind: LyricsKind::Synced,
            lyrics: parser::parse_synced(synced),
            meta,
        });
    }

    if let Some(plain) = record.plain_lyrics.as_deref()
        && !plain.is_empty()
    {
        return Some(LyricsResponse {
            track_id,
            kind: LyricsKind::Static,
            lyrics: parser::parse_plain(plain),
            meta,
        });
    }

    None
}
