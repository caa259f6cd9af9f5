//! Aggregation endpoints.
//!
//! Every handler follows the same shape: compute cache key, check the
//! timed cache, on miss call the right adapter(s), normalize, write the
//! cache, respond. Two concurrent misses for the same key may both
//! fetch; the duplication is harmless and not locked away.

use crate::cache::Namespace;
use crate::lyrics;
use crate::model::{LyricsResponse, SearchResponse, Source, StreamInfo, Track, id};
use crate::server::SharedState;
use crate::server::error::ApiError;
use crate::ytm::resolve;
use axum::Json;
use axum::body::Body;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, HeaderName, header};
use axum::response::{IntoResponse, Response};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::warn;

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    q: Option<String>,
}

pub async fn search(
    State(state): State<SharedState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchResponse>, ApiError> {
    let q = params
        .q
        .as_deref()
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .ok_or_else(ApiError::missing_query)?;

    if let Some(results) = state.cache.get(Namespace::Search, q) {
        return Ok(Json(SearchResponse { results }));
    }

    let mut results = state.ytm.search(q, 20).await;
    if results.is_empty() {
        results = state.itunes.search(q, 20).await;
    }
    // empty batches are not cached: a provider hiccup must not pin an
    // empty page for a full TTL
    if !results.is_empty() {
        state.cache.set(Namespace::Search, q, &results);
    }

    Ok(Json(SearchResponse { results }))
}

pub async fn recommendations(State(state): State<SharedState>) -> Json<SearchResponse> {
    if let Some(results) = state.cache.get(Namespace::Recommendations, "home") {
        return Json(SearchResponse { results });
    }

    let results = state.ytm.recommendations(20).await;
    if !results.is_empty() {
        state.cache.set(Namespace::Recommendations, "home", &results);
    }

    Json(SearchResponse { results })
}

#[derive(Debug, Deserialize)]
pub struct LyricsParams {
    #[serde(rename = "trackId")]
    track_id: Option<String>,
    query: Option<String>,
    artist: Option<String>,
    title: Option<String>,
}

pub async fn lyrics(
    State(state): State<SharedState>,
    Query(params): Query<LyricsParams>,
) -> Result<Json<LyricsResponse>, ApiError> {
    // artist:title is the exact-match path and doubles as the cache key;
    // otherwise an opaque track id or the free-text query stands in
    let cache_key = match (&params.artist, &params.title) {
        (Some(artist), Some(title)) => format!("{artist}:{title}"),
        _ => params
            .track_id
            .clone()
            .or_else(|| params.query.clone())
            .ok_or_else(ApiError::missing_query)?,
    };

    if let Some(cached) = state.cache.get(Namespace::Lyrics, &cache_key) {
        return Ok(Json(cached));
    }

    let result = if let (Some(artist), Some(title)) = (&params.artist, &params.title) {
        lyrics::by_artist_title(&state.lrclib, artist, title).await
    } else if let Some(track_id) = &params.track_id {
        match id::decode(track_id)? {
            (Source::Lrclib, native) => lyrics::by_track_id(&state.lrclib, native).await,
            // only the lyrics provider is addressable by id here
            _ => None,
        }
    } else if let Some(query) = &params.query {
        lyrics::by_query(&state.lrclib, query).await
    } else {
        None
    };

    let result = result.ok_or_else(ApiError::lyrics_not_found)?;
    state.cache.set(Namespace::Lyrics, &cache_key, &result);
    Ok(Json(result))
}

#[derive(Debug, Deserialize)]
pub struct StreamParams {
    artist: Option<String>,
    title: Option<String>,
    #[serde(rename = "videoId")]
    video_id: Option<String>,
}

pub async fn stream(
    State(state): State<SharedState>,
    Query(params): Query<StreamParams>,
) -> Result<Json<StreamInfo>, ApiError> {
    if let Some(raw) = &params.video_id {
        let native = id::native_of(Source::Ytm, raw);
        let info = resolve_cached(&state, native)
            .await
            .ok_or_else(ApiError::stream_not_found)?;
        return Ok(Json(info));
    }

    let (artist, title) = match (&params.artist, &params.title) {
        (Some(artist), Some(title)) => (artist, title),
        _ => return Err(ApiError::missing_query()),
    };

    // search-then-resolve; both steps go through their caches so the
    // two-step path does not double provider load
    let query = format!("{artist} {title}");
    let track = find_track(&state, &query)
        .await
        .ok_or_else(ApiError::track_not_found)?;
    let (source, native) = id::decode(&track.id)?;
    if source != Source::Ytm {
        return Err(ApiError::stream_not_found());
    }
    let native = native.to_string();

    let info = resolve_cached(&state, &native)
        .await
        .ok_or_else(ApiError::stream_not_found)?;
    Ok(Json(info))
}

/// Proxy resolved audio bytes so the upstream URL never reaches the
/// client. Byte-range headers pass through both ways, keeping seeking
/// intact end-to-end.
pub async fn audio(
    State(state): State<SharedState>,
    Path(track_id): Path<String>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let (source, native) = id::decode(&track_id)?;
    if source != Source::Ytm {
        return Err(ApiError::track_not_found());
    }

    let info = resolve_cached(&state, native)
        .await
        .ok_or_else(ApiError::stream_not_found)?;

    let mut request = state.proxy.get(&info.url);
    if let Some(range) = headers.get(header::RANGE) {
        request = request.header(header::RANGE, range.clone());
    }

    let upstream = match request.send().await {
        Ok(response) => response,
        Err(err) => {
            warn!("audio proxy fetch failed: {err:#}");
            return Err(ApiError::stream_not_found());
        }
    };
    if !upstream.status().is_success() {
        warn!("audio proxy upstream status {}", upstream.status());
        return Err(ApiError::stream_not_found());
    }

    const PASSTHROUGH: [HeaderName; 4] = [
        header::CONTENT_TYPE,
        header::CONTENT_LENGTH,
        header::CONTENT_RANGE,
        header::ACCEPT_RANGES,
    ];
    let mut mirrored = HeaderMap::new();
    for name in PASSTHROUGH {
        if let Some(value) = upstream.headers().get(&name) {
            mirrored.insert(name, value.clone());
        }
    }

    let status = upstream.status();
    let body = Body::from_stream(upstream.bytes_stream());
    Ok((status, mirrored, body).into_response())
}

/// Cache-aware stream resolution, shared by `/stream` and the audio
/// proxy. Keyed per video id so the search-then-resolve path and the
/// direct path hit the same entries.
async fn resolve_cached(state: &SharedState, video_id: &str) -> Option<StreamInfo> {
    let cache_key = format!("vid_{video_id}");
    if let Some(info) = state.cache.get(Namespace::Stream, &cache_key) {
        return Some(info);
    }

    let info = resolve::resolve_stream(&state.ytm, video_id).await?;
    state.cache.set(Namespace::Stream, &cache_key, &info);
    Some(info)
}

/// Cache-aware best-match search used by the artist/title stream path.
async fn find_track(state: &SharedState, query: &str) -> Option<Track> {
    if let Some(results) = state.cache.get::<Vec<Track>>(Namespace::Search, query) {
        return results.into_iter().next();
    }

    let results = state.ytm.search(query, 20).await;
    if results.is_empty() {
        return None;
    }
    state.cache.set(Namespace::Search, query, &results);
    results.into_iter().next()
}
