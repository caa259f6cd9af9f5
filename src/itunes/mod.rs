//! iTunes Search API client (catalog provider).
//!
//! Consulted when the primary search provider comes back empty, so an
//! outage degrades to catalog-only results instead of an empty page.

use crate::model::{Source, Track};
use serde::Deserialize;
use std::time::Duration;
use tracing::warn;

#[derive(Debug, Deserialize)]
struct SearchPayload {
    #[serde(default)]
    results: Vec<ItunesItem>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
struct ItunesItem {
    track_id: Option<i64>,
    track_name: Option<String>,
    artist_name: Option<String>,
    collection_name: Option<String>,
    artwork_url100: Option<String>,
    track_time_millis: Option<f64>,
}

#[derive(Debug, Clone)]
pub struct ItunesClient {
    client: reqwest::Client,
    base_url: String,
}

impl ItunesClient {
    const DEFAULT_BASE_URL: &'static str = "https://itunes.apple.com/search";

    pub fn new() -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(10))
                .build()
                .expect("failed to create reqwest client"),
            base_url: Self::DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Search the song catalog. Returns an empty list on any provider
    /// failure; the failure is logged, never propagated.
    pub async fn search(&self, query: &str, limit: usize) -> Vec<Track> {
        match self.search_inner(query, limit).await {
            Ok(tracks) => tracks,
            Err(err) => {
                warn!("itunes search failed: {err:#}");
                Vec::new()
            }
        }
    }

    async fn search_inner(&self, query: &str, limit: usize) -> anyhow::Result<Vec<Track>> {
        let url = format!(
            "{}?term={}&entity=song&media=music&limit={limit}",
            self.base_url,
            urlencoding::encode(query)
        );

        let payload: SearchPayload = self
            .client
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(payload.results.iter().filter_map(map_item).collect())
    }
}

impl Default for ItunesClient {
    fn default() -> Self {
        Self::new()
    }
}

/// Items without a catalog track id are skipped; every other missing
/// field gets a safe default.
fn map_item(item: &ItunesItem) -> Option<Track> {
    let track_id = item.track_id?;

    Some(Track {
        id: Source::Itunes.encode(&track_id.to_string()),
        title: item.track_name.clone().unwrap_or_else(|| "Unknown".to_string()),
        artist: item.artist_name.clone().unwrap_or_else(|| "Unknown".to_string()),
        album: item.collection_name.clone(),
        cover_art: item.artwork_url100.as_deref().map(canonical_artwork),
        duration: item.track_time_millis.filter(|ms| *ms >= 0.0).unwrap_or(0.0) / 1000.0,
        source: Source::Itunes,
    })
}

/// iTunes hands out 100x100 artwork by default; the same path serves a
/// 600x600 variant.
fn canonical_artwork(url: &str) -> String {
    url.replace("100x100bb", "600x600bb")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_catalog_items() {
        let item = ItunesItem {
            track_id: Some(42),
            track_name: Some("Song".to_string()),
            artist_name: Some("Artist".to_string()),
            collection_name: Some("Album".to_string()),
            artwork_url100: Some("https://a.example/cover/100x100bb.jpg".to_string()),
            track_time_millis: Some(215_000.0),
        };
        let track = map_item(&item).expect("track");
        assert_eq!(track.id, "itunes_42");
        assert_eq!(track.duration, 215.0);
        assert_eq!(track.source, Source::Itunes);
        assert_eq!(
            track.cover_art.as_deref(),
            Some("https://a.example/cover/600x600bb.jpg")
        );
    }

    #[test]
    fn skips_items_without_track_id() {
        assert!(map_item(&ItunesItem::default()).is_none());
    }

    #[test]
    fn missing_fields_get_defaults() {
        let track = map_item(&ItunesItem {
            track_id: Some(7),
            ..ItunesItem::default()
        })
        .expect("track");
        assert_eq!(track.title, "Unknown");
        assert_eq!(track.artist, "Unknown");
        assert_eq!(track.duration, 0.0);
        assert!(track.cover_art.is_none());
    }
}
