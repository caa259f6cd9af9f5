use crate::model::{Source, Track};
use anyhow::Context;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue, ORIGIN, REFERER, USER_AGENT};
use serde_json::{Value, json};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::OnceCell;
use tracing::warn;

/// Canonical square size requested for cover art; the feed's default
/// thumbnails are too small to display full-screen.
const THUMBNAIL_SIZE: u32 = 544;

#[derive(Debug)]
struct Inner {
    http: reqwest::Client,
    bootstrap: OnceCell<Bootstrap>,
}

/// Innertube client. Cheap to clone; one instance is shared across all
/// requests for its connection pool and bootstrap state.
#[derive(Debug, Clone)]
pub struct YtmClient {
    inner: Arc<Inner>,
}

#[derive(Debug, Clone)]
struct Bootstrap {
    api_key: String,
    client_version: String,
    visitor_data: Option<String>,
}

impl YtmClient {
    pub fn new() -> anyhow::Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_static("Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/121.0.0.0 Safari/537.36"),
        );
        headers.insert(ORIGIN, HeaderValue::from_static("https://music.youtube.com"));
        headers.insert(REFERER, HeaderValue::from_static("https://music.youtube.com/"));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(10))
            .build()
            .context("build reqwest client")?;

        Ok(Self {
            inner: Arc::new(Inner {
                http,
                bootstrap: OnceCell::new(),
            }),
        })
    }

    /// Search for songs. Returns an empty list on any provider failure;
    /// the failure is logged, never propagated.
    pub async fn search(&self, query: &str, limit: usize) -> Vec<Track> {
        match self.search_raw(query).await {
            Ok(v) => {
                let mut tracks = extract_search_tracks(&v);
                tracks.truncate(limit);
                tracks
            }
            Err(err) => {
                warn!("ytm search failed: {err:#}");
                Vec::new()
            }
        }
    }

    /// Home-feed recommendations. Same empty-on-failure contract as
    /// [`Self::search`].
    pub async fn recommendations(&self, limit: usize) -> Vec<Track> {
        match self.browse_home_raw().await {
            Ok(v) => {
                let mut seen = HashSet::new();
                let mut tracks: Vec<Track> = extract_home_tracks(&v)
                    .into_iter()
                    .filter(|t| seen.insert(t.id.clone()))
                    .collect();
                tracks.truncate(limit);
                tracks
            }
            Err(err) => {
                warn!("ytm recommendations failed: {err:#}");
                Vec::new()
            }
        }
    }

    async fn search_raw(&self, query: &str) -> anyhow::Result<Value> {
        let b = self.bootstrap().await?;

        let body = json!({
            "context": {
                "client": {
                    "clientName": "WEB_REMIX",
                    "clientVersion": b.client_version,
                }
            },
            "query": query,
            // Biases the search towards songs; search still returns
            // items if YouTube changes behavior.
            "params": "EgWKAQIIAWoKEAkQBRAKEAMQBA%3D%3D"
        });

        let v: Value = self
            .innertube_post("search", &b)
            .json(&body)
            .send()
            .await
            .context("send search request")?
            .error_for_status()
            .context("search http status")?
            .json()
            .await
            .context("parse search json")?;
        Ok(v)
    }

    async fn browse_home_raw(&self) -> anyhow::Result<Value> {
        let b = self.bootstrap().await?;
        let body = json!({
            "context": {
                "client": {
                    "clientName": "WEB_REMIX",
                    "clientVersion": b.client_version,
                }
            },
            "browseId": "FEmusic_home"
        });

        let v: Value = self
            .innertube_post("browse", &b)
            .json(&body)
            .send()
            .await
            .context("send browse home request")?
            .error_for_status()
            .context("browse home http status")?
            .json()
            .await
            .context("parse browse home json")?;
        Ok(v)
    }

    /// Raw player response for a video id; carries the streaming format
    /// lists that [`crate::ytm::resolve`] picks through.
    pub(crate) async fn player_raw(&self, video_id: &str) -> anyhow::Result<Value> {
        let b = self.bootstrap().await?;
        let body = json!({
            "context": {
                "client": {
                    "clientName": "WEB_REMIX",
                    "clientVersion": b.client_version,
                }
            },
            "videoId": video_id
        });

        let v: Value = self
            .innertube_post("player", &b)
            .json(&body)
            .send()
            .await
            .context("send player request")?
            .error_for_status()
            .context("player http status")?
            .json()
            .await
            .context("parse player json")?;
        Ok(v)
    }

    async fn bootstrap(&self) -> anyhow::Result<Bootstrap> {
        self.inner
            .bootstrap
            .get_or_try_init(|| async {
                let html = self
                    .inner
                    .http
                    .get("https://music.youtube.com/")
                    .send()
                    .await
                    .context("fetch music.youtube.com for bootstrap")?
                    .error_for_status()
                    .context("bootstrap http status")?
                    .text()
                    .await
                    .context("read bootstrap html")?;

                let api_key = parse_ytcfg_value(&html, "INNERTUBE_API_KEY")
                    .context("parse INNERTUBE_API_KEY")?;
                let client_version = parse_ytcfg_value(&html, "INNERTUBE_CLIENT_VERSION")
                    .context("parse INNERTUBE_CLIENT_VERSION")?;
                let visitor_data = parse_ytcfg_value(&html, "VISITOR_DATA");

                Ok(Bootstrap {
                    api_key,
                    client_version,
                    visitor_data,
                })
            })
            .await
            .cloned()
    }

    fn innertube_post(&self, path: &str, b: &Bootstrap) -> reqwest::RequestBuilder {
        let url = format!(
            "https://music.youtube.com/youtubei/v1/{path}?key={}&prettyPrint=false",
            b.api_key
        );

        let mut rb = self
            .inner
            .http
            .post(url)
            .header("X-Youtube-Client-Name", "67")
            .header("X-Youtube-Client-Version", b.client_version.as_str());

        if let Some(v) = b.visitor_data.as_deref() {
            rb = rb.header("X-Goog-Visitor-Id", v);
        }

        rb
    }
}

fn extract_search_tracks(v: &Value) -> Vec<Track> {
    // Best-effort extraction; YouTube's structure changes often. We scan
    // for `musicResponsiveListItemRenderer` nodes with a playable
    // `watchEndpoint.videoId` and map each defensively.
    let mut out = Vec::new();
    scan_value(
        v,
        &mut |node| {
            let r = node.get("musicResponsiveListItemRenderer")?;
            map_list_item(r)
        },
        &mut out,
    );
    out
}

fn extract_home_tracks(v: &Value) -> Vec<Track> {
    // The home feed mixes list items with two-row tiles.
    let mut out = Vec::new();
    scan_value(
        v,
        &mut |node| {
            if let Some(r) = node.get("musicResponsiveListItemRenderer") {
                return map_list_item(r);
            }
            if let Some(r) = node.get("musicTwoRowItemRenderer") {
                return map_two_row_item(r);
            }
            None
        },
        &mut out,
    );
    out
}

/// Map one search/browse list item to a Track. Items without a playable
/// video id are skipped; every other missing field gets a safe default.
fn map_list_item(r: &Value) -> Option<Track> {
    let video_id = extract_video_id_from_item(r)?;

    let title = r
        .pointer("/flexColumns/0/musicResponsiveListItemFlexColumnRenderer/text/runs/0/text")
        .and_then(Value::as_str)
        .unwrap_or("Unknown")
        .to_string();

    // Byline runs are artist / album / duration interleaved with
    // separator runs.
    let byline: Vec<&str> = r
        .pointer("/flexColumns/1/musicResponsiveListItemFlexColumnRenderer/text/runs")
        .and_then(Value::as_array)
        .map(|runs| {
            runs.iter()
                .filter_map(|run| run.get("text").and_then(Value::as_str))
                .filter(|t| !is_separator(t))
                .collect()
        })
        .unwrap_or_default();

    let artist = byline.first().copied().unwrap_or("Unknown").to_string();
    let duration = byline
        .iter()
        .rev()
        .find_map(|t| t.contains(':').then(|| parse_duration_text(t)).flatten())
        .unwrap_or(0.0);
    let album = (byline.len() >= 3).then(|| byline[1].to_string());

    let cover_art = r
        .pointer("/thumbnail/musicThumbnailRenderer/thumbnail/thumbnails")
        .and_then(best_thumbnail);

    Some(Track {
        id: Source::Ytm.encode(&video_id),
        title,
        artist,
        album,
        cover_art,
        duration,
        source: Source::Ytm,
    })
}

/// Two-row home tiles carry no album or timing.
fn map_two_row_item(r: &Value) -> Option<Track> {
    let video_id = r
        .pointer("/navigationEndpoint/watchEndpoint/videoId")
        .and_then(Value::as_str)?;

    let title = r
        .pointer("/title/runs/0/text")
        .and_then(Value::as_str)
        .unwrap_or("Unknown")
        .to_string();

    let artist = r
        .pointer("/subtitle/runs/0/text")
        .and_then(Value::as_str)
        .unwrap_or("Unknown")
        .to_string();

    let cover_art = r
        .pointer("/thumbnailRenderer/musicThumbnailRenderer/thumbnail/thumbnails")
        .and_then(best_thumbnail);

    Some(Track {
        id: Source::Ytm.encode(video_id),
        title,
        artist,
        album: None,
        cover_art,
        duration: 0.0,
        source: Source::Ytm,
    })
}

fn is_separator(text: &str) -> bool {
    matches!(text.trim(), "" | "•" | "&")
}

/// Parse a duration as `mm:ss` / `h:mm:ss` text or a raw seconds field.
pub(crate) fn parse_duration_text(text: &str) -> Option<f64> {
    let parts: Vec<&str> = text.trim().split(':').collect();
    match parts.len() {
        1 => parts[0].parse::<f64>().ok().filter(|s| s.is_finite() && *s >= 0.0),
        2 => {
            let mins: u32 = parts[0].parse().ok()?;
            let secs: u32 = parts[1].parse().ok()?;
            Some(f64::from(mins * 60 + secs))
        }
        3 => {
            let hours: u32 = parts[0].parse().ok()?;
            let mins: u32 = parts[1].parse().ok()?;
            let secs: u32 = parts[2].parse().ok()?;
            Some(f64::from(hours * 3600 + mins * 60 + secs))
        }
        _ => None,
    }
}

/// Pick the widest candidate and request a canonical square variant
/// instead of trusting the provider's default size.
fn best_thumbnail(thumbs: &Value) -> Option<String> {
    let arr = thumbs.as_array()?;
    let best = arr
        .iter()
        .max_by_key(|t| t.get("width").and_then(Value::as_u64).unwrap_or(0))?;
    let url = best.get("url").and_then(Value::as_str)?;
    Some(canonical_thumbnail(url, THUMBNAIL_SIZE))
}

fn canonical_thumbnail(url: &str, size: u32) -> String {
    match url.split_once("=w") {
        Some((base, _)) => format!("{base}=w{size}-h{size}-l90-rj"),
        None => url.to_string(),
    }
}

fn extract_video_id_from_item(r: &Value) -> Option<String> {
    // Seen variants:
    // - musicResponsiveListItemRenderer.navigationEndpoint.watchEndpoint.videoId
    // - musicResponsiveListItemRenderer.flexColumns[0]...runs[0].navigationEndpoint.watchEndpoint.videoId
    r.pointer("/navigationEndpoint/watchEndpoint/videoId")
        .and_then(Value::as_str)
        .map(str::to_string)
        .or_else(|| {
            r.pointer(
                "/flexColumns/0/musicResponsiveListItemFlexColumnRenderer/text/runs/0/navigationEndpoint/watchEndpoint/videoId",
            )
            .and_then(Value::as_str)
            .map(str::to_string)
        })
}

fn parse_ytcfg_value(html: &str, key: &str) -> Option<String> {
    // We look for `"KEY":"value"` occurrences in the initial HTML ytcfg
    // payload.
    let needle = format!("{key}\":\"");
    let idx = html.find(&needle)?;
    let start = idx + needle.len();
    let rest = &html[start..];
    let end = rest.find('"')?;
    Some(rest[..end].to_string())
}

fn scan_value<F>(v: &Value, f: &mut F, out: &mut Vec<Track>)
where
    F: FnMut(&Value) -> Option<Track>,
{
    if let Some(t) = f(v) {
        out.push(t);
        // keep scanning; duplicates are dropped by the caller
    }
    match v {
        Value::Array(a) => {
            for x in a {
                scan_value(x, f, out);
            }
        }
        Value::Object(o) => {
            for (_, x) in o {
                scan_value(x, f, out);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list_item(video_id: Option<&str>) -> Value {
        let mut nav = json!({});
        if let Some(id) = video_id {
            nav = json!({ "watchEndpoint": { "videoId": id } });
        }
        json!({
            "musicResponsiveListItemRenderer": {
                "navigationEndpoint": nav,
                "flexColumns": [
                    { "musicResponsiveListItemFlexColumnRenderer": {
                        "text": { "runs": [ { "text": "Song Title" } ] }
                    }},
                    { "musicResponsiveListItemFlexColumnRenderer": {
                        "text": { "runs": [
                            { "text": "Artist Name" },
                            { "text": " • " },
                            { "text": "Album Name" },
                            { "text": " • " },
                            { "text": "3:45" }
                        ]}
                    }}
                ],
                "thumbnail": { "musicThumbnailRenderer": { "thumbnail": { "thumbnails": [
                    { "url": "https://img.example/x=w60-h60-l90-rj", "width": 60, "height": 60 },
                    { "url": "https://img.example/x=w120-h120-l90-rj", "width": 120, "height": 120 }
                ]}}}
            }
        })
    }

    #[test]
    fn maps_search_items() {
        let v = json!({ "contents": [ list_item(Some("abc123")) ] });
        let tracks = extract_search_tracks(&v);
        assert_eq!(tracks.len(), 1);
        let t = &tracks[0];
        assert_eq!(t.id, "ytm_abc123");
        assert_eq!(t.title, "Song Title");
        assert_eq!(t.artist, "Artist Name");
        assert_eq!(t.album.as_deref(), Some("Album Name"));
        assert_eq!(t.duration, 225.0);
        assert_eq!(t.source, Source::Ytm);
        assert_eq!(
            t.cover_art.as_deref(),
            Some("https://img.example/x=w544-h544-l90-rj")
        );
    }

    #[test]
    fn skips_items_without_video_id() {
        let v = json!({ "contents": [ list_item(None), list_item(Some("keepme")) ] });
        let tracks = extract_search_tracks(&v);
        assert_eq!(tracks.len(), 1);
        assert_eq!(tracks[0].id, "ytm_keepme");
    }

    #[test]
    fn maps_home_two_row_tiles() {
        let v = json!({ "items": [ {
            "musicTwoRowItemRenderer": {
                "navigationEndpoint": { "watchEndpoint": { "videoId": "home1" } },
                "title": { "runs": [ { "text": "Home Song" } ] },
                "subtitle": { "runs": [ { "text": "Home Artist" } ] }
            }
        } ] });
        let tracks = extract_home_tracks(&v);
        assert_eq!(tracks.len(), 1);
        assert_eq!(tracks[0].id, "ytm_home1");
        assert_eq!(tracks[0].duration, 0.0);
        assert_eq!(tracks[0].artist, "Home Artist");
    }

    #[test]
    fn test_parse_duration_text() {
        assert_eq!(parse_duration_text("3:45"), Some(225.0));
        assert_eq!(parse_duration_text("1:02:03"), Some(3723.0));
        assert_eq!(parse_duration_text("253"), Some(253.0));
        assert_eq!(parse_duration_text("junk"), None);
        assert_eq!(parse_duration_text("1:2:3:4"), None);
        assert_eq!(parse_duration_text("-5"), None);
    }

    #[test]
    fn test_canonical_thumbnail() {
        assert_eq!(
            canonical_thumbnail("https://img.example/a=w120-h120-l90-rj", 544),
            "https://img.example/a=w544-h544-l90-rj"
        );
        // urls without a size suffix pass through
        assert_eq!(
            canonical_thumbnail("https://img.example/plain.jpg", 544),
            "https://img.example/plain.jpg"
        );
    }

    #[test]
    fn test_parse_ytcfg_value() {
        let html = r#"ytcfg.set({"INNERTUBE_API_KEY":"key123","INNERTUBE_CLIENT_VERSION":"1.2"});"#;
        assert_eq!(
            parse_ytcfg_value(html, "INNERTUBE_API_KEY").as_deref(),
            Some("key123")
        );
        assert_eq!(parse_ytcfg_value(html, "MISSING"), None);
    }
}
