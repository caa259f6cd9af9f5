//! Audio stream resolution.
//!
//! The player response is inconsistent about where a playable URL
//! lives, so extraction walks a fallback chain: a dedicated audio
//! encoding first, then any adaptive encoding with a URL, then the
//! muxed format list. Formats carrying only a `signatureCipher` need a
//! deciphering step this service does not perform and count as having
//! no URL.

use crate::model::StreamInfo;
use crate::ytm::api::{self, YtmClient};
use serde_json::Value;
use tracing::warn;

/// Resolve a playable audio URL for a provider-native video id.
/// Returns `None` on any provider failure or when no format carries a
/// usable URL; failures are logged, never propagated.
pub async fn resolve_stream(client: &YtmClient, video_id: &str) -> Option<StreamInfo> {
    match client.player_raw(video_id).await {
        Ok(v) => extract_stream(&v),
        Err(err) => {
            warn!("stream resolution failed for {video_id}: {err:#}");
            None
        }
    }
}

fn extract_stream(v: &Value) -> Option<StreamInfo> {
    let streaming = v.get("streamingData")?;
    let url = best_audio_url(streaming)?;

    let duration = v
        .pointer("/videoDetails/lengthSeconds")
        .and_then(seconds_value);

    Some(StreamInfo { url, duration })
}

fn best_audio_url(streaming: &Value) -> Option<String> {
    let adaptive = format_list(streaming, "adaptiveFormats");

    // 1. a dedicated audio encoding
    if let Some(url) = adaptive.iter().find_map(|f| audio_url(f)) {
        return Some(url);
    }
    // 2. any adaptive encoding with a usable url
    if let Some(url) = adaptive.iter().find_map(|f| plain_url(f)) {
        return Some(url);
    }
    // 3. the muxed format list as a last resort
    format_list(streaming, "formats")
        .iter()
        .find_map(|f| plain_url(f))
}

fn format_list<'a>(streaming: &'a Value, key: &str) -> &'a [Value] {
    streaming
        .get(key)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default()
}

fn audio_url(format: &Value) -> Option<String> {
    let mime = format.get("mimeType").and_then(Value::as_str)?;
    if !mime.contains("audio") {
        return None;
    }
    plain_url(format)
}

fn plain_url(format: &Value) -> Option<String> {
    format
        .get("url")
        .and_then(Value::as_str)
        .map(str::to_string)
}

/// `lengthSeconds` arrives as a string in player responses, but browse
/// surfaces hand out numbers.
fn seconds_value(v: &Value) -> Option<f64> {
    v.as_f64()
        .or_else(|| v.as_str().and_then(|s| api::parse_duration_text(s)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn prefers_dedicated_audio_encoding() {
        let v = json!({
            "streamingData": {
                "adaptiveFormats": [
                    { "mimeType": "video/mp4; codecs=\"avc1\"", "url": "https://cdn/video" },
                    { "mimeType": "audio/webm; codecs=\"opus\"", "url": "https://cdn/audio" }
                ]
            },
            "videoDetails": { "lengthSeconds": "253" }
        });
        let info = extract_stream(&v).expect("stream");
        assert_eq!(info.url, "https://cdn/audio");
        assert_eq!(info.duration, Some(253.0));
    }

    #[test]
    fn falls_back_to_any_adaptive_url() {
        // cipher-only audio entries count as url-less
        let v = json!({
            "streamingData": {
                "adaptiveFormats": [
                    { "mimeType": "audio/webm; codecs=\"opus\"", "signatureCipher": "s=..." },
                    { "mimeType": "video/mp4; codecs=\"avc1\"", "url": "https://cdn/video" }
                ]
            }
        });
        let info = extract_stream(&v).expect("stream");
        assert_eq!(info.url, "https://cdn/video");
        assert_eq!(info.duration, None);
    }

    #[test]
    fn falls_back_to_muxed_formats() {
        let v = json!({
            "streamingData": {
                "adaptiveFormats": [
                    { "mimeType": "audio/webm; codecs=\"opus\"", "signatureCipher": "s=..." }
                ],
                "formats": [
                    { "mimeType": "video/mp4; codecs=\"avc1, mp4a\"", "url": "https://cdn/muxed" }
                ]
            }
        });
        let info = extract_stream(&v).expect("stream");
        assert_eq!(info.url, "https://cdn/muxed");
    }

    #[test]
    fn no_usable_format_is_no_stream() {
        let v = json!({
            "streamingData": {
                "adaptiveFormats": [
                    { "mimeType": "audio/webm; codecs=\"opus\"", "signatureCipher": "s=..." }
                ]
            }
        });
        assert!(extract_stream(&v).is_none());
        assert!(extract_stream(&json!({})).is_none());
    }
}
