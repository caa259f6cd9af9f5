//! HTTP surface: shared state, router assembly, maintenance gate.

pub mod error;
pub mod routes;

use crate::cache::TimedCache;
use crate::config::Config;
use crate::itunes::ItunesClient;
use crate::lyrics::LrclibClient;
use crate::ytm::YtmClient;
use anyhow::Context;
use axum::extract::{Request, State};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Process-wide shared resources, built once at startup. The provider
/// clients are stateless apart from connection pooling, so a single
/// instance serves every request for the life of the process.
pub struct AppState {
    pub ytm: YtmClient,
    pub lrclib: LrclibClient,
    pub itunes: ItunesClient,
    /// Upstream audio fetches; connect timeout only, since a whole
    /// track takes longer than any request deadline.
    pub proxy: reqwest::Client,
    pub cache: TimedCache,
    pub maintenance: bool,
}

pub type SharedState = Arc<AppState>;

impl AppState {
    pub fn new(cfg: &Config) -> anyhow::Result<Self> {
        let proxy = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()
            .context("build proxy client")?;

        Ok(Self {
            ytm: YtmClient::new().context("build ytm client")?,
            lrclib: LrclibClient::new(),
            itunes: ItunesClient::new(),
            proxy,
            cache: TimedCache::new(),
            maintenance: cfg.maintenance,
        })
    }
}

pub fn router(state: SharedState) -> Router {
    let api = Router::new()
        .route("/search", get(routes::search))
        .route("/recommendations", get(routes::recommendations))
        .route("/lyrics", get(routes::lyrics))
        .route("/stream", get(routes::stream))
        .route("/audio/{id}", get(routes::audio));

    Router::new()
        .nest("/api/v1", api)
        .route("/health", get(routes::health))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            maintenance_gate,
        ))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Short-circuits every route except `/health` while the maintenance
/// flag is set.
async fn maintenance_gate(
    State(state): State<SharedState>,
    request: Request,
    next: Next,
) -> Response {
    if state.maintenance && request.uri().path() != "/health" {
        return error::ApiError::Maintenance.into_response();
    }
    next.run(request).await
}

pub async fn run(cfg: Config) -> anyhow::Result<()> {
    let state = Arc::new(AppState::new(&cfg)?);
    let app = router(state);

    let addr = format!("{}:{}", cfg.bind, cfg.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("bind {addr}"))?;
    info!("listening on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serve")?;
    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::Namespace;
    use crate::model::{LyricLine, LyricsKind, LyricsMeta, LyricsResponse, Source, StreamInfo, Track};
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode};
    use serde_json::Value;
    use tower::ServiceExt;

    fn test_state(maintenance: bool) -> SharedState {
        let cfg = Config {
            maintenance,
            ..Config::default()
        };
        Arc::new(AppState::new(&cfg).expect("state"))
    }

    fn track(native: &str) -> Track {
        Track {
            id: Source::Ytm.encode(native),
            title: "Title".to_string(),
            artist: "Artist".to_string(),
            album: None,
            cover_art: Some("https://img.example/x=w544-h544-l90-rj".to_string()),
            duration: 200.0,
            source: Source::Ytm,
        }
    }

    async fn get(app: Router, uri: &str) -> (StatusCode, Value) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    #[tokio::test]
    async fn health_is_ok() {
        let (status, body) = get(router(test_state(false)), "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn maintenance_gates_api_but_not_health() {
        let state = test_state(true);

        let (status, body) = get(router(state.clone()), "/api/v1/search?q=x").await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["code"], "MAINTENANCE");

        let (status, _) = get(router(state), "/health").await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn search_requires_a_query() {
        let state = test_state(false);

        let (status, body) = get(router(state.clone()), "/api/v1/search").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "MISSING_QUERY");

        // blank counts as missing
        let (status, _) = get(router(state), "/api/v1/search?q=+").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn search_serves_cached_results() {
        let state = test_state(false);
        state
            .cache
            .set(Namespace::Search, "hello", &vec![track("abc123")]);

        let (status, body) = get(router(state), "/api/v1/search?q=hello").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["results"][0]["id"], "ytm_abc123");
        assert_eq!(body["results"][0]["source"], "ytm");
        // camelCase on the wire
        assert!(body["results"][0].get("coverArt").is_some());
    }

    #[tokio::test]
    async fn lyrics_without_parameters_is_rejected() {
        let (status, body) = get(router(test_state(false)), "/api/v1/lyrics").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "MISSING_QUERY");
    }

    #[tokio::test]
    async fn lyrics_rejects_malformed_track_id() {
        let (status, body) =
            get(router(test_state(false)), "/api/v1/lyrics?trackId=bogus").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "INVALID_ID");
    }

    #[tokio::test]
    async fn lyrics_for_unroutable_source_is_not_found() {
        // well-formed id, but only the lyrics provider resolves by id
        let (status, body) =
            get(router(test_state(false)), "/api/v1/lyrics?trackId=itunes_5").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], "LYRICS_NOT_FOUND");
    }

    #[tokio::test]
    async fn lyrics_serves_cached_response() {
        let state = test_state(false);
        let cached = LyricsResponse {
            track_id: Source::Lrclib.encode("9"),
            kind: LyricsKind::Synced,
            lyrics: vec![LyricLine {
                time: 12.34,
                text: "Hello".to_string(),
                is_instrumental: false,
            }],
            meta: LyricsMeta {
                provider: "lrclib".to_string(),
                copyright: None,
            },
        };
        state.cache.set(Namespace::Lyrics, "Artist:Title", &cached);

        let (status, body) = get(
            router(state),
            "/api/v1/lyrics?artist=Artist&title=Title",
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["trackId"], "lrclib_9");
        assert_eq!(body["type"], "synced");
        assert_eq!(body["lyrics"][0]["isInstrumental"], false);
    }

    #[tokio::test]
    async fn stream_requires_an_identifier() {
        let (status, body) = get(router(test_state(false)), "/api/v1/stream").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "MISSING_QUERY");
    }

    #[tokio::test]
    async fn stream_serves_cached_url_for_both_id_forms() {
        let state = test_state(false);
        let info = StreamInfo {
            url: "https://cdn/audio".to_string(),
            duration: Some(200.0),
        };
        state.cache.set(Namespace::Stream, "vid_abc", &info);

        // prefixed id
        let (status, body) =
            get(router(state.clone()), "/api/v1/stream?videoId=ytm_abc").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["url"], "https://cdn/audio");

        // provider-native id hits the same entry
        let (status, body) = get(router(state), "/api/v1/stream?videoId=abc").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["url"], "https://cdn/audio");
    }

    #[tokio::test]
    async fn audio_rejects_malformed_and_unroutable_ids() {
        let state = test_state(false);

        let (status, body) = get(router(state.clone()), "/api/v1/audio/bogus").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "INVALID_ID");

        let (status, body) = get(router(state), "/api/v1/audio/lrclib_9").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], "TRACK_NOT_FOUND");
    }
}
