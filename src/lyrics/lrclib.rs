//! LRCLIB API client
//!
//! LRCLIB is a free lyrics API that provides synchronized (LRC format)
//! lyrics. API Documentation: https://lrclib.net/docs

use serde::Deserialize;

/// One LRCLIB record, from either the get or the search endpoints.
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct LrclibRecord {
    pub id: i64,
    #[allow(dead_code)]
    #[serde(rename = "trackName")]
    pub track_name: String,
    #[allow(dead_code)]
    #[serde(rename = "artistName")]
    pub artist_name: String,
    #[allow(dead_code)]
    #[serde(rename = "albumName")]
    pub album_name: Option<String>,
    #[allow(dead_code)]
    pub duration: Option<f64>,
    #[serde(rename = "plainLyrics")]
    pub plain_lyrics: Option<String>,
    #[serde(rename = "syncedLyrics")]
    pub synced_lyrics: Option<String>,
}

/// LRCLIB API client
#[derive(Debug, Clone)]
pub struct LrclibClient {
    client: reqwest::Client,
    base_url: String,
}

impl LrclibClient {
    const DEFAULT_BASE_URL: &'static str = "https://lrclib.net/api";
    const USER_AGENT: &'static str = "cadence/0.1.0 (https://github.com/cadence)";

    /// Create a new LRCLIB client
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::builder()
                .user_agent(Self::USER_AGENT)
                .timeout(std::time::Duration::from_secs(10))
                .build()
                .expect("failed to create reqwest client"),
            base_url: Self::DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Exact-match lookup by track and artist name.
    pub async fn get_exact(
        &self,
        track_name: &str,
        artist_name: &str,
    ) -> anyhow::Result<Option<LrclibRecord>> {
        let url = format!(
            "{}/get?track_name={}&artist_name={}",
            self.base_url,
            urlencoding::encode(track_name),
            urlencoding::encode(artist_name)
        );
        self.fetch_record(&url).await
    }

    /// Lookup by LRCLIB-native record id.
    pub async fn get_by_id(&self, id: &str) -> anyhow::Result<Option<LrclibRecord>> {
        let url = format!("{}/get/{}", self.base_url, urlencoding::encode(id));
        self.fetch_record(&url).await
    }

    async fn fetch_record(&self, url: &str) -> anyhow::Result<Option<LrclibRecord>> {
        let response = self.client.get(url).send().await?;

        if response.status().is_success() {
            let record: LrclibRecord = response.json().await?;
            Ok(Some(record))
        } else if response.status() == reqwest::StatusCode::NOT_FOUND {
            Ok(None)
        } else {
            anyhow::bail!("LRCLIB API error: {}", response.status());
        }
    }

    /// Free-text search.
    pub async fn search(&self, query: &str) -> anyhow::Result<Vec<LrclibRecord>> {
        let url = format!(
            "{}/search?q={}",
            self.base_url,
            urlencoding::encode(query)
        );

        let response = self.client.get(&url).send().await?;

        if response.status().is_success() {
            let results: Vec<LrclibRecord> = response.json().await?;
            Ok(results)
        } else if response.status() == reqwest::StatusCode::NOT_FOUND {
            Ok(Vec::new())
        } else {
            anyhow::bail!("LRCLIB search error: {}", response.status());
        }
    }
}

impl Default for LrclibClient {
    fn default() -> Self {
        Self::new()
    }
}
