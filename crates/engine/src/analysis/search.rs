//! Web search tools that give pipeline stages live market context.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use super::AnalysisError;

const SERPER_URL: &str = "https://google.serper.dev/search";
const BRAVE_URL: &str = "https://api.search.brave.com/res/v1/web/search";

const SEARCH_TIMEOUT: Duration = Duration::from_secs(20);

/// Results requested per query.
pub const RESULTS_PER_QUERY: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchHit {
    pub title: String,
    pub url: String,
    pub snippet: String,
}

#[async_trait]
pub trait WebSearch: Send + Sync {
    async fn search(&self, query: &str) -> Result<Vec<SearchHit>, AnalysisError>;

    fn name(&self) -> &str;
}

/// Render hits as a bullet list for a prompt.
pub fn render_hits(source: &str, hits: &[SearchHit]) -> String {
    let mut out = format!("Search results ({source}):\n");
    for hit in hits {
        out.push_str(&format!("- {} ({}): {}\n", hit.title, hit.url, hit.snippet));
    }
    out
}

fn http_client() -> Result<reqwest::Client, AnalysisError> {
    reqwest::Client::builder()
        .timeout(SEARCH_TIMEOUT)
        .build()
        .map_err(|e| AnalysisError::Unavailable(format!("HTTP client: {e}")))
}

// ---------------------------------------------------------------------------
// Serper (Google results)
// ---------------------------------------------------------------------------

pub struct SerperSearch {
    client: reqwest::Client,
    api_key: String,
}

#[derive(Deserialize)]
struct SerperResponse {
    #[serde(default)]
    organic: Vec<SerperResult>,
}

#[derive(Deserialize)]
struct SerperResult {
    #[serde(default)]
    title: String,
    #[serde(default)]
    link: String,
    #[serde(default)]
    snippet: String,
}

impl SerperSearch {
    pub fn new(api_key: String) -> Result<Self, AnalysisError> {
        Ok(Self {
            client: http_client()?,
            api_key,
        })
    }
}

#[async_trait]
impl WebSearch for SerperSearch {
    async fn search(&self, query: &str) -> Result<Vec<SearchHit>, AnalysisError> {
        let response = self
            .client
            .post(SERPER_URL)
            .header("X-API-KEY", &self.api_key)
            .json(&serde_json::json!({ "q": query, "num": RESULTS_PER_QUERY }))
            .send()
            .await
            .map_err(|e| AnalysisError::Failed(format!("Serper request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(AnalysisError::Failed(format!(
                "Serper API error: {}",
                response.status()
            )));
        }

        let parsed: SerperResponse = response
            .json()
            .await
            .map_err(|e| AnalysisError::Failed(format!("Serper response parse error: {e}")))?;

        Ok(parsed
            .organic
            .into_iter()
            .take(RESULTS_PER_QUERY)
            .map(|r| SearchHit {
                title: r.title,
                url: r.link,
                snippet: r.snippet,
            })
            .collect())
    }

    fn name(&self) -> &str {
        "serper"
    }
}

// ---------------------------------------------------------------------------
// Brave
// ---------------------------------------------------------------------------

pub struct BraveSearch {
    client: reqwest::Client,
    api_key: String,
}

#[derive(Deserialize)]
struct BraveResponse {
    web: Option<BraveWeb>,
}

#[derive(Deserialize)]
struct BraveWeb {
    #[serde(default)]
    results: Vec<BraveResult>,
}

#[derive(Deserialize)]
struct BraveResult {
    #[serde(default)]
    title: String,
    #[serde(default)]
    url: String,
    #[serde(default)]
    description: String,
}

impl BraveSearch {
    pub fn new(api_key: String) -> Result<Self, AnalysisError> {
        Ok(Self {
            client: http_client()?,
            api_key,
        })
    }
}

#[async_trait]
impl WebSearch for BraveSearch {
    async fn search(&self, query: &str) -> Result<Vec<SearchHit>, AnalysisError> {
        let count = RESULTS_PER_QUERY.to_string();
        let response = self
            .client
            .get(BRAVE_URL)
            .header("X-Subscription-Token", &self.api_key)
            .header("Accept", "application/json")
            .query(&[("q", query), ("count", count.as_str())])
            .send()
            .await
            .map_err(|e| AnalysisError::Failed(format!("Brave request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(AnalysisError::Failed(format!(
                "Brave API error: {}",
                response.status()
            )));
        }

        let parsed: BraveResponse = response
            .json()
            .await
            .map_err(|e| AnalysisError::Failed(format!("Brave response parse error: {e}")))?;

        Ok(parsed
            .web
            .map(|web| web.results)
            .unwrap_or_default()
            .into_iter()
            .take(RESULTS_PER_QUERY)
            .map(|r| SearchHit {
                title: r.title,
                url: r.url,
                snippet: r.description,
            })
            .collect())
    }

    fn name(&self) -> &str {
        "brave"
    }
}
