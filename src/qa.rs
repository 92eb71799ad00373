use crate::error::{ChatError, RemoteError};
use crate::events::{EventSource, Identity, Role};
use serde::{Deserialize, Serialize};
use tokio::time::Duration;

/// Path of the chat endpoint, relative to the configured API url
const CHAT_PATH: &str = "ai/chat";

/// One prior turn as the QA service sees it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub role: Role,
    pub content: String,
}

/// Body of a chat request
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    pub question: String,
    pub conversation_history: Vec<HistoryEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<Identity>,
}

/// A successful answer from the QA service
#[derive(Debug, Clone, PartialEq)]
pub struct ChatReply {
    pub answer: String,
    pub sources: Vec<EventSource>,
}

#[derive(Deserialize)]
struct RawReply {
    answer: Option<String>,
    #[serde(default)]
    sources: Option<Vec<RawSource>>,
}

#[derive(Deserialize)]
struct RawSource {
    #[serde(default)]
    event_details: Option<RawEventDetails>,
}

#[derive(Deserialize)]
struct RawEventDetails {
    event_name: Option<String>,
    event_date: Option<String>,
    event_time: Option<String>,
    #[serde(alias = "location")]
    event_location: Option<String>,
}

impl RawSource {
    fn into_source(self) -> Option<EventSource> {
        let details = self.event_details?;
        let name = details.event_name.filter(|name| !name.trim().is_empty())?;
        Some(EventSource {
            name,
            date: details.event_date,
            time: details.event_time,
            location: details.event_location,
        })
    }
}

/// Decode a response body. A missing or null `answer` is an error; missing
/// `sources` means none. Sources without an event name are dropped.
pub fn parse_reply(body: &[u8]) -> Result<ChatReply, RemoteError> {
    let raw: RawReply = serde_json::from_slice(body)?;
    let answer = raw.answer.ok_or(RemoteError::MissingAnswer)?;

    let raw_sources = raw.sources.unwrap_or_default();
    let total = raw_sources.len();
    let sources: Vec<EventSource> = raw_sources
        .into_iter()
        .filter_map(RawSource::into_source)
        .collect();
    if sources.len() < total {
        tracing::debug!(dropped = total - sources.len(), "ignoring sources without an event name");
    }

    Ok(ChatReply { answer, sources })
}

/// Anything that can answer a chat request
#[async_trait::async_trait]
pub trait QaBackend: Send + Sync {
    async fn ask(&self, request: &ChatRequest) -> Result<ChatReply, RemoteError>;
}

/// QA backend reached over HTTP
#[derive(Clone)]
pub struct HttpQaClient {
    endpoint: reqwest::Url,
    client: reqwest::Client,
}

impl HttpQaClient {
    pub fn new(api_url: &str, timeout: Duration) -> Result<Self, ChatError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(ChatError::Client)?;

        Ok(Self {
            endpoint: chat_endpoint(api_url)?,
            client,
        })
    }

    pub fn endpoint(&self) -> &reqwest::Url {
        &self.endpoint
    }
}

/// `https://host/api` and `https://host/api/` both resolve to `https://host/api/ai/chat`
fn chat_endpoint(api_url: &str) -> Result<reqwest::Url, ChatError> {
    let trimmed = api_url.trim();
    if trimmed.is_empty() {
        return Err(ChatError::InvalidUrl("API url is empty".to_string()));
    }
    let base = format!("{}/", trimmed.trim_end_matches('/'));
    reqwest::Url::parse(&base)
        .and_then(|url| url.join(CHAT_PATH))
        .map_err(|e| ChatError::InvalidUrl(format!("{}: {}", trimmed, e)))
}

#[async_trait::async_trait]
impl QaBackend for HttpQaClient {
    async fn ask(&self, request: &ChatRequest) -> Result<ChatReply, RemoteError> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .header("Content-Type", "application/json")
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(RemoteError::Status(status.as_u16()));
        }

        let body = response.bytes().await?;
        parse_reply(&body)
    }
}
