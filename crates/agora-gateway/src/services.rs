//! Uniform async wrapper around the third-party capabilities used by bot
//! commands. Every call is a single attempt bounded by the client timeout.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ServiceError {
    #[error("service unavailable: {0}")]
    Unavailable(String),
    #[error("not found")]
    NotFound,
    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

/// Best search hit for a media query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaMatch {
    pub id: String,
    pub title: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lyrics {
    pub title: String,
    pub author: Option<String>,
    pub text: String,
}

#[async_trait]
pub trait ExternalServices: Send + Sync {
    async fn ask_chat(&self, question: &str) -> Result<String, ServiceError>;

    async fn search_media(&self, query: &str) -> Result<MediaMatch, ServiceError>;

    /// Returns a link to the audio track of `media`.
    async fn download_audio(&self, media: &MediaMatch) -> Result<String, ServiceError>;

    /// Returns a link to the video file of `media`.
    async fn download_video(&self, media: &MediaMatch) -> Result<String, ServiceError>;

    /// Returns a link to the generated image.
    async fn generate_image(&self, prompt: &str) -> Result<String, ServiceError>;

    async fn fetch_lyrics(&self, title: &str) -> Result<Lyrics, ServiceError>;
}

/// Endpoints and credentials for [`HttpServices`].
#[derive(Debug, Clone)]
pub struct ServicesConfig {
    pub timeout: Duration,
    pub ai_base_url: String,
    pub ai_api_key: Option<String>,
    pub ai_model: String,
    pub image_model: String,
    pub search_base_url: String,
    pub search_api_key: Option<String>,
    pub download_base_url: Option<String>,
    pub lyrics_base_url: String,
}

impl Default for ServicesConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(20),
            ai_base_url: "https://api.openai.com/v1".into(),
            ai_api_key: None,
            ai_model: "gpt-4o-mini".into(),
            image_model: "dall-e-3".into(),
            search_base_url: "https://www.googleapis.com/youtube/v3".into(),
            search_api_key: None,
            download_base_url: None,
            lyrics_base_url: "https://some-random-api.com/others".into(),
        }
    }
}

/// [`ExternalServices`] over HTTP with one shared client.
pub struct HttpServices {
    client: reqwest::Client,
    config: ServicesConfig,
}

impl HttpServices {
    pub fn new(config: ServicesConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;
        Ok(Self { client, config })
    }

    fn ai_key(&self) -> Result<&str, ServiceError> {
        self.config
            .ai_api_key
            .as_deref()
            .ok_or_else(|| ServiceError::Unavailable("AI service is not configured".into()))
    }

    async fn download(&self, kind: &str, media: &MediaMatch) -> Result<String, ServiceError> {
        let base = self
            .config
            .download_base_url
            .as_deref()
            .ok_or_else(|| ServiceError::Unavailable("download service is not configured".into()))?;

        let response = self
            .client
            .get(format!("{}/{}", base.trim_end_matches('/'), kind))
            .query(&[("url", media.url.as_str())])
            .send()
            .await;
        parse_download(&read_body(response).await?)
    }
}

#[async_trait]
impl ExternalServices for HttpServices {
    async fn ask_chat(&self, question: &str) -> Result<String, ServiceError> {
        let key = self.ai_key()?;
        let body = json!({
            "model": self.config.ai_model,
            "messages": [{ "role": "user", "content": question }],
        });

        let response = self
            .client
            .post(format!("{}/chat/completions", self.config.ai_base_url))
            .bearer_auth(key)
            .json(&body)
            .send()
            .await;
        parse_chat_completion(&read_body(response).await?)
    }

    async fn search_media(&self, query: &str) -> Result<MediaMatch, ServiceError> {
        let key = self
            .config
            .search_api_key
            .as_deref()
            .ok_or_else(|| ServiceError::Unavailable("media search is not configured".into()))?;

        let response = self
            .client
            .get(format!("{}/search", self.config.search_base_url))
            .query(&[
                ("part", "snippet"),
                ("type", "video"),
                ("maxResults", "1"),
                ("q", query),
                ("key", key),
            ])
            .send()
            .await;
        parse_search(&read_body(response).await?)
    }

    async fn download_audio(&self, media: &MediaMatch) -> Result<String, ServiceError> {
        self.download("audio", media).await
    }

    async fn download_video(&self, media: &MediaMatch) -> Result<String, ServiceError> {
        self.download("video", media).await
    }

    async fn generate_image(&self, prompt: &str) -> Result<String, ServiceError> {
        let key = self.ai_key()?;
        let body = json!({
            "model": self.config.image_model,
            "prompt": prompt,
            "n": 1,
        });

        let response = self
            .client
            .post(format!("{}/images/generations", self.config.ai_base_url))
            .bearer_auth(key)
            .json(&body)
            .send()
            .await;
        parse_image(&read_body(response).await?)
    }

    async fn fetch_lyrics(&self, title: &str) -> Result<Lyrics, ServiceError> {
        let response = self
            .client
            .get(format!("{}/lyrics", self.config.lyrics_base_url))
            .query(&[("title", title)])
            .send()
            .await;
        parse_lyrics(&read_body(response).await?)
    }
}

/// Map transport and status failures; the body is returned only for 2xx.
async fn read_body(
    response: Result<reqwest::Response, reqwest::Error>,
) -> Result<Vec<u8>, ServiceError> {
    let response = response.map_err(transport_error)?;
    let status = response.status();
    debug!("External service {} -> {}", response.url().path(), status);

    if status == StatusCode::NOT_FOUND {
        return Err(ServiceError::NotFound);
    }
    if !status.is_success() {
        return Err(ServiceError::Unavailable(format!("status {}", status)));
    }

    let bytes = response.bytes().await.map_err(transport_error)?;
    Ok(bytes.to_vec())
}

fn transport_error(e: reqwest::Error) -> ServiceError {
    if e.is_timeout() {
        ServiceError::Unavailable("request timed out".into())
    } else {
        ServiceError::Unavailable(e.to_string())
    }
}

fn decode<T: DeserializeOwned>(body: &[u8]) -> Result<T, ServiceError> {
    serde_json::from_slice(body).map_err(|e| ServiceError::MalformedResponse(e.to_string()))
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

// -- Response shapes --

#[derive(Deserialize)]
struct ChatCompletion {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

fn parse_chat_completion(body: &[u8]) -> Result<String, ServiceError> {
    let completion: ChatCompletion = decode(body)?;
    completion
        .choices
        .into_iter()
        .next()
        .and_then(|choice| non_empty(choice.message.content))
        .map(|text| text.trim().to_string())
        .ok_or_else(|| ServiceError::MalformedResponse("completion has no content".into()))
}

#[derive(Deserialize)]
struct ImageGeneration {
    data: Vec<GeneratedImage>,
}

#[derive(Deserialize)]
struct GeneratedImage {
    url: Option<String>,
}

fn parse_image(body: &[u8]) -> Result<String, ServiceError> {
    let generation: ImageGeneration = decode(body)?;
    generation
        .data
        .into_iter()
        .find_map(|image| non_empty(image.url))
        .ok_or_else(|| ServiceError::MalformedResponse("no image url in response".into()))
}

#[derive(Deserialize)]
struct SearchResults {
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Deserialize)]
struct SearchItem {
    id: SearchItemId,
    snippet: SearchSnippet,
}

#[derive(Deserialize)]
struct SearchItemId {
    #[serde(rename = "videoId")]
    video_id: Option<String>,
}

#[derive(Deserialize)]
struct SearchSnippet {
    title: String,
}

fn parse_search(body: &[u8]) -> Result<MediaMatch, ServiceError> {
    let results: SearchResults = decode(body)?;
    results
        .items
        .into_iter()
        .find_map(|item| {
            let id = non_empty(item.id.video_id)?;
            Some(MediaMatch {
                url: format!("https://www.youtube.com/watch?v={}", id),
                id,
                title: item.snippet.title,
            })
        })
        .ok_or(ServiceError::NotFound)
}

#[derive(Deserialize)]
struct DownloadLink {
    url: Option<String>,
}

fn parse_download(body: &[u8]) -> Result<String, ServiceError> {
    let link: DownloadLink = decode(body)?;
    non_empty(link.url).ok_or(ServiceError::NotFound)
}

#[derive(Deserialize)]
struct LyricsBody {
    title: Option<String>,
    author: Option<String>,
    lyrics: Option<String>,
}

fn parse_lyrics(body: &[u8]) -> Result<Lyrics, ServiceError> {
    let found: LyricsBody = decode(body)?;
    let text = non_empty(found.lyrics).ok_or(ServiceError::NotFound)?;
    Ok(Lyrics {
        title: found.title.unwrap_or_default(),
        author: non_empty(found.author),
        text,
    })
}
