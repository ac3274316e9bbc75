use std::time::Duration;

use reqwest::Response;
use serde::de::DeserializeOwned;
use serde::Serialize;
use url::Url;
use vidqa_logging::{vidqa_debug, vidqa_warn};

use crate::types::{ErrorBody, QuestionRequest, VideoRequest};
use crate::{Answer, FailureKind, GatewayFailure, HealthStatus, IngestAck, UNREACHABLE_MESSAGE};

#[derive(Debug, Clone)]
pub struct GatewaySettings {
    pub base_url: String,
    pub connect_timeout: Duration,
    /// Ingestion transcribes and embeds a whole video, so this is generous.
    pub request_timeout: Duration,
    pub user_agent: String,
}

impl Default for GatewaySettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(300),
            user_agent: concat!("vidqa/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// The remote calls the session depends on. Implementations never retry.
#[async_trait::async_trait]
pub trait Gateway: Send + Sync {
    /// `POST /process-video`.
    async fn submit_video(&self, locator: &str) -> Result<IngestAck, GatewayFailure>;

    /// `POST /ask`.
    async fn submit_question(&self, locator: &str, question: &str)
        -> Result<Answer, GatewayFailure>;

    /// `DELETE /video/{video_id}`.
    async fn delete_video(&self, video_id: &str) -> Result<(), GatewayFailure>;

    /// `GET /health`.
    async fn health(&self) -> Result<HealthStatus, GatewayFailure>;
}

#[derive(Debug, Clone)]
pub struct ReqwestGateway {
    base_url: Url,
    client: reqwest::Client,
}

impl ReqwestGateway {
    pub fn new(settings: GatewaySettings) -> Result<Self, GatewayFailure> {
        let base_url = parse_base_url(&settings.base_url)?;
        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .user_agent(settings.user_agent)
            .build()
            .map_err(|err| {
                vidqa_warn!("Failed to build http client: {}", err);
                GatewayFailure::transport(FailureKind::Unreachable)
            })?;
        Ok(Self { base_url, client })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, GatewayFailure> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| {
                GatewayFailure::new(FailureKind::InvalidBaseUrl, self.base_url.to_string())
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn post<B>(&self, segments: &[&str], body: &B) -> Result<Response, GatewayFailure>
    where
        B: Serialize + Sync,
    {
        let url = self.endpoint(segments)?;
        vidqa_debug!("POST {}", url);
        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        check_status(response).await
    }
}

#[async_trait::async_trait]
impl Gateway for ReqwestGateway {
    async fn submit_video(&self, locator: &str) -> Result<IngestAck, GatewayFailure> {
        let response = self
            .post(&["process-video"], &VideoRequest { video_url: locator })
            .await?;
        let bytes = response.bytes().await.map_err(map_reqwest_error)?;
        // Any 2xx body acknowledges; the summary fields are best effort.
        Ok(serde_json::from_slice(&bytes).unwrap_or_else(|err| {
            vidqa_debug!("Ingest ack body not understood: {}", err);
            IngestAck::default()
        }))
    }

    async fn submit_question(
        &self,
        locator: &str,
        question: &str,
    ) -> Result<Answer, GatewayFailure> {
        let response = self
            .post(
                &["ask"],
                &QuestionRequest {
                    video_url: locator,
                    question,
                },
            )
            .await?;
        decode_json(response).await
    }

    async fn delete_video(&self, video_id: &str) -> Result<(), GatewayFailure> {
        let url = self.endpoint(&["video", video_id])?;
        vidqa_debug!("DELETE {}", url);
        let response = self
            .client
            .delete(url)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        check_status(response).await.map(|_| ())
    }

    async fn health(&self) -> Result<HealthStatus, GatewayFailure> {
        let url = self.endpoint(&["health"])?;
        vidqa_debug!("GET {}", url);
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        decode_json(check_status(response).await?).await
    }
}

fn parse_base_url(raw: &str) -> Result<Url, GatewayFailure> {
    let url = Url::parse(raw.trim())
        .map_err(|err| GatewayFailure::new(FailureKind::InvalidBaseUrl, err.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") || url.cannot_be_a_base() {
        return Err(GatewayFailure::new(
            FailureKind::InvalidBaseUrl,
            format!("unsupported base url {url}"),
        ));
    }
    Ok(url)
}

/// Pass 2xx responses through; turn anything else into a failure carrying the service `detail`.
async fn check_status(response: Response) -> Result<Response, GatewayFailure> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let bytes = response.bytes().await.unwrap_or_default();
    let message = detail_message(&bytes).unwrap_or_else(|| UNREACHABLE_MESSAGE.to_string());
    vidqa_warn!("Service rejected request with {}: {}", status, message);
    Err(GatewayFailure::new(
        FailureKind::Rejected {
            status: status.as_u16(),
        },
        message,
    ))
}

fn detail_message(bytes: &[u8]) -> Option<String> {
    let body: ErrorBody = serde_json::from_slice(bytes).ok()?;
    match body.detail? {
        serde_json::Value::Null => None,
        serde_json::Value::String(text) => Some(text),
        other => Some(other.to_string()),
    }
}

async fn decode_json<T: DeserializeOwned>(response: Response) -> Result<T, GatewayFailure> {
    let bytes = response.bytes().await.map_err(map_reqwest_error)?;
    serde_json::from_slice(&bytes).map_err(|err| {
        vidqa_warn!("Malformed response body: {}", err);
        GatewayFailure::transport(FailureKind::MalformedBody)
    })
}

fn map_reqwest_error(err: reqwest::Error) -> GatewayFailure {
    vidqa_warn!("Transport failure: {}", err);
    if err.is_timeout() {
        return GatewayFailure::transport(FailureKind::Timeout);
    }
    if err.is_decode() {
        return GatewayFailure::transport(FailureKind::MalformedBody);
    }
    GatewayFailure::transport(FailureKind::Unreachable)
}
