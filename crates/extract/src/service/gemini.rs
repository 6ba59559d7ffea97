//! Google Gemini `generateContent` REST client.

use super::error::{ErrorKind, Result};
use super::{ContentService, Request};
use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::instrument;

/// Content service backed by the Gemini REST API.
///
/// The credential is optional at construction so that a missing key can be
/// reported through [`has_credential`](ContentService::has_credential) and
/// the affected mappings skipped, rather than failing start-up.
#[derive(Clone)]
pub struct GeminiService {
    client: Client,
    api_key: Option<String>,
    model: String,
    endpoint: String,
}
impl GeminiService {
    pub const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";
    pub const DEFAULT_MODEL: &str = "gemini-2.0-flash-lite";

    /// Blank keys are treated the same as no key.
    pub fn new(api_key: Option<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.filter(|key| !key.trim().is_empty()),
            model: Self::DEFAULT_MODEL.to_string(),
            endpoint: Self::DEFAULT_ENDPOINT.to_string(),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Point the client at another API root (a proxy, or a local test server).
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    fn url(&self) -> String {
        format!("{}/models/{}:generateContent", self.endpoint.trim_end_matches('/'), self.model)
    }
}

#[async_trait]
impl ContentService for GeminiService {
    fn name(&self) -> &str {
        "gemini"
    }

    fn has_credential(&self) -> bool {
        self.api_key.is_some()
    }

    #[instrument(skip_all, fields(model = %self.model, mime_type = request.mime_type, bytes = request.data.len()))]
    async fn generate(&self, request: Request<'_>) -> Result<String> {
        let Some(api_key) = self.api_key.as_deref() else {
            exn::bail!(ErrorKind::MissingCredential);
        };
        let response = self
            .client
            .post(self.url())
            .header("x-goog-api-key", api_key)
            .json(&GenerateRequest::new(request))
            .send()
            .await
            .map_err(|e| ErrorKind::Unavailable(e.to_string()))?;

        let status = response.status();
        let body = response.text().await.map_err(|e| ErrorKind::Unavailable(e.to_string()))?;
        if !status.is_success() {
            tracing::warn!(status = %status, "Content service returned an error");
            exn::bail!(classify(status, &body));
        }
        let parsed: GenerateResponse = serde_json::from_str(&body).map_err(|e| ErrorKind::Decode(e.to_string()))?;
        Ok(parsed.into_text())
    }
}

/// Rate limiting and server-side failures are transient; every other error
/// status means this request will never succeed as sent.
fn classify(status: StatusCode, body: &str) -> ErrorKind {
    let detail = serde_json::from_str::<ErrorEnvelope>(body)
        .map(|envelope| envelope.error.message)
        .ok()
        .filter(|message| !message.is_empty())
        .or_else(|| Some(body.trim().to_string()).filter(|body| !body.is_empty()))
        .unwrap_or_else(|| status.to_string());
    if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
        ErrorKind::Unavailable(detail)
    } else {
        ErrorKind::Rejected(detail)
    }
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    contents: [Content<'a>; 1],
}
impl<'a> GenerateRequest<'a> {
    fn new(request: Request<'a>) -> Self {
        Self {
            contents: [Content {
                parts: [
                    Part::Text { text: request.prompt },
                    Part::InlineData {
                        inline_data: InlineData {
                            mime_type: request.mime_type,
                            data: BASE64.encode(request.data),
                        },
                    },
                ],
            }],
        }
    }
}

#[derive(Serialize)]
struct Content<'a> {
    parts: [Part<'a>; 2],
}

#[derive(Serialize)]
#[serde(untagged)]
enum Part<'a> {
    Text {
        text: &'a str,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineData<'a>,
    },
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct InlineData<'a> {
    mime_type: &'a str,
    data: String,
}

#[derive(Deserialize, Default)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}
impl GenerateResponse {
    /// Text of the first part of the first candidate; empty when absent.
    fn into_text(self) -> String {
        self.candidates
            .into_iter()
            .next()
            .and_then(|candidate| candidate.content)
            .and_then(|content| content.parts.into_iter().next())
            .and_then(|part| part.text)
            .unwrap_or_default()
    }
}

#[derive(Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<AnswerPart>,
}

#[derive(Deserialize)]
struct AnswerPart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ApiError,
}

#[derive(Deserialize)]
struct ApiError {
    #[serde(default)]
    message: String,
}
