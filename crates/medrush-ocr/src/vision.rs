//! Client for a Cloud-Vision-shaped `images:annotate` endpoint.

use std::time::Duration;

use base64::{engine::general_purpose::STANDARD, Engine};
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};

use crate::error::OcrError;
use crate::types::DetectedText;

const DEFAULT_BASE_URL: &str = "https://vision.googleapis.com/";
const ANNOTATE_PATH: &str = "v1/images:annotate";
const PROVIDER: &str = "vision";

pub struct VisionClient {
    client: Client,
    api_key: String,
    endpoint: Url,
}

#[derive(Serialize)]
struct AnnotateRequest<'a> {
    requests: [ImageRequest<'a>; 1],
}

#[derive(Serialize)]
struct ImageRequest<'a> {
    image: ImageContent,
    features: [Feature<'a>; 1],
}

#[derive(Serialize)]
struct ImageContent {
    content: String,
}

#[derive(Serialize)]
struct Feature<'a> {
    #[serde(rename = "type")]
    kind: &'a str,
}

#[derive(Debug, Deserialize)]
struct AnnotateResponse {
    #[serde(default)]
    responses: Vec<ImageResponse>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ImageResponse {
    #[serde(default)]
    text_annotations: Vec<TextAnnotation>,
    #[serde(default)]
    full_text_annotation: Option<FullTextAnnotation>,
    #[serde(default)]
    error: Option<ProviderStatus>,
}

#[derive(Debug, Deserialize)]
struct TextAnnotation {
    #[serde(default)]
    description: String,
}

#[derive(Debug, Deserialize)]
struct FullTextAnnotation {
    #[serde(default)]
    text: String,
    #[serde(default)]
    pages: Vec<Page>,
}

#[derive(Debug, Deserialize)]
struct Page {
    #[serde(default)]
    confidence: Option<f32>,
}

#[derive(Debug, Deserialize)]
struct ProviderStatus {
    #[serde(default)]
    message: String,
}

impl VisionClient {
    /// # Errors
    ///
    /// Returns [`OcrError::Http`] if the `reqwest::Client` cannot be built.
    pub fn new(api_key: &str, timeout_secs: u64, user_agent: &str) -> Result<Self, OcrError> {
        Self::with_base_url(api_key, timeout_secs, user_agent, DEFAULT_BASE_URL)
    }

    /// # Errors
    ///
    /// Returns [`OcrError::Http`] if the `reqwest::Client` cannot be built, or
    /// [`OcrError::InvalidBaseUrl`] if `base_url` does not parse.
    pub fn with_base_url(
        api_key: &str,
        timeout_secs: u64,
        user_agent: &str,
        base_url: &str,
    ) -> Result<Self, OcrError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;
        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let endpoint = Url::parse(&normalised)
            .and_then(|base| base.join(ANNOTATE_PATH))
            .map_err(|e| OcrError::InvalidBaseUrl {
                provider: PROVIDER,
                url: base_url.to_owned(),
                reason: e.to_string(),
            })?;
        Ok(Self {
            client,
            api_key: api_key.to_owned(),
            endpoint,
        })
    }

    /// Runs text detection on `image` and returns the full detected text.
    ///
    /// An image with no text yields an empty [`DetectedText::text`], not an
    /// error; the caller decides whether that is a failure.
    ///
    /// # Errors
    ///
    /// - [`OcrError::Http`] on network failure or non-2xx status.
    /// - [`OcrError::Provider`] if the per-image response carries an error.
    /// - [`OcrError::Deserialize`] if the body does not match the expected shape.
    pub async fn detect_text(&self, image: &[u8]) -> Result<DetectedText, OcrError> {
        let body = AnnotateRequest {
            requests: [ImageRequest {
                image: ImageContent {
                    content: STANDARD.encode(image),
                },
                features: [Feature {
                    kind: "TEXT_DETECTION",
                }],
            }],
        };

        let mut url = self.endpoint.clone();
        url.query_pairs_mut().append_pair("key", &self.api_key);

        let response = self
            .client
            .post(url)
            .json(&body)
            .send()
            .await?
            .error_for_status()?;
        let raw = response.text().await?;
        let parsed: AnnotateResponse =
            serde_json::from_str(&raw).map_err(|e| OcrError::Deserialize {
                context: "images:annotate".to_owned(),
                source: e,
            })?;

        let Some(first) = parsed.responses.into_iter().next() else {
            return Ok(DetectedText {
                text: String::new(),
                confidence: None,
            });
        };

        if let Some(status) = first.error {
            return Err(OcrError::Provider {
                provider: PROVIDER,
                message: status.message,
            });
        }

        let (full_text, confidence) = match first.full_text_annotation {
            Some(full) => (
                full.text,
                full.pages.iter().find_map(|p| p.confidence),
            ),
            None => (String::new(), None),
        };

        // The first text annotation is the whole block; the rest are words.
        let text = if full_text.trim().is_empty() {
            first
                .text_annotations
                .into_iter()
                .next()
                .map(|a| a.description)
                .unwrap_or_default()
        } else {
            full_text
        };

        tracing::debug!(chars = text.len(), ?confidence, "vision text detection complete");
        Ok(DetectedText { text, confidence })
    }
}
