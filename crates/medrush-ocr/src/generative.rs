//! Client for a Gemini-shaped `generateContent` endpoint, plus the parser for
//! the structured reply we ask it for.

use std::time::Duration;

use base64::{engine::general_purpose::STANDARD, Engine};
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};

use crate::error::OcrError;

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/";
const PROVIDER: &str = "generative model";

/// Prompt sent alongside the image.
pub const PRESCRIPTION_PROMPT: &str = "You are reading a photo uploaded to a pharmacy app. \
Extract all legible text and decide whether the image is a medical prescription. \
Reply with JSON only, no prose and no code fences, in exactly this shape: \
{\"text\": string, \"isPrescription\": boolean, \"medicineNames\": [string], \"confidence\": number between 0 and 1}. \
Include the strength with each medicine name when it is written, for example \"Amoxicillin 500mg\".";

pub struct GenerativeClient {
    client: Client,
    api_key: String,
    endpoint: Url,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    contents: [Content<'a>; 1],
}

#[derive(Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum Part<'a> {
    Text { text: &'a str },
    InlineData { inline_data: InlineData<'a> },
}

#[derive(Serialize)]
struct InlineData<'a> {
    mime_type: &'a str,
    data: String,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ReplyPart>,
}

#[derive(Debug, Deserialize)]
struct ReplyPart {
    #[serde(default)]
    text: Option<String>,
}

/// The JSON object the prompt asks the model to return. Every field but
/// `confidence` is required; objects of any other shape are rejected.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelAnalysis {
    pub text: String,
    #[serde(alias = "is_prescription")]
    pub is_prescription: bool,
    #[serde(alias = "medicine_names")]
    pub medicine_names: Vec<String>,
    #[serde(default)]
    pub confidence: Option<f32>,
}

impl GenerativeClient {
    /// # Errors
    ///
    /// Returns [`OcrError::Http`] if the `reqwest::Client` cannot be built, or
    /// [`OcrError::InvalidBaseUrl`] if the model name makes an invalid URL.
    pub fn new(
        api_key: &str,
        model: &str,
        timeout_secs: u64,
        user_agent: &str,
    ) -> Result<Self, OcrError> {
        Self::with_base_url(api_key, model, timeout_secs, user_agent, DEFAULT_BASE_URL)
    }

    /// # Errors
    ///
    /// Returns [`OcrError::Http`] if the `reqwest::Client` cannot be built, or
    /// [`OcrError::InvalidBaseUrl`] if `base_url` does not parse.
    pub fn with_base_url(
        api_key: &str,
        model: &str,
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
            .and_then(|base| base.join(&format!("v1beta/models/{model}:generateContent")))
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

    /// Sends `prompt` with the inline image and returns the concatenated text
    /// of the first candidate.
    ///
    /// # Errors
    ///
    /// - [`OcrError::Http`] on network failure or non-2xx status.
    /// - [`OcrError::Deserialize`] if the envelope does not match the expected shape.
    /// - [`OcrError::EmptyResponse`] if the model returned no text.
    pub async fn generate(
        &self,
        prompt: &str,
        image: &[u8],
        mime_type: &str,
    ) -> Result<String, OcrError> {
        let body = GenerateRequest {
            contents: [Content {
                parts: vec![
                    Part::Text { text: prompt },
                    Part::InlineData {
                        inline_data: InlineData {
                            mime_type,
                            data: STANDARD.encode(image),
                        },
                    },
                ],
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
        let parsed: GenerateResponse =
            serde_json::from_str(&raw).map_err(|e| OcrError::Deserialize {
                context: "generateContent".to_owned(),
                source: e,
            })?;

        let text: String = parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(OcrError::EmptyResponse { provider: PROVIDER });
        }
        Ok(text)
    }
}

/// Parses the model's reply into a [`ModelAnalysis`].
///
/// Tolerates Markdown code fences and prose around the object by parsing the
/// span from the first `{` to the last `}`.
///
/// # Errors
///
/// Returns the `serde_json` error when no valid object can be read, or when
/// the object lacks `text`, `isPrescription` or `medicineNames`.
pub fn parse_model_reply(reply: &str) -> Result<ModelAnalysis, serde_json::Error> {
    let candidate = match (reply.find('{'), reply.rfind('}')) {
        (Some(start), Some(end)) if start < end => &reply[start..=end],
        _ => reply.trim(),
    };
    serde_json::from_str(candidate)
}
