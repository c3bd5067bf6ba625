//! Value extraction from meter photos
//!
//! The lifecycle engine only sees the `ValueExtractor` trait; production
//! wires in `GeminiExtractor`, which sends the image to the Gemini
//! generateContent API and scans the textual answer for the reading.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use futures::future::BoxFuture;
use meterd_common::config::MeterdConfig;
use meterd_common::Error;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error as ThisError;
use tracing::{debug, warn};

const EXTRACTION_PROMPT: &str = "What is the measurement value in the image?";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Extraction failures, split by who is at fault
#[derive(Debug, ThisError)]
pub enum ExtractionError {
    /// The submitted image cannot be used
    #[error("Image could not be processed: {0}")]
    BadImage(String),

    /// The provider answered but no numeric reading was recognized
    #[error("No numeric reading recognized in provider response")]
    NoValueFound,

    /// Provider-side failure: network, HTTP error, malformed response
    #[error("Provider error: {0}")]
    Provider(String),
}

impl From<ExtractionError> for Error {
    fn from(e: ExtractionError) -> Self {
        match e {
            // Transport and provider failures are not the caller's fault
            ExtractionError::Provider(msg) => Error::Internal(msg),
            other => Error::ExtractionFailed(other.to_string()),
        }
    }
}

/// External collaborator turning image bytes into a numeric reading
pub trait ValueExtractor: Send + Sync {
    fn extract_value<'a>(
        &'a self,
        image: &'a [u8],
    ) -> BoxFuture<'a, std::result::Result<f64, ExtractionError>>;
}

// ============================================================================
// Gemini request/response types (only the fields we touch)
// ============================================================================

#[derive(Debug, Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
}

#[derive(Debug, Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
enum Part {
    Text(String),
    InlineData(InlineData),
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

/// Gemini generateContent client
pub struct GeminiExtractor {
    client: reqwest::Client,
    api_key: Option<String>,
    model: String,
    base_url: String,
}

impl GeminiExtractor {
    /// Build from resolved configuration. A missing API key is not an error
    /// here; extraction requests fail cleanly until one is configured.
    pub fn new(config: &MeterdConfig) -> meterd_common::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| Error::Internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_key: config.gemini_api_key.clone(),
            model: config.gemini_model.clone(),
            base_url: config.gemini_base_url.clone(),
        })
    }

    async fn request_reading(&self, image: &[u8]) -> Result<f64, ExtractionError> {
        if image.is_empty() {
            return Err(ExtractionError::BadImage("empty image".to_string()));
        }

        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| ExtractionError::Provider("GEMINI_API_KEY not configured".to_string()))?;

        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url, self.model, api_key
        );

        let request = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![
                    Part::Text(EXTRACTION_PROMPT.to_string()),
                    Part::InlineData(InlineData {
                        mime_type: "image/png".to_string(),
                        data: BASE64.encode(image),
                    }),
                ],
            }],
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| ExtractionError::Provider(format!("Gemini request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            warn!("Gemini returned HTTP {}", status);
            return Err(ExtractionError::Provider(format!(
                "Gemini returned HTTP {}",
                status
            )));
        }

        let body: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| ExtractionError::Provider(format!("Malformed Gemini response: {}", e)))?;

        let text = body
            .candidates
            .into_iter()
            .filter_map(|c| c.content)
            .flat_map(|c| c.parts)
            .filter_map(|p| p.text)
            .collect::<Vec<_>>()
            .join(" ");

        debug!("Gemini answer: {}", text);
        parse_reading(&text).ok_or(ExtractionError::NoValueFound)
    }
}

impl ValueExtractor for GeminiExtractor {
    fn extract_value<'a>(
        &'a self,
        image: &'a [u8],
    ) -> BoxFuture<'a, std::result::Result<f64, ExtractionError>> {
        Box::pin(self.request_reading(image))
    }
}

/// Pull the meter reading out of the provider's free-text answer.
///
/// The first contiguous run of ASCII digits is taken as the reading;
/// anything else in the answer is ignored.
pub fn parse_reading(text: &str) -> Option<f64> {
    let start = text.find(|c: char| c.is_ascii_digit())?;
    let digits: String = text[start..]
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse::<f64>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_reading_takes_first_digit_run() {
        assert_eq!(parse_reading("The reading is 12345 kWh"), Some(12345.0));
        assert_eq!(parse_reading("12345"), Some(12345.0));
        assert_eq!(parse_reading("approx. 042 m3, maybe 50"), Some(42.0));
    }

    #[test]
    fn parse_reading_fails_without_digits() {
        assert_eq!(parse_reading("no reading visible"), None);
        assert_eq!(parse_reading(""), None);
    }

    #[test]
    fn provider_errors_map_to_internal() {
        let err: Error = ExtractionError::Provider("boom".to_string()).into();
        assert!(matches!(err, Error::Internal(_)));

        let err: Error = ExtractionError::NoValueFound.into();
        assert!(matches!(err, Error::ExtractionFailed(_)));

        let err: Error = ExtractionError::BadImage("empty image".to_string()).into();
        assert!(matches!(err, Error::ExtractionFailed(_)));
    }

    #[test]
    fn request_serializes_camel_case_inline_data() {
        let request = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![
                    Part::Text("prompt".to_string()),
                    Part::InlineData(InlineData {
                        mime_type: "image/png".to_string(),
                        data: "QUJD".to_string(),
                    }),
                ],
            }],
        };

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["contents"][0]["parts"][0]["text"], "prompt");
        assert_eq!(
            json["contents"][0]["parts"][1]["inlineData"]["mimeType"],
            "image/png"
        );
        assert_eq!(json["contents"][0]["parts"][1]["inlineData"]["data"], "QUJD");
    }
}
