//! The scan chain: vision text detection, then the generative model, then
//! pattern heuristics over whatever the model said.

use std::future::Future;

use crate::error::OcrError;
use crate::generative::{parse_model_reply, GenerativeClient, PRESCRIPTION_PROMPT};
use crate::patterns::analyze_text;
use crate::types::{clamp_confidence, DetectedText, OcrResult, OcrSource};
use crate::vision::VisionClient;

const VISION_DEFAULT_CONFIDENCE: f32 = 0.8;
const GENERATIVE_DEFAULT_CONFIDENCE: f32 = 0.8;
const FALLBACK_CONFIDENCE: f32 = 0.5;
const FALLBACK_CONFIDENCE_WITH_NAMES: f32 = 0.6;

/// First stage: plain text detection.
pub trait TextDetector {
    fn detect_text(&self, image: &[u8]) -> impl Future<Output = Result<DetectedText, OcrError>> + Send;
}

/// Second stage: a multimodal model answering a prompt about the image.
pub trait ContentGenerator {
    fn generate(
        &self,
        prompt: &str,
        image: &[u8],
        mime_type: &str,
    ) -> impl Future<Output = Result<String, OcrError>> + Send;
}

impl TextDetector for VisionClient {
    async fn detect_text(&self, image: &[u8]) -> Result<DetectedText, OcrError> {
        VisionClient::detect_text(self, image).await
    }
}

impl ContentGenerator for GenerativeClient {
    async fn generate(&self, prompt: &str, image: &[u8], mime_type: &str) -> Result<String, OcrError> {
        GenerativeClient::generate(self, prompt, image, mime_type).await
    }
}

/// Runs an uploaded image through the detector and generator in order.
pub struct PrescriptionScanner<V, G> {
    vision: V,
    generator: G,
}

impl<V: TextDetector + Sync, G: ContentGenerator + Sync> PrescriptionScanner<V, G> {
    pub fn new(vision: V, generator: G) -> Self {
        Self { vision, generator }
    }

    /// Scans `image` and returns the first usable result.
    ///
    /// Each stage finishes before the next starts. A vision failure or empty
    /// text moves on to the generator; a generator reply that is not the
    /// requested JSON is mined with the pattern heuristics instead of being
    /// discarded.
    ///
    /// # Errors
    ///
    /// Returns [`OcrError::AllProvidersFailed`] when the generator also fails.
    pub async fn scan(&self, image: &[u8], mime_type: &str) -> Result<OcrResult, OcrError> {
        let vision_failure = match self.vision.detect_text(image).await {
            Ok(detected) if !detected.text.trim().is_empty() => {
                let analysis = analyze_text(&detected.text);
                tracing::info!(
                    names = analysis.medicine_names.len(),
                    is_prescription = analysis.is_prescription,
                    "scan: vision text detected"
                );
                return Ok(OcrResult {
                    text: detected.text,
                    is_prescription: analysis.is_prescription,
                    medicine_names: analysis.medicine_names,
                    confidence: clamp_confidence(detected.confidence, VISION_DEFAULT_CONFIDENCE),
                    source: OcrSource::Vision,
                });
            }
            Ok(_) => "no text detected".to_owned(),
            Err(e) => e.to_string(),
        };
        tracing::warn!(reason = %vision_failure, "scan: vision stage failed, asking generative model");

        let reply = match self
            .generator
            .generate(PRESCRIPTION_PROMPT, image, mime_type)
            .await
        {
            Ok(reply) => reply,
            Err(e) => {
                tracing::warn!(error = %e, "scan: generative stage failed");
                return Err(OcrError::AllProvidersFailed {
                    vision: vision_failure,
                    generative: e.to_string(),
                });
            }
        };

        match parse_model_reply(&reply) {
            Ok(analysis) => Ok(OcrResult {
                text: analysis.text,
                is_prescription: analysis.is_prescription,
                medicine_names: analysis.medicine_names,
                confidence: clamp_confidence(analysis.confidence, GENERATIVE_DEFAULT_CONFIDENCE),
                source: OcrSource::Generative,
            }),
            Err(e) => {
                tracing::warn!(error = %e, "scan: model reply was not the requested JSON, using pattern fallback");
                let analysis = analyze_text(&reply);
                let confidence = if analysis.medicine_names.is_empty() {
                    FALLBACK_CONFIDENCE
                } else {
                    FALLBACK_CONFIDENCE_WITH_NAMES
                };
                Ok(OcrResult {
                    text: reply,
                    is_prescription: analysis.is_prescription,
                    medicine_names: analysis.medicine_names,
                    confidence,
                    source: OcrSource::PatternFallback,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    struct FakeVision(Result<DetectedText, &'static str>);

    impl TextDetector for FakeVision {
        async fn detect_text(&self, _image: &[u8]) -> Result<DetectedText, OcrError> {
            self.0.clone().map_err(|m| OcrError::Provider {
                provider: "vision",
                message: m.to_owned(),
            })
        }
    }

    struct FakeGenerator {
        reply: Result<&'static str, &'static str>,
        calls: AtomicUsize,
    }

    impl FakeGenerator {
        fn new(reply: Result<&'static str, &'static str>) -> Self {
            Self {
                reply,
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl ContentGenerator for FakeGenerator {
        async fn generate(&self, _prompt: &str, _image: &[u8], _mime: &str) -> Result<String, OcrError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.reply.map(str::to_owned).map_err(|m| OcrError::Provider {
                provider: "generative model",
                message: m.to_owned(),
            })
        }
    }

    fn text(s: &str, confidence: Option<f32>) -> Result<DetectedText, &'static str> {
        Ok(DetectedText {
            text: s.to_owned(),
            confidence,
        })
    }

    #[tokio::test]
    async fn vision_text_short_circuits_generator() {
        let scanner = PrescriptionScanner::new(
            FakeVision(text("Rx\nAmoxicillin 500mg", Some(0.93))),
            FakeGenerator::new(Ok("unused")),
        );
        let result = scanner.scan(b"img", "image/jpeg").await.unwrap();

        assert_eq!(result.source, OcrSource::Vision);
        assert!(result.is_prescription);
        assert_eq!(result.medicine_names, vec!["Amoxicillin 500mg".to_string()]);
        assert!((result.confidence - 0.93).abs() < f32::EPSILON);
        assert_eq!(scanner.generator.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn vision_confidence_defaults_when_not_reported() {
        let scanner = PrescriptionScanner::new(
            FakeVision(text("Grocery list", None)),
            FakeGenerator::new(Ok("unused")),
        );
        let result = scanner.scan(b"img", "image/jpeg").await.unwrap();
        assert!(!result.is_prescription);
        assert!((result.confidence - 0.8).abs() < f32::EPSILON);
    }

    #[tokio::test]
    async fn empty_vision_text_falls_through_to_generator() {
        let scanner = PrescriptionScanner::new(
            FakeVision(text("  \n", Some(0.99))),
            FakeGenerator::new(Ok(
                r#"{"text":"Rx Metformin 500mg","isPrescription":true,"medicineNames":["Metformin 500mg"],"confidence":1.4}"#,
            )),
        );
        let result = scanner.scan(b"img", "image/png").await.unwrap();

        assert_eq!(result.source, OcrSource::Generative);
        assert_eq!(result.medicine_names, vec!["Metformin 500mg".to_string()]);
        assert!((result.confidence - 1.0).abs() < f32::EPSILON);
        assert_eq!(scanner.generator.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn non_json_reply_uses_pattern_fallback() {
        let scanner = PrescriptionScanner::new(
            FakeVision(Err("quota exceeded")),
            FakeGenerator::new(Ok("The prescription lists Amoxicillin 500mg three times a day.")),
        );
        let result = scanner.scan(b"img", "image/jpeg").await.unwrap();

        assert_eq!(result.source, OcrSource::PatternFallback);
        assert!(result.medicine_names.contains(&"Amoxicillin 500mg".to_string()));
        assert!((result.confidence - 0.6).abs() < f32::EPSILON);
    }

    #[tokio::test]
    async fn off_shape_json_reply_uses_pattern_fallback() {
        let scanner = PrescriptionScanner::new(
            FakeVision(Err("quota exceeded")),
            FakeGenerator::new(Ok(
                r#"{"error": "cannot read image; visible text: Amoxicillin 500mg"}"#,
            )),
        );
        let result = scanner.scan(b"img", "image/jpeg").await.unwrap();

        assert_eq!(result.source, OcrSource::PatternFallback);
        assert!(result.medicine_names.contains(&"Amoxicillin 500mg".to_string()));
        assert!((result.confidence - 0.6).abs() < f32::EPSILON);
        assert!(result.text.contains("Amoxicillin"));
    }

    #[tokio::test]
    async fn fallback_without_names_has_lower_confidence() {
        let scanner = PrescriptionScanner::new(
            FakeVision(Err("down")),
            FakeGenerator::new(Ok("I could not read this image.")),
        );
        let result = scanner.scan(b"img", "image/jpeg").await.unwrap();
        assert!(result.medicine_names.is_empty());
        assert!((result.confidence - 0.5).abs() < f32::EPSILON);
    }

    #[tokio::test]
    async fn both_providers_failing_is_an_error() {
        let scanner = PrescriptionScanner::new(
            FakeVision(Err("vision down")),
            FakeGenerator::new(Err("model down")),
        );
        let err = scanner.scan(b"img", "image/jpeg").await.unwrap_err();
        assert!(
            matches!(err, OcrError::AllProvidersFailed { ref vision, ref generative }
                if vision.contains("vision down") && generative.contains("model down")),
            "unexpected error: {err:?}"
        );
    }
}
