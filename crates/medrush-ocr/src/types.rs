use std::path::Path;

use serde::{Deserialize, Serialize};

/// Which stage of the chain produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OcrSource {
    Vision,
    Generative,
    PatternFallback,
}

impl std::fmt::Display for OcrSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OcrSource::Vision => write!(f, "vision"),
            OcrSource::Generative => write!(f, "generative"),
            OcrSource::PatternFallback => write!(f, "pattern_fallback"),
        }
    }
}

/// Outcome of scanning one uploaded image. Not persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OcrResult {
    pub text: String,
    pub is_prescription: bool,
    pub medicine_names: Vec<String>,
    /// In `[0.0, 1.0]`.
    pub confidence: f32,
    pub source: OcrSource,
}

/// Raw text returned by a vision text detector.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectedText {
    pub text: String,
    /// Provider-reported confidence, when it gives one.
    pub confidence: Option<f32>,
}

/// Clamps a provider-reported confidence into `[0, 1]`, substituting
/// `default` for missing or non-finite values.
pub(crate) fn clamp_confidence(value: Option<f32>, default: f32) -> f32 {
    match value {
        Some(v) if v.is_finite() => v.clamp(0.0, 1.0),
        _ => default,
    }
}

/// MIME type for an image path, by extension. Unknown extensions are sent as
/// JPEG, which is what phone cameras produce.
#[must_use]
pub fn guess_mime_type(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("png") => "image/png",
        Some("webp") => "image/webp",
        Some("gif") => "image/gif",
        Some("heic") => "image/heic",
        Some("pdf") => "application/pdf",
        _ => "image/jpeg",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamp_confidence_bounds_and_defaults() {
        assert!((clamp_confidence(Some(1.7), 0.5) - 1.0).abs() < f32::EPSILON);
        assert!(clamp_confidence(Some(-0.2), 0.5).abs() < f32::EPSILON);
        assert!((clamp_confidence(Some(f32::NAN), 0.5) - 0.5).abs() < f32::EPSILON);
        assert!((clamp_confidence(None, 0.7) - 0.7).abs() < f32::EPSILON);
    }

    #[test]
    fn mime_type_from_extension() {
        assert_eq!(guess_mime_type(Path::new("rx.PNG")), "image/png");
        assert_eq!(guess_mime_type(Path::new("scan.jpeg")), "image/jpeg");
        assert_eq!(guess_mime_type(Path::new("noext")), "image/jpeg");
    }
}
