//! Prescription OCR and classification.
//!
//! Runs an uploaded image through a vision text detector, falls back to a
//! generative model asked for structured JSON, and finally to pattern
//! matching over the model's raw reply when that JSON does not parse.

pub mod chain;
pub mod error;
pub mod generative;
pub mod patterns;
pub mod types;
pub mod vision;

pub use chain::{ContentGenerator, PrescriptionScanner, TextDetector};
pub use error::OcrError;
pub use generative::GenerativeClient;
pub use patterns::{analyze_text, extract_medicine_names, looks_like_prescription};
pub use types::{guess_mime_type, DetectedText, OcrResult, OcrSource};
pub use vision::VisionClient;
