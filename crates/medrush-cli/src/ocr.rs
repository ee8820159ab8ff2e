//! `ocr` command handler.

use std::path::Path;

use medrush_core::AppConfig;
use medrush_ocr::{guess_mime_type, GenerativeClient, PrescriptionScanner, VisionClient};

/// Scan a prescription image through the vision / generative / pattern chain.
///
/// # Errors
///
/// Returns an error if the image cannot be read, an API key is missing, or
/// both providers fail.
pub(crate) async fn run_ocr(config: &AppConfig, image: &Path, json: bool) -> anyhow::Result<()> {
    let bytes = std::fs::read(image)
        .map_err(|e| anyhow::anyhow!("cannot read image {}: {e}", image.display()))?;
    let mime_type = guess_mime_type(image);

    let vision = VisionClient::with_base_url(
        config.require_vision_key()?,
        config.http_timeout_secs,
        &config.user_agent,
        &config.vision_base_url,
    )?;
    let generator = GenerativeClient::with_base_url(
        config.require_genai_key()?,
        &config.genai_model,
        config.http_timeout_secs,
        &config.user_agent,
        &config.genai_base_url,
    )?;
    let scanner = PrescriptionScanner::new(vision, generator);

    let result = scanner.scan(&bytes, mime_type).await?;
    tracing::info!(source = %result.source, confidence = result.confidence, "scan complete");

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    println!(
        "source: {} (confidence {:.2})",
        result.source, result.confidence
    );
    println!(
        "prescription: {}",
        if result.is_prescription { "yes" } else { "no" }
    );
    if result.medicine_names.is_empty() {
        println!("medicines: none recognised");
    } else {
        println!("medicines:");
        for name in &result.medicine_names {
            println!("  - {name}");
        }
    }
    Ok(())
}
