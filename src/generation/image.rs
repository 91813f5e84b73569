use base64::{engine::general_purpose::STANDARD, Engine as _};

use super::{GenerationResult, ImageModel, InfographicStyle, ResponsePart};
use crate::StudioError;

pub const NO_IMAGE_DATA: &str = "No image data found in the response";

const LAYOUT_REQUIREMENTS: &str = r#"Design requirements:
- Include a clear, prominent title at the top
- Use a strong font hierarchy: large headings, medium subheadings, readable body text
- Use icons, simple diagrams or charts to illustrate each key point
- Organise the content into clearly separated sections that flow logically
- Keep colors consistent across all sections
- Ensure high contrast between text and background so every word is legible
- Add arrows, numbering or lines to guide the eye through the information
- Keep text short and spelled correctly; avoid clutter and dense paragraphs"#;

/// Final prompt sent to the image model: style, then content, then layout rules
pub fn build_image_prompt(prompt: &str, style: InfographicStyle) -> String {
    format!(
        "{}\n\n{}\n\n{}",
        style.description(),
        prompt.trim(),
        LAYOUT_REQUIREMENTS
    )
}

/// Generate an infographic and return it as a `data:` URI.
///
/// Never fails: errors are classified into user-facing messages.
pub async fn synthesize_image(
    model: &dyn ImageModel,
    prompt: &str,
    style: InfographicStyle,
) -> GenerationResult<String> {
    if prompt.trim().is_empty() {
        return StudioError::InvalidInput("Image prompt is empty".to_string()).into();
    }

    let full_prompt = build_image_prompt(prompt, style);
    tracing::info!("Generating {} infographic ({} prompt chars)", style, full_prompt.len());

    let parts = match model.generate_image(&full_prompt).await {
        Ok(parts) => parts,
        Err(err) => {
            tracing::warn!("Image generation failed: {:#}", err);
            let classified = match err.downcast::<StudioError>() {
                Ok(studio_err) => match studio_err {
                    StudioError::Configuration(_) => studio_err,
                    other => classify_error(&other.to_string()),
                },
                Err(other) => classify_error(&format!("{other:#}")),
            };
            return classified.into();
        }
    };

    match first_inline_image(parts) {
        Ok(data_uri) => GenerationResult::ok(data_uri),
        Err(err) => err.into(),
    }
}

fn first_inline_image(parts: Vec<ResponsePart>) -> Result<String, StudioError> {
    for part in parts {
        match part {
            ResponsePart::Text(text) => tracing::debug!("Image model text: {}", text),
            ResponsePart::InlineData { mime_type, data } => {
                STANDARD.decode(data.trim()).map_err(|e| {
                    StudioError::GenerationFailed(format!("image payload is not valid base64: {e}"))
                })?;

                let mime_type = if mime_type.is_empty() {
                    "image/png".to_string()
                } else {
                    mime_type
                };
                return Ok(format!("data:{};base64,{}", mime_type, data.trim()));
            }
        }
    }

    Err(StudioError::EmptyResult(NO_IMAGE_DATA.to_string()))
}

/// Map backend error text onto the error classes users can act on
pub fn classify_error(message: &str) -> StudioError {
    let lower = message.to_lowercase();
    let mentions = |needles: &[&str]| needles.iter().any(|needle| lower.contains(needle));

    if mentions(&["api key", "api_key", "unauthenticated", "permission_denied", " 401", " 403"]) {
        StudioError::InvalidCredentials
    } else if mentions(&["quota", "resource_exhausted", "rate limit", " 429"]) {
        StudioError::QuotaExceeded
    } else if mentions(&["not_found", " 404", "unavailable", " 503", "overloaded"])
        || (lower.contains("model")
            && mentions(&["not found", "not supported", "does not exist"]))
    {
        StudioError::ModelUnavailable
    } else {
        StudioError::GenerationFailed(message.to_string())
    }
}
