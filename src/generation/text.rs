use super::{GenerationResult, TextModel};
use crate::StudioError;

const TRANSCRIPT_SLOT: &str = "{transcript}";

pub const SUMMARY_PLACEHOLDER: &str = "Summary could not be generated.";
pub const PROMPT_PLACEHOLDER: &str = "Image prompt could not be generated.";

static SUMMARY_TEMPLATE: &str = r#"You are an expert content analyst. Read the following YouTube video transcript and write a clear, well-structured summary for a reader who has not watched the video.

Requirements:
- Length: 200-500 words
- Start with a one-sentence overview of what the video is about
- Organise the main points under short headings or bullet points
- Include important facts, numbers, examples and conclusions
- Finish with the key takeaways
- Write in plain, neutral language and do not invent information that is not in the transcript

Transcript:
{transcript}"#;

static IMAGE_PROMPT_TEMPLATE: &str = r#"You are an expert information designer. Based on the following YouTube video transcript, write a detailed prompt for an image-generation model that will create a single infographic summarising the video.

The prompt must describe:
1. Main topic: a short, catchy title for the infographic
2. Key points: the 4-6 most important ideas, each as a short phrase suitable for on-image text
3. Layout: how the sections are arranged (for example top-to-bottom flow, grid, timeline or comparison)
4. Visual elements: icons, diagrams, charts or illustrations that represent each key point
5. Color suggestions: a palette that fits the subject and keeps text readable

Return only the prompt text, with no preamble or explanation.

Transcript:
{transcript}"#;

/// Fill `template` with the transcript and run it through the text model.
///
/// Never fails: configuration, transport and backend errors become `success: false`;
/// an empty model answer becomes `placeholder`.
pub async fn synthesize(
    model: &dyn TextModel,
    transcript: &str,
    template: &str,
    placeholder: &str,
) -> GenerationResult<String> {
    if transcript.trim().is_empty() {
        return StudioError::InvalidInput("No transcript available to generate from".to_string()).into();
    }

    let prompt = template.replace(TRANSCRIPT_SLOT, transcript);

    match model.generate_text(&prompt).await {
        Ok(text) if text.trim().is_empty() => {
            tracing::warn!("Text model returned an empty answer, using placeholder");
            GenerationResult::ok(placeholder.to_string())
        }
        Ok(text) => GenerationResult::ok(text.trim().to_string()),
        Err(err) => {
            tracing::warn!("Text generation failed: {:#}", err);
            match err.downcast::<StudioError>() {
                Ok(studio_err) => studio_err.into(),
                Err(other) => GenerationResult::failed(format!("Text generation failed: {other}")),
            }
        }
    }
}

/// Reader-facing summary of the transcript
pub async fn generate_summary(model: &dyn TextModel, transcript: &str) -> GenerationResult<String> {
    synthesize(model, transcript, SUMMARY_TEMPLATE, SUMMARY_PLACEHOLDER).await
}

/// Image-generation-ready description of the transcript
pub async fn generate_image_prompt(model: &dyn TextModel, transcript: &str) -> GenerationResult<String> {
    synthesize(model, transcript, IMAGE_PROMPT_TEMPLATE, PROMPT_PLACEHOLDER).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::MockTextModel;

    #[tokio::test]
    async fn test_summary_substitutes_transcript() {
        let mut model = MockTextModel::new();
        model
            .expect_generate_text()
            .withf(|prompt| prompt.contains("200-500 words") && prompt.ends_with("the transcript text"))
            .times(1)
            .returning(|_| Ok("  A tidy summary.\n".to_string()));

        let result = generate_summary(&model, "the transcript text").await;
        assert_eq!(result, GenerationResult::ok("A tidy summary.".to_string()));
    }

    #[tokio::test]
    async fn test_image_prompt_template_lists_required_sections() {
        let mut model = MockTextModel::new();
        model
            .expect_generate_text()
            .withf(|prompt| {
                ["Main topic", "Key points", "Layout", "Visual elements", "Color suggestions"]
                    .iter()
                    .all(|section| prompt.contains(section))
                    && !prompt.contains(TRANSCRIPT_SLOT)
            })
            .returning(|_| Ok("An infographic titled ...".to_string()));

        let result = generate_image_prompt(&model, "words").await;
        assert!(result.success);
    }

    #[tokio::test]
    async fn test_empty_answer_becomes_placeholder() {
        let mut model = MockTextModel::new();
        model.expect_generate_text().returning(|_| Ok("   ".to_string()));

        let summary = generate_summary(&model, "words").await;
        assert_eq!(summary.data.as_deref(), Some(SUMMARY_PLACEHOLDER));

        let prompt = generate_image_prompt(&model, "words").await;
        assert!(prompt.success);
        assert_eq!(prompt.data.as_deref(), Some(PROMPT_PLACEHOLDER));
    }

    #[tokio::test]
    async fn test_missing_credential_is_a_failure_result() {
        let mut model = MockTextModel::new();
        model.expect_generate_text().returning(|_| {
            Err(StudioError::Configuration("GEMINI_API_KEY environment variable is not set".into()).into())
        });

        let result = generate_summary(&model, "words").await;
        assert!(!result.success);
        assert!(result.data.is_none());
        assert_eq!(
            result.error.as_deref(),
            Some("Configuration error: GEMINI_API_KEY environment variable is not set")
        );
    }

    #[tokio::test]
    async fn test_transport_error_is_caught() {
        let mut model = MockTextModel::new();
        model
            .expect_generate_text()
            .returning(|_| Err(anyhow::anyhow!("Gemini API returned 500 Internal Server Error: INTERNAL: oops")));

        let result = generate_image_prompt(&model, "words").await;
        assert!(!result.success);
        assert!(result.error.unwrap().contains("INTERNAL: oops"));
    }

    #[tokio::test]
    async fn test_blank_transcript_skips_model() {
        let mut model = MockTextModel::new();
        model.expect_generate_text().never();

        let result = generate_summary(&model, " \n").await;
        assert!(!result.success);
    }
}
