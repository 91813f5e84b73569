use anyhow::{Context, Result};
use serde::Serialize;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use crate::cli::OutputFormat;
use crate::generation::{GenerationResult, InfographicStyle};
use crate::pipeline::PipelineReport;
use crate::session::ImageVersion;
use crate::transcript::TranscriptResult;
use crate::utils::{decode_data_uri, format_file_size, image_filename};

/// Pretty JSON for any serializable result
pub fn format_as_json<T: Serialize>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value).context("Failed to serialize output as JSON")
}

pub fn format_transcript(result: &TranscriptResult, format: &OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => format_as_json(result),
        OutputFormat::Text => {
            let mut out = String::new();
            if let Some(error) = &result.error {
                writeln!(out, "Transcript failed: {error}")?;
                return Ok(out);
            }
            if let Some(title) = &result.title {
                writeln!(out, "Title: {title}")?;
            }
            if let Some(video_id) = &result.video_id {
                writeln!(out, "Video ID: {video_id}")?;
            }
            if let Some(language) = &result.detected_language {
                writeln!(out, "Language: {language}")?;
            }
            writeln!(out)?;
            write!(out, "{}", result.transcript.as_deref().unwrap_or_default())?;
            Ok(out)
        }
    }
}

fn write_stage(out: &mut String, heading: &str, result: &GenerationResult<String>) -> std::fmt::Result {
    writeln!(out, "== {heading} ==")?;
    match (&result.data, &result.error) {
        (Some(text), _) if result.success => writeln!(out, "{text}"),
        (_, Some(error)) => writeln!(out, "Failed: {error}"),
        _ => writeln!(out, "Failed"),
    }
}

/// Text rendering of a one-shot run; JSON renders the report as-is
pub fn format_report(report: &PipelineReport, format: &OutputFormat) -> Result<String> {
    if matches!(format, OutputFormat::Json) {
        return format_as_json(report);
    }

    let transcript = &report.transcript;
    let mut out = String::new();
    if let Some(error) = &transcript.error {
        writeln!(out, "Transcript failed: {error}")?;
        return Ok(out);
    }

    if let Some(title) = &transcript.title {
        writeln!(out, "Title: {title}")?;
    }
    writeln!(
        out,
        "Transcript: {} characters ({})",
        transcript.transcript.as_deref().map_or(0, |t| t.chars().count()),
        transcript.detected_language.as_deref().unwrap_or("unknown language")
    )?;
    writeln!(out)?;

    if let Some(summary) = &report.summary {
        write_stage(&mut out, "Summary", summary)?;
        writeln!(out)?;
    }
    if let Some(prompt) = &report.prompt {
        write_stage(&mut out, "Image Prompt", prompt)?;
        writeln!(out)?;
    }
    if let Some(image) = &report.image {
        writeln!(out, "== Infographic ==")?;
        match (&image.data, &image.error) {
            (Some(version), _) => writeln!(out, "Version {} ({} style)", version.id, version.style)?,
            (None, Some(error)) => writeln!(out, "Failed: {error}")?,
            (None, None) => writeln!(out, "Failed")?,
        }
    }
    Ok(out)
}

pub fn format_styles() -> String {
    InfographicStyle::ALL
        .iter()
        .map(|style| format!("  {:<10} {}", style.as_str(), style.description()))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Write `content` to `path`, or print it when no path is given
pub fn emit(content: &str, path: Option<&Path>) -> Result<()> {
    match path {
        Some(path) => {
            fs_err::write(path, content)?;
            eprintln!("Saved to: {}", path.display());
        }
        None => println!("{}", content.trim_end()),
    }
    Ok(())
}

/// Decode an image version and write it under `dir`; returns the written path
pub fn save_image(version: &ImageVersion, dir: &Path, title: Option<&str>) -> Result<PathBuf> {
    let (mime_type, bytes) = decode_data_uri(&version.image_url)
        .with_context(|| format!("Cannot save image version {}", version.id))?;

    fs_err::create_dir_all(dir)?;
    let path = dir.join(image_filename(version, title, &mime_type));
    fs_err::write(&path, &bytes)?;

    tracing::info!(
        "Saved image version {} to {} ({})",
        version.id,
        path.display(),
        format_file_size(bytes.len() as u64)
    );
    Ok(path)
}
