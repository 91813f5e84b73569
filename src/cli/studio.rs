//! Interactive studio loop.
//!
//! Reads one command per line, applies it to the pipeline session and prints the outcome.
//! Input and output are generic so the loop runs against stdin/stdout or in-memory buffers.

use anyhow::Result;
use std::io::Write;
use std::path::PathBuf;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

use crate::generation::InfographicStyle;
use crate::output;
use crate::pipeline::InfographicPipeline;
use crate::session::SessionState;
use crate::StudioError;

pub const HELP: &str = "Commands:
  load <url>      fetch a transcript, generate summary, prompt and a first image
  style <name>    set the style used by the next image (modern, minimal, corporate, creative, dark, colorful)
  prompt <text>   replace the image prompt
  regen           generate a new image version
  prev / next     browse image versions
  show            show the session
  save            write the current image version to the output directory
  summary         print the summary
  clear           reset the session
  help            show this help
  quit            leave the studio";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StudioCommand {
    Load(String),
    Style(String),
    Prompt(String),
    Regenerate,
    Previous,
    Next,
    Show,
    Save,
    Summary,
    Clear,
    Help,
    Quit,
}

impl StudioCommand {
    /// Parse one input line; blank lines yield `None`
    pub fn parse(line: &str) -> Result<Option<Self>, StudioError> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(None);
        }

        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (line, ""),
        };

        let needs_argument = |name: &str| StudioError::InvalidInput(format!("`{name}` needs an argument"));

        let command = match word.to_lowercase().as_str() {
            "load" if rest.is_empty() => return Err(needs_argument("load")),
            "load" => StudioCommand::Load(rest.to_string()),
            "style" if rest.is_empty() => return Err(needs_argument("style")),
            "style" => StudioCommand::Style(rest.to_string()),
            "prompt" if rest.is_empty() => return Err(needs_argument("prompt")),
            "prompt" => StudioCommand::Prompt(rest.to_string()),
            "regen" | "regenerate" => StudioCommand::Regenerate,
            "prev" | "previous" => StudioCommand::Previous,
            "next" => StudioCommand::Next,
            "show" => StudioCommand::Show,
            "save" => StudioCommand::Save,
            "summary" => StudioCommand::Summary,
            "clear" => StudioCommand::Clear,
            "help" | "?" => StudioCommand::Help,
            "quit" | "exit" | "q" => StudioCommand::Quit,
            other => {
                return Err(StudioError::InvalidInput(format!(
                    "Unknown command `{other}`. Type `help` for the list of commands."
                )))
            }
        };
        Ok(Some(command))
    }
}

pub struct Studio<'a> {
    pipeline: &'a InfographicPipeline,
    output_dir: PathBuf,
}

impl<'a> Studio<'a> {
    pub fn new(pipeline: &'a InfographicPipeline, output_dir: PathBuf) -> Self {
        Self { pipeline, output_dir }
    }

    /// Read commands until `quit` or end of input
    pub async fn run<R, W>(&self, input: R, out: &mut W) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: Write,
    {
        let mut lines = input.lines();
        loop {
            write!(out, "studio> ")?;
            out.flush()?;

            let Some(line) = lines.next_line().await? else {
                writeln!(out)?;
                break;
            };

            match StudioCommand::parse(&line) {
                Ok(None) => continue,
                Ok(Some(StudioCommand::Quit)) => break,
                Ok(Some(command)) => self.execute(command, out).await?,
                Err(err) => writeln!(out, "{err}")?,
            }
        }
        Ok(())
    }

    pub async fn execute<W: Write>(&self, command: StudioCommand, out: &mut W) -> Result<()> {
        let session = self.pipeline.session();

        match command {
            StudioCommand::Load(url) => self.load(&url, out).await?,
            StudioCommand::Style(name) => {
                let style = InfographicStyle::from_name(&name);
                session.set_style(style);
                writeln!(out, "Style set to {style}. Use `regen` to generate a new version.")?;
            }
            StudioCommand::Prompt(text) => {
                session.set_prompt(text);
                writeln!(out, "Prompt updated. Use `regen` to generate a new version.")?;
            }
            StudioCommand::Regenerate => self.regenerate(out).await?,
            StudioCommand::Previous => {
                session.previous();
                write_position(out, &session.snapshot())?;
            }
            StudioCommand::Next => {
                session.next();
                write_position(out, &session.snapshot())?;
            }
            StudioCommand::Show => write_session(out, &session.snapshot())?,
            StudioCommand::Save => {
                let state = session.snapshot();
                match state.current_image() {
                    Some(version) => match output::save_image(version, &self.output_dir, state.title.as_deref()) {
                        Ok(path) => writeln!(out, "Saved {}", path.display())?,
                        Err(err) => writeln!(out, "Save failed: {err:#}")?,
                    },
                    None => writeln!(out, "No image to save yet.")?,
                }
            }
            StudioCommand::Summary => match session.snapshot().summary {
                Some(summary) => writeln!(out, "{summary}")?,
                None => writeln!(out, "No summary yet.")?,
            },
            StudioCommand::Clear => {
                self.pipeline.clear();
                writeln!(out, "Session cleared.")?;
            }
            StudioCommand::Help => writeln!(out, "{HELP}")?,
            StudioCommand::Quit => {}
        }
        Ok(())
    }

    /// Transcript, then summary and prompt, then a first image
    pub async fn load<W: Write>(&self, url: &str, out: &mut W) -> Result<()> {
        writeln!(out, "Fetching transcript...")?;
        let transcript = self.pipeline.load_transcript(url).await;
        if let Some(error) = transcript.error {
            writeln!(out, "Transcript failed: {error}")?;
            return Ok(());
        }
        writeln!(
            out,
            "Loaded \"{}\"",
            transcript.title.as_deref().unwrap_or("untitled video")
        )?;

        writeln!(out, "Generating summary and image prompt...")?;
        let (summary, prompt) = self.pipeline.generate_insights().await;
        if let Some(error) = summary.error {
            writeln!(out, "Summary failed: {error}")?;
        }
        match prompt.error {
            Some(error) => writeln!(out, "Prompt failed: {error}")?,
            None => self.regenerate(out).await?,
        }
        Ok(())
    }

    async fn regenerate<W: Write>(&self, out: &mut W) -> Result<()> {
        writeln!(out, "Generating {} infographic...", self.pipeline.session().snapshot().active_style)?;
        let result = self.pipeline.generate_image(None, None).await;
        match result.error {
            Some(error) => writeln!(out, "Image failed: {error}")?,
            None => write_position(out, &self.pipeline.session().snapshot())?,
        }
        Ok(())
    }
}

fn write_position<W: Write>(out: &mut W, state: &SessionState) -> std::io::Result<()> {
    match state.current_image() {
        Some(version) => writeln!(
            out,
            "Version {}/{} [{}] {} style",
            state.current_index + 1,
            state.images.len(),
            version.id,
            version.style
        ),
        None => writeln!(out, "No images yet."),
    }
}

fn write_session<W: Write>(out: &mut W, state: &SessionState) -> std::io::Result<()> {
    match (&state.video, &state.title) {
        (Some(video), Some(title)) => writeln!(out, "Video: {title} ({})", video.watch_url())?,
        (Some(video), None) => writeln!(out, "Video: {}", video.watch_url())?,
        _ => writeln!(out, "Video: none loaded")?,
    }
    writeln!(out, "Style: {}", state.active_style)?;
    writeln!(out, "Prompt: {}", state.prompt.as_deref().unwrap_or("(none)"))?;
    write_position(out, state)?;

    for (name, status) in [
        ("transcript", &state.stages.transcript),
        ("summary", &state.stages.summary),
        ("prompt", &state.stages.prompt),
        ("image", &state.stages.image),
    ] {
        if let Some(error) = &status.error {
            writeln!(out, "Last {name} error: {error}")?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::io::BufReader;

    use crate::config::Config;
    use crate::endpoints::RuntimeContext;
    use crate::extractors::VideoReference;
    use crate::generation::{MockImageModel, MockTextModel, ResponsePart};
    use crate::transcript::{MockTranscriptBackend, TranscriptFetcher};

    #[test]
    fn test_parse_commands() {
        assert_eq!(StudioCommand::parse("   "), Ok(None));
        assert_eq!(
            StudioCommand::parse("style  Dark "),
            Ok(Some(StudioCommand::Style("Dark".into())))
        );
        assert_eq!(
            StudioCommand::parse("prompt a crab explaining lifetimes"),
            Ok(Some(StudioCommand::Prompt("a crab explaining lifetimes".into())))
        );
        assert_eq!(StudioCommand::parse("REGEN"), Ok(Some(StudioCommand::Regenerate)));
        assert_eq!(StudioCommand::parse("exit"), Ok(Some(StudioCommand::Quit)));
        assert!(StudioCommand::parse("prompt").is_err());
        assert!(StudioCommand::parse("dance").is_err());
    }

    fn pipeline() -> InfographicPipeline {
        let mut backend = MockTranscriptBackend::new();
        backend.expect_post_transcript().never();
        let fetcher = TranscriptFetcher::new(
            Arc::new(backend),
            RuntimeContext::default(),
            Duration::from_secs(1),
        );

        let mut image = MockImageModel::new();
        image.expect_generate_image().returning(|_| {
            Ok(vec![ResponsePart::InlineData {
                mime_type: "image/png".into(),
                data: "aGVsbG8=".into(),
            }])
        });

        InfographicPipeline::with_components(
            Config::default(),
            fetcher,
            Arc::new(MockTextModel::new()),
            Arc::new(image),
        )
    }

    #[tokio::test]
    async fn test_session_commands_from_input() {
        let pipeline = pipeline();
        let dir = tempfile::tempdir().unwrap();
        let studio = Studio::new(&pipeline, dir.path().to_path_buf());

        let input = tokio_test::io::Builder::new()
            .read(b"regen\nprompt a crab explaining lifetimes\nstyle dark\nregen\nregen\nprev\nsave\ndance\nquit\nregen\n")
            .build();
        let mut out = Vec::new();
        studio.run(BufReader::new(input), &mut out).await.unwrap();
        let out = String::from_utf8(out).unwrap();

        assert!(out.contains("Image failed: No image prompt available"));
        assert!(out.contains("Style set to dark"));
        assert!(out.contains("Version 2/2"));
        assert!(out.contains("Version 1/2"));
        assert!(out.contains("Unknown command `dance`"));

        let state = pipeline.session().snapshot();
        assert_eq!(state.images.len(), 2);
        assert_eq!(state.current_index, 0);
        assert!(state.images.iter().all(|v| v.style == InfographicStyle::Dark));

        let saved: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(saved.len(), 1);
    }

    #[tokio::test]
    async fn test_clear_and_show() {
        let pipeline = pipeline();
        let studio = Studio::new(&pipeline, PathBuf::from("."));
        let mut out = Vec::new();

        studio.execute(StudioCommand::Prompt("p".into()), &mut out).await.unwrap();
        studio.execute(StudioCommand::Regenerate, &mut out).await.unwrap();
        studio.execute(StudioCommand::Clear, &mut out).await.unwrap();
        studio.execute(StudioCommand::Show, &mut out).await.unwrap();
        studio.execute(StudioCommand::Save, &mut out).await.unwrap();

        let out = String::from_utf8(out).unwrap();
        assert!(out.contains("Session cleared."));
        assert!(out.contains("Video: none loaded"));
        assert!(out.contains("Prompt: (none)"));
        assert!(out.contains("No image to save yet."));
        assert_eq!(pipeline.session().snapshot(), SessionState::default());
    }

    #[tokio::test]
    async fn test_show_links_the_loaded_video() {
        let pipeline = pipeline();
        let session = pipeline.session();
        session.update(session.epoch(), |state| {
            state.video = VideoReference::parse("https://youtu.be/dQw4w9WgXcQ?t=42").ok();
            state.title = Some("Never Gonna Give You Up".into());
        });

        let studio = Studio::new(&pipeline, PathBuf::from("."));
        let mut out = Vec::new();
        studio.execute(StudioCommand::Show, &mut out).await.unwrap();

        let out = String::from_utf8(out).unwrap();
        assert!(out.contains("Video: Never Gonna Give You Up (https://www.youtube.com/watch?v=dQw4w9WgXcQ)"));
    }

    #[tokio::test]
    async fn test_invalid_url_is_reported_without_network() {
        let pipeline = pipeline();
        let studio = Studio::new(&pipeline, PathBuf::from("."));
        let mut out = Vec::new();

        studio.load("https://example.com/video", &mut out).await.unwrap();

        let out = String::from_utf8(out).unwrap();
        assert!(out.contains("Transcript failed: Invalid YouTube URL format"));
        assert!(pipeline.session().snapshot().stages.transcript.error.is_some());
    }
}
