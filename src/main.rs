use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use yt_infographic::cli::studio::{Studio, HELP};
use yt_infographic::cli::{Cli, Commands, OutputFormat};
use yt_infographic::output;
use yt_infographic::pipeline::PipelineReport;
use yt_infographic::transcript::HttpTranscriptBackend;
use yt_infographic::{
    resolve_candidates, Config, ImageVersion, InfographicPipeline, InfographicStyle, TranscriptFetcher,
};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = match (cli.verbose, cli.quiet) {
        (true, _) => "yt_infographic=debug",
        (false, true) => "yt_infographic=warn",
        (false, false) => "yt_infographic=info",
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = Config::load(cli.config.as_deref(), !cli.no_env_file)?;
    let quiet = cli.quiet;

    match cli.command {
        Commands::Transcript {
            url,
            max_length,
            format,
            output,
        } => {
            let fetcher = TranscriptFetcher::from_config(&config)?;
            let max_length = max_length.unwrap_or(config.transcript.max_length);

            let progress = spinner(quiet, "Fetching transcript...");
            let result = fetcher.fetch(&url, max_length).await;
            progress.finish_and_clear();

            if result.success || matches!(format, OutputFormat::Json) {
                output::emit(&output::format_transcript(&result, &format)?, output.as_deref())?;
            }
            if let Some(error) = result.error {
                anyhow::bail!(error);
            }
        }
        Commands::Summarize { url, format } => {
            let pipeline = InfographicPipeline::new(config)?;

            let progress = spinner(quiet, "Fetching transcript...");
            let transcript = pipeline.load_transcript(&url).await;
            if !transcript.success {
                progress.finish_and_clear();
                return fail_report(PipelineReport {
                    transcript,
                    summary: None,
                    prompt: None,
                    image: None,
                }, &format);
            }

            progress.set_message("Generating summary and image prompt...");
            let (summary, prompt) = pipeline.generate_insights().await;
            progress.finish_and_clear();

            let failed = !summary.success && !prompt.success;
            let report = PipelineReport {
                transcript,
                summary: Some(summary),
                prompt: Some(prompt),
                image: None,
            };
            if failed {
                return fail_report(report, &format);
            }
            output::emit(&output::format_report(&report, &format)?, None)?;
        }
        Commands::Generate {
            url,
            style,
            output_dir,
            format,
        } => {
            let pipeline = InfographicPipeline::new(config)?;
            let style = InfographicStyle::from_name(&style);

            let progress = spinner(quiet, &format!("Generating {style} infographic..."));
            let report = pipeline.run(&url, style).await;
            progress.finish_and_clear();

            let image = report.image.clone();
            match image.and_then(|image| image.data) {
                Some(version) => {
                    output::emit(&output::format_report(&report, &format)?, None)?;
                    let title = report.transcript.title.as_deref();
                    save_version(&version, &output_dir, title)?;
                }
                None => return fail_report(report, &format),
            }
        }
        Commands::Image {
            prompt,
            prompt_file,
            style,
            output_dir,
        } => {
            let prompt = match (prompt, prompt_file) {
                (Some(prompt), _) => prompt,
                (None, Some(path)) => fs_err::read_to_string(&path)
                    .with_context(|| format!("Failed to read prompt file {}", path.display()))?,
                (None, None) => anyhow::bail!("Provide --prompt or --prompt-file"),
            };
            let pipeline = InfographicPipeline::new(config)?;
            let style = InfographicStyle::from_name(&style);

            let progress = spinner(quiet, &format!("Generating {style} infographic..."));
            let result = pipeline.generate_image(Some(prompt), Some(style)).await;
            progress.finish_and_clear();

            match result.into_result() {
                Ok(version) => save_version(&version, &output_dir, None)?,
                Err(error) => anyhow::bail!(error),
            }
        }
        Commands::Studio {
            url,
            style,
            output_dir,
        } => {
            let pipeline = InfographicPipeline::new(config)?;
            pipeline.session().set_style(InfographicStyle::from_name(&style));

            let studio = Studio::new(&pipeline, output_dir);
            let mut stdout = std::io::stdout();
            println!("{HELP}\n");
            if let Some(url) = url {
                studio.load(&url, &mut stdout).await?;
            }
            studio
                .run(tokio::io::BufReader::new(tokio::io::stdin()), &mut stdout)
                .await?;
        }
        Commands::Endpoints => {
            println!("Transcript endpoints, in the order they are tried:");
            for (index, candidate) in resolve_candidates(&config.runtime_context()).iter().enumerate() {
                println!("  {}. {}", index + 1, candidate);
            }
        }
        Commands::Health => {
            let backend = HttpTranscriptBackend::new(config.deployment.origin.as_deref())?;
            let timeout = config.transcript_timeout();
            let mut healthy = 0;
            let candidates = resolve_candidates(&config.runtime_context());

            for candidate in &candidates {
                match tokio::time::timeout(timeout, backend.health(candidate)).await {
                    Ok(Ok(status)) if status.is_healthy() => {
                        healthy += 1;
                        println!("  ✓ {candidate}");
                    }
                    Ok(Ok(status)) => println!("  ✗ {candidate} (status: {})", status.status),
                    Ok(Err(err)) => println!("  ✗ {candidate} ({err:#})"),
                    Err(_) => println!("  ✗ {candidate} (timed out after {}ms)", timeout.as_millis()),
                }
            }

            if healthy == 0 {
                anyhow::bail!("No healthy transcript service found");
            }
        }
        Commands::Styles => {
            println!("Available styles:");
            println!("{}", output::format_styles());
        }
        Commands::Config { show } => {
            if show {
                config.display();
            } else {
                let path = match cli.config {
                    Some(path) => path,
                    None => Config::config_path().context("Could not determine a config directory")?,
                };
                if path.exists() {
                    println!("Configuration already exists at {}", path.display());
                    println!("Use `config --show` to view it.");
                } else {
                    Config::default().save(&path)?;
                    println!("Wrote default configuration to {}", path.display());
                    println!("Set GEMINI_API_KEY in the environment or a .env file.");
                }
            }
        }
    }

    Ok(())
}

fn spinner(quiet: bool, message: &str) -> ProgressBar {
    if quiet {
        return ProgressBar::hidden();
    }

    let progress = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed_precise}] {msg}") {
        progress.set_style(style);
    }
    progress.set_message(message.to_string());
    progress.enable_steady_tick(Duration::from_millis(100));
    progress
}

fn save_version(version: &ImageVersion, dir: &Path, title: Option<&str>) -> Result<()> {
    let path = output::save_image(version, dir, title)?;
    println!("Infographic saved to: {}", path.display());
    Ok(())
}

/// Print what was produced, then fail with the first stage error
fn fail_report(report: PipelineReport, format: &OutputFormat) -> Result<()> {
    if matches!(format, OutputFormat::Json) {
        output::emit(&output::format_report(&report, format)?, None)?;
    }

    let error = report
        .transcript
        .error
        .or_else(|| report.image.and_then(|image| image.error))
        .or_else(|| report.prompt.and_then(|prompt| prompt.error))
        .or_else(|| report.summary.and_then(|summary| summary.error))
        .unwrap_or_else(|| "Generation failed".to_string());
    anyhow::bail!(error)
}
