use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

pub mod studio;

#[derive(Parser)]
#[command(
    name = "yt-infographic",
    about = "YouTube Infographic Studio - turn a YouTube video into a summary and AI-generated infographics",
    version,
    long_about = "Fetches a YouTube transcript from the first transcript service that answers, asks Gemini for a summary and an image prompt, and generates infographic images in a selectable visual style."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable progress indicators
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Read this config file instead of ./config.yaml or the user config directory
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Do not load variables from a .env file
    #[arg(long, global = true)]
    pub no_env_file: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Fetch the transcript of a YouTube video
    Transcript {
        /// YouTube video URL
        #[arg(value_name = "URL")]
        url: String,

        /// Maximum transcript length requested from the service
        #[arg(long, value_name = "CHARS")]
        max_length: Option<usize>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,

        /// Output file path (prints to console if not specified)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Fetch the transcript, then generate the summary and image prompt
    Summarize {
        /// YouTube video URL
        #[arg(value_name = "URL")]
        url: String,

        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Run the whole pipeline and save one infographic
    Generate {
        /// YouTube video URL
        #[arg(value_name = "URL")]
        url: String,

        /// Visual style (unknown names fall back to modern)
        #[arg(short, long, default_value = "modern")]
        style: String,

        /// Directory generated images are written to
        #[arg(short = 'd', long, value_name = "DIR", default_value = ".")]
        output_dir: PathBuf,

        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Generate an infographic straight from a prompt
    Image {
        /// Prompt text
        #[arg(short, long, required_unless_present = "prompt_file", conflicts_with = "prompt_file")]
        prompt: Option<String>,

        /// Read the prompt from a file
        #[arg(long, value_name = "FILE")]
        prompt_file: Option<PathBuf>,

        /// Visual style (unknown names fall back to modern)
        #[arg(short, long, default_value = "modern")]
        style: String,

        /// Directory generated images are written to
        #[arg(short = 'd', long, value_name = "DIR", default_value = ".")]
        output_dir: PathBuf,
    },

    /// Interactive session: regenerate, restyle and browse image versions
    Studio {
        /// YouTube video URL to load on start
        #[arg(value_name = "URL")]
        url: Option<String>,

        /// Initial visual style
        #[arg(short, long, default_value = "modern")]
        style: String,

        /// Directory saved images are written to
        #[arg(short = 'd', long, value_name = "DIR", default_value = ".")]
        output_dir: PathBuf,
    },

    /// Show the transcript endpoints in the order they are tried
    Endpoints,

    /// Check the health endpoint of every transcript candidate
    Health,

    /// List infographic styles
    Styles,

    /// Show or initialise the configuration
    Config {
        /// Show current configuration
        #[arg(short, long)]
        show: bool,
    },
}

#[derive(ValueEnum, Clone, Debug)]
pub enum OutputFormat {
    /// Human-readable text
    Text,
    /// Pretty-printed JSON
    Json,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}
