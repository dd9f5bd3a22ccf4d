//! CLI argument parsing with clap.

use clap::Parser;
use std::path::PathBuf;

/// kaiwa - chat with AI providers from the terminal
#[derive(Parser, Debug)]
#[command(
    name = "kaiwa",
    version,
    about = "Chat with AI providers (OpenAI-compatible, Volcengine) from the terminal"
)]
pub struct Cli {
    /// Provider entry from config.toml (defaults to default_provider)
    #[arg(short = 'p', long = "provider", value_name = "NAME")]
    pub provider: Option<String>,

    /// Override the configured model id
    #[arg(short = 'm', long = "model", value_name = "MODEL")]
    pub model: Option<String>,

    /// System prompt prepended to the transcript
    #[arg(short = 's', long = "system", value_name = "PROMPT")]
    pub system: Option<String>,

    /// Wait for the complete response instead of streaming
    #[arg(long = "no-stream")]
    pub no_stream: bool,

    /// Ask the provider for a JSON-object response
    #[arg(long = "json")]
    pub json: bool,

    /// Path to the configuration file (default: $KAIWA_HOME/config.toml
    /// or ~/.kaiwa/config.toml)
    #[arg(long = "config", value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Show the usage estimate and finish reason after the response
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,

    /// The prompt to send (read from stdin when omitted and piped)
    #[arg(value_name = "PROMPT")]
    pub prompt: Vec<String>,
}
