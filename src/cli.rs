use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "reelforged")]
#[command(author, version, about = "Daily compilation video builder and uploader")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, env = "REELFORGED_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(flatten)]
    pub run: RunArgs,

    /// Defaults to a full run when omitted
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Environment-style inputs for a run.
#[derive(Args, Debug, Default)]
pub struct RunArgs {
    /// Directory receiving the video
    #[arg(long, global = true, env = "REELFORGED_OUTPUT_DIR")]
    pub output_dir: Option<PathBuf>,

    /// Speech synthesis API key
    #[arg(long, global = true, env = "REELFORGED_TTS_API_KEY", hide_env_values = true)]
    pub tts_api_key: Option<String>,

    /// Base64 of the OAuth token JSON
    #[arg(long, global = true, env = "REELFORGED_OAUTH_TOKEN_B64", hide_env_values = true)]
    pub oauth_token_b64: Option<String>,

    /// OAuth client secret JSON content
    #[arg(long, global = true, env = "REELFORGED_OAUTH_CLIENT_JSON", hide_env_values = true)]
    pub oauth_client_json: Option<String>,

    /// Render only, do not upload
    #[arg(long, global = true)]
    pub skip_upload: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Build today's compilation and upload it
    Run,

    /// Check that required external tools are available
    CheckTools,

    /// Validate configuration file
    Validate {
        /// Config file to validate (uses default if not specified)
        #[arg(value_name = "CONFIG")]
        file: Option<PathBuf>,
    },

    /// Display version information
    Version,
}
