mod cli;

use reelforged::config::{self, Overrides};
use reelforged::pipeline::{Collaborators, PipelineDriver};

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands, RunArgs};
use std::sync::Arc;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Respect RUST_LOG env var if set, otherwise use defaults based on verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "reelforged=trace,reelforged_av=debug,reelforged_common=debug".to_string()
        } else {
            "reelforged=info,reelforged_av=info".to_string()
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        None | Some(Commands::Run) => run(cli.config.as_deref(), cli.run),
        Some(Commands::CheckTools) => check_tools(),
        Some(Commands::Validate { file }) => {
            let path = file.or(cli.config);
            validate_config(path.as_deref())
        }
        Some(Commands::Version) => {
            println!("reelforged {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

/// Full run. Handled failures end up in the status line, not the exit code.
fn run(config_path: Option<&std::path::Path>, args: RunArgs) -> Result<()> {
    let config = match config::load_config_or_default(config_path) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("{:#}", e);
            println!("Run aborted: {:#}", e);
            return Ok(());
        }
    };

    let config = Arc::new(config.with_overrides(Overrides {
        output_dir: args.output_dir,
        tts_api_key: args.tts_api_key,
        token_b64: args.oauth_token_b64,
        client_secret_json: args.oauth_client_json,
        skip_upload: args.skip_upload,
    }));

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;

    let driver = PipelineDriver::new(config.clone(), Collaborators::from_config(&config));
    let report = runtime.block_on(driver.run());

    for skip in &report.skipped {
        tracing::info!("Skipped {}", skip);
    }
    println!("{}", report.status_line());

    Ok(())
}

fn check_tools() -> Result<()> {
    let tools = reelforged_av::check_tools();

    println!("External tools:");
    for tool in &tools {
        if tool.available {
            println!(
                "  {} {} - {}",
                tool.name,
                tool.version.as_deref().unwrap_or("unknown"),
                tool.path
                    .as_ref()
                    .map(|p| p.display().to_string())
                    .unwrap_or_default()
            );
        } else {
            println!("  {} - not found", tool.name);
        }
    }

    if tools.iter().all(|t| t.available) {
        println!("\nAll required tools are available.");
    } else {
        println!("\nSome required tools are missing.");
    }

    Ok(())
}

fn validate_config(config_path: Option<&std::path::Path>) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;
    config::validate_config(&config)?;

    println!("Configuration is valid.");
    println!("  Output: {:?}", config.output.video_path());
    println!("  Images: {:?}", config.assets.images_dir);
    println!(
        "  Upload: {}",
        if config.upload.enabled {
            format!("enabled ({})", config.upload.privacy)
        } else {
            "disabled".to_string()
        }
    );

    Ok(())
}
