use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use license_console::commands::license::{
    check_features, get_license_status, upload_license, LicenseStatusResponse,
};
use license_console::commands::panel::render_status_panel;
use license_console::license::{HttpLicenseClient, LicenseStore, CONSOLE_FEATURES};
use license_console::settings::ConsoleSettings;

/// License console: shows the installed license and which features it grants.
#[derive(Parser, Debug)]
#[command(name = "license-console", version, about)]
struct Cli {
    /// Licensing authority base URL (overrides settings and environment)
    #[arg(long, global = true)]
    server_url: Option<String>,

    /// Request timeout in seconds (overrides settings and environment)
    #[arg(long, global = true, value_parser = clap::value_parser!(u64).range(1..))]
    timeout_secs: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show the current license status.
    Status {
        /// Print the status as JSON instead of the text panel.
        #[arg(long)]
        json: bool,
    },
    /// Check whether features are usable (defaults to the console's features).
    Check {
        features: Vec<String>,
    },
    /// Upload a license document (JSON) to the licensing authority.
    Upload {
        file: PathBuf,
    },
    /// Show the resolved settings.
    Config {
        /// Write the resolved settings to the settings file.
        #[arg(long)]
        save: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    // Load .env file if it exists (silently ignore errors to avoid leaking secrets)
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut settings = ConsoleSettings::load().context("Failed to load console settings")?;
    if let Some(url) = cli.server_url {
        settings.server_url = url;
    }
    if let Some(secs) = cli.timeout_secs {
        settings.request_timeout_secs = secs;
    }
    tracing::debug!(?settings, "Console settings resolved");

    if let Command::Config { save } = cli.command {
        print!("{}", toml::to_string_pretty(&settings)?);
        if save {
            let path = settings.save().context("Failed to save console settings")?;
            println!("# saved to {}", path.display());
        }
        return Ok(ExitCode::SUCCESS);
    }

    let client = HttpLicenseClient::from_settings(&settings)?;
    tracing::debug!(server = %client.base_url(), "License server");
    let store = Arc::new(LicenseStore::new(Arc::new(client)));

    match cli.command {
        Command::Status { json } => {
            activate_and_wait(&store).await?;
            let status = get_license_status(&store);
            if json {
                print_json(&status)?;
            } else {
                print!("{}", render_status_panel(&status));
            }
            Ok(exit_for(&status))
        }
        Command::Check { features } => {
            activate_and_wait(&store).await?;
            let features: Vec<String> = if features.is_empty() {
                CONSOLE_FEATURES.iter().map(|f| f.to_string()).collect()
            } else {
                features
            };

            let mut all_allowed = true;
            for check in check_features(&store, features.as_slice()) {
                match check.reason {
                    None => println!("{}: allowed", check.feature),
                    Some(reason) => {
                        all_allowed = false;
                        println!("{}: denied: {}", check.feature, reason);
                    }
                }
            }
            Ok(if all_allowed {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
        Command::Upload { file } => {
            let content = std::fs::read_to_string(&file)
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let document: serde_json::Value = serde_json::from_str(&content)
                .with_context(|| format!("{} is not valid JSON", file.display()))?;

            let status = upload_license(&store, document)
                .await
                .map_err(anyhow::Error::msg)?;
            print!("{}", render_status_panel(&status));
            Ok(ExitCode::SUCCESS)
        }
        Command::Config { .. } => Ok(ExitCode::SUCCESS),
    }
}

/// Mount-time refresh; waits so the one-shot commands print a settled state
async fn activate_and_wait(store: &Arc<LicenseStore>) -> anyhow::Result<()> {
    if let Some(handle) = store.activate() {
        handle.await.context("License refresh task failed")?;
    }
    Ok(())
}

fn print_json(status: &LicenseStatusResponse) -> anyhow::Result<()> {
    let mut value = serde_json::to_value(status)?;
    if let Some(map) = value.as_object_mut() {
        map.insert(
            "checkedAt".to_string(),
            serde_json::Value::String(chrono::Utc::now().to_rfc3339()),
        );
    }
    println!("{}", serde_json::to_string_pretty(&value)?);
    Ok(())
}

fn exit_for(status: &LicenseStatusResponse) -> ExitCode {
    if status.error.is_some() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
