//! AtlasField Dashboard CLI
//!
//! Drives the view-model orchestrator against a live AtlasField service and
//! prints the resulting view model as JSON.

use std::path::PathBuf;

use anyhow::Context;
use atlasfield_core::{AnalysisKind, SiteId};
use atlasfield_dashboard::models::settings::{SettingsUpdate, ThreadSwitchPolicy};
use atlasfield_dashboard::storage::ConfigService;
use atlasfield_dashboard::{AppError, DashboardState};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "atlasfield-dashboard", version, about = "AtlasField site analysis dashboard")]
struct Cli {
    /// Config file (default: ~/.atlasfield/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Override the service base URL
    #[arg(long, global = true, env = "ATLASFIELD_API_URL")]
    api_url: Option<String>,

    /// Override the bearer token
    #[arg(long, global = true, env = "ATLASFIELD_API_TOKEN", hide_env_values = true)]
    token: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List monitored sites
    Sites,
    /// Show the dashboard view model for a site
    Show {
        #[arg(long)]
        site: Option<SiteId>,
        /// Open this analysis of the site's history in the detail view
        #[arg(long)]
        analysis: Option<i64>,
    },
    /// Run a new analysis and show the updated view model
    Run {
        #[arg(long)]
        site: Option<SiteId>,
        /// NDVI, RVI, MOISTURE, FUSION, YIELD, BIOMASS, COMPLETE or FOREST
        #[arg(long)]
        kind: Option<AnalysisKind>,
    },
    /// Ask the assistant about a site (or in general)
    Chat {
        #[arg(long)]
        site: Option<SiteId>,
        message: String,
    },
    /// Show or change the stored configuration
    Config {
        #[command(subcommand)]
        action: Option<ConfigAction>,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Persist new settings
    Set {
        #[arg(long)]
        base_url: Option<String>,
        /// An empty value clears the stored token
        #[arg(long)]
        api_token: Option<String>,
        #[arg(long)]
        timeout_secs: Option<u64>,
        #[arg(long, value_enum)]
        thread_policy: Option<ThreadSwitchPolicy>,
    },
    /// Restore the defaults
    Reset,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("atlasfield_dashboard=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config_service = match cli.config {
        Some(path) => ConfigService::with_path(path),
        None => ConfigService::new(),
    }
    .context("Failed to load configuration")?;

    if let Command::Config { action } = cli.command {
        match action {
            Some(ConfigAction::Set {
                base_url,
                api_token,
                timeout_secs,
                thread_policy,
            }) => {
                config_service
                    .update_config(SettingsUpdate {
                        api_base_url: base_url,
                        api_token,
                        request_timeout_secs: timeout_secs,
                        thread_switch_policy: thread_policy,
                    })
                    .context("Configuration not saved")?;
            }
            Some(ConfigAction::Reset) => config_service.reset()?,
            None => {}
        }
        let mut shown = config_service.get_config_clone();
        if shown.api_token.is_some() {
            shown.api_token = Some("********".to_string());
        }
        println!("{}", serde_json::to_string_pretty(&shown)?);
        return Ok(());
    }

    // Overrides apply to this invocation only
    let mut config = config_service.get_config_clone();
    config.apply_update(SettingsUpdate {
        api_base_url: cli.api_url,
        api_token: cli.token,
        ..Default::default()
    });
    config
        .validate()
        .map_err(anyhow::Error::msg)
        .context("Invalid configuration override")?;
    tracing::debug!(path = %config_service.path().display(), "Configuration loaded");

    let dashboard = DashboardState::headless(&config)?;
    dashboard.initialize().await?;

    match cli.command {
        Command::Sites => {
            let sites = dashboard.sites().await;
            println!("{}", serde_json::to_string_pretty(&sites)?);
            return Ok(());
        }
        Command::Show { site, analysis } => {
            select(&dashboard, site).await?;
            if let Some(analysis_id) = analysis {
                dashboard.open_analysis(analysis_id)?;
            }
        }
        Command::Run { site, kind } => {
            select(&dashboard, site).await?;
            let record = dashboard.run_analysis(kind).await.map_err(with_retry_hint)?;
            tracing::info!(analysis_id = record.id, "Analysis completed");
        }
        Command::Chat { site, message } => {
            select(&dashboard, site).await?;
            if site.is_none() {
                dashboard.conversation().switch_context(None).await?;
            }
            let reply = dashboard
                .send_chat_message(&message)
                .await
                .map_err(with_retry_hint)?;
            println!("{}", reply.response);
            return Ok(());
        }
        // Handled before connecting
        Command::Config { .. } => return Ok(()),
    }

    let view = dashboard.view_model().await;
    println!("{}", serde_json::to_string_pretty(&view)?);
    Ok(())
}

async fn select(dashboard: &DashboardState, site: Option<SiteId>) -> anyhow::Result<()> {
    if let Some(site_id) = site {
        dashboard
            .select_site(site_id)
            .await
            .with_context(|| format!("Cannot select site {}", site_id))?;
    }
    Ok(())
}

fn with_retry_hint(err: AppError) -> anyhow::Error {
    if err.is_retryable() {
        anyhow::Error::new(err).context("Temporary failure, the same command can be retried")
    } else {
        anyhow::Error::new(err)
    }
}
