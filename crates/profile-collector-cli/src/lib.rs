#![allow(clippy::print_stdout)]

use std::io::Write;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use profile_collector_core::config::{ENV_DEBUG, ENV_WEBHOOK_URL};
use profile_collector_core::{
    CollectorConfig, FormController, IdentityProvider, ViewRenderer, ViewState,
};
use profile_collector_http::{
    AccessTokenSource, DEFAULT_GRAPH_BASE_URL, GraphIdentityProvider, GraphProfileClient,
    StaticAccessToken, WebhookClient,
};
use tracing::info;

mod prompt;
mod render;

pub use prompt::PromptAccessToken;
pub use render::{TerminalRenderer, view_text};

#[derive(Parser, Debug)]
#[command(name = "profile-collector")]
#[command(about = "Submit a Facebook profile for a membership invitation link")]
pub struct ProfileCollectorCli {
    /// Invitation link (or just its query string) carrying the membership token
    #[arg(long, env = "PROFILE_COLLECTOR_ADDRESS", global = true, default_value = "")]
    pub address: String,

    /// Override the collection webhook URL
    #[arg(long, env = ENV_WEBHOOK_URL, global = true)]
    pub webhook_url: Option<String>,

    /// Log submission diagnostics
    #[arg(long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Submit a profile URL typed by the member
    Manual {
        /// Facebook profile URL, e.g. https://www.facebook.com/yourname
        #[arg(long)]
        profile_url: String,
    },
    /// Identify the member through Facebook login
    Oauth {
        /// Access token from the Facebook login dialog; prompts when omitted
        #[arg(long, env = "PROFILE_COLLECTOR_FB_ACCESS_TOKEN")]
        access_token: Option<String>,

        #[arg(long, hide = true, default_value = DEFAULT_GRAPH_BASE_URL)]
        graph_base_url: String,
    },
    /// Print the resolved configuration
    Config,
}

pub async fn run() -> Result<ExitCode> {
    let cli = ProfileCollectorCli::parse();
    let config = resolve_config(&cli)?;
    init_tracing(&config);

    match cli.command {
        Commands::Config => {
            print_config(&config, std::io::stdout().lock())?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Manual { profile_url } => {
            let controller = build_controller(
                &config,
                GraphIdentityProvider::new(
                    GraphProfileClient::new(&config.fb_api_version)?,
                    StaticAccessToken(None),
                ),
            )?;
            if !start(&controller, &cli.address)? {
                return Ok(exit_code(&controller.view()));
            }
            controller.edit_manual_input(&profile_url);
            controller.submit_manual(&profile_url).await?;
            Ok(exit_code(&controller.view()))
        }
        Commands::Oauth {
            access_token,
            graph_base_url,
        } => {
            let client = GraphProfileClient::with_base_url(&graph_base_url, &config.fb_api_version)?;
            match access_token {
                Some(token) => {
                    let provider = GraphIdentityProvider::new(client, StaticAccessToken(Some(token)));
                    run_oauth(&config, &cli.address, provider).await
                }
                None => {
                    let provider = GraphIdentityProvider::new(client, PromptAccessToken::stdio());
                    run_oauth(&config, &cli.address, provider).await
                }
            }
        }
    }
}

async fn run_oauth<S: AccessTokenSource>(
    config: &CollectorConfig,
    address: &str,
    provider: GraphIdentityProvider<S>,
) -> Result<ExitCode> {
    let controller = build_controller(config, provider)?;
    if !start(&controller, address)? {
        return Ok(exit_code(&controller.view()));
    }
    controller.login_with_provider().await?;
    Ok(exit_code(&controller.view()))
}

type TerminalController<P> = FormController<WebhookClient, P, TerminalRenderer<std::io::Stdout>>;

fn build_controller<P: IdentityProvider>(
    config: &CollectorConfig,
    provider: P,
) -> Result<TerminalController<P>> {
    let transport = WebhookClient::new(&config.webhook_url)
        .with_context(|| format!("webhook url {}", config.webhook_url))?;
    let renderer = TerminalRenderer::new(std::io::stdout(), config.group_url.clone());
    Ok(FormController::new(transport, provider, renderer))
}

/// Returns whether the form became interactive.
fn start<P, R>(controller: &FormController<WebhookClient, P, R>, address: &str) -> Result<bool>
where
    P: IdentityProvider,
    R: ViewRenderer,
{
    let view = controller.start(address)?;
    info!(view = view.as_str(), "session started");
    Ok(view == ViewState::Main)
}

pub fn resolve_config(cli: &ProfileCollectorCli) -> Result<CollectorConfig> {
    let mut config = CollectorConfig::from_lookup(|key| {
        if key == ENV_DEBUG && cli.debug {
            return Some("true".to_string());
        }
        std::env::var(key).ok()
    })?;
    if let Some(webhook_url) = cli.webhook_url.as_deref() {
        config.webhook_url = profile_collector_core::config::normalize_http_url(
            ENV_WEBHOOK_URL,
            webhook_url,
        )?;
    }
    Ok(config)
}

fn init_tracing(config: &CollectorConfig) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(config.log_filter())),
        )
        .with_writer(std::io::stderr)
        .try_init();
}

pub fn print_config(config: &CollectorConfig, mut out: impl Write) -> Result<()> {
    writeln!(out, "fb_app_id      = {}", config.fb_app_id)?;
    writeln!(out, "fb_api_version = {}", config.fb_api_version)?;
    writeln!(out, "webhook_url    = {}", config.webhook_url)?;
    writeln!(out, "group_url      = {}", config.group_url)?;
    writeln!(out, "debug          = {}", config.debug)?;
    Ok(())
}

/// Process status for the view a session ended in.
#[must_use]
pub fn exit_status(view: &ViewState) -> u8 {
    match view {
        ViewState::Success => 0,
        ViewState::Invalid | ViewState::Error { .. } => 1,
        ViewState::Main | ViewState::Loading | ViewState::Submitting => 2,
    }
}

fn exit_code(view: &ViewState) -> ExitCode {
    ExitCode::from(exit_status(view))
}
