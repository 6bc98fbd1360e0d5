//! focuslab - record FocusLab trigger events from the command line
//!
//! This tool provides commands for:
//! - Recording a single trigger event, optionally retrying transient failures
//! - Showing the resolved client configuration
//!
//! Uses XDG Base Directory specification for file locations:
//! - Config: $XDG_CONFIG_HOME/focuslab/config.toml (~/.config/focuslab/config.toml)
//! - Logs: $XDG_STATE_HOME/focuslab/focuslab.log (~/.local/state/focuslab/focuslab.log)

mod fields;

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use focuslab_core::{
    BlockingTriggerClient, ClientSettings, Config, RetryPolicy, RetryScheduler, TriggerClient,
    TriggerEvent,
};

use crate::fields::{parse_field, FieldArg};

#[derive(Parser)]
#[command(name = "focuslab")]
#[command(about = "Record FocusLab trigger events")]
#[command(version)]
struct Args {
    /// Write debug logs to the state directory
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Record one trigger event
    Record {
        /// Actor the event is about
        #[arg(long = "actor")]
        actor_id: String,

        /// What happened (e.g. "viewed")
        #[arg(long)]
        action: String,

        /// What was acted upon (e.g. "blog post")
        #[arg(long)]
        object: String,

        /// Captured identity as key=value (repeat a key to send a list)
        #[arg(long = "identity", value_parser = parse_field)]
        identities: Vec<FieldArg>,

        /// Captured attribute as key=value (value may be JSON)
        #[arg(long = "attribute", value_parser = parse_field)]
        attributes: Vec<FieldArg>,

        /// Event variable as key=value (value may be JSON)
        #[arg(long = "variable", value_parser = parse_field)]
        variables: Vec<FieldArg>,

        #[command(flatten)]
        overrides: ClientOverrides,

        /// Retry transient failures using the configured retry policy
        #[arg(long)]
        retry: bool,
    },

    /// Show the resolved configuration
    Config {
        #[command(flatten)]
        overrides: ClientOverrides,
    },
}

#[derive(clap::Args)]
struct ClientOverrides {
    /// API key (overrides FL_API_KEY and the config file)
    #[arg(long)]
    api_key: Option<String>,

    /// API endpoint (overrides FL_ENDPOINT and the config file)
    #[arg(long)]
    endpoint: Option<String>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let config = Config::load().context("failed to load configuration")?;

    let _log_guard = if args.verbose {
        Some(
            focuslab_core::logging::init(&config.logging)
                .context("failed to initialize logging")?,
        )
    } else {
        None
    };

    match args.command {
        Command::Record {
            actor_id,
            action,
            object,
            identities,
            attributes,
            variables,
            overrides,
            retry,
        } => {
            let event = TriggerEvent::new(actor_id, action, object)
                .with_identities(fields::identities(identities))
                .with_attributes(fields::values(attributes))
                .with_variables(fields::values(variables));
            cmd_record(&config, &overrides, &event, retry)
        }
        Command::Config { overrides } => cmd_config(&config, &overrides),
    }
}

fn resolve_settings(config: &Config, overrides: &ClientOverrides) -> Result<ClientSettings> {
    let settings = config
        .api
        .clone()
        .with_env_overrides()
        .resolve(overrides.api_key.clone(), overrides.endpoint.clone())?;
    Ok(settings)
}

fn cmd_record(
    config: &Config,
    overrides: &ClientOverrides,
    event: &TriggerEvent,
    retry: bool,
) -> Result<()> {
    let settings = resolve_settings(config, overrides)?;

    tracing::info!(
        endpoint = %settings.endpoint,
        actor_id = %event.actor_id,
        action = %event.action,
        object = %event.object,
        retry,
        "Recording trigger"
    );

    if retry {
        let client = TriggerClient::from_settings(&settings)?;
        let scheduler = RetryScheduler::new(Arc::new(client), RetryPolicy::from(&config.retry));
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .context("failed to create runtime")?;
        runtime
            .block_on(scheduler.run(event))
            .context("failed to record trigger")?;
    } else {
        let client = BlockingTriggerClient::from_settings(&settings)?;
        client.record(event).context("failed to record trigger")?;
    }

    println!(
        "Recorded trigger: {} {} {}",
        event.actor_id, event.action, event.object
    );
    Ok(())
}

fn cmd_config(config: &Config, overrides: &ClientOverrides) -> Result<()> {
    println!("FocusLab Client Configuration");
    println!("=============================");
    println!();

    let api = config.api.clone().with_env_overrides();
    let api_key_set =
        overrides.api_key.as_deref().is_some_and(|k| !k.is_empty()) || api.is_ready();
    let endpoint = api.resolve_endpoint(overrides.endpoint.clone());
    let policy = RetryPolicy::from(&config.retry);

    println!("Config File:     {}", Config::config_path().display());
    println!("Endpoint:        {}", endpoint);
    println!(
        "API Key:         {}",
        if api_key_set { "<set>" } else { "<not set>" }
    );
    println!("Timeout:         {}s", api.timeout_secs);
    println!("Max Retries:     {}", policy.max_retries);
    println!("Initial Delay:   {:?}", policy.initial_delay);
    println!("Max Delay:       {:?}", policy.max_delay);
    println!("Log File:        {}", Config::log_path().display());

    println!();
    if api_key_set {
        println!("Status: Ready to record");
    } else {
        println!("Status: Not ready (set api_key in config.toml or FL_API_KEY)");
    }

    Ok(())
}
