mod cli;
mod codec;
mod commands;
mod config;
mod resource;
mod ui;

use anyhow::{Context as _, Result};
use clap::{CommandFactory, Parser};
use clap_complete::generate;
use cli::{Cli, Command, ProviderArgs};
use config::{Overrides, ProviderConfig};
use connectkit::{ConnectConfig, TrustPolicy};
use declarative::OperationContext;
use resource::Provider;
use std::io;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Global context for the application
pub struct Context {
    pub verbose: u8,
    pub quiet: bool,
}

const USER_AGENT: &str = concat!("connect-reconciler/", env!("CARGO_PKG_VERSION"));

/// Resolve provider configuration and open the shared channel
fn connect(args: &ProviderArgs) -> Result<Provider> {
    let overrides = Overrides {
        api_token: args.api_token.clone(),
        connect_url: args.connect_url.clone(),
        insecure_skip_verify: args.insecure_skip_verify.then_some(true),
    };
    let config = ProviderConfig::load(&overrides, args.config_file.as_deref())?;
    log::debug!("Provider configuration: {config:?}");

    let trust_policy = TrustPolicy::from_insecure_flag(config.insecure_skip_verify);
    if trust_policy.is_insecure() {
        log::warn!("TLS certificate verification is disabled");
    }

    let connect = ConnectConfig::new(config.connect_url.clone(), trust_policy).with_user_agent(USER_AGENT);
    let client = connectkit::Client::connect(&connect, config.token_source())
        .with_context(|| format!("Could not connect to {}", config.connect_url))?;
    Ok(Provider::new(&client))
}

/// Operation context cancelled by Ctrl-C and bounded by `--timeout`
fn operation_context(timeout: Option<u64>) -> OperationContext {
    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            log::warn!("Interrupted, cancelling in-flight operation");
            on_signal.cancel();
        }
    });

    let op = OperationContext::with_cancellation(cancel);
    match timeout {
        Some(secs) => op.with_timeout(Duration::from_secs(secs)),
        None => op,
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    let log_level = match cli.verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    env_logger::Builder::new()
        .filter_level(if cli.quiet {
            log::LevelFilter::Error
        } else {
            log_level
        })
        .format_timestamp(None)
        .init();

    let ctx = Context {
        verbose: cli.verbose,
        quiet: cli.quiet,
    };

    // Commands that never reach the server
    let command = match cli.command {
        Command::Completions { shell } => {
            let mut cmd = Cli::command();
            generate(shell, &mut cmd, "connect-reconciler", &mut io::stdout());
            return Ok(());
        }
        Command::Validate(args) => return commands::entity::validate(&ctx, args),
        command => command,
    };

    let provider = connect(&cli.provider)?;
    let op = operation_context(cli.provider.timeout);
    log::trace!("Running with verbosity {}", ctx.verbose);

    match command {
        Command::Create(args) => commands::entity::create(&ctx, &provider, &op, args).await,
        Command::Read(args) => commands::entity::read(&ctx, &provider, &op, args).await,
        Command::Update(args) => commands::entity::update(&ctx, &provider, &op, args).await,
        Command::Delete(args) => commands::entity::delete(&ctx, &provider, &op, args).await,
        Command::Import { kind, key } => {
            commands::entity::import(&ctx, &provider, &op, kind, &key).await
        }
        Command::Lookup(args) => commands::entity::lookup(&ctx, &provider, &op, args).await,
        Command::Organization { name } => {
            commands::organization::run(&ctx, &provider, &op, &name).await
        }
        Command::Completions { .. } | Command::Validate(_) => Ok(()),
    }
}
