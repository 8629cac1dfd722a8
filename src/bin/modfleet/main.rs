//! modfleet CLI - dependent discovery and version resolution for Go modules

use std::error::Error as StdError;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use miette::Diagnostic;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;

use cli::{Cli, Commands};
use modfleet::core::ValidationError;
use modfleet::hosting::ProviderError;
use modfleet::util::cancel::is_cancellation;
use modfleet::{CancelToken, DiscoveryError, ResolveError};

fn main() {
    if let Err(e) = run() {
        eprintln!("error: {:#}", e);
        if let Some(help) = help_for(&e) {
            eprintln!("help: {}", help);
        }
        let code = if was_cancelled(&e) { 130 } else { 1 };
        std::process::exit(code);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("modfleet=debug")
    } else {
        EnvFilter::new("modfleet=info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();

    let cancel = match cli.timeout {
        Some(secs) => CancelToken::with_timeout(Duration::from_secs(secs)),
        None => CancelToken::new(),
    };
    let on_interrupt = cancel.clone();
    if let Err(e) = ctrlc::set_handler(move || on_interrupt.cancel()) {
        tracing::debug!("could not install Ctrl-C handler: {}", e);
    }

    match cli.command {
        Commands::Discover(args) => commands::discover::execute(args, cli.verbose, &cancel),
        Commands::Version(args) => commands::version::execute(args, cli.verbose, &cancel),
        Commands::Validate(args) => commands::manifest::validate(args),
        Commands::Expand(args) => commands::manifest::expand(args),
        Commands::Completions(args) => commands::completions::execute(args),
    }
}

/// Help text of the first diagnostic in the error chain.
fn help_for(err: &anyhow::Error) -> Option<String> {
    err.chain().find_map(|cause| {
        if let Some(e) = cause.downcast_ref::<ValidationError>() {
            return e.help().map(|help| help.to_string());
        }
        provider_error(cause)
            .and_then(|e| e.help())
            .map(|help| help.to_string())
    })
}

fn provider_error<'a>(cause: &'a (dyn StdError + 'static)) -> Option<&'a ProviderError> {
    if let Some(e) = cause.downcast_ref::<ProviderError>() {
        return Some(e);
    }
    if let Some(DiscoveryError::Provider(e)) = cause.downcast_ref::<DiscoveryError>() {
        return Some(e);
    }
    match cause.downcast_ref::<ResolveError>() {
        Some(ResolveError::Provider(e)) => Some(e),
        _ => None,
    }
}

fn was_cancelled(err: &anyhow::Error) -> bool {
    is_cancellation(err)
        || err.chain().any(|cause| {
            matches!(
                cause.downcast_ref::<DiscoveryError>(),
                Some(DiscoveryError::Cancelled(_))
            ) || cause
                .downcast_ref::<ResolveError>()
                .is_some_and(ResolveError::is_cancelled)
                || matches!(provider_error(cause), Some(ProviderError::Cancelled(_)))
        })
}
