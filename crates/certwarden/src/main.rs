use anyhow::Context;
use clap::{Parser, Subcommand};
use cw_acme::{
    AcmeConfig, Bootstrap, CertificateLifecycle, Certbot, DomainSet, ProcessRunner, ProxyReloader,
    RenewedLineage,
};
use cw_common::config::EnvConfig;
use signal_hook::consts::{SIGINT, SIGTERM};
use signal_hook_tokio::Signals;
use std::path::PathBuf;
use tokio_stream::StreamExt;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(
    name = "certwarden",
    version,
    about = "Keeps Let's Encrypt certificates issued and renewed for the reverse proxy"
)]
struct Cli {
    /// .env file loaded before reading the environment
    #[arg(long, global = true)]
    env_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
enum Command {
    /// Issue missing certificates, then run `certbot renew` on a fixed interval
    Run,
    /// One-shot setup: issue every domain set, then reload the proxy
    Init,
    /// Certbot deploy hook: log that the proxy needs a manual reload
    DeployHook,
    /// Print the effective configuration as JSON
    Config,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let env = EnvConfig::load(cli.env_file.as_deref()).context("Failed to load configuration")?;

    init_tracing(env.log_json);

    match cli.command {
        Command::Run => run(env).await,
        Command::Init => init(env).await,
        Command::DeployHook => {
            RenewedLineage::from_env().announce();
            Ok(())
        }
        Command::Config => {
            println!("{}", serde_json::to_string_pretty(&env)?);
            Ok(())
        }
    }
}

fn init_tracing(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        tracing_subscriber::EnvFilter::new("info,certwarden=debug,cw_acme=debug")
    });
    let subscriber = tracing_subscriber::fmt().with_env_filter(filter);

    if json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }
}

/// Map the environment onto the ACME configuration and validated domain sets
fn acme_settings(env: &EnvConfig) -> anyhow::Result<(AcmeConfig, Vec<DomainSet>)> {
    env.validate()?;

    let domain_sets = env
        .cert_domains
        .iter()
        .map(DomainSet::new)
        .collect::<Result<Vec<_>, _>>()
        .context("Invalid CERT_DOMAINS")?;

    let config = AcmeConfig {
        certbot_bin: env.certbot_bin.clone(),
        config_dir: env.letsencrypt_dir.clone(),
        webroot: env.acme_webroot.clone(),
        account_email: env.acme_email.clone().unwrap_or_default(),
        staging: env.acme_staging,
        deploy_hook: env.deploy_hook.clone(),
    };

    Ok((config, domain_sets))
}

async fn run(env: EnvConfig) -> anyhow::Result<()> {
    let (config, domain_sets) = acme_settings(&env)?;

    info!(
        staging = config.staging,
        webroot = %config.webroot.display(),
        config_dir = %config.config_dir.display(),
        "certwarden starting"
    );
    for domains in &domain_sets {
        info!(domains = %domains, "Managing certificate");
    }

    let lifecycle = CertificateLifecycle::new(Certbot::new(ProcessRunner, config), domain_sets)
        .with_startup_grace(env.startup_delay())
        .with_renew_interval(env.renew_interval());

    let cancel = CancellationToken::new();
    let signals = Signals::new([SIGTERM, SIGINT])?;
    let signals_handle = signals.handle();
    let signal_task = tokio::spawn(watch_signals(signals, cancel.clone()));

    lifecycle.run(cancel).await;

    signals_handle.close();
    if let Err(e) = signal_task.await {
        error!("Signal handler task failed: {}", e);
    }

    info!("certwarden stopped");
    Ok(())
}

async fn watch_signals(mut signals: Signals, cancel: CancellationToken) {
    if let Some(signal) = signals.next().await {
        info!(signal, "Received termination signal, shutting down");
        cancel.cancel();
    }
}

async fn init(env: EnvConfig) -> anyhow::Result<()> {
    let (config, domain_sets) = acme_settings(&env)?;
    let reloader = ProxyReloader::from_command_line(ProcessRunner, &env.proxy_reload_command)?;

    info!(
        certificates = domain_sets.len(),
        staging = config.staging,
        "Bootstrapping certificates"
    );

    let bootstrap = Bootstrap::new(Certbot::new(ProcessRunner, config), reloader, domain_sets);
    bootstrap.run().await?;

    Ok(())
}
