mod cli;
mod config;
mod storage;

use std::{io::Read, path::PathBuf, sync::Arc, time::Duration};

use clap::Parser;
use color_eyre::Result;
use configvault::{context::context_uri, vault::ConfigVault};
use configvault_cipher::AesCcmCipher;
use configvault_fs::FileStorageClient;
use serde_json::{Map, Value};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::cli::{Command, ConfigCommand};

/// Entry point wiring the CLI to a file-backed vault.
#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    init_tracing();

    let cli::Cli {
        module,
        data_dir,
        command,
    } = cli::Cli::parse();
    let config = config::load()?;
    match command {
        Command::Version => print_version(),
        Command::Config(ConfigCommand::Init) => init_config(&config)?,
        Command::Get { password, max_age } => {
            let vault = build_vault(module, data_dir, &config)?;
            run_get(&vault, password.as_deref(), max_age).await?;
        }
        Command::Set { password, json } => {
            let vault = build_vault(module, data_dir, &config)?;
            run_set(&vault, password.as_deref(), json).await?;
        }
        Command::Wait { password, timeout } => {
            let vault = build_vault(module, data_dir, &config)?;
            run_wait(&vault, password.as_deref(), timeout).await?;
        }
    }

    Ok(())
}

fn init_tracing() {
    // Respect user-provided filters, default to info to avoid noisy stdout.
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let fmt_layer = tracing_subscriber::fmt::layer().with_target(false);
    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();
}

fn print_version() {
    println!("configvault-cli {}", env!("CARGO_PKG_VERSION"));
}

fn init_config(config: &config::Config) -> Result<()> {
    let path = config::write_default_if_missing(config)?;
    println!("Config initialized at {}", path.display());
    Ok(())
}

fn resolve_module(cli_module: Option<String>, config: &config::Config) -> Result<String> {
    cli_module.or_else(|| config.module.clone()).ok_or_else(|| {
        color_eyre::eyre::eyre!("no module specified; pass --module or set `module` in config.toml")
    })
}

fn build_vault(
    cli_module: Option<String>,
    cli_data_dir: Option<PathBuf>,
    config: &config::Config,
) -> Result<ConfigVault<FileStorageClient>> {
    let module = resolve_module(cli_module, config)?;
    let client = Arc::new(storage::client_from(cli_data_dir.as_deref(), config)?);
    // The CLI accepts any JSON object; stricter schemas belong to the
    // modules that own the dialect.
    client.declare_schema(context_uri(&module), |_| Ok(()));
    let vault = ConfigVault::with_cipher(&module, client, Arc::new(AesCcmCipher::new()))?;
    Ok(vault)
}

async fn run_get(
    vault: &ConfigVault<FileStorageClient>,
    password: Option<&str>,
    max_age: Option<u64>,
) -> Result<()> {
    let config = vault
        .get_config(password, max_age.map(Duration::from_secs))
        .await?;
    print_config(&config)
}

async fn run_set(
    vault: &ConfigVault<FileStorageClient>,
    password: Option<&str>,
    json: Option<String>,
) -> Result<()> {
    let text = match json {
        Some(text) => text,
        None => read_stdin()?,
    };
    let config: Value = serde_json::from_str(&text)
        .map_err(|e| color_eyre::eyre::eyre!("config is not valid JSON: {e}"))?;
    vault.set_config(password, &config).await?;
    println!("Stored {}", vault.record_key());
    Ok(())
}

async fn run_wait(
    vault: &ConfigVault<FileStorageClient>,
    password: Option<&str>,
    timeout_secs: Option<u64>,
) -> Result<()> {
    let config = match timeout_secs {
        Some(secs) => {
            tokio::time::timeout(Duration::from_secs(secs), vault.once_config(password))
                .await
                .map_err(|_| {
                    color_eyre::eyre::eyre!("timed out waiting for {}", vault.record_key())
                })??
        }
        None => vault.once_config(password).await?,
    };
    print_config(&config)
}

fn print_config(config: &Map<String, Value>) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(config)?);
    Ok(())
}

fn read_stdin() -> Result<String> {
    let mut buf = String::new();
    std::io::stdin().read_to_string(&mut buf)?;
    Ok(buf)
}
