//! walletpass - issue Google Wallet offer passes from the command line.
//!
//! Authenticates with a service-account key, then creates an offer class
//! and object, expires the object, prints "Add to Google Wallet" links and
//! batch-creates further objects. Each step is also available on its own.

mod demo;

use std::io;
use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use walletpass_core::config::{Config, Overrides};
use walletpass_core::ids::{is_valid_suffix, object_suffix_for, random_suffix};

use demo::Demo;

/// Objects created by the batch step when no count is given
const DEFAULT_BATCH_SIZE: usize = 3;

#[derive(Parser, Debug)]
#[command(name = "walletpass", version, about = "Google Wallet offer pass demo")]
struct Cli {
    /// Issuer id (overrides WALLET_ISSUER_ID and the config file)
    #[arg(long, global = true, value_name = "ID")]
    issuer_id: Option<String>,

    /// Service account key file (overrides GOOGLE_APPLICATION_CREDENTIALS)
    #[arg(long, global = true, value_name = "PATH")]
    credentials: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    #[command(flatten)]
    Demo(DemoCommand),
    /// Show or update the saved configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Commands that talk to the Wallet API or sign tokens.
#[derive(Subcommand, Debug)]
enum DemoCommand {
    /// Run every step in order (the default)
    Run,
    /// Create an offer class
    CreateClass {
        #[arg(long)]
        class_suffix: Option<String>,
    },
    /// Create an offer object in an existing class
    CreateObject {
        #[arg(long)]
        class_suffix: String,
        #[arg(long)]
        object_suffix: Option<String>,
    },
    /// Mark an object as expired
    ExpireObject {
        #[arg(long)]
        object_suffix: String,
    },
    /// Print a save link that creates a new class and object
    JwtNew {
        #[arg(long)]
        class_suffix: String,
        #[arg(long)]
        object_suffix: Option<String>,
    },
    /// Print a save link referencing existing objects of every vertical
    JwtExisting,
    /// Batch-create objects in an existing class
    Batch {
        #[arg(long)]
        class_suffix: String,
        #[arg(long, default_value_t = DEFAULT_BATCH_SIZE)]
        count: usize,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Print the config file path and contents
    Show,
    /// Save --issuer-id/--credentials and the options below
    Set {
        /// Origin allowed to show save buttons (repeatable)
        #[arg(long = "origin", value_name = "HOST")]
        origins: Vec<String>,
        #[arg(long, value_name = "URL")]
        api_base_url: Option<String>,
    },
}

/// Initialize the tracing subscriber for logging
fn init_tracing() {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

fn check_suffix(label: &str, suffix: &str) -> Result<()> {
    if !is_valid_suffix(suffix) {
        anyhow::bail!(
            "Invalid {} {:?}: use only letters, digits, '.', '_' and '-'",
            label,
            suffix
        );
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    init_tracing();

    let cli = Cli::parse();
    let overrides = Overrides {
        issuer_id: cli.issuer_id.clone(),
        credentials_path: cli.credentials.clone(),
    };

    match cli.command.unwrap_or(Command::Demo(DemoCommand::Run)) {
        // A corrupt file must not stop `config set` from replacing it
        Command::Config { action } => run_config(Config::load_or_default()?, overrides, action),
        Command::Demo(command) => run_demo(Config::load()?, &overrides, command).await,
    }
}

async fn run_demo(config: Config, overrides: &Overrides, command: DemoCommand) -> Result<()> {
    let settings = config.resolve(overrides)?;
    let mut demo = Demo::new(settings)?;

    match command {
        DemoCommand::Run => {
            let class_suffix = random_suffix();
            let object_suffix = object_suffix_for(&class_suffix);
            info!(
                class_suffix = %class_suffix,
                object_suffix = %object_suffix,
                "Running full demo"
            );

            demo.auth().await?;
            demo.create_class(&class_suffix).await?;
            demo.create_object(&class_suffix, &object_suffix).await?;
            demo.expire_object(&object_suffix).await?;
            demo.jwt_new_objects(&class_suffix, &object_suffix)?;
            demo.jwt_existing_objects()?;
            demo.batch_create_objects(&class_suffix, DEFAULT_BATCH_SIZE).await?;
        }
        DemoCommand::CreateClass { class_suffix } => {
            let class_suffix = class_suffix.unwrap_or_else(random_suffix);
            check_suffix("class suffix", &class_suffix)?;
            demo.create_class(&class_suffix).await?;
        }
        DemoCommand::CreateObject {
            class_suffix,
            object_suffix,
        } => {
            check_suffix("class suffix", &class_suffix)?;
            let object_suffix = object_suffix.unwrap_or_else(|| object_suffix_for(&class_suffix));
            check_suffix("object suffix", &object_suffix)?;
            demo.create_object(&class_suffix, &object_suffix).await?;
        }
        DemoCommand::ExpireObject { object_suffix } => {
            check_suffix("object suffix", &object_suffix)?;
            demo.expire_object(&object_suffix).await?;
        }
        DemoCommand::JwtNew {
            class_suffix,
            object_suffix,
        } => {
            check_suffix("class suffix", &class_suffix)?;
            let object_suffix = object_suffix.unwrap_or_else(|| object_suffix_for(&class_suffix));
            check_suffix("object suffix", &object_suffix)?;
            demo.jwt_new_objects(&class_suffix, &object_suffix)?;
        }
        DemoCommand::JwtExisting => {
            demo.jwt_existing_objects()?;
        }
        DemoCommand::Batch {
            class_suffix,
            count,
        } => {
            check_suffix("class suffix", &class_suffix)?;
            if count == 0 {
                anyhow::bail!("Batch count must be at least 1");
            }
            demo.batch_create_objects(&class_suffix, count).await?;
        }
    }

    Ok(())
}

fn run_config(mut config: Config, overrides: Overrides, action: ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Show => {
            println!("{}", Config::config_path()?.display());
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
        ConfigAction::Set {
            origins,
            api_base_url,
        } => {
            if let Some(issuer_id) = overrides.issuer_id {
                config.issuer_id = Some(issuer_id);
            }
            if let Some(path) = overrides.credentials_path {
                config.credentials_path = Some(path);
            }
            if !origins.is_empty() {
                config.origins = origins;
            }
            if api_base_url.is_some() {
                config.api_base_url = api_base_url;
            }
            let path = config.save()?;
            println!("Saved {}", path.display());
        }
    }
    Ok(())
}
