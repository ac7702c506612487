//! CDNvideo HTTP Resource CLI
//!
//! Reconciles one CDN HTTP resource against the CDNvideo management API.
//!
//! # Usage
//! ```bash
//! # Check a desired configuration offline and print the request payload
//! cdnvideo-http validate --config site.json
//!
//! # Create or update the resource tracked in the state file
//! cdnvideo-http apply --config site.json
//!
//! # Show drift between the desired configuration and the server
//! cdnvideo-http plan --config site.json
//!
//! # Deactivate the resource and forget it
//! cdnvideo-http destroy
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use tracing::{info, warn};

use cdnvideo_http::codec;
use cdnvideo_http::config::{self, ProviderConfig};
use cdnvideo_http::logging;
use cdnvideo_http::state_store::{StateStore, StoredState};
use cdnvideo_http::{
    Converter, DesiredTree, HttpResourceController, ManagedResource, ObservedTree, Phase,
};

// ============================================================
// CLI Definition
// ============================================================

#[derive(Parser)]
#[command(name = "cdnvideo-http")]
#[command(about = "CDNvideo HTTP resource reconciler", long_about = None)]
#[command(version)]
struct Cli {
    /// CDNvideo account name
    #[arg(long, env = config::ACCOUNT_NAME_ENV)]
    account_name: Option<String>,

    /// API username
    #[arg(long, env = config::USERNAME_ENV)]
    username: Option<String>,

    /// API password
    #[arg(long, env = config::PASSWORD_ENV, hide_env_values = true)]
    password: Option<String>,

    /// Management API base URL
    #[arg(long, default_value = config::DEFAULT_API_URL)]
    api_url: String,

    /// Token exchange URL
    #[arg(long, default_value = config::DEFAULT_AUTH_URL)]
    auth_url: String,

    /// Request timeout in seconds
    #[arg(long, default_value = "10")]
    timeout: u64,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Emit logs as JSON
    #[arg(long)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a desired configuration offline and print the wire payload
    Validate {
        /// Desired configuration (JSON)
        #[arg(long)]
        config: PathBuf,
    },

    /// Create the resource, or update the one in the state file
    Apply {
        #[arg(long)]
        config: PathBuf,

        /// State file
        #[arg(long, default_value = "cdnvideo-state.json")]
        state: PathBuf,
    },

    /// Report drift between the desired configuration and the server
    Plan {
        #[arg(long)]
        config: PathBuf,

        #[arg(long, default_value = "cdnvideo-state.json")]
        state: PathBuf,
    },

    /// Re-read the tracked resource into the state file
    Refresh {
        #[arg(long, default_value = "cdnvideo-state.json")]
        state: PathBuf,
    },

    /// Print one resource by identifier
    Read {
        #[arg(long)]
        id: String,
    },

    /// List all resources of the account
    List,

    /// Deactivate the tracked resource and remove the state file
    Destroy {
        #[arg(long, default_value = "cdnvideo-state.json")]
        state: PathBuf,
    },
}

impl Cli {
    fn provider_config(&self) -> ProviderConfig {
        let mut config = ProviderConfig::new(
            self.account_name.clone().unwrap_or_default(),
            self.username.clone().unwrap_or_default(),
            self.password.clone().unwrap_or_default(),
        );
        config.api_url = self.api_url.clone();
        config.auth_url = self.auth_url.clone();
        config.timeout = Duration::from_secs(self.timeout);
        config
    }
}

// ============================================================
// Main Entry Point
// ============================================================

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose, cli.json_logs)?;

    let provider = cli.provider_config();

    match cli.command {
        Commands::Validate { config } => validate(&config)?,

        Commands::Apply { config, state } => {
            let desired = load_desired(&config)?;
            let controller = connect(provider).await?;
            let store = StateStore::new(state);

            let mut resource = match store.load()? {
                Some(stored) => stored.into_resource(),
                None => ManagedResource::new(),
            };

            if resource.id().is_some() {
                resource.update(&controller, &desired).await?;
                info!("Updated resource {}", resource.id().unwrap_or_default());
            } else if let Err(e) = resource.create(&controller, &desired).await {
                if e.created_id().is_some() {
                    save(&store, &resource)?;
                    return Err(e).context("Resource was created but not read back; run refresh");
                }
                return Err(e.into());
            } else {
                info!("Created resource {}", resource.id().unwrap_or_default());
            }

            save(&store, &resource)?;
            print_tree(resource.observed())?;
        }

        Commands::Plan { config, state } => {
            let desired = load_desired(&config)?;
            let stored = require_state(&StateStore::new(state))?;
            let controller = connect(provider).await?;

            let drifts = controller.plan(&stored.id, &desired).await?;
            if drifts.is_empty() {
                println!("No changes. Resource {} matches the configuration.", stored.id);
            } else {
                println!("Resource {} has {} drifted field(s):", stored.id, drifts.len());
                for drift in &drifts {
                    println!("  ~ {}", drift);
                }
            }
        }

        Commands::Refresh { state } => {
            let store = StateStore::new(state);
            let mut resource = require_state(&store)?.into_resource();
            let controller = connect(provider).await?;

            match resource.refresh(&controller).await {
                Ok(()) => {
                    save(&store, &resource)?;
                    print_tree(resource.observed())?;
                }
                Err(e @ cdnvideo_http::CdnError::NotFound { .. }) => {
                    store.remove()?;
                    return Err(e).context("Tracked resource is gone; state file removed");
                }
                Err(e) => return Err(e.into()),
            }
        }

        Commands::Read { id } => {
            let controller = connect(provider).await?;
            let observed = controller.read(&id).await?;
            print_tree(Some(&observed))?;
        }

        Commands::List => {
            let controller = connect(provider).await?;
            let resources = controller.list().await?;

            println!(
                "\n{:<12} {:<8} {:<30} {:<40} {:<20}",
                "ID", "ACTIVE", "NAME", "CDN DOMAIN", "CREATED"
            );
            println!("{}", "-".repeat(113));
            for resource in &resources {
                let value = resource.as_value();
                println!(
                    "{:<12} {:<8} {:<30} {:<40} {:<20}",
                    resource.id().unwrap_or("-"),
                    value.get("active").map(|v| v.to_string()).unwrap_or_else(|| "-".to_string()),
                    truncate(resource.str_attr("name").unwrap_or("-"), 30),
                    resource.str_attr("cdn_domain").unwrap_or("-"),
                    created_at(value.get("creation_ts")),
                );
            }

            info!("Listed {} resources", resources.len());
        }

        Commands::Destroy { state } => {
            let store = StateStore::new(state);
            let mut resource = require_state(&store)?.into_resource();
            let id = resource.id().unwrap_or_default().to_string();
            let controller = connect(provider).await?;

            warn!("Deactivating resource {}", id);
            resource.deactivate(&controller).await?;
            store.remove()?;

            println!("Deactivated resource {}", id);
        }
    }

    Ok(())
}

async fn connect(provider: ProviderConfig) -> Result<HttpResourceController> {
    HttpResourceController::connect(provider)
        .await
        .context("Failed to connect to the CDNvideo API")
}

fn validate(path: &Path) -> Result<()> {
    let desired = load_desired(path)?;
    let conversion = Converter::new()
        .to_typed_model(&desired, Phase::Create)
        .with_context(|| format!("Invalid configuration in {:?}", path))?;

    for warning in &conversion.warnings {
        println!("warning: {}", warning);
    }
    let payload = codec::encode(&conversion.model)?;
    let pretty: serde_json::Value = serde_json::from_slice(&payload)?;
    println!("{}", serde_json::to_string_pretty(&pretty)?);
    Ok(())
}

fn load_desired(path: &Path) -> Result<DesiredTree> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read configuration: {:?}", path))?;
    raw.parse()
        .with_context(|| format!("Failed to parse configuration: {:?}", path))
}

fn require_state(store: &StateStore) -> Result<StoredState> {
    match store.load()? {
        Some(state) => Ok(state),
        None => bail!("No state file at {:?}; run apply first", store.path()),
    }
}

fn save(store: &StateStore, resource: &ManagedResource) -> Result<()> {
    let state = StoredState::from_resource(resource).context("Resource has no identifier to save")?;
    store.save(&state)
}

fn print_tree(observed: Option<&ObservedTree>) -> Result<()> {
    if let Some(observed) = observed {
        println!("{}", serde_json::to_string_pretty(observed.as_value())?);
    }
    Ok(())
}

fn created_at(ts: Option<&serde_json::Value>) -> String {
    ts.and_then(serde_json::Value::as_i64)
        .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0))
        .map(|at| at.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| "-".to_string())
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() > max {
        let head: String = s.chars().take(max - 3).collect();
        format!("{}...", head)
    } else {
        s.to_string()
    }
}
