use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::debug;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use convoy_core::app::{App, AppBuilder};
use convoy_core::config::RegistryConfig;
use convoy_core::domain::{
    ArtifactError, ArtifactType, DeliveryArtifact, DeliveryArtifactVersion, Provenance,
};
use convoy_core::impls::{LogTraceRepository, SqliteArtifactRepository};
use convoy_core::ports::{ArtifactRegistry, ArtifactVersionStore, Clock, SystemClock, UlidGenerator};
use convoy_core::processors::{ParrotIntent, ParrotIntentProcessor, ParrotSpec};
use convoy_core::typed::Intent;

#[derive(Debug, Parser)]
#[command(name = "convoy", version, about = "Delivery artifact registry")]
struct Cli {
    /// TOML config file; defaults apply when omitted
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// SQLite database file, overrides `database.path` from the config
    #[arg(long, global = true)]
    database: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Register a new artifact
    Register {
        name: String,
        #[arg(value_parser = parse_artifact_type)]
        artifact_type: ArtifactType,
    },
    /// Print whether an artifact is registered
    IsRegistered {
        name: String,
        #[arg(value_parser = parse_artifact_type)]
        artifact_type: ArtifactType,
    },
    /// Record a version of a registered artifact
    Store {
        name: String,
        #[arg(value_parser = parse_artifact_type)]
        artifact_type: ArtifactType,
        #[arg(value_name = "VERSION")]
        label: String,
        provenance: String,
    },
    /// List the known versions of an artifact, newest first
    Versions {
        name: String,
        #[arg(value_parser = parse_artifact_type)]
        artifact_type: ArtifactType,
        #[arg(long)]
        json: bool,
    },
    /// Converge a Parrot intent and print the resulting work orders
    Parrot {
        #[arg(long)]
        application: String,
        #[arg(long, default_value = "")]
        description: String,
    },
}

fn parse_artifact_type(raw: &str) -> Result<ArtifactType, String> {
    raw.to_ascii_uppercase()
        .replace('-', "_")
        .parse()
        .map_err(|e| format!("{e}"))
}

#[derive(Serialize)]
struct VersionRow<'a> {
    version: &'a str,
    provenance: &'a str,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("convoy=info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn load_config(cli: &Cli) -> Result<RegistryConfig> {
    let mut config = match &cli.config {
        Some(path) => RegistryConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => RegistryConfig::default(),
    };
    if let Some(database) = &cli.database {
        config.database.path = Some(database.clone());
    }
    config.validate().context("invalid configuration")?;
    Ok(config)
}

fn build_app(config: &RegistryConfig) -> Result<App> {
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let ids = Arc::new(UlidGenerator::new(SystemClock));
    let artifacts = SqliteArtifactRepository::open(config, ids)
        .context("opening artifact registry")?;

    let parrot = ParrotIntentProcessor::new(clock)
        .with_traces(Arc::new(LogTraceRepository))
        .with_trace_timeout(config.tracing.trace_timeout());

    let app = AppBuilder::new()
        .with_artifacts(Arc::new(artifacts))
        .register::<ParrotIntent, _>(parrot)?
        .expect_intents(&[ParrotIntent::KIND])
        .build()?;
    Ok(app)
}

async fn run(app: &App, command: Command) -> Result<()> {
    let artifacts = app.artifacts();
    match command {
        Command::Register {
            name,
            artifact_type,
        } => {
            let artifact = DeliveryArtifact::new(name, artifact_type)?;
            let uid = artifacts.register(&artifact).await?;
            println!("{uid}");
        }
        Command::IsRegistered {
            name,
            artifact_type,
        } => {
            println!("{}", artifacts.is_registered(&name, artifact_type).await?);
        }
        Command::Store {
            name,
            artifact_type,
            label,
            provenance,
        } => {
            let artifact = DeliveryArtifact::new(name, artifact_type)?;
            let provenance = Provenance::parse(provenance)?;
            let created = artifacts
                .store(&DeliveryArtifactVersion::new(artifact, label, provenance))
                .await?;
            println!("{}", if created { "stored" } else { "already present" });
        }
        Command::Versions {
            name,
            artifact_type,
            json,
        } => {
            let artifact = DeliveryArtifact::new(name, artifact_type)?;
            let versions = artifacts.versions(&artifact).await?;
            if json {
                let rows: Vec<_> = versions
                    .iter()
                    .map(|v| VersionRow {
                        version: &v.version,
                        provenance: v.provenance.as_str(),
                    })
                    .collect();
                println!("{}", serde_json::to_string_pretty(&rows)?);
            } else {
                for v in &versions {
                    println!("{}\t{}", v.version, v.provenance);
                }
            }
        }
        Command::Parrot {
            application,
            description,
        } => {
            let intent = ParrotIntent {
                spec: ParrotSpec {
                    application,
                    description,
                },
            };
            let requests = app
                .converge(ParrotIntent::KIND, serde_json::to_value(intent)?)
                .await?;
            println!("{}", serde_json::to_string_pretty(&requests)?);
        }
    }
    Ok(())
}

fn exit_status(err: &anyhow::Error) -> u8 {
    match err.downcast_ref::<ArtifactError>() {
        Some(ArtifactError::AlreadyRegistered(_)) => 2,
        Some(ArtifactError::NoSuchArtifact(_)) => 3,
        _ => 1,
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing();

    let result = async move {
        let config = load_config(&cli)?;
        debug!(?config, "effective configuration");
        let app = build_app(&config)?;
        run(&app, cli.command).await
    }
    .await;

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("convoy: {err:#}");
            ExitCode::from(exit_status(&err))
        }
    }
}
