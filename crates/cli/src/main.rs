//! auths-resolve command-line tool.
//!
//! Resolves identity bundles from forge-hosted repositories and exposes the
//! detector and `did:key` codec for scripting.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use auths_resolve_core::config::ResolverConfig;
use auths_resolve_core::detect::detect_forge;
use auths_resolve_core::did::{did_key_to_public_key_hex, sanitize_did_for_ref};
use auths_resolve_core::models::ForgeType;
use auths_resolve_core::Resolver;

// ---------------------------------------------------------------------------
// CLI argument definitions
// ---------------------------------------------------------------------------

/// Resolve auths identity bundles from Git forge repositories.
#[derive(Parser, Debug)]
#[command(
    name = "auths-resolve",
    version,
    about = "Resolve auths identity bundles from GitHub, Gitea and GitLab repositories"
)]
struct Cli {
    /// Path to an optional TOML configuration file.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Override the log level (trace, debug, info, warn, error).
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Resolve the identity bundle for a repository and print it as JSON.
    Resolve {
        /// Repository URL, e.g. https://github.com/owner/repo.
        repo_url: String,

        /// Force the forge type instead of inferring it from the hostname.
        #[arg(long)]
        forge: Option<ForgeType>,

        /// Only accept this controller DID.
        #[arg(long)]
        identity: Option<String>,
    },

    /// Print the forge configuration detected for a repository URL.
    Detect {
        /// Repository URL.
        repo_url: String,

        /// Force the forge type.
        #[arg(long)]
        forge: Option<ForgeType>,
    },

    /// Print the Ed25519 public key (hex) embedded in a did:key identifier.
    DidKey {
        /// A did:key:z... identifier.
        did: String,
    },

    /// Print a DID in the form used inside Git ref paths.
    Sanitize {
        /// Any DID.
        did: String,
    },
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match load_config(cli.config.as_ref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            return ExitCode::FAILURE;
        }
    };

    let level = cli.log_level.as_deref().unwrap_or(&config.log.level);
    let filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .without_time()
        .init();

    debug!(
        config = ?cli.config,
        ttl_secs = config.cache.ttl_secs,
        level,
        "configuration loaded"
    );

    match run(cli.command, &config).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(command: Commands, config: &ResolverConfig) -> Result<ExitCode> {
    match command {
        Commands::Resolve {
            repo_url,
            forge,
            identity,
        } => cmd_resolve(config, &repo_url, forge, identity.as_deref()).await,
        Commands::Detect { repo_url, forge } => cmd_detect(&repo_url, forge),
        Commands::DidKey { did } => cmd_did_key(&did),
        Commands::Sanitize { did } => {
            println!("{}", sanitize_did_for_ref(&did));
            Ok(ExitCode::SUCCESS)
        }
    }
}

// ---------------------------------------------------------------------------
// Config helpers
// ---------------------------------------------------------------------------

fn load_config(path: Option<&PathBuf>) -> Result<ResolverConfig> {
    let Some(path) = path else {
        return Ok(ResolverConfig::default());
    };
    ResolverConfig::load_and_resolve(path)
        .with_context(|| format!("failed to load configuration from {}", path.display()))
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

async fn cmd_resolve(
    config: &ResolverConfig,
    repo_url: &str,
    forge: Option<ForgeType>,
    identity: Option<&str>,
) -> Result<ExitCode> {
    let resolver = Resolver::from_config(config).context("failed to initialize resolver")?;
    let hint = forge.map(|f| f.as_str());
    info!(repo_url, forge = ?hint, identity = ?identity, "resolving repository");
    let result = resolver.resolve_from_repo(repo_url, hint, identity).await;
    debug!(success = result.is_success(), "resolve finished");

    println!(
        "{}",
        serde_json::to_string_pretty(&result).context("failed to serialize result")?
    );
    Ok(if result.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn cmd_detect(repo_url: &str, forge: Option<ForgeType>) -> Result<ExitCode> {
    let config = detect_forge(repo_url, forge.map(|f| f.as_str()))
        .with_context(|| format!("could not parse repository URL: {}", repo_url))?;
    debug!(forge = %config.forge_type, base_url = %config.base_url, "detected forge");
    println!("{}", serde_json::to_string_pretty(&config)?);
    Ok(ExitCode::SUCCESS)
}

fn cmd_did_key(did: &str) -> Result<ExitCode> {
    let hex = did_key_to_public_key_hex(did).context("failed to decode did:key")?;
    println!("{}", hex);
    Ok(ExitCode::SUCCESS)
}
