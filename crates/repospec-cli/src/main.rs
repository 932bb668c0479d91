//! repospec - resolve repository specs to immutable refs
//!
//! Usage:
//!   repospec resolve gh jupyterhub/binderhub/main
//!   repospec check gh evil/repo/main --format json
//!   repospec parse gl group%2Frepo/main

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde_json::{Value, json};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use repospec_core::config::load_config;
use repospec_core::provider::{ProviderKind, ProviderRegistry, RepoProvider};

#[derive(Parser)]
#[command(name = "repospec")]
#[command(about = "Resolve repository specs to immutable refs", long_about = None)]
struct Cli {
    /// Path to repospec.toml (defaults to the user config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve a spec to an immutable ref
    Resolve {
        /// Provider prefix (gh, gist, git, gl, zenodo, fake)
        provider: ProviderKind,
        /// Provider-specific spec, e.g. user/repo/ref
        spec: String,
        /// Output format
        #[arg(short, long, default_value = "table")]
        format: OutputFormat,
    },

    /// Evaluate ban, quota and override policy for a spec
    Check {
        provider: ProviderKind,
        spec: String,
        /// Output format
        #[arg(short, long, default_value = "table")]
        format: OutputFormat,
    },

    /// Validate a spec without touching the network
    Parse {
        provider: ProviderKind,
        spec: String,
    },
}

#[derive(Clone, Copy, ValueEnum, Default)]
enum OutputFormat {
    /// Human-readable table
    #[default]
    Table,
    /// Machine-readable JSON
    Json,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "repospec=info,warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;
    let registry = ProviderRegistry::new(config).context("Failed to set up providers")?;

    match cli.command {
        Commands::Resolve {
            provider,
            spec,
            format,
        } => run_resolve(&registry, provider, &spec, format).await,
        Commands::Check {
            provider,
            spec,
            format,
        } => run_check(&registry, provider, &spec, format),
        Commands::Parse { provider, spec } => run_parse(&registry, provider, &spec),
    }
}

async fn run_resolve(
    registry: &ProviderRegistry,
    kind: ProviderKind,
    spec: &str,
    format: OutputFormat,
) -> Result<()> {
    let provider = registry.build(kind, spec)?;
    if registry.is_banned(spec) {
        anyhow::bail!("Spec '{}' is banned on this deployment", spec);
    }

    let resolved = provider
        .resolve_ref()
        .await
        .with_context(|| format!("Failed to resolve {} spec '{}'", kind.prefix(), spec))?;
    let slug = provider.build_slug().ok();
    let repo_config = Value::Object(registry.repo_config(spec));

    match format {
        OutputFormat::Table => {
            print_summary(provider.as_ref());
            println!(
                "{:<16} {}",
                "Resolved ref:",
                resolved.as_deref().unwrap_or("not found")
            );
            println!("{:<16} {}", "Build slug:", slug.as_deref().unwrap_or("-"));
            println!("{:<16} {}", "Repo config:", repo_config);
        }
        OutputFormat::Json => {
            let output = json!({
                "provider": provider.name(),
                "spec": provider.spec(),
                "unresolved_ref": provider.unresolved_ref(),
                "resolved_ref": resolved,
                "repo_url": provider.repo_url(),
                "build_slug": slug,
                "repo_config": repo_config,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }

    if resolved.is_none() {
        std::process::exit(1);
    }
    Ok(())
}

fn run_check(
    registry: &ProviderRegistry,
    kind: ProviderKind,
    spec: &str,
    format: OutputFormat,
) -> Result<()> {
    // Validate the spec even though policy only looks at the string.
    registry.build(kind, spec)?;

    let banned = registry.is_banned(spec);
    let higher_quota = registry.has_higher_quota(spec);
    let repo_config = Value::Object(registry.repo_config(spec));

    match format {
        OutputFormat::Table => {
            println!("{:<16} {}", "Spec:", spec);
            println!("{:<16} {}", "Banned:", if banned { "yes" } else { "no" });
            println!(
                "{:<16} {}",
                "Higher quota:",
                if higher_quota { "yes" } else { "no" }
            );
            println!("{:<16} {}", "Repo config:", repo_config);
        }
        OutputFormat::Json => {
            let output = json!({
                "provider": kind.display_name(),
                "spec": spec,
                "banned": banned,
                "higher_quota": higher_quota,
                "repo_config": repo_config,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }
    Ok(())
}

fn run_parse(registry: &ProviderRegistry, kind: ProviderKind, spec: &str) -> Result<()> {
    let provider = registry.build(kind, spec)?;
    print_summary(provider.as_ref());
    match provider.build_slug() {
        Ok(slug) => println!("{:<16} {}", "Build slug:", slug),
        Err(_) => println!("{:<16} (available after resolution)", "Build slug:"),
    }
    Ok(())
}

fn print_summary(provider: &dyn RepoProvider) {
    println!("{:<16} {}", "Provider:", provider.name());
    println!("{:<16} {}", "Spec:", provider.spec());
    let unresolved = provider.unresolved_ref();
    println!(
        "{:<16} {}",
        "Unresolved ref:",
        if unresolved.is_empty() { "-" } else { unresolved }
    );
    println!("{:<16} {}", "Repo URL:", provider.repo_url());
}
