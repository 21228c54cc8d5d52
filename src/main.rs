//! pathguard CLI
//!
//! Answers access queries against the permission descriptors under a
//! governed root.

use anyhow::Context;
use clap::{Parser, Subcommand};
use pathguard::{
    access_control::{AccessLevel, AclRequest, AclService},
    config::{AppConfig, LogFormat, load_config},
    descriptor::{load_descriptor, scan_descriptors},
};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// pathguard - Path-scoped access control from per-directory descriptors
#[derive(Parser, Debug)]
#[command(name = "pathguard")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, env = "PATHGUARD_CONFIG")]
    config: Option<String>,

    /// Log level (trace, debug, info, warn, error), overrides the config file
    #[arg(long, env = "PATHGUARD_LOG_LEVEL")]
    log_level: Option<String>,

    /// Governed root directory, overrides the config file
    #[arg(long)]
    root: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Decide one request; exits 0 when allowed, 1 when denied
    Check {
        /// Path relative to the governed root
        path: String,
        /// Requested level (read, write, admin)
        level: String,
        /// Requesting identity
        user: String,
    },
    /// Show which descriptor and rule govern a path, per level
    Explain {
        /// Path relative to the governed root
        path: String,
        /// Requesting identity
        user: String,
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Parse every descriptor under the root and report errors
    Validate,
}

fn init_logging(config: &AppConfig, level_override: Option<&str>) {
    let level = level_override.unwrap_or(&config.logging.level);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let registry = tracing_subscriber::registry().with(filter);
    match config.logging.format {
        LogFormat::Pretty => registry
            .with(fmt::layer().with_writer(std::io::stderr))
            .init(),
        LogFormat::Json => registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init(),
    }
}

fn load_service(config: &AppConfig) -> anyhow::Result<AclService> {
    let service = AclService::from_config(&config.acl);
    service
        .load_permissions_from_filesystem(&config.acl.root)
        .inspect_err(|e| error!(error = %e, "Failed to load permissions"))
        .with_context(|| format!("loading descriptors under {}", config.acl.root.display()))?;
    Ok(service)
}

fn check(config: &AppConfig, path: &str, level: &str, user: &str) -> anyhow::Result<ExitCode> {
    // Reject an unknown level before touching the descriptor tree
    let level: AccessLevel = level.parse()?;
    let service = load_service(config)?;
    let allowed = service.can_access(&AclRequest::new(path, level, user));
    println!("{}", if allowed { "allowed" } else { "denied" });
    Ok(if allowed {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn validate(config: &AppConfig) -> anyhow::Result<ExitCode> {
    let root = &config.acl.root;
    let files = scan_descriptors(root, &config.acl.descriptor_name)?;

    let mut invalid = 0usize;
    for file in &files {
        match load_descriptor(file, root) {
            Ok(ruleset) => println!("ok      {} ({} rules)", file.display(), ruleset.rules.len()),
            Err(e) => {
                invalid += 1;
                println!("invalid {}", e);
            }
        }
    }

    println!("{} descriptors, {} invalid", files.len(), invalid);
    Ok(if invalid == 0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn main() -> anyhow::Result<ExitCode> {
    // Pick up PATHGUARD_* variables from a local .env file
    dotenvy::dotenv().ok();

    let args = Args::parse();

    let mut config = load_config(args.config.as_deref())?;
    if let Some(root) = args.root {
        config.acl.root = root;
    }

    init_logging(&config, args.log_level.as_deref());

    info!(
        version = env!("CARGO_PKG_VERSION"),
        root = %config.acl.root.display(),
        "Starting pathguard"
    );

    match args.command {
        Command::Check { path, level, user } => check(&config, &path, &level, &user),
        Command::Explain { path, user, json } => {
            let service = load_service(&config)?;
            let report = service.explain(&path, &user);
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!("{}", report);
            }
            Ok(ExitCode::SUCCESS)
        }
        Command::Validate => validate(&config),
    }
}
