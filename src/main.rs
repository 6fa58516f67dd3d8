//! prbump - Automated dependency update pull requests
//!
//! Scans repositories for outdated package references and opens one pull
//! request per update (or one consolidated PR) on the hosting platform.

use clap::Parser;
use colored::Colorize;
use prbump::cli::CliArgs;
use prbump::engine::CollaborationEngine;
use prbump::error::{AppError, EngineError};
use prbump::finder::{Metapackages, PackageFilter, UpdateFinder};
use prbump::lookup::{HttpSourceClientFactory, PackageLookup, SourceClientCache};
use prbump::platform::PlatformRegistry;
use prbump::scan::ProjectFileScanner;
use prbump::settings::SettingsFile;
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    let args = CliArgs::parse();

    let default_filter = if args.verbose { "prbump=debug" } else { "prbump=info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    match run(args).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{} {}", "error:".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}

/// Main application logic
async fn run(args: CliArgs) -> anyhow::Result<ExitCode> {
    let target = args.target()?;
    let file = SettingsFile::load(&args.config)?;
    let auth = args.auth(&file);
    let settings = args.settings(&file)?;

    let registry = PlatformRegistry::default();
    let bundle = registry.create(auth.platform, &auth)?;

    let cache = Arc::new(SourceClientCache::new(Box::new(
        HttpSourceClientFactory::new()?,
    )));
    let filter = PackageFilter::from_patterns(settings.include.as_deref(), settings.exclude.as_deref())?;
    let finder = UpdateFinder::new(
        Box::new(ProjectFileScanner::new()),
        PackageLookup::new(cache),
        Metapackages::default(),
        filter,
    );

    let engine = CollaborationEngine::new(
        bundle,
        finder,
        settings,
        auth.token.clone(),
        args.workspace.clone(),
    );

    match engine.run(&target).await {
        Ok(report) => {
            println!(
                "{} {} update{} across {} repositor{}",
                "done:".green().bold(),
                report.updates_made,
                if report.updates_made == 1 { "" } else { "s" },
                report.repositories_changed,
                if report.repositories_changed == 1 { "y" } else { "ies" },
            );
            Ok(ExitCode::SUCCESS)
        }
        Err(EngineError::RepositoriesFailed {
            updates_made,
            failures,
        }) => {
            println!(
                "{} {} updates were made, but {} repositor{} failed",
                "partial:".yellow().bold(),
                updates_made,
                failures.len(),
                if failures.len() == 1 { "y" } else { "ies" },
            );
            for failure in &failures {
                println!("  {} {}", "failed:".red(), failure);
            }
            Ok(ExitCode::from(2))
        }
        Err(e) => Err(AppError::from(e).into()),
    }
}
