mod commands;
mod logging;
mod progress;

use std::error::Error;
use std::io;
use std::path::{Path, PathBuf};
use std::process;
use std::thread;
use std::time::Duration;

use clap::{CommandFactory, Parser};
use colored::*;
use commands::{Cli, Commands, DiscoverArgs};
use dotenv::dotenv;
use progress::CliReporter;
use savevault_core::catalog::load_catalog;
use savevault_core::classify::executable::is_likely_game;
use savevault_core::classify::{DirectoryPolicy, ExecutableClassifier};
use savevault_core::model::ExecutableInfo;
use savevault_core::{CancellationToken, DiscoveredApplication, DiscoveryConfig, DiscoveryEngine};
use tracing::{error, info, warn};

fn main() -> Result<(), Box<dyn Error>> {
    dotenv().ok();

    let _guard = logging::init_logger();

    let config = match savevault_core::config::load_configuration() {
        Ok(config) => config,
        Err(err) => {
            error!("Error loading configuration: {}", err);
            process::exit(1);
        }
    };

    let args = Cli::parse();

    match args.command {
        Some(Commands::Discover(opts)) => {
            if let Err(err) = run_discover(config, opts) {
                error!("Error: {}", err);
                process::exit(1);
            }
        }
        Some(Commands::Explain { path }) => run_explain(&config, &path),
        Some(Commands::PrintConfig) => {
            println!("Configuration: {:#?}", config);
        }
        None => {
            let _ = Cli::command().print_long_help();
        }
    }

    Ok(())
}

fn run_discover(mut config: DiscoveryConfig, args: DiscoverArgs) -> Result<(), Box<dyn Error>> {
    config.search_roots.extend(args.roots);
    if let Some(depth) = args.max_depth {
        config.max_depth = depth;
    }
    if args.no_system_roots {
        config.include_system_roots = false;
    }
    if args.no_registry {
        config.use_registry = false;
    }

    let catalog_path = args
        .catalog
        .or_else(|| config.catalog_path.as_ref().map(PathBuf::from));
    let catalog = match catalog_path {
        Some(path) => load_catalog(&path)?,
        None => Vec::new(),
    };

    let handle = DiscoveryEngine::new(config).with_catalog(catalog).spawn()?;
    cancel_on_enter(handle.cancel_token());
    if let Some(secs) = args.time_limit {
        cancel_after(handle.cancel_token(), Duration::from_secs(secs));
    }

    let mut reporter = CliReporter::new();
    for event in handle.events().iter() {
        reporter.handle(event);
    }
    let outcome = handle.join()?;
    let summary = outcome.summary();

    println!();
    if outcome.is_cancelled() {
        warn!("Discovery stopped before it finished; results are partial");
    }
    info!(
        "Catalog: {}, Registry: {}, Filesystem: {}",
        format!("{:.2}s", summary.catalog_duration.as_secs_f64()).green(),
        format!("{:.2}s", summary.registry_duration.as_secs_f64()).green(),
        format!("{:.2}s", summary.filesystem_duration.as_secs_f64()).green(),
    );
    info!(
        "{} applications found ({} catalog, {} registry, {} filesystem), {} folders scanned",
        format!("{}", reporter.apps().len()).cyan(),
        summary.catalog_found,
        summary.registry_found,
        summary.filesystem_found,
        summary.directories_visited,
    );

    if let Some(path) = args.csv {
        write_csv(&path, reporter.apps())?;
        info!("Results written to {}", path.display());
    }

    Ok(())
}

/// Any line on stdin stops the scan. EOF (no terminal) does not.
fn cancel_on_enter(token: CancellationToken) {
    thread::spawn(move || {
        let mut line = String::new();
        if let Ok(n) = io::stdin().read_line(&mut line) {
            if n > 0 {
                token.cancel();
            }
        }
    });
}

fn cancel_after(token: CancellationToken, limit: Duration) {
    thread::spawn(move || {
        thread::sleep(limit);
        token.cancel();
    });
}

fn write_csv(path: &Path, apps: &[DiscoveredApplication]) -> Result<(), Box<dyn Error>> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(["name", "source", "executable_path", "install_path", "save_path"])?;
    for app in apps {
        writer.write_record([
            app.name.clone(),
            app.source.to_string(),
            app.executable_path.display().to_string(),
            app.install_path.display().to_string(),
            app.save_path.to_string(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

fn run_explain(config: &DiscoveryConfig, path: &Path) {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let is_executable = path
        .extension()
        .map(|ext| {
            config
                .executable_extensions
                .iter()
                .any(|e| e.trim_start_matches('.').eq_ignore_ascii_case(&ext.to_string_lossy()))
        })
        .unwrap_or(false);

    if is_executable && !path.is_dir() {
        let size = match std::fs::metadata(path) {
            Ok(metadata) => metadata.len(),
            Err(err) => {
                warn!("Cannot read {}: {}; treating size as 0", path.display(), err);
                0
            }
        };
        let decision = ExecutableClassifier::new(config).explain(&ExecutableInfo::new(path, size));
        let parent = path
            .parent()
            .map(|p| p.to_string_lossy().into_owned())
            .unwrap_or_default();
        println!(
            "{} executable ({} bytes): {} by rule '{}', likely game: {}",
            path.display(),
            size,
            verdict_label(decision.is_skip()),
            decision.rule,
            is_likely_game(&name, &parent),
        );
    } else {
        let decision = DirectoryPolicy::new(config).explain(path);
        println!(
            "{} folder: {} by rule '{}'",
            path.display(),
            verdict_label(decision.is_skip()),
            decision.rule,
        );
    }
}

fn verdict_label(skip: bool) -> ColoredString {
    if skip {
        "skipped".red()
    } else {
        "kept".green()
    }
}
