//! Top-level CLI definition and dispatch.

use std::collections::HashSet;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Args, CommandFactory, Parser, Subcommand};
use clap_complete::{Shell as CompletionShell, generate};
use colored::{Colorize, control};

use drive_sweep_helper::catalog::{ALL_CATEGORIES, Category};
use drive_sweep_helper::core::config::Config;
use drive_sweep_helper::core::errors::{Result, SweepError};
use drive_sweep_helper::device::classifier::{
    DeviceClassifier, MountDeviceClassifier, RotationalPolicy, base_device_name,
};
use drive_sweep_helper::device::mounts::ProcMountTable;
use drive_sweep_helper::engine::batch::BatchJob;
use drive_sweep_helper::engine::delete::{DeleteOp, Deleter};
use drive_sweep_helper::engine::monitor::ProgressMonitor;
use drive_sweep_helper::logger::activity::{ActivityEvent, ActivityLoggerHandle, spawn_logger};

/// Drive Sweep Helper — drive-aware cleanup of caches, history, and logs.
#[derive(Debug, Parser)]
#[command(
    name = "dsw",
    author,
    version,
    about = "Drive Sweep Helper - drive-aware secure cleanup",
    long_about = None,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Override config file path.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Disable colored output.
    #[arg(long, global = true)]
    no_color: bool,
    /// Quiet mode (per-job output only).
    #[arg(short, long, global = true)]
    quiet: bool,
    /// Subcommand to execute.
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Subcommand)]
enum Command {
    /// List cleanup categories and whether their targets exist.
    List,
    /// Run cleanup for the selected categories.
    Clean(CleanArgs),
    /// Show the device classification for a path.
    Classify(ClassifyArgs),
    /// Generate shell completions.
    Completions(CompletionsArgs),
}

#[derive(Debug, Clone, Args)]
struct CleanArgs {
    /// Category identifiers (see `dsw list`).
    #[arg(value_name = "CATEGORY", required_unless_present = "all")]
    categories: Vec<String>,
    /// Select every category (privileged ones only when running as root).
    #[arg(long, conflicts_with = "categories")]
    all: bool,
    /// Report what would be deleted without touching the filesystem.
    #[arg(long)]
    dry_run: bool,
}

#[derive(Debug, Clone, Args)]
struct ClassifyArgs {
    /// Path to classify.
    #[arg(value_name = "PATH")]
    path: PathBuf,
}

#[derive(Debug, Clone, Args)]
struct CompletionsArgs {
    /// Target shell.
    #[arg(value_enum)]
    shell: CompletionShell,
}

/// Dispatch the parsed command line.
pub fn run(args: &Cli) -> Result<()> {
    if args.no_color {
        control::set_override(false);
    }

    let config = Config::load(args.config.as_deref())?;

    match &args.command {
        Command::List => list(&config),
        Command::Clean(clean_args) => clean(&config, clean_args, args.quiet),
        Command::Classify(classify_args) => classify(&config, &classify_args.path),
        Command::Completions(completions_args) => {
            generate(
                completions_args.shell,
                &mut Cli::command(),
                "dsw",
                &mut io::stdout(),
            );
            Ok(())
        }
    }
}

fn home_dir() -> Result<PathBuf> {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .ok_or_else(|| SweepError::Runtime {
            details: "HOME is not set; cannot resolve cleanup targets".to_string(),
        })
}

fn is_root() -> bool {
    #[cfg(unix)]
    {
        nix::unistd::Uid::effective().is_root()
    }
    #[cfg(not(unix))]
    {
        false
    }
}

fn build_classifier(config: &Config) -> Result<MountDeviceClassifier> {
    let table = ProcMountTable::new(Duration::from_millis(config.device.mounts_cache_ttl_ms));
    let policy = RotationalPolicy::from_patterns(&config.device.rotational_patterns)?;
    Ok(MountDeviceClassifier::new(Arc::new(table), policy))
}

fn list(_config: &Config) -> Result<()> {
    let home = home_dir()?;
    for category in ALL_CATEGORIES {
        let existing: usize = category
            .batch_specs(&home)
            .iter()
            .flat_map(|spec| &spec.candidates)
            .filter(|path| std::fs::symlink_metadata(path).is_ok())
            .count();

        let status = if existing > 0 {
            format!("{existing} target(s)").green()
        } else {
            "nothing to clean".dimmed()
        };
        let root_note = if category.requires_root() {
            " (requires root)".yellow().to_string()
        } else {
            String::new()
        };
        println!(
            "  {:<16} {}{root_note} - {status}",
            category.id().bold(),
            category.title()
        );
    }
    Ok(())
}

fn classify(config: &Config, path: &std::path::Path) -> Result<()> {
    let classifier = build_classifier(config)?;
    let resolved = drive_sweep_helper::core::paths::resolve_target_path(path);

    match classifier.device_for(&resolved) {
        Some(device) => {
            let base = base_device_name(&device);
            let verdict = if classifier.is_rotational(&resolved) {
                "rotational (secure wipe)".yellow()
            } else {
                "non-rotational (plain unlink)".green()
            };
            println!("path:    {}", resolved.display());
            println!("device:  {device}");
            println!("base:    {base}");
            println!("verdict: {verdict}");
        }
        None => {
            println!("path:    {}", resolved.display());
            println!("device:  (unresolved)");
            println!("verdict: {}", "non-rotational (plain unlink)".green());
        }
    }
    Ok(())
}

fn parse_selection(args: &CleanArgs) -> Result<Vec<Category>> {
    if args.all {
        let root = is_root();
        return Ok(ALL_CATEGORIES
            .into_iter()
            .filter(|c| root || !c.requires_root())
            .collect());
    }

    let mut selection = Vec::new();
    for raw in &args.categories {
        let category = Category::from_id(raw).ok_or_else(|| SweepError::InvalidConfig {
            details: format!(
                "unknown category {raw:?}; valid categories: {}",
                ALL_CATEGORIES.map(Category::id).join(", ")
            ),
        })?;
        selection.push(category);
    }
    Ok(selection)
}

fn clean(config: &Config, args: &CleanArgs, quiet: bool) -> Result<()> {
    let home = home_dir()?;
    let selection = parse_selection(args)?;

    // Duplicate selections collapse to one execution per distinct category,
    // before the run loop begins.
    let mut seen = HashSet::new();
    let selection: Vec<Category> = selection.into_iter().filter(|c| seen.insert(*c)).collect();

    // Denied elevated access is the one condition that fails the whole run.
    for category in &selection {
        if category.requires_root() && !is_root() {
            return Err(SweepError::ElevationRequired {
                category: category.id().to_string(),
            });
        }
    }

    let classifier = build_classifier(config)?;

    let mut logger_join = None;
    let logger: Option<ActivityLoggerHandle> = if config.logging.jsonl_enabled {
        match spawn_logger(
            config.logging.jsonl_path.clone(),
            config.logging.channel_capacity,
        ) {
            Ok((handle, join)) => {
                logger_join = Some(join);
                Some(handle)
            }
            Err(e) => {
                eprintln!("dsw: activity log disabled: {e}");
                None
            }
        }
    } else {
        None
    };

    if let Some(logger) = &logger {
        logger.send(ActivityEvent::RunStarted {
            categories: selection.iter().map(|c| c.id().to_string()).collect(),
            dry_run: args.dry_run,
        });
    }

    let op: Arc<dyn DeleteOp> = Arc::new(Deleter::new(
        Arc::new(classifier),
        config.wipe.clone(),
        args.dry_run,
        logger.clone(),
    ));
    let monitor = ProgressMonitor::new(&config.monitor);

    if !quiet {
        let mode = if args.dry_run { " (dry run)" } else { "" };
        println!(
            "Sweeping {} categor{}{mode}",
            selection.len(),
            if selection.len() == 1 { "y" } else { "ies" }
        );
    }

    let mut failures = 0usize;
    for category in &selection {
        for spec in category.batch_specs(&home) {
            let job = BatchJob::build(spec);
            let result = monitor.execute(job, Arc::clone(&op), logger.as_ref());
            if result.status.is_failure() {
                failures += 1;
            }
        }

        // Applications expect these directories to exist; put them back
        // empty as soon as the category's jobs finish.
        if !args.dry_run {
            for dir in category.recreate_after(&home) {
                if let Err(e) = std::fs::create_dir_all(&dir) {
                    eprintln!("dsw: could not recreate {}: {e}", dir.display());
                }
            }
        }
    }

    if !quiet && failures > 0 {
        println!(
            "{}",
            format!("{failures} job(s) reported failures; see log for details").yellow()
        );
    }

    if let Some(logger) = &logger {
        logger.shutdown();
    }
    if let Some(join) = logger_join {
        let _ = join.join();
    }

    // Individual deletion failures are informational; the run still
    // succeeded at the process level.
    Ok(())
}
