use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use hotbind::action::{ActionDescriptor, ActionKind};
use hotbind::config::{self, CONFIG_ENV};
use hotbind::daemon;
use hotbind::error::AppError;
use hotbind::keys::Combination;
use hotbind::record::record_combination;
use hotbind::registry::{ConfigStore, HotkeyRegistry};

#[derive(Parser)]
#[command(name = "hotbind", version, about = "Bind key combinations to apps, URLs, and text")]
struct Cli {
    /// Shortcuts file
    #[arg(long, global = true, env = CONFIG_ENV)]
    config: Option<PathBuf>,

    /// Debug logging (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Bind all shortcuts and run until interrupted
    Run,
    /// List shortcuts
    List,
    /// Add or replace a shortcut
    Add {
        /// Combination, e.g. ctrl+alt+t. Recorded from the keyboard if omitted.
        combination: Option<String>,
        /// Action type
        #[arg(long = "type", value_enum)]
        kind: ActionKind,
        /// Program path, URL, or text
        #[arg(long)]
        value: String,
        /// Replace an existing binding
        #[arg(long)]
        force: bool,
    },
    /// Remove a shortcut
    Remove { combination: String },
    /// Record a combination from the keyboard and print it
    Record,
    /// Tell the running daemon to reload the shortcuts file
    Reload,
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("hotbind: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), AppError> {
    let config_path = config::config_path(cli.config);
    let pid_path = config::pid_file_path();

    match cli.command {
        Command::Run => daemon::run(config_path, pid_path).await,
        Command::List => {
            let registry = HotkeyRegistry::load(ConfigStore::new(config_path));
            print_entries(&registry.list());
            Ok(())
        }
        Command::Add {
            combination,
            kind,
            value,
            force,
        } => {
            let combo = match combination {
                Some(raw) => Combination::parse(&raw).map_err(|e| AppError::Invalid(e.to_string()))?,
                None => record_interactively().await?,
            };
            let action =
                ActionDescriptor::new(kind, &value).map_err(|e| AppError::Invalid(e.to_string()))?;

            let mut registry = load_for_edit(config_path);
            let key = combo.to_string();
            if registry.contains(&key) && !force {
                return Err(AppError::AlreadyBound(key));
            }
            if !registry.add(&combo, action) {
                return Err(AppError::SaveFailed);
            }
            println!("bound {combo}");
            notify_daemon(&pid_path);
            Ok(())
        }
        Command::Remove { combination } => {
            let mut registry = load_for_edit(config_path);
            if !registry.contains(&combination) {
                return Err(AppError::NotBound(combination));
            }
            if !registry.remove(&combination) {
                return Err(AppError::SaveFailed);
            }
            println!("removed {combination}");
            notify_daemon(&pid_path);
            Ok(())
        }
        Command::Record => {
            let combo = record_interactively().await?;
            println!("{combo}");
            Ok(())
        }
        Command::Reload => {
            if daemon::signal_reload(&pid_path)? {
                println!("reload requested");
                Ok(())
            } else {
                Err(AppError::Invalid("hotbind daemon is not running".into()))
            }
        }
    }
}

async fn record_interactively() -> Result<Combination, AppError> {
    eprintln!("Press the combination, then Enter to confirm or Esc to cancel.");
    let combo = record_combination(|status| {
        let mut err = std::io::stderr();
        let _ = write!(err, "\r\x1b[2K{status}");
        let _ = err.flush();
    })
    .await?;
    eprintln!();
    combo.ok_or(AppError::Cancelled)
}

/// Load the registry to change it, warning first if the existing file is
/// unreadable and about to be replaced.
fn load_for_edit(config_path: PathBuf) -> HotkeyRegistry {
    let registry = HotkeyRegistry::load(ConfigStore::new(config_path));
    if registry.load_failed() {
        eprintln!(
            "hotbind: warning: {} could not be read; saving will replace it (old file kept as .bak)",
            registry.store().path().display()
        );
    }
    registry
}

fn notify_daemon(pid_path: &std::path::Path) {
    match daemon::signal_reload(pid_path) {
        Ok(true) => tracing::info!("running daemon asked to re-register"),
        Ok(false) => tracing::debug!("no running daemon to notify"),
        Err(e) => tracing::warn!(error = %e, "failed to notify daemon"),
    }
}

fn print_entries(entries: &[(String, ActionDescriptor)]) {
    if entries.is_empty() {
        println!("no shortcuts");
        return;
    }

    let width = entries
        .iter()
        .map(|(combo, _)| combo.chars().count())
        .max()
        .unwrap_or(0)
        .max("COMBINATION".len());
    println!("{:<width$}  {:<12}  VALUE", "COMBINATION", "TYPE");
    for (combo, action) in entries {
        println!("{:<width$}  {:<12}  {}", combo, action.kind().label(), action.value());
    }
}
