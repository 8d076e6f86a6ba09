use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use duckhid::{DeviceFile, Engine, Hooks, Outcome, Script, ScriptStore, Statement, parse_file};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "duckhid",
    about = "Run keystroke-injection scripts through a USB HID gadget keyboard",
    version
)]
struct Args {
    /// HID gadget device to write reports to
    #[arg(short, long, global = true, env = "DUCKHID_DEVICE")]
    device: Option<PathBuf>,

    /// Script store file
    #[arg(long, global = true, env = "DUCKHID_STORE")]
    store: Option<PathBuf>,

    /// Log level or filter directive (overrides RUST_LOG)
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Cmd,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Execute a script file or a saved script
    Run {
        /// Path to the script file
        #[arg(required_unless_present = "saved")]
        file: Option<PathBuf>,

        /// Id or name of a saved script
        #[arg(long, conflicts_with = "file")]
        saved: Option<String>,

        /// Start even if the device does not look writable
        #[arg(long)]
        force: bool,
    },
    /// Validate a script without touching the device
    Check {
        /// Path to the script file
        file: PathBuf,
    },
    /// Report whether the device exists and is writable
    Probe,
    /// Show the configured device path, or save a new one
    Device {
        /// New device path to persist
        path: Option<PathBuf>,
    },
    /// Manage saved scripts
    #[command(subcommand)]
    Scripts(ScriptsCmd),
}

#[derive(Subcommand, Debug)]
enum ScriptsCmd {
    /// List saved scripts
    List,
    /// Print a saved script
    Show { id: String },
    /// Save a script file under a name
    Add { name: String, file: PathBuf },
    /// Replace the content of a saved script
    Update { id: String, file: PathBuf },
    /// Delete a saved script
    Remove { id: String },
}

fn init_logging(level: Option<&str>) {
    let filter = match level {
        Some(spec) if spec.contains('=') => EnvFilter::new(spec),
        Some(level) => EnvFilter::new(format!("duckhid={level}")),
        None => EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("duckhid=info")),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .without_time()
        .compact()
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let args = Args::parse();
    init_logging(args.log_level.as_deref());

    let store = ScriptStore::open(args.store.clone().unwrap_or_else(ScriptStore::default_path));

    match args.command {
        Cmd::Run { file, saved, force } => {
            let script = match (file, saved) {
                (Some(file), _) => std::fs::read_to_string(&file)
                    .with_context(|| format!("Failed to read script file: {}", file.display()))?,
                (None, Some(key)) => {
                    store
                        .find(&key)?
                        .with_context(|| format!("No saved script matches '{key}'"))?
                        .content
                }
                (None, None) => bail!("Nothing to run"),
            };
            let device = resolve_device(args.device, &store)?;
            run(&script, device, force).await
        }
        Cmd::Check { file } => check(&file),
        Cmd::Probe => {
            let device = DeviceFile::new(resolve_device(args.device, &store)?);
            if device.is_available() {
                println!("{}: ready", device.path().display());
                Ok(ExitCode::SUCCESS)
            } else {
                println!("{}: not available", device.path().display());
                Ok(ExitCode::FAILURE)
            }
        }
        Cmd::Device { path: Some(path) } => {
            store
                .set_device_path(&path)
                .context("Failed to save device path")?;
            println!("{}", path.display());
            Ok(ExitCode::SUCCESS)
        }
        Cmd::Device { path: None } => {
            println!("{}", resolve_device(args.device, &store)?.display());
            Ok(ExitCode::SUCCESS)
        }
        Cmd::Scripts(cmd) => scripts(cmd, &store),
    }
}

/// `--device` / `DUCKHID_DEVICE`, then the store setting, then the default.
fn resolve_device(flag: Option<PathBuf>, store: &ScriptStore) -> Result<PathBuf> {
    match flag {
        Some(path) => Ok(path),
        None => store.device_path().context("Failed to read script store"),
    }
}

async fn run(script: &str, device: PathBuf, force: bool) -> Result<ExitCode> {
    if !force && !DeviceFile::new(&device).is_available() {
        bail!(
            "HID device {} is not available (use --force to try anyway)",
            device.display()
        );
    }

    let hooks = Hooks::new()
        .on_progress(|line, total| eprintln!("[{line}/{total}]"))
        .on_log(|message| eprintln!("{message}"));
    let mut engine = Engine::open(device).with_hooks(hooks);

    let stop = engine.cancel_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("\nReceived Ctrl-C, stopping after the current line...");
            stop.cancel();
        }
    });

    let result = engine.execute(script).await;

    if result.outcome() != Outcome::Completed {
        // Leave no key latched on the host.
        if let Err(e) = engine.keyboard_mut().release_all().await {
            tracing::warn!(error = %e, "release after stop failed");
        }
    }

    match result.outcome() {
        Outcome::Completed => {
            eprintln!("Done: {} lines", result.lines_executed);
            Ok(ExitCode::SUCCESS)
        }
        Outcome::Cancelled => {
            eprintln!(
                "{} after {} lines",
                result.error.unwrap_or_default(),
                result.lines_executed
            );
            Ok(ExitCode::from(130))
        }
        Outcome::Failed => {
            eprintln!("Error: {}", result.error.unwrap_or_default());
            Ok(ExitCode::FAILURE)
        }
    }
}

fn check(file: &Path) -> Result<ExitCode> {
    let statements = parse_file(file)
        .with_context(|| format!("Failed to parse script file: {}", file.display()))?;

    let mut warnings = 0;
    for (idx, statement) in statements.iter().enumerate() {
        if let Statement::Unknown(name) = statement {
            println!("Line {}: Unknown command: {name}", idx + 1);
            warnings += 1;
        }
    }
    println!("{} lines, {warnings} warnings", statements.len());
    Ok(if warnings == 0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn scripts(cmd: ScriptsCmd, store: &ScriptStore) -> Result<ExitCode> {
    match cmd {
        ScriptsCmd::List => {
            for script in store.scripts()? {
                let lines = script.content.lines().count();
                println!("{}  {}  ({lines} lines)", script.id, script.name);
            }
        }
        ScriptsCmd::Show { id } => {
            let script = store
                .find(&id)?
                .with_context(|| format!("No saved script matches '{id}'"))?;
            print!("{}", script.content);
        }
        ScriptsCmd::Add { name, file } => {
            let content = std::fs::read_to_string(&file)
                .with_context(|| format!("Failed to read script file: {}", file.display()))?;
            let script = Script::new(name, content);
            let id = script.id.clone();
            store.add(script)?;
            println!("{id}");
        }
        ScriptsCmd::Update { id, file } => {
            let mut script = store
                .find(&id)?
                .with_context(|| format!("No saved script matches '{id}'"))?;
            script.content = std::fs::read_to_string(&file)
                .with_context(|| format!("Failed to read script file: {}", file.display()))?;
            store.update(script)?;
        }
        ScriptsCmd::Remove { id } => {
            let script = store
                .find(&id)?
                .with_context(|| format!("No saved script matches '{id}'"))?;
            store.delete(&script.id)?;
        }
    }
    Ok(ExitCode::SUCCESS)
}
