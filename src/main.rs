//! snippad - CLI

use std::fs;
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use owo_colors::OwoColorize;
use snippad::console::{console, console_input, ConsoleEvent, ConsoleSender, Stream, TerminalPrinter};
use snippad::driver::{Driver, ReportStyle};
use snippad::registry::{open_json_registries, ArtifactResolver, LocalRepositoryResolver, Registry};
use snippad::repl::Repl;
use snippad::session::{InputSource, ReaderInput, Session};
use snippad::tui::{App, Tui};
use snippad::util::config::{load_config_from, load_user_config, UserConfig};
use snippad::util::logger::{self, LogLevel};
use snippad::{NAME, VERSION};

/// A scratchpad that evaluates snippet code against a persistent session
#[derive(Parser, Debug)]
#[command(name = "snippad")]
#[command(version = VERSION)]
#[command(about = NAME, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Configuration file to use instead of the user config
    #[arg(long, value_name = "PATH", global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run a snippet source file
    Run {
        /// Source file to run
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },

    /// Evaluate snippet code from command line
    Eval {
        /// Code to evaluate
        #[arg(value_name = "CODE")]
        code: String,
    },

    /// Start the line REPL
    Repl,

    /// Start the terminal editor
    Tui {
        /// File loaded into the editor
        #[arg(value_name = "FILE")]
        file: Option<PathBuf>,
    },

    /// Manage the imports injected before every run
    Imports {
        #[command(subcommand)]
        action: RegistryAction,
    },

    /// Manage the classpath loaded into every session
    Classpath {
        #[command(subcommand)]
        action: RegistryAction,
    },
}

#[derive(Subcommand, Debug)]
enum RegistryAction {
    /// List entries
    List,
    /// Add an entry
    Add {
        #[arg(value_name = "ENTRY")]
        entry: String,
    },
    /// Remove an entry
    Remove {
        #[arg(value_name = "ENTRY")]
        entry: String,
    },
}

fn main() -> Result<ExitCode> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => load_config_from(path)
            .with_context(|| format!("Failed to load config: {}", path.display()))?,
        None => load_user_config().context("Failed to load user config")?,
    };
    let level = if args.verbose {
        LogLevel::Debug
    } else {
        LogLevel::Warn
    };

    // The terminal editor owns the screen, so it logs to a file
    if let Commands::Tui { .. } = args.command {
        let log_file = config.storage_dir()?.join("snippad.log");
        logger::init_to_file(&log_file, level)
            .with_context(|| format!("Failed to open log file: {}", log_file.display()))?;
    } else if args.verbose {
        logger::init_debug();
    } else {
        logger::init_cli();
    }

    match args.command {
        Commands::Run { file } => {
            let source = fs::read_to_string(&file)
                .with_context(|| format!("Failed to read: {}", file.display()))?;
            run_headless(&config, &source)
                .with_context(|| format!("Failed to run: {}", file.display()))
        }
        Commands::Eval { code } => run_headless(&config, &code).context("Failed to evaluate code"),
        Commands::Repl => {
            run_repl(config)?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Tui { file } => {
            run_tui(&config, file.as_deref())?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Imports { action } => {
            let (mut imports, _) = open_registries(&config)?;
            manage(&mut imports, action, |entry| Ok(entry.to_string()))?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Classpath { action } => {
            let (_, mut classpath) = open_registries(&config)?;
            let resolver = LocalRepositoryResolver::new(config.repository_dir()?);
            manage(&mut classpath, action, |spec| verify_classpath_entry(&resolver, spec))?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn open_registries(config: &UserConfig) -> Result<(Registry, Registry)> {
    let dir = config.storage_dir()?;
    open_json_registries(&dir, &config.imports.defaults)
        .with_context(|| format!("Failed to open registries in {}", dir.display()))
}

/// Apply a registry subcommand; `prepare` turns an added entry into the
/// form the registry stores
fn manage(
    registry: &mut Registry,
    action: RegistryAction,
    prepare: impl Fn(&str) -> Result<String>,
) -> Result<()> {
    match action {
        RegistryAction::List => {
            for entry in registry.iter() {
                println!("{}", entry);
            }
        }
        RegistryAction::Add { entry } => {
            let entry = prepare(&entry)?;
            if registry.add(&entry)? {
                println!("{} {}", "Added".green(), entry);
            } else {
                println!("{} {}", "Already present or blank:".dimmed(), entry);
            }
        }
        RegistryAction::Remove { entry } => {
            if registry.remove(&entry)? {
                println!("{} {}", "Removed".green(), entry);
            } else {
                println!("{} {}", "Not present:".dimmed(), entry);
            }
        }
    }
    Ok(())
}

/// Resolve a classpath spec and check that it loads
fn verify_classpath_entry(
    resolver: &LocalRepositoryResolver,
    spec: &str,
) -> Result<String> {
    let path = resolver.resolve(spec)?;
    let session = Session::builder().out(io::sink()).err(io::sink()).build()?;
    session
        .add_classpath_entry(&path)
        .with_context(|| format!("Failed to load classpath entry: {}", path.display()))?;
    Ok(path.to_string_lossy().into_owned())
}

/// Session classpath: configured entries, then the registry's
fn session_classpath(
    config: &UserConfig,
    classpath: &Registry,
) -> Vec<PathBuf> {
    config
        .session
        .classpath
        .iter()
        .cloned()
        .chain(classpath.iter().map(PathBuf::from))
        .collect()
}

fn build_session(
    config: &UserConfig,
    classpath: &Registry,
    sender: &ConsoleSender,
    input: impl InputSource + 'static,
) -> Result<Arc<Session>> {
    let session = Session::builder()
        .out(sender.writer(Stream::Out))
        .err(sender.writer(Stream::Err))
        .input(input)
        .classpath(session_classpath(config, classpath))
        .build()
        .context("Failed to create session")?;
    Ok(Arc::new(session))
}

fn stdin_input() -> ReaderInput<BufReader<io::Stdin>> {
    ReaderInput::new(BufReader::new(io::stdin()))
}

fn run_headless(
    config: &UserConfig,
    source: &str,
) -> Result<ExitCode> {
    let (imports, classpath) = open_registries(config)?;
    let (sender, events) = console();
    let session = build_session(config, &classpath, &sender, stdin_input())?;
    let driver = Driver::new(session.clone(), sender).with_style(ReportStyle::Status);

    let handle = driver.run(source, &imports.list())?;
    let mut printer = TerminalPrinter::stdio(config.console.colors, config.console.status_lines);
    for event in events.iter() {
        printer.print(&event)?;
        if event == ConsoleEvent::RunFinished {
            break;
        }
    }
    let summary = handle.join()?;
    session.close()?;

    if !summary.remainder.trim().is_empty() {
        eprintln!(
            "{} incomplete input at end was not evaluated",
            "warning:".yellow()
        );
    }
    if summary.rejected + summary.thrown > 0 {
        Ok(ExitCode::FAILURE)
    } else {
        Ok(ExitCode::SUCCESS)
    }
}

fn run_repl(config: UserConfig) -> Result<()> {
    let (imports, classpath) = open_registries(&config)?;
    let (sender, events) = console();
    let session = build_session(&config, &classpath, &sender, stdin_input())?;
    let colors = config.console.colors;

    let mut repl = Repl::new(
        session.clone(),
        sender,
        events,
        imports.list(),
        config.repl,
        colors,
    )
    .context("Failed to start REPL")?;
    repl.run()?;
    session.close()?;
    Ok(())
}

fn run_tui(
    config: &UserConfig,
    file: Option<&Path>,
) -> Result<()> {
    let source = match file {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("Failed to read: {}", path.display()))?,
        None => String::new(),
    };
    let (imports, classpath) = open_registries(config)?;
    let (sender, events) = console();
    let (input, reader) = console_input(Some(sender.clone()));
    let session = build_session(config, &classpath, &sender, reader)?;
    let driver = Driver::new(session, sender);

    let app = App::new(driver, events, input, imports.list()).with_source(&source);
    let mut tui = Tui::new(app).context("Failed to set up terminal")?;
    tui.run()?;
    Ok(())
}
