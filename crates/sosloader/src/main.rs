use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use sosloader_core::inspector::{select_runtime, DumpInspection, DumpInspector, MinidumpInspector};
use sosloader_core::launch::{load_directive, DebuggerCommand, DEFAULT_DEBUGGER};
use sosloader_core::resolver::{ArtifactResolver, ResolverOptions};
use sosloader_core::symbols::{DefaultSymbolProvider, SymbolPath};
use sosloader_core::types::{ArtifactStatus, ResolutionResult};
use sosloader_core::SosResult;
use sosloader_utils::{info, init_logging, LogLevel};

/// Fetches the SOS, DAC and runtime binaries matching a .NET Framework crash dump.
#[derive(Parser, Debug)]
#[command(name = "sosloader")]
#[command(version)]
#[command(
    about = "Fetches the SOS, DAC and runtime binaries matching a .NET Framework crash dump",
    long_about = None
)]
struct Cli
{
    /// Symbol path used for lookups (defaults to Microsoft's public symbol server)
    #[arg(long, global = true, env = "_NT_SYMBOL_PATH", value_name = "PATH")]
    symbol_path: Option<String>,

    /// Extra directory to search for an installed copy of the dumped runtime (repeatable)
    #[arg(long = "runtime-dir", global = true, value_name = "DIR")]
    runtime_dirs: Vec<PathBuf>,

    /// Log level (error, warn, info, debug, trace); overrides RUST_LOG
    #[arg(long, global = true, value_name = "LEVEL")]
    log_level: Option<LogLevel>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands
{
    /// Download the debug support files for the runtime in a dump
    Download
    {
        /// Path to the crash dump
        dump: PathBuf,
        /// Directory to write the files to (default: a per-version directory under the temp dir)
        #[arg(short, long, value_name = "DIR")]
        output: Option<PathBuf>,
    },
    /// Download the debug support files, then open the dump in a debugger with SOS loaded
    Launch
    {
        /// Path to the crash dump
        dump: PathBuf,
        /// Directory to write the files to (default: a per-version directory under the temp dir)
        #[arg(short, long, value_name = "DIR")]
        output: Option<PathBuf>,
        /// Debugger executable
        #[arg(long, env = "SOSLOADER_DEBUGGER", default_value = DEFAULT_DEBUGGER)]
        debugger: PathBuf,
    },
    /// Show the dump's architecture and the runtimes loaded in it
    Info
    {
        /// Path to the crash dump
        dump: PathBuf,
    },
}

fn main() -> ExitCode
{
    let cli = Cli::parse();

    // Keep the guard alive until the end of main so file logs are flushed
    let _logging = match init_logging(cli.log_level) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logging: {e}");
            return ExitCode::FAILURE;
        }
    };

    match run_command(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run_command(cli: &Cli) -> SosResult<()>
{
    match &cli.command {
        Commands::Info { dump } => {
            let inspection = inspect(cli, dump)?;
            print_inspection(&inspection);
            Ok(())
        }
        Commands::Download { dump, output } => {
            let result = resolve(cli, dump, output.as_deref())?;
            print_result(&result);
            Ok(())
        }
        Commands::Launch { dump, output, debugger } => {
            let result = resolve(cli, dump, output.as_deref())?;
            print_result(&result);

            let command = DebuggerCommand::new(debugger, dump, &result);
            println!("Launching: {}", command.command_line());
            command.spawn()
        }
    }
}

fn inspect(cli: &Cli, dump: &Path) -> SosResult<DumpInspection>
{
    MinidumpInspector::new()
        .with_runtime_dirs(cli.runtime_dirs.iter().cloned())
        .inspect(dump)
}

fn resolve(cli: &Cli, dump: &Path, output: Option<&Path>) -> SosResult<ResolutionResult>
{
    let inspection = inspect(cli, dump)?;
    let runtime = select_runtime(&inspection.runtimes)?;

    let options = ResolverOptions::default();
    let symbol_path = SymbolPath::parse_or_default(cli.symbol_path.as_deref(), &options.cache_root);
    info!("Using symbol path {symbol_path}");

    let mut resolver = ArtifactResolver::new(DefaultSymbolProvider::new(symbol_path), options);
    resolver.resolve(runtime, &inspection.target, output)
}

fn print_inspection(inspection: &DumpInspection)
{
    let target = &inspection.target;
    println!("Dump:         {}", target.dump_path.display());
    println!("Architecture: {} ({})", target.architecture, target.platform);

    if inspection.runtimes.is_empty() {
        println!("No CLR is loaded in this dump");
    }
    for runtime in &inspection.runtimes {
        println!("CLR {}", runtime.version);
        println!("  DAC:         {}", runtime.dac);
        match runtime.local_match() {
            Some(path) => println!("  Local match: {}", path.display()),
            None => println!("  Local match: none"),
        }
    }
}

fn print_result(result: &ResolutionResult)
{
    let destination = result.destination.display();

    if result.is_local_match() {
        println!("The matching runtime is installed on this machine ({destination})");
        println!("Load SOS with: {}", load_directive(result));
        return;
    }

    for (kind, status) in &result.statuses {
        let label = match status {
            ArtifactStatus::Retrieved => "retrieved",
            ArtifactStatus::NotFound => "not found",
            ArtifactStatus::AlreadyLocal => "already local",
        };
        println!("{kind}: {label}");
    }

    if result.retrieved_count() < result.statuses.len() {
        print_missing_hint();
    }

    println!("Files are in {destination}");
    println!("Load them with: {}", load_directive(result));
}

#[cfg(windows)]
fn print_missing_hint()
{
    eprintln!("Some files could not be retrieved. Symbol server downloads need dbghelp.dll and symsrv.dll next to sosloader.exe.");
}

#[cfg(not(windows))]
fn print_missing_hint()
{
    eprintln!("Some files could not be retrieved. Only local symbol stores are searched on this platform.");
}
