use std::path::PathBuf;
use std::process;
use std::time::Duration;

use clap::{Parser, Subcommand};
use lldbind_core::engine::sim::{SimEngine, SimProgram};
use lldbind_core::prelude::*;
use lldbind_core::WaitConfig;
use lldbind_utils::{
    info, init_logging_with_format, init_logging_with_level, log_format_from_env, warn, LogFormat, LogLevel, LoggingError,
};

/// Pid handed to the simulated attachable process when only a name is given.
const SIMULATED_PID: u64 = 4100;

/// Drive an LLDB session through the liblldb_wrapper C shim.
#[derive(Parser, Debug)]
#[command(name = "lldbind")]
#[command(version)]
#[command(about = "Drive an LLDB session through the liblldb_wrapper C shim", long_about = None)]
struct Cli
{
    /// Explicit path of the wrapper library (default: LLDBIND_WRAPPER_LIB, then the search path)
    #[arg(long, global = true)]
    lib: Option<PathBuf>,
    /// Run against the in-memory engine with a scripted demo program
    #[arg(long, global = true, default_value_t = false)]
    simulate: bool,
    /// Put the debugger in asynchronous mode (launch and attach return immediately)
    #[arg(long = "async", global = true, default_value_t = false)]
    is_async: bool,
    /// Launch/attach wait deadline in milliseconds (default: LLDBIND_WAIT_TIMEOUT_MS or 10000)
    #[arg(long, global = true)]
    timeout_ms: Option<u64>,
    /// Sleep between state polls in milliseconds (default: LLDBIND_POLL_INTERVAL_MS or 10)
    #[arg(long, global = true)]
    poll_ms: Option<u64>,
    /// Log level; RUST_LOG is used when omitted
    #[arg(long, global = true)]
    log_level: Option<LogLevel>,
    /// Log format: pretty or json (default: LLDBIND_LOG_FORMAT, then pretty)
    #[arg(long, global = true)]
    log_format: Option<LogFormat>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands
{
    /// Launch a program and report where it stops
    Launch
    {
        /// Path to the executable to launch
        program: String,
        /// Break on a function name before launching (repeatable)
        #[arg(short = 'b', long = "break")]
        breakpoints: Vec<String>,
        /// Extra environment entry, KEY=VALUE (repeatable)
        #[arg(short, long)]
        env: Vec<String>,
        /// Working directory of the debuggee
        #[arg(long)]
        cwd: Option<PathBuf>,
        /// Keep continuing until the process exits, then print its output
        #[arg(long, default_value_t = false)]
        run_to_exit: bool,
        /// Arguments to pass to the program
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },
    /// Attach to a running process by PID or name
    Attach
    {
        /// Executable of the process being attached to
        program: String,
        /// Process ID (PID) to attach to
        #[arg(long, required_unless_present = "name", conflicts_with = "name")]
        pid: Option<u64>,
        /// Process name to attach to
        #[arg(long)]
        name: Option<String>,
        /// Wait for a process with that name to appear
        #[arg(long, requires = "name", default_value_t = false)]
        wait_for: bool,
        /// Detach after printing the stop location
        #[arg(long, default_value_t = false)]
        detach: bool,
    },
    /// Run an LLDB command and print its result
    Command
    {
        /// Command line, e.g. `version` or `breakpoint list`
        #[arg(trailing_var_arg = true, required = true)]
        words: Vec<String>,
    },
    /// List the optional entry points the loaded library exports
    Features,
    /// Print the engine version banner
    Version,
}

impl Cli
{
    /// The `--log-format` flag, falling back to the environment.
    fn log_format(&self) -> Result<LogFormat, LoggingError>
    {
        match self.log_format {
            Some(format) => Ok(format),
            None => log_format_from_env(),
        }
    }
}

fn main()
{
    let cli = Cli::parse();

    let logging = cli.log_format().and_then(|format| match cli.log_level {
        Some(level) => init_logging_with_level(level, format),
        None => init_logging_with_format(format),
    });
    // Held until exit so buffered file output is flushed
    let _guard = match logging {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logging: {e}");
            process::exit(1);
        }
    };

    if let Err(e) = run_command(cli) {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run_command(cli: Cli) -> Result<(), Box<dyn std::error::Error>>
{
    let lldb = open_runtime(&cli)?;

    match &cli.command {
        Commands::Launch {
            program,
            breakpoints,
            env,
            cwd,
            run_to_exit,
            args,
        } => {
            let debugger = create_session(&lldb, &cli)?;
            let target = debugger.create_target(program)?;

            for symbol in breakpoints {
                let breakpoint = target.breakpoint_create_by_name(symbol, None)?;
                if breakpoint.num_locations() == 0 {
                    warn!("Breakpoint {} on '{}' has no locations", breakpoint.id(), symbol);
                }
                println!(
                    "Breakpoint {}: {} ({} location(s))",
                    breakpoint.id(),
                    symbol,
                    breakpoint.num_locations()
                );
            }

            let mut launch_info = LaunchInfo::new(args);
            launch_info.set_environment(env, true);
            if let Some(dir) = cwd {
                launch_info.set_working_directory(dir);
            }

            info!("Launching program: {} with args: {:?}", program, args);
            let process = target.launch(launch_info)?;
            println!("Launched process {}", process.pid());
            print_stop(&target, &process)?;

            if *run_to_exit && !cli.is_async {
                run_until_exit(&target, &process, &debugger.wait_config())?;
            }
            Ok(())
        }
        Commands::Attach {
            program,
            pid,
            name,
            wait_for,
            detach,
        } => {
            let debugger = create_session(&lldb, &cli)?;
            let target = debugger.create_target(program)?;

            let process = match (pid, name) {
                (Some(pid), _) => target.attach(ProcessId::from(*pid))?,
                (None, Some(name)) => target.attach_with_name(name, *wait_for)?,
                (None, None) => return Err("either --pid or --name is required".into()),
            };
            println!("Successfully attached to process {}", process.pid());
            print_stop(&target, &process)?;

            if *detach {
                process.detach()?;
                println!("Detached from process {}", process.pid());
            }
            Ok(())
        }
        Commands::Command { words } => {
            let debugger = create_session(&lldb, &cli)?;
            let interpreter = debugger
                .command_interpreter()?
                .ok_or("the engine returned no command interpreter")?;
            let result = interpreter.handle_command(&words.join(" "), false)?;
            if let Some(output) = result.output() {
                print!("{output}");
            }
            if let Some(error) = result.error() {
                eprint!("{error}");
            }
            if !result.succeeded() {
                return Err(format!("command '{}' failed", words.join(" ")).into());
            }
            Ok(())
        }
        Commands::Features => {
            let capabilities = lldb.capabilities();
            println!("Supported:");
            for feature in capabilities.supported() {
                println!("  {feature}");
            }
            let unsupported = capabilities.unsupported();
            if !unsupported.is_empty() {
                println!("Unsupported:");
                for feature in unsupported {
                    println!("  {feature}");
                }
            }
            Ok(())
        }
        Commands::Version => {
            println!(
                "{}",
                lldb.version_string().unwrap_or_else(|| "unknown LLDB version".to_string())
            );
            Ok(())
        }
    }
}

fn open_runtime(cli: &Cli) -> Result<Lldb, Box<dyn std::error::Error>>
{
    if cli.simulate {
        info!("Using the simulated engine");
        return Ok(Lldb::simulated(simulated_engine(&cli.command)));
    }
    load_native(cli.lib.as_ref())
}

#[cfg(unix)]
fn load_native(lib: Option<&PathBuf>) -> Result<Lldb, Box<dyn std::error::Error>>
{
    let lldb = match lib {
        Some(path) => Lldb::load_from(path)?,
        None => Lldb::load()?,
    };
    Ok(lldb)
}

#[cfg(not(unix))]
fn load_native(_lib: Option<&PathBuf>) -> Result<Lldb, Box<dyn std::error::Error>>
{
    Err("the native engine is only available on unix targets; use --simulate".into())
}

/// A demo program registered under the path the command names.
fn simulated_engine(command: &Commands) -> SimEngine
{
    let engine = SimEngine::new();
    match command {
        Commands::Launch { program, .. } => engine.with_program(SimProgram::demo(program.as_str())),
        Commands::Attach { program, pid, name, .. } => {
            let demo = SimProgram::demo(program.as_str());
            let process_name = name.clone().unwrap_or_else(|| demo.file_name());
            engine
                .with_attachable(pid.unwrap_or(SIMULATED_PID), &process_name)
                .with_program(demo)
        }
        Commands::Command { .. } | Commands::Features | Commands::Version => engine,
    }
}

fn create_session(lldb: &Lldb, cli: &Cli) -> Result<Debugger, Box<dyn std::error::Error>>
{
    let debugger = lldb.create_debugger()?;
    debugger.set_async(cli.is_async)?;

    let mut wait = WaitConfig::from_env();
    if let Some(ms) = cli.poll_ms {
        wait.poll_interval = Duration::from_millis(ms);
    }
    if let Some(ms) = cli.timeout_ms {
        wait.timeout = Duration::from_millis(ms);
    }
    debugger.set_wait_config(wait);
    Ok(debugger)
}

fn print_stop(target: &Target, process: &Process) -> Result<(), Box<dyn std::error::Error>>
{
    println!("State: {}", process.state());
    match process.state() {
        State::Exited => {
            let description = process.exit_description()?.unwrap_or_default();
            println!("Exit status: {} {}", process.exit_status(), description);
            return Ok(());
        }
        State::Stopped | State::Crashed => {}
        _ => return Ok(()),
    }

    let Some(thread) = process.selected_thread()? else {
        return Ok(());
    };
    println!(
        "Thread #{} (tid {}): {}",
        thread.index_id(),
        thread.thread_id(),
        thread.stop_description().unwrap_or_else(|| thread.stop_reason().to_string())
    );
    for frame in thread.frames() {
        let function = frame.function_name().unwrap_or_else(|| "??".to_string());
        match frame.location() {
            Some(location) => println!("  frame #{}: {:#x} {} at {}", frame.frame_id(), frame.pc(), function, location),
            None => println!("  frame #{}: {:#x} {}", frame.frame_id(), frame.pc(), function),
        }
    }

    for breakpoint in target.breakpoints() {
        println!("Breakpoint {}: hit count = {}", breakpoint.id(), breakpoint.hit_count());
    }
    Ok(())
}

fn run_until_exit(target: &Target, process: &Process, wait: &WaitConfig) -> Result<(), Box<dyn std::error::Error>>
{
    while process.is_stopped() {
        process.continue_execution()?;
        process.wait_for_stop(wait)?;
        print_stop(target, process)?;
    }

    let stdout = process.stdout(64 * 1024)?;
    if !stdout.is_empty() {
        print!("{stdout}");
    }
    let stderr = process.stderr(64 * 1024)?;
    if !stderr.is_empty() {
        eprint!("{stderr}");
    }
    Ok(())
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn test_log_format_flag_without_level()
    {
        let cli = Cli::try_parse_from(["lldbind", "--log-format", "json", "version"]).unwrap();
        assert_eq!(cli.log_level, None);
        assert_eq!(cli.log_format().unwrap(), LogFormat::Json);
    }

    #[test]
    fn test_log_format_flag_with_level()
    {
        let cli = Cli::try_parse_from(["lldbind", "features", "--log-level", "debug", "--log-format", "pretty"]).unwrap();
        assert_eq!(cli.log_level, Some(LogLevel::Debug));
        assert_eq!(cli.log_format().unwrap(), LogFormat::Pretty);
    }

    #[test]
    fn test_rejects_unknown_log_format()
    {
        assert!(Cli::try_parse_from(["lldbind", "--log-format", "xml", "version"]).is_err());
    }
}
