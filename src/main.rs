use clap::{Parser, Subcommand, ValueEnum};
use color_eyre::eyre::Result;
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use std::{fs::read_to_string, process::ExitCode};
use stepwise::debugger::{
    DebuggerConfig, DebuggerError, ObservableState, ScriptDebugger, SnapshotLimits,
    DEFAULT_STEP_LIMIT,
};
use stepwise::interpreter::formatter::{
    BasicFormatter, InitializationErrorFormatter, PrettyFormatter,
};
use stepwise::interpreter::InitializationError;

const EXIT_SYNTAX_ERROR: u8 = 65;
const EXIT_RUNTIME_ERROR: u8 = 70;

#[derive(Debug, Parser)]
#[clap(name = "stepwise", version)]
pub struct CLArgs {
    #[clap(subcommand)]
    pub routine: StepwiseCommand,
}

#[derive(Debug, Subcommand)]
pub enum StepwiseCommand {
    /// Runs a script, reporting every breakpoint it reaches.
    Run {
        path: PathBuf,
        #[clap(long = "break", short = 'b')]
        breakpoints: Vec<u32>,
        #[clap(flatten)]
        options: SessionOptions,
    },
    /// Debugs a script interactively.
    Debug {
        path: PathBuf,
        #[clap(long = "break", short = 'b')]
        breakpoints: Vec<u32>,
        #[clap(flatten)]
        options: SessionOptions,
    },
    /// Prints the compiled bytecode of a script.
    Disassemble {
        path: PathBuf,
        #[clap(long = "format", value_enum, default_value = "pretty")]
        format: ErrorFormat,
    },
}

#[derive(Debug, clap::Args)]
pub struct SessionOptions {
    #[clap(long = "format", value_enum, default_value = "pretty")]
    format: ErrorFormat,
    /// Print every pause as JSON.
    #[clap(long)]
    json: bool,
    #[clap(long, default_value_t = DEFAULT_STEP_LIMIT)]
    step_limit: u64,
    #[clap(long, default_value_t = SnapshotLimits::default().max_depth)]
    max_depth: usize,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum ErrorFormat {
    Basic,
    Pretty,
}

fn main() -> ExitCode {
    stepwise_main().expect("Encountered an error!")
}

fn stepwise_main() -> Result<ExitCode> {
    color_eyre::install().expect("Can't fail at first call!");
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = CLArgs::parse();
    match args.routine {
        StepwiseCommand::Run {
            path,
            breakpoints,
            options,
        } => {
            eprintln!("Running {:?}...", path);
            let src = read_to_string(&path)?;
            run(&src, &path, &breakpoints, &options)
        }
        StepwiseCommand::Debug {
            path,
            breakpoints,
            options,
        } => {
            eprintln!("Debugging {:?}...", path);
            let src = read_to_string(&path)?;
            debug(&src, &path, &breakpoints, &options)
        }
        StepwiseCommand::Disassemble { path, format } => {
            eprintln!("Disassembling {:?}...", path);
            let src = read_to_string(&path)?;
            match stepwise::compiler::disassemble_source(&src) {
                Ok(listing) => {
                    print!("{listing}");
                    Ok(ExitCode::SUCCESS)
                }
                Err(error) => {
                    let error = InitializationError::from(error);
                    eprintln!("{}", format_error(&error, &format, &src, &path));
                    Ok(ExitCode::from(EXIT_SYNTAX_ERROR))
                }
            }
        }
    }
}

fn format_error(
    error: &InitializationError,
    format: &ErrorFormat,
    src: &str,
    path: &Path,
) -> String {
    let formatter: Box<dyn InitializationErrorFormatter + '_> = match format {
        ErrorFormat::Basic => Box::new(BasicFormatter),
        ErrorFormat::Pretty => Box::new(PrettyFormatter::new(src, path)),
    };
    formatter.format_error(error)
}

fn create_debugger(breakpoints: &[u32], options: &SessionOptions) -> Result<ScriptDebugger> {
    let config = DebuggerConfig::default()
        .with_step_limit(options.step_limit)
        .with_snapshot_limits(SnapshotLimits {
            max_depth: options.max_depth,
            ..SnapshotLimits::default()
        });
    let mut debugger = ScriptDebugger::new(config);
    for line in breakpoints.iter().copied() {
        if !debugger.has_breakpoint(line) {
            debugger.toggle_breakpoint(line)?;
        }
    }
    Ok(debugger)
}

/// Prints console entries past `printed` and the pause location.
fn report(state: &ObservableState, printed: &mut usize, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(state)?);
        *printed = state.console_output.len();
        return Ok(());
    }
    for entry in state.console_output.iter().skip(*printed) {
        println!("{entry}");
    }
    *printed = state.console_output.len();

    if state.is_finished {
        println!("Execution finished.");
    } else if state.is_paused {
        match state.active_line {
            -1 => println!("-- paused at end of program"),
            line => println!("-- paused at line {line}"),
        }
        if let Some(ref scope) = state.scope {
            println!("{}", serde_json::to_string_pretty(scope)?);
        }
    }
    Ok(())
}

fn exit_code(debugger: &ScriptDebugger) -> ExitCode {
    if debugger.fault().is_some() {
        ExitCode::from(EXIT_RUNTIME_ERROR)
    } else {
        ExitCode::SUCCESS
    }
}

fn start(
    debugger: &mut ScriptDebugger,
    src: &str,
    path: &Path,
    options: &SessionOptions,
) -> Result<Option<ObservableState>> {
    match debugger.start(src) {
        Ok(state) => Ok(Some(state)),
        Err(DebuggerError::Initialization(error)) => {
            eprintln!("{}", format_error(&error, &options.format, src, path));
            Ok(None)
        }
        Err(error) => Err(error.into()),
    }
}

fn run(src: &str, path: &Path, breakpoints: &[u32], options: &SessionOptions) -> Result<ExitCode> {
    let mut debugger = create_debugger(breakpoints, options)?;
    let Some(mut state) = start(&mut debugger, src, path, options)? else {
        return Ok(ExitCode::from(EXIT_SYNTAX_ERROR));
    };
    let mut printed = 0;
    loop {
        report(&state, &mut printed, options.json)?;
        if state.is_finished {
            break;
        }
        state = debugger.continue_execution()?;
    }
    Ok(exit_code(&debugger))
}

const DEBUG_HELP: &str = "\
commands:
  c, continue      run to the next breakpoint
  s, step          run to the next line
  b, break <line>  toggle a breakpoint
  l, list          list breakpoints
  p, print         show the current state
  r, restart       start over, keeping breakpoints
  q, quit          stop and exit";

fn debug(
    src: &str,
    path: &Path,
    breakpoints: &[u32],
    options: &SessionOptions,
) -> Result<ExitCode> {
    let mut debugger = create_debugger(breakpoints, options)?;
    let Some(state) = start(&mut debugger, src, path, options)? else {
        return Ok(ExitCode::from(EXIT_SYNTAX_ERROR));
    };
    let mut printed = 0;
    report(&state, &mut printed, options.json)?;

    let stdin = std::io::stdin();
    let mut input = stdin.lock();
    let mut line = String::new();
    loop {
        print!("(stepwise) ");
        std::io::stdout().flush()?;
        line.clear();
        if input.read_line(&mut line)? == 0 {
            break;
        }
        let mut words = line.split_whitespace();
        let Some(command) = words.next() else {
            continue;
        };
        let result = match command {
            "c" | "continue" => debugger.continue_execution(),
            "s" | "step" => debugger.step(),
            "r" | "restart" => {
                printed = 0;
                match debugger.restart() {
                    Err(DebuggerError::Initialization(error)) => {
                        eprintln!("{}", format_error(&error, &options.format, src, path));
                        continue;
                    }
                    result => result,
                }
            }
            "p" | "print" => Ok(debugger.observable()),
            "b" | "break" => {
                match words.next().map(str::parse::<u32>) {
                    Some(Ok(line)) => match debugger.toggle_breakpoint(line) {
                        Ok(true) => println!("breakpoint set at line {line}"),
                        Ok(false) => println!("breakpoint cleared at line {line}"),
                        Err(error) => eprintln!("{error}"),
                    },
                    _ => eprintln!("usage: break <line>"),
                }
                continue;
            }
            "l" | "list" => {
                let lines: Vec<String> = debugger
                    .breakpoints()
                    .lines()
                    .map(|line| line.to_string())
                    .collect();
                println!("breakpoints: [{}]", lines.join(", "));
                continue;
            }
            "q" | "quit" => break,
            _ => {
                println!("{DEBUG_HELP}");
                continue;
            }
        };
        match result {
            Ok(state) => report(&state, &mut printed, options.json)?,
            Err(error) => eprintln!("{error}"),
        }
    }
    let code = exit_code(&debugger);
    debugger.stop();
    Ok(code)
}
