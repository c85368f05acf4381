use std::{path::PathBuf, process::ExitCode};

use anyhow::{Context as _, Result, anyhow};
use clap::{Parser, Subcommand};
use laminar_engine::{Context, FlowError};
use tracing::{debug, info};

mod demos;
mod input;

use demos::{Catalog, DemoFlow};

/// Exit status when the final context is failed.
const EXIT_FAILED: u8 = 1;
/// Exit status when a `--signaling` run was halted without failing.
const EXIT_HALTED: u8 = 2;

#[derive(Debug, Parser)]
#[command(name = "laminar", version, about = "Run Laminar demonstration flows")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List the available flows
    List,
    /// Show a flow's required context, steps and branches
    Describe {
        /// Flow name, as printed by `list`
        flow: String,
    },
    /// Run a flow and print the resulting context as JSON
    Run {
        /// Flow name, as printed by `list`
        flow: String,
        /// JSON or YAML file holding the initial context
        #[arg(long, short = 'i', value_name = "FILE")]
        input: Option<PathBuf>,
        /// Set a context entry; the value is parsed as JSON when possible
        #[arg(long = "set", short = 's', value_name = "KEY=VALUE")]
        assignments: Vec<String>,
        /// Treat a halt as an error: exit 2 when halted, 1 when failed
        #[arg(long)]
        signaling: bool,
    },
}

fn main() -> Result<ExitCode> {
    init_tracing();
    let cli = Cli::parse();
    let catalog = Catalog::new()?;

    match cli.command {
        Command::List => {
            for demo in catalog.iter() {
                println!("{:<12} {}", demo.name(), demo.summary());
            }
            Ok(ExitCode::SUCCESS)
        }
        Command::Describe { flow } => {
            let demo = lookup(&catalog, &flow)?;
            println!("{}: {}", demo.name(), demo.summary());
            for line in demo.outline() {
                println!("  {line}");
            }
            Ok(ExitCode::SUCCESS)
        }
        Command::Run { flow, input, assignments, signaling } => {
            let demo = lookup(&catalog, &flow)?;
            let context = initial_context(input.as_deref(), &assignments)?;
            run_flow(demo, context, signaling)
        }
    }
}

fn init_tracing() {
    let filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into());
    let _ = tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).try_init();
}

fn lookup<'c>(catalog: &'c Catalog, name: &str) -> Result<&'c DemoFlow> {
    catalog.get(name).ok_or_else(|| {
        let known: Vec<_> = catalog.iter().map(DemoFlow::name).collect();
        anyhow!("unknown flow '{name}' (available: {})", known.join(", "))
    })
}

fn initial_context(path: Option<&std::path::Path>, assignments: &[String]) -> Result<Context> {
    let mut context = match path {
        Some(path) => input::load_context(path)?,
        None => Context::new(),
    };
    for raw in assignments {
        let (key, value) = input::parse_assignment(raw)?;
        debug!(key = %key, "setting context entry from the command line");
        context.insert(key, value);
    }
    Ok(context)
}

fn run_flow(demo: &DemoFlow, context: Context, signaling: bool) -> Result<ExitCode> {
    info!(flow = %demo.name(), entries = context.len(), signaling, "running flow");

    let outcome = if signaling { demo.unit().invoke_signaling(context) } else { demo.unit().invoke(context) };
    let (context, stopped) = match outcome {
        Ok(context) => (context, false),
        Err(FlowError::Stopped(signal)) => {
            info!(flow = %demo.name(), failed = signal.is_failed(), "flow raised a stop signal");
            (signal.into_context(), true)
        }
        Err(err) => return Err(err).with_context(|| format!("flow '{}' did not complete", demo.name())),
    };

    println!("{}", serde_json::to_string_pretty(&context)?);
    Ok(ExitCode::from(exit_status(&context, stopped)))
}

fn exit_status(context: &Context, stopped: bool) -> u8 {
    if context.is_failed() {
        EXIT_FAILED
    } else if stopped {
        EXIT_HALTED
    } else {
        0
    }
}
