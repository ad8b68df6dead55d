//! typewrap - runtime argument and return type checking demonstrations.

use std::io::{self, Write};
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use log::LevelFilter;
use typewrap::demos;

/// Command-line interface for typewrap.
#[derive(Parser, Debug)]
#[command(
    name = "typewrap",
    version,
    about = "Runtime argument and return type checking for dynamically-typed callables",
    long_about = None
)]
struct Cli {
    /// Sets the verbosity level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Parser, Debug)]
enum Commands {
    /// Run a single demonstration
    Demo {
        /// Demonstration name (repeat, log, returns, computed-default, shared-default)
        name: String,
    },

    /// Print the declared signature of every demonstration callable
    Signatures {
        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Derive parameters and types from a Python function definition
    #[cfg(feature = "python")]
    Inspect {
        /// Source containing the definition, e.g. "def f(a: int, *rest: str): pass"
        source: String,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Call a per-call-defaulted method forever, one line per interval
    Ticker {
        /// Milliseconds between calls
        #[arg(short, long, default_value_t = 1000)]
        interval_ms: u64,

        /// Stop after this many calls instead of running until interrupted
        #[arg(short = 'n', long)]
        iterations: Option<u64>,
    },
}

fn setup_logging(level: &str) {
    let log_level = match level.to_lowercase().as_str() {
        "trace" => LevelFilter::Trace,
        "debug" => LevelFilter::Debug,
        "info" => LevelFilter::Info,
        "warn" => LevelFilter::Warn,
        "error" => LevelFilter::Error,
        _ => LevelFilter::Info,
    };

    env_logger::Builder::new()
        .filter_level(log_level)
        .format_timestamp(None)
        .init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(&cli.log_level);

    let Some(command) = cli.command else {
        typewrap::run().context("running demonstrations")?;
        return Ok(());
    };

    let stdout = io::stdout();
    let mut out = stdout.lock();

    match command {
        Commands::Demo { name } => {
            demos::run(&name, &mut out).with_context(|| format!("running demo `{}`", name))?;
        },
        Commands::Signatures { format } => {
            let reports = demos::signatures()?;
            match format.as_str() {
                "json" => writeln!(out, "{}", serde_json::to_string_pretty(&reports)?)?,
                _ => {
                    for report in &reports {
                        writeln!(out, "{}", report.display)?;
                    }
                },
            }
        },
        #[cfg(feature = "python")]
        Commands::Inspect { source, format } => {
            let parsed = typewrap::parser::parse_def(&source).context("parsing definition")?;
            match format.as_str() {
                "json" => writeln!(out, "{}", serde_json::to_string_pretty(&parsed)?)?,
                _ => {
                    writeln!(out, "{}", parsed.describe())?;
                    for param in parsed.parameters.iter() {
                        let ty = parsed
                            .signature
                            .type_of(&param.name)
                            .map(|t| t.to_string())
                            .unwrap_or_else(|| "(untyped)".to_string());
                        writeln!(out, "  {}: {} {}", param.name, param.kind, ty)?;
                    }
                    if let Some(ret) = parsed.signature.returns() {
                        writeln!(out, "  returns {}", ret)?;
                    }
                },
            }
        },
        Commands::Ticker { interval_ms, iterations } => {
            log::info!("ticking every {}ms", interval_ms);
            demos::ticker(&mut out, Duration::from_millis(interval_ms), iterations)?;
        },
    }

    Ok(())
}
