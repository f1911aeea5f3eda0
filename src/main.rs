//! idatest CLI
//!
//! Runs the built-in core suite against the host runtime and exits with the
//! run's result code.

use anyhow::{bail, Context};
use clap::Parser;
use idatest::console::init_tracing;
use idatest::suites::register_core_suite;
use idatest::{LogLevel, RunContext, StdConsole, TestConfig, VERSION};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "idatest")]
#[command(
    author,
    version,
    about = "In-process async test harness for an embedded scripting runtime",
    long_about = None
)]
struct Cli {
    /// JSON config file (camelCase keys)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Per-test bound in milliseconds
    #[arg(long, value_name = "MS")]
    timeout_ms: Option<u64>,

    /// Only run tests whose full name contains PAT
    #[arg(short, long, value_name = "PAT")]
    filter: Option<String>,

    /// Console threshold: 0 debug, 1 info, 2 warning, 3 error, 4 none
    #[arg(long, value_name = "N")]
    log_level: Option<u8>,

    /// Verbose diagnostics (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Print per-test durations in the report
    #[arg(long)]
    verbose_report: bool,

    /// List test names instead of running them
    #[arg(long)]
    list: bool,
}

impl Cli {
    /// The config file, if any, overlaid with command-line flags
    fn load_config(&self) -> anyhow::Result<TestConfig> {
        let mut config = match &self.config {
            Some(path) => TestConfig::from_file(path)
                .with_context(|| format!("failed to load config from {}", path.display()))?,
            None => TestConfig::default(),
        };
        if let Some(timeout_ms) = self.timeout_ms {
            config.timeout_ms = timeout_ms;
        }
        if let Some(filter) = &self.filter {
            config.filter = Some(filter.clone());
        }
        if let Some(level) = self.log_level {
            if LogLevel::from_number(level).is_none() {
                bail!("--log-level must be between 0 and 4, got {}", level);
            }
            config.log_level = level;
        }
        if self.verbose_report {
            config.verbose = true;
        }
        Ok(config)
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = cli.load_config()?;
    tracing::debug!(?config, version = VERSION, "configuration loaded");

    let console = StdConsole::new(config.console_level());
    let mut ctx = RunContext::new().with_config(config).with_console(console);
    register_core_suite(&mut ctx).context("failed to register the core suite")?;

    if cli.list {
        for test in ctx.registry().tests() {
            println!("{}", test.full_name);
        }
        return Ok(());
    }

    let report = ctx.run_blocking().context("failed to start the event loop")?;
    std::process::exit(report.exit_code());
}
