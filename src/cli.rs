// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, ValueEnum};

use crate::config::loader::DEFAULT_CONFIG_FILE;

/// Command-line arguments for `stevedore`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "stevedore",
    version,
    about = "Build and run container tasks in dependency order, skipping what is up to date.",
    long_about = None
)]
pub struct CliArgs {
    /// Tasks to run, as `resource[:action]`.
    ///
    /// If omitted, `[meta].default` from the config file is used.
    #[arg(value_name = "TASKS")]
    pub tasks: Vec<String>,

    /// Path to the config file (TOML).
    #[arg(long, short = 'f', value_name = "PATH", default_value = DEFAULT_CONFIG_FILE)]
    pub config: String,

    /// Only log warnings and errors; task starts are logged at debug level.
    #[arg(long, short = 'q')]
    pub quiet: bool,

    /// Copy mounted directories into containers instead of bind mounting
    /// them.
    #[arg(long, env = "STEVEDORE_NO_BIND_MOUNT")]
    pub no_bind_mount: bool,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `STEVEDORE_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Print the tasks that would run, in order, without running them.
    #[arg(long)]
    pub dry_run: bool,

    /// List the resources in the config file and exit.
    #[arg(long, conflicts_with_all = ["dry_run", "graph"])]
    pub list: bool,

    /// With `--list`, only show resources annotated with this tag.
    /// May be repeated.
    #[arg(long = "tag", value_name = "TAG", requires = "list")]
    pub tags: Vec<String>,

    /// Print the collected tasks as a Graphviz DOT graph and exit.
    #[arg(long, conflicts_with = "dry_run")]
    pub graph: bool,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
