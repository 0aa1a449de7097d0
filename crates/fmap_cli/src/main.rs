//! fmap CLI: the command-line front end of the multi-FPGA mapping engine.
//!
//! Provides `fmap map` for placing a project's components onto its FPGAs and
//! `fmap check` for validating a project file without placing anything.

#![warn(missing_docs)]

mod check;
mod map;
mod pipeline;

use std::process;

use clap::{Parser, Subcommand, ValueEnum};
use log::LevelFilter;

/// fmap: maps logical designs onto multi-FPGA platforms.
#[derive(Parser, Debug)]
#[command(name = "fmap", version, about = "Multi-FPGA mapping engine")]
pub struct Cli {
    /// Suppress all output except errors.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Enable verbose (debug-level) output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Control colored output.
    #[arg(long, global = true, value_enum, default_value_t = ColorChoice::Auto)]
    pub color: ColorChoice,

    /// Path to a custom `fmap.toml` project file.
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// The subcommand to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Place every component of the project onto an FPGA.
    Map(MapArgs),
    /// Load and validate the project without placing anything.
    Check,
}

/// Arguments for the `fmap map` subcommand.
#[derive(Parser, Debug)]
pub struct MapArgs {
    /// Override `mapping.io_weight` from the project file.
    #[arg(long)]
    pub io_weight: Option<f64>,

    /// Output format for the placement report.
    #[arg(short, long, value_enum, default_value_t = ReportFormat::Text)]
    pub format: ReportFormat,

    /// Succeed even if some groups are left unmapped.
    #[arg(long)]
    pub allow_partial: bool,
}

/// Controls whether colored output is produced.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ColorChoice {
    /// Detect from terminal capabilities.
    Auto,
    /// Always produce colored output.
    Always,
    /// Never produce colored output.
    Never,
}

/// Report output format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    /// Human-readable terminal output.
    Text,
    /// Machine-readable JSON output.
    Json,
}

/// Global settings derived from CLI flags.
pub struct GlobalArgs {
    /// Whether to suppress non-error output.
    pub quiet: bool,
    /// Whether to print verbose/debug information.
    pub verbose: bool,
    /// Whether to use colored output.
    pub color: bool,
    /// Optional path to a custom project file.
    pub config: Option<String>,
}

impl GlobalArgs {
    /// The log level implied by `--quiet` and `--verbose`.
    pub fn log_level(&self) -> LevelFilter {
        if self.quiet {
            LevelFilter::Error
        } else if self.verbose {
            LevelFilter::Debug
        } else {
            LevelFilter::Warn
        }
    }
}

fn main() {
    let cli = Cli::parse();

    let color = match cli.color {
        ColorChoice::Auto => std::env::var("TERM").is_ok() && std::env::var("NO_COLOR").is_err(),
        ColorChoice::Always => true,
        ColorChoice::Never => false,
    };

    let global = GlobalArgs {
        quiet: cli.quiet,
        verbose: cli.verbose,
        color,
        config: cli.config,
    };

    // RUST_LOG still overrides the flag-derived level.
    env_logger::Builder::new()
        .filter_level(global.log_level())
        .parse_default_env()
        .format_timestamp(None)
        .init();

    let result = match cli.command {
        Command::Map(ref args) => map::run(args, &global),
        Command::Check => check::run(&global),
    };

    match result {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("error: {e}");
            process::exit(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn parse_map_default() {
        let cli = Cli::parse_from(["fmap", "map"]);
        match cli.command {
            Command::Map(ref args) => {
                assert!(args.io_weight.is_none());
                assert_eq!(args.format, ReportFormat::Text);
                assert!(!args.allow_partial);
            }
            _ => panic!("expected Map command"),
        }
    }

    #[test]
    fn parse_map_with_args() {
        let cli = Cli::parse_from([
            "fmap",
            "map",
            "--io-weight",
            "0.8",
            "--format",
            "json",
            "--allow-partial",
        ]);
        match cli.command {
            Command::Map(ref args) => {
                assert_eq!(args.io_weight, Some(0.8));
                assert_eq!(args.format, ReportFormat::Json);
                assert!(args.allow_partial);
            }
            _ => panic!("expected Map command"),
        }
    }

    #[test]
    fn parse_check() {
        let cli = Cli::parse_from(["fmap", "check"]);
        assert!(matches!(cli.command, Command::Check));
    }

    #[test]
    fn parse_global_flags() {
        let cli = Cli::parse_from(["fmap", "--quiet", "--color", "never", "map"]);
        assert!(cli.quiet);
        assert!(!cli.verbose);
        assert_eq!(cli.color, ColorChoice::Never);
    }

    #[test]
    fn parse_config_path() {
        let cli = Cli::parse_from(["fmap", "--config", "/path/to/fmap.toml", "check"]);
        assert_eq!(cli.config.as_deref(), Some("/path/to/fmap.toml"));
    }

    #[test]
    fn log_level_follows_flags() {
        let mut global = GlobalArgs {
            quiet: false,
            verbose: false,
            color: false,
            config: None,
        };
        assert_eq!(global.log_level(), LevelFilter::Warn);
        global.verbose = true;
        assert_eq!(global.log_level(), LevelFilter::Debug);
        global.quiet = true;
        assert_eq!(global.log_level(), LevelFilter::Error);
    }
}
