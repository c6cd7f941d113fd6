//! Command-line arguments
//!
//! Global flags only; the sectioned settings live in the TOML file and
//! CLI values override it after loading.

use clap::{ArgAction, Parser};
use std::path::PathBuf;

#[derive(Parser, Debug, Clone, Default)]
#[command(name = "repopulse")]
#[command(about = "Synchronizes Git hosting organizations into an analyzed commit store")]
#[command(version)]
pub struct Args {
    /// Configuration file path
    #[arg(short = 'c', long = "config-file", value_name = "FILE")]
    pub config_file: Option<PathBuf>,

    /// Log level
    #[arg(short = 'l', long = "log-level", value_name = "LEVEL", value_parser = ["trace", "debug", "info", "warn", "error", "off"])]
    pub log_level: Option<String>,

    /// Log output format
    #[arg(short = 'o', long = "log-format", value_name = "FORMAT", value_parser = ["text", "ext", "json"])]
    pub log_format: Option<String>,

    /// Log file path
    #[arg(short = 'f', long = "log-file", value_name = "FILE")]
    pub log_file: Option<PathBuf>,

    /// Force color output
    #[arg(long = "color", conflicts_with = "no_color")]
    pub color: bool,

    /// Disable color output
    #[arg(long = "no-color")]
    pub no_color: bool,

    /// Organization to synchronize (repeatable; default: every
    /// organization visible to the token)
    #[arg(short = 'O', long = "org", value_name = "NAME", action = ArgAction::Append)]
    pub organizations: Vec<String>,

    /// Synchronize a single repository (requires exactly one --org)
    #[arg(short = 'r', long = "repo", value_name = "NAME")]
    pub repository: Option<String>,

    /// Reference date: commits and activity older than this are skipped
    /// (RFC 3339, or YYYY-MM-DD for midnight UTC)
    #[arg(short = 'S', long = "since", value_name = "DATE_TIME")]
    pub since: Option<String>,

    /// Analysis concurrency ceiling override
    #[arg(long = "queue-concurrency", value_name = "COUNT")]
    pub queue_concurrency: Option<usize>,
}
