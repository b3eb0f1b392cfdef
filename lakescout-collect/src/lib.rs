//! Library module for lakescout-collect
//!
//! This module exposes the command-line surface and the scan driver so they
//! can be exercised from tests. The binary entry point is in main.rs.

pub mod collect;
pub mod output;

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Default output file for work units.
pub const DEFAULT_OUTPUT: &str = "workunits.jsonl";

/// Command-line interface for the collector
#[derive(Debug, Parser)]
#[command(name = "lakescout-collect")]
#[command(about = "Metadata scan tool for SQL warehouses")]
#[command(version)]
#[command(long_about = "
lakescout collector - metadata extraction for SQL warehouses

This tool walks the databases, schemas, tables and views of a source and
writes one JSON work unit per line: containers, dataset snapshots, lineage,
domains, profiles and, with --state-dir, retractions of entities that
disappeared since the previous run.

SUPPORTED SOURCES:
- SQLite (sqlite:// or .db/.sqlite files)
- Impala / Hive (library use with a HiveServer2 transport)

EXAMPLES:
  lakescout-collect --database-url sqlite:///var/data/app.db
  lakescout-collect --config recipe.json --state-dir .lakescout --database-url sqlite:///var/data/app.db
  lakescout-collect scan sqlite:///var/data/app.db -o units.jsonl
  lakescout-collect test sqlite:///var/data/app.db
")]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Subcommand; scans `--database-url` when absent
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Source connection URL
    #[arg(
        long,
        env = "DATABASE_URL",
        help = "Source connection string (credentials are redacted in logs)"
    )]
    pub database_url: Option<String>,

    #[command(flatten)]
    pub scan: ScanArgs,
}

/// Collector subcommands
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Scan a source and write work units
    Scan(ScanCommandArgs),
    /// Test the source connection
    Test(TestArgs),
    /// List supported sources
    List,
}

/// Arguments of `scan`
#[derive(Debug, Args)]
pub struct ScanCommandArgs {
    /// Source connection URL
    #[arg(help = "Source connection string")]
    pub database_url: String,

    #[command(flatten)]
    pub scan: ScanArgs,
}

/// Options shared by the default command and `scan`.
#[derive(Debug, Clone, Args)]
pub struct ScanArgs {
    /// JSON scan recipe
    #[arg(long, value_name = "FILE", help = "Scan configuration file (JSON)")]
    pub config: Option<PathBuf>,

    /// Output file path
    #[arg(
        short,
        long,
        default_value = DEFAULT_OUTPUT,
        help = "Output file for work units (JSON lines)"
    )]
    pub output: PathBuf,

    /// Run state directory
    #[arg(
        long,
        value_name = "DIR",
        help = "Directory for run state; enables stale-entity removal"
    )]
    pub state_dir: Option<PathBuf>,

    /// Report file path
    #[arg(long, value_name = "FILE", help = "Write the scan report as JSON")]
    pub report: Option<PathBuf>,

    /// Enable profiling
    #[arg(long, help = "Profile tables with the source's profiler")]
    pub profile: bool,

    /// Platform instance override
    #[arg(long, help = "Platform instance embedded in identifiers")]
    pub platform_instance: Option<String>,

    /// Environment override
    #[arg(long, help = "Environment embedded in identifiers (default PROD)")]
    pub env: Option<String>,
}

/// Arguments of `test`
#[derive(Debug, Args)]
pub struct TestArgs {
    /// Source connection URL
    #[arg(help = "Source connection string to test")]
    pub database_url: String,
}

/// Flags shared by every command
#[derive(Debug, Args)]
pub struct GlobalArgs {
    /// Increase verbosity
    #[arg(
        short,
        long,
        action = clap::ArgAction::Count,
        help = "Increase verbosity (-v, -vv, -vvv)"
    )]
    pub verbose: u8,

    /// Suppress output
    #[arg(short, long, help = "Suppress all output except errors")]
    pub quiet: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_default_command_arguments() {
        let cli = Cli::try_parse_from([
            "lakescout-collect",
            "--database-url",
            "sqlite::memory:",
            "--state-dir",
            "state",
            "--profile",
            "-vv",
        ])
        .unwrap();

        assert!(cli.command.is_none());
        assert_eq!(cli.database_url.as_deref(), Some("sqlite::memory:"));
        assert_eq!(cli.scan.output, PathBuf::from(DEFAULT_OUTPUT));
        assert_eq!(cli.scan.state_dir, Some(PathBuf::from("state")));
        assert!(cli.scan.profile);
        assert_eq!(cli.global.verbose, 2);
    }

    #[test]
    fn test_scan_subcommand() {
        let cli = Cli::try_parse_from([
            "lakescout-collect",
            "scan",
            "sqlite:///tmp/app.db",
            "-o",
            "out.jsonl",
            "--env",
            "DEV",
        ])
        .unwrap();

        match cli.command {
            Some(Command::Scan(args)) => {
                assert_eq!(args.database_url, "sqlite:///tmp/app.db");
                assert_eq!(args.scan.output, PathBuf::from("out.jsonl"));
                assert_eq!(args.scan.env.as_deref(), Some("DEV"));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_long_about_examples_parse() {
        let about = Cli::command().get_long_about().map(ToString::to_string).unwrap();
        let examples: Vec<&str> = about
            .lines()
            .map(str::trim)
            .filter(|line| line.starts_with("lakescout-collect "))
            .collect();
        assert_eq!(examples.len(), 4);
        for example in examples {
            let args = example.split_whitespace();
            assert!(Cli::try_parse_from(args).is_ok(), "example does not parse: {example}");
        }
    }

    #[test]
    fn test_positional_url_without_subcommand_is_rejected() {
        assert!(Cli::try_parse_from(["lakescout-collect", "sqlite:///var/data/app.db"]).is_err());
    }

    #[test]
    fn test_test_subcommand_requires_url() {
        assert!(Cli::try_parse_from(["lakescout-collect", "test"]).is_err());
    }
}
