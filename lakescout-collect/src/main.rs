//! Metadata scan tool.
//!
//! This binary connects to a SQL warehouse, walks its catalog and writes
//! the resulting metadata work units as JSON lines.
//!
//! # Guarantees
//! - Read-only source operations only
//! - No credentials stored or logged
//! - Per-entity problems are reported, never fatal

use clap::Parser;
use lakescout_collect::{Cli, Command, ScanArgs, collect, output};
use lakescout_core::{Result, init_logging};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.global.verbose, cli.global.quiet)?;

    match &cli.command {
        Some(Command::Scan(args)) => scan(&args.database_url, &args.scan).await,
        Some(Command::Test(args)) => {
            let platform = collect::test_connection(&args.database_url).await?;
            println!("Connection to {} source successful", platform);
            Ok(())
        }
        Some(Command::List) => {
            list_supported_sources();
            Ok(())
        }
        None => {
            // Default behavior: scan if a database URL is provided
            if let Some(ref database_url) = cli.database_url {
                scan(database_url, &cli.scan).await
            } else {
                eprintln!("Error: Database URL is required");
                eprintln!("Use --help for usage information");
                std::process::exit(1);
            }
        }
    }
}

async fn scan(database_url: &str, args: &ScanArgs) -> Result<()> {
    let outcome = collect::run_scan(database_url, args).await?;
    info!("{}", outcome.report.summary());
    for line in output::summary_lines(&outcome.report, &args.output, outcome.units_written) {
        println!("{line}");
    }
    Ok(())
}

/// Lists supported sources and their connection string formats
fn list_supported_sources() {
    println!("Supported Sources:");
    println!();

    #[cfg(feature = "sqlite")]
    {
        println!("SQLite:");
        println!("  Connection: sqlite:///path/to/database.db");
        println!("  Example:    sqlite:///home/user/data.db");
        println!("  Example:    /path/to/database.sqlite");
        println!();
    }

    println!("Impala / Hive:");
    println!("  Connection: impala://user@host:21050/database");
    println!("  Available through the library with a HiveServer2 transport");
    println!();

    println!("Output:");
    println!("  .jsonl     - One work unit per line (default {})", lakescout_collect::DEFAULT_OUTPUT);
    println!("  --report   - Scan report as JSON");
    println!("  --state-dir - Run state for stale-entity removal");
}
