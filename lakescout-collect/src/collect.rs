//! Scan execution for the collector binary.
//!
//! Builds the scan configuration from a recipe file plus command-line
//! overrides, runs the scanner and streams its work units to a JSON-lines
//! file as they are produced.

use crate::ScanArgs;
use futures::StreamExt;
use lakescout_core::{
    Result, ScanConfig, ScanReport,
    adapters::create_connector,
    error::redact_database_url,
    scanner::ScannerBuilder,
    sink::JsonLinesSink,
    state::FileStateStore,
};
use std::sync::Arc;
use tracing::{error, info};

/// Result of one completed scan.
#[derive(Debug)]
pub struct ScanOutcome {
    /// Lines written to the output file
    pub units_written: u64,
    /// Report of the completed run
    pub report: ScanReport,
}

/// Loads the recipe (or defaults) and applies command-line overrides.
///
/// # Errors
/// Returns error if the recipe cannot be read or the result is invalid
pub async fn build_config(args: &ScanArgs) -> Result<ScanConfig> {
    let mut config = match &args.config {
        Some(path) => {
            info!("Loading scan configuration from {}", path.display());
            ScanConfig::from_file(path).await?
        }
        None => ScanConfig::new(),
    };

    if args.profile {
        let profiling = config.profiling.clone().with_enabled(true);
        config = config.with_profiling(profiling);
    }
    if let Some(instance) = &args.platform_instance {
        config = config.with_platform_instance(instance.clone());
    }
    if let Some(env) = &args.env {
        config = config.with_env(env.clone());
    }
    if args.state_dir.is_some() {
        config.stateful_ingestion.enabled = true;
    }

    config.validate()?;
    Ok(config)
}

/// Scans the source and writes every work unit to `args.output`.
///
/// # Errors
/// Returns error on fatal scan failures (connection, inspector creation,
/// state persistence) or when the output cannot be written
pub async fn run_scan(database_url: &str, args: &ScanArgs) -> Result<ScanOutcome> {
    info!("Starting metadata scan...");
    info!("Target: {}", redact_database_url(database_url));
    info!("Output: {}", args.output.display());

    let config = build_config(args).await?;
    let connector = create_connector(database_url).await.map_err(|e| {
        error!("Failed to create connector: {}", e);
        e
    })?;
    info!("Created {} connector", connector.platform());

    let mut builder = ScannerBuilder::new(connector, config);
    if let Some(dir) = &args.state_dir {
        info!("Run state directory: {}", dir.display());
        builder = builder.with_state_store(Arc::new(FileStateStore::new(dir.clone())));
    }
    let mut scanner = builder.build()?;

    let mut sink = JsonLinesSink::create(&args.output).await?;
    {
        let units = scanner.work_units();
        futures::pin_mut!(units);
        while let Some(unit) = units.next().await {
            let unit = unit.map_err(|e| {
                error!("Scan failed: {}", e);
                e
            })?;
            sink.write(&unit).await?;
        }
    }
    let units_written = sink.finish().await?;

    let report = scanner.into_report();
    if let Some(path) = &args.report {
        crate::output::write_report(&report, path).await?;
        info!("Report saved to {}", path.display());
    }

    Ok(ScanOutcome {
        units_written,
        report,
    })
}

/// Tests the source connection without scanning.
///
/// # Errors
/// Returns error if the connector cannot be created or the test fails
pub async fn test_connection(database_url: &str) -> Result<String> {
    info!("Testing connection to {}", redact_database_url(database_url));

    let connector = create_connector(database_url).await.map_err(|e| {
        error!("Failed to create connector: {}", e);
        e
    })?;
    connector.test_connection().await.map_err(|e| {
        error!("Connection test failed: {}", e);
        e
    })?;

    info!("Connection test successful");
    Ok(connector.platform().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn args() -> ScanArgs {
        ScanArgs {
            config: None,
            output: PathBuf::from(crate::DEFAULT_OUTPUT),
            state_dir: None,
            report: None,
            profile: false,
            platform_instance: None,
            env: None,
        }
    }

    #[tokio::test]
    async fn test_overrides_apply_on_defaults() -> Result<()> {
        let mut args = args();
        args.profile = true;
        args.env = Some("DEV".to_string());
        args.platform_instance = Some("east".to_string());
        args.state_dir = Some(PathBuf::from("state"));

        let config = build_config(&args).await?;
        assert!(config.profiling.enabled);
        assert_eq!(config.env, "DEV");
        assert_eq!(config.platform_instance.as_deref(), Some("east"));
        assert!(config.stateful_ingestion.enabled);
        Ok(())
    }

    #[tokio::test]
    async fn test_empty_env_override_is_rejected() {
        let mut args = args();
        args.env = Some(" ".to_string());
        assert!(build_config(&args).await.is_err());
    }

    #[tokio::test]
    async fn test_recipe_file_is_loaded() -> Result<()> {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("recipe.json");
        std::fs::write(
            &path,
            r#"{"include_views": false, "table_pattern": {"deny": ["main\\.tmp_.*"]}}"#,
        )
        .unwrap();

        let mut args = args();
        args.config = Some(path);
        let config = build_config(&args).await?;
        assert!(!config.include_views);
        assert!(!config.table_pattern.allowed("main.tmp_scratch"));
        assert!(config.table_pattern.allowed("main.orders"));
        Ok(())
    }
}
