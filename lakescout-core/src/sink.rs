//! JSON-lines output for work units.

use crate::error::CrawlError;
use crate::workunit::WorkUnit;
use crate::Result;
use std::path::{Path, PathBuf};
use tokio::io::{AsyncWriteExt, BufWriter};

/// Writes one JSON object per work unit, in stream order.
pub struct JsonLinesSink {
    path: PathBuf,
    writer: BufWriter<tokio::fs::File>,
    written: u64,
}

impl std::fmt::Debug for JsonLinesSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JsonLinesSink")
            .field("path", &self.path)
            .field("written", &self.written)
            .finish_non_exhaustive()
    }
}

impl JsonLinesSink {
    /// Creates (or truncates) the output file.
    pub async fn create(path: &Path) -> Result<Self> {
        let file = tokio::fs::File::create(path)
            .await
            .map_err(|e| CrawlError::io(format!("Failed to create {}", path.display()), e))?;
        Ok(Self {
            path: path.to_path_buf(),
            writer: BufWriter::new(file),
            written: 0,
        })
    }

    /// Appends one work unit as a JSON line.
    pub async fn write(&mut self, unit: &WorkUnit) -> Result<()> {
        let mut line = serde_json::to_vec(unit)
            .map_err(|e| CrawlError::serialization(format!("Failed to serialize {}", unit.id), e))?;
        line.push(b'\n');
        self.writer
            .write_all(&line)
            .await
            .map_err(|e| CrawlError::io(format!("Failed to write to {}", self.path.display()), e))?;
        self.written = self.written.saturating_add(1);
        Ok(())
    }

    /// Flushes buffered output and returns the number of units written.
    pub async fn finish(mut self) -> Result<u64> {
        self.writer
            .flush()
            .await
            .map_err(|e| CrawlError::io(format!("Failed to flush {}", self.path.display()), e))?;
        Ok(self.written)
    }
}
