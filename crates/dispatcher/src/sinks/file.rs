//! FileSink - appends batches to a JSON-lines file

use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use contracts::{Batch, BatchSink, ContractError};
use serde::Serialize;
use tracing::{debug, error, instrument};

/// Configuration for FileSink
#[derive(Debug, Clone)]
pub struct FileSinkConfig {
    /// Output directory
    pub base_path: PathBuf,
    /// File name inside `base_path`; defaults to `<sink name>.jsonl`
    pub file_name: Option<String>,
}

impl FileSinkConfig {
    /// Read `base_path` and the optional `file_name` from a params map.
    ///
    /// # Errors
    /// `ConfigValidation` when `base_path` is missing or empty.
    pub fn from_params(params: &HashMap<String, String>) -> Result<Self, ContractError> {
        let base_path = params
            .get("base_path")
            .filter(|p| !p.trim().is_empty())
            .map(PathBuf::from)
            .ok_or_else(|| {
                ContractError::config_validation("params.base_path", "file sink requires base_path")
            })?;

        Ok(Self {
            base_path,
            file_name: params.get("file_name").cloned(),
        })
    }
}

/// Sink that writes one JSON object per batch, one batch per line
#[derive(Debug)]
pub struct FileSink {
    name: String,
    path: PathBuf,
    writer: BufWriter<File>,
    lines: u64,
}

impl FileSink {
    /// Create the output directory and open the file for appending.
    pub fn new(name: impl Into<String>, config: FileSinkConfig) -> std::io::Result<Self> {
        let name = name.into();
        fs::create_dir_all(&config.base_path)?;

        let file_name = config
            .file_name
            .unwrap_or_else(|| format!("{name}.jsonl"));
        let path = config.base_path.join(file_name);
        let file = OpenOptions::new().create(true).append(true).open(&path)?;

        debug!(sink = %name, path = %path.display(), "FileSink opened");

        Ok(Self {
            name,
            path,
            writer: BufWriter::new(file),
            lines: 0,
        })
    }

    /// Create from a subscriber's params map
    pub fn from_params(
        name: impl Into<String>,
        params: &HashMap<String, String>,
    ) -> Result<Self, ContractError> {
        let config = FileSinkConfig::from_params(params)?;
        Ok(Self::new(name, config)?)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn append_line<R: Serialize>(&mut self, batch: &Batch<R>) -> std::io::Result<()> {
        serde_json::to_writer(&mut self.writer, batch)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        self.writer.write_all(b"\n")?;
        self.lines += 1;
        Ok(())
    }

    fn persist_batch<R: Serialize>(&mut self, batch: &Batch<R>) -> Result<(), ContractError> {
        self.append_line(batch).map_err(|e| {
            error!(sink = %self.name, frame_seq = batch.frame_seq, error = %e, "Write failed");
            ContractError::sink_write(&self.name, e.to_string())
        })
    }
}

impl<R: Serialize + Send + Sync> BatchSink<R> for FileSink {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "file_sink_write",
        skip(self, batch),
        fields(sink = %self.name, frame_seq = batch.frame_seq)
    )]
    async fn write(&mut self, batch: &Batch<R>) -> Result<(), ContractError> {
        self.persist_batch(batch)
    }

    #[instrument(name = "file_sink_flush", skip(self))]
    async fn flush(&mut self) -> Result<(), ContractError> {
        self.writer
            .flush()
            .map_err(|e| ContractError::sink_write(&self.name, e.to_string()))
    }

    #[instrument(name = "file_sink_close", skip(self))]
    async fn close(&mut self) -> Result<(), ContractError> {
        debug!(sink = %self.name, lines = self.lines, "FileSink closed");
        Ok(())
    }
}
