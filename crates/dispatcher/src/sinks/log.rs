//! LogSink - logs a one-line batch summary via tracing

use contracts::{Batch, BatchSink, ContractError};
use tracing::{info, instrument};

/// Sink that logs batch summaries for debugging
pub struct LogSink {
    name: String,
    batches: u64,
    results: u64,
}

impl LogSink {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            batches: 0,
            results: 0,
        }
    }

    fn log_batch_summary<R>(&self, batch: &Batch<R>) {
        info!(
            sink = %self.name,
            subscriber = %batch.subscriber_id,
            frame_seq = batch.frame_seq,
            timestamp = batch.timestamp,
            results = batch.len(),
            "Batch received"
        );
    }
}

impl<R: Send + Sync> BatchSink<R> for LogSink {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "log_sink_write",
        skip(self, batch),
        fields(sink = %self.name, frame_seq = batch.frame_seq)
    )]
    async fn write(&mut self, batch: &Batch<R>) -> Result<(), ContractError> {
        self.log_batch_summary(batch);
        self.batches += 1;
        self.results += batch.len() as u64;
        Ok(())
    }

    #[instrument(name = "log_sink_flush", skip(self))]
    async fn flush(&mut self) -> Result<(), ContractError> {
        Ok(())
    }

    #[instrument(name = "log_sink_close", skip(self))]
    async fn close(&mut self) -> Result<(), ContractError> {
        info!(
            sink = %self.name,
            batches = self.batches,
            results = self.results,
            "LogSink closed"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_log_sink_write() {
        let mut sink = LogSink::new("test_log");
        let batch = Batch {
            subscriber_id: "hud".into(),
            frame_seq: 1,
            timestamp: 16.7,
            results: vec!["a", "b"],
        };

        assert!(sink.write(&batch).await.is_ok());
        assert_eq!(sink.batches, 1);
        assert_eq!(sink.results, 2);
    }

    #[test]
    fn test_log_sink_name() {
        let sink = LogSink::new("my_logger");
        assert_eq!(BatchSink::<()>::name(&sink), "my_logger");
    }
}
