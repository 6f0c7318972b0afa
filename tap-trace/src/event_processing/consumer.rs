//! Consumer loop: polls the event channel and renders one line per record.
//!
//! Stateless beyond the channel and the sink; each record is rendered
//! independently. The loop only ends when the poll fails (fatal, propagated
//! as the process's terminal error) or when the caller cancels the future.

use std::io::Write;
use std::time::Duration;

use crate::errors::{Result, TapTraceError};
use crate::event_processing::channel::{EventChannel, POLL_TIMEOUT};
use crate::LineFormatter;

pub struct ConsumerLoop<C, W> {
    channel: C,
    sink: W,
    formatter: LineFormatter,
}

impl<C: EventChannel, W: Write> ConsumerLoop<C, W> {
    pub fn new(channel: C, sink: W) -> Self {
        Self {
            channel,
            sink,
            formatter: LineFormatter::new(),
        }
    }

    /// One poll cycle with the default bounded wait. Returns the number of
    /// records rendered.
    pub async fn poll_once(&mut self) -> Result<usize> {
        self.poll_with(POLL_TIMEOUT).await
    }

    pub async fn poll_with(&mut self, timeout: Duration) -> Result<usize> {
        let records = self.channel.poll(timeout).await?;
        let count = records.len();
        for record in records {
            writeln!(self.sink, "{}", self.formatter.format_event(&record))
                .map_err(|source| TapTraceError::OutputSinkFailed { source })?;
        }
        Ok(count)
    }

    /// Polls until the future is cancelled from outside or a poll fails.
    pub async fn run(&mut self) -> Result<()> {
        loop {
            self.poll_once().await?;
        }
    }
}
