/*!
 * Frame Merger
 * Joins each status batch with the current device list and writes the i3bar stream
 */

use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::bluetooth::{self, DeviceBus, DeviceRecord};
use crate::error::{BarError, Result};
use crate::feed::Batch;
use crate::item::StatusItem;

/// Protocol header followed by the opening of the endless frame array.
pub const PREAMBLE: &str = "{\"version\":1}\n[\n";

pub async fn write_preamble<W: AsyncWrite + Unpin>(out: &mut W) -> Result<()> {
    out.write_all(PREAMBLE.as_bytes()).await?;
    out.flush().await?;
    Ok(())
}

/// Device items first, then the status command's items with colours filled in.
pub fn assemble(devices: Vec<DeviceRecord>, mut batch: Batch) -> Vec<StatusItem> {
    for item in &mut batch {
        item.normalize_color();
    }

    devices
        .into_iter()
        .map(StatusItem::from)
        .chain(batch)
        .collect()
}

pub struct Merger<B, W> {
    bus: B,
    out: W,
    first: bool,
}

impl<B: DeviceBus, W: AsyncWrite + Unpin> Merger<B, W> {
    pub fn new(bus: B, out: W) -> Self {
        Self {
            bus,
            out,
            first: true,
        }
    }

    /// One iteration: poll devices once and emit one frame for `batch`.
    pub async fn step(&mut self, batch: Batch) -> Result<()> {
        let devices = bluetooth::poll(&self.bus).await?;
        let frame = assemble(devices, batch);
        let json = serde_json::to_string(&frame)?;

        tracing::debug!("Emitting frame with {} items", frame.len());
        self.emit(&json).await
    }

    async fn emit(&mut self, json: &str) -> Result<()> {
        let mut line = String::with_capacity(json.len() + 2);
        if !self.first {
            line.push(',');
        }
        line.push_str(json);
        line.push('\n');

        self.out.write_all(line.as_bytes()).await?;
        self.out.flush().await?;
        self.first = false;
        Ok(())
    }

    /// Emit a frame for every batch until the feed goes away.
    pub async fn run(mut self, mut rx: mpsc::Receiver<Batch>) -> Result<()> {
        while let Some(batch) = rx.recv().await {
            self.step(batch).await?;
        }
        Err(BarError::FeedClosed)
    }

    /// Like [`Merger::run`], but once the feed closes every batch it managed
    /// to send has been emitted, and a panicked feed task is reported.
    pub async fn run_with_feed(self, rx: mpsc::Receiver<Batch>, feed: JoinHandle<Result<()>>) -> Result<()> {
        let result = self.run(rx).await;

        // a closed channel means the feed task is already on its way out
        if matches!(result, Err(BarError::FeedClosed)) {
            if let Err(e) = feed.await {
                return Err(BarError::FeedTask(e.to_string()));
            }
        }
        result
    }
}
