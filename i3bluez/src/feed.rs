/*!
 * Status Feed
 * Runs the status command and hands its decoded lines to the merger
 */

use std::process::Stdio;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::error::{BarError, Result};
use crate::item::{batch_from_line, StatusItem};

pub type Batch = Vec<StatusItem>;

pub struct StatusFeed;

impl StatusFeed {
    /// Start `command -c <config_path>` and pump its stdout into `tx` on a
    /// background task. Failing to start the command is reported here; the
    /// task itself only ends when the command's output closes or the
    /// receiving side goes away.
    pub fn spawn(
        command: &str,
        config_path: &str,
        tx: mpsc::Sender<Batch>,
    ) -> Result<JoinHandle<Result<()>>> {
        let mut child = Command::new(command)
            .arg("-c")
            .arg(config_path)
            .stdout(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| BarError::Spawn {
                command: command.to_string(),
                source,
            })?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| BarError::NoStdout(command.to_string()))?;

        tracing::info!("Started {} -c {} (pid {:?})", command, config_path, child.id());

        Ok(tokio::spawn(async move {
            let result = pump(BufReader::new(stdout), tx).await;
            // the child is killed once this drops
            drop(child);
            result
        }))
    }
}

/// Read `reader` line by line, sending one batch per line.
///
/// A line that cannot be read or decoded is sent as a single error item.
/// Sending waits while a previous batch is still unconsumed.
pub async fn pump<R>(reader: R, tx: mpsc::Sender<Batch>) -> Result<()>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();

    loop {
        let batch = match lines.next_line().await {
            Ok(Some(line)) => batch_from_line(&line),
            Ok(None) => return Err(BarError::FeedClosed),
            Err(e) => {
                tracing::warn!("Failed to read status line: {}", e);
                vec![StatusItem::error()]
            }
        };

        if tx.send(batch).await.is_err() {
            tracing::debug!("Merger stopped, ending status feed");
            return Ok(());
        }
    }
}
