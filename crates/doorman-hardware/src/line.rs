//! Channel-backed console line source.
//!
//! [`ChannelLineSource`] receives complete lines through a bounded channel.
//! Tests feed it through a [`LineSender`]; the binary feeds it from standard
//! input with [`stdin`].

use std::collections::VecDeque;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::error::{HardwareError, Result};
use crate::traits::LineSource;

/// Line source fed by a channel of complete lines.
#[derive(Debug)]
pub struct ChannelLineSource {
    /// Complete lines not yet consumed
    lines_rx: mpsc::Receiver<String>,

    /// Characters of a line partially consumed through `poll`
    pending: VecDeque<char>,
}

impl ChannelLineSource {
    /// Create a line source and the sender that feeds it.
    pub fn channel(buffer: usize) -> (Self, LineSender) {
        let (lines_tx, lines_rx) = mpsc::channel(buffer);

        let source = Self {
            lines_rx,
            pending: VecDeque::new(),
        };

        (source, LineSender { lines_tx })
    }
}

impl LineSource for ChannelLineSource {
    async fn read_line(&mut self) -> Result<Option<String>> {
        if !self.pending.is_empty() {
            let mut line = String::new();
            while let Some(c) = self.pending.pop_front() {
                if c == '\n' {
                    break;
                }
                line.push(c);
            }
            return Ok(Some(line));
        }

        Ok(self.lines_rx.recv().await)
    }

    fn poll(&mut self) -> Option<char> {
        if self.pending.is_empty() {
            let line = self.lines_rx.try_recv().ok()?;
            self.pending.extend(line.chars());
            self.pending.push_back('\n');
        }
        self.pending.pop_front()
    }
}

/// Sending half of a [`ChannelLineSource`].
#[derive(Debug, Clone)]
pub struct LineSender {
    lines_tx: mpsc::Sender<String>,
}

impl LineSender {
    /// Deliver one line. A trailing `"\r"` is stripped.
    ///
    /// # Errors
    ///
    /// Returns `HardwareError::Disconnected` if the line source was dropped.
    pub async fn send(&self, line: impl Into<String>) -> Result<()> {
        let mut line = line.into();
        if line.ends_with('\r') {
            line.pop();
        }
        self.lines_tx
            .send(line)
            .await
            .map_err(|_| HardwareError::disconnected("console line source"))
    }
}

/// Line source reading the process's standard input.
///
/// A background task forwards each input line; the source reports end of input
/// when stdin closes or fails.
pub fn stdin() -> ChannelLineSource {
    let (source, sender) = ChannelLineSource::channel(32);

    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => {
                    if sender.send(line).await.is_err() {
                        break;
                    }
                }
                Ok(None) => {
                    debug!("Standard input closed");
                    break;
                }
                Err(e) => {
                    warn!("Failed to read standard input: {}", e);
                    break;
                }
            }
        }
    });

    source
}
