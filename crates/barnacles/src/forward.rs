// SPDX-FileCopyrightText: 2026 Barnacles Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `barnacles run`: forward JSON-lines events from stdin into the store.
//!
//! Each input line is `{"kind": "<raddec|dynamb>", "event": {...}}`. Every
//! event that is persisted is written back to stdout in the same shape, with
//! `_storeId` attached. Logs go to stderr.

use std::sync::Arc;

use serde::Deserialize;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use barnacles_config::model::BarnaclesConfig;
use barnacles_core::{BarnaclesError, Event, StoredEvent};
use barnacles_forwarder::{configured_targets, register_metrics, Dispatch, Forwarder};

use crate::shutdown;

/// One line of input.
#[derive(Debug, Deserialize)]
struct InboundLine {
    kind: String,
    event: serde_json::Value,
}

/// Connect to the store and forward stdin until EOF or a shutdown signal.
pub async fn run_forward(config: BarnaclesConfig) -> Result<(), BarnaclesError> {
    register_metrics();

    let targets = configured_targets(&config)?;
    let connection =
        Arc::new(barnacles_storage::connect(config.connection.clone(), &targets).await);
    let forwarder = Forwarder::new(&config, connection)?;

    let cancel = shutdown::install_signal_handler();
    let stdin = BufReader::new(tokio::io::stdin());
    pump(forwarder, stdin, tokio::io::stdout(), cancel).await?;

    info!("barnacles stopped");
    Ok(())
}

/// Feed `input` lines to `forwarder` and write stored events to `output`.
///
/// Stops reading on EOF, a read error, or cancellation, then drains the
/// write queue and closes the connection. Returns `output` once every
/// re-emitted event has been written.
pub async fn pump<R, W>(
    forwarder: Forwarder,
    input: R,
    output: W,
    cancel: CancellationToken,
) -> Result<W, BarnaclesError>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin + Send + 'static,
{
    let sink = tokio::spawn(write_stored(forwarder.subscribe(), output));

    let mut lines = input.lines();
    loop {
        let line = tokio::select! {
            _ = cancel.cancelled() => {
                info!("shutdown requested, no longer reading input");
                break;
            }
            line = lines.next_line() => line,
        };
        match line {
            Ok(Some(line)) => handle_line(&forwarder, &line),
            Ok(None) => {
                debug!("input closed");
                break;
            }
            Err(e) => {
                error!(error = %e, "failed to read input");
                break;
            }
        }
    }

    let closed = forwarder.shutdown().await;
    // Dropping the forwarder closes the channel, which ends the sink.
    drop(forwarder);
    let output = sink
        .await
        .map_err(|e| BarnaclesError::Internal(format!("output task failed: {e}")))??;
    closed?;
    Ok(output)
}

fn handle_line(forwarder: &Forwarder, line: &str) {
    let line = line.trim();
    if line.is_empty() {
        return;
    }
    match parse_line(line) {
        Ok((kind, event)) => {
            if let Dispatch::Ignored = forwarder.handle_event(&kind, event) {
                debug!(kind = %kind, "event not forwarded");
            }
        }
        Err(e) => warn!(error = %e, "skipping malformed input line"),
    }
}

fn parse_line(line: &str) -> Result<(String, Event), BarnaclesError> {
    let inbound: InboundLine = serde_json::from_str(line)?;
    let event = Event::try_from(inbound.event)?;
    Ok((inbound.kind, event))
}

async fn write_stored<W>(
    mut rx: mpsc::UnboundedReceiver<StoredEvent>,
    mut output: W,
) -> Result<W, BarnaclesError>
where
    W: AsyncWrite + Unpin,
{
    while let Some(stored) = rx.recv().await {
        let mut line = serde_json::to_string(&stored)?;
        line.push('\n');
        output
            .write_all(line.as_bytes())
            .await
            .map_err(|e| BarnaclesError::Internal(format!("failed to write event: {e}")))?;
        output
            .flush()
            .await
            .map_err(|e| BarnaclesError::Internal(format!("failed to flush output: {e}")))?;
    }
    Ok(output)
}
