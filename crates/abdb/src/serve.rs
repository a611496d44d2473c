// SPDX-FileCopyrightText: 2026 ABDB Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `abdb serve`: newline-delimited JSON over stdin/stdout.
//!
//! Each input line is one request envelope; each output line is one response.
//! Requests are dispatched concurrently, so responses may arrive out of order
//! and callers correlate them by `id`. The coordinator still admits one
//! operation to the connection at a time.

use std::sync::Arc;

use abdb_bridge::Dispatcher;
use abdb_config::BridgeConfig;
use abdb_core::AbdbError;
use abdb_storage::AbDatabase;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, error, info};

/// Serve the bridge on the process's stdin/stdout until stdin closes.
pub async fn run_serve(db: AbDatabase, config: &BridgeConfig) -> Result<(), AbdbError> {
    let dispatcher = Dispatcher::new(Arc::new(db), config);
    let reader = BufReader::new(tokio::io::stdin());
    serve_lines(dispatcher, reader, tokio::io::stdout()).await?;
    Ok(())
}

/// Read requests from `reader` and write responses to `writer`.
///
/// Returns the writer once every in-flight request has been answered.
pub async fn serve_lines<R, W>(dispatcher: Dispatcher, reader: R, writer: W) -> Result<W, AbdbError>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin + Send + 'static,
{
    let (tx, mut rx) = mpsc::channel::<String>(64);

    // Single writer task so response lines never interleave.
    let writer_task = tokio::spawn(async move {
        let mut writer = writer;
        while let Some(line) = rx.recv().await {
            if let Err(e) = write_line(&mut writer, &line).await {
                error!(error = %e, "failed to write response, dropping output");
                break;
            }
        }
        writer
    });

    let mut lines = reader.lines();
    let mut received = 0usize;
    while let Some(line) = lines
        .next_line()
        .await
        .map_err(|e| AbdbError::Internal(format!("reading requests: {e}")))?
    {
        if line.trim().is_empty() {
            continue;
        }
        received += 1;
        let dispatcher = dispatcher.clone();
        let tx = tx.clone();
        tokio::spawn(async move {
            let response = dispatcher.handle_line(&line).await;
            if tx.send(response.to_line()).await.is_err() {
                debug!("response channel closed");
            }
        });
    }

    // The writer drains until every spawned request drops its sender.
    drop(tx);
    info!(requests = received, "input closed, draining responses");

    writer_task
        .await
        .map_err(|e| AbdbError::Internal(format!("response writer: {e}")))
}

async fn write_line<W: AsyncWrite + Unpin>(writer: &mut W, line: &str) -> std::io::Result<()> {
    writer.write_all(line.as_bytes()).await?;
    writer.write_all(b"\n").await?;
    writer.flush().await
}
