// src/remote/client.rs

use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::errors::{RerunError, Result};
use crate::remote::codec::{decode_payload, read_frame};
use crate::types::ChangeEvent;

/// Connect to `address` and forward every announced path to `changes_tx`.
///
/// Only returns on failure: connection errors, malformed frames, and the
/// remote closing the connection are all reported as errors.
pub async fn run_remote_source(
    address: String,
    changes_tx: mpsc::Sender<ChangeEvent>,
) -> Result<()> {
    let mut stream = TcpStream::connect(&address)
        .await
        .map_err(|e| RerunError::Protocol(format!("connecting to {address}: {e}")))?;

    info!("connected to {address} for remote file events");

    loop {
        let Some(payload) = read_frame(&mut stream).await? else {
            return Err(RerunError::Protocol(format!(
                "connection to {address} closed by remote"
            )));
        };

        let path = decode_payload(&payload)?;
        debug!(%path, "remote file event");

        if changes_tx.send(ChangeEvent::new(path)).await.is_err() {
            debug!("change channel closed; stopping remote source");
            return Ok(());
        }
    }
}
