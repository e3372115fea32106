// src/exec/capture.rs

use std::io;
use std::process::ExitStatus;

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Child;
use tracing::debug;

enum Pipe {
    Stdout,
    Stderr,
}

/// Wait for `child` while collecting stdout and stderr into one buffer, in
/// the order the chunks arrive.
///
/// The child must have been spawned with both streams piped.
pub async fn combined_output(mut child: Child) -> io::Result<(ExitStatus, String)> {
    let mut stdout = child.stdout.take();
    let mut stderr = child.stderr.take();
    let mut combined = Vec::new();
    let mut out_buf = [0u8; 4096];
    let mut err_buf = [0u8; 4096];

    while stdout.is_some() || stderr.is_some() {
        let (pipe, res) = tokio::select! {
            res = read_chunk(&mut stdout, &mut out_buf) => (Pipe::Stdout, res),
            res = read_chunk(&mut stderr, &mut err_buf) => (Pipe::Stderr, res),
        };

        match pipe {
            Pipe::Stdout => absorb(res, &mut stdout, &out_buf, &mut combined),
            Pipe::Stderr => absorb(res, &mut stderr, &err_buf, &mut combined),
        }
    }

    let status = child.wait().await?;
    Ok((status, String::from_utf8_lossy(&combined).into_owned()))
}

async fn read_chunk<R: AsyncRead + Unpin>(
    reader: &mut Option<R>,
    buf: &mut [u8],
) -> io::Result<usize> {
    match reader {
        Some(r) => r.read(buf).await,
        None => std::future::pending().await,
    }
}

fn absorb<R>(res: io::Result<usize>, reader: &mut Option<R>, buf: &[u8], combined: &mut Vec<u8>) {
    match res {
        Ok(0) => *reader = None,
        Ok(n) => combined.extend_from_slice(&buf[..n]),
        Err(e) => {
            debug!(error = %e, "reading child output failed; closing stream");
            *reader = None;
        }
    }
}
