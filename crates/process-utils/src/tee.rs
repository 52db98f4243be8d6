//! Run a child while mirroring its output and keeping a combined copy.

use std::io;
use std::process::{ExitStatus, Stdio};

use parking_lot::Mutex;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::process::Command;
use tracing::debug;

const READ_CHUNK: usize = 8 * 1024;

/// Result of a teed child run.
#[derive(Debug)]
pub struct TeedOutput {
    pub status: ExitStatus,
    /// Stdout and stderr bytes in the order they were read.
    pub combined: Vec<u8>,
}

/// Spawn `cmd`, forward its stdout/stderr live to ours and capture both.
pub async fn run_teed(cmd: Command) -> io::Result<TeedOutput> {
    run_teed_into(cmd, tokio::io::stdout(), tokio::io::stderr()).await
}

/// Like [`run_teed`] but mirrors into the given writers.
///
/// A failing mirror writer does not stop the capture; the child keeps
/// running and its output is still recorded.
pub async fn run_teed_into<O, E>(mut cmd: Command, out: O, err: E) -> io::Result<TeedOutput>
where
    O: AsyncWrite + Unpin,
    E: AsyncWrite + Unpin,
{
    cmd.stdin(Stdio::inherit())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    let mut child = cmd.spawn()?;
    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| io::Error::other("child stdout was not piped"))?;
    let stderr = child
        .stderr
        .take()
        .ok_or_else(|| io::Error::other("child stderr was not piped"))?;

    let combined = Mutex::new(Vec::new());

    let (status, out_res, err_res) = tokio::join!(
        child.wait(),
        pump(stdout, out, &combined),
        pump(stderr, err, &combined),
    );
    out_res?;
    err_res?;

    Ok(TeedOutput {
        status: status?,
        combined: combined.into_inner(),
    })
}

async fn pump<R, W>(mut reader: R, mut mirror: W, sink: &Mutex<Vec<u8>>) -> io::Result<()>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut buf = vec![0u8; READ_CHUNK];
    let mut mirror_ok = true;

    loop {
        let n = reader.read(&mut buf).await?;
        if n == 0 {
            break;
        }

        sink.lock().extend_from_slice(&buf[..n]);

        if mirror_ok {
            let written = async {
                mirror.write_all(&buf[..n]).await?;
                mirror.flush().await
            }
            .await;
            if let Err(e) = written {
                debug!(error = %e, "Mirror stream closed, capturing only");
                mirror_ok = false;
            }
        }
    }

    Ok(())
}
