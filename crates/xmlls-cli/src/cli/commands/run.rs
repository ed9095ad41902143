//! `xmlls run` - Supervise the server and bridge it to stdio.
//!
//! The editor talks to this process; each server start gets a fresh
//! channel and the editor stream is pumped into whichever server is alive.
//! The editor closing stdin, or Ctrl-C, stops the server.

use anyhow::Result;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, info};
use xmlls::supervisor::ServerChannel;
use xmlls::ServerSupervisor;

use super::Context;
use crate::cli::args::RunArgs;
use crate::config::Config;

const BRIDGE_BUFFER: usize = 16 * 1024;

/// Which side of the bridge went away
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Closed {
    Client,
    Server,
}

/// Outcome of pumping one direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pump {
    ReaderClosed,
    WriterClosed,
}

pub async fn execute(ctx: Context, args: RunArgs) -> Result<()> {
    let (starter, spec) = ctx.prepare(&args.launch).await?;
    info!(command = %spec.command.display(), "starting XML language server");

    let (supervisor, mut handle) = ServerSupervisor::builder(spec)
        .notifier(ctx.notifier())
        .stop_token(ctx.interrupt.child_token())
        .build();
    let stop = handle.stop_token();
    let task = tokio::spawn(supervisor.run());

    let mut stdin = tokio::io::stdin();
    let mut stdout = tokio::io::stdout();
    let mut starts = 0usize;

    while let Some(channel) = handle.next_channel().await {
        starts += 1;
        if starts > 1 {
            // restarts reuse the original launch; settings edits need a new session
            if let Ok(current) = Config::load(&ctx.paths.config_file) {
                starter.java_launcher().check_vmargs_drift(&current.vmargs);
            }
        }

        if bridge(channel, &mut stdin, &mut stdout).await == Closed::Client {
            debug!("client closed the connection");
            stop.cancel();
        }
    }

    task.await??;
    Ok(())
}

/// Pump both directions until one side closes
async fn bridge<I, O>(channel: ServerChannel, client_in: &mut I, client_out: &mut O) -> Closed
where
    I: AsyncRead + Unpin,
    O: AsyncWrite + Unpin,
{
    let ServerChannel {
        mut input,
        mut output,
    } = channel;

    tokio::select! {
        pumped = pump(client_in, &mut input) => match pumped {
            Pump::ReaderClosed => Closed::Client,
            Pump::WriterClosed => Closed::Server,
        },
        pumped = pump(&mut output, client_out) => match pumped {
            Pump::ReaderClosed => Closed::Server,
            Pump::WriterClosed => Closed::Client,
        },
    }
}

/// Copy until EOF or an error, flushing after every read so protocol
/// messages are not held back.
async fn pump<R, W>(reader: &mut R, writer: &mut W) -> Pump
where
    R: AsyncRead + Unpin + ?Sized,
    W: AsyncWrite + Unpin + ?Sized,
{
    let mut buf = vec![0u8; BRIDGE_BUFFER];
    loop {
        let n = match reader.read(&mut buf).await {
            Ok(0) | Err(_) => return Pump::ReaderClosed,
            Ok(n) => n,
        };
        if writer.write_all(&buf[..n]).await.is_err() || writer.flush().await.is_err() {
            return Pump::WriterClosed;
        }
    }
}
