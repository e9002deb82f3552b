//! TCP transport for the client.
//!
//! Provides [`ConnectedClient`] which handles line I/O for one connection.
//! This is a thin layer that reads, decodes and writes lines; game logic
//! stays in the pure turn state machine.
//!
//! Two tasks run per connection:
//! - the receive loop, blocked on reads, decoding every line and ending with
//!   exactly one [`ConnectionEvent::Disconnected`]
//! - the writer, draining the command queue in call order so writes never
//!   interleave

use std::{io, time::Duration};

use numbomb_proto::{OutboundCommand, decode, encode_line};
use tokio::{
    io::{
        AsyncBufRead, AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt,
        BufReader,
    },
    net::TcpStream,
    sync::mpsc,
    task::JoinHandle,
};

use crate::{ConnectionEvent, DisconnectReason, TransportConfig, TransportError};

/// Longest accepted server line, terminator excluded. A longer line ends the
/// connection with [`DisconnectReason::ReadFailed`].
pub const MAX_LINE_BYTES: usize = 8 * 1024;

/// How long [`ConnectedClient::close`] waits for queued commands to drain
/// before abandoning them.
pub const CLOSE_FLUSH_TIMEOUT: Duration = Duration::from_secs(2);

/// Handle to a connected client.
///
/// `JOIN` has already been written by the time a handle exists. Commands go
/// out through [`ConnectedClient::send`]; server lines come back through
/// [`ConnectedClient::recv`].
pub struct ConnectedClient {
    player: String,
    /// Queue drained by the writer task.
    to_server: mpsc::UnboundedSender<OutboundCommand>,
    /// Output of the receive loop.
    from_server: mpsc::UnboundedReceiver<ConnectionEvent>,
    /// Stops the receive loop. Shared with the writer, which uses it to
    /// report write failures.
    shutdown: mpsc::Sender<DisconnectReason>,
    reader: JoinHandle<()>,
    writer: JoinHandle<()>,
}

impl ConnectedClient {
    /// Player name announced in `JOIN`.
    pub fn player(&self) -> &str {
        &self.player
    }

    /// Queue a command for transmission.
    ///
    /// Returns immediately; the writer task performs the blocking write.
    /// Commands reach the server in the order they were queued.
    pub fn send(&self, command: OutboundCommand) -> Result<(), TransportError> {
        self.to_server.send(command).map_err(|_| TransportError::Closed)
    }

    /// Next item of the receive sequence.
    ///
    /// Returns `None` once the terminal [`ConnectionEvent::Disconnected`] has
    /// been consumed.
    pub async fn recv(&mut self) -> Option<ConnectionEvent> {
        self.from_server.recv().await
    }

    /// Close the connection.
    ///
    /// In order: stop the receive loop from waiting for input, release the
    /// write path (queued commands are flushed first), release the read path.
    /// The socket closes once both halves are dropped. Failures are logged,
    /// never returned.
    ///
    /// Flushing is bounded by [`CLOSE_FLUSH_TIMEOUT`]. A peer that stops
    /// reading leaves the writer blocked; it is aborted and the remaining
    /// commands are dropped.
    pub async fn close(self) {
        let Self { player, to_server, from_server, shutdown, reader, mut writer } = self;

        if shutdown.try_send(DisconnectReason::LocalClose).is_err() {
            tracing::debug!(%player, "receive loop already stopping");
        }

        drop(to_server);
        match tokio::time::timeout(CLOSE_FLUSH_TIMEOUT, &mut writer).await {
            Ok(Ok(())) => {},
            Ok(Err(e)) => tracing::warn!(%player, error = %e, "writer task failed during close"),
            Err(_) => {
                tracing::warn!(%player, "peer not reading; dropping unsent commands");
                writer.abort();
                // Cancellation is the expected outcome.
                let _ = writer.await;
            },
        }

        drop(from_server);
        if let Err(e) = reader.await {
            tracing::warn!(%player, error = %e, "reader task failed during close");
        }

        tracing::debug!(%player, "connection closed");
    }
}

/// Connect to a server with the default configuration.
pub async fn connect(server_addr: &str, player: &str) -> Result<ConnectedClient, TransportError> {
    connect_with_config(server_addr, player, &TransportConfig::default()).await
}

/// Connect to a server and announce `player`.
///
/// Fails once on any transport-level error; never retries.
pub async fn connect_with_config(
    server_addr: &str,
    player: &str,
    config: &TransportConfig,
) -> Result<ConnectedClient, TransportError> {
    let stream = tokio::time::timeout(config.connect_timeout, TcpStream::connect(server_addr))
        .await
        .map_err(|_| TransportError::Timeout {
            addr: server_addr.to_string(),
            after: config.connect_timeout,
        })?
        .map_err(|source| TransportError::Connect { addr: server_addr.to_string(), source })?;

    if let Err(e) = stream.set_nodelay(true) {
        tracing::debug!(error = %e, "failed to disable Nagle");
    }

    tracing::info!(server = %server_addr, %player, "connected");
    attach(stream, player).await
}

/// Run the protocol over an already-open byte stream.
///
/// Writes `JOIN:<player>` before returning, so a returned handle always means
/// the server has been sent our name.
pub async fn attach<S>(stream: S, player: &str) -> Result<ConnectedClient, TransportError>
where
    S: AsyncRead + AsyncWrite + Send + 'static,
{
    let (read_half, mut write_half) = tokio::io::split(stream);
    write_command(&mut write_half, &OutboundCommand::join(player)).await?;

    let (to_server_tx, to_server_rx) = mpsc::unbounded_channel();
    let (from_server_tx, from_server_rx) = mpsc::unbounded_channel();
    let (shutdown_tx, shutdown_rx) = mpsc::channel(1);

    let reader =
        tokio::spawn(run_reader(read_half, player.to_string(), from_server_tx, shutdown_rx));
    let writer = tokio::spawn(run_writer(write_half, to_server_rx, shutdown_tx.clone()));

    Ok(ConnectedClient {
        player: player.to_string(),
        to_server: to_server_tx,
        from_server: from_server_rx,
        shutdown: shutdown_tx,
        reader,
        writer,
    })
}

/// Receive loop: read, decode, forward, then report the disconnect once.
async fn run_reader<R>(
    read_half: R,
    player: String,
    events: mpsc::UnboundedSender<ConnectionEvent>,
    mut shutdown: mpsc::Receiver<DisconnectReason>,
) where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(read_half);
    // Kept across iterations: `read_line` may be cancelled mid-line by the
    // shutdown branch, and partial bytes stay in the buffer.
    let mut buf = Vec::new();

    let reason = loop {
        tokio::select! {
            biased;

            reason = shutdown.recv() => break reason.unwrap_or(DisconnectReason::LocalClose),

            read = read_line(&mut reader, &mut buf) => match read {
                Ok(0) => break DisconnectReason::PeerClosed,
                Ok(_) => {
                    let raw = line_text(&buf);
                    buf.clear();

                    tracing::debug!(line = %raw, "server line");
                    let event = decode(&raw, &player);
                    if events.send(ConnectionEvent::Line { raw, event }).is_err() {
                        break DisconnectReason::LocalClose;
                    }
                },
                Err(e) => break DisconnectReason::ReadFailed(e.to_string()),
            },
        }
    };

    tracing::info!(%player, %reason, "disconnected");
    // The receiver may already be gone during local close.
    let _ = events.send(ConnectionEvent::Disconnected { reason });
}

/// Read up to and including the next `\n`, appending to `buf`.
///
/// Fails with `InvalidData` once `buf` holds more than [`MAX_LINE_BYTES`]
/// without a terminator. Returns `Ok(0)` at end of stream.
async fn read_line<R>(reader: &mut R, buf: &mut Vec<u8>) -> io::Result<usize>
where
    R: AsyncBufRead + Unpin,
{
    // At most one byte past the limit, enough to tell an overlong line apart.
    let limit = (MAX_LINE_BYTES + 1).saturating_sub(buf.len());
    let read = reader.take(limit as u64).read_until(b'\n', buf).await?;

    if buf.len() > MAX_LINE_BYTES && !buf.ends_with(b"\n") {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("line exceeds {MAX_LINE_BYTES} bytes"),
        ));
    }
    Ok(read)
}

/// Writer: the only code that writes after `JOIN`.
async fn run_writer<W>(
    mut write_half: W,
    mut commands: mpsc::UnboundedReceiver<OutboundCommand>,
    shutdown: mpsc::Sender<DisconnectReason>,
) where
    W: AsyncWrite + Unpin,
{
    while let Some(command) = commands.recv().await {
        if let Err(e) = write_command(&mut write_half, &command).await {
            tracing::warn!(%command, error = %e, "write failed");
            let _ = shutdown.try_send(DisconnectReason::WriteFailed(e.to_string()));
            return;
        }
    }

    if let Err(e) = write_half.shutdown().await {
        tracing::debug!(error = %e, "write shutdown failed");
    }
}

async fn write_command<W>(writer: &mut W, command: &OutboundCommand) -> Result<(), TransportError>
where
    W: AsyncWrite + Unpin,
{
    writer.write_all(encode_line(command).as_bytes()).await?;
    writer.flush().await?;
    tracing::debug!(%command, "sent");
    Ok(())
}

/// Line bytes without the `\n` / `\r\n` terminator, decoded lossily.
fn line_text(buf: &[u8]) -> String {
    let line = buf.strip_suffix(b"\n").unwrap_or(buf);
    let line = line.strip_suffix(b"\r").unwrap_or(line);
    String::from_utf8_lossy(line).into_owned()
}
