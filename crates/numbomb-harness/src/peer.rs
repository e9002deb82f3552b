//! Scripted server peer.
//!
//! `ScriptedPeer` stands in for the game server on one connection. It has no
//! game logic: tests decide which lines to send and inspect every line the
//! client wrote.

use std::{io, net::SocketAddr, time::Duration};

use tokio::{
    io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader, DuplexStream},
    net::TcpListener,
};

/// How long a peer waits for client traffic before giving up.
pub const DEFAULT_WAIT: Duration = Duration::from_secs(5);

/// Buffer size of the in-memory pipe created by [`ScriptedPeer::pair`].
const PIPE_CAPACITY: usize = 64 * 1024;

type BoxedRead = Box<dyn AsyncRead + Send + Unpin>;
type BoxedWrite = Box<dyn AsyncWrite + Send + Unpin>;

/// Server side of one client connection.
pub struct ScriptedPeer {
    reader: BufReader<BoxedRead>,
    /// `None` once the peer has closed its sending side.
    writer: Option<BoxedWrite>,
}

impl ScriptedPeer {
    /// Create an in-memory connection.
    ///
    /// Returns the client end (hand it to the transport) and the peer.
    pub fn pair() -> (DuplexStream, Self) {
        let (client, server) = tokio::io::duplex(PIPE_CAPACITY);
        (client, Self::from_stream(server))
    }

    /// Wrap the server end of any byte stream.
    pub fn from_stream<S>(stream: S) -> Self
    where
        S: AsyncRead + AsyncWrite + Send + 'static,
    {
        let (read_half, write_half) = tokio::io::split(stream);
        Self { reader: BufReader::new(Box::new(read_half)), writer: Some(Box::new(write_half)) }
    }

    /// Next line from the client, without its terminator.
    ///
    /// `Ok(None)` means the client closed its sending side. Times out after
    /// [`DEFAULT_WAIT`].
    pub async fn recv_line(&mut self) -> io::Result<Option<String>> {
        self.recv_line_within(DEFAULT_WAIT).await
    }

    /// Next line from the client, waiting at most `wait`.
    pub async fn recv_line_within(&mut self, wait: Duration) -> io::Result<Option<String>> {
        let mut line = String::new();
        let read = tokio::time::timeout(wait, self.reader.read_line(&mut line))
            .await
            .map_err(|_| io::Error::new(io::ErrorKind::TimedOut, "no line from client"))??;

        if read == 0 {
            return Ok(None);
        }

        let trimmed = line.trim_end_matches(['\n', '\r']).len();
        line.truncate(trimmed);
        Ok(Some(line))
    }

    /// Next line from the client; end of stream is an error.
    pub async fn expect_line(&mut self) -> io::Result<String> {
        self.recv_line()
            .await?
            .ok_or_else(|| io::Error::new(io::ErrorKind::UnexpectedEof, "client closed"))
    }

    /// Read lines until the client closes its sending side.
    pub async fn drain_until_eof(&mut self) -> io::Result<Vec<String>> {
        let mut lines = Vec::new();
        while let Some(line) = self.recv_line().await? {
            lines.push(line);
        }
        Ok(lines)
    }

    /// Send one line; the terminator is appended.
    pub async fn send_line(&mut self, line: &str) -> io::Result<()> {
        let writer = self
            .writer
            .as_mut()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotConnected, "peer already closed"))?;

        writer.write_all(line.as_bytes()).await?;
        writer.write_all(b"\n").await?;
        writer.flush().await
    }

    /// Send several lines in order.
    pub async fn send_lines(&mut self, lines: &[&str]) -> io::Result<()> {
        for line in lines {
            self.send_line(line).await?;
        }
        Ok(())
    }

    /// Close the sending side. The client sees end of stream.
    pub async fn close(&mut self) -> io::Result<()> {
        if let Some(mut writer) = self.writer.take() {
            writer.shutdown().await?;
        }
        Ok(())
    }

    /// Drop both directions at once. Later client writes fail.
    pub fn abort(self) {
        tracing::debug!("scripted peer aborted");
    }
}

/// Loopback listener that yields [`ScriptedPeer`]s.
pub struct ScriptedListener {
    listener: TcpListener,
}

impl ScriptedListener {
    /// Bind to an ephemeral port on 127.0.0.1.
    pub async fn bind() -> io::Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        Ok(Self { listener })
    }

    /// Bound address.
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Accept the next client. Times out after [`DEFAULT_WAIT`].
    pub async fn accept(&self) -> io::Result<ScriptedPeer> {
        let (stream, _addr) = tokio::time::timeout(DEFAULT_WAIT, self.listener.accept())
            .await
            .map_err(|_| io::Error::new(io::ErrorKind::TimedOut, "no client connected"))??;
        Ok(ScriptedPeer::from_stream(stream))
    }
}
