use log::{debug, warn};
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use tokio::io::AsyncWriteExt;
use tokio::net::{TcpListener, TcpStream};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionMode {
    None,
    Active,
    Passive,
}

/// The per-transfer data channel of one session.
///
/// At most one connection attempt is outstanding at a time. Active mode
/// dials out to the client-advertised address immediately; passive mode
/// binds a listener, reports the bound address, and defers the accept
/// until the next data operation consumes the channel.
pub struct DataConnection {
    mode: ConnectionMode,
    stream: Option<TcpStream>,
    listener: Option<TcpListener>,
}

impl DataConnection {
    pub fn new() -> Self {
        Self {
            mode: ConnectionMode::None,
            stream: None,
            listener: None,
        }
    }

    pub fn mode(&self) -> ConnectionMode {
        self.mode
    }

    pub fn is_open(&self) -> bool {
        self.mode != ConnectionMode::None
    }

    /// Dials the client's advertised address.
    ///
    /// Reopening while already in active mode is a no-op; any other open
    /// connection is force-closed first.
    pub async fn open_active(&mut self, ip: IpAddr, port: u16) -> Result<(), std::io::Error> {
        if self.mode == ConnectionMode::Active {
            debug!("Active data connection already established, keeping it");
            return Ok(());
        }
        if self.mode != ConnectionMode::None {
            self.close().await;
        }
        let stream = TcpStream::connect(SocketAddr::new(ip, port)).await?;
        self.stream = Some(stream);
        self.mode = ConnectionMode::Active;
        debug!("Data connection - Active Mode - established to {}:{}", ip, port);
        Ok(())
    }

    /// Binds a passive listener and returns its local address.
    ///
    /// `port` 0 requests an ephemeral port. The accept is deferred until
    /// [`take_stream`](Self::take_stream).
    pub async fn open_passive(
        &mut self,
        local: &SocketAddr,
        port: u16,
    ) -> Result<SocketAddr, std::io::Error> {
        if self.mode != ConnectionMode::None {
            self.close().await;
        }
        let bind_ip: IpAddr = match local {
            SocketAddr::V4(_) => Ipv4Addr::UNSPECIFIED.into(),
            SocketAddr::V6(_) => Ipv6Addr::UNSPECIFIED.into(),
        };
        let listener = TcpListener::bind((bind_ip, port)).await?;
        let addr = listener.local_addr()?;
        self.listener = Some(listener);
        self.mode = ConnectionMode::Passive;
        debug!("Passive data listener bound on {}", addr);
        Ok(addr)
    }

    /// Hands the established stream to its one consumer, accepting the
    /// pending passive connection first when necessary. The connection
    /// resets to `None`; closing the stream is now the consumer's job.
    pub async fn take_stream(&mut self) -> Result<Option<TcpStream>, std::io::Error> {
        match self.mode {
            ConnectionMode::None => Ok(None),
            ConnectionMode::Active => {
                self.mode = ConnectionMode::None;
                Ok(self.stream.take())
            }
            ConnectionMode::Passive => {
                let listener = self.listener.take();
                self.mode = ConnectionMode::None;
                match listener {
                    Some(listener) => {
                        let (stream, peer) = listener.accept().await?;
                        debug!("Accepted data connection from {}", peer);
                        Ok(Some(stream))
                    }
                    None => Ok(None),
                }
            }
        }
    }

    /// Idempotent close; flushes and shuts the stream down first.
    pub async fn close(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            if let Err(e) = stream.shutdown().await {
                warn!("Could not shut down data connection: {}", e);
            }
        }
        self.listener = None;
        self.mode = ConnectionMode::None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncReadExt;

    #[tokio::test]
    async fn starts_closed_and_close_is_idempotent() {
        let mut conn = DataConnection::new();
        assert_eq!(conn.mode(), ConnectionMode::None);
        assert!(!conn.is_open());
        conn.close().await;
        conn.close().await;
        assert_eq!(conn.mode(), ConnectionMode::None);
        assert!(conn.take_stream().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn active_open_is_idempotent() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let mut conn = DataConnection::new();
        conn.open_active(addr.ip(), addr.port()).await.unwrap();
        assert_eq!(conn.mode(), ConnectionMode::Active);
        // second open keeps the established connection
        conn.open_active(addr.ip(), addr.port()).await.unwrap();
        assert_eq!(conn.mode(), ConnectionMode::Active);

        let stream = conn.take_stream().await.unwrap();
        assert!(stream.is_some());
        assert_eq!(conn.mode(), ConnectionMode::None);
    }

    #[tokio::test]
    async fn passive_accept_is_deferred_until_take() {
        let control: SocketAddr = "127.0.0.1:21".parse().unwrap();
        let mut conn = DataConnection::new();
        let addr = conn.open_passive(&control, 0).await.unwrap();
        assert_eq!(conn.mode(), ConnectionMode::Passive);

        let client = tokio::spawn(async move {
            let mut stream = TcpStream::connect(("127.0.0.1", addr.port())).await.unwrap();
            stream.write_all(b"ping").await.unwrap();
        });

        let mut stream = conn.take_stream().await.unwrap().unwrap();
        let mut buf = [0u8; 4];
        stream.read_exact(&mut buf).await.unwrap();
        assert_eq!(&buf, b"ping");
        client.await.unwrap();
    }

    #[tokio::test]
    async fn reopening_passive_over_passive_replaces_the_listener() {
        let control: SocketAddr = "127.0.0.1:21".parse().unwrap();
        let mut conn = DataConnection::new();
        let first = conn.open_passive(&control, 0).await.unwrap();
        assert_ne!(first.port(), 0);
        let second = conn.open_passive(&control, 0).await.unwrap();
        assert_ne!(second.port(), 0);
        assert_eq!(conn.mode(), ConnectionMode::Passive);
    }
}
