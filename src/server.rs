use crate::config::Config;
use crate::core_auth::SimpleValidator;
use crate::session::Session;
use anyhow::{Context, Result};
use log::{debug, info};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::Mutex;

/// Invalid lifecycle transitions requested by the management plane.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum LifecycleError {
    #[error("Server is started already")]
    AlreadyStarted,
    #[error("Server is not started yet")]
    NotStarted,
    #[error("Server is suspended already")]
    AlreadySuspended,
    #[error("Server is not suspended yet")]
    NotSuspended,
}

/// The listening FTP server.
///
/// Accepts control connections and hands each one to a fresh session task.
/// The lifecycle contract (`start`/`suspend`/`resume`/`stop`) is what a
/// management layer drives; while stopped or suspended, inbound
/// connections are accepted and immediately closed.
pub struct FtpServer {
    listener: TcpListener,
    config: Arc<Config>,
    validator: Arc<SimpleValidator>,
    root: PathBuf,
    started: AtomicBool,
    suspended: AtomicBool,
}

impl FtpServer {
    pub async fn bind(config: Config, validator: SimpleValidator) -> Result<Self> {
        let root = PathBuf::from(&config.server.chroot_dir)
            .canonicalize()
            .with_context(|| {
                format!(
                    "Root directory {} not exists, not a directory or not accessible",
                    config.server.chroot_dir
                )
            })?;
        let listener = TcpListener::bind(("0.0.0.0", config.server.listen_port))
            .await
            .with_context(|| format!("Failed to bind port {}", config.server.listen_port))?;
        info!("Server listening on port {}", listener.local_addr()?.port());

        Ok(Self {
            listener,
            config: Arc::new(config),
            validator: Arc::new(validator),
            root,
            started: AtomicBool::new(false),
            suspended: AtomicBool::new(false),
        })
    }

    pub fn local_port(&self) -> u16 {
        self.listener
            .local_addr()
            .map(|addr| addr.port())
            .unwrap_or(0)
    }

    pub fn start(&self) -> Result<(), LifecycleError> {
        if self.is_started() {
            return Err(LifecycleError::AlreadyStarted);
        }
        self.started.store(true, Ordering::SeqCst);
        debug!("Server started");
        Ok(())
    }

    pub fn suspend(&self) -> Result<(), LifecycleError> {
        if !self.is_started() {
            return Err(LifecycleError::NotStarted);
        }
        if self.is_suspended() {
            return Err(LifecycleError::AlreadySuspended);
        }
        self.suspended.store(true, Ordering::SeqCst);
        debug!("Server suspended");
        Ok(())
    }

    pub fn resume(&self) -> Result<(), LifecycleError> {
        if !self.is_started() {
            return Err(LifecycleError::NotStarted);
        }
        if !self.is_suspended() {
            return Err(LifecycleError::NotSuspended);
        }
        self.suspended.store(false, Ordering::SeqCst);
        debug!("Server resumed");
        Ok(())
    }

    pub fn stop(&self) -> Result<(), LifecycleError> {
        if !self.is_started() {
            return Err(LifecycleError::NotStarted);
        }
        self.suspended.store(false, Ordering::SeqCst);
        self.started.store(false, Ordering::SeqCst);
        debug!("Server stopped");
        Ok(())
    }

    pub fn is_started(&self) -> bool {
        self.started.load(Ordering::SeqCst)
    }

    pub fn is_suspended(&self) -> bool {
        self.suspended.load(Ordering::SeqCst)
    }

    /// The accept loop; runs until the listener fails.
    pub async fn run(&self) -> Result<()> {
        loop {
            let (socket, addr) = self.listener.accept().await?;

            if !self.is_started() || self.is_suspended() {
                debug!("Refusing connection from {:?} (stopped or suspended)", addr);
                drop(socket);
                continue;
            }

            let local_addr = match socket.local_addr() {
                Ok(local_addr) => local_addr,
                Err(e) => {
                    debug!("Dropping connection from {:?}: {}", addr, e);
                    continue;
                }
            };
            info!("New connection from {:?}", addr);

            let (read_half, write_half) = socket.into_split();
            let session = Session::new(
                Arc::clone(&self.config),
                Arc::clone(&self.validator),
                self.root.clone(),
                Arc::new(Mutex::new(write_half)),
                local_addr,
            );
            tokio::spawn(async move {
                session.run(read_half).await;
                debug!("Connection closed for {:?}", addr);
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    async fn test_server() -> (FtpServer, tempfile::TempDir) {
        let root = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.server.listen_port = 0;
        config.server.chroot_dir = root.path().to_string_lossy().into_owned();
        let validator = SimpleValidator::from_user_pass("anon", "anon");
        let server = FtpServer::bind(config, validator).await.unwrap();
        (server, root)
    }

    #[tokio::test]
    async fn lifecycle_transitions_are_checked() {
        let (server, _root) = test_server().await;

        assert!(!server.is_started());
        assert_eq!(server.suspend(), Err(LifecycleError::NotStarted));
        assert_eq!(server.resume(), Err(LifecycleError::NotStarted));
        assert_eq!(server.stop(), Err(LifecycleError::NotStarted));

        server.start().unwrap();
        assert!(server.is_started());
        assert_eq!(server.start(), Err(LifecycleError::AlreadyStarted));
        assert_eq!(server.resume(), Err(LifecycleError::NotSuspended));

        server.suspend().unwrap();
        assert!(server.is_suspended());
        assert_eq!(server.suspend(), Err(LifecycleError::AlreadySuspended));

        server.resume().unwrap();
        assert!(!server.is_suspended());

        server.stop().unwrap();
        assert!(!server.is_started());
        assert!(!server.is_suspended());
    }

    #[tokio::test]
    async fn suspended_server_closes_new_connections() {
        use tokio::io::AsyncReadExt;

        let (server, _root) = test_server().await;
        server.start().unwrap();
        server.suspend().unwrap();
        let port = server.local_port();

        let accept_loop = tokio::spawn(async move { server.run().await });

        let mut stream = tokio::net::TcpStream::connect(("127.0.0.1", port))
            .await
            .unwrap();
        let mut buf = [0u8; 16];
        // no banner: the connection is closed right away
        let n = stream.read(&mut buf).await.unwrap();
        assert_eq!(n, 0);

        accept_loop.abort();
    }
}
