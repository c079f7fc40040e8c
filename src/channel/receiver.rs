use crate::actuation::ActuationDispatcher;
use crate::error::ChannelError;
use crate::protocol::{self, Command, ACK};
use std::future::Future;
use std::io;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::BufReader;
use tokio::net::{TcpListener, TcpStream};

/// Accepts one connection at a time and dispatches every recognized command.
pub struct CommandServer {
    listener: TcpListener,
    dispatcher: ActuationDispatcher,
}

impl CommandServer {
    pub async fn bind(addr: SocketAddr, dispatcher: ActuationDispatcher) -> io::Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        log::info!("📡 Listening for commands on {}", listener.local_addr()?);
        Ok(Self { listener, dispatcher })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Serve until `shutdown` resolves, then let queued actuation finish.
    pub async fn run_until<F>(self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        let Self { listener, dispatcher } = self;

        tokio::select! {
            _ = serve(&listener, &dispatcher) => {}
            _ = shutdown => log::info!("Command server shutting down"),
        }
        drop(listener);

        if tokio::task::spawn_blocking(move || dispatcher.shutdown()).await.is_err() {
            log::error!("Actuation shutdown panicked");
        }
    }

    /// Serve forever.
    pub async fn run(self) {
        self.run_until(std::future::pending()).await
    }
}

async fn serve(listener: &TcpListener, dispatcher: &ActuationDispatcher) {
    loop {
        let (stream, peer) = match listener.accept().await {
            Ok(accepted) => accepted,
            Err(e) => {
                log::warn!("Accept failed: {e}");
                tokio::time::sleep(Duration::from_millis(100)).await;
                continue;
            }
        };

        log::info!("🔗 Connected by {peer}");
        match handle_connection(stream, dispatcher).await {
            Ok(handled) => log::info!("Disconnected {peer} after {handled} command(s)"),
            Err(e) => log::warn!("Connection from {peer} ended: {e}"),
        }
    }
}

/// Read commands until the peer closes. Every line is acknowledged, whether
/// recognized or not.
pub async fn handle_connection(stream: TcpStream, dispatcher: &ActuationDispatcher) -> Result<usize, ChannelError> {
    stream.set_nodelay(true)?;
    let (read, mut write) = stream.into_split();
    let mut reader = BufReader::new(read);
    let mut handled = 0;

    while let Some(line) = protocol::read_line(&mut reader).await? {
        match Command::decode(&line) {
            Command::Alert(code) => {
                log::info!("📨 Received: {code}");
                if let Err(e) = dispatcher.dispatch(code) {
                    log::error!("Failed to dispatch {code}: {e}");
                }
            }
            Command::Unknown(text) => log::warn!("Ignoring unrecognized command {text:?}"),
        }

        protocol::write_line(&mut write, ACK).await?;
        handled += 1;
    }

    Ok(handled)
}
