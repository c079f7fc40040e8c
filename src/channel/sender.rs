use super::Connection;
use crate::config::{ChannelConfig, SenderMode};
use crate::error::ChannelError;
use crate::types::AlertCode;
use async_trait::async_trait;
use std::net::SocketAddr;
use std::time::Duration;

/// Where the monitor delivers alerts
#[async_trait]
pub trait AlertSink: Send {
    async fn send(&mut self, code: AlertCode) -> Result<(), ChannelError>;
}

#[async_trait]
impl<T: AlertSink + ?Sized> AlertSink for Box<T> {
    async fn send(&mut self, code: AlertCode) -> Result<(), ChannelError> {
        (**self).send(code).await
    }
}

/// Keeps one connection to the receiver and re-establishes it when it breaks.
pub struct PersistentSender {
    addr: SocketAddr,
    ack_timeout: Duration,
    conn: Option<Connection>,
}

impl PersistentSender {
    pub fn new(addr: SocketAddr, ack_timeout: Duration) -> Self {
        Self {
            addr,
            ack_timeout,
            conn: None,
        }
    }

    pub fn is_connected(&self) -> bool {
        self.conn.is_some()
    }

    pub async fn send_text(&mut self, text: &str) -> Result<(), ChannelError> {
        if let Some(conn) = self.conn.as_mut() {
            match conn.request(text, self.ack_timeout).await {
                Ok(()) => return Ok(()),
                // The command may have been delivered; don't send it twice.
                Err(e @ (ChannelError::AckTimeout(_) | ChannelError::BadAck(_))) => {
                    self.conn = None;
                    return Err(e);
                }
                Err(e) => {
                    log::warn!("Connection to {} lost ({e}), reconnecting", self.addr);
                    self.conn = None;
                }
            }
        }

        let mut conn = Connection::open(self.addr).await?;
        log::info!("🔗 Connected to receiver at {}", self.addr);
        conn.request(text, self.ack_timeout).await?;
        self.conn = Some(conn);
        Ok(())
    }
}

#[async_trait]
impl AlertSink for PersistentSender {
    async fn send(&mut self, code: AlertCode) -> Result<(), ChannelError> {
        self.send_text(code.as_str()).await
    }
}

/// Connects, sends one command, waits for the acknowledgment and closes.
/// Failures are returned as-is, without retrying.
pub struct OneShotSender {
    addr: SocketAddr,
    ack_timeout: Duration,
}

impl OneShotSender {
    pub fn new(addr: SocketAddr, ack_timeout: Duration) -> Self {
        Self { addr, ack_timeout }
    }

    pub async fn send_text(&self, text: &str) -> Result<(), ChannelError> {
        let mut conn = Connection::open(self.addr).await?;
        conn.request(text, self.ack_timeout).await
    }
}

#[async_trait]
impl AlertSink for OneShotSender {
    async fn send(&mut self, code: AlertCode) -> Result<(), ChannelError> {
        self.send_text(code.as_str()).await
    }
}

/// Build the sender selected in the channel configuration.
pub fn connect_sink(config: &ChannelConfig) -> Box<dyn AlertSink> {
    match config.sender_mode {
        SenderMode::Persistent => Box::new(PersistentSender::new(config.receiver_addr, config.ack_timeout())),
        SenderMode::OneShot => {
            log::warn!("Using one-shot sender: one connection per alert");
            Box::new(OneShotSender::new(config.receiver_addr, config.ack_timeout()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{read_line, write_line};
    use tokio::io::BufReader;
    use tokio::net::TcpListener;

    /// Accepts `connections` connections and acknowledges every line with `ack`.
    async fn fake_receiver(connections: usize, ack: &'static str) -> (SocketAddr, tokio::task::JoinHandle<Vec<String>>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            let mut seen = Vec::new();
            for _ in 0..connections {
                let (stream, _) = listener.accept().await.unwrap();
                let (read, mut write) = stream.into_split();
                let mut reader = BufReader::new(read);
                while let Ok(Some(line)) = read_line(&mut reader).await {
                    seen.push(line);
                    if write_line(&mut write, ack).await.is_err() {
                        break;
                    }
                }
            }
            seen
        });
        (addr, handle)
    }

    #[tokio::test]
    async fn persistent_sender_reuses_connection() {
        let (addr, receiver) = fake_receiver(1, "OK").await;
        let mut sender = PersistentSender::new(addr, Duration::from_secs(2));

        sender.send(AlertCode::MoveHead).await.unwrap();
        sender.send(AlertCode::StopSwaying).await.unwrap();
        assert!(sender.is_connected());

        drop(sender);
        assert_eq!(receiver.await.unwrap(), vec!["MOVE_HEAD", "STOP_SWAYING"]);
    }

    #[tokio::test]
    async fn one_shot_sender_opens_fresh_connections() {
        let (addr, receiver) = fake_receiver(2, "OK").await;
        let mut sender = OneShotSender::new(addr, Duration::from_secs(2));

        sender.send(AlertCode::FidgetingHands).await.unwrap();
        sender.send(AlertCode::SwingingLegs).await.unwrap();

        assert_eq!(receiver.await.unwrap(), vec!["FIDGETING_HANDS", "SWINGING_LEGS"]);
    }

    #[tokio::test]
    async fn refused_connection_propagates() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let mut sender = OneShotSender::new(addr, Duration::from_secs(1));
        assert!(matches!(
            sender.send(AlertCode::MoveHead).await,
            Err(ChannelError::Connect { .. })
        ));

        let mut sender = PersistentSender::new(addr, Duration::from_secs(1));
        assert!(sender.send(AlertCode::MoveHead).await.is_err());
        assert!(!sender.is_connected());
    }

    #[tokio::test]
    async fn unexpected_ack_is_an_error() {
        let (addr, _receiver) = fake_receiver(1, "NOPE").await;
        let mut sender = PersistentSender::new(addr, Duration::from_secs(2));

        match sender.send(AlertCode::MoveHead).await {
            Err(ChannelError::BadAck(ack)) => assert_eq!(ack, "NOPE"),
            other => panic!("expected bad ack, got {other:?}"),
        }
        assert!(!sender.is_connected());
    }

    #[tokio::test]
    async fn persistent_sender_reconnects_after_hangup() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let receiver = tokio::spawn(async move {
            let mut seen = Vec::new();
            // Hang up after every command.
            for _ in 0..2 {
                let (stream, _) = listener.accept().await.unwrap();
                let (read, mut write) = stream.into_split();
                let mut reader = BufReader::new(read);
                if let Ok(Some(line)) = read_line(&mut reader).await {
                    seen.push(line);
                    write_line(&mut write, "OK").await.unwrap();
                }
            }
            seen
        });

        let mut sender = PersistentSender::new(addr, Duration::from_secs(2));
        sender.send(AlertCode::MoveHead).await.unwrap();

        // Give the receiver time to close its end.
        tokio::time::sleep(Duration::from_millis(100)).await;
        sender.send(AlertCode::SwingingLegs).await.unwrap();

        assert_eq!(receiver.await.unwrap(), vec!["MOVE_HEAD", "SWINGING_LEGS"]);
    }
}
