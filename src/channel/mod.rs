//! Command channel - alert codes over TCP, acknowledged line by line

mod receiver;
mod sender;

pub use receiver::{handle_connection, CommandServer};
pub use sender::{connect_sink, AlertSink, OneShotSender, PersistentSender};

use crate::error::ChannelError;
use crate::protocol::{self, ACK};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::BufReader;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;

/// Client end of an open command connection
pub(crate) struct Connection {
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
}

impl Connection {
    pub(crate) async fn open(addr: SocketAddr) -> Result<Self, ChannelError> {
        let stream = TcpStream::connect(addr)
            .await
            .map_err(|source| ChannelError::Connect { addr, source })?;
        stream.set_nodelay(true)?;

        let (read, writer) = stream.into_split();
        Ok(Self {
            reader: BufReader::new(read),
            writer,
        })
    }

    /// Send one command line and wait for its acknowledgment.
    pub(crate) async fn request(&mut self, text: &str, ack_timeout: Duration) -> Result<(), ChannelError> {
        protocol::write_line(&mut self.writer, text).await?;

        let ack = tokio::time::timeout(ack_timeout, protocol::read_line(&mut self.reader))
            .await
            .map_err(|_| ChannelError::AckTimeout(ack_timeout))??;

        match ack {
            None => Err(ChannelError::Closed),
            Some(ack) if ack == ACK => Ok(()),
            Some(other) => Err(ChannelError::BadAck(other)),
        }
    }
}
