//! Landmark input from an external perception process
//!
//! Frames arrive as JSON, either one per UDP datagram or one per line on
//! stdin. Messages that don't parse are logged and skipped.

use crate::config::LandmarkSourceConfig;
use crate::types::LandmarkFrame;
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::net::SocketAddr;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Stdin};
use tokio::net::UdpSocket;

pub fn parse_landmark_frame(msg: &str) -> Option<LandmarkFrame> {
    let msg = msg.trim();
    if msg.is_empty() {
        return None;
    }
    match serde_json::from_str::<LandmarkFrame>(msg) {
        Ok(frame) => Some(frame),
        Err(e) => {
            log::warn!("Skipping malformed landmark frame: {e}");
            None
        }
    }
}

#[async_trait]
pub trait LandmarkSource: Send {
    /// Next frame, or `None` once the source is exhausted.
    async fn next_frame(&mut self) -> Result<Option<LandmarkFrame>>;
}

#[async_trait]
impl<T: LandmarkSource + ?Sized> LandmarkSource for Box<T> {
    async fn next_frame(&mut self) -> Result<Option<LandmarkFrame>> {
        (**self).next_frame().await
    }
}

pub struct UdpLandmarkSource {
    sock: UdpSocket,
    buf: Vec<u8>,
}

impl UdpLandmarkSource {
    pub async fn bind(addr: SocketAddr) -> Result<Self> {
        let sock = UdpSocket::bind(addr)
            .await
            .with_context(|| format!("bind landmark listener on {addr}"))?;
        log::info!("UDP landmark listener bound on {}", sock.local_addr()?);
        Ok(Self {
            sock,
            buf: vec![0u8; 16 * 1024],
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.sock.local_addr()?)
    }
}

#[async_trait]
impl LandmarkSource for UdpLandmarkSource {
    async fn next_frame(&mut self) -> Result<Option<LandmarkFrame>> {
        loop {
            let len = match self.sock.recv_from(&mut self.buf).await {
                Ok((len, _src)) => len,
                Err(e) => {
                    log::warn!("UDP landmark recv error: {e}");
                    continue;
                }
            };

            match std::str::from_utf8(&self.buf[..len]) {
                Ok(s) => {
                    if let Some(frame) = parse_landmark_frame(s) {
                        return Ok(Some(frame));
                    }
                }
                Err(_) => log::warn!("Skipping non-UTF-8 landmark datagram ({len} bytes)"),
            }
        }
    }
}

/// One JSON frame per line, e.g. a recorded session replayed through stdin
pub struct JsonLinesSource<R> {
    reader: R,
    line: String,
}

impl<R> JsonLinesSource<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            line: String::new(),
        }
    }
}

impl JsonLinesSource<BufReader<Stdin>> {
    pub fn stdin() -> Self {
        Self::new(BufReader::new(tokio::io::stdin()))
    }
}

#[async_trait]
impl<R> LandmarkSource for JsonLinesSource<R>
where
    R: AsyncBufRead + Unpin + Send,
{
    async fn next_frame(&mut self) -> Result<Option<LandmarkFrame>> {
        loop {
            self.line.clear();
            let read = self.reader.read_line(&mut self.line).await.context("read landmark line")?;
            if read == 0 {
                return Ok(None);
            }
            if let Some(frame) = parse_landmark_frame(&self.line) {
                return Ok(Some(frame));
            }
        }
    }
}

pub async fn open_source(config: &LandmarkSourceConfig) -> Result<Box<dyn LandmarkSource>> {
    Ok(match config {
        LandmarkSourceConfig::Udp { bind_addr } => Box::new(UdpLandmarkSource::bind(*bind_addr).await?),
        LandmarkSourceConfig::Stdin => {
            log::info!("Reading landmark frames from stdin");
            Box::new(JsonLinesSource::stdin())
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::LandmarkId;

    #[test]
    fn parse_skips_garbage() {
        assert!(parse_landmark_frame("").is_none());
        assert!(parse_landmark_frame("not json").is_none());
        assert!(parse_landmark_frame(r#"{"landmarks":{"nose":{"x":"left"}}}"#).is_none());

        let frame = parse_landmark_frame(r#"{"landmarks":{"right_wrist":{"x":0.1,"y":0.2}}}"#).unwrap();
        assert!(frame.get(LandmarkId::RightWrist).is_some());
    }

    #[test]
    fn extra_landmark_ids_are_ignored() {
        let frame = parse_landmark_frame(
            r#"{"landmarks":{"right_wrist":{"x":0.1,"y":0.2},"left_wrist":{"x":0.3,"y":0.2},"elbow":{"x":0,"y":0}}}"#,
        )
        .unwrap();
        assert!(frame.get(LandmarkId::RightWrist).is_some());
        assert_eq!(frame.landmarks.len(), 1);
    }

    #[tokio::test]
    async fn json_lines_source() {
        let data = b"{\"landmarks\":{\"nose\":{\"x\":0.5,\"y\":0.5}}}\nbroken\n\n{\"landmarks\":{}}\n".to_vec();
        let mut source = JsonLinesSource::new(&data[..]);

        let first = source.next_frame().await.unwrap().unwrap();
        assert!(first.get(LandmarkId::Nose).is_some());
        let second = source.next_frame().await.unwrap().unwrap();
        assert!(second.landmarks.is_empty());
        assert!(source.next_frame().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn udp_source_receives_datagrams() {
        let mut source = UdpLandmarkSource::bind("127.0.0.1:0".parse().unwrap()).await.unwrap();
        let addr = source.local_addr().unwrap();

        let sock = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        sock.send_to(b"garbage", addr).await.unwrap();
        sock.send_to(br#"{"landmarks":{"left_hip":{"x":0.4,"y":0.6,"visibility":0.99}}}"#, addr)
            .await
            .unwrap();

        let frame = source.next_frame().await.unwrap().unwrap();
        assert!(frame.get(LandmarkId::LeftHip).is_some());
    }
}
