//! Wire format of the command channel
//!
//! Every command and every acknowledgment is one UTF-8 line terminated by
//! `\n`. A trailing `\r` is ignored. Lines longer than [`MAX_FRAME_LEN`] are a
//! protocol violation.

use crate::error::ChannelError;
use crate::types::AlertCode;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWrite, AsyncWriteExt};

pub const DEFAULT_PORT: u16 = 5001;
pub const MAX_FRAME_LEN: usize = 256;
pub const ACK: &str = "OK";

/// A decoded command line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Alert(AlertCode),
    Unknown(String),
}

impl Command {
    pub fn decode(line: &str) -> Self {
        let text = line.trim_end_matches(['\r', '\n']);
        match text.parse::<AlertCode>() {
            Ok(code) => Command::Alert(code),
            Err(_) => Command::Unknown(text.to_string()),
        }
    }
}

impl From<AlertCode> for Command {
    fn from(code: AlertCode) -> Self {
        Command::Alert(code)
    }
}

pub fn encode_line(text: &str) -> Vec<u8> {
    let mut frame = Vec::with_capacity(text.len() + 1);
    frame.extend_from_slice(text.as_bytes());
    frame.push(b'\n');
    frame
}

pub async fn write_line<W>(writer: &mut W, text: &str) -> Result<(), ChannelError>
where
    W: AsyncWrite + Unpin,
{
    writer.write_all(&encode_line(text)).await?;
    writer.flush().await?;
    Ok(())
}

/// Read one line. `Ok(None)` means the peer closed cleanly between frames.
///
/// Invalid UTF-8 is decoded lossily so garbage still reaches the caller as
/// unknown text.
pub async fn read_line<R>(reader: &mut R) -> Result<Option<String>, ChannelError>
where
    R: AsyncBufRead + Unpin,
{
    let mut buf = Vec::with_capacity(64);
    let limit = MAX_FRAME_LEN as u64 + 1;
    let read = reader.take(limit).read_until(b'\n', &mut buf).await?;

    if read == 0 {
        return Ok(None);
    }
    if buf.last() != Some(&b'\n') {
        if buf.len() > MAX_FRAME_LEN {
            return Err(ChannelError::FrameTooLong { limit: MAX_FRAME_LEN });
        }
        // Peer closed mid-frame; keep what arrived.
        log::debug!("Unterminated final frame ({} bytes)", buf.len());
    } else {
        buf.pop();
    }

    if buf.last() == Some(&b'\r') {
        buf.pop();
    }

    Ok(Some(String::from_utf8_lossy(&buf).into_owned()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::BufReader;

    #[test]
    fn decode_commands() {
        assert_eq!(Command::decode("MOVE_HEAD"), Command::Alert(AlertCode::MoveHead));
        assert_eq!(Command::decode("SWINGING_LEGS\r\n"), Command::Alert(AlertCode::SwingingLegs));
        assert_eq!(Command::decode("GARBAGE"), Command::Unknown("GARBAGE".to_string()));
        assert_eq!(Command::decode(""), Command::Unknown(String::new()));
    }

    #[tokio::test]
    async fn read_back_to_back_frames() {
        let data = b"STOP_SWAYING\nMOVE_HEAD\r\nOK".to_vec();
        let mut reader = BufReader::new(&data[..]);

        assert_eq!(read_line(&mut reader).await.unwrap().as_deref(), Some("STOP_SWAYING"));
        assert_eq!(read_line(&mut reader).await.unwrap().as_deref(), Some("MOVE_HEAD"));
        assert_eq!(read_line(&mut reader).await.unwrap().as_deref(), Some("OK"));
        assert_eq!(read_line(&mut reader).await.unwrap(), None);
    }

    #[tokio::test]
    async fn oversized_frame_is_rejected() {
        let mut data = vec![b'A'; MAX_FRAME_LEN + 10];
        data.push(b'\n');
        let mut reader = BufReader::new(&data[..]);

        assert!(matches!(
            read_line(&mut reader).await,
            Err(ChannelError::FrameTooLong { .. })
        ));
    }

    #[tokio::test]
    async fn invalid_utf8_is_lossy() {
        let data = b"\xff\xfeHI\n".to_vec();
        let mut reader = BufReader::new(&data[..]);
        let line = read_line(&mut reader).await.unwrap().unwrap();
        assert!(line.ends_with("HI"));
        assert!(matches!(Command::decode(&line), Command::Unknown(_)));
    }

    #[tokio::test]
    async fn write_line_appends_newline() {
        let mut out = Vec::new();
        write_line(&mut out, "FIDGETING_HANDS").await.unwrap();
        assert_eq!(out, b"FIDGETING_HANDS\n");
    }
}
