//! Codecs for the control channel.
//!
//! [`LineCodec`] carries command lines hub -> worker with a hard length
//! bound. [`ReplyCodec`] carries [`MonitorReply`] frames worker -> hub as
//! length-prefixed JSON over any AsyncRead/AsyncWrite.

use std::io;

use tokio_util::bytes::{Buf, BufMut, Bytes, BytesMut};
use tokio_util::codec::{Decoder, Encoder, LengthDelimitedCodec};

use super::protocol::{MAX_COMMAND_LINE, MAX_REPLY_FRAME, MonitorReply};

/// Newline-delimited command lines with a hard length bound.
///
/// Oversized lines are truncated at the bound and the remainder of the line
/// is discarded, so the worker sees a bounded command, never a torn one.
pub struct LineCodec {
    max_line: usize,
    discarding: bool,
}

impl LineCodec {
    pub fn new() -> Self {
        Self {
            max_line: MAX_COMMAND_LINE,
            discarding: false,
        }
    }
}

impl Default for LineCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for LineCodec {
    type Item = String;
    type Error = io::Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<String>, io::Error> {
        loop {
            let newline = src.iter().position(|b| *b == b'\n');

            if self.discarding {
                match newline {
                    Some(idx) => {
                        src.advance(idx + 1);
                        self.discarding = false;
                        continue;
                    }
                    None => {
                        src.clear();
                        return Ok(None);
                    }
                }
            }

            return match newline {
                Some(idx) => {
                    let line = src.split_to(idx + 1);
                    let body = &line[..idx];
                    let body = if body.len() > self.max_line {
                        tracing::warn!(
                            len = body.len(),
                            max = self.max_line,
                            "truncating oversized command line"
                        );
                        &body[..self.max_line]
                    } else {
                        body
                    };
                    Ok(Some(String::from_utf8_lossy(body).into_owned()))
                }
                None if src.len() > self.max_line => {
                    // No terminator yet and the line already exceeds the
                    // bound: emit the bounded prefix now and drop the rest of
                    // the line when it arrives.
                    tracing::warn!(max = self.max_line, "truncating oversized command line");
                    let head = src.split_to(self.max_line);
                    self.discarding = true;
                    Ok(Some(String::from_utf8_lossy(&head).into_owned()))
                }
                None => Ok(None),
            };
        }
    }
}

impl Encoder<String> for LineCodec {
    type Error = io::Error;

    fn encode(&mut self, line: String, dst: &mut BytesMut) -> Result<(), io::Error> {
        if line.contains('\n') {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "command must be a single line",
            ));
        }
        let mut line = line;
        if line.len() > self.max_line {
            let mut cut = self.max_line;
            while !line.is_char_boundary(cut) {
                cut -= 1;
            }
            tracing::warn!(
                len = line.len(),
                max = self.max_line,
                "truncating oversized command line"
            );
            line.truncate(cut);
        }
        dst.reserve(line.len() + 1);
        dst.put_slice(line.as_bytes());
        dst.put_u8(b'\n');
        Ok(())
    }
}

/// Length-prefixed JSON frames carrying [`MonitorReply`] values.
pub struct ReplyCodec {
    inner: LengthDelimitedCodec,
}

impl ReplyCodec {
    pub fn new() -> Self {
        Self {
            inner: LengthDelimitedCodec::builder()
                .length_field_length(4)
                .max_frame_length(MAX_REPLY_FRAME)
                .new_codec(),
        }
    }
}

impl Default for ReplyCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for ReplyCodec {
    type Item = MonitorReply;
    type Error = io::Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<MonitorReply>, io::Error> {
        match self.inner.decode(src)? {
            Some(frame) => {
                let reply = serde_json::from_slice(&frame)
                    .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
                Ok(Some(reply))
            }
            None => Ok(None),
        }
    }
}

impl Encoder<MonitorReply> for ReplyCodec {
    type Error = io::Error;

    fn encode(&mut self, reply: MonitorReply, dst: &mut BytesMut) -> Result<(), io::Error> {
        let body = serde_json::to_vec(&reply)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        self.inner.encode(Bytes::from(body), dst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_roundtrip() {
        let mut codec = LineCodec::new();
        let mut buf = BytesMut::new();

        codec.encode("list_hunts".to_string(), &mut buf).unwrap();
        assert_eq!(&buf[..], b"list_hunts\n");

        let decoded = codec.decode(&mut buf).unwrap().unwrap();
        assert_eq!(decoded, "list_hunts");
        assert!(buf.is_empty());
    }

    #[test]
    fn decode_waits_for_newline() {
        let mut codec = LineCodec::new();
        let mut buf = BytesMut::from(&b"list_h"[..]);

        assert!(codec.decode(&mut buf).unwrap().is_none());

        buf.extend_from_slice(b"unts\n");
        assert_eq!(codec.decode(&mut buf).unwrap().unwrap(), "list_hunts");
    }

    #[test]
    fn encode_rejects_embedded_newline() {
        let mut codec = LineCodec::new();
        let mut buf = BytesMut::new();
        let err = codec
            .encode("list_hunts\nstop_monitor".to_string(), &mut buf)
            .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
    }

    #[test]
    fn encode_truncates_oversized_line() {
        let mut codec = LineCodec::new();
        let mut buf = BytesMut::new();
        let long = "x".repeat(MAX_COMMAND_LINE + 100);

        codec.encode(long, &mut buf).unwrap();
        assert_eq!(buf.len(), MAX_COMMAND_LINE + 1);
        assert_eq!(buf[MAX_COMMAND_LINE], b'\n');
    }

    #[test]
    fn decode_truncates_and_discards_oversized_line() {
        let mut codec = LineCodec::new();
        let mut buf = BytesMut::new();
        buf.extend_from_slice("y".repeat(MAX_COMMAND_LINE + 50).as_bytes());

        let head = codec.decode(&mut buf).unwrap().unwrap();
        assert_eq!(head.len(), MAX_COMMAND_LINE);

        // The tail of the oversized line is dropped, the next line survives.
        buf.extend_from_slice(b"tail\nlist_hunts\n");
        assert_eq!(codec.decode(&mut buf).unwrap().unwrap(), "list_hunts");
    }

    #[test]
    fn reply_roundtrip() {
        let mut codec = ReplyCodec::new();
        let mut buf = BytesMut::new();

        codec
            .encode(
                MonitorReply::Output {
                    text: "Total Hunts: 2\n".to_string(),
                },
                &mut buf,
            )
            .unwrap();

        match codec.decode(&mut buf).unwrap().unwrap() {
            MonitorReply::Output { text } => assert_eq!(text, "Total Hunts: 2\n"),
            other => panic!("wrong variant: {other:?}"),
        }
    }

    #[test]
    fn reply_decode_waits_for_full_frame() {
        let mut codec = ReplyCodec::new();
        let mut full = BytesMut::new();
        codec
            .encode(MonitorReply::ShuttingDown, &mut full)
            .unwrap();

        let mut partial = BytesMut::from(&full[..full.len() - 3]);
        assert!(codec.decode(&mut partial).unwrap().is_none());

        partial.extend_from_slice(&full[full.len() - 3..]);
        assert!(matches!(
            codec.decode(&mut partial).unwrap(),
            Some(MonitorReply::ShuttingDown)
        ));
    }

    #[test]
    fn back_to_back_replies_decode_in_order() {
        let mut codec = ReplyCodec::new();
        let mut buf = BytesMut::new();
        codec
            .encode(
                MonitorReply::Output {
                    text: "first".to_string(),
                },
                &mut buf,
            )
            .unwrap();
        codec.encode(MonitorReply::ShuttingDown, &mut buf).unwrap();

        assert!(matches!(
            codec.decode(&mut buf).unwrap(),
            Some(MonitorReply::Output { text }) if text == "first"
        ));
        assert!(matches!(
            codec.decode(&mut buf).unwrap(),
            Some(MonitorReply::ShuttingDown)
        ));
        assert!(codec.decode(&mut buf).unwrap().is_none());
    }
}
