//! Message framing on the stdio pipe.
//!
//! A client either writes one JSON document per line, or prefixes each body
//! with `Content-Length` headers. Replies mirror the framing of the request
//! they answer.

use std::io::{self, BufRead, Read, Write};

use serde::Serialize;

/// Upper bound on a single inbound message. Tool arguments are a handful of
/// numbers and a country name.
pub const MAX_FRAME_BYTES: usize = 4 * 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Framing {
    Line,
    Header,
}

/// One unit read off the pipe.
#[derive(Debug, PartialEq, Eq)]
pub enum Inbound {
    Message { body: Vec<u8>, framing: Framing },
    /// The framing itself was unusable; the reader has resynchronized past it.
    Malformed { reason: String, framing: Framing },
}

pub struct MessageReader<R> {
    inner: R,
}

impl<R: BufRead> MessageReader<R> {
    pub const fn new(inner: R) -> Self {
        Self { inner }
    }

    /// Next message, or `None` at end of input. Blank lines between messages
    /// are skipped.
    pub fn next_message(&mut self) -> io::Result<Option<Inbound>> {
        loop {
            let Some(line) = self.read_bounded_line()? else {
                return Ok(None);
            };
            let line = match line {
                BoundedLine::Complete(line) => line,
                BoundedLine::Oversized => {
                    return Ok(Some(Inbound::Malformed {
                        reason: format!("message line exceeds {MAX_FRAME_BYTES} bytes"),
                        framing: Framing::Line,
                    }));
                }
            };

            let text = line.trim();
            if text.is_empty() {
                continue;
            }
            if header_name(text).is_some() {
                return self.read_framed(text).map(Some);
            }
            return Ok(Some(Inbound::Message {
                body: text.as_bytes().to_vec(),
                framing: Framing::Line,
            }));
        }
    }

    fn read_framed(&mut self, first_header: &str) -> io::Result<Inbound> {
        let mut declared = content_length(first_header);
        loop {
            let Some(BoundedLine::Complete(line)) = self.read_bounded_line()? else {
                return Ok(malformed_header("frame headers ended before the blank separator line"));
            };
            let header = line.trim();
            if header.is_empty() {
                break;
            }
            if let Some(value) = content_length(header) {
                declared = Some(value);
            }
        }

        let length = match declared {
            Some(Ok(length)) => length,
            Some(Err(raw)) => return Ok(malformed_header(&format!("invalid Content-Length `{raw}`"))),
            None => return Ok(malformed_header("missing Content-Length header")),
        };

        match usize::try_from(length) {
            Ok(size) if size <= MAX_FRAME_BYTES => {
                let mut body = vec![0_u8; size];
                if let Err(err) = self.inner.read_exact(&mut body) {
                    return Ok(malformed_header(&format!("frame body truncated: {err}")));
                }
                Ok(Inbound::Message {
                    body,
                    framing: Framing::Header,
                })
            }
            _ => {
                // Skip the declared body so the next frame starts on a boundary.
                io::copy(&mut (&mut self.inner).take(length), &mut io::sink())?;
                Ok(malformed_header(&format!(
                    "Content-Length {length} exceeds {MAX_FRAME_BYTES} bytes"
                )))
            }
        }
    }

    fn read_bounded_line(&mut self) -> io::Result<Option<BoundedLine>> {
        let mut buf = Vec::new();
        let limit = u64::try_from(MAX_FRAME_BYTES).unwrap_or(u64::MAX);
        let read = (&mut self.inner).take(limit).read_until(b'\n', &mut buf)?;
        if read == 0 {
            return Ok(None);
        }
        if buf.last() != Some(&b'\n') && buf.len() >= MAX_FRAME_BYTES {
            self.discard_rest_of_line()?;
            return Ok(Some(BoundedLine::Oversized));
        }
        Ok(Some(BoundedLine::Complete(
            String::from_utf8_lossy(&buf).into_owned(),
        )))
    }

    fn discard_rest_of_line(&mut self) -> io::Result<()> {
        loop {
            let available = self.inner.fill_buf()?;
            if available.is_empty() {
                return Ok(());
            }
            if let Some(pos) = available.iter().position(|b| *b == b'\n') {
                self.inner.consume(pos + 1);
                return Ok(());
            }
            let len = available.len();
            self.inner.consume(len);
        }
    }
}

enum BoundedLine {
    Complete(String),
    Oversized,
}

fn malformed_header(reason: &str) -> Inbound {
    Inbound::Malformed {
        reason: reason.to_string(),
        framing: Framing::Header,
    }
}

/// Header name when `line` looks like `Name: value` for a header we recognise.
fn header_name(line: &str) -> Option<&str> {
    let (name, _) = line.split_once(':')?;
    let name = name.trim();
    (name.eq_ignore_ascii_case("content-length") || name.eq_ignore_ascii_case("content-type"))
        .then_some(name)
}

/// `Some(Ok(n))` for a parseable `Content-Length`, `Some(Err(raw))` when the
/// value is not a number, `None` for any other header.
fn content_length(line: &str) -> Option<Result<u64, String>> {
    let (name, value) = line.split_once(':')?;
    if !name.trim().eq_ignore_ascii_case("content-length") {
        return None;
    }
    let value = value.trim();
    Some(value.parse::<u64>().map_err(|_| value.to_string()))
}

pub fn write_message<W: Write, T: Serialize>(
    writer: &mut W,
    framing: Framing,
    message: &T,
) -> io::Result<()> {
    let body = serde_json::to_vec(message)?;
    if framing == Framing::Header {
        write!(writer, "Content-Length: {}\r\n\r\n", body.len())?;
        writer.write_all(&body)?;
    } else {
        writer.write_all(&body)?;
        writer.write_all(b"\n")?;
    }
    writer.flush()
}
