//! Line-delimited JSON frames exchanged over the command channel.
//!
//! One frame per line. Requests carry a client-chosen id that the terminal
//! echoes back, which lets many callers share one socket. Quote pushes and
//! the goodbye notice are unsolicited and may arrive between any two replies.
use std::io::{BufRead, Write};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::command::Command;
use crate::error::MtApiError;
use crate::quote::MtQuote;
use crate::response::ResponseEnvelope;
use crate::result::Result;

/// Frames sent by the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ClientFrame {
    /// Greeting, first frame on a new connection.
    Hello {
        /// Catalogue version the client was built with.
        protocol_version: u32,
        /// Free-form client name, for terminal logs.
        client: String,
    },
    /// One command.
    Request {
        /// Correlation id echoed in the reply.
        id: u64,
        /// Command to execute.
        command: Command,
    },
    /// Asks for the currently subscribed quotes.
    GetQuotes {
        /// Correlation id echoed in the reply.
        id: u64,
    },
    /// Client is closing the channel.
    Goodbye,
}

/// Frames sent by the terminal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ServerFrame {
    /// Reply to `Hello`.
    Welcome {
        /// Catalogue version the terminal speaks.
        protocol_version: u32,
        /// Terminal name.
        terminal: String,
    },
    /// Reply to `Request`; `None` for operations without a result.
    Response {
        /// Id of the request being answered.
        id: u64,
        /// Reply payload.
        response: Option<ResponseEnvelope>,
    },
    /// Reply to `GetQuotes`.
    Quotes {
        /// Id of the request being answered.
        id: u64,
        /// Current quotes.
        quotes: Vec<MtQuote>,
    },
    /// An instrument was added to the quote registry.
    QuoteAdded {
        /// Pushed record; may be absent.
        quote: Option<MtQuote>,
    },
    /// An instrument's prices changed.
    QuoteUpdated {
        /// Pushed record; may be absent.
        quote: Option<MtQuote>,
    },
    /// An instrument was removed from the quote registry.
    QuoteRemoved {
        /// Pushed record; may be absent.
        quote: Option<MtQuote>,
    },
    /// Terminal is closing the channel gracefully.
    Goodbye,
}

/// Serializes `frame` as one line and flushes it.
pub fn write_frame<W: Write, F: Serialize>(writer: &mut W, frame: &F) -> Result<()> {
    let mut line = serde_json::to_vec(frame)?;
    line.push(b'\n');
    writer.write_all(&line)?;
    writer.flush()?;
    Ok(())
}

/// Reads frames line by line from a buffered reader.
pub struct FrameReader<R> {
    reader: R,
    line: String,
}

impl<R: BufRead> FrameReader<R> {
    /// Wraps a buffered reader.
    pub fn new(reader: R) -> Self {
        FrameReader {
            reader,
            line: String::new(),
        }
    }

    /// Reads the next frame. `Ok(None)` means the peer closed the stream.
    /// Blank lines are skipped.
    pub fn read_frame<F: DeserializeOwned>(&mut self) -> Result<Option<F>> {
        loop {
            self.line.clear();
            let size = self.reader.read_line(&mut self.line)?;
            if size == 0 {
                return Ok(None);
            }
            let trimmed = self.line.trim();
            if trimmed.is_empty() {
                continue;
            }
            return serde_json::from_str(trimmed)
                .map(Some)
                .map_err(|e| MtApiError::Protocol(format!("undecodable frame: {}", e)));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command_type::MtCommandType;
    use std::io::Cursor;

    #[test]
    fn reads_frames_and_eof() {
        let mut buf = Vec::new();
        write_frame(
            &mut buf,
            &ServerFrame::Response {
                id: 7,
                response: Some(ResponseEnvelope::Bool(true)),
            },
        )
        .unwrap();
        buf.extend_from_slice(b"\n");
        write_frame(&mut buf, &ServerFrame::QuoteUpdated { quote: None }).unwrap();

        let mut reader = FrameReader::new(Cursor::new(buf));
        let first: Option<ServerFrame> = reader.read_frame().unwrap();
        assert_eq!(
            first,
            Some(ServerFrame::Response {
                id: 7,
                response: Some(ResponseEnvelope::Bool(true))
            })
        );
        let second: Option<ServerFrame> = reader.read_frame().unwrap();
        assert_eq!(second, Some(ServerFrame::QuoteUpdated { quote: None }));
        let end: Option<ServerFrame> = reader.read_frame().unwrap();
        assert_eq!(end, None);
    }

    #[test]
    fn garbage_is_a_protocol_error() {
        let mut reader = FrameReader::new(Cursor::new(b"{not json}\n".to_vec()));
        let err = reader.read_frame::<ServerFrame>().unwrap_err();
        assert!(matches!(err, MtApiError::Protocol(_)));
    }

    #[test]
    fn request_layout() {
        let frame = ClientFrame::Request {
            id: 1,
            command: Command::bare(MtCommandType::AccountBalance),
        };
        let json = serde_json::to_value(&frame).unwrap();
        assert_eq!(json["type"], "Request");
        assert_eq!(json["command"]["operation"], 60);
    }
}
