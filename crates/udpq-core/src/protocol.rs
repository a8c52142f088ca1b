//! Wire protocol: request classification and reply encoding.
//!
//! A request is one datagram of ASCII text. The command is the token before
//! the first whitespace and must match exactly (`PUT`, `GET`, `EXIT`). Fixed
//! replies end in `\n`; a `GET` reply is the stored payload, byte for byte.

use std::fmt;

/// Size of the receive buffer; longer datagrams are cut by the socket.
pub const MAX_DATAGRAM: usize = 1024;

/// Text sent in reply to `EXIT`.
pub const SHUTDOWN_NOTICE: &str = "Server is shutting down";

/// A classified request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command<'a> {
    /// `PUT <value>`; holds everything after the first four characters.
    Put(&'a str),
    Get,
    Exit,
    /// Unrecognized or malformed request.
    Invalid,
}

impl<'a> Command<'a> {
    /// Classify a decoded request line.
    pub fn parse(line: &'a str) -> Self {
        let token = line
            .split(|c: char| c.is_ascii_whitespace())
            .next()
            .unwrap_or("");
        match token {
            "PUT" => Command::Put(line.get(4..).unwrap_or("")),
            "GET" => Command::Get,
            "EXIT" => Command::Exit,
            _ => Command::Invalid,
        }
    }

    /// Short name used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            Command::Put(_) => "PUT",
            Command::Get => "GET",
            Command::Exit => "EXIT",
            Command::Invalid => "INVALID",
        }
    }
}

/// Decode a received datagram as text.
///
/// The text ends at the datagram's length or at the first NUL byte,
/// whichever comes first. Invalid UTF-8 is replaced, which can only make a
/// request fail validation, never pass it.
pub fn decode_request(datagram: &[u8]) -> String {
    let end = datagram
        .iter()
        .position(|&b| b == 0)
        .unwrap_or(datagram.len());
    String::from_utf8_lossy(&datagram[..end]).into_owned()
}

/// Application-level error codes carried in `ERROR <n>` replies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// `GET` on an empty queue.
    QueueEmpty = 1,
    /// Unrecognized command.
    InvalidCommand = 2,
    /// `PUT` with a value that is not a number.
    InvalidNumber = 3,
}

impl ErrorCode {
    pub fn code(self) -> u8 {
        self as u8
    }
}

/// Exactly one reply is sent per request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// Value accepted.
    Ok,
    /// A dequeued payload, returned unmodified.
    Value(String),
    Error(ErrorCode),
    /// Answer to `EXIT`.
    ShuttingDown,
}

impl Reply {
    /// Bytes put on the wire.
    pub fn to_wire(&self) -> Vec<u8> {
        match self {
            Reply::Value(payload) => payload.as_bytes().to_vec(),
            other => format!("{other}\n").into_bytes(),
        }
    }
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reply::Ok => f.write_str("OK"),
            Reply::Value(payload) => f.write_str(payload),
            Reply::Error(code) => write!(f, "ERROR {}", code.code()),
            Reply::ShuttingDown => f.write_str(SHUTDOWN_NOTICE),
        }
    }
}
