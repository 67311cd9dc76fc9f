use std::collections::HashMap;
use std::io::{Read, Write};

use base64::engine::general_purpose::STANDARD as BASE64_ENGINE;
use base64::Engine as _;
use sha1::{Digest, Sha1};

const WS_GUID: &str = "258EAFA5-E914-47DA-95CA-C5AB0DC85B11";
pub const MAX_PAYLOAD_BYTES: usize = 64 * 1024;
const MAX_CONTROL_PAYLOAD: u64 = 125;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Opcode {
    Continuation,
    Text,
    Binary,
    Close,
    Ping,
    Pong,
}

impl Opcode {
    fn from_bits(bits: u8) -> Option<Self> {
        match bits {
            0x0 => Some(Self::Continuation),
            0x1 => Some(Self::Text),
            0x2 => Some(Self::Binary),
            0x8 => Some(Self::Close),
            0x9 => Some(Self::Ping),
            0xA => Some(Self::Pong),
            _ => None,
        }
    }

    fn bits(self) -> u8 {
        match self {
            Self::Continuation => 0x0,
            Self::Text => 0x1,
            Self::Binary => 0x2,
            Self::Close => 0x8,
            Self::Ping => 0x9,
            Self::Pong => 0xA,
        }
    }

    fn is_control(self) -> bool {
        matches!(self, Self::Close | Self::Ping | Self::Pong)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WsFrame {
    pub opcode: Opcode,
    pub payload: Vec<u8>,
}

#[derive(Debug)]
pub enum WsFrameError {
    Timeout,
    Closed,
    Io(std::io::Error),
    Protocol(String),
}

impl std::fmt::Display for WsFrameError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WsFrameError::Timeout => f.write_str("read timed out"),
            WsFrameError::Closed => f.write_str("connection closed"),
            WsFrameError::Io(err) => write!(f, "io error: {}", err),
            WsFrameError::Protocol(message) => write!(f, "protocol error: {}", message),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct WsHandshakeConfig {
    /// `None` accepts any origin; a `*` entry does the same.
    pub allowed_origins: Option<Vec<String>>,
}

const MAX_REQUEST_BYTES: usize = 8192;

/// `Sec-WebSocket-Accept` value for a client key.
pub fn accept_key(client_key: &str) -> String {
    let mut sha1 = Sha1::new();
    sha1.update(client_key.trim().as_bytes());
    sha1.update(WS_GUID.as_bytes());
    BASE64_ENGINE.encode(sha1.finalize())
}

pub fn origin_allowed(allowed: Option<&[String]>, origin: Option<&str>) -> bool {
    let Some(allowed) = allowed else {
        return true;
    };
    let origin = origin.map(str::trim).unwrap_or("");
    allowed
        .iter()
        .any(|entry| entry == "*" || entry == origin)
}

/// Reads the HTTP upgrade request and answers it. Rejections are answered with
/// an HTTP error status before the error is returned.
pub fn accept_handshake<S: Read + Write>(
    stream: &mut S,
    config: &WsHandshakeConfig,
) -> Result<String, String> {
    let request = read_http_request(stream)?;
    let (path, headers) = parse_headers(&request)?;

    let upgrade = headers
        .get("upgrade")
        .map(|value| value.to_ascii_lowercase())
        .unwrap_or_default();
    if upgrade != "websocket" {
        reject_handshake(stream, 400, "Bad Request")?;
        return Err("websocket upgrade missing".to_string());
    }
    let connection = headers
        .get("connection")
        .map(|value| value.to_ascii_lowercase())
        .unwrap_or_default();
    if !connection.contains("upgrade") {
        reject_handshake(stream, 400, "Bad Request")?;
        return Err("websocket connection upgrade missing".to_string());
    }
    let version = headers
        .get("sec-websocket-version")
        .map(|value| value.trim())
        .unwrap_or("");
    if version != "13" {
        reject_handshake(stream, 426, "Upgrade Required")?;
        return Err(format!("unsupported websocket version '{version}'"));
    }
    let Some(key) = headers.get("sec-websocket-key") else {
        reject_handshake(stream, 400, "Bad Request")?;
        return Err("missing sec-websocket-key".to_string());
    };
    if !origin_allowed(
        config.allowed_origins.as_deref(),
        headers.get("origin").map(String::as_str),
    ) {
        reject_handshake(stream, 403, "Forbidden")?;
        return Err(format!(
            "websocket origin rejected: {}",
            headers.get("origin").map(String::as_str).unwrap_or("<none>")
        ));
    }

    let response = format!(
        "HTTP/1.1 101 Switching Protocols\r\n\
Upgrade: websocket\r\n\
Connection: Upgrade\r\n\
Sec-WebSocket-Accept: {}\r\n\
\r\n",
        accept_key(key)
    );
    stream
        .write_all(response.as_bytes())
        .map_err(|err| format!("websocket handshake write failed: {err}"))?;
    Ok(path)
}

/// Reads one complete client frame. Client frames must be masked and unfragmented.
pub fn read_frame<R: Read>(stream: &mut R) -> Result<WsFrame, WsFrameError> {
    let mut header = [0u8; 2];
    stream.read_exact(&mut header).map_err(map_read_error)?;

    let fin = header[0] & 0x80 != 0;
    let opcode = Opcode::from_bits(header[0] & 0x0f).ok_or_else(|| {
        WsFrameError::Protocol(format!("unknown opcode {:#x}", header[0] & 0x0f))
    })?;
    if !fin || opcode == Opcode::Continuation {
        return Err(WsFrameError::Protocol(
            "fragmented frames not supported".to_string(),
        ));
    }
    if header[1] & 0x80 == 0 {
        return Err(WsFrameError::Protocol("client frame not masked".to_string()));
    }

    let len = match header[1] & 0x7f {
        126 => {
            let mut ext = [0u8; 2];
            stream.read_exact(&mut ext).map_err(map_read_error)?;
            u64::from(u16::from_be_bytes(ext))
        }
        127 => {
            let mut ext = [0u8; 8];
            stream.read_exact(&mut ext).map_err(map_read_error)?;
            u64::from_be_bytes(ext)
        }
        short => u64::from(short),
    };
    if opcode.is_control() && len > MAX_CONTROL_PAYLOAD {
        return Err(WsFrameError::Protocol(
            "control frame payload too large".to_string(),
        ));
    }
    if len > MAX_PAYLOAD_BYTES as u64 {
        return Err(WsFrameError::Protocol(format!(
            "payload {} exceeds max {}",
            len, MAX_PAYLOAD_BYTES
        )));
    }

    let mut mask = [0u8; 4];
    stream.read_exact(&mut mask).map_err(map_read_error)?;
    let mut payload = vec![0u8; len as usize];
    stream.read_exact(&mut payload).map_err(map_read_error)?;
    for (index, byte) in payload.iter_mut().enumerate() {
        *byte ^= mask[index % 4];
    }
    Ok(WsFrame { opcode, payload })
}

/// Writes one unmasked server frame.
pub fn write_frame<W: Write>(stream: &mut W, opcode: Opcode, payload: &[u8]) -> Result<(), String> {
    let len = payload.len();
    let mut frame = Vec::with_capacity(len + 10);
    frame.push(0x80 | opcode.bits());
    if len < 126 {
        frame.push(len as u8);
    } else if len <= u16::MAX as usize {
        frame.push(126);
        frame.extend_from_slice(&(len as u16).to_be_bytes());
    } else {
        frame.push(127);
        frame.extend_from_slice(&(len as u64).to_be_bytes());
    }
    frame.extend_from_slice(payload);
    stream
        .write_all(&frame)
        .map_err(|err| format!("websocket frame write failed: {err}"))?;
    stream
        .flush()
        .map_err(|err| format!("websocket flush failed: {err}"))
}

pub fn write_text<W: Write>(stream: &mut W, text: &str) -> Result<(), String> {
    write_frame(stream, Opcode::Text, text.as_bytes())
}

/// Reads the request one byte at a time and stops at the blank line, so a
/// frame pipelined behind the handshake stays unread in the stream.
fn read_http_request<R: Read>(stream: &mut R) -> Result<String, String> {
    let mut data = Vec::with_capacity(512);
    let mut byte = [0u8; 1];
    while !data.ends_with(b"\r\n\r\n") {
        let read = stream
            .read(&mut byte)
            .map_err(|err| format!("handshake read failed: {err}"))?;
        if read == 0 {
            return Err("handshake closed".to_string());
        }
        data.push(byte[0]);
        if data.len() > MAX_REQUEST_BYTES {
            return Err("handshake exceeded max bytes".to_string());
        }
    }
    Ok(String::from_utf8_lossy(&data).into_owned())
}

fn parse_headers(request: &str) -> Result<(String, HashMap<String, String>), String> {
    let mut lines = request.split("\r\n");
    let request_line = lines
        .next()
        .ok_or_else(|| "empty handshake request".to_string())?;
    let mut parts = request_line.split_whitespace();
    let method = parts.next().unwrap_or("");
    let path = parts.next().unwrap_or("/");
    if !method.eq_ignore_ascii_case("GET") {
        return Err(format!("unexpected method '{method}'"));
    }
    let headers = lines
        .take_while(|line| !line.is_empty())
        .filter_map(|line| line.split_once(':'))
        .map(|(key, value)| (key.trim().to_ascii_lowercase(), value.trim().to_string()))
        .collect();
    Ok((path.to_string(), headers))
}

fn reject_handshake<W: Write>(stream: &mut W, code: u16, reason: &str) -> Result<(), String> {
    let response = format!("HTTP/1.1 {code} {reason}\r\nConnection: close\r\n\r\n");
    stream
        .write_all(response.as_bytes())
        .map_err(|err| format!("handshake reject write failed: {err}"))
}

fn map_read_error(err: std::io::Error) -> WsFrameError {
    match err.kind() {
        std::io::ErrorKind::TimedOut | std::io::ErrorKind::WouldBlock => WsFrameError::Timeout,
        std::io::ErrorKind::UnexpectedEof | std::io::ErrorKind::ConnectionReset => {
            WsFrameError::Closed
        }
        _ => WsFrameError::Io(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    /// In-memory duplex: reads from `input`, collects writes in `output`.
    struct Duplex {
        input: Cursor<Vec<u8>>,
        output: Vec<u8>,
    }

    impl Duplex {
        fn new(input: &[u8]) -> Self {
            Self {
                input: Cursor::new(input.to_vec()),
                output: Vec::new(),
            }
        }
    }

    impl Read for Duplex {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            self.input.read(buf)
        }
    }

    impl Write for Duplex {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.output.write(buf)
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    fn masked_frame(first: u8, payload: &[u8]) -> Vec<u8> {
        let mask = [0x12, 0x34, 0x56, 0x78];
        let mut frame = vec![first];
        if payload.len() < 126 {
            frame.push(0x80 | payload.len() as u8);
        } else {
            frame.push(0x80 | 126);
            frame.extend_from_slice(&(payload.len() as u16).to_be_bytes());
        }
        frame.extend_from_slice(&mask);
        frame.extend(payload.iter().enumerate().map(|(i, b)| b ^ mask[i % 4]));
        frame
    }

    const REQUEST: &str = "GET /socket HTTP/1.1\r\n\
Host: localhost:3002\r\n\
Upgrade: websocket\r\n\
Connection: keep-alive, Upgrade\r\n\
Origin: http://localhost:5173\r\n\
Sec-WebSocket-Key: dGhlIHNhbXBsZSBub25jZQ==\r\n\
Sec-WebSocket-Version: 13\r\n\r\n";

    #[test]
    fn accept_key_matches_rfc_example() {
        assert_eq!(
            accept_key("dGhlIHNhbXBsZSBub25jZQ=="),
            "s3pPLMBiTxaQ9kYGzzhZRbK+xOo="
        );
    }

    #[test]
    fn handshake_switches_protocols() {
        let mut stream = Duplex::new(REQUEST.as_bytes());
        let path = accept_handshake(&mut stream, &WsHandshakeConfig::default()).expect("handshake");
        assert_eq!(path, "/socket");
        let response = String::from_utf8(stream.output).expect("utf8");
        assert!(response.starts_with("HTTP/1.1 101"));
        assert!(response.contains("Sec-WebSocket-Accept: s3pPLMBiTxaQ9kYGzzhZRbK+xOo="));
    }

    #[test]
    fn frame_sent_with_handshake_is_kept() {
        let mut input = REQUEST.as_bytes().to_vec();
        input.extend(masked_frame(0x81, br#"{"event":"playerAttack"}"#));
        let mut stream = Duplex::new(&input);
        accept_handshake(&mut stream, &WsHandshakeConfig::default()).expect("handshake");
        let frame = read_frame(&mut stream).expect("pipelined frame");
        assert_eq!(frame.opcode, Opcode::Text);
        assert_eq!(frame.payload, br#"{"event":"playerAttack"}"#.to_vec());
    }

    #[test]
    fn handshake_rejects_foreign_origin() {
        let mut stream = Duplex::new(REQUEST.as_bytes());
        let config = WsHandshakeConfig {
            allowed_origins: Some(vec!["https://wildwood.example".to_string()]),
        };
        assert!(accept_handshake(&mut stream, &config).is_err());
        let response = String::from_utf8(stream.output).expect("utf8");
        assert!(response.starts_with("HTTP/1.1 403"));
    }

    #[test]
    fn wildcard_origin_allows_everything() {
        let allowed = vec!["*".to_string()];
        assert!(origin_allowed(Some(allowed.as_slice()), None));
        assert!(origin_allowed(None, Some("http://anywhere")));
        let empty: Vec<String> = Vec::new();
        assert!(!origin_allowed(Some(empty.as_slice()), Some("http://anywhere")));
    }

    #[test]
    fn reads_masked_text_frame() {
        let bytes = masked_frame(0x81, br#"{"event":"playerAttack"}"#);
        let frame = read_frame(&mut Cursor::new(bytes)).expect("frame");
        assert_eq!(frame.opcode, Opcode::Text);
        assert_eq!(frame.payload, br#"{"event":"playerAttack"}"#.to_vec());
    }

    #[test]
    fn reads_extended_length_frame() {
        let payload = vec![b'x'; 300];
        let frame = read_frame(&mut Cursor::new(masked_frame(0x81, &payload))).expect("frame");
        assert_eq!(frame.payload.len(), 300);
    }

    #[test]
    fn rejects_fragmented_and_unmasked_frames() {
        let fragmented = masked_frame(0x01, b"part");
        assert!(matches!(
            read_frame(&mut Cursor::new(fragmented)),
            Err(WsFrameError::Protocol(_))
        ));
        let unmasked = vec![0x81, 0x02, b'h', b'i'];
        assert!(matches!(
            read_frame(&mut Cursor::new(unmasked)),
            Err(WsFrameError::Protocol(_))
        ));
    }

    #[test]
    fn rejects_oversized_payload() {
        let mut header = vec![0x81, 0x80 | 127];
        header.extend_from_slice(&((MAX_PAYLOAD_BYTES as u64) + 1).to_be_bytes());
        assert!(matches!(
            read_frame(&mut Cursor::new(header)),
            Err(WsFrameError::Protocol(_))
        ));
    }

    #[test]
    fn truncated_frame_reports_closed() {
        assert!(matches!(
            read_frame(&mut Cursor::new(vec![0x81])),
            Err(WsFrameError::Closed)
        ));
    }

    #[test]
    fn writes_unmasked_server_frames() {
        let mut out = Vec::new();
        write_text(&mut out, "hi").expect("write");
        assert_eq!(out, vec![0x81, 0x02, b'h', b'i']);

        let mut out = Vec::new();
        let payload = vec![0u8; 200];
        write_frame(&mut out, Opcode::Binary, &payload).expect("write");
        assert_eq!(&out[..4], &[0x82, 126, 0x00, 0xC8]);
        assert_eq!(out.len(), 204);
    }
}
