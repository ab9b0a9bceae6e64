//! Minimal HTTP/1.1 client conversation for the stream endpoint.
//!
//! The server side is a plain Go `net/http` handler, so the client needs
//! exactly one exchange: write a `GET /stream` request, read the status
//! line and headers, then consume a streaming body (chunked
//! transfer-encoding, or identity bytes until close). Like the rest of the
//! stack, this is hand-spoken over the raw transport; parsing fails fast
//! with precise messages and never guesses.

use crate::errors::StreamError;
use bytes::{Bytes, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Upper bound on the response head; a bigger one is not HTTP.
const MAX_HEAD_LEN: usize = 16 * 1024;
/// Upper bound on one chunk-size line.
const MAX_CHUNK_LINE_LEN: usize = 128;

/// Write the stream request.
///
/// `rate_ms` becomes the `rate` query parameter the server feeds its frame
/// ticker with; the bearer token goes in the Authorization header when the
/// server has authentication enabled.
pub async fn send_stream_request<W: AsyncWrite + Unpin>(
    writer: &mut W,
    host: &str,
    rate_ms: u32,
    auth_token: Option<&str>,
) -> Result<(), StreamError> {
    let mut request = format!(
        "GET /stream?rate={} HTTP/1.1\r\n\
         Host: {}\r\n\
         Accept: application/octet-stream\r\n\
         Connection: close\r\n",
        rate_ms, host
    );
    if let Some(token) = auth_token {
        request.push_str("Authorization: Bearer ");
        request.push_str(token);
        request.push_str("\r\n");
    }
    request.push_str("\r\n");

    writer.write_all(request.as_bytes()).await?;
    writer.flush().await?;
    Ok(())
}

/// Parsed status line and headers of the response.
#[derive(Debug)]
pub struct ResponseHead {
    /// HTTP status code.
    pub status: u16,
    headers: Vec<(String, String)>,
}

impl ResponseHead {
    /// Look up a header value, case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// True if the body uses chunked transfer-encoding.
    pub fn is_chunked(&self) -> bool {
        self.header("transfer-encoding")
            .map(|v| v.to_ascii_lowercase().contains("chunked"))
            .unwrap_or(false)
    }
}

/// Read and parse the response head.
///
/// Body bytes that arrived in the same read as the head are left in `buf`
/// for the [`BodyReader`] to pick up.
pub async fn read_response_head<R: AsyncRead + Unpin>(
    reader: &mut R,
    buf: &mut BytesMut,
) -> Result<ResponseHead, StreamError> {
    loop {
        if let Some(end) = find_subslice(buf, b"\r\n\r\n") {
            let head = buf.split_to(end + 4);
            return parse_head(&head[..end]);
        }
        if buf.len() > MAX_HEAD_LEN {
            return Err(StreamError::MalformedResponse(
                "response head exceeds 16KiB".to_string(),
            ));
        }
        let n = reader.read_buf(buf).await?;
        if n == 0 {
            return Err(StreamError::MalformedResponse(
                "connection closed before response head".to_string(),
            ));
        }
    }
}

fn parse_head(head: &[u8]) -> Result<ResponseHead, StreamError> {
    let text = std::str::from_utf8(head)
        .map_err(|_| StreamError::MalformedResponse("response head is not UTF-8".to_string()))?;

    let mut lines = text.split("\r\n");
    let status_line = lines
        .next()
        .ok_or_else(|| StreamError::MalformedResponse("empty response".to_string()))?;

    let mut parts = status_line.splitn(3, ' ');
    let version = parts.next().unwrap_or_default();
    if !version.starts_with("HTTP/1.") {
        return Err(StreamError::MalformedResponse(format!(
            "not an HTTP/1.x status line: {:?}",
            status_line
        )));
    }
    let status: u16 = parts
        .next()
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| {
            StreamError::MalformedResponse(format!("bad status code in {:?}", status_line))
        })?;

    let mut headers = Vec::new();
    for line in lines {
        if line.is_empty() {
            continue;
        }
        let (name, value) = line.split_once(':').ok_or_else(|| {
            StreamError::MalformedResponse(format!("bad header line {:?}", line))
        })?;
        headers.push((name.trim().to_string(), value.trim().to_string()));
    }

    Ok(ResponseHead { status, headers })
}

fn find_subslice(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

/// Where the chunked-decoding state machine currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ChunkPhase {
    /// Expecting a chunk-size line.
    Size,
    /// Inside a chunk's data.
    Data { remaining: usize },
    /// Expecting the CRLF that terminates a chunk's data.
    Crlf,
    /// Consuming trailer lines after the final zero-size chunk.
    Trailers,
    /// Body complete.
    Done,
}

/// Streaming body reader: yields raw payload bytes with the HTTP framing
/// removed, in whatever sized pieces the transport delivers.
pub struct BodyReader<R> {
    reader: R,
    buf: BytesMut,
    chunked: bool,
    phase: ChunkPhase,
    eof: bool,
}

impl<R: AsyncRead + Unpin> BodyReader<R> {
    /// Wrap the transport's read half. `leftover` carries body bytes that
    /// arrived with the response head.
    pub fn new(reader: R, leftover: BytesMut, chunked: bool) -> Self {
        Self {
            reader,
            buf: leftover,
            chunked,
            phase: ChunkPhase::Size,
            eof: false,
        }
    }

    /// Read the next piece of the body.
    ///
    /// Returns `Ok(None)` when the body is cleanly finished: EOF for an
    /// identity body, the terminal chunk for a chunked one. The returned
    /// pieces have arbitrary sizes and boundaries; the record framer
    /// downstream is chunking-agnostic by design.
    pub async fn next_chunk(&mut self) -> Result<Option<Bytes>, StreamError> {
        if self.chunked {
            self.next_chunked().await
        } else {
            self.next_identity().await
        }
    }

    async fn next_identity(&mut self) -> Result<Option<Bytes>, StreamError> {
        loop {
            if !self.buf.is_empty() {
                return Ok(Some(self.buf.split().freeze()));
            }
            if self.eof {
                return Ok(None);
            }
            let n = self.reader.read_buf(&mut self.buf).await?;
            if n == 0 {
                self.eof = true;
                return Ok(None);
            }
        }
    }

    async fn next_chunked(&mut self) -> Result<Option<Bytes>, StreamError> {
        loop {
            match self.phase {
                ChunkPhase::Size => {
                    if let Some(line_end) = find_subslice(&self.buf, b"\r\n") {
                        let line = self.buf.split_to(line_end + 2);
                        let size = parse_chunk_size(&line[..line_end])?;
                        self.phase = if size == 0 {
                            ChunkPhase::Trailers
                        } else {
                            ChunkPhase::Data { remaining: size }
                        };
                        continue;
                    }
                    if self.buf.len() > MAX_CHUNK_LINE_LEN {
                        return Err(StreamError::MalformedResponse(
                            "chunk size line too long".to_string(),
                        ));
                    }
                    self.fill().await?;
                }
                ChunkPhase::Data { remaining } => {
                    if !self.buf.is_empty() {
                        let take = remaining.min(self.buf.len());
                        let piece = self.buf.split_to(take).freeze();
                        self.phase = if take == remaining {
                            ChunkPhase::Crlf
                        } else {
                            ChunkPhase::Data {
                                remaining: remaining - take,
                            }
                        };
                        return Ok(Some(piece));
                    }
                    self.fill().await?;
                }
                ChunkPhase::Crlf => {
                    if self.buf.len() >= 2 {
                        let crlf = self.buf.split_to(2);
                        if &crlf[..] != b"\r\n" {
                            return Err(StreamError::MalformedResponse(
                                "missing CRLF after chunk data".to_string(),
                            ));
                        }
                        self.phase = ChunkPhase::Size;
                        continue;
                    }
                    self.fill().await?;
                }
                ChunkPhase::Trailers => {
                    if let Some(line_end) = find_subslice(&self.buf, b"\r\n") {
                        self.buf.split_to(line_end + 2);
                        if line_end == 0 {
                            self.phase = ChunkPhase::Done;
                        }
                        continue;
                    }
                    // EOF inside the trailer section still counts as a
                    // complete body; the payload is all delivered.
                    let n = self.reader.read_buf(&mut self.buf).await?;
                    if n == 0 {
                        self.phase = ChunkPhase::Done;
                    }
                }
                ChunkPhase::Done => return Ok(None),
            }
        }
    }

    async fn fill(&mut self) -> Result<(), StreamError> {
        let n = self.reader.read_buf(&mut self.buf).await?;
        if n == 0 {
            return Err(StreamError::Transport(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                "connection closed mid-chunk",
            )));
        }
        Ok(())
    }
}

fn parse_chunk_size(line: &[u8]) -> Result<usize, StreamError> {
    let text = std::str::from_utf8(line)
        .map_err(|_| StreamError::MalformedResponse("chunk size is not UTF-8".to_string()))?;
    // Chunk extensions (";name=value") are permitted and ignored.
    let size_part = text.split(';').next().unwrap_or_default().trim();
    usize::from_str_radix(size_part, 16).map_err(|_| {
        StreamError::MalformedResponse(format!("bad chunk size {:?}", size_part))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    async fn drain<R: AsyncRead + Unpin>(body: &mut BodyReader<R>) -> Vec<u8> {
        let mut out = Vec::new();
        while let Some(piece) = body.next_chunk().await.unwrap() {
            out.extend_from_slice(&piece);
        }
        out
    }

    #[tokio::test]
    async fn test_read_response_head() {
        let raw = b"HTTP/1.1 200 OK\r\nContent-Type: application/octet-stream\r\nTransfer-Encoding: chunked\r\n\r\nBODY";
        let mut reader = Cursor::new(raw.to_vec());
        let mut buf = BytesMut::new();

        let head = read_response_head(&mut reader, &mut buf).await.unwrap();
        assert_eq!(head.status, 200);
        assert_eq!(head.header("content-type"), Some("application/octet-stream"));
        assert_eq!(head.header("CONTENT-TYPE"), Some("application/octet-stream"));
        assert!(head.is_chunked());
        // Body bytes stay in the scratch buffer.
        assert_eq!(&buf[..], b"BODY");
    }

    #[tokio::test]
    async fn test_read_response_head_429() {
        let raw = b"HTTP/1.1 429 Too Many Requests\r\n\r\n";
        let mut reader = Cursor::new(raw.to_vec());
        let mut buf = BytesMut::new();
        let head = read_response_head(&mut reader, &mut buf).await.unwrap();
        assert_eq!(head.status, 429);
        assert!(!head.is_chunked());
    }

    #[tokio::test]
    async fn test_non_http_response_is_malformed() {
        let raw = b"SSH-2.0-dropbear\r\n whatever\r\n\r\n";
        let mut reader = Cursor::new(raw.to_vec());
        let mut buf = BytesMut::new();
        let err = read_response_head(&mut reader, &mut buf).await.unwrap_err();
        assert!(matches!(err, StreamError::MalformedResponse(_)));
    }

    #[tokio::test]
    async fn test_eof_before_head() {
        let mut reader = Cursor::new(b"HTTP/1.1 200".to_vec());
        let mut buf = BytesMut::new();
        let err = read_response_head(&mut reader, &mut buf).await.unwrap_err();
        assert!(matches!(err, StreamError::MalformedResponse(_)));
    }

    #[tokio::test]
    async fn test_identity_body() {
        let reader = Cursor::new(b"rest-of-body".to_vec());
        let mut body = BodyReader::new(reader, BytesMut::from(&b"head-leftover:"[..]), false);
        assert_eq!(drain(&mut body).await, b"head-leftover:rest-of-body");
        // Stays finished.
        assert!(body.next_chunk().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_chunked_body() {
        // Two chunks, "hello " and "world", then the terminal chunk.
        let wire = b"6\r\nhello \r\n5\r\nworld\r\n0\r\n\r\n";
        let mut body = BodyReader::new(Cursor::new(wire.to_vec()), BytesMut::new(), true);
        assert_eq!(drain(&mut body).await, b"hello world");
        assert!(body.next_chunk().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_chunked_body_with_extension_and_trailer() {
        let wire = b"4;ext=1\r\nabcd\r\n0\r\nX-Trailer: 1\r\n\r\n";
        let mut body = BodyReader::new(Cursor::new(wire.to_vec()), BytesMut::new(), true);
        assert_eq!(drain(&mut body).await, b"abcd");
    }

    #[tokio::test]
    async fn test_chunked_body_split_across_reads() {
        // A duplex pipe delivers the wire bytes in awkward pieces.
        let (client, mut server) = tokio::io::duplex(8);
        let writer = tokio::spawn(async move {
            for piece in [
                &b"6\r"[..],
                &b"\nhel"[..],
                &b"lo \r\n5\r\nwo"[..],
                &b"rld\r\n0\r\n"[..],
                &b"\r\n"[..],
            ] {
                server.write_all(piece).await.unwrap();
            }
        });

        let mut body = BodyReader::new(client, BytesMut::new(), true);
        assert_eq!(drain(&mut body).await, b"hello world");
        writer.await.unwrap();
    }

    #[tokio::test]
    async fn test_chunked_eof_mid_chunk_is_an_error() {
        let wire = b"A\r\nhello"; // 10 bytes promised, 5 delivered
        let mut body = BodyReader::new(Cursor::new(wire.to_vec()), BytesMut::new(), true);
        // First piece surfaces the 5 buffered bytes...
        assert_eq!(&body.next_chunk().await.unwrap().unwrap()[..], b"hello");
        // ...then the missing remainder is a transport error.
        assert!(matches!(
            body.next_chunk().await,
            Err(StreamError::Transport(_))
        ));
    }

    #[tokio::test]
    async fn test_bad_chunk_size() {
        let wire = b"zz\r\nhello\r\n";
        let mut body = BodyReader::new(Cursor::new(wire.to_vec()), BytesMut::new(), true);
        assert!(matches!(
            body.next_chunk().await,
            Err(StreamError::MalformedResponse(_))
        ));
    }

    #[tokio::test]
    async fn test_send_stream_request_format() {
        let mut out = Vec::new();
        send_stream_request(&mut out, "10.11.99.1:2001", 150, Some("tok123"))
            .await
            .unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("GET /stream?rate=150 HTTP/1.1\r\n"));
        assert!(text.contains("Host: 10.11.99.1:2001\r\n"));
        assert!(text.contains("Authorization: Bearer tok123\r\n"));
        assert!(text.ends_with("\r\n\r\n"));
    }

    #[tokio::test]
    async fn test_send_stream_request_without_token() {
        let mut out = Vec::new();
        send_stream_request(&mut out, "host", 200, None).await.unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(!text.contains("Authorization"));
    }
}
