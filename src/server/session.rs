//! Per-connection session loop
//!
//! Reads request lines, runs each one on the blocking pool and writes one
//! reply line back. Works over any async byte stream, so TCP connections,
//! stdio and in-memory test pipes share the same loop.

use log::{debug, error, info, warn};
use std::io;
use std::sync::Arc;
use tokio::io::{
    AsyncBufRead, AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader,
};

use crate::protocol::{Reply, handle_line};
use crate::storage::BaseDir;

/// One request line read under the length limit
#[derive(Debug, PartialEq)]
enum RequestLine {
    Eof,
    Line(Vec<u8>),
    /// Already discarded up to and including the next newline
    TooLong(usize),
}

/// Serves requests from `reader` until EOF or a transport error.
///
/// Requests on one session are handled in order; operation failures are
/// replied to and never end the session.
pub async fn handle_session<R, W>(
    reader: R,
    mut writer: W,
    base: Arc<BaseDir>,
    max_request_length: usize,
    peer: &str,
) -> io::Result<()>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut reader = BufReader::new(reader);

    loop {
        let reply = match read_request_line(&mut reader, max_request_length).await {
            Ok(RequestLine::Eof) => {
                info!("Connection closed by client {}", peer);
                break;
            }
            Ok(RequestLine::TooLong(len)) => {
                warn!(
                    "Request from {} too long ({} bytes, limit {})",
                    peer, len, max_request_length
                );
                Reply::bad_request(None, "Request too long")
            }
            Ok(RequestLine::Line(bytes)) => match String::from_utf8(bytes) {
                Ok(line) if line.trim().is_empty() => continue,
                Ok(line) => dispatch(Arc::clone(&base), line).await,
                Err(e) => {
                    warn!("Non UTF-8 request from {}: {}", peer, e);
                    Reply::bad_request(None, "Malformed request: invalid UTF-8")
                }
            },
            Err(e) => {
                error!("Failed to read from {}: {}", peer, e);
                return Err(e);
            }
        };

        writer.write_all(reply.to_line().as_bytes()).await?;
        writer.flush().await?;
    }

    Ok(())
}

/// Reads at most `max_request_length` payload bytes plus a `\r\n`
/// terminator, so an endless line never grows the buffer past the limit.
async fn read_request_line<R>(reader: &mut R, max_request_length: usize) -> io::Result<RequestLine>
where
    R: AsyncBufRead + Unpin,
{
    let bound = max_request_length as u64 + 2;
    let mut buf = Vec::new();
    let read = (&mut *reader).take(bound).read_until(b'\n', &mut buf).await?;

    if read == 0 {
        return Ok(RequestLine::Eof);
    }

    if !buf.ends_with(b"\n") && read as u64 == bound {
        let discarded = discard_line(reader).await?;
        return Ok(RequestLine::TooLong(read + discarded));
    }

    if strip_terminator(&buf).len() > max_request_length {
        return Ok(RequestLine::TooLong(read));
    }

    Ok(RequestLine::Line(buf))
}

fn strip_terminator(line: &[u8]) -> &[u8] {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    line.strip_suffix(b"\r").unwrap_or(line)
}

/// Drops input through the next newline (or EOF) without buffering it.
async fn discard_line<R>(reader: &mut R) -> io::Result<usize>
where
    R: AsyncBufRead + Unpin,
{
    let mut discarded = 0;
    loop {
        let available = reader.fill_buf().await?;
        if available.is_empty() {
            return Ok(discarded);
        }

        let newline = available.iter().position(|&b| b == b'\n');
        let len = available.len();
        match newline {
            Some(pos) => {
                reader.consume(pos + 1);
                return Ok(discarded + pos + 1);
            }
            None => {
                reader.consume(len);
                discarded += len;
            }
        }
    }
}

/// Runs one request on the blocking pool; a panicking handler becomes an
/// internal error reply.
async fn dispatch(base: Arc<BaseDir>, line: String) -> Reply {
    match tokio::task::spawn_blocking(move || handle_line(&base, &line)).await {
        Ok(reply) => {
            debug!("Reply: {:?}", reply);
            reply
        }
        Err(e) => {
            error!("Request handler failed: {}", e);
            Reply::internal_error(None, "Internal server error")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;
    use tempfile::TempDir;

    async fn run_session(base: BaseDir, input: &[u8], limit: usize) -> Vec<Value> {
        let (client, server) = tokio::io::duplex(64 * 1024);
        let (server_read, server_write) = tokio::io::split(server);
        let session = tokio::spawn(handle_session(
            server_read,
            server_write,
            Arc::new(base),
            limit,
            "test",
        ));

        let (mut client_read, mut client_write) = tokio::io::split(client);
        client_write.write_all(input).await.unwrap();
        client_write.shutdown().await.unwrap();

        let mut output = String::new();
        client_read.read_to_string(&mut output).await.unwrap();
        session.await.unwrap().unwrap();

        output
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect()
    }

    #[tokio::test]
    async fn test_replies_in_order_and_skips_blank_lines() {
        let dir = TempDir::new().unwrap();
        let base = BaseDir::open(dir.path()).unwrap();
        let input = b"{\"id\":1,\"op\":\"write\",\"file_path\":\"x.txt\",\"content\":\"1\"}\n\n{\"id\":2,\"op\":\"read\",\"file_path\":\"x.txt\"}\n";

        let replies = run_session(base, input, 1024).await;
        assert_eq!(replies.len(), 2);
        assert_eq!(replies[0]["id"], 1);
        assert_eq!(replies[1]["id"], 2);
        assert_eq!(replies[1]["result"]["content"], "1");
    }

    #[tokio::test]
    async fn test_long_request_rejected_and_session_continues() {
        let dir = TempDir::new().unwrap();
        let base = BaseDir::open(dir.path()).unwrap();
        let long = format!("{{\"op\":\"read\",\"file_path\":\"{}\"}}\n", "a".repeat(200));
        let input = format!("{}{{\"op\":\"list\"}}\n", long);

        let replies = run_session(base, input.as_bytes(), 100).await;
        assert_eq!(replies[0]["status"], 400);
        assert_eq!(replies[0]["detail"], "Request too long");
        assert_eq!(replies[1]["status"], 200);
    }

    #[tokio::test]
    async fn test_unbounded_line_is_discarded_and_session_continues() {
        let dir = TempDir::new().unwrap();
        let base = BaseDir::open(dir.path()).unwrap();
        // Far past the limit before any newline shows up
        let input = format!("{}\n{{\"op\":\"list\"}}\n", "a".repeat(20_000));

        let replies = run_session(base, input.as_bytes(), 100).await;
        assert_eq!(replies.len(), 2);
        assert_eq!(replies[0]["detail"], "Request too long");
        assert_eq!(replies[1]["status"], 200);
    }

    #[tokio::test]
    async fn test_request_of_exactly_the_limit_is_accepted() {
        let dir = TempDir::new().unwrap();
        let base = BaseDir::open(dir.path()).unwrap();
        let request = r#"{"op":"list"}"#;
        // \n, \r\n and a final unterminated line
        let input = format!("{request}\n{request}\r\n{request}");

        let replies = run_session(base, input.as_bytes(), request.len()).await;
        assert_eq!(replies.len(), 3);
        for reply in &replies {
            assert_eq!(reply["status"], 200);
        }
    }

    #[tokio::test]
    async fn test_read_request_line_stops_at_bound() {
        let input = vec![b'x'; 1000];
        let mut reader = BufReader::new(&input[..]);
        assert_eq!(
            read_request_line(&mut reader, 10).await.unwrap(),
            RequestLine::TooLong(1000)
        );
        assert_eq!(
            read_request_line(&mut reader, 10).await.unwrap(),
            RequestLine::Eof
        );
    }

    #[tokio::test]
    async fn test_invalid_utf8_line_gets_bad_request() {
        let dir = TempDir::new().unwrap();
        let base = BaseDir::open(dir.path()).unwrap();
        let mut input = vec![0xff, 0xfe, b'\n'];
        input.extend_from_slice(b"{\"op\":\"list\"}\n");

        let replies = run_session(base, &input, 1024).await;
        assert_eq!(replies.len(), 2);
        assert_eq!(replies[0]["status"], 400);
        assert_eq!(replies[1]["status"], 200);
    }
}
