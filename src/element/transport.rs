use std::pin::pin;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tokio_stream::StreamExt as _;
use tracing::debug;

use crate::element::{ApiError, Result};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// HTTP GET seam of the client.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Transport: Send + Sync {
    /// Fetches `url` and returns the response body.
    async fn get(&self, url: &str) -> Result<String>;

    /// Fetches a newline-delimited endpoint and returns its non-blank lines.
    async fn get_lines(&self, url: &str) -> Result<Vec<String>>;
}

#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    timeout: Duration,
}

impl HttpTransport {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(timeout)
            .read_timeout(timeout)
            .build()?;

        Ok(Self { client, timeout })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, url: &str) -> Result<String> {
        let response = self.client.get(url).timeout(self.timeout).send().await?;

        let status = response.status();
        let body = response.text().await?;
        debug!(status = status.as_u16(), size_bytes = body.len(), "received response");

        if !status.is_success() {
            return Err(ApiError::Http {
                status: status.as_u16(),
                message: error_message(&body),
            });
        }

        Ok(body)
    }

    // No total deadline: a stream may run long, but every read is bounded
    // by the client's `read_timeout`.
    async fn get_lines(&self, url: &str) -> Result<Vec<String>> {
        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await?;
            return Err(ApiError::Http {
                status: status.as_u16(),
                message: error_message(&body),
            });
        }

        let mut stream = pin!(response.bytes_stream());
        let mut splitter = LineSplitter::default();
        while let Some(chunk) = stream.next().await {
            splitter.feed(&chunk?);
        }
        let lines = splitter.finish();

        debug!(lines = lines.len(), "received stream");

        Ok(lines)
    }
}

/// Reassembles newline-delimited lines from arbitrarily split chunks.
#[derive(Debug, Default)]
struct LineSplitter {
    buf: Vec<u8>,
    lines: Vec<String>,
}

impl LineSplitter {
    fn feed(&mut self, chunk: &[u8]) {
        self.buf.extend_from_slice(chunk);

        while let Some(pos) = self.buf.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.buf.drain(..=pos).collect();
            push_line(&mut self.lines, &line);
        }
    }

    /// Flushes the unterminated tail, if any.
    fn finish(mut self) -> Vec<String> {
        push_line(&mut self.lines, &self.buf);
        self.lines
    }
}

fn push_line(lines: &mut Vec<String>, raw: &[u8]) {
    let line = String::from_utf8_lossy(raw);
    let line = line.trim();
    if !line.is_empty() {
        lines.push(line.to_string());
    }
}

/// Extracts the `error` member of a JSON error body, falling back to the raw text.
pub(crate) fn error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(str::to_string))
        .unwrap_or_else(|| body.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_message_from_json() {
        assert_eq!(
            error_message(r#"{"error": "device not found", "ok": false, "status": 404}"#),
            "device not found"
        );
    }

    #[test]
    fn test_error_message_from_text() {
        assert_eq!(error_message("Bad Gateway\n"), "Bad Gateway");
    }

    #[test]
    fn test_lines_split_across_chunks() {
        let mut splitter = LineSplitter::default();
        splitter.feed(b"{\"id\": 1}\n{\"i");
        splitter.feed(b"d\": 2");
        splitter.feed(b"}\n\n");
        splitter.feed(b"{\"id\": 3}");

        assert_eq!(
            splitter.finish(),
            vec![
                r#"{"id": 1}"#.to_string(),
                r#"{"id": 2}"#.to_string(),
                r#"{"id": 3}"#.to_string(),
            ]
        );
    }

    #[test]
    fn test_multibyte_char_split_across_chunks() {
        let text = "{\"unit\": \"°C\"}\n".as_bytes();
        let (head, tail) = text.split_at(12);

        let mut splitter = LineSplitter::default();
        splitter.feed(head);
        splitter.feed(tail);

        assert_eq!(splitter.finish(), vec![r#"{"unit": "°C"}"#.to_string()]);
    }

    #[test]
    fn test_empty_stream_has_no_lines() {
        assert!(LineSplitter::default().finish().is_empty());
    }

    #[test]
    fn test_push_line_skips_blank() {
        let mut lines = Vec::new();
        push_line(&mut lines, b"  \r\n");
        push_line(&mut lines, b"{\"a\": 1}\r\n");
        assert_eq!(lines, vec![r#"{"a": 1}"#.to_string()]);
    }
}
