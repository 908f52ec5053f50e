//! HTTP transport seam: one blocking GET per call.
//!
//! The executor and proxy validator talk to this trait instead of libcurl
//! directly, so tests can script responses and count calls.

mod curl_backend;

pub use curl_backend::CurlTransport;

use std::time::Duration;

/// Fixed descriptive user agent sent with every request.
pub const USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:129.0) Gecko/20100101 Firefox/129.0";

/// Per-request knobs. TLS verification is disabled unconditionally by the
/// curl backend (operator-accepted risk for self-signed node-share sources).
#[derive(Debug, Clone)]
pub struct RequestOptions {
    /// Proxy address applied verbatim (http/https/socks5 scheme), or None
    /// for a direct connection.
    pub proxy: Option<String>,
    /// Abandon the request as failed after this long.
    pub timeout: Duration,
}

impl RequestOptions {
    pub fn new(proxy: Option<String>, timeout: Duration) -> Self {
        Self { proxy, timeout }
    }

    /// Direct connection with the given timeout.
    pub fn direct(timeout: Duration) -> Self {
        Self {
            proxy: None,
            timeout,
        }
    }
}

/// Closed set of per-attempt failures. Each attempt either yields a body or
/// exactly one of these; none of them is fatal to a batch.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// The request exceeded its per-request timeout.
    #[error("timed out")]
    Timeout,
    /// Connection-level failure (DNS, refused, TLS handshake, proxy, ...).
    #[error("connection failed: {0}")]
    Connect(String),
    /// The server answered with a non-2xx status.
    #[error("HTTP {0}")]
    Status(u32),
    /// The response arrived but its body could not be interpreted.
    #[error("bad response body: {0}")]
    Decode(String),
}

/// Blocking GET returning the response body as text.
pub trait Transport {
    fn get(&self, url: &str, opts: &RequestOptions) -> Result<String, FetchError>;
}

/// Truncate an error message for one-line operator output. Char-boundary
/// safe; appends an ellipsis marker when something was cut.
pub fn truncate_msg(msg: &str, max_chars: usize) -> String {
    if msg.chars().count() <= max_chars {
        return msg.to_string();
    }
    let cut: String = msg.chars().take(max_chars).collect();
    format!("{cut}...")
}
