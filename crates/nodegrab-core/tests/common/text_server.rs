//! Minimal HTTP/1.1 server serving one fixed text body, for integration tests.
//!
//! Each connection gets one response and is closed. Options allow forcing a
//! non-2xx status or delaying the response past a client timeout.

use std::io::{Read, Write};
use std::net::TcpListener;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

#[derive(Debug, Clone, Copy)]
pub struct TextServerOptions {
    /// Status line code; 200 for normal responses.
    pub status: u16,
    /// Sleep this long before answering (simulates a slow origin).
    pub delay: Option<Duration>,
}

impl Default for TextServerOptions {
    fn default() -> Self {
        Self {
            status: 200,
            delay: None,
        }
    }
}

/// Handle to a running test server.
pub struct TextServer {
    base_url: String,
    hits: Arc<AtomicUsize>,
}

impl TextServer {
    pub fn url(&self) -> &str {
        &self.base_url
    }

    /// Number of requests answered so far.
    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }
}

/// Starts a server in a background thread serving `body` with status 200.
/// Returns a handle with the base URL (e.g. "http://127.0.0.1:12345/"). The
/// server runs until the process exits.
pub fn start(body: &str) -> TextServer {
    start_with_options(body, TextServerOptions::default())
}

/// Like `start` but with a custom status or response delay.
pub fn start_with_options(body: &str, opts: TextServerOptions) -> TextServer {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    let body = Arc::new(body.to_string());
    let hits = Arc::new(AtomicUsize::new(0));
    let hits_srv = Arc::clone(&hits);
    thread::spawn(move || {
        for stream in listener.incoming().flatten() {
            let body = Arc::clone(&body);
            let hits = Arc::clone(&hits_srv);
            thread::spawn(move || handle(stream, &body, opts, &hits));
        }
    });
    TextServer {
        base_url: format!("http://127.0.0.1:{}/", port),
        hits,
    }
}

fn handle(
    mut stream: std::net::TcpStream,
    body: &str,
    opts: TextServerOptions,
    hits: &AtomicUsize,
) {
    let _ = stream.set_read_timeout(Some(Duration::from_secs(5)));
    let _ = stream.set_write_timeout(Some(Duration::from_secs(5)));
    let mut buf = [0u8; 8192];
    match stream.read(&mut buf) {
        Ok(0) | Err(_) => return,
        Ok(_) => {}
    }
    hits.fetch_add(1, Ordering::SeqCst);
    if let Some(d) = opts.delay {
        thread::sleep(d);
    }
    let reason = match opts.status {
        200 => "OK",
        404 => "Not Found",
        500 => "Internal Server Error",
        _ => "Status",
    };
    let response = format!(
        "HTTP/1.1 {} {}\r\nContent-Type: text/plain; charset=utf-8\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        opts.status,
        reason,
        body.len(),
        body
    );
    let _ = stream.write_all(response.as_bytes());
}
