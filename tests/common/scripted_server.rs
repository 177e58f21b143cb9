//! Minimal HTTP/1.1 server that answers each connection with the next scripted
//! response, plus a tiny blocking client that maps results onto `HttpError`.
//!
//! Once the script is exhausted the server answers `200 OK`.

use std::collections::VecDeque;
use std::io::{ErrorKind as IoErrorKind, Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use retryhttp::{ErrorKind, HttpError, ResponseSnapshot};

#[derive(Debug, Clone)]
pub struct ScriptedResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
}

impl ScriptedResponse {
    pub fn new(status: u16) -> Self {
        Self {
            status,
            headers: Vec::new(),
        }
    }

    pub fn header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.push((name.to_string(), value.into()));
        self
    }
}

pub struct ScriptedServer {
    pub addr: String,
    hits: Arc<AtomicUsize>,
}

impl ScriptedServer {
    /// Number of requests served so far.
    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }
}

/// Starts a server in a background thread. The server runs until the process exits.
pub fn start(script: Vec<ScriptedResponse>) -> ScriptedServer {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    let script = Arc::new(Mutex::new(VecDeque::from(script)));
    let hits = Arc::new(AtomicUsize::new(0));
    let server_hits = Arc::clone(&hits);
    thread::spawn(move || {
        for stream in listener.incoming().flatten() {
            let next = script
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| ScriptedResponse::new(200));
            server_hits.fetch_add(1, Ordering::SeqCst);
            handle(stream, &next);
        }
    });
    ScriptedServer {
        addr: format!("127.0.0.1:{}", port),
        hits,
    }
}

fn handle(mut stream: TcpStream, response: &ScriptedResponse) {
    let _ = stream.set_read_timeout(Some(Duration::from_secs(2)));
    let mut buf = [0u8; 4096];
    let _ = stream.read(&mut buf);

    let mut out = format!("HTTP/1.1 {} Scripted\r\n", response.status);
    for (name, value) in &response.headers {
        out.push_str(&format!("{}: {}\r\n", name, value));
    }
    out.push_str("Content-Length: 0\r\nConnection: close\r\n\r\n");
    let _ = stream.write_all(out.as_bytes());
}

/// An address nothing listens on (bound, then released).
pub fn closed_addr() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    format!("127.0.0.1:{}", port)
}

/// GET `/` from `addr`. Non-2xx statuses become `HttpError::status`.
pub fn fetch(addr: &str) -> Result<u16, HttpError> {
    let mut stream = TcpStream::connect(addr)
        .map_err(|e| HttpError::transport(ErrorKind::Connect, e.to_string()))?;
    let _ = stream.set_read_timeout(Some(Duration::from_secs(2)));

    let request = format!("GET / HTTP/1.1\r\nHost: {}\r\nConnection: close\r\n\r\n", addr);
    stream
        .write_all(request.as_bytes())
        .map_err(|e| HttpError::transport(ErrorKind::Write, e.to_string()))?;

    let mut raw = String::new();
    stream.read_to_string(&mut raw).map_err(|e| {
        let kind = match e.kind() {
            IoErrorKind::TimedOut | IoErrorKind::WouldBlock => ErrorKind::ReadTimeout,
            _ => ErrorKind::Read,
        };
        HttpError::transport(kind, e.to_string())
    })?;

    let head = raw.split("\r\n\r\n").next().unwrap_or("");
    let lines: Vec<String> = head.lines().map(str::to_string).collect();
    let snapshot = ResponseSnapshot::from_header_lines(&lines)
        .ok_or_else(|| HttpError::transport(ErrorKind::Read, "no status line"))?;
    if snapshot.status().is_success() {
        Ok(snapshot.status().as_u16())
    } else {
        Err(HttpError::status(snapshot))
    }
}
