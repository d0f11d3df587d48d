//! Minimal HTTP/1.1 server answering HEAD and ranged GET requests for a single static body.
//!
//! Every request line and `Range` header it sees is recorded so tests can assert on how
//! a download was split.

use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeenRequest {
    pub method: String,
    pub range: Option<(u64, u64)>,
    pub user_agent: Option<String>,
}

pub struct RangeServer {
    pub url: String,
    seen: Arc<Mutex<Vec<SeenRequest>>>,
}

impl RangeServer {
    pub fn requests(&self) -> Vec<SeenRequest> {
        self.seen.lock().unwrap().clone()
    }

    pub fn ranges(&self) -> Vec<(u64, u64)> {
        self.requests()
            .into_iter()
            .filter(|r| r.method == "GET")
            .filter_map(|r| r.range)
            .collect()
    }
}

/// Serves `body` from a background thread until the process exits.
pub fn start(body: Vec<u8>) -> RangeServer {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    let body = Arc::new(body);
    let seen = Arc::new(Mutex::new(Vec::new()));

    let log = Arc::clone(&seen);
    thread::spawn(move || {
        for stream in listener.incoming().flatten() {
            let body = Arc::clone(&body);
            let log = Arc::clone(&log);
            thread::spawn(move || handle(stream, &body, &log));
        }
    });

    RangeServer {
        url: format!("http://127.0.0.1:{}/videoplayback", port),
        seen,
    }
}

fn handle(mut stream: TcpStream, body: &[u8], log: &Mutex<Vec<SeenRequest>>) {
    let _ = stream.set_read_timeout(Some(Duration::from_secs(2)));
    let _ = stream.set_write_timeout(Some(Duration::from_secs(2)));

    let mut buf = [0u8; 8192];
    let n = match stream.read(&mut buf) {
        Ok(0) | Err(_) => return,
        Ok(n) => n,
    };
    let Ok(request) = std::str::from_utf8(&buf[..n]) else {
        return;
    };

    let seen = parse_request(request);
    log.lock().unwrap().push(seen.clone());

    let total = body.len() as u64;
    match seen.method.as_str() {
        "HEAD" => {
            let response = format!(
                "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nAccept-Ranges: bytes\r\nConnection: close\r\n\r\n",
                total
            );
            let _ = stream.write_all(response.as_bytes());
        }
        "GET" => {
            let (status, slice) = match seen.range {
                Some((start, end_incl)) if start < total => {
                    let end_excl = end_incl.saturating_add(1).min(total);
                    ("206 Partial Content", &body[start as usize..end_excl as usize])
                }
                Some(_) => ("416 Range Not Satisfiable", &body[0..0]),
                None => ("200 OK", body),
            };
            let response = format!(
                "HTTP/1.1 {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                status,
                slice.len()
            );
            let _ = stream.write_all(response.as_bytes());
            let _ = stream.write_all(slice);
        }
        _ => {
            let _ = stream.write_all(b"HTTP/1.1 405 Method Not Allowed\r\nConnection: close\r\n\r\n");
        }
    }
}

fn parse_request(request: &str) -> SeenRequest {
    let mut lines = request.lines();
    let method = lines
        .next()
        .and_then(|l| l.split_whitespace().next())
        .unwrap_or_default()
        .to_string();

    let mut range = None;
    let mut user_agent = None;
    for line in lines {
        let line = line.trim();
        if line.is_empty() {
            break;
        }
        let Some((name, value)) = line.split_once(':') else {
            continue;
        };
        let value = value.trim();
        if name.trim().eq_ignore_ascii_case("range") {
            range = value
                .strip_prefix("bytes=")
                .and_then(|part| part.split_once('-'))
                .and_then(|(a, b)| Some((a.parse().ok()?, b.parse().unwrap_or(u64::MAX))));
        } else if name.trim().eq_ignore_ascii_case("user-agent") {
            user_agent = Some(value.to_string());
        }
    }

    SeenRequest {
        method,
        range,
        user_agent,
    }
}
