//! Minimal HTTP/1.1 server serving a fixed route table for integration tests.
//!
//! Each route maps a path to a content type and a body. Requests are counted
//! per path so tests can assert fetch and dedup behavior.

use std::collections::HashMap;
use std::io::{Read, Write};
use std::net::TcpListener;
use std::sync::{Arc, Mutex};
use std::thread;

/// Handle to a running fixture server.
pub struct AssetServer {
    base: String,
    hits: Arc<Mutex<HashMap<String, usize>>>,
}

impl AssetServer {
    /// Absolute URL for `path` (which must start with '/').
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    /// How many times `path` has been requested so far.
    pub fn hits(&self, path: &str) -> usize {
        *self.hits.lock().unwrap().get(path).unwrap_or(&0)
    }
}

/// Starts a server in a background thread serving `routes` as
/// `(path, content_type, body)` triples. Unknown paths get a 404. The server
/// runs until the process exits.
pub fn start(routes: &[(&str, &str, &[u8])]) -> AssetServer {
    let table: HashMap<String, (String, Vec<u8>)> = routes
        .iter()
        .map(|(path, ct, body)| ((*path).to_string(), ((*ct).to_string(), body.to_vec())))
        .collect();
    let table = Arc::new(table);
    let hits: Arc<Mutex<HashMap<String, usize>>> = Arc::new(Mutex::new(HashMap::new()));

    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    let server_hits = Arc::clone(&hits);
    thread::spawn(move || {
        for stream in listener.incoming().flatten() {
            let table = Arc::clone(&table);
            let hits = Arc::clone(&server_hits);
            thread::spawn(move || handle(stream, &table, &hits));
        }
    });

    AssetServer {
        base: format!("http://127.0.0.1:{}", port),
        hits,
    }
}

fn handle(
    mut stream: std::net::TcpStream,
    table: &HashMap<String, (String, Vec<u8>)>,
    hits: &Mutex<HashMap<String, usize>>,
) {
    let _ = stream.set_read_timeout(Some(std::time::Duration::from_secs(2)));
    let _ = stream.set_write_timeout(Some(std::time::Duration::from_secs(2)));
    let mut buf = [0u8; 8192];
    let n = match stream.read(&mut buf) {
        Ok(0) => return,
        Ok(n) => n,
        Err(_) => return,
    };
    let request = match std::str::from_utf8(&buf[..n]) {
        Ok(s) => s,
        Err(_) => return,
    };
    let path = match parse_request(request) {
        Some(path) => path,
        None => {
            let _ = stream.write_all(b"HTTP/1.1 405 Method Not Allowed\r\n\r\n");
            return;
        }
    };

    *hits.lock().unwrap().entry(path.clone()).or_insert(0) += 1;

    match table.get(&path) {
        Some((content_type, body)) => {
            let response = format!(
                "HTTP/1.1 200 OK\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                content_type,
                body.len()
            );
            let _ = stream.write_all(response.as_bytes());
            let _ = stream.write_all(body);
        }
        None => {
            let _ = stream.write_all(
                b"HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
            );
        }
    }
}

/// Returns the request path for a GET request, or None for anything else.
fn parse_request(request: &str) -> Option<String> {
    let line = request.lines().next()?;
    let mut parts = line.split_whitespace();
    let method = parts.next()?;
    let path = parts.next()?;
    if !method.eq_ignore_ascii_case("GET") {
        return None;
    }
    Some(path.to_string())
}
