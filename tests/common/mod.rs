#![allow(dead_code)]

use std::io::{Read as _, Write as _};
use std::net::TcpListener;
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};
use std::time::Duration;

/// Serves one canned response per connection, in order, then stops
/// listening. Returns the port and a counter of requests seen.
pub fn start_http_server(responses: Vec<(&'static str, String)>) -> (u16, Arc<AtomicUsize>) {
    let listener = TcpListener::bind(("127.0.0.1", 0)).expect("bind");
    let port = listener.local_addr().expect("local_addr").port();
    let hits = Arc::new(AtomicUsize::new(0));
    let counter = hits.clone();

    std::thread::spawn(move || {
        for (status_line, body) in responses {
            let (mut stream, _) = match listener.accept() {
                Ok(conn) => conn,
                Err(_) => return,
            };
            let _ = stream.set_read_timeout(Some(Duration::from_secs(1)));

            let mut buf = Vec::new();
            let mut tmp = [0u8; 4096];
            for _ in 0..64 {
                match stream.read(&mut tmp) {
                    Ok(0) => break,
                    Ok(n) => {
                        buf.extend_from_slice(&tmp[..n]);
                        if buf.windows(4).any(|w| w == b"\r\n\r\n") {
                            break;
                        }
                    }
                    Err(_) => break,
                }
            }
            counter.fetch_add(1, Ordering::SeqCst);

            let resp = format!(
                "HTTP/1.1 {status_line}\r\n\
Content-Type: application/javascript\r\n\
Content-Length: {}\r\n\
Connection: close\r\n\
\r\n\
{body}",
                body.len()
            );
            let _ = stream.write_all(resp.as_bytes());
            let _ = stream.flush();
        }
    });

    (port, hits)
}

pub fn not_found() -> (&'static str, String) {
    ("404 Not Found", "Not Found".to_string())
}

pub fn ok(body: &str) -> (&'static str, String) {
    ("200 OK", body.to_string())
}

pub fn node_available() -> bool {
    std::process::Command::new("node")
        .arg("--version")
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

pub const HASHED: &str = "/packs/application-k344a6d59eef8632c9d1.js";

pub const APPLICATION_JS: &str = "console.log('Hello World from Webpacker');

stdout('<html><body>Hello from the server</body></html>');
";

/// Direct connections only; the responder lives on loopback.
pub fn http_client() -> reqwest::Client {
    reqwest::Client::builder().no_proxy().build().expect("http client")
}
