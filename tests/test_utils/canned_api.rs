//! Canned HTTP responder for API client tests
//!
//! A minimal HTTP/1.1 server over a raw tokio listener: matches the
//! request path against a route table and answers with a fixed status and
//! JSON body. Enough to stand in for the mailbox and lab collaborators.

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

/// One route: path prefix, response status, response body
pub type CannedRoute = (String, u16, String);

/// Spawn a responder and return its base URL
pub async fn spawn_canned_api(routes: Vec<CannedRoute>) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        loop {
            let Ok((mut socket, _)) = listener.accept().await else {
                break;
            };
            let routes = routes.clone();
            tokio::spawn(async move {
                let request = read_request(&mut socket).await;
                let path = request
                    .lines()
                    .next()
                    .and_then(|line| line.split_whitespace().nth(1))
                    .unwrap_or("/")
                    .to_string();

                let (status, body) = routes
                    .iter()
                    .find(|(prefix, _, _)| path.starts_with(prefix.as_str()))
                    .map(|(_, status, body)| (*status, body.clone()))
                    .unwrap_or((404, "{}".to_string()));

                let reason = if status < 400 { "OK" } else { "Error" };
                let response = format!(
                    "HTTP/1.1 {} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    status,
                    reason,
                    body.len(),
                    body
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            });
        }
    });

    format!("http://{}", addr)
}

/// Read one request: headers plus a content-length body if present
async fn read_request(socket: &mut tokio::net::TcpStream) -> String {
    let mut buf = vec![0u8; 16 * 1024];
    let mut read = 0;
    loop {
        match socket.read(&mut buf[read..]).await {
            Ok(0) => break,
            Ok(n) => {
                read += n;
                let text = String::from_utf8_lossy(&buf[..read]);
                if let Some(header_end) = text.find("\r\n\r\n") {
                    let content_length = text
                        .lines()
                        .find_map(|line| {
                            let lower = line.to_ascii_lowercase();
                            let value = lower.strip_prefix("content-length:")?;
                            value.trim().parse::<usize>().ok()
                        })
                        .unwrap_or(0);
                    if read - (header_end + 4) >= content_length {
                        break;
                    }
                }
                if read == buf.len() {
                    break;
                }
            }
            Err(_) => break,
        }
    }
    String::from_utf8_lossy(&buf[..read]).to_string()
}
