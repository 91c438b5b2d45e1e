//! Scripted run service on a local port for exercising the HTTP client.

use std::sync::{Arc, Mutex};

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

/// Run id handed out by the server. Contains a space so status URLs must
/// encode it.
pub const RUN_ID: &str = "run 1";

pub const IN_PROGRESS: &str = r#"{"status":"RUNNING","progress":{"java-basic":{"total":3,"completed":1,"error":0,"filtered":0,"inProgress":2}}}"#;
pub const FINISHED: &str = r#"{"status":"DONE","progress":{"java-basic":{"total":3,"completed":2,"error":1,"filtered":0,"inProgress":0}}}"#;

pub struct TestServer {
    pub base_url: String,
    requests: Arc<Mutex<Vec<String>>>,
}

impl TestServer {
    /// Serve `statuses` in order to status polls, repeating the last one.
    pub async fn start(statuses: &[&'static str]) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());
        let requests = Arc::new(Mutex::new(Vec::new()));

        let seen = Arc::clone(&requests);
        let statuses = statuses.to_vec();
        tokio::spawn(async move {
            let mut served = 0;
            while let Ok((mut socket, _)) = listener.accept().await {
                let request = read_request(&mut socket).await;
                let line = request.lines().next().unwrap_or_default().to_string();
                seen.lock().unwrap().push(request);

                let status_path = format!(
                    "GET /api/benchmark/status/{} ",
                    urlencoding::encode(RUN_ID)
                );
                let (code, body) = if line.starts_with("POST /api/benchmark/run ") {
                    ("200 OK", format!(r#"{{"id":"{}"}}"#, RUN_ID))
                } else if line.starts_with(&status_path) && !statuses.is_empty() {
                    let body = statuses[served.min(statuses.len() - 1)];
                    served += 1;
                    ("200 OK", body.to_string())
                } else {
                    ("404 Not Found", "no such run".to_string())
                };

                let response = format!(
                    "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    code,
                    body.len(),
                    body
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            }
        });

        Self { base_url, requests }
    }

    /// Every request received so far, head and body.
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

async fn read_request(socket: &mut TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    loop {
        let n = match socket.read(&mut chunk).await {
            Ok(0) | Err(_) => break,
            Ok(n) => n,
        };
        buf.extend_from_slice(&chunk[..n]);

        let Some(head_end) = buf.windows(4).position(|w| w == b"\r\n\r\n") else {
            continue;
        };
        let head = String::from_utf8_lossy(&buf[..head_end]).to_string();
        let length = head
            .lines()
            .filter_map(|line| line.split_once(':'))
            .find(|(key, _)| key.trim().eq_ignore_ascii_case("content-length"))
            .and_then(|(_, value)| value.trim().parse::<usize>().ok())
            .unwrap_or(0);
        if buf.len() >= head_end + 4 + length {
            break;
        }
    }
    String::from_utf8_lossy(&buf).into_owned()
}
