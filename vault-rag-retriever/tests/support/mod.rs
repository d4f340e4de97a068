//! Stand-in for an Ollama-compatible model service, so the CLI can be driven
//! end to end without real models.

use serde_json::{Value, json};
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

/// Embedding dimensions, one per keyword a text mentions.
const KEYWORDS: [&str; 3] = ["cat", "dog", "fish"];

pub struct ModelServer {
    pub base_url: String,
    requests: Arc<Mutex<Vec<(String, Value)>>>,
}

impl ModelServer {
    /// Request bodies received on `path`, in arrival order.
    pub fn bodies(&self, path: &str) -> Vec<Value> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|(p, _)| p == path)
            .map(|(_, body)| body.clone())
            .collect()
    }
}

/// Start a server that embeds by keyword and answers every chat with
/// `chat_reply`, or with a 500 when it is `None`.
pub async fn start(chat_reply: Option<&str>) -> ModelServer {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base_url = format!("http://{}", listener.local_addr().unwrap());
    let requests = Arc::new(Mutex::new(Vec::new()));
    let chat_reply = chat_reply.map(str::to_string);

    let recorded = Arc::clone(&requests);
    tokio::spawn(async move {
        loop {
            let Ok((mut stream, _)) = listener.accept().await else {
                break;
            };
            let (path, body) = read_request(&mut stream).await;
            recorded.lock().unwrap().push((path.clone(), body.clone()));

            let (status, response) = match path.as_str() {
                "/api/embeddings" => (200, json!({ "embedding": embed(&body) })),
                "/api/chat" => match &chat_reply {
                    Some(reply) => (
                        200,
                        json!({ "message": { "role": "assistant", "content": reply } }),
                    ),
                    None => (500, json!({ "error": "model runner crashed" })),
                },
                _ => (404, json!({ "error": "not found" })),
            };
            respond(&mut stream, status, &response.to_string()).await;
        }
    });

    ModelServer { base_url, requests }
}

fn embed(request: &Value) -> Vec<f32> {
    let prompt = request["prompt"].as_str().unwrap_or_default().to_lowercase();
    KEYWORDS
        .iter()
        .map(|k| if prompt.contains(k) { 1.0 } else { 0.0 })
        .collect()
}

async fn respond(stream: &mut TcpStream, status: u16, body: &str) {
    let reason = match status {
        200 => "OK",
        404 => "Not Found",
        _ => "Internal Server Error",
    };
    let response = format!(
        "HTTP/1.1 {status} {reason}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    );
    stream.write_all(response.as_bytes()).await.unwrap();
    stream.shutdown().await.ok();
}

/// Read one request and return its path and JSON body (`Null` when empty).
async fn read_request(stream: &mut TcpStream) -> (String, Value) {
    let mut data = Vec::new();
    let mut buf = [0u8; 4096];

    let header_end = loop {
        let n = stream.read(&mut buf).await.unwrap();
        data.extend_from_slice(&buf[..n]);

        if let Some(header_end) = data.windows(4).position(|w| w == b"\r\n\r\n") {
            let headers = String::from_utf8_lossy(&data[..header_end]).to_lowercase();
            let content_length = headers
                .lines()
                .find_map(|line| line.strip_prefix("content-length:"))
                .and_then(|value| value.trim().parse::<usize>().ok())
                .unwrap_or(0);
            if n == 0 || data.len() >= header_end + 4 + content_length {
                break header_end;
            }
        } else if n == 0 {
            break data.len();
        }
    };

    let head = String::from_utf8_lossy(&data[..header_end]).to_string();
    let path = head
        .split_whitespace()
        .nth(1)
        .unwrap_or_default()
        .to_string();
    let body = data
        .get(header_end + 4..)
        .filter(|body| !body.is_empty())
        .and_then(|body| serde_json::from_slice(body).ok())
        .unwrap_or(Value::Null);
    (path, body)
}
