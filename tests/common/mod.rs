#![allow(dead_code)]

use async_trait::async_trait;
use nexus_dispatch::config::RouterConfig;
use nexus_dispatch::error::ExecutorError;
use nexus_dispatch::script::{
    ExecutionKind, HttpMethod, InMemoryScriptStore, ParamMap, Parameter, ParameterKind, Script, ScriptExecutor,
};
use nexus_dispatch::IntentRouter;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;

// --- Fixtures ---

pub fn set_reminder() -> Script {
    Script {
        id: "set-reminder".to_string(),
        name: "Set Reminder".to_string(),
        description: "Remind you about something at a given time".to_string(),
        parameters: vec![Parameter::new("time", "When should I remind you?")],
        triggers: vec![],
        execution: ExecutionKind::Local,
    }
}

pub fn flip_coin() -> Script {
    Script {
        id: "flip-coin".to_string(),
        name: "Flip Coin".to_string(),
        description: "Flip a coin and report heads or tails".to_string(),
        parameters: vec![],
        triggers: vec![],
        execution: ExecutionKind::Local,
    }
}

pub fn send_email() -> Script {
    Script {
        id: "send-email".to_string(),
        name: "Send Email".to_string(),
        description: "Send an email message".to_string(),
        parameters: vec![
            Parameter::new("recipient", "Who should receive it?").with_kind(ParameterKind::Email),
            Parameter::new("subject", "What is the subject?"),
            Parameter::new("body", "What should the email say?"),
            Parameter::new("cc", "Anyone to copy?").optional(),
        ],
        triggers: vec!["send an email".to_string()],
        execution: ExecutionKind::Local,
    }
}

pub fn check_quota() -> Script {
    Script {
        id: "check-quota".to_string(),
        name: "Check Quota".to_string(),
        description: "Check the remaining API quota".to_string(),
        parameters: vec![],
        triggers: vec![],
        execution: ExecutionKind::RemoteAction {
            endpoint: "/quota".to_string(),
            method: HttpMethod::Post,
        },
    }
}

pub fn backup(id: &str, what: &str) -> Script {
    Script {
        id: id.to_string(),
        name: format!("Backup {}", what),
        description: format!("Copy {} to the backup drive", what.to_lowercase()),
        parameters: vec![],
        triggers: vec![],
        execution: ExecutionKind::Local,
    }
}

// --- Executor ---

pub struct RecordingExecutor {
    calls: Mutex<Vec<(String, ParamMap)>>,
    outcome: Result<Value, ExecutorError>,
}

impl RecordingExecutor {
    pub fn returning(result: Value) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            outcome: Ok(result),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            outcome: Err(ExecutorError::new(message)),
        }
    }

    pub fn calls(&self) -> Vec<(String, ParamMap)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ScriptExecutor for RecordingExecutor {
    async fn execute_local(&self, script: &Script, params: &ParamMap) -> Result<Value, ExecutorError> {
        self.calls.lock().unwrap().push((script.id.clone(), params.clone()));
        self.outcome.clone()
    }
}

pub fn router_with(store: Arc<InMemoryScriptStore>, executor: Arc<RecordingExecutor>) -> IntentRouter {
    let mut router = IntentRouter::new(store, executor, RouterConfig::default());
    router.refresh_scripts().expect("refresh scripts");
    router
}

// --- Mock HTTP Server ---

#[derive(Debug, Clone)]
pub struct CapturedRequest {
    pub method: String,
    pub target: String,
    pub headers: HashMap<String, String>,
    pub body: String,
}

impl CapturedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_ascii_lowercase()).map(String::as_str)
    }
}

pub struct MockServer {
    pub base_url: String,
    requests: mpsc::UnboundedReceiver<CapturedRequest>,
}

impl MockServer {
    /// Answers every request with `status` and a JSON `body`.
    pub async fn respond_with(status: u16, body: &str) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind mock server");
        let addr = listener.local_addr().expect("local addr");
        let (tx, rx) = mpsc::unbounded_channel();
        let body = body.to_string();

        tokio::spawn(async move {
            while let Ok((mut stream, _)) = listener.accept().await {
                let tx = tx.clone();
                let body = body.clone();
                tokio::spawn(async move {
                    if let Some(request) = read_request(&mut stream).await {
                        let _ = tx.send(request);
                    }
                    let response = format!(
                        "HTTP/1.1 {} Mock\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                        status,
                        body.len(),
                        body
                    );
                    let _ = stream.write_all(response.as_bytes()).await;
                    let _ = stream.shutdown().await;
                });
            }
        });

        Self {
            base_url: format!("http://{}", addr),
            requests: rx,
        }
    }

    /// Accepts connections and never answers.
    pub async fn silent() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind mock server");
        let addr = listener.local_addr().expect("local addr");
        let (tx, rx) = mpsc::unbounded_channel();

        tokio::spawn(async move {
            while let Ok((mut stream, _)) = listener.accept().await {
                let tx = tx.clone();
                tokio::spawn(async move {
                    if let Some(request) = read_request(&mut stream).await {
                        let _ = tx.send(request);
                    }
                    tokio::time::sleep(Duration::from_secs(60)).await;
                    drop(stream);
                });
            }
        });

        Self {
            base_url: format!("http://{}", addr),
            requests: rx,
        }
    }

    pub async fn next_request(&mut self) -> CapturedRequest {
        tokio::time::timeout(Duration::from_secs(5), self.requests.recv())
            .await
            .expect("request within 5s")
            .expect("mock server alive")
    }
}

async fn read_request(stream: &mut TcpStream) -> Option<CapturedRequest> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];

    let header_end = loop {
        let n = stream.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let head = String::from_utf8_lossy(&buf[..header_end]).to_string();
    let mut lines = head.split("\r\n");
    let mut request_line = lines.next()?.split_whitespace();
    let method = request_line.next()?.to_string();
    let target = request_line.next()?.to_string();

    let mut headers = HashMap::new();
    for line in lines {
        if let Some((name, value)) = line.split_once(':') {
            headers.insert(name.trim().to_ascii_lowercase(), value.trim().to_string());
        }
    }

    let length: usize = headers
        .get("content-length")
        .and_then(|v| v.parse().ok())
        .unwrap_or(0);
    while buf.len() < header_end + length {
        let n = stream.read(&mut chunk).await.ok()?;
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
    }
    let end = (header_end + length).min(buf.len());
    let body = String::from_utf8_lossy(&buf[header_end..end]).to_string();

    Some(CapturedRequest {
        method,
        target,
        headers,
        body,
    })
}
