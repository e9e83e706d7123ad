#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, Response};
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use vulnscan::api::{build_router, AppState, ScannerGateway};
use vulnscan::auth::{hash_password, Role, TokenService};
use vulnscan::db::{Database, NewUser};
use vulnscan::errors::VulnscanError;
use vulnscan::llm::{LLMProvider, LLMResponse};
use vulnscan::scanner::{GmpTransport, ScannerConnector};

pub const SECRET: &str = "integration-test-secret-0123456789";
pub const AUTH_OK: &str =
    r#"<authenticate_response status="200" status_text="OK"><role>Admin</role></authenticate_response>"#;

/// Replies to GMP commands by element name. A queue with one reply left keeps repeating it.
#[derive(Clone, Default)]
pub struct FakeScanner {
    replies: Arc<Mutex<HashMap<String, VecDeque<String>>>>,
    pub sent: Arc<Mutex<Vec<String>>>,
}

impl FakeScanner {
    pub fn reply(&self, command: &str, xml: &str) -> &Self {
        self.replies
            .lock()
            .unwrap()
            .entry(command.to_string())
            .or_default()
            .push_back(xml.to_string());
        self
    }

    pub fn sent_named(&self, command: &str) -> Vec<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .filter(|c| command_name(c) == command)
            .cloned()
            .collect()
    }
}

fn command_name(xml: &str) -> &str {
    let rest = xml.trim_start_matches('<');
    let end = rest.find([' ', '>', '/']).unwrap_or(rest.len());
    &rest[..end]
}

struct FakeTransport {
    scanner: FakeScanner,
}

#[async_trait]
impl GmpTransport for FakeTransport {
    async fn send(&mut self, command: &str) -> Result<String, VulnscanError> {
        self.scanner.sent.lock().unwrap().push(command.to_string());
        let name = command_name(command).to_string();
        if name == "authenticate" {
            return Ok(AUTH_OK.to_string());
        }
        let mut replies = self.scanner.replies.lock().unwrap();
        let reply = match replies.get_mut(&name) {
            Some(queue) if queue.len() > 1 => queue.pop_front(),
            Some(queue) => queue.front().cloned(),
            None => None,
        };
        Ok(reply.unwrap_or_else(|| {
            format!(r#"<{name}_response status="400" status_text="Bogus command name"/>"#)
        }))
    }
}

#[async_trait]
impl ScannerConnector for FakeScanner {
    async fn connect(&self) -> Result<Box<dyn GmpTransport>, VulnscanError> {
        Ok(Box::new(FakeTransport { scanner: self.clone() }))
    }
}

/// Answers every prompt with a fixed text, or fails when `fail` is set.
pub struct FakeLlm {
    pub answer: String,
    pub fail: bool,
    pub prompts: Mutex<Vec<String>>,
}

impl FakeLlm {
    pub fn answering(answer: &str) -> Self {
        Self { answer: answer.to_string(), fail: false, prompts: Mutex::new(Vec::new()) }
    }
}

#[async_trait]
impl LLMProvider for FakeLlm {
    async fn complete(&self, prompt: &str, _system: Option<&str>) -> Result<LLMResponse, VulnscanError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        if self.fail {
            return Err(VulnscanError::LLMApi("rate limited".into()));
        }
        Ok(LLMResponse::text(self.answer.clone(), "fake-model"))
    }

    fn provider_name(&self) -> &str {
        "fake"
    }

    fn model_name(&self) -> &str {
        "fake-model"
    }
}

pub struct TestApp {
    pub state: AppState,
    pub scanner: FakeScanner,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_llm(None)
    }

    pub fn with_llm(llm: Option<Arc<dyn LLMProvider>>) -> Self {
        let scanner = FakeScanner::default();
        let state = AppState {
            db: Database::in_memory().unwrap(),
            tokens: TokenService::new(SECRET, 60),
            scanner: ScannerGateway::new(Arc::new(scanner.clone()), "admin", "admin-pw"),
            llm,
        };
        Self { state, scanner }
    }

    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        build_router(self.state.clone(), &["*".to_string()])
            .oneshot(request)
            .await
            .unwrap()
    }

    /// Inserts a user straight into the database and returns a bearer token for it.
    pub fn token_for(&self, username: &str, role: Role) -> String {
        let hash = hash_password("correct horse").unwrap();
        let email = format!("{}@example.com", username);
        let id = self
            .state
            .db
            .create_user(&NewUser {
                username,
                email: &email,
                password_hash: &hash,
                role,
                comment: None,
            })
            .unwrap();
        self.state.tokens.issue(id, username, role).unwrap()
    }
}

pub fn request(method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {}", token));
    }
    match body {
        Some(b) => builder.body(Body::from(serde_json::to_string(&b).unwrap())).unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    response.into_body().collect().await.unwrap().to_bytes().to_vec()
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = body_bytes(response).await;
    serde_json::from_slice(&bytes)
        .unwrap_or_else(|e| panic!("JSON parse error: {}. Body: {:?}", e, String::from_utf8_lossy(&bytes)))
}
