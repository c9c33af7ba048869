#![allow(dead_code)]

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::post,
    Json, Router,
};
use chat_service::config::{ChatConfig, ChatSettings, GeminiSettings};
use chat_service::startup::Application;
use secrecy::Secret;
use serde_json::{json, Value};
use service_core::config::Config as CoreConfig;
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;

pub const TEST_API_KEY: &str = "test-api-key";

/// A request received by the fake Gemini server.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    /// `<model>:<method>` as it appeared in the URL.
    pub target: String,
    pub api_key: Option<String>,
    pub body: Value,
}

#[derive(Clone)]
struct FakeState {
    calls: Arc<Mutex<Vec<RecordedCall>>>,
    response: Arc<Mutex<(StatusCode, Value)>>,
}

/// Minimal stand-in for the Gemini REST API.
pub struct FakeGemini {
    pub api_base: String,
    state: FakeState,
}

impl FakeGemini {
    pub async fn start() -> Self {
        let state = FakeState {
            calls: Arc::new(Mutex::new(Vec::new())),
            response: Arc::new(Mutex::new((StatusCode::OK, default_reply()))),
        };

        let app = Router::new()
            .route("/v1beta/models/:target", post(generate))
            .with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind fake Gemini listener");
        let port = listener.local_addr().unwrap().port();

        tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });

        Self {
            api_base: format!("http://127.0.0.1:{}/v1beta", port),
            state,
        }
    }

    /// Answer every following call with this status and body.
    pub fn respond_with(&self, status: StatusCode, body: Value) {
        *self.state.response.lock().unwrap() = (status, body);
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.state.calls.lock().unwrap().clone()
    }
}

pub fn default_reply() -> Value {
    json!({
        "candidates": [{
            "content": {"role": "model", "parts": [{"text": "Hola! How can I help?"}]},
            "finishReason": "STOP"
        }],
        "usageMetadata": {
            "promptTokenCount": 4,
            "candidatesTokenCount": 6,
            "totalTokenCount": 10
        }
    })
}

async fn generate(
    State(state): State<FakeState>,
    Path(target): Path<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> impl IntoResponse {
    let api_key = headers
        .get("x-goog-api-key")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    state.calls.lock().unwrap().push(RecordedCall {
        target,
        api_key,
        body,
    });

    let (status, body) = state.response.lock().unwrap().clone();
    (status, Json(body))
}

pub struct TestApp {
    pub address: String,
    pub gemini: Option<FakeGemini>,
    pub client: reqwest::Client,
}

impl TestApp {
    /// App wired to a fake Gemini server, as if `GEMINI_API_KEY` were set.
    pub async fn spawn() -> Self {
        let gemini = FakeGemini::start().await;
        let settings = GeminiSettings {
            api_key: Secret::new(TEST_API_KEY.to_string()),
            api_base: gemini.api_base.clone(),
            timeout_secs: 10,
        };
        Self::spawn_with(Some(settings), Some(gemini)).await
    }

    /// App started without any provider credential.
    pub async fn spawn_without_credentials() -> Self {
        Self::spawn_with(None, None).await
    }

    async fn spawn_with(settings: Option<GeminiSettings>, gemini: Option<FakeGemini>) -> Self {
        let config = ChatConfig {
            common: CoreConfig {
                port: 0, // Random port for testing
                ..CoreConfig::default()
            },
            chat: ChatSettings {
                upload_dir: std::env::temp_dir()
                    .join("chat-service-test-uploads")
                    .to_string_lossy()
                    .into_owned(),
                index_path: concat!(env!("CARGO_MANIFEST_DIR"), "/static/index.html").to_string(),
                ..ChatSettings::default()
            },
            gemini: settings,
        };

        let app = Application::build(config)
            .await
            .expect("Failed to build application");
        let address = format!("http://127.0.0.1:{}", app.port());

        tokio::spawn(async move {
            app.run_until_stopped().await.ok();
        });

        let client = reqwest::Client::new();

        // Wait for the server to accept connections
        for _ in 0..50 {
            if client
                .get(format!("{}/health", address))
                .send()
                .await
                .is_ok()
            {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        }

        Self {
            address,
            gemini,
            client,
        }
    }

    pub fn gemini(&self) -> &FakeGemini {
        self.gemini
            .as_ref()
            .expect("App was spawned without a fake Gemini server")
    }

    pub async fn post_chat(&self, form: reqwest::multipart::Form) -> (reqwest::StatusCode, Value) {
        let response = self
            .client
            .post(format!("{}/api/chat", self.address))
            .multipart(form)
            .send()
            .await
            .expect("Failed to execute request.");

        let status = response.status();
        let body = response.json().await.expect("Failed to parse JSON");
        (status, body)
    }
}

pub fn messages_form(messages: Value) -> reqwest::multipart::Form {
    reqwest::multipart::Form::new().text("messages", messages.to_string())
}

pub fn file_part(name: &str, mime: &str, data: Vec<u8>) -> reqwest::multipart::Part {
    reqwest::multipart::Part::bytes(data)
        .file_name(name.to_string())
        .mime_str(mime)
        .unwrap()
}
