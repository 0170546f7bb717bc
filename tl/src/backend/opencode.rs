//! HTTP client for an opencode-style session server
//!
//! Endpoints used:
//! - `POST /session` creates a session
//! - `POST /session/{id}/message` submits a prompt and returns when the reply is complete
//! - `GET /session/{id}/message?limit=N` lists recent messages
//! - `GET /event` server-sent events (only `todo.updated` is consumed)

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::{Client, RequestBuilder, Response};
use reqwest_eventsource::{Event, EventSource};
use serde::Deserialize;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::{BackendError, ExecutionBackend, Part, Role, SessionId, SessionMessage};
use crate::config::BackendConfig;
use crate::domain::{HintEntry, ModelConfig};
use crate::events::{EventBus, LoopEvent};

/// Maximum number of retries for transient errors
const MAX_RETRIES: u32 = 3;

/// Initial backoff delay for retries
const INITIAL_BACKOFF_MS: u64 = 500;

/// Check if an HTTP status code is retryable
fn is_retryable_status(status: u16) -> bool {
    matches!(status, 408 | 429 | 500 | 502 | 503 | 504)
}

/// Which failures a request may be resent after
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RetryPolicy {
    /// Network errors and retryable statuses; for reads
    Transient,
    /// Only failures to connect; for creates the server may already have applied
    ConnectOnly,
}

impl RetryPolicy {
    fn retries_status(self, status: u16) -> bool {
        self == RetryPolicy::Transient && is_retryable_status(status)
    }

    fn retries_error(self, error: &reqwest::Error) -> bool {
        match self {
            RetryPolicy::Transient => true,
            RetryPolicy::ConnectOnly => error.is_connect(),
        }
    }
}

/// Session server client
pub struct OpencodeBackend {
    base_url: String,
    directory: Option<String>,
    http: Client,
    request_timeout: Duration,
    prompt_timeout: Option<Duration>,
}

impl OpencodeBackend {
    /// Create a new client from configuration
    pub fn from_config(config: &BackendConfig) -> Result<Self, BackendError> {
        debug!(?config, "from_config: called");
        // Timeouts are set per request: prompts may legitimately run for a long time
        let http = Client::builder().build().map_err(BackendError::Network)?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            directory: config.directory.clone(),
            http,
            request_timeout: Duration::from_millis(config.timeout_ms),
            prompt_timeout: config.prompt_timeout_ms.map(Duration::from_millis),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Scope a request to the configured project directory
    fn scoped(&self, builder: RequestBuilder) -> RequestBuilder {
        match &self.directory {
            Some(dir) => builder.query(&[("directory", dir.as_str())]),
            None => builder,
        }
    }

    /// Send a request, retrying failures `policy` allows with exponential backoff
    async fn send_with_retry<F>(&self, op: &str, policy: RetryPolicy, build: F) -> Result<Response, BackendError>
    where
        F: Fn() -> RequestBuilder,
    {
        let mut last_error = None;
        for attempt in 0..=MAX_RETRIES {
            if attempt > 0 {
                let backoff = INITIAL_BACKOFF_MS * 2u64.pow(attempt - 1);
                warn!(op, attempt, backoff_ms = backoff, "send_with_retry: retrying after transient error");
                tokio::time::sleep(Duration::from_millis(backoff)).await;
            }

            let response = match build().timeout(self.request_timeout).send().await {
                Ok(r) => r,
                Err(e) => {
                    debug!(op, attempt, error = %e, "send_with_retry: network error");
                    let retry = policy.retries_error(&e);
                    let error = map_reqwest_error(e, self.request_timeout);
                    if !retry {
                        return Err(error);
                    }
                    last_error = Some(error);
                    continue;
                }
            };

            let status = response.status().as_u16();
            if policy.retries_status(status) && attempt < MAX_RETRIES {
                let text = response.text().await.unwrap_or_default();
                debug!(op, attempt, status, "send_with_retry: retryable status");
                last_error = Some(BackendError::ApiError { status, message: text });
                continue;
            }

            return check_status(response).await;
        }

        Err(last_error.unwrap_or_else(|| BackendError::InvalidResponse("Max retries exceeded".to_string())))
    }

    /// Build the body for `POST /session/{id}/message`
    fn build_prompt_body(text: &str, model: Option<&ModelConfig>) -> serde_json::Value {
        debug!(text_len = text.len(), ?model, "build_prompt_body: called");
        let mut body = serde_json::json!({
            "parts": [{ "type": "text", "text": text }],
        });
        if let Some(model) = model {
            body["model"] = serde_json::json!(model);
        } else {
            debug!("build_prompt_body: no model override");
        }
        body
    }

    /// Start forwarding `todo.updated` events from the server to the bus
    ///
    /// The returned task runs until the server closes the stream.
    pub fn subscribe_todos(&self, bus: Arc<EventBus>) -> Result<JoinHandle<()>, BackendError> {
        debug!("subscribe_todos: called");
        let request = self.scoped(self.http.get(self.url("/event")));
        let mut es = EventSource::new(request).map_err(|e| BackendError::InvalidResponse(e.to_string()))?;

        Ok(tokio::spawn(async move {
            info!("Subscribed to backend events");
            while let Some(event) = es.next().await {
                match event {
                    Ok(Event::Open) => debug!("subscribe_todos: stream open"),
                    Ok(Event::Message(msg)) => {
                        if let Some((session_id, todos)) = parse_todo_event(&msg.data) {
                            debug!(%session_id, count = todos.len(), "subscribe_todos: todo.updated");
                            bus.emit(LoopEvent::TodoUpdated { session_id, todos });
                        }
                    }
                    Err(reqwest_eventsource::Error::StreamEnded) => {
                        info!("Backend event stream ended");
                        break;
                    }
                    Err(e) => {
                        warn!(error = %e, "subscribe_todos: event stream error");
                    }
                }
            }
            es.close();
        }))
    }
}

#[async_trait]
impl ExecutionBackend for OpencodeBackend {
    async fn create_session(&self) -> Result<SessionId, BackendError> {
        debug!("create_session: called");
        // A timeout or 5xx may come after the session was created; resending would orphan it
        let response = self
            .send_with_retry("create_session", RetryPolicy::ConnectOnly, || {
                self.scoped(self.http.post(self.url("/session"))).json(&serde_json::json!({}))
            })
            .await
            .map_err(|e| BackendError::SessionCreation(e.to_string()))?;

        let info: SessionInfo = response
            .json()
            .await
            .map_err(|e| BackendError::SessionCreation(e.to_string()))?;
        if info.id.is_empty() {
            return Err(BackendError::SessionCreation("server returned an empty session id".to_string()));
        }
        debug!(session_id = %info.id, "create_session: created");
        Ok(SessionId::new(info.id))
    }

    async fn prompt(
        &self,
        session: &SessionId,
        text: &str,
        model: Option<&ModelConfig>,
    ) -> Result<SessionMessage, BackendError> {
        debug!(%session, ?model, "prompt: called");
        let body = Self::build_prompt_body(text, model);
        let mut request = self
            .scoped(self.http.post(self.url(&format!("/session/{}/message", session))))
            .json(&body);
        if let Some(timeout) = self.prompt_timeout {
            request = request.timeout(timeout);
        }

        // Not retried: resending would run the instruction twice
        let response = request
            .send()
            .await
            .map_err(|e| map_reqwest_error(e, self.prompt_timeout.unwrap_or_default()))?;
        let response = check_status(response).await?;
        let envelope: MessageEnvelope = response.json().await?;
        let message = parse_reply(envelope)?;
        debug!(%session, message_id = %message.id, "prompt: complete");
        Ok(message)
    }

    async fn messages(&self, session: &SessionId, limit: usize) -> Result<Vec<SessionMessage>, BackendError> {
        debug!(%session, %limit, "messages: called");
        let limit = limit.to_string();
        let response = self
            .send_with_retry("messages", RetryPolicy::Transient, || {
                self.scoped(self.http.get(self.url(&format!("/session/{}/message", session))))
                    .query(&[("limit", limit.as_str())])
            })
            .await?;

        let envelopes: Vec<MessageEnvelope> = response.json().await?;
        parse_listing(envelopes)
    }
}

async fn check_status(response: Response) -> Result<Response, BackendError> {
    let status = response.status().as_u16();
    if response.status().is_success() {
        Ok(response)
    } else {
        debug!(%status, "check_status: API error");
        let text = response.text().await.unwrap_or_default();
        Err(BackendError::ApiError { status, message: text })
    }
}

fn map_reqwest_error(e: reqwest::Error, timeout: Duration) -> BackendError {
    if e.is_timeout() {
        BackendError::Timeout(timeout)
    } else {
        BackendError::Network(e)
    }
}

/// Convert the reply to a prompt
///
/// An assistant message that carries an `error` object is a failed turn.
fn parse_reply(envelope: MessageEnvelope) -> Result<SessionMessage, BackendError> {
    if envelope.info.role == "assistant"
        && let Some(error) = &envelope.info.error
    {
        return Err(BackendError::Remote(describe_remote_error(error)));
    }
    parse_envelope(envelope)
}

/// Convert a message listing
///
/// Errored turns are history here and are kept like any other message.
fn parse_listing(envelopes: Vec<MessageEnvelope>) -> Result<Vec<SessionMessage>, BackendError> {
    envelopes.into_iter().map(parse_envelope).collect()
}

/// Convert a wire message into a SessionMessage
fn parse_envelope(envelope: MessageEnvelope) -> Result<SessionMessage, BackendError> {
    let MessageEnvelope { info, parts } = envelope;
    debug!(id = %info.id, role = %info.role, part_count = parts.len(), "parse_envelope: called");

    let role = match info.role.as_str() {
        "user" => Role::User,
        "assistant" => Role::Assistant,
        other => return Err(BackendError::InvalidResponse(format!("unknown message role '{}'", other))),
    };

    let model = match (info.provider_id, info.model_id, info.model) {
        (Some(provider), Some(model), _) => Some(ModelConfig::new(provider, model)),
        (_, _, Some(model)) => Some(model),
        _ => None,
    };

    Ok(SessionMessage {
        id: info.id,
        role,
        model,
        parts: parts.into_iter().map(Part::from_json).collect(),
    })
}

/// Pull a readable message out of a backend error object
fn describe_remote_error(error: &serde_json::Value) -> String {
    error
        .pointer("/data/message")
        .and_then(|m| m.as_str())
        .or_else(|| error.get("message").and_then(|m| m.as_str()))
        .or_else(|| error.get("name").and_then(|m| m.as_str()))
        .map(str::to_string)
        .unwrap_or_else(|| error.to_string())
}

/// Parse a server-sent event payload; returns None for anything but `todo.updated`
pub fn parse_todo_event(data: &str) -> Option<(SessionId, Vec<HintEntry>)> {
    let event: ServerEvent = serde_json::from_str(data).ok()?;
    if event.event_type != "todo.updated" {
        return None;
    }
    let props: TodoProperties = match serde_json::from_value(event.properties) {
        Ok(p) => p,
        Err(e) => {
            warn!(error = %e, "parse_todo_event: malformed todo.updated payload");
            return None;
        }
    };
    Some((SessionId::new(props.session_id), props.todos))
}

#[derive(Debug, Deserialize)]
struct SessionInfo {
    id: String,
}

#[derive(Debug, Deserialize)]
struct MessageEnvelope {
    info: MessageInfo,
    #[serde(default)]
    parts: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct MessageInfo {
    id: String,
    role: String,
    #[serde(rename = "providerID")]
    provider_id: Option<String>,
    #[serde(rename = "modelID")]
    model_id: Option<String>,
    /// User messages carry the requested model as an object
    model: Option<ModelConfig>,
    error: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct ServerEvent {
    #[serde(rename = "type")]
    event_type: String,
    #[serde(default)]
    properties: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct TodoProperties {
    #[serde(rename = "sessionID")]
    session_id: String,
    todos: Vec<HintEntry>,
}
