use crate::script::types::HttpMethod;
use crate::services::action::config::{AuthType, TransportConfig, TransportConfigUpdate};
use crate::services::action::types::{ActionRequest, ActionResponse, ResponseValidator};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde_json::Value;
use std::sync::{PoisonError, RwLock};
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

pub const TIMEOUT_ERROR: &str = "Request timeout";
pub const CANCELLED_ERROR: &str = "Request cancelled";
pub const VALIDATION_ERROR: &str = "Response validation failed";
pub const NETWORK_ERROR: &str = "Network error";

/// Outbound transport for remote actions.
///
/// `execute` never fails: timeouts, network errors, undecodable bodies and
/// shape mismatches all come back as an `ActionResponse` with
/// `success == false`.
pub struct ActionTransport {
    client: Client,
    config: RwLock<TransportConfig>,
}

impl ActionTransport {
    pub fn new(config: TransportConfig) -> Self {
        Self {
            // Deadline is enforced per call in `execute_with_cancellation`.
            client: Client::new(),
            config: RwLock::new(config),
        }
    }

    /// Snapshot of the current configuration.
    pub fn config(&self) -> TransportConfig {
        self.config
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Merges `update` into the configuration. Calls already in flight keep
    /// the snapshot they started with.
    pub fn update_config(&self, update: TransportConfigUpdate) {
        let mut config = self.config.write().unwrap_or_else(PoisonError::into_inner);
        config.apply(update);
        debug!(base_url = %config.base_url, auth = ?config.auth_type, timeout_ms = config.timeout.as_millis() as u64, "Transport configuration updated");
    }

    pub async fn execute(&self, request: ActionRequest) -> ActionResponse {
        self.execute_with_cancellation(request, &CancellationToken::new())
            .await
    }

    /// Like `execute`, but also resolves early when `cancel` fires. The
    /// pending request future is dropped on timeout or cancellation, which
    /// tears down the connection.
    pub async fn execute_with_cancellation(
        &self,
        request: ActionRequest,
        cancel: &CancellationToken,
    ) -> ActionResponse {
        let config = self.config();
        let url = join_url(&config.base_url, &request.endpoint);
        let started = Instant::now();
        let builder = self.build(&config, &url, &request);

        let call = async {
            let response = builder.send().await?;
            let status = response.status();
            let body = response.bytes().await?;
            Ok::<_, reqwest::Error>((status, body))
        };

        let outcome = tokio::select! {
            result = call => result,
            _ = tokio::time::sleep(config.timeout) => {
                warn!(%url, timeout_ms = config.timeout.as_millis() as u64, "Remote action timed out");
                return ActionResponse::failure(TIMEOUT_ERROR, None, 408);
            }
            _ = cancel.cancelled() => {
                warn!(%url, "Remote action cancelled");
                return ActionResponse::failure(CANCELLED_ERROR, None, 0);
            }
        };

        let elapsed_ms = started.elapsed().as_millis() as u64;
        let (status, body) = match outcome {
            Ok(parts) => parts,
            Err(e) => {
                warn!(%url, elapsed_ms, "Remote action transport failure: {}", e);
                return ActionResponse::failure(network_message(&e), None, 0);
            }
        };

        let payload = if body.iter().all(u8::is_ascii_whitespace) {
            Value::Null
        } else {
            match serde_json::from_slice::<Value>(&body) {
                Ok(payload) => payload,
                Err(e) => {
                    warn!(%url, status = status.as_u16(), "Undecodable remote action body: {}", e);
                    return ActionResponse::failure(e.to_string(), None, 0);
                }
            }
        };

        info!(%url, status = status.as_u16(), elapsed_ms, "Remote action completed");
        interpret(status, payload, request.validator.as_deref())
    }

    fn build(&self, config: &TransportConfig, url: &str, request: &ActionRequest) -> RequestBuilder {
        let mut builder = self
            .client
            .request(to_method(request.method), url)
            .header(CONTENT_TYPE, "application/json");

        match (config.auth_type, config.token.as_deref()) {
            (AuthType::Bearer, Some(token)) => {
                builder = builder.header(AUTHORIZATION, format!("Bearer {}", token));
            }
            (AuthType::ApiKey, Some(token)) => {
                builder = builder.header("X-API-Key", token);
            }
            _ => {}
        }

        if request.method.is_read() {
            if let Some(query) = &request.query {
                builder = builder.query(query);
            }
        } else if let Some(body) = &request.body {
            builder = builder.json(body);
        }
        builder
    }
}

fn interpret(status: StatusCode, payload: Value, validator: Option<&dyn ResponseValidator>) -> ActionResponse {
    let code = status.as_u16();

    // Shape validation overrides HTTP-level success.
    if let Some(validator) = validator {
        if !validator.validate(&payload) {
            return ActionResponse::failure(VALIDATION_ERROR, Some(payload), code);
        }
    }

    if status.is_success() {
        return ActionResponse::ok(payload, code);
    }

    let error = match &payload {
        Value::String(message) => message.clone(),
        Value::Object(object) => match object.get("error") {
            Some(Value::String(message)) => message.clone(),
            _ => status_text(status),
        },
        _ => status_text(status),
    };
    ActionResponse::failure(error, Some(payload), code)
}

fn status_text(status: StatusCode) -> String {
    status
        .canonical_reason()
        .map(str::to_string)
        .unwrap_or_else(|| status.as_str().to_string())
}

fn network_message(error: &reqwest::Error) -> String {
    let message = error.to_string();
    if message.trim().is_empty() {
        NETWORK_ERROR.to_string()
    } else {
        message
    }
}

fn to_method(method: HttpMethod) -> Method {
    match method {
        HttpMethod::Get => Method::GET,
        HttpMethod::Post => Method::POST,
        HttpMethod::Put => Method::PUT,
        HttpMethod::Patch => Method::PATCH,
        HttpMethod::Delete => Method::DELETE,
    }
}

/// Joins base and endpoint with exactly one slash. Absolute endpoints are
/// used as-is.
pub fn join_url(base: &str, endpoint: &str) -> String {
    if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
        return endpoint.to_string();
    }
    let base = base.trim_end_matches('/');
    let endpoint = endpoint.trim_start_matches('/');
    if endpoint.is_empty() {
        base.to_string()
    } else {
        format!("{}/{}", base, endpoint)
    }
}
