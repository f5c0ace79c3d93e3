use crate::script::types::HttpMethod;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// Response-shape check applied to a decoded payload.
pub trait ResponseValidator: Send + Sync {
    fn validate(&self, payload: &Value) -> bool;
}

impl<F> ResponseValidator for F
where
    F: Fn(&Value) -> bool + Send + Sync,
{
    fn validate(&self, payload: &Value) -> bool {
        self(payload)
    }
}

/// Payload must be an object carrying every listed key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequiredFields(pub Vec<String>);

impl RequiredFields {
    pub fn new(fields: &[&str]) -> Self {
        Self(fields.iter().map(|f| f.to_string()).collect())
    }
}

impl ResponseValidator for RequiredFields {
    fn validate(&self, payload: &Value) -> bool {
        match payload.as_object() {
            Some(object) => self.0.iter().all(|field| object.contains_key(field)),
            None => false,
        }
    }
}

#[derive(Clone)]
pub struct ActionRequest {
    /// Relative to the configured base URL, or absolute.
    pub endpoint: String,
    pub method: HttpMethod,
    /// Only sent for read-style requests.
    pub query: Option<Vec<(String, String)>>,
    pub body: Option<Value>,
    pub validator: Option<Arc<dyn ResponseValidator>>,
}

impl fmt::Debug for ActionRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionRequest")
            .field("endpoint", &self.endpoint)
            .field("method", &self.method)
            .field("query", &self.query)
            .field("body", &self.body)
            .field("validator", &self.validator.is_some())
            .finish()
    }
}

impl ActionRequest {
    pub fn new(method: HttpMethod, endpoint: &str) -> Self {
        Self {
            endpoint: endpoint.to_string(),
            method,
            query: None,
            body: None,
            validator: None,
        }
    }

    pub fn get(endpoint: &str) -> Self {
        Self::new(HttpMethod::Get, endpoint)
    }

    pub fn post(endpoint: &str) -> Self {
        Self::new(HttpMethod::Post, endpoint)
    }

    pub fn with_query(mut self, query: Vec<(String, String)>) -> Self {
        self.query = Some(query);
        self
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn with_validator(mut self, validator: impl ResponseValidator + 'static) -> Self {
        self.validator = Some(Arc::new(validator));
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionResponse {
    pub success: bool,
    pub data: Option<Value>,
    pub error: Option<String>,
    /// HTTP status, 408 for a local timeout, 0 for transport-level failures.
    pub status_code: u16,
}

impl ActionResponse {
    pub fn ok(data: Value, status_code: u16) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            status_code,
        }
    }

    pub fn failure(error: impl Into<String>, data: Option<Value>, status_code: u16) -> Self {
        Self {
            success: false,
            data,
            error: Some(error.into()),
            status_code,
        }
    }

    /// Decode the payload into a typed value.
    pub fn data_as<T: DeserializeOwned>(&self) -> Option<T> {
        self.data
            .as_ref()
            .and_then(|data| serde_json::from_value(data.clone()).ok())
    }
}
