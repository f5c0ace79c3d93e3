use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Parameter name -> collected value.
pub type ParamMap = Map<String, Value>;

/// A named automation with declared parameters and an execution kind.
/// Owned by the storage collaborator; read-only for the duration of a turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Script {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub parameters: Vec<Parameter>,
    /// Phrases that should route straight to this script.
    #[serde(default)]
    pub triggers: Vec<String>,
    pub execution: ExecutionKind,
}

impl Script {
    pub fn parameter(&self, name: &str) -> Option<&Parameter> {
        self.parameters.iter().find(|p| p.name == name)
    }

    pub fn required_parameters(&self) -> impl Iterator<Item = &Parameter> {
        self.parameters.iter().filter(|p| p.required)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Parameter {
    pub name: String,
    /// Asked verbatim when the value is missing.
    pub prompt: String,
    #[serde(default = "default_required")]
    pub required: bool,
    #[serde(default)]
    pub kind: ParameterKind,
    /// Words that anchor the value in free text ("city Paris", "to: bob").
    #[serde(default)]
    pub keywords: Vec<String>,
    /// Custom regex. The first capture group (or the whole match) is the value.
    #[serde(default)]
    pub pattern: Option<String>,
}

fn default_required() -> bool {
    true
}

impl Parameter {
    pub fn new(name: &str, prompt: &str) -> Self {
        Self {
            name: name.to_string(),
            prompt: prompt.to_string(),
            required: true,
            kind: ParameterKind::Text,
            keywords: Vec::new(),
            pattern: None,
        }
    }

    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    pub fn with_kind(mut self, kind: ParameterKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_keywords(mut self, keywords: &[&str]) -> Self {
        self.keywords = keywords.iter().map(|k| k.to_string()).collect();
        self
    }

    pub fn with_pattern(mut self, pattern: &str) -> Self {
        self.pattern = Some(pattern.to_string());
        self
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ParameterKind {
    #[default]
    Text,
    Number,
    Time,
    Date,
    Email,
    Url,
    Boolean,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ExecutionKind {
    /// Runs through the external script executor.
    Local,
    /// Issues a request through the action transport.
    #[serde(rename_all = "camelCase")]
    RemoteAction {
        endpoint: String,
        #[serde(default)]
        method: HttpMethod,
    },
    /// Performed by the host application (hosted chat model).
    ExternalChat,
    /// Any kind this build does not know how to run.
    #[serde(other)]
    Unsupported,
}

impl ExecutionKind {
    pub fn label(&self) -> &'static str {
        match self {
            ExecutionKind::Local => "local",
            ExecutionKind::RemoteAction { .. } => "remote-action",
            ExecutionKind::ExternalChat => "external-chat",
            ExecutionKind::Unsupported => "unsupported",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    #[default]
    Post,
    Put,
    Patch,
    Delete,
}

impl HttpMethod {
    /// Read-style requests carry their parameters in the query string.
    pub fn is_read(&self) -> bool {
        matches!(self, HttpMethod::Get)
    }
}
