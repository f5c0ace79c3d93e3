use crate::intent::scoring::{stem_match, tokenize};
use crate::script::types::Script;
use serde::Serialize;
use serde_json::Value;

/// Message of the sentinel response asking the host to run a hosted chat call.
pub const EXTERNAL_CHAT_SENTINEL: &str = "GEMINI_CHAT_EXECUTION_REQUIRED";
pub const EXTERNAL_CHAT_TYPE: &str = "external-chat";

pub const LOCAL_FAILURE_PREFIX: &str = "Script execution failed: ";
pub const REMOTE_FAILURE_PREFIX: &str = "MCP request failed: ";

pub const NO_TRANSPORT_MESSAGE: &str =
    "Remote actions are not configured. Set up an action endpoint before running this script.";
pub const UNSUPPORTED_MESSAGE: &str = "This script type is not supported yet.";
pub const SESSION_RESET_MESSAGE: &str =
    "The script we were working on is no longer available. Let's start over. What would you like to do?";
pub const REMOTE_PENDING_MESSAGE: &str =
    "I found a matching remote action, but running remote actions directly from chat is not implemented yet.";
pub const DISAMBIGUATION_HEADER: &str = "I found several scripts that could match. Which one did you mean?";

pub const REMINDER_REPLY: &str =
    "I can help with reminders! Create a reminder script and I'll run it for you whenever you ask.";
pub const GREETING_REPLY: &str = "Hello! How can I help you today?";
pub const SUGGESTION_REPLY: &str =
    "I'm not sure how to help with that yet. You could create a script for this task and I'll run it next time.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResponseKind {
    GeneralAssistant,
    Disambiguation,
    ParameterPrompt,
    ScriptExecuted,
    ExecutionFailed,
    RemoteActionPending,
    ExternalChatRequired,
    SessionReset,
    ConfigurationError,
    Unsupported,
}

/// What `route` hands back for every turn. Always well-formed.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RouterResponse {
    /// Display text for the user.
    pub message: String,
    pub kind: ResponseKind,
    pub script_id: Option<String>,
    /// Untouched raw outcome for programmatic consumers.
    pub execution_result: Option<Value>,
}

impl RouterResponse {
    pub fn new(kind: ResponseKind, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            kind,
            script_id: None,
            execution_result: None,
        }
    }

    pub fn for_script(mut self, script_id: &str) -> Self {
        self.script_id = Some(script_id.to_string());
        self
    }

    pub fn with_result(mut self, result: Value) -> Self {
        self.execution_result = Some(result);
        self
    }
}

/// Presentational rendering of an execution result.
pub fn format_result(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Number(number) => number.to_string(),
        Value::Object(_) | Value::Array(_) => {
            serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
        }
        other => other.to_string(),
    }
}

/// Numbered "<n>. <name> - <description>" lines, in the order given.
pub fn render_disambiguation(scripts: &[Script]) -> String {
    let mut out = String::from(DISAMBIGUATION_HEADER);
    for (index, script) in scripts.iter().enumerate() {
        out.push('\n');
        if script.description.is_empty() {
            out.push_str(&format!("{}. {}", index + 1, script.name));
        } else {
            out.push_str(&format!("{}. {} - {}", index + 1, script.name, script.description));
        }
    }
    out
}

/// Canned reply used when nothing in the catalog matches. Pure text
/// heuristics; never touches the classifier or the transport.
pub fn general_assistant_reply(utterance: &str) -> &'static str {
    let tokens = tokenize(utterance);
    if tokens
        .iter()
        .any(|t| stem_match(t, "remind") || t == "alarm")
    {
        return REMINDER_REPLY;
    }
    if tokens.iter().any(|t| GREETINGS.contains(&t.as_str())) {
        return GREETING_REPLY;
    }
    SUGGESTION_REPLY
}

const GREETINGS: &[&str] = &["hello", "hi", "hey", "greetings", "howdy", "hiya", "yo"];
