use crate::script::types::ParamMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Per-conversation state, owned by the caller and threaded between turns.
/// Only the router mutates it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationContext {
    pub conversation_id: Uuid,
    /// Turns routed so far. Used for log correlation only.
    pub turn: u64,
    pub state: DialogueState,
}

impl Default for ConversationContext {
    fn default() -> Self {
        Self::new()
    }
}

impl ConversationContext {
    pub fn new() -> Self {
        Self {
            conversation_id: Uuid::new_v4(),
            turn: 0,
            state: DialogueState::Idle,
        }
    }

    pub fn is_idle(&self) -> bool {
        matches!(self.state, DialogueState::Idle)
    }

    pub fn active_script(&self) -> Option<&ActiveScriptContext> {
        match &self.state {
            DialogueState::CollectingParameters(active) => Some(active),
            DialogueState::Idle => None,
        }
    }

    pub(crate) fn reset(&mut self) {
        self.state = DialogueState::Idle;
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", content = "session", rename_all = "camelCase")]
pub enum DialogueState {
    #[default]
    Idle,
    CollectingParameters(ActiveScriptContext),
}

/// An open parameter-collection session.
///
/// INVARIANT: `missing_params` holds exactly the script's required parameter
/// names that are not keys of `collected_params`, in declared order. The only
/// mutator, `record_next`, moves one name across, so the invariant set up by
/// `open` is preserved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveScriptContext {
    script_id: String,
    missing_params: Vec<String>,
    collected_params: ParamMap,
}

impl ActiveScriptContext {
    /// `missing` must come from `EntityExtractor::missing(params, &collected)`.
    pub(crate) fn open(script_id: &str, missing: Vec<String>, collected: ParamMap) -> Self {
        Self {
            script_id: script_id.to_string(),
            missing_params: missing,
            collected_params: collected,
        }
    }

    pub fn script_id(&self) -> &str {
        &self.script_id
    }

    pub fn missing_params(&self) -> &[String] {
        &self.missing_params
    }

    pub fn collected_params(&self) -> &ParamMap {
        &self.collected_params
    }

    /// The parameter the user is being asked for.
    pub fn next_missing(&self) -> Option<&str> {
        self.missing_params.first().map(String::as_str)
    }

    pub fn is_complete(&self) -> bool {
        self.missing_params.is_empty()
    }

    /// Stores `value` under the first missing name and removes that name.
    /// Returns the name that was filled.
    pub(crate) fn record_next(&mut self, value: Value) -> Option<String> {
        if self.missing_params.is_empty() {
            return None;
        }
        let name = self.missing_params.remove(0);
        self.collected_params.insert(name.clone(), value);
        Some(name)
    }

    pub(crate) fn into_collected(self) -> ParamMap {
        self.collected_params
    }
}
