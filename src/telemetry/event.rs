use serde::{Deserialize, Serialize};
use uuid::Uuid;

// Allowed: IDs, Kinds, Counts, Status Codes, Durations
// Forbidden: Utterances, Parameter Values, Payloads

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TelemetryEvent {
    TurnRouted {
        conversation_id: Uuid,
        turn: u64,
        outcome: TurnOutcomeKind,
    },

    SessionOpened {
        script_id: String,
        missing: usize,
    },

    ParameterCollected {
        script_id: String,
        remaining: usize,
    },

    SessionClosed {
        script_id: String,
        reason: SessionCloseReason,
    },

    Dispatch {
        script_id: String,
        kind: DispatchKind,
        success: bool,
    },

    Transport {
        status_code: u16,
        success: bool,
        elapsed_ms: u64,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TurnOutcomeKind {
    GeneralAssistant,
    Disambiguation,
    ParameterPrompt,
    Dispatched,
    RemoteActionPending,
    SessionReset,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionCloseReason {
    Completed,
    ScriptVanished,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DispatchKind {
    Local,
    RemoteAction,
    ExternalChat,
    Unsupported,
}
