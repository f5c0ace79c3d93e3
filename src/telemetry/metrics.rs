use super::event::{DispatchKind, SessionCloseReason, TelemetryEvent, TurnOutcomeKind};
use std::collections::VecDeque;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TelemetrySnapshot {
    pub turn_stats: TurnStats,
    pub session_stats: SessionStats,
    pub dispatch_stats: DispatchStats,
    pub transport_stats: TransportStats,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TurnStats {
    pub total: u64,
    pub general_assistant: u64,
    pub disambiguations: u64,
    pub prompts: u64,
    pub dispatched: u64,
    pub remote_pending: u64,
    pub resets: u64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionStats {
    pub opened: u64,
    pub completed: u64,
    pub abandoned: u64,
    pub parameters_collected: u64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DispatchStats {
    pub local: u64,
    pub remote: u64,
    pub external_chat: u64,
    pub unsupported: u64,
    pub failures: u64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransportStats {
    pub calls: u64,
    pub failures: u64,
    pub timeouts: u64,
    pub avg_latency_ms: f64,
    pub max_latency_ms: u64,
}

pub fn compute_snapshot(events: &VecDeque<TelemetryEvent>) -> TelemetrySnapshot {
    let mut snap = TelemetrySnapshot::default();
    let mut total_latency_ms = 0u64;

    for event in events {
        match event {
            TelemetryEvent::TurnRouted { outcome, .. } => {
                snap.turn_stats.total += 1;
                match outcome {
                    TurnOutcomeKind::GeneralAssistant => snap.turn_stats.general_assistant += 1,
                    TurnOutcomeKind::Disambiguation => snap.turn_stats.disambiguations += 1,
                    TurnOutcomeKind::ParameterPrompt => snap.turn_stats.prompts += 1,
                    TurnOutcomeKind::Dispatched => snap.turn_stats.dispatched += 1,
                    TurnOutcomeKind::RemoteActionPending => snap.turn_stats.remote_pending += 1,
                    TurnOutcomeKind::SessionReset => snap.turn_stats.resets += 1,
                }
            }
            TelemetryEvent::SessionOpened { .. } => snap.session_stats.opened += 1,
            TelemetryEvent::ParameterCollected { .. } => snap.session_stats.parameters_collected += 1,
            TelemetryEvent::SessionClosed { reason, .. } => match reason {
                SessionCloseReason::Completed => snap.session_stats.completed += 1,
                SessionCloseReason::ScriptVanished => snap.session_stats.abandoned += 1,
            },
            TelemetryEvent::Dispatch { kind, success, .. } => {
                match kind {
                    DispatchKind::Local => snap.dispatch_stats.local += 1,
                    DispatchKind::RemoteAction => snap.dispatch_stats.remote += 1,
                    DispatchKind::ExternalChat => snap.dispatch_stats.external_chat += 1,
                    DispatchKind::Unsupported => snap.dispatch_stats.unsupported += 1,
                }
                if !success {
                    snap.dispatch_stats.failures += 1;
                }
            }
            TelemetryEvent::Transport { status_code, success, elapsed_ms } => {
                snap.transport_stats.calls += 1;
                if !success {
                    snap.transport_stats.failures += 1;
                }
                if *status_code == 408 {
                    snap.transport_stats.timeouts += 1;
                }
                total_latency_ms += elapsed_ms;
                snap.transport_stats.max_latency_ms = snap.transport_stats.max_latency_ms.max(*elapsed_ms);
            }
        }
    }

    if snap.transport_stats.calls > 0 {
        snap.transport_stats.avg_latency_ms = total_latency_ms as f64 / snap.transport_stats.calls as f64;
    }

    snap
}
