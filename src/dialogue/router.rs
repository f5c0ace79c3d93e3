use crate::config::RouterConfig;
use crate::dialogue::context::{ActiveScriptContext, ConversationContext, DialogueState};
use crate::dialogue::response::*;
use crate::error::StoreError;
use crate::intent::classifier::IntentClassifier;
use crate::intent::extractor::EntityExtractor;
use crate::intent::types::{ClassificationResult, MatchTarget, RemoteActionDescriptor};
use crate::script::executor::ScriptExecutor;
use crate::script::store::ScriptStore;
use crate::script::types::{ExecutionKind, HttpMethod, ParamMap, Parameter, Script};
use crate::services::action::client::ActionTransport;
use crate::services::action::types::ActionRequest;
use crate::telemetry::event::{DispatchKind, SessionCloseReason, TelemetryEvent, TurnOutcomeKind};
use crate::telemetry::metrics::TelemetrySnapshot;
use crate::telemetry::recorder::TelemetryRecorder;
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use std::time::Instant;
use tracing::{debug, info, info_span, warn, Instrument};

/// Turn-by-turn orchestrator.
///
/// States per conversation:
/// - `Idle`: classify, then reply, disambiguate, dispatch, or open a session.
/// - `CollectingParameters`: fill the next missing parameter, then dispatch
///   once nothing is missing.
///
/// `route` never fails; every path ends in a `RouterResponse`.
pub struct IntentRouter {
    store: Arc<dyn ScriptStore>,
    executor: Arc<dyn ScriptExecutor>,
    transport: Option<Arc<ActionTransport>>,
    classifier: IntentClassifier,
    extractor: EntityExtractor,
    config: RouterConfig,
    telemetry: Mutex<TelemetryRecorder>,
}

impl IntentRouter {
    pub fn new(store: Arc<dyn ScriptStore>, executor: Arc<dyn ScriptExecutor>, config: RouterConfig) -> Self {
        Self {
            store,
            executor,
            transport: None,
            classifier: IntentClassifier::new(config),
            extractor: EntityExtractor::new(),
            config,
            telemetry: Mutex::new(TelemetryRecorder::new()),
        }
    }

    pub fn with_transport(mut self, transport: Arc<ActionTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Rebuilds the classifier index from the store. Call whenever the
    /// catalog changes.
    pub fn refresh_scripts(&mut self) -> Result<usize, StoreError> {
        let scripts = self.store.get_all()?;
        self.classifier.update_scripts(&scripts);
        info!(scripts = scripts.len(), "Script index refreshed");
        Ok(scripts.len())
    }

    pub fn update_remote_actions(&mut self, actions: &[RemoteActionDescriptor]) {
        self.classifier.update_remote_actions(actions);
    }

    pub fn telemetry_snapshot(&self) -> TelemetrySnapshot {
        self.telemetry
            .lock()
            .map(|t| t.snapshot())
            .unwrap_or_default()
    }

    pub async fn route(&self, utterance: &str, ctx: &mut ConversationContext) -> RouterResponse {
        ctx.turn += 1;
        let span = info_span!("route", conversation_id = %ctx.conversation_id, turn = ctx.turn);
        let conversation_id = ctx.conversation_id;
        let turn = ctx.turn;

        let response = async {
            debug!(utterance, "Routing utterance");
            if ctx.is_idle() {
                self.route_idle(utterance, ctx).await
            } else {
                self.continue_collection(utterance, ctx).await
            }
        }
        .instrument(span)
        .await;

        self.record(TelemetryEvent::TurnRouted {
            conversation_id,
            turn,
            outcome: outcome_of(response.kind),
        });
        response
    }

    async fn route_idle(&self, utterance: &str, ctx: &mut ConversationContext) -> RouterResponse {
        let classification = self.classifier.classify(utterance);
        let top = match classification.top_match() {
            Some(top) if top.confidence >= self.config.acceptance_floor => top.clone(),
            _ => {
                debug!("No confident match, falling back to general assistant");
                return general_assistant(utterance);
            }
        };

        if classification.requires_disambiguation {
            if let Some(response) = self.disambiguate(&classification) {
                return response;
            }
        }

        match &top.target {
            MatchTarget::RemoteAction { action_id } => {
                info!(action_id = %action_id, confidence = top.confidence, "Remote action matched");
                RouterResponse::new(ResponseKind::RemoteActionPending, REMOTE_PENDING_MESSAGE)
            }
            MatchTarget::Script { script_id } => match self.store.get_by_id(script_id) {
                Ok(Some(script)) => {
                    info!(script_id = %script.id, confidence = top.confidence, "Script matched");
                    self.start_script(script, utterance, ctx).await
                }
                Ok(None) => {
                    warn!(script_id = %script_id, "Classified script is missing from storage; index is stale");
                    general_assistant(utterance)
                }
                Err(e) => {
                    warn!(script_id = %script_id, "Script lookup failed: {}", e);
                    general_assistant(utterance)
                }
            },
        }
    }

    fn disambiguate(&self, classification: &ClassificationResult) -> Option<RouterResponse> {
        let candidates = classification.near_ties(
            self.config.acceptance_floor,
            self.config.disambiguation_margin,
            self.config.max_candidates,
        );

        // Only script-backed candidates can be chosen from the list.
        let scripts: Vec<Script> = candidates
            .iter()
            .filter_map(|m| m.script_id())
            .filter_map(|id| self.store.get_by_id(id).ok().flatten())
            .collect();
        if scripts.is_empty() {
            return None;
        }

        info!(candidates = scripts.len(), "Asking user to disambiguate");
        let ids: Vec<Value> = scripts.iter().map(|s| Value::String(s.id.clone())).collect();
        Some(
            RouterResponse::new(ResponseKind::Disambiguation, render_disambiguation(&scripts))
                .with_result(json!({ "candidates": ids })),
        )
    }

    async fn start_script(&self, script: Script, utterance: &str, ctx: &mut ConversationContext) -> RouterResponse {
        let extracted = self.extractor.extract(utterance, &script.parameters);
        let missing = self.extractor.missing(&script.parameters, &extracted);

        if missing.is_empty() {
            return self.dispatch(&script, extracted).await;
        }

        let prompt = missing[0].prompt.clone();
        let names: Vec<String> = missing.into_iter().map(|m| m.name).collect();
        info!(script_id = %script.id, missing = names.len(), "Opening parameter collection");
        self.record(TelemetryEvent::SessionOpened {
            script_id: script.id.clone(),
            missing: names.len(),
        });
        ctx.state = DialogueState::CollectingParameters(ActiveScriptContext::open(&script.id, names, extracted));

        RouterResponse::new(ResponseKind::ParameterPrompt, prompt).for_script(&script.id)
    }

    async fn continue_collection(&self, utterance: &str, ctx: &mut ConversationContext) -> RouterResponse {
        let script_id = match ctx.active_script() {
            Some(active) => active.script_id().to_string(),
            None => return self.route_idle(utterance, ctx).await,
        };

        let script = match self.store.get_by_id(&script_id) {
            Ok(Some(script)) => script,
            Ok(None) => return self.abandon(&script_id, ctx, "Script vanished mid-session"),
            Err(e) => return self.abandon(&script_id, ctx, &format!("Script lookup failed: {}", e)),
        };

        if let DialogueState::CollectingParameters(active) = &mut ctx.state {
            if let Some(name) = active.next_missing().map(str::to_string) {
                // A parameter dropped from the script since the session opened
                // is still answered literally.
                let fallback = Parameter::new(&name, "");
                let parameter = script.parameter(&name).unwrap_or(&fallback);
                let value = self.extractor.extract_single(utterance, parameter);
                active.record_next(value);
                debug!(script_id = %script_id, parameter = %name, remaining = active.missing_params().len(), "Parameter collected");
                self.record(TelemetryEvent::ParameterCollected {
                    script_id: script_id.clone(),
                    remaining: active.missing_params().len(),
                });
            }

            if !active.is_complete() {
                let next = active.next_missing().unwrap_or_default();
                let prompt = script
                    .parameter(next)
                    .map(|p| p.prompt.clone())
                    .unwrap_or_else(|| format!("Please provide a value for {}.", next));
                return RouterResponse::new(ResponseKind::ParameterPrompt, prompt).for_script(&script_id);
            }
        }

        let collected = match std::mem::take(&mut ctx.state) {
            DialogueState::CollectingParameters(active) => active.into_collected(),
            DialogueState::Idle => ParamMap::new(),
        };
        info!(script_id = %script_id, "Parameter collection complete");
        self.record(TelemetryEvent::SessionClosed {
            script_id: script_id.clone(),
            reason: SessionCloseReason::Completed,
        });
        self.dispatch(&script, collected).await
    }

    fn abandon(&self, script_id: &str, ctx: &mut ConversationContext, reason: &str) -> RouterResponse {
        warn!(script_id = %script_id, "{}; resetting conversation", reason);
        ctx.reset();
        self.record(TelemetryEvent::SessionClosed {
            script_id: script_id.to_string(),
            reason: SessionCloseReason::ScriptVanished,
        });
        RouterResponse::new(ResponseKind::SessionReset, SESSION_RESET_MESSAGE)
    }

    async fn dispatch(&self, script: &Script, params: ParamMap) -> RouterResponse {
        info!(script_id = %script.id, kind = script.execution.label(), "Dispatching script");
        let response = match &script.execution {
            ExecutionKind::Local => match self.executor.execute_local(script, &params).await {
                Ok(result) => {
                    RouterResponse::new(ResponseKind::ScriptExecuted, format_result(&result)).with_result(result)
                }
                Err(e) => {
                    warn!(script_id = %script.id, "Local execution failed: {}", e);
                    RouterResponse::new(ResponseKind::ExecutionFailed, format!("{}{}", LOCAL_FAILURE_PREFIX, e))
                }
            },
            ExecutionKind::RemoteAction { endpoint, method } => {
                self.dispatch_remote(script, endpoint, *method, params).await
            }
            ExecutionKind::ExternalChat => RouterResponse::new(ResponseKind::ExternalChatRequired, EXTERNAL_CHAT_SENTINEL)
                .with_result(json!({ "type": EXTERNAL_CHAT_TYPE, "params": params })),
            ExecutionKind::Unsupported => RouterResponse::new(ResponseKind::Unsupported, UNSUPPORTED_MESSAGE),
        };

        self.record(TelemetryEvent::Dispatch {
            script_id: script.id.clone(),
            kind: dispatch_kind(&script.execution),
            success: matches!(
                response.kind,
                ResponseKind::ScriptExecuted | ResponseKind::ExternalChatRequired
            ),
        });
        response.for_script(&script.id)
    }

    async fn dispatch_remote(
        &self,
        script: &Script,
        endpoint: &str,
        method: HttpMethod,
        params: ParamMap,
    ) -> RouterResponse {
        let transport = match &self.transport {
            Some(transport) => transport,
            None => {
                warn!(script_id = %script.id, "Remote action dispatched without a transport");
                return RouterResponse::new(ResponseKind::ConfigurationError, NO_TRANSPORT_MESSAGE);
            }
        };

        let request = if method.is_read() {
            let query = params
                .iter()
                .map(|(name, value)| (name.clone(), query_value(value)))
                .collect();
            ActionRequest::new(method, endpoint).with_query(query)
        } else {
            ActionRequest::new(method, endpoint).with_body(Value::Object(params))
        };

        let started = Instant::now();
        let outcome = transport.execute(request).await;
        self.record(TelemetryEvent::Transport {
            status_code: outcome.status_code,
            success: outcome.success,
            elapsed_ms: started.elapsed().as_millis() as u64,
        });

        if outcome.success {
            let data = outcome.data.unwrap_or(Value::Null);
            return RouterResponse::new(ResponseKind::ScriptExecuted, format_result(&data)).with_result(data);
        }

        let error = outcome
            .error
            .clone()
            .unwrap_or_else(|| "Unknown error".to_string());
        warn!(script_id = %script.id, status = outcome.status_code, "Remote action failed: {}", error);
        let raw = serde_json::to_value(&outcome).unwrap_or(Value::Null);
        RouterResponse::new(ResponseKind::ExecutionFailed, format!("{}{}", REMOTE_FAILURE_PREFIX, error)).with_result(raw)
    }

    fn record(&self, event: TelemetryEvent) {
        if let Ok(mut telemetry) = self.telemetry.lock() {
            telemetry.record(event);
        }
    }
}

fn general_assistant(utterance: &str) -> RouterResponse {
    RouterResponse::new(ResponseKind::GeneralAssistant, general_assistant_reply(utterance))
}

fn query_value(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

fn outcome_of(kind: ResponseKind) -> TurnOutcomeKind {
    match kind {
        ResponseKind::GeneralAssistant => TurnOutcomeKind::GeneralAssistant,
        ResponseKind::Disambiguation => TurnOutcomeKind::Disambiguation,
        ResponseKind::ParameterPrompt => TurnOutcomeKind::ParameterPrompt,
        ResponseKind::RemoteActionPending => TurnOutcomeKind::RemoteActionPending,
        ResponseKind::SessionReset => TurnOutcomeKind::SessionReset,
        ResponseKind::ScriptExecuted
        | ResponseKind::ExecutionFailed
        | ResponseKind::ExternalChatRequired
        | ResponseKind::ConfigurationError
        | ResponseKind::Unsupported => TurnOutcomeKind::Dispatched,
    }
}

fn dispatch_kind(kind: &ExecutionKind) -> DispatchKind {
    match kind {
        ExecutionKind::Local => DispatchKind::Local,
        ExecutionKind::RemoteAction { .. } => DispatchKind::RemoteAction,
        ExecutionKind::ExternalChat => DispatchKind::ExternalChat,
        ExecutionKind::Unsupported => DispatchKind::Unsupported,
    }
}
