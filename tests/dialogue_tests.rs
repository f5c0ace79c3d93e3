mod common;

use common::*;
use nexus_dispatch::config::RouterConfig;
use nexus_dispatch::dialogue::response::{
    EXTERNAL_CHAT_SENTINEL, GREETING_REPLY, NO_TRANSPORT_MESSAGE, REMINDER_REPLY, REMOTE_PENDING_MESSAGE,
    SESSION_RESET_MESSAGE, SUGGESTION_REPLY, UNSUPPORTED_MESSAGE,
};
use nexus_dispatch::dialogue::{ConversationContext, ResponseKind};
use nexus_dispatch::intent::{EntityExtractor, RemoteActionDescriptor};
use nexus_dispatch::script::{ExecutionKind, InMemoryScriptStore, Parameter, Script};
use nexus_dispatch::services::action::{ActionTransport, TransportConfig};
use nexus_dispatch::IntentRouter;
use serde_json::json;
use std::sync::Arc;

/// missing == required - keys(collected), in declared order.
fn assert_session_invariant(ctx: &ConversationContext, script: &Script) {
    if let Some(active) = ctx.active_script() {
        let expected: Vec<String> = EntityExtractor::new()
            .missing(&script.parameters, active.collected_params())
            .into_iter()
            .map(|m| m.name)
            .collect();
        assert_eq!(active.missing_params(), expected.as_slice());
    }
}

#[tokio::test]
async fn test_hello_without_scripts_greets() {
    let store = Arc::new(InMemoryScriptStore::new());
    let executor = Arc::new(RecordingExecutor::returning(json!("ok")));
    let router = router_with(store, executor.clone());
    let mut ctx = ConversationContext::new();

    let response = router.route("hello", &mut ctx).await;

    assert_eq!(response.kind, ResponseKind::GeneralAssistant);
    assert_eq!(response.message, GREETING_REPLY);
    assert!(ctx.is_idle());
    assert!(ctx.active_script().is_none());
    assert!(executor.calls().is_empty());
}

#[tokio::test]
async fn test_general_assistant_heuristics() {
    let store = Arc::new(InMemoryScriptStore::new());
    let router = router_with(store, Arc::new(RecordingExecutor::returning(json!(null))));
    let mut ctx = ConversationContext::new();

    assert_eq!(router.route("Can you set a reminder?", &mut ctx).await.message, REMINDER_REPLY);
    assert_eq!(router.route("Hey there", &mut ctx).await.message, GREETING_REPLY);
    assert_eq!(router.route("this is a thing", &mut ctx).await.message, SUGGESTION_REPLY);
    assert!(ctx.is_idle());
}

#[tokio::test]
async fn test_reminder_collects_time_over_two_turns() {
    let store = Arc::new(InMemoryScriptStore::with_scripts(vec![set_reminder()]));
    let executor = Arc::new(RecordingExecutor::returning(json!("Reminder set")));
    let router = router_with(store, executor.clone());
    let mut ctx = ConversationContext::new();

    // Turn 1: prompt for the missing time.
    let first = router.route("remind me", &mut ctx).await;
    assert_eq!(first.kind, ResponseKind::ParameterPrompt);
    assert_eq!(first.message, "When should I remind you?");
    let active = ctx.active_script().expect("collecting parameters");
    assert_eq!(active.script_id(), "set-reminder");
    assert_eq!(active.missing_params(), ["time".to_string()]);
    assert!(active.collected_params().is_empty());
    assert!(executor.calls().is_empty());

    // Turn 2: whole answer becomes the value, then dispatch.
    let second = router.route("tomorrow at 9am", &mut ctx).await;
    assert_eq!(second.kind, ResponseKind::ScriptExecuted);
    assert_eq!(second.message, "Reminder set");
    assert_eq!(second.execution_result, Some(json!("Reminder set")));
    assert!(ctx.is_idle(), "Session must not linger after dispatch");

    let calls = executor.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].0, "set-reminder");
    assert_eq!(calls[0].1.get("time"), Some(&json!("tomorrow at 9am")));
    assert_eq!(calls[0].1.len(), 1);
}

#[tokio::test]
async fn test_zero_parameter_script_dispatches_first_turn() {
    let store = Arc::new(InMemoryScriptStore::with_scripts(vec![flip_coin(), set_reminder()]));
    let executor = Arc::new(RecordingExecutor::returning(json!({ "side": "heads" })));
    let router = router_with(store, executor.clone());
    let mut ctx = ConversationContext::new();

    let response = router.route("flip a coin", &mut ctx).await;

    assert_eq!(response.kind, ResponseKind::ScriptExecuted);
    assert_eq!(response.script_id.as_deref(), Some("flip-coin"));
    assert!(ctx.is_idle());
    assert_eq!(executor.calls().len(), 1);
    // Structured results render as indented text; the raw value is untouched.
    assert_eq!(response.message, "{\n  \"side\": \"heads\"\n}");
    assert_eq!(response.execution_result, Some(json!({ "side": "heads" })));
}

#[tokio::test]
async fn test_numeric_result_renders_as_decimal() {
    let store = Arc::new(InMemoryScriptStore::with_scripts(vec![flip_coin()]));
    let router = router_with(store, Arc::new(RecordingExecutor::returning(json!(42))));
    let mut ctx = ConversationContext::new();

    let response = router.route("flip coin", &mut ctx).await;

    assert_eq!(response.message, "42");
    assert_eq!(response.execution_result, Some(json!(42)));
}

#[tokio::test]
async fn test_session_invariant_and_progress_every_turn() {
    let script = send_email();
    let store = Arc::new(InMemoryScriptStore::with_scripts(vec![script.clone()]));
    let executor = Arc::new(RecordingExecutor::returning(json!("sent")));
    let router = router_with(store, executor.clone());
    let mut ctx = ConversationContext::new();

    let first = router.route("send an email to bob@example.com", &mut ctx).await;
    assert_eq!(first.message, "What is the subject?");
    assert_session_invariant(&ctx, &script);
    let active = ctx.active_script().expect("collecting");
    assert_eq!(active.collected_params().get("recipient"), Some(&json!("bob@example.com")));
    assert_eq!(active.missing_params(), ["subject".to_string(), "body".to_string()]);

    // Unparseable answers still move exactly one parameter.
    let second = router.route("Lunch plans", &mut ctx).await;
    assert_eq!(second.message, "What should the email say?");
    assert_session_invariant(&ctx, &script);
    let active = ctx.active_script().expect("still collecting");
    assert_eq!(active.missing_params(), ["body".to_string()]);
    assert_eq!(active.collected_params().get("subject"), Some(&json!("Lunch plans")));

    let third = router.route("See you at noon", &mut ctx).await;
    assert_eq!(third.kind, ResponseKind::ScriptExecuted);
    assert!(ctx.is_idle());

    let calls = executor.calls();
    assert_eq!(calls.len(), 1);
    let params = &calls[0].1;
    assert_eq!(params.get("recipient"), Some(&json!("bob@example.com")));
    assert_eq!(params.get("subject"), Some(&json!("Lunch plans")));
    assert_eq!(params.get("body"), Some(&json!("See you at noon")));
    assert!(params.get("cc").is_none(), "Optional parameters are never prompted for");
}

#[tokio::test]
async fn test_script_deleted_mid_session_resets() {
    let store = Arc::new(InMemoryScriptStore::with_scripts(vec![set_reminder()]));
    let executor = Arc::new(RecordingExecutor::returning(json!("ok")));
    let router = router_with(store.clone(), executor.clone());
    let mut ctx = ConversationContext::new();

    router.route("remind me", &mut ctx).await;
    assert!(!ctx.is_idle());

    store.remove("set-reminder").expect("remove");
    let response = router.route("tomorrow at 9am", &mut ctx).await;

    assert_eq!(response.kind, ResponseKind::SessionReset);
    assert_eq!(response.message, SESSION_RESET_MESSAGE);
    assert!(ctx.is_idle());
    assert!(executor.calls().is_empty());
}

#[tokio::test]
async fn test_ambiguous_match_lists_candidates() {
    let store = Arc::new(InMemoryScriptStore::with_scripts(vec![
        backup("backup-photos", "Photos"),
        backup("backup-documents", "Documents"),
    ]));
    let executor = Arc::new(RecordingExecutor::returning(json!("ok")));
    let router = router_with(store, executor.clone());
    let mut ctx = ConversationContext::new();

    let response = router.route("backup", &mut ctx).await;

    assert_eq!(response.kind, ResponseKind::Disambiguation);
    let lines: Vec<&str> = response.message.lines().collect();
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[1], "1. Backup Photos - Copy photos to the backup drive");
    assert_eq!(lines[2], "2. Backup Documents - Copy documents to the backup drive");
    assert!(ctx.is_idle());
    assert!(executor.calls().is_empty());
}

#[tokio::test]
async fn test_disambiguation_caps_at_three() {
    let store = Arc::new(InMemoryScriptStore::with_scripts(vec![
        backup("b1", "Photos"),
        backup("b2", "Documents"),
        backup("b3", "Music"),
        backup("b4", "Videos"),
    ]));
    let router = router_with(store, Arc::new(RecordingExecutor::returning(json!("ok"))));
    let mut ctx = ConversationContext::new();

    let response = router.route("backup", &mut ctx).await;

    assert_eq!(response.kind, ResponseKind::Disambiguation);
    assert_eq!(response.message.lines().count(), 4); // header + 3
    assert!(response.message.contains("3. Backup Music"));
    assert!(!response.message.contains("Videos"));
}

#[tokio::test]
async fn test_remote_action_match_is_acknowledged_only() {
    let store = Arc::new(InMemoryScriptStore::with_scripts(vec![flip_coin()]));
    let mut router = router_with(store, Arc::new(RecordingExecutor::returning(json!("ok"))));
    router.update_remote_actions(&[RemoteActionDescriptor {
        id: "weather".to_string(),
        name: "Weather Forecast".to_string(),
        description: "Get the weather forecast".to_string(),
        triggers: vec!["what's the weather".to_string()],
    }]);
    let mut ctx = ConversationContext::new();

    let response = router.route("what's the weather", &mut ctx).await;

    assert_eq!(response.kind, ResponseKind::RemoteActionPending);
    assert_eq!(response.message, REMOTE_PENDING_MESSAGE);
    assert!(ctx.is_idle());
}

#[tokio::test]
async fn test_local_failure_is_reported_with_prefix() {
    let store = Arc::new(InMemoryScriptStore::with_scripts(vec![flip_coin()]));
    let router = router_with(store, Arc::new(RecordingExecutor::failing("coin is stuck")));
    let mut ctx = ConversationContext::new();

    let response = router.route("flip a coin", &mut ctx).await;

    assert_eq!(response.kind, ResponseKind::ExecutionFailed);
    assert_eq!(response.message, "Script execution failed: coin is stuck");
    assert!(ctx.is_idle());
}

#[tokio::test]
async fn test_remote_failure_surfaces_error_field() {
    let server = MockServer::respond_with(500, r#"{"error":"quota exceeded"}"#).await;
    let store = Arc::new(InMemoryScriptStore::with_scripts(vec![check_quota()]));
    let transport = Arc::new(ActionTransport::new(TransportConfig::new(&server.base_url)));
    let router = router_with(store, Arc::new(RecordingExecutor::returning(json!("unused")))).with_transport(transport);
    let mut ctx = ConversationContext::new();

    let response = router.route("check quota", &mut ctx).await;

    assert_eq!(response.kind, ResponseKind::ExecutionFailed);
    assert_eq!(response.message, "MCP request failed: quota exceeded");
    assert!(ctx.is_idle());
}

#[tokio::test]
async fn test_remote_success_posts_bound_parameters() {
    let mut server = MockServer::respond_with(200, r#"{"remaining":42}"#).await;
    let mut script = check_quota();
    script.parameters = vec![Parameter::new("project", "Which project?")];
    let store = Arc::new(InMemoryScriptStore::with_scripts(vec![script]));
    let transport = Arc::new(ActionTransport::new(TransportConfig::new(&server.base_url)));
    let router = router_with(store, Arc::new(RecordingExecutor::returning(json!("unused")))).with_transport(transport);
    let mut ctx = ConversationContext::new();

    let prompt = router.route("check quota", &mut ctx).await;
    assert_eq!(prompt.message, "Which project?");
    let response = router.route("apollo", &mut ctx).await;

    assert_eq!(response.kind, ResponseKind::ScriptExecuted);
    assert_eq!(response.execution_result, Some(json!({ "remaining": 42 })));
    assert_eq!(response.message, "{\n  \"remaining\": 42\n}");

    let request = server.next_request().await;
    assert_eq!(request.method, "POST");
    assert_eq!(request.target, "/quota");
    let body: serde_json::Value = serde_json::from_str(&request.body).expect("json body");
    assert_eq!(body, json!({ "project": "apollo" }));
}

#[tokio::test]
async fn test_remote_without_transport_is_configuration_error() {
    let store = Arc::new(InMemoryScriptStore::with_scripts(vec![check_quota()]));
    let router = router_with(store, Arc::new(RecordingExecutor::returning(json!("unused"))));
    let mut ctx = ConversationContext::new();

    let response = router.route("check quota", &mut ctx).await;

    assert_eq!(response.kind, ResponseKind::ConfigurationError);
    assert_eq!(response.message, NO_TRANSPORT_MESSAGE);
}

#[tokio::test]
async fn test_external_chat_returns_sentinel() {
    let script = Script {
        id: "ask-assistant".to_string(),
        name: "Ask Assistant".to_string(),
        description: "Ask the hosted chat model a question".to_string(),
        parameters: vec![Parameter::new("question", "What would you like to ask?")],
        triggers: vec![],
        execution: ExecutionKind::ExternalChat,
    };
    let store = Arc::new(InMemoryScriptStore::with_scripts(vec![script]));
    let executor = Arc::new(RecordingExecutor::returning(json!("unused")));
    let router = router_with(store, executor.clone());
    let mut ctx = ConversationContext::new();

    router.route("ask assistant", &mut ctx).await;
    let response = router.route("what is rust", &mut ctx).await;

    assert_eq!(response.kind, ResponseKind::ExternalChatRequired);
    assert_eq!(response.message, EXTERNAL_CHAT_SENTINEL);
    assert_eq!(
        response.execution_result,
        Some(json!({ "type": "external-chat", "params": { "question": "what is rust" } }))
    );
    assert!(executor.calls().is_empty());
    assert!(ctx.is_idle());
}

#[tokio::test]
async fn test_unknown_execution_kind_is_unsupported() {
    let script: Script = serde_json::from_value(json!({
        "id": "teleport",
        "name": "Teleport",
        "description": "Teleport somewhere",
        "execution": { "type": "quantum-tunnel" }
    }))
    .expect("unknown kinds deserialize");
    assert_eq!(script.execution, ExecutionKind::Unsupported);

    let store = Arc::new(InMemoryScriptStore::with_scripts(vec![script]));
    let router = router_with(store, Arc::new(RecordingExecutor::returning(json!("unused"))));
    let mut ctx = ConversationContext::new();

    let response = router.route("teleport", &mut ctx).await;

    assert_eq!(response.kind, ResponseKind::Unsupported);
    assert_eq!(response.message, UNSUPPORTED_MESSAGE);
}

#[tokio::test]
async fn test_low_confidence_goes_to_general_assistant() {
    let mut deploy = flip_coin();
    deploy.id = "deploy".to_string();
    deploy.name = "Deploy Service".to_string();
    deploy.description = "Deploy the web service to production".to_string();
    let store = Arc::new(InMemoryScriptStore::with_scripts(vec![deploy]));
    let executor = Arc::new(RecordingExecutor::returning(json!("ok")));
    let router = router_with(store, executor.clone());
    let mut ctx = ConversationContext::new();

    let response = router.route("tell me about production cats dogs birds", &mut ctx).await;

    assert_eq!(response.kind, ResponseKind::GeneralAssistant);
    assert_eq!(response.message, SUGGESTION_REPLY);
    assert!(executor.calls().is_empty());
}

#[tokio::test]
async fn test_turn_counter_advances() {
    let store = Arc::new(InMemoryScriptStore::new());
    let router = IntentRouter::new(
        store,
        Arc::new(RecordingExecutor::returning(json!(null))),
        RouterConfig::default(),
    );
    let mut ctx = ConversationContext::new();

    router.route("hi", &mut ctx).await;
    router.route("hi again", &mut ctx).await;

    assert_eq!(ctx.turn, 2);
}

#[tokio::test]
async fn test_function_word_after_parameter_name_still_prompts() {
    let store = Arc::new(InMemoryScriptStore::with_scripts(vec![set_reminder()]));
    let executor = Arc::new(RecordingExecutor::returning(json!("ok")));
    let router = router_with(store, executor.clone());
    let mut ctx = ConversationContext::new();

    let response = router.route("remind me what time is it", &mut ctx).await;

    assert_eq!(response.kind, ResponseKind::ParameterPrompt);
    assert_eq!(response.message, "When should I remind you?");
    let active = ctx.active_script().expect("collecting parameters");
    assert_eq!(active.missing_params(), ["time".to_string()]);
    assert!(active.collected_params().is_empty());
    assert!(executor.calls().is_empty());
}

fn weather_action(id: &str, name: &str, description: &str) -> RemoteActionDescriptor {
    RemoteActionDescriptor {
        id: id.to_string(),
        name: name.to_string(),
        description: description.to_string(),
        triggers: vec![],
    }
}

#[tokio::test]
async fn test_tie_with_remote_action_lists_only_the_script() {
    let mut report = flip_coin();
    report.id = "weather-report".to_string();
    report.name = "Weather Report".to_string();
    report.description = "Weather".to_string();
    let store = Arc::new(InMemoryScriptStore::with_scripts(vec![report]));
    let executor = Arc::new(RecordingExecutor::returning(json!("ok")));
    let mut router = router_with(store, executor.clone());
    router.update_remote_actions(&[weather_action("forecast", "Weather Forecast", "Get the weather forecast")]);
    let mut ctx = ConversationContext::new();

    let response = router.route("weather", &mut ctx).await;

    assert_eq!(response.kind, ResponseKind::Disambiguation);
    let lines: Vec<&str> = response.message.lines().collect();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[1], "1. Weather Report - Weather");
    assert_eq!(response.execution_result, Some(json!({ "candidates": ["weather-report"] })));
    assert!(executor.calls().is_empty());
    assert!(ctx.is_idle());
}

#[tokio::test]
async fn test_tie_between_remote_actions_acknowledges_top_action() {
    let store = Arc::new(InMemoryScriptStore::with_scripts(vec![flip_coin()]));
    let mut router = router_with(store, Arc::new(RecordingExecutor::returning(json!("ok"))));
    router.update_remote_actions(&[
        weather_action("forecast", "Weather Forecast", "Get the weather forecast"),
        weather_action("alerts", "Weather Alerts", "Severe weather alerts"),
    ]);
    let mut ctx = ConversationContext::new();

    let response = router.route("weather", &mut ctx).await;

    assert_eq!(response.kind, ResponseKind::RemoteActionPending);
    assert_eq!(response.message, REMOTE_PENDING_MESSAGE);
    assert!(ctx.is_idle());
}
