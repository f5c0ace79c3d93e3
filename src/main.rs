use anyhow::{Context, Result};
use async_trait::async_trait;
use nexus_dispatch::config::RouterConfig;
use nexus_dispatch::error::ExecutorError;
use nexus_dispatch::script::{InMemoryScriptStore, ParamMap, Script, ScriptExecutor};
use nexus_dispatch::services::action::{ActionTransport, TransportConfig};
use nexus_dispatch::{ConversationContext, IntentRouter};
use serde_json::{json, Value};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// The sandbox lives outside this process; the console only shows what
/// would have been run.
struct DryRunExecutor;

#[async_trait]
impl ScriptExecutor for DryRunExecutor {
    async fn execute_local(&self, script: &Script, params: &ParamMap) -> Result<Value, ExecutorError> {
        Ok(json!({ "script": script.name, "params": params, "dryRun": true }))
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Setup Logging
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::from_default_env())
        .finish();
    tracing::subscriber::set_global_default(subscriber).context("setting default subscriber failed")?;

    // 2. Load Catalog + Config
    let catalog = std::env::args()
        .nth(1)
        .or_else(|| std::env::var("DISPATCH_SCRIPTS").ok())
        .map(PathBuf::from);
    let store = match catalog {
        Some(path) => InMemoryScriptStore::load(&path)
            .with_context(|| format!("loading script catalog {}", path.display()))?,
        None => {
            tracing::warn!("No script catalog given; every utterance goes to the general assistant");
            InMemoryScriptStore::new()
        }
    };

    let config = RouterConfig::from_env()?;
    let mut router = IntentRouter::new(Arc::new(store), Arc::new(DryRunExecutor), config);
    if let Some(transport_config) = TransportConfig::from_env()? {
        tracing::info!(base_url = %transport_config.base_url, "Remote actions enabled");
        router = router.with_transport(Arc::new(ActionTransport::new(transport_config)));
    }
    router.refresh_scripts()?;

    // 3. Console Loop
    let mut ctx = ConversationContext::new();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    println!("Type a request, or 'quit' to exit.");

    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line.eq_ignore_ascii_case("quit") || line.eq_ignore_ascii_case("exit") {
            break;
        }

        let response = router.route(line, &mut ctx).await;
        println!("{}", response.message);
    }

    let snapshot = router.telemetry_snapshot();
    tracing::info!(
        turns = snapshot.turn_stats.total,
        dispatched = snapshot.turn_stats.dispatched,
        "Session ended"
    );
    Ok(())
}
