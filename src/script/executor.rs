use crate::error::ExecutorError;
use crate::script::types::{ParamMap, Script};
use async_trait::async_trait;
use serde_json::Value;

/// The local execution sandbox. Given a script and a fully bound parameter
/// set, runs it and returns its raw result.
#[async_trait]
pub trait ScriptExecutor: Send + Sync {
    async fn execute_local(&self, script: &Script, params: &ParamMap) -> Result<Value, ExecutorError>;
}
