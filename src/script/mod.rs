pub mod executor;
pub mod store;
pub mod types;

pub use executor::ScriptExecutor;
pub use store::{InMemoryScriptStore, ScriptStore};
pub use types::{ExecutionKind, HttpMethod, ParamMap, Parameter, ParameterKind, Script};
