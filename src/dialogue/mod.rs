pub mod context;
pub mod response;
pub mod router;

pub use context::{ActiveScriptContext, ConversationContext, DialogueState};
pub use response::{ResponseKind, RouterResponse};
pub use router::IntentRouter;
