pub mod config;
pub mod dialogue;
pub mod error;
pub mod intent;
pub mod script;
pub mod services;
pub mod telemetry;

// Re-export specific items for convenient access
pub use dialogue::router::IntentRouter;
pub use dialogue::context::ConversationContext;
pub use services::action::client::ActionTransport;
