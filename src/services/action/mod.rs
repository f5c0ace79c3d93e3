pub mod client;
pub mod config;
pub mod types;

pub use client::ActionTransport;
pub use config::{AuthType, TransportConfig, TransportConfigUpdate};
pub use types::{ActionRequest, ActionResponse, RequiredFields, ResponseValidator};
