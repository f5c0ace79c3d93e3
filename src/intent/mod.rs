pub mod classifier;
pub mod extractor;
pub mod scoring;
pub mod types;

pub use classifier::IntentClassifier;
pub use extractor::{EntityExtractor, MissingParameter};
pub use types::{ClassificationResult, IntentMatch, MatchKind, MatchTarget, RemoteActionDescriptor};
