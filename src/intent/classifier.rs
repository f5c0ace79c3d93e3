use crate::config::RouterConfig;
use crate::intent::scoring::{IndexEntry, LexicalScorer, Query, Scorer};
use crate::intent::types::{ClassificationResult, IntentMatch, MatchTarget, RemoteActionDescriptor};
use crate::script::types::Script;
use tracing::debug;

/// Ranks catalog entries against an utterance.
///
/// The index is owned and only rebuilt through `update_scripts` /
/// `update_remote_actions`. Classifying against a stale index is allowed;
/// callers refresh when the catalog changes.
pub struct IntentClassifier {
    scripts: Vec<IndexEntry>,
    remote_actions: Vec<IndexEntry>,
    scorer: Box<dyn Scorer>,
    config: RouterConfig,
}

impl IntentClassifier {
    pub fn new(config: RouterConfig) -> Self {
        Self::with_scorer(config, Box::new(LexicalScorer::default()))
    }

    pub fn with_scorer(config: RouterConfig, scorer: Box<dyn Scorer>) -> Self {
        Self {
            scripts: Vec::new(),
            remote_actions: Vec::new(),
            scorer,
            config,
        }
    }

    pub fn update_scripts(&mut self, scripts: &[Script]) {
        self.scripts = scripts
            .iter()
            .map(|script| {
                IndexEntry::new(
                    MatchTarget::Script {
                        script_id: script.id.clone(),
                    },
                    &script.name,
                    &script.description,
                    &script.triggers,
                )
            })
            .collect();
        debug!(entries = self.scripts.len(), "Rebuilt script index");
    }

    pub fn update_remote_actions(&mut self, actions: &[RemoteActionDescriptor]) {
        self.remote_actions = actions
            .iter()
            .map(|action| {
                IndexEntry::new(
                    MatchTarget::RemoteAction {
                        action_id: action.id.clone(),
                    },
                    &action.name,
                    &action.description,
                    &action.triggers,
                )
            })
            .collect();
        debug!(entries = self.remote_actions.len(), "Rebuilt remote action index");
    }

    pub fn classify(&self, text: &str) -> ClassificationResult {
        let query = Query::parse(text);
        if query.is_empty() {
            return ClassificationResult::default();
        }

        let mut matches: Vec<IntentMatch> = self
            .scripts
            .iter()
            .chain(self.remote_actions.iter())
            .filter_map(|entry| {
                let score = self.scorer.score(&query, entry).clamp(0.0, 1.0);
                if score <= 0.0 {
                    return None;
                }
                Some(IntentMatch {
                    target: entry.target.clone(),
                    confidence: score,
                })
            })
            .collect();

        // sort_by is stable: equal scores keep catalog order.
        matches.sort_by(|a, b| {
            b.confidence
                .partial_cmp(&a.confidence)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        let requires_disambiguation = match (matches.first(), matches.get(1)) {
            (Some(top), Some(runner_up)) => {
                runner_up.confidence >= self.config.acceptance_floor
                    && top.confidence - runner_up.confidence <= self.config.disambiguation_margin
            }
            _ => false,
        };

        debug!(
            candidates = matches.len(),
            top = matches.first().map(|m| m.confidence).unwrap_or(0.0),
            requires_disambiguation,
            "Classified utterance"
        );

        ClassificationResult {
            matches,
            requires_disambiguation,
        }
    }

    pub fn config(&self) -> &RouterConfig {
        &self.config
    }
}
