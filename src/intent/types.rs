use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MatchKind {
    Script,
    RemoteAction,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum MatchTarget {
    #[serde(rename_all = "camelCase")]
    Script { script_id: String },
    #[serde(rename_all = "camelCase")]
    RemoteAction { action_id: String },
}

/// Candidate binding of an utterance to an action. Recomputed every turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntentMatch {
    pub target: MatchTarget,
    pub confidence: f32, // 0.0 - 1.0
}

impl IntentMatch {
    pub fn script(script_id: &str, confidence: f32) -> Self {
        Self {
            target: MatchTarget::Script {
                script_id: script_id.to_string(),
            },
            confidence: confidence.clamp(0.0, 1.0),
        }
    }

    pub fn remote_action(action_id: &str, confidence: f32) -> Self {
        Self {
            target: MatchTarget::RemoteAction {
                action_id: action_id.to_string(),
            },
            confidence: confidence.clamp(0.0, 1.0),
        }
    }

    pub fn kind(&self) -> MatchKind {
        match self.target {
            MatchTarget::Script { .. } => MatchKind::Script,
            MatchTarget::RemoteAction { .. } => MatchKind::RemoteAction,
        }
    }

    pub fn script_id(&self) -> Option<&str> {
        match &self.target {
            MatchTarget::Script { script_id } => Some(script_id),
            MatchTarget::RemoteAction { .. } => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassificationResult {
    /// Descending confidence, ties in catalog order.
    pub matches: Vec<IntentMatch>,
    pub requires_disambiguation: bool,
}

impl ClassificationResult {
    pub fn top_match(&self) -> Option<&IntentMatch> {
        self.matches.first()
    }

    /// Matches at or above `floor` that sit within `margin` of the top match.
    pub fn near_ties(&self, floor: f32, margin: f32, limit: usize) -> Vec<&IntentMatch> {
        let top = match self.top_match() {
            Some(top) => top.confidence,
            None => return Vec::new(),
        };
        self.matches
            .iter()
            .filter(|m| m.confidence >= floor && top - m.confidence <= margin)
            .take(limit)
            .collect()
    }
}

/// A remote action that free text can be classified into, independently of
/// any script.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteActionDescriptor {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub triggers: Vec<String>,
}
