use crate::intent::types::MatchTarget;
use std::collections::HashSet;

/// One catalog entry, pre-tokenized by `IntentClassifier::update_scripts`.
#[derive(Debug, Clone)]
pub struct IndexEntry {
    pub target: MatchTarget,
    pub name_tokens: Vec<String>,
    /// Name, description and trigger tokens.
    pub vocabulary: HashSet<String>,
    /// Normalized trigger phrases ("remind me", "set an alarm").
    pub triggers: Vec<String>,
}

impl IndexEntry {
    pub fn new(target: MatchTarget, name: &str, description: &str, triggers: &[String]) -> Self {
        let name_tokens = content_tokens(&tokenize(name));
        let mut vocabulary: HashSet<String> = name_tokens.iter().cloned().collect();
        vocabulary.extend(content_tokens(&tokenize(description)));
        for trigger in triggers {
            vocabulary.extend(content_tokens(&tokenize(trigger)));
        }
        let triggers = triggers
            .iter()
            .map(|t| tokenize(t).join(" "))
            .filter(|t| !t.is_empty())
            .collect();
        Self {
            target,
            name_tokens,
            vocabulary,
            triggers,
        }
    }
}

/// A parsed utterance.
#[derive(Debug, Clone)]
pub struct Query {
    /// All tokens, joined by single spaces.
    pub normalized: String,
    pub tokens: Vec<String>,
    /// Tokens minus stopwords and negations.
    pub content: Vec<String>,
}

impl Query {
    pub fn parse(text: &str) -> Self {
        let tokens = tokenize(text);
        let content = content_tokens(&tokens);
        Self {
            normalized: tokens.join(" "),
            tokens,
            content,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

/// Similarity strategy behind `IntentClassifier::classify`.
/// Implementations must return a value within [0, 1].
pub trait Scorer: Send + Sync {
    fn score(&self, query: &Query, entry: &IndexEntry) -> f32;
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LexicalScorer {
    pub exact_phrase: f32,
    pub contained_phrase: f32,
    pub coverage_weight: f32,
    pub name_bonus: f32,
    pub negation_penalty: f32,
}

impl Default for LexicalScorer {
    fn default() -> Self {
        Self {
            exact_phrase: 1.0,
            contained_phrase: 0.95,
            coverage_weight: 0.75,
            name_bonus: 0.2,
            negation_penalty: 0.5,
        }
    }
}

impl Scorer for LexicalScorer {
    fn score(&self, query: &Query, entry: &IndexEntry) -> f32 {
        let phrase = self.phrase_score(query, entry);
        let lexical = self.lexical_score(query, entry);
        let penalty = self.negation(query, entry);
        (phrase.max(lexical) - penalty).clamp(0.0, 1.0)
    }
}

impl LexicalScorer {
    fn phrase_score(&self, query: &Query, entry: &IndexEntry) -> f32 {
        let padded = format!(" {} ", query.normalized);
        let mut best = 0.0_f32;
        for trigger in &entry.triggers {
            if *trigger == query.normalized {
                return self.exact_phrase;
            }
            if padded.contains(&format!(" {} ", trigger)) {
                best = best.max(self.contained_phrase);
            }
        }
        best
    }

    fn lexical_score(&self, query: &Query, entry: &IndexEntry) -> f32 {
        if query.content.is_empty() {
            return 0.0;
        }
        let matched = query
            .content
            .iter()
            .filter(|token| entry.vocabulary.iter().any(|word| stem_match(token, word)))
            .count();
        if matched == 0 {
            return 0.0;
        }
        let coverage = matched as f32 / query.content.len() as f32;
        let name_hit = query
            .content
            .iter()
            .any(|token| entry.name_tokens.iter().any(|word| stem_match(token, word)));
        let bonus = if name_hit { self.name_bonus } else { 0.0 };
        (self.coverage_weight * coverage + bonus).min(1.0)
    }

    // "don't remind me": a negation up to three tokens before a vocabulary hit.
    fn negation(&self, query: &Query, entry: &IndexEntry) -> f32 {
        for (idx, token) in query.tokens.iter().enumerate() {
            if !NEGATIONS.contains(&token.as_str()) {
                continue;
            }
            let negated = query
                .tokens
                .iter()
                .skip(idx + 1)
                .take(3)
                .any(|next| entry.vocabulary.iter().any(|word| stem_match(next, word)));
            if negated {
                return self.negation_penalty;
            }
        }
        0.0
    }
}

pub fn tokenize(input: &str) -> Vec<String> {
    input
        .to_lowercase()
        .replace('\'', "")
        .split(|c: char| !c.is_alphanumeric())
        .filter(|token| !token.is_empty())
        .map(|token| token.to_string())
        .collect()
}

pub fn content_tokens(tokens: &[String]) -> Vec<String> {
    tokens
        .iter()
        .filter(|t| !STOPWORDS.contains(&t.as_str()) && !NEGATIONS.contains(&t.as_str()))
        .cloned()
        .collect()
}

/// Equal, or one is a prefix of the other and both are at least four
/// characters ("remind" / "reminder").
pub fn stem_match(a: &str, b: &str) -> bool {
    if a == b {
        return true;
    }
    if a.len() < 4 || b.len() < 4 {
        return false;
    }
    a.starts_with(b) || b.starts_with(a)
}

const STOPWORDS: &[&str] = &[
    "a", "an", "the", "me", "my", "i", "im", "to", "for", "of", "in", "on", "at", "by", "please",
    "can", "could", "would", "will", "you", "your", "it", "its", "is", "are", "be", "and", "or",
    "with", "this", "that", "some", "do", "want", "need", "like", "let", "lets", "us", "we",
    "just", "now", "up", "so",
];

const NEGATIONS: &[&str] = &["not", "dont", "no", "never", "without"];

const PRONOUNS: &[&str] = &[
    "he", "she", "they", "them", "him", "her", "his", "their", "our", "mine", "yours", "what",
    "which", "who", "whom", "these", "those",
];

/// Stopword, negation or pronoun: never a parameter value on its own.
pub fn is_function_word(token: &str) -> bool {
    let token = token.to_lowercase();
    let token = token.as_str();
    STOPWORDS.contains(&token) || NEGATIONS.contains(&token) || PRONOUNS.contains(&token)
}
