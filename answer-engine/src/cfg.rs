//! Runtime configuration loaded from environment variables.

use std::path::PathBuf;

/// Knobs for retrieval filtering and answer formatting.
#[derive(Clone, Debug)]
pub struct AnswerConfig {
    /// Results requested from the index per question.
    pub retrieve_k: usize,
    /// Results must score strictly above this to count as relevant.
    pub relevance_floor: f32,
    /// Results used when nothing passes the floor.
    pub fallback_k: usize,
    /// Posts placed into the model prompt.
    pub context_k: usize,
    /// Links returned with a generated answer.
    pub link_k: usize,
    /// Characters of content used as link text when a post has no title.
    pub link_text_chars: usize,
    /// Characters of content returned when the model call fails.
    pub fallback_answer_chars: usize,
    /// Optional JSON file replacing the built-in canned answers.
    pub canned_file: Option<PathBuf>,
}

impl Default for AnswerConfig {
    fn default() -> Self {
        Self {
            retrieve_k: 10,
            relevance_floor: 0.3,
            fallback_k: 3,
            context_k: 3,
            link_k: 3,
            link_text_chars: 100,
            fallback_answer_chars: 200,
            canned_file: None,
        }
    }
}

impl AnswerConfig {
    /// Build from environment variables with defaults.
    ///
    /// - `RAG_TOP_K` (default 10)
    /// - `RELEVANCE_FLOOR` (default 0.3)
    /// - `CANNED_ANSWERS_FILE` (unset = built-in table)
    pub fn from_env() -> Self {
        let d = Self::default();
        Self {
            retrieve_k: parse("RAG_TOP_K", d.retrieve_k),
            relevance_floor: parse("RELEVANCE_FLOOR", d.relevance_floor),
            canned_file: std::env::var("CANNED_ANSWERS_FILE")
                .ok()
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from),
            ..d
        }
    }
}

fn parse<T: std::str::FromStr>(k: &str, dflt: T) -> T {
    std::env::var(k)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(dflt)
}
