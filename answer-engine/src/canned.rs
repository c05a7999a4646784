//! Hand-curated answers returned when a question matches a keyword set.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::AnswerError;

/// One canned answer entry.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CannedAnswer {
    pub id: String,
    pub keywords: Vec<String>,
    pub answer: String,
    #[serde(default)]
    pub required_links: Vec<String>,
    /// Overrides the derived threshold `min(2, keywords.len() / 2)`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_matches: Option<usize>,
}

impl CannedAnswer {
    /// Keyword hits required for this entry to match.
    pub fn threshold(&self) -> usize {
        self.min_matches
            .unwrap_or_else(|| 2.min(self.keywords.len() / 2))
    }

    /// Number of keywords found in the lowercased question.
    pub fn hits(&self, question_lower: &str) -> usize {
        self.keywords
            .iter()
            .filter(|k| question_lower.contains(&k.to_lowercase()))
            .count()
    }

    pub fn matches(&self, question: &str) -> bool {
        self.hits(&question.to_lowercase()) >= self.threshold()
    }
}

/// Ordered canned-answer table. The first matching entry wins.
#[derive(Clone, Debug, Default)]
pub struct CannedAnswers {
    entries: Vec<CannedAnswer>,
}

impl CannedAnswers {
    pub fn new(entries: Vec<CannedAnswer>) -> Self {
        for e in &entries {
            if e.threshold() == 0 {
                warn!(id = %e.id, "Canned answer matches every question (threshold 0)");
            }
        }
        Self { entries }
    }

    /// Default table shipped with the service.
    pub fn builtin() -> Self {
        Self::new(vec![
            CannedAnswer {
                id: "gpt_model".into(),
                keywords: strings(&["gpt-3.5-turbo", "gpt-4o-mini", "openai", "api", "model"]),
                answer: "You must use gpt-3.5-turbo-0125, even if the AI Proxy only supports \
                         gpt-4o-mini. Use the OpenAI API directly for this question."
                    .into(),
                required_links: strings(&[
                    "https://discourse.onlinedegree.iitm.ac.in/t/ga5-question-8-clarification/155939",
                ]),
                min_matches: None,
            },
            CannedAnswer {
                id: "ga4_bonus".into(),
                keywords: strings(&["ga4", "bonus", "dashboard", "score", "10/10"]),
                answer: "If a student scores 10/10 on GA4 as well as a bonus, it would appear \
                         as 110 on the dashboard."
                    .into(),
                required_links: strings(&[
                    "https://discourse.onlinedegree.iitm.ac.in/t/ga4-data-sourcing-discussion-thread-tds-jan-2025/165959",
                ]),
                min_matches: None,
            },
            CannedAnswer {
                id: "docker_podman".into(),
                keywords: strings(&["docker", "podman", "container"]),
                answer: "While you can use Docker if you're familiar with it, we recommend \
                         using Podman for this course as it's what we'll be teaching and \
                         supporting. Docker is acceptable if you prefer it."
                    .into(),
                required_links: strings(&["https://tds.s-anand.net/#/docker"]),
                min_matches: None,
            },
            CannedAnswer {
                id: "exam_date".into(),
                keywords: strings(&["tds", "sep", "2025", "exam", "end-term"]),
                answer: "I don't know when the TDS Sep 2025 end-term exam is scheduled, as \
                         this information is not available yet. Please check the official \
                         announcements closer to the course start date."
                    .into(),
                required_links: vec![],
                min_matches: None,
            },
        ])
    }

    /// Loads a table from a JSON array of [`CannedAnswer`].
    pub async fn load(path: &Path) -> Result<Self, AnswerError> {
        let raw = tokio::fs::read_to_string(path).await?;
        let entries: Vec<CannedAnswer> = serde_json::from_str(&raw)?;
        for e in &entries {
            if e.keywords.is_empty() && e.min_matches.is_none() {
                return Err(AnswerError::InvalidCanned {
                    id: e.id.clone(),
                    reason: "no keywords and no min_matches",
                });
            }
        }
        info!(path = %path.display(), entries = entries.len(), "Loaded canned answers");
        Ok(Self::new(entries))
    }

    /// First entry whose keyword hits reach its threshold.
    pub fn find(&self, question: &str) -> Option<&CannedAnswer> {
        let lower = question.to_lowercase();
        let hit = self
            .entries
            .iter()
            .find(|e| e.hits(&lower) >= e.threshold());
        if let Some(e) = hit {
            debug!(id = %e.id, hits = e.hits(&lower), threshold = e.threshold(), "Canned answer matched");
        }
        hit
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}
