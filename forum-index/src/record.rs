//! Core data models used by the library.

use serde::{Deserialize, Serialize};

/// One harvested forum post.
///
/// Field names match the JSON written by the scraper.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PostRecord {
    pub id: u64,
    pub topic_title: String,
    pub cleaned_content: String,
    pub topic_url: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub post_number: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic_id: Option<u64>,
}

impl PostRecord {
    /// Text sent to the embedding model: title and body joined by a space.
    pub fn embedding_text(&self) -> String {
        format!("{} {}", self.topic_title, self.cleaned_content)
            .trim()
            .to_string()
    }
}

/// Embeddings and posts, positionally aligned.
///
/// This is both the on-disk snapshot and the in-memory index.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct PersistedIndex {
    pub embeddings: Vec<Vec<f32>>,
    pub posts: Vec<PostRecord>,
}

impl PersistedIndex {
    /// `true` when every post has exactly one vector.
    pub fn is_consistent(&self) -> bool {
        self.embeddings.len() == self.posts.len()
    }

    pub fn len(&self) -> usize {
        self.posts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.posts.is_empty()
    }
}

/// A single ranked hit.
#[derive(Clone, Debug, Serialize)]
pub struct SearchResult {
    pub post: PostRecord,
    pub similarity: f32,
    pub url: String,
    pub title: String,
    /// Leading characters of the post body followed by `...`.
    pub content: String,
}

/// Keeps the first `max_chars` characters of `text` (char-boundary safe).
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((end, _)) => &text[..end],
        None => text,
    }
}

/// Short preview used in results and fallbacks: first `max_chars` characters plus `...`.
pub fn snippet(text: &str, max_chars: usize) -> String {
    format!("{}...", truncate_chars(text, max_chars))
}
