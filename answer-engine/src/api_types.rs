//! Public API types re-used by the HTTP layer.

use serde::{Deserialize, Serialize};

/// A supporting link shown under the answer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct QaLink {
    pub url: String,
    pub text: String,
}

/// Final answer with supporting links.
///
/// # Example
/// ```
/// use answer_engine::{QaLink, QaResponse};
/// let qa = QaResponse {
///     answer: "Use Podman.".into(),
///     links: vec![QaLink { url: "https://example.org/docker".into(), text: "Docker".into() }],
/// };
/// assert_eq!(serde_json::to_value(&qa).unwrap()["links"][0]["text"], "Docker");
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct QaResponse {
    pub answer: String,
    pub links: Vec<QaLink>,
}
