use serde::Deserialize;

/// Request payload for `POST /api/`.
///
/// Both fields are optional at the JSON level so that a missing question is
/// reported with the API's own 400 body instead of a deserializer error.
#[derive(Debug, Default, Deserialize)]
pub struct AskRequest {
    /// Natural language question.
    #[serde(default)]
    pub question: Option<String>,
    /// Optional screenshot, plain base64 or a `data:image/...;base64,` URL.
    #[serde(default)]
    pub image: Option<String>,
}

impl AskRequest {
    /// The question when present and not blank.
    pub fn question(&self) -> Option<&str> {
        self.question.as_deref().filter(|q| !q.trim().is_empty())
    }

    pub fn image(&self) -> Option<&str> {
        self.image.as_deref().filter(|i| !i.trim().is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_fields_count_as_missing() {
        let req: AskRequest = serde_json::from_str(r#"{"question":"  ","image":""}"#).unwrap();
        assert!(req.question().is_none());
        assert!(req.image().is_none());

        let req: AskRequest = serde_json::from_str(r#"{"question":"Use Docker?"}"#).unwrap();
        assert_eq!(req.question(), Some("Use Docker?"));
    }
}
