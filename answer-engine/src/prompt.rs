//! Prompt builder: TA persona + context block of retrieved posts.

use forum_index::SearchResult;

/// Returned when retrieval yields no posts at all.
pub const NO_CONTEXT_ANSWER: &str = "I couldn't find relevant information to answer your question. \
Please try rephrasing or contact the teaching assistants directly.";

/// Returned when the model replies with empty content.
pub const EMPTY_COMPLETION_ANSWER: &str = "I could not generate an answer for your question.";

const PERSONA: &str = "You are a helpful teaching assistant for the Tools in Data Science (TDS) course at IIT Madras.
Answer student questions based on the provided context from course discussions.
Be concise, accurate, and helpful. If the context doesn't contain enough information, say so clearly.";

const SEPARATOR: &str = "\n\n---\n\n";

/// Joins up to `k` posts as `Title: ..\nContent: ..` blocks.
///
/// # Example
/// ```
/// # use answer_engine::prompt::build_context;
/// assert_eq!(build_context(&[], 3), "");
/// ```
pub fn build_context(posts: &[SearchResult], k: usize) -> String {
    posts
        .iter()
        .take(k)
        .map(|r| format!("Title: {}\nContent: {}", r.title, r.post.cleaned_content))
        .collect::<Vec<_>>()
        .join(SEPARATOR)
}

/// Full system message for the chat call.
pub fn build_system_prompt(posts: &[SearchResult], k: usize) -> String {
    format!(
        "{PERSONA}\n\nContext from course discussions:\n{}",
        build_context(posts, k)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use forum_index::PostRecord;

    fn hit(id: u64, title: &str, content: &str) -> SearchResult {
        SearchResult {
            post: PostRecord {
                id,
                topic_title: title.into(),
                cleaned_content: content.into(),
                topic_url: format!("https://forum.example/t/{id}"),
                username: String::new(),
                created_at: String::new(),
                keywords: vec![],
                post_number: None,
                topic_id: None,
            },
            similarity: 0.9,
            url: format!("https://forum.example/t/{id}"),
            title: title.into(),
            content: content.into(),
        }
    }

    #[test]
    fn context_takes_first_k_posts_with_separator() {
        let posts = vec![hit(1, "A", "alpha"), hit(2, "B", "beta"), hit(3, "C", "gamma"), hit(4, "D", "delta")];
        let ctx = build_context(&posts, 3);
        assert_eq!(
            ctx,
            "Title: A\nContent: alpha\n\n---\n\nTitle: B\nContent: beta\n\n---\n\nTitle: C\nContent: gamma"
        );
    }

    #[test]
    fn system_prompt_embeds_persona_and_context() {
        let sys = build_system_prompt(&[hit(1, "Podman setup", "use podman")], 3);
        assert!(sys.starts_with("You are a helpful teaching assistant"));
        assert!(sys.ends_with("Context from course discussions:\nTitle: Podman setup\nContent: use podman"));
    }
}
