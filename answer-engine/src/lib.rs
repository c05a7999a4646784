//! Answer synthesis over the forum post index.
//!
//! A question is first checked against the canned-answer table. Otherwise the
//! most similar posts are retrieved, filtered by a relevance floor and handed
//! to the chat model as context. Every upstream failure degrades to a usable
//! answer; [`QuestionAnswerer::answer_question`] never fails.

pub mod api_types;
pub mod canned;
pub mod cfg;
pub mod error;
pub mod llm;
pub mod prompt;

pub use api_types::{QaLink, QaResponse};
pub use canned::{CannedAnswer, CannedAnswers};
pub use cfg::AnswerConfig;
pub use error::AnswerError;
pub use llm::{ChatFuture, ChatProvider, OpenAiChat};

use std::{sync::Arc, time::Instant};

use ai_llm_service::LlmServiceProfiles;
use forum_index::{IndexConfig, OpenAiEmbedder, PostIndex, SearchResult, snippet};
use tracing::{debug, error, info, warn};

const UNRESOLVED_LINK_TEXT: &str = "Relevant Discussion";

/// Question answering facade shared by all request handlers.
pub struct QuestionAnswerer {
    index: Arc<PostIndex>,
    chat: Arc<dyn ChatProvider>,
    canned: CannedAnswers,
    cfg: AnswerConfig,
}

impl QuestionAnswerer {
    pub fn new(
        index: Arc<PostIndex>,
        chat: Arc<dyn ChatProvider>,
        canned: CannedAnswers,
        cfg: AnswerConfig,
    ) -> Self {
        Self {
            index,
            chat,
            canned,
            cfg,
        }
    }

    /// Wires the index, embedder and chat client from environment variables.
    ///
    /// # Errors
    /// Invalid index configuration or an unreadable `CANNED_ANSWERS_FILE`.
    pub async fn from_env(profiles: Arc<LlmServiceProfiles>) -> Result<Self, AnswerError> {
        let cfg = AnswerConfig::from_env();
        let canned = match &cfg.canned_file {
            Some(path) => CannedAnswers::load(path).await?,
            None => CannedAnswers::builtin(),
        };

        let index_cfg = IndexConfig::from_env()?;
        let embedder = Arc::new(OpenAiEmbedder::new(profiles.clone()));
        let index = Arc::new(PostIndex::new(index_cfg, embedder));
        let chat = Arc::new(OpenAiChat::new(profiles));

        Ok(Self::new(index, chat, canned, cfg))
    }

    /// Loads or builds the post index. Returns the number of indexed posts.
    pub async fn initialize(&self, force_rebuild: bool) -> usize {
        let t0 = Instant::now();
        let idx = self.index.build(force_rebuild).await;
        info!(
            posts = idx.len(),
            force_rebuild,
            elapsed_ms = t0.elapsed().as_millis() as u64,
            "QA system initialized"
        );
        idx.len()
    }

    pub fn index(&self) -> &Arc<PostIndex> {
        &self.index
    }

    /// Answers `question` with supporting links.
    pub async fn answer_question(&self, question: &str) -> QaResponse {
        if let Some(entry) = self.canned.find(question) {
            info!(id = %entry.id, "Answered from canned table");
            let mut links = Vec::with_capacity(entry.required_links.len());
            for url in &entry.required_links {
                let text = self
                    .index
                    .find_post_by_url(url)
                    .await
                    .map(|p| p.topic_title)
                    .unwrap_or_else(|| UNRESOLVED_LINK_TEXT.to_string());
                links.push(QaLink {
                    url: url.clone(),
                    text,
                });
            }
            return QaResponse {
                answer: entry.answer.clone(),
                links,
            };
        }

        let similar = self.index.search(question, self.cfg.retrieve_k).await;
        let posts = self.select_posts(similar);
        debug!(used = posts.len(), "Posts selected for synthesis");

        let answer = self.synthesize(question, &posts).await;
        let links = posts
            .iter()
            .take(self.cfg.link_k)
            .map(|r| QaLink {
                url: r.url.clone(),
                text: if r.title.is_empty() {
                    snippet(&r.post.cleaned_content, self.cfg.link_text_chars)
                } else {
                    r.title.clone()
                },
            })
            .collect();

        QaResponse { answer, links }
    }

    /* --------------------- Internals --------------------- */

    /// Keeps results above the relevance floor, or the raw top few if none pass.
    fn select_posts(&self, similar: Vec<SearchResult>) -> Vec<SearchResult> {
        let floor = self.cfg.relevance_floor;
        if similar.iter().any(|r| r.similarity > floor) {
            similar.into_iter().filter(|r| r.similarity > floor).collect()
        } else {
            similar.into_iter().take(self.cfg.fallback_k).collect()
        }
    }

    async fn synthesize(&self, question: &str, posts: &[SearchResult]) -> String {
        let Some(first) = posts.first() else {
            return prompt::NO_CONTEXT_ANSWER.to_string();
        };

        let system = prompt::build_system_prompt(posts, self.cfg.context_k);
        let t0 = Instant::now();
        match self.chat.chat(&system, question).await {
            Ok(text) if text.trim().is_empty() => {
                warn!("Chat model returned empty content");
                prompt::EMPTY_COMPLETION_ANSWER.to_string()
            }
            Ok(text) => {
                debug!(latency_ms = t0.elapsed().as_millis() as u64, "Chat answer generated");
                text
            }
            Err(e) => {
                error!(error = %e, "Error generating answer with chat model");
                snippet(&first.post.cleaned_content, self.cfg.fallback_answer_chars)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ai_llm_service::AiLlmError;
    use forum_index::{EmbedFuture, EmbeddingsProvider, PostRecord, corpus};
    use std::sync::{
        Mutex,
        atomic::{AtomicUsize, Ordering},
    };
    use std::time::Duration;

    const VOCAB: [&str; 9] = [
        "podman", "docker", "pandas", "dataframes", "merge", "deadline", "project", "submission",
        "join",
    ];

    /// Counts occurrences of a fixed vocabulary; other words contribute nothing.
    struct VocabEmbedder;

    fn vocab_vector(text: &str) -> Vec<f32> {
        let mut v = vec![0.0f32; VOCAB.len()];
        for token in text
            .split(|c: char| !c.is_alphanumeric())
            .map(|t| t.to_lowercase())
        {
            if let Some(i) = VOCAB.iter().position(|w| *w == token) {
                v[i] += 1.0;
            }
        }
        v
    }

    impl EmbeddingsProvider for VocabEmbedder {
        fn embed<'a>(&'a self, text: &'a str) -> EmbedFuture<'a, Vec<f32>> {
            Box::pin(async move { Ok(vocab_vector(text)) })
        }

        fn embed_batch<'a>(&'a self, texts: &'a [String]) -> EmbedFuture<'a, Vec<Vec<f32>>> {
            Box::pin(async move { Ok(texts.iter().map(|t| vocab_vector(t)).collect()) })
        }
    }

    enum Reply {
        Text(&'static str),
        Fail,
    }

    struct ScriptedChat {
        reply: Reply,
        calls: AtomicUsize,
        last_system: Mutex<Option<String>>,
    }

    impl ScriptedChat {
        fn new(reply: Reply) -> Arc<Self> {
            Arc::new(Self {
                reply,
                calls: AtomicUsize::new(0),
                last_system: Mutex::new(None),
            })
        }
    }

    impl ChatProvider for ScriptedChat {
        fn chat<'a>(&'a self, system: &'a str, _user: &'a str) -> ChatFuture<'a> {
            Box::pin(async move {
                self.calls.fetch_add(1, Ordering::SeqCst);
                *self.last_system.lock().unwrap() = Some(system.to_string());
                match self.reply {
                    Reply::Text(t) => Ok(t.to_string()),
                    Reply::Fail => Err(AiLlmError::Timeout(Duration::from_secs(60))),
                }
            })
        }
    }

    const GIT_CONTENT: &str = "Resolving a conflict after a merge requires editing the marked lines, \
staging the files and committing the result once every hunk has been reviewed carefully.";

    fn post(id: u64, title: &str, content: &str, url: &str) -> PostRecord {
        PostRecord {
            id,
            topic_title: title.into(),
            cleaned_content: content.into(),
            topic_url: url.into(),
            username: "ta".into(),
            created_at: "2025-02-01T10:00:00Z".into(),
            keywords: vec![],
            post_number: Some(1),
            topic_id: Some(id),
        }
    }

    fn course_posts() -> Vec<PostRecord> {
        vec![
            post(1, "Pandas merge question", "join dataframes with merge", "https://forum.example/t/pandas/1"),
            post(2, "Project deadline", "project submission closes sunday", "https://forum.example/t/deadline/2"),
            post(3, "Docker guide", "install podman instead", "https://tds.s-anand.net/#/docker"),
            post(4, "", GIT_CONTENT, "https://forum.example/t/git/4"),
        ]
    }

    async fn answerer(
        posts: &[PostRecord],
        chat: Arc<ScriptedChat>,
        canned: CannedAnswers,
    ) -> (tempfile::TempDir, QuestionAnswerer) {
        let dir = tempfile::tempdir().unwrap();
        let posts_path = dir.path().join("posts.json");
        corpus::write_posts(&posts_path, posts).await.unwrap();

        let mut cfg = IndexConfig::new_default(posts_path, dir.path().join("embeddings.json"));
        cfg.dim = VOCAB.len();
        cfg.batch_delay = Duration::ZERO;
        let index = Arc::new(PostIndex::new(cfg, Arc::new(VocabEmbedder)));

        let qa = QuestionAnswerer::new(index, chat, canned, AnswerConfig::default());
        qa.initialize(false).await;
        (dir, qa)
    }

    #[tokio::test]
    async fn canned_answer_resolves_link_titles_from_index() {
        let chat = ScriptedChat::new(Reply::Text("unused"));
        let (_dir, qa) = answerer(&course_posts(), chat.clone(), CannedAnswers::builtin()).await;

        let res = qa
            .answer_question("I know Docker but have not used Podman before. Should I use Docker?")
            .await;
        assert!(res.answer.contains("we recommend using Podman"));
        assert_eq!(
            res.links,
            vec![QaLink {
                url: "https://tds.s-anand.net/#/docker".into(),
                text: "Docker guide".into(),
            }]
        );

        let res = qa
            .answer_question("Should I use gpt-4o-mini or the OpenAI API with gpt-3.5-turbo?")
            .await;
        assert!(res.answer.starts_with("You must use gpt-3.5-turbo-0125"));
        assert_eq!(res.links[0].text, "Relevant Discussion");
        assert_eq!(chat.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn relevant_posts_feed_prompt_and_links() {
        let chat = ScriptedChat::new(Reply::Text("Use pd.merge on the key column."));
        let (_dir, qa) = answerer(&course_posts(), chat.clone(), CannedAnswers::default()).await;

        let res = qa.answer_question("how to merge pandas dataframes").await;

        assert_eq!(res.answer, "Use pd.merge on the key column.");
        // Only the pandas post and the git post mention "merge"; both pass the floor.
        assert_eq!(res.links.len(), 2);
        assert_eq!(res.links[0].text, "Pandas merge question");
        assert_eq!(res.links[1].url, "https://forum.example/t/git/4");
        assert_eq!(res.links[1].text, format!("{}...", &GIT_CONTENT[..100]));

        let system = chat.last_system.lock().unwrap().clone().unwrap();
        assert!(system.contains("Title: Pandas merge question\nContent: join dataframes with merge"));
        assert!(!system.contains("Project deadline"));
    }

    #[tokio::test]
    async fn no_relevant_posts_falls_back_to_raw_top_three() {
        let chat = ScriptedChat::new(Reply::Text("Not sure."));
        let (_dir, qa) = answerer(&course_posts(), chat, CannedAnswers::default()).await;

        let res = qa.answer_question("what is the weather on sunday").await;

        let urls: Vec<&str> = res.links.iter().map(|l| l.url.as_str()).collect();
        assert_eq!(
            urls,
            vec![
                "https://forum.example/t/pandas/1",
                "https://forum.example/t/deadline/2",
                "https://tds.s-anand.net/#/docker",
            ]
        );
        assert_eq!(res.answer, "Not sure.");
    }

    #[tokio::test]
    async fn chat_failure_returns_truncated_first_post() {
        let chat = ScriptedChat::new(Reply::Fail);
        let (_dir, qa) = answerer(&course_posts(), chat, CannedAnswers::default()).await;

        let res = qa.answer_question("merge pandas dataframes").await;

        assert_eq!(res.answer, "join dataframes with merge...");
        assert_eq!(res.links[0].text, "Pandas merge question");
    }

    #[tokio::test]
    async fn empty_completion_uses_fixed_message() {
        let chat = ScriptedChat::new(Reply::Text(""));
        let (_dir, qa) = answerer(&course_posts(), chat, CannedAnswers::default()).await;

        let res = qa.answer_question("project deadline").await;

        assert_eq!(res.answer, prompt::EMPTY_COMPLETION_ANSWER);
        assert_eq!(res.links[0].text, "Project deadline");
    }

    #[tokio::test]
    async fn empty_corpus_answers_without_calling_chat() {
        let chat = ScriptedChat::new(Reply::Text("unused"));
        let (_dir, qa) = answerer(&[], chat.clone(), CannedAnswers::default()).await;

        let res = qa.answer_question("how to merge pandas dataframes").await;

        assert_eq!(res.answer, prompt::NO_CONTEXT_ANSWER);
        assert!(res.links.is_empty());
        assert_eq!(chat.calls.load(Ordering::SeqCst), 0);
    }
}
