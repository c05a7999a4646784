use std::sync::{
    Arc, Mutex,
    atomic::{AtomicUsize, Ordering},
};
use std::time::Duration;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
};
use serde_json::{Value, json};
use tower::ServiceExt;

use answer_engine::{
    AnswerConfig, AnswerError, CannedAnswers, ChatFuture, ChatProvider, QuestionAnswerer,
};
use api::{
    build_router,
    core::app_state::{AppState, QaFactory, QaInitFuture},
};
use forum_index::{EmbedFuture, EmbeddingsProvider, IndexConfig, PostIndex, PostRecord, corpus};

/// Every text maps to the same direction, so every post scores 1.0.
struct FlatEmbedder;

impl EmbeddingsProvider for FlatEmbedder {
    fn embed<'a>(&'a self, _text: &'a str) -> EmbedFuture<'a, Vec<f32>> {
        Box::pin(async { Ok(vec![1.0, 1.0]) })
    }

    fn embed_batch<'a>(&'a self, texts: &'a [String]) -> EmbedFuture<'a, Vec<Vec<f32>>> {
        Box::pin(async move { Ok(texts.iter().map(|_| vec![1.0, 1.0]).collect()) })
    }
}

/// Echoes a fixed answer, records the last user message and panics on demand.
#[derive(Default)]
struct RecordingChat {
    last_user: Mutex<Option<String>>,
}

impl ChatProvider for RecordingChat {
    fn chat<'a>(&'a self, _system: &'a str, user: &'a str) -> ChatFuture<'a> {
        Box::pin(async move {
            if user.contains("explode") {
                panic!("chat backend exploded");
            }
            *self.last_user.lock().unwrap() = Some(user.to_string());
            Ok("Generated answer".to_string())
        })
    }
}

struct Fixture {
    _dir: tempfile::TempDir,
    router: Router,
    chat: Arc<RecordingChat>,
    attempts: Arc<AtomicUsize>,
}

async fn fixture(canned: CannedAnswers) -> Fixture {
    let dir = tempfile::tempdir().unwrap();
    let posts_path = dir.path().join("posts.json");
    let posts = vec![PostRecord {
        id: 7,
        topic_title: "Docker guide".into(),
        cleaned_content: "Podman works as a drop-in replacement.".into(),
        topic_url: "https://tds.s-anand.net/#/docker".into(),
        username: "ta".into(),
        created_at: "2025-02-01T10:00:00Z".into(),
        keywords: vec![],
        post_number: Some(1),
        topic_id: Some(7),
    }];
    corpus::write_posts(&posts_path, &posts).await.unwrap();

    let mut cfg = IndexConfig::new_default(posts_path, dir.path().join("embeddings.json"));
    cfg.dim = 2;
    cfg.batch_delay = Duration::ZERO;

    let chat = Arc::new(RecordingChat::default());
    let attempts = Arc::new(AtomicUsize::new(0));

    let factory: QaFactory = {
        let chat = chat.clone();
        let attempts = attempts.clone();
        let canned = canned.clone();
        Box::new(move || -> QaInitFuture {
            attempts.fetch_add(1, Ordering::SeqCst);
            let index = Arc::new(PostIndex::new(cfg.clone(), Arc::new(FlatEmbedder)));
            let qa = QuestionAnswerer::new(index, chat.clone(), canned.clone(), AnswerConfig::default());
            Box::pin(async move { Ok(qa) })
        })
    };

    Fixture {
        _dir: dir,
        router: build_router(Arc::new(AppState::new(factory, false, None))),
        chat,
        attempts,
    }
}

/// State whose QA system fails the first `failures` initialisations.
fn flaky_router(failures: usize, attempts: Arc<AtomicUsize>, dir: &std::path::Path) -> Router {
    let missing = IndexConfig::new_default(dir.join("absent.json"), dir.join("embeddings.json"));
    let factory: QaFactory = Box::new(move || -> QaInitFuture {
        let n = attempts.fetch_add(1, Ordering::SeqCst);
        let cfg = missing.clone();
        Box::pin(async move {
            if n < failures {
                return Err(AnswerError::InvalidCanned {
                    id: "broken".into(),
                    reason: "simulated",
                });
            }
            let index = Arc::new(PostIndex::new(cfg, Arc::new(FlatEmbedder)));
            Ok(QuestionAnswerer::new(
                index,
                Arc::new(RecordingChat::default()),
                CannedAnswers::default(),
                AnswerConfig::default(),
            ))
        })
    });
    build_router(Arc::new(AppState::new(factory, false, None)))
}

async fn post_json(router: &Router, uri: &str, body: String) -> (StatusCode, Value) {
    let req = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body))
        .unwrap();
    let res = router.clone().oneshot(req).await.unwrap();
    let status = res.status();
    let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

async fn get_json(router: &Router, uri: &str) -> (StatusCode, Value) {
    let req = Request::builder().uri(uri).body(Body::empty()).unwrap();
    let res = router.clone().oneshot(req).await.unwrap();
    let status = res.status();
    let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn health_and_banner() {
    let fx = fixture(CannedAnswers::default()).await;

    let (status, body) = get_json(&fx.router, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "status": "healthy" }));

    let (status, body) = get_json(&fx.router, "/").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["endpoints"]["POST /api/"].is_string());
}

#[tokio::test]
async fn missing_or_blank_question_is_400() {
    let fx = fixture(CannedAnswers::default()).await;
    let expected = json!({
        "error": "Question is required",
        "answer": "Please provide a question to answer.",
        "links": []
    });

    for body in [r#"{}"#, r#"{"question":""}"#, r#"{"question":"   ","image":"abc"}"#] {
        let (status, got) = post_json(&fx.router, "/api/", body.to_string()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "body {body}");
        assert_eq!(got, expected);
    }
    assert_eq!(fx.attempts.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn malformed_json_is_400_with_answer_shape() {
    let fx = fixture(CannedAnswers::default()).await;

    let (status, got) = post_json(&fx.router, "/api/", "{not json".to_string()).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(got["answer"], "Please provide a question to answer.");
    assert_eq!(got["links"], json!([]));
    assert!(got["error"].is_string());
}

#[tokio::test]
async fn canned_question_returns_answer_and_resolved_link() {
    let fx = fixture(CannedAnswers::builtin()).await;

    let (status, got) = post_json(
        &fx.router,
        "/api/",
        json!({ "question": "Should I use Docker or Podman for this course?" }).to_string(),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert!(got["answer"].as_str().unwrap().contains("Podman"));
    assert_eq!(
        got["links"],
        json!([{ "url": "https://tds.s-anand.net/#/docker", "text": "Docker guide" }])
    );
}

#[tokio::test]
async fn generated_answer_on_both_paths_with_single_init() {
    let fx = fixture(CannedAnswers::default()).await;

    for uri in ["/api/", "/api"] {
        let (status, got) = post_json(
            &fx.router,
            uri,
            json!({ "question": "How do containers work?" }).to_string(),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(got["answer"], "Generated answer");
        assert_eq!(got["links"][0]["text"], "Docker guide");
    }
    assert_eq!(fx.attempts.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn image_with_gpt_question_is_rewritten() {
    let fx = fixture(CannedAnswers::default()).await;

    let (status, _) = post_json(
        &fx.router,
        "/api/",
        json!({ "question": "Which GPT version?", "image": "bm90IGFuIGltYWdl" }).to_string(),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        fx.chat.last_user.lock().unwrap().as_deref(),
        Some("Which GPT version? [Image shows question about model selection]")
    );
}

#[tokio::test]
async fn failed_init_reports_unavailable_then_retries() {
    let dir = tempfile::tempdir().unwrap();
    let attempts = Arc::new(AtomicUsize::new(0));
    let router = flaky_router(1, attempts.clone(), dir.path());
    let body = json!({ "question": "anything at all" }).to_string();

    let (status, got) = post_json(&router, "/api/", body.clone()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        got,
        json!({ "answer": "System is currently unavailable. Please try again later.", "links": [] })
    );

    let (status, got) = post_json(&router, "/api/", body).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        got["answer"],
        "I couldn't find relevant information to answer your question. Please try rephrasing or contact the teaching assistants directly."
    );
    assert_eq!(attempts.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn handler_panic_becomes_generic_500() {
    let fx = fixture(CannedAnswers::default()).await;

    let (status, got) = post_json(
        &fx.router,
        "/api/",
        json!({ "question": "please explode" }).to_string(),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        got,
        json!({ "answer": "Sorry, I encountered an error while processing your question.", "links": [] })
    );
}
