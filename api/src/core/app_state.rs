use std::{future::Future, pin::Pin, sync::Arc};

use ai_llm_service::LlmServiceProfiles;
use answer_engine::{AnswerError, QuestionAnswerer};
use tokio::sync::OnceCell;
use tracing::{error, info};

use crate::image_context::ImageDescriber;

pub type QaInitFuture = Pin<Box<dyn Future<Output = Result<QuestionAnswerer, AnswerError>> + Send>>;

/// Creates a fresh, not yet initialised answerer.
pub type QaFactory = Box<dyn Fn() -> QaInitFuture + Send + Sync>;

/// Shared state for all HTTP handlers.
pub struct AppState {
    /// Lazily initialised QA system; a failed attempt leaves it empty.
    qa: OnceCell<Arc<QuestionAnswerer>>,
    factory: QaFactory,
    /// Re-embed the corpus on initialisation even if a snapshot exists.
    force_rebuild: bool,
    /// Vision client for screenshots; `None` disables vision.
    vision: Option<Arc<dyn ImageDescriber>>,
}

impl AppState {
    /// State backed by the hosted OpenAI-compatible profiles.
    pub fn from_profiles(profiles: Arc<LlmServiceProfiles>, force_rebuild: bool) -> Self {
        let vision: Arc<dyn ImageDescriber> = profiles.clone();
        let factory: QaFactory = Box::new(move || -> QaInitFuture {
            let profiles = profiles.clone();
            Box::pin(async move { QuestionAnswerer::from_env(profiles).await })
        });
        Self::new(factory, force_rebuild, Some(vision))
    }

    pub fn new(
        factory: QaFactory,
        force_rebuild: bool,
        vision: Option<Arc<dyn ImageDescriber>>,
    ) -> Self {
        Self {
            qa: OnceCell::new(),
            factory,
            force_rebuild,
            vision,
        }
    }

    /// Returns the QA system, initialising it on first use.
    ///
    /// Concurrent first callers share one initialisation. On failure the cell
    /// stays empty and the next call tries again.
    pub async fn qa(&self) -> Result<Arc<QuestionAnswerer>, AnswerError> {
        self.qa
            .get_or_try_init(|| async {
                let qa = (self.factory)().await.inspect_err(|e| {
                    error!(error = %e, "Error initializing QA system");
                })?;
                let posts = qa.initialize(self.force_rebuild).await;
                info!(posts, "QA System initialized successfully");
                Ok::<_, AnswerError>(Arc::new(qa))
            })
            .await
            .cloned()
    }

    pub fn vision(&self) -> Option<&dyn ImageDescriber> {
        self.vision.as_deref()
    }
}
