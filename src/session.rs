use crate::config::Config;
use crate::dispatcher::{Rejection, RequestDispatcher, Submission};
use crate::error::ChatError;
use crate::events::{Identity, Turn};
use crate::qa::{HttpQaClient, QaBackend};
use crate::recent::RecentQueryCache;
use crate::store::ConversationStore;
use crate::typing::{greeting_for, AnimationHandle, TypingAnimator};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Duration;
use tracing::Instrument;
use uuid::Uuid;

/// One conversation: its log, recent queries, dispatcher, greeting animation
/// and the input staged for the next submission.
pub struct ChatSession {
    id: Uuid,
    store: ConversationStore,
    recent: RecentQueryCache,
    dispatcher: RequestDispatcher,
    identity: Option<Identity>,
    pending: String,
    animator: Option<TypingAnimator>,
    animation: Option<AnimationHandle>,
    typing_enabled: bool,
    typing_interval: Duration,
}

impl ChatSession {
    pub fn new(config: &Config, backend: Arc<dyn QaBackend>, identity: Option<Identity>) -> Self {
        let store = ConversationStore::new();
        let recent = RecentQueryCache::new();
        let dispatcher = RequestDispatcher::new(store.clone(), recent.clone(), backend);
        let greeting = greeting_for(
            &config.greeting.default,
            &config.greeting.personalized,
            identity.as_ref(),
        );

        Self {
            id: Uuid::new_v4(),
            animator: Some(TypingAnimator::new(store.clone(), greeting)),
            store,
            recent,
            dispatcher,
            identity,
            pending: String::new(),
            animation: None,
            typing_enabled: config.typing.enabled,
            typing_interval: config.typing_interval(),
        }
    }

    /// Session talking to the configured HTTP endpoint as the configured user
    pub fn from_config(config: &Config) -> Result<Self, ChatError> {
        let client = HttpQaClient::new(&config.api_url, config.request_timeout())?;
        tracing::info!(endpoint = %client.endpoint(), "using QA service");
        Ok(Self::new(config, Arc::new(client), config.user.clone()))
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Begin revealing the greeting. Only the first call does anything.
    /// Must be called inside a tokio runtime when typing is enabled.
    pub fn start(&mut self) {
        let Some(mut animator) = self.animator.take() else {
            return;
        };
        tracing::info!(session = %self.id, personalized = self.identity.is_some(), "session started");

        if self.typing_enabled {
            self.animation = Some(animator.spawn(self.typing_interval));
        } else {
            animator.finish();
        }
    }

    /// Stop the greeting animation where it is.
    pub fn shutdown(&mut self) {
        if let Some(animation) = self.animation.take() {
            animation.cancel();
            tracing::debug!(session = %self.id, "greeting animation cancelled");
        }
    }

    pub async fn submit(&self, query: &str) -> Submission {
        self.dispatcher
            .submit(query, self.identity.as_ref())
            .instrument(tracing::info_span!("submit", session = %self.id))
            .await
    }

    /// Submit on a background task so the caller can keep rendering.
    /// Blank queries and submissions while busy resolve immediately as rejected.
    pub fn spawn_submit(&self, query: String) -> JoinHandle<Submission> {
        let dispatcher = self.dispatcher.clone();
        let identity = self.identity.clone();
        let span = tracing::info_span!("submit", session = %self.id);
        tokio::spawn(async move { dispatcher.submit(&query, identity.as_ref()).await }.instrument(span))
    }

    /// Submit whatever is staged, clearing the staged input unless the
    /// dispatcher is still busy with an earlier query.
    pub async fn submit_pending(&mut self) -> Submission {
        if self.dispatcher.is_busy() {
            return Submission::Rejected(Rejection::Busy);
        }
        let query = std::mem::take(&mut self.pending);
        self.submit(&query).await
    }

    /// Stage the `index`-th recent query (0 = most recent) as pending input
    pub fn select_recent(&mut self, index: usize) -> Option<&str> {
        let query = self
            .recent
            .get(index)
            .and_then(|entry| self.recent.select(&entry))?;
        self.pending = query;
        Some(&self.pending)
    }

    pub fn set_pending(&mut self, text: impl Into<String>) {
        self.pending = text.into();
    }

    pub fn pending(&self) -> &str {
        &self.pending
    }

    pub fn take_pending(&mut self) -> String {
        std::mem::take(&mut self.pending)
    }

    pub fn snapshot(&self) -> Vec<Turn> {
        self.store.snapshot()
    }

    pub fn recent_queries(&self) -> Vec<String> {
        self.recent.entries()
    }

    pub fn is_busy(&self) -> bool {
        self.dispatcher.is_busy()
    }

    pub fn subscribe_busy(&self) -> watch::Receiver<bool> {
        self.dispatcher.subscribe_busy()
    }

    pub fn subscribe_log(&self) -> watch::Receiver<u64> {
        self.store.subscribe()
    }

    pub fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }
}

impl Drop for ChatSession {
    fn drop(&mut self) {
        self.shutdown();
    }
}
