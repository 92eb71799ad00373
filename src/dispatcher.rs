use crate::events::{Identity, Turn};
use crate::qa::{ChatRequest, QaBackend};
use crate::recent::RecentQueryCache;
use crate::store::ConversationStore;
use std::sync::Arc;
use tokio::sync::watch;

/// Assistant turn shown whenever the QA service could not answer
pub const FALLBACK_REPLY: &str =
    "Sorry, I'm having trouble connecting to the brain right now. Please try again later.";

/// Why a submission was turned away before anything happened
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    EmptyQuery,
    Busy,
}

/// How a call to [`RequestDispatcher::submit`] ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Submission {
    Rejected(Rejection),
    Answered,
    FellBack,
}

/// Runs the append-user / ask / append-answer cycle, one query at a time.
#[derive(Clone)]
pub struct RequestDispatcher {
    store: ConversationStore,
    recent: RecentQueryCache,
    backend: Arc<dyn QaBackend>,
    busy: Arc<watch::Sender<bool>>,
}

/// Clears the busy flag when the submission ends, however it ends.
struct BusyGuard<'a> {
    busy: &'a watch::Sender<bool>,
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.busy.send_replace(false);
    }
}

impl RequestDispatcher {
    pub fn new(
        store: ConversationStore,
        recent: RecentQueryCache,
        backend: Arc<dyn QaBackend>,
    ) -> Self {
        let (busy, _) = watch::channel(false);
        Self {
            store,
            recent,
            backend,
            busy: Arc::new(busy),
        }
    }

    pub fn is_busy(&self) -> bool {
        *self.busy.borrow()
    }

    /// Receiver that flips with the busy flag
    pub fn subscribe_busy(&self) -> watch::Receiver<bool> {
        self.busy.subscribe()
    }

    fn try_acquire(&self) -> Option<BusyGuard<'_>> {
        let acquired = self.busy.send_if_modified(|busy| {
            if *busy {
                false
            } else {
                *busy = true;
                true
            }
        });
        // Lazily built: dropping a guard releases the flag.
        acquired.then(|| BusyGuard { busy: &self.busy })
    }

    /// Submit a user query.
    ///
    /// The user turn is appended before the QA service is asked and stays in
    /// the log whatever happens next. The request carries the history as it
    /// was before that append. Any failure becomes a single
    /// [`FALLBACK_REPLY`] turn; nothing is retried.
    pub async fn submit(&self, query: &str, identity: Option<&Identity>) -> Submission {
        let query = query.trim();
        if query.is_empty() {
            return Submission::Rejected(Rejection::EmptyQuery);
        }

        let Some(_guard) = self.try_acquire() else {
            tracing::debug!("submission ignored while a previous one is in flight");
            return Submission::Rejected(Rejection::Busy);
        };

        let history = self.store.history();
        self.store.append(Turn::user(query));
        self.recent.record(query);

        let request = ChatRequest {
            question: query.to_string(),
            conversation_history: history,
            user: identity.cloned(),
        };

        match self.backend.ask(&request).await {
            Ok(reply) => {
                tracing::debug!(sources = reply.sources.len(), "QA service answered");
                self.store.append(Turn::assistant(reply.answer, reply.sources));
                Submission::Answered
            }
            Err(e) => {
                tracing::warn!(error = %e, "QA request failed, showing fallback reply");
                self.store.append(Turn::assistant(FALLBACK_REPLY, Vec::new()));
                Submission::FellBack
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RemoteError;
    use crate::events::{EventSource, Role};
    use crate::testing::{reply, GatedBackend, ScriptedBackend};
    use tokio::time::Duration;

    fn setup(backend: Arc<dyn QaBackend>) -> (ConversationStore, RecentQueryCache, RequestDispatcher) {
        let store = ConversationStore::with_static_greeting("Hi! I'm D-Bot.");
        let recent = RecentQueryCache::new();
        let dispatcher = RequestDispatcher::new(store.clone(), recent.clone(), backend);
        (store, recent, dispatcher)
    }

    #[tokio::test]
    async fn successful_exchange_appends_two_turns() {
        let backend = Arc::new(ScriptedBackend::answering(reply(
            "It's on Friday.",
            vec![EventSource::named("Fall Concert").with_date("Friday")],
        )));
        let (store, recent, dispatcher) = setup(backend.clone());

        let outcome = dispatcher.submit("When is the concert?", None).await;
        assert_eq!(outcome, Submission::Answered);

        let turns = store.snapshot();
        assert_eq!(turns.len(), 3);
        assert_eq!(turns[1].role, Role::User);
        assert_eq!(turns[1].content, "When is the concert?");
        assert_eq!(turns[2].role, Role::Assistant);
        assert_eq!(turns[2].content, "It's on Friday.");
        assert_eq!(turns[2].sources.len(), 1);
        assert_eq!(turns[2].sources[0].name, "Fall Concert");
        assert!(!turns[2].animating);

        assert_eq!(recent.get(0).as_deref(), Some("When is the concert?"));
        assert!(!dispatcher.is_busy());
    }

    #[tokio::test]
    async fn failure_appends_fallback_and_keeps_user_turn() {
        let backend = Arc::new(ScriptedBackend::failing());
        let (store, recent, dispatcher) = setup(backend);

        let outcome = dispatcher.submit("Is the gym open?", None).await;
        assert_eq!(outcome, Submission::FellBack);

        let turns = store.snapshot();
        assert_eq!(turns.len(), 3);
        assert_eq!(turns[1].content, "Is the gym open?");
        assert_eq!(turns[2].content, FALLBACK_REPLY);
        assert!(turns[2].sources.is_empty());
        assert_eq!(recent.entries(), vec!["Is the gym open?"]);
        assert!(!dispatcher.is_busy());
    }

    #[tokio::test]
    async fn session_stays_usable_after_failure() {
        let backend = Arc::new(ScriptedBackend::failing());
        let (store, _recent, dispatcher) = setup(backend);

        dispatcher.submit("one", None).await;
        let outcome = dispatcher.submit("two", None).await;
        assert_eq!(outcome, Submission::FellBack);
        assert_eq!(store.len(), 5);
    }

    #[tokio::test]
    async fn blank_queries_are_rejected_before_any_change() {
        let backend = Arc::new(ScriptedBackend::answering(reply("unused", Vec::new())));
        let (store, recent, dispatcher) = setup(backend.clone());
        let rev = *store.subscribe().borrow();

        for query in ["", "   ", "\n\t "] {
            assert_eq!(
                dispatcher.submit(query, None).await,
                Submission::Rejected(Rejection::EmptyQuery)
            );
        }

        assert_eq!(store.len(), 1);
        assert_eq!(*store.subscribe().borrow(), rev);
        assert!(recent.is_empty());
        assert!(backend.requests().is_empty());
        assert!(!dispatcher.is_busy());
    }

    #[tokio::test]
    async fn query_is_trimmed_everywhere() {
        let backend = Arc::new(ScriptedBackend::answering(reply("ok", Vec::new())));
        let (store, recent, dispatcher) = setup(backend.clone());

        dispatcher.submit("  parking?  ", None).await;

        assert_eq!(store.snapshot()[1].content, "parking?");
        assert_eq!(recent.get(0).as_deref(), Some("parking?"));
        assert_eq!(backend.requests()[0].question, "parking?");
    }

    #[tokio::test]
    async fn history_excludes_the_query_being_sent() {
        let backend = Arc::new(ScriptedBackend::answering(reply("sure", Vec::new())));
        let (_store, _recent, dispatcher) = setup(backend.clone());

        dispatcher.submit("first", None).await;
        dispatcher.submit("second", None).await;

        let requests = backend.requests();
        assert_eq!(requests.len(), 2);

        let first: Vec<&str> = requests[0]
            .conversation_history
            .iter()
            .map(|e| e.content.as_str())
            .collect();
        assert_eq!(first, vec!["Hi! I'm D-Bot."]);

        let second: Vec<&str> = requests[1]
            .conversation_history
            .iter()
            .map(|e| e.content.as_str())
            .collect();
        assert_eq!(second, vec!["Hi! I'm D-Bot.", "first", "sure"]);
        assert_eq!(requests[1].question, "second");
    }

    #[tokio::test]
    async fn identity_is_forwarded_verbatim() {
        let backend = Arc::new(ScriptedBackend::answering(reply("hi Ada", Vec::new())));
        let (_store, _recent, dispatcher) = setup(backend.clone());
        let identity = Identity {
            id: "uid-42".to_string(),
            display_name: Some("Ada".to_string()),
            email: Some("ada@example.com".to_string()),
        };

        dispatcher.submit("hello", Some(&identity)).await;
        dispatcher.submit("again", None).await;

        let requests = backend.requests();
        assert_eq!(requests[0].user.as_ref(), Some(&identity));
        assert_eq!(requests[1].user, None);
    }

    #[tokio::test]
    async fn second_submit_while_in_flight_is_ignored() {
        let (backend, release) = GatedBackend::new();
        let (store, recent, dispatcher) = setup(Arc::new(backend));

        let first = tokio::spawn({
            let dispatcher = dispatcher.clone();
            async move { dispatcher.submit("first", None).await }
        });

        let mut busy = dispatcher.subscribe_busy();
        busy.wait_for(|busy| *busy).await.unwrap();
        assert_eq!(store.len(), 2);

        let second = dispatcher.submit("second", None).await;
        assert_eq!(second, Submission::Rejected(Rejection::Busy));
        assert_eq!(store.len(), 2);
        assert_eq!(recent.entries(), vec!["first"]);
        assert!(dispatcher.is_busy());

        release.send(Ok(reply("done", Vec::new()))).unwrap();
        assert_eq!(first.await.unwrap(), Submission::Answered);
        assert!(!dispatcher.is_busy());
        assert_eq!(store.len(), 3);

        let third = dispatcher.submit("third", None).await;
        assert_eq!(third, Submission::FellBack);
    }

    #[tokio::test]
    async fn gated_failure_releases_busy_flag() {
        let (backend, release) = GatedBackend::new();
        let (store, _recent, dispatcher) = setup(Arc::new(backend));

        let pending = tokio::spawn({
            let dispatcher = dispatcher.clone();
            async move { dispatcher.submit("slow one", None).await }
        });
        dispatcher
            .subscribe_busy()
            .wait_for(|busy| *busy)
            .await
            .unwrap();

        release.send(Err(RemoteError::Status(504))).unwrap();
        assert_eq!(pending.await.unwrap(), Submission::FellBack);
        assert!(!dispatcher.is_busy());
        assert_eq!(store.snapshot()[2].content, FALLBACK_REPLY);
    }

    #[tokio::test(start_paused = true)]
    async fn dropped_submission_releases_busy_flag() {
        let (backend, _release) = GatedBackend::new();
        let (store, _recent, dispatcher) = setup(Arc::new(backend));

        let result =
            tokio::time::timeout(Duration::from_secs(5), dispatcher.submit("never answered", None)).await;
        assert!(result.is_err());

        assert!(!dispatcher.is_busy());
        assert_eq!(store.len(), 2);
    }
}
