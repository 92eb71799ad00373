//! Append-only conversation log

use crate::events::{Role, Turn};
use crate::qa::HistoryEntry;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::watch;

struct ConversationLog {
    turns: Vec<Turn>,
    /// Set once the greeting has finished revealing; after that index 0 is frozen.
    greeting_sealed: bool,
}

struct Shared {
    log: Mutex<ConversationLog>,
    revision: watch::Sender<u64>,
}

/// Owns the ordered turn log. Cloning yields another handle to the same log.
#[derive(Clone)]
pub struct ConversationStore {
    shared: Arc<Shared>,
}

impl ConversationStore {
    /// New log holding only the greeting placeholder.
    pub fn new() -> Self {
        Self::from_greeting(Turn::pending_greeting())
    }

    /// New log whose greeting is already fully shown and frozen.
    pub fn with_static_greeting(text: impl Into<String>) -> Self {
        Self::from_greeting(Turn::assistant(text, Vec::new()))
    }

    fn from_greeting(greeting: Turn) -> Self {
        let greeting_sealed = !greeting.animating;
        let (revision, _) = watch::channel(0);
        Self {
            shared: Arc::new(Shared {
                log: Mutex::new(ConversationLog {
                    turns: vec![greeting],
                    greeting_sealed,
                }),
                revision,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, ConversationLog> {
        self.shared.log.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn bump(&self) {
        self.shared.revision.send_modify(|rev| *rev += 1);
    }

    /// Add a turn to the end of the log
    pub fn append(&self, turn: Turn) {
        {
            let mut log = self.lock();
            tracing::debug!(role = ?turn.role, index = log.turns.len(), "appending turn");
            log.turns.push(turn);
        }
        self.bump();
    }

    /// Rewrite the greeting turn while it is still being revealed.
    ///
    /// Only the greeting at index 0 can be targeted, and only with
    /// `Role::Assistant`. Returns `false` without touching the log once the
    /// greeting has been sealed, which happens the first time an update
    /// leaves `animating` cleared.
    pub fn mutate_last<F>(&self, role: Role, updater: F) -> bool
    where
        F: FnOnce(&mut String, &mut bool),
    {
        if role != Role::Assistant {
            return false;
        }

        {
            let mut log = self.lock();
            if log.greeting_sealed {
                return false;
            }
            let Some(greeting) = log.turns.first_mut() else {
                return false;
            };
            if greeting.role != Role::Assistant {
                return false;
            }

            updater(&mut greeting.content, &mut greeting.animating);
            if !greeting.animating {
                log.greeting_sealed = true;
            }
        }

        self.bump();
        true
    }

    /// Copy of the current log for rendering
    pub fn snapshot(&self) -> Vec<Turn> {
        self.lock().turns.clone()
    }

    /// The log in the `{role, content}` shape sent to the QA service
    pub fn history(&self) -> Vec<HistoryEntry> {
        self.lock()
            .turns
            .iter()
            .map(|turn| HistoryEntry {
                role: turn.role,
                content: turn.content.clone(),
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.lock().turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().turns.is_empty()
    }

    pub fn greeting_sealed(&self) -> bool {
        self.lock().greeting_sealed
    }

    /// Receiver that changes every time the log does
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.shared.revision.subscribe()
    }
}

impl Default for ConversationStore {
    fn default() -> Self {
        Self::new()
    }
}
