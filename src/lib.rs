//! Conversation session engine for the D-Bot event assistant.
//!
//! A [`ChatSession`] ties together the append-only [`ConversationStore`], the
//! [`RecentQueryCache`], the single-flight [`RequestDispatcher`] and the
//! greeting [`TypingAnimator`]. Presentation layers read snapshots and
//! subscribe to changes; only the session engine mutates state.

pub mod commands;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod events;
pub mod qa;
pub mod recent;
pub mod session;
pub mod store;
pub mod typing;
pub mod ui;

#[cfg(test)]
mod testing;

pub use config::Config;
pub use dispatcher::{Rejection, RequestDispatcher, Submission, FALLBACK_REPLY};
pub use error::{ChatError, RemoteError};
pub use events::{EventSource, Identity, Role, Turn};
pub use qa::{ChatReply, ChatRequest, HistoryEntry, HttpQaClient, QaBackend};
pub use recent::{RecentQueryCache, RECENT_QUERY_LIMIT};
pub use session::ChatSession;
pub use store::ConversationStore;
pub use typing::{AnimationHandle, AnimatorState, TypingAnimator};
