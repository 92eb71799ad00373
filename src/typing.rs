//! Character-by-character reveal of the greeting turn

use crate::events::{Identity, Role};
use crate::store::ConversationStore;
use tokio::task::JoinHandle;
use tokio::time::{Duration, MissedTickBehavior};

/// Default reveal speed, one character per tick
pub const DEFAULT_TICK: Duration = Duration::from_millis(30);

/// Where the reveal currently stands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnimatorState {
    Idle,
    /// `revealed` characters of the greeting are visible
    Revealing { revealed: usize },
    Done,
}

/// Reveals the greeting one character per tick. Runs at most once.
pub struct TypingAnimator {
    store: ConversationStore,
    greeting: Vec<char>,
    state: AnimatorState,
}

impl TypingAnimator {
    pub fn new(store: ConversationStore, greeting: impl Into<String>) -> Self {
        Self {
            store,
            greeting: greeting.into().chars().collect(),
            state: AnimatorState::Idle,
        }
    }

    pub fn state(&self) -> AnimatorState {
        self.state
    }

    pub fn is_done(&self) -> bool {
        self.state == AnimatorState::Done
    }

    /// Leave `Idle` and begin revealing. Any later call is a no-op.
    pub fn start(&mut self) -> AnimatorState {
        if self.state != AnimatorState::Idle {
            return self.state;
        }

        if self.greeting.is_empty() {
            self.finish();
            return self.state;
        }

        let started = self.store.mutate_last(Role::Assistant, |content, animating| {
            content.clear();
            *animating = true;
        });
        self.state = if started {
            AnimatorState::Revealing { revealed: 0 }
        } else {
            AnimatorState::Done
        };
        tracing::debug!(chars = self.greeting.len(), state = ?self.state, "greeting animation started");
        self.state
    }

    /// Reveal one more character. Ticks outside `Revealing` do nothing.
    pub fn tick(&mut self) -> AnimatorState {
        let AnimatorState::Revealing { revealed } = self.state else {
            return self.state;
        };

        let next = revealed + 1;
        let complete = next >= self.greeting.len();
        let visible: String = self.greeting[..next].iter().collect();
        let applied = self.store.mutate_last(Role::Assistant, |content, animating| {
            *content = visible;
            *animating = !complete;
        });

        self.state = if !applied || complete {
            AnimatorState::Done
        } else {
            AnimatorState::Revealing { revealed: next }
        };
        if self.is_done() {
            tracing::debug!("greeting animation finished");
        }
        self.state
    }

    /// Show the whole greeting at once and stop.
    pub fn finish(&mut self) {
        if self.is_done() {
            return;
        }
        let full: String = self.greeting.iter().collect();
        self.store.mutate_last(Role::Assistant, |content, animating| {
            *content = full;
            *animating = false;
        });
        self.state = AnimatorState::Done;
    }

    /// Drive the animation from a tokio interval until it completes.
    pub fn spawn(mut self, period: Duration) -> AnimationHandle {
        let task = tokio::spawn(async move {
            if self.start() == AnimatorState::Done {
                return;
            }
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick of an interval fires immediately.
            ticker.tick().await;
            while !self.is_done() {
                ticker.tick().await;
                self.tick();
            }
        });
        AnimationHandle { task }
    }
}

/// Running animation. Dropping the handle cancels the ticker.
pub struct AnimationHandle {
    task: JoinHandle<()>,
}

impl AnimationHandle {
    pub fn cancel(&self) {
        self.task.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for AnimationHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Pick the greeting: the personalized template when the user has a display
/// name, the default text otherwise. `{name}` in the template is replaced.
pub fn greeting_for(default: &str, personalized: &str, identity: Option<&Identity>) -> String {
    identity
        .and_then(|identity| identity.display_name.as_deref())
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(|name| personalized.replace("{name}", name))
        .unwrap_or_else(|| default.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::Turn;

    fn greeting(store: &ConversationStore) -> Turn {
        store.snapshot()[0].clone()
    }

    #[test]
    fn reveals_one_character_per_tick() {
        let store = ConversationStore::new();
        let mut animator = TypingAnimator::new(store.clone(), "Hey!");
        assert_eq!(animator.state(), AnimatorState::Idle);

        assert_eq!(animator.start(), AnimatorState::Revealing { revealed: 0 });
        let mut last = 0;
        for expected in ["H", "He", "Hey"] {
            match animator.tick() {
                AnimatorState::Revealing { revealed } => {
                    assert!(revealed > last);
                    last = revealed;
                }
                other => panic!("unexpected state {:?}", other),
            }
            let turn = greeting(&store);
            assert_eq!(turn.content, expected);
            assert!(turn.animating);
        }

        assert_eq!(animator.tick(), AnimatorState::Done);
        let turn = greeting(&store);
        assert_eq!(turn.content, "Hey!");
        assert!(!turn.animating);
    }

    #[test]
    fn ticks_after_done_are_noops() {
        let store = ConversationStore::new();
        let mut animator = TypingAnimator::new(store.clone(), "Yo");
        animator.start();
        animator.tick();
        animator.tick();
        assert!(animator.is_done());
        let rev = *store.subscribe().borrow();

        for _ in 0..5 {
            assert_eq!(animator.tick(), AnimatorState::Done);
        }
        assert_eq!(*store.subscribe().borrow(), rev);
        assert_eq!(greeting(&store).content, "Yo");
    }

    #[test]
    fn start_is_idempotent() {
        let store = ConversationStore::new();
        let mut animator = TypingAnimator::new(store.clone(), "abc");
        animator.start();
        animator.tick();
        assert_eq!(animator.start(), AnimatorState::Revealing { revealed: 1 });
        assert_eq!(greeting(&store).content, "a");

        animator.finish();
        assert_eq!(animator.start(), AnimatorState::Done);
        assert_eq!(greeting(&store).content, "abc");
    }

    #[test]
    fn multibyte_characters_are_never_split() {
        let store = ConversationStore::new();
        let mut animator = TypingAnimator::new(store.clone(), "¡Olé 🎉");
        animator.start();
        let mut seen = Vec::new();
        while !animator.is_done() {
            animator.tick();
            seen.push(greeting(&store).content);
        }
        assert_eq!(seen.len(), 6);
        assert_eq!(seen[0], "¡");
        assert_eq!(seen[3], "¡Olé");
        assert_eq!(seen[5], "¡Olé 🎉");
    }

    #[test]
    fn empty_greeting_finishes_immediately() {
        let store = ConversationStore::new();
        let mut animator = TypingAnimator::new(store.clone(), "");
        assert_eq!(animator.start(), AnimatorState::Done);
        assert!(!greeting(&store).animating);
    }

    #[test]
    fn exchange_turns_are_never_touched() {
        let store = ConversationStore::new();
        let mut animator = TypingAnimator::new(store.clone(), "Hi");
        animator.start();
        store.append(Turn::user("question"));
        animator.tick();
        store.append(Turn::assistant("answer", Vec::new()));
        animator.tick();

        let turns = store.snapshot();
        assert_eq!(turns[0].content, "Hi");
        assert_eq!(turns[1].content, "question");
        assert_eq!(turns[2].content, "answer");
        assert!(!turns[1].animating && !turns[2].animating);
    }

    #[test]
    fn stops_when_greeting_already_sealed() {
        let store = ConversationStore::with_static_greeting("Welcome back");
        let mut animator = TypingAnimator::new(store.clone(), "Hello");
        assert_eq!(animator.start(), AnimatorState::Done);
        assert_eq!(greeting(&store).content, "Welcome back");
    }

    #[tokio::test(start_paused = true)]
    async fn spawned_animation_runs_to_completion() {
        let store = ConversationStore::new();
        let handle = TypingAnimator::new(store.clone(), "Hello").spawn(DEFAULT_TICK);

        tokio::time::sleep(DEFAULT_TICK * 2 + Duration::from_millis(5)).await;
        let partial = greeting(&store);
        assert!(partial.animating);
        assert_eq!(partial.content, "He");

        tokio::time::sleep(DEFAULT_TICK * 10).await;
        let turn = greeting(&store);
        assert_eq!(turn.content, "Hello");
        assert!(!turn.animating);
        assert!(handle.is_finished());
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_animation_stops_ticking() {
        let store = ConversationStore::new();
        let handle = TypingAnimator::new(store.clone(), "A long greeting").spawn(DEFAULT_TICK);

        tokio::time::sleep(DEFAULT_TICK * 3 + Duration::from_millis(5)).await;
        handle.cancel();
        let at_cancel = greeting(&store);

        tokio::time::sleep(Duration::from_secs(2)).await;
        let later = greeting(&store);
        assert_eq!(later.content, at_cancel.content);
        assert!(later.animating);
        assert!(later.content.len() < "A long greeting".len());
    }

    #[test]
    fn personalized_greeting_needs_a_display_name() {
        let ada = Identity {
            id: "1".to_string(),
            display_name: Some("Ada".to_string()),
            email: None,
        };
        let anonymous = Identity {
            id: "2".to_string(),
            display_name: Some("   ".to_string()),
            email: Some("x@example.com".to_string()),
        };
        let template = "Hi {name}!";
        assert_eq!(greeting_for("Hi!", template, Some(&ada)), "Hi Ada!");
        assert_eq!(greeting_for("Hi!", template, Some(&anonymous)), "Hi!");
        assert_eq!(greeting_for("Hi!", template, None), "Hi!");
    }
}
