//! Orchestration of one conversational round trip.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use crate::chat::interrupt::Interrupt;
use crate::chat::store::SessionStore;
use crate::client::ModelClient;
use crate::error::Error;
use crate::observability::{
    CHAT_RESETS, CHAT_SUBMITS, CHAT_SUBMITS_BUSY, CHAT_SUBMITS_IGNORED, CHAT_TURN_DURATION,
    CHAT_TURN_FAILURES,
};
use crate::types::{DisplayMessage, ModelHistoryEntry, orphaned_user_entries};

/////////////////////////////////////////// SubmitOutcome //////////////////////////////////////////

/// What a call to [`ChatController::submit`] did.
#[derive(Debug, Clone)]
pub enum SubmitOutcome {
    /// The input was blank; nothing changed.
    Ignored,

    /// Another round trip is still running for this session; nothing changed.
    Busy,

    /// The model replied and both logs gained a user and a bot entry.
    Replied {
        /// The model's reply.
        reply: String,
    },

    /// The model call failed; only the user entries were recorded.
    Failed {
        /// Transient notice to show the user.
        notice: String,
        /// The underlying failure.
        error: Error,
    },

    /// The session was reset while the request was in flight, so the reply
    /// was dropped instead of being appended to the fresh session.
    Superseded,
}

impl SubmitOutcome {
    /// Returns true if the model replied.
    pub fn is_replied(&self) -> bool {
        matches!(self, SubmitOutcome::Replied { .. })
    }

    /// The transient failure notice, if any.
    pub fn notice(&self) -> Option<&str> {
        match self {
            SubmitOutcome::Failed { notice, .. } => Some(notice),
            _ => None,
        }
    }
}

///////////////////////////////////////////// ChatStats ////////////////////////////////////////////

/// Counters for one controller plus the current shape of its session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatStats {
    /// Round trips started.
    pub turns_attempted: u64,
    /// Round trips that produced a reply.
    pub turns_succeeded: u64,
    /// Round trips that failed.
    pub turns_failed: u64,
    /// Number of display messages.
    pub display_len: usize,
    /// Number of history entries.
    pub history_len: usize,
    /// User entries in the history with no reply after them.
    pub orphaned_user_entries: usize,
}

/////////////////////////////////////////// ChatController //////////////////////////////////////////

/// Drives round trips between a [`SessionStore`] and a [`ModelClient`].
pub struct ChatController<C: ModelClient + ?Sized = dyn ModelClient> {
    store: Arc<SessionStore>,
    client: Arc<C>,
    attempted: AtomicU64,
    succeeded: AtomicU64,
    failed: AtomicU64,
}

impl<C: ModelClient + ?Sized> ChatController<C> {
    /// Creates a controller for `store` that talks to `client`.
    pub fn new(store: Arc<SessionStore>, client: Arc<C>) -> Self {
        store.init();
        Self {
            store,
            client,
            attempted: AtomicU64::new(0),
            succeeded: AtomicU64::new(0),
            failed: AtomicU64::new(0),
        }
    }

    /// The session this controller mutates.
    pub fn store(&self) -> &Arc<SessionStore> {
        &self.store
    }

    /// The model client.
    pub fn client(&self) -> &Arc<C> {
        &self.client
    }

    /// Submits `text` as the user's next turn.
    ///
    /// The user's message is recorded in both logs before the model is
    /// called, and stays there if the call fails.  Pending input is cleared
    /// whether or not the call succeeds.  Blank input changes nothing.
    pub async fn submit(&self, text: &str) -> SubmitOutcome {
        self.run_turn(text, None).await
    }

    /// Like [`ChatController::submit`], but a triggered `interrupt` fails the
    /// round trip with [`Error::Abort`] instead of waiting for the reply.
    pub async fn submit_interruptible(&self, text: &str, interrupt: &Interrupt) -> SubmitOutcome {
        self.run_turn(text, Some(interrupt)).await
    }

    /// Clears the session back to its initial empty state.
    ///
    /// No network call is made, and it may be called while a round trip is
    /// in flight; that round trip's reply is then dropped.
    pub fn reset(&self) {
        self.store.clear();
        CHAT_RESETS.click();
        tracing::info!(session = %self.store.id(), "session reset");
    }

    /// Returns the current counters and session shape.
    pub fn stats(&self) -> ChatStats {
        let snapshot = self.store.snapshot();
        ChatStats {
            turns_attempted: self.attempted.load(Ordering::Relaxed),
            turns_succeeded: self.succeeded.load(Ordering::Relaxed),
            turns_failed: self.failed.load(Ordering::Relaxed),
            display_len: snapshot.display.len(),
            history_len: snapshot.history.len(),
            orphaned_user_entries: orphaned_user_entries(&snapshot.history),
        }
    }

    async fn run_turn(&self, text: &str, interrupt: Option<&Interrupt>) -> SubmitOutcome {
        if text.trim().is_empty() {
            CHAT_SUBMITS_IGNORED.click();
            tracing::debug!(session = %self.store.id(), "ignoring blank submit");
            return SubmitOutcome::Ignored;
        }
        let Some(_turn) = self.store.try_begin_turn() else {
            CHAT_SUBMITS_BUSY.click();
            tracing::debug!(session = %self.store.id(), "submit rejected, turn in flight");
            return SubmitOutcome::Busy;
        };
        CHAT_SUBMITS.click();
        self.attempted.fetch_add(1, Ordering::Relaxed);

        let (epoch, history) = self.store.with_session(|session| {
            session.display.push(DisplayMessage::user(text));
            session.history.push(ModelHistoryEntry::user(text));
            (session.epoch, session.history.clone())
        });
        tracing::info!(
            session = %self.store.id(),
            history_len = history.len(),
            "submitting turn"
        );

        let start = Instant::now();
        let result = match interrupt {
            Some(interrupt) => {
                tokio::select! {
                    result = self.client.complete(&history, text) => result,
                    _ = interrupt.triggered() => Err(Error::abort("request interrupted")),
                }
            }
            None => self.client.complete(&history, text).await,
        };
        CHAT_TURN_DURATION.add(start.elapsed().as_secs_f64());

        self.store.with_session(|session| {
            if session.epoch != epoch {
                tracing::info!(session = %self.store.id(), "session reset during turn, dropping reply");
                return SubmitOutcome::Superseded;
            }
            let outcome = match result {
                Ok(reply) => {
                    session.history.push(ModelHistoryEntry::model(reply.clone()));
                    session.display.push(DisplayMessage::bot(reply.clone()));
                    self.succeeded.fetch_add(1, Ordering::Relaxed);
                    tracing::info!(session = %self.store.id(), "turn completed");
                    SubmitOutcome::Replied { reply }
                }
                Err(error) => {
                    CHAT_TURN_FAILURES.click();
                    self.failed.fetch_add(1, Ordering::Relaxed);
                    tracing::warn!(
                        session = %self.store.id(),
                        retryable = error.is_retryable(),
                        "turn failed: {error}"
                    );
                    SubmitOutcome::Failed {
                        notice: failure_notice(&error),
                        error,
                    }
                }
            };
            session.pending.clear();
            outcome
        })
    }
}

/// The transient notice shown for a failed round trip.
pub fn failure_notice(error: &Error) -> String {
    format!("Error: {error}")
}
