//! Conversation Thread Manager
//!
//! Lists, selects and creates chat threads for the current context (a site or
//! the general context). Remote results that arrive after the context moved
//! on are discarded.

use std::sync::Arc;

use atlasfield_core::{ChatReply, ChatTurn, ConversationThread, SiteApi, SiteId, ThreadId};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::models::dashboard::ConversationSnapshot;
use crate::models::settings::ThreadSwitchPolicy;
use crate::utils::error::{AppError, AppResult};

pub struct ConversationManager {
    api: Arc<dyn SiteApi>,
    policy: ThreadSwitchPolicy,
    state_tx: watch::Sender<ConversationSnapshot>,
}

impl ConversationManager {
    pub fn new(api: Arc<dyn SiteApi>, policy: ThreadSwitchPolicy) -> Self {
        let (state_tx, _) = watch::channel(ConversationSnapshot::default());
        Self {
            api,
            policy,
            state_tx,
        }
    }

    /// Threads of `context`, most recently updated first
    ///
    /// Refreshes the published list when `context` is the current one.
    pub async fn list_threads(&self, context: Option<SiteId>) -> AppResult<Vec<ConversationThread>> {
        let mut threads = self.api.list_chat_threads(context).await?;
        // The unscoped listing returns every thread of the user
        threads.retain(|thread| thread.site_id == context);
        threads.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));

        let listed = threads.clone();
        let applied = self.state_tx.send_if_modified(|state| {
            if state.context != context {
                return false;
            }
            state.threads = listed;
            true
        });
        if !applied {
            debug!(?context, "Thread list for an inactive context not published");
        }
        Ok(threads)
    }

    /// Move to a new context and re-list its threads
    ///
    /// The transcript is reset; under `ResumeLatest` the newest thread of the
    /// new context is then loaded.
    pub async fn switch_context(&self, context: Option<SiteId>) -> AppResult<()> {
        self.state_tx.send_modify(|state| {
            *state = ConversationSnapshot {
                context,
                ..ConversationSnapshot::default()
            };
        });
        debug!(?context, policy = ?self.policy, "Conversation context switched");

        let threads = self.list_threads(context).await?;
        if self.context() != context {
            return Ok(());
        }

        if self.policy == ThreadSwitchPolicy::ResumeLatest {
            if let Some(latest) = threads.first() {
                self.select_thread(latest.id)?;
            }
        }
        Ok(())
    }

    /// Load a listed thread's turns into the transcript
    pub fn select_thread(&self, thread_id: ThreadId) -> AppResult<()> {
        let mut found = false;
        self.state_tx.send_if_modified(|state| {
            let Some(thread) = state.threads.iter().find(|thread| thread.id == thread_id) else {
                return false;
            };
            state.transcript = thread.messages.clone();
            state.active_thread_id = Some(thread_id);
            found = true;
            true
        });

        if found {
            Ok(())
        } else {
            Err(AppError::not_found(format!("Conversation thread {}", thread_id)))
        }
    }

    /// Blank transcript; existing threads are kept
    pub fn start_new_thread(&self) {
        self.state_tx.send_modify(|state| {
            state.active_thread_id = None;
            state.transcript.clear();
        });
    }

    /// Append a turn to the active transcript
    pub fn append_turn(&self, turn: ChatTurn) {
        self.state_tx.send_modify(|state| state.transcript.push(turn));
    }

    /// Send a message in the current context
    ///
    /// Appends the user turn, then the assistant reply, then re-lists the
    /// context's threads and adopts the server-side thread if none was
    /// selected. A reply arriving after a context switch is returned but not
    /// appended.
    pub async fn send_message(&self, text: &str) -> AppResult<ChatReply> {
        let text = text.trim();
        if text.is_empty() {
            return Err(AppError::validation("Message cannot be empty"));
        }

        let context = self.context();
        self.append_turn(ChatTurn::user(text));

        let reply = match self.api.send_chat_message(text, context).await {
            Ok(reply) => reply,
            Err(err) => {
                warn!(?context, error = %err, "Chat message failed");
                return Err(err.into());
            }
        };

        if self.context() != context {
            debug!(?context, "Discarding chat reply for a previous context");
            return Ok(reply);
        }
        self.append_turn(ChatTurn::assistant(reply.response.clone()));

        match self.list_threads(context).await {
            Ok(threads) => {
                if let Some(latest) = threads.first() {
                    let latest_id = latest.id;
                    self.state_tx.send_if_modified(|state| {
                        if state.context != context || state.active_thread_id.is_some() {
                            return false;
                        }
                        state.active_thread_id = Some(latest_id);
                        true
                    });
                }
            }
            Err(err) => warn!(?context, error = %err, "Could not refresh threads after sending"),
        }
        Ok(reply)
    }

    /// Delete a thread; the transcript is reset if it was active
    pub async fn delete_thread(&self, thread_id: ThreadId) -> AppResult<()> {
        self.api.delete_chat_thread(thread_id).await?;
        info!(thread_id, "Conversation thread deleted");

        self.state_tx.send_modify(|state| {
            state.threads.retain(|thread| thread.id != thread_id);
            if state.active_thread_id == Some(thread_id) {
                state.active_thread_id = None;
                state.transcript.clear();
            }
        });
        Ok(())
    }

    pub fn context(&self) -> Option<SiteId> {
        self.state_tx.borrow().context
    }

    pub fn snapshot(&self) -> ConversationSnapshot {
        self.state_tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<ConversationSnapshot> {
        self.state_tx.subscribe()
    }
}
