//! Draft persistence
//!
//! Input changes are written to the store after a quiet period. A new change
//! for the same input kind restarts that kind's timer, so a burst of edits
//! produces one write holding the last content.

use chrono::{DateTime, Utc};
use distill_core::clock::Clock;
use distill_core::error::{AppError, Result};
use distill_core::models::{Draft, InputKind};
use distill_store::{get_json, put_json, KeyValueStore};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Outcome of the latest draft write
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveStatus {
    Idle,
    /// A change is waiting for its debounce timer
    Pending,
    Saved { at: DateTime<Utc> },
    Failed { error: AppError },
}

struct PendingSave {
    generation: u64,
    content: String,
    timer: JoinHandle<()>,
}

struct Shared {
    store: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
    pending: Mutex<HashMap<InputKind, PendingSave>>,
    status: watch::Sender<SaveStatus>,
}

impl Shared {
    fn pending(&self) -> MutexGuard<'_, HashMap<InputKind, PendingSave>> {
        self.pending.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Take the pending content for `kind` if it still belongs to `generation`
    fn take_if_current(&self, kind: InputKind, generation: u64) -> Option<String> {
        let mut pending = self.pending();
        match pending.get(&kind) {
            Some(save) if save.generation == generation => pending.remove(&kind).map(|s| s.content),
            _ => None,
        }
    }

    /// Write or remove the draft for `kind`. Failures are reported through
    /// the status channel only.
    async fn save(&self, kind: InputKind, content: String) -> SaveStatus {
        let key = kind.storage_key();
        let at = self.clock.now();

        let result = if content.trim().is_empty() {
            self.store.delete(&key).await.map(|_| ())
        } else {
            let draft = Draft { content, kind, modified_at: at };
            put_json(self.store.as_ref(), &key, &draft).await
        };

        let status = match result {
            Ok(()) => {
                tracing::debug!(%kind, "Draft saved");
                SaveStatus::Saved { at }
            }
            Err(error) => {
                tracing::warn!(%kind, code = error.code(), "Failed to save draft: {}", error);
                SaveStatus::Failed { error }
            }
        };
        self.status.send_replace(status.clone());
        status
    }
}

/// Debounced draft writer, one timer per input kind
pub struct DraftManager {
    shared: Arc<Shared>,
    debounce: Duration,
    next_generation: AtomicU64,
}

impl DraftManager {
    pub fn new(store: Arc<dyn KeyValueStore>, clock: Arc<dyn Clock>, debounce: Duration) -> Self {
        let (status, _) = watch::channel(SaveStatus::Idle);
        Self {
            shared: Arc::new(Shared {
                store,
                clock,
                pending: Mutex::new(HashMap::new()),
                status,
            }),
            debounce,
            next_generation: AtomicU64::new(0),
        }
    }

    pub fn debounce(&self) -> Duration {
        self.debounce
    }

    /// Record new input for `kind`, restarting its save timer.
    ///
    /// Must be called from within a tokio runtime.
    pub fn on_input_changed(&self, kind: InputKind, content: impl Into<String>) {
        let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);
        let shared = Arc::clone(&self.shared);
        let debounce = self.debounce;

        let mut pending = self.shared.pending();
        if let Some(previous) = pending.remove(&kind) {
            previous.timer.abort();
        }

        let timer = tokio::spawn(async move {
            tokio::time::sleep(debounce).await;
            if let Some(content) = shared.take_if_current(kind, generation) {
                shared.save(kind, content).await;
            }
        });
        pending.insert(kind, PendingSave { generation, content: content.into(), timer });
        drop(pending);

        self.shared.status.send_replace(SaveStatus::Pending);
    }

    /// Save pending input for `kind` now instead of waiting for its timer
    pub async fn flush(&self, kind: InputKind) -> SaveStatus {
        let pending = self.shared.pending().remove(&kind);
        match pending {
            Some(save) => {
                save.timer.abort();
                self.shared.save(kind, save.content).await
            }
            None => self.shared.status.borrow().clone(),
        }
    }

    /// Save pending input for every kind
    pub async fn flush_all(&self) {
        let kinds: Vec<InputKind> = self.shared.pending().keys().copied().collect();
        for kind in kinds {
            self.flush(kind).await;
        }
    }

    /// Stored draft for `kind`, if any
    pub async fn load(&self, kind: InputKind) -> Result<Option<Draft>> {
        get_json(self.shared.store.as_ref(), &kind.storage_key()).await
    }

    /// Draft to offer for restoring, only when the live input is empty
    pub async fn restore_candidate(&self, kind: InputKind, live_input: &str) -> Option<Draft> {
        if !live_input.trim().is_empty() {
            return None;
        }

        match self.load(kind).await {
            Ok(draft) => draft.filter(|d| !d.content.trim().is_empty()),
            Err(error) => {
                tracing::warn!(%kind, "Failed to read draft: {}", error);
                None
            }
        }
    }

    /// Drop pending input and delete the stored draft for `kind`
    pub async fn clear(&self, kind: InputKind) {
        if let Some(save) = self.shared.pending().remove(&kind) {
            save.timer.abort();
        }

        match self.shared.store.delete(&kind.storage_key()).await {
            Ok(_) => {
                tracing::debug!(%kind, "Draft cleared");
                self.shared.status.send_replace(SaveStatus::Idle);
            }
            Err(error) => {
                tracing::warn!(%kind, "Failed to clear draft: {}", error);
                self.shared.status.send_replace(SaveStatus::Failed { error });
            }
        }
    }

    /// Subscribe to save status changes
    pub fn status(&self) -> watch::Receiver<SaveStatus> {
        self.shared.status.subscribe()
    }
}
