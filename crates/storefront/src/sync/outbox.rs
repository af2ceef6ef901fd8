//! Outbound queue of profile pushes.

use std::collections::HashMap;

use serde_json::Value;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info};

use vogue_core::UserId;

use super::ProfileSync;
use crate::profile::{ProfileField, ProfileStore};

enum Job {
    Push {
        user: UserId,
        field: ProfileField,
        value: Value,
    },
    Flush(oneshot::Sender<()>),
}

/// Fire-and-forget queue of profile pushes, served by one background task.
///
/// Pushes run one at a time in enqueue order. Pushes for the same user and
/// field that are waiting together collapse into the latest value, so an
/// older value never lands after a newer one. A failed push is dropped; the
/// next mutation enqueues the current value again.
///
/// Cloning shares the queue. The worker stops once every clone is dropped
/// and the queue is drained.
#[derive(Debug, Clone)]
pub struct SyncOutbox {
    sender: mpsc::UnboundedSender<Job>,
}

impl std::fmt::Debug for Job {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Push { user, field, .. } => f
                .debug_struct("Push")
                .field("user", user)
                .field("field", field)
                .finish_non_exhaustive(),
            Self::Flush(_) => f.write_str("Flush"),
        }
    }
}

impl SyncOutbox {
    /// Spawn the worker task on the current tokio runtime.
    #[must_use]
    pub fn spawn<P>(sync: ProfileSync<P>) -> Self
    where
        P: ProfileStore + 'static,
    {
        let (sender, receiver) = mpsc::unbounded_channel();
        tokio::spawn(run(sync, receiver));
        Self { sender }
    }

    /// Queue a push of `value` to the user's `field`. Returns `false` if the
    /// worker is gone.
    pub fn enqueue(&self, user: &UserId, field: ProfileField, value: Value) -> bool {
        let sent = self
            .sender
            .send(Job::Push {
                user: user.clone(),
                field,
                value,
            })
            .is_ok();
        if !sent {
            debug!(user_id = %user, %field, "Sync outbox closed, dropping push");
        }
        sent
    }

    /// Wait until every push queued before this call has been attempted.
    pub async fn flush(&self) {
        let (done, wait) = oneshot::channel();
        if self.sender.send(Job::Flush(done)).is_ok() {
            // A closed worker has nothing left to attempt
            let _ = wait.await;
        }
    }
}

async fn run<P: ProfileStore>(sync: ProfileSync<P>, mut receiver: mpsc::UnboundedReceiver<Job>) {
    info!("Sync outbox started");

    while let Some(job) = receiver.recv().await {
        let mut batch = vec![job];
        while let Ok(job) = receiver.try_recv() {
            batch.push(job);
        }
        process_batch(&sync, batch).await;
    }

    info!("Sync outbox stopped (channel closed)");
}

/// Push a drained batch. Flush markers split the batch; within each segment
/// pushes to the same user and field collapse into the last value.
async fn process_batch<P: ProfileStore>(sync: &ProfileSync<P>, batch: Vec<Job>) {
    let mut pending: Vec<(UserId, ProfileField, Value)> = Vec::new();
    let mut slots: HashMap<(UserId, ProfileField), usize> = HashMap::new();

    for job in batch {
        match job {
            Job::Push { user, field, value } => match slots.get(&(user.clone(), field)) {
                Some(&slot) => {
                    if let Some(entry) = pending.get_mut(slot) {
                        entry.2 = value;
                    }
                    debug!(user_id = %user, %field, "Coalesced queued push");
                }
                None => {
                    slots.insert((user.clone(), field), pending.len());
                    pending.push((user, field, value));
                }
            },
            Job::Flush(done) => {
                push_all(sync, &mut pending).await;
                slots.clear();
                let _ = done.send(());
            }
        }
    }

    push_all(sync, &mut pending).await;
}

async fn push_all<P: ProfileStore>(
    sync: &ProfileSync<P>,
    pending: &mut Vec<(UserId, ProfileField, Value)>,
) {
    for (user, field, value) in pending.drain(..) {
        sync.push(&user, field, &value).await;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::profile::{AuthenticatedUser, MemoryProfileStore};

    async fn setup() -> (MemoryProfileStore, SyncOutbox, UserId) {
        let store = MemoryProfileStore::new();
        let sync = ProfileSync::new(store.clone());
        let user = AuthenticatedUser::new("uid-1");
        assert!(sync.ensure_profile(&user).await);
        (store, SyncOutbox::spawn(sync), user.id)
    }

    #[tokio::test]
    async fn test_last_value_wins() {
        let (store, outbox, user) = setup().await;
        for n in 1..=5 {
            assert!(outbox.enqueue(&user, ProfileField::Wishlist, json!([n])));
        }
        outbox.flush().await;

        assert_eq!(store.field(&user, ProfileField::Wishlist), Some(json!([5])));
        let writes = store.writes();
        assert!(!writes.is_empty() && writes.len() <= 5);
        assert_eq!(writes.last().map(|w| w.2.clone()), Some(json!([5])));
    }

    #[tokio::test]
    async fn test_fields_are_independent() {
        let (store, outbox, user) = setup().await;
        outbox.enqueue(&user, ProfileField::Cart, json!([{"id": 1, "name": "Coat", "price": 5}]));
        outbox.enqueue(&user, ProfileField::Wishlist, json!([2]));
        outbox.flush().await;

        assert_eq!(store.field(&user, ProfileField::Wishlist), Some(json!([2])));
        assert_eq!(
            store
                .field(&user, ProfileField::Cart)
                .and_then(|cart| cart.as_array().map(Vec::len)),
            Some(1)
        );
    }

    #[tokio::test]
    async fn test_failed_push_is_dropped_not_retried() {
        let (store, outbox, user) = setup().await;
        store.set_fail_writes(true);
        outbox.enqueue(&user, ProfileField::Wishlist, json!([1]));
        outbox.flush().await;
        store.set_fail_writes(false);
        outbox.flush().await;

        assert_eq!(store.field(&user, ProfileField::Wishlist), Some(json!([])));
        assert!(store.writes().is_empty());

        outbox.enqueue(&user, ProfileField::Wishlist, json!([1, 2]));
        outbox.flush().await;
        assert_eq!(store.field(&user, ProfileField::Wishlist), Some(json!([1, 2])));
    }

    #[tokio::test]
    async fn test_coalesce_within_batch() {
        let store = MemoryProfileStore::new();
        let sync = ProfileSync::new(store.clone());
        let user = AuthenticatedUser::new("uid-1");
        sync.ensure_profile(&user).await;

        let push = |field, value| Job::Push {
            user: user.id.clone(),
            field,
            value,
        };
        let batch = vec![
            push(ProfileField::Cart, json!([])),
            push(ProfileField::Wishlist, json!([1])),
            push(ProfileField::Wishlist, json!([1, 2])),
        ];
        process_batch(&sync, batch).await;

        let fields: Vec<_> = store.writes().into_iter().map(|w| (w.1, w.2)).collect();
        assert_eq!(
            fields,
            vec![
                (ProfileField::Cart, json!([])),
                (ProfileField::Wishlist, json!([1, 2])),
            ]
        );
    }
}
