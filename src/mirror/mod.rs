//! Local mirror of a remote collection, fed by a polling subscription.
//!
//! The document store's REST surface has no push channel, so the change
//! stream is a periodic full listing. Every listing carries a sequence number;
//! the mirror applies a snapshot only if it is newer than the last one applied
//! and its version differs, then replaces the whole list.

use crate::backend::{BackendError, DocumentStore, Snapshot};
use crate::models::{Doc, Entity};
use crate::state::Session;
use leptos::prelude::*;
use leptos::task::spawn_local;
use leptos_dom::helpers::set_interval_with_handle;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

pub(crate) struct RecordMirror<E> {
    docs: Vec<Doc<E>>,
    version: Option<u64>,
    applied_seq: u64,
}

impl<E: Entity> Default for RecordMirror<E> {
    fn default() -> Self {
        Self {
            docs: Vec::new(),
            version: None,
            applied_seq: 0,
        }
    }
}

impl<E: Entity> RecordMirror<E> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn docs(&self) -> &[Doc<E>] {
        &self.docs
    }

    /// Folds a snapshot into the mirror. Returns true when the list changed.
    pub fn apply(&mut self, seq: u64, snapshot: Snapshot<E>) -> bool {
        if seq <= self.applied_seq {
            tracing::debug!(
                collection = E::COLLECTION,
                seq,
                applied = self.applied_seq,
                "dropping stale snapshot"
            );
            return false;
        }
        self.applied_seq = seq;

        if self.version == Some(snapshot.version) {
            return false;
        }
        self.version = Some(snapshot.version);
        self.docs = dedup_by_id(snapshot.docs);
        true
    }

    /// Subscription errors leave the last known list in place.
    pub fn fail(&self, seq: u64, err: &BackendError) {
        tracing::error!(
            collection = E::COLLECTION,
            seq,
            error = %err,
            kept = self.docs.len(),
            "snapshot listing failed"
        );
    }
}

/// At most one entry per identifier: first position, last value.
fn dedup_by_id<E>(docs: Vec<Doc<E>>) -> Vec<Doc<E>> {
    let mut index: HashMap<String, usize> = HashMap::with_capacity(docs.len());
    let mut out: Vec<Doc<E>> = Vec::with_capacity(docs.len());
    for doc in docs {
        match index.get(&doc.id) {
            Some(&i) => out[i] = doc,
            None => {
                index.insert(doc.id.clone(), out.len());
                out.push(doc);
            }
        }
    }
    out
}

/// Live subscription guard. Released explicitly or on drop; after release,
/// late listing responses are discarded.
pub(crate) struct Subscription {
    active: Arc<AtomicBool>,
    cancel: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl Subscription {
    pub fn new(active: Arc<AtomicBool>, cancel: impl FnOnce() + Send + Sync + 'static) -> Self {
        active.store(true, Ordering::SeqCst);
        Self {
            active,
            cancel: Some(Box::new(cancel)),
        }
    }

    pub fn release(&mut self) {
        self.active.store(false, Ordering::SeqCst);
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release();
    }
}

/// Reactive side of a mounted mirror.
pub(crate) struct MirrorHandle<E: Entity> {
    pub docs: RwSignal<Vec<Doc<E>>>,
    /// Re-lists immediately (used after local writes).
    pub refresh: Callback<()>,
}

impl<E: Entity> Clone for MirrorHandle<E> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<E: Entity> Copy for MirrorHandle<E> {}

/// Opens the collection's subscription for the lifetime of the current
/// reactive owner.
pub(crate) fn use_record_mirror<E: Entity>(session: Session) -> MirrorHandle<E> {
    let docs: RwSignal<Vec<Doc<E>>> = RwSignal::new(Vec::new());
    let mirror = StoredValue::new(RecordMirror::<E>::new());
    let next_seq = StoredValue::new(0u64);
    let active = Arc::new(AtomicBool::new(false));

    let poll = {
        let active = active.clone();
        move || {
            if !active.load(Ordering::SeqCst) {
                return;
            }
            let Some(seq) = next_seq.try_update_value(|n| {
                *n += 1;
                *n
            }) else {
                return;
            };

            let store = session.document_store();
            let active = active.clone();
            spawn_local(async move {
                let result = store.list::<E>().await;
                if !active.load(Ordering::SeqCst) {
                    return;
                }

                match result {
                    Ok(snapshot) => {
                        let changed = mirror
                            .try_update_value(|m| m.apply(seq, snapshot))
                            .unwrap_or(false);
                        if changed {
                            if let Some(list) = mirror.try_with_value(|m| m.docs().to_vec()) {
                                docs.set(list);
                            }
                        }
                    }
                    Err(e) => {
                        mirror.try_with_value(|m| m.fail(seq, &e));
                        if e.needs_reauth() {
                            session.renew_or_sign_out();
                        }
                    }
                }
            });
        }
    };

    let interval_ms = session.config().poll_interval_ms;
    let handle = set_interval_with_handle(poll.clone(), Duration::from_millis(interval_ms as u64))
        .map_err(|e| tracing::error!(collection = E::COLLECTION, error = ?e, "polling timer failed"))
        .ok();
    let subscription = Subscription::new(active, move || {
        if let Some(h) = handle {
            h.clear();
        }
    });
    tracing::debug!(collection = E::COLLECTION, interval_ms, "subscription opened");

    let subscription = StoredValue::new(Some(subscription));
    on_cleanup(move || {
        subscription.update_value(|s| {
            if let Some(mut s) = s.take() {
                s.release();
            }
        });
        tracing::debug!(collection = E::COLLECTION, "subscription released");
    });

    poll();

    MirrorHandle {
        docs,
        refresh: Callback::new(move |_| poll()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::memory::MemoryBackend;
    use crate::models::Client;
    use futures::executor::block_on;
    use std::sync::atomic::AtomicUsize;

    fn client(id: &str, nombre: &str) -> Doc<Client> {
        Doc::new(
            id,
            Client {
                nombre: nombre.to_string(),
                ..Default::default()
            },
        )
    }

    fn snapshot(version: u64, docs: Vec<Doc<Client>>) -> Snapshot<Client> {
        Snapshot { docs, version }
    }

    #[test]
    fn test_snapshot_replaces_whole_list() {
        let mut m = RecordMirror::<Client>::new();
        assert!(m.apply(1, snapshot(1, vec![client("a", "Ana"), client("b", "Bruno")])));
        assert_eq!(m.docs().len(), 2);

        assert!(m.apply(2, snapshot(2, vec![client("b", "Bruno")])));
        assert_eq!(m.docs(), &[client("b", "Bruno")]);
    }

    #[test]
    fn test_stale_and_unchanged_snapshots_are_ignored() {
        let mut m = RecordMirror::<Client>::new();
        assert!(m.apply(3, snapshot(7, vec![client("a", "Ana")])));

        // Older request answered late.
        assert!(!m.apply(2, snapshot(6, vec![])));
        assert_eq!(m.docs().len(), 1);

        // Same version re-delivered.
        assert!(!m.apply(4, snapshot(7, vec![client("a", "Ana")])));
    }

    #[test]
    fn test_one_entry_per_identifier() {
        let mut m = RecordMirror::<Client>::new();
        m.apply(
            1,
            snapshot(
                1,
                vec![client("a", "Ana"), client("b", "Bruno"), client("a", "Ana Maria")],
            ),
        );
        assert_eq!(m.docs(), &[client("a", "Ana Maria"), client("b", "Bruno")]);
    }

    #[test]
    fn test_failure_keeps_last_known_list() {
        let backend = MemoryBackend::new();
        backend.insert("a", &Client::default());
        let mut m = RecordMirror::<Client>::new();

        let first = block_on(backend.list::<Client>()).expect("list should succeed");
        assert!(m.apply(1, first));

        backend.fail_lists(true);
        let err = block_on(backend.list::<Client>()).expect_err("list should fail");
        m.fail(2, &err);
        assert_eq!(m.docs().len(), 1);
    }

    #[test]
    fn test_mirror_follows_remote_writes() {
        let backend = MemoryBackend::new();
        let mut m = RecordMirror::<Client>::new();
        m.apply(1, block_on(backend.list::<Client>()).expect("list"));
        assert!(m.docs().is_empty());

        let id = block_on(backend.create(&Client {
            nombre: "Ana".to_string(),
            ..Default::default()
        }))
        .expect("create");
        assert!(m.apply(2, block_on(backend.list::<Client>()).expect("list")));
        assert_eq!(m.docs().len(), 1);
        assert_eq!(m.docs()[0].id, id);

        block_on(backend.remove::<Client>(&id)).expect("remove");
        assert!(m.apply(3, block_on(backend.list::<Client>()).expect("list")));
        assert!(m.docs().is_empty());
    }

    #[test]
    fn test_subscription_releases_once() {
        let cancelled = Arc::new(AtomicUsize::new(0));
        let active = Arc::new(AtomicBool::new(false));

        let counter = cancelled.clone();
        let mut sub = Subscription::new(active.clone(), move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        assert!(active.load(Ordering::SeqCst));

        sub.release();
        sub.release();
        drop(sub);

        assert!(!active.load(Ordering::SeqCst));
        assert_eq!(cancelled.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_subscription_released_on_drop() {
        let cancelled = Arc::new(AtomicUsize::new(0));
        let active = Arc::new(AtomicBool::new(false));
        {
            let counter = cancelled.clone();
            let _sub = Subscription::new(active.clone(), move || {
                counter.fetch_add(1, Ordering::SeqCst);
            });
        }
        assert!(!active.load(Ordering::SeqCst));
        assert_eq!(cancelled.load(Ordering::SeqCst), 1);
    }
}
