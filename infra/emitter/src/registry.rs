use crate::handler::{EntryKey, Invoke};
use fxhash::FxHashMap;
use parking_lot::{Mutex, RwLock};
use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::trace;

struct Entry<T> {
    seq: u64,
    key: EntryKey,
    invoke: Invoke<T>,
}

/// Ordered, identity-keyed entries of a single event type.
///
/// Entries stay sorted by `seq`, which is assigned once on first insertion,
/// so a pass can resume after the last visited entry no matter what was
/// added or removed in between.
pub(crate) struct Handlers<T> {
    entries: Vec<Entry<T>>,
}

impl<T> Default for Handlers<T> {
    fn default() -> Self {
        Self { entries: Vec::new() }
    }
}

impl<T> Handlers<T> {
    /// Replaces the callable in place when `key` is present, appends otherwise.
    /// Returns the replaced callable.
    fn insert(
        &mut self,
        key: EntryKey,
        invoke: Invoke<T>,
        seq: impl FnOnce() -> u64,
    ) -> Option<Invoke<T>> {
        if let Some(entry) = self.entries.iter_mut().find(|e| e.key == key) {
            return Some(std::mem::replace(&mut entry.invoke, invoke));
        }
        self.entries.push(Entry { seq: seq(), key, invoke });
        None
    }

    fn remove(&mut self, key: EntryKey) -> Option<Invoke<T>> {
        let idx = self.entries.iter().position(|e| e.key == key)?;
        Some(self.entries.remove(idx).invoke)
    }

    /// The first entry inserted after `cursor`.
    fn next_after(&self, cursor: u64) -> Option<(u64, Invoke<T>)> {
        let idx = self.entries.partition_point(|e| e.seq <= cursor);
        self.entries.get(idx).map(|e| (e.seq, Arc::clone(&e.invoke)))
    }

    fn take(&mut self) -> Vec<Entry<T>> {
        std::mem::take(&mut self.entries)
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn contains(&self, key: EntryKey) -> bool {
        self.entries.iter().any(|e| e.key == key)
    }
}

pub(crate) type SharedHandlers<T> = Arc<Mutex<Handlers<T>>>;

/// Event type to handler collection mapping shared by every clone of an emitter.
pub(crate) struct Registry<T> {
    name: Cow<'static, str>,
    types: RwLock<FxHashMap<String, SharedHandlers<T>>>,
    next_seq: AtomicU64,
}

impl<T> Registry<T> {
    pub(crate) fn new(name: Cow<'static, str>) -> Self {
        Self {
            name,
            types: RwLock::new(FxHashMap::default()),
            next_seq: AtomicU64::new(1),
        }
    }

    pub(crate) fn name(&self) -> &str {
        &self.name
    }

    /// Returns the live collection for `event_type`, creating it if absent.
    ///
    /// Repeated calls hand out the same collection, never a copy.
    pub(crate) fn handlers_for(&self, event_type: &str) -> SharedHandlers<T> {
        if let Some(existing) = self.existing(event_type) {
            return existing;
        }

        let mut types = self.types.write();
        let handlers = types.entry(event_type.to_owned()).or_insert_with(|| {
            trace!(emitter = %self.name, event_type, "Initializing handler collection");
            Arc::default()
        });
        Arc::clone(handlers)
    }

    /// Returns the collection for `event_type` without creating one.
    pub(crate) fn existing(&self, event_type: &str) -> Option<SharedHandlers<T>> {
        self.types.read().get(event_type).cloned()
    }

    pub(crate) fn add(&self, event_type: &str, key: EntryKey, invoke: Invoke<T>) {
        let handlers = self.handlers_for(event_type);
        let replaced =
            handlers.lock().insert(key, invoke, || self.next_seq.fetch_add(1, Ordering::Relaxed));
        trace!(
            emitter = %self.name,
            event_type,
            replaced = replaced.is_some(),
            "Handler registered"
        );
        // `replaced` is dropped here, outside the lock.
    }

    pub(crate) fn remove(&self, event_type: &str, key: EntryKey) -> bool {
        let Some(handlers) = self.existing(event_type) else {
            return false;
        };
        let removed = handlers.lock().remove(key);
        let found = removed.is_some();
        if found {
            trace!(emitter = %self.name, event_type, "Handler removed");
        }
        drop(removed);
        self.release(event_type, &handlers);
        found
    }

    /// Empties one collection in place so that in-flight passes observe it.
    ///
    /// Returns the number of removed entries.
    pub(crate) fn clear(&self, event_type: &str) -> usize {
        let Some(handlers) = self.existing(event_type) else {
            return 0;
        };
        let removed = handlers.lock().take();
        let count = removed.len();
        drop(removed);
        self.release(event_type, &handlers);
        count
    }

    pub(crate) fn clear_all(&self) -> usize {
        let collections: Vec<(String, SharedHandlers<T>)> =
            self.types.read().iter().map(|(k, v)| (k.clone(), Arc::clone(v))).collect();
        collections
            .iter()
            .map(|(event_type, handlers)| {
                let removed = handlers.lock().take();
                let count = removed.len();
                drop(removed);
                self.release(event_type, handlers);
                count
            })
            .sum()
    }

    /// Drops the map entry of `event_type` when `handlers` is its collection,
    /// holds no entries and is referenced only by the map and the caller.
    ///
    /// A pass in progress keeps its collection alive, so nothing it still
    /// reads is ever detached from the map.
    fn release(&self, event_type: &str, handlers: &SharedHandlers<T>) {
        if handlers.lock().len() > 0 {
            return;
        }

        let mut types = self.types.write();
        let unused = types.get(event_type).is_some_and(|current| {
            Arc::ptr_eq(current, handlers)
                && Arc::strong_count(handlers) == 2
                && handlers.lock().len() == 0
        });
        if unused {
            types.remove(event_type);
            trace!(emitter = %self.name, event_type, "Released empty handler collection");
        }
    }

    /// Invokes every entry of `collection` in insertion order with
    /// `(emitted, payload)`, re-reading the collection before each call.
    ///
    /// Returns the number of invocations.
    pub(crate) fn dispatch(&self, collection: &str, emitted: &str, payload: &T) -> usize {
        let Some(handlers) = self.existing(collection) else {
            return 0;
        };

        let mut cursor = 0;
        let mut invoked = 0;
        loop {
            let next = handlers.lock().next_after(cursor);
            let Some((seq, invoke)) = next else {
                break;
            };
            cursor = seq;
            invoke(emitted, payload);
            invoked += 1;
        }
        self.release(collection, &handlers);
        invoked
    }

    pub(crate) fn len(&self, event_type: &str) -> usize {
        self.existing(event_type).map_or(0, |handlers| handlers.lock().len())
    }

    pub(crate) fn contains(&self, event_type: &str, key: EntryKey) -> bool {
        self.existing(event_type).is_some_and(|handlers| handlers.lock().contains(key))
    }

    pub(crate) fn event_types(&self) -> Vec<String> {
        let collections: Vec<(String, SharedHandlers<T>)> =
            self.types.read().iter().map(|(k, v)| (k.clone(), Arc::clone(v))).collect();
        let mut types: Vec<String> = collections
            .into_iter()
            .filter(|(_, handlers)| handlers.lock().len() > 0)
            .map(|(event_type, _)| event_type)
            .collect();
        types.sort_unstable();
        types
    }

    #[cfg(test)]
    pub(crate) fn collections(&self) -> usize {
        self.types.read().len()
    }
}

impl<T> fmt::Debug for Registry<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("name", &self.name)
            .field("types", &self.types.read().len())
            .finish_non_exhaustive()
    }
}
