//! Live-object tables behind opaque API handles.
//!
//! A handle is a table id cast to a pointer type. Ids start at 1 and are never
//! reused, so a released handle can never resolve again and a null handle
//! never resolves at all. Caller-supplied handles are only ever used as keys;
//! they are not dereferenced.

use crate::error::{EntryError, EntryResult};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

pub struct HandleTable<T> {
    kind: &'static str,
    max_live: usize,
    next_id: AtomicU64,
    live: Mutex<HashMap<u64, Arc<T>>>,
}

impl<T> HandleTable<T> {
    pub fn new(kind: &'static str, max_live: usize) -> Self {
        HandleTable {
            kind,
            max_live,
            next_id: AtomicU64::new(1),
            live: Mutex::new(HashMap::new()),
        }
    }

    pub fn kind(&self) -> &'static str {
        self.kind
    }

    pub fn insert(&self, obj: Arc<T>) -> EntryResult<u64> {
        let Ok(mut live) = self.live.lock() else {
            return Err(EntryError::OutOfHostMemory);
        };
        if live.len() >= self.max_live {
            tracing::debug!(kind = self.kind, max_live = self.max_live, "handle table full");
            return Err(EntryError::OutOfHostMemory);
        }
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        live.insert(id, obj);
        Ok(id)
    }

    pub fn get(&self, id: u64) -> Option<Arc<T>> {
        if id == 0 {
            return None;
        }
        let live = self.live.lock().ok()?;
        live.get(&id).cloned()
    }

    pub fn remove(&self, id: u64) -> Option<Arc<T>> {
        let mut live = self.live.lock().ok()?;
        live.remove(&id)
    }
}

pub fn id_to_raw<O>(id: u64) -> *mut O {
    id as usize as *mut O
}

pub fn raw_to_id<O>(raw: *const O) -> u64 {
    raw as usize as u64
}
