//! Event wait-list validation for enqueue-style entry points.
//!
//! The caller hands over `(num_events_in_wait_list, event_wait_list)`. The
//! pair is checked for consistency, then every handle is resolved to a live
//! event owned by the context of the operation being built. Resolution is
//! all-or-nothing: on the first bad entry (in caller order) the partial list
//! is dropped and only the error is returned.

use crate::abi::cl_uint;
use crate::error::{EntryError, EntryResult};
use std::fmt::Debug;
use std::sync::Arc;

/// An object that belongs to exactly one context.
pub trait ContextBound {
    type ContextId: PartialEq + Copy + Debug;

    fn context_id(&self) -> Self::ContextId;
}

/// Collaborator seam: turn caller handles into live event objects.
///
/// `resolve` must return `None` for anything that is not a currently live
/// event (null, released, or a handle of another object kind).
pub trait EventLookup {
    type Handle: Copy + Debug;
    type Event: ContextBound;

    fn resolve(&self, handle: Self::Handle) -> Option<Arc<Self::Event>>;
}

/// Resolved dependencies in caller order.
#[derive(Debug)]
pub struct WaitList<E> {
    events: Vec<Arc<E>>,
}

impl<E> WaitList<E> {
    pub fn empty() -> Self {
        WaitList { events: Vec::new() }
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Arc<E>> {
        self.events.iter()
    }

    pub fn into_inner(self) -> Vec<Arc<E>> {
        self.events
    }
}

impl<E> Default for WaitList<E> {
    fn default() -> Self {
        WaitList::empty()
    }
}

impl<'a, E> IntoIterator for &'a WaitList<E> {
    type Item = &'a Arc<E>;
    type IntoIter = std::slice::Iter<'a, Arc<E>>;

    fn into_iter(self) -> Self::IntoIter {
        self.events.iter()
    }
}

/// Validate the `(count, pointer)` pairing and view the handles as a slice.
///
/// # Safety
///
/// When `count > 0` and `ptr` is non-null, `ptr` must be valid for reads of
/// `count` handles for `'a`.
pub unsafe fn wait_list_handles<'a, H>(count: cl_uint, ptr: *const H) -> EntryResult<&'a [H]> {
    match (count, ptr.is_null()) {
        (0, true) => Ok(&[]),
        (0, false) | (_, true) => {
            tracing::debug!(count, null = ptr.is_null(), "malformed event wait list");
            Err(EntryError::InvalidEventWaitList)
        }
        (n, false) => Ok(unsafe { std::slice::from_raw_parts(ptr, n as usize) }),
    }
}

/// Resolve every handle against `lookup`, requiring all events to belong to
/// `context`.
pub fn resolve_wait_list<L>(
    lookup: &L,
    context: <L::Event as ContextBound>::ContextId,
    handles: &[L::Handle],
) -> EntryResult<WaitList<L::Event>>
where
    L: EventLookup + ?Sized,
{
    let mut events = Vec::with_capacity(handles.len());
    for (index, &handle) in handles.iter().enumerate() {
        let Some(event) = lookup.resolve(handle) else {
            tracing::debug!(index, ?handle, "wait list entry is not a live event");
            return Err(EntryError::InvalidEventWaitList);
        };
        if event.context_id() != context {
            tracing::debug!(
                index,
                ?handle,
                expected = ?context,
                found = ?event.context_id(),
                "wait list entry belongs to another context"
            );
            return Err(EntryError::InvalidContext);
        }
        events.push(event);
    }
    Ok(WaitList { events })
}

/// Combined pairing check and resolution, as called from enqueue entry points.
///
/// # Safety
///
/// Same contract as [`wait_list_handles`].
pub unsafe fn set_event_wait_list<L>(
    lookup: &L,
    context: <L::Event as ContextBound>::ContextId,
    num_events_in_wait_list: cl_uint,
    event_wait_list: *const L::Handle,
) -> EntryResult<WaitList<L::Event>>
where
    L: EventLookup + ?Sized,
{
    let handles = unsafe { wait_list_handles(num_events_in_wait_list, event_wait_list)? };
    resolve_wait_list(lookup, context, handles)
}
