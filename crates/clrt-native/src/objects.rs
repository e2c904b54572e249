//! Host-side objects behind the context, queue and event handles.
//!
//! These stand in for the runtime's object layer: they carry reference counts
//! and ownership links, and nothing else. Handle validity is "present in the
//! table"; the count reaching zero removes the handle.

use clrt_entry::abi::*;
use clrt_entry::handle::{id_to_raw, raw_to_id};
use clrt_entry::wait_list::{ContextBound, EventLookup};
use clrt_entry::{ContextProperties, EntryError, EntryResult, HandleTable};
use once_cell::sync::OnceCell;
use std::sync::atomic::{AtomicI32, AtomicU32, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

/// Object reference count. Once it reaches zero it stays there.
#[derive(Debug)]
pub struct RefCount(AtomicU32);

impl RefCount {
    fn new() -> Self {
        RefCount(AtomicU32::new(1))
    }

    pub fn get(&self) -> cl_uint {
        self.0.load(Ordering::Acquire)
    }

    /// False when the object is already dead.
    fn retain(&self) -> bool {
        self.0
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| {
                if n == 0 {
                    None
                } else {
                    n.checked_add(1)
                }
            })
            .is_ok()
    }

    /// `Some(true)` when this release dropped the last reference, `None` when
    /// there was nothing left to release.
    fn release(&self) -> Option<bool> {
        self.0
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1))
            .ok()
            .map(|prev| prev == 1)
    }
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Debug)]
pub struct Context {
    pub properties: ContextProperties,
    pub refs: RefCount,
}

#[derive(Debug)]
pub struct CommandQueue {
    pub context_id: u64,
    pub properties: cl_command_queue_properties,
    pub refs: RefCount,
    submitted: Mutex<Vec<Arc<Event>>>,
}

impl CommandQueue {
    pub fn in_order(&self) -> bool {
        self.properties & CL_QUEUE_OUT_OF_ORDER_EXEC_MODE_ENABLE == 0
    }

    /// Build a command behind `wait_list` and record it on the queue.
    ///
    /// In-order queues chain every command to its predecessor. Out-of-order
    /// queues give a command with an empty wait list every pending command as
    /// a dependency. Nothing is recorded when `publish` fails.
    pub fn enqueue<F>(
        &self,
        queue_id: u64,
        command_type: cl_command_type,
        wait_list: Vec<Arc<Event>>,
        publish: F,
    ) -> EntryResult<Arc<Event>>
    where
        F: FnOnce(&Arc<Event>) -> EntryResult<()>,
    {
        let mut submitted = lock(&self.submitted);
        submitted.retain(|e| e.is_pending());

        let mut dependencies = wait_list;
        if self.in_order() {
            dependencies.extend(submitted.last().cloned());
        } else if dependencies.is_empty() {
            dependencies.extend(submitted.iter().cloned());
        }

        let command = Event::command(self.context_id, queue_id, command_type, dependencies);
        publish(&command)?;
        if command.is_pending() {
            submitted.push(Arc::clone(&command));
        }
        Ok(command)
    }
}

/// A user event or a recorded command.
///
/// A command settles when its last dependency completes or its first one
/// fails. Settling wakes the commands waiting on it; statuses are stored, so
/// reading one never walks the dependency graph.
#[derive(Debug)]
pub struct Event {
    pub context_id: u64,
    /// 0 for user events.
    pub queue_id: u64,
    pub command_type: cl_command_type,
    pub refs: RefCount,
    status: AtomicI32,
    dependency_count: usize,
    /// Dependencies not yet complete, plus one while the command is built.
    unresolved: AtomicUsize,
    /// Held until the command settles.
    dependencies: Mutex<Vec<Arc<Event>>>,
    waiters: Mutex<Vec<Weak<Event>>>,
}

impl Event {
    pub fn user(context_id: u64) -> Event {
        Event {
            context_id,
            queue_id: 0,
            command_type: CL_COMMAND_USER,
            refs: RefCount::new(),
            status: AtomicI32::new(CL_SUBMITTED),
            dependency_count: 0,
            unresolved: AtomicUsize::new(0),
            dependencies: Mutex::new(Vec::new()),
            waiters: Mutex::new(Vec::new()),
        }
    }

    pub fn command(
        context_id: u64,
        queue_id: u64,
        command_type: cl_command_type,
        dependencies: Vec<Arc<Event>>,
    ) -> Arc<Event> {
        let count = dependencies.len();
        let command = Arc::new(Event {
            context_id,
            queue_id,
            command_type,
            refs: RefCount::new(),
            status: AtomicI32::new(CL_QUEUED),
            dependency_count: count,
            unresolved: AtomicUsize::new(count + 1),
            dependencies: Mutex::new(Vec::new()),
            waiters: Mutex::new(Vec::new()),
        });

        *lock(&command.dependencies) = dependencies.clone();
        let mut failed = false;
        let mut done = 0usize;
        for dep in &dependencies {
            match dep.watch(&command) {
                Some(status) if status < 0 => failed = true,
                Some(_) => done += 1,
                None => {}
            }
        }

        // Nobody else holds the command yet, so there is no one to wake.
        if failed {
            command.settle(CL_EXEC_STATUS_ERROR_FOR_EVENTS_IN_WAIT_LIST);
        } else if command.unresolved.fetch_sub(done + 1, Ordering::AcqRel) == done + 1 {
            command.settle(CL_COMPLETE);
        }
        command
    }

    pub fn is_user(&self) -> bool {
        self.command_type == CL_COMMAND_USER
    }

    pub fn execution_status(&self) -> cl_int {
        self.status.load(Ordering::Acquire)
    }

    pub fn is_pending(&self) -> bool {
        self.execution_status() > CL_COMPLETE
    }

    pub fn dependency_count(&self) -> usize {
        self.dependency_count
    }

    /// Set a user event's final status. Only the first call succeeds.
    pub fn set_user_status(&self, status: cl_int) -> EntryResult<()> {
        let woken = self.settle(status).ok_or(EntryError::InvalidOperation)?;
        wake(woken, status);
        Ok(())
    }

    /// Register `waiter`, or return this event's status if it has settled.
    fn watch(&self, waiter: &Arc<Event>) -> Option<cl_int> {
        let mut waiters = lock(&self.waiters);
        let status = self.execution_status();
        if status <= CL_COMPLETE {
            return Some(status);
        }
        waiters.retain(|w| w.strong_count() > 0);
        waiters.push(Arc::downgrade(waiter));
        None
    }

    /// Move to a final status. Returns the waiters to wake when this call
    /// made the transition.
    fn settle(&self, status: cl_int) -> Option<Vec<Weak<Event>>> {
        let pending = if self.is_user() { CL_SUBMITTED } else { CL_QUEUED };
        let mut waiters = lock(&self.waiters);
        self.status
            .compare_exchange(pending, status, Ordering::AcqRel, Ordering::Acquire)
            .ok()?;
        let woken = std::mem::take(&mut *waiters);
        drop(waiters);
        lock(&self.dependencies).clear();
        Some(woken)
    }

    /// Account for one dependency settling with `status`.
    fn dependency_settled(&self, status: cl_int) -> Option<Vec<Weak<Event>>> {
        if status < 0 {
            self.settle(CL_EXEC_STATUS_ERROR_FOR_EVENTS_IN_WAIT_LIST)
        } else if self.unresolved.fetch_sub(1, Ordering::AcqRel) == 1 {
            self.settle(CL_COMPLETE)
        } else {
            None
        }
    }
}

/// Propagate a settled status through the waiting commands without recursing.
fn wake(woken: Vec<Weak<Event>>, status: cl_int) {
    let mut work: Vec<(Weak<Event>, cl_int)> = woken.into_iter().map(|w| (w, status)).collect();
    while let Some((waiter, status)) = work.pop() {
        let Some(waiter) = waiter.upgrade() else {
            continue;
        };
        if let Some(next) = waiter.dependency_settled(status) {
            let settled = waiter.execution_status();
            work.extend(next.into_iter().map(|w| (w, settled)));
        }
    }
}

impl Drop for Event {
    fn drop(&mut self) {
        // Unwind dependency chains here instead of through nested drops.
        let deps = self.dependencies.get_mut().unwrap_or_else(PoisonError::into_inner);
        let mut pending = std::mem::take(deps);
        while let Some(dep) = pending.pop() {
            if let Ok(mut dep) = Arc::try_unwrap(dep) {
                pending.append(dep.dependencies.get_mut().unwrap_or_else(PoisonError::into_inner));
            }
        }
    }
}

impl ContextBound for Event {
    type ContextId = u64;

    fn context_id(&self) -> u64 {
        self.context_id
    }
}

static CONTEXTS: OnceCell<HandleTable<Context>> = OnceCell::new();
static QUEUES: OnceCell<HandleTable<CommandQueue>> = OnceCell::new();
static EVENTS: OnceCell<HandleTable<Event>> = OnceCell::new();

fn max_live() -> usize {
    clrt_entry::policy().max_live_objects as usize
}

pub fn contexts() -> &'static HandleTable<Context> {
    CONTEXTS.get_or_init(|| HandleTable::new("context", max_live()))
}

pub fn queues() -> &'static HandleTable<CommandQueue> {
    QUEUES.get_or_init(|| HandleTable::new("command_queue", max_live()))
}

pub fn events() -> &'static HandleTable<Event> {
    EVENTS.get_or_init(|| HandleTable::new("event", max_live()))
}

pub fn context(handle: cl_context) -> EntryResult<Arc<Context>> {
    contexts()
        .get(raw_to_id(handle))
        .ok_or(EntryError::InvalidContext)
}

pub fn queue(handle: cl_command_queue) -> EntryResult<Arc<CommandQueue>> {
    queues()
        .get(raw_to_id(handle))
        .ok_or(EntryError::InvalidCommandQueue)
}

pub fn event(handle: cl_event) -> EntryResult<Arc<Event>> {
    events().get(raw_to_id(handle)).ok_or(EntryError::InvalidEvent)
}

/// Wait-list lookup over the live event table.
pub struct LiveEvents;

impl EventLookup for LiveEvents {
    type Handle = cl_event;
    type Event = Event;

    fn resolve(&self, handle: cl_event) -> Option<Arc<Event>> {
        events().get(raw_to_id(handle))
    }
}

/// Drop one reference to the object `id` in `table`. Returns the object when
/// that was its last reference; it is no longer in the table by then.
fn release_in<T>(
    table: &HandleTable<T>,
    id: u64,
    refs: impl Fn(&T) -> &RefCount,
    invalid: EntryError,
) -> EntryResult<Option<Arc<T>>> {
    let obj = table.get(id).ok_or(invalid)?;
    match refs(&obj).release() {
        None => Err(invalid),
        Some(false) => Ok(None),
        Some(true) => {
            table.remove(id);
            Ok(Some(obj))
        }
    }
}

fn retain_in<T>(
    table: &HandleTable<T>,
    id: u64,
    refs: impl Fn(&T) -> &RefCount,
    invalid: EntryError,
) -> EntryResult<()> {
    let obj = table.get(id).ok_or(invalid)?;
    if refs(&obj).retain() {
        Ok(())
    } else {
        tracing::debug!(kind = table.kind(), id, "retain of a dying object");
        Err(invalid)
    }
}

/// Log an owning object's release that failed during a cascade.
fn cascade<T>(table: &HandleTable<T>, id: u64, res: EntryResult<()>) {
    if let Err(err) = res {
        tracing::debug!(kind = table.kind(), id, %err, "owning object release failed");
    }
}

fn retain_context_id(id: u64) -> EntryResult<()> {
    retain_in(contexts(), id, |c| &c.refs, EntryError::InvalidContext)
}

fn release_context_id(id: u64) -> EntryResult<()> {
    release_in(contexts(), id, |c| &c.refs, EntryError::InvalidContext).map(drop)
}

fn retain_queue_id(id: u64) -> EntryResult<()> {
    retain_in(queues(), id, |q| &q.refs, EntryError::InvalidCommandQueue)
}

fn release_queue_id(id: u64) -> EntryResult<()> {
    let released = release_in(queues(), id, |q| &q.refs, EntryError::InvalidCommandQueue)?;
    if let Some(q) = released {
        cascade(contexts(), q.context_id, release_context_id(q.context_id));
    }
    Ok(())
}

pub fn create_context(properties: ContextProperties) -> EntryResult<cl_context> {
    let ctx = Arc::new(Context {
        properties,
        refs: RefCount::new(),
    });
    contexts().insert(ctx).map(id_to_raw)
}

pub fn create_queue(
    context_id: u64,
    properties: cl_command_queue_properties,
) -> EntryResult<cl_command_queue> {
    retain_context_id(context_id)?;
    let queue = Arc::new(CommandQueue {
        context_id,
        properties,
        refs: RefCount::new(),
        submitted: Mutex::new(Vec::new()),
    });
    match queues().insert(queue) {
        Ok(id) => Ok(id_to_raw(id)),
        Err(err) => {
            cascade(contexts(), context_id, release_context_id(context_id));
            Err(err)
        }
    }
}

/// Publish an event under a new handle; the event keeps its context (and
/// queue, for commands) alive. On failure no reference is left behind.
pub fn publish_event(event: Arc<Event>) -> EntryResult<cl_event> {
    let context_id = event.context_id;
    let queue_id = event.queue_id;
    retain_context_id(context_id)?;
    if queue_id != 0 {
        if let Err(err) = retain_queue_id(queue_id) {
            cascade(contexts(), context_id, release_context_id(context_id));
            return Err(err);
        }
    }
    match events().insert(event) {
        Ok(id) => Ok(id_to_raw(id)),
        Err(err) => {
            if queue_id != 0 {
                cascade(queues(), queue_id, release_queue_id(queue_id));
            }
            cascade(contexts(), context_id, release_context_id(context_id));
            Err(err)
        }
    }
}

pub fn retain_context(handle: cl_context) -> EntryResult<()> {
    retain_context_id(raw_to_id(handle))
}

pub fn release_context(handle: cl_context) -> EntryResult<()> {
    release_context_id(raw_to_id(handle))
}

pub fn retain_queue(handle: cl_command_queue) -> EntryResult<()> {
    retain_queue_id(raw_to_id(handle))
}

pub fn release_queue(handle: cl_command_queue) -> EntryResult<()> {
    release_queue_id(raw_to_id(handle))
}

pub fn retain_event(handle: cl_event) -> EntryResult<()> {
    retain_in(events(), raw_to_id(handle), |e| &e.refs, EntryError::InvalidEvent)
}

pub fn release_event(handle: cl_event) -> EntryResult<()> {
    let released = release_in(events(), raw_to_id(handle), |e| &e.refs, EntryError::InvalidEvent)?;
    if let Some(ev) = released {
        if ev.queue_id != 0 {
            cascade(queues(), ev.queue_id, release_queue_id(ev.queue_id));
        }
        cascade(contexts(), ev.context_id, release_context_id(ev.context_id));
    }
    Ok(())
}
