//! Per-thread runtime attachment.
//!
//! Every entry point runs [`ensure_attached`] before touching any other state.
//! The first call on an OS thread allocates a [`HostThread`] and stores it in
//! the thread-local slot; later calls find it there and return immediately.
//! The slot is released by thread teardown, never by this crate.

use crate::abi::{cl_int, CL_SUCCESS};
use crate::error::{EntryError, EntryResult};
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_SERIAL: AtomicU64 = AtomicU64::new(1);
static ATTACHED_THREADS: AtomicU64 = AtomicU64::new(0);

thread_local! {
    static CURRENT: RefCell<Option<Rc<HostThread>>> = const { RefCell::new(None) };
}

#[cfg(test)]
thread_local! {
    static REFUSE_ATTACH: Cell<bool> = const { Cell::new(false) };
}

#[cfg(test)]
fn attach_refused() -> bool {
    REFUSE_ATTACH.with(Cell::get)
}

#[cfg(not(test))]
fn attach_refused() -> bool {
    false
}

/// The runtime's record of an OS thread that has called into the API.
#[derive(Debug)]
pub struct HostThread {
    serial: u64,
    name: Option<String>,
    last_error: Cell<cl_int>,
}

impl HostThread {
    fn new() -> HostThread {
        HostThread {
            serial: NEXT_SERIAL.fetch_add(1, Ordering::Relaxed),
            name: std::thread::current().name().map(str::to_owned),
            last_error: Cell::new(CL_SUCCESS),
        }
    }

    /// The calling thread's context, without attaching one.
    pub fn current() -> Option<Rc<HostThread>> {
        CURRENT
            .try_with(|slot| slot.try_borrow().ok().and_then(|s| s.clone()))
            .ok()
            .flatten()
    }

    pub fn serial(&self) -> u64 {
        self.serial
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn record_error(&self, code: cl_int) {
        self.last_error.set(code);
    }

    pub fn last_error(&self) -> cl_int {
        self.last_error.get()
    }

    pub fn clear_error(&self) {
        self.last_error.set(CL_SUCCESS);
    }
}

/// Make sure the calling thread is attached to the runtime.
///
/// Fails with [`EntryError::OutOfHostMemory`] when the thread-local slot can no
/// longer be reached (the thread is being torn down) or when the freshly
/// allocated context did not become the thread's active one.
pub fn ensure_attached() -> EntryResult<Rc<HostThread>> {
    if let Some(thread) = HostThread::current() {
        return Ok(thread);
    }
    attach()
}

fn attach() -> EntryResult<Rc<HostThread>> {
    if attach_refused() {
        return Err(EntryError::OutOfHostMemory);
    }
    let fresh = Rc::new(HostThread::new());
    let stored = CURRENT
        .try_with(|slot| match slot.try_borrow_mut() {
            Ok(mut slot) => {
                *slot = Some(Rc::clone(&fresh));
                true
            }
            Err(_) => false,
        })
        .unwrap_or(false);
    if !stored {
        return Err(EntryError::OutOfHostMemory);
    }

    match HostThread::current() {
        Some(active) if Rc::ptr_eq(&active, &fresh) => {
            ATTACHED_THREADS.fetch_add(1, Ordering::Relaxed);
            crate::logging::init_logging();
            tracing::trace!(
                serial = active.serial,
                name = active.name.as_deref().unwrap_or("<unnamed>"),
                "attached host thread"
            );
            Ok(active)
        }
        _ => Err(EntryError::OutOfHostMemory),
    }
}

/// Number of thread contexts allocated since process start.
pub fn attached_thread_count() -> u64 {
    ATTACHED_THREADS.load(Ordering::Relaxed)
}

/// Remember `code` as the calling thread's last error, if it is attached.
pub fn record_error(code: cl_int) {
    if let Some(thread) = HostThread::current() {
        thread.record_error(code);
    }
}

/// Thread gate for entry points.
///
/// - `entry_gate!()` returns `()` when the gate fails.
/// - `entry_gate!(ret)` returns `ret` when the gate fails.
/// - `entry_gate!(errcode_ret, ret)` also stores `CL_OUT_OF_HOST_MEMORY`
///   through the (possibly null) `errcode_ret` pointer.
#[macro_export]
macro_rules! entry_gate {
    () => {
        if $crate::thread::ensure_attached().is_err() {
            return;
        }
    };
    ($ret:expr) => {
        if $crate::thread::ensure_attached().is_err() {
            return $ret;
        }
    };
    ($errcode_ret:expr, $ret:expr) => {
        if $crate::thread::ensure_attached().is_err() {
            #[allow(unused_unsafe)]
            let mut errcode = unsafe { $crate::output::OptionalOutput::from_raw($errcode_ret) };
            errcode.write($crate::abi::CL_OUT_OF_HOST_MEMORY);
            return $ret;
        }
    };
}
