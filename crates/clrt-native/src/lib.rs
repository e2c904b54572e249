#![allow(non_camel_case_types)]
#![allow(non_snake_case)]
#![allow(clippy::missing_safety_doc)]

//! C ABI entry points for a host-only OpenCL 1.2 platform.
//!
//! Every exported function follows the same shape: a `catch_unwind` boundary,
//! the thread gate, argument checks, then the operation. Failures are reported
//! only through the returned status code or the optional `errcode_ret`.

use clrt_entry::abi::*;
use clrt_entry::{EntryError, EntryResult, OptionalOutput};
use std::panic::{catch_unwind, AssertUnwindSafe};

pub mod context;
pub mod event;
pub mod objects;
pub mod platform;
pub mod queue;

fn fail(entry: &'static str, err: EntryError) -> cl_int {
    let code = err.code();
    clrt_entry::thread::record_error(code);
    tracing::debug!(entry, code, %err, "entry point failed");
    code
}

/// Run a status-returning entry point body.
pub(crate) fn boundary<F>(entry: &'static str, body: F) -> cl_int
where
    F: FnOnce() -> EntryResult<()>,
{
    catch_unwind(AssertUnwindSafe(body))
        .unwrap_or_else(|_| {
            tracing::error!(entry, "panic at the API boundary");
            Err(EntryError::OutOfHostMemory)
        })
        .map_or_else(|err| fail(entry, err), |()| CL_SUCCESS)
}

/// Run a handle-returning entry point body, reporting through `errcode_ret`.
pub(crate) unsafe fn create_boundary<T, F>(
    entry: &'static str,
    errcode_ret: *mut cl_int,
    body: F,
) -> *mut T
where
    F: FnOnce() -> EntryResult<*mut T>,
{
    let mut errcode = unsafe { OptionalOutput::from_raw(errcode_ret) };
    let res = catch_unwind(AssertUnwindSafe(body)).unwrap_or_else(|_| {
        tracing::error!(entry, "panic at the API boundary");
        Err(EntryError::OutOfHostMemory)
    });
    match res {
        Ok(handle) => {
            errcode.write(CL_SUCCESS);
            handle
        }
        Err(err) => {
            errcode.write(fail(entry, err));
            std::ptr::null_mut()
        }
    }
}

/// Status of the most recent failed call on this thread.
#[no_mangle]
pub extern "C" fn clrtGetLastErrorAMD() -> cl_int {
    clrt_entry::entry_gate!(CL_OUT_OF_HOST_MEMORY);
    clrt_entry::HostThread::current()
        .map(|t| t.last_error())
        .unwrap_or(CL_SUCCESS)
}

#[no_mangle]
pub extern "C" fn clrtClearLastErrorAMD() {
    clrt_entry::entry_gate!();
    if let Some(thread) = clrt_entry::HostThread::current() {
        thread.clear_error();
    }
}
