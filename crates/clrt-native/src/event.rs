//! User events and the two enqueue entry points that take a wait list.

use crate::objects::{self, Event, LiveEvents};
use crate::{boundary, create_boundary};
use clrt_entry::abi::*;
use clrt_entry::handle::{id_to_raw, raw_to_id};
use clrt_entry::info::get_info;
use clrt_entry::wait_list::set_event_wait_list;
use clrt_entry::{EntryError, EntryResult, OptionalOutput};
use std::ffi::c_void;
use std::sync::Arc;

#[no_mangle]
pub unsafe extern "C" fn clCreateUserEvent(context: cl_context, errcode_ret: *mut cl_int) -> cl_event {
    clrt_entry::entry_gate!(errcode_ret, std::ptr::null_mut());
    unsafe {
        create_boundary("clCreateUserEvent", errcode_ret, || {
            objects::context(context)?;
            objects::publish_event(Arc::new(Event::user(raw_to_id(context))))
        })
    }
}

#[no_mangle]
pub unsafe extern "C" fn clSetUserEventStatus(event: cl_event, execution_status: cl_int) -> cl_int {
    clrt_entry::entry_gate!(CL_OUT_OF_HOST_MEMORY);
    boundary("clSetUserEventStatus", || {
        let ev = objects::event(event)?;
        if !ev.is_user() {
            return Err(EntryError::InvalidEvent);
        }
        if execution_status > CL_COMPLETE {
            return Err(EntryError::InvalidValue);
        }
        ev.set_user_status(execution_status)
    })
}

#[no_mangle]
pub unsafe extern "C" fn clRetainEvent(event: cl_event) -> cl_int {
    clrt_entry::entry_gate!(CL_OUT_OF_HOST_MEMORY);
    boundary("clRetainEvent", || objects::retain_event(event))
}

#[no_mangle]
pub unsafe extern "C" fn clReleaseEvent(event: cl_event) -> cl_int {
    clrt_entry::entry_gate!(CL_OUT_OF_HOST_MEMORY);
    boundary("clReleaseEvent", || objects::release_event(event))
}

#[no_mangle]
pub unsafe extern "C" fn clGetEventInfo(
    event: cl_event,
    param_name: cl_event_info,
    param_value_size: usize,
    param_value: *mut c_void,
    param_value_size_ret: *mut usize,
) -> cl_int {
    clrt_entry::entry_gate!(CL_OUT_OF_HOST_MEMORY);
    boundary("clGetEventInfo", || {
        let ev = objects::event(event)?;
        let size = param_value_size;
        let size_ret = param_value_size_ret;
        unsafe {
            match param_name {
                CL_EVENT_COMMAND_QUEUE => {
                    let queue: cl_command_queue = id_to_raw(ev.queue_id);
                    get_info(&queue, size, param_value, size_ret)
                }
                CL_EVENT_CONTEXT => {
                    let context: cl_context = id_to_raw(ev.context_id);
                    get_info(&context, size, param_value, size_ret)
                }
                CL_EVENT_COMMAND_TYPE => get_info(&ev.command_type, size, param_value, size_ret),
                CL_EVENT_COMMAND_EXECUTION_STATUS => {
                    get_info(&ev.execution_status(), size, param_value, size_ret)
                }
                CL_EVENT_REFERENCE_COUNT => get_info(&ev.refs.get(), size, param_value, size_ret),
                _ => Err(EntryError::InvalidValue),
            }
        }
    })
}

/// Record a marker or barrier on `command_queue`.
///
/// The command depends on the resolved wait list, and on an in-order queue
/// also on the previous command. An out-of-order queue waits on every pending
/// command when the list is empty. The event handle is published before the
/// command is recorded, so a failed call leaves the queue as it was.
unsafe fn enqueue_sync_point(
    command_type: cl_command_type,
    command_queue: cl_command_queue,
    num_events_in_wait_list: cl_uint,
    event_wait_list: *const cl_event,
    event: *mut cl_event,
) -> EntryResult<()> {
    let queue = objects::queue(command_queue)?;
    let wait_list = unsafe {
        set_event_wait_list(
            &LiveEvents,
            queue.context_id,
            num_events_in_wait_list,
            event_wait_list,
        )?
    };

    let mut event_out = unsafe { OptionalOutput::from_raw(event) };
    let mut published = None;
    let command = queue.enqueue(
        raw_to_id(command_queue),
        command_type,
        wait_list.into_inner(),
        |command| {
            if event_out.is_present() {
                published = Some(objects::publish_event(Arc::clone(command))?);
            }
            Ok(())
        },
    )?;
    tracing::trace!(
        command_type,
        dependencies = command.dependency_count(),
        status = command.execution_status(),
        "sync point recorded"
    );

    if let Some(handle) = published {
        event_out.write(handle);
    }
    Ok(())
}

#[no_mangle]
pub unsafe extern "C" fn clEnqueueMarkerWithWaitList(
    command_queue: cl_command_queue,
    num_events_in_wait_list: cl_uint,
    event_wait_list: *const cl_event,
    event: *mut cl_event,
) -> cl_int {
    clrt_entry::entry_gate!(CL_OUT_OF_HOST_MEMORY);
    boundary("clEnqueueMarkerWithWaitList", || unsafe {
        enqueue_sync_point(
            CL_COMMAND_MARKER,
            command_queue,
            num_events_in_wait_list,
            event_wait_list,
            event,
        )
    })
}

#[no_mangle]
pub unsafe extern "C" fn clEnqueueBarrierWithWaitList(
    command_queue: cl_command_queue,
    num_events_in_wait_list: cl_uint,
    event_wait_list: *const cl_event,
    event: *mut cl_event,
) -> cl_int {
    clrt_entry::entry_gate!(CL_OUT_OF_HOST_MEMORY);
    boundary("clEnqueueBarrierWithWaitList", || unsafe {
        enqueue_sync_point(
            CL_COMMAND_BARRIER,
            command_queue,
            num_events_in_wait_list,
            event_wait_list,
            event,
        )
    })
}
