use clrt_entry::abi::*;
use clrt_native::context::*;
use clrt_native::event::*;
use clrt_native::platform::*;
use clrt_native::queue::*;
use clrt_native::{clrtClearLastErrorAMD, clrtGetLastErrorAMD};
use std::ffi::c_void;
use std::ptr::{null, null_mut};

fn new_context() -> cl_context {
    let device = host_device();
    let mut err = CL_OUT_OF_HOST_MEMORY;
    let ctx = unsafe { clCreateContext(null(), 1, &device, None, null_mut(), &mut err) };
    assert_eq!(err, CL_SUCCESS);
    assert!(!ctx.is_null());
    ctx
}

fn new_queue(ctx: cl_context) -> cl_command_queue {
    let mut err = CL_OUT_OF_HOST_MEMORY;
    let queue = unsafe { clCreateCommandQueue(ctx, host_device(), 0, &mut err) };
    assert_eq!(err, CL_SUCCESS);
    queue
}

fn user_event(ctx: cl_context) -> cl_event {
    let mut err = CL_OUT_OF_HOST_MEMORY;
    let ev = unsafe { clCreateUserEvent(ctx, &mut err) };
    assert_eq!(err, CL_SUCCESS);
    ev
}

fn event_status(ev: cl_event) -> cl_int {
    let mut status: cl_int = 99;
    let rc = unsafe {
        clGetEventInfo(
            ev,
            CL_EVENT_COMMAND_EXECUTION_STATUS,
            std::mem::size_of::<cl_int>(),
            &mut status as *mut cl_int as *mut c_void,
            null_mut(),
        )
    };
    assert_eq!(rc, CL_SUCCESS);
    status
}

fn ref_count(ctx: cl_context) -> cl_uint {
    let mut count: cl_uint = 0;
    let rc = unsafe {
        clGetContextInfo(
            ctx,
            CL_CONTEXT_REFERENCE_COUNT,
            4,
            &mut count as *mut cl_uint as *mut c_void,
            null_mut(),
        )
    };
    assert_eq!(rc, CL_SUCCESS);
    count
}

#[test]
fn platform_name_size_then_copy() {
    let mut size = 0usize;
    let rc = unsafe { clGetPlatformInfo(null_mut(), CL_PLATFORM_NAME, 0, null_mut(), &mut size) };
    assert_eq!(rc, CL_SUCCESS);
    assert_eq!(size, PLATFORM_NAME.len());

    let mut buf = vec![0xFFu8; size + 4];
    let rc = unsafe {
        clGetPlatformInfo(
            platform_id(),
            CL_PLATFORM_NAME,
            buf.len(),
            buf.as_mut_ptr() as *mut c_void,
            null_mut(),
        )
    };
    assert_eq!(rc, CL_SUCCESS);
    assert_eq!(&buf[..size], PLATFORM_NAME);
    assert!(buf[size..].iter().all(|&b| b == 0));
}

#[test]
fn short_buffer_leaves_destination_alone() {
    let mut buf = [0x5Au8; 4];
    let mut size = 1234usize;
    let rc = unsafe {
        clGetPlatformInfo(
            null_mut(),
            CL_PLATFORM_VERSION,
            buf.len(),
            buf.as_mut_ptr() as *mut c_void,
            &mut size,
        )
    };
    assert_eq!(rc, CL_INVALID_VALUE);
    assert_eq!(buf, [0x5A; 4]);
    assert_eq!(size, 1234);
}

#[test]
fn unknown_platform_and_param_are_rejected() {
    let mut size = 0usize;
    let bogus = 0x10 as cl_platform_id;
    let rc = unsafe { clGetPlatformInfo(bogus, CL_PLATFORM_NAME, 0, null_mut(), &mut size) };
    assert_eq!(rc, CL_INVALID_PLATFORM);
    let rc = unsafe { clGetPlatformInfo(null_mut(), 0x0999, 0, null_mut(), &mut size) };
    assert_eq!(rc, CL_INVALID_VALUE);
}

#[test]
fn platform_and_device_enumeration() {
    let mut platform = null_mut();
    let mut count = 0;
    assert_eq!(unsafe { clGetPlatformIDs(1, &mut platform, &mut count) }, CL_SUCCESS);
    assert_eq!(platform, platform_id());
    assert_eq!(count, 1);
    assert_eq!(
        unsafe { clGetPlatformIDs(0, &mut platform, null_mut()) },
        CL_INVALID_VALUE
    );

    let mut device = null_mut();
    let rc = unsafe { clGetDeviceIDs(platform, CL_DEVICE_TYPE_CPU, 1, &mut device, &mut count) };
    assert_eq!(rc, CL_SUCCESS);
    assert_eq!(device, host_device());

    let rc = unsafe { clGetDeviceIDs(platform, CL_DEVICE_TYPE_GPU, 0, null_mut(), &mut count) };
    assert_eq!(rc, CL_DEVICE_NOT_FOUND);
    assert_eq!(count, 0);
    let rc = unsafe { clGetDeviceIDs(platform, 0, 0, null_mut(), &mut count) };
    assert_eq!(rc, CL_INVALID_DEVICE_TYPE);
}

#[test]
fn context_creation_checks_properties() {
    let device = host_device();
    let mut err = 0;
    let props = [
        CL_CONTEXT_PLATFORM,
        platform_id() as cl_context_properties,
        0,
    ];
    let ctx = unsafe { clCreateContext(props.as_ptr(), 1, &device, None, null_mut(), &mut err) };
    assert_eq!(err, CL_SUCCESS);
    assert_eq!(unsafe { clReleaseContext(ctx) }, CL_SUCCESS);

    let bad = [CL_CONTEXT_PLATFORM, 0x1234, 0];
    let ctx = unsafe { clCreateContext(bad.as_ptr(), 1, &device, None, null_mut(), &mut err) };
    assert!(ctx.is_null());
    assert_eq!(err, CL_INVALID_PLATFORM);

    let foreign_device = 0x20 as cl_device_id;
    let ctx =
        unsafe { clCreateContext(null(), 1, &foreign_device, None, null_mut(), &mut err) };
    assert!(ctx.is_null());
    assert_eq!(err, CL_INVALID_DEVICE);

    let ctx = unsafe { clCreateContextFromType(null(), CL_DEVICE_TYPE_GPU, None, null_mut(), &mut err) };
    assert!(ctx.is_null());
    assert_eq!(err, CL_DEVICE_NOT_FOUND);
}

#[test]
fn null_errcode_ret_is_safe() {
    let ctx = unsafe { clCreateContext(null(), 0, null(), None, null_mut(), null_mut()) };
    assert!(ctx.is_null());
    let ctx =
        unsafe { clCreateContextFromType(null(), CL_DEVICE_TYPE_DEFAULT, None, null_mut(), null_mut()) };
    assert!(!ctx.is_null());
    assert_eq!(unsafe { clReleaseContext(ctx) }, CL_SUCCESS);
}

#[test]
fn queues_and_events_keep_their_context_alive() {
    let ctx = new_context();
    let queue = new_queue(ctx);
    assert_eq!(ref_count(ctx), 2);
    let ev = user_event(ctx);
    assert_eq!(ref_count(ctx), 3);

    assert_eq!(unsafe { clReleaseContext(ctx) }, CL_SUCCESS);
    assert_eq!(unsafe { clReleaseCommandQueue(queue) }, CL_SUCCESS);
    assert_eq!(ref_count(ctx), 1);
    assert_eq!(unsafe { clReleaseEvent(ev) }, CL_SUCCESS);
    assert_eq!(unsafe { clRetainContext(ctx) }, CL_INVALID_CONTEXT);
}

#[test]
fn released_event_is_invalid_forever() {
    let ctx = new_context();
    let ev = user_event(ctx);
    assert_eq!(unsafe { clRetainEvent(ev) }, CL_SUCCESS);
    assert_eq!(unsafe { clReleaseEvent(ev) }, CL_SUCCESS);
    assert_eq!(unsafe { clReleaseEvent(ev) }, CL_SUCCESS);
    assert_eq!(unsafe { clReleaseEvent(ev) }, CL_INVALID_EVENT);

    let queue = new_queue(ctx);
    let rc = unsafe { clEnqueueMarkerWithWaitList(queue, 1, &ev, null_mut()) };
    assert_eq!(rc, CL_INVALID_EVENT_WAIT_LIST);

    unsafe {
        clReleaseCommandQueue(queue);
        clReleaseContext(ctx);
    }
}

#[test]
fn wait_list_pairing_is_checked() {
    let ctx = new_context();
    let queue = new_queue(ctx);
    let ev = user_event(ctx);

    let rc = unsafe { clEnqueueMarkerWithWaitList(queue, 1, null(), null_mut()) };
    assert_eq!(rc, CL_INVALID_EVENT_WAIT_LIST);
    let rc = unsafe { clEnqueueBarrierWithWaitList(queue, 0, &ev, null_mut()) };
    assert_eq!(rc, CL_INVALID_EVENT_WAIT_LIST);
    let rc = unsafe { clEnqueueBarrierWithWaitList(queue, 0, null(), null_mut()) };
    assert_eq!(rc, CL_SUCCESS);

    unsafe {
        clReleaseEvent(ev);
        clReleaseCommandQueue(queue);
        clReleaseContext(ctx);
    }
}

#[test]
fn foreign_context_event_is_rejected() {
    let ctx_a = new_context();
    let ctx_b = new_context();
    let queue = new_queue(ctx_a);
    let list = [user_event(ctx_a), user_event(ctx_b), user_event(ctx_a)];

    let mut marker = null_mut();
    let rc = unsafe { clEnqueueMarkerWithWaitList(queue, 3, list.as_ptr(), &mut marker) };
    assert_eq!(rc, CL_INVALID_CONTEXT);
    assert!(marker.is_null());

    // A dead handle ahead of the foreign one wins.
    let dead = user_event(ctx_a);
    unsafe { clReleaseEvent(dead) };
    let mixed = [dead, list[1]];
    let rc = unsafe { clEnqueueMarkerWithWaitList(queue, 2, mixed.as_ptr(), null_mut()) };
    assert_eq!(rc, CL_INVALID_EVENT_WAIT_LIST);

    unsafe {
        for ev in list {
            clReleaseEvent(ev);
        }
        clReleaseCommandQueue(queue);
        clReleaseContext(ctx_a);
        clReleaseContext(ctx_b);
    }
}

#[test]
fn marker_completes_with_its_dependencies() {
    let ctx = new_context();
    let queue = new_queue(ctx);
    let gate = user_event(ctx);

    let mut marker = null_mut();
    let rc = unsafe { clEnqueueMarkerWithWaitList(queue, 1, &gate, &mut marker) };
    assert_eq!(rc, CL_SUCCESS);
    assert_eq!(event_status(marker), CL_QUEUED);

    // In order: the barrier follows the marker even without a wait list.
    let mut barrier = null_mut();
    let rc = unsafe { clEnqueueBarrierWithWaitList(queue, 0, null(), &mut barrier) };
    assert_eq!(rc, CL_SUCCESS);
    assert_eq!(event_status(barrier), CL_QUEUED);

    assert_eq!(unsafe { clSetUserEventStatus(gate, CL_COMPLETE) }, CL_SUCCESS);
    assert_eq!(event_status(marker), CL_COMPLETE);
    assert_eq!(event_status(barrier), CL_COMPLETE);
    assert_eq!(
        unsafe { clSetUserEventStatus(gate, CL_COMPLETE) },
        CL_INVALID_OPERATION
    );
    assert_eq!(unsafe { clSetUserEventStatus(marker, CL_COMPLETE) }, CL_INVALID_EVENT);

    let mut command_type: cl_command_type = 0;
    let rc = unsafe {
        clGetEventInfo(
            barrier,
            CL_EVENT_COMMAND_TYPE,
            4,
            &mut command_type as *mut cl_command_type as *mut c_void,
            null_mut(),
        )
    };
    assert_eq!(rc, CL_SUCCESS);
    assert_eq!(command_type, CL_COMMAND_BARRIER);

    let mut owner: cl_command_queue = null_mut();
    let rc = unsafe {
        clGetEventInfo(
            marker,
            CL_EVENT_COMMAND_QUEUE,
            std::mem::size_of::<cl_command_queue>(),
            &mut owner as *mut cl_command_queue as *mut c_void,
            null_mut(),
        )
    };
    assert_eq!(rc, CL_SUCCESS);
    assert_eq!(owner, queue);

    unsafe {
        clReleaseEvent(marker);
        clReleaseEvent(barrier);
        clReleaseEvent(gate);
        clReleaseCommandQueue(queue);
        clReleaseContext(ctx);
    }
}

#[test]
fn failed_dependency_fails_the_marker() {
    let ctx = new_context();
    let queue = new_queue(ctx);
    let gate = user_event(ctx);
    let mut marker = null_mut();
    unsafe { clEnqueueMarkerWithWaitList(queue, 1, &gate, &mut marker) };

    assert_eq!(unsafe { clSetUserEventStatus(gate, 1) }, CL_INVALID_VALUE);
    assert_eq!(unsafe { clSetUserEventStatus(gate, -5) }, CL_SUCCESS);
    assert_eq!(event_status(gate), -5);
    assert_eq!(
        event_status(marker),
        CL_EXEC_STATUS_ERROR_FOR_EVENTS_IN_WAIT_LIST
    );

    unsafe {
        clReleaseEvent(marker);
        clReleaseEvent(gate);
        clReleaseCommandQueue(queue);
        clReleaseContext(ctx);
    }
}

#[test]
fn queue_info_and_properties() {
    let ctx = new_context();
    let mut err = 0;
    let bad = unsafe { clCreateCommandQueue(ctx, host_device(), 1 << 5, &mut err) };
    assert!(bad.is_null());
    assert_eq!(err, CL_INVALID_VALUE);

    let queue = unsafe {
        clCreateCommandQueue(ctx, host_device(), CL_QUEUE_PROFILING_ENABLE, &mut err)
    };
    assert_eq!(err, CL_SUCCESS);

    let mut props: cl_command_queue_properties = 0;
    let mut size = 0usize;
    let rc = unsafe {
        clGetCommandQueueInfo(
            queue,
            CL_QUEUE_PROPERTIES,
            8,
            &mut props as *mut cl_command_queue_properties as *mut c_void,
            &mut size,
        )
    };
    assert_eq!(rc, CL_SUCCESS);
    assert_eq!(props, CL_QUEUE_PROFILING_ENABLE);
    assert_eq!(size, 8);

    let mut owner: cl_context = null_mut();
    let rc = unsafe {
        clGetCommandQueueInfo(
            queue,
            CL_QUEUE_CONTEXT,
            std::mem::size_of::<cl_context>(),
            &mut owner as *mut cl_context as *mut c_void,
            null_mut(),
        )
    };
    assert_eq!(rc, CL_SUCCESS);
    assert_eq!(owner, ctx);

    unsafe {
        clReleaseCommandQueue(queue);
        clReleaseContext(ctx);
    }
}

#[test]
fn last_error_tracks_failures_per_thread() {
    std::thread::spawn(|| {
        clrtClearLastErrorAMD();
        assert_eq!(clrtGetLastErrorAMD(), CL_SUCCESS);
        let rc = unsafe { clRetainContext(null_mut()) };
        assert_eq!(rc, CL_INVALID_CONTEXT);
        assert_eq!(clrtGetLastErrorAMD(), CL_INVALID_CONTEXT);
        clrtClearLastErrorAMD();
        assert_eq!(clrtGetLastErrorAMD(), CL_SUCCESS);
    })
    .join()
    .unwrap();
}

#[test]
fn chained_markers_settle_in_linear_time() {
    let ctx = new_context();
    let queue = new_queue(ctx);
    let gate = user_event(ctx);

    let mut first = null_mut();
    let rc = unsafe { clEnqueueMarkerWithWaitList(queue, 1, &gate, &mut first) };
    assert_eq!(rc, CL_SUCCESS);

    let started = std::time::Instant::now();
    let mut markers = vec![first];
    for _ in 0..64 {
        let mut marker = null_mut();
        let rc = unsafe { clEnqueueMarkerWithWaitList(queue, 0, null(), &mut marker) };
        assert_eq!(rc, CL_SUCCESS);
        assert_eq!(event_status(marker), CL_QUEUED);
        markers.push(marker);
    }

    assert_eq!(unsafe { clSetUserEventStatus(gate, CL_COMPLETE) }, CL_SUCCESS);
    for &marker in &markers {
        assert_eq!(event_status(marker), CL_COMPLETE);
    }
    assert!(started.elapsed() < std::time::Duration::from_secs(5));

    unsafe {
        for marker in markers {
            clReleaseEvent(marker);
        }
        clReleaseEvent(gate);
        clReleaseCommandQueue(queue);
        clReleaseContext(ctx);
    }
}

#[test]
fn out_of_order_queue_only_waits_when_asked() {
    let ctx = new_context();
    let mut err = CL_OUT_OF_HOST_MEMORY;
    let queue = unsafe {
        clCreateCommandQueue(
            ctx,
            host_device(),
            CL_QUEUE_OUT_OF_ORDER_EXEC_MODE_ENABLE,
            &mut err,
        )
    };
    assert_eq!(err, CL_SUCCESS);
    let gate = user_event(ctx);
    let other = user_event(ctx);

    let mut gated = null_mut();
    unsafe { clEnqueueMarkerWithWaitList(queue, 1, &gate, &mut gated) };
    assert_eq!(event_status(gated), CL_QUEUED);

    // An explicit wait list does not pick up the earlier command.
    let mut independent = null_mut();
    unsafe { clEnqueueMarkerWithWaitList(queue, 1, &other, &mut independent) };
    assert_eq!(unsafe { clSetUserEventStatus(other, CL_COMPLETE) }, CL_SUCCESS);
    assert_eq!(event_status(independent), CL_COMPLETE);
    assert_eq!(event_status(gated), CL_QUEUED);

    // An empty one waits on everything still pending.
    let mut barrier = null_mut();
    unsafe { clEnqueueBarrierWithWaitList(queue, 0, null(), &mut barrier) };
    assert_eq!(event_status(barrier), CL_QUEUED);
    assert_eq!(unsafe { clSetUserEventStatus(gate, CL_COMPLETE) }, CL_SUCCESS);
    assert_eq!(event_status(barrier), CL_COMPLETE);

    unsafe {
        for ev in [gated, independent, barrier, gate, other] {
            clReleaseEvent(ev);
        }
        clReleaseCommandQueue(queue);
        clReleaseContext(ctx);
    }
}
