use crate::objects;
use crate::platform::host_device;
use crate::{boundary, create_boundary};
use clrt_entry::abi::*;
use clrt_entry::handle::{id_to_raw, raw_to_id};
use clrt_entry::info::get_info;
use clrt_entry::EntryError;
use std::ffi::c_void;

const SUPPORTED_QUEUE_PROPERTIES: cl_command_queue_properties =
    CL_QUEUE_OUT_OF_ORDER_EXEC_MODE_ENABLE | CL_QUEUE_PROFILING_ENABLE;

#[no_mangle]
pub unsafe extern "C" fn clCreateCommandQueue(
    context: cl_context,
    device: cl_device_id,
    properties: cl_command_queue_properties,
    errcode_ret: *mut cl_int,
) -> cl_command_queue {
    clrt_entry::entry_gate!(errcode_ret, std::ptr::null_mut());
    unsafe {
        create_boundary("clCreateCommandQueue", errcode_ret, || {
            objects::context(context)?;
            if device != host_device() {
                return Err(EntryError::InvalidDevice);
            }
            if properties & !SUPPORTED_QUEUE_PROPERTIES != 0 {
                return Err(EntryError::InvalidValue);
            }
            objects::create_queue(raw_to_id(context), properties)
        })
    }
}

#[no_mangle]
pub unsafe extern "C" fn clRetainCommandQueue(command_queue: cl_command_queue) -> cl_int {
    clrt_entry::entry_gate!(CL_OUT_OF_HOST_MEMORY);
    boundary("clRetainCommandQueue", || {
        objects::retain_queue(command_queue)
    })
}

#[no_mangle]
pub unsafe extern "C" fn clReleaseCommandQueue(command_queue: cl_command_queue) -> cl_int {
    clrt_entry::entry_gate!(CL_OUT_OF_HOST_MEMORY);
    boundary("clReleaseCommandQueue", || {
        objects::release_queue(command_queue)
    })
}

#[no_mangle]
pub unsafe extern "C" fn clGetCommandQueueInfo(
    command_queue: cl_command_queue,
    param_name: cl_command_queue_info,
    param_value_size: usize,
    param_value: *mut c_void,
    param_value_size_ret: *mut usize,
) -> cl_int {
    clrt_entry::entry_gate!(CL_OUT_OF_HOST_MEMORY);
    boundary("clGetCommandQueueInfo", || {
        let queue = objects::queue(command_queue)?;
        let size = param_value_size;
        let size_ret = param_value_size_ret;
        unsafe {
            match param_name {
                CL_QUEUE_CONTEXT => {
                    let context: cl_context = id_to_raw(queue.context_id);
                    get_info(&context, size, param_value, size_ret)
                }
                CL_QUEUE_DEVICE => get_info(&host_device(), size, param_value, size_ret),
                CL_QUEUE_REFERENCE_COUNT => get_info(&queue.refs.get(), size, param_value, size_ret),
                CL_QUEUE_PROPERTIES => get_info(&queue.properties, size, param_value, size_ret),
                _ => Err(EntryError::InvalidValue),
            }
        }
    })
}
