use crate::objects;
use crate::platform::{device_type_matches, host_device, platform_id};
use crate::{boundary, create_boundary};
use clrt_entry::abi::*;
use clrt_entry::info::get_info;
use clrt_entry::properties::raw_properties;
use clrt_entry::{check_context_properties, ContextProperties, EntryError, EntryResult};
use std::ffi::{c_char, c_void};

pub type context_notify_fn =
    Option<unsafe extern "C" fn(*const c_char, *const c_void, usize, *mut c_void)>;

unsafe fn context_properties(
    properties: *const cl_context_properties,
) -> EntryResult<ContextProperties> {
    let props = unsafe { raw_properties(properties) };
    check_context_properties(
        props,
        platform_id() as cl_context_properties,
        clrt_entry::policy(),
    )
}

fn check_notify(pfn_notify: context_notify_fn, user_data: *mut c_void) -> EntryResult<()> {
    if pfn_notify.is_none() && !user_data.is_null() {
        return Err(EntryError::InvalidValue);
    }
    Ok(())
}

#[no_mangle]
pub unsafe extern "C" fn clCreateContext(
    properties: *const cl_context_properties,
    num_devices: cl_uint,
    devices: *const cl_device_id,
    pfn_notify: context_notify_fn,
    user_data: *mut c_void,
    errcode_ret: *mut cl_int,
) -> cl_context {
    clrt_entry::entry_gate!(errcode_ret, std::ptr::null_mut());
    unsafe {
        create_boundary("clCreateContext", errcode_ret, || {
            let props = context_properties(properties)?;
            if num_devices == 0 || devices.is_null() {
                return Err(EntryError::InvalidValue);
            }
            check_notify(pfn_notify, user_data)?;
            let devices = std::slice::from_raw_parts(devices, num_devices as usize);
            if devices.iter().any(|&d| d != host_device()) {
                return Err(EntryError::InvalidDevice);
            }
            objects::create_context(props)
        })
    }
}

#[no_mangle]
pub unsafe extern "C" fn clCreateContextFromType(
    properties: *const cl_context_properties,
    device_type: cl_device_type,
    pfn_notify: context_notify_fn,
    user_data: *mut c_void,
    errcode_ret: *mut cl_int,
) -> cl_context {
    clrt_entry::entry_gate!(errcode_ret, std::ptr::null_mut());
    unsafe {
        create_boundary("clCreateContextFromType", errcode_ret, || {
            let props = context_properties(properties)?;
            check_notify(pfn_notify, user_data)?;
            if !device_type_matches(device_type)? {
                return Err(EntryError::DeviceNotFound);
            }
            objects::create_context(props)
        })
    }
}

#[no_mangle]
pub unsafe extern "C" fn clRetainContext(context: cl_context) -> cl_int {
    clrt_entry::entry_gate!(CL_OUT_OF_HOST_MEMORY);
    boundary("clRetainContext", || objects::retain_context(context))
}

#[no_mangle]
pub unsafe extern "C" fn clReleaseContext(context: cl_context) -> cl_int {
    clrt_entry::entry_gate!(CL_OUT_OF_HOST_MEMORY);
    boundary("clReleaseContext", || objects::release_context(context))
}

#[no_mangle]
pub unsafe extern "C" fn clGetContextInfo(
    context: cl_context,
    param_name: cl_context_info,
    param_value_size: usize,
    param_value: *mut c_void,
    param_value_size_ret: *mut usize,
) -> cl_int {
    clrt_entry::entry_gate!(CL_OUT_OF_HOST_MEMORY);
    boundary("clGetContextInfo", || {
        let ctx = objects::context(context)?;
        unsafe {
            match param_name {
                CL_CONTEXT_REFERENCE_COUNT => get_info(
                    &ctx.refs.get(),
                    param_value_size,
                    param_value,
                    param_value_size_ret,
                ),
                CL_CONTEXT_NUM_DEVICES => {
                    get_info(&1u32, param_value_size, param_value, param_value_size_ret)
                }
                // One device, so the device array is a single handle.
                CL_CONTEXT_DEVICES => get_info(
                    &host_device(),
                    param_value_size,
                    param_value,
                    param_value_size_ret,
                ),
                _ => Err(EntryError::InvalidValue),
            }
        }
    })
}
