//! The single host platform and its one CPU device.
//!
//! Both handles are addresses of private statics, so they are stable for the
//! life of the process and never collide with table-backed handles.

use crate::boundary;
use clrt_entry::abi::*;
use clrt_entry::info::get_info;
use clrt_entry::{EntryError, OptionalOutput};
use std::ffi::{c_void, CStr};

static PLATFORM: u8 = b'P';
static HOST_DEVICE: u8 = b'D';

pub const PLATFORM_PROFILE: &[u8] = b"FULL_PROFILE\0";
pub const PLATFORM_VERSION: &[u8] = b"OpenCL 1.2 clrt\0";
pub const PLATFORM_NAME: &[u8] = b"clrt host platform\0";
pub const PLATFORM_VENDOR: &[u8] = b"clrt\0";
pub const PLATFORM_EXTENSIONS: &[u8] = b"cl_amd_offline_devices\0";

pub fn platform_id() -> cl_platform_id {
    &PLATFORM as *const u8 as cl_platform_id
}

pub fn host_device() -> cl_device_id {
    &HOST_DEVICE as *const u8 as cl_device_id
}

/// Null selects the default platform.
pub(crate) fn check_platform(platform: cl_platform_id) -> Result<(), EntryError> {
    if platform.is_null() || platform == platform_id() {
        Ok(())
    } else {
        Err(EntryError::InvalidPlatform)
    }
}

/// Validate a device type mask; true when the host device matches it.
pub(crate) fn device_type_matches(device_type: cl_device_type) -> Result<bool, EntryError> {
    const KNOWN: cl_device_type = CL_DEVICE_TYPE_DEFAULT
        | CL_DEVICE_TYPE_CPU
        | CL_DEVICE_TYPE_GPU
        | CL_DEVICE_TYPE_ACCELERATOR
        | CL_DEVICE_TYPE_CUSTOM;
    if device_type == CL_DEVICE_TYPE_ALL {
        return Ok(true);
    }
    if device_type == 0 || device_type & !KNOWN != 0 {
        return Err(EntryError::InvalidDeviceType);
    }
    Ok(device_type & (CL_DEVICE_TYPE_DEFAULT | CL_DEVICE_TYPE_CPU) != 0)
}

fn platform_text(param_name: cl_platform_info) -> Option<&'static CStr> {
    let bytes = match param_name {
        CL_PLATFORM_PROFILE => PLATFORM_PROFILE,
        CL_PLATFORM_VERSION => PLATFORM_VERSION,
        CL_PLATFORM_NAME => PLATFORM_NAME,
        CL_PLATFORM_VENDOR => PLATFORM_VENDOR,
        CL_PLATFORM_EXTENSIONS => PLATFORM_EXTENSIONS,
        _ => return None,
    };
    CStr::from_bytes_with_nul(bytes).ok()
}

#[no_mangle]
pub unsafe extern "C" fn clGetPlatformIDs(
    num_entries: cl_uint,
    platforms: *mut cl_platform_id,
    num_platforms: *mut cl_uint,
) -> cl_int {
    clrt_entry::entry_gate!(CL_OUT_OF_HOST_MEMORY);
    boundary("clGetPlatformIDs", || {
        if (num_entries == 0 && !platforms.is_null())
            || (platforms.is_null() && num_platforms.is_null())
        {
            return Err(EntryError::InvalidValue);
        }
        let mut first = unsafe { OptionalOutput::from_raw(platforms) };
        let mut count = unsafe { OptionalOutput::from_raw(num_platforms) };
        first.write(platform_id());
        count.write(1);
        Ok(())
    })
}

#[no_mangle]
pub unsafe extern "C" fn clGetPlatformInfo(
    platform: cl_platform_id,
    param_name: cl_platform_info,
    param_value_size: usize,
    param_value: *mut c_void,
    param_value_size_ret: *mut usize,
) -> cl_int {
    clrt_entry::entry_gate!(CL_OUT_OF_HOST_MEMORY);
    boundary("clGetPlatformInfo", || {
        check_platform(platform)?;
        let text = platform_text(param_name).ok_or(EntryError::InvalidValue)?;
        unsafe { get_info(text, param_value_size, param_value, param_value_size_ret) }
    })
}

#[no_mangle]
pub unsafe extern "C" fn clGetDeviceIDs(
    platform: cl_platform_id,
    device_type: cl_device_type,
    num_entries: cl_uint,
    devices: *mut cl_device_id,
    num_devices: *mut cl_uint,
) -> cl_int {
    clrt_entry::entry_gate!(CL_OUT_OF_HOST_MEMORY);
    boundary("clGetDeviceIDs", || {
        check_platform(platform)?;
        if (num_entries == 0 && !devices.is_null()) || (devices.is_null() && num_devices.is_null())
        {
            return Err(EntryError::InvalidValue);
        }
        let mut count = unsafe { OptionalOutput::from_raw(num_devices) };
        if !device_type_matches(device_type)? {
            count.write(0);
            return Err(EntryError::DeviceNotFound);
        }
        let mut first = unsafe { OptionalOutput::from_raw(devices) };
        first.write(host_device());
        count.write(1);
        Ok(())
    })
}
