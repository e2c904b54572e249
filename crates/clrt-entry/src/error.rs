//! Boundary error taxonomy and its OpenCL status-code mapping.

use crate::abi::*;
use thiserror::Error;

/// Failures detected at the entry boundary.
///
/// Every variant maps to exactly one OpenCL status code; the code is the only
/// channel through which a caller observes the failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum EntryError {
    /// The calling thread could not be attached, or a host-side table is full.
    #[error("out of host memory")]
    OutOfHostMemory,

    /// A scalar argument is out of range, or a query buffer is too small.
    #[error("invalid value")]
    InvalidValue,

    /// No device matches the requested type.
    #[error("device not found")]
    DeviceNotFound,

    #[error("invalid device type")]
    InvalidDeviceType,

    #[error("invalid platform")]
    InvalidPlatform,

    #[error("invalid device")]
    InvalidDevice,

    /// A context handle is dead, or objects from different contexts were mixed.
    #[error("invalid context")]
    InvalidContext,

    #[error("invalid command queue")]
    InvalidCommandQueue,

    /// Malformed `(count, pointer)` pairing, or a handle that is not a live event.
    #[error("invalid event wait list")]
    InvalidEventWaitList,

    #[error("invalid event")]
    InvalidEvent,

    #[error("invalid operation")]
    InvalidOperation,

    #[error("invalid property")]
    InvalidProperty,
}

impl EntryError {
    pub fn code(self) -> cl_int {
        match self {
            EntryError::OutOfHostMemory => CL_OUT_OF_HOST_MEMORY,
            EntryError::InvalidValue => CL_INVALID_VALUE,
            EntryError::DeviceNotFound => CL_DEVICE_NOT_FOUND,
            EntryError::InvalidDeviceType => CL_INVALID_DEVICE_TYPE,
            EntryError::InvalidPlatform => CL_INVALID_PLATFORM,
            EntryError::InvalidDevice => CL_INVALID_DEVICE,
            EntryError::InvalidContext => CL_INVALID_CONTEXT,
            EntryError::InvalidCommandQueue => CL_INVALID_COMMAND_QUEUE,
            EntryError::InvalidEventWaitList => CL_INVALID_EVENT_WAIT_LIST,
            EntryError::InvalidEvent => CL_INVALID_EVENT,
            EntryError::InvalidOperation => CL_INVALID_OPERATION,
            EntryError::InvalidProperty => CL_INVALID_PROPERTY,
        }
    }

    pub fn from_code(code: cl_int) -> Option<Self> {
        let err = match code {
            CL_OUT_OF_HOST_MEMORY => EntryError::OutOfHostMemory,
            CL_INVALID_VALUE => EntryError::InvalidValue,
            CL_DEVICE_NOT_FOUND => EntryError::DeviceNotFound,
            CL_INVALID_DEVICE_TYPE => EntryError::InvalidDeviceType,
            CL_INVALID_PLATFORM => EntryError::InvalidPlatform,
            CL_INVALID_DEVICE => EntryError::InvalidDevice,
            CL_INVALID_CONTEXT => EntryError::InvalidContext,
            CL_INVALID_COMMAND_QUEUE => EntryError::InvalidCommandQueue,
            CL_INVALID_EVENT_WAIT_LIST => EntryError::InvalidEventWaitList,
            CL_INVALID_EVENT => EntryError::InvalidEvent,
            CL_INVALID_OPERATION => EntryError::InvalidOperation,
            CL_INVALID_PROPERTY => EntryError::InvalidProperty,
            _ => return None,
        };
        Some(err)
    }
}

pub type EntryResult<T> = Result<T, EntryError>;

/// Collapse a unit result into the status code an entry point returns.
pub fn status(res: EntryResult<()>) -> cl_int {
    match res {
        Ok(()) => CL_SUCCESS,
        Err(err) => err.code(),
    }
}
