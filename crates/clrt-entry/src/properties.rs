//! Context property list checking.
//!
//! A property list is a sequence of `(name, value)` pairs ended by a zero
//! name. Each name may appear once.

use crate::abi::*;
use crate::error::{EntryError, EntryResult};
use crate::policy::Policy;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContextProperties {
    pub platform: Option<cl_context_properties>,
    pub interop_user_sync: bool,
    pub offline_devices: bool,
}

/// Check a property list against the runtime's platform handle.
///
/// `props` is the caller's list, with or without its zero terminator; the
/// list ends at the first zero name or at the end of the slice.
pub fn check_context_properties(
    props: &[cl_context_properties],
    platform: cl_context_properties,
    policy: &Policy,
) -> EntryResult<ContextProperties> {
    let mut out = ContextProperties::default();
    let mut seen: Vec<cl_context_properties> = Vec::new();
    let mut pos = 0usize;

    while let Some(&name) = props.get(pos) {
        if name == 0 {
            break;
        }
        let Some(&value) = props.get(pos + 1) else {
            tracing::debug!(name, "context property without a value");
            return Err(EntryError::InvalidProperty);
        };
        if seen.contains(&name) {
            tracing::debug!(name, "duplicate context property");
            return Err(EntryError::InvalidProperty);
        }
        seen.push(name);

        match name {
            CL_CONTEXT_PLATFORM => {
                if value != platform {
                    return Err(EntryError::InvalidPlatform);
                }
                out.platform = Some(value);
            }
            CL_CONTEXT_INTEROP_USER_SYNC => {
                out.interop_user_sync = match value {
                    v if v == CL_TRUE as cl_context_properties => true,
                    v if v == CL_FALSE as cl_context_properties => false,
                    _ => return Err(EntryError::InvalidValue),
                };
            }
            CL_CONTEXT_OFFLINE_DEVICES_AMD => {
                if !policy.allow_offline_devices {
                    tracing::debug!("offline devices disabled by policy");
                    return Err(EntryError::InvalidProperty);
                }
                out.offline_devices = value != 0;
            }
            _ => {
                tracing::debug!(name, "unknown context property");
                return Err(EntryError::InvalidProperty);
            }
        }

        pos += 2;
    }
    Ok(out)
}

/// View a zero-terminated C property list as a slice including its terminator.
///
/// # Safety
///
/// `ptr` must be null or point to a readable list of pairs terminated by a
/// zero name.
pub unsafe fn raw_properties<'a>(
    ptr: *const cl_context_properties,
) -> &'a [cl_context_properties] {
    if ptr.is_null() {
        return &[];
    }
    let mut len = 0usize;
    while unsafe { *ptr.add(len) } != 0 {
        len += 2;
    }
    unsafe { std::slice::from_raw_parts(ptr, len + 1) }
}
