//! The `clGet*Info` protocol: copy a field's bytes into a caller buffer.
//!
//! A query names one field. The caller either asks for its size only (null
//! buffer), or passes a buffer of some capacity. A buffer smaller than the
//! field fails without touching anything; a larger buffer receives the field
//! followed by zeroes up to its capacity.

use crate::error::{EntryError, EntryResult};
use crate::output::OptionalOutput;
use std::ffi::{c_char, c_void, CStr, CString};

/// Where the authoritative bytes of a field live, and how many there are.
#[derive(Debug, Clone, Copy)]
pub struct FieldDescriptor<'a> {
    bytes: &'a [u8],
}

impl<'a> FieldDescriptor<'a> {
    pub fn as_bytes(&self) -> &'a [u8] {
        self.bytes
    }

    pub fn as_ptr(&self) -> *const u8 {
        self.bytes.as_ptr()
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// The two size rules a field can follow.
#[derive(Debug, Clone, Copy)]
pub enum FieldKind<'a> {
    /// Fixed-size value; reported length is `size_of::<T>()`.
    Scalar { bytes: &'a [u8] },
    /// NUL-terminated text; reported length is `strlen + 1`.
    Text { text: &'a CStr },
}

impl<'a> FieldKind<'a> {
    /// View a fixed-size value as its in-memory bytes.
    ///
    /// # Safety
    ///
    /// `T` must have no padding bytes (every byte of the value is initialized).
    pub unsafe fn scalar<T: Copy>(value: &'a T) -> FieldKind<'a> {
        let bytes = unsafe {
            std::slice::from_raw_parts(value as *const T as *const u8, std::mem::size_of::<T>())
        };
        FieldKind::Scalar { bytes }
    }

    pub fn descriptor(self) -> FieldDescriptor<'a> {
        match self {
            FieldKind::Scalar { bytes } => FieldDescriptor { bytes },
            FieldKind::Text { text } => FieldDescriptor {
                bytes: text.to_bytes_with_nul(),
            },
        }
    }
}

/// A value that can answer an info query.
pub trait InfoField {
    fn field_kind(&self) -> FieldKind<'_>;

    fn descriptor(&self) -> FieldDescriptor<'_> {
        self.field_kind().descriptor()
    }
}

/// Implement [`InfoField`] for fixed-size types using the scalar size rule.
///
/// Only use this for types without padding bytes (primitives and `#[repr(C)]`
/// structs whose fields are laid out back to back).
#[macro_export]
macro_rules! impl_scalar_info_field {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl $crate::info::InfoField for $ty {
                fn field_kind(&self) -> $crate::info::FieldKind<'_> {
                    unsafe { $crate::info::FieldKind::scalar(self) }
                }
            }
        )+
    };
}

impl_scalar_info_field!(u8, i8, u16, i16, u32, i32, u64, i64, usize, isize, f32, f64);

impl<T> InfoField for *mut T {
    fn field_kind(&self) -> FieldKind<'_> {
        unsafe { FieldKind::scalar(self) }
    }
}

impl<T> InfoField for *const T {
    fn field_kind(&self) -> FieldKind<'_> {
        unsafe { FieldKind::scalar(self) }
    }
}

impl InfoField for CStr {
    fn field_kind(&self) -> FieldKind<'_> {
        FieldKind::Text { text: self }
    }
}

impl InfoField for CString {
    fn field_kind(&self) -> FieldKind<'_> {
        FieldKind::Text {
            text: self.as_c_str(),
        }
    }
}

/// Fixed-capacity character arrays follow the text rule up to their first NUL.
/// An array with no NUL is reported whole, as a fixed-size value.
impl<const N: usize> InfoField for [c_char; N] {
    fn field_kind(&self) -> FieldKind<'_> {
        let bytes = unsafe { std::slice::from_raw_parts(self.as_ptr() as *const u8, N) };
        match CStr::from_bytes_until_nul(bytes) {
            Ok(text) => FieldKind::Text { text },
            Err(_) => FieldKind::Scalar { bytes },
        }
    }
}

/// Copy `bytes` into `dest` following the size-negotiation rules.
pub fn copy_info(
    bytes: &[u8],
    dest: Option<&mut [u8]>,
    mut size_ret: OptionalOutput<'_, usize>,
) -> EntryResult<()> {
    if let Some(dest) = dest.as_deref() {
        if dest.len() < bytes.len() {
            return Err(EntryError::InvalidValue);
        }
    }

    size_ret.write(bytes.len());
    if let Some(dest) = dest {
        let (head, tail) = dest.split_at_mut(bytes.len());
        head.copy_from_slice(bytes);
        tail.fill(0);
    }
    Ok(())
}

/// Describe `field` into `dest`.
pub fn describe<F: InfoField + ?Sized>(
    field: &F,
    dest: Option<&mut [u8]>,
    size_ret: OptionalOutput<'_, usize>,
) -> EntryResult<()> {
    copy_info(field.descriptor().as_bytes(), dest, size_ret)
}

/// Raw-pointer form used by the `clGet*Info` entry points.
///
/// # Safety
///
/// `param_value` must be null or valid for writes of `param_value_size` bytes;
/// `param_value_size_ret` must be null or valid for a `usize` write.
pub unsafe fn get_info<F: InfoField + ?Sized>(
    field: &F,
    param_value_size: usize,
    param_value: *mut c_void,
    param_value_size_ret: *mut usize,
) -> EntryResult<()> {
    let dest = if param_value.is_null() {
        None
    } else {
        Some(unsafe { std::slice::from_raw_parts_mut(param_value as *mut u8, param_value_size) })
    };
    let size_ret = unsafe { OptionalOutput::from_raw(param_value_size_ret) };
    describe(field, dest, size_ret)
}
