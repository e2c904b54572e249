//! Write-if-present destinations for `*_ret` parameters.

/// A caller-provided output location that may be absent.
///
/// Writing to an absent output is a no-op. This is the only way the boundary
/// stores into caller memory for optional results (`errcode_ret`,
/// `param_value_size_ret`, `num_devices`, ...).
pub struct OptionalOutput<'a, T> {
    slot: Option<&'a mut T>,
}

impl<'a, T> OptionalOutput<'a, T> {
    pub fn new(slot: Option<&'a mut T>) -> Self {
        OptionalOutput { slot }
    }

    pub fn absent() -> Self {
        OptionalOutput { slot: None }
    }

    /// # Safety
    ///
    /// `ptr` must be null or valid for writes of `T` for `'a`.
    pub unsafe fn from_raw(ptr: *mut T) -> Self {
        OptionalOutput {
            slot: unsafe { ptr.as_mut() },
        }
    }

    pub fn is_present(&self) -> bool {
        self.slot.is_some()
    }

    pub fn write(&mut self, value: T) {
        if let Some(slot) = self.slot.as_deref_mut() {
            *slot = value;
        }
    }
}

impl<T> Default for OptionalOutput<'_, T> {
    fn default() -> Self {
        OptionalOutput::absent()
    }
}

impl<'a, T> From<&'a mut T> for OptionalOutput<'a, T> {
    fn from(slot: &'a mut T) -> Self {
        OptionalOutput { slot: Some(slot) }
    }
}
