use std::sync::atomic::{AtomicUsize, Ordering};

use std::fmt;

static NEXT_HANDLE: AtomicUsize = AtomicUsize::new(1);

/// Process-unique identity of an opened VM.
///
/// Handles are never reused, so a stale raw value can not alias a VM opened
/// later. The raw form is what callbacks receive when only an untyped pointer
/// sized value crosses the boundary.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VmHandle(usize);

impl VmHandle {
    pub(crate) fn next() -> Self {
        VmHandle(NEXT_HANDLE.fetch_add(1, Ordering::Relaxed))
    }

    #[inline]
    pub fn as_raw(self) -> usize {
        self.0
    }

    #[inline]
    pub fn from_raw(raw: usize) -> Self {
        VmHandle(raw)
    }
}

impl fmt::Debug for VmHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "VmHandle({:#x})", self.0)
    }
}
