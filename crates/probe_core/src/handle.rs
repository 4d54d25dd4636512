//! Opaque references to guest callables.

use std::fmt;

/// Numeric reference to a zero-argument guest callable (a test body or a hook).
///
/// The host never resolves a handle itself; it hands the handle back to the guest's
/// [`Invoke`](crate::Invoke) capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FnHandle(u32);

impl FnHandle {
    /// The "no function" handle. Calling it is a successful no-op.
    pub const NONE: FnHandle = FnHandle(u32::MAX);

    pub const fn new(index: u32) -> Self {
        Self(index)
    }

    pub const fn index(self) -> u32 {
        self.0
    }

    pub const fn is_none(self) -> bool {
        self.0 == u32::MAX
    }
}

impl fmt::Display for FnHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_none() {
            write!(f, "fn#none")
        } else {
            write!(f, "fn#{}", self.0)
        }
    }
}
