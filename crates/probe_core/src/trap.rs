//! Guest failures as seen from the host.
//!
//! A [`Trap`] is the only way a guest callable reports failure across the boundary. It carries the
//! guest's shadow call stack at the point of failure so the host can render a filtered stack trace.

use std::fmt;

use thiserror::Error;

/// Why a guest callable stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrapCode {
    /// The guest called `env.abort` (failed assertion, explicit failure).
    Abort,
    /// The guest reached code it declared unreachable.
    Unreachable,
    /// A memory access fell outside linear memory.
    MemoryOutOfBounds,
    /// Linear memory could not grow to satisfy an allocation.
    OutOfMemory,
    /// A handle did not resolve to a function in the guest's table.
    IndirectCallToNull,
    /// The guest panicked; the host converted the unwind into a trap.
    Panic,
    /// The guest's function table has no free index left.
    TableOverflow,
}

impl fmt::Display for TrapCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            TrapCode::Abort => "abort",
            TrapCode::Unreachable => "unreachable",
            TrapCode::MemoryOutOfBounds => "memory access out of bounds",
            TrapCode::OutOfMemory => "out of memory",
            TrapCode::IndirectCallToNull => "indirect call to null",
            TrapCode::Panic => "panic",
            TrapCode::TableOverflow => "function table overflow",
        };
        f.write_str(text)
    }
}

/// One entry of the guest's shadow call stack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub function: String,
    /// Frames that belong to the guest execution engine itself (runner, dispatch).
    /// Hosts drop these when rendering stacks.
    pub internal: bool,
}

impl Frame {
    pub fn guest(function: impl Into<String>) -> Self {
        Self {
            function: function.into(),
            internal: false,
        }
    }

    pub fn internal(function: impl Into<String>) -> Self {
        Self {
            function: function.into(),
            internal: true,
        }
    }
}

/// A guest-raised failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{code}: {message}")]
pub struct Trap {
    code: TrapCode,
    message: String,
    frames: Vec<Frame>,
}

impl Trap {
    pub fn new(code: TrapCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            frames: Vec::new(),
        }
    }

    pub fn abort(message: impl Into<String>) -> Self {
        Self::new(TrapCode::Abort, message)
    }

    pub fn unreachable() -> Self {
        Self::new(TrapCode::Unreachable, "unreachable code executed")
    }

    /// Attach the shadow stack captured at the failure point (outermost frame first).
    pub fn with_frames(mut self, frames: Vec<Frame>) -> Self {
        self.frames = frames;
        self
    }

    pub fn code(&self) -> TrapCode {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trap_display_includes_code() {
        let trap = Trap::abort("Expected 2, received 3");
        assert_eq!(trap.to_string(), "abort: Expected 2, received 3");
        assert_eq!(trap.code(), TrapCode::Abort);
    }

    #[test]
    fn test_trap_keeps_frames() {
        let trap = Trap::unreachable().with_frames(vec![Frame::internal("~run"), Frame::guest("math adds")]);
        assert_eq!(trap.frames().len(), 2);
        assert!(trap.frames()[0].internal);
        assert!(!trap.frames()[1].internal);
    }
}
