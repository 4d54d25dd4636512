//! What a running guest callable sees: its memory, the host primitives, and its own call stack.

use std::panic::Location;

use probe_core::{Caller, Frame, HostImports, ImportName, LinearMemory, PerfOverride, Pointer, Trap, TrapCode};

use crate::expect::{Expectation, GuestValue};

/// Execution environment handed to test bodies and hooks.
pub struct Env<'a> {
    memory: &'a mut LinearMemory,
    host: &'a mut dyn HostImports,
    frames: &'a mut Vec<Frame>,
}

impl<'a> Env<'a> {
    pub fn new(memory: &'a mut LinearMemory, host: &'a mut dyn HostImports, frames: &'a mut Vec<Frame>) -> Self {
        Self { memory, host, frames }
    }

    pub fn memory(&mut self) -> &mut LinearMemory {
        &mut *self.memory
    }

    /// Current shadow stack, outermost first.
    pub fn frames(&self) -> &[Frame] {
        self.frames.as_slice()
    }

    /// Start an assertion on `actual`.
    pub fn expect(&mut self, actual: impl Into<GuestValue>) -> Expectation<'_, 'a> {
        Expectation::new(self, actual.into())
    }

    /// Attach a value to the running test (or, outside a test, to the running group).
    pub fn log(&mut self, value: impl Into<GuestValue>) -> Result<(), Trap> {
        match value.into() {
            GuestValue::Null => self.with_caller(|host, caller| host.log_null(caller)),
            GuestValue::Number(n) => self.with_caller(|host, caller| host.log_value(caller, n)),
            GuestValue::Str(text) => self.with_string(&text, |host, caller, ptr| host.log_string(caller, ptr))?,
            GuestValue::Bytes(bytes) => {
                self.with_reference(&bytes, |host, caller, ptr, len| host.log_reference(caller, ptr, len))?;
            }
        }
        Ok(())
    }

    /// Report `message` through `env.abort` and build the trap the caller should return.
    ///
    /// ```ignore
    /// if total != 3 {
    ///     return Err(env.abort("total mismatch"));
    /// }
    /// ```
    #[track_caller]
    pub fn abort(&mut self, message: &str) -> Trap {
        let location = Location::caller();
        let frames = self.frames.clone();
        let mark = self.memory.used();
        let message_ptr = match self.memory.alloc_string(message) {
            Ok(ptr) => ptr,
            Err(err) => return Trap::from(err).with_frames(frames),
        };
        let file_ptr = self.memory.alloc_string(location.file()).unwrap_or(0);
        self.with_caller(|host, caller| {
            host.abort(caller, message_ptr, file_ptr, location.line(), location.column());
        });
        self.memory.reset_to(mark);
        Trap::abort(message).with_frames(frames)
    }

    /// `Err(self.abort(message))`.
    #[track_caller]
    pub fn fail<T>(&mut self, message: &str) -> Result<T, Trap> {
        Err(self.abort(message))
    }

    /// A trap that does not go through `env.abort`.
    pub fn unreachable(&self) -> Trap {
        Trap::unreachable().with_frames(self.frames.clone())
    }

    pub fn debug(&mut self) {
        self.host.debug();
    }

    /// Override a performance setting for the running test.
    pub fn performance(&mut self, option: PerfOverride) {
        self.host.override_performance(option);
    }

    /// Call a custom import linked by the host.
    pub fn call_import(&mut self, module: &str, name: &str, args: &[f64]) -> Result<f64, Trap> {
        let import = ImportName::new(module, name);
        self.host.call_import(&import, args).ok_or_else(|| {
            Trap::new(TrapCode::Unreachable, format!("import `{import}` is not linked")).with_frames(self.frames.clone())
        })
    }

    // ---- reporting used by expectations -------------------------------------

    pub(crate) fn report_actual(&mut self, value: &GuestValue) -> Result<(), Trap> {
        match value {
            GuestValue::Null => self.with_caller(|host, caller| host.report_actual_null(caller)),
            GuestValue::Number(n) => {
                let n = *n;
                self.with_caller(|host, caller| host.report_actual_value(caller, n));
            }
            GuestValue::Str(text) => {
                self.with_string(text, |host, caller, ptr| host.report_actual_string(caller, ptr))?;
            }
            GuestValue::Bytes(bytes) => {
                self.with_reference(bytes, |host, caller, ptr, len| host.report_actual_reference(caller, ptr, len))?;
            }
        }
        Ok(())
    }

    pub(crate) fn report_expected(&mut self, value: &GuestValue, negated: bool) -> Result<(), Trap> {
        match value {
            GuestValue::Null => self.with_caller(|host, caller| host.report_expected_null(caller, negated)),
            GuestValue::Number(n) => {
                let n = *n;
                self.with_caller(|host, caller| host.report_expected_value(caller, n, negated));
            }
            GuestValue::Str(text) => {
                self.with_string(text, |host, caller, ptr| host.report_expected_string(caller, ptr, negated))?;
            }
            GuestValue::Bytes(bytes) => {
                self.with_reference(bytes, |host, caller, ptr, len| {
                    host.report_expected_reference(caller, ptr, len, negated);
                })?;
            }
        }
        Ok(())
    }

    pub(crate) fn with_caller<R>(&mut self, f: impl FnOnce(&mut dyn HostImports, &Caller<'_>) -> R) -> R {
        let caller = Caller::new(&*self.memory, self.frames.as_slice());
        f(&mut *self.host, &caller)
    }

    /// Stage `text` in memory for one host primitive. The host copies it out, so the space is released on return.
    fn with_string(
        &mut self,
        text: &str,
        f: impl FnOnce(&mut dyn HostImports, &Caller<'_>, Pointer),
    ) -> Result<(), Trap> {
        let mark = self.memory.used();
        let ptr = self.memory.alloc_string(text)?;
        self.with_caller(|host, caller| f(host, caller, ptr));
        self.memory.reset_to(mark);
        Ok(())
    }

    fn with_reference(
        &mut self,
        bytes: &[u8],
        f: impl FnOnce(&mut dyn HostImports, &Caller<'_>, Pointer, u32),
    ) -> Result<(), Trap> {
        let len = u32::try_from(bytes.len())
            .map_err(|_| Trap::new(TrapCode::OutOfMemory, "reference is larger than guest memory"))?;
        let mark = self.memory.used();
        let ptr = self.memory.alloc_bytes(bytes)?;
        self.with_caller(|host, caller| f(host, caller, ptr, len));
        self.memory.reset_to(mark);
        Ok(())
    }
}
