//! Guest linear memory.
//!
//! The guest owns one growable byte buffer. Strings and opaque byte ranges cross the boundary as addresses into
//! this buffer; the host only ever reads it.
//!
//! ## Layout
//!
//! - Address `0` is the null pointer and is never handed out.
//! - Allocations are bump-allocated and 8-byte aligned. Memory is released only by rewinding to an earlier
//!   [`LinearMemory::used`] mark with [`LinearMemory::reset_to`].
//! - A string is stored as a little-endian `u32` byte length followed by its UTF-8 bytes. The string's address
//!   points at the length header.
//! - A byte range has no header; its length travels next to its address.

use thiserror::Error;

use crate::trap::{Trap, TrapCode};

/// Address inside a guest's linear memory.
pub type Pointer = u32;

/// Size of one memory page in bytes.
pub const PAGE_SIZE: usize = 64 * 1024;

/// Default page limit (16 MiB).
pub const DEFAULT_MAX_PAGES: usize = 256;

const HEAP_BASE: usize = 8;
const ALIGN: usize = 8;
const STRING_HEADER: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MemoryError {
    #[error("null pointer dereference")]
    NullPointer,

    #[error("access of {len} bytes at {ptr:#x} is out of bounds (memory size {size})")]
    OutOfBounds { ptr: Pointer, len: usize, size: usize },

    #[error("cannot grow memory to {requested} bytes (limit {limit})")]
    OutOfMemory { requested: usize, limit: usize },

    #[error("string at {ptr:#x} is not valid UTF-8")]
    InvalidUtf8 { ptr: Pointer },
}

impl From<MemoryError> for Trap {
    fn from(err: MemoryError) -> Self {
        let code = match err {
            MemoryError::OutOfMemory { .. } => TrapCode::OutOfMemory,
            _ => TrapCode::MemoryOutOfBounds,
        };
        Trap::new(code, err.to_string())
    }
}

/// A guest's private, growable byte buffer.
#[derive(Debug, Clone)]
pub struct LinearMemory {
    bytes: Vec<u8>,
    top: usize,
    max_pages: usize,
}

impl Default for LinearMemory {
    fn default() -> Self {
        Self::new()
    }
}

impl LinearMemory {
    /// Create a memory of one page with the default page limit.
    pub fn new() -> Self {
        Self::with_max_pages(DEFAULT_MAX_PAGES)
    }

    pub fn with_max_pages(max_pages: usize) -> Self {
        let max_pages = max_pages.max(1);
        Self {
            bytes: vec![0; PAGE_SIZE],
            top: HEAP_BASE,
            max_pages,
        }
    }

    /// Current memory size in bytes.
    pub fn size(&self) -> usize {
        self.bytes.len()
    }

    /// Bytes handed out so far, including the reserved null region.
    pub fn used(&self) -> usize {
        self.top
    }

    /// Reserve `len` zeroed bytes and return their address.
    pub fn alloc(&mut self, len: usize) -> Result<Pointer, MemoryError> {
        let start = self.top.next_multiple_of(ALIGN);
        let end = start.checked_add(len).ok_or(MemoryError::OutOfMemory {
            requested: usize::MAX,
            limit: self.limit(),
        })?;
        if end > self.bytes.len() {
            self.grow_to(end)?;
        }
        self.top = end;
        Pointer::try_from(start).map_err(|_| MemoryError::OutOfMemory {
            requested: end,
            limit: self.limit(),
        })
    }

    /// Release every allocation made since `used()` returned `mark`. Released bytes are zeroed; the memory does
    /// not shrink. A mark above the current top is ignored.
    pub fn reset_to(&mut self, mark: usize) {
        let mark = mark.max(HEAP_BASE);
        if mark >= self.top {
            return;
        }
        self.bytes[mark..self.top].fill(0);
        self.top = mark;
    }

    /// Copy `data` into fresh memory and return its address.
    pub fn alloc_bytes(&mut self, data: &[u8]) -> Result<Pointer, MemoryError> {
        let ptr = self.alloc(data.len())?;
        let start = ptr as usize;
        self.bytes[start..start + data.len()].copy_from_slice(data);
        Ok(ptr)
    }

    /// Store a length-prefixed string and return the address of its header.
    pub fn alloc_string(&mut self, text: &str) -> Result<Pointer, MemoryError> {
        let len = u32::try_from(text.len()).map_err(|_| MemoryError::OutOfMemory {
            requested: text.len(),
            limit: self.limit(),
        })?;
        let ptr = self.alloc(STRING_HEADER + text.len())?;
        let start = ptr as usize;
        self.bytes[start..start + STRING_HEADER].copy_from_slice(&len.to_le_bytes());
        self.bytes[start + STRING_HEADER..start + STRING_HEADER + text.len()].copy_from_slice(text.as_bytes());
        Ok(ptr)
    }

    /// Borrow `len` bytes starting at `ptr`.
    pub fn read_bytes(&self, ptr: Pointer, len: usize) -> Result<&[u8], MemoryError> {
        let start = ptr as usize;
        let end = start.checked_add(len).ok_or(MemoryError::OutOfBounds {
            ptr,
            len,
            size: self.bytes.len(),
        })?;
        self.bytes.get(start..end).ok_or(MemoryError::OutOfBounds {
            ptr,
            len,
            size: self.bytes.len(),
        })
    }

    /// Decode the length-prefixed string whose header lives at `ptr`.
    pub fn read_string(&self, ptr: Pointer) -> Result<String, MemoryError> {
        if ptr == 0 {
            return Err(MemoryError::NullPointer);
        }
        let header = self.read_bytes(ptr, STRING_HEADER)?;
        let mut len = [0u8; STRING_HEADER];
        len.copy_from_slice(header);
        let len = u32::from_le_bytes(len) as usize;
        let body_ptr = ptr.checked_add(STRING_HEADER as Pointer).ok_or(MemoryError::OutOfBounds {
            ptr,
            len,
            size: self.bytes.len(),
        })?;
        let body = self.read_bytes(body_ptr, len)?;
        String::from_utf8(body.to_vec()).map_err(|_| MemoryError::InvalidUtf8 { ptr })
    }

    /// Mutable view of memory for guest code that writes in place.
    pub fn bytes_mut(&mut self, ptr: Pointer, len: usize) -> Result<&mut [u8], MemoryError> {
        let size = self.bytes.len();
        let start = ptr as usize;
        let end = start
            .checked_add(len)
            .ok_or(MemoryError::OutOfBounds { ptr, len, size })?;
        self.bytes
            .get_mut(start..end)
            .ok_or(MemoryError::OutOfBounds { ptr, len, size })
    }

    fn limit(&self) -> usize {
        self.max_pages * PAGE_SIZE
    }

    fn grow_to(&mut self, end: usize) -> Result<(), MemoryError> {
        let pages = end.div_ceil(PAGE_SIZE);
        if pages > self.max_pages {
            return Err(MemoryError::OutOfMemory {
                requested: end,
                limit: self.limit(),
            });
        }
        self.bytes.resize(pages * PAGE_SIZE, 0);
        Ok(())
    }
}
