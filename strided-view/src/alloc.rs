//! Aligned byte buffers backing freshly allocated arrays.

use std::alloc::Layout;
use std::ptr::NonNull;

use crate::buffer::BufferOwner;
use crate::{ArrayError, Result};

/// Default byte alignment of fresh array buffers.
pub const DEFAULT_ALIGN: usize = 128;

/// Options for fresh allocations.
///
/// The default is a zero-filled buffer aligned to [`DEFAULT_ALIGN`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AllocOptions {
    align: usize,
    zeroed: bool,
}

impl Default for AllocOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl AllocOptions {
    pub const fn new() -> Self {
        Self {
            align: DEFAULT_ALIGN,
            zeroed: true,
        }
    }

    /// Byte alignment of the buffer. Must be a power of two.
    pub const fn align(mut self, align: usize) -> Self {
        self.align = align;
        self
    }

    /// Skip zero-filling the buffer.
    ///
    /// # Safety
    /// The caller must write every element before reading any of them through
    /// the array (including via `as_slice` and `as_bytes`).
    pub const unsafe fn uninitialized(mut self) -> Self {
        self.zeroed = false;
        self
    }

    #[inline]
    pub const fn alignment(&self) -> usize {
        self.align
    }

    #[inline]
    pub const fn is_zeroed(&self) -> bool {
        self.zeroed
    }
}

/// A heap block obtained from the global allocator with explicit alignment.
///
/// The block is released when the value is dropped. Zero-byte requests do not
/// touch the allocator and yield an aligned dangling pointer.
pub struct AlignedBuffer {
    ptr: NonNull<u8>,
    layout: Layout,
}

// The buffer is plain bytes; all access goes through raw pointers whose
// synchronisation is the caller's responsibility.
unsafe impl Send for AlignedBuffer {}
unsafe impl Sync for AlignedBuffer {}

impl AlignedBuffer {
    /// Allocate `nbytes` bytes aligned to `align`, optionally zero-filled.
    pub fn new(nbytes: usize, align: usize, zeroed: bool) -> Result<Self> {
        let failure = ArrayError::AllocationFailure {
            context: "AlignedBuffer::new",
            bytes: nbytes,
            align,
        };
        let layout = Layout::from_size_align(nbytes, align).map_err(|_| failure.clone())?;

        if nbytes == 0 {
            // `align` is a non-zero power of two here, so it is a valid address.
            let ptr = NonNull::new(align as *mut u8).ok_or(failure)?;
            return Ok(Self { ptr, layout });
        }

        let raw = unsafe {
            if zeroed {
                std::alloc::alloc_zeroed(layout)
            } else {
                std::alloc::alloc(layout)
            }
        };
        let ptr = NonNull::new(raw).ok_or(failure)?;
        tracing::debug!(bytes = nbytes, align, zeroed, "allocated array buffer");
        Ok(Self { ptr, layout })
    }

    /// Allocate with the settings in `opts`.
    pub fn with_options(nbytes: usize, opts: &AllocOptions) -> Result<Self> {
        Self::new(nbytes, opts.align, opts.zeroed)
    }

    #[inline]
    pub fn as_ptr(&self) -> *mut u8 {
        self.ptr.as_ptr()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.layout.size()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.layout.size() == 0
    }

    #[inline]
    pub fn align(&self) -> usize {
        self.layout.align()
    }
}

impl Drop for AlignedBuffer {
    fn drop(&mut self) {
        if self.layout.size() == 0 {
            return;
        }
        tracing::trace!(bytes = self.layout.size(), "releasing array buffer");
        unsafe { std::alloc::dealloc(self.ptr.as_ptr(), self.layout) };
    }
}

impl BufferOwner for AlignedBuffer {
    fn capacity_bytes(&self) -> Option<usize> {
        Some(self.len())
    }
}

impl std::fmt::Debug for AlignedBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AlignedBuffer")
            .field("ptr", &self.ptr)
            .field("len", &self.len())
            .field("align", &self.align())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn is_aligned(ptr: *const u8, align: usize) -> bool {
        (ptr as usize) & (align - 1) == 0
    }

    #[test]
    fn test_default_options() {
        let opts = AllocOptions::default();
        assert_eq!(opts.alignment(), DEFAULT_ALIGN);
        assert!(opts.is_zeroed());
        let opts = unsafe { AllocOptions::new().align(64).uninitialized() };
        assert_eq!(opts.alignment(), 64);
        assert!(!opts.is_zeroed());
    }

    #[test]
    fn test_zeroed_and_aligned() {
        let buf = AlignedBuffer::new(1000, DEFAULT_ALIGN, true).unwrap();
        assert_eq!(buf.len(), 1000);
        assert!(is_aligned(buf.as_ptr(), DEFAULT_ALIGN));
        let bytes = unsafe { std::slice::from_raw_parts(buf.as_ptr(), buf.len()) };
        assert!(bytes.iter().all(|&b| b == 0));
    }

    #[test]
    fn test_custom_alignment() {
        for align in [1, 8, 64, 4096] {
            let buf = AlignedBuffer::new(17, align, false).unwrap();
            assert!(is_aligned(buf.as_ptr(), align));
            assert_eq!(buf.align(), align);
        }
    }

    #[test]
    fn test_zero_bytes() {
        let buf = AlignedBuffer::new(0, DEFAULT_ALIGN, true).unwrap();
        assert!(buf.is_empty());
        assert!(!buf.as_ptr().is_null());
        assert!(is_aligned(buf.as_ptr(), DEFAULT_ALIGN));
    }

    #[test]
    fn test_bad_alignment() {
        let err = AlignedBuffer::new(16, 3, true).unwrap_err();
        assert!(matches!(
            err,
            ArrayError::AllocationFailure {
                bytes: 16,
                align: 3,
                ..
            }
        ));
    }

    #[test]
    fn test_oversized_request() {
        let err = AlignedBuffer::new(usize::MAX - 64, DEFAULT_ALIGN, false).unwrap_err();
        assert!(matches!(err, ArrayError::AllocationFailure { .. }));
    }

    #[test]
    fn test_capacity_reported() {
        let buf = AlignedBuffer::new(48, 16, true).unwrap();
        assert_eq!(buf.capacity_bytes(), Some(48));
    }
}
