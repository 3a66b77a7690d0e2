//! Strided N-dimensional arrays with static or runtime element types.
//!
//! This crate bundles the two layers of the workspace:
//!
//! - [`strided_dtype`]: scalar type tags ([`DType`], [`Element`], [`Erased`])
//! - [`strided_view`]: the array container ([`StridedArray`]) with its
//!   buffer-release handles and aligned allocator
//!
//! # Example
//!
//! ```rust
//! use strided_array::{BufferHandle, DType, Erased, StridedArray};
//!
//! // Fresh, zero-filled, 128-byte aligned row-major buffer.
//! let a = StridedArray::<f64>::zeros(&[4, 5]).unwrap();
//! assert_eq!(a.strides(), &[5, 1]);
//! assert_eq!(a.ncontig(), 2);
//!
//! // Wrap caller memory with a padded row pitch.
//! let mut data = vec![0.0f64; 40];
//! let padded = unsafe {
//!     StridedArray::<Erased>::from_raw_parts(
//!         data.as_mut_ptr() as *mut u8,
//!         DType::Float64,
//!         &[4, 5],
//!         &[10, 1],
//!         BufferHandle::noop(),
//!     )
//! }
//! .unwrap();
//! assert_eq!(padded.ncontig(), 1);
//! assert_eq!(padded.contiguous_len(), 5);
//! ```

pub use strided_dtype::{
    byte_size_of, check_dtype, dtype_of, is_valid, name_of, DType, DTypeError, Element,
    ElementKind, Erased,
};
pub use strided_view::{
    check_ndim, contiguous_axes, row_major_strides, AlignedBuffer, AllocOptions, ArrayError,
    BufferHandle, BufferOwner, Result, StridedArray, DEFAULT_ALIGN, INLINE_NDIM, MAX_NDIM,
};

pub use strided_dtype;
pub use strided_view;
