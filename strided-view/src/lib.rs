//! Strided N-dimensional array container over shared, aligned buffers.
//!
//! An array is a shape/stride description plus a runtime [`DType`] over a
//! buffer that may be shared with other arrays. It never touches element
//! values; numeric kernels are expected to build on top of it.
//!
//! # Core Types
//!
//! - [`StridedArray<T>`]: statically typed array, `T` a concrete [`Element`]
//! - [`StridedArray<Erased>`]: dynamically typed array, the runtime tag is
//!   authoritative
//! - [`BufferHandle`] / [`BufferOwner`]: shared exactly-once release of the
//!   backing allocation
//! - [`AlignedBuffer`] / [`AllocOptions`]: aligned, optionally zero-filled
//!   allocation for fresh arrays
//!
//! # Construction
//!
//! - fresh allocation: [`StridedArray::zeros`], [`StridedArray::allocate`]
//! - wrapping memory: [`StridedArray::from_raw_parts`],
//!   [`StridedArray::from_vec`], [`StridedArray::from_vec_strided`]
//! - conversion: [`StridedArray::from_array`], [`StridedArray::view_as`],
//!   [`StridedArray::assign_from`]
//!
//! # Example
//!
//! ```rust
//! use strided_view::{DType, Erased, StridedArray};
//!
//! let erased = StridedArray::<Erased>::zeros_with_dtype(&[2, 3], DType::Float32).unwrap();
//! let typed = erased.view_as::<f32>().unwrap();
//! assert!(typed.shares_buffer_with(&erased));
//! assert!(erased.view_as::<i32>().is_err());
//! ```

pub mod alloc;
pub mod buffer;
pub mod layout;
pub mod view;

pub use alloc::{AlignedBuffer, AllocOptions, DEFAULT_ALIGN};
pub use buffer::{BufferHandle, BufferOwner};
pub use layout::{check_ndim, contiguous_axes, row_major_strides};
pub use view::StridedArray;

pub use strided_dtype::{DType, DTypeError, Element, ElementKind, Erased};

// ============================================================================
// Constants
// ============================================================================

/// Largest supported number of dimensions.
pub const MAX_NDIM: usize = 100;

/// Ranks up to this size keep shape and strides inline in the array.
pub const INLINE_NDIM: usize = 6;

// ============================================================================
// Error types
// ============================================================================

/// Errors raised while constructing or converting arrays.
///
/// Every variant names the operation that failed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ArrayError {
    /// `ndim` is negative or larger than [`MAX_NDIM`].
    #[error("{context}: attempt to create array with ndim {ndim} outside [0, {}]", MAX_NDIM)]
    DimensionOutOfRange { context: &'static str, ndim: isize },

    /// A shape extent is negative.
    #[error("{context}: negative array dimension {extent} on axis {axis}")]
    NegativeDimension {
        context: &'static str,
        axis: usize,
        extent: isize,
    },

    /// Invalid runtime tag, or a concrete element type that disagrees with one.
    #[error(transparent)]
    DType(#[from] DTypeError),

    /// Shape and strides have different lengths.
    #[error("{context}: {shape} extents but {strides} strides")]
    StrideLengthMismatch {
        context: &'static str,
        shape: usize,
        strides: usize,
    },

    /// A stride is smaller in magnitude than the dense stride of its axis.
    #[error("{context}: stride {stride} on axis {axis} is smaller than dense stride {dense}")]
    StrideTooSmall {
        context: &'static str,
        axis: usize,
        stride: isize,
        dense: isize,
    },

    /// Element count or byte size does not fit in the address space.
    #[error("{context}: array size overflows")]
    SizeOverflow { context: &'static str },

    /// The allocator could not satisfy the request.
    #[error("{context}: couldn't allocate {bytes} bytes aligned to {align}")]
    AllocationFailure {
        context: &'static str,
        bytes: usize,
        align: usize,
    },

    /// A supplied buffer does not hold exactly the elements the shape needs.
    #[error("{context}: buffer holds {len} elements, shape needs {needed}")]
    BufferLengthMismatch {
        context: &'static str,
        len: usize,
        needed: usize,
    },

    /// Strided access would leave the supplied buffer.
    #[error("{context}: strided access out of bounds for buffer of {len} elements")]
    OutOfBounds { context: &'static str, len: usize },
}

/// Result type for array operations.
pub type Result<T> = std::result::Result<T, ArrayError>;
