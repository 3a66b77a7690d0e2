//! Strided N-dimensional arrays over shared buffers.
//!
//! - [`StridedArray<T>`]: element type known at compile time
//! - [`StridedArray<Erased>`]: element type carried by the runtime [`DType`]
//!
//! Both are thin wrappers around one non-generic core; converting between
//! them checks the tag and produces a new view of the same buffer.

use std::marker::PhantomData;

use strided_dtype::{check_dtype, DType, Element, ElementKind, Erased};

use crate::alloc::{AlignedBuffer, AllocOptions};
use crate::buffer::BufferHandle;
use crate::layout::{self, ShapeStrides};
use crate::{ArrayError, Result};

// ============================================================================
// RawArray
// ============================================================================

/// Type-independent state of an array view.
#[derive(Clone)]
struct RawArray {
    data: *mut u8,
    dtype: DType,
    itemsize: usize,
    size: usize,
    ncontig: usize,
    layout: ShapeStrides,
    buffer: BufferHandle,
}

impl RawArray {
    /// Fresh dense row-major array. `dtype` must already be validated.
    fn allocate(
        shape: &[isize],
        dtype: DType,
        opts: &AllocOptions,
        context: &'static str,
    ) -> Result<Self> {
        let itemsize = dtype.byte_size()?;
        let (layout, size) = ShapeStrides::row_major(shape, context)?;
        let nbytes = size
            .checked_mul(itemsize)
            .ok_or(ArrayError::SizeOverflow { context })?;

        // never below the element's own alignment
        let opts = opts.align(opts.alignment().max(itemsize));
        let block =
            AlignedBuffer::with_options(nbytes, &opts).map_err(|err| match err {
                ArrayError::AllocationFailure { bytes, align, .. } => {
                    ArrayError::AllocationFailure {
                        context,
                        bytes,
                        align,
                    }
                }
                other => other,
            })?;
        let data = block.as_ptr();
        let buffer = BufferHandle::new(block);
        debug_assert!(buffer.capacity_bytes().unwrap_or(0) >= nbytes);

        tracing::debug!(%dtype, ?shape, size, "allocated strided array");
        Ok(Self {
            data,
            dtype,
            itemsize,
            size,
            ncontig: layout.ndim(),
            layout,
            buffer,
        })
    }

    /// Wrap existing memory. `dtype` must already be validated.
    fn wrap(
        data: *mut u8,
        dtype: DType,
        shape: &[isize],
        strides: &[isize],
        buffer: BufferHandle,
        context: &'static str,
    ) -> Result<Self> {
        let itemsize = dtype.byte_size()?;
        let (size, ncontig) = layout::finalize(shape, strides, context)?;
        Ok(Self {
            data,
            dtype,
            itemsize,
            size,
            ncontig,
            layout: ShapeStrides::from_parts(shape, strides),
            buffer,
        })
    }

    /// Whether `other` describes exactly this view.
    fn same_view(&self, other: &RawArray) -> bool {
        self.data == other.data
            && self.dtype == other.dtype
            && self.buffer.ptr_eq(&other.buffer)
            && self.layout == other.layout
    }

    /// Overwrite in place, keeping this instance's shape/stride block.
    fn assign(&mut self, other: &RawArray) {
        self.data = other.data;
        self.dtype = other.dtype;
        self.itemsize = other.itemsize;
        self.size = other.size;
        self.ncontig = other.ncontig;
        self.layout.assign(&other.layout);
        self.buffer = other.buffer.clone();
    }
}

// ============================================================================
// StridedArray
// ============================================================================

/// Strided N-dimensional array view over a shared buffer.
///
/// `K` is either a concrete [`Element`] scalar, in which case the runtime
/// dtype always equals `K::DTYPE`, or [`Erased`], in which case the runtime
/// dtype is authoritative.
///
/// Cloning or converting an array produces a new view with its own
/// shape/stride storage that shares the data address and the
/// [`BufferHandle`]. The buffer is released once the last view is dropped.
pub struct StridedArray<K: ElementKind = Erased> {
    raw: RawArray,
    _kind: PhantomData<fn() -> K>,
}

// Views only hand out shared access safely; the handle's count is atomic.
unsafe impl<K: ElementKind> Send for StridedArray<K> {}
unsafe impl<K: ElementKind> Sync for StridedArray<K> {}

impl<K: ElementKind> Clone for StridedArray<K> {
    fn clone(&self) -> Self {
        Self {
            raw: self.raw.clone(),
            _kind: PhantomData,
        }
    }
}

impl<K: ElementKind> std::fmt::Debug for StridedArray<K> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StridedArray")
            .field("dtype", &self.raw.dtype)
            .field("shape", &self.shape())
            .field("strides", &self.strides())
            .field("ncontig", &self.raw.ncontig)
            .finish()
    }
}

impl<K: ElementKind> StridedArray<K> {
    #[inline]
    fn from_raw(raw: RawArray) -> Self {
        Self {
            raw,
            _kind: PhantomData,
        }
    }

    /// Allocate a fresh, densely packed row-major array.
    ///
    /// For a concrete `K`, `dtype` must equal `K::DTYPE`; for [`Erased`] it
    /// must be a valid tag. The buffer is zero-filled unless `opts` opted out.
    pub fn allocate(shape: &[isize], dtype: DType, opts: &AllocOptions) -> Result<Self> {
        const CONTEXT: &str = "StridedArray::allocate";
        layout::check_rank(shape, CONTEXT)?;
        let dtype = check_dtype::<K>(dtype, CONTEXT)?;
        RawArray::allocate(shape, dtype, opts, CONTEXT).map(Self::from_raw)
    }

    /// Allocate a zero-filled array of the given runtime type.
    pub fn zeros_with_dtype(shape: &[isize], dtype: DType) -> Result<Self> {
        Self::allocate(shape, dtype, &AllocOptions::default())
    }

    /// Wrap existing memory as a strided view without copying.
    ///
    /// `strides` are in elements and may be negative. Each stride must be at
    /// least as large in magnitude as the dense stride of its axis. The array
    /// keeps a clone of `buffer`; pass [`BufferHandle::noop`] when the caller
    /// keeps the memory alive some other way.
    ///
    /// # Safety
    /// `data` must be valid for reads of every element reachable through
    /// `shape` and `strides` and suitably aligned for `dtype`, for as long as
    /// any view derived from the result is alive.
    pub unsafe fn from_raw_parts(
        data: *mut u8,
        dtype: DType,
        shape: &[isize],
        strides: &[isize],
        buffer: BufferHandle,
    ) -> Result<Self> {
        const CONTEXT: &str = "StridedArray::from_raw_parts";
        layout::check_rank(shape, CONTEXT)?;
        layout::check_rank(strides, CONTEXT)?;
        let dtype = check_dtype::<K>(dtype, CONTEXT)?;
        RawArray::wrap(data, dtype, shape, strides, buffer, CONTEXT).map(Self::from_raw)
    }

    /// New view of `src`'s buffer with element-type parameter `K`.
    ///
    /// Fails with a type mismatch when `K` is concrete and differs from
    /// `src.dtype()`.
    pub fn from_array<U: ElementKind>(src: &StridedArray<U>) -> Result<Self> {
        check_dtype::<K>(src.raw.dtype, "StridedArray::from_array")?;
        tracing::trace!(dtype = %src.raw.dtype, ndim = src.ndim(), "converting strided array view");
        Ok(Self::from_raw(src.raw.clone()))
    }

    /// New view of this buffer with element-type parameter `U`.
    pub fn view_as<U: ElementKind>(&self) -> Result<StridedArray<U>> {
        StridedArray::<U>::from_array(self)
    }

    /// Make `self` a view of `src`'s buffer, reusing `self`'s storage.
    ///
    /// Assigning a view that already describes exactly `self` is a no-op and
    /// performs no validation. On error `self` is left untouched.
    pub fn assign_from<U: ElementKind>(&mut self, src: &StridedArray<U>) -> Result<()> {
        if self.raw.same_view(&src.raw) {
            return Ok(());
        }
        check_dtype::<K>(src.raw.dtype, "StridedArray::assign_from")?;
        self.raw.assign(&src.raw);
        Ok(())
    }

    /// Dynamically typed view of this buffer.
    pub fn erase(&self) -> StridedArray<Erased> {
        StridedArray::from_raw(self.raw.clone())
    }

    pub fn into_erased(self) -> StridedArray<Erased> {
        StridedArray::from_raw(self.raw)
    }

    /// Address of the first element.
    #[inline]
    pub fn data_ptr(&self) -> *const u8 {
        self.raw.data
    }

    #[inline]
    pub fn data_mut_ptr(&self) -> *mut u8 {
        self.raw.data
    }

    #[inline]
    pub fn dtype(&self) -> DType {
        self.raw.dtype
    }

    #[inline]
    pub fn ndim(&self) -> usize {
        self.raw.layout.ndim()
    }

    #[inline]
    pub fn shape(&self) -> &[isize] {
        self.raw.layout.shape()
    }

    /// Per-axis steps in elements. May be negative.
    #[inline]
    pub fn strides(&self) -> &[isize] {
        self.raw.layout.strides()
    }

    /// Bytes per element.
    #[inline]
    pub fn itemsize(&self) -> usize {
        self.raw.itemsize
    }

    /// Total element count; `1` for a zero-dimensional array.
    #[inline]
    pub fn size(&self) -> usize {
        self.raw.size
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.raw.size == 0
    }

    /// Number of trailing axes forming one unbroken dense run.
    #[inline]
    pub fn ncontig(&self) -> usize {
        self.raw.ncontig
    }

    /// Whether the whole array is one dense row-major run.
    #[inline]
    pub fn is_contiguous(&self) -> bool {
        self.raw.ncontig == self.ndim()
    }

    /// Element count of the trailing contiguous run.
    pub fn contiguous_len(&self) -> usize {
        let shape = self.shape();
        shape[shape.len() - self.raw.ncontig..]
            .iter()
            .map(|&n| n as usize)
            .product()
    }

    #[inline]
    pub fn buffer(&self) -> &BufferHandle {
        &self.raw.buffer
    }

    /// Whether both arrays are views of the same allocation.
    #[inline]
    pub fn shares_buffer_with<U: ElementKind>(&self, other: &StridedArray<U>) -> bool {
        self.raw.buffer.ptr_eq(&other.raw.buffer)
    }

    /// Raw bytes of a fully contiguous array.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        if !self.is_contiguous() {
            return None;
        }
        if self.raw.size == 0 {
            return Some(&[]);
        }
        let len = self.raw.size * self.raw.itemsize;
        Some(unsafe { std::slice::from_raw_parts(self.raw.data, len) })
    }
}

impl<T: Element> StridedArray<T> {
    /// Allocate a zero-filled dense row-major array.
    ///
    /// # Example
    /// ```
    /// use strided_view::StridedArray;
    ///
    /// let a = StridedArray::<f32>::zeros(&[2, 3]).unwrap();
    /// assert_eq!(a.strides(), &[3, 1]);
    /// assert_eq!(a.as_slice().unwrap(), &[0.0; 6]);
    /// ```
    pub fn zeros(shape: &[isize]) -> Result<Self> {
        Self::allocate(shape, T::DTYPE, &AllocOptions::default())
    }

    /// Allocate a dense row-major array without zero-filling it.
    ///
    /// # Safety
    /// Every element must be written before any is read.
    pub unsafe fn uninit(shape: &[isize]) -> Result<Self> {
        Self::allocate(shape, T::DTYPE, &AllocOptions::new().uninitialized())
    }

    /// Take ownership of `vec` as a dense row-major buffer.
    pub fn from_vec(vec: Vec<T>, shape: &[isize]) -> Result<Self> {
        const CONTEXT: &str = "StridedArray::from_vec";
        layout::check_rank(shape, CONTEXT)?;
        let (layout, size) = ShapeStrides::row_major(shape, CONTEXT)?;
        if vec.len() != size {
            return Err(ArrayError::BufferLengthMismatch {
                context: CONTEXT,
                len: vec.len(),
                needed: size,
            });
        }
        Self::wrap_vec(vec, layout.shape(), layout.strides(), 0, CONTEXT)
    }

    /// Take ownership of `vec` and view it with explicit strides.
    ///
    /// Element `[i, j, ...]` lives at `offset + i * strides[0] + j * strides[1] + ...`;
    /// every reachable position must lie inside `vec`. As with
    /// [`from_raw_parts`](Self::from_raw_parts), `|strides[i]|` must be at least
    /// `|strides[i + 1] * shape[i + 1]|` (and at least 1 for the last axis), so
    /// column-major strides such as `[1, 2]` for shape `[2, 3]` fail with
    /// [`ArrayError::StrideTooSmall`].
    pub fn from_vec_strided(
        vec: Vec<T>,
        shape: &[isize],
        strides: &[isize],
        offset: isize,
    ) -> Result<Self> {
        const CONTEXT: &str = "StridedArray::from_vec_strided";
        layout::check_rank(shape, CONTEXT)?;
        layout::validate_bounds(vec.len(), shape, strides, offset, CONTEXT)?;
        Self::wrap_vec(vec, shape, strides, offset, CONTEXT)
    }

    fn wrap_vec(
        mut vec: Vec<T>,
        shape: &[isize],
        strides: &[isize],
        offset: isize,
        context: &'static str,
    ) -> Result<Self> {
        // An empty view never dereferences its base, so keep it in the vec.
        let offset = if vec.is_empty() || shape.contains(&0) {
            0
        } else {
            offset
        };
        let data = unsafe { vec.as_mut_ptr().offset(offset) } as *mut u8;
        let buffer = BufferHandle::from_vec(vec);
        RawArray::wrap(data, T::DTYPE, shape, strides, buffer, context).map(Self::from_raw)
    }

    #[inline]
    pub fn as_ptr(&self) -> *const T {
        self.raw.data as *const T
    }

    #[inline]
    pub fn as_mut_ptr(&self) -> *mut T {
        self.raw.data as *mut T
    }

    /// Elements of a fully contiguous array in memory order.
    pub fn as_slice(&self) -> Option<&[T]> {
        if !self.is_contiguous() {
            return None;
        }
        if self.raw.size == 0 {
            return Some(&[]);
        }
        Some(unsafe { std::slice::from_raw_parts(self.as_ptr(), self.raw.size) })
    }

    /// Mutable elements of a fully contiguous array in memory order.
    ///
    /// # Safety
    /// No other view of the same buffer may access the overlapping elements
    /// while the returned slice is alive.
    pub unsafe fn as_slice_mut(&mut self) -> Option<&mut [T]> {
        if !self.is_contiguous() {
            return None;
        }
        if self.raw.size == 0 {
            return Some(&mut []);
        }
        Some(std::slice::from_raw_parts_mut(self.as_mut_ptr(), self.raw.size))
    }
}

// ============================================================================
// Tests
// ============================================================================
