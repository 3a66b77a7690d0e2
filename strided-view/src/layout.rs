//! Shape/stride storage and the layout checks shared by every constructor.
//!
//! Strides are measured in elements, not bytes, and may be negative.

use smallvec::SmallVec;

use crate::{ArrayError, Result, INLINE_NDIM, MAX_NDIM};

// ============================================================================
// Storage
// ============================================================================

/// Shape and strides of one array instance, kept as a single block of
/// `2 * ndim` integers: shape first, strides second.
///
/// Up to [`INLINE_NDIM`] axes live inline; larger ranks spill to the heap.
/// Every instance owns its block, so cloning never aliases.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ShapeStrides {
    buf: SmallVec<[isize; 2 * INLINE_NDIM]>,
    ndim: usize,
}

impl ShapeStrides {
    /// Dense row-major layout for `shape`. Returns the element count too.
    ///
    /// Strides are filled back-to-front: the innermost axis gets 1 and each
    /// outer axis the product of all faster extents.
    pub(crate) fn row_major(shape: &[isize], context: &'static str) -> Result<(Self, usize)> {
        let ndim = shape.len();
        let mut buf: SmallVec<[isize; 2 * INLINE_NDIM]> = SmallVec::with_capacity(2 * ndim);
        buf.extend_from_slice(shape);
        buf.resize(2 * ndim, 0);

        let mut size: isize = 1;
        for i in (0..ndim).rev() {
            let extent = shape[i];
            if extent < 0 {
                return Err(ArrayError::NegativeDimension {
                    context,
                    axis: i,
                    extent,
                });
            }
            buf[ndim + i] = size;
            size = size
                .checked_mul(extent)
                .ok_or(ArrayError::SizeOverflow { context })?;
        }
        Ok((Self { buf, ndim }, size as usize))
    }

    /// Copy caller-supplied shape and strides. Lengths must already agree.
    pub(crate) fn from_parts(shape: &[isize], strides: &[isize]) -> Self {
        debug_assert_eq!(shape.len(), strides.len());
        let mut buf: SmallVec<[isize; 2 * INLINE_NDIM]> =
            SmallVec::with_capacity(shape.len() + strides.len());
        buf.extend_from_slice(shape);
        buf.extend_from_slice(strides);
        Self {
            buf,
            ndim: shape.len(),
        }
    }

    /// Overwrite with `other`'s contents, reusing this block's allocation.
    pub(crate) fn assign(&mut self, other: &ShapeStrides) {
        self.buf.clear();
        self.buf.extend_from_slice(&other.buf);
        self.ndim = other.ndim;
    }

    #[inline]
    pub(crate) fn ndim(&self) -> usize {
        self.ndim
    }

    #[inline]
    pub(crate) fn shape(&self) -> &[isize] {
        &self.buf[..self.ndim]
    }

    #[inline]
    pub(crate) fn strides(&self) -> &[isize] {
        &self.buf[self.ndim..]
    }

    #[cfg(test)]
    pub(crate) fn is_inline(&self) -> bool {
        !self.buf.spilled()
    }
}

// ============================================================================
// Checks
// ============================================================================

/// Check that `ndim` lies in `[0, MAX_NDIM]`.
pub fn check_ndim(ndim: isize, context: &'static str) -> Result<usize> {
    if ndim < 0 || ndim as usize > MAX_NDIM {
        return Err(ArrayError::DimensionOutOfRange { context, ndim });
    }
    Ok(ndim as usize)
}

/// Rank of a shape slice, checked against [`MAX_NDIM`].
pub(crate) fn check_rank(shape: &[isize], context: &'static str) -> Result<usize> {
    check_ndim(isize::try_from(shape.len()).unwrap_or(isize::MAX), context)
}

/// Compute row-major strides (last index varies fastest).
///
/// Fails like a fresh allocation would on negative extents or an element
/// count that overflows `isize`.
pub fn row_major_strides(shape: &[isize]) -> Result<Vec<isize>> {
    let (layout, _) = ShapeStrides::row_major(shape, "row_major_strides")?;
    Ok(layout.strides().to_vec())
}

/// Stride axis `i` would have if it were densely packed around axis `i + 1`.
#[inline]
fn dense_stride(shape: &[isize], strides: &[isize], i: usize) -> Option<isize> {
    if i + 1 < shape.len() {
        shape[i + 1].checked_mul(strides[i + 1])
    } else {
        Some(1)
    }
}

/// Number of trailing axes that form one unbroken dense run.
///
/// Scans from the innermost axis outward and stops at the first axis whose
/// stride differs from the dense stride. An outer match after a break does
/// not count.
pub fn contiguous_axes(shape: &[isize], strides: &[isize]) -> usize {
    debug_assert_eq!(shape.len(), strides.len());
    let mut ncontig = 0;
    for i in (0..shape.len()).rev() {
        if dense_stride(shape, strides, i) != Some(strides[i]) {
            break;
        }
        ncontig += 1;
    }
    ncontig
}

/// Validate caller-supplied shape and strides; return `(size, ncontig)`.
///
/// Rejects negative extents and strides whose magnitude is smaller than the
/// dense stride of their axis.
pub(crate) fn finalize(
    shape: &[isize],
    strides: &[isize],
    context: &'static str,
) -> Result<(usize, usize)> {
    if shape.len() != strides.len() {
        return Err(ArrayError::StrideLengthMismatch {
            context,
            shape: shape.len(),
            strides: strides.len(),
        });
    }

    let mut size: isize = 1;
    for (axis, &extent) in shape.iter().enumerate() {
        if extent < 0 {
            return Err(ArrayError::NegativeDimension {
                context,
                axis,
                extent,
            });
        }
        size = size
            .checked_mul(extent)
            .ok_or(ArrayError::SizeOverflow { context })?;
    }

    for axis in 0..shape.len() {
        let dense =
            dense_stride(shape, strides, axis).ok_or(ArrayError::SizeOverflow { context })?;
        let stride = strides[axis];
        if stride.unsigned_abs() < dense.unsigned_abs() {
            return Err(ArrayError::StrideTooSmall {
                context,
                axis,
                stride,
                dense,
            });
        }
    }

    Ok((size as usize, contiguous_axes(shape, strides)))
}

/// Validate that every reachable offset stays within `[0, len)`.
pub(crate) fn validate_bounds(
    len: usize,
    shape: &[isize],
    strides: &[isize],
    offset: isize,
    context: &'static str,
) -> Result<()> {
    if shape.len() != strides.len() {
        return Err(ArrayError::StrideLengthMismatch {
            context,
            shape: shape.len(),
            strides: strides.len(),
        });
    }
    // Empty array - no access needed
    if shape.iter().any(|&d| d == 0) {
        return Ok(());
    }
    let overflow = ArrayError::OutOfBounds { context, len };
    let mut min_offset = offset;
    let mut max_offset = offset;
    for (&extent, &stride) in shape.iter().zip(strides.iter()) {
        if extent > 1 {
            let end = stride.checked_mul(extent - 1).ok_or(overflow.clone())?;
            if end >= 0 {
                max_offset = max_offset.checked_add(end).ok_or(overflow.clone())?;
            } else {
                min_offset = min_offset.checked_add(end).ok_or(overflow.clone())?;
            }
        }
    }
    if min_offset < 0 || max_offset < 0 || max_offset as usize >= len {
        return Err(overflow);
    }
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================
