//! Runtime scalar type tags.

use std::fmt;

use crate::{DTypeError, Result};

/// Runtime identifier of an element's numeric kind and width.
///
/// The discriminants are stable and ordered so that [`DType::Invalid`] is the
/// upper sentinel: a tag is valid iff `Int8 <= tag < Invalid`.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DType {
    Int8 = 0,
    Int16 = 1,
    Int32 = 2,
    Int64 = 3,
    Uint8 = 4,
    Uint16 = 5,
    Uint32 = 6,
    Uint64 = 7,
    Float32 = 8,
    Float64 = 9,
    /// Two `f32` components.
    Complex64 = 10,
    /// Two `f64` components.
    Complex128 = 11,
    /// Sentinel; never the dtype of a live array.
    Invalid = 12,
}

impl DType {
    /// Every valid tag, in discriminant order.
    pub const ALL: [DType; 12] = [
        DType::Int8,
        DType::Int16,
        DType::Int32,
        DType::Int64,
        DType::Uint8,
        DType::Uint16,
        DType::Uint32,
        DType::Uint64,
        DType::Float32,
        DType::Float64,
        DType::Complex64,
        DType::Complex128,
    ];

    /// Map a raw discriminant onto a tag.
    ///
    /// Values outside `[0, Invalid)` are rejected rather than folded into the
    /// sentinel, so a corrupted tag never looks like a legitimate one.
    pub fn from_raw(raw: i32) -> Result<Self> {
        usize::try_from(raw)
            .ok()
            .and_then(|i| Self::ALL.get(i).copied())
            .ok_or(DTypeError::InvalidDType {
                context: "DType::from_raw",
                raw,
            })
    }

    #[inline]
    pub const fn as_raw(self) -> i32 {
        self as i32
    }

    /// Half-open range check against the sentinel.
    #[inline]
    pub const fn is_valid(self) -> bool {
        (self as u8) < (DType::Invalid as u8)
    }

    /// Byte size of one element of this type.
    ///
    /// Fails for [`DType::Invalid`].
    pub const fn byte_size(self) -> Result<usize> {
        let n = match self {
            DType::Int8 | DType::Uint8 => 1,
            DType::Int16 | DType::Uint16 => 2,
            DType::Int32 | DType::Uint32 | DType::Float32 => 4,
            DType::Int64 | DType::Uint64 | DType::Float64 | DType::Complex64 => 8,
            DType::Complex128 => 16,
            DType::Invalid => {
                return Err(DTypeError::InvalidDType {
                    context: "DType::byte_size",
                    raw: DType::Invalid as i32,
                })
            }
        };
        Ok(n)
    }

    /// Human-readable label. Diagnostic only.
    pub const fn name(self) -> &'static str {
        match self {
            DType::Int8 => "int8",
            DType::Int16 => "int16",
            DType::Int32 => "int32",
            DType::Int64 => "int64",
            DType::Uint8 => "uint8",
            DType::Uint16 => "uint16",
            DType::Uint32 => "uint32",
            DType::Uint64 => "uint64",
            DType::Float32 => "float32",
            DType::Float64 => "float64",
            DType::Complex64 => "complex64",
            DType::Complex128 => "complex128",
            DType::Invalid => "invalid",
        }
    }

    #[inline]
    pub const fn is_integer(self) -> bool {
        matches!(
            self,
            DType::Int8
                | DType::Int16
                | DType::Int32
                | DType::Int64
                | DType::Uint8
                | DType::Uint16
                | DType::Uint32
                | DType::Uint64
        )
    }

    /// Signed integers, floats and complex values.
    #[inline]
    pub const fn is_signed(self) -> bool {
        matches!(
            self,
            DType::Int8
                | DType::Int16
                | DType::Int32
                | DType::Int64
                | DType::Float32
                | DType::Float64
                | DType::Complex64
                | DType::Complex128
        )
    }

    #[inline]
    pub const fn is_float(self) -> bool {
        matches!(self, DType::Float32 | DType::Float64)
    }

    #[inline]
    pub const fn is_complex(self) -> bool {
        matches!(self, DType::Complex64 | DType::Complex128)
    }
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl TryFrom<i32> for DType {
    type Error = DTypeError;

    fn try_from(raw: i32) -> Result<Self> {
        DType::from_raw(raw)
    }
}

/// Free-function form of [`DType::byte_size`].
#[inline]
pub fn byte_size_of(dtype: DType) -> Result<usize> {
    dtype.byte_size()
}

/// Free-function form of [`DType::is_valid`].
#[inline]
pub fn is_valid(dtype: DType) -> bool {
    dtype.is_valid()
}

/// Free-function form of [`DType::name`].
#[inline]
pub fn name_of(dtype: DType) -> &'static str {
    dtype.name()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_byte_sizes() {
        let expected = [1, 2, 4, 8, 1, 2, 4, 8, 4, 8, 8, 16];
        for (dtype, &size) in DType::ALL.iter().zip(expected.iter()) {
            assert_eq!(dtype.byte_size().unwrap(), size, "{dtype}");
        }
    }

    #[test]
    fn test_invalid_has_no_size() {
        assert!(matches!(
            byte_size_of(DType::Invalid),
            Err(DTypeError::InvalidDType { raw: 12, .. })
        ));
    }

    #[test]
    fn test_validity_is_range_check() {
        for dtype in DType::ALL {
            assert!(is_valid(dtype));
        }
        assert!(!DType::Invalid.is_valid());
    }

    #[test]
    fn test_from_raw_round_trip() {
        for dtype in DType::ALL {
            assert_eq!(DType::from_raw(dtype.as_raw()).unwrap(), dtype);
        }
    }

    #[test]
    fn test_from_raw_rejects_out_of_range() {
        for raw in [-1, 12, 13, i32::MAX, i32::MIN] {
            assert!(matches!(
                DType::try_from(raw),
                Err(DTypeError::InvalidDType { raw: r, .. }) if r == raw
            ));
        }
    }

    #[test]
    fn test_names() {
        assert_eq!(name_of(DType::Int8), "int8");
        assert_eq!(name_of(DType::Uint64), "uint64");
        assert_eq!(name_of(DType::Complex128), "complex128");
        assert_eq!(name_of(DType::Invalid), "invalid");
        assert_eq!(DType::Float32.to_string(), "float32");
    }

    #[test]
    fn test_classification() {
        assert!(DType::Uint16.is_integer());
        assert!(!DType::Uint16.is_signed());
        assert!(DType::Int16.is_signed());
        assert!(DType::Float64.is_float());
        assert!(!DType::Complex64.is_float());
        assert!(DType::Complex64.is_complex());
        assert!(!DType::Invalid.is_integer());
    }
}
