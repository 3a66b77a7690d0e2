//! Compile-time mapping from Rust scalar types to [`DType`] tags.

use num_complex::Complex;

use crate::{DType, DTypeError, Result};

mod sealed {
    pub trait Sealed {}
}

/// A concrete scalar type that has a [`DType`] tag.
///
/// Implemented for the signed and unsigned integers of width 1/2/4/8,
/// `f32`, `f64`, `Complex<f32>` and `Complex<f64>`. The trait is sealed, so
/// asking for the tag of any other type is rejected at build time.
///
/// `Pod + Zero` guarantees that an all-zero byte buffer is a valid array of
/// `T::zero()`.
pub trait Element:
    sealed::Sealed
    + ElementKind
    + bytemuck::Pod
    + num_traits::Zero
    + Copy
    + Send
    + Sync
    + PartialEq
    + std::fmt::Debug
    + 'static
{
    const DTYPE: DType;
}

/// Placeholder element type for arrays whose runtime tag is authoritative.
///
/// Uninhabited: no value of this type ever exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Erased {}

/// The element-type parameter of a strided array: either a concrete
/// [`Element`] or [`Erased`].
pub trait ElementKind: sealed::Sealed + 'static {
    /// `Some(tag)` for concrete scalars, `None` for [`Erased`].
    const STATIC_DTYPE: Option<DType>;
}

impl sealed::Sealed for Erased {}

impl ElementKind for Erased {
    const STATIC_DTYPE: Option<DType> = None;
}

macro_rules! impl_element {
    ($($ty:ty => $dtype:expr),* $(,)?) => {
        $(
            impl sealed::Sealed for $ty {}

            impl ElementKind for $ty {
                const STATIC_DTYPE: Option<DType> = Some($dtype);
            }

            impl Element for $ty {
                const DTYPE: DType = $dtype;
            }
        )*
    };
}

impl_element! {
    i8 => DType::Int8,
    i16 => DType::Int16,
    i32 => DType::Int32,
    i64 => DType::Int64,
    u8 => DType::Uint8,
    u16 => DType::Uint16,
    u32 => DType::Uint32,
    u64 => DType::Uint64,
    f32 => DType::Float32,
    f64 => DType::Float64,
    Complex<f32> => DType::Complex64,
    Complex<f64> => DType::Complex128,
}

#[cfg(target_pointer_width = "64")]
impl_element! {
    isize => DType::Int64,
    usize => DType::Uint64,
}

#[cfg(target_pointer_width = "32")]
impl_element! {
    isize => DType::Int32,
    usize => DType::Uint32,
}

/// Tag of a concrete scalar type.
#[inline]
pub const fn dtype_of<T: Element>() -> DType {
    T::DTYPE
}

/// Check a runtime tag against the element-type parameter `K`.
///
/// A concrete `K` requires an exact match ([`DTypeError::TypeMismatch`]);
/// [`Erased`] accepts any valid tag ([`DTypeError::InvalidDType`]).
pub fn check_dtype<K: ElementKind>(dtype: DType, context: &'static str) -> Result<DType> {
    match K::STATIC_DTYPE {
        Some(expected) if expected == dtype => Ok(dtype),
        Some(expected) => Err(DTypeError::TypeMismatch {
            context,
            expected,
            found: dtype,
        }),
        None if dtype.is_valid() => Ok(dtype),
        None => Err(DTypeError::InvalidDType {
            context,
            raw: dtype.as_raw(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_complex::{Complex32, Complex64};

    #[test]
    fn test_dtype_of_primitives() {
        assert_eq!(dtype_of::<i8>(), DType::Int8);
        assert_eq!(dtype_of::<i16>(), DType::Int16);
        assert_eq!(dtype_of::<i32>(), DType::Int32);
        assert_eq!(dtype_of::<i64>(), DType::Int64);
        assert_eq!(dtype_of::<u8>(), DType::Uint8);
        assert_eq!(dtype_of::<u16>(), DType::Uint16);
        assert_eq!(dtype_of::<u32>(), DType::Uint32);
        assert_eq!(dtype_of::<u64>(), DType::Uint64);
        assert_eq!(dtype_of::<f32>(), DType::Float32);
        assert_eq!(dtype_of::<f64>(), DType::Float64);
        assert_eq!(dtype_of::<Complex32>(), DType::Complex64);
        assert_eq!(dtype_of::<Complex64>(), DType::Complex128);
    }

    #[test]
    fn test_pointer_sized_ints_follow_width() {
        assert_eq!(
            dtype_of::<isize>().byte_size().unwrap(),
            std::mem::size_of::<isize>()
        );
        assert_eq!(
            dtype_of::<usize>().byte_size().unwrap(),
            std::mem::size_of::<usize>()
        );
        assert!(dtype_of::<isize>().is_signed());
        assert!(!dtype_of::<usize>().is_signed());
    }

    fn assert_size_matches<T: Element>() {
        assert_eq!(T::DTYPE.byte_size().unwrap(), std::mem::size_of::<T>());
    }

    #[test]
    fn test_tag_size_matches_rust_size() {
        assert_size_matches::<i8>();
        assert_size_matches::<i64>();
        assert_size_matches::<u16>();
        assert_size_matches::<u32>();
        assert_size_matches::<f32>();
        assert_size_matches::<f64>();
        assert_size_matches::<Complex32>();
        assert_size_matches::<Complex64>();
    }

    #[test]
    fn test_zero_is_all_zero_bytes() {
        let z = <Complex64 as num_traits::Zero>::zero();
        assert!(bytemuck::bytes_of(&z).iter().all(|&b| b == 0));
        let z = <f32 as num_traits::Zero>::zero();
        assert!(bytemuck::bytes_of(&z).iter().all(|&b| b == 0));
    }

    #[test]
    fn test_check_dtype_concrete() {
        assert_eq!(
            check_dtype::<f64>(DType::Float64, "test").unwrap(),
            DType::Float64
        );
        let err = check_dtype::<f64>(DType::Int32, "test").unwrap_err();
        assert!(matches!(
            err,
            DTypeError::TypeMismatch {
                context: "test",
                expected: DType::Float64,
                found: DType::Int32,
            }
        ));
        assert!(check_dtype::<i32>(DType::Invalid, "test").is_err());
    }

    #[test]
    fn test_check_dtype_erased() {
        for dtype in DType::ALL {
            assert_eq!(check_dtype::<Erased>(dtype, "test").unwrap(), dtype);
        }
        assert!(matches!(
            check_dtype::<Erased>(DType::Invalid, "test"),
            Err(DTypeError::InvalidDType { raw: 12, .. })
        ));
    }

    #[test]
    fn test_erased_has_no_static_dtype() {
        assert_eq!(<Erased as ElementKind>::STATIC_DTYPE, None);
        assert_eq!(<u8 as ElementKind>::STATIC_DTYPE, Some(DType::Uint8));
    }
}
