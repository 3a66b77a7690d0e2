//! Scalar type tags for the strided-array ecosystem.
//!
//! This crate is the stateless metadata layer under `strided-view`:
//!
//! - [`DType`]: runtime tag of an element's numeric kind and width, with an
//!   explicit [`DType::Invalid`] sentinel
//! - [`Element`]: sealed compile-time mapping from a Rust scalar to its tag
//! - [`Erased`] / [`ElementKind`]: the element-type parameter of an array,
//!   either a concrete scalar or the erased marker
//!
//! External crates can depend on `strided-dtype` alone to inspect tags
//! without pulling in the array container.

pub mod dtype;
pub mod scalar;

pub use dtype::{byte_size_of, is_valid, name_of, DType};
pub use scalar::{check_dtype, dtype_of, Element, ElementKind, Erased};

/// Errors raised by tag lookups and tag checks.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DTypeError {
    /// A runtime tag lies outside the valid enumeration.
    #[error("{context}: invalid dtype {raw}")]
    InvalidDType { context: &'static str, raw: i32 },

    /// A concrete element type disagrees with a runtime tag.
    #[error("{context}: expected type {expected} ({}), got type {found} ({})", .expected.as_raw(), .found.as_raw())]
    TypeMismatch {
        context: &'static str,
        expected: DType,
        found: DType,
    },
}

/// Result type for tag operations.
pub type Result<T> = std::result::Result<T, DTypeError>;
