//! Declared-layout verification.
//!
//! Kept apart from `pimpl.rs` so the spans of the const panics below stay put
//! when the holder itself changes.

use core::fmt;
use core::mem::{align_of, size_of};

/// Why a declared size/alignment does not describe a type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutMismatch {
    /// The declared size differs from `size_of::<T>()`.
    Size {
        /// Size named at the declaration site.
        declared: usize,
        /// Actual size of the type.
        actual: usize,
    },
    /// The declared alignment differs from `align_of::<T>()`.
    Alignment {
        /// Alignment named at the declaration site.
        declared: usize,
        /// Actual alignment of the type.
        actual: usize,
    },
}

impl fmt::Display for LayoutMismatch {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            LayoutMismatch::Size { declared, actual } => write!(
                f,
                "static_pimpl: size mismatch (declared {}, actual {})",
                declared, actual
            ),
            LayoutMismatch::Alignment { declared, actual } => write!(
                f,
                "static_pimpl: alignment mismatch (declared {}, actual {})",
                declared, actual
            ),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for LayoutMismatch {}

/// Checks that `size` and `align` are exactly the layout of `T`.
///
/// Size is checked before alignment.
///
/// ```
/// use static_pimpl::layout::{check, LayoutMismatch};
///
/// assert_eq!(check::<u32>(4, 4), Ok(()));
/// assert_eq!(
///     check::<u32>(8, 4),
///     Err(LayoutMismatch::Size { declared: 8, actual: 4 })
/// );
/// ```
pub const fn check<T>(size: usize, align: usize) -> Result<(), LayoutMismatch> {
    if size_of::<T>() != size {
        return Err(LayoutMismatch::Size {
            declared: size,
            actual: size_of::<T>(),
        });
    }
    if align_of::<T>() != align {
        return Err(LayoutMismatch::Alignment {
            declared: align,
            actual: align_of::<T>(),
        });
    }
    Ok(())
}

/// Const-evaluation panic on mismatch; only ever evaluated inside a constant.
pub(crate) const fn assert<T>(size: usize, align: usize) {
    match check::<T>(size, align) {
        Ok(()) => {}
        Err(LayoutMismatch::Size { .. }) => panic!("static_pimpl: size mismatch"),
        Err(LayoutMismatch::Alignment { .. }) => panic!("static_pimpl: alignment mismatch"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[repr(C)]
    struct Packed3([u8; 3]);

    #[repr(C, align(16))]
    struct Wide(u8);

    #[test]
    fn test_exact() {
        assert_eq!(check::<Packed3>(3, 1), Ok(()));
        assert_eq!(check::<Wide>(16, 16), Ok(()));
        assert_eq!(check::<()>(0, 1), Ok(()));
    }

    #[test]
    fn test_size_first() {
        assert_eq!(
            check::<Wide>(8, 8),
            Err(LayoutMismatch::Size {
                declared: 8,
                actual: 16
            })
        );
    }

    #[test]
    fn test_alignment() {
        assert_eq!(
            check::<Packed3>(3, 4),
            Err(LayoutMismatch::Alignment {
                declared: 4,
                actual: 1
            })
        );
    }

    #[test]
    fn test_larger_declaration_is_a_mismatch() {
        // no slack allowed: the declaration must be exact
        assert!(check::<u32>(8, 4).is_err());
        assert!(check::<u32>(4, 8).is_err());
    }

    #[test]
    fn test_const_assert_passes() {
        const _: () = assert::<u64>(8, core::mem::align_of::<u64>());
    }

    #[test]
    #[cfg(feature = "std")]
    fn test_display() {
        let err = check::<u32>(2, 4).unwrap_err();
        assert_eq!(
            err.to_string(),
            "static_pimpl: size mismatch (declared 2, actual 4)"
        );
        let err = check::<u32>(4, 2).unwrap_err();
        assert_eq!(
            err.to_string(),
            "static_pimpl: alignment mismatch (declared 2, actual 4)"
        );
    }
}
