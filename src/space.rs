//! Inline storage types.
//!
//! Rust has no `#[repr(align(N))]` for a const generic `N`, so alignment is
//! selected through the [`Alignment`] trait: [`Align<N>`] implements it for
//! every power of two from 1 to 4096, naming a zero-sized archetype whose
//! alignment is exactly `N`. A zero-length array of that archetype lifts the
//! alignment of [`Storage`] without adding to its size.
//!
//! ```
//! use core::mem::{align_of, size_of};
//! use static_pimpl::StaticPimpl;
//!
//! assert_eq!(size_of::<StaticPimpl<[u8; 24], 24, 1>>(), 24);
//! assert_eq!(align_of::<StaticPimpl<u64, 8, 8>>(), 8);
//! ```

use core::cell::UnsafeCell;
use core::mem::MaybeUninit;

mod sealed {
    pub trait Sealed {}
}

/// Alignment marker, used as `Align<N>: Alignment` to restrict `N` to the
/// supported powers of two.
pub struct Align<const N: usize>;

/// Implemented by [`Align<N>`] for every supported alignment `N`.
///
/// This trait is sealed.
pub trait Alignment: sealed::Sealed {
    /// Zero-sized type aligned to exactly `N` bytes.
    type Archetype: Copy;
}

macro_rules! alignments {
    ($($n:literal => $name:ident),* $(,)?) => {
        $(
            #[doc = concat!("Zero-sized type aligned to ", stringify!($n), " bytes.")]
            #[derive(Clone, Copy)]
            #[repr(align($n))]
            pub struct $name;

            impl sealed::Sealed for Align<$n> {}

            impl Alignment for Align<$n> {
                type Archetype = $name;
            }
        )*
    };
}

alignments! {
    1 => A1,
    2 => A2,
    4 => A4,
    8 => A8,
    16 => A16,
    32 => A32,
    64 => A64,
    128 => A128,
    256 => A256,
    512 => A512,
    1024 => A1024,
    2048 => A2048,
    4096 => A4096,
}

/// `SIZE` bytes of uninitialized memory aligned to `ALIGN`.
///
/// The bytes sit behind an `UnsafeCell`: a shared borrow of the storage must
/// not freeze them, since the embedded value may have interior mutability.
#[repr(C)]
pub(crate) struct Storage<const SIZE: usize, const ALIGN: usize>
where
    Align<ALIGN>: Alignment,
{
    _align: [<Align<ALIGN> as Alignment>::Archetype; 0],
    bytes: UnsafeCell<MaybeUninit<[u8; SIZE]>>,
}

impl<const SIZE: usize, const ALIGN: usize> Storage<SIZE, ALIGN>
where
    Align<ALIGN>: Alignment,
{
    pub(crate) const fn uninit() -> Self {
        Storage {
            _align: [],
            bytes: UnsafeCell::new(MaybeUninit::uninit()),
        }
    }

    // Both pointers come from `UnsafeCell::get`, so they keep the provenance
    // of `bytes` and allow writes even when reached through `&self`.
    pub(crate) const fn as_ptr<T>(&self) -> *const T {
        self.bytes.get().cast_const().cast()
    }

    pub(crate) const fn as_mut_ptr<T>(&mut self) -> *mut T {
        self.bytes.get().cast()
    }
}
