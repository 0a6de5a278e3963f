//! # StaticPimpl: Inline Opaque Storage
//!
//! [`StaticPimpl`] holds exactly one value of an implementation type inside a byte buffer whose
//! size and alignment are fixed where the holder type is named. A public type can embed its
//! implementation by value, without a [`Box`] and without exposing the implementation's fields,
//! while its own layout stays pinned to the declared numbers.
//!
//! ## Core Concept
//!
//! The classic "pointer to implementation" idiom pays for opacity with a heap allocation per
//! object. [`StaticPimpl`] keeps the implementation inline instead, and turns the one thing that
//! can go wrong, a declared size or alignment that no longer matches the implementation, into a
//! build failure.
//!
//! ## Quick Start
//!
//! Add StaticPimpl to your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! static-pimpl = "0.1"
//! ```
//!
//! Basic usage:
//!
//! ```rust
//! mod widget {
//!     use static_pimpl::{assert_pimpl_layout, StaticPimpl};
//!
//!     /// Public face; consumers never see `WidgetImpl`.
//!     pub struct Widget {
//!         inner: StaticPimpl<WidgetImpl, 16, 8>,
//!     }
//!
//!     struct WidgetImpl {
//!         id: u64,
//!         clicks: u32,
//!     }
//!
//!     assert_pimpl_layout!(WidgetImpl, 16, 8);
//!
//!     impl Widget {
//!         pub fn new(id: u64) -> Widget {
//!             Widget {
//!                 inner: StaticPimpl::new(WidgetImpl { id, clicks: 0 }),
//!             }
//!         }
//!
//!         pub fn click(&mut self) -> u32 {
//!             self.inner.clicks += 1;
//!             self.inner.clicks
//!         }
//!
//!         pub fn id(&self) -> u64 {
//!             self.inner.id
//!         }
//!     }
//! }
//!
//! let mut w = widget::Widget::new(3);
//! assert_eq!(w.click(), 1);
//! assert_eq!(w.id(), 3);
//! assert_eq!(core::mem::size_of::<widget::Widget>(), 16);
//! ```
//!
//! ## Configuration
//!
//! ### Declared Layout
//!
//! `StaticPimpl<T, SIZE, ALIGN>` takes the implementation type and its exact size and alignment
//! in bytes. `SIZE` defaults to 8 and `ALIGN` to 4. `ALIGN` must be a power of two up to 4096
//! (see [`space`]).
//!
//! **Important**: the declaration must be exact. A larger `SIZE` is rejected just like a smaller
//! one; there is no slack and no heap fallback.
//!
//! ### Feature Flags
//!
//! - **`std`** (enabled by default)
//!   - Links to the standard library and implements `std::error::Error` for
//!     [`LayoutMismatch`](layout::LayoutMismatch) and for holders of error types
//!   - Disable for `#![no_std]` environments: `default-features = false`
//!
//! ## Compile-Time Checks
//!
//! Every constructor and the destructor evaluate
//! [`StaticPimpl::LAYOUT_CHECK`], so a mismatched holder that is used anywhere does not build:
//!
//! ```compile_fail
//! use static_pimpl::StaticPimpl;
//!
//! const CHECK: () = StaticPimpl::<u64, 4, 4>::LAYOUT_CHECK;
//! ```
//!
//! [`assert_pimpl_layout!`] performs the same check eagerly, next to the implementation type,
//! so `cargo check` reports a stale declaration even before any holder is built.
//!
//! ## Copy and Move
//!
//! [`Clone`] is available exactly when `T: Clone`, and [`Send`], [`Sync`] and [`Unpin`] follow
//! `T`. Plain Rust moves relocate the holder; [`StaticPimpl::take_from`] moves the value into a
//! new holder while the source stays alive with `T::default()`.

#![cfg_attr(not(feature = "std"), no_std)]
#![deny(missing_docs)]
#![deny(clippy::as_conversions)]

pub mod layout;
mod pimpl;
pub mod space;

pub use crate::pimpl::StaticPimpl;
