use core::borrow::{Borrow, BorrowMut};
use core::cmp::Ordering;
use core::fmt;
use core::future::Future;
use core::hash::{self, Hash};
use core::marker::PhantomData;
use core::mem::{self, ManuallyDrop};
use core::ops;
use core::panic::RefUnwindSafe;
use core::pin::Pin;
use core::ptr;
use core::task::{Context, Poll};

use crate::layout;
use crate::space::{Align, Alignment, Storage};

/// Assert at compile time that `SIZE` and `ALIGN` describe `$ty`.
///
/// Expands to an anonymous `const` item, so a stale declaration is reported
/// by `cargo check` in the module that invokes it, without waiting for a
/// holder of `$ty` to be constructed or dropped. Size and alignment default
/// to those of [`StaticPimpl`] when omitted.
///
/// # Example
///
/// ```
/// use static_pimpl::assert_pimpl_layout;
///
/// struct Impl {
///     id: u32,
///     flags: u32,
/// }
///
/// assert_pimpl_layout!(Impl);
/// assert_pimpl_layout!([u64; 3], 24, 8);
/// ```
///
/// A wrong size does not build:
///
/// ```compile_fail
/// use static_pimpl::assert_pimpl_layout;
///
/// assert_pimpl_layout!([u64; 3], 16, 8);
/// ```
///
/// Neither does a wrong alignment:
///
/// ```compile_fail
/// use static_pimpl::assert_pimpl_layout;
///
/// assert_pimpl_layout!([u8; 8], 8, 4);
/// ```
#[macro_export]
macro_rules! assert_pimpl_layout {
    ($ty:ty $(,)?) => {
        const _: () = <$crate::StaticPimpl<$ty>>::LAYOUT_CHECK;
    };
    ($ty:ty, $size:expr, $align:expr $(,)?) => {
        const _: () = <$crate::StaticPimpl<$ty, { $size }, { $align }>>::LAYOUT_CHECK;
    };
}

/// Inline, exclusively owned storage for exactly one `T`.
///
/// `SIZE` and `ALIGN` are fixed where the holder type is named and must equal
/// `size_of::<T>()` and `align_of::<T>()`. Any mismatch fails the build the
/// first time the holder is constructed or dropped, with
/// `static_pimpl: size mismatch` or `static_pimpl: alignment mismatch`.
///
/// The holder is always full: from construction until drop it contains one
/// live `T`, reachable through [`Deref`](ops::Deref) and
/// [`DerefMut`](ops::DerefMut).
///
/// # Example
///
/// ```
/// use static_pimpl::StaticPimpl;
///
/// let mut pair: StaticPimpl<(u32, u32)> = StaticPimpl::new((1, 2));
/// pair.0 += 10;
/// assert_eq!(*pair, (11, 2));
/// ```
#[repr(C)]
pub struct StaticPimpl<T, const SIZE: usize = 8, const ALIGN: usize = 4>
where
    Align<ALIGN>: Alignment,
{
    storage: Storage<SIZE, ALIGN>,
    _phantom: PhantomData<T>,
}

impl<T, const SIZE: usize, const ALIGN: usize> StaticPimpl<T, SIZE, ALIGN>
where
    Align<ALIGN>: Alignment,
{
    /// Declared size in bytes.
    pub const DECLARED_SIZE: usize = SIZE;

    /// Declared alignment in bytes.
    pub const DECLARED_ALIGN: usize = ALIGN;

    /// Evaluating this constant fails to compile unless the declared layout is
    /// exactly that of `T`. See [`assert_pimpl_layout!`](crate::assert_pimpl_layout).
    pub const LAYOUT_CHECK: () = layout::assert::<T>(SIZE, ALIGN);

    /// Place `val` into the inline storage.
    ///
    /// Usable in constants and statics.
    ///
    /// # Example
    ///
    /// ```
    /// use core::sync::atomic::{AtomicU32, Ordering};
    /// use static_pimpl::StaticPimpl;
    ///
    /// let word: StaticPimpl<u64, 8, 8> = StaticPimpl::new(7);
    /// assert_eq!(*word, 7);
    ///
    /// static HITS: StaticPimpl<AtomicU32, 4, 4> = StaticPimpl::new(AtomicU32::new(0));
    /// HITS.fetch_add(1, Ordering::Relaxed);
    /// assert_eq!(HITS.load(Ordering::Relaxed), 1);
    /// ```
    ///
    /// Constructing a holder whose declared size is wrong does not build:
    ///
    /// ```compile_fail
    /// use static_pimpl::StaticPimpl;
    ///
    /// const WORD: StaticPimpl<u64, 16, 8> = StaticPimpl::new(1);
    /// # let _ = WORD;
    /// ```
    ///
    /// Nor does one whose declared alignment is wrong:
    ///
    /// ```compile_fail
    /// use static_pimpl::StaticPimpl;
    ///
    /// const BYTES: StaticPimpl<[u8; 8], 8, 4> = StaticPimpl::new([0; 8]);
    /// # let _ = BYTES;
    /// ```
    pub const fn new(val: T) -> StaticPimpl<T, SIZE, ALIGN> {
        let () = Self::LAYOUT_CHECK;

        let mut storage = Storage::uninit();
        // SAFETY: `LAYOUT_CHECK` guarantees the storage is large and aligned
        // enough for `T`.
        unsafe { storage.as_mut_ptr::<T>().write(val) };

        StaticPimpl {
            storage,
            _phantom: PhantomData,
        }
    }

    /// Construct `T` by running `f` and store the result inline.
    ///
    /// `f` stands in for `T`'s constructor; whatever it captures is forwarded
    /// unchanged.
    ///
    /// # Example
    ///
    /// ```
    /// use static_pimpl::StaticPimpl;
    ///
    /// let (a, b) = (3u16, 4u16);
    /// let point: StaticPimpl<[u16; 2], 4, 2> = StaticPimpl::new_with(|| [a, b]);
    /// assert_eq!(*point, [3, 4]);
    /// ```
    pub fn new_with<F>(f: F) -> StaticPimpl<T, SIZE, ALIGN>
    where
        F: FnOnce() -> T,
    {
        Self::new(f())
    }

    /// Like [`new_with`](Self::new_with) for fallible constructors.
    ///
    /// An `Err` from `f` is returned untouched and no holder is created.
    ///
    /// # Example
    ///
    /// ```
    /// use static_pimpl::StaticPimpl;
    ///
    /// let ok: Result<StaticPimpl<u32, 4, 4>, _> = StaticPimpl::try_new_with(|| "42".parse());
    /// assert_eq!(*ok.unwrap(), 42);
    ///
    /// let err: Result<StaticPimpl<u32, 4, 4>, _> = StaticPimpl::try_new_with(|| "x".parse());
    /// assert!(err.is_err());
    /// ```
    pub fn try_new_with<F, E>(f: F) -> Result<StaticPimpl<T, SIZE, ALIGN>, E>
    where
        F: FnOnce() -> Result<T, E>,
    {
        f().map(Self::new)
    }

    /// Move-construct from `src`, leaving `src` alive with `T::default()`.
    ///
    /// # Example
    ///
    /// ```
    /// use static_pimpl::StaticPimpl;
    ///
    /// let mut src: StaticPimpl<u32, 4, 4> = StaticPimpl::new(9);
    /// let dst = StaticPimpl::take_from(&mut src);
    /// assert_eq!((*src, *dst), (0, 9));
    /// ```
    pub fn take_from(src: &mut StaticPimpl<T, SIZE, ALIGN>) -> StaticPimpl<T, SIZE, ALIGN>
    where
        T: Default,
    {
        Self::new(mem::take(&mut **src))
    }

    /// Move the value out of the holder.
    pub fn into_inner(this: StaticPimpl<T, SIZE, ALIGN>) -> T {
        let this = ManuallyDrop::new(this);
        // SAFETY: the holder is full and will not be dropped again.
        unsafe { ptr::read(this.as_ptr()) }
    }

    /// Whether the declared layout matches `T`, without failing the build.
    ///
    /// # Example
    ///
    /// ```
    /// use static_pimpl::StaticPimpl;
    ///
    /// assert!(StaticPimpl::<u64, 8, 8>::fits());
    /// assert!(!StaticPimpl::<u64, 16, 8>::fits());
    /// ```
    pub const fn fits() -> bool {
        matches!(layout::check::<T>(SIZE, ALIGN), Ok(()))
    }

    /// Pointer to the embedded value.
    ///
    /// Stable for as long as the holder is neither moved nor dropped.
    pub fn as_ptr(&self) -> *const T {
        self.storage.as_ptr()
    }

    /// Mutable pointer to the embedded value.
    pub fn as_mut_ptr(&mut self) -> *mut T {
        self.storage.as_mut_ptr()
    }
}

impl<T, const SIZE: usize, const ALIGN: usize> ops::Deref for StaticPimpl<T, SIZE, ALIGN>
where
    Align<ALIGN>: Alignment,
{
    type Target = T;

    fn deref(&self) -> &T {
        unsafe { &*self.as_ptr() }
    }
}

impl<T, const SIZE: usize, const ALIGN: usize> ops::DerefMut for StaticPimpl<T, SIZE, ALIGN>
where
    Align<ALIGN>: Alignment,
{
    fn deref_mut(&mut self) -> &mut T {
        unsafe { &mut *self.as_mut_ptr() }
    }
}

impl<T, const SIZE: usize, const ALIGN: usize> ops::Drop for StaticPimpl<T, SIZE, ALIGN>
where
    Align<ALIGN>: Alignment,
{
    fn drop(&mut self) {
        let () = Self::LAYOUT_CHECK;
        unsafe { ptr::drop_in_place(self.as_mut_ptr()) }
    }
}

// The storage is an `UnsafeCell`, so thread-safety and unwind-safety are
// restated in terms of `T`.
unsafe impl<T: Send, const SIZE: usize, const ALIGN: usize> Send for StaticPimpl<T, SIZE, ALIGN> where
    Align<ALIGN>: Alignment
{
}

/// `Send` and `Sync` follow `T`:
///
/// ```
/// use static_pimpl::StaticPimpl;
///
/// fn shareable<T: Send + Sync>() {}
/// shareable::<StaticPimpl<u32, 4, 4>>();
/// ```
///
/// ```compile_fail
/// use std::rc::Rc;
/// use static_pimpl::StaticPimpl;
///
/// fn sendable<T: Send>() {}
/// sendable::<StaticPimpl<Rc<u8>, 8, 8>>();
/// ```
///
/// ```compile_fail
/// use std::rc::Rc;
/// use static_pimpl::StaticPimpl;
///
/// fn shareable<T: Sync>() {}
/// shareable::<StaticPimpl<Rc<u8>, 8, 8>>();
/// ```
unsafe impl<T: Sync, const SIZE: usize, const ALIGN: usize> Sync for StaticPimpl<T, SIZE, ALIGN> where
    Align<ALIGN>: Alignment
{
}

impl<T: RefUnwindSafe, const SIZE: usize, const ALIGN: usize> RefUnwindSafe
    for StaticPimpl<T, SIZE, ALIGN>
where
    Align<ALIGN>: Alignment,
{
}

/// Cloning is available exactly when `T: Clone`:
///
/// ```compile_fail
/// use static_pimpl::StaticPimpl;
///
/// struct Unique(u32, u32);
///
/// fn cloneable<T: Clone>() {}
/// cloneable::<StaticPimpl<Unique>>();
/// ```
impl<T: Clone, const SIZE: usize, const ALIGN: usize> Clone for StaticPimpl<T, SIZE, ALIGN>
where
    Align<ALIGN>: Alignment,
{
    fn clone(&self) -> Self {
        StaticPimpl::new((**self).clone())
    }

    fn clone_from(&mut self, source: &Self) {
        (**self).clone_from(&**source)
    }
}

impl<T: Default, const SIZE: usize, const ALIGN: usize> Default for StaticPimpl<T, SIZE, ALIGN>
where
    Align<ALIGN>: Alignment,
{
    fn default() -> Self {
        StaticPimpl::new(T::default())
    }
}

impl<T, const SIZE: usize, const ALIGN: usize> From<T> for StaticPimpl<T, SIZE, ALIGN>
where
    Align<ALIGN>: Alignment,
{
    fn from(val: T) -> Self {
        StaticPimpl::new(val)
    }
}

impl<T, const SIZE: usize, const ALIGN: usize> AsRef<T> for StaticPimpl<T, SIZE, ALIGN>
where
    Align<ALIGN>: Alignment,
{
    fn as_ref(&self) -> &T {
        self
    }
}

impl<T, const SIZE: usize, const ALIGN: usize> AsMut<T> for StaticPimpl<T, SIZE, ALIGN>
where
    Align<ALIGN>: Alignment,
{
    fn as_mut(&mut self) -> &mut T {
        self
    }
}

impl<T, const SIZE: usize, const ALIGN: usize> Borrow<T> for StaticPimpl<T, SIZE, ALIGN>
where
    Align<ALIGN>: Alignment,
{
    fn borrow(&self) -> &T {
        self
    }
}

impl<T, const SIZE: usize, const ALIGN: usize> BorrowMut<T> for StaticPimpl<T, SIZE, ALIGN>
where
    Align<ALIGN>: Alignment,
{
    fn borrow_mut(&mut self) -> &mut T {
        self
    }
}

impl<T: Future, const SIZE: usize, const ALIGN: usize> Future for StaticPimpl<T, SIZE, ALIGN>
where
    Align<ALIGN>: Alignment,
{
    type Output = T::Output;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<T::Output> {
        // SAFETY: the value lives inside the pinned holder and only leaves it
        // through `into_inner`, which needs the holder by value. `Unpin`
        // follows `T` through `PhantomData<T>`.
        unsafe { self.map_unchecked_mut(|this| &mut **this) }.poll(cx)
    }
}

impl<T: fmt::Display, const SIZE: usize, const ALIGN: usize> fmt::Display
    for StaticPimpl<T, SIZE, ALIGN>
where
    Align<ALIGN>: Alignment,
{
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Display::fmt(&**self, f)
    }
}

impl<T: fmt::Debug, const SIZE: usize, const ALIGN: usize> fmt::Debug
    for StaticPimpl<T, SIZE, ALIGN>
where
    Align<ALIGN>: Alignment,
{
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Debug::fmt(&**self, f)
    }
}

impl<T, const SIZE: usize, const ALIGN: usize> fmt::Pointer for StaticPimpl<T, SIZE, ALIGN>
where
    Align<ALIGN>: Alignment,
{
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Pointer::fmt(&self.as_ptr(), f)
    }
}

#[cfg(feature = "std")]
impl<T: std::error::Error, const SIZE: usize, const ALIGN: usize> std::error::Error
    for StaticPimpl<T, SIZE, ALIGN>
where
    Align<ALIGN>: Alignment,
{
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        (**self).source()
    }
}

impl<T: PartialEq, const SIZE: usize, const ALIGN: usize> PartialEq for StaticPimpl<T, SIZE, ALIGN>
where
    Align<ALIGN>: Alignment,
{
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        PartialEq::eq(&**self, &**other)
    }
    #[inline]
    fn ne(&self, other: &Self) -> bool {
        PartialEq::ne(&**self, &**other)
    }
}

impl<T: PartialOrd, const SIZE: usize, const ALIGN: usize> PartialOrd
    for StaticPimpl<T, SIZE, ALIGN>
where
    Align<ALIGN>: Alignment,
{
    #[inline]
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        PartialOrd::partial_cmp(&**self, &**other)
    }
    #[inline]
    fn lt(&self, other: &Self) -> bool {
        PartialOrd::lt(&**self, &**other)
    }
    #[inline]
    fn le(&self, other: &Self) -> bool {
        PartialOrd::le(&**self, &**other)
    }
    #[inline]
    fn ge(&self, other: &Self) -> bool {
        PartialOrd::ge(&**self, &**other)
    }
    #[inline]
    fn gt(&self, other: &Self) -> bool {
        PartialOrd::gt(&**self, &**other)
    }
}

impl<T: Ord, const SIZE: usize, const ALIGN: usize> Ord for StaticPimpl<T, SIZE, ALIGN>
where
    Align<ALIGN>: Alignment,
{
    #[inline]
    fn cmp(&self, other: &Self) -> Ordering {
        Ord::cmp(&**self, &**other)
    }
}

impl<T: Eq, const SIZE: usize, const ALIGN: usize> Eq for StaticPimpl<T, SIZE, ALIGN> where
    Align<ALIGN>: Alignment
{
}

impl<T: Hash, const SIZE: usize, const ALIGN: usize> Hash for StaticPimpl<T, SIZE, ALIGN>
where
    Align<ALIGN>: Alignment,
{
    fn hash<H: hash::Hasher>(&self, state: &mut H) {
        (**self).hash(state);
    }
}

#[cfg(test)]
mod tests {
    use super::StaticPimpl;
    use core::cell::Cell;
    use core::mem::{align_of, size_of};

    struct Flagged<'a>(&'a Cell<bool>, usize);

    impl Drop for Flagged<'_> {
        fn drop(&mut self) {
            self.0.set(true);
        }
    }

    type Word<T> = StaticPimpl<T, { size_of::<usize>() }, { align_of::<usize>() }>;
    type Pair<T> = StaticPimpl<T, { 2 * size_of::<usize>() }, { align_of::<usize>() }>;

    #[test]
    fn test_basic() {
        let word: Word<usize> = StaticPimpl::new(1234);
        assert_eq!(*word, 1234);

        let pair: Pair<(usize, usize)> = StaticPimpl::new((0, 1));
        assert_eq!(*pair, (0, 1));
    }

    #[test]
    fn test_defaults() {
        assert_eq!(StaticPimpl::<[u32; 2]>::DECLARED_SIZE, 8);
        assert_eq!(StaticPimpl::<[u32; 2]>::DECLARED_ALIGN, 4);
        assert!(StaticPimpl::<[u32; 2]>::fits());
        assert!(!StaticPimpl::<[u8; 8]>::fits());
        assert!(!StaticPimpl::<[u32; 3]>::fits());
    }

    #[test]
    fn test_drop() {
        let flag = Cell::new(false);
        let val: Pair<Flagged<'_>> = StaticPimpl::new(Flagged(&flag, 0));
        assert!(!flag.get());

        drop(val);
        assert!(flag.get());
    }

    #[test]
    fn test_into_inner_does_not_drop() {
        let flag = Cell::new(false);
        let val: Pair<Flagged<'_>> = StaticPimpl::new(Flagged(&flag, 7));

        let inner = StaticPimpl::into_inner(val);
        assert!(!flag.get());
        assert_eq!(inner.1, 7);

        drop(inner);
        assert!(flag.get());
    }

    #[test]
    fn test_deref_mut() {
        let mut word: Word<usize> = StaticPimpl::new(1);
        *word += 41;
        assert_eq!(*word, 42);
    }

    #[test]
    fn test_zst() {
        let unit: StaticPimpl<(), 0, 1> = StaticPimpl::new(());
        assert_eq!(size_of::<StaticPimpl<(), 0, 1>>(), 0);
        assert_eq!(*unit, ());
    }

    #[test]
    fn test_clone() {
        let word: Word<usize> = StaticPimpl::new(5);
        assert_eq!(word, word.clone());

        let mut other: Word<usize> = StaticPimpl::new(6);
        other.clone_from(&word);
        assert_eq!(*other, 5);
    }

    #[test]
    fn test_ordering() {
        let a: Word<usize> = StaticPimpl::new(1);
        let b: Word<usize> = StaticPimpl::new(2);
        assert!(a < b);
        assert_eq!(a.cmp(&b), core::cmp::Ordering::Less);
        assert_eq!(a.max(b), StaticPimpl::new(2));
    }

    #[test]
    #[cfg(feature = "std")]
    fn test_fmt() {
        let word: Word<usize> = StaticPimpl::new(17);
        assert_eq!(format!("{}", word), "17");
        assert_eq!(format!("{:?}", word), "17");
        assert_eq!(format!("{:p}", word), format!("{:p}", word.as_ptr()));
    }

    #[test]
    #[cfg(feature = "std")]
    fn test_hash() {
        use std::collections::HashSet;

        let mut set = HashSet::new();
        set.insert(Word::<usize>::new(1));
        set.insert(Word::<usize>::new(1));
        set.insert(Word::<usize>::new(2));
        assert_eq!(set.len(), 2);
        assert!(set.contains(&Word::new(2)));
    }
}
