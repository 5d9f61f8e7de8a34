use std::{
    cmp::Ordering,
    fmt,
    hash::{Hash, Hasher},
    marker::PhantomData,
    mem,
    ops::Deref,
    ptr::{self, NonNull},
};

use crate::{Address, Result, control_block::ControlBlock};

/// A single-threaded reference-counted pointer with shared ownership of a value
///
/// Cloning a `SharedPtr` produces another handle to the same value and increases the use count.
/// The value is dropped when the last handle referencing it is dropped, reset, or reassigned.
///
/// A `SharedPtr` can also be empty, in which case it doesn't allocate anything, has a use count of
/// zero, and its address is null. [`SharedPtr::take`] moves the value out of a handle and leaves
/// the source empty.
///
/// Inspection functions are associated functions (e.g. `SharedPtr::use_count(&p)`) so that they
/// don't shadow methods on `T` that are reached through `Deref`.
///
/// # Examples
///
/// ```
/// use ksl_memory::SharedPtr;
///
/// let a = SharedPtr::new(100);
/// let b = a.clone();
/// assert_eq!(*b, 100);
/// assert_eq!(SharedPtr::use_count(&a), 2);
///
/// drop(b);
/// assert_eq!(SharedPtr::use_count(&a), 1);
/// ```
///
/// `SharedPtr` uses a non-atomic counter, so it can't be sent to another thread:
///
/// ```compile_fail
/// use ksl_memory::SharedPtr;
///
/// let p = SharedPtr::new(1);
/// std::thread::spawn(move || println!("{}", *p));
/// ```
pub struct SharedPtr<T: ?Sized> {
    block: Option<NonNull<ControlBlock<T>>>,
    _marker: PhantomData<T>,
}

impl<T> SharedPtr<T> {
    /// Moves `value` into a new allocation with a use count of 1
    pub fn new(value: T) -> Self {
        Self::from(Box::new(value))
    }

    /// Moves `value` into a new allocation, reporting a failure to allocate the control block
    ///
    /// `value` is dropped if the allocation fails.
    pub fn try_new(value: T) -> Result<Self> {
        Self::try_from_box(Box::new(value))
    }

    /// Returns a raw pointer to the value, or null if the pointer is empty
    ///
    /// The pointer is valid for as long as a handle to the value remains.
    pub fn as_ptr(this: &Self) -> *const T {
        this.inner()
            .map_or(ptr::null(), |block| block.value_ptr().as_ptr().cast_const())
    }

    /// Replaces the value with a new allocation containing `value`
    ///
    /// The new control block is allocated before the previous value is released.
    pub fn reset_with(this: &mut Self, value: T) {
        Self::reset_with_box(this, Box::new(value))
    }

    /// Returns the inner value if this is the only handle referencing it
    ///
    /// Otherwise the pointer is returned unchanged as the error.
    pub fn try_unwrap(mut this: Self) -> std::result::Result<T, Self> {
        if !Self::is_unique(&this) {
            return Err(this);
        }

        match this.block.take() {
            // Safety: this was the only handle, so nothing else can observe the block
            Some(block) => Ok(*unsafe { ControlBlock::into_owned(block) }),
            None => Err(this),
        }
    }
}

impl<T: Clone> SharedPtr<T> {
    /// Makes a mutable reference into the owned `T`
    ///
    /// If the pointer has the only reference to the value, then the reference will be returned.
    /// Otherwise the value is cloned into a new allocation owned by this handle before returning
    /// the reference.
    ///
    /// # Panics
    ///
    /// Panics if the pointer is empty.
    #[track_caller]
    pub fn make_mut(this: &mut Self) -> &mut T {
        if !Self::is_unique(this) {
            *this = Self::new(T::clone(&**this));
        }

        match this.block {
            // Safety: the handle is the sole owner of the value, and the returned reference
            // borrows the handle mutably.
            Some(block) => unsafe { &mut *block.as_ref().value_ptr().as_ptr() },
            None => empty_deref(),
        }
    }
}

impl<T: ?Sized> SharedPtr<T> {
    /// Returns an empty pointer
    ///
    /// Empty pointers don't allocate.
    pub const fn null() -> Self {
        Self::from_block(None)
    }

    /// Takes ownership of a boxed value, reporting a failure to allocate the control block
    ///
    /// The box is dropped if the allocation fails.
    pub fn try_from_box(boxed: Box<T>) -> Result<Self> {
        ControlBlock::try_allocate(boxed).map(|block| Self::from_block(Some(block)))
    }

    /// Takes ownership of a value allocated by `Box`
    ///
    /// A null pointer produces an empty `SharedPtr`.
    ///
    /// # Safety
    ///
    /// A non-null `raw` must have been returned by [`Box::into_raw`], and must not be used by the
    /// caller afterwards.
    pub unsafe fn from_raw(raw: *mut T) -> Self {
        match NonNull::new(raw) {
            // Safety: see the function's safety requirements
            Some(raw) => Self::from(unsafe { Box::from_raw(raw.as_ptr()) }),
            None => Self::null(),
        }
    }

    /// Moves the value out of `this` into a new pointer, leaving `this` empty
    ///
    /// The use count is unchanged.
    pub fn take(this: &mut Self) -> Self {
        Self::from_block(this.block.take())
    }

    /// Releases the value referenced by `this` and moves the value from `source` into it
    ///
    /// `source` is left empty. If both pointers referenced the same value then it's kept alive
    /// with one fewer handle.
    pub fn move_from(this: &mut Self, source: &mut Self) {
        let block = source.block.take();
        this.release();
        this.block = block;
    }

    /// Releases the referenced value, leaving the pointer empty
    pub fn reset(this: &mut Self) {
        this.release();
    }

    /// Replaces the value with a boxed value
    ///
    /// The new control block is allocated before the previous value is released.
    pub fn reset_with_box(this: &mut Self, boxed: Box<T>) {
        let block = ControlBlock::allocate(boxed);
        this.release();
        this.block = Some(block);
    }

    /// Swaps the values referenced by two pointers
    pub fn swap(this: &mut Self, other: &mut Self) {
        mem::swap(&mut this.block, &mut other.block);
    }

    /// Returns a reference to the value, or `None` if the pointer is empty
    pub fn as_ref(this: &Self) -> Option<&T> {
        this.inner().map(ControlBlock::value)
    }

    /// Returns a mutable reference to the value if this is the only handle referencing it
    pub fn get_mut(this: &mut Self) -> Option<&mut T> {
        match this.inner() {
            // Safety: no other handle can reach the value, and the returned reference borrows
            // the handle mutably.
            Some(block) if block.count() == 1 => Some(unsafe { &mut *block.value_ptr().as_ptr() }),
            _ => None,
        }
    }

    /// Returns the address of the value, or the null address if the pointer is empty
    pub fn address(this: &Self) -> Address {
        this.inner()
            .map_or(Address::NULL, |block| block.value_ptr().as_ptr().into())
    }

    /// Returns the number of pointers referencing the value, or zero if the pointer is empty
    pub fn use_count(this: &Self) -> usize {
        this.inner().map_or(0, ControlBlock::count)
    }

    /// Returns true if this is the only pointer referencing its value
    pub fn is_unique(this: &Self) -> bool {
        Self::use_count(this) == 1
    }

    /// Returns true if the pointer references a value
    pub fn is_some(this: &Self) -> bool {
        this.block.is_some()
    }

    /// Returns true if the pointer is empty
    pub fn is_null(this: &Self) -> bool {
        this.block.is_none()
    }

    /// Returns true if the two pointers reference the same value
    ///
    /// Two empty pointers are considered to be equal.
    pub fn ptr_eq(this: &Self, other: &Self) -> bool {
        this.block == other.block
    }

    const fn from_block(block: Option<NonNull<ControlBlock<T>>>) -> Self {
        Self {
            block,
            _marker: PhantomData,
        }
    }

    fn inner(&self) -> Option<&ControlBlock<T>> {
        // Safety: a block stays allocated while any handle references it
        self.block.as_ref().map(|block| unsafe { block.as_ref() })
    }

    // Registers another handle with the block, returning the block for the new handle to adopt
    fn acquire(&self) -> Option<NonNull<ControlBlock<T>>> {
        if let Some(block) = self.inner() {
            block.increment();
        }
        self.block
    }

    // Repeated calls are no-ops, the block reference is cleared before the value is dropped
    fn release(&mut self) {
        if let Some(block) = self.block.take() {
            // Safety: the block was referenced by this handle so it's still allocated
            let remaining = unsafe { block.as_ref() }.decrement();
            if remaining == 0 {
                // Safety: this was the last handle referencing the block
                unsafe { ControlBlock::destroy(block) };
            }
        }
    }
}

#[cold]
#[track_caller]
fn empty_deref() -> ! {
    panic!("dereferenced an empty SharedPtr")
}

impl<T: ?Sized> Drop for SharedPtr<T> {
    fn drop(&mut self) {
        self.release();
    }
}

impl<T: ?Sized> Clone for SharedPtr<T> {
    fn clone(&self) -> Self {
        Self::from_block(self.acquire())
    }

    // The source's block is acquired before the current block is released,
    // so the count never drops to zero when both already share a block.
    fn clone_from(&mut self, source: &Self) {
        let block = source.acquire();
        self.release();
        self.block = block;
    }
}

impl<T: ?Sized> Default for SharedPtr<T> {
    fn default() -> Self {
        Self::null()
    }
}

impl<T: ?Sized> Deref for SharedPtr<T> {
    type Target = T;

    /// # Panics
    ///
    /// Panics if the pointer is empty.
    #[track_caller]
    fn deref(&self) -> &T {
        match Self::as_ref(self) {
            Some(value) => value,
            None => empty_deref(),
        }
    }
}

impl<T> From<T> for SharedPtr<T> {
    fn from(value: T) -> Self {
        Self::new(value)
    }
}

impl<T: ?Sized> From<Box<T>> for SharedPtr<T> {
    fn from(boxed: Box<T>) -> Self {
        Self::from_block(Some(ControlBlock::allocate(boxed)))
    }
}

impl<T: ?Sized + fmt::Debug> fmt::Debug for SharedPtr<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match Self::as_ref(self) {
            Some(value) => f.debug_tuple("SharedPtr").field(&value).finish(),
            None => f.write_str("SharedPtr(null)"),
        }
    }
}

impl<T: ?Sized + fmt::Display> fmt::Display for SharedPtr<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match Self::as_ref(self) {
            Some(value) => fmt::Display::fmt(value, f),
            None => f.write_str("null"),
        }
    }
}

impl<T: ?Sized> fmt::Pointer for SharedPtr<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&Self::address(self), f)
    }
}

impl<T: ?Sized + PartialEq> PartialEq for SharedPtr<T> {
    fn eq(&self, other: &Self) -> bool {
        Self::as_ref(self) == Self::as_ref(other)
    }
}

impl<T: ?Sized + Eq> Eq for SharedPtr<T> {}

impl<T: ?Sized + Hash> Hash for SharedPtr<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        Self::as_ref(self).hash(state)
    }
}

impl<T: ?Sized + Ord> Ord for SharedPtr<T> {
    #[inline]
    fn cmp(&self, other: &Self) -> Ordering {
        Self::as_ref(self).cmp(&Self::as_ref(other))
    }
}

impl<T: ?Sized + PartialOrd> PartialOrd for SharedPtr<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Self::as_ref(self).partial_cmp(&Self::as_ref(other))
    }
}
