use std::{
    alloc::{self, Layout},
    cell::Cell,
    process,
    ptr::NonNull,
};

use crate::{Error, Result};

macro_rules! trace {
    ($($arg:tt)*) => {
        #[cfg(feature = "log")]
        log::trace!(target: "ksl_memory", $($arg)*);
    };
}

/// The shared state behind one or more [`SharedPtr`](crate::SharedPtr)s
///
/// The block owns the value exclusively, the handles only own the block. The value is stored as
/// the pointer that came out of its `Box`, so dropping it through `Box::from_raw` runs the
/// correct destructor for trait objects.
pub(crate) struct ControlBlock<T: ?Sized> {
    share_count: Cell<usize>,
    owned: NonNull<T>,
}

impl<T: ?Sized> ControlBlock<T> {
    /// Allocates a block with a share count of 1 that takes ownership of `owned`
    ///
    /// If the block can't be allocated then `owned` is dropped before the error is returned.
    pub(crate) fn try_allocate(owned: Box<T>) -> Result<NonNull<Self>> {
        let layout = Layout::new::<Self>();

        // Safety: the layout has a non-zero size, the block holds a counter and a pointer
        let raw = unsafe { alloc::alloc(layout) }.cast::<Self>();
        let Some(block) = NonNull::new(raw) else {
            return Err(Error::allocation_failed(layout));
        };

        let owned = NonNull::from(Box::leak(owned));
        // Safety: `block` is freshly allocated with the layout of `Self`
        unsafe {
            block.as_ptr().write(Self {
                share_count: Cell::new(1),
                owned,
            });
        }

        trace!("allocated control block {block:p} for value {:p}", owned);
        Ok(block)
    }

    /// Allocates a block with a share count of 1, aborting if the allocation fails
    pub(crate) fn allocate(owned: Box<T>) -> NonNull<Self> {
        match Self::try_allocate(owned) {
            Ok(block) => block,
            Err(_) => alloc::handle_alloc_error(Layout::new::<Self>()),
        }
    }

    /// Drops the owned value and then frees the block
    ///
    /// # Safety
    ///
    /// `block` must have been returned by one of the allocation functions, its share count must
    /// have reached zero, and it must not be used again afterwards.
    pub(crate) unsafe fn destroy(block: NonNull<Self>) {
        trace!("destroying control block {block:p}");

        // Safety: blocks are allocated with `Layout::new::<Self>()` from the global allocator,
        // which is the allocation that `Box<Self>` expects. Dropping the box drops the value
        // first (see the `Drop` impl), then frees the block.
        unsafe { drop(Box::from_raw(block.as_ptr())) };
    }

    /// Frees the block without dropping the owned value, which is returned to the caller
    ///
    /// # Safety
    ///
    /// Same requirements as [`ControlBlock::destroy`].
    pub(crate) unsafe fn into_owned(block: NonNull<Self>) -> Box<T> {
        trace!("releasing value from control block {block:p}");

        // Safety: the block is valid until it's deallocated below
        let owned = unsafe { block.as_ref() }.owned;
        // Safety: the block's fields have no drop glue, so the memory can be released directly
        unsafe { alloc::dealloc(block.as_ptr().cast(), Layout::new::<Self>()) };
        // Safety: `owned` came from `Box::leak` and hasn't been freed
        unsafe { Box::from_raw(owned.as_ptr()) }
    }

    /// Returns the number of handles referencing the block
    pub(crate) fn count(&self) -> usize {
        self.share_count.get()
    }

    /// Registers an additional handle
    pub(crate) fn increment(&self) {
        // Mirrors `Rc`: an overflowing count can only be reached by leaking handles
        match self.count().checked_add(1) {
            Some(count) => self.share_count.set(count),
            None => process::abort(),
        }
    }

    /// Unregisters a handle, returning the number of handles that remain
    pub(crate) fn decrement(&self) -> usize {
        let count = self.count() - 1;
        self.share_count.set(count);
        count
    }

    /// Returns a reference to the owned value
    pub(crate) fn value(&self) -> &T {
        // Safety: the value lives for as long as the block
        unsafe { self.owned.as_ref() }
    }

    /// Returns a pointer to the owned value
    pub(crate) fn value_ptr(&self) -> NonNull<T> {
        self.owned
    }
}

impl<T: ?Sized> Drop for ControlBlock<T> {
    fn drop(&mut self) {
        // Safety: the block is the exclusive owner of the value, which came from `Box::leak`
        unsafe { drop(Box::from_raw(self.owned.as_ptr())) };
    }
}
