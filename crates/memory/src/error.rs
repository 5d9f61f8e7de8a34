use std::alloc::Layout;
use thiserror::Error;

/// The errors that can be reported by fallible [`SharedPtr`](crate::SharedPtr) constructors
#[derive(Error, Clone, Debug, PartialEq, Eq)]
pub enum Error {
    /// The allocator was unable to provide memory for a control block
    #[error("Failed to allocate a control block ({size} bytes, alignment {align})")]
    AllocationFailed {
        /// The size of the requested allocation
        size: usize,
        /// The alignment of the requested allocation
        align: usize,
    },
}

impl Error {
    pub(crate) fn allocation_failed(layout: Layout) -> Self {
        Self::AllocationFailed {
            size: layout.size(),
            align: layout.align(),
        }
    }
}

/// The Result type returned by fallible [`SharedPtr`](crate::SharedPtr) constructors
pub type Result<T> = std::result::Result<T, Error>;
