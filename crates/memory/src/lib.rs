//! Memory management utilities for KSL
//!
//! Currently a single shared ownership pointer is implemented, [`SharedPtr`], which is a
//! reference-counted pointer without weak references or cycle detection. Counting isn't atomic,
//! so `SharedPtr` can't cross thread boundaries.
//!
//! Each value is held in a separately allocated control block alongside its use count. Empty
//! pointers don't allocate a control block.
//!
//! # Features
//!
//! - `log`: emits `trace` level events when control blocks are allocated and destroyed.

#![warn(missing_docs)]

mod address;
mod control_block;
mod error;
mod shared_ptr;

pub use address::Address;
pub use error::{Error, Result};
pub use shared_ptr::SharedPtr;
