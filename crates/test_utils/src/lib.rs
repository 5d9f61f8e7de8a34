//! Testing utilities for KSL crates

#![warn(missing_docs)]

mod drop_counter;
mod shapes;

pub use drop_counter::{DropCounter, Tracked};
pub use shapes::{Circle, Shape, Square};
