use std::{
    fmt,
    hash::{Hash, Hasher},
    ptr,
};

/// A wrapper for comparing and hashing pointer addresses
///
/// The address of an empty [`SharedPtr`](crate::SharedPtr) is the null address.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Address(*const u8);

impl Address {
    /// The address of an empty pointer
    pub const NULL: Self = Self(ptr::null());

    /// Returns true if this is the null address
    pub fn is_null(self) -> bool {
        self.0.is_null()
    }

    /// Returns the address as an integer
    pub fn as_usize(self) -> usize {
        self.0 as usize
    }
}

impl Default for Address {
    fn default() -> Self {
        Self::NULL
    }
}

impl<T: ?Sized> From<*const T> for Address {
    fn from(pointer: *const T) -> Self {
        Self(pointer as *const u8)
    }
}

impl<T: ?Sized> From<*mut T> for Address {
    fn from(pointer: *mut T) -> Self {
        Self(pointer as *const u8)
    }
}

impl Hash for Address {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_usize(self.as_usize());
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.0)
    }
}
