//! Untyped addresses and the checked cast to typed views.

use crate::error::{GemmError, Operand, Result};
use std::fmt;
use std::marker::PhantomData;

/// An untyped address in host or device memory.
///
/// The front end never dereferences these; they are forwarded to the
/// kernel backend as-is. A zero address is the null pointer.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct DevicePtr(usize);

impl DevicePtr {
    pub const NULL: DevicePtr = DevicePtr(0);

    /// Wrap a raw address.
    pub const fn new(addr: usize) -> Self {
        Self(addr)
    }

    #[inline]
    pub const fn addr(self) -> usize {
        self.0
    }

    #[inline]
    pub const fn is_null(self) -> bool {
        self.0 == 0
    }

    /// Whether the address is a multiple of `align`.
    #[inline]
    pub const fn is_aligned_to(self, align: usize) -> bool {
        align == 0 || self.0 % align == 0
    }

    /// View the address as a typed const pointer.
    #[inline]
    pub fn as_ptr<T>(self) -> *const T {
        self.0 as *const T
    }

    /// View the address as a typed mutable pointer.
    #[inline]
    pub fn as_mut_ptr<T>(self) -> *mut T {
        self.0 as *mut T
    }
}

impl fmt::Debug for DevicePtr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DevicePtr({:#x})", self.0)
    }
}

impl<T> From<*const T> for DevicePtr {
    fn from(ptr: *const T) -> Self {
        Self(ptr as usize)
    }
}

impl<T> From<*mut T> for DevicePtr {
    fn from(ptr: *mut T) -> Self {
        Self(ptr as usize)
    }
}

/// A typed, non-owning view of an operand address.
///
/// Obtained only through [`TypedPtr::cast`], so holding one proves the
/// address was checked against `T`'s alignment.
pub struct TypedPtr<T> {
    ptr: DevicePtr,
    _marker: PhantomData<*const T>,
}

impl<T> Clone for TypedPtr<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for TypedPtr<T> {}

impl<T> fmt::Debug for TypedPtr<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypedPtr")
            .field("ptr", &self.ptr)
            .field("type", &std::any::type_name::<T>())
            .finish()
    }
}

impl<T> TypedPtr<T> {
    /// Reinterpret `ptr` as pointing at `T` values.
    ///
    /// Null passes the check. Any other address must be a multiple of
    /// `align_of::<T>()`.
    ///
    /// # Errors
    ///
    /// Returns [`GemmError::Misaligned`] naming `operand` otherwise.
    pub fn cast(ptr: DevicePtr, operand: Operand) -> Result<Self> {
        let alignment = std::mem::align_of::<T>();
        if !ptr.is_aligned_to(alignment) {
            log::error!(
                "memory is not aligned: operand {} at {:#x} needs {} bytes",
                operand,
                ptr.addr(),
                alignment
            );
            return Err(GemmError::Misaligned {
                operand,
                address: ptr.addr(),
                alignment,
            });
        }
        Ok(Self {
            ptr,
            _marker: PhantomData,
        })
    }

    /// Drop the type again for the format-erased descriptor.
    #[inline]
    pub fn erase(self) -> DevicePtr {
        self.ptr
    }

    pub fn is_null(&self) -> bool {
        self.ptr.is_null()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use half::f16;

    #[test]
    fn test_cast_aligned() {
        let data = [1.0f32, 2.0];
        let ptr = DevicePtr::from(data.as_ptr());
        let typed = TypedPtr::<f32>::cast(ptr, Operand::A).unwrap();
        assert_eq!(typed.erase(), ptr);
    }

    #[test]
    fn test_cast_misaligned() {
        let err = TypedPtr::<f32>::cast(DevicePtr::new(0x1002), Operand::C).unwrap_err();
        match err {
            GemmError::Misaligned {
                operand,
                address,
                alignment,
            } => {
                assert_eq!(operand, Operand::C);
                assert_eq!(address, 0x1002);
                assert_eq!(alignment, 4);
            }
            other => panic!("unexpected error: {other}"),
        }

        // 2-byte alignment is enough for f16
        assert!(TypedPtr::<f16>::cast(DevicePtr::new(0x1002), Operand::C).is_ok());
        // Any byte address works for 8-bit formats
        assert!(TypedPtr::<i8>::cast(DevicePtr::new(0x1003), Operand::A).is_ok());
    }

    #[test]
    fn test_null_is_accepted() {
        let typed = TypedPtr::<f64>::cast(DevicePtr::NULL, Operand::D).unwrap();
        assert!(typed.is_null());
    }

    #[test]
    fn test_debug_is_hex() {
        assert_eq!(format!("{:?}", DevicePtr::new(0x110)), "DevicePtr(0x110)");
    }
}
