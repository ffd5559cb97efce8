use core::marker::PhantomData;
use core::ptr::NonNull;

use pci_compat_errors::EmptyStackError;
use pci_compat_types::PciDeviceRecord;

use crate::stack::DeviceStack;

/// A borrowed, pointer-sized handle to a [`DeviceStack`].
///
/// The handle holds the exclusive borrow of the stack for `'a`, so the owner can't touch the stack
/// (or drop it) while an enumeration routine is working through the handle. It is neither
/// `Copy` nor `Clone`. Use [`RawStackHandle::reborrow`] to pass it down a call chain.
///
/// The layout is that of a non-null pointer, so a handle can be passed through `extern "C"` functions.
#[repr(transparent)]
#[derive(Debug)]
pub struct RawStackHandle<'a> {
    ptr: NonNull<DeviceStack>,
    _borrow: PhantomData<&'a mut DeviceStack>,
}

impl<'a> RawStackHandle<'a> {
    pub fn new(stack: &'a mut DeviceStack) -> Self {
        Self {
            ptr: NonNull::from(stack),
            _borrow: PhantomData,
        }
    }

    /// Rebuilds a handle from a pointer received across the C boundary. Returns `None` for a null pointer.
    ///
    /// ## Safety
    /// `ptr` must be null, or point to a live [`DeviceStack`] that nothing else accesses for `'a`.
    pub unsafe fn from_ptr(ptr: *mut DeviceStack) -> Option<Self> {
        NonNull::new(ptr).map(|ptr| Self {
            ptr,
            _borrow: PhantomData,
        })
    }

    pub fn as_ptr(&self) -> *mut DeviceStack {
        self.ptr.as_ptr()
    }

    /// Borrows the handle again for a shorter lifetime
    pub fn reborrow(&mut self) -> RawStackHandle<'_> {
        RawStackHandle {
            ptr: self.ptr,
            _borrow: PhantomData,
        }
    }

    pub fn as_stack(&self) -> &DeviceStack {
        // `self` holds the exclusive borrow for 'a
        unsafe { self.ptr.as_ref() }
    }

    pub fn as_stack_mut(&mut self) -> &mut DeviceStack {
        unsafe { self.ptr.as_mut() }
    }

    pub fn len(&self) -> usize {
        self.as_stack().len()
    }

    pub fn is_empty(&self) -> bool {
        self.as_stack().is_empty()
    }

    pub fn push(&mut self, record: PciDeviceRecord) {
        self.as_stack_mut().push(record)
    }

    pub fn pop(&mut self) -> Result<PciDeviceRecord, EmptyStackError> {
        self.as_stack_mut().pop()
    }
}

impl<'a> From<&'a mut DeviceStack> for RawStackHandle<'a> {
    fn from(stack: &'a mut DeviceStack) -> Self {
        Self::new(stack)
    }
}
