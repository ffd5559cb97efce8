//! C entry points.
//!
//! A C caller owns a stack through the pointer from [`pci_compat_stack_create`] and must give it
//! back to [`pci_compat_stack_free`] exactly once. Every other function only borrows the stack for
//! the duration of the call. Status codes are those of [`CompatStatus`].

use pci_compat_datastructures::{DeviceStack, RawStackHandle};
use pci_compat_errors::CompatStatus;
use pci_compat_types::PciDeviceRecord;

use crate::platform::default_registry;
use crate::walk::{walk_into, WalkOptions};
use crate::Registry;

#[no_mangle]
pub extern "C" fn pci_compat_stack_create() -> *mut DeviceStack {
    Box::into_raw(Box::new(DeviceStack::new()))
}

/// ## Safety
/// `stack` must be null or a pointer from [`pci_compat_stack_create`] that has not been freed
#[no_mangle]
pub unsafe extern "C" fn pci_compat_stack_free(stack: *mut DeviceStack) {
    if !stack.is_null() {
        drop(unsafe { Box::from_raw(stack) });
    }
}

/// Returns the number of records, or 0 for a null stack
///
/// ## Safety
/// `stack` must be null or point to a live [`DeviceStack`]
#[no_mangle]
pub unsafe extern "C" fn pci_compat_stack_len(stack: *mut DeviceStack) -> usize {
    match unsafe { RawStackHandle::from_ptr(stack) } {
        Some(handle) => handle.len(),
        None => 0,
    }
}

/// ## Safety
/// `stack` must be null or point to a live [`DeviceStack`] not otherwise accessed during the call
#[no_mangle]
pub unsafe extern "C" fn pci_compat_stack_push(
    stack: *mut DeviceStack,
    record: PciDeviceRecord,
) -> i32 {
    match unsafe { RawStackHandle::from_ptr(stack) } {
        Some(mut handle) => {
            handle.push(record);
            CompatStatus::Success.into_raw()
        }
        None => CompatStatus::OsError.into_raw(),
    }
}

/// Pops into `out`. On an empty stack, returns [`CompatStatus::EmptyStack`] and leaves `out` untouched.
///
/// ## Safety
/// `stack` as for [`pci_compat_stack_push`]. `out` must be null or valid for a write of one record.
#[no_mangle]
pub unsafe extern "C" fn pci_compat_stack_pop(
    stack: *mut DeviceStack,
    out: *mut PciDeviceRecord,
) -> i32 {
    let Some(mut handle) = (unsafe { RawStackHandle::from_ptr(stack) }) else {
        return CompatStatus::OsError.into_raw();
    };
    if out.is_null() {
        return CompatStatus::OsError.into_raw();
    }

    match handle.pop() {
        Ok(record) => {
            unsafe { out.write(record) };
            CompatStatus::Success.into_raw()
        }
        Err(e) => CompatStatus::from(e).into_raw(),
    }
}

/// Walks `registry` into a borrowed stack, returning the status for the C side
pub fn walk_into_status<R: Registry + ?Sized>(
    registry: &R,
    handle: Option<RawStackHandle<'_>>,
    opts: &WalkOptions,
) -> CompatStatus {
    let Some(handle) = handle else {
        return CompatStatus::OsError;
    };

    match walk_into(registry, handle, opts) {
        Ok(_) => CompatStatus::Success,
        Err(e) => e.status(),
    }
}

/// Enumerates the platform registry onto `stack`. Returns `0` on success or a negative status.
///
/// ## Safety
/// `stack` as for [`pci_compat_stack_push`]
#[no_mangle]
pub unsafe extern "C" fn pci_compat_get_pci_stack(stack: *mut DeviceStack) -> i32 {
    let handle = unsafe { RawStackHandle::from_ptr(stack) };
    walk_into_status(&default_registry(), handle, &WalkOptions::default()).into_raw()
}
