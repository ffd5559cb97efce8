//! The enumeration side of the compat layer.
//!
//! A platform registry is modeled as a flat sequence of entries, each of which may expose the
//! raw byte-buffer properties `vendor-id`, `device-id`, `revision-id` and `class-code`.
//! [`walk::walk`] decodes every complete entry into a [`PciDeviceRecord`] and pushes it onto a
//! [`DeviceStack`].

use std::borrow::Cow;

use pci_compat_errors::EnumerationFailure;

pub mod decode;
pub mod ffi;
pub mod lookup;
pub mod mem;
pub mod platform;
pub mod walk;

#[cfg(feature = "sysfs")]
pub mod sysfs;

#[cfg(all(feature = "iokit", target_os = "macos"))]
pub mod iokit;

pub use pci_compat_datastructures::{DeviceStack, RawStackHandle};
pub use pci_compat_types::PciDeviceRecord;

/// The registry class name PCI devices are published under
pub const PCI_DEVICE_SERVICE: &str = "IOPCIDevice";

pub mod keys {
    pub const VENDOR_ID: &str = "vendor-id";
    pub const DEVICE_ID: &str = "device-id";
    pub const REVISION_ID: &str = "revision-id";
    pub const CLASS_CODE: &str = "class-code";
}

/// A single service published by a platform registry
pub trait RegistryEntry {
    fn name(&self) -> Cow<'_, str>;

    /// Returns the raw bytes of the property `key`, or `None` if the entry doesn't have it
    /// (or has it with a type other than raw data).
    fn property(&self, key: &str) -> Option<Cow<'_, [u8]>>;
}

/// A queryable catalog of hardware services.
///
/// The iterator returned by [`Registry::matching_services`] owns whatever OS resources the query
/// acquired. They are released when the iterator is dropped, whether or not it was exhausted.
pub trait Registry {
    type Entry: RegistryEntry;
    type Iter: Iterator<Item = Self::Entry>;

    fn matching_services(&self, service: &str) -> Result<Self::Iter, EnumerationFailure>;
}

impl<R: Registry + ?Sized> Registry for &R {
    type Entry = R::Entry;
    type Iter = R::Iter;

    fn matching_services(&self, service: &str) -> Result<Self::Iter, EnumerationFailure> {
        (**self).matching_services(service)
    }
}
