//! PCI device enumeration for the host platform.
//!
//! ```no_run
//! for dev in pci_compat::get_pci_list()? {
//!     println!("{dev}");
//! }
//! # Ok::<(), pci_compat::PciEnumerationError>(())
//! ```

pub mod enumerator_builder;

pub use enumerator_builder::{Enumerator, EnumeratorBuilder};
pub use pci_compat_datastructures::{DeviceStack, RawStackHandle};
pub use pci_compat_errors::{CompatStatus, EmptyStackError, PciEnumerationError};
pub use pci_compat_registry::decode::VendorIdDecoding;
pub use pci_compat_types::{DeviceClass, PciDeviceRecord};

/// Enumerates every PCI device of the platform registry, in discovery order
pub fn get_pci_list() -> Result<Vec<PciDeviceRecord>, PciEnumerationError> {
    EnumeratorBuilder::new().build().list()
}

/// Looks up the device with the given ids. If several devices match, the one discovered last is returned.
pub fn get_pci_by_id(
    vendor_id: u16,
    device_id: u16,
) -> Result<Option<PciDeviceRecord>, PciEnumerationError> {
    EnumeratorBuilder::new().build().by_id(vendor_id, device_id)
}
