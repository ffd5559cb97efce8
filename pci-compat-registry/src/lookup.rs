//! By-id lookup over an enumerated stack.

use pci_compat_datastructures::DeviceStack;
use pci_compat_types::PciDeviceRecord;

/// Pops `stack` until a record with the given ids turns up. When several match, the one discovered last wins.
pub fn find_by_id(mut stack: DeviceStack, vendor_id: u16, device_id: u16) -> Option<PciDeviceRecord> {
    stack
        .drain_lifo()
        .find(|rec| rec.matches_id(vendor_id, device_id))
}

/// Returns a stack holding only the matching records, in the same relative order
pub fn filter_by_id(stack: DeviceStack, vendor_id: u16, device_id: u16) -> DeviceStack {
    stack
        .into_discovery_order()
        .into_iter()
        .filter(|rec| rec.matches_id(vendor_id, device_id))
        .collect()
}
