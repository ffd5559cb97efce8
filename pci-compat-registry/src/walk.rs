use log::{debug, info, trace};

use pci_compat_datastructures::{DeviceStack, RawStackHandle};
use pci_compat_errors::EnumerationFailure;

use crate::decode::{decode_entry, VendorIdDecoding};
use crate::{Registry, RegistryEntry, PCI_DEVICE_SERVICE};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WalkOptions {
    pub vendor_id_decoding: VendorIdDecoding,
    pub service: String,
}

impl Default for WalkOptions {
    fn default() -> Self {
        Self {
            vendor_id_decoding: VendorIdDecoding::default(),
            service: PCI_DEVICE_SERVICE.to_string(),
        }
    }
}

#[derive(Copy, Clone, Debug, Default, Hash, PartialEq, Eq)]
pub struct WalkSummary {
    pub visited: usize,
    pub pushed: usize,
    pub skipped: usize,
}

/// Walks `registry` once, returning a new stack with a record for every complete entry.
/// The first entry found is at the bottom of the stack.
pub fn walk<R: Registry + ?Sized>(
    registry: &R,
    opts: &WalkOptions,
) -> Result<DeviceStack, EnumerationFailure> {
    let mut stack = DeviceStack::new();
    stack.with_raw_handle(|handle| walk_into(registry, handle, opts))?;
    Ok(stack)
}

/// Like [`walk`], but pushes onto a borrowed stack.
///
/// If the registry can't be queried, nothing is pushed.
pub fn walk_into<R: Registry + ?Sized>(
    registry: &R,
    mut handle: RawStackHandle<'_>,
    opts: &WalkOptions,
) -> Result<WalkSummary, EnumerationFailure> {
    let mut summary = WalkSummary::default();

    for entry in registry.matching_services(&opts.service)? {
        summary.visited += 1;
        match decode_entry(&entry, opts.vendor_id_decoding) {
            Ok(record) => {
                trace!("{}: pushing {}", entry.name(), record);
                handle.push(record);
                summary.pushed += 1;
            }
            Err(reason) => {
                debug!("{}: skipped ({})", entry.name(), reason);
                summary.skipped += 1;
            }
        }
    }

    info!(
        "{}: visited {} entries, found {} devices ({} skipped)",
        opts.service, summary.visited, summary.pushed, summary.skipped
    );

    Ok(summary)
}
