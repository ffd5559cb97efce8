//! Selects the device registry of the host platform.

use pci_compat_errors::{EnumerationFailure, FailureKind};

use crate::mem::MemoryEntry;
use crate::Registry;

#[cfg(all(feature = "iokit", target_os = "macos"))]
pub type PlatformRegistry = crate::iokit::IoKitRegistry;

#[cfg(all(feature = "sysfs", target_os = "linux"))]
pub type PlatformRegistry = crate::sysfs::SysfsRegistry;

#[cfg(not(any(
    all(feature = "iokit", target_os = "macos"),
    all(feature = "sysfs", target_os = "linux")
)))]
pub type PlatformRegistry = UnsupportedRegistry;

pub fn default_registry() -> PlatformRegistry {
    PlatformRegistry::default()
}

/// Stands in on platforms without a supported backend. Every query fails with [`FailureKind::OsError`].
#[derive(Copy, Clone, Debug, Default, Hash, PartialEq, Eq)]
pub struct UnsupportedRegistry;

impl Registry for UnsupportedRegistry {
    type Entry = MemoryEntry;
    type Iter = std::iter::Empty<MemoryEntry>;

    fn matching_services(&self, service: &str) -> Result<Self::Iter, EnumerationFailure> {
        log::warn!(
            "no device registry backend for {} (looking for {service})",
            std::env::consts::OS
        );
        Err(EnumerationFailure::new(FailureKind::OsError))
    }
}
