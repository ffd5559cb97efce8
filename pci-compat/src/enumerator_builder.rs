#[cfg(feature = "sysfs")]
use std::path::PathBuf;

use pci_compat_datastructures::DeviceStack;
use pci_compat_errors::PciEnumerationError;
use pci_compat_registry::decode::VendorIdDecoding;
use pci_compat_registry::lookup::{filter_by_id, find_by_id};
use pci_compat_registry::platform::PlatformRegistry;
#[cfg(feature = "sysfs")]
use pci_compat_registry::sysfs::SysfsRegistry;
use pci_compat_registry::walk::{walk, WalkOptions};
use pci_compat_registry::Registry;
use pci_compat_types::PciDeviceRecord;

/// Configures an [`Enumerator`]. Without an explicit registry, [`EnumeratorBuilder::build`] uses
/// the platform default.
#[derive(Clone, Debug)]
pub struct EnumeratorBuilder<R = PlatformRegistry> {
    registry: Option<R>,
    options: WalkOptions,
}

impl EnumeratorBuilder<PlatformRegistry> {
    pub fn new() -> Self {
        Self {
            registry: None,
            options: WalkOptions::default(),
        }
    }
}

impl Default for EnumeratorBuilder<PlatformRegistry> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Registry> EnumeratorBuilder<R> {
    /// Replaces the registry, keeping the walk options
    pub fn registry<S: Registry>(self, registry: S) -> EnumeratorBuilder<S> {
        EnumeratorBuilder {
            registry: Some(registry),
            options: self.options,
        }
    }

    pub fn vendor_id_decoding(mut self, decoding: VendorIdDecoding) -> Self {
        self.options.vendor_id_decoding = decoding;
        self
    }

    /// Sets the registry service class to match. Defaults to `IOPCIDevice`.
    pub fn service(mut self, service: impl Into<String>) -> Self {
        self.options.service = service.into();
        self
    }

    /// Reads devices from a sysfs tree mounted at `root` instead of the platform registry
    #[cfg(feature = "sysfs")]
    pub fn sysfs_root(self, root: impl Into<PathBuf>) -> EnumeratorBuilder<SysfsRegistry> {
        self.registry(SysfsRegistry::with_root(root))
    }

    pub fn options(&self) -> &WalkOptions {
        &self.options
    }

    pub fn build(self) -> Enumerator<R>
    where
        R: Default,
    {
        Enumerator {
            registry: self.registry.unwrap_or_default(),
            options: self.options,
        }
    }
}

/// Walks one registry with fixed options. Every call is a fresh walk.
#[derive(Clone, Debug)]
pub struct Enumerator<R = PlatformRegistry> {
    registry: R,
    options: WalkOptions,
}

impl<R: Registry> Enumerator<R> {
    pub fn registry(&self) -> &R {
        &self.registry
    }

    pub fn stack(&self) -> Result<DeviceStack, PciEnumerationError> {
        Ok(walk(&self.registry, &self.options)?)
    }

    pub fn list(&self) -> Result<Vec<PciDeviceRecord>, PciEnumerationError> {
        Ok(self.stack()?.into_discovery_order())
    }

    pub fn by_id(
        &self,
        vendor_id: u16,
        device_id: u16,
    ) -> Result<Option<PciDeviceRecord>, PciEnumerationError> {
        Ok(find_by_id(self.stack()?, vendor_id, device_id))
    }

    /// Every device with the given ids, in discovery order
    pub fn all_by_id(
        &self,
        vendor_id: u16,
        device_id: u16,
    ) -> Result<Vec<PciDeviceRecord>, PciEnumerationError> {
        Ok(filter_by_id(self.stack()?, vendor_id, device_id).into_discovery_order())
    }
}

#[cfg(test)]
mod test {
    use super::EnumeratorBuilder;
    use pci_compat_errors::{FailureKind, PciEnumerationError};
    use pci_compat_registry::decode::VendorIdDecoding;
    use pci_compat_registry::keys;
    use pci_compat_registry::mem::{MemoryEntry, MemoryRegistry};
    use pci_compat_types::PciDeviceRecord;

    fn registry() -> MemoryRegistry {
        MemoryRegistry::new()
            .with_entry(MemoryEntry::pci("host", PciDeviceRecord::new(0x8086, 0x1237, 2, 0x060000)))
            .with_entry(MemoryEntry::pci("isa", PciDeviceRecord::new(0x8086, 0x7000, 0, 0x060100)))
            .with_entry(MemoryEntry::pci("net", PciDeviceRecord::new(0x1af4, 0x1000, 0, 0x020000)))
            .with_entry(MemoryEntry::pci("host2", PciDeviceRecord::new(0x8086, 0x1237, 3, 0x060000)))
    }

    #[test]
    fn test_list_discovery_order() {
        let list = EnumeratorBuilder::new().registry(registry()).build().list().unwrap();
        let revs = list.iter().map(|r| r.revision_id).collect::<Vec<_>>();
        assert_eq!(revs, [2, 0, 0, 3]);
    }

    #[test]
    fn test_by_id() {
        let en = EnumeratorBuilder::new().registry(registry()).build();
        assert_eq!(en.by_id(0x8086, 0x1237).unwrap().map(|r| r.revision_id), Some(3));
        assert_eq!(en.by_id(0x10de, 0x0001).unwrap(), None);
        assert_eq!(en.all_by_id(0x8086, 0x1237).unwrap().len(), 2);
    }

    #[test]
    fn test_enumerator_walks_fresh() {
        let en = EnumeratorBuilder::new().registry(registry()).build();
        assert_eq!(en.stack().unwrap().len(), 4);
        assert_eq!(en.stack().unwrap().len(), 4);
        assert_eq!(en.registry().open_iterators(), 0);
    }

    #[test]
    fn test_builder_options() {
        let reg = MemoryRegistry::new()
            .with_entry(
                MemoryEntry::pci("a", PciDeviceRecord::new(0x8086, 1, 0, 0))
                    .with_property(keys::VENDOR_ID, [0x86, 0x80, 0x34, 0x12]),
            )
            .with_entry(MemoryEntry::pci("b", PciDeviceRecord::new(0x1234, 2, 0, 0)).with_service("IOPCIBridge"));

        let en = EnumeratorBuilder::new()
            .vendor_id_decoding(VendorIdDecoding::Reference)
            .registry(reg.clone())
            .build();
        assert_eq!(en.list().unwrap()[0].vendor_id, 0x1234);

        let en = EnumeratorBuilder::new().registry(reg).service("IOPCIBridge").build();
        assert_eq!(en.list().unwrap(), [PciDeviceRecord::new(0x1234, 2, 0, 0)]);
    }

    #[test]
    fn test_failure_maps_to_error() {
        let en = EnumeratorBuilder::new()
            .registry(MemoryRegistry::new().fail_with(FailureKind::PermissionDenied))
            .build();
        assert!(matches!(en.list(), Err(PciEnumerationError::PermissionDenied)));
    }
}
