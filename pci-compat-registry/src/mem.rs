//! An in-memory registry, for tests and for callers that already hold property dumps.

use std::borrow::Cow;
use std::cell::Cell;
use std::rc::Rc;

use pci_compat_errors::{EnumerationFailure, FailureKind};
use pci_compat_types::PciDeviceRecord;

use crate::{keys, Registry, RegistryEntry, PCI_DEVICE_SERVICE};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MemoryEntry {
    name: String,
    service: String,
    properties: Vec<(String, Vec<u8>)>,
}

impl MemoryEntry {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            service: PCI_DEVICE_SERVICE.to_string(),
            properties: Vec::new(),
        }
    }

    /// Builds an entry carrying a record's fields the way the registry publishes them:
    /// each property as a 4-byte little-endian buffer.
    pub fn pci(name: impl Into<String>, record: PciDeviceRecord) -> Self {
        Self::new(name)
            .with_property(keys::VENDOR_ID, u32::from(record.vendor_id).to_le_bytes())
            .with_property(keys::DEVICE_ID, u32::from(record.device_id).to_le_bytes())
            .with_property(keys::REVISION_ID, u32::from(record.revision_id).to_le_bytes())
            .with_property(keys::CLASS_CODE, record.class_code.to_le_bytes())
    }

    pub fn with_service(mut self, service: impl Into<String>) -> Self {
        self.service = service.into();
        self
    }

    /// Sets `key`, replacing any previous value
    pub fn with_property(mut self, key: &str, value: impl AsRef<[u8]>) -> Self {
        self.set_property(key, value);
        self
    }

    pub fn set_property(&mut self, key: &str, value: impl AsRef<[u8]>) {
        let value = value.as_ref().to_vec();
        match self.properties.iter_mut().find(|(k, _)| k == key) {
            Some((_, v)) => *v = value,
            None => self.properties.push((key.to_string(), value)),
        }
    }

    pub fn remove_property(&mut self, key: &str) -> Option<Vec<u8>> {
        let idx = self.properties.iter().position(|(k, _)| k == key)?;
        Some(self.properties.remove(idx).1)
    }

    pub fn service(&self) -> &str {
        &self.service
    }
}

impl RegistryEntry for MemoryEntry {
    fn name(&self) -> Cow<'_, str> {
        Cow::Borrowed(&self.name)
    }

    fn property(&self, key: &str) -> Option<Cow<'_, [u8]>> {
        self.properties
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| Cow::Borrowed(&v[..]))
    }
}

#[derive(Clone, Debug, Default)]
pub struct MemoryRegistry {
    entries: Vec<MemoryEntry>,
    failure: Option<FailureKind>,
    open_iterators: Rc<Cell<usize>>,
}

impl MemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entry(mut self, entry: MemoryEntry) -> Self {
        self.entries.push(entry);
        self
    }

    pub fn push(&mut self, entry: MemoryEntry) {
        self.entries.push(entry);
    }

    /// Makes every subsequent query fail with `kind`, as if the registry could not be reached
    pub fn fail_with(mut self, kind: FailureKind) -> Self {
        self.failure = Some(kind);
        self
    }

    pub fn entries(&self) -> &[MemoryEntry] {
        &self.entries
    }

    /// Number of iterators from [`Registry::matching_services`] that are still alive
    pub fn open_iterators(&self) -> usize {
        self.open_iterators.get()
    }
}

impl FromIterator<MemoryEntry> for MemoryRegistry {
    fn from_iter<I: IntoIterator<Item = MemoryEntry>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
            ..Self::default()
        }
    }
}

pub struct MemoryIter {
    inner: std::vec::IntoIter<MemoryEntry>,
    open: Rc<Cell<usize>>,
}

impl Iterator for MemoryIter {
    type Item = MemoryEntry;

    fn next(&mut self) -> Option<MemoryEntry> {
        self.inner.next()
    }
}

impl Drop for MemoryIter {
    fn drop(&mut self) {
        self.open.set(self.open.get() - 1);
    }
}

impl Registry for MemoryRegistry {
    type Entry = MemoryEntry;
    type Iter = MemoryIter;

    fn matching_services(&self, service: &str) -> Result<MemoryIter, EnumerationFailure> {
        if let Some(kind) = self.failure {
            return Err(EnumerationFailure::new(kind));
        }

        let matched = self
            .entries
            .iter()
            .filter(|e| e.service == service)
            .cloned()
            .collect::<Vec<_>>();

        self.open_iterators.set(self.open_iterators.get() + 1);
        Ok(MemoryIter {
            inner: matched.into_iter(),
            open: self.open_iterators.clone(),
        })
    }
}

#[cfg(test)]
mod test {
    use super::{MemoryEntry, MemoryRegistry};
    use crate::{keys, Registry, RegistryEntry, PCI_DEVICE_SERVICE};
    use pci_compat_errors::FailureKind;
    use pci_compat_types::PciDeviceRecord;

    #[test]
    fn test_pci_entry_layout() {
        let e = MemoryEntry::pci("e", PciDeviceRecord::new(0x8086, 0x1237, 2, 0x060000));
        assert_eq!(e.property(keys::VENDOR_ID).as_deref(), Some(&[0x86, 0x80, 0, 0][..]));
        assert_eq!(e.property(keys::CLASS_CODE).as_deref(), Some(&[0, 0, 6, 0][..]));
        assert_eq!(e.property("subsystem-id"), None);
    }

    #[test]
    fn test_set_property_replaces() {
        let e = MemoryEntry::new("e")
            .with_property(keys::DEVICE_ID, [1, 2])
            .with_property(keys::DEVICE_ID, [3, 4]);
        assert_eq!(e.property(keys::DEVICE_ID).as_deref(), Some(&[3, 4][..]));
    }

    #[test]
    fn test_matching_filters_service() {
        let reg = MemoryRegistry::new()
            .with_entry(MemoryEntry::new("a"))
            .with_entry(MemoryEntry::new("b").with_service("IOUSBDevice"));
        let names = reg
            .matching_services(PCI_DEVICE_SERVICE)
            .unwrap()
            .map(|e| e.name().into_owned())
            .collect::<Vec<_>>();
        assert_eq!(names, ["a"]);
    }

    #[test]
    fn test_iterator_released_on_drop() {
        let reg = MemoryRegistry::new().with_entry(MemoryEntry::new("a"));
        let mut iter = reg.matching_services(PCI_DEVICE_SERVICE).unwrap();
        assert_eq!(reg.open_iterators(), 1);
        let _ = iter.next();
        drop(iter);
        assert_eq!(reg.open_iterators(), 0);
    }

    #[test]
    fn test_failure_switch() {
        let reg = MemoryRegistry::new().fail_with(FailureKind::PermissionDenied);
        let err = reg.matching_services(PCI_DEVICE_SERVICE).err().unwrap();
        assert_eq!(err.kind(), FailureKind::PermissionDenied);
        assert_eq!(reg.open_iterators(), 0);
    }
}
