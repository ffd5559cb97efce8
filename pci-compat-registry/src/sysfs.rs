//! Device registry backed by the Linux sysfs PCI tree (`/sys/bus/pci/devices`).
//!
//! Each device directory exposes its configuration header fields as `0x`-prefixed hex text.
//! They are re-encoded as 4-byte little-endian buffers under the registry property names so that
//! sysfs entries decode exactly like any other registry entry.

use std::borrow::Cow;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::{debug, warn};

use pci_compat_errors::EnumerationFailure;
use pci_compat_primitives::hex::{parse_hex_u16, parse_hex_u32, parse_hex_u8};

use crate::{keys, Registry, RegistryEntry, PCI_DEVICE_SERVICE};

pub const DEFAULT_SYSFS_ROOT: &str = "/sys";

/// sysfs attribute file, and the registry property it is published as
const ATTRIBUTES: [(&str, &str); 4] = [
    ("vendor", keys::VENDOR_ID),
    ("device", keys::DEVICE_ID),
    ("revision", keys::REVISION_ID),
    ("class", keys::CLASS_CODE),
];

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SysfsRegistry {
    root: PathBuf,
}

impl Default for SysfsRegistry {
    fn default() -> Self {
        Self::with_root(DEFAULT_SYSFS_ROOT)
    }
}

impl SysfsRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn devices_dir(&self) -> PathBuf {
        self.root.join("bus").join("pci").join("devices")
    }
}

fn parse_attribute(attr: &str, contents: &str) -> io::Result<u32> {
    let parsed = match attr {
        "vendor" | "device" => parse_hex_u16(contents).map(u32::from),
        "revision" => parse_hex_u8(contents).map(u32::from),
        _ => parse_hex_u32(contents),
    };
    parsed.map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
}

fn read_attribute(dir: &Path, attr: &str) -> io::Result<u32> {
    let contents = fs::read_to_string(dir.join(attr))?;
    parse_attribute(attr, &contents)
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SysfsEntry {
    name: String,
    properties: Vec<(&'static str, [u8; 4])>,
}

impl SysfsEntry {
    fn read(path: &Path) -> Self {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let mut properties = Vec::with_capacity(ATTRIBUTES.len());
        for (attr, key) in ATTRIBUTES {
            match read_attribute(path, attr) {
                Ok(val) => properties.push((key, val.to_le_bytes())),
                Err(e) if e.kind() == io::ErrorKind::NotFound => {
                    debug!("{name}: no {attr} attribute")
                }
                Err(e) => warn!("{name}: could not read {attr}: {e}"),
            }
        }

        Self { name, properties }
    }
}

impl RegistryEntry for SysfsEntry {
    fn name(&self) -> Cow<'_, str> {
        Cow::Borrowed(&self.name)
    }

    fn property(&self, key: &str) -> Option<Cow<'_, [u8]>> {
        self.properties
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| Cow::Borrowed(&v[..]))
    }
}

/// Device directories, read one at a time as the iterator advances
pub struct SysfsIter {
    paths: std::vec::IntoIter<PathBuf>,
}

impl Iterator for SysfsIter {
    type Item = SysfsEntry;

    fn next(&mut self) -> Option<SysfsEntry> {
        self.paths.next().map(|path| SysfsEntry::read(&path))
    }
}

impl Registry for SysfsRegistry {
    type Entry = SysfsEntry;
    type Iter = SysfsIter;

    fn matching_services(&self, service: &str) -> Result<SysfsIter, EnumerationFailure> {
        let dir = self.devices_dir();

        if service != PCI_DEVICE_SERVICE {
            debug!("sysfs only publishes {PCI_DEVICE_SERVICE}, not {service}");
            return Ok(SysfsIter {
                paths: Vec::new().into_iter(),
            });
        }

        let mut paths = Vec::new();
        for entry in fs::read_dir(&dir)? {
            match entry {
                Ok(entry) => paths.push(entry.path()),
                Err(e) => warn!("{}: unreadable entry: {e}", dir.display()),
            }
        }
        paths.sort();

        Ok(SysfsIter {
            paths: paths.into_iter(),
        })
    }
}

#[cfg(test)]
mod test {
    use super::SysfsRegistry;
    use crate::walk::{walk, WalkOptions};
    use crate::{keys, Registry, RegistryEntry, PCI_DEVICE_SERVICE};
    use pci_compat_errors::FailureKind;
    use pci_compat_types::PciDeviceRecord;

    use std::fs;
    use std::path::{Path, PathBuf};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct TempTree(PathBuf);

    impl TempTree {
        fn new() -> Self {
            static NEXT: AtomicUsize = AtomicUsize::new(0);
            let path = std::env::temp_dir().join(format!(
                "pci-compat-sysfs-{}-{}",
                std::process::id(),
                NEXT.fetch_add(1, Ordering::Relaxed)
            ));
            fs::create_dir_all(path.join("bus/pci/devices")).unwrap();
            Self(path)
        }

        fn device(&self, name: &str, attrs: &[(&str, &str)]) -> &Self {
            let dir = self.0.join("bus/pci/devices").join(name);
            fs::create_dir_all(&dir).unwrap();
            for (attr, contents) in attrs {
                fs::write(dir.join(attr), contents).unwrap();
            }
            self
        }

        fn path(&self) -> &Path {
            &self.0
        }
    }

    impl Drop for TempTree {
        fn drop(&mut self) {
            let _ = fs::remove_dir_all(&self.0);
        }
    }

    #[test]
    fn test_sysfs_entry_properties() {
        let tree = TempTree::new();
        tree.device(
            "0000:00:00.0",
            &[
                ("vendor", "0x8086\n"),
                ("device", "0x1237\n"),
                ("revision", "0x02\n"),
                ("class", "0x060000\n"),
            ],
        );

        let reg = SysfsRegistry::with_root(tree.path());
        let entries = reg.matching_services(PCI_DEVICE_SERVICE).unwrap().collect::<Vec<_>>();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].name(), "0000:00:00.0");
        assert_eq!(
            entries[0].property(keys::VENDOR_ID).as_deref(),
            Some(&[0x86, 0x80, 0, 0][..])
        );
    }

    #[test]
    fn test_sysfs_walk() {
        let tree = TempTree::new();
        tree.device(
            "0000:00:00.0",
            &[
                ("vendor", "0x8086\n"),
                ("device", "0x1237\n"),
                ("revision", "0x02\n"),
                ("class", "0x060000\n"),
            ],
        )
        .device(
            "0000:00:01.0",
            &[("vendor", "0x8086\n"), ("device", "0x7000\n"), ("revision", "0x00\n")],
        )
        .device(
            "0000:00:02.0",
            &[
                ("vendor", "0x1234\n"),
                ("device", "0x1111\n"),
                ("revision", "0x02\n"),
                ("class", "0x030000\n"),
            ],
        );

        let stack = walk(&SysfsRegistry::with_root(tree.path()), &WalkOptions::default()).unwrap();
        assert_eq!(
            stack.into_discovery_order(),
            [
                PciDeviceRecord::new(0x8086, 0x1237, 0x02, 0x060000),
                PciDeviceRecord::new(0x1234, 0x1111, 0x02, 0x030000),
            ]
        );
    }

    #[test]
    fn test_sysfs_garbage_attribute_is_missing() {
        let tree = TempTree::new();
        tree.device(
            "0000:00:03.0",
            &[
                ("vendor", "not hex\n"),
                ("device", "0x1237\n"),
                ("revision", "0x02\n"),
                ("class", "0x060000\n"),
            ],
        );
        let stack = walk(&SysfsRegistry::with_root(tree.path()), &WalkOptions::default()).unwrap();
        assert!(stack.is_empty());
    }

    #[test]
    fn test_sysfs_missing_root() {
        let tree = TempTree::new();
        let reg = SysfsRegistry::with_root(tree.path().join("nonexistent"));
        let err = walk(&reg, &WalkOptions::default()).unwrap_err();
        assert_eq!(err.kind(), FailureKind::OsError);
        assert_eq!(
            err.io_source().map(|e| e.kind()),
            Some(std::io::ErrorKind::NotFound)
        );
    }

    #[test]
    fn test_sysfs_other_service_is_empty() {
        let tree = TempTree::new();
        tree.device("0000:00:00.0", &[("vendor", "0x8086\n")]);
        let reg = SysfsRegistry::with_root(tree.path());
        assert_eq!(reg.matching_services("IOUSBDevice").unwrap().count(), 0);
    }
}
