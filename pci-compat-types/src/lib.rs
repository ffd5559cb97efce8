use core::fmt;

use pci_compat_primitives::{le_fake_enum, primitive::*};

use bytemuck::{Pod, Zeroable};

le_fake_enum! {
    #[repr(LeU8)]
    pub enum DeviceClass{
        Unclassified = 0x00,
        MassStorage = 0x01,
        Network = 0x02,
        Display = 0x03,
        Multimedia = 0x04,
        Memory = 0x05,
        Bridge = 0x06,
        SimpleCommunication = 0x07,
        BaseSystemPeripheral = 0x08,
        Input = 0x09,
        DockingStation = 0x0A,
        Processor = 0x0B,
        SerialBus = 0x0C,
        Wireless = 0x0D,
        Intelligent = 0x0E,
        SatelliteCommunication = 0x0F,
        Encryption = 0x10,
        SignalProcessing = 0x11,
        ProcessingAccelerator = 0x12,
        NonEssentialInstrumentation = 0x13,
        Coprocessor = 0x40,
        Unassigned = 0xFF,
    }
}

impl DeviceClass {
    #[inline]
    pub const fn from_raw(x: u8) -> Self {
        Self(LeU8::new(x))
    }

    #[inline]
    pub const fn into_raw(self) -> u8 {
        self.0.get()
    }
}

/// One PCI device as reported by the platform registry.
///
/// The layout is fixed so the record can be passed by value across the C boundary.
/// A record with every field zero is the "not populated" state and is a valid value.
#[derive(Copy, Clone, Debug, Default, Hash, PartialEq, Eq, Pod, Zeroable)]
#[repr(C)]
pub struct PciDeviceRecord {
    pub vendor_id: u16,
    pub device_id: u16,
    /// Class triple packed as `0x00CCSSPP` (class, subclass, programming interface)
    pub class_code: u32,
    pub revision_id: u8,
    #[doc(hidden)]
    pub __reserved: [u8; 3],
}

impl PciDeviceRecord {
    pub const fn new(vendor_id: u16, device_id: u16, revision_id: u8, class_code: u32) -> Self {
        Self {
            vendor_id,
            device_id,
            class_code,
            revision_id,
            __reserved: [0; 3],
        }
    }

    pub const fn empty() -> Self {
        pci_compat_primitives::const_zeroed_safe()
    }

    pub const fn is_empty(&self) -> bool {
        self.vendor_id == 0 && self.device_id == 0 && self.revision_id == 0 && self.class_code == 0
    }

    pub const fn matches_id(&self, vendor_id: u16, device_id: u16) -> bool {
        self.vendor_id == vendor_id && self.device_id == device_id
    }

    #[inline]
    pub const fn class(&self) -> u8 {
        (self.class_code >> 16) as u8
    }

    #[inline]
    pub const fn subclass(&self) -> u8 {
        (self.class_code >> 8) as u8
    }

    #[inline]
    pub const fn prog_if(&self) -> u8 {
        self.class_code as u8
    }

    pub const fn device_class(&self) -> DeviceClass {
        DeviceClass::from_raw(self.class())
    }
}

impl fmt::Display for PciDeviceRecord {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "VID={:04x} DID={:04x} Class={:x} Subclass={:x} PIF={:x} Rev={:x}",
            self.vendor_id,
            self.device_id,
            self.class(),
            self.subclass(),
            self.prog_if(),
            self.revision_id
        )
    }
}

#[cfg(test)]
mod test {
    use super::{DeviceClass, PciDeviceRecord};

    #[test]
    fn test_record_layout() {
        assert_eq!(core::mem::size_of::<PciDeviceRecord>(), 12);
        assert_eq!(core::mem::align_of::<PciDeviceRecord>(), 4);
    }

    #[test]
    fn test_default_is_zeroed() {
        let rec = PciDeviceRecord::default();
        assert_eq!(rec, <PciDeviceRecord as bytemuck::Zeroable>::zeroed());
        assert_eq!(rec, PciDeviceRecord::empty());
        assert!(rec.is_empty());
        assert!(bytemuck::bytes_of(&rec).iter().all(|b| *b == 0));
    }

    #[test]
    fn test_class_triple() {
        let rec = PciDeviceRecord::new(0x8086, 0x1237, 0x02, 0x0c0330);
        assert_eq!(rec.class(), 0x0c);
        assert_eq!(rec.subclass(), 0x03);
        assert_eq!(rec.prog_if(), 0x30);
        assert_eq!(rec.device_class(), DeviceClass::SerialBus);
        assert!(!rec.is_empty());
    }

    #[test]
    fn test_unknown_class_validates_false() {
        let class = DeviceClass::from_raw(0x7f);
        assert!(!class.validate());
        assert_eq!(format!("{}", class), "DeviceClass(127)");
        assert!(DeviceClass::Network.validate());
    }

    #[test]
    fn test_display() {
        let rec = PciDeviceRecord::new(0x10de, 0x1c82, 0xa1, 0x030000);
        assert_eq!(
            rec.to_string(),
            "VID=10de DID=1c82 Class=3 Subclass=0 PIF=0 Rev=a1"
        );
    }
}
