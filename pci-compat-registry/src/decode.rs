use core::fmt;

use pci_compat_primitives::{
    byte_or_zero,
    primitive::{LeU16, LeU32},
};
use pci_compat_types::PciDeviceRecord;

use crate::{keys, RegistryEntry};

/// How the `vendor-id` property buffer is turned into a 16-bit id.
#[derive(Copy, Clone, Debug, Default, Hash, PartialEq, Eq)]
pub enum VendorIdDecoding {
    /// The low two bytes, little-endian. This is how the registry actually packs the id.
    #[default]
    LittleEndian,
    /// `(byte[3] << 8) | byte[2]`, matching records captured by older releases of the compat layer.
    /// Those releases only copied the first 3 bytes of the buffer, so `byte[3]` reads as zero when absent.
    Reference,
}

impl VendorIdDecoding {
    pub const fn min_len(self) -> usize {
        match self {
            Self::LittleEndian => 2,
            Self::Reference => 3,
        }
    }

    pub fn decode(self, bytes: &[u8]) -> Option<u16> {
        if bytes.len() < self.min_len() {
            return None;
        }

        Some(match self {
            Self::LittleEndian => LeU16::from_le_prefix(bytes).get(),
            Self::Reference => (u16::from(byte_or_zero(bytes, 3)) << 8) | u16::from(bytes[2]),
        })
    }
}

/// Why an entry did not produce a record
#[derive(Copy, Clone, Debug, Hash, PartialEq, Eq)]
pub enum SkipReason {
    Missing(&'static str),
    Truncated { key: &'static str, len: usize },
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Missing(key) => write!(f, "missing property {key}"),
            Self::Truncated { key, len } => write!(f, "property {key} is only {len} bytes"),
        }
    }
}

const MIN_ID_LEN: usize = 2;
const MIN_REVISION_LEN: usize = 1;
const MIN_CLASS_LEN: usize = 3;

fn require<'a, E: RegistryEntry + ?Sized>(
    entry: &'a E,
    key: &'static str,
    min_len: usize,
) -> Result<std::borrow::Cow<'a, [u8]>, SkipReason> {
    let bytes = entry.property(key).ok_or(SkipReason::Missing(key))?;
    if bytes.len() < min_len {
        Err(SkipReason::Truncated {
            key,
            len: bytes.len(),
        })
    } else {
        Ok(bytes)
    }
}

/// Decodes an entry into a record. Every one of the four properties must be present.
pub fn decode_entry<E: RegistryEntry + ?Sized>(
    entry: &E,
    vendor_id_decoding: VendorIdDecoding,
) -> Result<PciDeviceRecord, SkipReason> {
    let vendor = require(entry, keys::VENDOR_ID, vendor_id_decoding.min_len())?;
    let device = require(entry, keys::DEVICE_ID, MIN_ID_LEN)?;
    let revision = require(entry, keys::REVISION_ID, MIN_REVISION_LEN)?;
    let class = require(entry, keys::CLASS_CODE, MIN_CLASS_LEN)?;

    let vendor_id = vendor_id_decoding
        .decode(&vendor)
        .ok_or(SkipReason::Truncated {
            key: keys::VENDOR_ID,
            len: vendor.len(),
        })?;

    Ok(PciDeviceRecord::new(
        vendor_id,
        LeU16::from_le_prefix(&device).get(),
        revision[0],
        LeU32::from_le_prefix(&class).get(),
    ))
}
