//! Device registry backed by IOKit.
//!
//! Every IOKit and CoreFoundation object acquired here is owned by a guard that releases it on drop,
//! so an early return from anywhere in a walk leaves nothing retained.

#![allow(non_camel_case_types, non_upper_case_globals)]

use std::borrow::Cow;
use std::ffi::{c_char, c_void, CStr, CString};

use log::warn;

use pci_compat_errors::{EnumerationFailure, FailureKind};

use crate::{Registry, RegistryEntry};

type kern_return_t = i32;
type mach_port_t = u32;
type io_object_t = mach_port_t;
type io_iterator_t = io_object_t;
type io_registry_entry_t = io_object_t;
type IOOptionBits = u32;

type CFTypeRef = *const c_void;
type CFAllocatorRef = *const c_void;
type CFStringRef = *const c_void;
type CFDataRef = *const c_void;
type CFMutableDictionaryRef = *mut c_void;
type CFTypeID = usize;
type CFIndex = isize;
type CFStringEncoding = u32;

const KERN_SUCCESS: kern_return_t = 0;
const IO_OBJECT_NULL: io_object_t = 0;
/// `MACH_PORT_NULL` selects the default main port on every macOS release
const MAIN_PORT_DEFAULT: mach_port_t = 0;
const kCFStringEncodingUTF8: CFStringEncoding = 0x0800_0100;
const kNilOptions: IOOptionBits = 0;
/// `io_name_t` is `char[128]`
const IO_NAME_LEN: usize = 128;

#[link(name = "IOKit", kind = "framework")]
extern "C" {
    fn IOServiceMatching(name: *const c_char) -> CFMutableDictionaryRef;
    fn IOServiceNameMatching(name: *const c_char) -> CFMutableDictionaryRef;
    fn IOServiceGetMatchingServices(
        main_port: mach_port_t,
        matching: CFMutableDictionaryRef,
        existing: *mut io_iterator_t,
    ) -> kern_return_t;
    fn IOIteratorNext(iterator: io_iterator_t) -> io_object_t;
    fn IOObjectRelease(object: io_object_t) -> kern_return_t;
    fn IORegistryEntryGetName(entry: io_registry_entry_t, name: *mut c_char) -> kern_return_t;
    fn IORegistryEntryCreateCFProperty(
        entry: io_registry_entry_t,
        key: CFStringRef,
        allocator: CFAllocatorRef,
        options: IOOptionBits,
    ) -> CFTypeRef;
}

#[link(name = "CoreFoundation", kind = "framework")]
extern "C" {
    static kCFAllocatorDefault: CFAllocatorRef;

    fn CFStringCreateWithCString(
        alloc: CFAllocatorRef,
        c_str: *const c_char,
        encoding: CFStringEncoding,
    ) -> CFStringRef;
    fn CFRelease(cf: CFTypeRef);
    fn CFGetTypeID(cf: CFTypeRef) -> CFTypeID;
    fn CFDataGetTypeID() -> CFTypeID;
    fn CFDataGetLength(data: CFDataRef) -> CFIndex;
    fn CFDataGetBytePtr(data: CFDataRef) -> *const u8;
}

/// An owned `io_object_t`
struct IoObject(io_object_t);

impl Drop for IoObject {
    fn drop(&mut self) {
        if self.0 != IO_OBJECT_NULL {
            unsafe {
                IOObjectRelease(self.0);
            }
        }
    }
}

/// An owned, non-null CoreFoundation reference
struct CfObject(CFTypeRef);

impl CfObject {
    fn new(cf: CFTypeRef) -> Option<Self> {
        if cf.is_null() {
            None
        } else {
            Some(Self(cf))
        }
    }
}

impl Drop for CfObject {
    fn drop(&mut self) {
        unsafe { CFRelease(self.0) }
    }
}

fn cf_string(s: &str) -> Option<CfObject> {
    let s = CString::new(s).ok()?;
    CfObject::new(unsafe {
        CFStringCreateWithCString(kCFAllocatorDefault, s.as_ptr(), kCFStringEncodingUTF8)
    })
}

/// What the service string passed to [`Registry::matching_services`] is compared against
#[derive(Copy, Clone, Debug, Default, Hash, PartialEq, Eq)]
pub enum ServiceMatching {
    /// The IOKit class of the service (`IOServiceMatching`). `IOPCIDevice` is a class name.
    #[default]
    Class,
    /// The registry name and `compatible` list of the service (`IOServiceNameMatching`),
    /// as older releases of the compat layer queried. PCI devices are named like `pci8086,1237`.
    Name,
}

impl ServiceMatching {
    fn dictionary(self, service: &CStr) -> CFMutableDictionaryRef {
        match self {
            Self::Class => unsafe { IOServiceMatching(service.as_ptr()) },
            Self::Name => unsafe { IOServiceNameMatching(service.as_ptr()) },
        }
    }
}

#[derive(Copy, Clone, Debug, Default, Hash, PartialEq, Eq)]
pub struct IoKitRegistry {
    matching: ServiceMatching,
}

impl IoKitRegistry {
    pub const fn new() -> Self {
        Self::with_matching(ServiceMatching::Class)
    }

    pub const fn with_matching(matching: ServiceMatching) -> Self {
        Self { matching }
    }

    pub const fn matching(&self) -> ServiceMatching {
        self.matching
    }
}

pub struct IoKitEntry {
    object: IoObject,
}

impl RegistryEntry for IoKitEntry {
    fn name(&self) -> Cow<'_, str> {
        let mut buf = [0 as c_char; IO_NAME_LEN];
        let res = unsafe { IORegistryEntryGetName(self.object.0, buf.as_mut_ptr()) };
        if res != KERN_SUCCESS {
            return Cow::Borrowed("<unnamed>");
        }
        // IOKit NUL-terminates within the buffer
        let name = unsafe { CStr::from_ptr(buf.as_ptr()) };
        Cow::Owned(name.to_string_lossy().into_owned())
    }

    fn property(&self, key: &str) -> Option<Cow<'_, [u8]>> {
        let key = cf_string(key)?;
        let value = CfObject::new(unsafe {
            IORegistryEntryCreateCFProperty(self.object.0, key.0, kCFAllocatorDefault, kNilOptions)
        })?;

        if unsafe { CFGetTypeID(value.0) != CFDataGetTypeID() } {
            return None;
        }

        let len = usize::try_from(unsafe { CFDataGetLength(value.0) }).ok()?;
        let ptr = unsafe { CFDataGetBytePtr(value.0) };
        if ptr.is_null() || len == 0 {
            return Some(Cow::Owned(Vec::new()));
        }

        // Copied out before `value` is released
        let bytes = unsafe { core::slice::from_raw_parts(ptr, len) }.to_vec();
        Some(Cow::Owned(bytes))
    }
}

pub struct IoKitIter {
    iterator: IoObject,
}

impl Iterator for IoKitIter {
    type Item = IoKitEntry;

    fn next(&mut self) -> Option<IoKitEntry> {
        match unsafe { IOIteratorNext(self.iterator.0) } {
            IO_OBJECT_NULL => None,
            obj => Some(IoKitEntry {
                object: IoObject(obj),
            }),
        }
    }
}

impl Registry for IoKitRegistry {
    type Entry = IoKitEntry;
    type Iter = IoKitIter;

    fn matching_services(&self, service: &str) -> Result<IoKitIter, EnumerationFailure> {
        let name = CString::new(service).map_err(|_| EnumerationFailure::new(FailureKind::OsError))?;

        let matching = self.matching.dictionary(&name);
        if matching.is_null() {
            warn!("no {:?} matching dictionary for {service}", self.matching);
            return Err(EnumerationFailure::new(FailureKind::OsError));
        }

        let mut iterator = IoObject(IO_OBJECT_NULL);
        // Consumes the reference to `matching`, on success and failure alike
        let res = unsafe { IOServiceGetMatchingServices(MAIN_PORT_DEFAULT, matching, &mut iterator.0) };

        if res != KERN_SUCCESS {
            warn!("IOServiceGetMatchingServices({service}) failed with {res:#x}");
            return Err(EnumerationFailure::new(FailureKind::OsError));
        }

        Ok(IoKitIter { iterator })
    }
}

#[cfg(test)]
mod test {
    use super::{IoKitRegistry, ServiceMatching};
    use crate::{Registry, PCI_DEVICE_SERVICE};

    #[test]
    fn test_default_matches_class() {
        assert_eq!(IoKitRegistry::new().matching(), ServiceMatching::Class);
        assert_eq!(IoKitRegistry::default(), IoKitRegistry::new());
    }

    #[test]
    fn test_class_matching_query() {
        assert!(IoKitRegistry::new().matching_services(PCI_DEVICE_SERVICE).is_ok());
    }

    #[test]
    fn test_name_matching_is_not_class_matching() {
        let reg = IoKitRegistry::with_matching(ServiceMatching::Name);
        assert_eq!(reg.matching_services(PCI_DEVICE_SERVICE).unwrap().count(), 0);
    }
}
