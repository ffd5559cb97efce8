use pci_compat_errors::EmptyStackError;
use pci_compat_types::PciDeviceRecord;

use crate::handle::RawStackHandle;

/// A LIFO collection of [`PciDeviceRecord`]s, accumulated while walking a device registry.
///
/// The stack is exclusively owned. The only way to hand it to an enumeration routine is
/// [`DeviceStack::with_raw_handle`], which lends a [`RawStackHandle`] for the duration of one call.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DeviceStack {
    records: Vec<PciDeviceRecord>,
}

impl DeviceStack {
    pub const fn new() -> Self {
        Self {
            records: Vec::new(),
        }
    }

    pub fn with_capacity(cap: usize) -> Self {
        Self {
            records: Vec::with_capacity(cap),
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.records.capacity()
    }

    /// Pushes `record` as the new top of the stack. The record is stored as given, including the all-zero record.
    pub fn push(&mut self, record: PciDeviceRecord) {
        self.records.push(record);
    }

    /// Removes and returns the top of the stack.
    ///
    /// ## Errors
    /// Returns [`EmptyStackError`] if the stack has no records. The stack is not modified in that case.
    pub fn pop(&mut self) -> Result<PciDeviceRecord, EmptyStackError> {
        self.records.pop().ok_or(EmptyStackError)
    }

    pub fn peek(&self) -> Option<&PciDeviceRecord> {
        self.records.last()
    }

    /// Iterates from the top of the stack down, without removing anything
    pub fn iter_lifo(&self) -> impl DoubleEndedIterator<Item = &PciDeviceRecord> + ExactSizeIterator {
        self.records.iter().rev()
    }

    /// Pops every record, top first. Records left in the iterator when it is dropped stay on the stack.
    pub fn drain_lifo(&mut self) -> DrainLifo<'_> {
        DrainLifo { stack: self }
    }

    /// Consumes the stack, returning the records in the order they were pushed
    pub fn into_discovery_order(self) -> Vec<PciDeviceRecord> {
        self.records
    }

    /// Lends a raw handle to `f`. The handle cannot escape the call, and `self` keeps ownership throughout.
    pub fn with_raw_handle<R, F: FnOnce(RawStackHandle<'_>) -> R>(&mut self, f: F) -> R {
        f(RawStackHandle::new(self))
    }
}

impl Extend<PciDeviceRecord> for DeviceStack {
    fn extend<I: IntoIterator<Item = PciDeviceRecord>>(&mut self, iter: I) {
        for record in iter {
            self.push(record);
        }
    }
}

impl FromIterator<PciDeviceRecord> for DeviceStack {
    fn from_iter<I: IntoIterator<Item = PciDeviceRecord>>(iter: I) -> Self {
        let mut stack = Self::new();
        stack.extend(iter);
        stack
    }
}

pub struct DrainLifo<'a> {
    stack: &'a mut DeviceStack,
}

impl Iterator for DrainLifo<'_> {
    type Item = PciDeviceRecord;

    fn next(&mut self) -> Option<PciDeviceRecord> {
        self.stack.pop().ok()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let len = self.stack.len();
        (len, Some(len))
    }
}

impl ExactSizeIterator for DrainLifo<'_> {}
