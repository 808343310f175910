use log::trace;
use thiserror::Error;

use crate::geometry::Geometry;
use crate::memory::{BackingStore, PhysicalMemory, Word};
use crate::translation::{translate, VirtualAddress};

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum VmError {
    #[error("virtual address {address:#x} is outside the {width}-bit address space")]
    AddressOutOfRange { address: u64, width: u32 },
}

/// The translator and the stores it operates on.
///
/// Construction clears the root table (frame 0); after that every valid
/// address is readable and writable, with table frames, leaf pages, and
/// evictions managed behind the scenes. Single-threaded by design: both
/// operations take `&mut self` since even a read may fault pages in.
pub struct VmManager {
    geometry: Geometry,
    pm: PhysicalMemory,
    store: BackingStore,
}

impl VmManager {
    pub fn new(geometry: Geometry) -> Self {
        let mut pm = PhysicalMemory::new(&geometry);
        pm.clear_table(0);
        VmManager {
            geometry,
            pm,
            store: BackingStore::new(),
        }
    }

    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    /// Read the word at a virtual address.
    pub fn read(&mut self, address: u64) -> Result<Word, VmError> {
        let va = self.split(address)?;
        let frame = translate(&mut self.pm, &mut self.store, &self.geometry, va.page);
        let value = self.pm.read(self.pm.frame_base(frame) + va.offset);
        trace!("read {va} -> {value}");
        Ok(value)
    }

    /// Write a word at a virtual address.
    pub fn write(&mut self, address: u64, value: Word) -> Result<(), VmError> {
        let va = self.split(address)?;
        let frame = translate(&mut self.pm, &mut self.store, &self.geometry, va.page);
        self.pm.write(self.pm.frame_base(frame) + va.offset, value);
        trace!("write {va} <- {value}");
        Ok(())
    }

    fn split(&self, address: u64) -> Result<VirtualAddress, VmError> {
        if address > self.geometry.max_virtual_address() {
            return Err(VmError::AddressOutOfRange {
                address,
                width: self.geometry.virtual_address_width(),
            });
        }
        Ok(VirtualAddress::split(address, &self.geometry))
    }

    /// The raw physical memory, for inspection.
    pub fn physical_memory(&self) -> &PhysicalMemory {
        &self.pm
    }

    /// The backing store, for inspection.
    pub fn backing_store(&self) -> &BackingStore {
        &self.store
    }
}

impl Default for VmManager {
    fn default() -> Self {
        Self::new(Geometry::default())
    }
}
