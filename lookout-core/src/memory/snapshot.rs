//! In-process stand-in for a remote memory image.
//!
//! [`SnapshotMemory`] holds a set of byte regions keyed by base address and
//! answers [`RemoteMemory`] reads from them. Writes go through `&self` so a
//! test or benchmark can mutate the "game" between ticks while entities hold
//! an `Arc` to it.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;

use super::{std_wstring, RemoteMemory, StdVector};
use crate::types::Address;

/// First address handed out by [`SnapshotMemory::alloc`].
const HEAP_BASE: u64 = 0x7ff6_0000_0000;
const ALIGN: u64 = 0x10;

/// A sparse, writable memory image.
#[derive(Debug)]
pub struct SnapshotMemory {
    regions: RwLock<BTreeMap<u64, Vec<u8>>>,
    next: AtomicU64,
}

impl Default for SnapshotMemory {
    fn default() -> Self {
        Self::new()
    }
}

impl SnapshotMemory {
    /// An empty image.
    #[must_use]
    pub fn new() -> Self {
        Self {
            regions: RwLock::new(BTreeMap::new()),
            next: AtomicU64::new(HEAP_BASE),
        }
    }

    /// Map a fresh zeroed region of `size` bytes and return its base.
    pub fn alloc(&self, size: usize) -> Address {
        let size = (size.max(1) as u64).div_ceil(ALIGN) * ALIGN;
        // Leave a guard gap so overruns read unmapped memory.
        let base = self.next.fetch_add(size + ALIGN, Ordering::Relaxed);
        self.regions.write().insert(base, vec![0; size as usize]);
        Address(base)
    }

    /// Unmap the region starting at `base`, simulating a free in the game.
    pub fn unmap(&self, base: Address) -> bool {
        self.regions.write().remove(&base.0).is_some()
    }

    /// Number of mapped regions.
    #[must_use]
    pub fn region_count(&self) -> usize {
        self.regions.read().len()
    }

    /// Copy `bytes` to `address`. Writes that do not land inside a single
    /// mapped region map a new region at `address`.
    pub fn write_bytes(&self, address: Address, bytes: &[u8]) {
        let mut regions = self.regions.write();
        if let Some((base, region)) = regions.range_mut(..=address.0).next_back() {
            let start = (address.0 - *base) as usize;
            if let Some(dst) = region.get_mut(start..start + bytes.len()) {
                dst.copy_from_slice(bytes);
                return;
            }
        }
        regions.insert(address.0, bytes.to_vec());
    }

    /// Write one byte.
    pub fn write_u8(&self, address: Address, value: u8) {
        self.write_bytes(address, &[value]);
    }

    /// Write a little-endian `i16`.
    pub fn write_i16(&self, address: Address, value: i16) {
        self.write_bytes(address, &value.to_le_bytes());
    }

    /// Write a little-endian `u16`.
    pub fn write_u16(&self, address: Address, value: u16) {
        self.write_bytes(address, &value.to_le_bytes());
    }

    /// Write a little-endian `u32`.
    pub fn write_u32(&self, address: Address, value: u32) {
        self.write_bytes(address, &value.to_le_bytes());
    }

    /// Write a little-endian `i32`.
    pub fn write_i32(&self, address: Address, value: i32) {
        self.write_bytes(address, &value.to_le_bytes());
    }

    /// Write a little-endian `u64`.
    pub fn write_u64(&self, address: Address, value: u64) {
        self.write_bytes(address, &value.to_le_bytes());
    }

    /// Write a little-endian `f32`.
    pub fn write_f32(&self, address: Address, value: f32) {
        self.write_bytes(address, &value.to_le_bytes());
    }

    /// Write a pointer.
    pub fn write_ptr(&self, address: Address, value: Address) {
        self.write_u64(address, value.0);
    }

    /// Write a `std::vector` header.
    pub fn write_vector_header(&self, address: Address, vector: StdVector) {
        self.write_ptr(address, vector.first);
        self.write_ptr(address.offset(8), vector.last);
        self.write_ptr(address.offset(16), vector.end);
    }

    /// Allocate backing storage for `bytes` and point the vector header at
    /// `address` to it.
    pub fn write_vector_bytes(&self, address: Address, bytes: &[u8]) -> StdVector {
        let vector = if bytes.is_empty() {
            StdVector::default()
        } else {
            let first = self.alloc(bytes.len());
            self.write_bytes(first, bytes);
            let last = first.offset(bytes.len() as u64);
            StdVector { first, last, end: last }
        };
        self.write_vector_header(address, vector);
        vector
    }

    /// Write a `std::vector<T*>`.
    pub fn write_ptr_vector(&self, address: Address, items: &[Address]) -> StdVector {
        let bytes: Vec<u8> = items.iter().flat_map(|a| a.0.to_le_bytes()).collect();
        self.write_vector_bytes(address, &bytes)
    }

    /// Write a `std::vector<(i32, i32)>`.
    pub fn write_pair_vector(&self, address: Address, pairs: &[(i32, i32)]) -> StdVector {
        let bytes: Vec<u8> = pairs
            .iter()
            .flat_map(|(k, v)| k.to_le_bytes().into_iter().chain(v.to_le_bytes()))
            .collect();
        self.write_vector_bytes(address, &bytes)
    }

    /// Allocate a null-terminated narrow string.
    pub fn alloc_cstring(&self, s: &str) -> Address {
        let mut bytes = s.as_bytes().to_vec();
        bytes.push(0);
        let at = self.alloc(bytes.len());
        self.write_bytes(at, &bytes);
        at
    }

    /// Allocate a null-terminated UTF-16 string.
    pub fn alloc_wide_cstring(&self, s: &str) -> Address {
        let bytes = utf16_bytes(s, true);
        let at = self.alloc(bytes.len());
        self.write_bytes(at, &bytes);
        at
    }

    /// Write an MSVC `std::wstring` object at `address`, allocating a heap
    /// buffer when the text does not fit inline.
    pub fn write_std_wstring(&self, address: Address, s: &str) {
        let units = s.encode_utf16().count() as u64;
        let capacity = if units < std_wstring::INLINE_CAPACITY {
            self.write_bytes(address, &[0u8; 16]);
            self.write_bytes(address, &utf16_bytes(s, true));
            std_wstring::INLINE_CAPACITY - 1
        } else {
            let heap = self.alloc_wide_cstring(s);
            self.write_ptr(address, heap);
            units
        };
        self.write_u64(address.offset(std_wstring::LENGTH), units);
        self.write_u64(address.offset(std_wstring::CAPACITY), capacity);
    }
}

impl RemoteMemory for SnapshotMemory {
    fn read_bytes(&self, address: Address, buf: &mut [u8]) -> bool {
        let regions = self.regions.read();
        let Some((base, region)) = regions.range(..=address.0).next_back() else {
            return false;
        };
        let start = (address.0 - *base) as usize;
        match region.get(start..start + buf.len()) {
            Some(src) => {
                buf.copy_from_slice(src);
                true
            }
            None => false,
        }
    }
}

fn utf16_bytes(s: &str, terminate: bool) -> Vec<u8> {
    let mut bytes: Vec<u8> = s.encode_utf16().flat_map(u16::to_le_bytes).collect();
    if terminate {
        bytes.extend_from_slice(&[0, 0]);
    }
    bytes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_stay_inside_regions() {
        let mem = SnapshotMemory::new();
        let a = mem.alloc(8);
        let mut buf = [0u8; 8];
        assert!(mem.read_bytes(a, &mut buf));
        let mut too_long = [0u8; 32];
        assert!(!mem.read_bytes(a, &mut too_long));
    }

    #[test]
    fn unmap_makes_reads_fail() {
        let mem = SnapshotMemory::new();
        let a = mem.alloc(8);
        mem.write_u64(a, 7);
        assert!(mem.unmap(a));
        let mut buf = [0u8; 8];
        assert!(!mem.read_bytes(a, &mut buf));
        assert!(!mem.unmap(a));
    }

    #[test]
    fn allocations_do_not_touch() {
        let mem = SnapshotMemory::new();
        let a = mem.alloc(16);
        let b = mem.alloc(16);
        assert!(b.0 >= a.0 + 32);
        assert_eq!(mem.region_count(), 2);
    }

    #[test]
    fn stray_write_maps_a_region() {
        let mem = SnapshotMemory::new();
        mem.write_u32(Address(0x5000), 9);
        let mut buf = [0u8; 4];
        assert!(mem.read_bytes(Address(0x5000), &mut buf));
        assert_eq!(u32::from_le_bytes(buf), 9);
    }
}
