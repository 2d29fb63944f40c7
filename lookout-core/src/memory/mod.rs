//! Remote memory access.
//!
//! [`RemoteMemory`] is the single primitive the rest of the crate needs from
//! the outside world: copy bytes out of the game process. Attaching to the
//! process and the platform read call live behind it.
//!
//! [`Reader`] layers typed, bounds-checked reads on top of that primitive.
//! The game is live and does not cooperate: every read can race a free or a
//! reallocation, so every read returns a [`DecodeResult`] and callers treat
//! failures as "absent", never as fatal.

pub mod image;
pub mod snapshot;

pub use image::{ComponentSpec, EntitySpec, WrittenEntity};
pub use snapshot::SnapshotMemory;

use crate::config::LimitsConfig;
use crate::error::{DecodeError, DecodeResult};
use crate::types::Address;

/// Byte-level access to another process's memory.
pub trait RemoteMemory: Send + Sync {
    /// Fill `buf` with the bytes at `address`.
    ///
    /// Returns `false` if any part of the range could not be read. Must never
    /// panic on bad addresses.
    fn read_bytes(&self, address: Address, buf: &mut [u8]) -> bool;
}

/// MSVC `std::vector<T>` header: three pointers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StdVector {
    /// First element.
    pub first: Address,
    /// One past the last element.
    pub last: Address,
    /// One past the allocated capacity.
    pub end: Address,
}

impl StdVector {
    /// Size of the header in the remote process.
    pub const SIZE: u64 = 0x18;

    /// Used length in bytes, if the header is self-consistent.
    #[must_use]
    pub fn len_bytes(&self) -> Option<u64> {
        if self.first.0 > self.last.0 || self.last.0 > self.end.0 {
            return None;
        }
        Some(self.last.0 - self.first.0)
    }
}

/// MSVC `std::wstring` layout: 16 byte small buffer / heap pointer, size, capacity.
pub mod std_wstring {
    /// Size of the string object.
    pub const SIZE: u64 = 0x20;
    /// Offset of the character count.
    pub const LENGTH: u64 = 0x10;
    /// Offset of the capacity.
    pub const CAPACITY: u64 = 0x18;
    /// Capacities below this store characters inline.
    pub const INLINE_CAPACITY: u64 = 8;
}

/// Typed, bounds-checked reads over a [`RemoteMemory`].
#[derive(Clone, Copy)]
pub struct Reader<'a> {
    memory: &'a dyn RemoteMemory,
    limits: LimitsConfig,
}

impl<'a> Reader<'a> {
    /// Wrap a memory handle with decoding limits.
    #[must_use]
    pub fn new(memory: &'a dyn RemoteMemory, limits: LimitsConfig) -> Self {
        Self { memory, limits }
    }

    /// The decoding limits in effect.
    #[must_use]
    pub fn limits(&self) -> &LimitsConfig {
        &self.limits
    }

    /// Read exactly `N` bytes.
    ///
    /// # Errors
    /// `ReadFailed` if the range is not readable.
    pub fn read_array<const N: usize>(&self, address: Address) -> DecodeResult<[u8; N]> {
        let mut buf = [0u8; N];
        if address.is_null() || !self.memory.read_bytes(address, &mut buf) {
            return Err(DecodeError::ReadFailed { address, len: N });
        }
        Ok(buf)
    }

    /// Read `len` bytes into a fresh buffer.
    ///
    /// # Errors
    /// `ReadFailed` if the range is not readable.
    pub fn read_vec(&self, address: Address, len: usize) -> DecodeResult<Vec<u8>> {
        let mut buf = vec![0u8; len];
        if len > 0 && (address.is_null() || !self.memory.read_bytes(address, &mut buf)) {
            return Err(DecodeError::ReadFailed { address, len });
        }
        Ok(buf)
    }

    /// # Errors
    /// `ReadFailed` if the byte is not readable.
    pub fn read_u8(&self, address: Address) -> DecodeResult<u8> {
        Ok(self.read_array::<1>(address)?[0])
    }

    /// # Errors
    /// `ReadFailed` if the range is not readable.
    pub fn read_u16(&self, address: Address) -> DecodeResult<u16> {
        Ok(u16::from_le_bytes(self.read_array(address)?))
    }

    /// # Errors
    /// `ReadFailed` if the range is not readable.
    pub fn read_i16(&self, address: Address) -> DecodeResult<i16> {
        Ok(i16::from_le_bytes(self.read_array(address)?))
    }

    /// # Errors
    /// `ReadFailed` if the range is not readable.
    pub fn read_u32(&self, address: Address) -> DecodeResult<u32> {
        Ok(u32::from_le_bytes(self.read_array(address)?))
    }

    /// # Errors
    /// `ReadFailed` if the range is not readable.
    pub fn read_i32(&self, address: Address) -> DecodeResult<i32> {
        Ok(i32::from_le_bytes(self.read_array(address)?))
    }

    /// # Errors
    /// `ReadFailed` if the range is not readable.
    pub fn read_u64(&self, address: Address) -> DecodeResult<u64> {
        Ok(u64::from_le_bytes(self.read_array(address)?))
    }

    /// # Errors
    /// `ReadFailed` if the range is not readable.
    pub fn read_f32(&self, address: Address) -> DecodeResult<f32> {
        Ok(f32::from_le_bytes(self.read_array(address)?))
    }

    /// Read a pointer. A null result is returned as-is.
    ///
    /// # Errors
    /// `ReadFailed` if the range is not readable.
    pub fn read_ptr(&self, address: Address) -> DecodeResult<Address> {
        self.read_u64(address).map(Address)
    }

    /// Read a pointer that must not be null.
    ///
    /// # Errors
    /// `NullPointer` if the pointer is null, otherwise as [`Self::read_ptr`].
    pub fn read_non_null(&self, address: Address, what: &'static str) -> DecodeResult<Address> {
        let ptr = self.read_ptr(address)?;
        if ptr.is_null() {
            return Err(DecodeError::NullPointer { what });
        }
        Ok(ptr)
    }

    /// Read a `std::vector` header.
    ///
    /// # Errors
    /// `ReadFailed` if the header is not readable.
    pub fn read_std_vector(&self, address: Address) -> DecodeResult<StdVector> {
        let raw: [u8; 0x18] = self.read_array(address)?;
        let word = |i: usize| {
            let mut b = [0u8; 8];
            b.copy_from_slice(&raw[i * 8..i * 8 + 8]);
            Address(u64::from_le_bytes(b))
        };
        Ok(StdVector {
            first: word(0),
            last: word(1),
            end: word(2),
        })
    }

    /// Read every element of a vector as raw `stride`-sized records.
    ///
    /// # Errors
    /// `Implausible` if the header is inconsistent, not a multiple of
    /// `stride`, or longer than `max_vector_len`; `ReadFailed` otherwise.
    pub fn read_records(&self, vector: StdVector, stride: usize) -> DecodeResult<Vec<Vec<u8>>> {
        let len = vector.len_bytes().ok_or(DecodeError::Implausible {
            what: "vector header",
            value: vector.first.0,
        })?;
        if stride == 0 || len % stride as u64 != 0 {
            return Err(DecodeError::Implausible { what: "vector length", value: len });
        }
        let count = len / stride as u64;
        if count > self.limits.max_vector_len as u64 {
            return Err(DecodeError::Implausible { what: "vector element count", value: count });
        }
        if count == 0 {
            return Ok(Vec::new());
        }
        // `count * stride <= max_vector_len * stride`, so this fits.
        let bytes = self.read_vec(vector.first, len as usize)?;
        Ok(bytes.chunks_exact(stride).map(<[u8]>::to_vec).collect())
    }

    /// Read a vector of pointers.
    ///
    /// # Errors
    /// As [`Self::read_records`].
    pub fn read_ptr_vec(&self, vector: StdVector) -> DecodeResult<Vec<Address>> {
        Ok(self
            .read_records(vector, 8)?
            .into_iter()
            .map(|r| Address(le_u64(&r, 0)))
            .collect())
    }

    /// Read a null-terminated narrow (ASCII/UTF-8) string.
    ///
    /// # Errors
    /// `ReadFailed` if the first byte is unreadable, `Implausible` if no
    /// terminator appears within `max_string_chars`.
    pub fn read_cstring(&self, address: Address) -> DecodeResult<String> {
        let mut out = Vec::new();
        for i in 0..self.limits.max_string_chars as u64 {
            let b = self.read_u8(address.offset(i))?;
            if b == 0 {
                return Ok(String::from_utf8_lossy(&out).into_owned());
            }
            out.push(b);
        }
        Err(DecodeError::Implausible {
            what: "unterminated string",
            value: address.0,
        })
    }

    /// Read a null-terminated UTF-16 string.
    ///
    /// # Errors
    /// As [`Self::read_cstring`].
    pub fn read_wide_cstring(&self, address: Address) -> DecodeResult<String> {
        let mut units = Vec::new();
        for i in 0..self.limits.max_string_chars as u64 {
            let u = self.read_u16(address.offset(i * 2))?;
            if u == 0 {
                return Ok(String::from_utf16_lossy(&units));
            }
            units.push(u);
        }
        Err(DecodeError::Implausible {
            what: "unterminated wide string",
            value: address.0,
        })
    }

    /// Read an MSVC `std::wstring` stored at `address`.
    ///
    /// # Errors
    /// `Implausible` for negative-looking or oversized lengths, `ReadFailed`
    /// otherwise.
    pub fn read_std_wstring(&self, address: Address) -> DecodeResult<String> {
        let length = self.read_u64(address.offset(std_wstring::LENGTH))?;
        let capacity = self.read_u64(address.offset(std_wstring::CAPACITY))?;
        if length > capacity || length > self.limits.max_string_chars as u64 {
            return Err(DecodeError::Implausible { what: "wstring length", value: length });
        }
        if length == 0 {
            return Ok(String::new());
        }
        let data = if capacity < std_wstring::INLINE_CAPACITY {
            address
        } else {
            self.read_non_null(address, "wstring buffer")?
        };
        let bytes = self.read_vec(data, length as usize * 2)?;
        let units: Vec<u16> = bytes
            .chunks_exact(2)
            .map(|c| u16::from_le_bytes([c[0], c[1]]))
            .collect();
        Ok(String::from_utf16_lossy(&units))
    }
}

/// Little-endian `u64` at `offset` inside a record. Out-of-range reads give 0.
#[must_use]
pub fn le_u64(record: &[u8], offset: usize) -> u64 {
    record
        .get(offset..offset + 8)
        .and_then(|s| s.try_into().ok())
        .map_or(0, u64::from_le_bytes)
}

/// Little-endian `i32` at `offset` inside a record. Out-of-range reads give 0.
#[must_use]
pub fn le_i32(record: &[u8], offset: usize) -> i32 {
    record
        .get(offset..offset + 4)
        .and_then(|s| s.try_into().ok())
        .map_or(0, i32::from_le_bytes)
}
