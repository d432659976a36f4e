/*!
 * User Address Space
 *
 * Simulated caller-controlled memory. Syscalls never trust user pointers:
 * every access goes through `copyin` / `copyout` / `copyinstr`, which fail
 * with `CopyFault` instead of touching unmapped or read-only memory.
 */

use crate::core::errors::KernelError;
use crate::core::limits::USER_PTR_SIZE;
use crate::core::types::KernelResult;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Address in a user address space
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserPtr(pub usize);

impl UserPtr {
    pub const NULL: UserPtr = UserPtr(0);

    #[inline]
    pub const fn is_null(self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn addr(self) -> usize {
        self.0
    }

    #[inline]
    pub fn offset(self, bytes: usize) -> KernelResult<UserPtr> {
        self.0
            .checked_add(bytes)
            .map(UserPtr)
            .ok_or_else(|| KernelError::copy_fault(self.0, "address overflow"))
    }
}

impl fmt::Display for UserPtr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

#[derive(Debug)]
struct Region {
    bytes: Vec<u8>,
    writable: bool,
}

impl Region {
    fn end(&self, base: usize) -> usize {
        base + self.bytes.len()
    }
}

/// Mapped regions of one process, keyed by base address
#[derive(Debug, Default)]
pub struct UserMemory {
    regions: RwLock<BTreeMap<usize, Region>>,
}

impl UserMemory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Map `len` zeroed bytes at `base`
    pub fn map(&self, base: UserPtr, len: usize, writable: bool) -> KernelResult<UserPtr> {
        self.map_bytes(base, vec![0; len], writable)
    }

    /// Map a region initialised with `bytes`
    pub fn map_bytes(&self, base: UserPtr, bytes: Vec<u8>, writable: bool) -> KernelResult<UserPtr> {
        if base.is_null() {
            return Err(KernelError::invalid_argument("cannot map the null page"));
        }
        if bytes.is_empty() {
            return Err(KernelError::invalid_argument("cannot map an empty region"));
        }
        let end = base
            .addr()
            .checked_add(bytes.len())
            .ok_or_else(|| KernelError::invalid_argument("region wraps the address space"))?;

        let mut regions = self.regions.write();
        let overlaps = regions
            .range(..end)
            .next_back()
            .is_some_and(|(b, r)| r.end(*b) > base.addr());
        if overlaps {
            return Err(KernelError::invalid_argument(format!(
                "region at {base} overlaps an existing mapping"
            )));
        }
        regions.insert(base.addr(), Region { bytes, writable });
        Ok(base)
    }

    /// Map a NUL-terminated copy of `s` at `base`
    pub fn map_cstr(&self, base: UserPtr, s: &str, writable: bool) -> KernelResult<UserPtr> {
        let mut bytes = Vec::with_capacity(s.len() + 1);
        bytes.extend_from_slice(s.as_bytes());
        bytes.push(0);
        self.map_bytes(base, bytes, writable)
    }

    /// Map a NULL-terminated array of user pointers at `base`
    pub fn map_ptr_array(&self, base: UserPtr, ptrs: &[UserPtr]) -> KernelResult<UserPtr> {
        let mut bytes = Vec::with_capacity((ptrs.len() + 1) * USER_PTR_SIZE);
        for ptr in ptrs.iter().chain(std::iter::once(&UserPtr::NULL)) {
            let word = u32::try_from(ptr.addr())
                .map_err(|_| KernelError::invalid_argument(format!("{ptr} is not a user address")))?;
            bytes.extend_from_slice(&word.to_le_bytes());
        }
        self.map_bytes(base, bytes, false)
    }

    pub fn unmap(&self, base: UserPtr) -> bool {
        self.regions.write().remove(&base.addr()).is_some()
    }

    /// Deep copy of every mapping, for a forked child
    pub fn duplicate(&self) -> KernelResult<UserMemory> {
        let regions = self.regions.read();
        let mut copy = BTreeMap::new();
        for (base, region) in regions.iter() {
            let mut bytes = Vec::new();
            bytes.try_reserve_exact(region.bytes.len())?;
            bytes.extend_from_slice(&region.bytes);
            copy.insert(
                *base,
                Region {
                    bytes,
                    writable: region.writable,
                },
            );
        }
        Ok(UserMemory {
            regions: RwLock::new(copy),
        })
    }

    pub fn mapped_bytes(&self) -> usize {
        self.regions.read().values().map(|r| r.bytes.len()).sum()
    }

    /// Copy `len` bytes out of user memory
    pub fn copyin(&self, src: UserPtr, len: usize) -> KernelResult<Vec<u8>> {
        let regions = self.regions.read();
        Ok(Self::resolve(&regions, src, len)?.to_vec())
    }

    /// Copy `data` into user memory
    pub fn copyout(&self, dst: UserPtr, data: &[u8]) -> KernelResult<()> {
        let mut regions = self.regions.write();
        let (base, region) = Self::region_for(&mut regions, dst, data.len())?;
        if !region.writable {
            return Err(KernelError::copy_fault(dst.addr(), "region is read-only"));
        }
        let start = dst.addr() - base;
        region.bytes[start..start + data.len()].copy_from_slice(data);
        Ok(())
    }

    /// Read one user pointer
    pub fn read_ptr(&self, src: UserPtr) -> KernelResult<UserPtr> {
        let bytes = self.copyin(src, USER_PTR_SIZE)?;
        let mut word = [0u8; USER_PTR_SIZE];
        word.copy_from_slice(&bytes);
        Ok(UserPtr(u32::from_le_bytes(word) as usize))
    }

    /// Length of the NUL-terminated string at `src`, terminator excluded
    ///
    /// Fails with `InvalidArgument` if no terminator appears within the first
    /// `max` bytes, and with `CopyFault` if the string runs off its mapping.
    pub fn strlen(&self, src: UserPtr, max: usize) -> KernelResult<usize> {
        let regions = self.regions.read();
        let tail = Self::tail(&regions, src)?;
        let window = &tail[..tail.len().min(max)];
        match window.iter().position(|b| *b == 0) {
            Some(len) => Ok(len),
            None if tail.len() >= max => Err(KernelError::invalid_argument(format!(
                "string at {src} longer than {max} bytes"
            ))),
            None => Err(KernelError::copy_fault(
                src.addr() + tail.len(),
                "unterminated string",
            )),
        }
    }

    /// Append the string at `src` and its terminator to `buf`
    ///
    /// Returns the number of bytes appended. The string must be terminated
    /// within `max` bytes (terminator included).
    pub fn copyinstr_into(&self, src: UserPtr, max: usize, buf: &mut Vec<u8>) -> KernelResult<usize> {
        let regions = self.regions.read();
        let tail = Self::tail(&regions, src)?;
        let window = &tail[..tail.len().min(max)];
        let len = window.iter().position(|b| *b == 0).ok_or_else(|| {
            if tail.len() >= max {
                KernelError::invalid_argument(format!("string at {src} longer than {max} bytes"))
            } else {
                KernelError::copy_fault(src.addr() + tail.len(), "unterminated string")
            }
        })?;
        buf.try_reserve(len + 1)?;
        buf.extend_from_slice(&window[..=len]);
        Ok(len + 1)
    }

    /// Copy the string at `src` into an owned `String`
    pub fn copyinstr(&self, src: UserPtr, max: usize) -> KernelResult<String> {
        let mut buf = Vec::new();
        self.copyinstr_into(src, max, &mut buf)?;
        buf.pop();
        String::from_utf8(buf)
            .map_err(|_| KernelError::invalid_argument(format!("string at {src} is not UTF-8")))
    }

    fn resolve<'r>(
        regions: &'r BTreeMap<usize, Region>,
        src: UserPtr,
        len: usize,
    ) -> KernelResult<&'r [u8]> {
        let tail = Self::tail(regions, src)?;
        if tail.len() < len {
            return Err(KernelError::copy_fault(src.addr(), "range crosses end of mapping"));
        }
        Ok(&tail[..len])
    }

    /// Bytes from `src` to the end of its mapping
    fn tail<'r>(regions: &'r BTreeMap<usize, Region>, src: UserPtr) -> KernelResult<&'r [u8]> {
        if src.is_null() {
            return Err(KernelError::copy_fault(0, "null pointer"));
        }
        let (base, region) = regions
            .range(..=src.addr())
            .next_back()
            .filter(|(b, r)| src.addr() < r.end(**b))
            .ok_or_else(|| KernelError::copy_fault(src.addr(), "address not mapped"))?;
        Ok(&region.bytes[src.addr() - base..])
    }

    fn region_for<'r>(
        regions: &'r mut BTreeMap<usize, Region>,
        dst: UserPtr,
        len: usize,
    ) -> KernelResult<(usize, &'r mut Region)> {
        if dst.is_null() {
            return Err(KernelError::copy_fault(0, "null pointer"));
        }
        let (base, region) = regions
            .range_mut(..=dst.addr())
            .next_back()
            .ok_or_else(|| KernelError::copy_fault(dst.addr(), "address not mapped"))?;
        let base = *base;
        let end = region.end(base);
        if dst.addr() >= end {
            return Err(KernelError::copy_fault(dst.addr(), "address not mapped"));
        }
        if end - dst.addr() < len {
            return Err(KernelError::copy_fault(dst.addr(), "range crosses end of mapping"));
        }
        Ok((base, region))
    }
}
