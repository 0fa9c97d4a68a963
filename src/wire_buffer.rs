//! Wire buffer module
//!
//! This module contains the `WireBuffer` type, the single owner of the bytes
//! behind a tree of wire objects. Every object view (root or child) reads
//! and writes through it; only the buffer itself reallocates.

use crate::error::{Error, Result};
use alloc::{boxed::Box, vec::Vec};
use byteorder::{ByteOrder, NetworkEndian};
use core::fmt;
use core::ops::Range;

/// Callback that receives bound bytes back when their buffer is dropped.
pub type ReleaseFn = Box<dyn FnOnce(Vec<u8>)>;

enum Storage<'a> {
    /// Freshly allocated by this crate.
    Owned(Vec<u8>),
    /// Handed over by the caller, optionally returned through `release`.
    Bound {
        bytes: Vec<u8>,
        release: Option<ReleaseFn>,
    },
    /// Caller memory borrowed for the zero-allocation parse path.
    Borrowed(&'a mut [u8]),
}

/// A growable byte region with big-endian primitive accessors.
///
/// Tracks two sizes: `alloc_bytes`, the capacity writes may use without
/// reallocating, and `current_bytes`, the extent holding meaningful data.
/// `current_bytes <= alloc_bytes` always holds and neither ever shrinks.
///
/// All primitive accessors are bounds-checked against `current_bytes`.
pub struct WireBuffer<'a> {
    storage: Storage<'a>,
    alloc_bytes: usize,
    current_bytes: usize,
}

impl WireBuffer<'static> {
    /// Allocate a zero-initialized buffer of `capacity` bytes.
    ///
    /// The buffer starts with `current_bytes == 0`.
    ///
    /// # Errors
    ///
    /// `ResourceExhausted` if the allocation fails.
    pub fn allocate(capacity: usize) -> Result<Self> {
        let mut bytes = Vec::new();
        bytes
            .try_reserve_exact(capacity)
            .map_err(|_| Error::ResourceExhausted {
                needed: capacity,
                available: 0,
            })?;
        bytes.resize(capacity, 0);
        Ok(WireBuffer {
            storage: Storage::Owned(bytes),
            alloc_bytes: capacity,
            current_bytes: 0,
        })
    }

    /// Wrap caller-provided bytes without copying.
    ///
    /// The first `length` bytes become the buffer's content. If `release`
    /// is given, it receives the whole vector back when the buffer is
    /// dropped; stealing the buffer skips it.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` if `bytes` is empty, `length` is 0, or `length`
    /// exceeds `bytes.len()`.
    pub fn bind(bytes: Vec<u8>, length: usize, release: Option<ReleaseFn>) -> Result<Self> {
        if bytes.is_empty() {
            return Err(Error::InvalidArgument("cannot bind an empty buffer"));
        }
        if length == 0 || length > bytes.len() {
            return Err(Error::InvalidArgument("bind length must lie within the buffer"));
        }
        Ok(WireBuffer {
            storage: Storage::Bound { bytes, release },
            alloc_bytes: length,
            current_bytes: length,
        })
    }
}

impl<'a> WireBuffer<'a> {
    /// Borrow caller memory; nothing is allocated.
    ///
    /// A borrowed buffer can never grow past `length`.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` if `bytes` is empty, `length` is 0, or `length`
    /// exceeds `bytes.len()`.
    pub fn borrowed(bytes: &'a mut [u8], length: usize) -> Result<Self> {
        if bytes.is_empty() {
            return Err(Error::InvalidArgument("cannot bind an empty buffer"));
        }
        if length == 0 || length > bytes.len() {
            return Err(Error::InvalidArgument("bind length must lie within the buffer"));
        }
        Ok(WireBuffer {
            storage: Storage::Borrowed(bytes),
            alloc_bytes: length,
            current_bytes: length,
        })
    }

    /// Bytes usable without reallocating.
    #[inline]
    pub fn alloc_bytes(&self) -> usize {
        self.alloc_bytes
    }

    /// Bytes currently holding data.
    #[inline]
    pub fn current_bytes(&self) -> usize {
        self.current_bytes
    }

    /// True for caller memory borrowed through [`WireBuffer::borrowed`].
    pub fn is_borrowed(&self) -> bool {
        matches!(self.storage, Storage::Borrowed(_))
    }

    /// The meaningful content, `[0, current_bytes)`.
    pub fn as_slice(&self) -> &[u8] {
        &self.raw()[..self.current_bytes]
    }

    fn raw(&self) -> &[u8] {
        match &self.storage {
            Storage::Owned(bytes) | Storage::Bound { bytes, .. } => bytes.as_slice(),
            Storage::Borrowed(bytes) => &bytes[..],
        }
    }

    fn raw_mut(&mut self) -> &mut [u8] {
        match &mut self.storage {
            Storage::Owned(bytes) | Storage::Bound { bytes, .. } => bytes.as_mut_slice(),
            Storage::Borrowed(bytes) => &mut bytes[..],
        }
    }

    /// Extend the content to at least `target` bytes.
    ///
    /// Reallocates when `target` exceeds the capacity, preserving every
    /// byte already written. Newly exposed bytes read as zero. Bytes in
    /// `[0, current_bytes)` are never modified.
    ///
    /// # Errors
    ///
    /// `ResourceExhausted` if the allocation fails or the buffer is
    /// borrowed and `target` exceeds its length.
    pub fn grow(&mut self, target: usize) -> Result<()> {
        if target > self.alloc_bytes {
            match &mut self.storage {
                Storage::Owned(bytes) | Storage::Bound { bytes, .. } => {
                    let additional = target.saturating_sub(bytes.len());
                    bytes
                        .try_reserve_exact(additional)
                        .map_err(|_| Error::ResourceExhausted {
                            needed: target,
                            available: self.alloc_bytes,
                        })?;
                    if bytes.len() < target {
                        bytes.resize(target, 0);
                    }
                }
                Storage::Borrowed(_) => {
                    return Err(Error::ResourceExhausted {
                        needed: target,
                        available: self.alloc_bytes,
                    });
                }
            }
            log::debug!(
                "wire buffer reallocated from {} to {} bytes",
                self.alloc_bytes,
                target
            );
            self.alloc_bytes = target;
        }

        if target > self.current_bytes {
            let current = self.current_bytes;
            self.raw_mut()[current..target].fill(0);
            self.current_bytes = target;
        }
        Ok(())
    }

    /// Hand the content over to the caller.
    ///
    /// Returns the first `current_bytes` bytes. A release callback is not
    /// run: the bytes now belong to the caller.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` for a borrowed buffer, which has no bytes to give.
    pub fn steal(mut self) -> Result<Vec<u8>> {
        let current = self.current_bytes;
        match core::mem::replace(&mut self.storage, Storage::Owned(Vec::new())) {
            Storage::Owned(mut bytes) | Storage::Bound { mut bytes, .. } => {
                bytes.truncate(current);
                Ok(bytes)
            }
            Storage::Borrowed(_) => Err(Error::InvalidArgument(
                "a borrowed wire buffer cannot be stolen",
            )),
        }
    }

    fn span(&self, offset: usize, len: usize) -> Result<Range<usize>> {
        match offset.checked_add(len) {
            Some(end) if end <= self.current_bytes => Ok(offset..end),
            _ => Err(Error::InvalidArgument(
                "access beyond the current end of the wire buffer",
            )),
        }
    }

    /// Read `len` bytes at `offset`.
    pub fn bytes(&self, offset: usize, len: usize) -> Result<&[u8]> {
        let range = self.span(offset, len)?;
        Ok(&self.raw()[range])
    }

    /// Mutable view of `len` bytes at `offset`.
    pub fn bytes_mut(&mut self, offset: usize, len: usize) -> Result<&mut [u8]> {
        let range = self.span(offset, len)?;
        Ok(&mut self.raw_mut()[range])
    }

    /// Copy `data` into the buffer at `offset`.
    pub fn write_bytes(&mut self, offset: usize, data: &[u8]) -> Result<()> {
        self.bytes_mut(offset, data.len())?.copy_from_slice(data);
        Ok(())
    }

    /// Read one byte.
    pub fn read_u8(&self, offset: usize) -> Result<u8> {
        let range = self.span(offset, 1)?;
        Ok(self.raw()[range.start])
    }

    /// Write one byte.
    pub fn write_u8(&mut self, offset: usize, value: u8) -> Result<()> {
        let range = self.span(offset, 1)?;
        self.raw_mut()[range.start] = value;
        Ok(())
    }

    /// Read a big-endian u16.
    pub fn read_u16(&self, offset: usize) -> Result<u16> {
        let range = self.span(offset, 2)?;
        Ok(NetworkEndian::read_u16(&self.raw()[range]))
    }

    /// Write a big-endian u16.
    pub fn write_u16(&mut self, offset: usize, value: u16) -> Result<()> {
        let range = self.span(offset, 2)?;
        NetworkEndian::write_u16(&mut self.raw_mut()[range], value);
        Ok(())
    }

    /// Read a big-endian u32.
    pub fn read_u32(&self, offset: usize) -> Result<u32> {
        let range = self.span(offset, 4)?;
        Ok(NetworkEndian::read_u32(&self.raw()[range]))
    }

    /// Write a big-endian u32.
    pub fn write_u32(&mut self, offset: usize, value: u32) -> Result<()> {
        let range = self.span(offset, 4)?;
        NetworkEndian::write_u32(&mut self.raw_mut()[range], value);
        Ok(())
    }

    /// Read a big-endian u64.
    pub fn read_u64(&self, offset: usize) -> Result<u64> {
        let range = self.span(offset, 8)?;
        Ok(NetworkEndian::read_u64(&self.raw()[range]))
    }

    /// Write a big-endian u64.
    pub fn write_u64(&mut self, offset: usize, value: u64) -> Result<()> {
        let range = self.span(offset, 8)?;
        NetworkEndian::write_u64(&mut self.raw_mut()[range], value);
        Ok(())
    }
}

impl Drop for WireBuffer<'_> {
    fn drop(&mut self) {
        if let Storage::Bound { bytes, release } = &mut self.storage {
            if let Some(release) = release.take() {
                release(core::mem::take(bytes));
            }
        }
    }
}

impl fmt::Debug for WireBuffer<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let kind = match &self.storage {
            Storage::Owned(_) => "owned",
            Storage::Bound { .. } => "bound",
            Storage::Borrowed(_) => "borrowed",
        };
        f.debug_struct("WireBuffer")
            .field("kind", &kind)
            .field("alloc_bytes", &self.alloc_bytes)
            .field("current_bytes", &self.current_bytes)
            .finish()
    }
}
