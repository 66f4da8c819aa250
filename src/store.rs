//! The contract of the backing store driver.
//!
//! A store is a linear, byte-addressable, non-volatile memory that is only
//! reachable through explicit transactions. Every call on [Store] is one
//! transaction on the bus, so callers batch bytes into runs where they can.
//!
//! Multi-byte words are little-endian in the drivers shipped with this crate.

#[cfg(unix)]
pub mod file;
pub mod mem;

use std::ops::Range;
use std::sync::Arc;

use snafu::OptionExt;

use crate::error;
use crate::error::Result;

#[cfg(unix)]
pub use self::file::FileStore;
pub use self::mem::MemStore;

pub trait Store {
    /// The number of addressable bytes.
    fn size(&self) -> u32;

    fn read_u8(&self, addr: u32) -> Result<u8>;

    fn write_u8(&self, addr: u32, value: u8) -> Result<()>;

    fn read_u32(&self, addr: u32) -> Result<u32> {
        let mut word = [0u8; 4];
        self.read_run(addr, &mut word)?;
        Ok(u32::from_le_bytes(word))
    }

    fn write_u32(&self, addr: u32, value: u32) -> Result<()> {
        self.write_run(addr, &value.to_le_bytes())
    }

    /// Read `buf.len()` consecutive bytes starting at `addr`.
    fn read_run(&self, addr: u32, buf: &mut [u8]) -> Result<()> {
        for (i, byte) in buf.iter_mut().enumerate() {
            *byte = self.read_u8(run_addr(addr, i, self.size())?)?;
        }
        Ok(())
    }

    /// Write `buf` to consecutive bytes starting at `addr`.
    fn write_run(&self, addr: u32, buf: &[u8]) -> Result<()> {
        for (i, byte) in buf.iter().enumerate() {
            self.write_u8(run_addr(addr, i, self.size())?, *byte)?;
        }
        Ok(())
    }
}

impl<S: Store + ?Sized> Store for &S {
    fn size(&self) -> u32 {
        (**self).size()
    }

    fn read_u8(&self, addr: u32) -> Result<u8> {
        (**self).read_u8(addr)
    }

    fn write_u8(&self, addr: u32, value: u8) -> Result<()> {
        (**self).write_u8(addr, value)
    }

    fn read_u32(&self, addr: u32) -> Result<u32> {
        (**self).read_u32(addr)
    }

    fn write_u32(&self, addr: u32, value: u32) -> Result<()> {
        (**self).write_u32(addr, value)
    }

    fn read_run(&self, addr: u32, buf: &mut [u8]) -> Result<()> {
        (**self).read_run(addr, buf)
    }

    fn write_run(&self, addr: u32, buf: &[u8]) -> Result<()> {
        (**self).write_run(addr, buf)
    }
}

impl<S: Store + ?Sized> Store for Arc<S> {
    fn size(&self) -> u32 {
        (**self).size()
    }

    fn read_u8(&self, addr: u32) -> Result<u8> {
        (**self).read_u8(addr)
    }

    fn write_u8(&self, addr: u32, value: u8) -> Result<()> {
        (**self).write_u8(addr, value)
    }

    fn read_u32(&self, addr: u32) -> Result<u32> {
        (**self).read_u32(addr)
    }

    fn write_u32(&self, addr: u32, value: u32) -> Result<()> {
        (**self).write_u32(addr, value)
    }

    fn read_run(&self, addr: u32, buf: &mut [u8]) -> Result<()> {
        (**self).read_run(addr, buf)
    }

    fn write_run(&self, addr: u32, buf: &[u8]) -> Result<()> {
        (**self).write_run(addr, buf)
    }
}

impl<S: Store + ?Sized> Store for Box<S> {
    fn size(&self) -> u32 {
        (**self).size()
    }

    fn read_u8(&self, addr: u32) -> Result<u8> {
        (**self).read_u8(addr)
    }

    fn write_u8(&self, addr: u32, value: u8) -> Result<()> {
        (**self).write_u8(addr, value)
    }

    fn read_u32(&self, addr: u32) -> Result<u32> {
        (**self).read_u32(addr)
    }

    fn write_u32(&self, addr: u32, value: u32) -> Result<()> {
        (**self).write_u32(addr, value)
    }

    fn read_run(&self, addr: u32, buf: &mut [u8]) -> Result<()> {
        (**self).read_run(addr, buf)
    }

    fn write_run(&self, addr: u32, buf: &[u8]) -> Result<()> {
        (**self).write_run(addr, buf)
    }
}

/// Check that `len` bytes starting at `addr` fit in a store of `store_len`
/// bytes, and return them as an index range.
pub(crate) fn checked_range(
    addr: u32,
    len: usize,
    store_len: u32,
) -> Result<Range<usize>> {
    let start = addr as usize;
    let end = start.checked_add(len).filter(|end| *end <= store_len as usize);

    let end = end.context(error::OutOfRangeSnafu {
        addr,
        len: u32::try_from(len).unwrap_or(u32::MAX),
        store_len,
    })?;

    Ok(start..end)
}

fn run_addr(addr: u32, offset: usize, store_len: u32) -> Result<u32> {
    let range = checked_range(addr, offset + 1, store_len)?;
    // The range end fits in a u32 because the store size does.
    Ok((range.end - 1) as u32)
}
