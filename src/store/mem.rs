use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::sync::PoisonError;

use crate::error::Result;
use crate::store::checked_range;
use crate::store::Store;

/// A RAM-backed emulation of an FRAM chip.
///
/// The bytes start zeroed. Every call through [Store] is counted as one
/// transaction, which lets callers check how chatty an operation is.
#[derive(Debug)]
pub struct MemStore {
    bytes: Mutex<Vec<u8>>,
    size: u32,
    reads: AtomicU64,
    writes: AtomicU64,
}

/// Transaction counters of a [MemStore].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MemStoreStats {
    pub reads: u64,
    pub writes: u64,
}

impl MemStore {
    pub fn new(size: u32) -> Self {
        Self::with_fill(size, 0)
    }

    /// Create a store whose every byte is `fill`.
    pub fn with_fill(size: u32, fill: u8) -> Self {
        Self {
            bytes: Mutex::new(vec![fill; size as usize]),
            size,
            reads: AtomicU64::new(0),
            writes: AtomicU64::new(0),
        }
    }

    /// A copy of the whole content. Does not count as a transaction.
    pub fn to_vec(&self) -> Vec<u8> {
        self.lock().clone()
    }

    pub fn stats(&self) -> MemStoreStats {
        MemStoreStats {
            reads: self.reads.load(Ordering::Relaxed),
            writes: self.writes.load(Ordering::Relaxed),
        }
    }

    pub fn reset_stats(&self) {
        self.reads.store(0, Ordering::Relaxed);
        self.writes.store(0, Ordering::Relaxed);
    }

    fn lock(&self) -> MutexGuard<'_, Vec<u8>> {
        // The bytes stay consistent even if a holder panicked.
        self.bytes.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn count_read(&self) {
        self.reads.fetch_add(1, Ordering::Relaxed);
    }

    fn count_write(&self) {
        self.writes.fetch_add(1, Ordering::Relaxed);
    }
}

impl Store for MemStore {
    fn size(&self) -> u32 {
        self.size
    }

    fn read_u8(&self, addr: u32) -> Result<u8> {
        let range = checked_range(addr, 1, self.size)?;
        self.count_read();

        Ok(self.lock()[range.start])
    }

    fn write_u8(&self, addr: u32, value: u8) -> Result<()> {
        let range = checked_range(addr, 1, self.size)?;
        self.count_write();

        self.lock()[range.start] = value;
        Ok(())
    }

    fn read_u32(&self, addr: u32) -> Result<u32> {
        let range = checked_range(addr, 4, self.size)?;
        self.count_read();

        let mut word = [0u8; 4];
        word.copy_from_slice(&self.lock()[range]);
        Ok(u32::from_le_bytes(word))
    }

    fn write_u32(&self, addr: u32, value: u32) -> Result<()> {
        let range = checked_range(addr, 4, self.size)?;
        self.count_write();

        self.lock()[range].copy_from_slice(&value.to_le_bytes());
        Ok(())
    }

    fn read_run(&self, addr: u32, buf: &mut [u8]) -> Result<()> {
        let range = checked_range(addr, buf.len(), self.size)?;
        self.count_read();

        buf.copy_from_slice(&self.lock()[range]);
        Ok(())
    }

    fn write_run(&self, addr: u32, buf: &[u8]) -> Result<()> {
        let range = checked_range(addr, buf.len(), self.size)?;
        self.count_write();

        self.lock()[range].copy_from_slice(buf);
        Ok(())
    }
}
