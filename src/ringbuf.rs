pub mod metadata;

use metadata::RingbufMetadata;
use metadata::METADATA_LEN;
use snafu::ensure;
use snafu::OptionExt;
use snafu::ResultExt;
use tracing::debug;
use tracing::trace;
use tracing::warn;

use crate::convert_num;
use crate::error;
use crate::error::Result;
use crate::settings::RingbufSettings;
use crate::store::Store;

/// The sentinel written over the metadata block and the window by
/// [PersistentRingbuf::wipe].
const WIPE_WORD: u32 = u32::MAX;
const WIPE_BYTE: u8 = u8::MAX;

/// A circular byte buffer living in a window of a non-volatile store, whose
/// pointers can be persisted next to the data.
///
/// ## The underlying structure
///
/// ```text
///                   start              tail               front
///                     |                  |                  |
///                     v                  v                  v
/// +-------------------+------------------+------------------+--------------+
/// | metadata          | free             | unread           | free         |
/// +-------------------+------------------+------------------+--------------+
/// | METADATA_LEN      | size bytes                                         |
/// +-------------------+----------------------------------------------------+
/// ```
///
/// Every byte access is a transaction on the store; nothing is mirrored in
/// memory except the pointers. The pointers only reach the store on
/// [PersistentRingbuf::save] and are recovered with
/// [PersistentRingbuf::load].
///
/// The buffer expects a single owner. Several buffers may share one store as
/// long as their windows are disjoint.
#[derive(Debug)]
pub struct PersistentRingbuf<S> {
    store: S,

    /// The first address of the window.
    start: u32,

    /// The capacity of the window in bytes.
    size: u32,

    /// The next write position.
    front: u32,

    /// The next read position.
    tail: u32,

    /// The number of unread bytes, kept in step with `front` and `tail`.
    count: u32,

    /// Whether the metadata block matches `size`, `front` and `tail`.
    saved: bool,

    max_record_len: u32,
    verify_bounds: bool,
}

impl<S: Store> PersistentRingbuf<S> {
    /// Creates a ring buffer over `store` with the given settings. The
    /// buffer starts empty; call [PersistentRingbuf::load] to recover the
    /// pointers of a previous run.
    pub fn new(store: S, settings: RingbufSettings) -> Result<Self> {
        let RingbufSettings {
            size,
            window_start,
            max_record_len,
            verify_bounds,
        } = settings;

        let mut ringbuf = Self {
            store,
            start: 0,
            size: 0,
            front: 0,
            tail: 0,
            count: 0,
            saved: false,
            max_record_len,
            verify_bounds,
        };
        ringbuf.initialize(size, window_start)?;

        Ok(ringbuf)
    }

    /// Reserve the metadata block at `window_start` and a window of `size`
    /// bytes right after it, and reset the buffer to empty.
    ///
    /// Returns the first address beyond the window, where another region of
    /// the same store may begin.
    pub fn initialize(&mut self, size: u32, window_start: u32) -> Result<u32> {
        ensure!(size > 0, {
            let detail = "The size of the ring buffer must be greater than 0.";
            error::InvalidParameterSnafu { detail }
        });

        let end = window_start
            .checked_add(METADATA_LEN)
            .and_then(|start| start.checked_add(size))
            .context(error::InvalidParameterSnafu {
                detail: format!(
                    "The window at {} with size {} overflows the address space.",
                    window_start, size
                ),
            })?;

        let store_size = self.store.size();
        ensure!(end <= store_size, {
            let detail = format!(
                "The window ends at {}, beyond the store size {}.",
                end, store_size
            );
            error::InvalidParameterSnafu { detail }
        });

        self.start = window_start + METADATA_LEN;
        self.size = size;
        self.flush();

        debug!(
            "ring buffer initialized, metadata: {}, window: [{}, {})",
            window_start, self.start, end
        );

        Ok(end)
    }

    /// Discard all content. The store is not touched.
    pub fn flush(&mut self) {
        self.front = self.start;
        self.tail = self.start;
        self.count = 0;
        self.saved = false;
    }

    /// Get the capacity of the window in bytes.
    pub fn capacity(&self) -> u32 {
        self.size
    }

    /// Get the number of unread bytes.
    pub fn occupied(&self) -> u32 {
        self.count
    }

    pub fn is_full(&self) -> bool {
        self.count >= self.size
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn free_bytes(&self) -> u32 {
        self.size.saturating_sub(self.count)
    }

    /// The share of the window holding unread bytes, in percent.
    pub fn free_percent(&self) -> f32 {
        if self.size == 0 {
            return 0.0;
        }
        (100.0 * self.count as f64 / self.size as f64) as f32
    }

    pub fn start(&self) -> u32 {
        self.start
    }

    pub fn front(&self) -> u32 {
        self.front
    }

    pub fn tail(&self) -> u32 {
        self.tail
    }

    pub fn is_saved(&self) -> bool {
        self.saved
    }

    /// The address of the metadata block, which precedes the window.
    pub fn metadata_address(&self) -> u32 {
        self.start - METADATA_LEN
    }

    /// The first address beyond the window.
    pub fn first_free_address(&self) -> u32 {
        self.start + self.size
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    pub fn write_byte(&mut self, value: u8) -> Result<()> {
        ensure!(!self.is_full(), error::FullSnafu);

        self.store.write_u8(self.front, value)?;

        self.front = self.advance(self.front, 1);
        self.count += 1;
        self.saved = false;

        Ok(())
    }

    pub fn read_byte(&mut self) -> Result<u8> {
        ensure!(!self.is_empty(), error::EmptySnafu);

        let value = self.store.read_u8(self.tail)?;

        self.tail = self.advance(self.tail, 1);
        self.count -= 1;
        self.saved = false;

        Ok(value)
    }

    /// Read the next byte without consuming it.
    pub fn peek_byte(&self) -> Result<u8> {
        ensure!(!self.is_empty(), error::EmptySnafu);

        self.store.read_u8(self.tail)
    }

    /// Write a record as one unit. Either every byte fits and is written, or
    /// nothing is.
    pub fn write_record(&mut self, record: &[u8]) -> Result<()> {
        let len = convert_num!(record.len(), u32)?;

        ensure!(
            len <= self.max_record_len(),
            error::RecordTooLargeSnafu {
                len,
                max: self.max_record_len(),
            }
        );

        ensure!(
            len <= self.free_bytes(),
            error::NoRoomSnafu {
                free: self.free_bytes(),
                expected: len,
            }
        );

        if record.is_empty() {
            return Ok(());
        }

        let (head, wrapped) = record.split_at(self.run_len(self.front, len));
        self.store.write_run(self.front, head)?;
        if !wrapped.is_empty() {
            self.store.write_run(self.start, wrapped)?;
        }

        trace!("record written, len: {}, front: {}", len, self.front);

        self.front = self.advance(self.front, len);
        self.count += len;
        self.saved = false;

        Ok(())
    }

    /// Read and consume a record of `len` bytes.
    pub fn read_record(&mut self, len: usize) -> Result<Vec<u8>> {
        let mut record = vec![0u8; len];
        self.read_record_into(&mut record)?;
        Ok(record)
    }

    /// Read and consume `record.len()` bytes into `record`.
    pub fn read_record_into(&mut self, record: &mut [u8]) -> Result<()> {
        self.peek_record_into(record)?;

        let len = record.len() as u32;
        trace!("record read, len: {}, tail: {}", len, self.tail);

        self.tail = self.advance(self.tail, len);
        self.count -= len;
        self.saved = false;

        Ok(())
    }

    /// Read a record of `len` bytes without consuming it.
    pub fn peek_record(&self, len: usize) -> Result<Vec<u8>> {
        let mut record = vec![0u8; len];
        self.peek_record_into(&mut record)?;
        Ok(record)
    }

    /// Fill `record` with the next unread bytes without consuming them.
    pub fn peek_record_into(&self, record: &mut [u8]) -> Result<()> {
        let len = convert_num!(record.len(), u32)?;

        ensure!(
            len <= self.count,
            error::NoDataSnafu {
                available: self.count,
                expected: len,
            }
        );

        if record.is_empty() {
            return Ok(());
        }

        let run_len = self.run_len(self.tail, len);
        let (head, wrapped) = record.split_at_mut(run_len);
        self.store.read_run(self.tail, head)?;
        if !wrapped.is_empty() {
            self.store.read_run(self.start, wrapped)?;
        }

        Ok(())
    }

    /// Persist `size`, `front` and `tail` with their checksum. Does nothing
    /// when the metadata block is already up to date.
    pub fn save(&mut self) -> Result<()> {
        if self.saved {
            return Ok(());
        }

        if self.is_full() {
            warn!(
                "saving a full ring buffer, front == tail, it loads back as empty, count: {}",
                self.count
            );
        }

        let metadata = RingbufMetadata::new(self.size, self.front, self.tail);
        metadata.write_to(&self.store, self.metadata_address())?;
        self.saved = true;

        debug!(
            "ring buffer saved, front: {}, tail: {}, count: {}",
            self.front, self.tail, self.count
        );

        Ok(())
    }

    /// Recover the pointers persisted by [PersistentRingbuf::save].
    ///
    /// On any error the in-memory pointers are left as they were and the
    /// buffer counts as unsaved; the caller should usually
    /// [flush](PersistentRingbuf::flush) it.
    ///
    /// Without bound verification, persisted pointers outside the window are
    /// wrapped into it and the buffer stays unsaved, since the metadata block
    /// no longer matches.
    pub fn load(&mut self) -> Result<()> {
        self.saved = false;

        let metadata =
            RingbufMetadata::read_from(&self.store, self.metadata_address())?;

        if !metadata.is_consistent() {
            warn!(
                "checksum mismatch on load, stored: {:#010x}, computed: {:#010x}",
                metadata.checksum,
                metadata.computed_checksum()
            );
            return error::ChecksumMismatchSnafu {
                stored: metadata.checksum,
                computed: metadata.computed_checksum(),
            }
            .fail();
        }

        if metadata.size != self.size {
            warn!(
                "size mismatch on load, stored: {}, expected: {}",
                metadata.size, self.size
            );
            return error::SizeMismatchSnafu {
                stored: metadata.size,
                expected: self.size,
            }
            .fail();
        }

        if self.verify_bounds {
            self.check_in_window("front", metadata.front)?;
            self.check_in_window("tail", metadata.tail)?;
        }

        let front = self.advance(metadata.front, 0);
        let tail = self.advance(metadata.tail, 0);
        let in_window = front == metadata.front && tail == metadata.tail;
        if !in_window {
            warn!(
                "persisted pointers outside the window [{}, {}), front: {} -> {}, tail: {} -> {}",
                self.start,
                self.first_free_address(),
                metadata.front,
                front,
                metadata.tail,
                tail
            );
        }

        self.front = front;
        self.tail = tail;
        self.count = RingbufMetadata::new(self.size, front, tail).occupied();
        self.saved = in_window;

        debug!(
            "ring buffer loaded, front: {}, tail: {}, count: {}",
            self.front, self.tail, self.count
        );

        Ok(())
    }

    /// Overwrite the metadata block and the whole window with all ones, then
    /// reset the buffer to empty.
    pub fn wipe(&mut self) -> Result<()> {
        let base = self.metadata_address();
        let end = self.first_free_address();
        let words_end = end - (end - base) % 4;

        for addr in (base..words_end).step_by(4) {
            self.store.write_u32(addr, WIPE_WORD)?;
        }
        for addr in words_end..end {
            self.store.write_u8(addr, WIPE_BYTE)?;
        }

        self.flush();

        debug!("ring buffer wiped, range: [{}, {})", base, end);

        Ok(())
    }

    fn max_record_len(&self) -> u32 {
        self.max_record_len.min(self.size)
    }

    fn check_in_window(&self, field: &'static str, addr: u32) -> Result<()> {
        let end = self.first_free_address();

        if (self.start..end).contains(&addr) {
            return Ok(());
        }

        warn!(
            "persisted {} {} outside the window [{}, {})",
            field, addr, self.start, end
        );

        error::OutOfWindowSnafu {
            field,
            addr,
            start: self.start,
            end,
        }
        .fail()
    }

    /// The position `len` bytes after `addr`, wrapped into the window.
    fn advance(&self, addr: u32, len: u32) -> u32 {
        let offset = addr.wrapping_sub(self.start) as u64 + len as u64;
        self.start + (offset % self.size as u64) as u32
    }

    /// How many of `len` bytes starting at `addr` fit before the end of the
    /// window.
    fn run_len(&self, addr: u32, len: u32) -> usize {
        let until_end = self.first_free_address().saturating_sub(addr);
        len.min(until_end) as usize
    }
}
