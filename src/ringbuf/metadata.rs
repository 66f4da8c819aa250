use crate::error::Result;
use crate::store::Store;

/// The length of the metadata block in bytes.
pub const METADATA_LEN: u32 = 4 * 4;

const SIZE_OFFSET: u32 = 0;
const FRONT_OFFSET: u32 = 4;
const TAIL_OFFSET: u32 = 8;
const CHECKSUM_OFFSET: u32 = 12;

/// The persisted snapshot of a ring buffer's pointers.
///
/// ## The underlying structure
///
/// ```text
/// base                                                                    base + METADATA_LEN
/// |                                                                       |
/// v                                                                       v
/// +-----------------+-----------------+-----------------+-----------------+----------------+
/// | size            | front           | tail            | checksum        | window         |
/// +-----------------+-----------------+-----------------+-----------------+----------------+
/// | 4 bytes         | 4 bytes         | 4 bytes         | 4 bytes         | size bytes     |
/// +-----------------+-----------------+-----------------+-----------------+----------------+
/// ```
///
/// The checksum is the wrapping sum of `size`, `front` and `tail`. It does not
/// cover the window start, and compensating errors in two fields go unnoticed.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct RingbufMetadata {
    pub size: u32,
    pub front: u32,
    pub tail: u32,
    pub checksum: u32,
}

impl RingbufMetadata {
    /// Create a snapshot with a matching checksum.
    pub fn new(size: u32, front: u32, tail: u32) -> Self {
        Self {
            size,
            front,
            tail,
            checksum: compute_checksum(size, front, tail),
        }
    }

    /// The checksum recomputed from the stored fields.
    pub fn computed_checksum(&self) -> u32 {
        compute_checksum(self.size, self.front, self.tail)
    }

    pub fn is_consistent(&self) -> bool {
        self.checksum == self.computed_checksum()
    }

    /// The number of unread bytes described by the snapshot, i.e. the
    /// wrap-aware distance from `tail` to `front`.
    ///
    /// Note: a full buffer has `front == tail` and reads back as empty.
    pub fn occupied(&self) -> u32 {
        if self.front >= self.tail {
            self.front - self.tail
        } else {
            self.front.wrapping_sub(self.tail).wrapping_add(self.size)
        }
    }

    /// Read the snapshot stored at `base`.
    pub fn read_from<S: Store + ?Sized>(
        store: &S,
        base: u32,
    ) -> Result<Self> {
        Ok(Self {
            size: store.read_u32(base + SIZE_OFFSET)?,
            front: store.read_u32(base + FRONT_OFFSET)?,
            tail: store.read_u32(base + TAIL_OFFSET)?,
            checksum: store.read_u32(base + CHECKSUM_OFFSET)?,
        })
    }

    /// Write the snapshot at `base`. The checksum goes last, so an
    /// interrupted write is caught on the next read.
    pub fn write_to<S: Store + ?Sized>(
        &self,
        store: &S,
        base: u32,
    ) -> Result<()> {
        store.write_u32(base + SIZE_OFFSET, self.size)?;
        store.write_u32(base + FRONT_OFFSET, self.front)?;
        store.write_u32(base + TAIL_OFFSET, self.tail)?;
        store.write_u32(base + CHECKSUM_OFFSET, self.checksum)
    }
}

fn compute_checksum(size: u32, front: u32, tail: u32) -> u32 {
    size.wrapping_add(front).wrapping_add(tail)
}
