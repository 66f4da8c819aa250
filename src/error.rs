use std::ffi::NulError;
use std::num::TryFromIntError;

use snafu::Location;
use snafu::Snafu;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum Error {
    #[snafu(display("IO error"))]
    Io {
        source: std::io::Error,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("Invalid parameter, detail: {}", detail))]
    InvalidParameter {
        detail: String,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("The ring buffer is full"))]
    Full {
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("The ring buffer is empty"))]
    Empty {
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("No room for record, free: {}, expected: {}", free, expected))]
    NoRoom {
        free: u32,
        expected: u32,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display(
        "Not enough data for record, available: {}, expected: {}",
        available,
        expected
    ))]
    NoData {
        available: u32,
        expected: u32,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("Record too large, len: {}, max: {}", len, max))]
    RecordTooLarge {
        len: u32,
        max: u32,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display(
        "Checksum mismatch, stored: {:#010x}, computed: {:#010x}",
        stored,
        computed
    ))]
    ChecksumMismatch {
        stored: u32,
        computed: u32,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display(
        "Persisted size {} does not match the capacity {}",
        stored,
        expected
    ))]
    SizeMismatch {
        stored: u32,
        expected: u32,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display(
        "Persisted {} {} is outside the window [{}, {})",
        field,
        addr,
        start,
        end
    ))]
    OutOfWindow {
        field: &'static str,
        addr: u32,
        start: u32,
        end: u32,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display(
        "Store access out of range, addr: {}, len: {}, store len: {}",
        addr,
        len,
        store_len
    ))]
    OutOfRange {
        addr: u32,
        len: u32,
        store_len: u32,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("Failed to create memfd, name: {}", fd_name))]
    MemFd {
        fd_name: String,
        source: nix::Error,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("Contain an internal 0 byte"))]
    NulZero {
        source: NulError,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("Failed to convert int, from {} to {}", from, to))]
    TryFromInt {
        from: String,
        to: String,
        source: TryFromIntError,
        #[snafu(implicit)]
        location: Location,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
