use std::fs::File;

use fram_ringbuf::store::FileStore;
use fram_ringbuf::PersistentRingbuf;
use fram_ringbuf::RingbufSettings;
use fram_ringbuf::RingbufSettingsBuilder;

pub const STORE_SIZE: u32 = 8 * 1024;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

pub fn settings(size: u32, window_start: u32) -> RingbufSettings {
    RingbufSettingsBuilder::new()
        .size(size)
        .window_start(window_start)
        .verify_bounds(true)
        .build()
        .unwrap()
}

/// Open a ring buffer over a fresh file-backed store.
pub fn open_ringbuf(
    settings: RingbufSettings,
) -> PersistentRingbuf<FileStore> {
    let file = tempfile::tempfile().unwrap();
    let store = FileStore::new(file, STORE_SIZE).unwrap();

    PersistentRingbuf::new(store, settings).unwrap()
}

/// Drop the ring buffer and everything it keeps in memory, keeping only the
/// file behind it.
pub fn power_off(ringbuf: PersistentRingbuf<FileStore>) -> File {
    ringbuf.into_store().into_file()
}

/// Build a new ring buffer over a file left by [power_off] and recover its
/// pointers.
pub fn power_on(
    file: File,
    settings: RingbufSettings,
) -> (PersistentRingbuf<FileStore>, fram_ringbuf::error::Result<()>) {
    let store = FileStore::open(file).unwrap();
    let mut ringbuf = PersistentRingbuf::new(store, settings).unwrap();
    let loaded = ringbuf.load();

    (ringbuf, loaded)
}
