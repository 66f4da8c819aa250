use std::sync::Arc;

use fram_ringbuf::store::MemStore;
use fram_ringbuf::PersistentRingbuf;
use fram_ringbuf::METADATA_LEN;

use crate::common::init_tracing;
use crate::common::settings;

#[test]
fn test_chained_regions_share_a_store() {
    init_tracing();

    let store = Arc::new(MemStore::new(1024));

    let mut first =
        PersistentRingbuf::new(store.clone(), settings(64, 0)).unwrap();
    let next = first.first_free_address();
    assert_eq!(next, METADATA_LEN + 64);

    let mut second =
        PersistentRingbuf::new(store.clone(), settings(32, next)).unwrap();
    assert_eq!(second.metadata_address(), next);
    assert_eq!(second.first_free_address(), next + METADATA_LEN + 32);

    // Fill both to the brim and check neither spills into the other.
    while first.write_byte(0x11).is_ok() {}
    while second.write_byte(0x22).is_ok() {}
    first.save().unwrap();
    second.save().unwrap();

    assert!(first.is_full());
    assert!(second.is_full());

    for _ in 0..64 {
        assert_eq!(first.read_byte().unwrap(), 0x11);
    }
    for _ in 0..32 {
        assert_eq!(second.read_byte().unwrap(), 0x22);
    }

    let bytes = store.to_vec();
    let untouched = second.first_free_address() as usize;
    assert!(bytes[untouched..].iter().all(|b| *b == 0));
}

#[test]
fn test_wipe_leaves_neighbours_alone() {
    init_tracing();

    let store = Arc::new(MemStore::new(512));

    let mut first =
        PersistentRingbuf::new(store.clone(), settings(30, 0)).unwrap();
    let mut second = PersistentRingbuf::new(
        store.clone(),
        settings(30, first.first_free_address()),
    )
    .unwrap();

    first.write_record(b"first").unwrap();
    first.save().unwrap();
    second.write_record(b"second").unwrap();
    second.save().unwrap();

    first.wipe().unwrap();

    second.flush();
    second.load().unwrap();
    assert_eq!(second.read_record(6).unwrap(), b"second");
}
