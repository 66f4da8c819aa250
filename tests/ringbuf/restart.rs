use fram_ringbuf::error;
use fram_ringbuf::store::Store;
use fram_ringbuf::METADATA_LEN;

use crate::common::init_tracing;
use crate::common::open_ringbuf;
use crate::common::power_off;
use crate::common::power_on;
use crate::common::settings;

#[test]
fn test_recover_after_restart() {
    init_tracing();

    let settings = settings(16, 100);
    let mut ringbuf = open_ringbuf(settings.clone());

    for value in [10, 11, 12, 13, 14] {
        ringbuf.write_byte(value).unwrap();
    }
    assert_eq!(ringbuf.read_byte().unwrap(), 10);
    assert_eq!(ringbuf.read_byte().unwrap(), 11);
    assert_eq!(ringbuf.occupied(), 3);

    ringbuf.save().unwrap();
    let (front, tail) = (ringbuf.front(), ringbuf.tail());

    let file = power_off(ringbuf);
    let (mut ringbuf, loaded) = power_on(file, settings);
    loaded.unwrap();

    assert!(ringbuf.is_saved());
    assert_eq!(ringbuf.occupied(), 3);
    assert_eq!(ringbuf.front(), front);
    assert_eq!(ringbuf.tail(), tail);
    assert_eq!(ringbuf.read_record(3).unwrap(), [12, 13, 14]);
}

#[test]
fn test_recover_wrapped_records() {
    init_tracing();

    let settings = settings(32, 0);
    let mut ringbuf = open_ringbuf(settings.clone());

    // Push the pointers around the window a few times.
    for i in 0..10u8 {
        let record = [i; 7];
        ringbuf.write_record(&record).unwrap();
        if ringbuf.occupied() > 14 {
            ringbuf.read_record(7).unwrap();
        }
    }
    assert!(ringbuf.front() < ringbuf.tail());
    let expected = ringbuf.peek_record(ringbuf.occupied() as usize).unwrap();
    ringbuf.save().unwrap();

    let file = power_off(ringbuf);
    let (mut ringbuf, loaded) = power_on(file, settings);
    loaded.unwrap();

    assert_eq!(ringbuf.occupied() as usize, expected.len());
    assert_eq!(ringbuf.read_record(expected.len()).unwrap(), expected);
    assert!(ringbuf.is_empty());
}

#[test]
fn test_unsaved_progress_is_lost() {
    init_tracing();

    let settings = settings(16, 0);
    let mut ringbuf = open_ringbuf(settings.clone());

    ringbuf.write_record(b"kept").unwrap();
    ringbuf.save().unwrap();
    ringbuf.write_record(b"lost").unwrap();

    let file = power_off(ringbuf);
    let (mut ringbuf, loaded) = power_on(file, settings);
    loaded.unwrap();

    assert_eq!(ringbuf.occupied(), 4);
    assert_eq!(ringbuf.read_record(4).unwrap(), b"kept");
}

#[test]
fn test_torn_metadata_needs_flush() {
    init_tracing();

    let settings = settings(16, 64);
    let mut ringbuf = open_ringbuf(settings.clone());

    ringbuf.write_record(b"abcdef").unwrap();
    ringbuf.save().unwrap();

    // A save interrupted after the front pointer was written.
    let metadata_address = ringbuf.metadata_address();
    let new_front = ringbuf.front() + 2;
    ringbuf.store().write_u32(metadata_address + 4, new_front).unwrap();

    let file = power_off(ringbuf);
    let (mut ringbuf, loaded) = power_on(file, settings);

    assert!(matches!(
        loaded,
        Err(error::Error::ChecksumMismatch { .. })
    ));
    assert!(!ringbuf.is_saved());

    ringbuf.flush();
    assert!(ringbuf.is_empty());
    ringbuf.write_record(b"fresh").unwrap();
    assert_eq!(ringbuf.read_record(5).unwrap(), b"fresh");
}

#[test]
fn test_wipe_then_restart() {
    init_tracing();

    let settings = settings(21, 3);
    let mut ringbuf = open_ringbuf(settings.clone());

    ringbuf.write_record(b"password").unwrap();
    ringbuf.save().unwrap();
    ringbuf.wipe().unwrap();

    let base = ringbuf.metadata_address();
    let end = ringbuf.first_free_address();
    let mut bytes = vec![0u8; (end - base) as usize];
    ringbuf.store().read_run(base, &mut bytes).unwrap();
    assert_eq!(bytes.len() as u32, METADATA_LEN + 21);
    assert!(bytes.iter().all(|b| *b == 0xFF));

    let file = power_off(ringbuf);
    let (mut ringbuf, loaded) = power_on(file, settings);
    assert!(matches!(
        loaded,
        Err(error::Error::ChecksumMismatch { .. })
    ));

    let next = ringbuf.initialize(21, 3).unwrap();
    assert_eq!(next, 3 + METADATA_LEN + 21);
    assert!(ringbuf.is_empty());
    assert_eq!(ringbuf.capacity(), 21);
}
