use fram_ringbuf::store::file::memfd_create;
use fram_ringbuf::store::file::MemfdSettings;
use fram_ringbuf::store::FileStore;
use fram_ringbuf::PersistentRingbuf;
use fram_ringbuf::RingbufSettingsBuilder;
use tracing::info;
use tracing::warn;

fn main() {
    tracing_subscriber::fmt::init();

    let memfd = memfd_create(MemfdSettings {
        name: "fram".to_string(),
        size: 4096,
    })
    .unwrap();

    let settings = RingbufSettingsBuilder::new()
        .size(256)
        .window_start(64)
        .verify_bounds(true)
        .build()
        .unwrap();

    let store = FileStore::open(memfd).unwrap();
    let mut ringbuf = PersistentRingbuf::new(store, settings.clone()).unwrap();

    for i in 0..10 {
        let msg = format!("reading {:02}", i);
        ringbuf.write_record(msg.as_bytes()).unwrap();
    }
    let first = ringbuf.read_record(10).unwrap();
    info!("consumed: {}", String::from_utf8_lossy(&first));

    ringbuf.save().unwrap();
    info!(
        "saved, occupied: {}, used: {:.1}%",
        ringbuf.occupied(),
        ringbuf.free_percent()
    );

    // Power loss: only the store survives.
    let file = ringbuf.into_store().into_file();

    let store = FileStore::open(file).unwrap();
    let mut ringbuf = PersistentRingbuf::new(store, settings).unwrap();
    if let Err(e) = ringbuf.load() {
        warn!("failed to recover the ring buffer: {}, flush it", e);
        ringbuf.flush();
    }

    while !ringbuf.is_empty() {
        let record = ringbuf.read_record(10).unwrap();
        info!("recovered: {}", String::from_utf8_lossy(&record));
    }
}
