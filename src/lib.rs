pub mod error;
pub mod settings;
pub mod store;

mod macros;
mod ringbuf;

pub use ringbuf::metadata::RingbufMetadata;
pub use ringbuf::metadata::METADATA_LEN;
pub use ringbuf::PersistentRingbuf;
pub use settings::RingbufSettings;
pub use settings::RingbufSettingsBuilder;
pub use store::Store;
