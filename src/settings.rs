use snafu::ensure;

use crate::error;
use crate::error::Result;

const DEFAULT_SIZE: u32 = 1024;
const DEFAULT_WINDOW_START: u32 = 0;
const DEFAULT_MAX_RECORD_LEN: u32 = u8::MAX as u32;

#[derive(Debug, Clone)]
pub struct RingbufSettings {
    pub(crate) size: u32,
    pub(crate) window_start: u32,
    pub(crate) max_record_len: u32,
    pub(crate) verify_bounds: bool,
}

#[derive(Default)]
pub struct RingbufSettingsBuilder {
    size: Option<u32>,
    window_start: Option<u32>,
    max_record_len: Option<u32>,
    verify_bounds: Option<bool>,
}

impl RingbufSettingsBuilder {
    pub fn new() -> Self {
        RingbufSettingsBuilder::default()
    }

    /// Set the capacity in bytes of the usable window.
    pub fn size(mut self, size: u32) -> Self {
        self.size = Some(size);
        self
    }

    /// Set the address of the metadata block. The usable window starts right
    /// after it.
    pub fn window_start(mut self, addr: u32) -> Self {
        self.window_start = Some(addr);
        self
    }

    /// Set the longest record accepted by the record interface. Records never
    /// exceed the capacity of the window, whatever this value.
    pub fn max_record_len(mut self, len: u32) -> Self {
        self.max_record_len = Some(len);
        self
    }

    /// Reject persisted pointers that fall outside the window when loading.
    pub fn verify_bounds(mut self, verify: bool) -> Self {
        self.verify_bounds = Some(verify);
        self
    }

    pub fn build(self) -> Result<RingbufSettings> {
        let size = self.size.unwrap_or(DEFAULT_SIZE);
        ensure!(size > 0, {
            let detail = "The size of the ring buffer must be greater than 0.";
            error::InvalidParameterSnafu { detail }
        });

        let window_start = self.window_start.unwrap_or(DEFAULT_WINDOW_START);

        let max_record_len = self
            .max_record_len
            .unwrap_or(DEFAULT_MAX_RECORD_LEN)
            .max(1);

        let verify_bounds = self.verify_bounds.unwrap_or(false);

        Ok(RingbufSettings {
            size,
            window_start,
            max_record_len,
            verify_bounds,
        })
    }
}

impl RingbufSettings {
    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn window_start(&self) -> u32 {
        self.window_start
    }

    pub fn max_record_len(&self) -> u32 {
        self.max_record_len
    }

    pub fn verify_bounds(&self) -> bool {
        self.verify_bounds
    }
}
