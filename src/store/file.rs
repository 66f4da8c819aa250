use std::fs::File;
use std::os::unix::fs::FileExt;

use snafu::ensure;
use snafu::ResultExt;

use crate::convert_num;
use crate::error;
use crate::error::Result;
use crate::store::checked_range;
use crate::store::Store;

/// A file-backed emulation of an FRAM chip.
///
/// All accesses are positioned reads and writes, so the content survives the
/// [FileStore] being dropped. Reopening the same file simulates a restart
/// after power loss.
#[derive(Debug)]
pub struct FileStore {
    file: File,
    size: u32,
}

impl FileStore {
    /// Creates a store of `size` bytes over the given file. A shorter file is
    /// extended with zeros; a longer one keeps its tail, which stays outside
    /// the addressable range.
    pub fn new(file: File, size: u32) -> Result<Self> {
        let file_len = file.metadata().context(error::IoSnafu)?.len();
        if file_len < size as u64 {
            file.set_len(size as u64).context(error::IoSnafu)?;
        }

        Ok(Self { file, size })
    }

    /// Recover a store from a file written earlier. The whole file is
    /// addressable.
    pub fn open(file: File) -> Result<Self> {
        let file_len = file.metadata().context(error::IoSnafu)?.len();
        ensure!(file_len > 0, {
            let detail = "The file to recover a store from is empty.";
            error::InvalidParameterSnafu { detail }
        });

        let size = convert_num!(file_len, u32)?;

        Ok(Self { file, size })
    }

    pub fn into_file(self) -> File {
        self.file
    }

    fn read_exact_at(&self, addr: u32, buf: &mut [u8]) -> Result<()> {
        checked_range(addr, buf.len(), self.size)?;
        self.file
            .read_exact_at(buf, addr as u64)
            .context(error::IoSnafu)
    }

    fn write_all_at(&self, addr: u32, buf: &[u8]) -> Result<()> {
        checked_range(addr, buf.len(), self.size)?;
        self.file
            .write_all_at(buf, addr as u64)
            .context(error::IoSnafu)
    }
}

impl Store for FileStore {
    fn size(&self) -> u32 {
        self.size
    }

    fn read_u8(&self, addr: u32) -> Result<u8> {
        let mut byte = [0u8; 1];
        self.read_exact_at(addr, &mut byte)?;
        Ok(byte[0])
    }

    fn write_u8(&self, addr: u32, value: u8) -> Result<()> {
        self.write_all_at(addr, &[value])
    }

    fn read_u32(&self, addr: u32) -> Result<u32> {
        let mut word = [0u8; 4];
        self.read_exact_at(addr, &mut word)?;
        Ok(u32::from_le_bytes(word))
    }

    fn write_u32(&self, addr: u32, value: u32) -> Result<()> {
        self.write_all_at(addr, &value.to_le_bytes())
    }

    fn read_run(&self, addr: u32, buf: &mut [u8]) -> Result<()> {
        self.read_exact_at(addr, buf)
    }

    fn write_run(&self, addr: u32, buf: &[u8]) -> Result<()> {
        self.write_all_at(addr, buf)
    }
}

/// Settings for creating a memfd.
#[cfg(target_os = "linux")]
#[derive(Debug, Clone)]
pub struct MemfdSettings {
    /// The name of the memfd. Only used for debugging.
    pub name: String,
    /// The size of the memfd.
    pub size: u32,
}

/// Create an anonymous in-memory file to back a [FileStore].
#[cfg(target_os = "linux")]
pub fn memfd_create(settings: MemfdSettings) -> Result<File> {
    use std::ffi::CString;

    use nix::sys::memfd;

    let MemfdSettings { name, size } = settings;

    let c_name = CString::new(name.clone()).context(error::NulZeroSnafu)?;

    let flags = memfd::MemFdCreateFlag::MFD_CLOEXEC;

    let owned_fd = memfd::memfd_create(c_name.as_c_str(), flags)
        .context(error::MemFdSnafu { fd_name: name })?;

    let file = File::from(owned_fd);
    file.set_len(size as u64).context(error::IoSnafu)?;

    Ok(file)
}
