//! Source over a `std::fs::File`.

use crate::error::{OxiIoError, Result};
use crate::signal::{Interest, Signal, Whence};
use crate::source::{Source, SourceKind, SourceStat};
use std::fs::{File, OpenOptions};
use std::io::{IsTerminal, Read, Seek, Write};
use std::path::Path;
use std::time::Duration;

/// A source reading from and writing to an open file.
#[derive(Debug)]
pub struct FileSource {
    file: Option<File>,
    readable: bool,
    writable: bool,
}

impl FileSource {
    /// Wrap an already opened file with explicit direction flags.
    pub fn new(file: File, readable: bool, writable: bool) -> Self {
        Self {
            file: Some(file),
            readable,
            writable,
        }
    }

    /// Open `path` for reading.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self::new(File::open(path)?, true, false))
    }

    /// Create (or truncate) `path` for writing.
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self::new(File::create(path)?, false, true))
    }

    /// Open `path` for reading and writing, creating it when missing.
    pub fn open_read_write(path: impl AsRef<Path>) -> Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)?;
        Ok(Self::new(file, true, true))
    }

    fn file(&self) -> Result<&File> {
        self.file.as_ref().ok_or(OxiIoError::Closed)
    }

    fn file_mut(&mut self) -> Result<&mut File> {
        self.file.as_mut().ok_or(OxiIoError::Closed)
    }
}

impl Source for FileSource {
    fn read(&mut self, buf: &mut [u8]) -> Result<Signal<usize>> {
        let requested = buf.len();
        let result = self.file_mut()?.read(buf);
        Signal::from_io_read(result, requested)
    }

    fn write(&mut self, buf: &[u8]) -> Result<Signal<usize>> {
        let result = self.file_mut()?.write(buf);
        Signal::from_io_write(result)
    }

    fn close(&mut self) -> Result<()> {
        let file = self.file.take().ok_or(OxiIoError::Closed)?;
        if self.writable {
            file.sync_data().or_else(|e| match e.kind() {
                // Pipes and character devices cannot be synced.
                std::io::ErrorKind::InvalidInput | std::io::ErrorKind::Unsupported => Ok(()),
                _ => Err(e),
            })?;
        }
        Ok(())
    }

    fn is_closed(&self) -> bool {
        self.file.is_none()
    }

    fn is_readable(&self) -> bool {
        self.readable
    }

    fn is_writable(&self) -> bool {
        self.writable
    }

    fn seek(&mut self, offset: i64, whence: Whence) -> Result<u64> {
        let pos = whence.to_seek_from(offset)?;
        Ok(self.file_mut()?.seek(pos)?)
    }

    fn stat(&self) -> Result<SourceStat> {
        let metadata = self.file()?.metadata()?;
        let file_type = metadata.file_type();
        let kind = if file_type.is_file() {
            SourceKind::File
        } else if file_type.is_dir() {
            SourceKind::Directory
        } else {
            special_kind(&file_type)
        };
        Ok(SourceStat {
            kind,
            size: file_type.is_file().then(|| metadata.len()),
        })
    }

    #[cfg(unix)]
    fn fileno(&self) -> Result<i64> {
        use std::os::fd::AsRawFd;
        Ok(i64::from(self.file()?.as_raw_fd()))
    }

    fn wait(&mut self, _interest: Interest, _timeout: Option<Duration>) -> Result<bool> {
        // Regular files are always ready.
        self.ensure_open()?;
        Ok(true)
    }

    fn is_tty(&self) -> Result<bool> {
        Ok(self.file()?.is_terminal())
    }

    fn duplicate(&self) -> Result<Self> {
        Ok(Self::new(self.file()?.try_clone()?, self.readable, self.writable))
    }
}

#[cfg(unix)]
fn special_kind(file_type: &std::fs::FileType) -> SourceKind {
    use std::os::unix::fs::FileTypeExt;
    if file_type.is_fifo() {
        SourceKind::Pipe
    } else if file_type.is_socket() {
        SourceKind::Socket
    } else if file_type.is_char_device() {
        SourceKind::CharDevice
    } else {
        SourceKind::Other
    }
}

#[cfg(not(unix))]
fn special_kind(_file_type: &std::fs::FileType) -> SourceKind {
    SourceKind::Other
}
