use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{Result, TransportError};

/// How an existing capture file is treated when the store opens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StoreMode {
    /// Start from an empty file.
    #[default]
    Truncate,
    /// Keep existing content and append after it.
    Append,
}

/// Append-only capture file.
///
/// Writes go straight to the file; there is no userspace buffer between the
/// socket and the file, so a completed `write_all` is a persisted datagram.
#[derive(Debug)]
pub struct CaptureStore {
    file: File,
    path: PathBuf,
    sync_each: bool,
}

impl CaptureStore {
    /// Open (or create) the capture file at `path`.
    pub fn open(path: impl AsRef<Path>, mode: StoreMode) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        let mut options = OpenOptions::new();
        options.create(true);
        match mode {
            StoreMode::Truncate => options.write(true).truncate(true),
            StoreMode::Append => options.append(true),
        };

        let file = options.open(&path).map_err(|source| TransportError::Open {
            path: path.clone(),
            source,
        })?;
        debug!(?path, ?mode, "opened capture store");

        Ok(Self {
            file,
            path,
            sync_each: false,
        })
    }

    /// Flush file data to stable storage after every append.
    pub fn with_sync_each(mut self, sync_each: bool) -> Self {
        self.sync_each = sync_each;
        self
    }

    /// Path of the capture file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Write for CaptureStore {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.file.write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.file.flush()?;
        if self.sync_each {
            self.file.sync_data()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "i2scap-store-{tag}-{}-{}",
            std::process::id(),
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap()
                .as_nanos()
        ));
        std::fs::create_dir_all(&dir).unwrap();
        dir.join("capture.raw")
    }

    #[test]
    fn truncate_mode_discards_previous_content() {
        let path = temp_path("truncate");
        std::fs::write(&path, b"stale").unwrap();

        let mut store = CaptureStore::open(&path, StoreMode::Truncate).unwrap();
        store.write_all(b"fresh").unwrap();
        store.flush().unwrap();

        assert_eq!(std::fs::read(&path).unwrap(), b"fresh");
        assert_eq!(store.path(), path.as_path());
        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn append_mode_keeps_previous_content() {
        let path = temp_path("append");
        std::fs::write(&path, b"one-").unwrap();

        let mut store = CaptureStore::open(&path, StoreMode::Append)
            .unwrap()
            .with_sync_each(true);
        store.write_all(b"two").unwrap();
        store.flush().unwrap();

        assert_eq!(std::fs::read(&path).unwrap(), b"one-two");
        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn open_in_missing_directory_fails() {
        let path = temp_path("missing").join("nope").join("capture.raw");
        let err = CaptureStore::open(&path, StoreMode::Truncate).unwrap_err();
        assert!(matches!(err, TransportError::Open { .. }));
    }
}
