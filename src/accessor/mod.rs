//! Disk accessor for the staging location
//!
//! Translates asset-tracking resource identifiers to paths beneath the
//! share root and surfaces one extra signal over plain file I/O: when a
//! written file is closed, the `(path, resource identifier)` pair goes out
//! on the event bus. No transfer is initiated here.

use crate::infrastructure::events::{Event, EventBus};
use std::fmt;
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

/// Accessor errors
#[derive(Debug, thiserror::Error)]
pub enum AccessorError {
    #[error("cannot open a directory: {0}")]
    InvalidResource(String),
    #[error("resource identifier escapes the share root: {0}")]
    Traversal(String),
    #[error("i/o error on {resource}: {source}")]
    Io {
        resource: String,
        source: io::Error,
    },
}

/// How a resource is opened
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenMode {
    Read,
    Write,
}

/// Filesystem accessor bound to one staging location
pub struct StagingAccessor {
    location_id: Uuid,
    prefix: PathBuf,
    events: Arc<EventBus>,
}

impl StagingAccessor {
    pub fn new(location_id: Uuid, prefix: PathBuf, events: Arc<EventBus>) -> Self {
        Self {
            location_id,
            prefix,
            events,
        }
    }

    pub fn location_id(&self) -> Uuid {
        self.location_id
    }

    /// Translate a resource identifier to its local filesystem path.
    ///
    /// Identifiers are `/`-separated and relative; anything absolute or
    /// containing parent components is rejected.
    pub fn filesystem_path(&self, resource_identifier: &str) -> Result<PathBuf, AccessorError> {
        let relative = Path::new(resource_identifier);
        for component in relative.components() {
            match component {
                Component::Normal(_) => {}
                _ => return Err(AccessorError::Traversal(resource_identifier.to_string())),
            }
        }
        Ok(self.prefix.join(relative))
    }

    /// Open a resource for reading or writing.
    ///
    /// Fails with [`AccessorError::InvalidResource`] when the identifier
    /// denotes a directory. Write mode creates missing parent directories.
    pub fn open(
        &self,
        resource_identifier: &str,
        mode: OpenMode,
    ) -> Result<StagingFile, AccessorError> {
        let path = self.filesystem_path(resource_identifier)?;

        if path.is_dir() {
            return Err(AccessorError::InvalidResource(
                resource_identifier.to_string(),
            ));
        }

        let io_err = |source| AccessorError::Io {
            resource: resource_identifier.to_string(),
            source,
        };

        let file = match mode {
            OpenMode::Read => std::fs::File::open(&path).map_err(io_err)?,
            OpenMode::Write => {
                if let Some(parent) = path.parent() {
                    std::fs::create_dir_all(parent).map_err(io_err)?;
                }
                std::fs::File::create(&path).map_err(io_err)?
            }
        };

        Ok(StagingFile {
            file,
            path,
            resource_identifier: resource_identifier.to_string(),
            mode,
            notified: false,
            events: self.events.clone(),
        })
    }
}

/// An open staging file. Closing (or dropping) a file opened for writing
/// emits the write-completion signal exactly once.
pub struct StagingFile {
    file: std::fs::File,
    path: PathBuf,
    resource_identifier: String,
    mode: OpenMode,
    notified: bool,
    events: Arc<EventBus>,
}

impl StagingFile {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn resource_identifier(&self) -> &str {
        &self.resource_identifier
    }

    /// Flush and close the file, emitting the write-completion signal for
    /// files opened in write mode.
    pub fn close(mut self) -> io::Result<()> {
        if self.mode == OpenMode::Write {
            self.file.sync_all()?;
        }
        self.notify_written();
        Ok(())
    }

    fn notify_written(&mut self) {
        if self.mode != OpenMode::Write || self.notified {
            return;
        }
        self.notified = true;

        info!(
            path = %self.path.display(),
            resource = %self.resource_identifier,
            "File written to staging location"
        );
        self.events.emit(Event::FileWritten {
            path: self.path.clone(),
            resource_identifier: self.resource_identifier.clone(),
        });
    }
}

impl fmt::Debug for StagingFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StagingFile")
            .field("path", &self.path)
            .field("resource_identifier", &self.resource_identifier)
            .field("mode", &self.mode)
            .field("notified", &self.notified)
            .finish_non_exhaustive()
    }
}

impl Drop for StagingFile {
    fn drop(&mut self) {
        // A dropped writable file still counts as a completed write.
        self.notify_written();
    }
}

impl Read for StagingFile {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.file.read(buf)
    }
}

impl Write for StagingFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.file.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file.flush()
    }
}

impl Seek for StagingFile {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.file.seek(pos)
    }
}
