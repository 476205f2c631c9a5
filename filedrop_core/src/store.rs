//! Storage root management and file I/O.

use crate::digest::{Digest, HashingWriter};
use crate::error::{Error, Result};
use crate::name::{NameGenerator, StorageName};
use crate::path;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Prefix of in-flight upload files. Generated names never start with it.
pub const TEMP_PREFIX: &str = ".upload-";

/// Attempts at committing under a fresh name before giving up.
const MAX_NAME_ATTEMPTS: usize = 4;

/// Content type used when the extension is unknown.
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Receipt for a successfully stored payload.
#[derive(Debug, Clone, Serialize)]
pub struct StoredFile {
    /// Name to retrieve the file by.
    pub name: StorageName,
    /// Payload size in bytes.
    pub size: u64,
    /// BLAKE3 digest of the payload.
    pub digest: Digest,
    /// When the name was generated.
    pub stored_at: DateTime<Utc>,
}

/// A stored file resolved for streaming.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedFile {
    /// Canonical path, guaranteed to be under the storage root at resolution time.
    pub path: PathBuf,
    /// Content type guessed from the requested name's extension.
    pub content_type: String,
    /// File size at resolution time.
    pub size: u64,
}

/// The storage core: a validated root directory plus store/retrieve.
///
/// Holds no mutable state, so a single instance can be shared between
/// request handlers behind an `Arc`.
#[derive(Debug)]
pub struct StorageCore {
    root: PathBuf,
    names: NameGenerator,
}

impl StorageCore {
    /// Open a storage root.
    ///
    /// Validates, in order, that the path exists, is a directory, is readable
    /// and is writable. The root is canonicalized so later containment
    /// checks compare like with like.
    pub fn open<P: AsRef<Path>>(root: P) -> Result<Self> {
        let root = root.as_ref();

        let metadata = match fs::metadata(root) {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(Error::invalid_root(root, "path does not exist"));
            }
            Err(e) => {
                return Err(Error::invalid_root(
                    root,
                    format!("path is not accessible: {}", e),
                ));
            }
        };

        if !metadata.is_dir() {
            return Err(Error::invalid_root(root, "path is not a directory"));
        }

        fs::read_dir(root).map_err(|e| {
            Error::invalid_root(root, format!("directory is not readable: {}", e))
        })?;

        // Probe with a real file; mode bits alone say nothing about ACLs or
        // read-only mounts. The probe is removed on drop.
        tempfile::Builder::new()
            .prefix(TEMP_PREFIX)
            .tempfile_in(root)
            .map_err(|e| Error::invalid_root(root, format!("directory is not writable: {}", e)))?;

        let canonical = fs::canonicalize(root).map_err(|e| {
            Error::invalid_root(root, format!("cannot canonicalize path: {}", e))
        })?;

        info!(root = %canonical.display(), "storage root validated");

        Ok(Self {
            root: canonical,
            names: NameGenerator::new(),
        })
    }

    /// Get the canonical root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Store a payload under a freshly generated name.
    pub fn store(&self, original_name: &str, payload: &[u8]) -> Result<StoredFile> {
        self.store_reader(original_name, payload)
    }

    /// Store a payload streamed from a reader.
    ///
    /// The payload goes to a hidden temporary file first, is synced, then
    /// committed with a no-clobber rename. A name is only returned once the
    /// commit succeeded; on failure the temporary file is removed.
    pub fn store_reader<R: Read>(&self, original_name: &str, mut reader: R) -> Result<StoredFile> {
        let mut stored_at = Utc::now();
        let mut name = self.names.generate_at(stored_at, original_name);

        let temp_file = tempfile::Builder::new()
            .prefix(TEMP_PREFIX)
            .tempfile_in(&self.root)
            .map_err(|e| Error::write(name.as_str(), e))?;

        let mut writer = HashingWriter::new(temp_file);
        io::copy(&mut reader, &mut writer).map_err(|e| Error::write(name.as_str(), e))?;
        let (mut temp_file, digest, size) = writer.finish();

        temp_file
            .flush()
            .and_then(|_| temp_file.as_file().sync_all())
            .map_err(|e| Error::write(name.as_str(), e))?;

        let mut attempt = 1;
        loop {
            let target = self.root.join(name.as_str());
            match temp_file.persist_noclobber(&target) {
                Ok(_) => {
                    debug!(name = %name, size, "stored file");
                    return Ok(StoredFile {
                        name,
                        size,
                        digest,
                        stored_at,
                    });
                }
                Err(err)
                    if err.error.kind() == io::ErrorKind::AlreadyExists
                        && attempt < MAX_NAME_ATTEMPTS =>
                {
                    warn!(name = %name, attempt, "storage name collision, regenerating");
                    attempt += 1;
                    temp_file = err.file;
                    stored_at = Utc::now();
                    name = self.names.generate_at(stored_at, original_name);
                }
                Err(err) => return Err(Error::write(name.into_string(), err.error)),
            }
        }
    }

    /// Resolve a requested name to a stored file inside the root.
    ///
    /// The name is confined lexically before the filesystem is consulted, and
    /// the canonical result is checked again so symlinks cannot lead out of
    /// the root. Existence is only checked once containment holds.
    ///
    /// The file may still disappear between this call and the caller opening
    /// it; nothing here holds it open.
    pub fn retrieve(&self, requested: &str) -> Result<ResolvedFile> {
        if requested.is_empty() {
            return Err(Error::invalid_request("file name is empty"));
        }
        if requested.contains('\0') {
            return Err(Error::invalid_request("file name contains a NUL byte"));
        }

        let Some(candidate) = path::confine(&self.root, requested) else {
            warn!(requested, "rejected name resolving outside storage root");
            return Err(Error::path_traversal(requested));
        };

        // In-flight or abandoned uploads were never handed out under a name.
        if is_temp_file(&candidate) {
            return Err(Error::not_found(requested));
        }

        let resolved = match fs::canonicalize(&candidate) {
            Ok(resolved) => resolved,
            Err(e) if is_missing(&e) => return Err(Error::not_found(requested)),
            Err(e) => return Err(e.into()),
        };

        if !path::is_contained(&self.root, &resolved) {
            warn!(requested, "rejected link resolving outside storage root");
            return Err(Error::path_traversal(requested));
        }
        if is_temp_file(&resolved) {
            return Err(Error::not_found(requested));
        }

        let metadata = match fs::metadata(&resolved) {
            Ok(metadata) => metadata,
            Err(e) if is_missing(&e) => return Err(Error::not_found(requested)),
            Err(e) => return Err(e.into()),
        };
        if !metadata.is_file() {
            return Err(Error::not_found(requested));
        }

        let content_type = content_type_for(requested);
        debug!(requested, content_type = %content_type, "resolved file");

        Ok(ResolvedFile {
            path: resolved,
            content_type,
            size: metadata.len(),
        })
    }
}

/// Guess a content type from the name's extension.
pub fn content_type_for(name: &str) -> String {
    mime_guess::from_path(name)
        .first()
        .map(|mime| mime.essence_str().to_string())
        .unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string())
}

/// Lookup failures meaning no stored file can exist under the name.
fn is_missing(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::NotFound
            | io::ErrorKind::NotADirectory
            | io::ErrorKind::InvalidFilename
    )
}

fn is_temp_file(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name.starts_with(TEMP_PREFIX))
}
