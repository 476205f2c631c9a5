//! # filedrop core
//!
//! The storage core behind filedrop: uploads are written under generated,
//! collision-resistant names inside a single validated root directory, and
//! read back by name without ever resolving to a path outside that root.
//!
//! ## Features
//!
//! - Storage root validated once at startup (exists, directory, readable, writable)
//! - Names of the form `{millis}-{random}.{original}`
//! - Atomic, synced writes committed with a no-clobber rename
//! - Lexical and canonical containment checks on every retrieval
//! - BLAKE3 digest and size receipts for stored payloads
//!
//! The filesystem is the only index; there is no database and nothing is
//! ever deleted.
//!
//! ## Example
//!
//! ```no_run
//! use filedrop_core::StorageCore;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let store = StorageCore::open("/srv/filedrop")?;
//!
//! let stored = store.store("cat.png", b"...png bytes...")?;
//! println!("stored as {} ({} bytes)", stored.name, stored.size);
//!
//! let file = store.retrieve(stored.name.as_str())?;
//! println!("{} is {}", file.path.display(), file.content_type);
//! # Ok(())
//! # }
//! ```

mod digest;
mod error;
mod name;
mod path;
mod store;

pub use digest::Digest;
pub use error::{Error, Result};
pub use name::{NameGenerator, StorageName, sanitize_original_name};
pub use store::{
    DEFAULT_CONTENT_TYPE, ResolvedFile, StorageCore, StoredFile, TEMP_PREFIX, content_type_for,
};
