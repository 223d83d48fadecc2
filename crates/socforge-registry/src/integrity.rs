//! Content fingerprints for cache stamps.
//!
//! A core's fingerprint is the SHA-256 over its descriptor bytes and the
//! path and contents of every file it references, in declared order.

use std::path::Path;

use sha2::{Digest, Sha256};

use crate::descriptor::CoreDescriptor;

/// A content hash (SHA-256 hex digest).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContentHash(pub String);

impl ContentHash {
    /// Get the hex string representation.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ContentHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Encode bytes as lowercase hex string.
fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

/// Incremental hasher over labelled files.
struct Fingerprinter {
    hasher: Sha256,
}

impl Fingerprinter {
    fn new() -> Self {
        Fingerprinter {
            hasher: Sha256::new(),
        }
    }

    /// Feed a file's path and contents. Unreadable files contribute a
    /// marker so that deleting a source changes the fingerprint.
    fn add_file(&mut self, path: &Path) {
        self.hasher.update(path.to_string_lossy().as_bytes());
        self.hasher.update([0u8]);
        match std::fs::read(path) {
            Ok(data) => {
                self.hasher.update((data.len() as u64).to_le_bytes());
                self.hasher.update(&data);
            }
            Err(_) => self.hasher.update(b"<missing>"),
        }
    }

    fn finish(self) -> ContentHash {
        ContentHash(hex_encode(&self.hasher.finalize()))
    }
}

/// Fingerprint a core's descriptor and every file it references.
pub fn fingerprint_core(core: &CoreDescriptor) -> ContentHash {
    let mut fp = Fingerprinter::new();
    fp.add_file(&core.path);
    for entry in core.all_files() {
        fp.add_file(&core.resolve_path(&entry.path));
    }
    fp.finish()
}
