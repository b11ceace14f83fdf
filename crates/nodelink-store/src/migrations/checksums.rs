//! Migration checksums
//!
//! A migration's checksum is recorded when it is applied and compared on
//! every later start, so an edited migration file is caught instead of
//! silently diverging from databases that ran the old text.

use sha2::{Digest, Sha256};

/// SHA-256 (hex) of migration SQL with line endings normalized to `\n`
pub fn compute_checksum(sql: &str) -> String {
    let mut hasher = Sha256::new();
    for line in sql.lines() {
        hasher.update(line.trim_end().as_bytes());
        hasher.update(b"\n");
    }
    hex::encode(hasher.finalize())
}
