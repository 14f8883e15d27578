//! Assembly of the textual hash records consumed by password-recovery
//! engines.

use std::fmt::Write as _;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;

/// One attackable unit found in an archive: everything a recovery tool
/// needs to mount an offline attack against it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HashRecord {
    /// RAR3 archive with encrypted headers (`-hp`). The end-of-archive
    /// block has fixed plaintext, so the 16 ciphertext bytes at the tail of
    /// the file work as a known-plaintext oracle.
    Rar3EncryptedHeaders {
        salt: [u8; 8],
        known_plain_block: [u8; 16],
    },

    /// RAR3 archive with per-file encryption (`-p`): the selected candidate
    /// entry, ciphertext inlined.
    Rar3File {
        salt: [u8; 8],
        crc32: u32,
        packed_size: u64,
        unpacked_size: u64,
        method: u8,
        ciphertext: Vec<u8>,
        /// Space-separated names of every file entry seen while scanning.
        file_names: String,
    },

    /// RAR5 encryption parameters, from a crypt block or from a file
    /// block's encryption record.
    Rar5 {
        salt: [u8; 16],
        kdf_log2_count: u8,
        iv: [u8; 16],
        check_value: [u8; 12],
    },
}

impl HashRecord {
    /// Render the single-line record. `base` is the archive's basename and
    /// `path` the path as given on the command line.
    ///
    /// The line is assembled fully in memory so the caller can write it
    /// atomically.
    pub fn format(&self, base: &str, path: &str) -> String {
        match self {
            Self::Rar3EncryptedHeaders {
                salt,
                known_plain_block,
            } => {
                format!(
                    "{}:$RAR3$*0*{}*{}:0::::{}",
                    base,
                    hex::encode(salt),
                    hex::encode(known_plain_block),
                    path,
                )
            }

            Self::Rar3File {
                salt,
                crc32,
                packed_size,
                unpacked_size,
                method,
                ciphertext,
                file_names,
            } => {
                let mut line = format!(
                    "{}:$RAR3$*1*{}*{:08x}*{}*{}*1*",
                    base,
                    hex::encode(salt),
                    crc32,
                    packed_size,
                    unpacked_size,
                );
                line.push_str(&hex::encode(ciphertext));
                let _ = write!(line, "*{:02x}:1::{}", method, file_names);
                line
            }

            Self::Rar5 {
                salt,
                kdf_log2_count,
                iv,
                check_value,
            } => {
                format!(
                    "{}:$rar5$16${}${}${}$12${}",
                    base,
                    BASE64.encode(salt),
                    kdf_log2_count,
                    BASE64.encode(iv),
                    BASE64.encode(check_value),
                )
            }
        }
    }
}
