//! Inspection of password-protected RAR archives.
//!
//! `rarhash` parses the RAR 3.x and 5.x container formats just deep enough
//! to pull out what an offline password-recovery engine needs: the
//! key-derivation salt, the iteration exponent, password-check values, the
//! encryption IV and, for RAR3 per-file encryption, the candidate
//! ciphertext itself. Results are printed as single-line hash records. It
//! never decrypts or decompresses anything.

#[macro_use]
mod macros;
mod archive;
pub mod error;
pub mod hash_record;
pub mod rar15;
pub mod rar50;
mod read;
mod signature;
mod time_conv;

pub use archive::scan;
pub use hash_record::HashRecord;
pub use signature::Signature;
