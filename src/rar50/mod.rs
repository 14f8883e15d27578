//! RAR archives written by RAR 5.0 and later.
//!
//! Headers are variable-length: vint-sized blocks carrying a type tag,
//! flag-gated size fields and an optional TLV "extra" area at the tail of
//! the header. Encryption parameters live either in a dedicated crypt
//! block (encrypted headers) or in a per-entry extra record.

mod blocks;
mod extract;
mod record_iterator;

pub use blocks::*;
pub use extract::*;
pub use record_iterator::*;

/// Upper bound on a stored path.
const MAX_PATH_SIZE: u64 = 0x10000;
