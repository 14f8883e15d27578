//! RAR archives written by RAR 1.50 up to 4.x, known as "RAR3" in
//! key-derivation parlance.
//!
//! Every header field sits at a fixed offset and the optional fields are
//! gated by flag bits, so the parser is a straight walk: archive header,
//! then file headers until an unknown tag or the end of the file. Archives
//! created with `-hp` encrypt the headers themselves and are resolved from
//! the known-plaintext block at the end of the file instead.

mod blocks;
mod candidate;
mod decode_file_name;
mod extract;

pub use blocks::*;
pub use candidate::*;
pub use extract::*;

/// Upper bound on a decoded filename, in UTF-16 units.
const NAME_MAX_SIZE: u16 = 1000;

/// Upper bound on the accumulated filename list attached to a record.
const FILE_NAMES_MAX_SIZE: usize = 0x2000;
