use std::io;

use aho_corasick::AhoCorasick;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// File signatures or "magic numbers" of the RAR family of file formats.
pub enum Signature {
    /// RAR archive written by RAR 1.4x. Recognized only so it can be
    /// reported as unsupported instead of "not an archive".
    Rar14,

    /// RAR archive written by RAR 1.5 to 4.x, the format the key-derivation
    /// world calls "RAR3".
    Rar15,

    /// RAR archive written by RAR 5+.
    Rar50,
}

impl Signature {
    const RAR14: &'static [u8] = b"RE\x7e\x5e";
    const RAR15: &'static [u8] = b"Rar!\x1a\x07\x00";
    const RAR50: &'static [u8] = b"Rar!\x1a\x07\x01\x00";

    /// Byte size of the signature.
    pub const fn size(self) -> u64 {
        match self {
            Self::Rar14 => Self::RAR14.len() as u64,
            Self::Rar15 => Self::RAR15.len() as u64,
            Self::Rar50 => Self::RAR50.len() as u64,
        }
    }

    /// The maximum size of an SFX binary embedded before the archive
    /// signature, including the signature itself.
    ///
    /// Self-extracting archives prepend a PE executable stub, so the
    /// signature can sit far past offset 0.
    pub const MAX_SFX_SIZE: u64 = 0x200000;

    /// Search the stream for a RAR signature within the first
    /// [`Signature::MAX_SFX_SIZE`] bytes and return the format version and
    /// the offset of the signature.
    ///
    /// The first block of the archive starts at `offset + signature.size()`.
    ///
    /// The streaming Aho-Corasick search keeps partial matches alive across
    /// its internal read boundaries, so a signature straddling two reads of
    /// the underlying file is still found. This is what makes the SFX scan
    /// safe without any explicit window-overlap bookkeeping.
    pub fn search_stream<R: io::Read>(reader: R) -> io::Result<Option<(Self, u64)>> {
        let patterns = [Self::RAR14, Self::RAR15, Self::RAR50];

        let Ok(ac) = AhoCorasick::new(patterns) else {
            unreachable!("signature patterns are valid")
        };

        // Avoid scanning the whole file when there is no signature within
        // MAX_SFX_SIZE.
        let bounded_reader = &mut reader.take(Self::MAX_SFX_SIZE);

        match ac.stream_find_iter(bounded_reader).next() {
            None => Ok(None),
            Some(Err(e)) => Err(e),
            Some(Ok(m)) => {
                let signature = match m.pattern().as_usize() {
                    0 => Self::Rar14,
                    1 => Self::Rar15,
                    2 => Self::Rar50,
                    i => unreachable!("invalid Aho-Corasick pattern ID: {i}"),
                };

                Ok(Some((signature, m.start() as u64)))
            }
        }
    }
}
