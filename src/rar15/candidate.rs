//! Selection of the best encrypted entry to attack.
//!
//! Shorter ciphertext makes password trials cheaper, but a very small
//! plaintext lets the verification CRC match by coincidence, so the two
//! pulls are balanced with method-aware size thresholds.

use tracing::{debug, warn};

use crate::hash_record::HashRecord;

/// Compression method byte for uncompressed storage.
pub const METHOD_STORED: u8 = 0x30;

#[derive(Debug, Clone)]
/// One encrypted, non-solid, non-directory file entry.
pub struct Candidate {
    pub packed_size: u64,
    pub unpacked_size: u64,

    /// Compression method: 0x30 = stored up to 0x35 = best.
    pub method: u8,

    pub crc32: u32,
    pub salt: [u8; 8],
    pub file_name: String,

    /// Offset of the entry's ciphertext in the archive.
    pub data_offset: u64,

    /// Buffered ciphertext; filled in once the candidate is admitted.
    pub ciphertext: Vec<u8>,
}

impl Candidate {
    /// Smallest unpacked size at which a correct password guess is sure to
    /// produce a checkable plaintext prefix for this entry's method.
    fn safe_unpacked_size(&self) -> u64 {
        if self.method > METHOD_STORED {
            4
        } else {
            1
        }
    }
}

#[derive(Debug, Default)]
/// Keeps the preferred candidate as entries arrive in archive order.
pub struct CandidateSelector {
    best: Option<Candidate>,
}

impl CandidateSelector {
    /// Unpacked sizes below this draw a warning for compressed entries.
    const WARN_UNPACKED_SIZE: u64 = 5;

    /// Unpacked-size bound used to break packed-size ties.
    const TIE_UNPACKED_SIZE: u64 = 8;

    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `candidate` should replace the current best. Called before
    /// the caller pays for buffering the entry's ciphertext.
    pub fn admits(&self, candidate: &Candidate) -> bool {
        let Some(best) = &self.best else {
            return true;
        };

        if candidate.packed_size < best.packed_size {
            // A smaller ciphertext wins, unless it would trade a safely
            // decodable plaintext for one below the admission threshold.
            let best_is_safe = best.unpacked_size >= best.safe_unpacked_size();
            !(best_is_safe && candidate.unpacked_size < candidate.safe_unpacked_size())
        } else if candidate.packed_size == best.packed_size {
            candidate.unpacked_size >= Self::TIE_UNPACKED_SIZE
                && best.unpacked_size < Self::TIE_UNPACKED_SIZE
        } else {
            false
        }
    }

    /// Install a new best candidate, dropping the previous one wholesale.
    pub fn replace(&mut self, candidate: Candidate) {
        debug!(
            name = %candidate.file_name,
            packed_size = candidate.packed_size,
            unpacked_size = candidate.unpacked_size,
            "new best candidate"
        );

        self.best = Some(candidate);
    }

    /// Consume the selector at end of archive and build the record for the
    /// chosen candidate, if any.
    ///
    /// A candidate whose plaintext is small enough to inflate false
    /// positives draws an advisory; the record is still produced.
    pub fn finish(self, file_names: String) -> Option<HashRecord> {
        let best = self.best?;

        let warn_threshold = if best.method > METHOD_STORED {
            Self::WARN_UNPACKED_SIZE
        } else {
            1
        };

        if best.unpacked_size < warn_threshold {
            warn!(
                unpacked_size = best.unpacked_size,
                "selected candidate has a very small plaintext; expect false positives"
            );
        }

        Some(HashRecord::Rar3File {
            salt: best.salt,
            crc32: best.crc32,
            packed_size: best.packed_size,
            unpacked_size: best.unpacked_size,
            method: best.method,
            ciphertext: best.ciphertext,
            file_names,
        })
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    fn candidate(packed_size: u64, unpacked_size: u64, method: u8) -> Candidate {
        Candidate {
            packed_size,
            unpacked_size,
            method,
            crc32: 0,
            salt: [0; 8],
            file_name: String::new(),
            data_offset: 0,
            ciphertext: vec![],
        }
    }

    #[test]
    fn empty_selector_admits_anything() {
        let selector = CandidateSelector::new();
        assert!(selector.admits(&candidate(u64::MAX, 0, 0x35)));
    }

    #[rstest]
    // Smaller packed size wins outright when the incumbent is not safe.
    #[case((1000, 2, 0x35), (500, 0, 0x35), true)]
    // Smaller packed size wins when the challenger is itself safe.
    #[case((1000, 100, 0x35), (500, 4, 0x35), true)]
    #[case((1000, 100, 0x30), (500, 1, 0x30), true)]
    // Safe incumbent suppresses an unsafe smaller challenger.
    #[case((1000, 4, 0x35), (500, 3, 0x35), false)]
    #[case((1000, 1, 0x30), (500, 0, 0x30), false)]
    // Thresholds follow each entry's own method: a stored incumbent with a
    // single plaintext byte is safe, and a compressed challenger needs 4.
    #[case((1000, 1, 0x30), (500, 3, 0x35), false)]
    #[case((1000, 1, 0x30), (500, 4, 0x35), true)]
    // Packed-size ties prefer an unpacked size of at least 8.
    #[case((1000, 5, 0x30), (1000, 20, 0x30), true)]
    #[case((1000, 20, 0x30), (1000, 5, 0x30), false)]
    // Tied candidates on the same side of 8 keep the incumbent.
    #[case((1000, 20, 0x30), (1000, 30, 0x30), false)]
    #[case((1000, 5, 0x30), (1000, 6, 0x30), false)]
    // A larger packed size never wins.
    #[case((1000, 5, 0x30), (1001, 100, 0x30), false)]
    fn admission_policy(
        #[case] incumbent: (u64, u64, u8),
        #[case] challenger: (u64, u64, u8),
        #[case] admitted: bool,
    ) {
        let mut selector = CandidateSelector::new();
        selector.replace(candidate(incumbent.0, incumbent.1, incumbent.2));

        assert_eq!(
            selector.admits(&candidate(challenger.0, challenger.1, challenger.2)),
            admitted
        );
    }

    #[test]
    fn finish_without_candidates_is_empty() {
        assert!(CandidateSelector::new().finish(String::new()).is_none());
    }

    #[test]
    fn finish_builds_the_record_from_the_best_candidate() {
        let mut selector = CandidateSelector::new();
        let mut chosen = candidate(16, 20, 0x30);
        chosen.salt = [7; 8];
        chosen.crc32 = 0x1234;
        chosen.ciphertext = vec![0xee; 16];
        selector.replace(chosen);

        let record = selector.finish("a b".into()).unwrap();

        assert_eq!(
            record,
            HashRecord::Rar3File {
                salt: [7; 8],
                crc32: 0x1234,
                packed_size: 16,
                unpacked_size: 20,
                method: 0x30,
                ciphertext: vec![0xee; 16],
                file_names: "a b".into(),
            }
        );
    }
}
