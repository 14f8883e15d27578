use std::io;

use crate::{
    error::{Error, RarResult},
    hash_record::HashRecord,
    rar15, rar50,
    signature::Signature,
};

/// Classify the stream and extract every hash record it yields.
///
/// The reader should be positioned at the start of the file. A RAR3
/// archive produces at most one record; a RAR5 archive produces one per
/// attackable unit, in archive order.
pub fn scan<R: io::Read + io::Seek>(reader: &mut R, file_size: u64) -> RarResult<Vec<HashRecord>> {
    let Some((signature, offset)) = Signature::search_stream(&mut *reader)? else {
        return Err(Error::NotArchive);
    };

    let payload_offset = offset + signature.size();

    match signature {
        Signature::Rar14 => Err(Error::Unsupported("RAR 1.4 archives predate encryption")),
        Signature::Rar15 => {
            let record = rar15::extract(reader, payload_offset, file_size)?;
            Ok(record.into_iter().collect())
        }
        Signature::Rar50 => rar50::extract(reader, payload_offset, file_size),
    }
}
