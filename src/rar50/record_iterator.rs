use std::io;

use crate::{
    error::{Error, RarResult},
    read::*,
};

/// A TLV record from a block's extra area: the type tag and its payload.
pub struct ExtraRecord {
    pub record_type: u64,
    pub data: io::Cursor<Vec<u8>>,
}

/// Iterates the TLV records of an extra area, bounded by the size the
/// block header declared for it.
pub struct RecordIterator<'a, R: io::Read + io::Seek> {
    reader: &'a mut R,
    end_offset: u64,
    next_offset: u64,
}

impl<'a, R: io::Read + io::Seek> RecordIterator<'a, R> {
    /// Width cap on the record-size vint; larger records than this cannot
    /// fit in a header anyway.
    const SIZE_VINT_MAX_WIDTH: u8 = 3;

    pub fn new(reader: &'a mut R, extra_area_size: u64) -> RarResult<Self> {
        let offset = reader.stream_position()?;

        Ok(Self {
            reader,
            end_offset: offset + extra_area_size,
            next_offset: offset,
        })
    }

    fn read_record(&mut self) -> RarResult<ExtraRecord> {
        self.reader.seek(io::SeekFrom::Start(self.next_offset))?;

        let (record_size, size_width) = read_vint(self.reader)?;
        if size_width > Self::SIZE_VINT_MAX_WIDTH {
            return Err(Error::CorruptHeader);
        }

        let (record_type, type_width) = read_vint(self.reader)?;

        // The declared size covers the type tag and the payload. A record
        // claiming less than its own tag, or extending past the declared
        // extra area, means the header lied about one of the two.
        let payload_size = record_size
            .checked_sub(type_width as u64)
            .ok_or(Error::CorruptHeader)?;

        self.next_offset += record_size + size_width as u64;
        if self.next_offset > self.end_offset {
            return Err(Error::CorruptHeader);
        }

        let data = read_vec(self.reader, payload_size as usize)?;

        Ok(ExtraRecord {
            record_type,
            data: io::Cursor::new(data),
        })
    }
}

impl<'a, R: io::Read + io::Seek> Iterator for RecordIterator<'a, R> {
    type Item = RarResult<ExtraRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next_offset >= self.end_offset {
            return None;
        }

        Some(self.read_record())
    }
}
