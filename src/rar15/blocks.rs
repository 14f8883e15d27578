use std::io;

use crate::{
    error::{Error, RarResult},
    read::*,
    time_conv,
};

use super::decode_file_name::decode_file_name;

#[derive(Debug)]
/// Archive header: 13 bytes right after the marker.
pub struct ArchiveHeader {
    /// Archive-wide flags.
    pub flags: ArchiveFlags,

    /// Size of the header, including any trailing comment region.
    pub header_size: u16,
}

flags! {
    /// [`ArchiveHeader`] flags.
    pub struct ArchiveFlags(u16) {
        /// Archive spans multiple volumes.
        pub is_volume = 0x0001;

        /// Archive uses solid compression.
        pub is_solid = 0x0008;

        /// Every header after this one is encrypted (`-hp` mode).
        pub headers_encrypted = 0x0080;
    }
}

impl ArchiveHeader {
    /// Size of the fixed part of the header.
    pub const SIZE: u16 = 13;

    /// Bytes consumed before the reserved region: CRC, tag, flags, size.
    const PREAMBLE_SIZE: u16 = 7;

    const TAG: u8 = 0x73;

    /// Read the archive header and leave the stream positioned after it,
    /// past any comment region it declares.
    pub fn read<R: io::Read + io::Seek>(reader: &mut R) -> RarResult<Self> {
        let _header_crc16 = read_u16(reader)?;

        let tag = read_u8(reader)?;
        if tag != Self::TAG {
            return Err(Error::CorruptHeader);
        }

        let flags = ArchiveFlags::new(read_u16(reader)?);

        let header_size = read_u16(reader)?;
        if header_size < Self::SIZE {
            return Err(Error::CorruptHeader);
        }

        // 6 reserved bytes, then an opaque comment region when the header
        // declares itself longer than the fixed part.
        reader.seek(io::SeekFrom::Current((header_size - Self::PREAMBLE_SIZE) as i64))?;

        Ok(ArchiveHeader { flags, header_size })
    }
}

#[derive(Debug)]
/// A header encountered during the file-header walk.
pub enum Block {
    /// A file or directory entry.
    File(FileHeader),

    /// Service header (old-style comments and friends); tolerated and
    /// skipped by its declared header size.
    Service { offset: u64, header_size: u16 },

    /// Any other tag ends the walk.
    Terminal { tag: u8 },
}

impl Block {
    const FILE: u8 = 0x74;
    const SERVICE: u8 = 0x7a;

    /// Bytes consumed by the common preamble: CRC, tag, flags, size.
    const PREAMBLE_SIZE: u16 = 7;

    pub fn read<R: io::Read + io::Seek>(reader: &mut R) -> RarResult<Self> {
        let offset = reader.stream_position()?;

        let _header_crc16 = read_u16(reader)?;
        let tag = read_u8(reader)?;
        let flags = read_u16(reader)?;
        let header_size = read_u16(reader)?;

        match tag {
            Self::FILE => {
                let header = FileHeader::read(reader, offset, flags, header_size)?;
                Ok(Self::File(header))
            }
            Self::SERVICE => {
                if header_size < Self::PREAMBLE_SIZE {
                    return Err(Error::CorruptHeader);
                }

                Ok(Self::Service {
                    offset,
                    header_size,
                })
            }
            _ => Ok(Self::Terminal { tag }),
        }
    }
}

int_enum! {
    /// OS of the host system used to add the entry to the archive.
    pub enum HostOs : u8 {
        MsDos = 0,
        Os2 = 1,
        Win32 = 2,
        Unix = 3,
        MacOs = 4,
        BeOs = 5,
    }
}

flags! {
    /// [`FileHeader`] flags.
    pub struct FileFlags(u16) {
        /// File data is encrypted.
        pub is_encrypted = 0x0004;

        /// Entry depends on dictionary state built by earlier entries and
        /// cannot be decoded in isolation.
        pub is_solid = 0x0010;

        /// Two extra size words follow the fixed header.
        pub has_large_size = 0x0100;

        /// Filename carries the packed OEM+UTF-16 encoding.
        pub has_unicode_filename = 0x0200;

        /// An 8-byte key-derivation salt follows the filename.
        pub has_salt = 0x0400;

        /// Extended timestamps trail the variable fields.
        pub has_extended_time = 0x1000;

        /// Long-block marker. Set on every file header written by a real
        /// packer; its absence means we lost sync.
        pub is_long_block = 0x8000;
    }
}

impl FileFlags {
    const DICT_MASK: u16 = 0x00e0;
    const DICT_SHIFT: u16 = 5;
    const DICT_DIRECTORY: u16 = 7;

    /// The dictionary-size bits are all ones for directory entries.
    pub fn is_directory(&self) -> bool {
        (self.bits() & Self::DICT_MASK) >> Self::DICT_SHIFT == Self::DICT_DIRECTORY
    }
}

#[derive(Debug)]
/// A file or directory entry: 32 fixed bytes, then flag-gated variable
/// fields.
pub struct FileHeader {
    /// Offset of this header from the start of the file.
    pub offset: u64,

    /// File header flags.
    pub flags: FileFlags,

    /// Size of the header; the entry's data area begins right after.
    pub header_size: u16,

    /// Size of the (possibly encrypted) data area.
    pub packed_size: u64,

    /// Size of the file after decompression.
    pub unpacked_size: u64,

    /// OS used to add this file to the archive.
    pub host_os: HostOs,

    /// CRC32 of the unpacked file.
    pub crc32: u32,

    /// Modification time of the file, DOS-encoded.
    pub modification_time: Result<time::PrimitiveDateTime, u32>,

    /// Minimum format version needed to unpack the entry.
    pub unpack_version: u8,

    /// Compression method: 0x30 = stored up to 0x35 = best.
    pub method: u8,

    /// Decoded filename.
    pub file_name: String,

    /// Key-derivation salt for encrypted entries.
    pub salt: Option<[u8; Self::SALT_SIZE]>,
}

impl FileHeader {
    /// Size of the fixed part of the header.
    pub const SIZE: u16 = 32;

    const SALT_SIZE: usize = 8;

    fn read<R: io::Read + io::Seek>(
        reader: &mut R,
        offset: u64,
        flags: u16,
        header_size: u16,
    ) -> RarResult<Self> {
        let flags = FileFlags::new(flags);

        if !flags.is_long_block() {
            return Err(Error::CorruptHeader);
        }

        let low_packed_size = read_u32(reader)? as u64;
        let low_unpacked_size = read_u32(reader)? as u64;
        let host_os = read_u8(reader)?.into();
        let crc32 = read_u32(reader)?;

        let dos_time = read_u32(reader)?;
        let modification_time = time_conv::parse_dos_datetime(dos_time).map_err(|_| dos_time);

        let unpack_version = read_u8(reader)?;
        let method = read_u8(reader)?;
        let name_size = read_u16(reader)? as usize;
        let _attributes = read_u32(reader)?;

        let (packed_size, unpacked_size, size_extension) = if flags.has_large_size() {
            let high_packed_size = read_u32(reader)? as u64;
            let high_unpacked_size = read_u32(reader)? as u64;

            (
                low_packed_size | high_packed_size << 32,
                low_unpacked_size | high_unpacked_size << 32,
                8u64,
            )
        } else {
            (low_packed_size, low_unpacked_size, 0)
        };

        let salt_size = if flags.has_salt() {
            Self::SALT_SIZE as u64
        } else {
            0
        };

        // Everything the flags promise must fit inside the declared header.
        let variable_size = name_size as u64 + size_extension + salt_size;
        if (header_size as u64) < Self::SIZE as u64 + variable_size {
            return Err(Error::CorruptHeader);
        }

        let raw_name = read_vec(reader, name_size)?;
        let file_name = if flags.has_unicode_filename() {
            decode_file_name(&raw_name)
        } else {
            String::from_utf8_lossy(&raw_name).into_owned()
        };

        let salt = if flags.has_salt() {
            Some(read_const_bytes(reader)?)
        } else {
            None
        };

        // Extended timestamps and anything else the header declares are
        // bounded by header_size; skip straight to the end of the header.
        reader.seek(io::SeekFrom::Start(offset + header_size as u64))?;

        Ok(FileHeader {
            offset,
            flags,
            header_size,
            packed_size,
            unpacked_size,
            host_os,
            crc32,
            modification_time,
            unpack_version,
            method,
            file_name,
            salt,
        })
    }

    /// Offset of the entry's (possibly encrypted) data area.
    pub fn data_offset(&self) -> u64 {
        self.offset + self.header_size as u64
    }

    /// Offset of the header following this entry's data area. Saturates on
    /// hostile packed sizes so callers fall off the end of the walk instead
    /// of wrapping around.
    pub fn next_header_offset(&self) -> u64 {
        self.data_offset().saturating_add(self.packed_size)
    }
}
