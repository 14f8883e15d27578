use std::{fmt, io};

use sha2::{Digest, Sha256};

use crate::{
    error::{Error, RarResult},
    read::*,
    time_conv,
};

use super::{record_iterator::RecordIterator, MAX_PATH_SIZE};

/// Highest AES-256 KDF iteration exponent the format allows.
pub const KDF_LG2_COUNT_MAX: u8 = 24;

/// The only encryption version defined as of RAR 5.0 (AES-256).
const ENCRYPTION_VERSION_AES256: u64 = 0;

#[derive(Debug)]
pub struct Block {
    /// Offset of this block from the start of the file.
    pub offset: u64,

    /// Flags common to all block types.
    pub flags: CommonFlags,

    /// CRC32 hash of the header.
    pub header_crc32: u32,

    /// Full header footprint: CRC word, size vint and the declared size.
    pub header_size: u64,

    /// Size of the extra area at the tail of the header.
    pub extra_area_size: Option<u64>,

    /// Size of the data area following the header.
    pub data_size: Option<u64>,

    /// Specific type of this block.
    pub kind: BlockKind,
}

flags! {
    pub struct CommonFlags(u16) {
        /// Extra area is present at the end of the block header.
        pub has_extra_area = 0x0001;

        /// Data area follows the block header.
        pub has_data_area = 0x0002;

        /// Unknown blocks with this flag must be skipped when updating an
        /// archive.
        pub skip_if_unknown = 0x0004;

        /// Data area continues from the previous volume.
        pub split_before = 0x0008;

        /// Data area continues in the next volume.
        pub split_after = 0x0010;
    }
}

#[derive(Debug)]
pub enum BlockKind {
    Main(MainBlock),
    File(FileBlock),
    Service(FileBlock),
    Crypt(CryptBlock),
    EndArchive,
    Unknown(u64),
}

impl Block {
    const MAIN: u8 = 0x01;
    const FILE: u8 = 0x02;
    const SERVICE: u8 = 0x03;
    const CRYPT: u8 = 0x04;
    const ENDARC: u8 = 0x05;

    pub fn read<R: io::Read + io::Seek>(reader: &mut R) -> RarResult<Self> {
        let offset = reader.stream_position()?;

        let header_crc32 = read_u32(reader)?;

        let (declared_size, size_vint_width) = read_vint(reader)?;
        if declared_size == 0 {
            return Err(Error::CorruptHeader);
        }
        let header_size = declared_size + size_vint_width as u64 + 4;

        let header_type = read_u8(reader)?;

        let (flags, _) = read_vint(reader)?;
        let flags = CommonFlags::new(flags as u16);

        let extra_area_size = if flags.has_extra_area() {
            Some(read_vint(reader)?.0)
        } else {
            None
        };

        let data_size = if flags.has_data_area() {
            Some(read_vint(reader)?.0)
        } else {
            None
        };

        let header_end = offset + header_size;

        let kind = match header_type {
            Self::MAIN => BlockKind::Main(MainBlock::read(reader)?),
            Self::FILE => {
                BlockKind::File(FileBlock::read(reader, extra_area_size, header_end)?)
            }
            Self::SERVICE => {
                BlockKind::Service(FileBlock::read(reader, extra_area_size, header_end)?)
            }
            Self::CRYPT => BlockKind::Crypt(CryptBlock::read(reader)?),
            Self::ENDARC => BlockKind::EndArchive,
            tag => BlockKind::Unknown(tag as u64),
        };

        Ok(Block {
            offset,
            flags,
            header_crc32,
            header_size,
            extra_area_size,
            data_size,
            kind,
        })
    }

    /// Offset of the next block header. Saturates on hostile sizes so the
    /// walk falls off the end of the file instead of wrapping around.
    pub fn next_offset(&self) -> u64 {
        self.offset
            .saturating_add(self.header_size)
            .saturating_add(self.data_size.unwrap_or(0))
    }
}

#[derive(Debug)]
pub struct MainBlock {
    pub flags: MainBlockFlags,

    /// Number of this volume in a multi-volume set; absent on the first.
    pub volume_number: Option<u64>,
}

flags! {
    pub struct MainBlockFlags(u16) {
        /// Archive is part of a multi-volume set.
        pub is_volume = 0x0001;

        /// Volume number field is present.
        has_volume_number = 0x0002;

        /// Archive uses solid compression.
        pub is_solid = 0x0004;
    }
}

impl MainBlock {
    fn read<R: io::Read + io::Seek>(reader: &mut R) -> RarResult<Self> {
        let (flags, _) = read_vint(reader)?;
        let flags = MainBlockFlags::new(flags as u16);

        let volume_number = if flags.has_volume_number() {
            Some(read_vint(reader)?.0)
        } else {
            None
        };

        Ok(MainBlock {
            flags,
            volume_number,
        })
    }
}

#[derive(Debug)]
/// Parameters for whole-header encryption. Every block after this one is
/// AES-256 ciphertext.
pub struct CryptBlock {
    /// Binary logarithm of the KDF iteration count.
    pub kdf_log2_count: u8,

    pub salt: [u8; 16],

    /// Password check value, present only when stored and its trailing
    /// SHA-256 checksum matched.
    pub check_value: Option<[u8; 12]>,
}

flags! {
    struct CryptBlockFlags(u16) {
        has_password_check = 0x0001;
    }
}

impl CryptBlock {
    fn read<R: io::Read + io::Seek>(reader: &mut R) -> RarResult<Self> {
        let (version, _) = read_vint(reader)?;
        if version > ENCRYPTION_VERSION_AES256 {
            return Err(Error::Unsupported("unknown RAR5 encryption version"));
        }

        let (flags, _) = read_vint(reader)?;
        let flags = CryptBlockFlags::new(flags as u16);

        let kdf_log2_count = read_u8(reader)?;
        if kdf_log2_count > KDF_LG2_COUNT_MAX {
            return Err(Error::Unsupported("KDF iteration exponent too large"));
        }

        let salt = read_const_bytes(reader)?;

        let check_value = if flags.has_password_check() {
            let check_value: [u8; 12] = read_const_bytes(reader)?;
            let checksum: [u8; 4] = read_const_bytes(reader)?;

            verify_check_value(&check_value, &checksum).then_some(check_value)
        } else {
            None
        };

        Ok(CryptBlock {
            kdf_log2_count,
            salt,
            check_value,
        })
    }
}

/// The stored check value carries a truncated SHA-256 of itself. On a
/// mismatch the value cannot be used to verify password guesses.
fn verify_check_value(check_value: &[u8], checksum: &[u8; 4]) -> bool {
    Sha256::digest(check_value)[..4] == checksum[..]
}

int_enum! {
    pub enum HostOs : u8 {
        Windows = 0,
        Unix = 1,
    }
}

/// Compression settings vint. Only the pieces that matter for candidate
/// triage are decoded.
pub struct CompressionInfo(u64);

impl CompressionInfo {
    const SOLID_MASK: u64 = 0x0040;
    const METHOD_MASK: u64 = 0x0380;

    pub fn new(info: u64) -> Self {
        Self(info)
    }

    /// Entry depends on dictionary state built by earlier entries.
    pub fn is_solid(&self) -> bool {
        self.0 & Self::SOLID_MASK != 0
    }

    /// Compression method: 0 = stored, 5 = best.
    pub fn method(&self) -> u8 {
        ((self.0 & Self::METHOD_MASK) >> 7) as u8
    }
}

impl fmt::Debug for CompressionInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompressionInfo")
            .field("method", &self.method())
            .field("is_solid", &self.is_solid())
            .finish()
    }
}

#[derive(Debug)]
/// A file or service block. The two share a layout; only the meaning of
/// the name differs.
pub struct FileBlock {
    pub flags: FileBlockFlags,

    /// Size of the entry after decompression; unknown when archiving from
    /// a pipe.
    pub unpacked_size: Option<u64>,

    /// OS-specific file attributes.
    pub attributes: u64,

    /// File modification time.
    pub modification_time: Option<Result<time::OffsetDateTime, u32>>,

    /// CRC32 of the unpacked data.
    pub crc32: Option<u32>,

    /// Compression settings for this entry.
    pub compression_info: CompressionInfo,

    /// OS used to add this entry to the archive.
    pub host_os: HostOs,

    /// Stored name; forward slash separated on every host.
    pub name: String,

    /// Encryption parameters from the extra area, when the entry is
    /// encrypted.
    pub encryption: Option<FileEncryptionRecord>,
}

flags! {
    pub struct FileBlockFlags(u16) {
        pub is_directory = 0x0001;
        pub has_modification_time = 0x0002;
        pub has_crc32 = 0x0004;

        /// Unpacked size is unknown.
        pub unknown_unpacked_size = 0x0008;
    }
}

impl FileBlock {
    /// Extra-area record carrying encryption parameters.
    const CRYPT_RECORD: u64 = 0x01;

    fn read<R: io::Read + io::Seek>(
        reader: &mut R,
        extra_area_size: Option<u64>,
        header_end: u64,
    ) -> RarResult<Self> {
        let (flags, _) = read_vint(reader)?;
        let flags = FileBlockFlags::new(flags as u16);

        let (unpacked_size, _) = read_vint(reader)?;
        let unpacked_size = if flags.unknown_unpacked_size() {
            None
        } else {
            Some(unpacked_size)
        };

        let (attributes, _) = read_vint(reader)?;

        let modification_time = if flags.has_modification_time() {
            let seconds = read_u32(reader)?;
            Some(time_conv::parse_unix_timestamp_sec(seconds).map_err(|_| seconds))
        } else {
            None
        };

        let crc32 = if flags.has_crc32() {
            Some(read_u32(reader)?)
        } else {
            None
        };

        let (compression_info, _) = read_vint(reader)?;
        let compression_info = CompressionInfo::new(compression_info);

        let (host_os, _) = read_vint(reader)?;

        let (name_size, _) = read_vint(reader)?;
        let name = read_vec(reader, name_size.min(MAX_PATH_SIZE) as usize)?;
        let name = String::from_utf8_lossy(&name).into_owned();

        let mut encryption = None;

        if let Some(extra_area_size) = extra_area_size {
            // The extra area sits at the tail of the header; seeking to it
            // directly keeps a lying name length from shifting the records.
            let extra_area_offset = header_end
                .checked_sub(extra_area_size)
                .ok_or(Error::CorruptHeader)?;
            reader.seek(io::SeekFrom::Start(extra_area_offset))?;

            for record in RecordIterator::new(reader, extra_area_size)? {
                let mut record = record?;

                if record.record_type == Self::CRYPT_RECORD {
                    encryption = Some(FileEncryptionRecord::read(&mut record.data)?);
                    break;
                }
            }
        }

        Ok(FileBlock {
            flags,
            unpacked_size,
            attributes,
            modification_time,
            crc32,
            compression_info,
            host_os: (host_os as u8).into(),
            name,
            encryption,
        })
    }
}

#[derive(Debug)]
/// Per-entry encryption parameters from a file or service block's extra
/// area.
pub struct FileEncryptionRecord {
    pub flags: FileEncryptionFlags,

    /// Binary logarithm of the KDF iteration count.
    pub kdf_log2_count: u8,

    pub salt: [u8; 16],
    pub iv: [u8; 16],

    /// Password check value; entries without one cannot be attacked
    /// without decrypting data.
    pub check_value: Option<[u8; 12]>,
}

flags! {
    pub struct FileEncryptionFlags(u8) {
        /// A password check value is stored with the parameters.
        pub has_password_check = 0x01;

        /// Checksums are calculated over the MAC of the data.
        pub uses_mac_checksum = 0x02;
    }
}

impl FileEncryptionRecord {
    pub fn read<R: io::Read + io::Seek>(reader: &mut R) -> RarResult<Self> {
        let (version, _) = read_vint(reader)?;
        if version > ENCRYPTION_VERSION_AES256 {
            return Err(Error::Unsupported("unknown RAR5 encryption version"));
        }

        let (flags, _) = read_vint(reader)?;
        let flags = FileEncryptionFlags::new(flags as u8);

        let kdf_log2_count = read_u8(reader)?;
        if kdf_log2_count > KDF_LG2_COUNT_MAX {
            return Err(Error::Unsupported("KDF iteration exponent too large"));
        }

        let salt = read_const_bytes(reader)?;
        let iv = read_const_bytes(reader)?;

        let check_value = if flags.has_password_check() {
            Some(read_const_bytes(reader)?)
        } else {
            None
        };

        Ok(FileEncryptionRecord {
            flags,
            kdf_log2_count,
            salt,
            iv,
            check_value,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn check_value_checksum_must_match() {
        let check_value = [0x42; 12];
        let digest = Sha256::digest(check_value);

        let mut checksum = [0u8; 4];
        checksum.copy_from_slice(&digest[..4]);
        assert!(verify_check_value(&check_value, &checksum));

        checksum[0] ^= 1;
        assert!(!verify_check_value(&check_value, &checksum));
    }

    #[test]
    fn compression_info_unpacks_method_and_solid() {
        let info = CompressionInfo::new(0x0040 | 3 << 7);
        assert!(info.is_solid());
        assert_eq!(info.method(), 3);

        let stored = CompressionInfo::new(0);
        assert!(!stored.is_solid());
        assert_eq!(stored.method(), 0);
    }
}
