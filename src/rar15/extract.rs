use std::io;

use tracing::{debug, warn};

use crate::{
    error::{Error, RarResult},
    hash_record::HashRecord,
    read::*,
};

use super::{
    blocks::{ArchiveHeader, Block, FileHeader},
    candidate::{Candidate, CandidateSelector},
    FILE_NAMES_MAX_SIZE,
};

/// Walk a RAR3 archive starting just past its signature and produce at
/// most one hash record.
///
/// `-hp` archives resolve immediately from the block at the tail of the
/// file; `-p` archives walk every file header and keep the best candidate.
pub fn extract<R: io::Read + io::Seek>(
    reader: &mut R,
    offset: u64,
    file_size: u64,
) -> RarResult<Option<HashRecord>> {
    reader.seek(io::SeekFrom::Start(offset))?;
    let archive_header = ArchiveHeader::read(reader)?;

    debug!(
        flags = ?archive_header.flags,
        header_size = archive_header.header_size,
        "archive header"
    );

    if archive_header.flags.headers_encrypted() {
        return extract_encrypted_headers(reader).map(Some);
    }

    extract_file_candidate(reader, file_size)
}

/// Every header is encrypted, so file entries are unreadable. The final
/// end-of-archive block has fixed contents though, which makes the salt
/// plus the 16 ciphertext bytes at the tail a known-plaintext oracle.
fn extract_encrypted_headers<R: io::Read + io::Seek>(reader: &mut R) -> RarResult<HashRecord> {
    reader.seek(io::SeekFrom::End(-24))?;

    let salt = read_const_bytes(reader)?;
    let known_plain_block = read_const_bytes(reader)?;

    Ok(HashRecord::Rar3EncryptedHeaders {
        salt,
        known_plain_block,
    })
}

fn extract_file_candidate<R: io::Read + io::Seek>(
    reader: &mut R,
    file_size: u64,
) -> RarResult<Option<HashRecord>> {
    let mut selector = CandidateSelector::new();
    let mut file_names = String::new();
    let mut next_offset = reader.stream_position()?;

    while next_offset.saturating_add(FileHeader::SIZE as u64) <= file_size {
        reader.seek(io::SeekFrom::Start(next_offset))?;

        match Block::read(reader)? {
            Block::Service {
                offset,
                header_size,
            } => {
                next_offset = offset + header_size as u64;
            }

            Block::Terminal { tag } => {
                debug!(tag, "unrecognized header tag; ending the walk");
                break;
            }

            Block::File(header) => {
                next_offset = header.next_header_offset();
                append_file_name(&mut file_names, &header.file_name);
                consider(reader, &mut selector, header, file_size)?;
            }
        }
    }

    match selector.finish(file_names) {
        None => {
            warn!("Did not find a valid encrypted candidate");
            Ok(None)
        }
        record => Ok(record),
    }
}

/// Offer one file entry to the selector, buffering its ciphertext only if
/// it is actually admitted.
fn consider<R: io::Read + io::Seek>(
    reader: &mut R,
    selector: &mut CandidateSelector,
    header: FileHeader,
    file_size: u64,
) -> RarResult<()> {
    if header.flags.is_solid() {
        debug!(name = %header.file_name, "skipping solid entry");
        return Ok(());
    }

    if header.flags.is_directory() {
        debug!(name = %header.file_name, "skipping directory entry");
        return Ok(());
    }

    if !header.flags.is_encrypted() {
        debug!(name = %header.file_name, "skipping unencrypted entry");
        return Ok(());
    }

    let Some(salt) = header.salt else {
        debug!(name = %header.file_name, "skipping encrypted entry without a salt");
        return Ok(());
    };

    if header.next_header_offset() > file_size {
        return Err(Error::CorruptHeader);
    }

    debug!(
        name = %header.file_name,
        packed_size = header.packed_size,
        unpacked_size = header.unpacked_size,
        method = header.method,
        host_os = ?header.host_os,
        modification_time = ?header.modification_time,
        "encrypted candidate"
    );

    let data_offset = header.data_offset();
    let mut candidate = Candidate {
        packed_size: header.packed_size,
        unpacked_size: header.unpacked_size,
        method: header.method,
        crc32: header.crc32,
        salt,
        file_name: header.file_name,
        data_offset,
        ciphertext: Vec::new(),
    };

    if selector.admits(&candidate) {
        reader.seek(io::SeekFrom::Start(candidate.data_offset))?;
        candidate.ciphertext = read_vec(reader, candidate.packed_size as usize)?;
        selector.replace(candidate);
    }

    Ok(())
}

/// Append to the bounded, space-separated list of names seen while
/// scanning. Names past the cap are dropped.
fn append_file_name(file_names: &mut String, name: &str) {
    if file_names.len() + name.len() + 1 > FILE_NAMES_MAX_SIZE {
        return;
    }

    if !file_names.is_empty() {
        file_names.push(' ');
    }

    file_names.push_str(name);
}
