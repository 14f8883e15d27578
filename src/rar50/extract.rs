use std::io;

use tracing::{debug, warn};

use crate::{error::RarResult, hash_record::HashRecord, read::*};

use super::blocks::{Block, BlockKind, CryptBlock};

/// Walk a RAR5 archive starting just past its signature and collect one
/// hash record per attackable unit, in archive order.
///
/// A crypt block switches the archive into encrypted-headers mode: the
/// bytes at the next block position are ciphertext, starting with the
/// 16-byte header IV, so one record is emitted and the walk stops there.
pub fn extract<R: io::Read + io::Seek>(
    reader: &mut R,
    offset: u64,
    file_size: u64,
) -> RarResult<Vec<HashRecord>> {
    let mut records = Vec::new();
    let mut next_offset = offset;
    let mut pending_crypt: Option<CryptBlock> = None;

    while next_offset < file_size {
        reader.seek(io::SeekFrom::Start(next_offset))?;

        if let Some(crypt) = pending_crypt.take() {
            let Some(check_value) = crypt.check_value else {
                warn!("headers are encrypted but carry no usable password check");
                break;
            };

            let iv = read_const_bytes(reader)?;
            records.push(HashRecord::Rar5 {
                salt: crypt.salt,
                kdf_log2_count: crypt.kdf_log2_count,
                iv,
                check_value,
            });

            break;
        }

        let block = Block::read(reader)?;
        next_offset = block.next_offset();

        match block.kind {
            BlockKind::Crypt(crypt) => {
                pending_crypt = Some(crypt);
            }

            BlockKind::File(file) | BlockKind::Service(file) => {
                debug!(
                    name = %file.name,
                    unpacked_size = ?file.unpacked_size,
                    compression = ?file.compression_info,
                    host_os = ?file.host_os,
                    is_directory = file.flags.is_directory(),
                    "entry"
                );

                let Some(encryption) = file.encryption else {
                    debug!(name = %file.name, "skipping unencrypted entry");
                    continue;
                };

                match encryption.check_value {
                    Some(check_value) => records.push(HashRecord::Rar5 {
                        salt: encryption.salt,
                        kdf_log2_count: encryption.kdf_log2_count,
                        iv: encryption.iv,
                        check_value,
                    }),
                    None => {
                        debug!(
                            name = %file.name,
                            "skipping encrypted entry without a password check value"
                        );
                    }
                }
            }

            BlockKind::Main(main) => {
                debug!(flags = ?main.flags, volume_number = ?main.volume_number, "main block");
            }

            BlockKind::EndArchive => break,

            BlockKind::Unknown(tag) => {
                debug!(tag, "skipping unknown block");
            }
        }
    }

    Ok(records)
}
