//! Decoder for the packed filename encoding used when the unicode-filename
//! flag is set.
//!
//! The raw buffer holds a NUL-terminated OEM-style name followed by a
//! packed wide encoding: a stream of 2-bit commands, four per flag byte,
//! MSB first. Commands either emit wide characters directly or copy runs
//! from the OEM name, optionally rebased with a correction byte and the
//! shared high byte stored at the start of the packed region.

use super::NAME_MAX_SIZE;

/// Decode a raw filename buffer into a string.
///
/// A buffer with no NUL separator carries no packed region and is the name
/// itself. Decoding stops when either the command stream or the output
/// capacity runs out; ill-formed UTF-16 is replaced rather than refused.
pub fn decode_file_name(buffer: &[u8]) -> String {
    let Some(nul) = buffer.iter().position(|&b| b == 0) else {
        return String::from_utf8_lossy(buffer).into_owned();
    };

    let name = &buffer[..nul];
    let packed = &buffer[nul + 1..];

    if packed.is_empty() {
        return String::from_utf8_lossy(name).into_owned();
    }

    let capacity = usize::min(NAME_MAX_SIZE as usize, usize::max(name.len(), 1));
    let mut wide: Vec<u16> = Vec::with_capacity(capacity);

    let high_byte = (packed[0] as u16) << 8;
    let mut pos = 1;

    let mut command_flags = 0u8;
    let mut command_count = 0usize;

    while pos < packed.len() && wide.len() < capacity {
        if command_count % 4 == 0 {
            command_flags = packed[pos];
            pos += 1;

            if pos >= packed.len() {
                break;
            }
        }

        match (command_flags >> ((3 - command_count % 4) * 2)) & 0x03 {
            // Low byte of a wide character; high byte is zero.
            0 => {
                wide.push(packed[pos] as u16);
                pos += 1;
            }
            // Low byte of a wide character with the shared high byte.
            1 => {
                wide.push(packed[pos] as u16 | high_byte);
                pos += 1;
            }
            // Full little-endian wide character.
            2 => {
                if pos + 1 < packed.len() {
                    wide.push(u16::from_le_bytes([packed[pos], packed[pos + 1]]));
                }
                pos += 2;
            }
            // Run copied from the OEM name, rebased when the length byte
            // has its high bit set.
            3 => {
                let length = packed[pos];
                pos += 1;

                if length & 0x80 != 0 {
                    if pos < packed.len() {
                        let correction = packed[pos];
                        pos += 1;

                        for _ in 0..(length & 0x7f) + 2 {
                            if wide.len() >= capacity || wide.len() >= name.len() {
                                break;
                            }

                            let low = name[wide.len()].wrapping_add(correction) as u16;
                            wide.push(low | high_byte);
                        }
                    }
                } else {
                    for _ in 0..length + 2 {
                        if wide.len() >= capacity || wide.len() >= name.len() {
                            break;
                        }

                        wide.push(name[wide.len()] as u16);
                    }
                }
            }
            _ => unreachable!("two-bit command"),
        }

        command_count += 1;
    }

    String::from_utf16_lossy(&wide)
}
