//! Builders for the synthetic archives used by the integration tests.

#![allow(dead_code)]

use std::io;

use sha2::{Digest, Sha256};

use rarhash::{error::RarResult, HashRecord};

pub const RAR15_SIGNATURE: &[u8] = b"Rar!\x1a\x07\x00";
pub const RAR50_SIGNATURE: &[u8] = b"Rar!\x1a\x07\x01\x00";

/// Run the scanner over an in-memory archive.
pub fn scan_bytes(data: Vec<u8>) -> RarResult<Vec<HashRecord>> {
    let file_size = data.len() as u64;
    let mut reader = io::Cursor::new(data);
    rarhash::scan(&mut reader, file_size)
}

/// Minimal-length RAR5 variable-length integer encoding.
pub fn vint(mut value: u64) -> Vec<u8> {
    let mut out = vec![];

    loop {
        let byte = (value & 0x7f) as u8;
        value >>= 7;

        if value == 0 {
            out.push(byte);
            return out;
        }

        out.push(byte | 0x80);
    }
}

/// One RAR3 file entry for [`Rar3Builder`]. The packed size is the length
/// of `data`.
pub struct FileEntry {
    pub flags: u16,
    pub unpacked_size: u32,
    pub method: u8,
    pub crc32: u32,
    pub name: &'static [u8],
    pub salt: Option<[u8; 8]>,
    pub data: Vec<u8>,
}

impl Default for FileEntry {
    fn default() -> Self {
        FileEntry {
            flags: 0x8000 | 0x0004, // long block, encrypted
            unpacked_size: 16,
            method: 0x30,
            crc32: 0xcafebabe,
            name: b"file.txt",
            salt: Some([0x5a; 8]),
            data: vec![0xaa; 16],
        }
    }
}

/// RAR3 archive under construction.
pub struct Rar3Builder {
    data: Vec<u8>,
}

impl Rar3Builder {
    pub fn new() -> Self {
        Self::with_archive_flags(0)
    }

    pub fn with_archive_flags(flags: u16) -> Self {
        let mut data = RAR15_SIGNATURE.to_vec();
        data.extend_from_slice(&[0, 0]); // header CRC16
        data.push(0x73);
        data.extend_from_slice(&flags.to_le_bytes());
        data.extend_from_slice(&13u16.to_le_bytes());
        data.extend_from_slice(&[0; 6]); // reserved

        Self { data }
    }

    /// Append a file header and its data area.
    pub fn file_entry(mut self, entry: FileEntry) -> Self {
        let flags = entry.flags | if entry.salt.is_some() { 0x0400 } else { 0 };
        let header_size = 32 + entry.name.len() + if entry.salt.is_some() { 8 } else { 0 };

        self.data.extend_from_slice(&[0, 0]); // header CRC16
        self.data.push(0x74);
        self.data.extend_from_slice(&flags.to_le_bytes());
        self.data
            .extend_from_slice(&(header_size as u16).to_le_bytes());
        self.data
            .extend_from_slice(&(entry.data.len() as u32).to_le_bytes());
        self.data
            .extend_from_slice(&entry.unpacked_size.to_le_bytes());
        self.data.push(3); // host OS: Unix
        self.data.extend_from_slice(&entry.crc32.to_le_bytes());
        self.data.extend_from_slice(&0u32.to_le_bytes()); // mtime
        self.data.push(29); // unpack version
        self.data.push(entry.method);
        self.data
            .extend_from_slice(&(entry.name.len() as u16).to_le_bytes());
        self.data.extend_from_slice(&0u32.to_le_bytes()); // attributes
        self.data.extend_from_slice(entry.name);

        if let Some(salt) = entry.salt {
            self.data.extend_from_slice(&salt);
        }

        self.data.extend_from_slice(&entry.data);
        self
    }

    pub fn raw(mut self, bytes: &[u8]) -> Self {
        self.data.extend_from_slice(bytes);
        self
    }

    pub fn build(self) -> Vec<u8> {
        self.data
    }
}

/// Assemble one RAR5 block from its body, extra area and data area. The
/// header CRC32 is left zeroed; the scanner does not verify it.
pub fn rar5_block(header_type: u8, body: &[u8], extra: &[u8], data: &[u8]) -> Vec<u8> {
    let mut flags = 0u64;
    if !extra.is_empty() {
        flags |= 0x01;
    }
    if !data.is_empty() {
        flags |= 0x02;
    }

    let mut header = vec![header_type];
    header.extend(vint(flags));
    if !extra.is_empty() {
        header.extend(vint(extra.len() as u64));
    }
    if !data.is_empty() {
        header.extend(vint(data.len() as u64));
    }
    header.extend_from_slice(body);
    header.extend_from_slice(extra);

    let mut block = vec![0; 4]; // header CRC32
    block.extend(vint(header.len() as u64));
    block.extend(header);
    block.extend_from_slice(data);
    block
}

pub fn rar5_main_block() -> Vec<u8> {
    rar5_block(0x01, &vint(0), &[], &[])
}

pub fn rar5_end_block() -> Vec<u8> {
    rar5_block(0x05, &vint(0), &[], &[])
}

/// Crypt block announcing encrypted headers, with a correctly checksummed
/// password check value when one is given.
pub fn rar5_crypt_block(
    kdf_log2_count: u8,
    salt: [u8; 16],
    check_value: Option<[u8; 12]>,
) -> Vec<u8> {
    let mut body = vint(0); // encryption version
    body.extend(vint(if check_value.is_some() { 0x01 } else { 0 }));
    body.push(kdf_log2_count);
    body.extend_from_slice(&salt);

    if let Some(check_value) = check_value {
        body.extend_from_slice(&check_value);
        body.extend_from_slice(&Sha256::digest(check_value)[..4]);
    }

    rar5_block(0x04, &body, &[], &[])
}

/// Extra-area encryption record for a file or service block.
pub fn rar5_crypt_record(
    kdf_log2_count: u8,
    salt: [u8; 16],
    iv: [u8; 16],
    check_value: Option<[u8; 12]>,
) -> Vec<u8> {
    let mut payload = vint(0); // encryption version
    payload.extend(vint(if check_value.is_some() { 0x01 } else { 0 }));
    payload.push(kdf_log2_count);
    payload.extend_from_slice(&salt);
    payload.extend_from_slice(&iv);

    if let Some(check_value) = check_value {
        payload.extend_from_slice(&check_value);
    }

    let mut record = vint(payload.len() as u64 + 1); // size covers the type tag
    record.extend(vint(0x01)); // crypt record
    record.extend(payload);
    record
}

/// File block with the given extra area and (stand-in) encrypted data.
pub fn rar5_file_block(name: &[u8], extra: &[u8], data: &[u8]) -> Vec<u8> {
    let mut body = vint(0); // file flags
    body.extend(vint(data.len() as u64)); // unpacked size
    body.extend(vint(0)); // attributes
    body.extend(vint(0)); // compression info
    body.extend(vint(1)); // host OS: Unix
    body.extend(vint(name.len() as u64));
    body.extend_from_slice(name);

    rar5_block(0x02, &body, extra, data)
}
