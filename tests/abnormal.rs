use rarhash::error::Error;

mod common;

use common::{FileEntry, Rar3Builder};

/// Not a RAR archive at all.
#[test]
fn not_an_archive() {
    let result = common::scan_bytes(b"HELLO\n".to_vec());
    assert!(matches!(result, Err(Error::NotArchive)));
}

/// Inputs shorter than any signature can never classify.
#[test]
fn short_inputs_are_not_archives() {
    for len in 0..7 {
        let result = common::scan_bytes(vec![b'R'; len]);
        assert!(matches!(result, Err(Error::NotArchive)), "len {len}");
    }
}

/// The old 1.4 format predates encryption salts entirely.
#[test]
fn rar14_archives_are_unsupported() {
    let mut data = b"RE\x7e\x5e".to_vec();
    data.extend_from_slice(&[0; 32]);

    let result = common::scan_bytes(data);
    assert!(matches!(result, Err(Error::Unsupported(_))));
}

/// A signature buried behind a self-extracting stub is still found.
#[test]
fn archives_behind_an_sfx_stub_are_scanned() {
    let mut data = b"MZ".to_vec();
    data.resize(5000, 0x90);

    let archive = Rar3Builder::new()
        .file_entry(FileEntry::default())
        .build();
    data.extend_from_slice(&archive);

    let records = common::scan_bytes(data).unwrap();
    assert_eq!(records.len(), 1);
}

/// An archive header with the wrong tag is corrupt, not silently empty.
#[test]
fn wrong_archive_header_tag_is_corrupt() {
    let mut data = common::RAR15_SIGNATURE.to_vec();
    data.extend_from_slice(&[0, 0]); // header CRC16
    data.push(0x99); // bogus tag
    data.extend_from_slice(&[0; 10]);

    let result = common::scan_bytes(data);
    assert!(matches!(result, Err(Error::CorruptHeader)));
}

/// Truncation in the middle of a promised field surfaces as an EOF error.
#[test]
fn truncated_file_header_is_an_eof_error() {
    let mut data = Rar3Builder::new()
        .file_entry(FileEntry::default())
        .build();
    data.truncate(data.len() - 20);

    let result = common::scan_bytes(data);
    assert!(matches!(result, Err(Error::UnexpectedEof)));
}
