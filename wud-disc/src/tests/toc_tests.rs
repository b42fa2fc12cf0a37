use super::*;
use std::io::Cursor;
use wud_core::crypto::encrypt_cbc;

use crate::DECRYPTED_AREA_OFFSET;

fn make_toc(partitions: &[(&str, u32)]) -> Vec<u8> {
    let mut toc = vec![0u8; TOC_SIZE];
    toc[..4].copy_from_slice(&DECRYPTED_AREA_SIGNATURE);
    toc[0x1C..0x20].copy_from_slice(&(partitions.len() as u32).to_be_bytes());
    for (i, (name, sector)) in partitions.iter().enumerate() {
        let start = 0x800 + i * 0x80;
        toc[start..start + name.len()].copy_from_slice(name.as_bytes());
        toc[start + 0x20..start + 0x24].copy_from_slice(&sector.to_be_bytes());
    }
    toc
}

#[test]
fn sector_conversion() {
    assert_eq!(sector_to_offset(0x41), 0x41 * 0x8000 - 0x10000);
    assert_eq!(sector_to_offset(0x41), 0x1F8000);
    assert_eq!(sector_to_offset(0), 0);
}

#[test]
fn parses_entries_in_disc_order() {
    let toc = make_toc(&[("SI", 0x10), ("UP", 0x41), ("GM0005000010101A00", 0x1000)]);
    let entries = parse_partition_table(&toc).unwrap();
    assert_eq!(entries.len(), 3);
    assert_eq!(entries[0].name, "SI");
    assert_eq!(entries[0].offset, 0x10 * 0x8000 - 0x10000);
    assert_eq!(entries[1].name, "UP");
    assert_eq!(entries[1].offset, 0x41 * 0x8000 - 0x10000);
    assert_eq!(entries[2].name, "GM0005000010101A00");
    assert_eq!(&entries[2].identifier[..2], b"GM");
}

#[test]
fn bad_signature_is_invalid_image() {
    let mut toc = make_toc(&[("SI", 0x10)]);
    toc[0] = 0;
    let err = parse_partition_table(&toc).unwrap_err();
    assert!(matches!(err, WudError::InvalidImage(_)));
}

#[test]
fn oversized_count_is_rejected() {
    let mut toc = make_toc(&[]);
    toc[0x1C..0x20].copy_from_slice(&0xFFFFu32.to_be_bytes());
    assert!(parse_partition_table(&toc).is_err());
}

#[test]
fn reads_encrypted_table_from_image() {
    let disc_key = [0x5Au8; 16];
    let mut toc = make_toc(&[("SI", 0x10), ("UP", 0x20)]);
    encrypt_cbc(&disc_key, &ZERO_IV, &mut toc).unwrap();

    let mut image = vec![0u8; DECRYPTED_AREA_OFFSET as usize];
    image.extend_from_slice(&toc);
    let mut reader = ImageReader::new(Cursor::new(image));

    let entries = read_partition_table(&mut reader, &disc_key).unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[1].name, "UP");
}

#[test]
fn wrong_disc_key_fails() {
    let mut toc = make_toc(&[("SI", 0x10)]);
    encrypt_cbc(&[0x5A; 16], &ZERO_IV, &mut toc).unwrap();

    let mut image = vec![0u8; DECRYPTED_AREA_OFFSET as usize];
    image.extend_from_slice(&toc);
    let mut reader = ImageReader::new(Cursor::new(image));

    let err = read_partition_table(&mut reader, &[0x00; 16]).unwrap_err();
    assert!(err.is_fatal());
}
