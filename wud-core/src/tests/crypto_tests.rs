use super::*;

// NIST SP 800-38A, F.2.1 (CBC-AES128), first block.
const NIST_KEY: Key = [
    0x2b, 0x7e, 0x15, 0x16, 0x28, 0xae, 0xd2, 0xa6, 0xab, 0xf7, 0x15, 0x88, 0x09, 0xcf, 0x4f, 0x3c,
];
const NIST_IV: Iv = [
    0x00, 0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08, 0x09, 0x0a, 0x0b, 0x0c, 0x0d, 0x0e, 0x0f,
];
const NIST_PLAIN: [u8; 16] = [
    0x6b, 0xc1, 0xbe, 0xe2, 0x2e, 0x40, 0x9f, 0x96, 0xe9, 0x3d, 0x7e, 0x11, 0x73, 0x93, 0x17, 0x2a,
];
const NIST_CIPHER: [u8; 16] = [
    0x76, 0x49, 0xab, 0xac, 0x81, 0x19, 0xb2, 0x46, 0xce, 0xe9, 0x8e, 0x9b, 0x12, 0xe9, 0x19, 0x7d,
];

#[test]
fn decrypt_matches_nist_vector() {
    let mut buf = NIST_CIPHER;
    decrypt_cbc(&NIST_KEY, &NIST_IV, &mut buf).unwrap();
    assert_eq!(buf, NIST_PLAIN);
}

#[test]
fn encrypt_matches_nist_vector() {
    let mut buf = NIST_PLAIN;
    encrypt_cbc(&NIST_KEY, &NIST_IV, &mut buf).unwrap();
    assert_eq!(buf, NIST_CIPHER);
}

#[test]
fn decrypt_block_matches_cbc() {
    assert_eq!(decrypt_block(&NIST_KEY, &NIST_IV, &NIST_CIPHER), NIST_PLAIN);
}

#[test]
fn multi_block_round_trip() {
    let plain: Vec<u8> = (0..0x8000u32).map(|i| (i * 7) as u8).collect();
    let mut buf = plain.clone();
    encrypt_cbc(&NIST_KEY, &ZERO_IV, &mut buf).unwrap();
    assert_ne!(buf, plain);
    decrypt_cbc(&NIST_KEY, &ZERO_IV, &mut buf).unwrap();
    assert_eq!(buf, plain);
}

#[test]
fn unaligned_buffer_is_rejected() {
    let mut buf = [0u8; 17];
    let err = decrypt_cbc(&NIST_KEY, &ZERO_IV, &mut buf).unwrap_err();
    assert!(matches!(err, WudError::Crypto(_)));
    assert!(err.to_string().contains("17 bytes"));
}

#[test]
fn sha1_of_abc() {
    assert_eq!(
        sha1(b"abc"),
        [
            0xa9, 0x99, 0x3e, 0x36, 0x47, 0x06, 0x81, 0x6a, 0xba, 0x3e, 0x25, 0x71, 0x78, 0x50,
            0xc2, 0x6c, 0x9c, 0xd0, 0xd8, 0x9d,
        ]
    );
}
