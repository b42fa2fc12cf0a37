//! AES-128-CBC and SHA-1 primitives.
//!
//! Every encrypted region of a WUD image is AES-128-CBC without padding. The
//! integrity hashes embedded in hashed partitions are SHA-1.

use aes::cipher::generic_array::GenericArray;
use aes::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit, block_padding::NoPadding};
use sha1::{Digest, Sha1};

use crate::error::WudError;

type Aes128CbcEnc = cbc::Encryptor<aes::Aes128>;
type Aes128CbcDec = cbc::Decryptor<aes::Aes128>;

/// AES block size in bytes.
pub const AES_BLOCK_SIZE: usize = 16;

/// SHA-1 digest size in bytes.
pub const SHA1_SIZE: usize = 20;

/// A 128-bit AES key.
pub type Key = [u8; 16];

/// A 128-bit CBC initialization vector.
pub type Iv = [u8; 16];

/// An all-zero IV, used for the partition table and file tables.
pub const ZERO_IV: Iv = [0u8; 16];

/// Decrypt `buf` in place with AES-128-CBC.
///
/// `buf.len()` must be a multiple of [`AES_BLOCK_SIZE`].
pub fn decrypt_cbc(key: &Key, iv: &Iv, buf: &mut [u8]) -> Result<(), WudError> {
    let len = buf.len();
    Aes128CbcDec::new(&(*key).into(), &(*iv).into())
        .decrypt_padded_mut::<NoPadding>(buf)
        .map_err(|_| {
            WudError::crypto(format!(
                "cannot decrypt {} bytes: not a multiple of the AES block size",
                len
            ))
        })?;
    Ok(())
}

/// Encrypt `buf` in place with AES-128-CBC.
///
/// Only the test image builders need this; the extractor never writes
/// encrypted data.
pub fn encrypt_cbc(key: &Key, iv: &Iv, buf: &mut [u8]) -> Result<(), WudError> {
    let len = buf.len();
    Aes128CbcEnc::new(&(*key).into(), &(*iv).into())
        .encrypt_padded_mut::<NoPadding>(buf, len)
        .map_err(|_| {
            WudError::crypto(format!(
                "cannot encrypt {} bytes: not a multiple of the AES block size",
                len
            ))
        })?;
    Ok(())
}

/// Decrypt a single 16-byte block (e.g. a wrapped title key).
pub fn decrypt_block(key: &Key, iv: &Iv, block: &[u8; 16]) -> [u8; 16] {
    let mut out = *block;
    Aes128CbcDec::new(&(*key).into(), &(*iv).into())
        .decrypt_block_mut(GenericArray::from_mut_slice(&mut out));
    out
}

/// SHA-1 digest of `data`.
pub fn sha1(data: &[u8]) -> [u8; SHA1_SIZE] {
    let mut hasher = Sha1::new();
    hasher.update(data);
    hasher.finalize().into()
}

#[cfg(test)]
#[path = "tests/crypto_tests.rs"]
mod tests;
