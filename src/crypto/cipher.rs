//! AES-256-CBC with PKCS#7 padding.
//!
//! The mode is unauthenticated. A wrong key or a tampered ciphertext usually
//! breaks the padding, but roughly one wrong key in 256 unpads cleanly and
//! yields garbage. Callers get [`crate::Authenticity::Unverified`] alongside
//! every plaintext for that reason.

use aes::Aes256;
use aes::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit, block_padding::Pkcs7};
use zeroize::Zeroizing;

use super::{IV_LEN, KEY_LEN};
use crate::error::SealError;

type Aes256CbcEnc = cbc::Encryptor<Aes256>;
type Aes256CbcDec = cbc::Decryptor<Aes256>;

/// Encrypt plaintext
pub fn encrypt(key: &[u8; KEY_LEN], iv: &[u8; IV_LEN], plaintext: &[u8]) -> Vec<u8> {
    Aes256CbcEnc::new(key.into(), iv.into()).encrypt_padded_vec_mut::<Pkcs7>(plaintext)
}

/// Decrypt ciphertext
pub fn decrypt(
    key: &[u8; KEY_LEN],
    iv: &[u8; IV_LEN],
    ciphertext: &[u8],
) -> Result<Zeroizing<Vec<u8>>, SealError> {
    let plaintext = Aes256CbcDec::new(key.into(), iv.into())
        .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
        .map_err(|_| SealError::DecryptionFailed)?;
    Ok(Zeroizing::new(plaintext))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::BLOCK_LEN;

    const KEY: [u8; KEY_LEN] = [9u8; KEY_LEN];
    const IV: [u8; IV_LEN] = [3u8; IV_LEN];

    #[test]
    fn encrypt_decrypt_roundtrip() {
        let ciphertext = encrypt(&KEY, &IV, b"secret data");
        let plaintext = decrypt(&KEY, &IV, &ciphertext).unwrap();
        assert_eq!(plaintext.as_slice(), b"secret data");
    }

    #[test]
    fn ciphertext_is_padded_to_block() {
        assert_eq!(encrypt(&KEY, &IV, b"").len(), BLOCK_LEN);
        assert_eq!(encrypt(&KEY, &IV, &[0u8; 15]).len(), BLOCK_LEN);
        // a full block gains a whole block of padding
        assert_eq!(encrypt(&KEY, &IV, &[0u8; 16]).len(), 2 * BLOCK_LEN);
    }

    #[test]
    fn iv_changes_ciphertext() {
        let a = encrypt(&KEY, &IV, b"same message");
        let b = encrypt(&KEY, &[4u8; IV_LEN], b"same message");
        assert_ne!(a, b);
    }

    #[test]
    fn matches_openssl_reference() {
        let key: [u8; KEY_LEN] =
            hex::decode("15e16031dc759ede2cffc12af0c355c8eac09fe551892c2d1b07086639cf9cac")
                .unwrap()
                .try_into()
                .unwrap();
        let iv: [u8; IV_LEN] = core::array::from_fn(|i| 0x10 + i as u8);

        let ciphertext = encrypt(&key, &iv, b"hello world");
        assert_eq!(hex::encode(ciphertext), "ee39dde7c125024762793e933d2346de");
    }

    #[test]
    fn truncated_ciphertext_fails() {
        let ciphertext = encrypt(&KEY, &IV, b"secret data");
        let err = decrypt(&KEY, &IV, &ciphertext[..BLOCK_LEN - 1]).unwrap_err();
        assert_eq!(err, SealError::DecryptionFailed);
    }
}
