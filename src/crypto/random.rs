use super::{IV_LEN, SALT_LEN};
use crate::error::SealError;
use getrandom::fill;

/// Fill buffer with cryptographically secure random bytes
fn secure_random(buf: &mut [u8]) -> Result<(), SealError> {
    fill(buf).map_err(|_| SealError::EntropySourceFailure)
}

/// Draw `N` bytes from the OS generator
pub fn random_bytes<const N: usize>() -> Result<[u8; N], SealError> {
    let mut buf = [0u8; N];
    secure_random(&mut buf)?;
    Ok(buf)
}

/// Generate salt
pub fn generate_salt() -> Result<[u8; SALT_LEN], SealError> {
    random_bytes()
}

/// Generate IV, independent of the salt
pub fn generate_iv() -> Result<[u8; IV_LEN], SealError> {
    random_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn salts_are_unique() {
        let a = generate_salt().unwrap();
        let b = generate_salt().unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn iv_is_not_the_salt() {
        let salt = generate_salt().unwrap();
        let iv = generate_iv().unwrap();
        assert_ne!(salt, iv);
    }

    #[test]
    fn random_bytes_fills_requested_length() {
        let buf: [u8; 64] = random_bytes().unwrap();
        assert_eq!(buf.len(), 64);
        assert!(buf.iter().any(|&b| b != 0));
    }
}
