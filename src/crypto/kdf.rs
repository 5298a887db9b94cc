use pbkdf2::pbkdf2_hmac;
use sha2::Sha256;
use zeroize::Zeroizing;

use super::{KEY_LEN, PBKDF2_ITERATIONS, SALT_LEN};

/// 256-bit key, wiped when dropped.
pub type DerivedKey = Zeroizing<[u8; KEY_LEN]>;

/// Stretch a passphrase into a 256-bit key with PBKDF2-HMAC-SHA256.
///
/// Deterministic in `(passphrase, salt)`. The iteration count is fixed at
/// [`PBKDF2_ITERATIONS`]; envelopes carry no version, so changing it would
/// make every existing envelope open to garbage.
pub fn derive_key(passphrase: &str, salt: &[u8; SALT_LEN]) -> DerivedKey {
    let mut key = Zeroizing::new([0u8; KEY_LEN]);
    pbkdf2_hmac::<Sha256>(passphrase.as_bytes(), salt, PBKDF2_ITERATIONS, &mut *key);
    key
}
