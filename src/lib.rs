//! Passphrase-based message sealing.
//!
//! [`seal`] turns a message and a passphrase into a self-contained envelope
//! string; [`open`] reverses it. Each envelope carries its own random salt
//! and IV, the key is PBKDF2-HMAC-SHA256 over the passphrase, and the
//! message is AES-256-CBC encrypted with PKCS#7 padding.
//!
//! ```no_run
//! let envelope = msgseal::seal("hello world", "correct-horse")?;
//! let opened = msgseal::open(&envelope, "correct-horse")?;
//! assert_eq!(opened.plaintext(), "hello world");
//! # Ok::<(), msgseal::SealError>(())
//! ```

mod crypto;
mod envelope;
mod error;
mod storage;

pub use crate::envelope::Envelope;
pub use crate::error::{ErrorKind, SealError};
pub use crate::storage::Storage;
use tracing::{debug, trace};
use zeroize::Zeroizing;

/// How much [`open`] can vouch for the plaintext it returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Authenticity {
    /// Padding validated, but no MAC covers the ciphertext. A wrong
    /// passphrase or a tampered message can still unpad by chance and
    /// produce garbage that is indistinguishable from success here.
    Unverified,
}

/// Successful result of [`open`].
pub struct Opened {
    plaintext: Zeroizing<String>,
}

impl Opened {
    pub fn plaintext(&self) -> &str {
        &self.plaintext
    }

    pub fn into_plaintext(self) -> Zeroizing<String> {
        self.plaintext
    }

    /// Always [`Authenticity::Unverified`]: the envelope has no authentication tag.
    pub fn authenticity(&self) -> Authenticity {
        Authenticity::Unverified
    }
}

impl std::fmt::Debug for Opened {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Opened")
            .field("len", &self.plaintext.len())
            .finish_non_exhaustive()
    }
}

/// Seal `plaintext` under `passphrase`.
///
/// Draws a fresh salt and IV on every call, so sealing the same message twice
/// gives two different envelopes.
///
/// # Errors
///
/// - [`SealError::InvalidInput`] for an empty passphrase, before any randomness is drawn
/// - [`SealError::EntropySourceFailure`] if the OS generator is unavailable
pub fn seal(plaintext: &str, passphrase: &str) -> Result<String, SealError> {
    if passphrase.is_empty() {
        return Err(SealError::InvalidInput("passphrase must not be empty"));
    }

    let salt = crypto::generate_salt()?;
    let iv = crypto::generate_iv()?;

    let key = crypto::derive_key(passphrase, &salt);
    let ciphertext = crypto::encrypt(&key, &iv, plaintext.as_bytes());
    drop(key);

    debug!(
        plaintext_len = plaintext.len(),
        ciphertext_len = ciphertext.len(),
        "sealed message"
    );

    Ok(Envelope::new(salt, iv, ciphertext).to_string())
}

/// Open an envelope produced by [`seal`].
///
/// # Errors
///
/// - [`SealError::InvalidInput`] for an empty passphrase
/// - [`SealError::MalformedEnvelope`] if the string is not a well-formed envelope;
///   no key is derived in that case
/// - [`SealError::DecryptionFailed`] if the ciphertext does not unpad or is not
///   UTF-8 under the derived key, most likely a wrong passphrase
pub fn open(envelope: &str, passphrase: &str) -> Result<Opened, SealError> {
    if passphrase.is_empty() {
        return Err(SealError::InvalidInput("passphrase must not be empty"));
    }

    let envelope =
        Envelope::parse(envelope).inspect_err(|e| debug!(error = %e, "rejected envelope"))?;
    trace!(ciphertext_len = envelope.ciphertext().len(), "parsed envelope");

    let key = crypto::derive_key(passphrase, envelope.salt());
    let bytes = crypto::decrypt(&key, envelope.iv(), envelope.ciphertext());
    drop(key);
    let mut bytes = bytes.inspect_err(|_| debug!("padding check failed"))?;

    let plaintext = String::from_utf8(std::mem::take(&mut *bytes)).map_err(|e| {
        // take ownership of the rejected buffer so it is wiped too
        drop(Zeroizing::new(e.into_bytes()));
        debug!("unpadded plaintext is not UTF-8");
        SealError::DecryptionFailed
    })?;

    Ok(Opened {
        plaintext: Zeroizing::new(plaintext),
    })
}

/// Generate a random passphrase: 16 bytes from the OS generator, hex encoded.
///
/// The result is an ordinary passphrase for [`seal`] and [`open`], not a raw key.
pub fn generate_standalone_key() -> Result<String, SealError> {
    let bytes: Zeroizing<[u8; crypto::STANDALONE_KEY_LEN]> =
        Zeroizing::new(crypto::random_bytes()?);
    Ok(hex::encode(*bytes))
}
