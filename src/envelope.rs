//! Envelope wire format.
//!
//! ```text
//! <salt-hex> ":" <iv-hex> ":" <ciphertext-base64>
//! ```
//!
//! Salt and IV are 16 bytes each, written as lowercase hex and accepted in
//! either case. The ciphertext is standard padded base64 of the raw
//! AES-CBC output. Neither alphabet contains `:`, so splitting is
//! unambiguous. There is no version field.

use std::fmt;
use std::str::FromStr;

use base64::{Engine, engine::general_purpose::STANDARD};

use crate::crypto::{BLOCK_LEN, IV_LEN, SALT_LEN};
use crate::error::SealError;

/// Field separator.
pub const DELIMITER: char = ':';
/// Number of fields in an envelope.
pub const FIELD_COUNT: usize = 3;

/// A parsed envelope: everything needed to decrypt, given the passphrase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    salt: [u8; SALT_LEN],
    iv: [u8; IV_LEN],
    ciphertext: Vec<u8>,
}

impl Envelope {
    pub(crate) fn new(salt: [u8; SALT_LEN], iv: [u8; IV_LEN], ciphertext: Vec<u8>) -> Self {
        Self {
            salt,
            iv,
            ciphertext,
        }
    }

    pub fn salt(&self) -> &[u8; SALT_LEN] {
        &self.salt
    }

    pub fn iv(&self) -> &[u8; IV_LEN] {
        &self.iv
    }

    pub fn ciphertext(&self) -> &[u8] {
        &self.ciphertext
    }

    /// Parses an envelope string.
    ///
    /// Surrounding whitespace is ignored.
    ///
    /// # Errors
    ///
    /// Returns [`SealError::MalformedEnvelope`] if:
    /// - the input does not split into exactly three non-empty fields
    /// - salt or IV is not hex or does not decode to 16 bytes
    /// - the ciphertext is not base64 or is not a non-zero multiple of the block size
    pub fn parse(input: &str) -> Result<Self, SealError> {
        let fields: Vec<&str> = input.trim().split(DELIMITER).collect();

        if fields.len() != FIELD_COUNT {
            return Err(SealError::malformed(format!(
                "expected {FIELD_COUNT} fields, found {}",
                fields.len()
            )));
        }
        if fields.iter().any(|f| f.is_empty()) {
            return Err(SealError::malformed("empty field"));
        }

        let salt = decode_hex_field::<SALT_LEN>(fields[0], "salt")?;
        let iv = decode_hex_field::<IV_LEN>(fields[1], "iv")?;

        let ciphertext = STANDARD
            .decode(fields[2])
            .map_err(|_| SealError::malformed("ciphertext is not valid base64"))?;
        if ciphertext.is_empty() || ciphertext.len() % BLOCK_LEN != 0 {
            return Err(SealError::malformed(format!(
                "ciphertext length {} is not a multiple of {BLOCK_LEN}",
                ciphertext.len()
            )));
        }

        Ok(Self::new(salt, iv, ciphertext))
    }
}

fn decode_hex_field<const N: usize>(field: &str, name: &str) -> Result<[u8; N], SealError> {
    let bytes =
        hex::decode(field).map_err(|_| SealError::malformed(format!("{name} is not valid hex")))?;

    bytes.try_into().map_err(|b: Vec<u8>| {
        SealError::malformed(format!("{name} must be {N} bytes, found {}", b.len()))
    })
}

impl fmt::Display for Envelope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{DELIMITER}{}{DELIMITER}{}",
            hex::encode(self.salt),
            hex::encode(self.iv),
            STANDARD.encode(&self.ciphertext)
        )
    }
}

impl FromStr for Envelope {
    type Err = SealError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
