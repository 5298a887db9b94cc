//! Cryptographic primitives behind the envelope.
//!
//! Random generation, PBKDF2 key derivation and AES-256-CBC encryption.
//! Every size and cost parameter lives here so the seal and open paths
//! cannot drift apart.

pub mod cipher;
pub mod kdf;
pub mod random;

pub use cipher::{decrypt, encrypt};
pub use kdf::derive_key;
pub use random::{generate_iv, generate_salt, random_bytes};

/// Length of the salt (16 bytes).
pub const SALT_LEN: usize = 16;
/// Length of the initialization vector (16 bytes, one AES block).
pub const IV_LEN: usize = 16;
/// Length of the derived encryption key (32 bytes / 256 bits).
pub const KEY_LEN: usize = 32;
/// AES block size; ciphertext length is always a multiple of this.
pub const BLOCK_LEN: usize = 16;
/// PBKDF2-HMAC-SHA256 iteration count.
pub const PBKDF2_ITERATIONS: u32 = 10_000;
/// Entropy of a standalone key (16 bytes, 32 hex characters).
pub const STANDALONE_KEY_LEN: usize = 16;
