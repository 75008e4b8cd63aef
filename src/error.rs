// Copyright (c) 2020, Jason Fritcher <jkf@wolfnet.org>
// All rights reserved.

use thiserror::Error;

pub type KeyWrapResult<T> = Result<T, KeyWrapError>;

/// Everything that can go wrong while wrapping or unwrapping.
///
/// Input mistakes and integrity failures are kept apart from
/// [`KeyWrapError::CipherOperationFailed`], which points at the environment
/// rather than the caller's data.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum KeyWrapError {
    #[error("IV must be exactly 8 octets in length, got {len}")]
    InvalidIv { len: usize },

    #[error("Invalid plaintext length: {0}")]
    InvalidKeyLength(String),

    #[error("Plaintext length must be atleast 1 octet")]
    EmptyKey,

    #[error("Plaintext length {len} does not fit in a 32-bit message length indicator")]
    KeyTooLarge { len: usize },

    #[error("KEK must be {expected} octets in length, got {actual}")]
    InvalidKekSize { expected: usize, actual: usize },

    #[error("Ciphertext length must be a multiple of 8 octets, got {len}")]
    InvalidCiphertextLength { len: usize },

    #[error("Ciphertext holds no wrapped blocks")]
    NoBlocks,

    #[error("Failed to successfully unwrap key: integrity check failed")]
    IntegrityCheckFailed,

    #[error("Message length indicator {mli} is inconsistent with {n} wrapped blocks")]
    InvalidMessageLength { mli: usize, n: usize },

    #[error("Failed to successfully unwrap key: non-zero padding")]
    InvalidPadding,

    #[error("Block cipher operation failed: {0}")]
    CipherOperationFailed(String),
}

impl KeyWrapError {
    /// True when the failure came from the block cipher rather than the input.
    pub fn is_cipher_failure(&self) -> bool {
        matches!(self, KeyWrapError::CipherOperationFailed(_))
    }
}

impl From<block_modes::BlockModeError> for KeyWrapError {
    fn from(e: block_modes::BlockModeError) -> Self {
        KeyWrapError::CipherOperationFailed(format!("failed to process data block: {}", e))
    }
}
