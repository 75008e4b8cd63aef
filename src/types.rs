// Copyright (c) 2020,2021, Jason Fritcher <jkf@wolfnet.org>
// All rights reserved.

use std::fmt;

pub(crate) use aes::{Aes128, Aes192, Aes256};
pub(crate) use block_modes::{block_padding::NoPadding, Ecb};

/// Size of one wrap semiblock (64 bits).
pub const BLOCK_LEN: usize = 8;
/// Native AES block size (128 bits), i.e. `A | R[i]`.
pub const AES_BLOCK_LEN: usize = 16;

/// Number of wrap rounds over the register.
pub(crate) const ROUNDS: usize = 6;

/// RFC 3394 section 2.2.3.1 default initial value.
pub const DEFAULT_IV: [u8; BLOCK_LEN] = [0xa6; BLOCK_LEN];
/// RFC 5649 section 3 constant high half of the alternative initial value.
pub const AIV_PREFIX: [u8; 4] = [0xa6, 0x59, 0x59, 0xa6];

/// KEK size class. Fixes both the KEK length and the AES variant used.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum KekSize {
    Aes128,
    Aes192,
    Aes256,
}

impl KekSize {
    /// Required KEK length in octets.
    pub const fn key_len(self) -> usize {
        match self {
            KekSize::Aes128 => 16,
            KekSize::Aes192 => 24,
            KekSize::Aes256 => 32,
        }
    }

    /// Identifier of the single-block cipher this class runs on.
    pub const fn cipher_id(self) -> &'static str {
        match self {
            KekSize::Aes128 => "aes-128-ecb",
            KekSize::Aes192 => "aes-192-ecb",
            KekSize::Aes256 => "aes-256-ecb",
        }
    }
}

impl fmt::Display for KekSize {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.cipher_id())
    }
}

#[cfg(test)]
mod tests {
    use super::KekSize;

    #[test]
    fn test_kek_size_lengths() {
        assert_eq!(KekSize::Aes128.key_len(), 16);
        assert_eq!(KekSize::Aes192.key_len(), 24);
        assert_eq!(KekSize::Aes256.key_len(), 32);
    }

    #[test]
    fn test_kek_size_display() {
        assert_eq!(KekSize::Aes192.to_string(), "aes-192-ecb");
    }
}
