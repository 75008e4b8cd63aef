// Copyright (c) 2020,2021, Jason Fritcher <jkf@wolfnet.org>
// All rights reserved.

use std::fmt;

use tracing::{debug, trace};

use crate::{
    cipher::{AesEcb, BlockPrimitive},
    error::{KeyWrapError, KeyWrapResult},
    types::{KekSize, BLOCK_LEN, DEFAULT_IV},
    unwrap::{unwrap_with_iv, unwrap_with_padding},
    wrap::{wrap_with_iv, wrap_with_padding},
};

/// AES key wrap bound to one KEK size.
///
/// Every operation first checks that the KEK is exactly
/// [`KekSize::key_len`] octets; a KEK of any other size is rejected with
/// [`KeyWrapError::InvalidKekSize`] before the block cipher is touched.
///
/// ```
/// use aes_kw_rfc::AesKeyWrap;
///
/// let kw = AesKeyWrap::aes128();
/// let kek = [0x42u8; 16];
/// let ct = kw.wrap_pad(b"secret", &kek).unwrap();
/// assert_eq!(ct.len(), 16);
/// assert_eq!(kw.unwrap_pad(&ct, &kek).unwrap(), b"secret");
/// ```
#[derive(Clone)]
pub struct AesKeyWrap<C = AesEcb> {
    kek_size: KekSize,
    iv: [u8; BLOCK_LEN],
    cipher: C,
}

impl AesKeyWrap<AesEcb> {
    pub fn new(kek_size: KekSize) -> Self {
        AesKeyWrap {
            kek_size,
            iv: DEFAULT_IV,
            cipher: AesEcb,
        }
    }

    pub fn aes128() -> Self {
        Self::new(KekSize::Aes128)
    }

    pub fn aes192() -> Self {
        Self::new(KekSize::Aes192)
    }

    pub fn aes256() -> Self {
        Self::new(KekSize::Aes256)
    }
}

impl<C: BlockPrimitive> AesKeyWrap<C> {
    /// Replace the RFC 3394 initial value. Only used by [`wrap`](Self::wrap)
    /// and [`unwrap`](Self::unwrap); the padded variants always use the AIV.
    pub fn with_iv(mut self, iv: &[u8]) -> KeyWrapResult<Self> {
        if iv.len() != BLOCK_LEN {
            debug!(iv_len = iv.len(), "rejecting IV");
            return Err(KeyWrapError::InvalidIv { len: iv.len() });
        }
        self.iv.copy_from_slice(iv);
        Ok(self)
    }

    /// Run on a different block cipher backend.
    pub fn with_cipher<D: BlockPrimitive>(self, cipher: D) -> AesKeyWrap<D> {
        AesKeyWrap {
            kek_size: self.kek_size,
            iv: self.iv,
            cipher,
        }
    }

    pub fn kek_size(&self) -> KekSize {
        self.kek_size
    }

    pub fn iv(&self) -> &[u8; BLOCK_LEN] {
        &self.iv
    }

    pub fn cipher_id(&self) -> &'static str {
        self.kek_size.cipher_id()
    }

    fn check_kek_size(&self, kek: &[u8]) -> KeyWrapResult<()> {
        let expected = self.kek_size.key_len();
        if kek.len() != expected {
            debug!(kek_size = %self.kek_size, actual = kek.len(), "rejecting KEK");
            return Err(KeyWrapError::InvalidKekSize {
                expected,
                actual: kek.len(),
            });
        }
        Ok(())
    }

    /// Wrap `key` (at least 16 octets, a multiple of 8) under `kek` per RFC 3394.
    pub fn wrap(&self, key: &[u8], kek: &[u8]) -> KeyWrapResult<Vec<u8>> {
        trace!(kek_size = %self.kek_size, len = key.len(), "wrap");
        self.check_kek_size(kek)?;
        wrap_with_iv(&self.cipher, kek, &self.iv, key)
    }

    /// Reverse [`wrap`](Self::wrap), verifying the integrity value.
    pub fn unwrap(&self, ciphertext: &[u8], kek: &[u8]) -> KeyWrapResult<Vec<u8>> {
        trace!(kek_size = %self.kek_size, len = ciphertext.len(), "unwrap");
        self.check_kek_size(kek)?;
        unwrap_with_iv(&self.cipher, kek, &self.iv, ciphertext)
    }

    /// Wrap a key of any non-empty length under `kek` per RFC 5649.
    pub fn wrap_pad(&self, key: &[u8], kek: &[u8]) -> KeyWrapResult<Vec<u8>> {
        trace!(kek_size = %self.kek_size, len = key.len(), "wrap_pad");
        self.check_kek_size(kek)?;
        wrap_with_padding(&self.cipher, kek, key)
    }

    /// Reverse [`wrap_pad`](Self::wrap_pad), verifying the AIV, length and padding.
    pub fn unwrap_pad(&self, ciphertext: &[u8], kek: &[u8]) -> KeyWrapResult<Vec<u8>> {
        trace!(kek_size = %self.kek_size, len = ciphertext.len(), "unwrap_pad");
        self.check_kek_size(kek)?;
        unwrap_with_padding(&self.cipher, kek, ciphertext)
    }
}

impl<C> fmt::Debug for AesKeyWrap<C> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("AesKeyWrap")
            .field("kek_size", &self.kek_size)
            .field("iv", &self.iv)
            .finish()
    }
}
