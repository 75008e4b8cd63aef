// Copyright (c) 2020,2021, Jason Fritcher <jkf@wolfnet.org>
// All rights reserved.

//! Single-block cipher capability the wrap rounds run on, and the 64-bit
//! helpers used to split and recombine its blocks.

use aes::cipher::generic_array::GenericArray;
use aes::{BlockDecrypt, BlockEncrypt, NewBlockCipher};
use block_modes::BlockMode;

use crate::{
    error::{KeyWrapError, KeyWrapResult},
    types::{Aes128, Aes192, Aes256, Ecb, NoPadding, AES_BLOCK_LEN, BLOCK_LEN},
};

/// One native 128-bit cipher block, i.e. `A | R[i]`.
pub type Block = [u8; AES_BLOCK_LEN];

/// A raw block cipher keyed per call by the KEK.
///
/// Implementations process exactly one block in place with no chaining and
/// no padding of their own. Any failure is reported as
/// [`KeyWrapError::CipherOperationFailed`].
pub trait BlockPrimitive {
    fn encrypt_block(&self, kek: &[u8], block: &mut Block) -> KeyWrapResult<()>;
    fn decrypt_block(&self, kek: &[u8], block: &mut Block) -> KeyWrapResult<()>;
}

impl<T: BlockPrimitive + ?Sized> BlockPrimitive for &T {
    fn encrypt_block(&self, kek: &[u8], block: &mut Block) -> KeyWrapResult<()> {
        (**self).encrypt_block(kek, block)
    }

    fn decrypt_block(&self, kek: &[u8], block: &mut Block) -> KeyWrapResult<()> {
        (**self).decrypt_block(kek, block)
    }
}

/// AES-ECB without padding, picking AES-128/192/256 from the KEK length.
#[derive(Clone, Copy, Debug, Default)]
pub struct AesEcb;

impl BlockPrimitive for AesEcb {
    fn encrypt_block(&self, kek: &[u8], block: &mut Block) -> KeyWrapResult<()> {
        match kek.len() {
            16 => ecb_encrypt::<Aes128>(kek, block),
            24 => ecb_encrypt::<Aes192>(kek, block),
            32 => ecb_encrypt::<Aes256>(kek, block),
            len => Err(rejected_key(len)),
        }
    }

    fn decrypt_block(&self, kek: &[u8], block: &mut Block) -> KeyWrapResult<()> {
        match kek.len() {
            16 => ecb_decrypt::<Aes128>(kek, block),
            24 => ecb_decrypt::<Aes192>(kek, block),
            32 => ecb_decrypt::<Aes256>(kek, block),
            len => Err(rejected_key(len)),
        }
    }
}

fn rejected_key(len: usize) -> KeyWrapError {
    KeyWrapError::CipherOperationFailed(format!(
        "failed to create AES context: unsupported {}-octet key",
        len
    ))
}

fn ecb_context<C>(kek: &[u8]) -> KeyWrapResult<Ecb<C, NoPadding>>
where
    C: NewBlockCipher + BlockEncrypt + BlockDecrypt,
{
    let key = GenericArray::from_exact_iter(kek.iter().copied())
        .ok_or_else(|| rejected_key(kek.len()))?;
    Ok(Ecb::new(C::new(&key), &Default::default()))
}

fn ecb_encrypt<C>(kek: &[u8], block: &mut Block) -> KeyWrapResult<()>
where
    C: NewBlockCipher + BlockEncrypt + BlockDecrypt,
{
    // Modifies block in place
    ecb_context::<C>(kek)?.encrypt(&mut block[..], AES_BLOCK_LEN)?;
    Ok(())
}

fn ecb_decrypt<C>(kek: &[u8], block: &mut Block) -> KeyWrapResult<()>
where
    C: NewBlockCipher + BlockEncrypt + BlockDecrypt,
{
    // Modifies block in place
    ecb_context::<C>(kek)?.decrypt(&mut block[..])?;
    Ok(())
}

/// `A | R`
pub(crate) fn join64(a: &[u8; BLOCK_LEN], r: &[u8]) -> Block {
    let mut b = [0u8; AES_BLOCK_LEN];
    b[..BLOCK_LEN].copy_from_slice(a);
    b[BLOCK_LEN..].copy_from_slice(r);
    b
}

/// MSB(64, B)
pub(crate) fn msb64(b: &Block) -> [u8; BLOCK_LEN] {
    let mut out = [0u8; BLOCK_LEN];
    out.copy_from_slice(&b[..BLOCK_LEN]);
    out
}

/// LSB(64, B)
pub(crate) fn lsb64(b: &Block) -> [u8; BLOCK_LEN] {
    let mut out = [0u8; BLOCK_LEN];
    out.copy_from_slice(&b[BLOCK_LEN..]);
    out
}

/// Round counter `t` as a 64-bit big-endian integer, whatever the host width.
pub(crate) fn be_u64(t: usize) -> KeyWrapResult<[u8; BLOCK_LEN]> {
    u64::try_from(t)
        .map(u64::to_be_bytes)
        .map_err(|_| KeyWrapError::KeyTooLarge { len: t })
}

pub(crate) fn xor64(mut a: [u8; BLOCK_LEN], b: &[u8; BLOCK_LEN]) -> [u8; BLOCK_LEN] {
    a.iter_mut().zip(b.iter()).for_each(|(x1, x2)| *x1 ^= *x2);
    a
}
