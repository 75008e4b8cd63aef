// Copyright (c) 2020, Jason Fritcher <jkf@wolfnet.org>
// All rights reserved.

use tracing::debug;
use zeroize::Zeroize;

use crate::{
    cipher::{be_u64, join64, lsb64, msb64, xor64, BlockPrimitive},
    error::{KeyWrapError, KeyWrapResult},
    padding,
    types::{AES_BLOCK_LEN, BLOCK_LEN, ROUNDS},
};

/// RFC 3394 wrap of `pt` with integrity seed `iv`.
pub(crate) fn wrap_with_iv<C>(
    cipher: &C,
    kek: &[u8],
    iv: &[u8; BLOCK_LEN],
    pt: &[u8],
) -> KeyWrapResult<Vec<u8>>
where
    C: BlockPrimitive + ?Sized,
{
    let pt_len = match pt.len() {
        pt_len if (pt_len % BLOCK_LEN) > 0 => {
            debug!(pt_len, "rejecting unaligned plaintext");
            return Err(KeyWrapError::InvalidKeyLength(
                "Plaintext length must be a multiple of 8 octets in length".into(),
            ));
        }
        pt_len => pt_len, // pt should be a multiple of BLOCK_LEN
    };

    if pt_len / BLOCK_LEN < 2 {
        // pt must be at least 2 blocks in size
        debug!(pt_len, "rejecting short plaintext");
        return Err(KeyWrapError::InvalidKeyLength(
            "Plaintext length must be atleast 16 octets".into(),
        ));
    }

    // Because we're encrypting in place, copy A and pt into ct
    let mut ct = vec![0u8; BLOCK_LEN + pt_len];
    ct[..BLOCK_LEN].copy_from_slice(iv);
    ct[BLOCK_LEN..].copy_from_slice(pt);

    if let Err(e) = wrap_blocks(cipher, kek, &mut ct) {
        ct.zeroize();
        return Err(e);
    }

    Ok(ct)
}

/// RFC 5649 wrap of `pt`, any non-empty length.
pub(crate) fn wrap_with_padding<C>(cipher: &C, kek: &[u8], pt: &[u8]) -> KeyWrapResult<Vec<u8>>
where
    C: BlockPrimitive + ?Sized,
{
    let aiv = padding::aiv(pt.len()).map_err(|e| {
        debug!(pt_len = pt.len(), error = %e, "rejecting plaintext for padded wrap");
        e
    })?;
    let padded_len = padding::padded_len(pt.len());

    // Padding happens automatically if pt isn't a block length
    let mut ct = vec![0u8; BLOCK_LEN + padded_len];
    ct[..BLOCK_LEN].copy_from_slice(&aiv);
    ct[BLOCK_LEN..BLOCK_LEN + pt.len()].copy_from_slice(pt);

    let res = if padded_len == BLOCK_LEN {
        // Single semiblock: C[0] | C[1] = ENC(K, AIV | P[1])
        let mut b = join64(&aiv, &ct[BLOCK_LEN..]);
        let res = cipher.encrypt_block(kek, &mut b);
        ct.copy_from_slice(&b);
        b.zeroize();
        res
    } else {
        wrap_blocks(cipher, kek, &mut ct)
    };

    if let Err(e) = res {
        ct.zeroize();
        return Err(e);
    }

    Ok(ct)
}

/// Six rounds of `W` over `buf = A | R[1] | ... | R[n]`, in place.
///
/// `buf` must hold at least two semiblocks.
pub(crate) fn wrap_blocks<C>(cipher: &C, kek: &[u8], buf: &mut [u8]) -> KeyWrapResult<()>
where
    C: BlockPrimitive + ?Sized,
{
    debug_assert!(buf.len() >= AES_BLOCK_LEN && buf.len() % BLOCK_LEN == 0);
    let n = buf.len() / BLOCK_LEN - 1;

    #[allow(non_snake_case)]
    let mut A = [0u8; BLOCK_LEN];
    A.copy_from_slice(&buf[..BLOCK_LEN]);

    for j in 0..ROUNDS {
        for i in 1..=n {
            let idx = i * BLOCK_LEN;

            // B = AES(K, A | R[i])
            #[allow(non_snake_case)]
            let mut B = join64(&A, &buf[idx..idx + BLOCK_LEN]);
            cipher.encrypt_block(kek, &mut B)?;

            // A = MSB(64, B) ^ t where t = (n*j)+i
            A = xor64(msb64(&B), &be_u64((n * j) + i)?);

            // R[i] = LSB(64, B)
            buf[idx..idx + BLOCK_LEN].copy_from_slice(&lsb64(&B));
            B.zeroize();
        }
    }

    // Put A into output
    buf[..BLOCK_LEN].copy_from_slice(&A);
    Ok(())
}
