// Copyright (c) 2020,2021, Jason Fritcher <jkf@wolfnet.org>
// All rights reserved.

//! RFC 5649 alternative initial value and padding rules.

use subtle::ConstantTimeEq;

use crate::{
    error::{KeyWrapError, KeyWrapResult},
    types::{AIV_PREFIX, BLOCK_LEN},
};

/// Build `AIV = A65959A6 | MLI` for a plaintext of `pt_len` octets.
pub(crate) fn aiv(pt_len: usize) -> KeyWrapResult<[u8; BLOCK_LEN]> {
    let mli = match pt_len {
        0 => return Err(KeyWrapError::EmptyKey),
        // The MLI restricts pt_len to a u32
        len => u32::try_from(len).map_err(|_| KeyWrapError::KeyTooLarge { len })?,
    };

    let mut a = [0u8; BLOCK_LEN];
    a[..4].copy_from_slice(&AIV_PREFIX);
    a[4..].copy_from_slice(&mli.to_be_bytes());
    Ok(a)
}

/// `pt_len` rounded up to the next semiblock boundary.
pub(crate) fn padded_len(pt_len: usize) -> usize {
    pt_len
        + match pt_len % BLOCK_LEN {
            0 => 0,
            n => BLOCK_LEN - n,
        }
}

/// Validate the recovered AIV against `n` unwrapped semiblocks and return the MLI.
pub(crate) fn check_aiv(a: &[u8; BLOCK_LEN], n: usize) -> KeyWrapResult<usize> {
    if !bool::from(a[..4].ct_eq(&AIV_PREFIX)) {
        // Static part of the IV is invalid
        return Err(KeyWrapError::IntegrityCheckFailed);
    }

    let mut mli_bytes = [0u8; 4];
    mli_bytes.copy_from_slice(&a[4..]);
    let mli = u32::from_be_bytes(mli_bytes) as usize;

    if !(mli > BLOCK_LEN * (n - 1) && mli <= BLOCK_LEN * n) {
        return Err(KeyWrapError::InvalidMessageLength { mli, n });
    }
    Ok(mli)
}

/// Check that everything in `pt` past the first `mli` octets is zero.
pub(crate) fn check_padding(pt: &[u8], mli: usize) -> KeyWrapResult<()> {
    let padding = &pt[mli..];
    let zeros = [0u8; BLOCK_LEN];
    // Padding must be all zeros
    if !bool::from(padding.ct_eq(&zeros[..padding.len()])) {
        return Err(KeyWrapError::InvalidPadding);
    }
    Ok(())
}
