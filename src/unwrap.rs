// Copyright (c) 2020, Jason Fritcher <jkf@wolfnet.org>
// All rights reserved.

use subtle::ConstantTimeEq;
use tracing::debug;
use zeroize::Zeroize;

use crate::{
    cipher::{be_u64, join64, lsb64, msb64, xor64, BlockPrimitive},
    error::{KeyWrapError, KeyWrapResult},
    padding,
    types::{AES_BLOCK_LEN, BLOCK_LEN, ROUNDS},
};

/// RFC 3394 unwrap of `ct`, checking the recovered A against `iv`.
pub(crate) fn unwrap_with_iv<C>(
    cipher: &C,
    kek: &[u8],
    iv: &[u8; BLOCK_LEN],
    ct: &[u8],
) -> KeyWrapResult<Vec<u8>>
where
    C: BlockPrimitive + ?Sized,
{
    semiblock_count(ct)?;

    let mut pt = ct.to_vec();

    // Unwrap the key into pt
    #[allow(non_snake_case)]
    let A = match unwrap_blocks(cipher, kek, &mut pt) {
        Ok(a) => a,
        Err(e) => {
            pt.zeroize();
            return Err(e);
        }
    };

    // Validate the IV
    if !bool::from(A.ct_eq(iv)) {
        debug!(ct_len = ct.len(), "integrity check failed");
        pt.zeroize();
        return Err(KeyWrapError::IntegrityCheckFailed);
    }

    pt.drain(..BLOCK_LEN);
    Ok(pt)
}

/// RFC 5649 unwrap of `ct`, returning exactly the MLI octets.
pub(crate) fn unwrap_with_padding<C>(cipher: &C, kek: &[u8], ct: &[u8]) -> KeyWrapResult<Vec<u8>>
where
    C: BlockPrimitive + ?Sized,
{
    let n = semiblock_count(ct)?;

    let mut pt = ct.to_vec();

    let res = if n == 1 {
        // Single semiblock: A | P[1] = DEC(K, C[0] | C[1])
        let mut b = [0u8; AES_BLOCK_LEN];
        b.copy_from_slice(&pt);
        let res = cipher.decrypt_block(kek, &mut b).map(|_| msb64(&b));
        pt.copy_from_slice(&b);
        b.zeroize();
        res
    } else {
        unwrap_blocks(cipher, kek, &mut pt)
    };

    // Validate the AIV, MLI and padding, in that order
    let checked = res.and_then(|a| {
        let mli = padding::check_aiv(&a, n)?;
        padding::check_padding(&pt[BLOCK_LEN..], mli)?;
        Ok(mli)
    });

    match checked {
        Ok(mli) => {
            let key = pt[BLOCK_LEN..BLOCK_LEN + mli].to_vec();
            pt.zeroize();
            Ok(key)
        }
        Err(e) => {
            debug!(ct_len = ct.len(), error = %e, "padded unwrap failed");
            pt.zeroize();
            Err(e)
        }
    }
}

/// Number of wrapped semiblocks `n` in `ct`, excluding the check block.
fn semiblock_count(ct: &[u8]) -> KeyWrapResult<usize> {
    let ct_len = ct.len();
    if ct_len % BLOCK_LEN > 0 {
        debug!(ct_len, "rejecting unaligned ciphertext");
        return Err(KeyWrapError::InvalidCiphertextLength { len: ct_len });
    }

    match (ct_len / BLOCK_LEN).checked_sub(1) {
        None | Some(0) => {
            debug!(ct_len, "rejecting ciphertext without wrapped blocks");
            Err(KeyWrapError::NoBlocks)
        }
        Some(n) => Ok(n),
    }
}

/// Six inverse rounds over `buf = C[0] | C[1] | ... | C[n]`, in place.
///
/// Leaves `A | R[1] | ... | R[n]` in `buf` and returns A. `buf` must hold
/// at least two semiblocks.
pub(crate) fn unwrap_blocks<C>(
    cipher: &C,
    kek: &[u8],
    buf: &mut [u8],
) -> KeyWrapResult<[u8; BLOCK_LEN]>
where
    C: BlockPrimitive + ?Sized,
{
    debug_assert!(buf.len() >= AES_BLOCK_LEN && buf.len() % BLOCK_LEN == 0);
    let n = buf.len() / BLOCK_LEN - 1;

    #[allow(non_snake_case)]
    let mut A = [0u8; BLOCK_LEN];
    A.copy_from_slice(&buf[..BLOCK_LEN]);

    for j in (0..ROUNDS).rev() {
        for i in (1..=n).rev() {
            let idx = i * BLOCK_LEN;

            // B = AES-1(K, (A ^ t) | R[i]) where t = (n*j)+i
            #[allow(non_snake_case)]
            let mut B = join64(&xor64(A, &be_u64((n * j) + i)?), &buf[idx..idx + BLOCK_LEN]);
            cipher.decrypt_block(kek, &mut B)?;

            // A = MSB(64, B)
            A = msb64(&B);

            // R[i] = LSB(64, B)
            buf[idx..idx + BLOCK_LEN].copy_from_slice(&lsb64(&B));
            B.zeroize();
        }
    }

    // Put A into output
    buf[..BLOCK_LEN].copy_from_slice(&A);
    Ok(A)
}

#[cfg(test)]
mod tests {
    use super::{unwrap_with_iv, unwrap_with_padding};
    use crate::{
        cipher::{fake, AesEcb, BlockPrimitive},
        error::KeyWrapError,
        types::DEFAULT_IV,
        wrap::{wrap_blocks, wrap_with_iv, wrap_with_padding},
    };

    fn unwrap(ct: &[u8], kek: &[u8]) -> Result<Vec<u8>, KeyWrapError> {
        unwrap_with_iv(&AesEcb, kek, &DEFAULT_IV, ct)
    }

    fn unwrap_pad(ct: &[u8], kek: &[u8]) -> Result<Vec<u8>, KeyWrapError> {
        unwrap_with_padding(&AesEcb, kek, ct)
    }

    #[test]
    fn test_unwrap_unaligned_ciphertext() {
        let kek = hex!("000102030405060708090A0B0C0D0E0F");
        let ct = hex!("1FA68B0A8112B447AEF34BD8FB5A7B829D3E862371D2CF");
        assert_eq!(unwrap(&ct, &kek), Err(KeyWrapError::InvalidCiphertextLength { len: 23 }));
        assert_eq!(
            unwrap_pad(&ct, &kek),
            Err(KeyWrapError::InvalidCiphertextLength { len: 23 })
        );
    }

    #[test]
    fn test_unwrap_no_blocks() {
        let kek = hex!("000102030405060708090A0B0C0D0E0F");
        assert_eq!(unwrap(&[], &kek), Err(KeyWrapError::NoBlocks));
        assert_eq!(unwrap(&[0xa6; 8], &kek), Err(KeyWrapError::NoBlocks));
        assert_eq!(unwrap_pad(&[], &kek), Err(KeyWrapError::NoBlocks));
        assert_eq!(unwrap_pad(&[0xa6; 8], &kek), Err(KeyWrapError::NoBlocks));
    }

    #[test]
    fn test_unwrap_single_wrapped_block_fails_integrity() {
        // n = 1 is not a valid RFC 3394 output, but it is rejected by the IV check only
        let kek = hex!("000102030405060708090A0B0C0D0E0F");
        assert_eq!(unwrap(&[0u8; 16], &kek), Err(KeyWrapError::IntegrityCheckFailed));
    }

    //
    // RFC3394 Test Vectors
    //
    #[test]
    fn test_unwrap_nopad_16_byte_key_16_byte_data() {
        let ct = hex!("1FA68B0A8112B447AEF34BD8FB5A7B829D3E862371D2CFE5").to_vec();
        let key = hex!("000102030405060708090A0B0C0D0E0F").to_vec();
        let pt = unwrap(&ct, &key);
        assert!(pt.is_ok(), "Test unexpectantly failed: {:?}", pt);
        assert_eq!(pt.unwrap(), hex!("00112233445566778899AABBCCDDEEFF").to_vec());
    }

    #[test]
    fn test_unwrap_nopad_24_byte_key_16_byte_data() {
        let ct = hex!("96778B25AE6CA435F92B5B97C050AED2468AB8A17AD84E5D").to_vec();
        let key = hex!("000102030405060708090A0B0C0D0E0F1011121314151617").to_vec();
        let pt = unwrap(&ct, &key);
        assert!(pt.is_ok(), "Test unexpectantly failed: {:?}", pt);
        assert_eq!(pt.unwrap(), hex!("00112233445566778899AABBCCDDEEFF").to_vec());
    }

    #[test]
    fn test_unwrap_nopad_32_byte_key_16_byte_data() {
        let ct = hex!("64E8C3F9CE0F5BA263E9777905818A2A93C8191E7D6E8AE7").to_vec();
        let key = hex!("000102030405060708090A0B0C0D0E0F101112131415161718191A1B1C1D1E1F").to_vec();
        let pt = unwrap(&ct, &key);
        assert!(pt.is_ok(), "Test unexpectantly failed: {:?}", pt);
        assert_eq!(pt.unwrap(), hex!("00112233445566778899AABBCCDDEEFF").to_vec());
    }

    #[test]
    fn test_unwrap_nopad_24_byte_key_24_byte_data() {
        let ct = hex!("031D33264E15D33268F24EC260743EDCE1C6C7DDEE725A936BA814915C6762D2").to_vec();
        let key = hex!("000102030405060708090A0B0C0D0E0F1011121314151617").to_vec();
        let pt = unwrap(&ct, &key);
        assert!(pt.is_ok(), "Test unexpectantly failed: {:?}", pt);
        assert_eq!(
            pt.unwrap(),
            hex!("00112233445566778899AABBCCDDEEFF0001020304050607").to_vec()
        );
    }

    #[test]
    fn test_unwrap_nopad_32_byte_key_24_byte_data() {
        let ct = hex!("A8F9BC1612C68B3FF6E6F4FBE30E71E4769C8B80A32CB8958CD5D17D6B254DA1").to_vec();
        let key = hex!("000102030405060708090A0B0C0D0E0F101112131415161718191A1B1C1D1E1F").to_vec();
        let pt = unwrap(&ct, &key);
        assert!(pt.is_ok(), "Test unexpectantly failed: {:?}", pt);
        assert_eq!(
            pt.unwrap(),
            hex!("00112233445566778899AABBCCDDEEFF0001020304050607").to_vec()
        );
    }

    #[test]
    fn test_unwrap_nopad_32_byte_key_32_byte_data() {
        let ct = hex!("28C9F404C4B810F4CBCCB35CFB87F8263F5786E2D80ED326CBC7F0E71A99F43BFB988B9B7A02DD21").to_vec();
        let key = hex!("000102030405060708090A0B0C0D0E0F101112131415161718191A1B1C1D1E1F").to_vec();
        let pt = unwrap(&ct, &key);
        assert!(pt.is_ok(), "Test unexpectantly failed: {:?}", pt);
        assert_eq!(
            pt.unwrap(),
            hex!("00112233445566778899AABBCCDDEEFF000102030405060708090A0B0C0D0E0F").to_vec()
        );
    }

    #[test]
    fn test_unwrap_nopad_tampered() {
        let key = hex!("000102030405060708090A0B0C0D0E0F");
        let ct = hex!("1FA68B0A8112B447AEF34BD8FB5A7B829D3E862371D2CFE5");
        for byte in 0..ct.len() {
            let mut bad = ct;
            bad[byte] ^= 0x01;
            assert_eq!(unwrap(&bad, &key), Err(KeyWrapError::IntegrityCheckFailed));
        }
    }

    #[test]
    fn test_unwrap_nopad_wrong_iv() {
        let key = hex!("000102030405060708090A0B0C0D0E0F");
        let ct = hex!("1FA68B0A8112B447AEF34BD8FB5A7B829D3E862371D2CFE5");
        let iv = hex!("a6a6a6a6a6a6a6a7");
        assert_eq!(
            unwrap_with_iv(&AesEcb, &key, &iv, &ct),
            Err(KeyWrapError::IntegrityCheckFailed)
        );
    }

    //
    // RFC5649 Test Vectors
    //
    #[test]
    fn test_unwrap_pad_24_byte_key_20_byte_data() {
        let ct = hex!("138bdeaa9b8fa7fc61f97742e72248ee5ae6ae5360d1ae6a5f54f373fa543b6a").to_vec();
        let key = hex!("5840df6e29b02af1ab493b705bf16ea1ae8338f4dcc176a8").to_vec();
        let pt = unwrap_pad(&ct, &key);
        assert!(pt.is_ok(), "Test unexpectantly failed: {:?}", pt);
        assert_eq!(
            pt.unwrap(),
            hex!("c37b7e6492584340bed12207808941155068f738").to_vec()
        );
    }

    #[test]
    fn test_unwrap_pad_24_byte_key_7_byte_data() {
        let ct = hex!("afbeb0f07dfbf5419200f2ccb50bb24f").to_vec();
        let key = hex!("5840df6e29b02af1ab493b705bf16ea1ae8338f4dcc176a8").to_vec();
        let pt = unwrap_pad(&ct, &key);
        assert!(pt.is_ok(), "Test unexpectantly failed: {:?}", pt);
        assert_eq!(pt.unwrap(), hex!("466f7250617369").to_vec());
    }

    #[test]
    fn test_unwrap_pad_tampered() {
        let key = hex!("5840df6e29b02af1ab493b705bf16ea1ae8338f4dcc176a8");
        let ct = hex!("afbeb0f07dfbf5419200f2ccb50bb24a");
        assert!(unwrap_pad(&ct, &key).is_err());
        let ct = hex!("138bdeaa9b8fa7fc61f97742e72248ee5ae6ae5360d1ae6a5f54f373fa543b6b");
        assert!(unwrap_pad(&ct, &key).is_err());
    }

    #[test]
    fn test_unwrap_pad_rejects_plain_wrap_output() {
        // A RFC 3394 ciphertext carries A6A6A6A6 where the AIV prefix belongs
        let key = hex!("000102030405060708090A0B0C0D0E0F");
        let ct = hex!("1FA68B0A8112B447AEF34BD8FB5A7B829D3E862371D2CFE5");
        assert_eq!(unwrap_pad(&ct, &key), Err(KeyWrapError::IntegrityCheckFailed));
    }

    #[test]
    fn test_unwrap_pad_bad_mli_and_padding() {
        // Hand-built AIV blocks pushed through the wrap engine with a valid prefix
        let cipher = fake::XorRotate::default();
        let kek = [0x3c; 16];

        // MLI claims 9 octets in a single semiblock
        let mut b = hex!("a65959a6000000090102030405060708");
        cipher.encrypt_block(&kek, &mut b).unwrap();
        assert_eq!(
            unwrap_with_padding(&cipher, &kek, &b),
            Err(KeyWrapError::InvalidMessageLength { mli: 9, n: 1 })
        );

        // MLI of 5 with a non-zero byte in the padding
        let mut b = hex!("a65959a6000000050102030405060708");
        cipher.encrypt_block(&kek, &mut b).unwrap();
        assert_eq!(unwrap_with_padding(&cipher, &kek, &b), Err(KeyWrapError::InvalidPadding));

        // MLI under-claims for three semiblocks
        let mut ct = hex!("a65959a600000010000000000000000000000000000000000000000000000000").to_vec();
        wrap_blocks(&cipher, &kek, &mut ct).unwrap();
        assert_eq!(
            unwrap_with_padding(&cipher, &kek, &ct),
            Err(KeyWrapError::InvalidMessageLength { mli: 16, n: 3 })
        );
    }

    //
    // Engine behaviour against a stand-in cipher
    //
    #[test]
    fn test_unwrap_inverts_wrap_with_fake_cipher() {
        let cipher = fake::XorRotate::default();
        let kek = hex!("0f1e2d3c4b5a69788796a5b4c3d2e1f0");
        for n in 2..8 {
            let pt: Vec<u8> = (0..8 * n as u8).collect();
            let ct = wrap_with_iv(&cipher, &kek, &DEFAULT_IV, &pt).unwrap();
            cipher.decrypts.set(0);
            assert_eq!(unwrap_with_iv(&cipher, &kek, &DEFAULT_IV, &ct).unwrap(), pt);
            assert_eq!(cipher.decrypts.get(), 6 * n);
        }
        for len in 1..40 {
            let pt: Vec<u8> = (0..len as u8).collect();
            let ct = wrap_with_padding(&cipher, &kek, &pt).unwrap();
            assert_eq!(unwrap_with_padding(&cipher, &kek, &ct).unwrap(), pt);
        }
    }

    #[test]
    fn test_unwrap_pad_single_block_is_one_call() {
        let cipher = fake::XorRotate::default();
        let kek = [0x5a; 16];
        let ct = wrap_with_padding(&cipher, &kek, b"abc").unwrap();
        assert_eq!(unwrap_with_padding(&cipher, &kek, &ct).unwrap(), b"abc".to_vec());
        assert_eq!(cipher.decrypts.get(), 1);
    }

    #[test]
    fn test_unwrap_surfaces_cipher_failure() {
        let kek = [0u8; 16];
        let err = unwrap_with_iv(&fake::Broken, &kek, &DEFAULT_IV, &[0u8; 24]).unwrap_err();
        assert!(err.is_cipher_failure());
        let err = unwrap_with_padding(&fake::Broken, &kek, &[0u8; 16]).unwrap_err();
        assert!(err.is_cipher_failure());
    }
}
