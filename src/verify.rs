// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::digest::{Sha1Digest, SHA1_DIGEST_SIZE};
use crate::error::VerifyError;
use crate::key::PublicKey;
use log::debug;
use rsa::BigUint;

/// Bytes at the end of the block excluded from the padding check.
const PADDING_END_OFFSET: usize = 38;
/// Bytes in front of the digest that are carried but not validated.
const UNVALIDATED_FIELD_SIZE: usize = 16;
const PADDING_BYTE: u8 = 0xff;

/// Verify a raw RSA signature over a quote digest.
///
/// The signature is raised to the public exponent and the resulting block,
/// left padded to the modulus size `L`, must consist of `0xff` in
/// `[1, L - 38)` and end with `digest`.
pub fn verify_signature(
    key: &PublicKey,
    signature: &BigUint,
    digest: &Sha1Digest,
) -> Result<(), VerifyError> {
    let size = key.size();
    if size <= PADDING_END_OFFSET {
        return Err(VerifyError::ModulusTooSmall(size));
    }

    let block = decrypt_block(key, signature);
    if !block[1..size - PADDING_END_OFFSET]
        .iter()
        .all(|b| *b == PADDING_BYTE)
    {
        return Err(VerifyError::PaddingMismatch);
    }

    debug!("unvalidated field: {}", hex::encode(unvalidated_field(&block)));

    let signed_digest = &block[size - SHA1_DIGEST_SIZE..];
    debug!("signed digest: {}", hex::encode(signed_digest));
    if signed_digest != digest {
        return Err(VerifyError::DigestMismatch);
    }
    Ok(())
}

/// `signature ^ e mod n` as a big-endian block of exactly [`PublicKey::size`] bytes
pub fn decrypt_block(key: &PublicKey, signature: &BigUint) -> Vec<u8> {
    let value = signature.modpow(key.exponent(), key.modulus());
    let bytes = value.to_bytes_be();

    let mut block = vec![0u8; key.size()];
    let offset = block.len() - bytes.len();
    block[offset..].copy_from_slice(&bytes);
    block
}

/// The 16 bytes preceding the digest in a decrypted block. Their structure
/// is not checked.
pub fn unvalidated_field(block: &[u8]) -> &[u8] {
    let end = block.len().saturating_sub(SHA1_DIGEST_SIZE);
    let start = end.saturating_sub(UNVALIDATED_FIELD_SIZE);
    &block[start..end]
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::key::parse_key;

    const SIGNER: &str = include_str!("../test/signer.txt");
    const KEY_DUMP: &str = include_str!("../test/pubkey.txt");
    const SHA1_DIGEST_INFO: [u8; 15] = [
        0x30, 0x21, 0x30, 0x09, 0x06, 0x05, 0x2b, 0x0e, 0x03, 0x02, 0x1a, 0x05, 0x00, 0x04, 0x14,
    ];

    pub(crate) struct Signer {
        pub key: PublicKey,
        private: BigUint,
    }

    impl Signer {
        pub fn load() -> Self {
            let field = |name: &str| {
                let line = SIGNER
                    .lines()
                    .find(|l| l.starts_with(name))
                    .unwrap();
                let hex = line.split_once(": ").unwrap().1;
                BigUint::parse_bytes(hex.as_bytes(), 16).unwrap()
            };
            let key = PublicKey::new(field("modulus"), field("exponent")).unwrap();
            Signer {
                key,
                private: field("private"),
            }
        }

        /// `00 | ff .. ff | 00 | DigestInfo | digest`
        pub fn block(&self, digest: &Sha1Digest) -> Vec<u8> {
            let size = self.key.size();
            let mut block = vec![PADDING_BYTE; size];
            block[0] = 0x00;
            block[size - 36] = 0x00;
            block[size - 35..size - 20].copy_from_slice(&SHA1_DIGEST_INFO);
            block[size - 20..].copy_from_slice(digest);
            block
        }

        pub fn sign_block(&self, block: &[u8]) -> BigUint {
            BigUint::from_bytes_be(block).modpow(&self.private, self.key.modulus())
        }

        pub fn sign(&self, digest: &Sha1Digest) -> BigUint {
            self.sign_block(&self.block(digest))
        }
    }

    #[test]
    fn signature_round_trip() {
        let signer = Signer::load();
        let digest = [0x5a; 20];
        let signature = signer.sign(&digest);
        assert_eq!(verify_signature(&signer.key, &signature, &digest), Ok(()));

        let block = decrypt_block(&signer.key, &signature);
        assert_eq!(block, signer.block(&digest));
        assert_eq!(unvalidated_field(&block)[1..], SHA1_DIGEST_INFO);
    }

    #[test]
    fn digest_mismatch() {
        let signer = Signer::load();
        let signature = signer.sign(&[0x5a; 20]);
        let mut other = [0x5a; 20];
        other[7] ^= 0x01;
        assert_eq!(
            verify_signature(&signer.key, &signature, &other),
            Err(VerifyError::DigestMismatch)
        );
    }

    #[test]
    fn wrong_key() {
        let signer = Signer::load();
        let digest = [0x5a; 20];
        let signature = signer.sign(&digest);
        let other_key = parse_key(KEY_DUMP).unwrap();
        assert_eq!(
            verify_signature(&other_key, &signature, &digest),
            Err(VerifyError::PaddingMismatch)
        );
    }

    #[test]
    fn padding_checked_before_digest() {
        let signer = Signer::load();
        let digest = [0x5a; 20];
        let size = signer.key.size();

        // A conventional 00 01 header fails on offset 1.
        for offset in [1, 2, size / 2, size - PADDING_END_OFFSET - 1] {
            let mut block = signer.block(&digest);
            block[offset] = 0x01;
            let signature = signer.sign_block(&block);
            assert_eq!(
                verify_signature(&signer.key, &signature, &digest),
                Err(VerifyError::PaddingMismatch),
                "offset {offset}"
            );
        }
    }

    #[test]
    fn bytes_outside_padding_range_are_ignored() {
        let signer = Signer::load();
        let digest = [0x5a; 20];
        let size = signer.key.size();

        let mut block = signer.block(&digest);
        block[size - PADDING_END_OFFSET] = 0x00;
        block[size - PADDING_END_OFFSET + 1] = 0x00;
        block[size - 30] = 0x42;
        let signature = signer.sign_block(&block);
        assert_eq!(verify_signature(&signer.key, &signature, &digest), Ok(()));
    }

    #[test]
    fn modulus_too_small() {
        let key = PublicKey::new(BigUint::from_bytes_be(&[0xff; 30]), BigUint::from(3u32)).unwrap();
        assert_eq!(
            verify_signature(&key, &BigUint::from(2u32), &[0; 20]),
            Err(VerifyError::ModulusTooSmall(30))
        );
    }
}
