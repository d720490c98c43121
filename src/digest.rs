// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Reconstruction of the value a TPM 1.2 signs for a quote.

use crate::quote::{PcrDigest, PCR_DIGEST_SIZE};
use sha1::{Digest, Sha1};

pub const SHA1_DIGEST_SIZE: usize = 20;
pub type Sha1Digest = [u8; SHA1_DIGEST_SIZE];

// Two bytes of selection bitmap, all set.
const PCR_SELECT_SIZE: u16 = 2;
const PCR_SELECT_ALL: u16 = 0xffff;
const QUOTE_TAG: &[u8; 4] = b"QUOT";

/// SHA-1 over the composite structure of the given PCR values:
/// `select size (u16) | selection (u16) | value size (u32) | values`,
/// all big-endian.
pub fn pcr_composite_hash(pcrs: &[PcrDigest]) -> Sha1Digest {
    let value_size = (pcrs.len() * PCR_DIGEST_SIZE) as u32;

    let mut hasher = Sha1::new();
    hasher.update(PCR_SELECT_SIZE.to_be_bytes());
    hasher.update(PCR_SELECT_ALL.to_be_bytes());
    hasher.update(value_size.to_be_bytes());
    for pcr in pcrs {
        hasher.update(pcr);
    }
    hasher.finalize().into()
}

/// The digest a TPM signs for a quote
///
/// # Arguments
///
/// * `version` - Structure version reported by the TPM
///
/// * `composite` - Output of [`pcr_composite_hash`]
///
/// * `nonce` - The challenge the quote was requested with
pub fn quote_digest(version: [u8; 4], composite: &Sha1Digest, nonce: &[u8]) -> Sha1Digest {
    let external_data: Sha1Digest = Sha1::digest(nonce).into();

    let mut hasher = Sha1::new();
    hasher.update(version);
    hasher.update(QUOTE_TAG);
    hasher.update(composite);
    hasher.update(external_data);
    hasher.finalize().into()
}
