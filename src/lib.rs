// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//!  This library verifies TPM 1.2 quotes that were captured as text, e.g. from a
//!  serial console or a multiplexed boot log. The quote's PCR composite and
//!  the digest the TPM signed are reconstructed byte for byte, then checked
//!  against a raw RSA signature with the attestation key's public part.
//!
//!  # Quote Verification
//!
//!  The following code reads an attestation key dump and a quote log, and
//!  verifies that the quote was produced for the given challenge.
//!
//!  #
//!  ```no_run
//!  use tpm_quote_verify::{key, quote, verify_quote};
//!  use std::error::Error;
//!  use std::fs;
//!
//!  fn main() -> Result<(), Box<dyn Error>> {
//!    let key = key::parse_key(&fs::read_to_string("akpub.txt")?)?;
//!    let log = fs::read_to_string("quote.log")?;
//!    let quote = quote::parse_quote(&log, Some("quote"))?;
//!
//!    verify_quote(&key, &quote, b"challenge")?;
//!
//!    Ok(())
//!  }
//!  ```

pub mod digest;
pub mod error;
pub mod key;
pub mod quote;
pub mod report;
pub mod verify;

pub use error::{Error, ParseError, VerifyError};
pub use key::PublicKey;
pub use quote::QuoteRecord;

use digest::Sha1Digest;
use log::{debug, info, warn};

/// Compute the digest a TPM signs when quoting `quote`'s PCR values for `nonce`.
pub fn quote_digest_for(quote: &QuoteRecord, nonce: &[u8]) -> Sha1Digest {
    let composite = digest::pcr_composite_hash(quote.pcr_values());
    debug!("pcr composite hash: {}", hex::encode(composite));
    let digest = digest::quote_digest(quote.version(), &composite, nonce);
    debug!("quote digest: {}", hex::encode(digest));
    digest
}

/// Verify a Quote's signature against a public key and a challenge
///
/// # Arguments
///
/// * `key` - The attestation key's public part
///
/// * `quote` - A parsed quote
///
/// * `nonce` - The challenge the quote is expected to be bound to
///
/// Returns the verified quote digest.
pub fn verify_quote(
    key: &PublicKey,
    quote: &QuoteRecord,
    nonce: &[u8],
) -> Result<Sha1Digest, VerifyError> {
    let digest = quote_digest_for(quote, nonce);
    match verify::verify_signature(key, quote.signature(), &digest) {
        Ok(()) => {
            info!("quote of {} verified", quote.app_name());
            Ok(digest)
        }
        Err(e) => {
            warn!("quote of {} rejected: {e}", quote.app_name());
            Err(e)
        }
    }
}

/// Parse a key dump and a quote log, then verify the quote.
///
/// # Arguments
///
/// * `key_text` - Key dump, see [`key::parse_key`]
///
/// * `quote_text` - Quote output, see [`quote::parse_quote`]
///
/// * `log_name` - Optional log source filter
///
/// * `nonce` - The challenge the quote is expected to be bound to
pub fn verify_quote_text(
    key_text: &str,
    quote_text: &str,
    log_name: Option<&str>,
    nonce: &[u8],
) -> Result<QuoteRecord, Error> {
    let key = key::parse_key(key_text)?;
    let quote = quote::parse_quote(quote_text, log_name)?;
    verify_quote(&key, &quote, nonce)?;
    Ok(quote)
}
