// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use thiserror::Error;

/// Structural problems in the key dump or the quote text.
#[non_exhaustive]
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ParseError {
    #[error("TPM version not found")]
    MissingVersion,
    #[error("TPM version field out of range: {0}")]
    MalformedVersion(String),
    #[error("pcrcomposite marker not found exactly once")]
    MissingPcrCompositeMarker,
    #[error("signature marker not found exactly once")]
    MissingSignatureMarker,
    #[error("signature end marker not found exactly once")]
    MissingSignatureEndMarker,
    #[error("malformed PCR value: {0}")]
    MalformedPcrHex(String),
    #[error("no PCR values in pcrcomposite block")]
    NoPcrValues,
    #[error("malformed signature value")]
    MalformedSignatureHex,
    #[error("malformed key file: {0}")]
    MalformedKeyFile(String),
}

/// Outcome of the raw RSA check when the inputs were well formed.
#[non_exhaustive]
#[derive(Error, Debug, PartialEq, Eq)]
pub enum VerifyError {
    #[error("wrong key: signature padding mismatch")]
    PaddingMismatch,
    #[error("signature does not match quote digest")]
    DigestMismatch,
    #[error("modulus of {0} bytes is too small for a quote signature")]
    ModulusTooSmall(usize),
}

#[non_exhaustive]
#[derive(Error, Debug, PartialEq, Eq)]
pub enum Error {
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),
    #[error("verification error: {0}")]
    Verify(#[from] VerifyError),
}
