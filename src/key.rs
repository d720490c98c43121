// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::error::ParseError;
use once_cell::sync::Lazy;
use regex::Regex;
use rsa::pkcs8::DecodePublicKey;
use rsa::{BigUint, PublicKeyParts, RsaPublicKey};
use std::str::FromStr;

const EXPONENT_MARKER: &str = "Exponent";

// Matched against the whitespace-free text in front of the exponent marker.
static MODULUS_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"Modulus(?:\([^)]*\))?:?((?:[0-9A-Fa-f]{1,2}:)*[0-9A-Fa-f]{1,2}):?$")
        .expect("modulus pattern")
});
static EXPONENT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^:[ \t]*([0-9]+)\b").expect("exponent pattern"));

/// RSA public key used to check a quote signature.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PublicKey {
    modulus: BigUint,
    exponent: BigUint,
}

impl PublicKey {
    /// Build a key, enforcing `modulus > exponent > 1`.
    pub fn new(modulus: BigUint, exponent: BigUint) -> Result<Self, ParseError> {
        if exponent <= BigUint::from(1u32) || modulus <= exponent {
            return Err(ParseError::MalformedKeyFile(
                "expected modulus > exponent > 1".into(),
            ));
        }
        Ok(Self { modulus, exponent })
    }

    /// Parse a key from a PEM encoded SubjectPublicKeyInfo.
    pub fn from_pem(pem: &str) -> Result<Self, ParseError> {
        let key = RsaPublicKey::from_public_key_pem(pem)
            .map_err(|e| ParseError::MalformedKeyFile(e.to_string()))?;
        Self::try_from(&key)
    }

    pub fn modulus(&self) -> &BigUint {
        &self.modulus
    }

    pub fn exponent(&self) -> &BigUint {
        &self.exponent
    }

    /// Byte length of the modulus
    pub fn size(&self) -> usize {
        self.modulus.bits().div_ceil(8)
    }
}

impl TryFrom<&RsaPublicKey> for PublicKey {
    type Error = ParseError;

    fn try_from(key: &RsaPublicKey) -> Result<Self, Self::Error> {
        Self::new(key.n().clone(), key.e().clone())
    }
}

impl FromStr for PublicKey {
    type Err = ParseError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        parse_key(text)
    }
}

/// Read a key from a textual dump such as the one printed by
/// `openssl rsa -pubin -text -noout`.
///
/// The dump must contain `Modulus <hex:hex:...>` followed by
/// `Exponent: <decimal> (<anything>)`.
pub fn parse_key(text: &str) -> Result<PublicKey, ParseError> {
    let (head, tail) = text
        .split_once(EXPONENT_MARKER)
        .ok_or_else(|| ParseError::MalformedKeyFile("exponent not found".into()))?;

    let head: String = head.chars().filter(|c| !c.is_whitespace()).collect();
    let captures = MODULUS_RE
        .captures(&head)
        .ok_or_else(|| ParseError::MalformedKeyFile("modulus not found".into()))?;
    let modulus_hex = captures[1].replace(':', "");
    let modulus = BigUint::parse_bytes(modulus_hex.as_bytes(), 16)
        .ok_or_else(|| ParseError::MalformedKeyFile("modulus is not hex".into()))?;

    let captures = EXPONENT_RE
        .captures(tail)
        .ok_or_else(|| ParseError::MalformedKeyFile("exponent is not decimal".into()))?;
    let exponent = BigUint::parse_bytes(captures[1].as_bytes(), 10)
        .ok_or_else(|| ParseError::MalformedKeyFile("exponent is not decimal".into()))?;

    PublicKey::new(modulus, exponent)
}
