// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::digest::Sha1Digest;
use crate::error::VerifyError;
use crate::key::PublicKey;
use crate::quote::QuoteRecord;
use serde::Serialize;
use std::fmt;

/// Summary of a single quote verification
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub app_name: String,
    pub version: String,
    pub pcrs: Vec<String>,
    pub quote_digest: String,
    pub signature_match: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<String>,
}

impl Report {
    pub fn new(
        quote: &QuoteRecord,
        quote_digest: &Sha1Digest,
        outcome: &Result<(), VerifyError>,
    ) -> Self {
        let [a, b, c, d] = quote.version();
        Report {
            app_name: quote.app_name().to_string(),
            version: format!("{a}.{b}.{c}.{d}"),
            pcrs: quote.pcr_values().iter().map(hex::encode).collect(),
            quote_digest: hex::encode(quote_digest),
            signature_match: outcome.is_ok(),
            failure: outcome.as_ref().err().map(ToString::to_string),
        }
    }

    /// Verify `quote` and summarize the outcome.
    pub fn evaluate(key: &PublicKey, quote: &QuoteRecord, nonce: &[u8]) -> Self {
        let digest = crate::quote_digest_for(quote, nonce);
        let outcome = crate::verify_quote(key, quote, nonce).map(|_| ());
        Self::new(quote, &digest, &outcome)
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "App name:        {}", self.app_name)?;
        writeln!(f, "TPM version:     {}", self.version)?;
        for (i, pcr) in self.pcrs.iter().enumerate() {
            writeln!(f, "PCR value {i:>2}:    {pcr}")?;
        }
        writeln!(f, "Quote digest:    {}", self.quote_digest)?;
        match &self.failure {
            Some(failure) => write!(f, "Result:          {failure}"),
            None => write!(f, "Result:          ok"),
        }
    }
}
