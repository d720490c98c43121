// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::error::ParseError;
use once_cell::sync::Lazy;
use regex::Regex;
use rsa::BigUint;

/// Size of a SHA-1 PCR value
pub const PCR_DIGEST_SIZE: usize = 20;
pub type PcrDigest = [u8; PCR_DIGEST_SIZE];

const UNKNOWN_APP_NAME: &str = "<unknown>";
const LOG_FIELD_SEPARATOR: char = '|';
const SIGNATURE_END_MARKER: &str = "signature end";

static VERSION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"TPM version: ([0-9]+)\.([0-9]+)\.([0-9]+)\.([0-9]+)").expect("version pattern")
});
static APP_NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"app loading: (.*)").expect("app name pattern"));
static PCR_COMPOSITE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"pcrcomposite \(.*?\):").expect("pcrcomposite pattern"));
static SIGNATURE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"signature \(.*?\):").expect("signature pattern"));
static PCR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"PCR-[0-9]+:").expect("pcr pattern"));

/// A TPM quote as printed by the attesting platform.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QuoteRecord {
    version: [u8; 4],
    pcrs: Vec<PcrDigest>,
    app_name: String,
    signature: BigUint,
}

impl QuoteRecord {
    /// TPM structure version, e.g. `[1, 1, 0, 0]`
    pub fn version(&self) -> [u8; 4] {
        self.version
    }

    /// PCR values in the order they were printed
    pub fn pcr_values(&self) -> &[PcrDigest] {
        &self.pcrs
    }

    /// Name of the application being attested, `<unknown>` if it was not logged
    pub fn app_name(&self) -> &str {
        &self.app_name
    }

    /// Raw RSA signature
    pub fn signature(&self) -> &BigUint {
        &self.signature
    }

    /// Replace the PCR values, keeping everything else.
    pub fn with_pcr_values(mut self, pcrs: Vec<PcrDigest>) -> Self {
        self.pcrs = pcrs;
        self
    }
}

/// Parse a quote from the textual output of the quoting tool.
///
/// The text may be a multiplexed log where each line looks like
/// `source | payload`. If `log_name` is given only lines whose first field
/// contains it are considered. In every case only the last `|` separated
/// field of a line is parsed.
///
/// # Arguments
///
/// * `text` - Raw output, possibly interleaved with other log sources
///
/// * `log_name` - Optional filter on the first field of each line
pub fn parse_quote(text: &str, log_name: Option<&str>) -> Result<QuoteRecord, ParseError> {
    let working = select_payload(text, log_name);

    let version = parse_version(&working)?;
    let app_name = match APP_NAME_RE.captures(&working) {
        Some(captures) => captures[1].trim_end().to_string(),
        None => UNKNOWN_APP_NAME.to_string(),
    };

    let parts: Vec<&str> = PCR_COMPOSITE_RE.split(&working).collect();
    let [_, tail] = parts[..] else {
        return Err(ParseError::MissingPcrCompositeMarker);
    };

    let parts: Vec<&str> = SIGNATURE_RE.split(tail).collect();
    let [pcr_block, signature_block] = parts[..] else {
        return Err(ParseError::MissingSignatureMarker);
    };

    let pcrs = parse_pcr_block(pcr_block)?;
    let signature = parse_signature_block(signature_block)?;

    Ok(QuoteRecord {
        version,
        pcrs,
        app_name,
        signature,
    })
}

fn select_payload(text: &str, log_name: Option<&str>) -> String {
    let mut payload = Vec::new();
    for line in text.lines() {
        let mut fields = line.split(LOG_FIELD_SEPARATOR);
        let first = fields.next().unwrap_or_default();
        if let Some(name) = log_name {
            if !first.contains(name) {
                continue;
            }
        }
        let last = fields.last().unwrap_or(first);
        payload.push(last);
    }
    payload.join("\n")
}

fn parse_version(text: &str) -> Result<[u8; 4], ParseError> {
    let captures = VERSION_RE
        .captures(text)
        .ok_or(ParseError::MissingVersion)?;

    let mut version = [0u8; 4];
    for (i, field) in version.iter_mut().enumerate() {
        let digits = &captures[i + 1];
        *field = digits
            .parse()
            .map_err(|_| ParseError::MalformedVersion(digits.to_string()))?;
    }
    Ok(version)
}

fn parse_pcr_block(block: &str) -> Result<Vec<PcrDigest>, ParseError> {
    let block = strip_whitespace(block);

    let mut pcrs = Vec::new();
    // The fragment in front of the first marker carries no value.
    for fragment in PCR_RE.split(&block).skip(1) {
        pcrs.push(normalize_pcr(fragment)?);
    }

    if pcrs.is_empty() {
        return Err(ParseError::NoPcrValues);
    }
    Ok(pcrs)
}

/// Turn a hex PCR value into exactly [`PCR_DIGEST_SIZE`] bytes.
///
/// Short values are left padded with zeros, long values keep their trailing
/// bytes.
pub fn normalize_pcr(hex: &str) -> Result<PcrDigest, ParseError> {
    let value = parse_hex(hex).ok_or_else(|| ParseError::MalformedPcrHex(hex.to_string()))?;
    let bytes = value.to_bytes_be();

    let mut digest = [0u8; PCR_DIGEST_SIZE];
    if bytes.len() >= PCR_DIGEST_SIZE {
        digest.copy_from_slice(&bytes[bytes.len() - PCR_DIGEST_SIZE..]);
    } else {
        digest[PCR_DIGEST_SIZE - bytes.len()..].copy_from_slice(&bytes);
    }
    Ok(digest)
}

fn parse_signature_block(block: &str) -> Result<BigUint, ParseError> {
    let parts: Vec<&str> = block.split(SIGNATURE_END_MARKER).collect();
    let [signature, _] = parts[..] else {
        return Err(ParseError::MissingSignatureEndMarker);
    };
    parse_hex(&strip_whitespace(signature)).ok_or(ParseError::MalformedSignatureHex)
}

fn parse_hex(hex: &str) -> Option<BigUint> {
    if hex.is_empty() || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    BigUint::parse_bytes(hex.as_bytes(), 16)
}

fn strip_whitespace(text: &str) -> String {
    text.chars().filter(|c| !c.is_whitespace()).collect()
}
