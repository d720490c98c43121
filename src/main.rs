// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use anyhow::{Context, Result};
use clap::Parser;
use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;
use std::process::ExitCode;
use tpm_quote_verify::report::Report;
use tpm_quote_verify::{key, quote, PublicKey};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Public attestation key, as printed by `openssl rsa -pubin -text -noout`
    key_file: PathBuf,

    /// The key file is a PEM encoded public key
    #[arg(long)]
    pem: bool,

    #[command(flatten)]
    nonce: Nonce,

    /// Only consider log lines whose source field contains this name
    #[arg(short, long)]
    log_name: Option<String>,

    /// Print the verification report as JSON
    #[arg(long)]
    json: bool,

    /// Log intermediate digests
    #[arg(short, long)]
    verbose: bool,
}

#[derive(clap::Args)]
#[group(required = true, multiple = false)]
struct Nonce {
    /// Challenge the quote was requested with
    #[arg(short, long)]
    nonce: Option<String>,

    /// Challenge the quote was requested with, hex encoded
    #[arg(long)]
    nonce_hex: Option<String>,
}

impl Nonce {
    fn bytes(&self) -> Result<Vec<u8>> {
        match (&self.nonce, &self.nonce_hex) {
            (Some(nonce), _) => Ok(nonce.as_bytes().to_vec()),
            (None, Some(nonce)) => hex::decode(nonce).context("nonce is not hex"),
            (None, None) => anyhow::bail!("no nonce given"),
        }
    }
}

fn main() -> Result<ExitCode> {
    let args = Args::parse();

    let level = if args.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let key_text = fs::read_to_string(&args.key_file)
        .with_context(|| format!("reading {}", args.key_file.display()))?;
    let key = if args.pem {
        PublicKey::from_pem(&key_text)?
    } else {
        key::parse_key(&key_text)?
    };

    let mut quote_text = String::new();
    io::stdin()
        .read_to_string(&mut quote_text)
        .context("reading quote from stdin")?;
    let quote = quote::parse_quote(&quote_text, args.log_name.as_deref())?;

    let nonce = args.nonce.bytes()?;
    let report = Report::evaluate(&key, &quote, &nonce);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else if args.verbose {
        println!("{report}");
    }

    if report.signature_match {
        println!("signature match");
        Ok(ExitCode::SUCCESS)
    } else {
        println!("signature does not match");
        Ok(ExitCode::FAILURE)
    }
}
