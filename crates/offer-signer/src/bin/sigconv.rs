//! sigconv: convert KMS signatures and keys to the forms the chain expects.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use offer_signer::config::parse_signature_prefix;
use offer_signer::{normalize_s_hex, CodecConfig, CompressedPublicKey, SignatureCodec};
use offer_telemetry::{init_telemetry, TelemetryConfig};

/// sigconv: KMS signature conversion
#[derive(Parser, Debug)]
#[command(name = "sigconv")]
#[command(about = "Convert KMS DER signatures to fixed-width r||s")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Convert base64 DER (or r||s) signatures to canonical hex
    Convert {
        /// Base64 signatures
        #[arg(required = true)]
        signatures: Vec<String>,

        /// Hex prefix placed in front of every signature
        #[arg(long, default_value = "")]
        prefix: String,
    },

    /// Bring a hex `s` value into the low half of the curve order
    NormalizeS {
        /// Hex-encoded s
        s: String,
    },

    /// Print the compressed public key of a PEM SubjectPublicKeyInfo
    CompressKey {
        /// PEM file
        pem: PathBuf,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();

    init_telemetry(&TelemetryConfig::for_component("sigconv"))?;

    match args.command {
        Command::Convert { signatures, prefix } => {
            let prefix = parse_signature_prefix(&prefix).context("Invalid --prefix")?;
            let codec = SignatureCodec::new(CodecConfig {
                signature_prefix: prefix,
            });
            for encoded in &signatures {
                let signature = codec
                    .decode_base64(encoded)
                    .with_context(|| format!("Cannot convert {encoded}"))?;
                println!("{}", codec.encode_hex(&signature));
            }
        }
        Command::NormalizeS { s } => {
            println!("{}", normalize_s_hex(&s)?);
        }
        Command::CompressKey { pem } => {
            let pem = fs::read_to_string(&pem)
                .with_context(|| format!("Cannot read {}", pem.display()))?;
            println!("{}", CompressedPublicKey::from_spki_pem(&pem)?);
        }
    }

    Ok(())
}
