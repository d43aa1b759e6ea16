// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Constancia — certificate generator for citizen feedback cases
//
// Entry point. Reads a case record as JSON, builds the certificate PDF, and
// writes it to a file or stdout.

use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, FixedOffset};
use clap::Parser;
use constancia_core::error::Result;
use constancia_core::{CaseRecord, CertificateConfig};
use constancia_document::CertificateGenerator;

/// Render the registration certificate for a feedback case.
#[derive(Parser, Debug)]
#[command(name = "constancia")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Case record as JSON
    #[arg(short, long)]
    case: PathBuf,

    /// Where to write the PDF, or "-" for stdout
    #[arg(short, long)]
    output: PathBuf,

    /// JSON configuration file; environment variables are used when omitted
    #[arg(long)]
    config: Option<PathBuf>,

    /// Issue timestamp (RFC 3339) instead of the current local time
    #[arg(long, value_parser = parse_timestamp)]
    generated_at: Option<DateTime<FixedOffset>>,
}

fn parse_timestamp(raw: &str) -> std::result::Result<DateTime<FixedOffset>, String> {
    DateTime::parse_from_rfc3339(raw).map_err(|e| format!("expected RFC 3339 timestamp: {e}"))
}

fn load_case(path: &Path) -> Result<CaseRecord> {
    let raw = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&raw)?)
}

fn load_config(path: Option<&Path>) -> Result<CertificateConfig> {
    match path {
        Some(path) => CertificateConfig::from_json_file(path),
        None => Ok(CertificateConfig::from_env()),
    }
}

fn write_output(path: &Path, pdf: &[u8]) -> Result<()> {
    if path.as_os_str() == "-" {
        let mut stdout = std::io::stdout().lock();
        stdout.write_all(pdf)?;
        stdout.flush()?;
    } else {
        std::fs::write(path, pdf)?;
    }
    Ok(())
}

async fn run(args: Args) -> Result<()> {
    let case = load_case(&args.case)?;
    let config = load_config(args.config.as_deref())?;
    let generator = CertificateGenerator::from_config(config)?;

    let pdf = match args.generated_at {
        Some(at) => generator.generate_certificate_at(&case, at).await?,
        None => generator.generate_certificate(&case).await?,
    };
    write_output(&args.output, &pdf)?;

    tracing::info!(
        case = %case.case_number,
        output = %args.output.display(),
        bytes = pdf.len(),
        "certificate written"
    );
    Ok(())
}

#[tokio::main]
async fn main() {
    // Logs go to stderr so "-o -" keeps stdout clean for the PDF.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    if let Err(e) = run(args).await {
        tracing::error!(error = %e, "certificate generation failed");
        std::process::exit(1);
    }
}
