//! # Command Line Interface
//!
//! The `dyncert` binary: creates a CA and runs the factory operations against
//! secret records stored as JSON files.

pub mod output;
pub mod records;

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::info;

use crate::config::{CaConfig, FactoryConfig};
use crate::domain::Secret;
use crate::factory::{cns_of, is_static, TlsFactory, FINGERPRINT_ANNOTATION};
use crate::observability::{init_logging, log_factory_config};
use crate::utils::{
    certificate_info, parse_certs_pem, CertificateAuthority, CertificateInfo, MAX_VALIDITY_DAYS,
};
use output::{print_output, OutputFormat};
use records::{read_record, require_record, write_record};

#[derive(Parser)]
#[command(name = "dyncert")]
#[command(about = "Dynamic-SAN TLS certificate tooling")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Factory settings file (TOML); environment variables still apply
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// CA certificate chain (PEM), overrides DYNCERT_CA_CERT_PATH
    #[arg(long, global = true)]
    pub ca_cert: Option<PathBuf>,

    /// CA private key (PEM), overrides DYNCERT_CA_KEY_PATH
    #[arg(long, global = true)]
    pub ca_key: Option<PathBuf>,

    /// Format for anything printed to stdout
    #[arg(long, short, global = true, value_enum, default_value_t = OutputFormat::Json)]
    pub output: OutputFormat,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create a self-signed CA
    InitCa {
        /// CA common name
        #[arg(long, default_value = "dyncert-ca")]
        cn: String,

        /// CA organization (repeatable)
        #[arg(long = "org")]
        organization: Vec<String>,

        /// Validity in days
        #[arg(
            long,
            default_value_t = 3650,
            value_parser = clap::value_parser!(i64).range(1..=MAX_VALIDITY_DAYS)
        )]
        days: i64,

        /// Where to write the CA certificate
        #[arg(long)]
        cert_out: PathBuf,

        /// Where to write the CA private key
        #[arg(long)]
        key_out: PathBuf,
    },

    /// Add names to a record's certificate
    AddCn {
        /// Record file, or `-` for stdin
        record: PathBuf,

        /// Hostnames or IP addresses
        #[arg(required = true)]
        names: Vec<String>,

        /// Destination, defaults to the record itself (`-` for stdout)
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Merge the names of two records into the target
    Merge {
        target: PathBuf,
        additional: PathBuf,

        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Re-sign a record's certificate with the same key and names
    Renew {
        record: PathBuf,

        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Issue a new key and certificate for a record's names
    Regenerate {
        record: PathBuf,

        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Report names, expiry and trust of a record
    Status { record: PathBuf },
}

/// What `status` reports about a record.
#[derive(Debug, Serialize)]
pub struct StatusReport {
    pub names: Vec<String>,
    #[serde(rename = "static")]
    pub is_static: bool,
    pub expired: bool,
    pub verified: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verify_error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fingerprint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub certificate: Option<CertificateInfo>,
}

impl StatusReport {
    pub fn new(factory: &TlsFactory, secret: &Secret) -> Self {
        let verify = factory.verify(secret);
        let certificate = secret
            .certificate_pem()
            .and_then(|pem| parse_certs_pem(pem).ok())
            .and_then(|certs| certificate_info(certs[0].as_ref()).ok());

        Self {
            names: cns_of(secret).into_iter().collect(),
            is_static: is_static(secret),
            expired: factory.is_expired(secret),
            verified: verify.is_ok(),
            verify_error: verify.err().map(|e| e.to_string()),
            fingerprint: secret.annotations.get(FINGERPRINT_ANNOTATION).cloned(),
            certificate,
        }
    }
}

/// Run CLI commands
pub fn run_cli() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose)?;

    match &cli.command {
        Commands::InitCa { cn, organization, days, cert_out, key_out } => {
            init_ca(cn, organization, *days, cert_out, key_out)
        }
        Commands::AddCn { record, names, out } => {
            let factory = build_factory(&cli)?;
            let secret = read_record(record)?;
            let (result, changed) = factory.add_cn(secret.as_ref(), names.as_slice())?;
            info!(changed, "add-cn finished");
            write_record(out.as_deref().unwrap_or(record), &result, cli.output)
        }
        Commands::Merge { target, additional, out } => {
            let factory = build_factory(&cli)?;
            let target_secret = read_record(target)?;
            let additional_secret = read_record(additional)?;
            let (result, changed) =
                factory.merge(target_secret.as_ref(), additional_secret.as_ref())?;
            info!(changed, "merge finished");
            write_record(out.as_deref().unwrap_or(target), &result, cli.output)
        }
        Commands::Renew { record, out } => {
            let factory = build_factory(&cli)?;
            let renewed = factory.renew(&require_record(record)?)?;
            write_record(out.as_deref().unwrap_or(record), &renewed, cli.output)
        }
        Commands::Regenerate { record, out } => {
            let factory = build_factory(&cli)?;
            let regenerated = factory.regenerate(&require_record(record)?)?;
            write_record(out.as_deref().unwrap_or(record), &regenerated, cli.output)
        }
        Commands::Status { record } => {
            let factory = build_factory(&cli)?;
            let secret = require_record(record)?;
            print_output(&StatusReport::new(&factory, &secret), cli.output)
        }
    }
}

fn init_ca(
    cn: &str,
    organization: &[String],
    days: i64,
    cert_out: &Path,
    key_out: &Path,
) -> anyhow::Result<()> {
    let ca = CertificateAuthority::generate(cn, organization, days)?;

    std::fs::write(cert_out, ca.cert_pem())
        .with_context(|| format!("Failed to write {}", cert_out.display()))?;
    std::fs::write(key_out, ca.key_pem().as_bytes())
        .with_context(|| format!("Failed to write {}", key_out.display()))?;

    info!(cn = %cn, cert = %cert_out.display(), key = %key_out.display(), "CA created");
    Ok(())
}

fn build_factory(cli: &Cli) -> anyhow::Result<TlsFactory> {
    let config = match &cli.config {
        Some(path) => FactoryConfig::load_from_path(path)?,
        None => FactoryConfig::from_env()?,
    };
    config.validate()?;
    log_factory_config(&config);

    let ca_config = match (&cli.ca_cert, &cli.ca_key) {
        (Some(cert_path), Some(key_path)) => {
            CaConfig { cert_path: cert_path.clone(), key_path: key_path.clone() }
        }
        (cert_path, key_path) => {
            let mut from_env = CaConfig::from_env()?;
            if let Some(path) = cert_path {
                from_env.cert_path = path.clone();
            }
            if let Some(path) = key_path {
                from_env.key_path = path.clone();
            }
            from_env
        }
    };
    let ca = ca_config.load().context("Failed to load CA")?;

    Ok(TlsFactory::new(ca, &config))
}
