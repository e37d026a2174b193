//! Keyward CLI - Remote-custody signing from the command line
//!
//! Provisions keys and signs digests or legacy transactions through the
//! local software custodian. Results are printed to stdout as JSON; logs go
//! to stderr.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::json;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use keyward_core::{
    decode_public_key, decode_signature, derive_address, Address, KeyHandle, MessageHash,
};
use keyward_custodian::config::parse_chain_id;
use keyward_custodian::{LocalCustodian, ProvisionedKey, RemoteSigner, SignerConfig};
use keyward_tx::{
    sign_transaction, LegacyTransaction, TransactionBuilder, DEFAULT_GAS_LIMIT, DEFAULT_GAS_PRICE,
};

#[derive(Parser)]
#[command(name = "keyward")]
#[command(about = "Sign ledger transactions with custodian-held secp256k1 keys", long_about = None)]
#[command(version)]
struct Cli {
    /// Config file (defaults to $KEYWARD_CONFIG or the platform config dir)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Override the chain id; 0 signs without replay protection
    #[arg(long, global = true)]
    chain_id: Option<String>,

    /// Override the key store path
    #[arg(long, global = true)]
    key_store: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new custodian key and print its address
    Provision,

    /// List keys in the key store
    Keys,

    /// Print the address of an existing key
    Address {
        /// Key handle
        #[arg(short, long)]
        key: String,
    },

    /// Decode a DER SubjectPublicKeyInfo and derive its address
    DecodePublicKey {
        /// DER bytes (hex)
        der: String,
    },

    /// Decode a DER ECDSA signature into canonical (r, s)
    DecodeSignature {
        /// DER bytes (hex)
        der: String,
    },

    /// Sign a 32-byte digest and resolve its recovery value
    SignDigest {
        /// Key handle
        #[arg(short, long)]
        key: String,

        /// Digest (hex)
        #[arg(short, long)]
        digest: String,
    },

    /// Sign a legacy transaction and print the raw encoding
    SignTx {
        /// Key handle
        #[arg(short, long)]
        key: String,

        /// Transaction JSON file, instead of the field flags
        #[arg(short, long, conflicts_with = "to")]
        file: Option<PathBuf>,

        /// Recipient address
        #[arg(short, long, required_unless_present = "file")]
        to: Option<String>,

        /// Value in wei
        #[arg(short, long, default_value_t = 0)]
        value: u128,

        /// Transaction nonce
        #[arg(short, long, default_value_t = 0)]
        nonce: u64,

        /// Gas price in wei
        #[arg(short = 'p', long, default_value_t = DEFAULT_GAS_PRICE)]
        gas_price: u128,

        /// Gas limit
        #[arg(short = 'l', long, default_value_t = DEFAULT_GAS_LIMIT)]
        gas_limit: u64,

        /// Call data (hex)
        #[arg(long)]
        data: Option<String>,
    },

    /// Configuration commands
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Print the effective configuration
    Show,

    /// Write the default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "keyward=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(SignerConfig::default_config_path);

    if let Commands::Config(cmd) = &cli.command {
        return handle_config_command(cmd, &config_path, &cli);
    }

    let config = load_config(&config_path, &cli)?;

    match cli.command {
        Commands::Provision => provision(&config).await,
        Commands::Keys => list_keys(&config),
        Commands::Address { key } => show_address(&config, KeyHandle::new(key)).await,
        Commands::DecodePublicKey { der } => decode_public_key_command(&der),
        Commands::DecodeSignature { der } => decode_signature_command(&der),
        Commands::SignDigest { key, digest } => {
            sign_digest(&config, KeyHandle::new(key), &digest).await
        }
        Commands::SignTx {
            key,
            file,
            to,
            value,
            nonce,
            gas_price,
            gas_limit,
            data,
        } => {
            let tx = match file {
                Some(path) => {
                    let json = std::fs::read_to_string(&path)
                        .with_context(|| format!("reading {}", path.display()))?;
                    LegacyTransaction::from_json(&json)?
                }
                None => {
                    let to = to.context("--to is required without --file")?;
                    let mut builder = TransactionBuilder::new()
                        .to(Address::from_hex(&to)?)
                        .value(value)
                        .nonce(nonce)
                        .gas_price(gas_price)
                        .gas_limit(gas_limit);
                    if let Some(data) = data {
                        builder = builder.data(keyward_core::types::decode_hex(&data)?);
                    }
                    builder.build()?
                }
            };
            sign_tx(&config, KeyHandle::new(key), &tx).await
        }
        Commands::Config(_) => Ok(()),
    }
}

fn load_config(path: &Path, cli: &Cli) -> Result<SignerConfig> {
    let mut config = SignerConfig::load_or_default(path)
        .with_context(|| format!("loading config {}", path.display()))?;
    config.apply_env()?;

    if let Some(chain_id) = &cli.chain_id {
        config.chain_id = parse_chain_id(chain_id)?;
    }
    if let Some(key_store) = &cli.key_store {
        config.key_store_path = key_store.clone();
    }
    Ok(config)
}

fn signer(config: &SignerConfig) -> Result<RemoteSigner<LocalCustodian>> {
    let custodian = LocalCustodian::load(&config.key_store_path)?;
    Ok(RemoteSigner::new(Arc::new(custodian)).with_scheme(config.recovery_scheme))
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn provision(config: &SignerConfig) -> Result<()> {
    config.ensure_directories()?;
    let signer = signer(config)?;

    let provisioned = signer.provision_key().await?;
    signer.custodian().save(&config.key_store_path)?;
    info!("Key store updated at {:?}", config.key_store_path);

    print_json(&json!({
        "key_handle": provisioned.key_handle,
        "address": provisioned.address.to_checksum(),
    }))
}

fn list_keys(config: &SignerConfig) -> Result<()> {
    let custodian = LocalCustodian::load(&config.key_store_path)?;
    print_json(&custodian.list_keys()?)
}

async fn show_address(config: &SignerConfig, key: KeyHandle) -> Result<()> {
    let address = signer(config)?.derive_address(&key).await?;
    println!("{}", address.to_checksum());
    Ok(())
}

fn decode_public_key_command(der: &str) -> Result<()> {
    let der = keyward_core::types::decode_hex(der)?;
    let public_key = decode_public_key(&der)?;
    print_json(&json!({
        "public_key": format!("0x{}", public_key.to_hex()),
        "address": derive_address(&public_key).to_checksum(),
    }))
}

fn decode_signature_command(der: &str) -> Result<()> {
    let der = keyward_core::types::decode_hex(der)?;
    print_json(&decode_signature(&der)?)
}

async fn account(signer: &RemoteSigner<LocalCustodian>, key: KeyHandle) -> Result<ProvisionedKey> {
    let address = signer.derive_address(&key).await?;
    Ok(ProvisionedKey {
        key_handle: key,
        address,
    })
}

async fn sign_digest(config: &SignerConfig, key: KeyHandle, digest: &str) -> Result<()> {
    let signer = signer(config)?;
    let account = account(&signer, key).await?;
    let digest = MessageHash::from_hex(digest)?;

    let signature = signer
        .sign_transaction_digest(&account.key_handle, &account.address, &digest, config.chain_id)
        .await?;
    print_json(&signature)
}

async fn sign_tx(config: &SignerConfig, key: KeyHandle, tx: &LegacyTransaction) -> Result<()> {
    let signer = signer(config)?;
    let account = account(&signer, key).await?;

    let signed = sign_transaction(&signer, &account, tx, config.chain_id).await?;
    print_json(&json!({
        "raw": signed.to_hex(),
        "hash": signed.hash,
        "v": signed.signature.v(),
    }))
}

fn handle_config_command(cmd: &ConfigCommands, path: &Path, cli: &Cli) -> Result<()> {
    match cmd {
        ConfigCommands::Show => {
            let config = load_config(path, cli)?;
            let candidates = config.recovery_candidates()?;
            print_json(&json!({
                "path": path,
                "config": config,
                "recovery_candidates": [candidates.first, candidates.second],
            }))
        }
        ConfigCommands::Init { force } => {
            if path.exists() && !force {
                anyhow::bail!("Config already exists at {} (use --force)", path.display());
            }
            SignerConfig::default().save(path)?;
            println!("Wrote default config to {}", path.display());
            Ok(())
        }
    }
}
