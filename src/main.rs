use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use alloy::primitives::B256;
use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

use uniscope::config::{self, normalize_http_endpoint, Config};
use uniscope::domain::router::opcode;
use uniscope::infrastructure::ethereum::{create_provider, EthereumProvider, ProviderConfig};
use uniscope::infrastructure::{AbiScanner, AlloyAbiDecoder};
use uniscope::modules::export::{self, ExportFormat};
use uniscope::modules::monitor::{self, WatchOptions, WatchedDecode};
use uniscope::modules::router::{parse_hex, RouterDecoder};
use uniscope::store::DecodeStore;

#[derive(Debug, Parser)]
#[command(
    name = "uniscope",
    version,
    about = "uniscope: Uniswap Universal Router calldata decoder"
)]
struct Cli {
    /// More log output (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Config file (default: ~/.config/uniscope/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Decode router calldata given as hex
    Decode {
        /// Calldata, with or without 0x prefix
        calldata: String,

        /// Print every decoding stage instead of only the final result
        #[arg(long)]
        stages: bool,

        /// Also write the result as JSON to this file
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Fetch a transaction by hash and decode its calldata
    Tx {
        /// Transaction hash
        hash: B256,

        /// HTTP JSON-RPC endpoint (default: RPC_URL or config)
        #[arg(long)]
        rpc: Option<String>,
    },

    /// Decode router transactions from the pending pool
    Watch {
        /// WebSocket or IPC endpoint (default: WEBSOCKET_URL or config)
        #[arg(long)]
        ws: Option<String>,

        /// Pending hashes to inspect, 0 for no limit
        #[arg(long)]
        limit: Option<usize>,

        /// Write all decodes to FILE (.json or .csv), or to the export dir
        #[arg(long, value_name = "FILE")]
        export: Option<Option<PathBuf>>,

        /// Do not persist decodes to the local database
        #[arg(long)]
        no_store: bool,
    },

    /// Show recently stored decodes
    History {
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },

    /// Print the router opcode table
    Opcodes,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = match &cli.config {
        Some(path) => config::load_from(path),
        None => config::load(),
    };

    let result = match cli.command {
        Commands::Decode {
            calldata,
            stages,
            out,
        } => run_decode(&config, &calldata, stages, out.as_deref()),
        Commands::Tx { hash, rpc } => run_tx(&config, hash, rpc).await,
        Commands::Watch {
            ws,
            limit,
            export,
            no_store,
        } => run_watch(&config, ws, limit, export, no_store).await,
        Commands::History { limit } => run_history(limit),
        Commands::Opcodes => run_opcodes(),
    };

    if let Err(err) = result {
        eprintln!("Error: {err:#}");
        std::process::exit(1);
    }
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "uniscope=info",
        1 => "uniscope=debug",
        _ => "uniscope=trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

/// Decoder with the built-in functions plus any ABIs under `abi_paths`
fn build_decoder(config: &Config) -> RouterDecoder {
    let mut abi = AlloyAbiDecoder::with_builtin();
    let roots = config.abi_roots();
    if !roots.is_empty() {
        let registry = AbiScanner::scan_roots(&roots);
        for err in &registry.errors {
            tracing::warn!(%err, "ABI scan error");
        }
        abi.extend(registry);
    }
    RouterDecoder::with_abi(abi)
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let mut stdout = io::stdout().lock();
    serde_json::to_writer_pretty(&mut stdout, value)?;
    writeln!(stdout)?;
    Ok(())
}

fn run_decode(config: &Config, calldata: &str, stages: bool, out: Option<&Path>) -> Result<()> {
    let data = parse_hex(calldata).context("Calldata is not valid hex")?;
    let decoder = build_decoder(config);

    if stages {
        print_stages(&decoder, &data)?;
    }

    let result = decoder.decode_full(&data)?;
    if !stages {
        print_json(&result)?;
    }
    if let Some(path) = out {
        std::fs::write(path, serde_json::to_string_pretty(&result)?)
            .with_context(|| format!("write {}", path.display()))?;
        tracing::info!(path = %path.display(), "wrote decode result");
    }
    Ok(())
}

fn print_stages(decoder: &RouterDecoder, data: &[u8]) -> Result<()> {
    #[derive(Serialize)]
    struct Stage<'a, T: Serialize> {
        stage: &'a str,
        #[serde(skip_serializing_if = "Option::is_none")]
        output: Option<T>,
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    }

    fn stage<T: Serialize>(name: &str, result: Result<T, uniscope::DecodeError>) -> Result<()> {
        let (output, error) = match result {
            Ok(output) => (Some(output), None),
            Err(err) => (None, Some(err.to_string())),
        };
        print_json(&Stage {
            stage: name,
            output,
            error,
        })
    }

    stage("is_decodable", Ok(decoder.is_decodable(data)))?;
    let envelope = decoder.decode_envelope(data);
    stage("decode_envelope", envelope.clone())?;
    if let Ok(envelope) = &envelope {
        stage("decode_inputs", decoder.decode_inputs(envelope))?;
        stage("decode_commands", decoder.decode_commands(envelope))?;
    }
    stage("decode_full", decoder.decode_full(data))
}

async fn run_tx(config: &Config, hash: B256, rpc: Option<String>) -> Result<()> {
    let endpoint = rpc
        .or_else(|| config.rpc_endpoint())
        .context("No RPC endpoint: pass --rpc, set RPC_URL, or add one to the config")?;
    let provider = create_provider(ProviderConfig::Http(normalize_http_endpoint(&endpoint))).await?;

    let tx = provider
        .get_transaction(hash)
        .await?
        .with_context(|| format!("Transaction {} not found", hash))?;
    let to = tx.to.clone().unwrap_or_default();

    let options = WatchOptions::from_config(config);
    if !options.is_router(&to) {
        tracing::warn!(%to, "transaction is not sent to a configured router");
    }

    let decoder = build_decoder(config);
    let result = decoder.decode_full(&tx.input)?;
    print_json(&WatchedDecode {
        hash: tx.hash,
        from: tx.from,
        to,
        result,
    })
}

async fn run_watch(
    config: &Config,
    ws: Option<String>,
    limit: Option<usize>,
    export_path: Option<Option<PathBuf>>,
    no_store: bool,
) -> Result<()> {
    let endpoint = ws
        .or_else(|| config.stream_endpoint())
        .context("No streaming endpoint: pass --ws, set WEBSOCKET_URL, or add one to the config")?;
    let provider_config = ProviderConfig::from_endpoint(&endpoint);
    if !provider_config.is_streaming() {
        bail!("{} cannot stream pending transactions", provider_config.display());
    }
    let provider: Arc<dyn EthereumProvider> = Arc::from(create_provider(provider_config).await?);

    let mut options = WatchOptions::from_config(config);
    if let Some(limit) = limit {
        options.limit = Some(limit).filter(|limit| *limit > 0);
    }

    let store = if config.store && !no_store {
        open_store()
    } else {
        None
    };

    let decoder = Arc::new(build_decoder(config));
    let (sink, mut decodes) = mpsc::channel::<WatchedDecode>(64);
    let monitor = tokio::spawn(monitor::watch(provider, decoder, options, sink));

    let mut collected = Vec::new();
    while let Some(decode) = decodes.recv().await {
        println!("{}", serde_json::to_string(&decode)?);
        if let Some(store) = &store {
            if let Err(err) = store.insert(&decode) {
                tracing::warn!(error = %format!("{:#}", err), "failed to store decode");
            }
        }
        if export_path.is_some() {
            collected.push(decode);
        }
    }

    let summary = monitor.await.context("monitor task panicked")??;
    eprintln!(
        "inspected {} hashes: {} decoded, {} skipped, {} not found, {} failed",
        summary.inspected, summary.decoded, summary.skipped, summary.not_found, summary.failed
    );

    match export_path {
        Some(Some(path)) => {
            export::export_decodes(&path, &collected)?;
        }
        Some(None) => {
            let path = export::export_default(&collected, ExportFormat::Json)?;
            eprintln!("exported {} decodes to {}", collected.len(), path.display());
        }
        None => {}
    }
    Ok(())
}

fn open_store() -> Option<DecodeStore> {
    let path = config::store_db_path()?;
    match DecodeStore::open(&path) {
        Ok(store) => Some(store),
        Err(err) => {
            tracing::warn!(error = %format!("{:#}", err), "decode store disabled");
            None
        }
    }
}

fn run_history(limit: usize) -> Result<()> {
    let path = config::store_db_path().context("No data directory for the decode store")?;
    let store = DecodeStore::open(&path)?;
    let recent = store.load_recent(limit)?;
    tracing::info!(shown = recent.len(), total = store.count()?, "decode history");

    for stored in recent {
        let result: serde_json::Value = serde_json::from_str(&stored.result_json)
            .with_context(|| format!("stored result for {}", stored.hash))?;
        println!(
            "{}",
            serde_json::json!({
                "hash": stored.hash,
                "router": stored.router,
                "sender": stored.sender,
                "decoded_at": stored.decoded_at.to_rfc3339(),
                "result": result,
            })
        );
    }
    Ok(())
}

fn run_opcodes() -> Result<()> {
    let mut stdout = io::stdout().lock();
    for (code, entry) in opcode::slots() {
        match entry {
            Some(entry) => writeln!(stdout, "0x{:02x}  {:<28} {}", code, entry.name, entry.arg_types.join(", "))?,
            None => writeln!(stdout, "0x{:02x}  (reserved)", code)?,
        }
    }
    Ok(())
}
