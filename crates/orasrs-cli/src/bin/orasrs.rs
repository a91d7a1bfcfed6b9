use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use orasrs_cli::{load_ledger, save_ledger, ResponseView, Settings, TracingSink};
use orasrs_registry::{keys, Contract, Invocation, Request};
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "orasrs")]
#[command(about = "OraSRS node registry CLI", long_about = None)]
struct Cli {
    /// Settings file (TOML)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Ledger snapshot file, overrides settings
    #[arg(long, global = true)]
    ledger: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a fresh registry ledger
    Init {
        #[arg(long)]
        caller: String,
        /// Governance address, defaults to the caller
        #[arg(long)]
        governance: Option<String>,
    },

    /// Invoke a registry method
    Invoke {
        #[arg(long)]
        caller: String,
        /// Transaction timestamp in seconds, defaults to now
        #[arg(long)]
        timestamp: Option<i64>,
        method: String,
        /// Method argument as key=value, repeatable
        #[arg(short = 'a', long = "arg", value_parser = parse_key_value)]
        args: Vec<(String, String)>,
    },

    /// Display a node record
    Node { address: String },

    /// Display registry statistics
    Stats,

    /// List every registered node address
    Nodes,
}

fn parse_key_value(raw: &str) -> std::result::Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("expected key=value, got {:?}", raw)),
    }
}

fn init_tracing(default_level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut settings = Settings::load(cli.config.as_deref())?;
    if let Some(path) = cli.ledger {
        settings.ledger_path = path;
    }
    init_tracing(&settings.log_level);

    let contract = Contract::new(settings.registry.clone()).context("invalid registry configuration")?;
    let path = settings.ledger_path.as_path();
    let mut ledger = load_ledger(path)?;
    let now = chrono::Utc::now().timestamp();

    let invocation = match cli.command {
        Commands::Init { caller, governance } => {
            let mut invocation = Invocation::new(caller, now);
            if let Some(governance) = governance {
                invocation = invocation.arg("governance_address", governance);
            }
            let governance = contract.initialize(&mut ledger, &invocation)?;
            save_ledger(&ledger, path)?;
            info!("Registry initialized at {}, governance {}", path.display(), governance);
            return Ok(());
        }
        Commands::Invoke {
            caller,
            timestamp,
            method,
            args,
        } => args.into_iter().fold(
            Invocation::new(caller, timestamp.unwrap_or(now)).method(&method),
            |invocation, (key, value)| invocation.arg(&key, value),
        ),
        Commands::Node { address } => Invocation::new("", now)
            .method("getNodeInfo")
            .arg("node_address", address),
        Commands::Stats => Invocation::new("", now).method("getContractStats"),
        Commands::Nodes => {
            for key in ledger.keys_with_prefix(keys::NODE_PREFIX.as_bytes()) {
                println!("{}", String::from_utf8_lossy(&key[keys::NODE_PREFIX.len()..]));
            }
            return Ok(());
        }
    };

    let mut sink = TracingSink::default();
    let response = contract.invoke(&mut ledger, &mut sink, &invocation);
    println!("{}", serde_json::to_string_pretty(&ResponseView::from(&response))?);

    if !response.success {
        if let Some(e) = &response.error {
            error!("Invocation failed: {}", e);
        }
        bail!("invocation failed");
    }
    if is_mutation(&invocation) {
        save_ledger(&ledger, path)?;
        info!("Ledger saved, {} events emitted", sink.emitted());
    }
    Ok(())
}

fn is_mutation(invocation: &Invocation) -> bool {
    Request::parse(&invocation.args)
        .map(|request| !request.is_read_only())
        .unwrap_or(false)
}
