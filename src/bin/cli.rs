//! stashkv CLI
//!
//! Inspect and edit a durable stashkv store. Values are JSON.

use std::process;

use clap::{Parser, Subcommand};
use serde_json::Value;
use stashkv::{Config, FileMemory, JsonEncoder, LogSyncStrategy, Storage};
use tracing_subscriber::{fmt, EnvFilter};

/// stashkv CLI
#[derive(Parser, Debug)]
#[command(name = "stashkv-cli")]
#[command(about = "CLI for a durable stashkv store")]
#[command(version)]
struct Args {
    /// Data directory
    #[arg(short, long, default_value = "./stashkv_data")]
    data_dir: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Get a value by key
    Get {
        /// The key to get
        key: String,
    },

    /// Set a key to a JSON value
    Set {
        /// The key to set
        key: String,

        /// The value, as JSON (bare words are stored as strings)
        value: String,
    },

    /// Delete a key
    Del {
        /// The key to delete
        key: String,
    },

    /// List all keys in insertion order
    Keys,

    /// List keys with the given prefix, sorted
    Prefix {
        /// The prefix to match
        prefix: String,
    },

    /// Rewrite the log with only live entries
    Compact,
}

fn main() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn,stashkv=info"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    if let Err(e) = run(args) {
        tracing::error!("{}", e);
        process::exit(1);
    }
}

fn run(args: Args) -> stashkv::Result<()> {
    let config = Config::builder()
        .data_dir(&args.data_dir)
        .log_sync_strategy(LogSyncStrategy::EveryWrite)
        .build();

    let memory = FileMemory::open(config)?;
    let store = Storage::with_parts(memory, JsonEncoder::new());

    match args.command {
        Commands::Get { key } => match store.get::<Value>(&key)? {
            Some(value) => println!("{}", value),
            None => eprintln!("(not found)"),
        },
        Commands::Set { key, value } => {
            let value = match serde_json::from_str::<Value>(&value) {
                Ok(parsed) => parsed,
                Err(_) => Value::String(value),
            };
            store.set(&key, &value)?;
            println!("OK");
        }
        Commands::Del { key } => {
            let existed = store.delete(&key)?;
            println!("{}", if existed { "1" } else { "0" });
        }
        Commands::Keys => {
            for key in store.keys()? {
                println!("{}", key);
            }
        }
        Commands::Prefix { prefix } => {
            for key in store.keys_with_prefix(&prefix)? {
                println!("{}", key);
            }
        }
        Commands::Compact => {
            store.memory().compact()?;
            println!("OK ({} stale records left)", store.memory().stale_records());
        }
    }

    store.close()
}
