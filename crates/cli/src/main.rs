//! # CLI — RiptideKV interactive shell
//!
//! A REPL-style command-line front end over [`engine::Store`]. Reads
//! commands from stdin, executes them against the store, and prints
//! results to stdout. Not part of the storage engine itself -- a demo
//! harness for exercising it interactively or via a scripted stdin pipe.
//!
//! ## Commands
//!
//! ```text
//! PUT key value   Insert or overwrite a key
//! GET key         Look up a key (prints the value or "(nil)")
//! DEL key         Delete a key (writes a tombstone)
//! STATS           Print memtable/sstable summary
//! EXIT / QUIT     Flush, close, and exit
//! ```
//!
//! ## Configuration
//!
//! All settings are controlled via environment variables:
//!
//! ```text
//! RIPTIDE_DATA_DIR         data directory                 (default: "lsm_data")
//! RIPTIDE_MEMTABLE_MAX     memtable flush threshold bytes (default: 1048576)
//! RIPTIDE_SSTABLE_MAX      informational sstable cap      (default: 10485760)
//! RIPTIDE_BLOOM_FPR        bloom filter false-positive %  (default: 1)
//! RIPTIDE_COMPACTION_AT    sstable count compaction trigger (default: 4)
//! ```

use anyhow::{Context, Result};
use config::Config;
use engine::Store;
use std::io::{self, BufRead, Write};

/// Reads a configuration value from the environment, falling back to `default`.
fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parsed_env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn build_config() -> Config {
    Config::builder()
        .data_directory(env_or("RIPTIDE_DATA_DIR", "lsm_data"))
        .memtable_max_size(parsed_env_or("RIPTIDE_MEMTABLE_MAX", 1_048_576))
        .sstable_max_size(parsed_env_or("RIPTIDE_SSTABLE_MAX", 10_485_760))
        .bloom_filter_false_positive_rate(parsed_env_or("RIPTIDE_BLOOM_FPR", 1))
        .compaction_threshold(parsed_env_or("RIPTIDE_COMPACTION_AT", 4))
        .build()
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = build_config();
    let data_dir = config.data_directory().display().to_string();
    let store = Store::open(config).context("failed to open store")?;

    println!("RiptideKV started (data_dir={data_dir})");
    println!("Commands: PUT key value | GET key | DEL key | STATS | EXIT");
    print!("> ");
    io::stdout().flush().ok();

    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let line = line?;
        let mut parts = line.split_whitespace();

        if let Some(cmd) = parts.next() {
            match cmd.to_uppercase().as_str() {
                "PUT" => match (parts.next(), parts.clone().next()) {
                    (Some(k), Some(_)) => {
                        let v: String = parts.collect::<Vec<&str>>().join(" ");
                        match store.put(k.as_bytes().to_vec(), v.into_bytes()) {
                            Ok(()) => println!("OK"),
                            Err(e) => println!("ERR put failed: {e}"),
                        }
                    }
                    _ => println!("ERR usage: PUT key value"),
                },
                "GET" => match parts.next() {
                    Some(k) => match store.get(k.as_bytes()) {
                        Ok(Some(v)) => println!("{}", String::from_utf8_lossy(&v)),
                        Ok(None) => println!("(nil)"),
                        Err(e) => println!("ERR get failed: {e}"),
                    },
                    None => println!("ERR usage: GET key"),
                },
                "DEL" => match parts.next() {
                    Some(k) => match store.delete(k.as_bytes().to_vec()) {
                        Ok(()) => println!("OK"),
                        Err(e) => println!("ERR del failed: {e}"),
                    },
                    None => println!("ERR usage: DEL key"),
                },
                "STATS" => print!("{}", store.stats()),
                "EXIT" | "QUIT" => {
                    println!("bye");
                    break;
                }
                other => println!("unknown command: {other}"),
            }
        }

        print!("> ");
        io::stdout().flush().ok();
    }

    store.close().context("failed to close store")?;
    Ok(())
}
