//! `lens-cli browse` — a minimal substrate browser in the spirit of
//! `redis_browser.py`: list keys by glob pattern and inspect one key's
//! value, trying a plain string read first and falling back to a
//! sorted-set range (the two shapes every component actually writes).

use std::sync::Arc;

use clap::{Args, Subcommand};
use lens_kv::RedisSubstrate;
use lens_types::ports::KvSubstrate;

#[derive(Args, Debug)]
pub struct BrowseArgs {
    /// K/V substrate URL (Redis-compatible).
    #[arg(long, env = "LENS_KV_URL", default_value = "redis://127.0.0.1:6379")]
    pub kv_url: String,

    /// Connection pool size.
    #[arg(long, default_value_t = 4)]
    pub pool_size: usize,

    #[command(subcommand)]
    pub command: BrowseCommand,
}

#[derive(Subcommand, Debug)]
pub enum BrowseCommand {
    /// List keys matching a glob pattern (default: all keys).
    List {
        #[arg(default_value = "*")]
        pattern: String,
    },
    /// Inspect a single key's value.
    Get { key: String },
}

#[tracing::instrument(skip(args), fields(kv_url = %args.kv_url))]
pub async fn execute(args: BrowseArgs) -> anyhow::Result<()> {
    tracing::debug!(pool_size = args.pool_size, "opening substrate connection");
    let substrate: Arc<dyn KvSubstrate> =
        Arc::new(RedisSubstrate::new(&args.kv_url, args.pool_size)?);

    match args.command {
        BrowseCommand::List { pattern } => list_keys(substrate.as_ref(), &pattern).await,
        BrowseCommand::Get { key } => inspect_key(substrate.as_ref(), &key).await,
    }
}

async fn list_keys(substrate: &dyn KvSubstrate, pattern: &str) -> anyhow::Result<()> {
    let mut cursor = 0u64;
    let mut total = 0usize;
    loop {
        let (next_cursor, keys) = substrate.scan(pattern, cursor, 100).await?;
        for key in &keys {
            println!("{key}");
        }
        total += keys.len();
        if next_cursor == 0 {
            break;
        }
        cursor = next_cursor;
    }
    eprintln!("{total} key(s) matched '{pattern}'");
    Ok(())
}

async fn inspect_key(substrate: &dyn KvSubstrate, key: &str) -> anyhow::Result<()> {
    if let Some(bytes) = substrate.get(key).await? {
        print_string_value(key, &bytes);
        return Ok(());
    }

    let members = substrate.zrange_by_score(key, f64::MIN, f64::MAX).await?;
    if !members.is_empty() {
        println!("{key} (sorted set, {} member(s)):", members.len());
        for (member, score) in members {
            println!("  {member}\t{score}");
        }
        return Ok(());
    }

    println!("{key}: not found");
    Ok(())
}

fn print_string_value(key: &str, bytes: &[u8]) {
    match std::str::from_utf8(bytes) {
        Ok(text) => match serde_json::from_str::<serde_json::Value>(text) {
            Ok(value) => println!("{key}:\n{}", serde_json::to_string_pretty(&value).unwrap()),
            Err(_) => println!("{key}: {text}"),
        },
        Err(_) => println!("{key}: <{} raw bytes>", bytes.len()),
    }
}
