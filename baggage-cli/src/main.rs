//! baggage-cli — command-line client for the baggage checker HTTP API
//!
//! # Subcommands
//! - `check <item> [--get] [--json]`                       — ask whether an item may fly
//! - `history [item] [-n <limit>] [--offset <n>] [--json]`  — list stored answers
//! - `status`                                               — show server health
//! - `smoke [items...]`                                     — health check plus a batch of sample items

use clap::{Parser, Subcommand};
use serde::Deserialize;

const DEFAULT_SERVER: &str = "http://127.0.0.1:8000";
const DEFAULT_LIMIT: u32 = 50;
const SMOKE_ITEMS: &[&str] = &[
    "laptop",
    "shampoo 500ml",
    "knife",
    "water bottle",
    "phone charger",
    "scissors",
    "toothpaste",
];

// ============================================================================
// CLI Definition
// ============================================================================

#[derive(Debug, Parser)]
#[command(
    name = "baggage-cli",
    version,
    about = "Ask the baggage checker whether an item is allowed in checked or carry-on baggage"
)]
struct Cli {
    /// Server URL (overrides BAGGAGE_SERVER_URL env var)
    #[arg(long, env = "BAGGAGE_SERVER_URL", default_value = DEFAULT_SERVER)]
    server: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Check a single item
    Check {
        /// Item to check
        item: String,

        /// Use GET /check-item/{item} instead of the JSON body endpoint
        #[arg(long)]
        get: bool,

        /// Print the raw JSON response
        #[arg(long)]
        json: bool,
    },

    /// List stored answers, newest first
    History {
        /// Only show answers for this exact item
        item: Option<String>,

        /// Maximum number of rows
        #[arg(short = 'n', long, default_value_t = DEFAULT_LIMIT)]
        limit: u32,

        /// Rows to skip
        #[arg(long, default_value_t = 0)]
        offset: u32,

        /// Print the raw JSON response
        #[arg(long)]
        json: bool,
    },

    /// Show server status
    Status,

    /// Run the health check and a batch of sample items
    Smoke {
        /// Items to check (defaults to a built-in sample list)
        items: Vec<String>,
    },
}

// ============================================================================
// API Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct CheckResponse {
    pub item: String,
    pub check_in: bool,
    pub carry_on: bool,
    pub description: String,
    pub database_id: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct StoredRecord {
    pub id: Option<i64>,
    pub item: String,
    pub check_in: bool,
    pub carry_on: bool,
    pub description: String,
    pub created_at: String,
}

#[derive(Debug, Deserialize)]
pub struct HistoryResponse {
    pub responses: Vec<StoredRecord>,
    pub count: usize,
}

// ============================================================================
// Formatting
// ============================================================================

fn yes_no(allowed: bool) -> &'static str {
    if allowed {
        "allowed"
    } else {
        "not allowed"
    }
}

pub fn format_check(r: &CheckResponse) -> String {
    let mut out = format!(
        "{}\n  Checked baggage: {}\n  Carry-on:        {}\n  {}",
        r.item,
        yes_no(r.check_in),
        yes_no(r.carry_on),
        r.description
    );
    if let Some(id) = r.database_id {
        out.push_str(&format!("\n  Stored as #{}", id));
    }
    out
}

pub fn format_record(r: &StoredRecord) -> String {
    let id = r
        .id
        .map(|id| format!("#{}", id))
        .unwrap_or_else(|| "#?".to_string());
    format!(
        "{} {} [{}] checked: {}, carry-on: {}\n    {}",
        id,
        r.created_at,
        r.item,
        yes_no(r.check_in),
        yes_no(r.carry_on),
        r.description
    )
}

/// URL for a route that takes the item as its last path segment.
pub fn item_url(server: &str, route: &str, item: &str) -> String {
    format!("{}/{}/{}", server, route, urlencoding::encode(item))
}

// ============================================================================
// HTTP Client Calls
// ============================================================================

fn client(timeout_secs: u64) -> anyhow::Result<reqwest::blocking::Client> {
    Ok(reqwest::blocking::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .build()?)
}

/// Send a request and return the parsed body, or the server's error message.
fn fetch(req: reqwest::blocking::RequestBuilder) -> anyhow::Result<serde_json::Value> {
    let resp = req.send()?;
    let status = resp.status();
    let body: serde_json::Value = resp.json().unwrap_or_default();

    if !status.is_success() {
        let msg = body["error"].as_str().unwrap_or("no error message");
        anyhow::bail!("server returned {}: {}", status, msg);
    }
    Ok(body)
}

fn check_once(server: &str, item: &str, use_get: bool) -> anyhow::Result<serde_json::Value> {
    // The completion call alone may take up to 30 s upstream.
    let client = client(45)?;
    let req = if use_get {
        client.get(item_url(server, "check-item", item))
    } else {
        client
            .post(format!("{}/check-item", server))
            .json(&serde_json::json!({ "item": item }))
    };
    fetch(req)
}

fn do_check(server: &str, item: &str, use_get: bool, json_output: bool) -> anyhow::Result<()> {
    let body = check_once(server, item, use_get)?;

    if json_output {
        println!("{}", serde_json::to_string_pretty(&body)?);
    } else {
        let resp: CheckResponse = serde_json::from_value(body)?;
        println!("{}", format_check(&resp));
    }
    Ok(())
}

fn do_history(
    server: &str,
    item: Option<&str>,
    limit: u32,
    offset: u32,
    json_output: bool,
) -> anyhow::Result<()> {
    let url = match item {
        Some(item) => item_url(server, "stored-responses", item),
        None => format!("{}/stored-responses", server),
    };
    let req = client(15)?
        .get(&url)
        .query(&[("limit", limit), ("offset", offset)]);
    let body = fetch(req)?;

    if json_output {
        println!("{}", serde_json::to_string_pretty(&body)?);
        return Ok(());
    }

    let history: HistoryResponse = serde_json::from_value(body)?;
    if history.count == 0 {
        eprintln!("No stored responses");
        return Ok(());
    }
    for r in &history.responses {
        println!("{}", format_record(r));
    }
    Ok(())
}

/// Show the server status by calling GET /health.
fn do_status(server: &str) -> anyhow::Result<()> {
    let url = format!("{}/health", server);
    match client(10)?.get(&url).send() {
        Ok(r) if r.status().is_success() => {
            let body: serde_json::Value = r.json().unwrap_or_default();
            println!("Service: {}", body["service"].as_str().unwrap_or("?"));
            println!("Status:  {}", body["status"].as_str().unwrap_or("unknown"));
        }
        Ok(r) => {
            eprintln!("baggage-cli: server unhealthy (HTTP {})", r.status());
            std::process::exit(1);
        }
        Err(e) => {
            eprintln!("baggage-cli: cannot reach {} — {}", url, e);
            std::process::exit(1);
        }
    }
    Ok(())
}

fn do_smoke(server: &str, items: Vec<String>) -> anyhow::Result<()> {
    println!("Testing API at: {}", server);
    do_status(server)?;

    let items: Vec<String> = if items.is_empty() {
        SMOKE_ITEMS.iter().map(|s| s.to_string()).collect()
    } else {
        items
    };

    let mut failures = 0;
    for item in &items {
        let checked = check_once(server, item, false)
            .and_then(|b| Ok(serde_json::from_value::<CheckResponse>(b)?));
        match checked {
            Ok(resp) => println!("✅ {}\n", format_check(&resp)),
            Err(e) => {
                failures += 1;
                println!("❌ {}: {}\n", item, e);
            }
        }
    }

    if failures > 0 {
        anyhow::bail!("{} of {} items failed", failures, items.len());
    }
    Ok(())
}

// ============================================================================
// Main
// ============================================================================

fn main() {
    let cli = Cli::parse();
    let server = cli.server.trim_end_matches('/').to_string();

    let result = match cli.command {
        Commands::Check { item, get, json } => do_check(&server, &item, get, json),
        Commands::History {
            item,
            limit,
            offset,
            json,
        } => do_history(&server, item.as_deref(), limit, offset, json),
        Commands::Status => do_status(&server),
        Commands::Smoke { items } => do_smoke(&server, items),
    };

    if let Err(e) = result {
        eprintln!("baggage-cli: {}", e);
        std::process::exit(1);
    }
}

// ============================================================================
// Tests
// ============================================================================
