//! Job Ledger CLI - Command-line client for the job ledger daemon

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tabled::{Table, Tabled};

const DEFAULT_RPC_URL: &str = "http://127.0.0.1:9630";

#[derive(Parser)]
#[command(name = "jobledger-cli")]
#[command(about = "Job Ledger CLI", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// RPC server URL
    #[arg(long, env = "JOBLEDGER_RPC_URL", default_value = DEFAULT_RPC_URL)]
    rpc_url: String,

    /// Account the command acts on
    #[arg(short, long, env = "JOBLEDGER_ACCOUNT", global = true)]
    account: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// List the account's job records
    List,

    /// Create a job record
    Create {
        /// Record as JSON object
        #[arg(long)]
        record: String,
    },

    /// Update only the supplied fields of a job record
    Update {
        /// Record ID
        record_id: String,

        /// Fields to change as JSON object
        #[arg(long)]
        patch: String,
    },

    /// Delete a job record
    Delete {
        /// Record ID
        record_id: String,
    },

    /// Show totals over the account's records
    Summary,

    /// Show or change the account profile
    Profile {
        #[command(subcommand)]
        action: ProfileAction,
    },

    /// Show daemon status
    Status,
}

#[derive(Subcommand)]
enum ProfileAction {
    /// Print the stored profile
    Get,

    /// Merge fields into the profile
    Set {
        /// Fields as JSON object
        #[arg(long)]
        fields: String,
    },
}

#[derive(Serialize)]
struct JsonRpcRequest {
    jsonrpc: String,
    method: String,
    params: serde_json::Value,
    id: u64,
}

#[derive(Deserialize)]
struct JsonRpcResponse {
    #[allow(dead_code)]
    jsonrpc: String,
    /// `null` when the server could not read the request id
    #[allow(dead_code)]
    id: Option<serde_json::Value>,
    result: Option<serde_json::Value>,
    error: Option<JsonRpcError>,
}

#[derive(Deserialize)]
struct JsonRpcError {
    code: i32,
    message: String,
}

#[derive(Tabled)]
struct RecordRow {
    id: String,
    date: String,
    kind: String,
    client: String,
    gross: String,
    profit: String,
}

impl RecordRow {
    fn from_value(value: &serde_json::Value) -> Self {
        let text = |key: &str| value[key].as_str().unwrap_or_default().to_string();
        let amount = |key: &str| format!("{:.0}", value[key].as_f64().unwrap_or(0.0));
        Self {
            id: text("record_id"),
            date: text("date"),
            kind: text("kind"),
            client: text("client_name"),
            gross: amount("gross_amount"),
            profit: amount("profit"),
        }
    }
}

async fn call_rpc(url: &str, method: &str, params: serde_json::Value) -> Result<serde_json::Value> {
    let request = JsonRpcRequest {
        jsonrpc: "2.0".to_string(),
        method: method.to_string(),
        params,
        id: 1,
    };

    let client = reqwest::Client::new();
    let response: JsonRpcResponse = client
        .post(url)
        .json(&request)
        .send()
        .await
        .context("Failed to connect to daemon")?
        .json()
        .await
        .context("Failed to parse response")?;

    into_result(response)
}

fn into_result(response: JsonRpcResponse) -> Result<serde_json::Value> {
    if let Some(error) = response.error {
        anyhow::bail!("RPC error ({}): {}", error.code, error.message);
    }

    response
        .result
        .ok_or_else(|| anyhow::anyhow!("No result in response"))
}

fn parse_object(raw: &str, what: &str) -> Result<serde_json::Value> {
    let value: serde_json::Value =
        serde_json::from_str(raw).with_context(|| format!("Invalid JSON {}", what))?;
    if !value.is_object() {
        anyhow::bail!("{} must be a JSON object", what);
    }
    Ok(value)
}

/// Deferred results were not executed by the daemon
fn is_deferred(result: &serde_json::Value) -> bool {
    result["source"] == "deferred"
}

fn print_deferred() {
    println!(
        "{}",
        "⚠ Primary store unavailable; request deferred to the secondary store"
            .yellow()
            .bold()
    );
}

fn require_account(account: Option<String>) -> Result<String> {
    account.context("--account (or JOBLEDGER_ACCOUNT) is required for this command")
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::List => {
            let account_id = require_account(cli.account)?;
            let result = call_rpc(
                &cli.rpc_url,
                "records.list.v1",
                json!({ "account_id": account_id }),
            )
            .await?;

            if is_deferred(&result) {
                print_deferred();
                return Ok(());
            }

            let rows: Vec<RecordRow> = result["records"]
                .as_array()
                .map(|records| records.iter().map(RecordRow::from_value).collect())
                .unwrap_or_default();

            if rows.is_empty() {
                println!("{}", "No job records".yellow());
            } else {
                println!("{}", Table::new(rows));
            }
        }

        Commands::Create { record } => {
            let params = json!({
                "account_id": require_account(cli.account)?,
                "record": parse_object(&record, "record")?,
            });

            let result = call_rpc(&cli.rpc_url, "records.create.v1", params).await?;

            if is_deferred(&result) {
                print_deferred();
            } else {
                println!("{}", "✓ Job record created".green().bold());
                println!("  {} {}", "Record ID:".bold(), result["record_id"]);
            }
        }

        Commands::Update { record_id, patch } => {
            let params = json!({
                "account_id": require_account(cli.account)?,
                "record_id": record_id,
                "patch": parse_object(&patch, "patch")?,
            });

            let result = call_rpc(&cli.rpc_url, "records.update.v1", params).await?;

            if is_deferred(&result) {
                print_deferred();
            } else {
                println!("{}", format!("✓ Job record {} updated", record_id).green().bold());
            }
        }

        Commands::Delete { record_id } => {
            let params = json!({
                "account_id": require_account(cli.account)?,
                "record_id": record_id,
            });

            let result = call_rpc(&cli.rpc_url, "records.delete.v1", params).await?;

            if is_deferred(&result) {
                print_deferred();
            } else {
                println!("{}", format!("✓ Job record {} deleted", record_id).green().bold());
            }
        }

        Commands::Summary => {
            let account_id = require_account(cli.account)?;
            let result = call_rpc(
                &cli.rpc_url,
                "records.summary.v1",
                json!({ "account_id": account_id }),
            )
            .await?;

            if is_deferred(&result) {
                print_deferred();
                return Ok(());
            }

            let summary = &result["summary"];
            println!("{}", format!("Summary for {}", account_id).cyan().bold());
            println!();
            println!("  {} {}", "Records:".bold(), summary["record_count"]);
            println!("  {} {}", "Gross:".bold(), summary["total_gross"]);
            println!("  {} {}", "Fees:".bold(), summary["total_fees"]);
            println!("  {} {}", "Fee offsets:".bold(), summary["total_fee_offsets"]);
            println!("  {} {}", "Costs:".bold(), summary["total_costs"]);
            println!("  {} {}", "Profit:".bold(), summary["total_profit"]);
            println!("  {} {}", "Average profit:".bold(), summary["average_profit"]);

            if let Some(clients) = summary["clients"].as_object() {
                println!();
                for (client, count) in clients {
                    println!("  {} {} × {}", "•".bold(), client, count);
                }
            }
        }

        Commands::Profile { action } => {
            let account_id = require_account(cli.account)?;
            match action {
                ProfileAction::Get => {
                    let result = call_rpc(
                        &cli.rpc_url,
                        "profile.get.v1",
                        json!({ "account_id": account_id }),
                    )
                    .await?;

                    if is_deferred(&result) {
                        print_deferred();
                    } else {
                        println!("{}", serde_json::to_string_pretty(&result["profile"])?);
                    }
                }
                ProfileAction::Set { fields } => {
                    let params = json!({
                        "account_id": account_id,
                        "fields": parse_object(&fields, "fields")?,
                    });

                    let result = call_rpc(&cli.rpc_url, "profile.upsert.v1", params).await?;

                    if is_deferred(&result) {
                        print_deferred();
                    } else {
                        println!("{}", "✓ Profile saved".green().bold());
                    }
                }
            }
        }

        Commands::Status => {
            println!("{}", "System Status".cyan().bold());
            println!();

            match call_rpc(&cli.rpc_url, "system.status.v1", json!({})).await {
                Ok(status) => {
                    println!("  {} {}", "RPC URL:".bold(), cli.rpc_url);
                    println!("  {} {}", "Status:".bold(), "ONLINE".green());
                    println!("  {} {}", "Version:".bold(), status["version"]);
                    let primary = if status["primary"] == "available" {
                        "AVAILABLE".green()
                    } else {
                        "UNAVAILABLE".yellow()
                    };
                    println!("  {} {}", "Primary store:".bold(), primary);
                    println!("  {} {} seconds", "Uptime:".bold(), status["uptime_seconds"]);
                }
                Err(e) => {
                    println!("  {} {}", "Status:".bold(), "ERROR".red());
                    println!("  {} {}", "Error:".bold(), e);
                }
            }
        }
    }

    Ok(())
}
