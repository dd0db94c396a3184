//! Branchguard CLI - issue single branch calls against a participant
//! and inspect its products, orders and barrier ledger

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tabled::{Table, Tabled};

const DEFAULT_RPC_URL: &str = "http://127.0.0.1:9530";

#[derive(Parser)]
#[command(name = "bgctl")]
#[command(about = "Branchguard participant CLI", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// RPC server URL
    #[arg(long, env = "BRANCHGUARD_RPC_URL", default_value = DEFAULT_RPC_URL)]
    rpc_url: String,
}

/// Barrier context sent with a branch call
#[derive(Args, Debug, Clone)]
struct BarrierArgs {
    /// Global transaction id (a new one is generated when omitted)
    #[arg(long)]
    gid: Option<String>,

    /// Branch id within the transaction
    #[arg(long, default_value = "01")]
    branch_id: String,

    /// Transaction type, diagnostic only
    #[arg(long, default_value = "saga")]
    trans_type: String,
}

impl BarrierArgs {
    fn to_json(&self, op: &str) -> serde_json::Value {
        let gid = self
            .gid
            .clone()
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
        json!({
            "trans_type": self.trans_type,
            "gid": gid,
            "branch_id": self.branch_id,
            "op": op,
        })
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Decrement a product's stock (forward branch)
    DecrStock {
        #[command(flatten)]
        barrier: BarrierArgs,

        /// Product ID
        #[arg(long)]
        id: i64,

        /// Quantity
        #[arg(short, long)]
        num: i64,

        #[arg(long, default_value = "action")]
        op: String,
    },

    /// Give stock back (compensation branch)
    DecrStockRevert {
        #[command(flatten)]
        barrier: BarrierArgs,

        /// Product ID
        #[arg(long)]
        id: i64,

        /// Quantity
        #[arg(short, long)]
        num: i64,

        #[arg(long, default_value = "compensate")]
        op: String,
    },

    /// Create an order (forward branch)
    CreateOrder {
        #[command(flatten)]
        barrier: BarrierArgs,

        /// User ID
        #[arg(long)]
        uid: i64,

        /// Product ID
        #[arg(long)]
        pid: i64,

        /// Amount in cents
        #[arg(long, default_value = "0")]
        amount: i64,

        #[arg(long, default_value = "action")]
        op: String,
    },

    /// Revert the user's latest order (compensation branch)
    RevertOrder {
        #[command(flatten)]
        barrier: BarrierArgs,

        /// User ID
        #[arg(long)]
        uid: i64,

        #[arg(long, default_value = "compensate")]
        op: String,
    },

    /// Product management
    Product {
        #[command(subcommand)]
        command: ProductCommands,
    },

    /// List orders by order ID or user ID
    Orders {
        #[arg(long)]
        id: Option<i64>,

        #[arg(long)]
        uid: Option<i64>,
    },

    /// Recorded ops of one branch
    Branch {
        #[arg(long)]
        gid: String,

        #[arg(long, default_value = "01")]
        branch_id: String,
    },

    /// Show participant status and ledger counts
    Stats,
}

#[derive(Subcommand)]
enum ProductCommands {
    /// Create a product
    Create {
        #[arg(long)]
        name: String,

        #[arg(long, default_value = "")]
        description: String,

        #[arg(long)]
        stock: i64,

        /// Unit price in cents
        #[arg(long, default_value = "0")]
        amount: i64,
    },

    /// Show a product
    Detail {
        id: i64,
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
    #[allow(dead_code)]
    id: u64,
    result: Option<serde_json::Value>,
    error: Option<JsonRpcError>,
}

#[derive(Deserialize)]
struct JsonRpcError {
    code: i32,
    message: String,
    data: Option<serde_json::Value>,
}

impl JsonRpcError {
    /// FAILURE / ONGOING marker, when the participant sent one
    fn marker(&self) -> Option<&str> {
        self.data.as_ref()?.get("result")?.as_str()
    }

    fn describe(&self) -> String {
        match self.marker() {
            Some(marker) => format!("RPC error ({}, {}): {}", self.code, marker, self.message),
            None => format!("RPC error ({}): {}", self.code, self.message),
        }
    }
}

#[derive(Deserialize, Tabled)]
struct BranchResult {
    gid: String,
    branch_id: String,
    op: String,
    outcome: String,
    applied: bool,
}

#[derive(Deserialize, Tabled)]
struct ProductRow {
    id: i64,
    name: String,
    stock: i64,
    amount: i64,
}

#[derive(Deserialize, Tabled)]
struct OrderRow {
    id: i64,
    uid: i64,
    pid: i64,
    amount: i64,
    status: String,
}

#[derive(Deserialize, Tabled)]
struct LedgerRow {
    id: i64,
    trans_type: String,
    gid: String,
    branch_id: String,
    op: String,
    created_at: i64,
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
        .context("Failed to connect to participant")?
        .json()
        .await
        .context("Failed to parse response")?;

    if let Some(error) = response.error {
        anyhow::bail!(error.describe());
    }

    response
        .result
        .ok_or_else(|| anyhow::anyhow!("No result in response"))
}

async fn run_branch(url: &str, method: &str, params: serde_json::Value) -> Result<()> {
    let result = call_rpc(url, method, params).await?;
    let branch: BranchResult = serde_json::from_value(result)?;

    if branch.applied {
        println!("{}", "✓ Branch applied".green().bold());
    } else {
        println!(
            "{}",
            format!("○ Branch skipped ({})", branch.outcome).yellow().bold()
        );
    }
    println!();
    println!("{}", Table::new(vec![branch]));
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let url = cli.rpc_url.as_str();

    match cli.command {
        Commands::DecrStock {
            barrier,
            id,
            num,
            op,
        } => {
            let params = json!({ "barrier": barrier.to_json(&op), "id": id, "num": num });
            run_branch(url, "product.decr_stock.v1", params).await?;
        }

        Commands::DecrStockRevert {
            barrier,
            id,
            num,
            op,
        } => {
            let params = json!({ "barrier": barrier.to_json(&op), "id": id, "num": num });
            run_branch(url, "product.decr_stock_revert.v1", params).await?;
        }

        Commands::CreateOrder {
            barrier,
            uid,
            pid,
            amount,
            op,
        } => {
            let params = json!({
                "barrier": barrier.to_json(&op),
                "uid": uid,
                "pid": pid,
                "amount": amount,
            });
            run_branch(url, "order.create.v1", params).await?;
        }

        Commands::RevertOrder { barrier, uid, op } => {
            let params = json!({ "barrier": barrier.to_json(&op), "uid": uid });
            run_branch(url, "order.create_revert.v1", params).await?;
        }

        Commands::Product { command } => match command {
            ProductCommands::Create {
                name,
                description,
                stock,
                amount,
            } => {
                let params = json!({
                    "name": name,
                    "description": description,
                    "stock": stock,
                    "amount": amount,
                });
                let result = call_rpc(url, "product.create.v1", params).await?;
                println!(
                    "{}",
                    format!("✓ Product {} created", result["id"]).green().bold()
                );
            }
            ProductCommands::Detail { id } => {
                let result = call_rpc(url, "product.detail.v1", json!({ "id": id })).await?;
                let product: ProductRow = serde_json::from_value(result["product"].clone())?;
                println!("{}", Table::new(vec![product]));
            }
        },

        Commands::Orders { id, uid } => {
            if id.is_none() && uid.is_none() {
                anyhow::bail!("either --id or --uid is required");
            }
            let result = call_rpc(url, "order.detail.v1", json!({ "id": id, "uid": uid })).await?;
            let orders: Vec<OrderRow> = serde_json::from_value(result["orders"].clone())?;

            if orders.is_empty() {
                println!("{}", "No orders".yellow());
            } else {
                println!("{}", Table::new(orders));
            }
        }

        Commands::Branch { gid, branch_id } => {
            let params = json!({ "gid": gid, "branch_id": branch_id });
            let result = call_rpc(url, "admin.branch.v1", params).await?;
            let entries: Vec<LedgerRow> = serde_json::from_value(result["entries"].clone())?;

            println!(
                "{}",
                format!("Ledger for {}/{}", gid, branch_id).cyan().bold()
            );
            if entries.is_empty() {
                println!("{}", "No ops recorded".yellow());
            } else {
                println!("{}", Table::new(entries));
            }
        }

        Commands::Stats => {
            println!("{}", "Participant Status".cyan().bold());
            println!();

            match call_rpc(url, "admin.stats.v1", json!({})).await {
                Ok(stats) => {
                    println!("  {} {}", "RPC URL:".bold(), url);
                    println!("  {} {}", "Status:".bold(), "ONLINE".green());
                    println!("  {} {} seconds", "Uptime:".bold(), stats["uptime_seconds"]);
                    println!();
                    println!("  {} {}", "Ledger rows:".bold(), stats["ledger"]["total"]);
                    if let Some(by_op) = stats["ledger"]["by_op"].as_object() {
                        for (op, count) in by_op {
                            println!("    {:<12} {}", op, count);
                        }
                    }
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
