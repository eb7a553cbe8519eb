// ==========================================
// 卷料库存系统 - 命令行主入口
// ==========================================
// 命令: list / import / submit / preview / logs / export-logs / 管理员覆写
// 输出: 结果写 stdout（JSON 或表格）,日志写 stderr
// ==========================================

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};

use coil_inventory::api::ApiError;
use coil_inventory::app::{get_default_db_path, AppState};
use coil_inventory::config::ADMIN_SECRET_ENV;
use coil_inventory::domain::{Coil, Order};
use coil_inventory::importer::ImportMode;

#[derive(Parser, Debug)]
#[command(
    name = "coil-inventory",
    about = "Coil inventory tracking and order footage allocation",
    version
)]
struct Cli {
    /// SQLite database path (defaults to COIL_INVENTORY_DB_PATH or the user data dir)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug, Clone)]
struct AdminArgs {
    /// Admin shared secret (falls back to COIL_INVENTORY_ADMIN_SECRET)
    #[arg(long)]
    secret: Option<String>,
}

impl AdminArgs {
    fn resolve(&self) -> Result<String> {
        match &self.secret {
            Some(secret) => Ok(secret.clone()),
            None => std::env::var(ADMIN_SECRET_ENV)
                .with_context(|| format!("admin secret required: pass --secret or set {}", ADMIN_SECRET_ENV)),
        }
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List all coils
    List,
    /// Import a CSV/Excel coil table (appends unless --replace)
    Import {
        file: PathBuf,
        /// Replace the whole inventory instead of appending
        #[arg(long)]
        replace: bool,
        #[command(flatten)]
        admin: AdminArgs,
    },
    /// Complete an order described by a JSON file
    Submit { order: PathBuf },
    /// Show the allocation for an order without changing inventory
    Preview { order: PathBuf },
    /// Show production log rows
    Logs {
        /// Only rows for this order number
        #[arg(long)]
        order: Option<String>,
        /// Number of most recent rows to show
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
    /// Export all production log rows to CSV
    ExportLogs { file: PathBuf },
    /// Receive a new coil into inventory
    Receive {
        coil_id: String,
        footage: f64,
        #[arg(long, default_value = "")]
        material: String,
        #[arg(long, default_value = "")]
        location: String,
        #[command(flatten)]
        admin: AdminArgs,
    },
    /// Override a coil's remaining footage
    SetFootage {
        coil_id: String,
        footage: f64,
        #[command(flatten)]
        admin: AdminArgs,
    },
    /// Override a coil's location
    SetLocation {
        coil_id: String,
        location: String,
        #[command(flatten)]
        admin: AdminArgs,
    },
    /// Remove a coil from inventory
    Remove {
        coil_id: String,
        #[command(flatten)]
        admin: AdminArgs,
    },
}

fn main() -> Result<()> {
    coil_inventory::logging::init_with_default("warn");

    let cli = Cli::parse();
    let db_path = cli
        .db
        .map(|p| p.to_string_lossy().to_string())
        .unwrap_or_else(get_default_db_path);
    tracing::info!(db_path = %db_path, version = coil_inventory::VERSION, "启动");

    let state = AppState::new(db_path).map_err(anyhow::Error::msg)?;

    match cli.command {
        Command::List => {
            let coils = state.inventory_api.list_coils()?;
            print_coils(&coils);
            println!("total footage: {:.3}", state.inventory_api.total_footage()?);
        }
        Command::Import {
            file,
            replace,
            admin,
        } => {
            let mode = if replace {
                ImportMode::Replace
            } else {
                ImportMode::Append
            };
            let summary = state
                .inventory_api
                .import_coils(&admin.resolve()?, &file, mode)?;
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        Command::Submit { order } => {
            let order = read_order(&order)?;
            match state.order_api.submit_order(&order) {
                Ok(receipt) => {
                    println!("{}", serde_json::to_string_pretty(&receipt)?);
                    for warning in &receipt.warnings {
                        eprintln!("warning: {}", warning.message);
                    }
                }
                Err(ApiError::OrderFailed { kind, message }) => {
                    bail!("order failed ({}): {}", kind, message)
                }
                Err(e) => return Err(e.into()),
            }
        }
        Command::Preview { order } => {
            let order = read_order(&order)?;
            let result = state.order_api.preview_order(&order)?;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        Command::Logs { order, limit } => {
            let rows = match order {
                Some(order_number) => state.order_api.find_logs_by_order(&order_number)?,
                None => state.order_api.list_recent_logs(limit)?,
            };
            println!("{}", serde_json::to_string_pretty(&rows)?);
        }
        Command::ExportLogs { file } => {
            let count = state.order_api.export_logs_csv(&file)?;
            println!("exported {} rows to {}", count, file.display());
        }
        Command::Receive {
            coil_id,
            footage,
            material,
            location,
            admin,
        } => {
            let coil = state.inventory_api.receive_coil(
                &admin.resolve()?,
                Coil::new(coil_id, material, footage, location),
            )?;
            print_coils(&[coil]);
        }
        Command::SetFootage {
            coil_id,
            footage,
            admin,
        } => {
            let coil = state
                .inventory_api
                .set_footage(&admin.resolve()?, &coil_id, footage)?;
            print_coils(&[coil]);
        }
        Command::SetLocation {
            coil_id,
            location,
            admin,
        } => {
            let coil = state
                .inventory_api
                .set_location(&admin.resolve()?, &coil_id, &location)?;
            print_coils(&[coil]);
        }
        Command::Remove { coil_id, admin } => {
            let coil = state.inventory_api.remove_coil(&admin.resolve()?, &coil_id)?;
            println!("removed {} ({:.3} ft)", coil.coil_id, coil.footage);
        }
    }

    Ok(())
}

fn read_order(path: &Path) -> Result<Order> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read order file {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("invalid order JSON in {}", path.display()))
}

fn print_coils(coils: &[Coil]) {
    println!(
        "{:<16} {:<16} {:>12} {:<12} {}",
        "COIL", "MATERIAL", "FOOTAGE", "LOCATION", "STATUS"
    );
    for coil in coils {
        println!(
            "{:<16} {:<16} {:>12.3} {:<12} {}",
            coil.coil_id, coil.material, coil.footage, coil.location, coil.status
        );
    }
}
