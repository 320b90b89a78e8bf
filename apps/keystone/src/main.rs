//! # keystone CLI
//!
//! Back-office tasks from the terminal.
//!
//! ## Usage
//! ```bash
//! keystone check Q-20260301-0004           # stock check for a quotation
//! keystone pick-list Q-20260301-0004       # picking list as CSV
//! keystone pick-list Q-20260301-0004 --html > pick.html
//! keystone expire                          # expire overdue quotations
//! keystone low-stock                       # products at their reorder point
//! keystone config                          # print the effective config
//! keystone --config ./keystone.toml check Q-20260301-0004
//! ```

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use keystone_app::commands::{self, ExportFormat};
use keystone_app::{init_tracing, AppConfig, AppState};
use tracing::{error, info};

#[derive(Debug, Parser)]
#[command(name = "keystone")]
#[command(version, about = "Keystone Workshop back office")]
struct Cli {
    /// Config file (default: platform config dir)
    #[arg(short, long, value_name = "PATH", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand, PartialEq, Eq)]
enum Commands {
    /// Check stock for a quotation
    Check {
        /// Quotation number, e.g. Q-20260301-0004
        quotation: String,
    },
    /// Print the picking list (CSV by default)
    PickList {
        quotation: String,

        /// Printable HTML instead of CSV
        #[arg(long)]
        html: bool,
    },
    /// Expire quotations past their validity
    Expire,
    /// List products at or below reorder point
    LowStock,
    /// Print the effective configuration
    Config,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_tracing();

    if let Err(e) = run(cli).await {
        error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load(cli.config)?;

    if cli.command == Commands::Config {
        print!("{}", config.to_toml()?);
        return Ok(());
    }

    let state = AppState::open(config).await?;
    let result = dispatch(&state, cli.command).await;
    state.db.close().await;
    result
}

async fn dispatch(state: &AppState, command: Commands) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Commands::Check { quotation } => {
            let check = commands::check_quotation_inventory(state, &quotation).await?;

            println!("Inventory check for {}", quotation);
            println!(
                "{:<14} {:<32} {:>6} {:>6} {:>6}  STATUS",
                "SKU", "PRODUCT", "QTY", "STOCK", "MIN"
            );
            for line in &check.lines {
                let status = match (line.found, line.is_available, line.needs_reorder) {
                    (false, _, _) => "not found",
                    (_, false, _) => "unavailable",
                    (_, true, true) => "available, reorder",
                    (_, true, false) => "available",
                };
                println!(
                    "{:<14} {:<32} {:>6} {:>6} {:>6}  {}",
                    line.sku,
                    line.product_name,
                    line.requested_quantity,
                    line.current_stock,
                    line.min_stock,
                    status
                );
            }
            println!();
            println!(
                "{} line(s): {} available, {} unavailable, {} low stock",
                check.summary.total_items,
                check.summary.available_items,
                check.summary.unavailable_items,
                check.summary.low_stock_items
            );
        }
        Commands::PickList { quotation, html } => {
            let format = if html { ExportFormat::Html } else { ExportFormat::Csv };
            let export = commands::export_picking_list(state, &quotation, format).await?;
            print!("{}", export.content);
        }
        Commands::Expire => {
            let expired = commands::expire_quotations(state, commands::quotation::today()).await?;
            for number in &expired {
                println!("{}", number);
            }
            info!(count = expired.len(), "Expiry run finished");
        }
        Commands::LowStock => {
            let report = commands::low_stock_report(state).await?;
            println!(
                "{:<14} {:<32} {:>6} {:>6}  LOCATION",
                "SKU", "PRODUCT", "STOCK", "MIN"
            );
            for entry in &report {
                println!(
                    "{:<14} {:<32} {:>6} {:>6}  {}",
                    entry.sku,
                    entry.name,
                    entry.current_stock,
                    entry.min_stock,
                    entry
                        .location
                        .as_ref()
                        .map(ToString::to_string)
                        .unwrap_or_else(|| "Unassigned".to_string())
                );
            }
        }
        Commands::Config => {}
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::error::ErrorKind;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parses_subcommands_and_global_config() {
        let cli = Cli::try_parse_from([
            "keystone",
            "pick-list",
            "Q-20260301-0004",
            "--html",
            "--config",
            "./keystone.toml",
        ])
        .unwrap();

        assert_eq!(cli.config, Some(PathBuf::from("./keystone.toml")));
        assert_eq!(
            cli.command,
            Commands::PickList {
                quotation: "Q-20260301-0004".into(),
                html: true,
            }
        );

        let cli = Cli::try_parse_from(["keystone", "-c", "k.toml", "low-stock"]).unwrap();
        assert_eq!(cli.command, Commands::LowStock);
    }

    #[test]
    fn test_trailing_config_without_value_is_usage_error() {
        let err = Cli::try_parse_from(["keystone", "expire", "--config"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidValue);
    }

    #[test]
    fn test_missing_quotation_is_usage_error() {
        let err = Cli::try_parse_from(["keystone", "check"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingRequiredArgument);

        let err = Cli::try_parse_from(["keystone", "ship"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidSubcommand);
    }
}
