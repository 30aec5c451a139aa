use std::str::FromStr;

use alloy::primitives::utils::format_ether;
use alloy::primitives::Address;
use clap::{Parser, Subcommand};
use eyre::{eyre, Error, Result};
use log::info;

use limit_scout::bot::{Bot, ScanReport};
use limit_scout::config::Config;
use limit_scout::utils::app_context::AppContext;
use limit_scout::utils::logger::setup_logger;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Quote every ranked order one at a time (default)
    Scan,
    /// Quote every ranked order concurrently
    Batch,
    /// Print the highest-volume open orders
    Orders {
        /// How many orders to print
        #[arg(long, default_value_t = 20)]
        top: usize,
    },
    /// Print Balancer flash-loan liquidity for a token symbol or address
    Liquidity { token: String },
}

fn print_report(report: &ScanReport) {
    println!(
        "\nScanned {} orders: {} quoted, {} skipped, {} opportunities",
        report.scanned,
        report.quoted,
        report.skipped,
        report.opportunities.len()
    );
    for opportunity in &report.opportunities {
        println!(
            "  {} profit {} via {}",
            opportunity.order.hash, opportunity.profit, opportunity.quote.route
        );
    }
}

async fn scan(ctx: AppContext) -> Result<(), Error> {
    let bot = Bot::new(ctx);
    match bot.scan().await {
        Ok(report) => {
            print_report(&report);
            Ok(())
        }
        Err(e) => {
            bot.report_error(&e).await;
            Err(e)
        }
    }
}

async fn batch(ctx: AppContext) -> Result<(), Error> {
    let bot = Bot::new(ctx);
    match bot.scan_batch().await {
        Ok(report) => {
            print_report(&report);
            Ok(())
        }
        Err(e) => {
            bot.report_error(&e).await;
            Err(e)
        }
    }
}

async fn orders(ctx: AppContext, top: usize) -> Result<(), Error> {
    let tokens = ctx.config.tokens.clone();
    let bot = Bot::new(ctx);
    let ranked = bot.ranked_orders().await;

    println!("\nFound {} orders", ranked.len());
    for order in ranked.iter().take(top) {
        println!(
            "  ${:<14} {} {} -> {} {}  {}",
            order.volume.round(2),
            order.send_amount,
            tokens.symbol(&order.send_asset),
            order.receive_amount,
            tokens.symbol(&order.receive_asset),
            order.hash
        );
    }
    Ok(())
}

async fn liquidity(ctx: AppContext, token: &str) -> Result<(), Error> {
    let address = match ctx.config.tokens.resolve(token) {
        Some(token) => token.address,
        None => Address::from_str(token).map_err(|_| eyre!("unknown token `{token}`"))?,
    };
    let total = ctx.balancer.liquidity(address).await?;
    println!(
        "{} on Balancer: {}",
        ctx.config.tokens.symbol(&address),
        format_ether(total)
    );
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    setup_logger()?;

    let config = Config::from_env()?;
    info!(
        "Scout started on chain {} with {} tokens",
        config.chain_id,
        config.tokens.len()
    );
    let ctx = AppContext::new(config)?;

    let cli = Cli::parse();
    match cli.command {
        None | Some(Commands::Scan) => scan(ctx).await?,
        Some(Commands::Batch) => batch(ctx).await?,
        Some(Commands::Orders { top }) => orders(ctx, top).await?,
        Some(Commands::Liquidity { token }) => liquidity(ctx, &token).await?,
    }

    Ok(())
}
