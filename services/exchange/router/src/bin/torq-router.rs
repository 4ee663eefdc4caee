//! Operator CLI - offline quoting against a pool snapshot
//!
//! Usage:
//!   torq-router quote --pools pools.toml --path USDC,WETH --amount-in 2500
//!   torq-router quote-in --pools pools.toml --path USDC,WETH,DAI --amount-out 1.5
//!   torq-router deposit --pools pools.toml --token-a USDC --token-b WETH --amount-a 1000 --amount-b 1
//!
//! Amounts are human-readable and scaled by token decimals. Results are
//! printed to stdout as JSON; logs go to stderr. The configured native
//! symbol names the wrapped-native token when the snapshot does not list it,
//! and quotes carry a deadline `router.default_deadline_secs` from now.

use amm::{path::hop_reserves, DepositBounds, OptimalDepositCalculator, V2Math, FEE_BPS};
use anyhow::{bail, Context, Result};
use clap::{Args as ClapArgs, Parser, Subcommand};
use exchange_state::{MarketView, PairRegistry, ReserveStore};
use serde_json::{json, Value};
use std::path::PathBuf;
use torq_config::EngineConfig;
use torq_router::{Clock, MarketFile, SystemClock};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;
use types::precision::{format_amount, parse_amount};
use types::{ExchangeError, Token};

#[derive(Parser, Debug)]
#[command(name = "torq-router")]
#[command(about = "Torq exchange router tooling")]
#[command(version)]
struct Args {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log filter (trace, debug, info, warn, error); overrides the config file
    #[arg(short, long)]
    log_level: Option<String>,

    /// Enable JSON logging format
    #[arg(long)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Output amounts for an exact input
    Quote {
        #[command(flatten)]
        market: MarketArgs,

        /// Comma-separated tokens, symbol or address
        #[arg(long)]
        path: String,

        #[arg(long)]
        amount_in: String,
    },

    /// Input amounts for an exact output
    QuoteIn {
        #[command(flatten)]
        market: MarketArgs,

        #[arg(long)]
        path: String,

        #[arg(long)]
        amount_out: String,
    },

    /// Deposit amounts that keep the current price
    Deposit {
        #[command(flatten)]
        market: MarketArgs,

        #[arg(long)]
        token_a: String,

        #[arg(long)]
        token_b: String,

        #[arg(long)]
        amount_a: String,

        #[arg(long)]
        amount_b: String,

        #[arg(long, default_value = "0")]
        min_a: String,

        #[arg(long, default_value = "0")]
        min_b: String,
    },
}

#[derive(ClapArgs, Debug)]
struct MarketArgs {
    /// Pool snapshot file; defaults to `market.pools_file` from config
    #[arg(long)]
    pools: Option<PathBuf>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let config = EngineConfig::load(args.config.as_deref())?;
    init_logging(&args, &config)?;
    debug!("Configuration loaded: {:?}", config);

    let output = match &args.command {
        Command::Quote {
            market,
            path,
            amount_in,
        } => {
            let (file, registry, reserves) = load_market(market, &config)?;
            let deadline = SystemClock.deadline_after(config.router.default_deadline_secs);
            quote(&file, MarketView::new(&registry, &reserves), path, amount_in, deadline)?
        }
        Command::QuoteIn {
            market,
            path,
            amount_out,
        } => {
            let (file, registry, reserves) = load_market(market, &config)?;
            let deadline = SystemClock.deadline_after(config.router.default_deadline_secs);
            quote_in(&file, MarketView::new(&registry, &reserves), path, amount_out, deadline)?
        }
        Command::Deposit {
            market,
            token_a,
            token_b,
            amount_a,
            amount_b,
            min_a,
            min_b,
        } => {
            let (file, registry, reserves) = load_market(market, &config)?;
            let token_a = file.token(token_a)?;
            let token_b = file.token(token_b)?;
            let bounds = DepositBounds {
                amount_a_desired: parse_amount(amount_a, token_a.decimals)?,
                amount_b_desired: parse_amount(amount_b, token_b.decimals)?,
                amount_a_min: parse_amount(min_a, token_a.decimals)?,
                amount_b_min: parse_amount(min_b, token_b.decimals)?,
            };
            deposit(MarketView::new(&registry, &reserves), token_a, token_b, &bounds)?
        }
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn init_logging(args: &Args, config: &EngineConfig) -> Result<()> {
    let level = args
        .log_level
        .clone()
        .unwrap_or_else(|| config.logging.level.clone());
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(&level))?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if args.json_logs || config.logging.json {
        builder.json().init();
    } else {
        builder.init();
    }

    Ok(())
}

fn load_market(args: &MarketArgs, config: &EngineConfig) -> Result<(MarketFile, PairRegistry, ReserveStore)> {
    let path = match args.pools.clone().or_else(|| config.pools_file()) {
        Some(path) => path,
        None => bail!("No pool file: pass --pools or set market.pools_file"),
    };

    let file = MarketFile::load(&path)?.with_native(
        config.router.wrapped_native,
        &config.router.native_symbol,
        config.router.native_decimals,
    );
    let registry = PairRegistry::new();
    let reserves = ReserveStore::new();
    file.install(&registry, &reserves)?;

    info!("Market loaded from {}: {} pairs", path.display(), registry.len());
    Ok((file, registry, reserves))
}

fn quote(file: &MarketFile, market: MarketView<'_>, path: &str, amount_in: &str, deadline: u64) -> Result<Value> {
    let tokens = file.path(path)?;
    let addresses: Vec<_> = tokens.iter().map(|token| token.address).collect();
    let first = tokens.first().context("empty path")?;
    let raw_in = parse_amount(amount_in, first.decimals).context("amount-in")?;

    let amounts = amm::get_amounts_out(&market, raw_in, &addresses)?;
    report(market, &tokens, &amounts, deadline)
}

fn quote_in(file: &MarketFile, market: MarketView<'_>, path: &str, amount_out: &str, deadline: u64) -> Result<Value> {
    let tokens = file.path(path)?;
    let addresses: Vec<_> = tokens.iter().map(|token| token.address).collect();
    let last = tokens.last().context("empty path")?;
    let raw_out = parse_amount(amount_out, last.decimals).context("amount-out")?;

    let amounts = amm::get_amounts_in(&market, raw_out, &addresses)?;
    report(market, &tokens, &amounts, deadline)
}

/// `deadline` is the value to submit with the swap request
fn report(market: MarketView<'_>, tokens: &[&Token], amounts: &[u128], deadline: u64) -> Result<Value> {
    let addresses: Vec<_> = tokens.iter().map(|token| token.address).collect();
    let reserves = hop_reserves(&market, &addresses)?;

    let hops = reserves
        .iter()
        .enumerate()
        .map(|(hop, &(reserve_in, reserve_out))| {
            let impact = V2Math::price_impact_bps(amounts[hop], reserve_in, reserve_out)?;
            Ok(json!({
                "from": tokens[hop].symbol,
                "to": tokens[hop + 1].symbol,
                "amount_in": format_amount(amounts[hop], tokens[hop].decimals),
                "amount_out": format_amount(amounts[hop + 1], tokens[hop + 1].decimals),
                "price_impact_bps": impact,
            }))
        })
        .collect::<Result<Vec<Value>, ExchangeError>>()?;

    Ok(json!({
        "path": tokens.iter().map(|token| token.symbol.as_str()).collect::<Vec<_>>(),
        "amounts": amounts.iter().map(u128::to_string).collect::<Vec<_>>(),
        "fee_bps": FEE_BPS,
        "deadline": deadline,
        "hops": hops,
    }))
}

fn deposit(market: MarketView<'_>, token_a: &Token, token_b: &Token, bounds: &DepositBounds) -> Result<Value> {
    let (reserve_a, reserve_b) = match market.registry.get(token_a.address, token_b.address) {
        Some(pair) => market.pair_reserves(&pair).oriented(&pair.key, token_a.address),
        None => (0, 0),
    };
    let deposit = OptimalDepositCalculator::calculate(bounds, reserve_a, reserve_b)?;

    Ok(json!({
        "token_a": token_a.symbol,
        "token_b": token_b.symbol,
        "amount_a": format_amount(deposit.amount_a, token_a.decimals),
        "amount_b": format_amount(deposit.amount_b, token_b.decimals),
        "raw": [deposit.amount_a.to_string(), deposit.amount_b.to_string()],
        "bootstrap": deposit.bootstrap,
    }))
}
