//! Rose Terminal
//!
//! Line-oriented front end: each line is a command, or a panel action while
//! the trade or transfer panel is open.

use anyhow::Context;
use rose_chain::{LocalWallet, WalletConnector, WalletHandle};
use rose_core::{CandleInterval, HistoryEntry, Output};
use rose_services::{
    CandleSeries, ChannelSink, HttpPriceFeed, PoolPriceSampler, PriceFeed, SessionLog,
};
use rose_terminal::{
    CommandInterpreter, PanelContext, PanelKind, TerminalConfig, TradePanel, TransferPanel,
};
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const TRADE_HELP: &str =
    "trade panel: <amount> | flip | + | - | quote | execute | close";
const TRANSFER_HELP: &str = "transfer panel: amount <x> | to <address or name> | send | close";

enum Panel {
    Trade(TradePanel),
    Transfer(TransferPanel),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env.local file
    if let Err(e) = dotenvy::from_filename(".env.local") {
        // Not an error if the file doesn't exist
        if !matches!(e, dotenvy::Error::Io(_)) {
            eprintln!("Warning: Failed to load .env.local: {}", e);
        }
    }

    // Logs go to stderr so they do not interleave with terminal output
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,rose_terminal=debug")),
        )
        .init();

    info!("Starting Rose Terminal");

    let config = TerminalConfig::from_env().context("Invalid terminal configuration")?;

    let connector = WalletConnector::new(config.balance_refresh);
    connect_wallet(&connector, &config).await;
    let wallet = connector.handle();

    let session_log = SessionLog::new();
    let (notifier, notifications) = ChannelSink::new();
    let ctx = PanelContext {
        wallet: wallet.clone(),
        notifier: Arc::new(notifier),
        session_log: session_log.clone(),
        quote_refresh: config.quote_refresh,
    };

    let sampler = Arc::new(PoolPriceSampler::default());
    spawn_pool_sampler(wallet.clone(), sampler.clone(), config.balance_refresh);
    if let Some(url) = config.price_feed_url.clone() {
        spawn_price_history(url);
    }

    let interpreter = CommandInterpreter::new(wallet, config.networks, session_log);
    run_repl(interpreter, ctx, notifications, &sampler).await?;

    connector.disconnect();
    if let Some(price) = sampler.latest() {
        info!("Last pool price: {} ({} samples)", price, sampler.len());
    }
    info!("Rose Terminal stopped");
    Ok(())
}

async fn connect_wallet(connector: &WalletConnector, config: &TerminalConfig) {
    let Some(chain) = &config.chain else {
        info!("ROSE_RPC_URL or ROSE_TOKEN_ADDRESS not set - starting without a wallet");
        return;
    };

    let wallet = match LocalWallet::from_env() {
        Ok(wallet) => wallet,
        Err(e) => {
            info!("No signing key available ({}) - starting without a wallet", e);
            return;
        }
    };

    if let Err(e) = connector
        .connect_rpc(
            &wallet,
            &chain.rpc_url,
            chain.token_address,
            config.confirmation_timeout,
        )
        .await
    {
        warn!("Failed to connect wallet: {}", e);
    }
}

fn spawn_pool_sampler(wallet: WalletHandle, sampler: Arc<PoolPriceSampler>, period: Duration) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        loop {
            ticker.tick().await;
            if let Some(snapshot) = wallet.current().and_then(|s| s.balances()) {
                sampler.record(&snapshot);
            }
        }
    });
}

fn spawn_price_history(url: String) {
    tokio::spawn(async move {
        let feed = match HttpPriceFeed::new(url) {
            Ok(feed) => feed,
            Err(e) => {
                warn!("Failed to create price feed client: {}", e);
                return;
            }
        };

        match feed.fetch().await {
            Ok(points) => {
                let series = CandleSeries::new(points, CandleInterval::OneDay);
                info!(
                    "Loaded {} price points into {} candles",
                    series.points().len(),
                    series.gap_filled().len()
                );
            }
            Err(e) => warn!("Failed to fetch price history from {}: {}", feed.url(), e),
        }
    });
}

async fn run_repl(
    mut interpreter: CommandInterpreter,
    ctx: PanelContext,
    mut notifications: mpsc::UnboundedReceiver<Output>,
    sampler: &PoolPriceSampler,
) -> anyhow::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut panel: Option<Panel> = None;
    let mut printed = 0;
    let mut clears = interpreter.clear_count();

    loop {
        while let Ok(note) = notifications.try_recv() {
            println!("» {}", note.to_plain_string());
        }
        if interpreter.clear_count() != clears {
            clears = interpreter.clear_count();
            printed = 0;
        }
        interpreter.drain_session_log();
        printed = print_history(&interpreter, printed);

        if interpreter.is_closed() {
            break;
        }
        if interpreter.snake_running() {
            println!("Snake is not available in this terminal.");
            interpreter.end_snake();
        }
        if panel.is_none() {
            panel = match interpreter.active_panel() {
                Some(PanelKind::Trade) => {
                    if let Some(line) = sampler.sparkline() {
                        println!("pool {}", line);
                    }
                    println!("{}", TRADE_HELP);
                    Some(Panel::Trade(TradePanel::open(&ctx)))
                }
                Some(PanelKind::Transfer) => {
                    println!("{}", TRANSFER_HELP);
                    Some(Panel::Transfer(TransferPanel::open(&ctx)))
                }
                None => None,
            };
        }

        print!("{}", if panel.is_some() { "rose/panel> " } else { "rose> " });
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };

        let keep_open = match panel.as_mut() {
            Some(Panel::Trade(trade)) => trade_action(trade, line.trim()).await,
            Some(Panel::Transfer(transfer)) => transfer_action(transfer, line.trim()),
            None => {
                interpreter.submit_line(&line);
                true
            }
        };

        if !keep_open {
            panel = None;
            interpreter.close_panel();
        }
    }

    Ok(())
}

fn print_history(interpreter: &CommandInterpreter, printed: usize) -> usize {
    let history = interpreter.history();
    for entry in history.iter().skip(printed) {
        if let HistoryEntry::Output(output) = entry {
            if !output.is_empty() {
                println!("{}", output.to_plain_string());
            }
        }
    }
    history.len()
}

async fn trade_action(panel: &mut TradePanel, action: &str) -> bool {
    match action {
        "close" | "q" => return false,
        "flip" => panel.toggle_direction(),
        "+" => panel.increase_slippage(),
        "-" => panel.decrease_slippage(),
        "quote" => {
            panel.refresh_quote().await;
        }
        "execute" => {
            if panel.execute().is_none() {
                println!("A transaction is already in flight.");
            }
            return true;
        }
        "" => {}
        amount => {
            panel.set_amount(amount);
            panel.refresh_quote().await;
        }
    }

    println!(
        "{} {} -> {} | slippage {}",
        panel.amount_text(),
        panel.direction().input_glyph().symbol(),
        panel.quote_text(),
        panel.slippage()
    );
    true
}

fn transfer_action(panel: &mut TransferPanel, action: &str) -> bool {
    let (verb, rest) = action.split_once(' ').unwrap_or((action, ""));
    match verb {
        "close" | "q" => return false,
        "amount" => panel.set_amount(rest.trim()),
        "to" => panel.set_recipient(rest.trim()),
        "send" => {
            if panel.execute().is_none() {
                println!("A transaction is already in flight.");
            }
        }
        _ => println!("{}", TRANSFER_HELP),
    }
    true
}
