use std::{path::PathBuf, sync::Arc};

use anyhow::{Context, Result};
use clap::Parser;
use client_core::{HttpLessonsApi, ShopController, ShopOptions};
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    sync::broadcast::error::RecvError,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod commands;
mod config;
mod view;

use commands::{dispatch_command, parse_command, Dispatch};
use config::load_settings;

#[derive(Parser, Debug)]
#[command(about = "Browse lessons, fill a cart and place an order")]
struct Args {
    /// Settings file; `shop.toml` in the working directory is read if present.
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    api_base_url: Option<String>,
    /// Ask for (mock) card details before checkout.
    #[arg(long)]
    require_payment: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();
    let args = Args::parse();

    let mut settings = load_settings(args.config.as_deref())?;
    if let Some(url) = args.api_base_url {
        settings.api_base_url = url;
        settings = config::validate(settings)?;
    }
    if args.require_payment {
        settings.payment_required = true;
    }
    info!(api_base_url = %settings.api_base_url, "starting shop");

    let api = HttpLessonsApi::with_timeout(&settings.api_base_url, settings.request_timeout())
        .context("failed to build lessons api client")?;
    let shop = ShopController::new(
        Arc::new(api),
        ShopOptions {
            search_debounce: settings.search_debounce(),
            payment_required: settings.payment_required,
        },
    );

    shop.fetch_lessons().await;
    run_prompt(shop).await
}

async fn run_prompt(shop: Arc<ShopController>) -> Result<()> {
    let mut events = shop.subscribe_events();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    println!("{}", view::render(&shop.snapshot().await));
    println!("type 'help' for commands");

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("failed to read from stdin")? else {
                    break;
                };
                let command = match parse_command(&line) {
                    Ok(command) => command,
                    Err(message) => {
                        if !message.is_empty() {
                            println!("{message}");
                        }
                        continue;
                    }
                };
                match dispatch_command(&shop, command).await {
                    Dispatch::Quit => break,
                    Dispatch::Continue(message) => {
                        if let Some(message) = message {
                            println!("{message}");
                        }
                        println!("{}", view::render(&shop.snapshot().await));
                    }
                }
            }
            event = events.recv() => match event {
                Ok(event) => {
                    let state = shop.snapshot().await;
                    if let Some(out) = view::render_update(&event, &state) {
                        println!("{}", out.trim_end());
                    }
                }
                Err(RecvError::Lagged(skipped)) => warn!(skipped, "event stream lagged"),
                Err(RecvError::Closed) => break,
            },
        }
    }

    shop.cancel_pending_search();
    Ok(())
}
