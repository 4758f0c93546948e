//! sigmux - trap configured signals and report every delivery.
//!
//! The binary plays the role of the consuming application: it validates the
//! trap list through the resolver, hands the canonical mapping to the
//! registry, and waits until the requested number of deliveries arrived.

#![deny(unsafe_op_in_unsafe_fn)]

mod cli;

use std::{
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    thread,
    time::Duration,
};

use anyhow::{Context, Result};
use clap::Parser;
use once_cell::sync::OnceCell;
use sigmux::{SignalCallback, SignalRegistry, resolve};
use tracing::{debug, info, warn};
use tracing_subscriber::{filter::EnvFilter, fmt};

static LOGGER: OnceCell<()> = OnceCell::new();

fn main() -> Result<()> {
    let cli = cli::Cli::parse();
    init_logging(cli.verbosity);

    let remaining = Arc::new(AtomicU64::new(cli.count));
    let mut mapping: Vec<(&'static str, Vec<SignalCallback>)> = Vec::new();
    let mut counters: Vec<(&'static str, Arc<AtomicU64>)> = Vec::new();
    for token in &cli.traps {
        let name = resolve(token).with_context(|| format!("invalid --trap value {token:?}"))?;
        let delivered = Arc::new(AtomicU64::new(0));
        mapping.push((name, vec![counting(&delivered), draining(&remaining)]));
        counters.push((name, delivered));
    }

    let mut registry = SignalRegistry::new(mapping).context("install signal traps")?;
    debug!(installed = registry.installed(), "traps armed");
    println!("ready");

    while remaining.load(Ordering::SeqCst) > 0 {
        thread::sleep(Duration::from_millis(25));
    }

    registry.uninstall().context("restore signal dispositions")?;

    let mut total = 0;
    for (name, delivered) in &counters {
        let count = delivered.load(Ordering::SeqCst);
        total += count;
        info!("{name}: {count} delivered");
    }
    println!("received {total} signal(s)");
    Ok(())
}

// First callback in every chain: per-signal delivery counter.
fn counting(delivered: &Arc<AtomicU64>) -> SignalCallback {
    let delivered = Arc::clone(delivered);
    Arc::new(move || {
        delivered.fetch_add(1, Ordering::SeqCst);
    })
}

// Second callback: drains the shared delivery budget, saturating at zero.
fn draining(remaining: &Arc<AtomicU64>) -> SignalCallback {
    let remaining = Arc::clone(remaining);
    Arc::new(move || {
        let _ = remaining.fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| {
            left.checked_sub(1)
        });
    })
}

fn init_logging(v: u8) {
    let lvl = match v {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    LOGGER.get_or_init(move || {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(lvl));
        if let Err(e) = fmt::Subscriber::builder()
            .with_env_filter(filter)
            .with_target(false)
            .without_time()
            .try_init()
        {
            warn!(
                error = %e,
                "logging initialization failed; continuing with existing dispatcher"
            );
        }
    });
}
