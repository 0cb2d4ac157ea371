/*!
 * nntpsink Server Main Entry Point
 *
 * Starts the dummy NNTP sink: parses the command line, binds the
 * listening sockets, spawns the worker threads, and runs the acceptor
 * loop with the per-second stats ticker. Everything after startup is
 * event-driven; this function never returns on success.
 */

use anyhow::Result;
use log::info;
use nntpsink::config;
use nntpsink::net::{bind_listeners, Acceptor};
use nntpsink::stats::StatsTicker;
use nntpsink::worker;
use std::sync::Arc;

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

fn main() -> Result<()> {
    // Respects RUST_LOG, e.g. RUST_LOG=debug nntpsink -p 1119
    env_logger::init();

    let cfg = Arc::new(config::parse());
    ignore_sigpipe();

    let listeners = bind_listeners(&cfg.host, cfg.port)?;

    let mut workers = Vec::with_capacity(cfg.threads);
    for id in 0..cfg.threads {
        workers.push(worker::spawn(id, Arc::clone(&cfg))?);
    }

    info!(
        "nntpsink {} listening on {}:{} with {} worker(s)",
        nntpsink::VERSION,
        cfg.host,
        cfg.port,
        cfg.threads
    );

    Acceptor::new(listeners, workers)?.run(StatsTicker::new())
}

/// Broken-pipe writes must come back as EPIPE for the per-connection
/// close path instead of terminating the process.
#[cfg(unix)]
fn ignore_sigpipe() {
    unsafe {
        libc::signal(libc::SIGPIPE, libc::SIG_IGN);
    }
}

#[cfg(not(unix))]
fn ignore_sigpipe() {}
