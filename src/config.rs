/*!
 * CLI Surface and Runtime Configuration
 *
 * Option parsing for the nntpsink binary. The feature pair in `Caps`
 * decides which NNTP commands are advertised and accepted; at least one
 * of the two is always enabled because `-I` and `-S` are mutually
 * exclusive.
 */

use clap::Parser;
use std::process;

/// Protocol features advertised in CAPABILITIES and accepted by the
/// state machine. Fixed for the lifetime of the process.
#[derive(Debug, Clone, Copy)]
pub struct Caps {
    /// Accept IHAVE offers
    pub ihave: bool,
    /// Accept the streaming extension (MODE STREAM, CHECK, TAKETHIS)
    pub streaming: bool,
}

impl Default for Caps {
    fn default() -> Self {
        Self {
            ihave: true,
            streaming: true,
        }
    }
}

/// Fully resolved runtime configuration, shared read-only across the
/// acceptor and all workers.
#[derive(Debug, Clone)]
pub struct Config {
    /// Host to bind
    pub host: String,
    /// Port to bind
    pub port: u16,
    /// Number of worker threads
    pub threads: usize,
    /// Dump every inbound line to stdout
    pub debug: bool,
    /// Enabled protocol features
    pub caps: Caps,
}

#[derive(Parser, Debug)]
#[command(
    name = "nntpsink",
    version,
    about = "Dummy NNTP server: absorbs offered articles and prints per-second counters"
)]
struct Cli {
    /// Show data received from peers
    #[arg(short = 'D')]
    debug: bool,

    /// Support IHAVE only (not streaming)
    #[arg(short = 'I', conflicts_with = "streaming_only")]
    ihave_only: bool,

    /// Support streaming only (not IHAVE)
    #[arg(short = 'S')]
    streaming_only: bool,

    /// Address to listen on
    #[arg(short = 'l', value_name = "host", default_value = "localhost")]
    listen: String,

    /// Port to listen on
    #[arg(short = 'p', value_name = "port", default_value_t = 119)]
    port: u16,

    /// Number of processing threads
    #[arg(
        short = 't',
        value_name = "threads",
        default_value_t = 1,
        value_parser = clap::value_parser!(u16).range(1..)
    )]
    threads: u16,
}

/// Parse process arguments, exiting directly on help, version, or bad
/// usage. Help and version exit 0; every usage error exits 1.
pub fn parse() -> Config {
    let cli = Cli::try_parse().unwrap_or_else(|err| {
        let _ = err.print();
        process::exit(if err.use_stderr() { 1 } else { 0 });
    });
    Config::from_cli(cli)
}

impl Config {
    fn from_cli(cli: Cli) -> Self {
        Self {
            host: cli.listen,
            port: cli.port,
            threads: cli.threads as usize,
            debug: cli.debug,
            caps: Caps {
                ihave: !cli.streaming_only,
                streaming: !cli.ihave_only,
            },
        }
    }
}
