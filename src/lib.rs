// Core modules for the nntpsink dummy NNTP server
pub mod config; // CLI surface + feature flags
pub mod queue; // ByteQueue (byte FIFO with line extraction)
pub mod protocol; // command parser + response encoders
pub mod session; // per-connection NNTP state machine
pub mod client; // per-connection I/O plane (buffers, flush, close)
pub mod worker; // worker event loop + accept hand-off
pub mod net; // listener setup + acceptor loop
pub mod stats; // global counters + per-second ticker

// Re-export all public items from modules for easier access
pub use client::*;
pub use config::*;
pub use net::*;
pub use protocol::*;
pub use queue::*;
pub use session::*;
pub use stats::*;
pub use worker::*;

// Version string advertised in CAPABILITIES and printed by -V
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
