/*!
 * Listener Setup and the Acceptor Loop
 *
 * The acceptor owns every listening socket on the main loop, accepts
 * until the socket runs dry, and deals accepted streams round-robin
 * across the worker handles. Accept failures beyond the retriable set
 * are logged and survived; only startup failures are fatal.
 */

use crate::stats::StatsTicker;
use crate::worker::WorkerHandle;
use anyhow::{ensure, Context, Result};
use log::error;
use mio::net::TcpListener;
use mio::{Events, Interest, Poll, Token};
use socket2::{Domain, Protocol, Socket, Type};
use std::io;
use std::net::{SocketAddr, ToSocketAddrs};

/// Listen backlog applied to every bound socket
pub const LISTEN_BACKLOG: i32 = 128;

/// Resolve `host:port` and bind one listener per resolved address.
///
/// Every socket gets `SO_REUSEADDR`, `TCP_NODELAY`, and non-blocking
/// mode before bind. Any failure here is a startup error.
pub fn bind_listeners(host: &str, port: u16) -> Result<Vec<TcpListener>> {
    let addrs: Vec<SocketAddr> = (host, port)
        .to_socket_addrs()
        .with_context(|| format!("{host}:{port}: address resolution failed"))?
        .collect();
    ensure!(!addrs.is_empty(), "{host}:{port}: no usable addresses");

    let mut listeners = Vec::with_capacity(addrs.len());
    for addr in addrs {
        let listener = bind_one(addr).with_context(|| format!("{host}[{addr}]:{port}"))?;
        listeners.push(listener);
    }
    Ok(listeners)
}

fn bind_one(addr: SocketAddr) -> io::Result<TcpListener> {
    let domain = match addr {
        SocketAddr::V4(_) => Domain::IPV4,
        SocketAddr::V6(_) => Domain::IPV6,
    };
    let socket = Socket::new(domain, Type::STREAM, Some(Protocol::TCP))?;
    socket.set_reuse_address(true)?;
    socket.set_nodelay(true)?;
    socket.set_nonblocking(true)?;
    socket.bind(&addr.into())?;
    socket.listen(LISTEN_BACKLOG)?;
    Ok(TcpListener::from_std(socket.into()))
}

/// Accept loop over all bound listeners.
pub struct Acceptor {
    poll: Poll,
    listeners: Vec<TcpListener>,
    workers: Vec<WorkerHandle>,
    next: usize,
}

impl Acceptor {
    pub fn new(mut listeners: Vec<TcpListener>, workers: Vec<WorkerHandle>) -> Result<Self> {
        ensure!(!workers.is_empty(), "at least one worker is required");
        ensure!(!listeners.is_empty(), "at least one listener is required");
        let poll = Poll::new()?;
        for (i, listener) in listeners.iter_mut().enumerate() {
            poll.registry()
                .register(listener, Token(i), Interest::READABLE)?;
        }
        Ok(Self {
            poll,
            listeners,
            workers,
            next: 0,
        })
    }

    /// Bound addresses, mainly for callers that bound port 0
    pub fn local_addrs(&self) -> Vec<SocketAddr> {
        self.listeners
            .iter()
            .filter_map(|l| l.local_addr().ok())
            .collect()
    }

    /// Run forever: accept on readiness, tick the stats line between
    /// poll rounds.
    pub fn run(mut self, mut ticker: StatsTicker) -> Result<()> {
        let mut events = Events::with_capacity(128);
        loop {
            if let Err(e) = self.poll.poll(&mut events, Some(ticker.timeout())) {
                if e.kind() == io::ErrorKind::Interrupted {
                    continue;
                }
                return Err(e.into());
            }
            for ev in events.iter() {
                self.accept_ready(ev.token().0);
            }
            ticker.tick();
        }
    }

    /// Accept until the listener would block, dealing streams to
    /// workers round-robin.
    fn accept_ready(&mut self, idx: usize) {
        loop {
            match self.listeners[idx].accept() {
                Ok((stream, _peer)) => {
                    self.workers[self.next].hand_off(stream);
                    self.next = (self.next + 1) % self.workers.len();
                }
                Err(ref e) if retriable(e) => break,
                Err(e) => {
                    // Transient accept failures must not kill the loop
                    error!("accept: {e}");
                    break;
                }
            }
        }
    }
}

/// The "retry via readiness" error set: EAGAIN/EWOULDBLOCK, EINTR, and
/// EINPROGRESS. Never a reason to close a connection.
pub(crate) fn retriable(e: &io::Error) -> bool {
    if matches!(
        e.kind(),
        io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted
    ) {
        return true;
    }
    #[cfg(unix)]
    {
        if e.raw_os_error() == Some(libc::EINPROGRESS) {
            return true;
        }
    }
    false
}
