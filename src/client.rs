/*!
 * Per-Connection I/O Plane
 *
 * One `Client` per accepted socket: a read queue, a write queue, and
 * the protocol session. All methods run on the owning worker's loop.
 * Close never frees anything here; it disarms readiness and marks the
 * client DEAD, and the worker sweeps it after the event batch.
 */

use crate::config::Config;
use crate::net::retriable;
use crate::protocol::GREETING;
use crate::queue::ByteQueue;
use crate::session::{Flow, Session};
use log::warn;
use mio::net::TcpStream;
use mio::{Interest, Registry, Token};

#[cfg(unix)]
use std::os::unix::io::AsRawFd;

/// Flush eagerly once this many bytes are queued for write. Bounds
/// small-response latency without a syscall per appended token.
const FLUSH_WATERMARK: usize = 1024;

pub struct Client {
    stream: TcpStream,
    token: Token,
    rdbuf: ByteQueue,
    wrbuf: ByteQueue,
    session: Session,
    debug: bool,
    dead: bool,
    write_armed: bool,
}

impl Client {
    pub fn new(stream: TcpStream, token: Token, cfg: &Config) -> Self {
        Self {
            stream,
            token,
            rdbuf: ByteQueue::new(),
            wrbuf: ByteQueue::new(),
            session: Session::new(cfg.caps),
            debug: cfg.debug,
            dead: false,
            write_armed: false,
        }
    }

    /// A DEAD client has had its readiness stopped and awaits the
    /// worker's sweep; no further I/O may be attempted on it.
    #[inline]
    pub fn is_dead(&self) -> bool {
        self.dead
    }

    #[cfg(unix)]
    fn fd(&self) -> i32 {
        self.stream.as_raw_fd()
    }

    #[cfg(not(unix))]
    fn fd(&self) -> i32 {
        self.token.0 as i32
    }

    /// Queue the greeting and try to get it onto the wire
    pub fn greet(&mut self, registry: &Registry) {
        self.wrbuf.append(GREETING.as_bytes());
        self.flush(registry);
    }

    /// Read readiness: pull bytes, drain complete lines through the
    /// session, flush between batches. Returns as soon as the socket
    /// has nothing more or the client dies.
    pub fn on_readable(&mut self, registry: &Registry) {
        if self.dead {
            return;
        }
        loop {
            match self.rdbuf.read_from(&mut self.stream) {
                Ok(0) => {
                    // peer closed
                    self.close(registry);
                    return;
                }
                Ok(_) => {}
                Err(ref e) if retriable(e) => return,
                Err(e) => {
                    warn!("[{}] read error: {e}", self.fd());
                    self.close(registry);
                    return;
                }
            }

            while let Some(line) = self.rdbuf.read_line() {
                if self.debug {
                    println!("[{}] <- [{}]", self.fd(), String::from_utf8_lossy(&line));
                }
                match self.session.handle_line(&line, &mut self.wrbuf) {
                    Flow::Continue => {}
                    Flow::Hangup => {
                        self.close(registry);
                        return;
                    }
                }
                if self.dead {
                    return;
                }
                if self.wrbuf.len() > FLUSH_WATERMARK {
                    self.flush(registry);
                    if self.dead {
                        return;
                    }
                }
            }

            self.flush(registry);
            if self.dead {
                return;
            }
        }
    }

    /// Write readiness: just retry the flush
    pub fn on_writable(&mut self, registry: &Registry) {
        self.flush(registry);
    }

    /// Push queued output to the socket. Backpressure arms write
    /// readiness; completion disarms it; a hard error closes.
    pub fn flush(&mut self, registry: &Registry) {
        if self.dead {
            return;
        }
        match self.wrbuf.write_to(&mut self.stream) {
            Ok(_) => self.disarm_write(registry),
            Err(ref e) if retriable(e) => self.arm_write(registry),
            Err(e) => {
                warn!("[{}] write error: {e}", self.fd());
                self.close(registry);
            }
        }
    }

    fn arm_write(&mut self, registry: &Registry) {
        if self.write_armed {
            return;
        }
        if registry
            .reregister(
                &mut self.stream,
                self.token,
                Interest::READABLE | Interest::WRITABLE,
            )
            .is_ok()
        {
            self.write_armed = true;
        }
    }

    fn disarm_write(&mut self, registry: &Registry) {
        if !self.write_armed {
            return;
        }
        let _ = registry.reregister(&mut self.stream, self.token, Interest::READABLE);
        self.write_armed = false;
    }

    /// Idempotent. Stops readiness delivery and marks the client DEAD;
    /// the fd and buffers are released by the worker's sweep.
    pub fn close(&mut self, registry: &Registry) {
        if self.dead {
            return;
        }
        self.dead = true;
        let _ = registry.deregister(&mut self.stream);
    }
}
