/*!
 * Worker Event Loop
 *
 * Each worker owns a mio poll, a slab of clients keyed by token, and a
 * deadlist of clients pending destruction. The acceptor hands off
 * freshly accepted streams through an unbounded channel and fires the
 * worker's waker; the worker drains the whole channel per wakeup, so
 * coalesced wakeups are harmless. A client stays on the worker that
 * adopted it for its entire life.
 */

use crate::client::Client;
use crate::config::Config;
use anyhow::Result;
use crossbeam::channel::{unbounded, Receiver, Sender};
use log::{debug, error};
use mio::event::Event;
use mio::net::TcpStream;
use mio::{Events, Interest, Poll, Token, Waker};
use slab::Slab;
use std::io;
use std::sync::Arc;
use std::thread;

/// Waker token; slab keys start at zero and can never collide with it
const WAKEUP: Token = Token(usize::MAX);

/// The acceptor's side of a worker: the hand-off channel plus the
/// wakeup handle. This is the only state shared across threads.
pub struct WorkerHandle {
    tx: Sender<TcpStream>,
    waker: Arc<Waker>,
}

impl WorkerHandle {
    /// Transfer ownership of an accepted stream to the worker and make
    /// sure its loop wakes up to adopt it.
    pub fn hand_off(&self, stream: TcpStream) {
        if self.tx.send(stream).is_ok() {
            let _ = self.waker.wake();
        }
    }
}

/// Spawn one worker on its own named OS thread and return the handle
/// the acceptor dispatches into.
pub fn spawn(id: usize, cfg: Arc<Config>) -> Result<WorkerHandle> {
    let poll = Poll::new()?;
    let waker = Arc::new(Waker::new(poll.registry(), WAKEUP)?);
    let (tx, rx) = unbounded();

    thread::Builder::new()
        .name(format!("worker-{id}"))
        .spawn(move || {
            let mut worker = Worker {
                id,
                cfg,
                poll,
                rx,
                clients: Slab::new(),
                dead: Vec::new(),
            };
            if let Err(e) = worker.run() {
                error!("worker {id}: event loop failed: {e}");
            }
        })?;

    Ok(WorkerHandle { tx, waker })
}

struct Worker {
    id: usize,
    cfg: Arc<Config>,
    poll: Poll,
    rx: Receiver<TcpStream>,
    clients: Slab<Client>,
    dead: Vec<usize>,
}

impl Worker {
    fn run(&mut self) -> Result<()> {
        let mut events = Events::with_capacity(1024);
        loop {
            if let Err(e) = self.poll.poll(&mut events, None) {
                if e.kind() == io::ErrorKind::Interrupted {
                    continue;
                }
                return Err(e.into());
            }

            for ev in events.iter() {
                match ev.token() {
                    WAKEUP => self.adopt_pending(),
                    Token(key) => self.dispatch(key, ev),
                }
            }

            // Deadlist sweep: release clients closed during this
            // iteration, now that no callback can still reference them.
            self.sweep();
        }
    }

    /// Drain the hand-off channel completely, one wakeup per burst
    fn adopt_pending(&mut self) {
        while let Ok(stream) = self.rx.try_recv() {
            if let Err(e) = self.adopt(stream) {
                // Setup failure on one fd is not the worker's problem;
                // dropping the stream closes it.
                debug!("worker {}: connection setup failed: {e}", self.id);
            }
        }
    }

    fn adopt(&mut self, mut stream: TcpStream) -> io::Result<()> {
        stream.set_nodelay(true)?;
        let entry = self.clients.vacant_entry();
        let token = Token(entry.key());
        self.poll
            .registry()
            .register(&mut stream, token, Interest::READABLE)?;
        let client = entry.insert(Client::new(stream, token, &self.cfg));
        client.greet(self.poll.registry());
        let died = client.is_dead();
        if died {
            self.dead.push(token.0);
        }
        Ok(())
    }

    fn dispatch(&mut self, key: usize, ev: &Event) {
        let registry = self.poll.registry();
        let Some(client) = self.clients.get_mut(key) else {
            // stale event for a client swept in an earlier iteration
            return;
        };
        if client.is_dead() {
            return;
        }
        if ev.is_readable() {
            client.on_readable(registry);
        }
        if !client.is_dead() && ev.is_writable() {
            client.on_writable(registry);
        }
        let died = client.is_dead();
        if died {
            self.dead.push(key);
        }
    }

    fn sweep(&mut self) {
        for key in self.dead.drain(..) {
            let _ = self.clients.try_remove(key);
        }
    }
}
