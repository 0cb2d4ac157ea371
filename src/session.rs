/*!
 * Per-Connection Protocol State Machine
 *
 * Pure line-in, bytes-out execution of the NNTP subset. A session
 * holds no socket; the I/O plane feeds it one line at a time and it
 * appends any responses to the connection's write queue. This is the
 * only place the protocol state and the pending message-id change.
 */

use crate::config::Caps;
use crate::protocol::{
    self, Command, MISSING_MSGID, MODE_STREAM_OK, UNKNOWN_COMMAND, UNKNOWN_MODE,
};
use crate::queue::ByteQueue;
use crate::stats;
use smol_str::SmolStr;
use std::sync::atomic::Ordering::Relaxed;

/// Protocol state of one connection.
///
/// `TakeThis` and `Ihave` mean an article body is being swallowed; both
/// imply a pending message-id. `Normal` implies none.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Normal,
    TakeThis,
    Ihave,
}

/// What the I/O plane should do after a line has been handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    /// Close the connection without any further response (QUIT)
    Hangup,
}

pub struct Session {
    caps: Caps,
    state: State,
    msgid: Option<SmolStr>,
}

impl Session {
    pub fn new(caps: Caps) -> Self {
        Self {
            caps,
            state: State::Normal,
            msgid: None,
        }
    }

    pub fn state(&self) -> State {
        self.state
    }

    /// Message-id of the article currently being received, if any
    pub fn msgid(&self) -> Option<&str> {
        self.msgid.as_deref()
    }

    /// Feed one line (terminator already stripped) to the state
    /// machine, appending any responses to `out`.
    pub fn handle_line(&mut self, line: &[u8], out: &mut ByteQueue) -> Flow {
        match self.state {
            State::Normal => self.command(line, out),
            State::TakeThis | State::Ihave => {
                // Article bytes are discarded unseen. Dot-stuffing is
                // not un-escaped: the sole end-of-article signal is a
                // line that is exactly ".".
                if line == b"." {
                    if let Some(id) = self.msgid.take() {
                        let code = if self.state == State::Ihave { 235 } else { 239 };
                        out.append(&protocol::reply_id(code, &id));
                        stats::ACCEPT.fetch_add(1, Relaxed);
                    }
                    self.state = State::Normal;
                }
                Flow::Continue
            }
        }
    }

    fn command(&mut self, line: &[u8], out: &mut ByteQueue) -> Flow {
        let text = String::from_utf8_lossy(line);
        match Command::parse(&text) {
            Command::Capabilities => out.append(&protocol::capabilities(self.caps)),
            Command::Quit => return Flow::Hangup,
            Command::Mode(arg) => {
                let stream = arg.is_some_and(|a| a.eq_ignore_ascii_case("STREAM"));
                if stream && self.caps.streaming {
                    out.append(MODE_STREAM_OK.as_bytes());
                } else {
                    out.append(UNKNOWN_MODE.as_bytes());
                }
            }
            Command::Check(arg) => {
                if !self.caps.streaming {
                    out.append(UNKNOWN_COMMAND.as_bytes());
                } else {
                    match arg {
                        None => out.append(MISSING_MSGID.as_bytes()),
                        Some(id) => {
                            out.append(&protocol::reply_id(238, id));
                            stats::SEND.fetch_add(1, Relaxed);
                        }
                    }
                }
            }
            Command::TakeThis(arg) => {
                if !self.caps.streaming {
                    out.append(UNKNOWN_COMMAND.as_bytes());
                } else {
                    match arg {
                        None => out.append(MISSING_MSGID.as_bytes()),
                        Some(id) => {
                            // Response is deferred to the end of the
                            // article (239 on the "." terminator).
                            self.msgid = Some(SmolStr::new(id));
                            self.state = State::TakeThis;
                        }
                    }
                }
            }
            Command::Ihave(arg) => {
                if !self.caps.ihave {
                    out.append(UNKNOWN_COMMAND.as_bytes());
                } else {
                    match arg {
                        None => out.append(MISSING_MSGID.as_bytes()),
                        Some(id) => {
                            out.append(&protocol::reply_id(335, id));
                            stats::SEND.fetch_add(1, Relaxed);
                            self.msgid = Some(SmolStr::new(id));
                            self.state = State::Ihave;
                        }
                    }
                }
            }
            Command::Unknown => out.append(UNKNOWN_COMMAND.as_bytes()),
        }
        Flow::Continue
    }
}
