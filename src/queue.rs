/*!
 * Byte Queue
 *
 * Unbounded FIFO of bytes used as the read and write buffer of every
 * connection. Bytes go in from the socket (or any `Read`), come out as
 * whole lines for the protocol layer, and drain back to the socket (or
 * any `Write`) with partial-write tracking.
 */

use bytes::{Buf, Bytes, BytesMut};
use std::io::{self, Read, Write};

/// Size of the stack scratch used per read syscall
const READ_SCRATCH: usize = 4096;

/// Growable byte FIFO with line extraction.
///
/// `read_line` accepts both CRLF- and bare-LF-terminated lines and
/// strips the terminator. The scan position of an incomplete line is
/// remembered, so a long partial line is not rescanned on every call.
pub struct ByteQueue {
    buf: BytesMut,
    scanned: usize,
}

impl ByteQueue {
    pub fn new() -> Self {
        Self {
            buf: BytesMut::with_capacity(READ_SCRATCH),
            scanned: 0,
        }
    }

    /// Number of buffered bytes
    #[inline]
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Buffered bytes, in order, without consuming them
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Append raw bytes to the tail of the queue
    pub fn append(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Pull bytes from `r` into the queue with a single read attempt.
    ///
    /// `Ok(0)` means end of stream. `Interrupted` is retried in place;
    /// every other error (including `WouldBlock`) surfaces to the
    /// caller.
    pub fn read_from<R: Read>(&mut self, r: &mut R) -> io::Result<usize> {
        let mut scratch = [0u8; READ_SCRATCH];
        loop {
            match r.read(&mut scratch) {
                Ok(n) => {
                    self.buf.extend_from_slice(&scratch[..n]);
                    return Ok(n);
                }
                Err(ref e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
    }

    /// Drain the queue into `w`.
    ///
    /// Returns `Ok(total)` once the queue is empty. On `WouldBlock` the
    /// error is returned with the unwritten remainder still queued, so
    /// the caller can arm write readiness and retry later.
    pub fn write_to<W: Write>(&mut self, w: &mut W) -> io::Result<usize> {
        self.scanned = 0;
        let mut total = 0;
        while !self.buf.is_empty() {
            match w.write(&self.buf) {
                Ok(0) => return Err(io::ErrorKind::WriteZero.into()),
                Ok(n) => {
                    self.buf.advance(n);
                    total += n;
                }
                Err(ref e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
        Ok(total)
    }

    /// Consume and return one line, if a complete one is buffered.
    ///
    /// A line ends at LF; an immediately preceding CR is stripped along
    /// with it. Bytes after the last terminator stay queued until more
    /// data arrives.
    pub fn read_line(&mut self) -> Option<Bytes> {
        match self.buf[self.scanned..].iter().position(|&b| b == b'\n') {
            Some(off) => {
                let nl = self.scanned + off;
                let mut line = self.buf.split_to(nl + 1);
                self.scanned = 0;
                line.truncate(nl);
                if line.last() == Some(&b'\r') {
                    line.truncate(nl - 1);
                }
                Some(line.freeze())
            }
            None => {
                self.scanned = self.buf.len();
                None
            }
        }
    }
}

impl Default for ByteQueue {
    fn default() -> Self {
        Self::new()
    }
}
