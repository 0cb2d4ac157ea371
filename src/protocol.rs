/*!
 * NNTP Command Parser and Response Encoders
 *
 * The slice of NNTP this sink speaks: CAPABILITIES, MODE STREAM, the
 * streaming extension (CHECK/TAKETHIS), legacy IHAVE, and QUIT.
 * Parsing splits a command line at the first space; the verb is
 * case-insensitive and the argument keeps everything after leading
 * whitespace. Responses are fixed ASCII lines terminated by CRLF.
 */

use crate::config::Caps;

/// Greeting written to every accepted connection
pub const GREETING: &str = "200 nntpsink ready.\r\n";

pub const MODE_STREAM_OK: &str = "203 Streaming OK.\r\n";
pub const UNKNOWN_COMMAND: &str = "500 Unknown command.\r\n";
pub const MISSING_MSGID: &str = "501 Missing message-id.\r\n";
pub const UNKNOWN_MODE: &str = "501 Unknown MODE.\r\n";

/// Formatting bound for replies that carry a message-id. Longer output
/// is truncated on emit; the parser itself has no line length limit.
pub const SCRATCH_MAX: usize = 1024;

/// A command line as seen in the NORMAL state.
///
/// Arguments are borrowed from the input line; `None` means the
/// argument was absent or empty after trimming.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command<'a> {
    Capabilities,
    Quit,
    Mode(Option<&'a str>),
    Check(Option<&'a str>),
    TakeThis(Option<&'a str>),
    Ihave(Option<&'a str>),
    Unknown,
}

impl<'a> Command<'a> {
    /// Parse one command line.
    ///
    /// The verb runs up to the first space. Leading whitespace is
    /// trimmed from the argument and an empty argument is treated as
    /// absent, so `CHECK ` parses the same as `CHECK`.
    pub fn parse(line: &'a str) -> Self {
        let (verb, arg) = match line.find(' ') {
            Some(at) => {
                let rest = line[at + 1..].trim_start();
                (&line[..at], if rest.is_empty() { None } else { Some(rest) })
            }
            None => (line, None),
        };

        if verb.eq_ignore_ascii_case("CAPABILITIES") {
            Command::Capabilities
        } else if verb.eq_ignore_ascii_case("QUIT") {
            Command::Quit
        } else if verb.eq_ignore_ascii_case("MODE") {
            Command::Mode(arg)
        } else if verb.eq_ignore_ascii_case("CHECK") {
            Command::Check(arg)
        } else if verb.eq_ignore_ascii_case("TAKETHIS") {
            Command::TakeThis(arg)
        } else if verb.eq_ignore_ascii_case("IHAVE") {
            Command::Ihave(arg)
        } else {
            Command::Unknown
        }
    }
}

/// Encode a `<code> <message-id>` reply line.
///
/// Output is capped at `SCRATCH_MAX` bytes; an oversized message-id is
/// truncated rather than refused.
pub fn reply_id(code: u16, id: &str) -> Vec<u8> {
    let mut line = format!("{code} {id}\r\n").into_bytes();
    line.truncate(SCRATCH_MAX);
    line
}

/// Encode the full CAPABILITIES response for the enabled feature set,
/// terminator line included.
pub fn capabilities(caps: Caps) -> Vec<u8> {
    let mut out = format!(
        "101 Capability list:\r\nVERSION 2\r\nIMPLEMENTATION nntpsink {}\r\n",
        crate::VERSION
    )
    .into_bytes();
    if caps.ihave {
        out.extend_from_slice(b"IHAVE\r\n");
    }
    if caps.streaming {
        out.extend_from_slice(b"STREAMING\r\n");
    }
    out.extend_from_slice(b".\r\n");
    out
}
