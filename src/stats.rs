/*!
 * Global Counters and the Per-Second Stats Line
 *
 * Workers bump the counters from their callbacks; the acceptor loop
 * prints and zeroes them once per second. Relaxed ordering throughout:
 * the stats line tolerates torn per-second attribution, it is a rate
 * gauge rather than an audit trail.
 */

use std::sync::atomic::{AtomicU64, Ordering::Relaxed};
use std::time::{Duration, Instant};

/// Articles the sink asked peers to send (238 and 335 replies)
pub static SEND: AtomicU64 = AtomicU64::new(0);
/// Articles fully received (239 and 235 replies)
pub static ACCEPT: AtomicU64 = AtomicU64::new(0);
/// Offers deferred. A sink never defers; printed for feeder parity.
pub static DEFER: AtomicU64 = AtomicU64::new(0);
/// Articles rejected. A sink never rejects; printed for feeder parity.
pub static REJECT: AtomicU64 = AtomicU64::new(0);
/// Offers refused. A sink never refuses; printed for feeder parity.
pub static REFUSE: AtomicU64 = AtomicU64::new(0);

const PERIOD: Duration = Duration::from_secs(1);

/// Once-per-second printer driven by the acceptor loop.
///
/// The acceptor polls with `timeout()` so `tick()` gets a chance to run
/// close to every period boundary even when no connections arrive.
pub struct StatsTicker {
    started: Instant,
    last: Instant,
}

impl StatsTicker {
    pub fn new() -> Self {
        let now = Instant::now();
        Self {
            started: now,
            last: now,
        }
    }

    /// Time remaining until the next print is due
    pub fn timeout(&self) -> Duration {
        PERIOD.saturating_sub(self.last.elapsed())
    }

    /// Print and reset the counters if a full period has elapsed
    pub fn tick(&mut self) {
        if self.last.elapsed() < PERIOD {
            return;
        }
        self.last = Instant::now();

        let send = SEND.swap(0, Relaxed);
        let accept = ACCEPT.swap(0, Relaxed);
        let defer = DEFER.swap(0, Relaxed);
        let reject = REJECT.swap(0, Relaxed);
        let refuse = REFUSE.swap(0, Relaxed);
        let cpu = cpu_percent(self.started.elapsed());

        println!(
            "send it: {send}/s, refused: {refuse}/s, rejected: {reject}/s, \
             deferred: {defer}/s, accepted: {accept}/s, cpu {cpu:.2}%"
        );
    }
}

impl Default for StatsTicker {
    fn default() -> Self {
        Self::new()
    }
}

/// Average CPU usage over the process lifetime, as a percentage of one
/// core. Uptime is clamped to a second so the first tick cannot divide
/// by zero.
fn cpu_percent(uptime: Duration) -> f64 {
    let upt = uptime.as_secs_f64().max(1.0);
    (cpu_time_ms() as f64 / 1000.0) / upt * 100.0
}

/// Cumulative user + system CPU time of this process, in milliseconds
#[cfg(unix)]
fn cpu_time_ms() -> u64 {
    let mut ru = std::mem::MaybeUninit::<libc::rusage>::zeroed();
    if unsafe { libc::getrusage(libc::RUSAGE_SELF, ru.as_mut_ptr()) } != 0 {
        return 0;
    }
    let ru = unsafe { ru.assume_init() };
    let user = ru.ru_utime.tv_sec as u64 * 1000 + ru.ru_utime.tv_usec as u64 / 1000;
    let sys = ru.ru_stime.tv_sec as u64 * 1000 + ru.ru_stime.tv_usec as u64 / 1000;
    user + sys
}

#[cfg(not(unix))]
fn cpu_time_ms() -> u64 {
    0
}
