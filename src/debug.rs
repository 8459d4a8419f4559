//! Per-instance diagnostics log.
//!
//! Each `DeliVerbPlugin` owns a `DiagLog`. `dv_log!` formats into a fixed
//! slot of the ring without allocating or locking, so it may run inside
//! `process`. The plugin's background task drains the ring to
//! `/tmp/deliverb.log`.
//!
//! When the ring is full the new line is counted instead of stored; the next
//! drain writes the count after the surviving lines.
//!
//! Recording is switched on by the `debug` feature. Without it `dv_log!`
//! returns after one relaxed load.

use std::cell::UnsafeCell;
use std::fmt;
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// Ring slots. One stays free to tell full from empty.
const SLOTS: usize = 64;
const LINE_MAX: usize = 160;

pub const LOG_PATH: &str = "/tmp/deliverb.log";

struct Line {
    len: usize,
    bytes: [u8; LINE_MAX],
}

impl Line {
    const EMPTY: Line = Line {
        len: 0,
        bytes: [0; LINE_MAX],
    };

    fn as_str(&self) -> &str {
        // Truncation can split a multi-byte character; keep the valid prefix
        match std::str::from_utf8(&self.bytes[..self.len]) {
            Ok(s) => s,
            Err(e) => std::str::from_utf8(&self.bytes[..e.valid_up_to()]).unwrap_or_default(),
        }
    }
}

impl fmt::Write for Line {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        let n = s.len().min(LINE_MAX - self.len);
        self.bytes[self.len..self.len + n].copy_from_slice(&s.as_bytes()[..n]);
        self.len += n;
        Ok(())
    }
}

pub struct DiagLog {
    enabled: AtomicBool,
    /// Next slot the producer fills.
    head: AtomicUsize,
    /// Next slot the consumer reads.
    tail: AtomicUsize,
    dropped: AtomicUsize,
    draining: AtomicBool,
    slots: [UnsafeCell<Line>; SLOTS],
}

// SAFETY: single producer (the owning plugin, whose `initialize` and `process`
// take `&mut self`) and a single consumer at a time (guarded by `draining`).
// Slots in `[tail, head)` belong to the consumer, all others to the producer.
unsafe impl Sync for DiagLog {}

impl DiagLog {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled: AtomicBool::new(enabled),
            head: AtomicUsize::new(0),
            tail: AtomicUsize::new(0),
            dropped: AtomicUsize::new(0),
            draining: AtomicBool::new(false),
            slots: [const { UnsafeCell::new(Line::EMPTY) }; SLOTS],
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }

    /// Record one line. Lines longer than the slot are truncated.
    pub fn push(&self, args: fmt::Arguments) {
        if !self.is_enabled() {
            return;
        }
        let head = self.head.load(Ordering::Relaxed);
        let next = (head + 1) % SLOTS;
        if next == self.tail.load(Ordering::Acquire) {
            self.dropped.fetch_add(1, Ordering::Relaxed);
            return;
        }

        // SAFETY: `head` is outside `[tail, head)`, so the consumer is not reading it
        let line = unsafe { &mut *self.slots[head].get() };
        line.len = 0;
        let _ = fmt::Write::write_fmt(line, args);
        self.head.store(next, Ordering::Release);
    }

    /// Write every pending line to `out`, then the dropped count if any.
    ///
    /// Returns the number of lines written. A drain that overlaps another
    /// returns `Ok(0)` immediately.
    pub fn drain_to<W: Write>(&self, out: &mut W) -> io::Result<usize> {
        if self.draining.swap(true, Ordering::Acquire) {
            return Ok(0);
        }
        let result = self.drain_exclusive(out);
        self.draining.store(false, Ordering::Release);
        result
    }

    pub fn drain_to_file(&self) -> io::Result<usize> {
        if !self.is_enabled() {
            return Ok(0);
        }
        let mut file = OpenOptions::new().create(true).append(true).open(LOG_PATH)?;
        self.drain_to(&mut file)
    }

    fn drain_exclusive<W: Write>(&self, out: &mut W) -> io::Result<usize> {
        let mut written = 0;
        loop {
            let tail = self.tail.load(Ordering::Relaxed);
            if tail == self.head.load(Ordering::Acquire) {
                break;
            }
            // SAFETY: `tail` is inside `[tail, head)`, which the producer leaves alone
            let line = unsafe { &*self.slots[tail].get() };
            let result = writeln!(out, "{}", line.as_str());
            self.tail.store((tail + 1) % SLOTS, Ordering::Release);
            result?;
            written += 1;
        }

        let dropped = self.dropped.swap(0, Ordering::Relaxed);
        if dropped > 0 {
            writeln!(out, "[{dropped} lines dropped]")?;
        }
        Ok(written)
    }
}

#[macro_export]
macro_rules! dv_log {
    ($log:expr, $($arg:tt)*) => {
        $log.push(format_args!($($arg)*))
    };
}
