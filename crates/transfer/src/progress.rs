use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Callback invoked after every acknowledged chunk with `(offset, total)`.
///
/// `total` is the source file size for uploads and the server-reported
/// object size for downloads.
pub type ProgressObserver = Box<dyn Fn(u64, u64) + Send + Sync>;

/// Cursor state owned by a single transfer call.
///
/// The retry counter only grows while the offset stays put and is reset
/// the moment the offset advances.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferProgress {
    offset: u64,
    stall_marker: u64,
    retries: u32,
}

impl TransferProgress {
    pub fn new(start: u64) -> Self {
        Self {
            offset: start,
            stall_marker: start,
            retries: 0,
        }
    }

    pub fn offset(&self) -> u64 {
        self.offset
    }

    pub fn stall_marker(&self) -> u64 {
        self.stall_marker
    }

    pub fn retries(&self) -> u32 {
        self.retries
    }

    /// Records `len` acknowledged bytes.
    pub fn advance(&mut self, len: u64) {
        self.offset += len;
        if len > 0 {
            self.retries = 0;
        }
    }

    /// Records a failed attempt at the current offset.
    ///
    /// Counts a retry when the offset has not moved since the stall marker
    /// was set, otherwise moves the marker to the current offset.
    pub fn record_failure(&mut self) {
        if self.offset == self.stall_marker {
            self.retries += 1;
        } else {
            self.stall_marker = self.offset;
        }
    }
}

// ---------------------------------------------------------------------------
// RateMeter
// ---------------------------------------------------------------------------

/// Transfer rate over a sliding time window.
pub struct RateMeter {
    samples: VecDeque<(Instant, u64)>,
    window: Duration,
    max_samples: usize,
}

impl Default for RateMeter {
    fn default() -> Self {
        Self::new(Duration::from_secs(5), 100)
    }
}

impl RateMeter {
    pub fn new(window: Duration, max_samples: usize) -> Self {
        Self {
            samples: VecDeque::new(),
            window,
            max_samples: max_samples.max(2),
        }
    }

    /// Records `bytes` transferred now.
    pub fn record(&mut self, bytes: u64) {
        self.record_at(Instant::now(), bytes);
    }

    fn record_at(&mut self, now: Instant, bytes: u64) {
        self.samples.push_back((now, bytes));
        while let Some(&(ts, _)) = self.samples.front() {
            if now.duration_since(ts) > self.window || self.samples.len() > self.max_samples {
                self.samples.pop_front();
            } else {
                break;
            }
        }
    }

    /// Average bytes per second inside the window; 0.0 with fewer than two samples.
    pub fn bytes_per_second(&self) -> f64 {
        let (Some(first), Some(last)) = (self.samples.front(), self.samples.back()) else {
            return 0.0;
        };
        let elapsed = last.0.duration_since(first.0);
        if self.samples.len() < 2 || elapsed.is_zero() {
            return 0.0;
        }
        // The first sample marks the window start, its bytes predate it.
        let bytes: u64 = self.samples.iter().skip(1).map(|(_, b)| b).sum();
        bytes as f64 / elapsed.as_secs_f64()
    }

    /// Estimated time to move `remaining` bytes at the current rate.
    pub fn eta(&self, remaining: u64) -> Option<Duration> {
        let rate = self.bytes_per_second();
        (rate > 0.0).then(|| Duration::from_secs_f64(remaining as f64 / rate))
    }
}
