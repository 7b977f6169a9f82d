//! Collection statistics.
//!
//! Every [`Collector`](crate::Collector) keeps its own metrics: the last
//! collection's numbers, a short history of recent collections, and running
//! totals. Nothing here is process-wide.

use std::time::{Duration, Instant};

/// What started a collection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[repr(u8)]
pub enum CollectionTrigger {
    /// No collection has run yet.
    #[default]
    None = 0,
    /// The tracked-block count crossed the threshold during `add`.
    Threshold = 1,
    /// The host called [`Collector::collect`](crate::Collector::collect).
    Explicit = 2,
}

/// Statistics from one garbage collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GcMetrics {
    /// Duration of the whole collection.
    pub duration: Duration,
    /// Duration of the mark phase.
    pub mark_duration: Duration,
    /// Duration of the sweep phase.
    pub sweep_duration: Duration,
    /// Number of blocks the marker reached.
    pub objects_marked: usize,
    /// Number of blocks released.
    pub objects_reclaimed: usize,
    /// Number of bytes released.
    pub bytes_reclaimed: usize,
    /// Number of blocks still tracked.
    pub objects_surviving: usize,
    /// Number of bytes still tracked.
    pub bytes_surviving: usize,
    /// Registry slot count after the sweep.
    pub slots: usize,
    /// Tracked-block count that triggers the next automatic collection.
    pub next_threshold: usize,
    /// What started this collection.
    pub trigger: CollectionTrigger,
    /// Collections run by this collector, including this one.
    pub total_collections: usize,
}

impl Default for GcMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl GcMetrics {
    /// Metrics of a collector that has not collected yet.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            duration: Duration::ZERO,
            mark_duration: Duration::ZERO,
            sweep_duration: Duration::ZERO,
            objects_marked: 0,
            objects_reclaimed: 0,
            bytes_reclaimed: 0,
            objects_surviving: 0,
            bytes_surviving: 0,
            slots: 0,
            next_threshold: 0,
            trigger: CollectionTrigger::None,
            total_collections: 0,
        }
    }
}

/// Wall-clock time spent in each phase of one collection.
///
/// # Example
///
/// ```
/// use rudo_cgc::PhaseTimer;
///
/// let mut timer = PhaseTimer::new();
/// let marked = timer.time_mark(|| 3);
/// timer.time_sweep(|| ());
///
/// assert_eq!(marked, 3);
/// assert!(timer.total() >= timer.mark());
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PhaseTimer {
    mark: Duration,
    sweep: Duration,
}

impl PhaseTimer {
    /// A timer with nothing recorded.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            mark: Duration::ZERO,
            sweep: Duration::ZERO,
        }
    }

    /// Run `phase` and add its duration to the mark time.
    pub fn time_mark<R>(&mut self, phase: impl FnOnce() -> R) -> R {
        let start = Instant::now();
        let out = phase();
        self.mark += start.elapsed();
        out
    }

    /// Run `phase` and add its duration to the sweep time.
    pub fn time_sweep<R>(&mut self, phase: impl FnOnce() -> R) -> R {
        let start = Instant::now();
        let out = phase();
        self.sweep += start.elapsed();
        out
    }

    /// Time spent marking.
    #[must_use]
    pub const fn mark(&self) -> Duration {
        self.mark
    }

    /// Time spent sweeping.
    #[must_use]
    pub const fn sweep(&self) -> Duration {
        self.sweep
    }

    /// Mark and sweep time together.
    #[must_use]
    pub fn total(&self) -> Duration {
        self.mark + self.sweep
    }
}

/// Collections kept by [`GcHistory`].
const HISTORY_SIZE: usize = 64;

/// Recent collections of one collector plus running totals.
///
/// Keeps the most recent 64 collections for trend analysis.
#[derive(Debug, Clone)]
pub struct GcHistory {
    buffer: [GcMetrics; HISTORY_SIZE],
    recorded: usize,
    bytes_reclaimed: usize,
    objects_reclaimed: usize,
    pause: Duration,
}

impl Default for GcHistory {
    fn default() -> Self {
        Self::new()
    }
}

impl GcHistory {
    /// Create an empty history.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            buffer: [GcMetrics::new(); HISTORY_SIZE],
            recorded: 0,
            bytes_reclaimed: 0,
            objects_reclaimed: 0,
            pause: Duration::ZERO,
        }
    }

    /// Record a finished collection.
    pub(crate) fn push(&mut self, metrics: GcMetrics) {
        self.buffer[self.recorded % HISTORY_SIZE] = metrics;
        self.recorded += 1;
        self.bytes_reclaimed = self.bytes_reclaimed.saturating_add(metrics.bytes_reclaimed);
        self.objects_reclaimed = self
            .objects_reclaimed
            .saturating_add(metrics.objects_reclaimed);
        self.pause = self.pause.saturating_add(metrics.duration);
    }

    /// Number of collections recorded. May exceed what the buffer holds.
    #[inline]
    #[must_use]
    pub const fn total_recorded(&self) -> usize {
        self.recorded
    }

    /// Bytes released by all recorded collections.
    #[inline]
    #[must_use]
    pub const fn total_bytes_reclaimed(&self) -> usize {
        self.bytes_reclaimed
    }

    /// Blocks released by all recorded collections.
    #[inline]
    #[must_use]
    pub const fn total_objects_reclaimed(&self) -> usize {
        self.objects_reclaimed
    }

    /// Time spent in all recorded collections.
    #[inline]
    #[must_use]
    pub const fn total_pause(&self) -> Duration {
        self.pause
    }

    /// The most recent `n` collections, oldest first.
    #[must_use]
    pub fn recent(&self, n: usize) -> Vec<GcMetrics> {
        let n = n.min(HISTORY_SIZE).min(self.recorded);
        (self.recorded - n..self.recorded)
            .map(|i| self.buffer[i % HISTORY_SIZE])
            .collect()
    }

    /// Average pause of the most recent `n` collections.
    ///
    /// Returns `Duration::ZERO` if no collections have been recorded.
    #[must_use]
    pub fn average_pause_time(&self, n: usize) -> Duration {
        let recent = self.recent(n);
        if recent.is_empty() {
            return Duration::ZERO;
        }

        let total_ns: u128 = recent.iter().map(|m| m.duration.as_nanos()).sum();
        Duration::from_nanos(
            (total_ns / recent.len() as u128)
                .try_into()
                .unwrap_or(u64::MAX),
        )
    }

    /// Longest pause of the most recent `n` collections.
    #[must_use]
    pub fn max_pause_time(&self, n: usize) -> Duration {
        self.recent(n)
            .iter()
            .map(|m| m.duration)
            .max()
            .unwrap_or(Duration::ZERO)
    }
}
