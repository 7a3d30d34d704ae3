//! Sliding-window words-per-minute estimation.
//!
//! Provides:
//! - **RateEstimator**: owns the window of word-completion timestamps
//! - **SharedRateEstimator**: mutex-guarded handle for the capture thread
//!   and the periodic driver

use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::trace;

use crate::clock::{Clock, SystemClock};

/// Converts word-completion events into an instantaneous WPM rate over a
/// trailing time window.
pub struct RateEstimator {
    /// Trailing window, in seconds.
    window_size_secs: u64,
    /// Word-completion timestamps (ms), oldest first.
    timestamps: VecDeque<i64>,
    /// Total words recorded since creation. Not used in rate math.
    word_count: u64,
    /// Source of "now" for eviction.
    clock: Box<dyn Clock>,
}

impl RateEstimator {
    /// Create an estimator that ages events against the system clock.
    pub fn new(window_size_secs: u64) -> Self {
        Self::with_clock(window_size_secs, SystemClock)
    }

    /// Create an estimator with an explicit clock.
    pub fn with_clock(window_size_secs: u64, clock: impl Clock + 'static) -> Self {
        Self {
            window_size_secs,
            timestamps: VecDeque::new(),
            word_count: 0,
            clock: Box::new(clock),
        }
    }

    /// Record a word completion at `now_ms`.
    ///
    /// Appends the timestamp, then evicts stale entries from the front. Age
    /// is measured against the clock, not against `now_ms`. The last
    /// remaining entry is never evicted.
    pub fn record_event(&mut self, now_ms: i64) {
        self.word_count += 1;
        self.timestamps.push_back(now_ms);

        let window_ms = self.window_ms();
        let now = self.clock.now_ms();
        let mut evicted = 0usize;
        while self.timestamps.len() > 1 {
            match self.timestamps.front() {
                Some(&oldest) if now.saturating_sub(oldest) > window_ms => {
                    self.timestamps.pop_front();
                    evicted += 1;
                }
                _ => break,
            }
        }

        trace!(
            timestamp = now_ms,
            evicted,
            retained = self.timestamps.len(),
            "word recorded"
        );
    }

    /// Record a word completion stamped with the estimator's clock.
    pub fn record_word(&mut self) {
        let now = self.clock.now_ms();
        self.record_event(now);
    }

    /// Current rate in words per minute.
    ///
    /// Returns 0 with fewer than two retained timestamps or when the oldest
    /// and newest coincide. The numerator counts every retained timestamp.
    pub fn current_rate(&self) -> u64 {
        if self.timestamps.len() < 2 {
            return 0;
        }
        let (Some(&oldest), Some(&newest)) = (self.timestamps.front(), self.timestamps.back())
        else {
            return 0;
        };

        let elapsed_secs = newest.saturating_sub(oldest) as f64 / 1000.0;
        if elapsed_secs <= 0.0 {
            return 0;
        }

        let words_in_window = self.timestamps.len() as f64;
        (words_in_window / elapsed_secs * 60.0) as u64
    }

    /// Total words recorded since creation.
    pub fn word_count(&self) -> u64 {
        self.word_count
    }

    /// Number of timestamps currently in the window.
    pub fn window_len(&self) -> usize {
        self.timestamps.len()
    }

    /// Configured window size, in seconds.
    pub fn window_size(&self) -> u64 {
        self.window_size_secs
    }

    /// Retained timestamps, oldest first.
    pub fn timestamps(&self) -> impl Iterator<Item = i64> + '_ {
        self.timestamps.iter().copied()
    }

    fn window_ms(&self) -> i64 {
        i64::try_from(self.window_size_secs.saturating_mul(1000)).unwrap_or(i64::MAX)
    }
}

impl std::fmt::Debug for RateEstimator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateEstimator")
            .field("window_size_secs", &self.window_size_secs)
            .field("window_len", &self.timestamps.len())
            .field("word_count", &self.word_count)
            .finish()
    }
}

// ── Shared handle ───────────────────────────────────────────────────────

/// Cloneable handle to a [`RateEstimator`] shared across threads.
///
/// Every operation holds the lock for its full duration, so a reader never
/// observes a half-finished eviction.
#[derive(Clone, Debug)]
pub struct SharedRateEstimator {
    inner: Arc<Mutex<RateEstimator>>,
}

impl SharedRateEstimator {
    pub fn new(estimator: RateEstimator) -> Self {
        Self {
            inner: Arc::new(Mutex::new(estimator)),
        }
    }

    pub fn record_event(&self, now_ms: i64) {
        self.inner.lock().record_event(now_ms);
    }

    pub fn record_word(&self) {
        self.inner.lock().record_word();
    }

    pub fn current_rate(&self) -> u64 {
        self.inner.lock().current_rate()
    }

    pub fn word_count(&self) -> u64 {
        self.inner.lock().word_count()
    }

    pub fn window_len(&self) -> usize {
        self.inner.lock().window_len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;

    fn estimator_at(now_ms: i64) -> (RateEstimator, ManualClock) {
        let clock = ManualClock::new(now_ms);
        (RateEstimator::with_clock(15, clock.clone()), clock)
    }

    #[test]
    fn three_events_in_one_second_is_180_wpm() {
        let (mut est, _clock) = estimator_at(1_000);
        est.record_event(0);
        est.record_event(500);
        est.record_event(1_000);
        assert_eq!(est.window_len(), 3);
        assert_eq!(est.current_rate(), 180);
    }

    #[test]
    fn extreme_timestamps_do_not_overflow() {
        let (mut est, _clock) = estimator_at(0);
        est.record_event(i64::MIN);
        est.record_event(i64::MAX);
        assert_eq!(est.window_len(), 1);
        assert_eq!(est.current_rate(), 0);

        let (mut est, _clock) = estimator_at(i64::MIN);
        est.record_event(i64::MIN);
        est.record_event(i64::MAX);
        assert_eq!(est.window_len(), 2);
        assert_eq!(est.current_rate(), 0);
    }

    #[test]
    fn rate_is_zero_with_fewer_than_two_events() {
        let (mut est, _clock) = estimator_at(0);
        assert_eq!(est.current_rate(), 0);
        est.record_event(0);
        assert_eq!(est.current_rate(), 0);
    }

    #[test]
    fn rate_is_zero_for_duplicate_timestamps() {
        let (mut est, _clock) = estimator_at(5_000);
        est.record_event(5_000);
        est.record_event(5_000);
        est.record_event(5_000);
        assert_eq!(est.window_len(), 3);
        assert_eq!(est.current_rate(), 0);
    }

    #[test]
    fn rate_truncates_toward_zero() {
        let (mut est, _clock) = estimator_at(7_000);
        est.record_event(0);
        est.record_event(7_000);
        // 2 / 7s * 60 = 17.14...
        assert_eq!(est.current_rate(), 17);
    }

    #[test]
    fn stale_events_are_evicted_against_clock() {
        let (mut est, clock) = estimator_at(0);
        est.record_event(0);
        est.record_event(1_000);

        clock.set(20_000);
        est.record_event(20_000);
        assert_eq!(est.window_len(), 1);
        assert_eq!(est.timestamps().collect::<Vec<_>>(), vec![20_000]);
    }

    #[test]
    fn event_exactly_at_window_edge_is_kept() {
        let (mut est, clock) = estimator_at(0);
        est.record_event(0);
        clock.set(15_000);
        est.record_event(15_000);
        assert_eq!(est.window_len(), 2);

        clock.set(15_001);
        est.record_event(15_001);
        assert_eq!(est.timestamps().collect::<Vec<_>>(), vec![15_000, 15_001]);
    }

    #[test]
    fn sole_stale_event_is_retained() {
        let (mut est, _clock) = estimator_at(1_000_000);
        // Far older than the window, but it is the only entry.
        est.record_event(0);
        assert_eq!(est.window_len(), 1);
    }

    #[test]
    fn stale_new_event_keeps_only_itself() {
        let (mut est, clock) = estimator_at(0);
        est.record_event(0);
        est.record_event(100);
        clock.set(1_000_000);
        // The new event is also stale relative to the clock.
        est.record_event(200);
        assert_eq!(est.timestamps().collect::<Vec<_>>(), vec![200]);
    }

    #[test]
    fn word_count_keeps_growing_after_eviction() {
        let (mut est, clock) = estimator_at(0);
        for i in 0..10 {
            clock.set(i * 20_000);
            est.record_event(i * 20_000);
        }
        assert_eq!(est.word_count(), 10);
        assert_eq!(est.window_len(), 1);
    }

    #[test]
    fn current_rate_is_idempotent() {
        let (mut est, _clock) = estimator_at(2_000);
        est.record_event(0);
        est.record_event(1_000);
        est.record_event(2_000);
        let first = est.current_rate();
        let second = est.current_rate();
        assert_eq!(first, second);
        assert_eq!(est.window_len(), 3);
    }

    #[test]
    fn record_word_uses_clock() {
        let (mut est, clock) = estimator_at(10_000);
        est.record_word();
        clock.advance(2_000);
        est.record_word();
        assert_eq!(est.timestamps().collect::<Vec<_>>(), vec![10_000, 12_000]);
        assert_eq!(est.current_rate(), 60);
    }

    #[test]
    fn shared_handle_observes_recorded_events() {
        let clock = ManualClock::new(1_000);
        let shared = SharedRateEstimator::new(RateEstimator::with_clock(15, clock));
        let writer = shared.clone();
        std::thread::spawn(move || {
            writer.record_event(0);
            writer.record_event(500);
            writer.record_event(1_000);
        })
        .join()
        .unwrap();
        assert_eq!(shared.current_rate(), 180);
        assert_eq!(shared.word_count(), 3);
        assert_eq!(shared.window_len(), 3);
    }
}
