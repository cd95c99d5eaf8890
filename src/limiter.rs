//! Outbound rate limiting
//!
//! [`RateLimiter`] remembers the time of the last `max` admitted sends. It
//! trips once it holds `max` of them and all of them, plus the current
//! instant, fit in one `period` starting at the oldest:
//!
//! ```text
//!   oldest                      newest     now
//!     |---------------------------|---------|
//!     <------------------ period ------------->   tripped
//! ```
//!
//! As soon as the oldest remembered send falls out of the window, sends are
//! admitted again, there is no bucket to roll over.

use std::{
    collections::VecDeque,
    fmt,
    sync::{
        atomic::{AtomicU64, Ordering},
        Mutex, MutexGuard, PoisonError,
    },
    time::{Duration, Instant},
};

/// Number of sends remembered when `0` is given
pub const DEFAULT_LIMITER_MAX: usize = 20;

/// Window length used when a zero period is given
pub const DEFAULT_LIMITER_PERIOD: Duration = Duration::from_secs(30 * 60);

/// Sliding-window admission control over the last `max` sends
///
/// All methods take `&self`, the timestamp list is behind a mutex so that a
/// limiter can be shared between threads (the SMTP transport keeps it in an
/// `Arc`).
///
/// ```
/// use std::time::Duration;
/// use ratemail::RateLimiter;
///
/// let limiter = RateLimiter::new(2, Duration::from_secs(3600));
/// assert!(limiter.try_acquire());
/// assert!(limiter.try_acquire());
/// assert!(!limiter.try_acquire());
/// assert_eq!(limiter.rejected(), 1);
/// ```
pub struct RateLimiter {
    queue: Mutex<VecDeque<Instant>>,
    max: usize,
    period: Duration,
    rejected: AtomicU64,
}

impl RateLimiter {
    /// Creates a limiter admitting `max` sends per `period`
    ///
    /// A zero `max` means [`DEFAULT_LIMITER_MAX`], a zero `period` means
    /// [`DEFAULT_LIMITER_PERIOD`].
    pub fn new(max: usize, period: Duration) -> Self {
        let max = if max == 0 { DEFAULT_LIMITER_MAX } else { max };
        let period = if period.is_zero() {
            DEFAULT_LIMITER_PERIOD
        } else {
            period
        };

        Self {
            queue: Mutex::new(VecDeque::with_capacity(max.min(64))),
            max,
            period,
            rejected: AtomicU64::new(0),
        }
    }

    /// Records a send happening now
    pub fn add(&self) {
        let mut queue = self.queue();
        push(&mut queue, self.max, Instant::now());
    }

    /// Tells whether further sends should be suppressed
    pub fn is_on(&self) -> bool {
        let queue = self.queue();
        tripped(&queue, self.max, self.period, Instant::now())
    }

    /// Checks and records in one step
    ///
    /// Returns `false` without recording anything if the limiter is on,
    /// otherwise records a send and returns `true`. Concurrent callers can
    /// not both slip through the last free slot.
    pub fn try_acquire(&self) -> bool {
        let mut queue = self.queue();
        self.acquire(&mut queue, Instant::now())
    }

    /// Number of sends refused by [`try_acquire`](Self::try_acquire)
    pub fn rejected(&self) -> u64 {
        self.rejected.load(Ordering::Relaxed)
    }

    /// Number of remembered sends, never more than [`max`](Self::max)
    pub fn len(&self) -> usize {
        self.queue().len()
    }

    /// Whether no send was recorded yet
    pub fn is_empty(&self) -> bool {
        self.queue().is_empty()
    }

    /// Capacity of the window
    pub fn max(&self) -> usize {
        self.max
    }

    /// Length of the window
    pub fn period(&self) -> Duration {
        self.period
    }

    // The queue only holds instants, a panic while it was locked can not
    // leave it inconsistent.
    fn queue(&self) -> MutexGuard<'_, VecDeque<Instant>> {
        self.queue.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // Public callers read the clock only once they hold the lock, so the
    // queue stays in arrival order.
    fn acquire(&self, queue: &mut VecDeque<Instant>, now: Instant) -> bool {
        if tripped(queue, self.max, self.period, now) {
            self.rejected.fetch_add(1, Ordering::Relaxed);
            return false;
        }
        push(queue, self.max, now);
        true
    }

    #[cfg(test)]
    fn add_at(&self, now: Instant) {
        let mut queue = self.queue();
        push(&mut queue, self.max, now);
    }

    #[cfg(test)]
    fn is_on_at(&self, now: Instant) -> bool {
        let queue = self.queue();
        tripped(&queue, self.max, self.period, now)
    }

    #[cfg(test)]
    fn try_acquire_at(&self, now: Instant) -> bool {
        let mut queue = self.queue();
        self.acquire(&mut queue, now)
    }
}

fn push(queue: &mut VecDeque<Instant>, max: usize, now: Instant) {
    queue.push_back(now);
    while queue.len() > max {
        queue.pop_front();
    }
}

// Both conditions are needed: a burst followed by silence has a short
// newest - oldest but a long now - oldest.
fn tripped(queue: &VecDeque<Instant>, max: usize, period: Duration, now: Instant) -> bool {
    if queue.len() < max {
        return false;
    }

    match (queue.front(), queue.back()) {
        (Some(oldest), Some(newest)) => {
            newest.saturating_duration_since(*oldest) < period
                && now.saturating_duration_since(*oldest) < period
        }
        _ => false,
    }
}

impl fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RateLimiter")
            .field("max", &self.max)
            .field("period", &self.period)
            .field("len", &self.len())
            .field("rejected", &self.rejected())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::{sync::Arc, thread};

    use super::*;

    const HOUR: Duration = Duration::from_secs(3600);

    fn secs(n: u64) -> Duration {
        Duration::from_secs(n)
    }

    #[test]
    fn defaults() {
        let limiter = RateLimiter::new(0, Duration::ZERO);
        assert_eq!(limiter.max(), 20);
        assert_eq!(limiter.period(), secs(30 * 60));
        assert!(limiter.is_empty());
    }

    #[test]
    fn trips_after_max_adds_within_period() {
        let start = Instant::now();
        let limiter = RateLimiter::new(3, HOUR);

        limiter.add_at(start);
        limiter.add_at(start + secs(10));
        assert!(!limiter.is_on_at(start + secs(20)));

        limiter.add_at(start + secs(20));
        assert!(limiter.is_on_at(start + secs(21)));
    }

    #[test]
    fn fewer_than_max_never_trips() {
        let start = Instant::now();
        let limiter = RateLimiter::new(5, HOUR);

        for i in 0..4 {
            limiter.add_at(start);
            assert!(!limiter.is_on_at(start), "tripped after {} adds", i + 1);
        }
    }

    #[test]
    fn self_resets_when_oldest_leaves_window() {
        let start = Instant::now();
        let limiter = RateLimiter::new(2, secs(60));

        limiter.add_at(start);
        limiter.add_at(start + secs(1));
        assert!(limiter.is_on_at(start + secs(30)));

        // burst was short, but the oldest send is now out of the window
        assert!(!limiter.is_on_at(start + secs(61)));
        assert_eq!(limiter.len(), 2);
    }

    #[test]
    fn spread_out_sends_do_not_trip() {
        let start = Instant::now();
        let limiter = RateLimiter::new(2, secs(60));

        limiter.add_at(start);
        limiter.add_at(start + secs(90));
        // newest - oldest is already longer than the period
        assert!(!limiter.is_on_at(start + secs(91)));
    }

    #[test]
    fn window_is_exclusive() {
        let start = Instant::now();
        let limiter = RateLimiter::new(2, secs(60));

        limiter.add_at(start);
        limiter.add_at(start + secs(60));
        assert!(!limiter.is_on_at(start + secs(60)));
    }

    #[test]
    fn never_holds_more_than_max() {
        let start = Instant::now();
        let limiter = RateLimiter::new(4, HOUR);

        for i in 0..50 {
            limiter.add_at(start + secs(i));
            assert!(limiter.len() <= 4);
        }
        assert_eq!(limiter.len(), 4);

        // the window slid forward, the oldest kept is the 47th add
        let queue = limiter.queue();
        assert_eq!(queue.front().copied(), Some(start + secs(46)));
        assert_eq!(queue.back().copied(), Some(start + secs(49)));
    }

    #[test]
    fn try_acquire_records_only_when_admitted() {
        let start = Instant::now();
        let limiter = RateLimiter::new(2, HOUR);

        assert!(limiter.try_acquire_at(start));
        assert!(limiter.try_acquire_at(start + secs(1)));
        assert!(!limiter.try_acquire_at(start + secs(2)));
        assert!(!limiter.try_acquire_at(start + secs(3)));
        assert_eq!(limiter.len(), 2);
        assert_eq!(limiter.rejected(), 2);

        assert!(limiter.try_acquire_at(start + HOUR));
        assert_eq!(limiter.rejected(), 2);
    }

    #[test]
    fn concurrent_acquire_admits_exactly_max() {
        let limiter = Arc::new(RateLimiter::new(10, HOUR));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let limiter = Arc::clone(&limiter);
                thread::spawn(move || (0..10).filter(|_| limiter.try_acquire()).count())
            })
            .collect();
        let admitted: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();

        assert_eq!(admitted, 10);
        assert_eq!(limiter.rejected(), 70);
    }

    #[test]
    fn contended_acquire_keeps_arrival_order() {
        for _ in 0..20 {
            let limiter = Arc::new(RateLimiter::new(1000, HOUR));

            let handles: Vec<_> = (0..16)
                .map(|_| {
                    let limiter = Arc::clone(&limiter);
                    thread::spawn(move || {
                        for _ in 0..50 {
                            assert!(limiter.try_acquire());
                        }
                    })
                })
                .collect();
            for handle in handles {
                handle.join().unwrap();
            }

            let queue = limiter.queue();
            assert_eq!(queue.len(), 800);
            assert!(queue.iter().zip(queue.iter().skip(1)).all(|(a, b)| a <= b));
        }
    }
}
