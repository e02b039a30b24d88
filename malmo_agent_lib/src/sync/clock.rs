use std::time::{Duration, Instant};

/// Time source for the poll loops. Sleeping is the only suspension point.
pub trait Clock {
    /// Time since the clock was created.
    fn elapsed(&self) -> Duration;

    fn sleep(&mut self, duration: Duration);
}

impl<C: Clock + ?Sized> Clock for &mut C {
    fn elapsed(&self) -> Duration {
        (**self).elapsed()
    }

    fn sleep(&mut self, duration: Duration) {
        (**self).sleep(duration)
    }
}

/// Wall clock backed by `std::thread::sleep`.
#[derive(Debug, Clone)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn elapsed(&self) -> Duration {
        self.origin.elapsed()
    }

    fn sleep(&mut self, duration: Duration) {
        if !duration.is_zero() {
            std::thread::sleep(duration);
        }
    }
}

/// Virtual clock: sleeping advances time instantly and is recorded.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Duration,
    sleeps: Vec<Duration>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every sleep requested so far, in order.
    pub fn sleeps(&self) -> &[Duration] {
        &self.sleeps
    }

    pub fn total_slept(&self) -> Duration {
        self.sleeps.iter().sum()
    }

    /// Number of sleeps of exactly this length.
    pub fn count_of(&self, duration: Duration) -> usize {
        self.sleeps.iter().filter(|d| **d == duration).count()
    }

    pub fn advance(&mut self, duration: Duration) {
        self.now += duration;
    }
}

impl Clock for ManualClock {
    fn elapsed(&self) -> Duration {
        self.now
    }

    fn sleep(&mut self, duration: Duration) {
        self.sleeps.push(duration);
        self.now += duration;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_clock_records_sleeps() {
        let mut clock = ManualClock::new();
        clock.sleep(Duration::from_millis(100));
        clock.sleep(Duration::from_secs(2));
        clock.sleep(Duration::from_millis(100));

        assert_eq!(clock.elapsed(), Duration::from_millis(2200));
        assert_eq!(clock.count_of(Duration::from_millis(100)), 2);
        assert_eq!(clock.sleeps().len(), 3);
        assert_eq!(clock.total_slept(), Duration::from_millis(2200));
    }

    #[test]
    fn test_advance_does_not_record() {
        let mut clock = ManualClock::new();
        clock.advance(Duration::from_secs(1));
        assert_eq!(clock.elapsed(), Duration::from_secs(1));
        assert!(clock.sleeps().is_empty());
    }

    #[test]
    fn test_system_clock_moves_forward() {
        let mut clock = SystemClock::new();
        let before = clock.elapsed();
        clock.sleep(Duration::from_millis(5));
        assert!(clock.elapsed() >= before + Duration::from_millis(5));
    }
}
