use std::time::{Duration, Instant};

/// Fixed-timestep pacing: `tick` sleeps out whatever is left of the current
/// frame so a loop runs at most `fps` iterations per second.
pub struct FrameClock {
    frame: Duration,
    deadline: Instant,
}

impl FrameClock {
    pub fn new(fps: u32) -> Self {
        Self {
            frame: frame_duration(fps),
            deadline: Instant::now(),
        }
    }

    pub fn frame_duration(&self) -> Duration {
        self.frame
    }

    /// Waits for the end of the current frame and returns the time slept.
    /// An overrunning frame resets the schedule instead of trying to catch up.
    pub fn tick(&mut self) -> Duration {
        self.deadline += self.frame;
        let now = Instant::now();
        if self.deadline > now {
            let wait = self.deadline - now;
            std::thread::sleep(wait);
            wait
        } else {
            self.deadline = now;
            Duration::ZERO
        }
    }
}

pub fn frame_duration(fps: u32) -> Duration {
    Duration::from_nanos(1_000_000_000 / u64::from(fps.max(1)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_duration_matches_rate() {
        assert_eq!(frame_duration(50), Duration::from_millis(20));
        assert_eq!(frame_duration(0), Duration::from_secs(1));
    }

    #[test]
    fn tick_paces_iterations() {
        let mut clock = FrameClock::new(200);
        let start = Instant::now();
        for _ in 0..10 {
            clock.tick();
        }
        assert!(start.elapsed() >= Duration::from_millis(45));
    }

    #[test]
    fn overrun_does_not_sleep() {
        let mut clock = FrameClock::new(1000);
        std::thread::sleep(Duration::from_millis(5));
        assert_eq!(clock.tick(), Duration::ZERO);
    }
}
