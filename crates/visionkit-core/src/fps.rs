use std::time::{Duration, Instant};

/// Frame-rate from the gap between consecutive ticks.
#[derive(Debug)]
pub struct FpsMeter {
    previous: Option<Instant>,
    frames: u64,
    last_log: Instant,
}

impl FpsMeter {
    pub fn new() -> Self {
        Self {
            previous: None,
            frames: 0,
            last_log: Instant::now(),
        }
    }

    /// Marks a frame. Returns the instantaneous rate, `0.0` on the first tick.
    pub fn tick(&mut self) -> f64 {
        self.tick_at(Instant::now())
    }

    pub fn tick_at(&mut self, now: Instant) -> f64 {
        self.frames += 1;
        let fps = match self.previous {
            Some(prev) => {
                let dt = now.saturating_duration_since(prev).as_secs_f64();
                if dt > 0.0 {
                    1.0 / dt
                } else {
                    0.0
                }
            }
            None => 0.0,
        };
        self.previous = Some(now);
        fps
    }

    // Frames since the last report, once at least `every` has passed.
    pub fn report_due(&mut self, every: Duration) -> Option<u64> {
        if self.last_log.elapsed() >= every && self.frames > 0 {
            let frames = self.frames;
            self.frames = 0;
            self.last_log = Instant::now();
            Some(frames)
        } else {
            None
        }
    }
}

impl Default for FpsMeter {
    fn default() -> Self {
        Self::new()
    }
}
