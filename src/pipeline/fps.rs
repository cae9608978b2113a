use std::{collections::VecDeque, time::Instant};

pub const FPS_WINDOW: usize = 30;

/// Frame rate over the last `FPS_WINDOW` frame intervals.
#[derive(Debug)]
pub struct FpsCounter {
    last_tick: Option<Instant>,
    samples: VecDeque<f32>,
}

impl Default for FpsCounter {
    fn default() -> Self {
        Self {
            last_tick: None,
            samples: VecDeque::with_capacity(FPS_WINDOW),
        }
    }
}

impl FpsCounter {
    pub fn tick(&mut self) -> f32 {
        self.tick_at(Instant::now())
    }

    pub fn tick_at(&mut self, now: Instant) -> f32 {
        if let Some(last) = self.last_tick {
            let elapsed = now.duration_since(last).as_secs_f32();
            if elapsed > 0.0 {
                if self.samples.len() == FPS_WINDOW {
                    self.samples.pop_front();
                }
                self.samples.push_back(1.0 / elapsed);
            }
        }
        self.last_tick = Some(now);
        self.current()
    }

    pub fn current(&self) -> f32 {
        if self.samples.is_empty() {
            return 0.0;
        }
        self.samples.iter().sum::<f32>() / self.samples.len() as f32
    }

    /// Forget the previous tick so a pause does not show up as one slow frame.
    pub fn restart(&mut self) {
        self.last_tick = None;
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn first_tick_has_no_rate() {
        let mut fps = FpsCounter::default();
        assert_eq!(fps.tick_at(Instant::now()), 0.0);
    }

    #[test]
    fn averages_recent_intervals() {
        let mut fps = FpsCounter::default();
        let start = Instant::now();
        fps.tick_at(start);
        fps.tick_at(start + Duration::from_millis(100));
        let rate = fps.tick_at(start + Duration::from_millis(150));
        // (10 + 20) / 2
        assert!((rate - 15.0).abs() < 0.01);
    }

    #[test]
    fn window_drops_old_samples() {
        let mut fps = FpsCounter::default();
        let mut now = Instant::now();
        fps.tick_at(now);
        for _ in 0..FPS_WINDOW {
            now += Duration::from_millis(500);
            fps.tick_at(now);
        }
        for _ in 0..FPS_WINDOW {
            now += Duration::from_millis(20);
            fps.tick_at(now);
        }
        assert!((fps.current() - 50.0).abs() < 0.1);
    }

    #[test]
    fn restart_skips_the_gap() {
        let mut fps = FpsCounter::default();
        let start = Instant::now();
        fps.tick_at(start);
        fps.tick_at(start + Duration::from_millis(50));
        fps.restart();
        let rate = fps.tick_at(start + Duration::from_secs(10));
        assert!((rate - 20.0).abs() < 0.01);
    }
}
