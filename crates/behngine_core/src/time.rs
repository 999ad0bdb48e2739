use std::time::{Duration, Instant};

pub struct Time {
    startup: Instant,
    last_update: Instant,
    delta: Duration,
}

impl Default for Time {
    fn default() -> Self {
        let now = Instant::now();
        Self {
            startup: now,
            last_update: now,
            delta: Duration::ZERO,
        }
    }
}

impl Time {
    /// Called by the engine loop once per frame
    pub fn update(&mut self) {
        self.update_at(Instant::now());
    }

    pub fn update_at(&mut self, now: Instant) {
        self.delta = now.saturating_duration_since(self.last_update);
        self.last_update = now;
    }

    /// Returns time in seconds since last frame (e.g., 0.016 for 60fps)
    pub fn delta_seconds(&self) -> f32 {
        self.delta.as_secs_f32()
    }

    /// Returns total time from startup to the last update
    pub fn elapsed_seconds(&self) -> f32 {
        self.last_update
            .saturating_duration_since(self.startup)
            .as_secs_f32()
    }
}

/// Counts frames and reports the average rate once per measuring window.
pub struct FpsCounter {
    window: Duration,
    window_start: Instant,
    frames: u32,
}

impl Default for FpsCounter {
    fn default() -> Self {
        Self::new(Instant::now())
    }
}

impl FpsCounter {
    pub fn new(start: Instant) -> Self {
        Self {
            window: Duration::from_secs(1),
            window_start: start,
            frames: 0,
        }
    }

    /// Registers one frame. Returns the frame rate when a full window has elapsed.
    pub fn tick(&mut self, now: Instant) -> Option<f64> {
        self.frames += 1;

        let elapsed = now.saturating_duration_since(self.window_start);
        if elapsed < self.window {
            return None;
        }

        let fps = self.frames as f64 / elapsed.as_secs_f64();
        self.frames = 0;
        self.window_start = now;
        Some(fps)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delta_tracks_last_update() {
        let mut time = Time::default();
        let start = time.last_update;

        time.update_at(start + Duration::from_millis(16));
        assert!((time.delta_seconds() - 0.016).abs() < 1e-6);

        time.update_at(start + Duration::from_millis(48));
        assert!((time.delta_seconds() - 0.032).abs() < 1e-6);
    }

    #[test]
    fn elapsed_accumulates_across_updates() {
        let mut time = Time::default();
        let start = time.last_update;
        assert_eq!(time.elapsed_seconds(), 0.0);

        time.update_at(start + Duration::from_millis(250));
        time.update_at(start + Duration::from_millis(1500));
        assert!((time.elapsed_seconds() - 1.5).abs() < 1e-6);
        assert!((time.delta_seconds() - 1.25).abs() < 1e-6);
    }

    #[test]
    fn delta_never_goes_negative() {
        let mut time = Time::default();
        let start = time.last_update;
        time.update_at(start + Duration::from_millis(10));
        time.update_at(start);
        assert_eq!(time.delta_seconds(), 0.0);
    }

    #[test]
    fn fps_is_reported_once_per_second() {
        let start = Instant::now();
        let mut counter = FpsCounter::new(start);

        for frame in 1..60 {
            assert_eq!(counter.tick(start + Duration::from_millis(frame * 16)), None);
        }

        let fps = counter
            .tick(start + Duration::from_secs(1))
            .expect("a full second elapsed");
        assert!((fps - 60.0).abs() < 1e-9);

        // The window restarts after reporting.
        assert_eq!(counter.tick(start + Duration::from_millis(1016)), None);
    }

    #[test]
    fn fps_uses_actual_elapsed_time() {
        let start = Instant::now();
        let mut counter = FpsCounter::new(start);
        counter.tick(start + Duration::from_millis(500));
        let fps = counter.tick(start + Duration::from_secs(2)).unwrap();
        assert!((fps - 1.0).abs() < 1e-9);
    }
}
