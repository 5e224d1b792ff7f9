use std::time::{Duration, Instant};

pub struct GameTimer {
    base_time: Instant,
    current_time: Instant,
    previous_time: Instant,
    stop_time: Instant,
    delta_time: Duration,
    paused_time: Duration,
    is_stopped: bool,
    pub total_frames: u64,
}

impl GameTimer {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn delta_time(&self) -> f64 {
        self.delta_time.as_secs_f64()
    }

    /// Seconds elapsed since `reset`, not counting time spent stopped.
    pub fn total_time(&self) -> f64 {
        let end = if self.is_stopped {
            self.stop_time
        } else {
            self.current_time
        };
        end.duration_since(self.base_time)
            .checked_sub(self.paused_time)
            .unwrap_or_default()
            .as_secs_f64()
    }

    pub fn is_stopped(&self) -> bool {
        self.is_stopped
    }

    pub fn reset(&mut self) {
        let now = Instant::now();
        self.base_time = now;
        self.current_time = now;
        self.previous_time = now;
        self.stop_time = now;
        self.paused_time = Duration::default();
        self.delta_time = Duration::default();
        self.is_stopped = false;
        self.total_frames = 0;
    }

    pub fn start(&mut self) {
        if self.is_stopped {
            let now = Instant::now();
            self.paused_time += now - self.stop_time;
            self.previous_time = now;
            self.is_stopped = false;
        }
    }

    pub fn stop(&mut self) {
        if !self.is_stopped {
            self.stop_time = Instant::now();
            self.is_stopped = true;
        }
    }

    pub fn tick(&mut self) {
        if self.is_stopped {
            self.delta_time = Duration::default();
            return;
        }

        // Update delta time for last frame
        self.current_time = Instant::now();
        self.delta_time = self.current_time - self.previous_time;
        self.previous_time = self.current_time;
        self.total_frames += 1;
    }
}

impl Default for GameTimer {
    fn default() -> Self {
        let now = Instant::now();
        Self {
            base_time: now,
            current_time: now,
            previous_time: now,
            stop_time: now,
            delta_time: Duration::default(),
            paused_time: Duration::default(),
            is_stopped: false,
            total_frames: 0,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct FrameSample {
    pub fps: u32,
    pub ms_per_frame: f64,
}

/// Averages frame rate over one second windows of timer time.
#[derive(Default)]
pub struct FrameStats {
    frame_count: u32,
    window_start: f64,
}

impl FrameStats {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn record_frame(&mut self, total_time: f64) -> Option<FrameSample> {
        self.frame_count += 1;

        let elapsed = total_time - self.window_start;
        if elapsed < 1.0 {
            return None;
        }

        let fps = self.frame_count;
        let sample = FrameSample {
            fps,
            ms_per_frame: 1000.0 / f64::from(fps),
        };
        self.frame_count = 0;
        self.window_start += 1.0;
        Some(sample)
    }
}

pub fn format_caption(title: &str, sample: FrameSample) -> String {
    format!(
        "{}    fps: {}   mspf: {:.3}",
        title, sample.fps, sample.ms_per_frame
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::thread;

    #[test]
    fn stopped_timer_reports_zero_delta() {
        let mut timer = GameTimer::new();
        timer.reset();
        timer.stop();
        thread::sleep(Duration::from_millis(5));
        timer.tick();
        assert_eq!(timer.delta_time(), 0.0);
        assert_eq!(timer.total_frames, 0);
        assert!(timer.is_stopped());
    }

    #[test]
    fn paused_time_is_excluded_from_total() {
        let mut timer = GameTimer::new();
        timer.reset();
        timer.stop();
        thread::sleep(Duration::from_millis(50));
        timer.start();
        timer.tick();
        assert!(timer.total_time() < 0.045, "{}", timer.total_time());
    }

    #[test]
    fn tick_accumulates_frames_and_time() {
        let mut timer = GameTimer::new();
        timer.reset();
        thread::sleep(Duration::from_millis(10));
        timer.tick();
        timer.tick();
        assert_eq!(timer.total_frames, 2);
        assert!(timer.total_time() >= 0.010);
        assert!(timer.delta_time() < timer.total_time());
    }

    #[test]
    fn frame_stats_sample_once_per_second() {
        let mut stats = FrameStats::new();
        for i in 0..59 {
            assert_eq!(stats.record_frame(f64::from(i) / 60.0), None);
        }
        let sample = stats.record_frame(1.0).unwrap();
        assert_eq!(sample.fps, 60);
        assert!((sample.ms_per_frame - 16.666).abs() < 0.01);

        // Next window starts at one second.
        assert_eq!(stats.record_frame(1.5), None);
        assert_eq!(stats.record_frame(2.0).map(|s| s.fps), Some(2));
    }

    #[test]
    fn caption_contains_stats() {
        let caption = format_caption(
            "Cube",
            FrameSample {
                fps: 144,
                ms_per_frame: 6.944,
            },
        );
        assert_eq!(caption, "Cube    fps: 144   mspf: 6.944");
    }
}
