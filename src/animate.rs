pub const REVEAL_SELECTOR: &str = ".car-card, .feature-card, .info-card";
pub const STAT_SELECTOR: &str = ".stat h3";
pub const IMAGE_SELECTOR: &str = ".car-image img";

pub(crate) const HIDDEN_OPACITY: &str = "0";
pub(crate) const HIDDEN_TRANSFORM: &str = "translateY(50px)";
pub(crate) const REVEAL_TRANSITION: &str = "all 0.6s ease";
pub(crate) const SHOWN_OPACITY: &str = "1";
pub(crate) const SHOWN_TRANSFORM: &str = "translateY(0)";
pub(crate) const IMAGE_TRANSITION: &str = "opacity 0.3s ease";

/// True once an element's top edge is within `margin` px of the viewport bottom.
pub fn within_reveal_zone(client_top: f64, viewport_height: f64, margin: f64) -> bool {
    client_top < viewport_height - margin
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CountUpFrame {
    pub value: i64,
    pub finished: bool,
}

/// Linear count from `start` to `end` over `duration_ms`, clocked by frame
/// timestamps. The first frame fixes the start time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountUp {
    start: i64,
    end: i64,
    duration_ms: i64,
    started_at: Option<i64>,
}

impl CountUp {
    pub fn new(start: i64, end: i64, duration_ms: i64) -> Self {
        Self {
            start,
            end,
            duration_ms: duration_ms.max(1),
            started_at: None,
        }
    }

    pub fn started_at(&self) -> Option<i64> {
        self.started_at
    }

    pub fn frame(&mut self, timestamp_ms: i64) -> CountUpFrame {
        let started_at = *self.started_at.get_or_insert(timestamp_ms);
        let progress = self.progress(timestamp_ms - started_at);
        CountUpFrame {
            value: self.interpolate(progress),
            finished: progress >= 1.0,
        }
    }

    fn progress(&self, elapsed_ms: i64) -> f64 {
        (elapsed_ms as f64 / self.duration_ms as f64).clamp(0.0, 1.0)
    }

    fn interpolate(&self, progress: f64) -> i64 {
        (progress * (self.end - self.start) as f64 + self.start as f64).floor() as i64
    }
}

pub fn render_counter(value: i64, suffix: &str) -> String {
    format!("{value}{suffix}")
}
