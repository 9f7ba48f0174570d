use std::time::Duration;

/// Pacing cursor that moves through the target at a fixed words-per-minute. Purely cosmetic.
#[derive(Clone, Debug, PartialEq)]
pub struct GhostWriter {
    chars_per_sec: f64,
    index: usize,
}

impl GhostWriter {
    pub fn new(target_wpm: u32) -> Self {
        Self {
            chars_per_sec: target_wpm as f64 * 5.0 / 60.0,
            index: 0,
        }
    }

    pub fn advance(&mut self, elapsed: Duration, target_len: usize) {
        let reached = (elapsed.as_secs_f64() * self.chars_per_sec).floor() as usize;
        self.index = reached.min(target_len);
    }

    pub fn index(&self) -> usize {
        self.index
    }
}
