use rand::rngs::SmallRng;

use crate::generator::{WordOptions, generate};

pub const STREAM_BATCH: usize = 100;
pub const STREAM_LOOKAHEAD: usize = 50;

/// Word supply for modes without a fixed end. Holds its own pool and rng so the session can
/// extend the target from inside the input path without reaching back to the text loader.
#[derive(Clone, Debug)]
pub struct WordStream {
    pool: Vec<String>,
    options: WordOptions,
    batch: usize,
    lookahead: usize,
    rng: SmallRng,
}

impl WordStream {
    pub fn new(pool: Vec<String>, options: WordOptions, rng: SmallRng) -> Self {
        Self {
            pool,
            options,
            batch: STREAM_BATCH,
            lookahead: STREAM_LOOKAHEAD,
            rng,
        }
    }

    pub fn with_sizes(mut self, batch: usize, lookahead: usize) -> Self {
        self.batch = batch;
        self.lookahead = lookahead;
        self
    }

    pub fn next_batch(&mut self) -> String {
        generate(self.batch, &self.pool, self.options, &mut self.rng)
    }

    /// Append a fresh batch when fewer than `lookahead` target words remain ahead of the
    /// word being typed. Returns whether the target grew.
    pub fn extend_if_needed(&mut self, target: &mut String, typed: &str) -> bool {
        let target_words = target.split(' ').count();
        let typed_words = typed.split(' ').count();
        if target_words.saturating_sub(typed_words) >= self.lookahead {
            return false;
        }

        let batch = self.next_batch();
        if batch.is_empty() {
            return false;
        }
        if !target.is_empty() {
            target.push(' ');
        }
        target.push_str(&batch);
        true
    }
}
