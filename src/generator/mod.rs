pub mod capitalize;
pub mod numbers;
pub mod punctuate;
pub mod stream;

use rand::Rng;
use rand::rngs::SmallRng;
use serde::{Deserialize, Serialize};

const NUMBER_PROBABILITY: f64 = 0.10;
const PUNCTUATION_PROBABILITY: f64 = 0.15;
const CAPITALIZE_PROBABILITY: f64 = 0.20;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordOptions {
    pub punctuation: bool,
    pub numbers: bool,
    pub capitalization: bool,
}

/// Draw `count` words from `pool` and join them with single spaces.
///
/// Each flag enables an independent per-word injection pass. The first word never gets
/// trailing punctuation. An empty pool yields an empty string rather than failing, since
/// pools may still be loading when this is called.
pub fn generate(count: usize, pool: &[String], options: WordOptions, rng: &mut SmallRng) -> String {
    if pool.is_empty() {
        return String::new();
    }

    let mut words = Vec::with_capacity(count);
    for i in 0..count {
        let mut word = pool[rng.gen_range(0..pool.len())].clone();

        if options.numbers && rng.gen_bool(NUMBER_PROBABILITY) {
            word = numbers::two_digit_number(rng);
        }
        if options.punctuation && i > 0 && rng.gen_bool(PUNCTUATION_PROBABILITY) {
            word.push(punctuate::random_mark(rng));
        }
        if options.capitalization && rng.gen_bool(CAPITALIZE_PROBABILITY) {
            word = capitalize::capitalize_first(&word);
        }

        words.push(word);
    }

    words.join(" ")
}
